use serde::{Deserialize, Serialize};

/// Inputs to a single projection. Rates are fractions (0.05 = 5%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParameters {
    pub start_year: i32,
    pub start_age: i32,
    pub initial_assets: f64,
    pub annual_return: f64,
    pub monthly_investment: f64,
    /// Last year (inclusive) in which contributions are made.
    pub end_investment_year: i32,
    /// First year (inclusive) in which withdrawals are taken.
    pub start_withdrawal_year: i32,
    /// Annual fraction of the prior year-end balance, spread over 12 months.
    pub withdrawal_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualRecord {
    pub year: i32,
    pub age: i32,
    pub balance: f64,
    pub monthly_withdrawal: f64,
}

/// Year-by-year output of the engine, ordered by year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectionSeries {
    records: Vec<AnnualRecord>,
}

impl ProjectionSeries {
    pub(crate) fn from_records(records: Vec<AnnualRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[AnnualRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&AnnualRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&AnnualRecord> {
        self.records.last()
    }

    pub fn final_balance(&self) -> f64 {
        self.last().map_or(0.0, |r| r.balance)
    }

    /// Record with the highest balance; the earliest one wins ties.
    pub fn peak(&self) -> Option<&AnnualRecord> {
        self.records
            .iter()
            .fold(None, |best: Option<&AnnualRecord>, r| match best {
                Some(b) if b.balance >= r.balance => Some(b),
                _ => Some(r),
            })
    }

    /// First simulated year whose closing balance hit zero. The seed record is
    /// not considered even when the starting balance is zero.
    pub fn depletion(&self) -> Option<&AnnualRecord> {
        self.records.iter().skip(1).find(|r| r.balance == 0.0)
    }
}

impl<'a> IntoIterator for &'a ProjectionSeries {
    type Item = &'a AnnualRecord;
    type IntoIter = std::slice::Iter<'a, AnnualRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
