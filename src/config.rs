//! Parameter collection shared by the command and form surfaces.
//!
//! [`InputForm`] holds the eight projection inputs in the units a person types
//! them in (rates as percentages). [`FIELDS`] carries the per-field bounds both
//! surfaces enforce before the engine is ever invoked.

use serde::{Deserialize, Serialize};

use crate::core::SimulationParameters;
use crate::error::{AppError, AppResult};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    StartYear,
    StartAge,
    InitialAssets,
    AnnualReturn,
    MonthlyInvestment,
    EndInvestmentYear,
    StartWithdrawalYear,
    WithdrawalRate,
}

impl FieldKey {
    /// Name used in JSON payloads and error messages.
    pub fn name(self) -> &'static str {
        match self {
            FieldKey::StartYear => "startYear",
            FieldKey::StartAge => "startAge",
            FieldKey::InitialAssets => "initialAssets",
            FieldKey::AnnualReturn => "annualReturn",
            FieldKey::MonthlyInvestment => "monthlyInvestment",
            FieldKey::EndInvestmentYear => "endInvestmentYear",
            FieldKey::StartWithdrawalYear => "startWithdrawalYear",
            FieldKey::WithdrawalRate => "withdrawalRate",
        }
    }
}

#[derive(Copy, Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldBounds {
    pub key: FieldKey,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub integer: bool,
}

impl FieldBounds {
    fn check(&self, value: f64) -> AppResult<()> {
        if !value.is_finite() {
            return Err(AppError::invalid(self.key.name(), "must be a finite number"));
        }
        if !(self.min..=self.max).contains(&value) {
            return Err(AppError::invalid(
                self.key.name(),
                format!("must be between {} and {}", self.min, self.max),
            ));
        }
        Ok(())
    }
}

/// Prompt order is the order of this table.
pub const FIELDS: [FieldBounds; 8] = [
    FieldBounds {
        key: FieldKey::StartYear,
        label: "Start year",
        min: 1900.0,
        max: 2200.0,
        step: 1.0,
        integer: true,
    },
    FieldBounds {
        key: FieldKey::StartAge,
        label: "Age at start",
        min: 0.0,
        max: 99.0,
        step: 1.0,
        integer: true,
    },
    FieldBounds {
        key: FieldKey::InitialAssets,
        label: "Current invested assets",
        min: 0.0,
        max: 1e12,
        step: 100_000.0,
        integer: false,
    },
    FieldBounds {
        key: FieldKey::AnnualReturn,
        label: "Annual return (%)",
        min: -100.0,
        max: 100.0,
        step: 0.1,
        integer: false,
    },
    FieldBounds {
        key: FieldKey::MonthlyInvestment,
        label: "Monthly contribution",
        min: 0.0,
        max: 1e9,
        step: 10_000.0,
        integer: false,
    },
    FieldBounds {
        key: FieldKey::EndInvestmentYear,
        label: "Last contribution year",
        min: 1900.0,
        max: 2300.0,
        step: 1.0,
        integer: true,
    },
    FieldBounds {
        key: FieldKey::StartWithdrawalYear,
        label: "First withdrawal year",
        min: 1900.0,
        max: 2300.0,
        step: 1.0,
        integer: true,
    },
    FieldBounds {
        key: FieldKey::WithdrawalRate,
        label: "Annual withdrawal rate (%)",
        min: 0.0,
        max: 100.0,
        step: 0.1,
        integer: false,
    },
];

/// `FIELDS` is laid out in `FieldKey` declaration order.
pub fn bounds(key: FieldKey) -> &'static FieldBounds {
    &FIELDS[key as usize]
}

/// Inputs in display units, constructed once per run and never shared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputForm {
    pub start_year: i32,
    pub start_age: i32,
    pub initial_assets: f64,
    pub annual_return_pct: f64,
    pub monthly_investment: f64,
    pub end_investment_year: i32,
    pub start_withdrawal_year: i32,
    pub withdrawal_rate_pct: f64,
}

impl Default for InputForm {
    fn default() -> Self {
        Self {
            start_year: 2025,
            start_age: 40,
            initial_assets: 5_000_000.0,
            annual_return_pct: 5.0,
            monthly_investment: 50_000.0,
            end_investment_year: 2044,
            start_withdrawal_year: 2045,
            withdrawal_rate_pct: 4.0,
        }
    }
}

impl InputForm {
    pub fn get(&self, key: FieldKey) -> f64 {
        match key {
            FieldKey::StartYear => self.start_year as f64,
            FieldKey::StartAge => self.start_age as f64,
            FieldKey::InitialAssets => self.initial_assets,
            FieldKey::AnnualReturn => self.annual_return_pct,
            FieldKey::MonthlyInvestment => self.monthly_investment,
            FieldKey::EndInvestmentYear => self.end_investment_year as f64,
            FieldKey::StartWithdrawalYear => self.start_withdrawal_year as f64,
            FieldKey::WithdrawalRate => self.withdrawal_rate_pct,
        }
    }

    /// Bounds-checks `value` for `key` and stores it. Integer fields reject
    /// fractional input rather than truncating it.
    pub fn set(&mut self, key: FieldKey, value: f64) -> AppResult<()> {
        let field = bounds(key);
        field.check(value)?;
        if field.integer && value.fract() != 0.0 {
            return Err(AppError::invalid(key.name(), "must be a whole number"));
        }

        match key {
            FieldKey::StartYear => self.start_year = value as i32,
            FieldKey::StartAge => self.start_age = value as i32,
            FieldKey::InitialAssets => self.initial_assets = value,
            FieldKey::AnnualReturn => self.annual_return_pct = value,
            FieldKey::MonthlyInvestment => self.monthly_investment = value,
            FieldKey::EndInvestmentYear => self.end_investment_year = value as i32,
            FieldKey::StartWithdrawalYear => self.start_withdrawal_year = value as i32,
            FieldKey::WithdrawalRate => self.withdrawal_rate_pct = value,
        }
        Ok(())
    }

    /// Applies every `Some` override in turn, stopping at the first rejected value.
    pub fn apply_overrides<I>(&mut self, overrides: I) -> AppResult<()>
    where
        I: IntoIterator<Item = (FieldKey, Option<f64>)>,
    {
        for (key, value) in overrides {
            if let Some(v) = value {
                self.set(key, v)?;
            }
        }
        Ok(())
    }

    /// Checks each field against [`FIELDS`]. Combinations of fields are not
    /// checked; the engine simulates them as given.
    pub fn validate(&self) -> AppResult<()> {
        for field in &FIELDS {
            field.check(self.get(field.key))?;
        }
        Ok(())
    }

    pub fn into_parameters(self) -> AppResult<SimulationParameters> {
        self.validate()?;
        Ok(SimulationParameters {
            start_year: self.start_year,
            start_age: self.start_age,
            initial_assets: self.initial_assets,
            annual_return: self.annual_return_pct / 100.0,
            monthly_investment: self.monthly_investment,
            end_investment_year: self.end_investment_year,
            start_withdrawal_year: self.start_withdrawal_year,
            withdrawal_rate: self.withdrawal_rate_pct / 100.0,
        })
    }

    pub fn from_parameters(params: &SimulationParameters) -> Self {
        Self {
            start_year: params.start_year,
            start_age: params.start_age,
            initial_assets: params.initial_assets,
            annual_return_pct: params.annual_return * 100.0,
            monthly_investment: params.monthly_investment,
            end_investment_year: params.end_investment_year,
            start_withdrawal_year: params.start_withdrawal_year,
            withdrawal_rate_pct: params.withdrawal_rate * 100.0,
        }
    }
}
