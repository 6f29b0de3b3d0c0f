use super::types::{AnnualRecord, ProjectionSeries, SimulationParameters};

/// Age at which every projection ends.
pub const TERMINAL_AGE: i32 = 100;

const MONTHS_PER_YEAR: u32 = 12;

/// Upper bound on simulated years for start ages far below zero.
pub const MAX_HORIZON_YEARS: i32 = 1_000;

/// Geometric monthly equivalent of an annual rate: twelve compoundings of the
/// result reproduce `annual_return` exactly.
pub fn monthly_rate(annual_return: f64) -> f64 {
    (1.0 + annual_return).powf(1.0 / MONTHS_PER_YEAR as f64) - 1.0
}

/// Calendar year of the last record.
pub fn terminal_year(params: &SimulationParameters) -> i32 {
    params.start_year + horizon_years(params)
}

/// Years simulated after the seed record. Stops at age 100, at the last
/// representable calendar year, or after [`MAX_HORIZON_YEARS`].
fn horizon_years(params: &SimulationParameters) -> i32 {
    let to_terminal_age = TERMINAL_AGE.saturating_sub(params.start_age);
    let to_last_year = i32::MAX.saturating_sub(params.start_year);
    to_terminal_age.min(to_last_year).clamp(0, MAX_HORIZON_YEARS)
}

/// Year-end balances from `start_year` through age 100. The first record is the
/// starting state with no withdrawal.
pub fn project(params: &SimulationParameters) -> ProjectionSeries {
    let years = horizon_years(params);
    let growth = 1.0 + monthly_rate(params.annual_return);

    let mut records = Vec::with_capacity(years as usize + 1);
    records.push(AnnualRecord {
        year: params.start_year,
        age: params.start_age,
        balance: params.initial_assets,
        monthly_withdrawal: 0.0,
    });

    let mut prior_balance = params.initial_assets;
    for offset in 1..=years {
        let year = params.start_year + offset;
        let record = simulate_year(params, year, prior_balance, growth);
        records.push(AnnualRecord {
            age: params.start_age + offset,
            ..record
        });
        prior_balance = record.balance;
    }

    ProjectionSeries::from_records(records)
}

fn simulate_year(
    params: &SimulationParameters,
    year: i32,
    prior_balance: f64,
    growth: f64,
) -> AnnualRecord {
    let contributing = year <= params.end_investment_year;
    let withdrawing = year >= params.start_withdrawal_year;

    // Sized off the previous year-end balance and held fixed for all twelve months.
    let monthly_withdrawal = if withdrawing {
        prior_balance * params.withdrawal_rate / MONTHS_PER_YEAR as f64
    } else {
        0.0
    };

    let mut current = prior_balance;
    for _ in 0..MONTHS_PER_YEAR {
        if contributing {
            current += params.monthly_investment;
        }
        current *= growth;
        if withdrawing {
            current -= monthly_withdrawal;
        }
    }

    AnnualRecord {
        year,
        age: 0,
        balance: current.max(0.0),
        monthly_withdrawal,
    }
}
