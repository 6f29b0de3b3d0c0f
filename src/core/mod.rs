mod engine;
mod types;

pub use engine::{MAX_HORIZON_YEARS, TERMINAL_AGE, monthly_rate, project, terminal_year};
pub use types::{AnnualRecord, ProjectionSeries, SimulationParameters};
