use prettytable::{Table, format, row};

use super::format::format_currency;
use crate::core::ProjectionSeries;

/// Borderless table with every column right-aligned, one row per record.
pub fn render_table(series: &ProjectionSeries) -> String {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    table.add_row(row![r => "Year", "Age", "Total Assets", "Monthly Withdrawal"]);
    for record in series {
        table.add_row(row![r =>
            record.year,
            record.age,
            format_currency(record.balance),
            format_currency(record.monthly_withdrawal)
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SimulationParameters, project};

    fn three_year_series() -> ProjectionSeries {
        project(&SimulationParameters {
            start_year: 2024,
            start_age: 98,
            initial_assets: 1_080_000.0,
            annual_return: 0.0,
            monthly_investment: 10_000.0,
            end_investment_year: 2025,
            start_withdrawal_year: 2026,
            withdrawal_rate: 0.25,
        })
    }

    #[test]
    fn renders_header_and_one_line_per_record() {
        let table = render_table(&three_year_series());
        let lines: Vec<&str> = table.lines().map(str::trim).collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "Year  Age  Total Assets  Monthly Withdrawal"
        );
        assert_eq!(lines[1], "2024   98     1,080,000                   0");
        assert_eq!(lines[2], "2025   99     1,200,000                   0");
        assert_eq!(lines[3], "2026  100       900,000              25,000");
    }

    #[test]
    fn columns_stay_aligned() {
        let table = render_table(&three_year_series());
        let widths: Vec<usize> = table.lines().map(str::len).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
    }
}
