//! Command surface: flag-driven projection, the interactive line-mode prompt,
//! and the entry point for the HTTP form.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{FIELDS, FieldBounds, FieldKey, InputForm};
use crate::core::{ProjectionSeries, SimulationParameters, project};
use crate::error::{AppError, AppResult};
use crate::report::{DEFAULT_EXPORT_FILE, render_table, write_csv, write_svg};

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Projects an investment balance through age 100 with monthly contributions and withdrawals"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a projection from command-line flags; unset flags use defaults.
    Project {
        #[command(flatten)]
        params: ParameterArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Ask for each parameter interactively, then project and export.
    Prompt {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Serve the interactive form over HTTP.
    Serve {
        #[arg(long, env = "NESTEGG_PORT", default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug, Default)]
struct ParameterArgs {
    #[arg(long, help = "Calendar year the projection starts")]
    start_year: Option<i32>,
    #[arg(long, help = "Age in the start year (0-99)")]
    start_age: Option<i32>,
    #[arg(long, help = "Invested assets at the start")]
    initial_assets: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Expected annual return in percent, e.g. 5"
    )]
    annual_return: Option<f64>,
    #[arg(long, help = "Contribution added every month while investing")]
    monthly_investment: Option<f64>,
    #[arg(long, help = "Last calendar year with contributions (inclusive)")]
    end_investment_year: Option<i32>,
    #[arg(long, help = "First calendar year with withdrawals (inclusive)")]
    start_withdrawal_year: Option<i32>,
    #[arg(
        long,
        help = "Share of the prior year-end balance withdrawn per year, in percent"
    )]
    withdrawal_rate: Option<f64>,
}

#[derive(Args, Debug, Default)]
struct OutputArgs {
    #[arg(long, help = "Write the yearly series to this CSV file")]
    csv: Option<PathBuf>,
    #[arg(long, help = "Write a dual-axis SVG chart to this file")]
    chart: Option<PathBuf>,
    #[arg(long, help = "Do not print the yearly table")]
    quiet: bool,
}

pub async fn run(cli: Cli) -> AppResult<()> {
    match cli.command {
        Command::Project { params, output } => {
            let form = build_form(params)?;
            let mut stdout = io::stdout().lock();
            run_projection(form, &output, &mut stdout)
        }
        Command::Prompt { mut output } => {
            if output.csv.is_none() {
                output.csv = Some(PathBuf::from(DEFAULT_EXPORT_FILE));
            }
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "===== Asset Projection =====")?;
            let form = prompt_form(&mut input, &mut stdout, InputForm::default())?;
            writeln!(stdout)?;
            run_projection(form, &output, &mut stdout)
        }
        Command::Serve { port } => crate::api::run_http_server(port)
            .await
            .map_err(AppError::from),
    }
}

fn build_form(args: ParameterArgs) -> AppResult<InputForm> {
    let mut form = InputForm::default();
    form.apply_overrides([
        (FieldKey::StartYear, args.start_year.map(f64::from)),
        (FieldKey::StartAge, args.start_age.map(f64::from)),
        (FieldKey::InitialAssets, args.initial_assets),
        (FieldKey::AnnualReturn, args.annual_return),
        (FieldKey::MonthlyInvestment, args.monthly_investment),
        (FieldKey::EndInvestmentYear, args.end_investment_year.map(f64::from)),
        (
            FieldKey::StartWithdrawalYear,
            args.start_withdrawal_year.map(f64::from),
        ),
        (FieldKey::WithdrawalRate, args.withdrawal_rate),
    ])?;
    form.validate()?;
    Ok(form)
}

fn run_projection<W: Write>(form: InputForm, output: &OutputArgs, out: &mut W) -> AppResult<()> {
    let params = form.into_parameters()?;
    let series = compute(&params);

    if !output.quiet {
        writeln!(out, "===== Projection Results =====")?;
        out.write_all(render_table(&series).as_bytes())?;
    }
    if let Some(path) = &output.csv {
        write_csv(&series, path)?;
        writeln!(out, "Saved projection to {}", path.display())?;
    }
    if let Some(path) = &output.chart {
        write_svg(&series, path)?;
        writeln!(out, "Saved chart to {}", path.display())?;
    }
    Ok(())
}

fn compute(params: &SimulationParameters) -> ProjectionSeries {
    let series = project(params);
    tracing::info!(
        start_year = params.start_year,
        start_age = params.start_age,
        years = series.len(),
        final_balance = series.final_balance(),
        "projection computed"
    );
    series
}

/// Collects every field in [`FIELDS`] order. An empty line keeps the value
/// from `defaults`; unreadable or out-of-range input is reported and the
/// same field is asked again.
pub fn prompt_form<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    defaults: InputForm,
) -> AppResult<InputForm> {
    let mut form = defaults;
    for field in &FIELDS {
        loop {
            write!(output, "{} [{}]: ", field.label, form.get(field.key))?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Err(AppError::InputClosed);
            }
            let text = line.trim();
            if text.is_empty() {
                break;
            }

            match parse_field(field, text).and_then(|v| form.set(field.key, v)) {
                Ok(()) => break,
                Err(err) => {
                    tracing::debug!(field = field.key.name(), error = %err, "prompt input rejected");
                    writeln!(output, "  {err}")?;
                }
            }
        }
    }
    Ok(form)
}

/// Accepts grouped digits ("1,000,000") and a trailing percent sign.
fn parse_field(field: &FieldBounds, text: &str) -> AppResult<f64> {
    let cleaned: String = text.chars().filter(|c| *c != ',' && *c != '_').collect();
    let cleaned = cleaned.trim_end_matches('%').trim();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::Parse {
            field: field.key.name().to_string(),
            value: text.to_string(),
        })
}
