use std::fmt;
use std::path::Path;

use super::export::write_atomically;
use super::format::{DISPLAY_UNIT, format_units};
use crate::core::{AnnualRecord, ProjectionSeries};
use crate::error::AppResult;

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 540.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 90.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 60.0;
const Y_TICKS: u32 = 5;

const ASSET_COLOR: &str = "#1f4fd1";
const WITHDRAWAL_COLOR: &str = "#d12a1f";

#[derive(Debug, Clone, Copy, PartialEq)]
struct Axis {
    min: f64,
    max: f64,
    step: f64,
}

impl Axis {
    /// Zero-based axis whose top is a round number at or above `max`.
    fn zero_based(max: f64, ticks: u32) -> Self {
        if !max.is_finite() || max <= 0.0 {
            return Self {
                min: 0.0,
                max: 1.0,
                step: 1.0 / ticks as f64,
            };
        }
        let step = nice_step(max / ticks as f64);
        Self {
            min: 0.0,
            max: (max / step).ceil() * step,
            step,
        }
    }

    fn span(min: f64, max: f64, ticks: u32) -> Self {
        let max = if max > min { max } else { min + 1.0 };
        let step = nice_step((max - min) / ticks as f64).max(1.0);
        Self { min, max, step }
    }

    fn ticks(&self) -> impl Iterator<Item = f64> + '_ {
        let first = (self.min / self.step).ceil() as i64;
        let last = (self.max / self.step + 1e-9).floor() as i64;
        (first..=last).map(move |i| i as f64 * self.step)
    }

    /// Fraction of the way along the axis, clamped to `[0, 1]`.
    fn position(&self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let factor = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    factor * magnitude
}

struct Plot {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl Plot {
    fn x(&self, axis: &Axis, value: f64) -> f64 {
        self.left + axis.position(value) * (self.right - self.left)
    }

    fn y(&self, axis: &Axis, value: f64) -> f64 {
        self.bottom - axis.position(value) * (self.bottom - self.top)
    }
}

/// Line-oriented SVG text buffer.
struct SvgDoc(String);

impl SvgDoc {
    fn line(&mut self, args: fmt::Arguments<'_>) {
        self.0.push_str(&args.to_string());
        self.0.push('\n');
    }
}

/// Dual-axis line chart: total assets on the left axis and the monthly
/// withdrawal on the right, both in units of 10,000, against age.
pub fn render_svg(series: &ProjectionSeries) -> String {
    let records = series.records();
    let first_age = records.first().map_or(0, |r| r.age) as f64;
    let last_age = records.last().map_or(0, |r| r.age) as f64;

    let max_assets = records
        .iter()
        .map(|r| r.balance / DISPLAY_UNIT)
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);
    let max_withdrawal = records
        .iter()
        .map(|r| r.monthly_withdrawal / DISPLAY_UNIT)
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);

    let x_axis = Axis::span(first_age, last_age, 10);
    let left_axis = Axis::zero_based(max_assets, Y_TICKS);
    let right_axis = Axis::zero_based(max_withdrawal, Y_TICKS);
    let plot = Plot {
        left: MARGIN_LEFT,
        right: WIDTH - MARGIN_RIGHT,
        top: MARGIN_TOP,
        bottom: HEIGHT - MARGIN_BOTTOM,
    };

    let mut svg = SvgDoc(String::new());
    svg.line(format_args!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif" font-size="12">"#
    ));
    svg.line(format_args!(
        r#"<rect x="0" y="0" width="{WIDTH}" height="{HEIGHT}" fill="white"/>"#
    ));
    svg.line(format_args!(
        r#"<text x="{}" y="32" text-anchor="middle" font-size="18">Asset Balance and Monthly Withdrawal by Age</text>"#,
        WIDTH / 2.0
    ));

    // Grid and left ticks share the left axis scale.
    for tick in left_axis.ticks() {
        let y = plot.y(&left_axis, tick);
        svg.line(format_args!(
            r##"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#cccccc" stroke-dasharray="4 4"/>"##,
            plot.left, plot.right
        ));
        svg.line(format_args!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end" fill="{ASSET_COLOR}">{}</text>"#,
            plot.left - 8.0,
            y + 4.0,
            format_units(tick * DISPLAY_UNIT)
        ));
    }
    for tick in right_axis.ticks() {
        let y = plot.y(&right_axis, tick);
        svg.line(format_args!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="start" fill="{WITHDRAWAL_COLOR}">{}</text>"#,
            plot.right + 8.0,
            y + 4.0,
            format_units(tick * DISPLAY_UNIT)
        ));
    }
    for tick in x_axis.ticks() {
        let x = plot.x(&x_axis, tick);
        svg.line(format_args!(
            r##"<line x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}" stroke="#cccccc" stroke-dasharray="4 4"/>"##,
            plot.top, plot.bottom
        ));
        svg.line(format_args!(
            r#"<text x="{x:.1}" y="{:.1}" text-anchor="middle">{tick}</text>"#,
            plot.bottom + 18.0
        ));
    }

    svg.line(format_args!(
        r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="black"/>"#,
        plot.left,
        plot.top,
        plot.right - plot.left,
        plot.bottom - plot.top
    ));

    svg.line(format_args!(
        r#"<text x="{}" y="{}" text-anchor="middle">Age</text>"#,
        WIDTH / 2.0,
        HEIGHT - 16.0
    ));
    svg.line(format_args!(
        r#"<text transform="translate(22 {}) rotate(-90)" text-anchor="middle" fill="{ASSET_COLOR}">Total Assets (10,000)</text>"#,
        HEIGHT / 2.0
    ));
    svg.line(format_args!(
        r#"<text transform="translate({} {}) rotate(90)" text-anchor="middle" fill="{WITHDRAWAL_COLOR}">Monthly Withdrawal (10,000)</text>"#,
        WIDTH - 22.0,
        HEIGHT / 2.0
    ));

    push_polyline(&mut svg, &plot, &x_axis, &left_axis, ASSET_COLOR, series, |r| {
        r.balance
    });
    push_polyline(&mut svg, &plot, &x_axis, &right_axis, WITHDRAWAL_COLOR, series, |r| {
        r.monthly_withdrawal
    });

    svg.line(format_args!(
        r#"<g font-size="13"><line x1="{0:.1}" y1="{1:.1}" x2="{2:.1}" y2="{1:.1}" stroke="{ASSET_COLOR}" stroke-width="2"/><text x="{3:.1}" y="{4:.1}">Total Assets</text></g>"#,
        plot.left + 10.0,
        plot.top + 16.0,
        plot.left + 34.0,
        plot.left + 40.0,
        plot.top + 20.0
    ));
    svg.line(format_args!(
        r#"<g font-size="13"><line x1="{0:.1}" y1="{1:.1}" x2="{2:.1}" y2="{1:.1}" stroke="{WITHDRAWAL_COLOR}" stroke-width="2"/><text x="{3:.1}" y="{4:.1}" text-anchor="end">Monthly Withdrawal</text></g>"#,
        plot.right - 34.0,
        plot.top + 16.0,
        plot.right - 10.0,
        plot.right - 40.0,
        plot.top + 20.0
    ));

    svg.line(format_args!("</svg>"));
    svg.0
}

fn push_polyline(
    svg: &mut SvgDoc,
    plot: &Plot,
    x_axis: &Axis,
    y_axis: &Axis,
    color: &str,
    series: &ProjectionSeries,
    value: impl Fn(&AnnualRecord) -> f64,
) {
    let points: Vec<String> = series
        .records()
        .iter()
        .map(|r| {
            let v = value(r) / DISPLAY_UNIT;
            let v = if v.is_infinite() && v > 0.0 { y_axis.max } else { v };
            format!(
                "{:.1},{:.1}",
                plot.x(x_axis, r.age as f64),
                plot.y(y_axis, v)
            )
        })
        .collect();
    svg.line(format_args!(
        r#"<polyline fill="none" stroke="{color}" stroke-width="2" points="{}"/>"#,
        points.join(" ")
    ));
}

pub fn write_svg(series: &ProjectionSeries, path: &Path) -> AppResult<()> {
    write_atomically(path, render_svg(series).as_bytes())?;
    tracing::info!(path = %path.display(), "chart written");
    Ok(())
}
