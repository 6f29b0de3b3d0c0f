/// Chart axes show money in multiples of this.
pub const DISPLAY_UNIT: f64 = 10_000.0;

/// Whole-unit amount with thousands separators, e.g. `1234567.8 -> "1,234,568"`.
pub fn format_currency(value: f64) -> String {
    format_grouped(value, 0)
}

/// Amount expressed in [`DISPLAY_UNIT`]s with one decimal place.
pub fn format_units(value: f64) -> String {
    format_grouped(value / DISPLAY_UNIT, 1)
}

fn format_grouped(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }

    let digits = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits.as_str(), None),
    };

    let rounds_to_zero = digits.bytes().all(|b| b == b'0' || b == b'.');
    let mut out = String::with_capacity(digits.len() + int_part.len() / 3 + 1);
    if value < 0.0 && !rounds_to_zero {
        out.push('-');
    }

    let lead = int_part.len() % 3;
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (i + 3 - lead) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}
