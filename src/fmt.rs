/// Currency amount the way the charts overlay it: `R$ 1234.50`.
pub fn money(val: f64) -> String {
    format!("R$ {val:.2}")
}

/// Hectare total with two decimals: `12.50 ha`.
pub fn hectares(val: f64) -> String {
    format!("{val:.2} ha")
}

/// Plain decimal that keeps one fractional digit on whole numbers
/// (`2.0`, `0.25`), matching what earlier exports wrote.
pub fn decimal(val: f64) -> String {
    if val.is_finite() && val.fract() == 0.0 && val.abs() < 1e15 {
        format!("{val:.1}")
    } else {
        format!("{val}")
    }
}

/// Parse a user-typed decimal, accepting `,` as the decimal separator.
/// Blank input reads as zero.
pub fn parse_decimal(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
