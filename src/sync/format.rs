//! Display formatting for optional numbers. Missing values render as `N/A`.

pub const NOT_AVAILABLE: &str = "N/A";

/// `$1,234.56`
pub fn money(value: Option<f64>) -> String {
    match value {
        Some(v) => {
            let sign = if v < 0.0 { "-" } else { "" };
            format!("{}${}", sign, grouped(v.abs(), 2))
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Value already expressed in percent: `12.34%`.
pub fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{:.2}%", v))
}

/// Signed percent for changes: `+3.10%`.
pub fn signed_percent(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{:+.2}%", v))
}

/// Fraction shown as percent: `0.1234` is `12.34%`.
pub fn fraction_percent(value: Option<f64>) -> String {
    percent(value.map(|v| v * 100.0))
}

pub fn decimal(value: Option<f64>, places: usize) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{:.*}", places, v))
}

/// Share quantity without trailing zeros: `10`, `0.001`.
pub fn quantity(value: Option<f64>) -> String {
    match value {
        Some(v) => {
            let text = format!("{:.3}", v);
            text.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Signed change with two places: `+1.10`.
pub fn signed_decimal(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{:+.2}", v))
}

/// Whole count with thousands separators: `5,000,000`.
pub fn count(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| grouped(v.round(), 0))
}

fn grouped(value: f64, places: usize) -> String {
    let text = format!("{:.*}", places, value);
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let mut out = String::with_capacity(text.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    out
}
