/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use pulse_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by half an ULP at the target precision so exact midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        // `frac_str` looks like "0.50"; keep the ".50".
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative && result.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format an integer count with thousands separators.
///
/// ```
/// use pulse_core::formatting::format_count;
///
/// assert_eq!(format_count(1234), "1,234");
/// assert_eq!(format_count(-7), "-7");
/// ```
pub fn format_count(value: i64) -> String {
    if value < 0 {
        format!("-{}", group_thousands(&value.unsigned_abs().to_string()))
    } else {
        group_thousands(&value.to_string())
    }
}

/// Format a duration in days with one decimal place, or `"-"` when the
/// figure is undefined (e.g. the minimum of an empty series).
///
/// ```
/// use pulse_core::formatting::format_days;
///
/// assert_eq!(format_days(Some(5.0)), "5.0");
/// assert_eq!(format_days(Some(0.04)), "0.0");
/// assert_eq!(format_days(None), "-");
/// ```
pub fn format_days(days: Option<f64>) -> String {
    match days {
        Some(d) => format_number(d, 1),
        None => "-".to_string(),
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
