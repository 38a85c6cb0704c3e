//! Numeric form values
//!
//! Parsing and printing of numbers the way page script sees them, shared
//! by range sanitizing here and by the input bindings built on top.

/// Lenient number parsing: skips leading whitespace and reads the longest
/// numeric prefix, so `"12px"` is 12. `NaN` is not a number here.
pub fn parse_float(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        return Some(if s.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY });
    }

    let mut seen_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        seen_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            seen_digit = true;
        }
    }
    if !seen_digit {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Print a value the way page script does: `100`, `2.5`, `1e+21`, `1e-7`
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() };
    }

    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return value.to_string();
    }

    // Shortest digits in exponent form; positive exponents carry a sign
    let exp = format!("{value:e}");
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
        _ => exp,
    }
}

/// `[min, max]` of a range input from its attributes, defaulting to
/// `[0, 100]`. A `max` below `min` collapses to `min`.
pub fn range_bounds(min: Option<&str>, max: Option<&str>) -> (f64, f64) {
    let read = |attr: Option<&str>, default: f64| {
        attr.and_then(parse_float)
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    };
    let min = read(min, 0.0);
    (min, read(max, 100.0).max(min))
}
