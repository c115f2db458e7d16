/// Minimum rendered width of a ZIP code.
pub const ZIP_WIDTH: usize = 5;

/// Renders a ZIP-like cell as a zero-padded string of at least five digits.
///
/// Blank cells and spreadsheet `NaN` markers become `""`. Integral numeric
/// cells that were exported as floats (`7601.0`) lose their fractional part
/// before padding. Values longer than five characters, and values that are
/// not plain digits, are returned trimmed but otherwise untouched, so the
/// function is idempotent.
pub fn zfill_zip(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return String::new();
    }

    let digits = strip_integral_fraction(trimmed);
    if !is_ascii_digits(digits) || digits.len() >= ZIP_WIDTH {
        return digits.to_string();
    }

    let mut padded = "0".repeat(ZIP_WIDTH - digits.len());
    padded.push_str(digits);
    padded
}

fn strip_integral_fraction(value: &str) -> &str {
    match value.split_once('.') {
        Some((whole, fraction))
            if is_ascii_digits(whole)
                && !fraction.is_empty()
                && fraction.bytes().all(|byte| byte == b'0') =>
        {
            whole
        }
        _ => value,
    }
}

fn is_ascii_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}
