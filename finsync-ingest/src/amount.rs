//! Argentine-style money amounts: "1.000.000,00", and the OCR variant
//! "5.370 63" where superscript cents come out as a space-separated pair.

/// Parse an amount string into a number.
///
/// Thousands dots are removed and the decimal separator (comma, or the single
/// space OCR leaves before superscript cents) becomes a point. A leading `-`
/// survives, so signed statement values parse as negative numbers.
pub fn normalize_amount(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace('.', "");
    let cleaned = cleaned.replacen(' ', ".", 1).replacen(',', ".", 1);
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
