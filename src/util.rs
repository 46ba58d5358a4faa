// Utility helpers for label folding, cell coercion, and number formatting.
//
// This module centralizes all the "dirty" spreadsheet text/number handling so
// the rest of the code can assume clean, typed values.
use calamine::Data;
use num_format::{Locale, ToFormattedString};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold a label for robust matching: trim, lowercase, strip diacritics.
///
/// Source workbooks spell the same column "Agência", "AGENCIA" or
/// "agencia " depending on who exported them; after folding all three
/// compare equal. Decomposes to NFD and drops combining marks, so "Março"
/// folds to "marco".
pub fn fold(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Whether a folded agency cell is a non-value: blank, the literal "nan"
/// token an upstream export leaks, or an echo of the header label itself
/// ("agencia: ...") that some sheets repeat between blocks.
pub fn is_placeholder(folded: &str, agency_label: &str) -> bool {
    folded.is_empty() || folded == "nan" || folded.starts_with(&format!("{}:", agency_label))
}

/// Parse a string-like cell into `f64` while being forgiving about
/// formatting issues common in spreadsheet exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters (e.g. "N/D").
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_amount(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok()
}

/// Coerce a cell to a numeric value; anything unparseable is missing,
/// never zero. Sum-type reductions substitute zero later; averages and
/// activity counts must see the gap.
pub fn cell_to_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Render a cell as text for labels (agency names, header cells).
/// Numeric labels keep an integer rendering where exact.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => format!("{}", i),
        Data::Bool(b) => format!("{}", b),
        _ => String::new(),
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative();
    let abs_n = n.abs();
    // First, format to a plain fixed-decimal string like `1234567.89`.
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Use `num-format` to insert commas into the integer portion.
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values, used for
    // counts in console messages (e.g., `1,240 rows loaded`).
    n.to_formatted_string(&Locale::en)
}
