use serde_json::Value;

use crate::error::{SyncError, SyncResult};

/// Marker SWAPI uses for values it does not know.
pub const UNKNOWN_MARKER: &str = "unknown";

/// Stored in place of unknown or missing numerics; the target FLOAT columns
/// hold no NULL.
pub const SENTINEL: f64 = 0.0;

/// Coerce one raw field into a float.
///
/// `"unknown"` (exact, case-sensitive), `null` and missing values become
/// [`SENTINEL`]; JSON numbers are taken as-is; strings go through
/// [`parse_decimal_text`]. Anything else is an error for `column`.
pub fn coerce_numeric(column: &str, value: Option<&Value>) -> SyncResult<f64> {
    let fail = |shown: String| SyncError::Normalize {
        column: column.to_string(),
        value: shown,
    };
    match value {
        None | Some(Value::Null) => Ok(SENTINEL),
        Some(Value::String(s)) if s == UNKNOWN_MARKER => Ok(SENTINEL),
        Some(Value::String(s)) => parse_decimal_text(s).ok_or_else(|| fail(format!("{s:?}"))),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| fail(n.to_string())),
        Some(other) => Err(fail(other.to_string())),
    }
}

/// Parse numeric text that may use a comma as decimal separator.
///
/// Commas become periods (`"1,5"` → 1.5), except when they group whole
/// thousands (`"1,000"`, `"200,000,000"`), in which case they are dropped.
pub fn parse_decimal_text(raw: &str) -> Option<f64> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    let cleaned = if is_thousands_grouped(text) {
        text.replace(',', "")
    } else {
        text.replace(',', ".")
    };
    let parsed = cleaned.parse::<f64>().ok()?;
    // "inf"/"NaN" parse as f64 but are not numbers anyone wrote into SWAPI
    parsed.is_finite().then_some(parsed)
}

fn is_thousands_grouped(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let int_part = match digits.split_once('.') {
        Some((int_part, frac)) => {
            if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return false;
            }
            int_part
        }
        None => digits,
    };
    let mut groups = int_part.split(',');
    let Some(head) = groups.next() else {
        return false;
    };
    if head.is_empty() || head.len() > 3 || !head.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let mut saw_group = false;
    for g in groups {
        if g.len() != 3 || !g.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        saw_group = true;
    }
    saw_group
}
