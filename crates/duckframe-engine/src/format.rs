//! SQL literal rendering for the manual registration path.
//!
//! Text is escaped by doubling single quotes and nothing else. Inputs are
//! assumed to come from the caller's own process; do not route untrusted
//! text through here.

use std::fmt::Write;

use crate::table::Value;

/// Render `value` as a DuckDB literal. Never fails.
///
/// # Examples
///
/// ```
/// use duckframe_engine::format::format_value;
/// use duckframe_engine::table::Value;
///
/// assert_eq!(format_value(&Value::Text("O'Brien".into())), "'O''Brien'");
/// assert_eq!(format_value(&Value::Null), "NULL");
/// ```
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) if f.is_nan() => "'NaN'".to_string(),
        Value::Float(f) if f.is_infinite() => {
            if f.is_sign_positive() {
                "'inf'".to_string()
            } else {
                "'-inf'".to_string()
            }
        }
        Value::Float(f) => f.to_string(),
        Value::Text(s) => quote_text(s),
        Value::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
        Value::Timestamp(ts) => format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S%.f")),
        Value::Blob(bytes) => {
            let mut out = String::with_capacity(bytes.len() * 4 + 2);
            out.push('\'');
            for b in bytes {
                let _ = write!(out, "\\x{:02X}", b);
            }
            out.push('\'');
            out
        }
        // Lossy: the list is stored as its text rendering.
        Value::List(_) => quote_text(&value.to_string()),
    }
}

/// Single-quote `s`, doubling embedded single quotes.
pub fn quote_text(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Double-quote an identifier, doubling embedded double quotes.
pub fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_scalars() {
        assert_eq!(format_value(&Value::Int(-42)), "-42");
        assert_eq!(format_value(&Value::Float(1.5)), "1.5");
        assert_eq!(format_value(&Value::Bool(true)), "TRUE");
        assert_eq!(format_value(&Value::Bool(false)), "FALSE");
        assert_eq!(format_value(&Value::Null), "NULL");
    }

    #[test]
    fn test_text_quotes_are_doubled() {
        assert_eq!(format_value(&Value::Text("it's".into())), "'it''s'");
        assert_eq!(format_value(&Value::Text("".into())), "''");
    }

    #[test]
    fn test_dates() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(format_value(&Value::Date(d)), "'2024-02-29'");
        let ts = d.and_hms_opt(13, 5, 9).unwrap();
        assert_eq!(format_value(&Value::Timestamp(ts)), "'2024-02-29 13:05:09'");
    }

    #[test]
    fn test_non_finite_floats_are_quoted() {
        assert_eq!(format_value(&Value::Float(f64::NAN)), "'NaN'");
        assert_eq!(format_value(&Value::Float(f64::NEG_INFINITY)), "'-inf'");
    }

    #[test]
    fn test_list_is_quoted_text() {
        let v = Value::List(vec![Value::Text("a'b".into()), Value::Int(2)]);
        assert_eq!(format_value(&v), "'[''a''b'', 2]'");
    }

    #[test]
    fn test_blob() {
        assert_eq!(format_value(&Value::Blob(vec![0x00, 0xAB])), "'\\x00\\xAB'");
    }

    #[test]
    fn test_identifier_quoting() {
        assert_eq!(quote_identifier("count"), "\"count\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}
