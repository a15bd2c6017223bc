//! Typed column values and the text-to-value dispatch.

use crate::{ColumnType, ConvertError, Result};

/// A single typed field value ready for columnar encoding
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Boolean(bool),
    Float(f32),
    Double(f64),
    Int32(i32),
    Int64(i64),
    Binary(Vec<u8>),
}

impl ColumnValue {
    /// Parse a textual field value according to its column's declared type.
    ///
    /// Boolean parsing is lenient: anything but a case-insensitive `true`
    /// is `false`, and it never fails. Numeric parsing fails with an
    /// encoding error on malformed text or overflow for the target width.
    /// Binary takes the raw bytes of the text.
    pub fn parse(column_type: ColumnType, text: &str) -> Result<Self> {
        match column_type {
            ColumnType::Boolean => Ok(ColumnValue::Boolean(text.eq_ignore_ascii_case("true"))),
            ColumnType::Float => text
                .parse::<f32>()
                .map(ColumnValue::Float)
                .map_err(|e| malformed(column_type, text, e)),
            ColumnType::Double => text
                .parse::<f64>()
                .map(ColumnValue::Double)
                .map_err(|e| malformed(column_type, text, e)),
            ColumnType::Int32 => text
                .parse::<i32>()
                .map(ColumnValue::Int32)
                .map_err(|e| malformed(column_type, text, e)),
            ColumnType::Int64 => text
                .parse::<i64>()
                .map(ColumnValue::Int64)
                .map_err(|e| malformed(column_type, text, e)),
            ColumnType::Binary => Ok(ColumnValue::Binary(text.as_bytes().to_vec())),
        }
    }

    /// Get the type name of the value
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnValue::Boolean(_) => "boolean",
            ColumnValue::Float(_) => "float",
            ColumnValue::Double(_) => "double",
            ColumnValue::Int32(_) => "int32",
            ColumnValue::Int64(_) => "int64",
            ColumnValue::Binary(_) => "binary",
        }
    }
}

fn malformed(column_type: ColumnType, text: &str, err: impl std::fmt::Display) -> ConvertError {
    ConvertError::encoding(format!(
        "malformed {} value `{text}`: {err}",
        column_type.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_parse_is_lenient() {
        assert_eq!(
            ColumnValue::parse(ColumnType::Boolean, "true").unwrap(),
            ColumnValue::Boolean(true)
        );
        assert_eq!(
            ColumnValue::parse(ColumnType::Boolean, "TRUE").unwrap(),
            ColumnValue::Boolean(true)
        );
        // Unrecognized text parses to false, never an error.
        assert_eq!(
            ColumnValue::parse(ColumnType::Boolean, "yes").unwrap(),
            ColumnValue::Boolean(false)
        );
        assert_eq!(
            ColumnValue::parse(ColumnType::Boolean, "1").unwrap(),
            ColumnValue::Boolean(false)
        );
    }

    #[test]
    fn test_numeric_parse() {
        assert_eq!(
            ColumnValue::parse(ColumnType::Int32, "42").unwrap(),
            ColumnValue::Int32(42)
        );
        assert_eq!(
            ColumnValue::parse(ColumnType::Int64, "-7").unwrap(),
            ColumnValue::Int64(-7)
        );
        assert_eq!(
            ColumnValue::parse(ColumnType::Double, "1.5").unwrap(),
            ColumnValue::Double(1.5)
        );
        assert_eq!(
            ColumnValue::parse(ColumnType::Float, "0.25").unwrap(),
            ColumnValue::Float(0.25)
        );
    }

    #[test]
    fn test_malformed_numeric_fails() {
        for ty in [ColumnType::Int32, ColumnType::Int64, ColumnType::Float, ColumnType::Double] {
            let err = ColumnValue::parse(ty, "bad").unwrap_err();
            assert!(matches!(err, ConvertError::Encoding(_)), "{ty:?}");
        }
    }

    #[test]
    fn test_int32_overflow_fails() {
        let err = ColumnValue::parse(ColumnType::Int32, "4294967296").unwrap_err();
        assert!(matches!(err, ConvertError::Encoding(_)));
        assert!(ColumnValue::parse(ColumnType::Int64, "4294967296").is_ok());
    }

    #[test]
    fn test_binary_takes_raw_bytes() {
        assert_eq!(
            ColumnValue::parse(ColumnType::Binary, "pie").unwrap(),
            ColumnValue::Binary(b"pie".to_vec())
        );
    }
}
