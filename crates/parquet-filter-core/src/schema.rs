//! Flat columnar schema model, first-line inference, and the single-line
//! message-text form persisted between the inference and encoding stages.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::{ConvertError, Result};

/// Name given to every persisted schema description
const MESSAGE_NAME: &str = "csv";

/// Primitive column types supported by the converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Boolean,
    Float,
    Double,
    Int32,
    Int64,
    Binary,
}

impl ColumnType {
    /// Keyword used in the message-text form and in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "boolean",
            ColumnType::Float => "float",
            ColumnType::Double => "double",
            ColumnType::Int32 => "int32",
            ColumnType::Int64 => "int64",
            ColumnType::Binary => "binary",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "boolean" => Some(ColumnType::Boolean),
            "float" => Some(ColumnType::Float),
            "double" => Some(ColumnType::Double),
            "int32" => Some(ColumnType::Int32),
            "int64" => Some(ColumnType::Int64),
            "binary" => Some(ColumnType::Binary),
            _ => None,
        }
    }
}

/// One ordered column of a [`Schema`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    /// 0-based position within the schema
    pub position: usize,
    pub column_type: ColumnType,
    pub required: bool,
}

/// Ordered, flat column schema with dense 0-based positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnDescriptor>,
}

impl Schema {
    /// Build a schema from descriptors, reassigning dense positions in order
    pub fn new(mut columns: Vec<ColumnDescriptor>) -> Self {
        for (position, column) in columns.iter_mut().enumerate() {
            column.position = position;
        }
        Schema { columns }
    }

    /// Build an all-binary, all-required schema from column names in order
    pub fn binary_columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(position, name)| ColumnDescriptor {
                name: name.into(),
                position,
                column_type: ColumnType::Binary,
                required: true,
            })
            .collect();
        Schema { columns }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Infer a schema from the first line of the file at `path`.
    ///
    /// Reads only the first line. An unreadable or empty source fails with a
    /// [`ConvertError::SchemaInference`].
    pub fn infer_from_file(path: &Path, delimiter: char) -> Result<Schema> {
        let file = File::open(path).map_err(|e| {
            ConvertError::schema_inference(format!("cannot open {}: {e}", path.display()))
        })?;
        let mut first_line = String::new();
        let read = BufReader::new(file).read_line(&mut first_line).map_err(|e| {
            ConvertError::schema_inference(format!(
                "cannot read first line of {}: {e}",
                path.display()
            ))
        })?;
        if read == 0 {
            return Err(ConvertError::schema_inference(format!(
                "{} is empty",
                path.display()
            )));
        }
        while first_line.ends_with('\n') || first_line.ends_with('\r') {
            first_line.pop();
        }
        Ok(Self::infer_from_line(&first_line, delimiter))
    }

    /// Infer a schema from a single line already stripped of its terminator.
    ///
    /// A line whose fields are all non-numeric and space-free is a header and
    /// names the columns verbatim. Any numeric-parsable or space-containing
    /// field makes the whole line data, yielding the default schema with
    /// positional names `"1".."N"`. Either way every column is binary:
    /// inference never assigns a narrower type.
    pub fn infer_from_line(line: &str, delimiter: char) -> Schema {
        let fields: Vec<&str> = line.split(delimiter).collect();
        let headerless = fields.iter().any(|field| {
            let trimmed = field.trim();
            numeric_parsable(trimmed) || trimmed.contains(' ')
        });
        if headerless {
            Schema::binary_columns((1..=fields.len()).map(|n| n.to_string()))
        } else {
            Schema::binary_columns(fields)
        }
    }

    /// Render the single-line message-text form, e.g.
    /// `message csv {required binary name = 1;required binary age = 2;}`.
    /// Positions are 1-based in the text.
    pub fn to_message_text(&self) -> String {
        let mut text = format!("message {MESSAGE_NAME} {{");
        for column in &self.columns {
            text.push_str(if column.required { "required " } else { "optional " });
            text.push_str(column.column_type.type_name());
            text.push(' ');
            text.push_str(&column.name);
            text.push_str(" = ");
            text.push_str(&(column.position + 1).to_string());
            text.push(';');
        }
        text.push('}');
        text
    }

    /// Re-parse a message-text schema description.
    ///
    /// The grammar is exactly what [`Schema::to_message_text`] emits; column
    /// names are recovered verbatim. Unknown type keywords and malformed
    /// entries fail with a [`ConvertError::Encoding`] naming the offender,
    /// since they indicate a schema/encoder mismatch.
    pub fn from_message_text(text: &str) -> Result<Schema> {
        let text = text.trim_end_matches(['\r', '\n']);
        let open = text.find('{').ok_or_else(|| malformed(text))?;
        let close = text.rfind('}').ok_or_else(|| malformed(text))?;
        if !text[..open].starts_with("message ") || close < open {
            return Err(malformed(text));
        }

        let mut columns = Vec::new();
        for entry in text[open + 1..close].split(';').filter(|e| !e.is_empty()) {
            let (required, rest) = if let Some(rest) = entry.strip_prefix("required ") {
                (true, rest)
            } else if let Some(rest) = entry.strip_prefix("optional ") {
                (false, rest)
            } else {
                return Err(ConvertError::encoding(format!(
                    "malformed schema field entry `{entry}`"
                )));
            };
            let (keyword, rest) = rest.split_once(' ').ok_or_else(|| {
                ConvertError::encoding(format!("malformed schema field entry `{entry}`"))
            })?;
            let (name, position) = rest.rsplit_once(" = ").ok_or_else(|| {
                ConvertError::encoding(format!("malformed schema field entry `{entry}`"))
            })?;
            let column_type = ColumnType::from_keyword(keyword).ok_or_else(|| {
                ConvertError::encoding(format!(
                    "unsupported column type `{keyword}` for column `{name}`"
                ))
            })?;
            let position: usize = position.parse().map_err(|_| {
                ConvertError::encoding(format!(
                    "invalid position `{position}` for column `{name}`"
                ))
            })?;
            if position != columns.len() + 1 {
                return Err(ConvertError::encoding(format!(
                    "non-contiguous position {position} for column `{name}`"
                )));
            }
            columns.push(ColumnDescriptor {
                name: name.to_string(),
                position: position - 1,
                column_type,
                required,
            });
        }
        Ok(Schema { columns })
    }
}

fn malformed(text: &str) -> ConvertError {
    ConvertError::encoding(format!("malformed schema description `{text}`"))
}

/// Conservative numeric check used for header detection: an optional leading
/// minus, at least one ASCII digit, at most one dot, and nothing else.
fn numeric_parsable(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    if unsigned.is_empty() || unsigned.ends_with('.') {
        return false;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in unsigned.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_header_line_names_columns_verbatim() {
        let schema = Schema::infer_from_line("name,real_age,favorite_food", ',');
        let names: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["name", "real_age", "favorite_food"]);
        assert!(schema
            .columns()
            .iter()
            .all(|c| c.column_type == ColumnType::Binary && c.required));
    }

    #[test]
    fn test_numeric_field_forces_default_schema() {
        let schema = Schema::infer_from_line("Ada,30,pie", ',');
        let names: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["1", "2", "3"]);
        assert!(schema.columns().iter().all(|c| c.column_type == ColumnType::Binary));
    }

    #[test]
    fn test_spaced_field_forces_default_schema() {
        let schema = Schema::infer_from_line("first name,food", ',');
        let names: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["1", "2"]);
    }

    #[test]
    fn test_column_count_matches_field_count() {
        // Trailing empty fields still count.
        let schema = Schema::infer_from_line("a,b,", ',');
        assert_eq!(schema.len(), 3);
        let schema = Schema::infer_from_line("1,2,", ',');
        assert_eq!(schema.len(), 3);
        let names: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["1", "2", "3"]);
    }

    #[test]
    fn test_untrimmed_header_names_kept() {
        let schema = Schema::infer_from_line("name,\tage", ',');
        assert_eq!(schema.columns()[1].name, "\tage");
    }

    #[test]
    fn test_infer_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,real_age,favorite_food").unwrap();
        writeln!(file, "Ada,30,pie").unwrap();
        let schema = Schema::infer_from_file(file.path(), ',').unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.columns()[0].name, "name");
    }

    #[test]
    fn test_infer_from_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = Schema::infer_from_file(file.path(), ',').unwrap_err();
        assert!(matches!(err, ConvertError::SchemaInference(_)));
    }

    #[test]
    fn test_infer_from_missing_file() {
        let err = Schema::infer_from_file(Path::new("/nonexistent/input.csv"), ',').unwrap_err();
        assert!(matches!(err, ConvertError::SchemaInference(_)));
    }

    #[test]
    fn test_message_text_for_header_schema() {
        let schema = Schema::infer_from_line("name,real_age,favorite_food", ',');
        assert_eq!(
            schema.to_message_text(),
            "message csv {required binary name = 1;\
             required binary real_age = 2;\
             required binary favorite_food = 3;}"
        );
    }

    #[test]
    fn test_message_text_for_default_schema() {
        let schema = Schema::infer_from_line("99,bad row,x", ',');
        assert_eq!(
            schema.to_message_text(),
            "message csv {required binary 1 = 1;required binary 2 = 2;required binary 3 = 3;}"
        );
    }

    #[test]
    fn test_message_text_round_trip() {
        let schema = Schema::infer_from_line("name,\tage,favorite_food", ',');
        let parsed = Schema::from_message_text(&schema.to_message_text()).unwrap();
        assert_eq!(parsed, schema);
    }

    #[test]
    fn test_parse_typed_message_text() {
        let schema = Schema::from_message_text(
            "message csv {required int32 id = 1;required double score = 2;optional binary note = 3;}",
        )
        .unwrap();
        assert_eq!(schema.columns()[0].column_type, ColumnType::Int32);
        assert_eq!(schema.columns()[1].column_type, ColumnType::Double);
        assert!(!schema.columns()[2].required);
        assert_eq!(schema.columns()[2].position, 2);
    }

    #[test]
    fn test_parse_unknown_type_names_column() {
        let err = Schema::from_message_text("message csv {required int96 ts = 1;}").unwrap_err();
        match err {
            ConvertError::Encoding(msg) => {
                assert!(msg.contains("int96"));
                assert!(msg.contains("ts"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_gaps_in_positions() {
        let err =
            Schema::from_message_text("message csv {required binary a = 1;required binary b = 3;}")
                .unwrap_err();
        assert!(matches!(err, ConvertError::Encoding(_)));
    }

    #[test]
    fn test_numeric_parsable() {
        assert!(numeric_parsable("30"));
        assert!(numeric_parsable("-1.5"));
        assert!(numeric_parsable(".5"));
        assert!(!numeric_parsable("3."));
        assert!(!numeric_parsable(""));
        assert!(!numeric_parsable("-"));
        assert!(!numeric_parsable("1e5"));
        assert!(!numeric_parsable("age"));
        assert!(!numeric_parsable("1.2.3"));
    }
}
