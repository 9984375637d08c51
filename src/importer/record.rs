//! Input file loading and per-record validation.

use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;

use super::{ImportError, ImportResult};

/// One element of the import file.
///
/// `kind` and `year` are carried for completeness but do not influence the import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRecord {
    pub quote: String,
    pub movie: String,
    pub kind: Option<String>,
    pub year: Option<i64>,
}

impl QuoteRecord {
    /// Validate a single array element.
    ///
    /// Missing keys are reported before type mismatches so the operator sees
    /// which field to add.
    pub fn from_value(index: usize, value: &Value) -> ImportResult<Self> {
        let object = value.as_object().ok_or_else(|| ImportError::InvalidRecord {
            index,
            reason: format!("expected an object, found {}", json_type_name(value)),
        })?;

        let quote = required_string(index, object.get("quote"), "quote")?;
        let movie = required_string(index, object.get("movie"), "movie")?;

        Ok(Self {
            quote,
            movie,
            kind: object.get("type").and_then(Value::as_str).map(str::to_string),
            year: object.get("year").and_then(Value::as_i64),
        })
    }
}

fn required_string(index: usize, value: Option<&Value>, field: &'static str) -> ImportResult<String> {
    match value {
        None => Err(ImportError::MissingField { index, field }),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Err(ImportError::InvalidRecord {
            index,
            reason: format!("'{field}' must be a string, found {}", json_type_name(other)),
        }),
    }
}

/// Read and parse the import file into its raw elements.
///
/// Nothing is validated beyond the top-level array here; records are checked
/// one at a time while importing.
pub async fn load_records(path: &Path) -> ImportResult<Vec<Value>> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(ImportError::FileNotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(ImportError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    match serde_json::from_str::<Value>(&contents)? {
        Value::Array(records) => Ok(records),
        other => Err(ImportError::NotAnArray(json_type_name(&other))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_complete_record() {
        let value = json!({"quote": "Here's looking at you, kid.", "movie": "Casablanca", "type": "movie", "year": 1942});
        let record = QuoteRecord::from_value(0, &value).expect("valid record");

        assert_eq!(record.quote, "Here's looking at you, kid.");
        assert_eq!(record.movie, "Casablanca");
        assert_eq!(record.kind.as_deref(), Some("movie"));
        assert_eq!(record.year, Some(1942));
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let record = QuoteRecord::from_value(0, &json!({"quote": "A", "movie": "M"}))
            .expect("valid record");
        assert_eq!(record.kind, None);
        assert_eq!(record.year, None);
    }

    #[test]
    fn reports_missing_keys_by_name() {
        let err = QuoteRecord::from_value(4, &json!({"movie": "M"})).unwrap_err();
        assert!(matches!(
            err,
            ImportError::MissingField {
                index: 4,
                field: "quote"
            }
        ));

        let err = QuoteRecord::from_value(1, &json!({"quote": "A"})).unwrap_err();
        assert!(matches!(err, ImportError::MissingField { field: "movie", .. }));
    }

    #[test]
    fn rejects_non_string_fields_and_non_objects() {
        let err = QuoteRecord::from_value(0, &json!({"quote": 12, "movie": "M"})).unwrap_err();
        assert!(matches!(err, ImportError::InvalidRecord { index: 0, .. }));

        let err = QuoteRecord::from_value(2, &json!(["quote", "movie"])).unwrap_err();
        assert!(matches!(err, ImportError::InvalidRecord { index: 2, .. }));
    }

    #[tokio::test]
    async fn missing_file_is_reported_with_its_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("movie_quotes.json");

        let err = load_records(&path).await.unwrap_err();
        match err {
            ImportError::FileNotFound(reported) => assert_eq!(reported, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("movie_quotes.json");
        std::fs::write(&path, r#"[{"quote": "A", "movie": }]"#).expect("write file");

        let err = load_records(&path).await.unwrap_err();
        assert!(matches!(err, ImportError::InvalidJson(_)));
        assert!(err.to_string().starts_with("Invalid JSON format"));
    }

    #[tokio::test]
    async fn top_level_must_be_an_array() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("movie_quotes.json");
        std::fs::write(&path, r#"{"quote": "A", "movie": "M"}"#).expect("write file");

        let err = load_records(&path).await.unwrap_err();
        assert!(matches!(err, ImportError::NotAnArray("an object")));
    }
}
