use std::path::PathBuf;

use thiserror::Error;

pub type ImportResult<T> = Result<T, ImportError>;

/// Every failure aborts the whole run. Rows written before the failure stay committed.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON format: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Invalid JSON format: expected an array of quote objects, found {0}")]
    NotAnArray(&'static str),
    #[error("Missing required field in JSON: '{field}' (record {index})")]
    MissingField { index: usize, field: &'static str },
    #[error("Invalid record {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
    #[error("Error loading quotes: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Error loading quotes: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Error writing progress output: {0}")]
    Output(#[source] std::io::Error),
}

impl ImportError {
    /// True for failures caused by the input file rather than the store.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ImportError::FileNotFound(_)
                | ImportError::InvalidJson(_)
                | ImportError::NotAnArray(_)
                | ImportError::MissingField { .. }
                | ImportError::InvalidRecord { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_input() {
        let err = ImportError::FileNotFound(PathBuf::from("/srv/movie_quotes.json"));
        assert_eq!(err.to_string(), "File not found: /srv/movie_quotes.json");

        let err = ImportError::MissingField {
            index: 3,
            field: "quote",
        };
        assert_eq!(
            err.to_string(),
            "Missing required field in JSON: 'quote' (record 3)"
        );
        assert!(err.is_input_error());
        assert!(!ImportError::Database(sqlx::Error::PoolTimedOut).is_input_error());

        let err = ImportError::from(sqlx::migrate::MigrateError::VersionMissing(7));
        assert!(err.to_string().starts_with("Error loading quotes:"));
        assert!(!err.is_input_error());
    }
}
