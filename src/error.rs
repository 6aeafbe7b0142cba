use diesel::result::DatabaseErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Stats API extraction failed: {message}")]
    Extract { message: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Raw dataset is missing required columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("Malformed value {value:?} in column {column} (row {row})")]
    MalformedValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Failed to truncate {table}: {message}")]
    TruncateFailure { table: String, message: String },

    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Database connection error: {message}")]
    Connection { message: String },

    #[error("Migration error: {message}")]
    Migration { message: String },

    #[error("Checkpoint {path}: {message}")]
    Checkpoint { path: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl EtlError {
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            EtlError::MissingColumns { .. }
                | EtlError::MalformedValue { .. }
                | EtlError::RaggedRow { .. }
        )
    }

    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            EtlError::TruncateFailure { .. } | EtlError::ConstraintViolation { .. }
        )
    }
}

impl From<std::io::Error> for EtlError {
    fn from(err: std::io::Error) -> Self {
        EtlError::Io {
            message: err.to_string(),
        }
    }
}

impl From<diesel::result::Error> for EtlError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                EtlError::ConstraintViolation {
                    message: info.message().to_string(),
                }
            }
            other => EtlError::Database {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_lists_every_column() {
        let err = EtlError::MissingColumns {
            columns: vec!["AGE".to_string(), "PTS".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Raw dataset is missing required columns: AGE, PTS"
        );
        assert!(err.is_schema_error());
        assert!(!err.is_load_error());
    }

    #[test]
    fn non_constraint_diesel_errors_map_to_database() {
        let err: EtlError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, EtlError::Database { .. }));
    }
}
