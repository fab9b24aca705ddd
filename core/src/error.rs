use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Metric '{name}' is already registered")]
    DuplicateMetric { name: String },

    #[error("Metric '{name}' is not registered")]
    UnknownMetric { name: String },

    #[error("Table '{name}' is not present in this run")]
    TableAbsent { name: String },

    #[error("Column '{column}' not found (available: {available})")]
    ColumnNotFound { column: String, available: String },

    #[error("Column '{column}' already exists")]
    DuplicateColumn { column: String },

    #[error("Invalid identifier '{ident}'")]
    InvalidIdentifier { ident: String },

    #[error("Unknown nuclide '{nuclide}'")]
    UnknownNuclide { nuclide: String },

    #[error("Malformed table '{table}': {reason}")]
    MalformedTable { table: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type QueryResult<T> = Result<T, QueryError>;
