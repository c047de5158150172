use thiserror::Error;

// Error types for the load pipeline
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("XML parse error: {0}")]
    XmlParseError(String),

    #[error("Shape mismatch in data row {row}: expected {expected} values, found {found}")]
    ShapeMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
