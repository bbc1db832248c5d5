use thiserror::Error;

/// Error type for network data construction, transformation and export.
#[derive(Debug, Error)]
pub enum NetworkDataError {
    #[error("configuration error: {0}")]
    ConfigurationError(String),
    #[error("referential integrity error: {message} (offending value: {value})")]
    ReferentialIntegrityError { message: String, value: String },
    #[error("data integrity error: {0}")]
    DataIntegrityError(String),
    #[error(
        "unknown column '{column}' in {table} table (available: {})",
        .available.join(", ")
    )]
    UnknownColumnError {
        table: String,
        column: String,
        available: Vec<String>,
    },
    #[error("unsupported format '{format}' (supported: {})", .supported.join(", "))]
    UnsupportedFormatError {
        format: String,
        supported: Vec<String>,
    },
    #[error("query error: {0}")]
    QueryError(String),
    #[error("io error: {0}")]
    IoError(String),
}

impl NetworkDataError {
    pub fn configuration<T: Into<String>>(msg: T) -> Self {
        NetworkDataError::ConfigurationError(msg.into())
    }

    pub fn referential_integrity<M: Into<String>, V: Into<String>>(msg: M, value: V) -> Self {
        NetworkDataError::ReferentialIntegrityError {
            message: msg.into(),
            value: value.into(),
        }
    }

    pub fn data_integrity<T: Into<String>>(msg: T) -> Self {
        NetworkDataError::DataIntegrityError(msg.into())
    }

    pub fn unknown_column<T: Into<String>, C: Into<String>>(
        table: T,
        column: C,
        available: Vec<String>,
    ) -> Self {
        NetworkDataError::UnknownColumnError {
            table: table.into(),
            column: column.into(),
            available,
        }
    }

    pub fn unsupported_format<T: Into<String>>(format: T, supported: &[&str]) -> Self {
        NetworkDataError::UnsupportedFormatError {
            format: format.into(),
            supported: supported.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn query<T: Into<String>>(msg: T) -> Self {
        NetworkDataError::QueryError(msg.into())
    }

    pub fn io<T: Into<String>>(msg: T) -> Self {
        NetworkDataError::IoError(msg.into())
    }
}
