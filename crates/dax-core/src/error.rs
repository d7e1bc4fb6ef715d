use thiserror::Error;

/// Top-level error type for the Dax backend.
///
/// Storage, API and binary crates all return this type so that `?` works
/// across crate boundaries. The API layer maps each variant onto an HTTP
/// status and a GraphQL error code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DaxError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Password hashing error: {0}")]
    Password(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DaxError {
    /// Shorthand for a `NotFound` error keyed by a numeric node id.
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        DaxError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<toml::de::Error> for DaxError {
    fn from(err: toml::de::Error) -> Self {
        DaxError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DaxError {
    fn from(err: toml::ser::Error) -> Self {
        DaxError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DaxError {
    fn from(err: serde_json::Error) -> Self {
        DaxError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Dax operations.
pub type Result<T> = std::result::Result<T, DaxError>;
