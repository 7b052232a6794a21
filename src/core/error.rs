use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Invalid usage: {0}")]
    InvalidUsage(String),

    #[error("Collection '{0}' is a child object and cannot be saved directly")]
    ChildSaveNotAllowed(String),

    #[error("Collection '{collection}' is invalid and cannot be saved: {}", broken_rules.join("; "))]
    Validation {
        collection: String,
        broken_rules: Vec<String>,
    },

    #[error("Collection '{0}' has busy objects and cannot be saved")]
    BusyObject(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;

impl GraphError {
    /// Returns `true` when the error originates at the persistence boundary.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for GraphError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for GraphError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
