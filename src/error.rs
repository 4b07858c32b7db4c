use crate::DiseaseId;
use thiserror::Error;

/// The disease forest could not be indexed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("disease id {0} appears more than once in the hierarchy")]
    DuplicateId(DiseaseId),
}

/// A request to one of the JSON endpoints failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("unexpected response: {0}")]
    Decode(String),
    /// The server answered, but with an `error` field instead of data.
    #[error("{0}")]
    Lookup(String),
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}
