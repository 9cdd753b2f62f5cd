/// Credential endpoint failures. Abort the poll cycle.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("credential request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("credential endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("invalid credential response: {0}")]
    Malformed(String),
}

/// Data endpoint failures. Abort the poll cycle.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },
    #[error("{endpoint} response could not be decoded: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },
}

/// A single record carried a value that could not be parsed. The record is
/// skipped and the cycle continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field} {value:?}: {message}")]
pub struct ParseError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FieldServiceError {
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
}

pub type Result<T> = std::result::Result<T, FieldServiceError>;
