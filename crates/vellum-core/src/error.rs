use thiserror::Error;

/// A selector directive that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid selector: {0:?}")]
    InvalidSelector(String),
}

/// Failure to load, store or validate a [`crate::Document`].
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document msgpack encode: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),
    #[error("document msgpack decode: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),
    #[error("invalid document: {0}")]
    Invalid(String),
}
