#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("failed to decode DER: {0}")]
    Der(#[from] der::error::Error),
    #[error("invalid boolean contents")]
    InvalidBoolean,
    #[error("invalid bit string contents")]
    InvalidBitString,
    #[error("invalid object identifier contents")]
    InvalidObjectIdentifier,
    #[error("invalid string contents: {0}")]
    InvalidString(#[from] std::str::Utf8Error),
    #[error("invalid time contents: {0}")]
    InvalidTime(String),
    #[error("constructed value has no children")]
    MissingChildren,
    #[error("primitive value has no contents")]
    MissingContents,
}
