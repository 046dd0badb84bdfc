use std::fmt;

use serde::Serialize;

/// A structural failure. One of these fails the certificate it belongs
/// to, and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("failed to parse PEM: {0}")]
    Pem(#[from] pem::error::Error),
    #[error("failed to parse DER: {0}")]
    Der(#[from] der::error::Error),
    #[error("failed to decode ASN.1: {0}")]
    Asn1(#[from] asn1::error::Error),
    #[error("input is not valid UTF-8: {0}")]
    InvalidText(#[from] std::str::Utf8Error),
    #[error("invalid certificate structure: {0}")]
    Structure(String),
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("input holds no certificate")]
    NoCertificate,
}

/// A recoverable degradation. The record is still produced; the field
/// concerned falls back to a neutral rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    FieldDecode { field: String, reason: String },
    UnsupportedAlgorithm { oid: String },
}

impl Warning {
    pub fn field_decode(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Warning::FieldDecode {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported_algorithm(oid: impl Into<String>) -> Self {
        Warning::UnsupportedAlgorithm { oid: oid.into() }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::FieldDecode { field, reason } => {
                write!(f, "could not fully decode {field}: {reason}")
            }
            Warning::UnsupportedAlgorithm { oid } => {
                write!(f, "unrecognized algorithm identifier {oid}")
            }
        }
    }
}
