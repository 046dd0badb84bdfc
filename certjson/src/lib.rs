//! Normalizes X.509 certificates into flat JSON-serializable records.
//!
//! Input is PEM armored text or a bare DER byte stream, autodetected.
//! Each certificate becomes a [`CertificateRecord`] whose scalar fields
//! follow one documented rendering: byte strings as lowercase colon-hex,
//! validity instants as UTC epoch seconds plus ISO-8601, and OIDs as
//! snake_case symbolic names where a table knows them.
//!
//! The full pipeline reads as a chain of decode steps:
//!
//! `&[u8] → pem::Pem → Vec<u8> → der::Der → asn1::ASN1Object → Conversion`
//!
//! A certificate that does not decode structurally yields an error for
//! that certificate only. Anything softer (an odd name attribute, an
//! unknown algorithm, a malformed extension body) degrades to a neutral
//! rendering and a [`Warning`] beside the record.

#![forbid(unsafe_code)]

pub mod error;
pub mod extensions;
pub mod format;
pub mod name;
pub mod oid;
pub mod record;

use asn1::{ASN1Object, Element};
use der::Der;
use pem::{Label, Pem};

use codec::decoder::Decoder;

pub use error::{Error, Warning};
pub use extensions::{Extension, ExtnValue, GeneralNames};
pub use name::DistinguishedName;
pub use record::{
    AlgorithmIdentifier, CertificateRecord, Conversion, PublicKey, PublicKeyInfo, TbsCertificate,
    Validity,
};

/// The result of converting one certificate out of a batch.
pub type Outcome = Result<Conversion, Error>;

const PEM_MARKER: &str = "-----BEGIN";

/// Converts PEM text or a bare DER stream, autodetected. Returns one
/// outcome per certificate in source order.
pub fn convert(input: &[u8]) -> Result<Vec<Outcome>, Error> {
    if looks_like_pem(input) {
        convert_pem(std::str::from_utf8(input)?)
    } else {
        convert_der_stream(input)
    }
}

/// Converts every CERTIFICATE block of a PEM document. A block that
/// fails to decode yields its own error outcome without affecting the
/// blocks around it.
pub fn convert_pem(input: &str) -> Result<Vec<Outcome>, Error> {
    let blocks = pem::parse_many(input)?;
    let certificates: Vec<&Pem> = blocks
        .iter()
        .filter(|block| *block.label() == Label::Certificate)
        .collect();
    if certificates.is_empty() {
        return Err(Error::NoCertificate);
    }
    Ok(certificates
        .into_iter()
        .map(|block| {
            let bytes: Vec<u8> = block.decode()?;
            convert_der(&bytes)
        })
        .collect())
}

/// Converts a single DER-encoded certificate.
pub fn convert_der(input: &[u8]) -> Result<Conversion, Error> {
    let der: Der = input.decode()?;
    let object: ASN1Object = der.decode()?;
    object.decode()
}

fn convert_der_stream(input: &[u8]) -> Result<Vec<Outcome>, Error> {
    let der: Der = input.decode()?;
    if der.elements().is_empty() {
        return Err(Error::NoCertificate);
    }
    Ok(der
        .elements()
        .iter()
        .map(|tlv| {
            let element = Element::try_from(tlv)?;
            Conversion::try_from(&element)
        })
        .collect())
}

/// The unprocessed intermediate form: one type-tagged element tree per
/// certificate, before any semantic assembly.
pub fn raw_tree(input: &[u8]) -> Result<Vec<serde_json::Value>, Error> {
    let streams: Vec<Vec<u8>> = if looks_like_pem(input) {
        let blocks = pem::parse_many(std::str::from_utf8(input)?)?;
        let certificates: Vec<Vec<u8>> = blocks
            .iter()
            .filter(|block| *block.label() == Label::Certificate)
            .map(|block| block.decode())
            .collect::<Result<Vec<Vec<u8>>, pem::error::Error>>()?;
        certificates
    } else {
        vec![input.to_vec()]
    };
    if streams.is_empty() {
        return Err(Error::NoCertificate);
    }
    let mut trees = Vec::new();
    for stream in &streams {
        let der: Der = stream.as_slice().decode()?;
        let object: ASN1Object = der.decode()?;
        for element in object.elements() {
            trees.push(serde_json::to_value(element).map_err(|e| Error::Structure(e.to_string()))?);
        }
    }
    if trees.is_empty() {
        return Err(Error::NoCertificate);
    }
    Ok(trees)
}

fn looks_like_pem(input: &[u8]) -> bool {
    // Armor boundaries start a line. Binary DER is not valid UTF-8 and
    // routes to the DER path even if a string attribute happens to
    // contain the marker bytes.
    let Ok(text) = std::str::from_utf8(input) else {
        return false;
    };
    text.lines().any(|line| line.starts_with(PEM_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(matches!(convert(b""), Err(Error::NoCertificate)));
        assert!(matches!(raw_tree(b""), Err(Error::NoCertificate)));
    }

    #[test]
    fn test_pem_without_certificate_block_is_an_error() {
        let input = "-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----\n";
        assert!(matches!(
            convert(input.as_bytes()),
            Err(Error::NoCertificate)
        ));
    }

    #[test]
    fn test_der_with_embedded_boundary_bytes_routes_as_der() {
        // A SEQUENCE holding an OCTET STRING whose contents spell out an
        // armor boundary, padded with non-UTF-8 bytes.
        let mut input = vec![0x30, 0x10, 0x04, 0x0e];
        input.extend_from_slice(b"-----BEGIN");
        input.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        let outcomes = convert(&input).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], Err(Error::Structure(_))));
    }

    #[test]
    fn test_garbage_der_is_an_error() {
        assert!(convert(&[0x30, 0x82, 0xff, 0xff, 0x00]).is_err());
    }
}
