//! Certificate extension registry.
//!
//! Dispatch is a closed `match` over the extension OID. A registered
//! OID gets its typed decoder; everything else falls back to a hex
//! rendering of the DER-encoded extension body. A registered decoder
//! that fails never fails the certificate: the value degrades to `null`
//! and one warning is recorded.

use asn1::{ASN1Object, Element, OctetString};
use serde::Serialize;

use crate::error::{Error, Warning};
use crate::format::to_hex;
use crate::oid;

/// RFC 5280 §4.2.1.3 key usage bits, in bit order.
const KEY_USAGE_NAMES: [&str; 9] = [
    "digital_signature",
    "non_repudiation",
    "key_encipherment",
    "data_encipherment",
    "key_agreement",
    "key_cert_sign",
    "crl_sign",
    "encipher_only",
    "decipher_only",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extension {
    extn_id: String,
    critical: bool,
    extn_value: ExtnValue,
}

impl Extension {
    pub fn extn_id(&self) -> &str {
        &self.extn_id
    }

    pub fn critical(&self) -> bool {
        self.critical
    }

    pub fn value(&self) -> &ExtnValue {
        &self.extn_value
    }

    pub fn from_element(element: &Element, warnings: &mut Vec<Warning>) -> Result<Self, Error> {
        let Element::Sequence(parts) = element else {
            return Err(Error::Structure("extension is not a SEQUENCE".to_string()));
        };
        let (id, critical, body) = match parts.as_slice() {
            [Element::ObjectIdentifier(id), Element::OctetString(body)] => (id, false, body),
            [
                Element::ObjectIdentifier(id),
                Element::Boolean(critical),
                Element::OctetString(body),
            ] => (id, *critical, body),
            _ => {
                return Err(Error::Structure(
                    "extension is not an id/critical/value triplet".to_string(),
                ));
            }
        };
        let dotted = id.to_string();
        let (extn_id, extn_value) = match oid::extension(&dotted) {
            Some(name) => {
                let value = match decode_registered(name, body) {
                    Ok(value) => value,
                    Err(reason) => {
                        warnings.push(Warning::field_decode(format!("extensions.{name}"), reason));
                        ExtnValue::Malformed
                    }
                };
                (name.to_string(), value)
            }
            None => (dotted, ExtnValue::Generic(to_hex(body.data()))),
        };
        Ok(Extension {
            extn_id,
            critical,
            extn_value,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExtnValue {
    BasicConstraints {
        ca: bool,
        path_len_constraint: Option<String>,
    },
    KeyUsage(Vec<&'static str>),
    KeyIdentifier(String),
    AuthorityKeyIdentifier {
        key_identifier: Option<String>,
        authority_cert_issuer: Option<GeneralNames>,
        authority_cert_serial_number: Option<String>,
    },
    ExtendedKeyUsage(Vec<String>),
    SubjectAltName(Vec<String>),
    /// Hex fallback for extensions outside the registry.
    Generic(String),
    /// A registered extension whose body did not decode. Serializes as
    /// `null`.
    Malformed,
}

/// GeneralName strings, collapsed like distinguished name values: a
/// single name serializes as a bare string, several as an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GeneralNames {
    One(String),
    Many(Vec<String>),
}

fn decode_registered(name: &str, body: &OctetString) -> Result<ExtnValue, String> {
    let object = ASN1Object::try_from(body).map_err(|e| e.to_string())?;
    let element = object
        .elements()
        .first()
        .ok_or_else(|| "empty extension body".to_string())?;
    match name {
        "basic_constraints" => basic_constraints(element),
        "key_usage" => key_usage(element),
        "key_identifier" => key_identifier(element),
        "authority_key_identifier" => authority_key_identifier(element),
        "extended_key_usage" => extended_key_usage(element),
        "subject_alt_name" => subject_alt_name(element),
        // Recognized by name but carrying no typed decoder.
        _ => Ok(ExtnValue::Generic(to_hex(body.data()))),
    }
}

fn basic_constraints(element: &Element) -> Result<ExtnValue, String> {
    let Element::Sequence(children) = element else {
        return Err("basic constraints body is not a SEQUENCE".to_string());
    };
    let mut ca = false;
    let mut path_len_constraint = None;
    for child in children {
        match child {
            Element::Boolean(value) => ca = *value,
            Element::Integer(value) => path_len_constraint = Some(value.value().to_string()),
            _ => return Err("unexpected element in basic constraints".to_string()),
        }
    }
    Ok(ExtnValue::BasicConstraints {
        ca,
        path_len_constraint,
    })
}

fn key_usage(element: &Element) -> Result<ExtnValue, String> {
    let Element::BitString(bits) = element else {
        return Err("key usage body is not a BIT STRING".to_string());
    };
    let data = bits.data();
    if data.is_empty() && bits.unused() != 0 {
        return Err("empty key usage bit string claims unused bits".to_string());
    }
    let bit_count = data.len() * 8 - bits.unused() as usize;
    let get_bit = |i: usize| data[i / 8] & (0x80 >> (i % 8)) != 0;
    let names = (0..bit_count.min(KEY_USAGE_NAMES.len()))
        .filter(|&i| get_bit(i))
        .map(|i| KEY_USAGE_NAMES[i])
        .collect();
    Ok(ExtnValue::KeyUsage(names))
}

fn key_identifier(element: &Element) -> Result<ExtnValue, String> {
    let Element::OctetString(octets) = element else {
        return Err("key identifier body is not an OCTET STRING".to_string());
    };
    Ok(ExtnValue::KeyIdentifier(to_hex(octets.data())))
}

fn authority_key_identifier(element: &Element) -> Result<ExtnValue, String> {
    let Element::Sequence(children) = element else {
        return Err("authority key identifier body is not a SEQUENCE".to_string());
    };
    let mut key_identifier = None;
    let mut authority_cert_issuer = None;
    let mut authority_cert_serial_number = None;
    for child in children {
        match child {
            Element::ContextSpecificPrimitive { slot: 0, data } => {
                key_identifier = Some(to_hex(data));
            }
            Element::ContextSpecific { slot: 1, elements } => {
                let mut names = elements
                    .iter()
                    .map(general_name)
                    .collect::<Result<Vec<String>, String>>()?;
                authority_cert_issuer = Some(if names.len() == 1 {
                    GeneralNames::One(names.remove(0))
                } else {
                    GeneralNames::Many(names)
                });
            }
            Element::ContextSpecificPrimitive { slot: 2, data } => {
                authority_cert_serial_number = Some(to_hex(data));
            }
            _ => return Err("unexpected element in authority key identifier".to_string()),
        }
    }
    Ok(ExtnValue::AuthorityKeyIdentifier {
        key_identifier,
        authority_cert_issuer,
        authority_cert_serial_number,
    })
}

fn extended_key_usage(element: &Element) -> Result<ExtnValue, String> {
    let Element::Sequence(children) = element else {
        return Err("extended key usage body is not a SEQUENCE".to_string());
    };
    let purposes = children
        .iter()
        .map(|child| {
            let Element::ObjectIdentifier(purpose) = child else {
                return Err("key purpose is not an OBJECT IDENTIFIER".to_string());
            };
            let dotted = purpose.to_string();
            Ok(oid::eku_purpose(&dotted)
                .map(str::to_string)
                .unwrap_or(dotted))
        })
        .collect::<Result<Vec<String>, String>>()?;
    Ok(ExtnValue::ExtendedKeyUsage(purposes))
}

fn subject_alt_name(element: &Element) -> Result<ExtnValue, String> {
    let Element::Sequence(children) = element else {
        return Err("subject alt name body is not a SEQUENCE".to_string());
    };
    let names = children
        .iter()
        .map(general_name)
        .collect::<Result<Vec<String>, String>>()?;
    Ok(ExtnValue::SubjectAltName(names))
}

/// Renders a single GeneralName. String forms (rfc822Name, dNSName,
/// uniformResourceIdentifier) come through verbatim, an IPv4 iPAddress
/// as a dotted quad, anything else as hex.
fn general_name(element: &Element) -> Result<String, String> {
    match element {
        Element::ContextSpecificPrimitive { slot, data } => match slot {
            1 | 2 | 6 => String::from_utf8(data.clone())
                .map_err(|_| "general name is not valid UTF-8".to_string()),
            7 if data.len() == 4 => Ok(data
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<String>>()
                .join(".")),
            _ => Ok(to_hex(data)),
        },
        _ => Err("unsupported general name form".to_string()),
    }
}
