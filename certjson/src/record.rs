//! Certificate record assembly.
//!
//! The assembler walks the typed element tree of one certificate and
//! produces the flat JSON-serializable record. The envelope (the three
//! part outer SEQUENCE, the TBS skeleton, the serial number) must hold
//! or the certificate fails structurally. Everything interpretive (a
//! name, an algorithm, a time, an extension) degrades to a neutral
//! rendering plus a warning instead.

use asn1::{ASN1Object, Element};
use chrono::NaiveDateTime;
use num_traits::ToPrimitive;
use serde::Serialize;

use codec::decoder::{DecodableFrom, Decoder};
use der::Der;

use crate::error::{Error, Warning};
use crate::extensions::Extension;
use crate::format::{timestamp_pair, to_hex};
use crate::name::DistinguishedName;
use crate::oid;

/// The normalized form of one certificate. Serializes with exactly
/// these keys in this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateRecord {
    tbs_certificate: TbsCertificate,
    signature_algorithm: AlgorithmIdentifier,
    signature_value: Option<String>,
}

impl CertificateRecord {
    pub fn tbs_certificate(&self) -> &TbsCertificate {
        &self.tbs_certificate
    }

    pub fn signature_algorithm(&self) -> &AlgorithmIdentifier {
        &self.signature_algorithm
    }

    pub fn signature_value(&self) -> Option<&str> {
        self.signature_value.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TbsCertificate {
    version: String,
    serial_number: String,
    signature: AlgorithmIdentifier,
    issuer: Option<DistinguishedName>,
    validity: Validity,
    subject: Option<DistinguishedName>,
    subject_public_key_info: Option<PublicKeyInfo>,
    issuer_unique_id: Option<String>,
    subject_unique_id: Option<String>,
    extensions: Vec<Extension>,
}

impl TbsCertificate {
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn signature(&self) -> &AlgorithmIdentifier {
        &self.signature
    }

    pub fn issuer(&self) -> Option<&DistinguishedName> {
        self.issuer.as_ref()
    }

    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    pub fn subject(&self) -> Option<&DistinguishedName> {
        self.subject.as_ref()
    }

    pub fn subject_public_key_info(&self) -> Option<&PublicKeyInfo> {
        self.subject_public_key_info.as_ref()
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlgorithmIdentifier {
    algorithm: Option<String>,
    parameters: Option<String>,
}

impl AlgorithmIdentifier {
    pub fn algorithm(&self) -> Option<&str> {
        self.algorithm.as_deref()
    }

    pub fn parameters(&self) -> Option<&str> {
        self.parameters.as_deref()
    }

    fn unreadable() -> Self {
        AlgorithmIdentifier {
            algorithm: None,
            parameters: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validity {
    not_before: Option<i64>,
    not_before_iso: Option<String>,
    not_after: Option<i64>,
    not_after_iso: Option<String>,
}

impl Validity {
    pub fn not_before(&self) -> Option<i64> {
        self.not_before
    }

    pub fn not_after(&self) -> Option<i64> {
        self.not_after
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicKeyInfo {
    algorithm: AlgorithmIdentifier,
    public_key: PublicKey,
}

impl PublicKeyInfo {
    pub fn algorithm(&self) -> &AlgorithmIdentifier {
        &self.algorithm
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PublicKey {
    Rsa {
        modulus: String,
        public_exponent: u64,
    },
    /// The raw BIT STRING content for key types without a typed shape.
    Raw(String),
}

/// One converted certificate: the record plus the warnings accumulated
/// while assembling it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    record: CertificateRecord,
    warnings: Vec<Warning>,
}

impl Conversion {
    pub fn record(&self) -> &CertificateRecord {
        &self.record
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_record(self) -> CertificateRecord {
        self.record
    }
}

impl TryFrom<&Element> for Conversion {
    type Error = Error;

    fn try_from(element: &Element) -> Result<Self, Self::Error> {
        let Element::Sequence(parts) = element else {
            return Err(Error::Structure("certificate is not a SEQUENCE".to_string()));
        };
        let [tbs, signature_algorithm, signature_value] = parts.as_slice() else {
            return Err(Error::Structure(
                "certificate is not a three part SEQUENCE".to_string(),
            ));
        };
        let mut warnings = Vec::new();
        let tbs_certificate = assemble_tbs(tbs, &mut warnings)?;
        let signature_algorithm = algorithm_identifier(
            signature_algorithm,
            "signature_algorithm",
            oid::signature_algorithm,
            &mut warnings,
        );
        let signature_value = match signature_value {
            Element::BitString(bits) => Some(to_hex(bits.data())),
            _ => {
                warnings.push(Warning::field_decode(
                    "signature_value",
                    "not a BIT STRING",
                ));
                None
            }
        };
        Ok(Conversion {
            record: CertificateRecord {
                tbs_certificate,
                signature_algorithm,
                signature_value,
            },
            warnings,
        })
    }
}

impl DecodableFrom<ASN1Object> for Conversion {}

impl Decoder<ASN1Object, Conversion> for ASN1Object {
    type Error = Error;

    fn decode(&self) -> Result<Conversion, Self::Error> {
        let element = self.elements().first().ok_or(Error::NoCertificate)?;
        Conversion::try_from(element)
    }
}

fn assemble_tbs(element: &Element, warnings: &mut Vec<Warning>) -> Result<TbsCertificate, Error> {
    let Element::Sequence(parts) = element else {
        return Err(Error::Structure(
            "tbs certificate is not a SEQUENCE".to_string(),
        ));
    };
    let mut parts = parts.as_slice();
    // explicit [0] wrapper; absent means v1
    let version = match parts.first() {
        Some(Element::ContextSpecific { slot: 0, elements }) => {
            let version = version_string(elements, warnings);
            parts = &parts[1..];
            version
        }
        _ => "v1".to_string(),
    };
    if parts.len() < 6 {
        return Err(Error::Structure("tbs certificate is too short".to_string()));
    }
    let Element::Integer(serial) = &parts[0] else {
        return Err(Error::Structure(
            "serial number is not an INTEGER".to_string(),
        ));
    };
    let serial_number = to_hex(&serial.to_signed_bytes_be());
    let signature =
        algorithm_identifier(&parts[1], "signature", oid::signature_algorithm, warnings);
    let issuer = flatten_name(&parts[2], "issuer", warnings);
    let validity = assemble_validity(&parts[3], warnings);
    let subject = flatten_name(&parts[4], "subject", warnings);
    let subject_public_key_info = public_key_info(&parts[5], warnings);

    let mut issuer_unique_id = None;
    let mut subject_unique_id = None;
    let mut extensions = Vec::new();
    for part in &parts[6..] {
        match part {
            Element::ContextSpecificPrimitive { slot: 1, data } => {
                issuer_unique_id = Some(unique_id(data));
            }
            Element::ContextSpecificPrimitive { slot: 2, data } => {
                subject_unique_id = Some(unique_id(data));
            }
            Element::ContextSpecific { slot: 3, elements } => {
                extensions = extension_list(elements, warnings);
            }
            _ => warnings.push(Warning::field_decode(
                "tbs_certificate",
                "unexpected trailing element",
            )),
        }
    }

    Ok(TbsCertificate {
        version,
        serial_number,
        signature,
        issuer,
        validity,
        subject,
        subject_public_key_info,
        issuer_unique_id,
        subject_unique_id,
        extensions,
    })
}

fn version_string(elements: &[Element], warnings: &mut Vec<Warning>) -> String {
    let [Element::Integer(value)] = elements else {
        warnings.push(Warning::field_decode(
            "version",
            "version wrapper does not hold an INTEGER",
        ));
        return "v1".to_string();
    };
    match value.value().to_u64() {
        Some(n @ 0..=2) => format!("v{}", n + 1),
        Some(n) => {
            warnings.push(Warning::field_decode(
                "version",
                format!("out of range version integer {n}"),
            ));
            format!("v{}", n as u128 + 1)
        }
        None => {
            warnings.push(Warning::field_decode(
                "version",
                "version integer is out of range",
            ));
            "v1".to_string()
        }
    }
}

fn algorithm_identifier(
    element: &Element,
    field: &str,
    table: fn(&str) -> Option<&'static str>,
    warnings: &mut Vec<Warning>,
) -> AlgorithmIdentifier {
    let Element::Sequence(parts) = element else {
        warnings.push(Warning::field_decode(field, "not a SEQUENCE"));
        return AlgorithmIdentifier::unreadable();
    };
    let Some(Element::ObjectIdentifier(algorithm)) = parts.first() else {
        warnings.push(Warning::field_decode(
            field,
            "missing algorithm OBJECT IDENTIFIER",
        ));
        return AlgorithmIdentifier::unreadable();
    };
    let dotted = algorithm.to_string();
    let algorithm = match table(&dotted) {
        Some(name) => name.to_string(),
        None => {
            warnings.push(Warning::unsupported_algorithm(dotted.clone()));
            dotted
        }
    };
    let parameters = match parts.get(1) {
        None | Some(Element::Null) => None,
        Some(Element::ObjectIdentifier(parameter)) => {
            let dotted = parameter.to_string();
            Some(match oid::curve(&dotted) {
                Some(curve) => curve.to_string(),
                None => {
                    warnings.push(Warning::unsupported_algorithm(dotted.clone()));
                    dotted
                }
            })
        }
        Some(Element::OctetString(octets)) => Some(to_hex(octets.data())),
        Some(Element::BitString(bits)) => Some(to_hex(bits.data())),
        Some(_) => {
            warnings.push(Warning::field_decode(field, "unsupported parameters form"));
            None
        }
    };
    AlgorithmIdentifier {
        algorithm: Some(algorithm),
        parameters,
    }
}

fn flatten_name(
    element: &Element,
    field: &str,
    warnings: &mut Vec<Warning>,
) -> Option<DistinguishedName> {
    match DistinguishedName::from_element(element, field, warnings) {
        Ok(name) => Some(name),
        Err(error) => {
            warnings.push(Warning::field_decode(field, error.to_string()));
            None
        }
    }
}

fn assemble_validity(element: &Element, warnings: &mut Vec<Warning>) -> Validity {
    let times = match element {
        Element::Sequence(children) if children.len() == 2 => {
            [time_of(&children[0]), time_of(&children[1])]
        }
        _ => {
            warnings.push(Warning::field_decode("validity", "not a two part SEQUENCE"));
            [None, None]
        }
    };
    let [not_before, not_after] = times.map(|time| time.map(|t| timestamp_pair(&t)));
    if not_before.is_none() {
        warnings.push(Warning::field_decode(
            "validity.not_before",
            "unreadable time value",
        ));
    }
    if not_after.is_none() {
        warnings.push(Warning::field_decode(
            "validity.not_after",
            "unreadable time value",
        ));
    }
    let (not_before, not_before_iso) = not_before.map(|(e, i)| (Some(e), Some(i))).unwrap_or((None, None));
    let (not_after, not_after_iso) = not_after.map(|(e, i)| (Some(e), Some(i))).unwrap_or((None, None));
    Validity {
        not_before,
        not_before_iso,
        not_after,
        not_after_iso,
    }
}

fn time_of(element: &Element) -> Option<NaiveDateTime> {
    match element {
        Element::UTCTime(time) | Element::GeneralizedTime(time) => Some(*time),
        _ => None,
    }
}

fn public_key_info(element: &Element, warnings: &mut Vec<Warning>) -> Option<PublicKeyInfo> {
    let field = "subject_public_key_info";
    let Element::Sequence(parts) = element else {
        warnings.push(Warning::field_decode(field, "not a SEQUENCE"));
        return None;
    };
    let [algorithm_element, Element::BitString(bits)] = parts.as_slice() else {
        warnings.push(Warning::field_decode(
            field,
            "not an algorithm/key BIT STRING pair",
        ));
        return None;
    };
    let algorithm = algorithm_identifier(
        algorithm_element,
        "subject_public_key_info.algorithm",
        oid::public_key_algorithm,
        warnings,
    );
    let public_key = if algorithm.algorithm() == Some("rsa") {
        match rsa_public_key(bits.data()) {
            Ok(key) => key,
            Err(reason) => {
                warnings.push(Warning::field_decode(
                    "subject_public_key_info.public_key",
                    reason,
                ));
                PublicKey::Raw(to_hex(bits.data()))
            }
        }
    } else {
        PublicKey::Raw(to_hex(bits.data()))
    };
    Some(PublicKeyInfo {
        algorithm,
        public_key,
    })
}

fn rsa_public_key(data: &[u8]) -> Result<PublicKey, String> {
    let der: Der = data.decode().map_err(|e| e.to_string())?;
    let object: ASN1Object = der.decode().map_err(|e: asn1::error::Error| e.to_string())?;
    let [Element::Sequence(parts)] = object.elements() else {
        return Err("RSA public key is not a SEQUENCE".to_string());
    };
    let [Element::Integer(modulus), Element::Integer(exponent)] = parts.as_slice() else {
        return Err("RSA public key is not a modulus/exponent pair".to_string());
    };
    let public_exponent = exponent
        .value()
        .to_u64()
        .ok_or_else(|| "public exponent does not fit in 64 bits".to_string())?;
    Ok(PublicKey::Rsa {
        modulus: to_hex(&modulus.to_signed_bytes_be()),
        public_exponent,
    })
}

/// A unique ID is an implicitly tagged BIT STRING, so its first content
/// octet is the unused-bit count.
fn unique_id(data: &[u8]) -> String {
    data.split_first()
        .map(|(_, bits)| to_hex(bits))
        .unwrap_or_default()
}

fn extension_list(elements: &[Element], warnings: &mut Vec<Warning>) -> Vec<Extension> {
    let [Element::Sequence(items)] = elements else {
        warnings.push(Warning::field_decode(
            "extensions",
            "wrapper does not hold a SEQUENCE",
        ));
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match Extension::from_element(item, warnings) {
            Ok(extension) => Some(extension),
            Err(error) => {
                warnings.push(Warning::field_decode("extensions", error.to_string()));
                None
            }
        })
        .collect()
}
