//! ASN.1 value layer.
//!
//! This crate turns the TLV tree produced by the `der` crate into typed
//! ASN.1 values. It stays schema free. Assigning meaning to a SEQUENCE
//! (a certificate, a name, an extension) is the job of the `certjson`
//! crate.

#![forbid(unsafe_code)]

pub mod error;

use std::fmt;

use chrono::{Datelike, NaiveDateTime};
use num_bigint::BigInt;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use codec::decoder::{DecodableFrom, Decoder};
use der::{Der, PrimitiveTag, Tag, Tlv};
use error::Error;

const UTC_TIME_FORMAT: &str = "%y%m%d%H%M%SZ";
const GENERALIZED_TIME_FORMAT: &str = "%Y%m%d%H%M%SZ";
const ISO_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";

/// An INTEGER. Kept as a signed big integer together with access to its
/// contents octets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Integer(BigInt);

impl Integer {
    pub fn value(&self) -> &BigInt {
        &self.0
    }

    /// The two's complement big endian octets of the value.
    pub fn to_signed_bytes_be(&self) -> Vec<u8> {
        self.0.to_signed_bytes_be()
    }
}

impl From<BigInt> for Integer {
    fn from(value: BigInt) -> Self {
        Integer(value)
    }
}

/// A BIT STRING. `unused` counts the trailing bits of the last octet
/// that carry no information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitString {
    unused: u8,
    data: Vec<u8>,
}

impl BitString {
    pub fn new(unused: u8, data: Vec<u8>) -> Self {
        BitString { unused, data }
    }

    pub fn unused(&self) -> u8 {
        self.unused
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Serialize for BitString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("unused_bits", &self.unused)?;
        map.serialize_entry("value", &colon_hex(&self.data))?;
        map.end()
    }
}

/// An OCTET STRING.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OctetString(Vec<u8>);

impl OctetString {
    pub fn data(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for OctetString {
    fn from(data: Vec<u8>) -> Self {
        OctetString(data)
    }
}

impl Serialize for OctetString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&colon_hex(&self.0))
    }
}

/// An OBJECT IDENTIFIER as a list of arcs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectIdentifier(Vec<u64>);

impl ObjectIdentifier {
    pub fn components(&self) -> &[u64] {
        &self.0
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dotted = self
            .0
            .iter()
            .map(|arc| arc.to_string())
            .collect::<Vec<String>>()
            .join(".");
        write!(f, "{dotted}")
    }
}

impl From<Vec<u64>> for ObjectIdentifier {
    fn from(components: Vec<u64>) -> Self {
        ObjectIdentifier(components)
    }
}

/// A typed ASN.1 value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Boolean(bool),
    Integer(Integer),
    BitString(BitString),
    OctetString(OctetString),
    Null,
    ObjectIdentifier(ObjectIdentifier),
    UTF8String(String),
    Sequence(Vec<Element>),
    Set(Vec<Element>),
    PrintableString(String),
    IA5String(String),
    UTCTime(NaiveDateTime),
    GeneralizedTime(NaiveDateTime),
    /// A constructed context-specific value such as `[0] { ... }`.
    ContextSpecific { slot: u8, elements: Vec<Element> },
    /// A primitive context-specific value. Its contents octets cannot be
    /// interpreted without knowing the implicit tag, so they are kept raw.
    ContextSpecificPrimitive { slot: u8, data: Vec<u8> },
    /// A value under a tag this layer does not interpret.
    Unsupported(Vec<u8>),
}

impl TryFrom<&Tlv> for Element {
    type Error = Error;

    fn try_from(tlv: &Tlv) -> Result<Self, Self::Error> {
        match *tlv.tag() {
            Tag::Universal { tag, .. } => decode_universal(tag, tlv),
            Tag::ContextSpecific { slot, constructed } => {
                if constructed {
                    let elements = decode_children(tlv)?;
                    Ok(Element::ContextSpecific { slot, elements })
                } else {
                    let data = tlv.data().ok_or(Error::MissingContents)?;
                    Ok(Element::ContextSpecificPrimitive {
                        slot,
                        data: data.to_vec(),
                    })
                }
            }
            Tag::Other(_) => Ok(Element::Unsupported(raw_contents(tlv))),
        }
    }
}

fn decode_universal(tag: PrimitiveTag, tlv: &Tlv) -> Result<Element, Error> {
    match tag {
        PrimitiveTag::Boolean => {
            let data = tlv.data().ok_or(Error::MissingContents)?;
            match data {
                [0x00] => Ok(Element::Boolean(false)),
                [_] => Ok(Element::Boolean(true)),
                _ => Err(Error::InvalidBoolean),
            }
        }
        PrimitiveTag::Integer => {
            let data = tlv.data().ok_or(Error::MissingContents)?;
            Ok(Element::Integer(Integer(BigInt::from_signed_bytes_be(
                data,
            ))))
        }
        PrimitiveTag::BitString => {
            let data = tlv.data().ok_or(Error::MissingContents)?;
            let (&unused, bits) = data.split_first().ok_or(Error::InvalidBitString)?;
            if unused > 7 {
                return Err(Error::InvalidBitString);
            }
            Ok(Element::BitString(BitString {
                unused,
                data: bits.to_vec(),
            }))
        }
        PrimitiveTag::OctetString => {
            let data = tlv.data().ok_or(Error::MissingContents)?;
            Ok(Element::OctetString(OctetString(data.to_vec())))
        }
        PrimitiveTag::Null => Ok(Element::Null),
        PrimitiveTag::ObjectIdentifier => {
            let data = tlv.data().ok_or(Error::MissingContents)?;
            Ok(Element::ObjectIdentifier(parse_object_identifier(data)?))
        }
        PrimitiveTag::UTF8String => {
            let data = tlv.data().ok_or(Error::MissingContents)?;
            Ok(Element::UTF8String(std::str::from_utf8(data)?.to_string()))
        }
        PrimitiveTag::Sequence => Ok(Element::Sequence(decode_children(tlv)?)),
        PrimitiveTag::Set => Ok(Element::Set(decode_children(tlv)?)),
        PrimitiveTag::PrintableString => {
            let data = tlv.data().ok_or(Error::MissingContents)?;
            Ok(Element::PrintableString(std::str::from_utf8(data)?.to_string()))
        }
        PrimitiveTag::IA5String => {
            let data = tlv.data().ok_or(Error::MissingContents)?;
            Ok(Element::IA5String(std::str::from_utf8(data)?.to_string()))
        }
        PrimitiveTag::UTCTime => {
            let data = tlv.data().ok_or(Error::MissingContents)?;
            let text = std::str::from_utf8(data)?.to_string();
            // Two digit years from 50 up mean 19xx (RFC 5280 4.1.2.5.1),
            // while chrono's %y pivots at 69.
            let time = NaiveDateTime::parse_from_str(&text, UTC_TIME_FORMAT)
                .ok()
                .and_then(|time| {
                    if time.year() >= 2050 {
                        time.with_year(time.year() - 100)
                    } else {
                        Some(time)
                    }
                })
                .ok_or(Error::InvalidTime(text))?;
            Ok(Element::UTCTime(time))
        }
        PrimitiveTag::GeneralizedTime => {
            let data = tlv.data().ok_or(Error::MissingContents)?;
            let text = std::str::from_utf8(data)?.to_string();
            let time = NaiveDateTime::parse_from_str(&text, GENERALIZED_TIME_FORMAT)
                .map_err(|_| Error::InvalidTime(text))?;
            Ok(Element::GeneralizedTime(time))
        }
        PrimitiveTag::Unknown(_) => Ok(Element::Unsupported(raw_contents(tlv))),
    }
}

fn decode_children(tlv: &Tlv) -> Result<Vec<Element>, Error> {
    tlv.tlvs()
        .ok_or(Error::MissingChildren)?
        .iter()
        .map(Element::try_from)
        .collect()
}

fn raw_contents(tlv: &Tlv) -> Vec<u8> {
    tlv.data().map(<[u8]>::to_vec).unwrap_or_default()
}

fn parse_object_identifier(data: &[u8]) -> Result<ObjectIdentifier, Error> {
    match data.last() {
        None => return Err(Error::InvalidObjectIdentifier),
        Some(last) if last & 0x80 != 0 => return Err(Error::InvalidObjectIdentifier),
        Some(_) => {}
    }
    let mut arcs = Vec::new();
    let mut acc: u64 = 0;
    for &octet in data {
        acc = (acc << 7) | (octet & 0x7f) as u64;
        if octet & 0x80 == 0 {
            arcs.push(acc);
            acc = 0;
        }
    }
    let first = arcs[0];
    let (root, second) = match first {
        0..=39 => (0, first),
        40..=79 => (1, first - 40),
        _ => (2, first - 80),
    };
    let mut components = vec![root, second];
    components.extend_from_slice(&arcs[1..]);
    Ok(ObjectIdentifier(components))
}

impl Serialize for Element {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct Constructed<'a> {
            slot: u8,
            elements: &'a [Element],
        }

        #[derive(Serialize)]
        struct Primitive {
            slot: u8,
            data: String,
        }

        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Element::Boolean(value) => map.serialize_entry("boolean", value)?,
            Element::Integer(value) => map.serialize_entry("integer", &value.0.to_string())?,
            Element::BitString(value) => map.serialize_entry("bit_string", value)?,
            Element::OctetString(value) => map.serialize_entry("octet_string", value)?,
            Element::Null => map.serialize_entry("null", &())?,
            Element::ObjectIdentifier(value) => {
                map.serialize_entry("object_identifier", &value.to_string())?
            }
            Element::UTF8String(value) => map.serialize_entry("utf8_string", value)?,
            Element::Sequence(elements) => map.serialize_entry("sequence", elements)?,
            Element::Set(elements) => map.serialize_entry("set", elements)?,
            Element::PrintableString(value) => map.serialize_entry("printable_string", value)?,
            Element::IA5String(value) => map.serialize_entry("ia5_string", value)?,
            Element::UTCTime(time) => {
                map.serialize_entry("utc_time", &time.format(ISO_TIME_FORMAT).to_string())?
            }
            Element::GeneralizedTime(time) => map.serialize_entry(
                "generalized_time",
                &time.format(ISO_TIME_FORMAT).to_string(),
            )?,
            Element::ContextSpecific { slot, elements } => map.serialize_entry(
                "context_specific",
                &Constructed {
                    slot: *slot,
                    elements,
                },
            )?,
            Element::ContextSpecificPrimitive { slot, data } => map.serialize_entry(
                "context_specific",
                &Primitive {
                    slot: *slot,
                    data: colon_hex(data),
                },
            )?,
            Element::Unsupported(data) => map.serialize_entry("unsupported", &colon_hex(data))?,
        }
        map.end()
    }
}

fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<String>>()
        .join(":")
}

/// The typed counterpart of a whole DER stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ASN1Object {
    elements: Vec<Element>,
}

impl ASN1Object {
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }
}

impl DecodableFrom<Der> for ASN1Object {}

impl Decoder<Der, ASN1Object> for Der {
    type Error = Error;

    fn decode(&self) -> Result<ASN1Object, Self::Error> {
        let elements = self
            .elements()
            .iter()
            .map(Element::try_from)
            .collect::<Result<Vec<Element>, Error>>()?;
        Ok(ASN1Object { elements })
    }
}

impl TryFrom<&OctetString> for ASN1Object {
    type Error = Error;

    /// Decodes the octets as a nested DER stream. Extension values are
    /// stored this way.
    fn try_from(octets: &OctetString) -> Result<Self, Self::Error> {
        let der: Der = octets.data().decode()?;
        der.decode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn decode_one(input: &[u8]) -> Element {
        let der: Der = input.decode().unwrap();
        Element::try_from(&der.elements()[0]).unwrap()
    }

    #[rstest(
        input,
        expected,
        case(&[0x01, 0x01, 0x00], false),
        case(&[0x01, 0x01, 0xff], true),
    )]
    fn test_decode_boolean(input: &[u8], expected: bool) {
        assert_eq!(decode_one(input), Element::Boolean(expected));
    }

    #[rstest(
        input,
        expected,
        case(&[0x02, 0x01, 0x00], 0),
        case(&[0x02, 0x01, 0x7f], 127),
        case(&[0x02, 0x02, 0x01, 0x00], 256),
        case(&[0x02, 0x01, 0xff], -1),
    )]
    fn test_decode_integer(input: &[u8], expected: i64) {
        assert_eq!(
            decode_one(input),
            Element::Integer(Integer(BigInt::from(expected)))
        );
    }

    #[rstest(
        input,
        expected,
        case(&[0x06, 0x03, 0x55, 0x04, 0x03], "2.5.4.3"),
        case(&[0x06, 0x03, 0x55, 0x1d, 0x0e], "2.5.29.14"),
        case(
            &[0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b],
            "1.2.840.113549.1.1.11"
        ),
        case(&[0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07], "1.2.840.10045.3.1.7"),
        case(&[0x06, 0x03, 0x60, 0x86, 0x48], "2.16.840"),
    )]
    fn test_decode_object_identifier(input: &[u8], expected: &str) {
        match decode_one(input) {
            Element::ObjectIdentifier(oid) => assert_eq!(oid.to_string(), expected),
            other => panic!("expected an object identifier, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_object_identifier_truncated_arc() {
        let der: Der = [0x06u8, 0x02, 0x2a, 0x86].as_slice().decode().unwrap();
        assert_eq!(
            Element::try_from(&der.elements()[0]),
            Err(Error::InvalidObjectIdentifier)
        );
    }

    #[test]
    fn test_decode_bit_string() {
        let element = decode_one(&[0x03, 0x02, 0x01, 0x06]);
        match element {
            Element::BitString(bits) => {
                assert_eq!(bits.unused(), 1);
                assert_eq!(bits.data(), &[0x06]);
            }
            other => panic!("expected a bit string, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_utc_time() {
        let element = decode_one(&[
            0x17, 0x0d, 0x32, 0x33, 0x30, 0x31, 0x30, 0x32, 0x30, 0x33, 0x30, 0x34, 0x30, 0x35,
            0x5a,
        ]);
        let expected = NaiveDate::from_ymd_opt(2023, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(element, Element::UTCTime(expected));
    }

    #[rstest(
        year_digits,
        year,
        case([0x34, 0x39], 2049),
        case([0x35, 0x35], 1955),
        case([0x39, 0x39], 1999),
    )]
    fn test_decode_utc_time_century_pivot(year_digits: [u8; 2], year: i32) {
        let mut input = vec![0x17, 0x0d];
        input.extend_from_slice(&year_digits);
        input.extend_from_slice(b"0102030405Z");
        let element = decode_one(&input);
        let expected = NaiveDate::from_ymd_opt(year, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(element, Element::UTCTime(expected));
    }

    #[test]
    fn test_decode_sequence() {
        let element = decode_one(&[0x30, 0x06, 0x02, 0x01, 0x01, 0x0c, 0x01, 0x61]);
        assert_eq!(
            element,
            Element::Sequence(vec![
                Element::Integer(Integer(BigInt::from(1))),
                Element::UTF8String("a".to_string()),
            ])
        );
    }

    #[test]
    fn test_decode_context_specific() {
        let element = decode_one(&[0xa0, 0x03, 0x02, 0x01, 0x02]);
        assert_eq!(
            element,
            Element::ContextSpecific {
                slot: 0,
                elements: vec![Element::Integer(Integer(BigInt::from(2)))],
            }
        );

        let element = decode_one(&[0x81, 0x02, 0x00, 0xff]);
        assert_eq!(
            element,
            Element::ContextSpecificPrimitive {
                slot: 1,
                data: vec![0x00, 0xff],
            }
        );
    }

    #[test]
    fn test_decode_nested_octet_string() {
        // OCTET STRING { SEQUENCE { BOOLEAN TRUE } }
        let element = decode_one(&[0x04, 0x05, 0x30, 0x03, 0x01, 0x01, 0xff]);
        let Element::OctetString(octets) = element else {
            panic!("expected an octet string");
        };
        let object = ASN1Object::try_from(&octets).unwrap();
        assert_eq!(
            object.elements(),
            &[Element::Sequence(vec![Element::Boolean(true)])]
        );
    }

    #[test]
    fn test_serialize_raw_tree() {
        let der: Der = [
            0x30u8, 0x0b, 0x06, 0x03, 0x55, 0x04, 0x03, 0x13, 0x04, 0x74, 0x65, 0x73, 0x74,
        ]
        .as_slice()
        .decode()
        .unwrap();
        let object: ASN1Object = der.decode().unwrap();
        let json = serde_json::to_value(&object).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {
                    "sequence": [
                        { "object_identifier": "2.5.4.3" },
                        { "printable_string": "test" },
                    ]
                }
            ])
        );
    }
}
