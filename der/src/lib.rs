//! DER(Distinguished Encoding Rules) tokenizer.
//!
//! This crate splits a DER byte stream into a tree of TLV(Tag, Length,
//! Value) triplets. It does not interpret the contents of primitive
//! values. That interpretation belongs to the `asn1` crate.

#![forbid(unsafe_code)]

pub mod error;

use nom::Parser as _;
use nom::bytes::complete::take;
use nom::number::complete::be_u8;

use codec::decoder::{DecodableFrom, Decoder};
use error::Error;

/// The constructed bit of an identifier octet.
pub const TAG_CONSTRUCTED: u8 = 0x20;

const CLASS_MASK: u8 = 0xc0;
const CLASS_CONTEXT_SPECIFIC: u8 = 0x80;
const TAG_NUMBER_MASK: u8 = 0x1f;

/// Universal tag numbers this tokenizer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTag {
    Boolean,
    Integer,
    BitString,
    OctetString,
    Null,
    ObjectIdentifier,
    UTF8String,
    Sequence,
    Set,
    PrintableString,
    IA5String,
    UTCTime,
    GeneralizedTime,
    Unknown(u8),
}

impl From<u8> for PrimitiveTag {
    fn from(number: u8) -> Self {
        match number {
            0x01 => PrimitiveTag::Boolean,
            0x02 => PrimitiveTag::Integer,
            0x03 => PrimitiveTag::BitString,
            0x04 => PrimitiveTag::OctetString,
            0x05 => PrimitiveTag::Null,
            0x06 => PrimitiveTag::ObjectIdentifier,
            0x0c => PrimitiveTag::UTF8String,
            0x10 => PrimitiveTag::Sequence,
            0x11 => PrimitiveTag::Set,
            0x13 => PrimitiveTag::PrintableString,
            0x16 => PrimitiveTag::IA5String,
            0x17 => PrimitiveTag::UTCTime,
            0x18 => PrimitiveTag::GeneralizedTime,
            n => PrimitiveTag::Unknown(n),
        }
    }
}

/// A decoded identifier octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// A universal-class tag such as INTEGER or SEQUENCE.
    Universal { tag: PrimitiveTag, constructed: bool },
    /// A context-specific tag such as `[0]` or `[3]`.
    ContextSpecific { slot: u8, constructed: bool },
    /// An application- or private-class tag, kept as the raw octet.
    Other(u8),
}

impl Tag {
    pub fn is_constructed(&self) -> bool {
        match self {
            Tag::Universal { constructed, .. } => *constructed,
            Tag::ContextSpecific { constructed, .. } => *constructed,
            Tag::Other(raw) => raw & TAG_CONSTRUCTED != 0,
        }
    }
}

impl From<u8> for Tag {
    fn from(raw: u8) -> Self {
        let constructed = raw & TAG_CONSTRUCTED != 0;
        match raw & CLASS_MASK {
            0x00 => Tag::Universal {
                tag: PrimitiveTag::from(raw & TAG_NUMBER_MASK),
                constructed,
            },
            CLASS_CONTEXT_SPECIFIC => Tag::ContextSpecific {
                slot: raw & TAG_NUMBER_MASK,
                constructed,
            },
            _ => Tag::Other(raw),
        }
    }
}

/// The contents octets of a TLV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Primitive(Vec<u8>),
    Constructed(Vec<Tlv>),
}

/// A single TLV triplet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    tag: Tag,
    length: usize,
    value: Value,
}

impl Tlv {
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// The contents octets if this TLV is primitive.
    pub fn data(&self) -> Option<&[u8]> {
        match &self.value {
            Value::Primitive(data) => Some(data),
            Value::Constructed(_) => None,
        }
    }

    /// The child TLVs if this TLV is constructed.
    pub fn tlvs(&self) -> Option<&[Tlv]> {
        match &self.value {
            Value::Constructed(tlvs) => Some(tlvs),
            Value::Primitive(_) => None,
        }
    }
}

/// A parsed DER stream. A stream may carry more than one top level
/// element, for example a file of concatenated certificates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Der {
    elements: Vec<Tlv>,
}

impl Der {
    pub fn elements(&self) -> &[Tlv] {
        &self.elements
    }
}

impl DecodableFrom<Vec<u8>> for Der {}
impl DecodableFrom<&[u8]> for Der {}

impl Decoder<Vec<u8>, Der> for Vec<u8> {
    type Error = Error;

    fn decode(&self) -> Result<Der, Self::Error> {
        parse(self)
    }
}

impl Decoder<&[u8], Der> for &[u8] {
    type Error = Error;

    fn decode(&self) -> Result<Der, Self::Error> {
        parse(self)
    }
}

fn parse(input: &[u8]) -> Result<Der, Error> {
    let mut elements = Vec::new();
    let mut rest = input;
    while !rest.is_empty() {
        let (remain, tlv) = parse_tlv(rest)?;
        elements.push(tlv);
        rest = remain;
    }
    Ok(Der { elements })
}

fn take_octet(input: &[u8]) -> nom::IResult<&[u8], u8> {
    be_u8(input)
}

fn take_bytes(input: &[u8], count: usize) -> nom::IResult<&[u8], &[u8]> {
    take(count).parse(input)
}

fn parse_tlv(input: &[u8]) -> Result<(&[u8], Tlv), Error> {
    let (rest, raw_tag) = take_octet(input)?;
    let tag = Tag::from(raw_tag);
    let (rest, length) = parse_length(rest)?;
    let (rest, contents) = take_bytes(rest, length)?;
    let value = if tag.is_constructed() {
        let mut tlvs = Vec::new();
        let mut inner = contents;
        while !inner.is_empty() {
            let (remain, tlv) = parse_tlv(inner)?;
            tlvs.push(tlv);
            inner = remain;
        }
        Value::Constructed(tlvs)
    } else {
        Value::Primitive(contents.to_vec())
    };
    Ok((rest, Tlv { tag, length, value }))
}

fn parse_length(input: &[u8]) -> Result<(&[u8], usize), Error> {
    let (rest, first) = take_octet(input)?;
    if first < 0x80 {
        return Ok((rest, first as usize));
    }
    if first == 0x80 {
        return Err(Error::IndefiniteLength);
    }
    let count = (first & 0x7f) as usize;
    if count > size_of::<usize>() {
        return Err(Error::LengthOverflow);
    }
    let (rest, octets) = take_bytes(rest, count)?;
    let length = octets
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);
    Ok((rest, length))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest(
        input,
        expected,
        case(0x02, Tag::Universal { tag: PrimitiveTag::Integer, constructed: false }),
        case(0x30, Tag::Universal { tag: PrimitiveTag::Sequence, constructed: true }),
        case(0x31, Tag::Universal { tag: PrimitiveTag::Set, constructed: true }),
        case(0x17, Tag::Universal { tag: PrimitiveTag::UTCTime, constructed: false }),
        case(0x80, Tag::ContextSpecific { slot: 0, constructed: false }),
        case(0xa0, Tag::ContextSpecific { slot: 0, constructed: true }),
        case(0xa3, Tag::ContextSpecific { slot: 3, constructed: true }),
        case(0x47, Tag::Other(0x47)),
    )]
    fn test_tag_from_octet(input: u8, expected: Tag) {
        assert_eq!(Tag::from(input), expected);
    }

    #[rstest(
        input,
        expected,
        case(&[0x05], 5),
        case(&[0x7f], 127),
        case(&[0x81, 0x80], 128),
        case(&[0x82, 0x01, 0x00], 256),
        case(&[0x82, 0x04, 0x6a], 1130),
    )]
    fn test_parse_length(input: &[u8], expected: usize) {
        let (rest, length) = parse_length(input).unwrap();
        assert!(rest.is_empty());
        assert_eq!(length, expected);
    }

    #[test]
    fn test_parse_length_indefinite() {
        assert_eq!(parse_length(&[0x80]), Err(Error::IndefiniteLength));
    }

    #[test]
    fn test_parse_primitive_tlv() {
        let input: &[u8] = &[0x02, 0x01, 0x05];
        let der = input.decode().unwrap();
        assert_eq!(der.elements().len(), 1);
        let tlv = &der.elements()[0];
        assert_eq!(
            tlv.tag(),
            &Tag::Universal {
                tag: PrimitiveTag::Integer,
                constructed: false
            }
        );
        assert_eq!(tlv.length(), 1);
        assert_eq!(tlv.data(), Some(&[0x05][..]));
        assert_eq!(tlv.tlvs(), None);
    }

    #[test]
    fn test_parse_constructed_tlv() {
        // SEQUENCE { INTEGER 1, INTEGER 2 }
        let input: Vec<u8> = vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02];
        let der = input.decode().unwrap();
        let tlv = &der.elements()[0];
        let children = tlv.tlvs().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].data(), Some(&[0x01][..]));
        assert_eq!(children[1].data(), Some(&[0x02][..]));
        assert_eq!(tlv.data(), None);
    }

    #[test]
    fn test_parse_context_specific_tlv() {
        // [0] { INTEGER 2 }, the version wrapper of a certificate
        let input: Vec<u8> = vec![0xa0, 0x03, 0x02, 0x01, 0x02];
        let der = input.decode().unwrap();
        let tlv = &der.elements()[0];
        assert_eq!(
            tlv.tag(),
            &Tag::ContextSpecific {
                slot: 0,
                constructed: true
            }
        );
        let children = tlv.tlvs().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].data(), Some(&[0x02][..]));
    }

    #[test]
    fn test_parse_multiple_top_level_elements() {
        let input: Vec<u8> = vec![0x02, 0x01, 0x01, 0x02, 0x01, 0x02];
        let der = input.decode().unwrap();
        assert_eq!(der.elements().len(), 2);
    }

    #[test]
    fn test_parse_truncated_input() {
        let input: &[u8] = &[0x30, 0x06, 0x02, 0x01];
        assert!(input.decode().is_err());
    }
}
