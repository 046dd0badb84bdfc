//! Distinguished name flattening.
//!
//! An X.501 Name is a SEQUENCE of RDNs, each a SET of attribute
//! type/value pairs. The flat form is an ordered mapping keyed by the
//! symbolic attribute name. A type that appears once maps to its bare
//! string value; repeats (across RDNs or inside a multi-valued RDN)
//! accumulate into an array in source order.

use asn1::Element;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::error::{Error, Warning};
use crate::oid;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    entries: Vec<(String, Vec<String>)>,
}

impl DistinguishedName {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All values recorded for an attribute key, in source order.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    fn push(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Flattens an RDN sequence. The outer shape must be a SEQUENCE of
    /// SETs; anything less is a structural failure of the whole name.
    /// Problems inside a single attribute degrade to a warning instead.
    pub fn from_element(
        element: &Element,
        field: &str,
        warnings: &mut Vec<Warning>,
    ) -> Result<Self, Error> {
        let Element::Sequence(rdns) = element else {
            return Err(Error::Structure(format!("{field} is not an RDN sequence")));
        };
        let mut name = DistinguishedName::default();
        for rdn in rdns {
            let Element::Set(attributes) = rdn else {
                warnings.push(Warning::field_decode(field, "RDN is not a SET"));
                continue;
            };
            for attribute in attributes {
                let Element::Sequence(pair) = attribute else {
                    warnings.push(Warning::field_decode(
                        field,
                        "attribute is not a type/value pair",
                    ));
                    continue;
                };
                let [Element::ObjectIdentifier(attribute_type), value] = pair.as_slice() else {
                    warnings.push(Warning::field_decode(
                        field,
                        "attribute is not a type/value pair",
                    ));
                    continue;
                };
                let dotted = attribute_type.to_string();
                let key = match oid::attribute_type(&dotted) {
                    Some(known) => known.to_string(),
                    None => {
                        warnings.push(Warning::field_decode(
                            field,
                            format!("unrecognized attribute type {dotted}"),
                        ));
                        dotted
                    }
                };
                match attribute_value_text(value) {
                    Some(text) => name.push(key, text),
                    None => warnings.push(Warning::field_decode(
                        field,
                        format!("attribute {key} has a non-string value"),
                    )),
                }
            }
        }
        Ok(name)
    }
}

fn attribute_value_text(value: &Element) -> Option<String> {
    match value {
        Element::UTF8String(text)
        | Element::PrintableString(text)
        | Element::IA5String(text) => Some(text.clone()),
        _ => None,
    }
}

impl Serialize for DistinguishedName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, values) in &self.entries {
            match values.as_slice() {
                [single] => map.serialize_entry(key, single)?,
                many => map.serialize_entry(key, many)?,
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec::decoder::Decoder;
    use der::Der;

    fn name_from_der(input: &[u8]) -> (DistinguishedName, Vec<Warning>) {
        let der: Der = input.decode().unwrap();
        let element = Element::try_from(&der.elements()[0]).unwrap();
        let mut warnings = Vec::new();
        let name = DistinguishedName::from_element(&element, "subject", &mut warnings).unwrap();
        (name, warnings)
    }

    // SEQUENCE { SET { SEQ { 2.5.4.6, "US" } }, SET { SEQ { 2.5.4.3, "a" } } }
    const SIMPLE_NAME: &[u8] = &[
        0x30, 0x19, 0x31, 0x0b, 0x30, 0x09, 0x06, 0x03, 0x55, 0x04, 0x06, 0x13, 0x02, 0x55, 0x53,
        0x31, 0x0a, 0x30, 0x08, 0x06, 0x03, 0x55, 0x04, 0x03, 0x0c, 0x01, 0x61,
    ];

    #[test]
    fn test_flatten_simple_name() {
        let (name, warnings) = name_from_der(SIMPLE_NAME);
        assert!(warnings.is_empty());
        assert_eq!(name.get("country_name"), Some(&["US".to_string()][..]));
        assert_eq!(name.get("common_name"), Some(&["a".to_string()][..]));
        let json = serde_json::to_value(&name).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "country_name": "US", "common_name": "a" })
        );
    }

    // Two RDNs carrying the same attribute type 2.5.4.11
    const REPEATED_OU: &[u8] = &[
        0x30, 0x18, 0x31, 0x0a, 0x30, 0x08, 0x06, 0x03, 0x55, 0x04, 0x0b, 0x0c, 0x01, 0x61, 0x31,
        0x0a, 0x30, 0x08, 0x06, 0x03, 0x55, 0x04, 0x0b, 0x0c, 0x01, 0x62,
    ];

    #[test]
    fn test_repeated_attribute_type_accumulates_in_order() {
        let (name, warnings) = name_from_der(REPEATED_OU);
        assert!(warnings.is_empty());
        let json = serde_json::to_value(&name).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "organizational_unit_name": ["a", "b"] })
        );
    }

    // A multi-valued RDN: one SET holding two pairs of 2.5.4.3
    const MULTI_VALUE_RDN: &[u8] = &[
        0x30, 0x16, 0x31, 0x14, 0x30, 0x08, 0x06, 0x03, 0x55, 0x04, 0x03, 0x0c, 0x01, 0x61, 0x30,
        0x08, 0x06, 0x03, 0x55, 0x04, 0x03, 0x0c, 0x01, 0x62,
    ];

    #[test]
    fn test_multi_valued_rdn_accumulates_in_order() {
        let (name, warnings) = name_from_der(MULTI_VALUE_RDN);
        assert!(warnings.is_empty());
        assert_eq!(
            name.get("common_name"),
            Some(&["a".to_string(), "b".to_string()][..])
        );
    }

    // SEQUENCE { SET { SEQ { 1.2.3.4, "x" } } }
    const UNKNOWN_ATTRIBUTE: &[u8] = &[
        0x30, 0x0c, 0x31, 0x0a, 0x30, 0x08, 0x06, 0x03, 0x2a, 0x03, 0x04, 0x0c, 0x01, 0x78,
    ];

    #[test]
    fn test_unknown_attribute_retained_under_dotted_key() {
        let (name, warnings) = name_from_der(UNKNOWN_ATTRIBUTE);
        assert_eq!(name.get("1.2.3.4"), Some(&["x".to_string()][..]));
        assert_eq!(
            warnings,
            vec![Warning::field_decode(
                "subject",
                "unrecognized attribute type 1.2.3.4"
            )]
        );
    }

    #[test]
    fn test_non_sequence_is_structural() {
        let mut warnings = Vec::new();
        let result =
            DistinguishedName::from_element(&Element::Null, "issuer", &mut warnings);
        assert!(matches!(result, Err(Error::Structure(_))));
    }
}
