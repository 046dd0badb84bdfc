//! Scalar formatting helpers shared by the record assembler.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::Error;

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";
const ISO_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Renders bytes as lowercase two-digit hex pairs joined by colons, in
/// source order. Empty input renders as the empty string.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<String>>()
        .join(":")
}

/// The inverse of [`to_hex`].
pub fn from_hex(text: &str) -> Result<Vec<u8>, Error> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(':')
        .map(|pair| {
            if pair.len() != 2 {
                return Err(Error::InvalidHex(text.to_string()));
            }
            u8::from_str_radix(pair, 16).map_err(|_| Error::InvalidHex(text.to_string()))
        })
        .collect()
}

/// Renders UTC epoch seconds as an ISO-8601 string with an explicit
/// `+00:00` offset.
pub fn epoch_to_iso(epoch: i64) -> Result<String, Error> {
    let time = DateTime::<Utc>::from_timestamp(epoch, 0)
        .ok_or_else(|| Error::InvalidTimestamp(epoch.to_string()))?;
    Ok(time.format(ISO_FORMAT).to_string())
}

/// The inverse of [`epoch_to_iso`].
pub fn iso_to_epoch(text: &str) -> Result<i64, Error> {
    let time = DateTime::parse_from_str(text, ISO_PARSE_FORMAT)
        .map_err(|_| Error::InvalidTimestamp(text.to_string()))?;
    Ok(time.timestamp())
}

/// Epoch seconds and the ISO rendering of the same instant, taken as UTC.
pub(crate) fn timestamp_pair(time: &NaiveDateTime) -> (i64, String) {
    let utc = time.and_utc();
    (utc.timestamp(), utc.format(ISO_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest(
        input,
        expected,
        case(&[], ""),
        case(&[0x00], "00"),
        case(&[0xab], "ab"),
        case(&[0x0f, 0xf0, 0x00], "0f:f0:00"),
        case(&[0xde, 0xad, 0xbe, 0xef], "de:ad:be:ef"),
    )]
    fn test_to_hex(input: &[u8], expected: &str) {
        assert_eq!(to_hex(input), expected);
        assert_eq!(from_hex(expected).unwrap(), input);
    }

    #[rstest(input, case("a"), case("0g"), case("ab:"), case("abc:de"), case(":"))]
    fn test_from_hex_rejects(input: &str) {
        assert!(from_hex(input).is_err());
    }

    #[rstest(
        epoch,
        iso,
        case(0, "1970-01-01T00:00:00+00:00"),
        case(1306183101, "2011-05-23T20:38:21+00:00"),
        case(4102444800, "2100-01-01T00:00:00+00:00"),
    )]
    fn test_epoch_iso_round_trip(epoch: i64, iso: &str) {
        assert_eq!(epoch_to_iso(epoch).unwrap(), iso);
        assert_eq!(iso_to_epoch(iso).unwrap(), epoch);
    }

    #[test]
    fn test_iso_to_epoch_rejects_garbage() {
        assert!(iso_to_epoch("2011-05-23 20:38:21").is_err());
        assert!(iso_to_epoch("not a time").is_err());
    }
}
