//! Object identifier resolution tables.
//!
//! Every table maps a dotted-decimal OID to the snake_case symbolic name
//! of the documented output schema. Lookups are total at the call site:
//! a miss falls back to the dotted string itself.

/// Signature algorithm OIDs (RFC 3279, RFC 4055, RFC 8410).
pub fn signature_algorithm(dotted: &str) -> Option<&'static str> {
    let name = match dotted {
        "1.2.840.113549.1.1.2" => "md2_rsa",
        "1.2.840.113549.1.1.4" => "md5_rsa",
        "1.2.840.113549.1.1.5" => "sha1_rsa",
        "1.2.840.113549.1.1.10" => "rsassa_pss",
        "1.2.840.113549.1.1.11" => "sha256_rsa",
        "1.2.840.113549.1.1.12" => "sha384_rsa",
        "1.2.840.113549.1.1.13" => "sha512_rsa",
        "1.2.840.113549.1.1.14" => "sha224_rsa",
        "1.2.840.10040.4.3" => "sha1_dsa",
        "2.16.840.1.101.3.4.3.1" => "sha224_dsa",
        "2.16.840.1.101.3.4.3.2" => "sha256_dsa",
        "1.2.840.10045.4.1" => "sha1_ecdsa",
        "1.2.840.10045.4.3.1" => "sha224_ecdsa",
        "1.2.840.10045.4.3.2" => "sha256_ecdsa",
        "1.2.840.10045.4.3.3" => "sha384_ecdsa",
        "1.2.840.10045.4.3.4" => "sha512_ecdsa",
        "1.3.101.112" => "ed25519",
        "1.3.101.113" => "ed448",
        _ => return None,
    };
    Some(name)
}

/// Public key algorithm OIDs (RFC 3279, RFC 5480, RFC 8410).
pub fn public_key_algorithm(dotted: &str) -> Option<&'static str> {
    let name = match dotted {
        "1.2.840.113549.1.1.1" => "rsa",
        "1.2.840.113549.1.1.10" => "rsassa_pss",
        "1.2.840.10040.4.1" => "dsa",
        "1.2.840.10045.2.1" => "ec",
        "1.3.101.110" => "x25519",
        "1.3.101.111" => "x448",
        "1.3.101.112" => "ed25519",
        "1.3.101.113" => "ed448",
        _ => return None,
    };
    Some(name)
}

/// Named curve OIDs (RFC 5480).
pub fn curve(dotted: &str) -> Option<&'static str> {
    let name = match dotted {
        "1.2.840.10045.3.1.1" => "secp192r1",
        "1.2.840.10045.3.1.7" => "secp256r1",
        "1.3.132.0.10" => "secp256k1",
        "1.3.132.0.33" => "secp224r1",
        "1.3.132.0.34" => "secp384r1",
        "1.3.132.0.35" => "secp521r1",
        _ => return None,
    };
    Some(name)
}

/// Certificate extension OIDs (RFC 5280 plus common vendor arcs).
pub fn extension(dotted: &str) -> Option<&'static str> {
    let name = match dotted {
        "2.5.29.14" => "key_identifier",
        "2.5.29.15" => "key_usage",
        "2.5.29.17" => "subject_alt_name",
        "2.5.29.18" => "issuer_alt_name",
        "2.5.29.19" => "basic_constraints",
        "2.5.29.31" => "crl_distribution_points",
        "2.5.29.32" => "certificate_policies",
        "2.5.29.35" => "authority_key_identifier",
        "2.5.29.37" => "extended_key_usage",
        "1.3.6.1.5.5.7.1.1" => "authority_information_access",
        "1.3.6.1.4.1.11129.2.4.2" => "signed_certificate_timestamp_list",
        _ => return None,
    };
    Some(name)
}

/// Distinguished name attribute type OIDs (RFC 4519, PKCS #9).
pub fn attribute_type(dotted: &str) -> Option<&'static str> {
    let name = match dotted {
        "2.5.4.3" => "common_name",
        "2.5.4.4" => "surname",
        "2.5.4.5" => "serial_number",
        "2.5.4.6" => "country_name",
        "2.5.4.7" => "locality_name",
        "2.5.4.8" => "state_or_province_name",
        "2.5.4.10" => "organization_name",
        "2.5.4.11" => "organizational_unit_name",
        "2.5.4.12" => "title",
        "2.5.4.42" => "given_name",
        "1.2.840.113549.1.9.1" => "email_address",
        "0.9.2342.19200300.100.1.25" => "domain_component",
        _ => return None,
    };
    Some(name)
}

/// Extended key usage purpose OIDs (RFC 5280 §4.2.1.12).
pub fn eku_purpose(dotted: &str) -> Option<&'static str> {
    let name = match dotted {
        "1.3.6.1.5.5.7.3.1" => "server_auth",
        "1.3.6.1.5.5.7.3.2" => "client_auth",
        "1.3.6.1.5.5.7.3.3" => "code_signing",
        "1.3.6.1.5.5.7.3.4" => "email_protection",
        "1.3.6.1.5.5.7.3.8" => "time_stamping",
        "1.3.6.1.5.5.7.3.9" => "ocsp_signing",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest(
        dotted,
        expected,
        case("1.2.840.113549.1.1.11", Some("sha256_rsa")),
        case("1.2.840.10045.4.3.2", Some("sha256_ecdsa")),
        case("1.3.101.112", Some("ed25519")),
        case("1.2.3.4", None)
    )]
    fn test_signature_algorithm(dotted: &str, expected: Option<&str>) {
        assert_eq!(signature_algorithm(dotted), expected);
    }

    #[rstest(
        dotted,
        expected,
        case("2.5.4.3", Some("common_name")),
        case("0.9.2342.19200300.100.1.25", Some("domain_component")),
        case("2.5.4.99", None)
    )]
    fn test_attribute_type(dotted: &str, expected: Option<&str>) {
        assert_eq!(attribute_type(dotted), expected);
    }

    #[rstest(
        dotted,
        expected,
        case("2.5.29.19", Some("basic_constraints")),
        case("2.5.29.35", Some("authority_key_identifier")),
        case("1.2.3.4", None)
    )]
    fn test_extension(dotted: &str, expected: Option<&str>) {
        assert_eq!(extension(dotted), expected);
    }
}
