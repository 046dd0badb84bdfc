//! # codec
//!
//! Core decoding traits for the certjson pipeline.
//!
//! Every layer of the conversion is expressed as a typed decode step:
//!
//! ```text
//! &str → Pem → Vec<u8> → Der → ASN1Object → Conversion
//! ```
//!
//! Each arrow is an implementation of [`decoder::Decoder`], guarded by the
//! [`decoder::DecodableFrom`] marker trait so that only the conversions the
//! pipeline actually supports exist at compile time.

#![forbid(unsafe_code)]

pub mod decoder;
