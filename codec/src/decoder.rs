//! Decoder trait for type-safe conversions between pipeline layers.
//!
//! The pattern uses two traits: [`Decoder`] performs the conversion, and
//! [`DecodableFrom`] is a marker constraining which `(source, destination)`
//! pairs are valid. A conversion that is not explicitly marked does not
//! compile.
//!
//! To add a new decodable type, implement both traits:
//!
//! ```no_run
//! use codec::decoder::{Decoder, DecodableFrom};
//!
//! struct Source(Vec<u8>);
//! struct Dest(String);
//!
//! #[derive(Debug)]
//! struct MyError;
//!
//! impl DecodableFrom<Source> for Dest {}
//!
//! impl Decoder<Source, Dest> for Source {
//!     type Error = MyError;
//!
//!     fn decode(&self) -> Result<Dest, Self::Error> {
//!         Ok(Dest(String::from_utf8_lossy(&self.0).to_string()))
//!     }
//! }
//! ```

/// Decoder trait for converting from type `T` to type `D`.
///
/// Implemented by the source type `T`. The destination type must implement
/// [`DecodableFrom<T>`] for the implementation to be accepted.
pub trait Decoder<T, D: DecodableFrom<T>> {
    /// The error type returned when decoding fails.
    type Error;

    /// Decodes `self` into type `D`.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion fails. The specific error
    /// conditions depend on the implementing type.
    fn decode(&self) -> Result<D, Self::Error>;
}

/// Marker trait indicating that type `D` can be decoded from type `T`.
///
/// Has no methods; it exists only so the compiler can reject conversions
/// the pipeline never defined.
pub trait DecodableFrom<T> {}
