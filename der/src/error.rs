use nom::Needed;
use nom::error::ErrorKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("failed to parse: {0:?}")]
    Parser(ErrorKind),
    #[error("failed to parse: incomplete input: {0:?}")]
    ParserIncomplete(Needed),
    #[error("length overflows usize")]
    LengthOverflow,
    #[error("indefinite length is not allowed in DER")]
    IndefiniteLength,
}

impl From<nom::Err<nom::error::Error<&[u8]>>> for Error {
    fn from(e: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        match e {
            nom::Err::Incomplete(needed) => Error::ParserIncomplete(needed),
            nom::Err::Error(e) | nom::Err::Failure(e) => Error::Parser(e.code),
        }
    }
}
