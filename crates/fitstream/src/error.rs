/// All errors that can occur while encoding or decoding FITS image streams.
#[derive(Debug)]
pub enum Error {
    /// Malformed construction input (zero dimension, length mismatch, empty
    /// buffer, wrong unit kind).
    InvalidArgument(&'static str),
    /// A header card slice was not exactly 80 bytes or violated the card
    /// column layout.
    InvalidCard,
    /// A keyword name contained characters outside `A-Z 0-9 - _` and space.
    InvalidKeyword,
    /// A card value field could not be parsed or encoded.
    InvalidValue,
    /// A required keyword was not found in the header region.
    MissingKeyword(&'static str),
    /// BITPIX value with no corresponding pixel type.
    InvalidBitpix(i64),
    /// The stream ended before the data promised by the header was read.
    UnexpectedEof,
    /// A cancellable write observed its token before a unit went out.
    Cancelled,
    /// An I/O error from the standard library.
    #[cfg(feature = "std")]
    Io(std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidArgument(what) => write!(f, "invalid argument: {what}"),
            Error::InvalidCard => write!(f, "malformed 80-byte header card"),
            Error::InvalidKeyword => write!(f, "invalid keyword name"),
            Error::InvalidValue => write!(f, "invalid card value"),
            Error::MissingKeyword(kw) => write!(f, "missing required keyword: {kw}"),
            Error::InvalidBitpix(v) => write!(f, "unsupported BITPIX value: {v}"),
            Error::UnexpectedEof => write!(f, "unexpected end of stream"),
            Error::Cancelled => write!(f, "write cancelled"),
            #[cfg(feature = "std")]
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
