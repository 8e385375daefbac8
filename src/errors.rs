//! Errors for cdrimport

use std::error::Error as IError;
use std::fmt;
use std::io::Error as IoError;

/// error_chain and failure are certainly nice, but completely overengineered
/// for this use-case. The walker recovers from almost every failure at the
/// next chunk boundary, so what matters is cheap, matchable variants.
///
/// So in this case, the best form of error handling is to use the simple
/// Rust-native way: Just enums, `From` + pattern matching. No macros,
/// except for this one.
///
/// What this macro does is (simplified): `impl From<$a> for $b { $b::$variant(error) }`
macro_rules! impl_from {
    ($from:ident, $to:ident::$variant:ident) => {
        impl From<$from> for $to {
            fn from(err: $from) -> Self {
                $to::$variant(err.into())
            }
        }
    };
}

#[derive(Debug)]
pub enum Error {
    /// Read past the end of the input; aborts the current chunk only
    EndOfStream,
    /// A CMX coordinate was requested before the header declared the precision
    UnknownPrecision,
    /// RIFF / ZIP / OLE sentinel bytes absent where required
    Signature,
    /// zlib / DEFLATE inflation failed; the compressed substream is unusable
    Decompression,
    /// A code unit could not be mapped under the active charset
    Encoding,
    /// External: std::io::Error
    Io(IoError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::EndOfStream => write!(f, "read past end of stream"),
            Error::UnknownPrecision => write!(f, "coordinate precision not yet known"),
            Error::Signature => write!(f, "container signature mismatch"),
            Error::Decompression => write!(f, "decompression failure"),
            Error::Encoding => write!(f, "unmappable code unit"),
            Error::Io(e) => e.fmt(f),
        }
    }
}

impl IError for Error {}

impl_from!(IoError, Error::Io);

pub type Result<T> = std::result::Result<T, Error>;
