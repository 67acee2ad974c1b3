use std::fmt;
use std::result::Result as StdResult;

use xsax::XmlError;

/// Alias for a `Result` with the error type `xsax_decoder::DecodeError`.
pub type Result<T> = StdResult<T, DecodeError>;

/// Decoding error
#[derive(Clone, Debug, PartialEq)]
pub enum DecodeError {
    /// Xml reading error
    Xml(XmlError),
    /// End of input
    Eof,
    /// Start tag without the requested attribute
    NoAttribute,
    /// Text that cannot be parsed to the requested type
    Value(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::Xml(e) => write!(f, "XML error: {}", e),
            DecodeError::Eof => write!(f, "Unexpected end of file"),
            DecodeError::NoAttribute => write!(f, "No such attribute"),
            DecodeError::Value(v) => write!(f, "Invalid value: {}", v),
        }
    }
}

impl ::std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Xml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<XmlError> for DecodeError {
    fn from(e: XmlError) -> Self {
        DecodeError::Xml(e)
    }
}
