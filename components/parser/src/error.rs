use std::fmt;
use std::io;
use std::str::Utf8Error;
use std::sync::Arc;

/// Construct the scanner was reading when the source ran dry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Markup {
    /// `<` followed by nothing.
    Tag,
    StartTag,
    EndTag,
    /// `<!` followed by nothing.
    Declaration,
    CData,
    Comment,
    DocType,
    ProcInst,
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Markup::Tag => "tag",
            Markup::StartTag => "start tag",
            Markup::EndTag => "end tag",
            Markup::Declaration => "declaration",
            Markup::CData => "CDATA section",
            Markup::Comment => "comment",
            Markup::DocType => "document type declaration",
            Markup::ProcInst => "processing instruction",
        })
    }
}

/// Malformed markup found by the event scanner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkupError {
    /// `<!` followed by something other than `[`, `-`, `D` or `d`.
    UnknownDeclaration(u8),
    /// The source ended in the middle of a token.
    UnexpectedEof(Markup),
}

/// Attribute that cannot be split off a start tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeError {
    /// Byte found after `=` where a quote was expected.
    UnquotedValue(u8),
    /// `=` at the very end of the tag.
    MissingValue,
    /// Opening quote without its closing counterpart.
    UnterminatedValue,
}

/// Entity or character reference that cannot be decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityError {
    /// No `;` within the lookahead bound.
    Unterminated,
    /// `&;`
    Empty,
    /// Numeric reference that is no number or no Unicode scalar value.
    InvalidCharRef(String),
    /// Named reference other than the five predefined ones.
    UnknownEntity(String),
}

/// Fatal reading error
#[derive(Clone, Debug)]
pub enum XmlError {
    Io(Arc<io::Error>),
    Markup(MarkupError),
    Attribute(AttributeError),
    Entity(EntityError),
    /// Only reported when converting to owned tokens.
    Utf8(Utf8Error),
}

impl XmlError {
    pub(crate) fn unexpected_eof(markup: Markup) -> Self {
        XmlError::Markup(MarkupError::UnexpectedEof(markup))
    }
}

impl PartialEq for XmlError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (XmlError::Io(a), XmlError::Io(b)) => a.kind() == b.kind(),
            (XmlError::Markup(a), XmlError::Markup(b)) => a == b,
            (XmlError::Attribute(a), XmlError::Attribute(b)) => a == b,
            (XmlError::Entity(a), XmlError::Entity(b)) => a == b,
            (XmlError::Utf8(a), XmlError::Utf8(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlError::Io(err) => write!(f, "I/O error: {}", err),
            XmlError::Markup(MarkupError::UnknownDeclaration(c)) => write!(
                f,
                "unknown declaration type: {:?}",
                char::from(*c)
            ),
            XmlError::Markup(MarkupError::UnexpectedEof(markup)) => {
                write!(f, "unexpected end of input inside {}", markup)
            }
            XmlError::Attribute(AttributeError::UnquotedValue(c)) => {
                write!(f, "invalid attribute value: {:?}", char::from(*c))
            }
            XmlError::Attribute(AttributeError::MissingValue) => {
                f.write_str("missing attribute value after `=`")
            }
            XmlError::Attribute(AttributeError::UnterminatedValue) => {
                f.write_str("attribute value without closing quote")
            }
            XmlError::Entity(EntityError::Unterminated) => {
                f.write_str("invalid escape sequence: missing `;`")
            }
            XmlError::Entity(EntityError::Empty) => f.write_str("empty escape sequence"),
            XmlError::Entity(EntityError::InvalidCharRef(body)) => {
                write!(f, "invalid char reference: {:?}", body)
            }
            XmlError::Entity(EntityError::UnknownEntity(name)) => {
                write!(f, "invalid escape sequence: {:?}", name)
            }
            XmlError::Utf8(err) => write!(f, "UTF-8 error: {}", err),
        }
    }
}

impl std::error::Error for XmlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            XmlError::Io(err) => Some(err.as_ref()),
            XmlError::Utf8(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for XmlError {
    fn from(err: io::Error) -> Self {
        XmlError::Io(Arc::new(err))
    }
}

impl From<Utf8Error> for XmlError {
    fn from(err: Utf8Error) -> Self {
        XmlError::Utf8(err)
    }
}

impl From<MarkupError> for XmlError {
    fn from(err: MarkupError) -> Self {
        XmlError::Markup(err)
    }
}

impl From<AttributeError> for XmlError {
    fn from(err: AttributeError) -> Self {
        XmlError::Attribute(err)
    }
}

impl From<EntityError> for XmlError {
    fn from(err: EntityError) -> Self {
        XmlError::Entity(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_compare_by_kind() {
        let a = XmlError::from(io::Error::new(io::ErrorKind::BrokenPipe, "a"));
        let b = XmlError::from(io::Error::new(io::ErrorKind::BrokenPipe, "b"));
        let c = XmlError::from(io::Error::new(io::ErrorKind::TimedOut, "a"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display() {
        assert_eq!(
            "unknown declaration type: 'x'",
            XmlError::Markup(MarkupError::UnknownDeclaration(b'x')).to_string()
        );
        assert_eq!(
            "unexpected end of input inside comment",
            XmlError::unexpected_eof(Markup::Comment).to_string()
        );
        assert_eq!(
            "invalid escape sequence: \"nbsp\"",
            XmlError::Entity(EntityError::UnknownEntity("nbsp".to_string())).to_string()
        );
    }
}
