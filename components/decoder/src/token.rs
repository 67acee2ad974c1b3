use std::borrow::Cow;

use xsax::token::{self as owned, EndElement, ProcInst, StartElement};
use xsax::{
    extract_name, strip_self_closing, unescape_cow, Attribute, Attributes, Event, EventKind,
    QName, XmlError,
};

use crate::error::{DecodeError, Result};

/// Coarse token kind, CDATA sections and text are both character data
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    StartElement,
    EndElement,
    CharData,
    ProcInst,
    Comment,
    Directive,
}

/// Token borrowed from the decoder's buffer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    kind: TokenKind,
    bytes: &'a [u8],
}

impl<'a> Token<'a> {
    pub(crate) fn from_event(event: Event<'a>) -> Result<Self> {
        let kind = match event.kind() {
            EventKind::Start => TokenKind::StartElement,
            EventKind::End => TokenKind::EndElement,
            EventKind::Text | EventKind::CData => TokenKind::CharData,
            EventKind::ProcInst => TokenKind::ProcInst,
            EventKind::Comment => TokenKind::Comment,
            EventKind::DocType => TokenKind::Directive,
            EventKind::Eof => return Err(DecodeError::Eof),
        };
        Ok(Self {
            kind,
            bytes: event.into_bytes(),
        })
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Raw bytes, delimiters included
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Element name, without the `/` of an end tag
    pub fn name(&self) -> QName<'a> {
        QName::new(element_name(self.bytes))
    }

    pub fn start_element_bytes(&self) -> StartElementBytes<'a> {
        let (name, attrs) = extract_name(strip_self_closing(self.bytes));
        StartElementBytes {
            name: QName::new(name),
            attrs: AttributesBytes(attrs),
        }
    }

    pub fn start_element(&self) -> StdXmlResult<StartElement> {
        owned::start_element(self.bytes)
    }

    pub fn end_element(&self) -> StdXmlResult<EndElement> {
        owned::end_element(self.bytes)
    }

    /// Decoded text, or the verbatim content of a CDATA section.
    ///
    /// Empty for other tokens.
    pub fn char_data(&self) -> StdXmlResult<Cow<'a, [u8]>> {
        match self.kind {
            TokenKind::CharData if self.bytes.starts_with(b"<![CDATA[") => {
                Ok(Cow::Borrowed(trim(self.bytes, b"<![CDATA[", b"]]>")))
            }
            TokenKind::CharData => unescape_cow(self.bytes),
            _ => Ok(Cow::Borrowed(&[])),
        }
    }

    pub fn proc_inst(&self) -> StdXmlResult<ProcInst> {
        owned::proc_inst(self.bytes)
    }

    /// Comment text without `<!--` and `-->`
    pub fn comment(&self) -> &'a [u8] {
        trim(self.bytes, b"<!--", b"-->")
    }

    /// Declaration without `<!` and `>`
    pub fn directive(&self) -> &'a [u8] {
        trim(self.bytes, b"<!", b">")
    }
}

type StdXmlResult<T> = std::result::Result<T, XmlError>;

/// Name and undecoded attributes of a start tag
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StartElementBytes<'a> {
    pub name: QName<'a>,
    pub attrs: AttributesBytes<'a>,
}

/// Attribute bytes of a start tag, looked at only on request
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AttributesBytes<'a>(&'a [u8]);

impl<'a> AttributesBytes<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }

    /// Decoded value of the first attribute named `key`.
    pub fn get(&self, key: &[u8]) -> Result<Cow<'a, [u8]>> {
        for attr in self.iter() {
            let attr = attr?;
            if attr.key() == key {
                return Ok(attr.unescaped_value()?);
            }
        }
        Err(DecodeError::NoAttribute)
    }

    pub fn iter(&self) -> Attributes<'a> {
        Attributes::new(self.0)
    }
}

impl<'a> IntoIterator for AttributesBytes<'a> {
    type Item = StdXmlResult<Attribute<'a>>;
    type IntoIter = Attributes<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn element_name(bytes: &[u8]) -> &[u8] {
    let (name, _) = extract_name(strip_self_closing(bytes));
    name.strip_prefix(b"/").unwrap_or(name)
}

fn trim<'a>(bytes: &'a [u8], prefix: &[u8], suffix: &[u8]) -> &'a [u8] {
    let bytes = bytes.strip_prefix(prefix).unwrap_or(bytes);
    bytes.strip_suffix(suffix).unwrap_or(bytes)
}
