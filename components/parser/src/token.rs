//! Owned tokens
//!
//! Converting events into these allocates, but frees the caller from the lifetime of the
//! reader's buffer.

use std::io::Read;
use std::str;

use crate::escape::unescape_cow;
use crate::name::{extract_name, strip_self_closing, Attributes, QName};
use crate::reader::{Event, EventKind, Reader};
use crate::XmlError;

/// Name split at its first `:`
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Name {
    /// Namespace prefix, empty without one
    pub space: String,
    pub local: String,
}

impl Name {
    pub fn new(bytes: &[u8]) -> Result<Self, XmlError> {
        let qname = QName::new(bytes);
        Ok(Self {
            space: utf8(qname.prefix().unwrap_or_default())?,
            local: utf8(qname.local())?,
        })
    }
}

/// Attribute with decoded value
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attr {
    pub name: Name,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartElement {
    pub name: Name,
    pub attributes: Vec<Attr>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndElement {
    pub name: Name,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcInst {
    pub target: String,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    StartElement(StartElement),
    EndElement(EndElement),
    /// Decoded text or the content of a CDATA section
    CharData(String),
    Comment(String),
    ProcInst(ProcInst),
    /// Document type declaration without `<!` and `>`
    Directive(String),
}

impl Token {
    /// Converts an event, `None` for [`EventKind::Eof`].
    pub fn from_event(event: &Event<'_>) -> Result<Option<Token>, XmlError> {
        let bytes = event.bytes();
        let token = match event.kind() {
            EventKind::Start => Token::StartElement(start_element(bytes)?),
            EventKind::End => Token::EndElement(end_element(bytes)?),
            EventKind::Text => Token::CharData(char_data(bytes)?),
            EventKind::CData => Token::CharData(utf8(trim(bytes, b"<![CDATA[", b"]]>"))?),
            EventKind::Comment => Token::Comment(comment(bytes)?),
            EventKind::ProcInst => Token::ProcInst(proc_inst(bytes)?),
            EventKind::DocType => Token::Directive(directive(bytes)?),
            EventKind::Eof => return Ok(None),
        };
        Ok(Some(token))
    }
}

/// `<a:b c="d">` or `<a:b c="d"/>`
pub fn start_element(bytes: &[u8]) -> Result<StartElement, XmlError> {
    let (name, rest) = extract_name(strip_self_closing(bytes));
    let attributes = Attributes::new(rest)
        .map(|attr| -> Result<Attr, XmlError> {
            let attr = attr?;
            Ok(Attr {
                name: Name::new(attr.key())?,
                value: utf8(&attr.unescaped_value()?)?,
            })
        })
        .collect::<Result<_, _>>()?;
    Ok(StartElement {
        name: Name::new(name)?,
        attributes,
    })
}

/// `</a:b>`, also accepts a self-closing start tag.
pub fn end_element(bytes: &[u8]) -> Result<EndElement, XmlError> {
    let (name, _) = extract_name(strip_self_closing(bytes));
    let name = name.strip_prefix(b"/").unwrap_or(name);
    Ok(EndElement {
        name: Name::new(name)?,
    })
}

pub fn char_data(bytes: &[u8]) -> Result<String, XmlError> {
    utf8(&unescape_cow(bytes)?)
}

pub fn comment(bytes: &[u8]) -> Result<String, XmlError> {
    utf8(trim(bytes, b"<!--", b"-->"))
}

pub fn proc_inst(bytes: &[u8]) -> Result<ProcInst, XmlError> {
    let (target, content) = extract_name(trim(bytes, b"<?", b"?>"));
    Ok(ProcInst {
        target: utf8(target)?,
        content: utf8(content)?,
    })
}

pub fn directive(bytes: &[u8]) -> Result<String, XmlError> {
    utf8(trim(bytes, b"<!", b">"))
}

fn trim<'a>(bytes: &'a [u8], prefix: &[u8], suffix: &[u8]) -> &'a [u8] {
    let bytes = bytes.strip_prefix(prefix).unwrap_or(bytes);
    bytes.strip_suffix(suffix).unwrap_or(bytes)
}

fn utf8(bytes: &[u8]) -> Result<String, XmlError> {
    Ok(str::from_utf8(bytes)?.to_owned())
}

/// Iterator returned by [`Reader::tokens`]
///
/// Ends after the last token or after the first error.
pub struct Tokens<'r, R> {
    reader: &'r mut Reader<R>,
    done: bool,
}

impl<'r, R: Read> Tokens<'r, R> {
    pub(crate) fn new(reader: &'r mut Reader<R>) -> Self {
        Self {
            reader,
            done: false,
        }
    }
}

impl<'r, R: Read> Iterator for Tokens<'r, R> {
    type Item = Result<Token, XmlError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self
            .reader
            .next_event()
            .and_then(|event| Token::from_event(&event));
        match result {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use assert_matches::assert_matches;

    use super::*;
    use crate::error::{AttributeError, EntityError};
    use crate::reader::ReaderConfig;

    fn name(space: &str, local: &str) -> Name {
        Name {
            space: space.to_string(),
            local: local.to_string(),
        }
    }

    fn tokens(input: &str) -> Result<Vec<Token>, XmlError> {
        Reader::new(Cursor::new(input.as_bytes())).tokens().collect()
    }

    mod convert {
        use super::*;

        #[test]
        fn start_with_attributes() {
            assert_eq!(
                Ok(StartElement {
                    name: name("soap", "Envelope"),
                    attributes: vec![
                        Attr {
                            name: name("xmlns", "soap"),
                            value: "urn:x".to_string()
                        },
                        Attr {
                            name: name("", "a"),
                            value: "1 < 2".to_string()
                        },
                    ],
                }),
                start_element(b"<soap:Envelope xmlns:soap=\"urn:x\" a='1 &lt; 2'>")
            );
        }

        #[test]
        fn self_closing_start() {
            let start = start_element(b"<br class=\"x\"/>").unwrap();
            assert_eq!(name("", "br"), start.name);
            assert_eq!("x", start.attributes[0].value);

            assert_eq!(name("", "br"), start_element(b"<br/>").unwrap().name);
            assert_eq!(name("", "br"), start_element(b"<br />").unwrap().name);
        }

        #[test]
        fn end() {
            assert_eq!(name("a", "b"), end_element(b"</a:b>").unwrap().name);
            assert_eq!(name("", "c"), end_element(b"</c >").unwrap().name);
            assert_eq!(name("", "c"), end_element(b"<c/>").unwrap().name);
        }

        #[test]
        fn text_and_markup() {
            assert_eq!(Ok("a & b".to_string()), char_data(b"a &amp; b"));
            assert_eq!(Ok(" note ".to_string()), comment(b"<!-- note -->"));
            assert_eq!(Ok("DOCTYPE html".to_string()), directive(b"<!DOCTYPE html>"));
        }

        #[test]
        fn processing_instruction() {
            assert_eq!(
                Ok(ProcInst {
                    target: "xml".to_string(),
                    content: "version=\"1.0\"".to_string()
                }),
                proc_inst(b"<?xml version=\"1.0\"?>")
            );
            assert_eq!(
                Ok(ProcInst {
                    target: "empty".to_string(),
                    content: String::new()
                }),
                proc_inst(b"<?empty?>")
            );
        }

        #[test]
        fn errors() {
            assert_eq!(
                Err(XmlError::Attribute(AttributeError::UnquotedValue(b'1'))),
                start_element(b"<a b=1>")
            );
            assert_eq!(
                Err(XmlError::Entity(EntityError::UnknownEntity("x".to_string()))),
                char_data(b"&x;")
            );
            assert_matches!(char_data(b"\xff"), Err(XmlError::Utf8(_)));
        }
    }

    mod iterate {
        use super::*;

        #[test]
        fn document() {
            assert_eq!(
                Ok(vec![
                    Token::ProcInst(ProcInst {
                        target: "xml".to_string(),
                        content: "version=\"1.0\"".to_string()
                    }),
                    Token::Directive("DOCTYPE r".to_string()),
                    Token::StartElement(StartElement {
                        name: name("", "r"),
                        attributes: vec![],
                    }),
                    Token::Comment("c".to_string()),
                    Token::CharData("<&>".to_string()),
                    Token::CharData("x&lt;".to_string()),
                    Token::EndElement(EndElement { name: name("", "r") }),
                ]),
                tokens("<?xml version=\"1.0\"?><!DOCTYPE r><r><!--c-->&lt;&amp;&gt;<![CDATA[x&lt;]]></r>")
            );
        }

        #[test]
        fn synthesized_end() {
            let mut reader = Reader::with_config(
                Cursor::new(&b"<a/>"[..]),
                ReaderConfig {
                    emit_self_closing_tag: true,
                    ..ReaderConfig::default()
                },
            );
            let tokens: Vec<_> = reader.tokens().collect::<Result<_, _>>().unwrap();
            assert_eq!(
                vec![
                    Token::StartElement(StartElement {
                        name: name("", "a"),
                        attributes: vec![],
                    }),
                    Token::EndElement(EndElement { name: name("", "a") }),
                ],
                tokens
            );
        }

        #[test]
        fn stops_after_error() {
            let mut reader = Reader::new(Cursor::new(&b"<a>&bogus;</a>"[..]));
            let mut tokens = reader.tokens();
            assert_matches!(tokens.next(), Some(Ok(Token::StartElement(_))));
            assert_matches!(tokens.next(), Some(Err(XmlError::Entity(_))));
            assert_matches!(tokens.next(), None);
        }
    }
}
