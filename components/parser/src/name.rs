//! Splitting raw tag bytes into name and attributes

use std::borrow::Cow;
use std::fmt;

use memchr::memchr;
use xsax_chars::{whitespace_prefix_len, XmlAsciiChar};

use crate::error::AttributeError;
use crate::escape::unescape_cow;
use crate::XmlError;

/// Splits a raw tag into its name and the bytes after the first whitespace.
///
/// One leading `<` and one trailing `>` are stripped if present, so start tags, end tags and
/// processing instructions can be passed as they come out of the reader. The name of an end
/// tag keeps its `/`, that of a processing instruction its `?`.
pub fn extract_name(tag: &[u8]) -> (&[u8], &[u8]) {
    let mut tag = tag;
    if tag.len() > 1 && tag[0] == b'<' {
        tag = &tag[1..];
    }
    if tag.len() > 1 && tag[tag.len() - 1] == b'>' {
        tag = &tag[..tag.len() - 1];
    }

    match tag.iter().position(|c| c.is_xml_whitespace()) {
        Some(i) => (&tag[..i], &tag[i + 1..]),
        None => (tag, &[]),
    }
}

/// Raw attribute
///
/// `raw_value` includes the surrounding quotes and is empty for an attribute without value.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    key: &'a [u8],
    raw_value: &'a [u8],
}

impl<'a> Attribute<'a> {
    pub fn new(key: &'a [u8], raw_value: &'a [u8]) -> Self {
        Self { key, raw_value }
    }

    pub fn key(&self) -> &'a [u8] {
        self.key
    }

    pub fn raw_value(&self) -> &'a [u8] {
        self.raw_value
    }

    /// Value without its quotes, references not decoded.
    pub fn value(&self) -> &'a [u8] {
        if self.raw_value.len() >= 2 {
            &self.raw_value[1..self.raw_value.len() - 1]
        } else {
            &[]
        }
    }

    pub fn unescaped_value(&self) -> Result<Cow<'a, [u8]>, XmlError> {
        unescape_cow(self.value())
    }
}

impl<'a> fmt::Debug for Attribute<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("key", &String::from_utf8_lossy(self.key))
            .field("value", &String::from_utf8_lossy(self.raw_value))
            .finish()
    }
}

/// Reads the next attribute from the bytes after a tag name.
///
/// Returns `None` once only whitespace is left, otherwise the attribute and the bytes after
/// it. A key that is not followed by `=` is returned without value.
pub fn next_attribute(bytes: &[u8]) -> Result<Option<(Attribute<'_>, &[u8])>, XmlError> {
    let mut i = whitespace_prefix_len(bytes);
    if i == bytes.len() {
        return Ok(None);
    }

    let key_start = i;
    while i < bytes.len() && !bytes[i].is_xml_whitespace() && bytes[i] != b'=' {
        i += 1;
    }
    let key = &bytes[key_start..i];

    i += whitespace_prefix_len(&bytes[i..]);
    if i == bytes.len() || bytes[i] != b'=' {
        return Ok(Some((Attribute::new(key, &[]), &bytes[i..])));
    }

    i += 1;
    i += whitespace_prefix_len(&bytes[i..]);
    let quote = match bytes.get(i) {
        Some(&c) if c.is_xml_quote() => c,
        Some(&c) => return Err(AttributeError::UnquotedValue(c).into()),
        None => return Err(AttributeError::MissingValue.into()),
    };

    match memchr(quote, &bytes[i + 1..]) {
        Some(len) => {
            let end = i + 1 + len + 1;
            Ok(Some((Attribute::new(key, &bytes[i..end]), &bytes[end..])))
        }
        None => Err(AttributeError::UnterminatedValue.into()),
    }
}

/// Iterator over the attributes of a tag
///
/// Stops after the first error.
#[derive(Clone, Debug)]
pub struct Attributes<'a> {
    rest: &'a [u8],
}

impl<'a> Attributes<'a> {
    /// `rest` are the bytes after the tag name, as returned by [`extract_name`].
    pub fn new(rest: &'a [u8]) -> Self {
        Self { rest }
    }

    /// Attributes of a raw start tag, `<` and `>` (or `/>`) included.
    pub fn of_tag(tag: &'a [u8]) -> Self {
        let (_, rest) = extract_name(strip_self_closing(tag));
        Self::new(rest)
    }
}

impl<'a> Iterator for Attributes<'a> {
    type Item = Result<Attribute<'a>, XmlError>;

    fn next(&mut self) -> Option<Self::Item> {
        match next_attribute(self.rest) {
            Ok(Some((attr, rest))) => {
                self.rest = rest;
                Some(Ok(attr))
            }
            Ok(None) => None,
            Err(err) => {
                self.rest = &[];
                Some(Err(err))
            }
        }
    }
}

/// Removes the `/>` of a self-closing start tag, leaving other tags as they are.
pub fn strip_self_closing(tag: &[u8]) -> &[u8] {
    if tag.ends_with(b"/>") {
        &tag[..tag.len() - 2]
    } else {
        tag
    }
}

/// Qualified name
///
/// Name bytes and the offset of the local part. The bytes before it, without the `:`, are the
/// namespace prefix.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct QName<'a> {
    bytes: &'a [u8],
    local_start: usize,
}

impl<'a> QName<'a> {
    /// Splits at the first `:`.
    pub fn new(bytes: &'a [u8]) -> Self {
        let local_start = memchr(b':', bytes).map_or(0, |i| i + 1);
        Self { bytes, local_start }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn prefix(&self) -> Option<&'a [u8]> {
        if self.local_start == 0 {
            None
        } else {
            Some(&self.bytes[..self.local_start - 1])
        }
    }

    pub fn local(&self) -> &'a [u8] {
        &self.bytes[self.local_start..]
    }
}

impl<'a> fmt::Debug for QName<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QName")
            .field("prefix", &self.prefix().map(String::from_utf8_lossy))
            .field("local", &String::from_utf8_lossy(self.local()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attributes(tag: &[u8]) -> Result<Vec<(&[u8], &[u8])>, XmlError> {
        Attributes::of_tag(tag)
            .map(|attr| attr.map(|attr| (attr.key(), attr.raw_value())))
            .collect()
    }

    mod name {
        use super::*;

        #[test]
        fn start_tag() {
            assert_eq!(
                (&b"element"[..], &b"foo=\"bar\""[..]),
                extract_name(b"<element foo=\"bar\">")
            );
            assert_eq!((&b"a"[..], &b""[..]), extract_name(b"<a>"));
        }

        #[test]
        fn end_tag_and_pi() {
            assert_eq!((&b"/a"[..], &b""[..]), extract_name(b"</a>"));
            assert_eq!(
                (&b"?xml"[..], &b"version=\"1.0\"?"[..]),
                extract_name(b"<?xml version=\"1.0\"?>")
            );
        }

        #[test]
        fn bare_bytes() {
            assert_eq!((&b"name"[..], &b"rest"[..]), extract_name(b"name rest"));
            assert_eq!((&b"<"[..], &b""[..]), extract_name(b"<"));
        }

        #[test]
        fn qualified() {
            let name = QName::new(b"soap:Envelope");
            assert_eq!(Some(&b"soap"[..]), name.prefix());
            assert_eq!(b"Envelope", name.local());

            let name = QName::new(b"Envelope");
            assert_eq!(None, name.prefix());
            assert_eq!(b"Envelope", name.local());

            let name = QName::new(b"a:b:c");
            assert_eq!(Some(&b"a"[..]), name.prefix());
            assert_eq!(b"b:c", name.local());
        }
    }

    mod attribute {
        use super::*;

        #[test]
        fn quoted_values_keep_quotes() {
            assert_eq!(
                Ok(vec![
                    (&b"foo"[..], &b"\"&lt;bar&gt;\""[..]),
                    (&b"bar"[..], &b"\"qux\""[..]),
                ]),
                attributes(b"<element foo=\"&lt;bar&gt;\" bar=\"qux\">")
            );
        }

        #[test]
        fn single_quotes() {
            assert_eq!(
                Ok(vec![(&b"a"[..], &b"'x\"y'"[..])]),
                attributes(b"<e a='x\"y'>")
            );
        }

        #[test]
        fn whitespace_around_equals() {
            assert_eq!(
                Ok(vec![(&b"foo"[..], &b"\"bar\""[..])]),
                attributes(b"<element \t foo \n=\r \"bar\"\n\t>")
            );
        }

        #[test]
        fn without_value() {
            let (attr, rest) = next_attribute(b" checked other='1'").unwrap().unwrap();
            assert_eq!(b"checked", attr.key());
            assert_eq!(b"", attr.raw_value());
            assert_eq!(b"other='1'", rest);
        }

        #[test]
        fn self_closing() {
            assert_eq!(
                Ok(vec![(&b"a"[..], &b"\"1\""[..])]),
                attributes(b"<e a=\"1\"/>")
            );
            assert_eq!(Ok(vec![]), attributes(b"<e/>"));
        }

        #[test]
        fn self_closing_tag_counts() {
            let tag = b"<link rel=\"self\" href=\"/entries/1\"/>";
            assert_eq!(2, Attributes::of_tag(tag).count());
            assert!(Attributes::of_tag(tag).all(|attr| attr.is_ok()));
            assert_eq!(1, Attributes::of_tag(b"<link rel=\"self\" />").count());
            assert_eq!(&b"br"[..], extract_name(strip_self_closing(b"<br/>")).0);
        }

        #[test]
        fn unescaped() {
            let (attr, _) = next_attribute(b"foo=\"&lt;bar&gt;\"").unwrap().unwrap();
            assert_eq!(b"&lt;bar&gt;", attr.value());
            assert_eq!(&b"<bar>"[..], &*attr.unescaped_value().unwrap());
        }

        #[test]
        fn unquoted_value() {
            assert_eq!(
                Err(XmlError::Attribute(AttributeError::UnquotedValue(b'v'))),
                attributes(b"<e a=v>")
            );
        }

        #[test]
        fn missing_value() {
            assert_eq!(
                Err(XmlError::Attribute(AttributeError::MissingValue)),
                attributes(b"<e a= >")
            );
        }

        #[test]
        fn unterminated_value() {
            assert_eq!(
                Err(XmlError::Attribute(AttributeError::UnterminatedValue)),
                attributes(b"<e a=\"v>")
            );
        }

        #[test]
        fn iterator_stops_after_error() {
            let mut attrs = Attributes::new(b"a=v b='1'");
            assert!(matches!(attrs.next(), Some(Err(_))));
            assert!(attrs.next().is_none());
        }
    }
}
