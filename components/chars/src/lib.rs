use crate::Category::{Delimiter, Quote, Whitespace};

#[repr(u8)]
enum Category {
    Whitespace = 0,
    Quote = 1,
    Delimiter = 2,
}

#[inline]
fn check_ascii(c: u8, cat: Category) -> bool {
    XML_BYTE_MAP[c as usize] & mask(cat) != 0
}

#[inline]
const fn mask(cat: Category) -> u8 {
    1 << (cat as u8)
}

const fn mask_if(cat: Category, pred: bool) -> u8 {
    if pred {
        mask(cat)
    } else {
        0
    }
}

const fn byte_mask(c: u8) -> u8 {
    mask_if(
        Whitespace,
        c == b'\x20' || c == b'\x09' || c == b'\x0D' || c == b'\x0A',
    ) | mask_if(Quote, c == b'"' || c == b'\'')
        | mask_if(Delimiter, c == b'"' || c == b'\'' || c == b'>')
}

const fn build_map() -> [u8; 256] {
    let mut map = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        map[i] = byte_mask(i as u8);
        i += 1;
    }
    map
}

const XML_BYTE_MAP: [u8; 256] = build_map();

pub trait XmlAsciiChar {
    /// https://www.w3.org/TR/REC-xml/#NT-S
    fn is_xml_whitespace(&self) -> bool;

    /// `"` or `'`, the two attribute value delimiters.
    fn is_xml_quote(&self) -> bool;

    /// A byte that changes the state of a start tag scan: a quote or `>`.
    fn is_tag_delimiter(&self) -> bool;
}

impl XmlAsciiChar for u8 {
    #[inline]
    fn is_xml_whitespace(&self) -> bool {
        check_ascii(*self, Whitespace)
    }

    #[inline]
    fn is_xml_quote(&self) -> bool {
        check_ascii(*self, Quote)
    }

    #[inline]
    fn is_tag_delimiter(&self) -> bool {
        check_ascii(*self, Delimiter)
    }
}

impl XmlAsciiChar for char {
    #[inline]
    fn is_xml_whitespace(&self) -> bool {
        self.is_ascii() && check_ascii(*self as u8, Whitespace)
    }

    #[inline]
    fn is_xml_quote(&self) -> bool {
        self.is_ascii() && check_ascii(*self as u8, Quote)
    }

    #[inline]
    fn is_tag_delimiter(&self) -> bool {
        self.is_ascii() && check_ascii(*self as u8, Delimiter)
    }
}

/// Returns the number of leading XML whitespace bytes.
#[inline]
pub fn whitespace_prefix_len(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|c| c.is_xml_whitespace()).count()
}
