//! Word-parallel search for the bytes that end or toggle a start tag scan (`"`, `'`, `>`)

use xsax_chars::XmlAsciiChar;

const WORD: usize = 8;
const LO: u64 = 0x0101_0101_0101_0101;
const HI: u64 = 0x8080_8080_8080_8080;

const DOUBLE_QUOTE: u64 = LO * b'"' as u64;
const SINGLE_QUOTE: u64 = LO * b'\'' as u64;
const GREATER_THAN: u64 = LO * b'>' as u64;

/// True if any byte lane of `x` is zero.
#[inline]
const fn has_zero_byte(x: u64) -> bool {
    x.wrapping_sub(LO) & !x & HI != 0
}

#[inline]
fn has_tag_delimiter(word: u64) -> bool {
    has_zero_byte(word ^ DOUBLE_QUOTE)
        || has_zero_byte(word ^ SINGLE_QUOTE)
        || has_zero_byte(word ^ GREATER_THAN)
}

/// Position of the first `"`, `'` or `>` in `haystack`.
///
/// Skips whole 8-byte words that contain none of them, then pinpoints the byte with a linear
/// scan starting at the first word that does.
#[inline]
pub fn find_tag_delimiter(haystack: &[u8]) -> Option<usize> {
    let mut pos = 0;
    while pos + WORD <= haystack.len() {
        let mut word = [0u8; WORD];
        word.copy_from_slice(&haystack[pos..pos + WORD]);
        if has_tag_delimiter(u64::from_le_bytes(word)) {
            break;
        }
        pos += WORD;
    }
    find_tag_delimiter_linear(&haystack[pos..]).map(|i| pos + i)
}

/// Portable baseline of [`find_tag_delimiter`].
#[inline]
pub fn find_tag_delimiter_linear(haystack: &[u8]) -> Option<usize> {
    haystack.iter().position(|c| c.is_tag_delimiter())
}
