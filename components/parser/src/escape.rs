//! Entity and character reference decoding
//!
//! Only the five predefined entities and numeric character references are known. Line endings
//! are left untouched: `\r\n` stays `\r\n`, and `&#13;` decodes to `\r` like any other reference.

use std::borrow::Cow;

use memchr::memchr;

use crate::error::EntityError;
use crate::XmlError;

/// How far after `&` the terminating `;` is searched for.
pub const MAX_REFERENCE_LEN: usize = 12;

/// Decodes all references in `buf` in place and returns the decoded prefix of it.
///
/// Every reference is at least as long as its UTF-8 encoding, so the decoded text never
/// overtakes the bytes still to be read. Without any `&`, `buf` is returned as is.
pub fn unescape(buf: &mut [u8]) -> Result<&mut [u8], XmlError> {
    let mut amp = match memchr(b'&', buf) {
        Some(amp) => amp,
        None => return Ok(buf),
    };

    let mut read = amp;
    let mut write = amp;
    loop {
        let lookahead = &buf[amp + 1..buf.len().min(amp + 1 + MAX_REFERENCE_LEN)];
        let semi = match memchr(b';', lookahead) {
            Some(i) => amp + 1 + i,
            None => return Err(EntityError::Unterminated.into()),
        };

        let mut decoded = [0u8; 4];
        let decoded = decode_reference(&buf[amp + 1..semi], &mut decoded)?;

        if read != amp {
            buf.copy_within(read..amp, write);
            write += amp - read;
        }
        buf[write..write + decoded.len()].copy_from_slice(decoded);
        write += decoded.len();
        read = semi + 1;

        match memchr(b'&', &buf[read..]) {
            Some(i) => amp = read + i,
            None => break,
        }
    }

    let rest = buf.len() - read;
    buf.copy_within(read.., write);
    Ok(&mut buf[..write + rest])
}

/// Like [`unescape`] for callers that only hold a shared borrow.
///
/// Allocates only if `input` contains a reference.
pub fn unescape_cow(input: &[u8]) -> Result<Cow<'_, [u8]>, XmlError> {
    if memchr(b'&', input).is_none() {
        return Ok(Cow::Borrowed(input));
    }

    let mut owned = input.to_vec();
    let len = unescape(&mut owned)?.len();
    owned.truncate(len);
    Ok(Cow::Owned(owned))
}

fn decode_reference<'b>(body: &[u8], out: &'b mut [u8; 4]) -> Result<&'b [u8], EntityError> {
    let c = match body {
        [] => return Err(EntityError::Empty),
        b"lt" => '<',
        b"gt" => '>',
        b"amp" => '&',
        b"apos" => '\'',
        b"quot" => '"',
        [b'#', b'x', digits @ ..] => parse_char_ref(body, digits, 16)?,
        [b'#', digits @ ..] => parse_char_ref(body, digits, 10)?,
        _ => {
            return Err(EntityError::UnknownEntity(
                String::from_utf8_lossy(body).into_owned(),
            ))
        }
    };
    Ok(c.encode_utf8(out).as_bytes())
}

fn parse_char_ref(body: &[u8], digits: &[u8], radix: u32) -> Result<char, EntityError> {
    let invalid = || EntityError::InvalidCharRef(String::from_utf8_lossy(body).into_owned());

    if digits.is_empty() || !digits.iter().all(|&c| char::from(c).is_digit(radix)) {
        return Err(invalid());
    }

    std::str::from_utf8(digits)
        .ok()
        .and_then(|digits| u32::from_str_radix(digits, radix).ok())
        .and_then(char::from_u32)
        .ok_or_else(invalid)
}
