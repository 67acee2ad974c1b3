//! Pull decoder on top of the xsax reader
//!
//! Adds what a hand-written decoding loop needs: looking one token ahead, reading the text
//! content of an element and skipping whole subtrees. Self-closing tags always produce a
//! matching end token, so start and end tokens are balanced.
//!
//! ```
//! use xsax_decoder::{Decoder, TokenKind};
//!
//! let mut decoder = Decoder::new(&b"<item id=\"7\"><qty>3</qty><note/></item>"[..], Vec::new());
//! let item = decoder.token()?;
//! assert_eq!(&b"7"[..], &*item.start_element_bytes().attrs.get(b"id")?);
//!
//! decoder.token()?;
//! assert_eq!(3, decoder.parse_text::<u32>()?);
//! decoder.skip()?;
//!
//! assert_eq!(TokenKind::StartElement, decoder.token()?.kind());
//! # Ok::<(), xsax_decoder::DecodeError>(())
//! ```

use std::borrow::Cow;
use std::fmt;
use std::io::Read;
use std::str::{self, FromStr};

use log::debug;
use xsax::{Reader, XmlError};

mod error;
mod token;

pub use crate::error::{DecodeError, Result};
pub use crate::token::{AttributesBytes, StartElementBytes, Token, TokenKind};

pub struct Decoder<R> {
    reader: Reader<R>,
    peeked: bool,
    failure: Option<DecodeError>,
}

impl<R: Read> Decoder<R> {
    /// Decodes `source`, reading into the allocation of `buf`.
    pub fn new(source: R, buf: Vec<u8>) -> Self {
        let mut reader = Reader::with_buffer(source, buf);
        reader.set_emit_self_closing_tag(true);
        Self {
            reader,
            peeked: false,
            failure: None,
        }
    }

    /// Next token, the peeked one if there is one.
    ///
    /// The end of input is reported as [`DecodeError::Eof`].
    pub fn token(&mut self) -> Result<Token<'_>> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        let event = if self.peeked {
            self.peeked = false;
            self.reader.last_event()
        } else {
            self.reader.next_event()?
        };
        Token::from_event(event)
    }

    /// Next token without consuming it.
    ///
    /// An error, end of input included, is returned by every later call.
    pub fn peek(&mut self) -> Result<Token<'_>> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        if !self.peeked {
            let read = match self.reader.next_event() {
                Ok(event) if event.is_eof() => Err(DecodeError::Eof),
                Ok(_) => Ok(()),
                Err(err) => Err(DecodeError::from(err)),
            };
            if let Err(err) = read {
                debug!("decoder failed while peeking: {}", err);
                self.failure = Some(err.clone());
                return Err(err);
            }
            self.peeked = true;
        }
        Token::from_event(self.reader.last_event())
    }

    /// Decoded text of the next token without consuming it.
    ///
    /// Empty if the next token is no character data.
    pub fn text(&mut self) -> Result<Cow<'_, str>> {
        let token = self.peek()?;
        if token.kind() != TokenKind::CharData {
            return Ok(Cow::Borrowed(""));
        }
        let text = match token.char_data()? {
            Cow::Borrowed(bytes) => Cow::Borrowed(str::from_utf8(bytes).map_err(XmlError::from)?),
            Cow::Owned(bytes) => Cow::Owned(
                String::from_utf8(bytes).map_err(|err| XmlError::from(err.utf8_error()))?,
            ),
        };
        Ok(text)
    }

    /// Parses the [text](Decoder::text) of the next token.
    pub fn parse_text<T>(&mut self) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let text = self.text()?;
        text.trim()
            .parse()
            .map_err(|err| DecodeError::Value(format!("{:?}: {}", text, err)))
    }

    /// Consumes tokens up to and including the end tag that closes the current element.
    pub fn skip(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.token()?.kind() {
                TokenKind::StartElement => depth += 1,
                TokenKind::EndElement if depth == 0 => return Ok(()),
                TokenKind::EndElement => depth -= 1,
                _ => {}
            }
        }
    }

    /// Gives back the buffer for the next decoder.
    pub fn into_buffer(self) -> Vec<u8> {
        self.reader.into_buffer()
    }
}

impl<R> fmt::Debug for Decoder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("reader", &self.reader)
            .field("peeked", &self.peeked)
            .field("failure", &self.failure)
            .finish()
    }
}
