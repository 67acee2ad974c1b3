//! XML event reader

use std::fmt;
use std::io::Read;

use log::debug;
use memchr::{memchr, memchr2, memmem};

use crate::arena::Arena;
use crate::error::{Markup, MarkupError};
use crate::swar::find_tag_delimiter;
use crate::token::Tokens;
use crate::XmlError;

/// Storage size used by [`Reader::new`].
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Kind of markup an [`Event`] spans
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `<name …>` or `<name …/>`
    Start,
    /// `</name>`, or the start tag again for a synthesized end of a self-closing tag
    End,
    /// Characters between tags, references not decoded
    Text,
    /// `<![CDATA[…]]>`
    CData,
    /// `<!--…-->`
    Comment,
    /// `<?target …?>`, including the XML declaration
    ProcInst,
    /// `<!DOCTYPE …>` with balanced internal brackets
    DocType,
    /// End of input, repeated on every further call
    Eof,
}

/// One classified piece of the input
///
/// `bytes` are the raw input bytes of the token, delimiters included. They point into the
/// reader's buffer and may be modified in place, e.g. with [`unescape`](crate::unescape).
#[derive(PartialEq, Eq)]
pub struct Event<'a> {
    bytes: &'a mut [u8],
    kind: EventKind,
    synthetic: bool,
}

impl<'a> Event<'a> {
    #[inline]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        self.bytes
    }

    #[inline]
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.bytes
    }

    #[inline]
    pub fn into_bytes(self) -> &'a mut [u8] {
        self.bytes
    }

    /// True for the end event following a self-closing start tag.
    ///
    /// Its bytes are those of the start tag, so it does not count towards the input.
    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.kind == EventKind::Eof
    }
}

impl<'a> fmt::Debug for Event<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Event");
        s.field("kind", &self.kind)
            .field("bytes", &String::from_utf8_lossy(self.bytes));
        if self.synthetic {
            s.field("synthetic", &true);
        }
        s.finish()
    }
}

/// Reader options
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Initial buffer size. The buffer grows when a single token does not fit.
    pub buffer_size: usize,
    /// Follow every self-closing start tag with an [`EventKind::End`] event.
    pub emit_self_closing_tag: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            emit_self_closing_tag: false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Init,
    InsideText,
    InsideMarkup,
    SelfClosingEnd,
    Done,
    Failed,
}

/// Position of the most recently emitted event in the buffer
#[derive(Copy, Clone, Debug)]
struct Emitted {
    kind: EventKind,
    start: usize,
    end: usize,
    synthetic: bool,
}

impl Emitted {
    const EOF: Emitted = Emitted {
        kind: EventKind::Eof,
        start: 0,
        end: 0,
        synthetic: false,
    };
}

/// Streaming XML event reader
///
/// Splits the bytes of a [`Read`] source into [`Event`]s without validating them. Only the
/// bytes of the token in progress are buffered; events borrow the buffer until the next call.
///
/// After an error the reader stays failed and returns that error on every call until it is
/// [reset](Reader::reset).
pub struct Reader<R> {
    arena: Arena<R>,
    state: State,
    failure: Option<XmlError>,
    last: Emitted,
    emit_self_closing_tag: bool,
}

impl<R: Read> Reader<R> {
    pub fn new(source: R) -> Self {
        Self::with_config(source, ReaderConfig::default())
    }

    pub fn with_capacity(source: R, capacity: usize) -> Self {
        Self::with_config(
            source,
            ReaderConfig {
                buffer_size: capacity,
                ..ReaderConfig::default()
            },
        )
    }

    /// Reads into the allocation of `buf`, whose capacity is taken as buffer size.
    ///
    /// Together with [`Reader::into_buffer`] this allows pooling buffers.
    pub fn with_buffer(source: R, buf: Vec<u8>) -> Self {
        Self::from_arena(Arena::with_buffer(source, buf), false)
    }

    pub fn with_config(source: R, config: ReaderConfig) -> Self {
        Self::from_arena(
            Arena::with_capacity(source, config.buffer_size),
            config.emit_self_closing_tag,
        )
    }

    fn from_arena(arena: Arena<R>, emit_self_closing_tag: bool) -> Self {
        Self {
            arena,
            state: State::Init,
            failure: None,
            last: Emitted::EOF,
            emit_self_closing_tag,
        }
    }

    pub fn emit_self_closing_tag(&self) -> bool {
        self.emit_self_closing_tag
    }

    pub fn set_emit_self_closing_tag(&mut self, emit: bool) {
        self.emit_self_closing_tag = emit;
    }

    /// Current size of the buffer.
    pub fn buffer_capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Starts over with a new source, keeping buffer and options.
    pub fn reset(&mut self, source: R) {
        debug!("resetting reader, keeping {} bytes of buffer", self.arena.capacity());
        self.arena.reset(source);
        self.state = State::Init;
        self.failure = None;
        self.last = Emitted::EOF;
    }

    /// Gives back the buffer, e.g. to read the next document with [`Reader::with_buffer`].
    pub fn into_buffer(self) -> Vec<u8> {
        self.arena.into_buffer()
    }

    /// Reads the next event.
    ///
    /// The returned bytes are only valid until the next call.
    pub fn next_event(&mut self) -> Result<Event<'_>, XmlError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        match self.scan() {
            Ok(emitted) => {
                self.last = emitted;
                Ok(self.last_event())
            }
            Err(err) => {
                debug!("reader failed at buffer offset {}: {}", self.arena.offset(), err);
                self.state = State::Failed;
                self.failure = Some(err.clone());
                self.last = Emitted::EOF;
                Err(err)
            }
        }
    }

    /// The event most recently returned by [`Reader::next_event`] once more.
    ///
    /// Changes made to its bytes in between are visible. After a failed call it is an empty
    /// [`EventKind::Eof`] event.
    pub fn last_event(&mut self) -> Event<'_> {
        let Emitted {
            kind,
            start,
            end,
            synthetic,
        } = self.last;
        Event {
            bytes: self.arena.slice_mut(start, end),
            kind,
            synthetic,
        }
    }

    /// Iterates over owned [`Token`](crate::token::Token)s until the end of input.
    pub fn tokens(&mut self) -> Tokens<'_, R> {
        Tokens::new(self)
    }

    fn scan(&mut self) -> Result<Emitted, XmlError> {
        loop {
            match self.state {
                // a byte order mark is not stripped
                State::Init => self.state = State::InsideText,
                State::InsideText => match self.scan_text()? {
                    Some(0) => self.state = State::InsideMarkup,
                    Some(len) => {
                        self.state = State::InsideMarkup;
                        return Ok(self.emit(EventKind::Text, len));
                    }
                    None => {
                        self.state = State::Done;
                        let len = self.arena.window().len();
                        return Ok(if len == 0 {
                            Emitted::EOF
                        } else {
                            self.emit(EventKind::Text, len)
                        });
                    }
                },
                State::InsideMarkup => {
                    let (kind, len) = self.scan_markup()?;
                    let emitted = self.emit(kind, len);
                    self.state = if kind == EventKind::Start
                        && self.emit_self_closing_tag
                        && self.arena.slice_mut(emitted.start, emitted.end).ends_with(b"/>")
                    {
                        State::SelfClosingEnd
                    } else {
                        State::InsideText
                    };
                    return Ok(emitted);
                }
                State::SelfClosingEnd => {
                    self.state = State::InsideText;
                    return Ok(Emitted {
                        kind: EventKind::End,
                        synthetic: true,
                        ..self.last
                    });
                }
                State::Done => return Ok(Emitted::EOF),
                State::Failed => unreachable!("failed reader is handled in next_event"),
            }
        }
    }

    fn emit(&mut self, kind: EventKind, len: usize) -> Emitted {
        let start = self.arena.offset();
        self.arena.consume(len);
        Emitted {
            kind,
            start,
            end: start + len,
            synthetic: false,
        }
    }

    /// Length of the text before the next `<`, or `None` if the input ends first.
    fn scan_text(&mut self) -> Result<Option<usize>, XmlError> {
        let mut offset = 0;
        loop {
            let window = self.arena.window();
            if let Some(i) = memchr(b'<', &window[offset..]) {
                return Ok(Some(offset + i));
            }
            offset = window.len();
            if self.arena.extend() == 0 {
                return match self.arena.io_error() {
                    Some(err) => Err(err),
                    None => Ok(None),
                };
            }
        }
    }

    /// Kind and length of the markup at the start of the window.
    fn scan_markup(&mut self) -> Result<(EventKind, usize), XmlError> {
        self.fill(2, Markup::Tag)?;
        let second = self.arena.window()[1];
        match second {
            b'!' => {
                self.fill(3, Markup::Declaration)?;
                let third = self.arena.window()[2];
                match third {
                    b'[' => self.scan_terminated(EventKind::CData, Markup::CData, b"]]>", 3),
                    b'-' => self.scan_terminated(EventKind::Comment, Markup::Comment, b"-->", 3),
                    b'D' | b'd' => self.scan_doctype(),
                    c => Err(MarkupError::UnknownDeclaration(c).into()),
                }
            }
            b'/' => self.scan_end_tag(),
            b'?' => self.scan_terminated(EventKind::ProcInst, Markup::ProcInst, b"?>", 2),
            _ => self.scan_start_tag(),
        }
    }

    /// Extends until the window holds at least `n` bytes.
    fn fill(&mut self, n: usize, markup: Markup) -> Result<(), XmlError> {
        while self.arena.window().len() < n {
            if self.arena.extend() == 0 {
                return Err(self.arena.exhausted(markup));
            }
        }
        Ok(())
    }

    fn scan_terminated(
        &mut self,
        kind: EventKind,
        markup: Markup,
        terminator: &[u8],
        start: usize,
    ) -> Result<(EventKind, usize), XmlError> {
        let mut offset = start;
        loop {
            let window = self.arena.window();
            if let Some(i) = memmem::find(&window[offset..], terminator) {
                return Ok((kind, offset + i + terminator.len()));
            }
            // the terminator may be split between this window and the next read
            offset = offset.max(window.len().saturating_sub(terminator.len() - 1));
            if self.arena.extend() == 0 {
                return Err(self.arena.exhausted(markup));
            }
        }
    }

    fn scan_doctype(&mut self) -> Result<(EventKind, usize), XmlError> {
        let mut depth = 1usize;
        let mut offset = 2;
        loop {
            let window = self.arena.window();
            while let Some(i) = memchr2(b'<', b'>', &window[offset..]) {
                let pos = offset + i;
                if window[pos] == b'>' {
                    depth -= 1;
                    if depth == 0 {
                        return Ok((EventKind::DocType, pos + 1));
                    }
                } else {
                    depth += 1;
                }
                offset = pos + 1;
            }
            offset = window.len();
            if self.arena.extend() == 0 {
                return Err(self.arena.exhausted(Markup::DocType));
            }
        }
    }

    fn scan_end_tag(&mut self) -> Result<(EventKind, usize), XmlError> {
        let mut offset = 2;
        loop {
            let window = self.arena.window();
            if let Some(i) = memchr(b'>', &window[offset..]) {
                return Ok((EventKind::End, offset + i + 1));
            }
            offset = window.len();
            if self.arena.extend() == 0 {
                return Err(self.arena.exhausted(Markup::EndTag));
            }
        }
    }

    /// Finds the first `>` outside of a quoted attribute value.
    fn scan_start_tag(&mut self) -> Result<(EventKind, usize), XmlError> {
        let mut quote: Option<u8> = None;
        let mut offset = 1;
        loop {
            let window = self.arena.window();
            while offset < window.len() {
                match quote {
                    None => match find_tag_delimiter(&window[offset..]) {
                        Some(i) => {
                            let pos = offset + i;
                            if window[pos] == b'>' {
                                return Ok((EventKind::Start, pos + 1));
                            }
                            quote = Some(window[pos]);
                            offset = pos + 1;
                        }
                        None => offset = window.len(),
                    },
                    Some(q) => match memchr(q, &window[offset..]) {
                        Some(i) => {
                            quote = None;
                            offset += i + 1;
                        }
                        None => offset = window.len(),
                    },
                }
            }
            if self.arena.extend() == 0 {
                return Err(self.arena.exhausted(Markup::StartTag));
            }
        }
    }
}

impl<R> fmt::Debug for Reader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("state", &self.state)
            .field("failure", &self.failure)
            .field("emit_self_closing_tag", &self.emit_self_closing_tag)
            .finish()
    }
}
