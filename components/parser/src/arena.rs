//! Growable lookahead buffer over a pull-based byte source

use std::io::{self, ErrorKind, Read};
use std::sync::Arc;

use log::trace;

use crate::error::Markup;
use crate::XmlError;

/// Smallest storage the arena works with, so that `extend` always has room to read into.
pub(crate) const MIN_BUFFER_SIZE: usize = 16;

/// Why the source stopped delivering bytes.
#[derive(Clone, Debug)]
pub(crate) enum Terminal {
    Eof,
    Io(Arc<io::Error>),
}

/// Byte arena
///
/// `buf[offset..end]` is the unread window. The storage size is `buf.capacity()`; `buf.len()`
/// marks how much of it has been initialized so far. Bytes outside the window are stale.
///
/// Storage is zero-filled once per allocation, when a read first reaches it, so a buffer passed
/// through [`Arena::into_buffer`] and [`Arena::with_buffer`] is not rewritten for every document.
pub(crate) struct Arena<R> {
    buf: Vec<u8>,
    offset: usize,
    end: usize,
    source: R,
    terminal: Option<Terminal>,
}

impl<R: Read> Arena<R> {
    pub fn with_capacity(source: R, capacity: usize) -> Self {
        Self::with_buffer(source, Vec::with_capacity(capacity))
    }

    /// Uses the allocation of `buf` as storage. Its contents are treated as scratch space.
    pub fn with_buffer(source: R, mut buf: Vec<u8>) -> Self {
        if buf.capacity() < MIN_BUFFER_SIZE {
            buf.reserve_exact(MIN_BUFFER_SIZE - buf.len());
        }
        Self {
            buf,
            offset: 0,
            end: 0,
            source,
            terminal: None,
        }
    }

    /// Rebinds to `source`, keeping the storage.
    pub fn reset(&mut self, source: R) {
        self.source = source;
        self.offset = 0;
        self.end = 0;
        self.terminal = None;
    }

    #[inline]
    pub fn window(&self) -> &[u8] {
        &self.buf[self.offset..self.end]
    }

    /// Marks `n` bytes of the window as read.
    #[inline]
    pub fn consume(&mut self, n: usize) {
        debug_assert!(self.offset + n <= self.end);
        self.offset += n;
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn slice_mut(&mut self, start: usize, end: usize) -> &mut [u8] {
        &mut self.buf[start..end]
    }

    #[cfg(test)]
    pub fn terminal(&self) -> Option<&Terminal> {
        self.terminal.as_ref()
    }

    /// I/O error the source failed with, if any.
    pub fn io_error(&self) -> Option<XmlError> {
        match &self.terminal {
            Some(Terminal::Io(err)) => Some(XmlError::Io(err.clone())),
            _ => None,
        }
    }

    /// Error for a token the source stopped in the middle of.
    pub fn exhausted(&self, markup: Markup) -> XmlError {
        self.io_error()
            .unwrap_or_else(|| XmlError::unexpected_eof(markup))
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Gives back the storage. Its initialized part still holds stale input.
    pub fn into_buffer(self) -> Vec<u8> {
        self.buf
    }

    /// Pulls more bytes from the source into the window.
    ///
    /// Returns the number of new bytes, or zero once the source is exhausted. The reason is
    /// kept in [`Arena::terminal`] and every later call returns zero as well.
    pub fn extend(&mut self) -> usize {
        if self.terminal.is_some() {
            return 0;
        }

        if self.end == self.buf.capacity() {
            self.make_room();
        }
        if self.end == self.buf.len() {
            let size = self.buf.capacity();
            self.buf.resize(size, 0);
        }

        loop {
            match self.source.read(&mut self.buf[self.end..]) {
                Ok(0) => {
                    trace!("source exhausted after {} buffered bytes", self.end);
                    self.terminal = Some(Terminal::Eof);
                    return 0;
                }
                Ok(n) => {
                    self.end += n;
                    return n;
                }
                Err(ref err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    trace!("source failed: {}", err);
                    self.terminal = Some(Terminal::Io(Arc::new(err)));
                    return 0;
                }
            }
        }
    }

    /// Compacts the window to the start of the storage, grows the storage if that is not
    /// enough.
    fn make_room(&mut self) {
        if self.offset > 0 {
            trace!(
                "compacting {} unread bytes from offset {}",
                self.end - self.offset,
                self.offset
            );
            self.buf.copy_within(self.offset..self.end, 0);
            self.end -= self.offset;
            self.offset = 0;
        }

        if self.end == self.buf.capacity() {
            let size = self.buf.capacity();
            trace!("growing buffer from {} to {} bytes", size, size * 2);
            self.buf.reserve_exact(size);
        }
    }
}
