use bytes::{BufMut, Bytes, BytesMut};

const INITIAL_CAPACITY: usize = 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("offset {offset} is out of range for a slice of length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },
    #[error("offset {offset} + count {count} exceeds slice length {len}")]
    CountOutOfRange { offset: usize, count: usize, len: usize },
}

/// Growable byte buffer used while streaming a request off the socket.
///
/// The terminator of the request head is not known in advance, so bytes are
/// pushed one at a time and the tail is inspected after every push.
#[derive(Debug, Default)]
pub struct ByteAccumulator {
    buf: BytesMut,
}

impl ByteAccumulator {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    pub fn push(&mut self, byte: u8) {
        self.buf.put_u8(byte);
    }

    /// Appends `count` bytes of `src` starting at `offset`.
    ///
    /// `offset` must point inside `src` and `offset + count` must not run past
    /// its end.
    ///
    /// # Example
    ///
    /// ```
    /// # use rawhttp::http::buffer::ByteAccumulator;
    /// let mut acc = ByteAccumulator::new();
    /// acc.extend_from(b"xxhello", 2, 5).unwrap();
    /// assert_eq!(&acc.snapshot()[..], b"hello");
    /// assert!(acc.extend_from(b"abc", 1, 3).is_err());
    /// ```
    pub fn extend_from(&mut self, src: &[u8], offset: usize, count: usize) -> Result<(), BufferError> {
        if offset >= src.len() {
            return Err(BufferError::OffsetOutOfRange {
                offset,
                len: src.len(),
            });
        }
        match offset.checked_add(count) {
            Some(end) if end <= src.len() => {
                self.buf.extend_from_slice(&src[offset..end]);
                Ok(())
            }
            _ => Err(BufferError::CountOutOfRange {
                offset,
                count,
                len: src.len(),
            }),
        }
    }

    pub fn ends_with_crlf(&self) -> bool {
        self.buf.ends_with(b"\r\n")
    }

    pub fn ends_with_blank_line(&self) -> bool {
        self.buf.ends_with(b"\r\n\r\n")
    }

    /// Returns an immutable copy of everything accumulated so far.
    pub fn snapshot(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buf)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
