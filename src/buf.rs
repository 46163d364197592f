//! Byte-buffer utilities shared by the HTTP and WebSocket codecs.
//!
//! [`Cursor`] scans a caller-owned byte slice looking for a delimiter
//! without copying; callers advance the owning buffer only once a
//! complete token has been found. [`Spool`] is a small bounded overflow
//! buffer used when a codec must accumulate bytes across multiple
//! `decode`/`encode` calls (an HTTP header line split across reads, a
//! WebSocket text frame being converted before its length is known).
use bytes::{Buf, BufMut, BytesMut};

/// Find the first occurrence of `b"\r\n"` or a bare `b'\n'` in `buf`.
///
/// Returns the index of the delimiter's first byte and its length (1 for
/// a bare LF, 2 for CRLF), or `None` if no line terminator has arrived
/// yet.
pub fn find_line_end(buf: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i < buf.len() {
        match buf[i] {
            b'\n' => return Some((i, 1)),
            b'\r' => match buf.get(i + 1) {
                Some(b'\n') => return Some((i, 2)),
                Some(_) => return Some((i, 1)),
                None => return None,
            },
            _ => i += 1,
        }
    }
    None
}

/// Split `buf` at the first space (`b' '`), returning `(before, after)`.
pub fn split_at_space(buf: &[u8]) -> Option<(&[u8], &[u8])> {
    let pos = buf.iter().position(|&b| b == b' ')?;
    Some((&buf[..pos], &buf[pos + 1..]))
}

/// A small growable spool used to accumulate bytes across codec calls
/// when a complete structure (a header line, a converted text payload)
/// cannot be produced from the caller's buffer alone.
///
/// Bounded by `max`; pushing past the bound is reported to the caller as
/// a limit error rather than growing without end.
#[derive(Debug, Default)]
pub struct Spool {
    buf: BytesMut,
}

impl Spool {
    pub fn new() -> Self {
        Self { buf: BytesMut::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self { buf: BytesMut::with_capacity(cap) }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Append `data`, failing if the resulting length would exceed `max`.
    pub fn push(&mut self, data: &[u8], max: usize) -> Result<(), ()> {
        if self.buf.len() + data.len() > max {
            return Err(());
        }
        self.buf.put_slice(data);
        Ok(())
    }

    /// Drain up to `out`'s remaining capacity, returning how many bytes
    /// were written. Leaves unwritten bytes in the spool for the next
    /// call.
    pub fn drain_into(&mut self, out: &mut BytesMut) -> usize {
        let n = self.buf.len().min(out.capacity() - out.len());
        out.put_slice(&self.buf[..n]);
        self.buf.advance(n);
        n
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn take(&mut self) -> BytesMut {
        std::mem::take(&mut self.buf)
    }
}

/// Copy as many bytes as fit from `src` into the remaining capacity of
/// `out`, advancing both. Returns the number of bytes copied.
pub fn copy_into(src: &mut &[u8], out: &mut BytesMut) -> usize {
    let n = src.len().min(out.capacity() - out.len());
    out.put_slice(&src[..n]);
    *src = &src[n..];
    n
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn finds_crlf() {
        assert_eq!(find_line_end(b"abc\r\ndef"), Some((3, 2)));
    }

    #[test]
    fn finds_bare_lf() {
        assert_eq!(find_line_end(b"abc\ndef"), Some((3, 1)));
    }

    #[test]
    fn pending_when_no_terminator() {
        assert_eq!(find_line_end(b"abc"), None);
    }

    #[test]
    fn pending_on_trailing_cr() {
        assert_eq!(find_line_end(b"abc\r"), None);
    }

    #[test]
    fn spool_bounds() {
        let mut spool = Spool::new();
        assert!(spool.push(b"hello", 10).is_ok());
        assert!(spool.push(b"world!", 10).is_err());
    }
}
