//! Byte source and sink abstraction shared by the stream and in-memory codecs.
//!
//! The decoder and encoder are written once against [`ByteSource`] and
//! [`ByteSink`]. A borrowed slice and a `Vec<u8>` back the in-memory codec;
//! `std::io::Read`/`Write` adapters back the file codec. Both therefore
//! produce and accept exactly the same bytes.

use alloc::vec::Vec;

use crate::error::PicError;

pub(crate) trait ByteSource {
    /// Read until `buf` is full or the input ends. Returns the count read.
    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize, PicError>;

    /// Discard up to `n` bytes. Returns the count discarded.
    fn skip(&mut self, n: u64) -> Result<u64, PicError>;

    /// Bytes consumed so far.
    fn position(&self) -> u64;

    /// Whether a read has hit the end of input.
    fn at_eof(&self) -> bool;

    /// Bytes left, when the source knows.
    fn remaining_hint(&self) -> Option<u64> {
        None
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), PicError> {
        if self.read_up_to(buf)? != buf.len() {
            return Err(PicError::UnexpectedEof);
        }
        Ok(())
    }

    fn skip_exact(&mut self, n: u64) -> Result<(), PicError> {
        if self.skip(n)? != n {
            return Err(PicError::UnexpectedEof);
        }
        Ok(())
    }

    fn read_u32_le(&mut self) -> Result<u32, PicError> {
        let mut word = [0u8; 4];
        self.read_exact(&mut word)?;
        Ok(u32::from_le_bytes(word))
    }
}

pub(crate) trait ByteSink {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), PicError>;

    /// Bytes written so far.
    fn position(&self) -> u64;

    fn write_u32_le(&mut self, value: u32) -> Result<(), PicError> {
        self.write_all(&value.to_le_bytes())
    }
}

// ── In-memory ───────────────────────────────────────────────────────

/// Cursor over a borrowed slice.
pub(crate) struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
    eof: bool,
}

impl<'a> SliceSource<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            eof: false,
        }
    }
}

impl ByteSource for SliceSource<'_> {
    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize, PicError> {
        let rest = &self.data[self.pos..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        if n < buf.len() {
            self.eof = true;
        }
        Ok(n)
    }

    fn skip(&mut self, n: u64) -> Result<u64, PicError> {
        let rest = (self.data.len() - self.pos) as u64;
        let step = rest.min(n);
        self.pos += step as usize;
        if step < n {
            self.eof = true;
        }
        Ok(step)
    }

    fn position(&self) -> u64 {
        self.pos as u64
    }

    fn at_eof(&self) -> bool {
        self.eof
    }

    fn remaining_hint(&self) -> Option<u64> {
        Some((self.data.len() - self.pos) as u64)
    }
}

/// Appending sink. Positions count from the length at creation.
pub(crate) struct VecSink<'a> {
    out: &'a mut Vec<u8>,
    start: usize,
}

impl<'a> VecSink<'a> {
    pub(crate) fn new(out: &'a mut Vec<u8>) -> Self {
        let start = out.len();
        Self { out, start }
    }
}

impl ByteSink for VecSink<'_> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), PicError> {
        self.out.extend_from_slice(bytes);
        Ok(())
    }

    fn position(&self) -> u64 {
        (self.out.len() - self.start) as u64
    }
}

// ── std::io adapters ────────────────────────────────────────────────

#[cfg(feature = "std")]
pub(crate) struct IoSource<R> {
    inner: R,
    pos: u64,
    eof: bool,
}

#[cfg(feature = "std")]
impl<R: std::io::Read> IoSource<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            pos: 0,
            eof: false,
        }
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read> ByteSource for IoSource<R> {
    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize, PicError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.pos += filled as u64;
                    return Err(PicError::Io(e));
                }
            }
        }
        self.pos += filled as u64;
        Ok(filled)
    }

    fn skip(&mut self, n: u64) -> Result<u64, PicError> {
        use std::io::Read as _;
        let step = std::io::copy(&mut (&mut self.inner).take(n), &mut std::io::sink())?;
        self.pos += step;
        if step < n {
            self.eof = true;
        }
        Ok(step)
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn at_eof(&self) -> bool {
        self.eof
    }
}

#[cfg(feature = "std")]
pub(crate) struct IoSink<W> {
    inner: W,
    pos: u64,
}

#[cfg(feature = "std")]
impl<W: std::io::Write> IoSink<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self { inner, pos: 0 }
    }

    pub(crate) fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(feature = "std")]
impl<W: std::io::Write> ByteSink for IoSink<W> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), PicError> {
        self.inner.write_all(bytes)?;
        self.pos += bytes.len() as u64;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_source_reports_eof_on_short_read() {
        let data = [1u8, 2, 3];
        let mut src = SliceSource::new(&data);
        let mut buf = [0u8; 2];
        assert_eq!(src.read_up_to(&mut buf).unwrap(), 2);
        assert!(!src.at_eof());
        assert_eq!(src.read_up_to(&mut buf).unwrap(), 1);
        assert!(src.at_eof());
        assert_eq!(src.position(), 3);
    }

    #[test]
    fn read_exact_fails_past_end() {
        let mut src = SliceSource::new(&[0u8; 3]);
        assert!(matches!(src.read_u32_le(), Err(PicError::UnexpectedEof)));
    }

    #[test]
    fn vec_sink_positions_are_relative() {
        let mut out = alloc::vec![9u8; 5];
        let mut sink = VecSink::new(&mut out);
        sink.write_u32_le(7).unwrap();
        assert_eq!(sink.position(), 4);
        assert_eq!(out, [9, 9, 9, 9, 9, 7, 0, 0, 0]);
    }
}
