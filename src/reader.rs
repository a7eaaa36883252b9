//! Buffered line reading over an arbitrary byte stream.
//!
//! The block parser consumes its input one line at a time.  [`LineReader`]
//! reads the underlying stream in 8 KiB chunks and yields one line per call,
//! including its terminator (`\n`, `\r` or `\r\n`, also when the pair
//! straddles a chunk boundary).  NUL bytes are replaced by the UTF-8
//! encoding of U+FFFD as lines are assembled; each replacement widens the
//! line by two bytes, which is why callers track original-stream offsets
//! separately from line lengths.

use std::io::{self, Read};

const CHUNK_SIZE: usize = 8192;

const NUL_REPLACEMENT: &[u8] = "\u{fffd}".as_bytes();

pub(crate) struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
    /// Consumed prefix of `buf`.
    pos: usize,
    /// Valid length of `buf`.
    filled: usize,
    eof: bool,
    /// Absolute original-stream offset of the next unread byte.
    offset: usize,
    /// 1-based number of the most recently read line.
    line_number: usize,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R) -> LineReader<R> {
        LineReader {
            inner,
            buf: Vec::new(),
            pos: 0,
            filled: 0,
            eof: false,
            offset: 0,
            line_number: 0,
        }
    }

    /// Absolute byte offset into the original stream of the read cursor.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 1-based line number of the most recently read line; 0 before the
    /// first read.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn fill(&mut self) -> io::Result<usize> {
        if self.pos > 0 {
            self.buf.copy_within(self.pos..self.filled, 0);
            self.filled -= self.pos;
            self.pos = 0;
        }
        if self.buf.len() < self.filled + CHUNK_SIZE {
            self.buf.resize(self.filled + CHUNK_SIZE, 0);
        }
        let n = self.inner.read(&mut self.buf[self.filled..])?;
        self.filled += n;
        if n == 0 {
            self.eof = true;
        }
        Ok(n)
    }

    /// Reads the next line into `out` (cleared first), replacing NULs and
    /// pushing the offset of each replacement (relative to `out`) onto
    /// `nul_offsets` (also cleared first).  Returns the line's length in the
    /// original stream, or `None` at end of input.
    pub fn read_line_into(
        &mut self,
        out: &mut Vec<u8>,
        nul_offsets: &mut Vec<usize>,
    ) -> io::Result<Option<usize>> {
        out.clear();
        nul_offsets.clear();
        let mut scanned = self.pos;

        let terminator_len = loop {
            // Scan the unconsumed buffer for a terminator, copying as we go.
            let mut i = scanned;
            let mut found = None;
            while i < self.filled {
                match self.buf[i] {
                    b'\n' => {
                        found = Some(1);
                        break;
                    }
                    b'\r' => {
                        if i + 1 < self.filled {
                            found = Some(if self.buf[i + 1] == b'\n' { 2 } else { 1 });
                            break;
                        }
                        if self.eof {
                            found = Some(1);
                            break;
                        }
                        // The \r may be half of a \r\n pair; read more.
                        break;
                    }
                    _ => i += 1,
                }
            }
            for &b in &self.buf[scanned..i] {
                if b == 0 {
                    nul_offsets.push(out.len());
                    out.extend_from_slice(NUL_REPLACEMENT);
                } else {
                    out.push(b);
                }
            }
            self.pos = i;

            if let Some(t) = found {
                break t;
            }
            if self.eof {
                break 0;
            }
            self.fill()?;
            scanned = self.pos;
        };

        if out.is_empty() && terminator_len == 0 {
            return Ok(None);
        }

        out.extend_from_slice(&self.buf[self.pos..self.pos + terminator_len]);
        self.pos += terminator_len;
        self.line_number += 1;

        let original_len = out.len() - nul_offsets.len() * (NUL_REPLACEMENT.len() - 1);
        self.offset += original_len;
        Ok(Some(original_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(input: &[u8]) -> Vec<(Vec<u8>, Vec<usize>, usize)> {
        let mut r = LineReader::new(input);
        let mut out = Vec::new();
        let mut nuls = Vec::new();
        let mut v = Vec::new();
        while let Some(len) = r.read_line_into(&mut out, &mut nuls).unwrap() {
            v.push((out.clone(), nuls.clone(), len));
        }
        v
    }

    #[test]
    fn splits_terminators() {
        let v = lines(b"a\nb\r\nc\rd");
        assert_eq!(
            v.iter().map(|(l, _, _)| l.as_slice()).collect::<Vec<_>>(),
            vec![b"a\n".as_ref(), b"b\r\n", b"c\r", b"d"]
        );
    }

    #[test]
    fn replaces_nuls() {
        let v = lines(b"a\0b\0\n");
        assert_eq!(v[0].0, "a\u{fffd}b\u{fffd}\n".as_bytes());
        assert_eq!(v[0].1, vec![1, 5]);
        assert_eq!(v[0].2, 5);
    }

    #[test]
    fn tracks_offsets() {
        let mut r = LineReader::new(&b"one\ntwo\n"[..]);
        let mut out = Vec::new();
        let mut nuls = Vec::new();
        assert_eq!(r.offset(), 0);
        r.read_line_into(&mut out, &mut nuls).unwrap();
        assert_eq!((r.offset(), r.line_number()), (4, 1));
        r.read_line_into(&mut out, &mut nuls).unwrap();
        assert_eq!((r.offset(), r.line_number()), (8, 2));
        assert_eq!(r.read_line_into(&mut out, &mut nuls).unwrap(), None);
    }

    #[test]
    fn long_lines_cross_chunks() {
        let mut input = vec![b'x'; CHUNK_SIZE * 2 + 17];
        input.push(b'\n');
        input.extend_from_slice(b"tail");
        let v = lines(&input);
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].0.len(), CHUNK_SIZE * 2 + 18);
        assert_eq!(v[1].0, b"tail");
    }

    #[test]
    fn crlf_across_chunk_boundary() {
        struct OneByte<'a>(&'a [u8]);
        impl Read for OneByte<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.0.is_empty() {
                    return Ok(0);
                }
                buf[0] = self.0[0];
                self.0 = &self.0[1..];
                Ok(1)
            }
        }
        let mut r = LineReader::new(OneByte(b"a\r\nb"));
        let mut out = Vec::new();
        let mut nuls = Vec::new();
        r.read_line_into(&mut out, &mut nuls).unwrap();
        assert_eq!(out, b"a\r\n");
        r.read_line_into(&mut out, &mut nuls).unwrap();
        assert_eq!(out, b"b");
    }
}
