//! Buffered XML Reader
//!
//! Reads XML from any source implementing `Read` in bounded chunks, so a
//! consumer never holds more of the source than one chunk at a time.

use std::io::{self, Read};

/// Default chunk size for reading
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Chunked reader for streaming input
pub struct BufferedReader<R: Read> {
    reader: R,
    buffer: Vec<u8>,
    end: usize,
    eof: bool,
    total: u64,
}

impl<R: Read> BufferedReader<R> {
    /// Create a new buffered reader
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_CHUNK_SIZE)
    }

    /// Create a new buffered reader with the given chunk size (at least 1)
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        BufferedReader {
            reader,
            buffer: vec![0u8; capacity.max(1)],
            end: 0,
            eof: false,
            total: 0,
        }
    }

    /// Read the next chunk, `Ok(None)` once the source is exhausted
    pub fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        if self.eof {
            return Ok(None);
        }

        let read = loop {
            match self.reader.read(&mut self.buffer) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };

        if read == 0 {
            self.eof = true;
            self.end = 0;
            return Ok(None);
        }

        self.end = read;
        self.total += read as u64;
        Ok(Some(&self.buffer[..self.end]))
    }

    /// Check if we've reached end of input
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Total bytes read so far
    pub fn bytes_read(&self) -> u64 {
        self.total
    }
}

/// Read entire XML document from a Read source
pub fn read_all<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_in_chunks() {
        let data = b"<root>content</root>";
        let mut reader = BufferedReader::with_capacity(Cursor::new(data.to_vec()), 8);

        let mut collected = Vec::new();
        let mut chunks = 0;
        while let Some(chunk) = reader.next_chunk().unwrap() {
            assert!(chunk.len() <= 8);
            collected.extend_from_slice(chunk);
            chunks += 1;
        }

        assert_eq!(collected, data);
        assert_eq!(chunks, 3);
        assert!(reader.is_eof());
        assert_eq!(reader.bytes_read(), data.len() as u64);
    }

    #[test]
    fn test_retries_interrupted_reads() {
        struct Flaky {
            interrupted: bool,
            inner: Cursor<Vec<u8>>,
        }

        impl Read for Flaky {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if !self.interrupted {
                    self.interrupted = true;
                    return Err(io::Error::new(io::ErrorKind::Interrupted, "again"));
                }
                self.inner.read(buf)
            }
        }

        let flaky = Flaky {
            interrupted: false,
            inner: Cursor::new(b"<a/>".to_vec()),
        };
        let mut reader = BufferedReader::new(flaky);
        assert_eq!(reader.next_chunk().unwrap(), Some(&b"<a/>"[..]));
    }

    #[test]
    fn test_read_all() {
        let data = b"<root>content</root>";
        assert_eq!(read_all(Cursor::new(data.to_vec())).unwrap(), data);
    }
}
