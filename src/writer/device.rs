//! Position-tracking output device.

use std::io::{self, Seek, SeekFrom, Write};

/// Wraps a writer and tracks the current byte offset, which the
/// cross-reference section needs for every object.
///
/// Output is strictly sequential. The one exception is [`patch`](Self::patch),
/// which overwrites bytes that were reserved earlier and then returns to the
/// end of the output.
#[derive(Debug)]
pub struct OutputDevice<W> {
    inner: W,
    position: u64,
    length: u64,
}

impl<W: Write> OutputDevice<W> {
    /// Wrap `inner`, counting offsets from zero.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            position: 0,
            length: 0,
        }
    }

    /// Current write offset.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Total number of bytes written so far.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Flush and return the wrapped writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write + Seek> OutputDevice<W> {
    /// Overwrite `bytes` at `offset`, then continue at the end of the output.
    ///
    /// The patched range must lie entirely inside what was already written.
    pub fn patch(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        if offset + bytes.len() as u64 > self.length {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "patch of {} bytes at {} extends past end of output ({})",
                    bytes.len(),
                    offset,
                    self.length
                ),
            ));
        }

        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.write_all(bytes)?;
        self.position = self.inner.seek(SeekFrom::Start(self.length))?;
        Ok(())
    }
}

impl<W: Write> Write for OutputDevice<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        self.length = self.length.max(self.position);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
