//! Seek/read/write seam over a caller-owned disk image.
//!
//! The engine never opens or closes files. Every access seeks to an absolute
//! address first, so the implicit stream cursor is never relied on between
//! calls.

use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};

use crate::error::{Error, Result};

/// Random access to an opened disk image
pub trait ImageHandle {
    /// Read up to `buf.len()` bytes at `address`, stopping early only at end of file.
    ///
    /// Returns the number of bytes read; `0` means `address` is at or past EOF.
    fn read_at(&mut self, address: u64, buf: &mut [u8]) -> Result<usize>;

    /// Write all of `bytes` at `address`
    fn write_at(&mut self, address: u64, bytes: &[u8]) -> io::Result<()>;

    /// Flush buffered writes to the underlying storage
    fn flush_image(&mut self) -> io::Result<()>;

    /// Read exactly `size` bytes at `address`; a short read is an error
    fn read_bytes(&mut self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; size];
        let read = self.read_at(address, &mut buf)?;
        if read != size {
            return Err(Error::ReadFailed {
                address,
                source: io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("short read: {} of {} bytes", read, size),
                ),
            });
        }
        Ok(buf)
    }

    /// Read a fixed-size array at `address`
    fn read_array<const N: usize>(&mut self, address: u64) -> Result<[u8; N]>
    where
        Self: Sized,
    {
        let mut buf = [0u8; N];
        let read = self.read_at(address, &mut buf)?;
        if read != N {
            return Err(Error::ReadFailed {
                address,
                source: io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("short read: {} of {} bytes", read, N),
                ),
            });
        }
        Ok(buf)
    }
}

impl<T: Read + Write + Seek> ImageHandle for T {
    fn read_at(&mut self, address: u64, buf: &mut [u8]) -> Result<usize> {
        let map_err = |source| Error::ReadFailed { address, source };

        self.seek(SeekFrom::Start(address)).map_err(map_err)?;

        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_err(e)),
            }
        }
        Ok(filled)
    }

    fn write_at(&mut self, address: u64, bytes: &[u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(address))?;
        self.write_all(bytes)
    }

    fn flush_image(&mut self) -> io::Result<()> {
        self.flush()
    }
}
