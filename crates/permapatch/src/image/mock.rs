//! In-memory image with failure injection for tests

use std::collections::HashSet;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// In-memory disk image that can be told to fail specific reads and writes
#[derive(Debug, Default)]
pub struct MockImage {
    data: Vec<u8>,
    position: u64,
    failing_reads: HashSet<u64>,
    failing_writes: HashSet<u64>,
    failing_flush: bool,
    /// Start address of every successful write, in order
    pub write_log: Vec<u64>,
}

impl MockImage {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    /// Make any read that starts at `address` fail
    pub fn fail_read_at(mut self, address: u64) -> Self {
        self.failing_reads.insert(address);
        self
    }

    /// Make every flush fail
    pub fn fail_flush(mut self) -> Self {
        self.failing_flush = true;
        self
    }

    /// Make any write that starts at `address` fail
    pub fn fail_write_at(mut self, address: u64) -> Self {
        self.failing_writes.insert(address);
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_at(&self, address: u64, len: usize) -> &[u8] {
        let start = address as usize;
        &self.data[start..start + len]
    }
}

impl Read for MockImage {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.failing_reads.contains(&self.position) {
            return Err(io::Error::other(format!(
                "injected read failure at {:#x}",
                self.position
            )));
        }

        let start = (self.position as usize).min(self.data.len());
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.position += n as u64;
        Ok(n)
    }
}

impl Write for MockImage {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failing_writes.contains(&self.position) {
            return Err(io::Error::other(format!(
                "injected write failure at {:#x}",
                self.position
            )));
        }

        let start = self.position as usize;
        let end = start + buf.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(buf);
        self.write_log.push(self.position);
        self.position = end as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.failing_flush {
            return Err(io::Error::other("injected flush failure"));
        }
        Ok(())
    }
}

impl Seek for MockImage {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => (self.data.len() as u64).checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        };
        match target {
            Some(offset) => {
                self.position = offset;
                Ok(offset)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek to a negative position",
            )),
        }
    }
}
