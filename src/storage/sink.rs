//! Output sinks
//!
//! The table builder writes through this narrow interface; where the bytes
//! end up (memory, a local file, something remote) is the caller's business.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SdbError};

/// Append-only byte destination
pub trait Sink {
    /// Append `data` after everything written so far
    fn append(&mut self, data: &[u8]) -> Result<()>;

    /// Total bytes appended
    fn size(&self) -> u64;

    /// Flush and release the destination
    fn close(&mut self) -> Result<()>;
}

/// In-memory sink, mostly for tests and for tables built then opened in place
impl Sink for Vec<u8> {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        self.extend_from_slice(data);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Buffered sink writing a new file
pub struct FileSink {
    path: PathBuf,
    /// None once closed
    writer: Option<BufWriter<File>>,
    size: u64,
}

impl FileSink {
    /// Create (or truncate) the file at `path`
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
            size: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            SdbError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("append to closed sink {}", self.path.display()),
            ))
        })?;
        writer.write_all(data)?;
        self.size += data.len() as u64;
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }

    /// Flush buffered bytes and fsync. Closing twice is a no-op.
    fn close(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            let file = writer.into_inner().map_err(|e| SdbError::Io(e.into_error()))?;
            file.sync_all()?;
            tracing::debug!(path = %self.path.display(), size = self.size, "sink closed");
        }
        Ok(())
    }
}
