// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Range-readable byte sources for lazy decoding.
//!
//! A [`ByteSource`] is the input of a lazy program: the splitter scans it in
//! chunks and the native decoder reads the exact byte range of each value it
//! is asked to materialize. Sources are shared behind `Arc` so deferred
//! property thunks can keep reading after the top-level call has returned.
//!
//! # Example
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use jsonplan::io::source::{ByteSource, MmapSource};
//!
//! let source = MmapSource::open("data.json")?;
//! assert!(source.len() > 0);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::{CodecError, Result};

/// Byte range of an undecoded value within a source.
///
/// `length = None` means "read to the end of the available range".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Boundary {
    /// Absolute byte offset of the first byte
    pub offset: usize,
    /// Number of bytes, or `None` for "until end"
    pub length: Option<usize>,
}

impl Boundary {
    /// Create a boundary.
    pub fn new(offset: usize, length: Option<usize>) -> Self {
        Self { offset, length }
    }

    /// Boundary covering a whole source.
    pub fn whole() -> Self {
        Self {
            offset: 0,
            length: None,
        }
    }

    /// Resolve the exclusive end offset against a source of `source_len` bytes.
    pub fn end(&self, source_len: usize) -> usize {
        match self.length {
            Some(len) => self.offset.saturating_add(len).min(source_len),
            None => source_len,
        }
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.length {
            Some(len) => write!(f, "{}..{}", self.offset, self.offset.saturating_add(len)),
            None => write!(f, "{}..", self.offset),
        }
    }
}

/// A seekable, range-readable source of JSON bytes.
pub trait ByteSource: Send + Sync + fmt::Debug {
    /// Total number of bytes available.
    fn len(&self) -> usize;

    /// Check if the source is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read bytes starting at `offset` into `buf`, returning how many were read.
    ///
    /// Returns 0 only at end of source.
    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize>;

    /// Borrow the whole source when it already lives in memory.
    fn as_slice(&self) -> Option<&[u8]> {
        None
    }
}

/// Read the bytes of `boundary` into an owned buffer.
pub fn read_range(source: &dyn ByteSource, boundary: Boundary) -> Result<Vec<u8>> {
    let end = boundary.end(source.len());
    if boundary.offset >= end {
        return Ok(Vec::new());
    }
    if let Some(data) = source.as_slice() {
        return Ok(data[boundary.offset..end].to_vec());
    }

    let mut buf = vec![0u8; end - boundary.offset];
    let mut filled = 0;
    while filled < buf.len() {
        let n = source.read_at(boundary.offset + filled, &mut buf[filled..])?;
        if n == 0 {
            return Err(CodecError::Io {
                message: format!(
                    "unexpected end of source at byte {} while reading {boundary}",
                    boundary.offset + filled
                ),
            });
        }
        filled += n;
    }
    Ok(buf)
}

fn copy_from_slice(data: &[u8], offset: usize, buf: &mut [u8]) -> usize {
    if offset >= data.len() {
        return 0;
    }
    let n = buf.len().min(data.len() - offset);
    buf[..n].copy_from_slice(&data[offset..offset + n]);
    n
}

impl ByteSource for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize> {
        Ok(copy_from_slice(self, offset, buf))
    }

    fn as_slice(&self) -> Option<&[u8]> {
        Some(self)
    }
}

impl ByteSource for String {
    fn len(&self) -> usize {
        String::len(self)
    }

    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize> {
        Ok(copy_from_slice(self.as_bytes(), offset, buf))
    }

    fn as_slice(&self) -> Option<&[u8]> {
        Some(self.as_bytes())
    }
}

impl ByteSource for Arc<[u8]> {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize> {
        Ok(copy_from_slice(self, offset, buf))
    }

    fn as_slice(&self) -> Option<&[u8]> {
        Some(self)
    }
}

/// A file read through seek + read.
///
/// The handle sits behind a mutex so one source can serve thunks created
/// by the same decode call in any order.
#[derive(Debug)]
pub struct FileSource {
    file: Mutex<File>,
    len: usize,
    path: String,
}

impl FileSource {
    /// Open a file as a byte source.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let path_str = path_ref.to_string_lossy().to_string();
        let file = File::open(path_ref).map_err(|e| CodecError::Io {
            message: format!("Failed to open file '{path_str}': {e}"),
        })?;
        let len = file.metadata()?.len() as usize;
        Ok(Self {
            file: Mutex::new(file),
            len,
            path: path_str,
        })
    }

    /// Get the file path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> usize {
        self.len
    }

    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize> {
        if offset >= self.len {
            return Ok(0);
        }
        let mut file = self.file.lock().map_err(|e| CodecError::Io {
            message: format!("File source lock poisoned: {e}"),
        })?;
        file.seek(SeekFrom::Start(offset as u64))?;
        Ok(file.read(buf)?)
    }
}

/// A memory-mapped file.
pub struct MmapSource {
    mmap: memmap2::Mmap,
    path: String,
}

impl MmapSource {
    /// Open and memory-map a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let path_str = path_ref.to_string_lossy().to_string();

        let file = File::open(path_ref).map_err(|e| CodecError::Io {
            message: format!("Failed to open file '{path_str}': {e}"),
        })?;

        // The map is owned here and only lent out through `as_slice`.
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| CodecError::Io {
            message: format!("Failed to mmap file '{path_str}': {e}"),
        })?;

        Ok(Self {
            mmap,
            path: path_str,
        })
    }

    /// Get the file path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Debug for MmapSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MmapSource")
            .field("path", &self.path)
            .field("len", &self.mmap.len())
            .finish()
    }
}

impl ByteSource for MmapSource {
    fn len(&self) -> usize {
        self.mmap.len()
    }

    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize> {
        Ok(copy_from_slice(&self.mmap, offset, buf))
    }

    fn as_slice(&self) -> Option<&[u8]> {
        Some(&self.mmap)
    }
}
