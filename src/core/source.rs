//! Purpose: Resolve a caller-supplied byte source into a bounded byte slice for decoding.
//! Exports: `ByteSource`, `DecodeOptions`, `SourceBytes`, `read_source`.
//! Role: Only I/O in the crate; file ranges are memory-mapped for the duration of a call.
//! Invariants: No source larger than `DecodeOptions::max_bytes` (at most 64 KiB) is read.
//! Invariants: Sources are borrowed for one call and never retained.

use std::fs::File;
use std::ops::Deref;

use memmap2::{Mmap, MmapOptions};

use crate::core::error::{Error, ErrorKind};
use crate::core::format::MAX_SOURCE_BYTES;

#[derive(Clone, Copy, Debug)]
pub enum ByteSource<'a> {
    Slice(&'a [u8]),
    Str(&'a str),
    /// `length` bytes of `file` starting at `offset`, e.g. a resource packed inside a bundle.
    FileRange {
        file: &'a File,
        offset: u64,
        length: usize,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DecodeOptions {
    max_bytes: usize,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self {
            max_bytes: MAX_SOURCE_BYTES,
        }
    }

    /// Lower the accepted input size; values above 64 KiB are capped.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes.min(MAX_SOURCE_BYTES);
        self
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub(crate) fn check_len(&self, len: usize) -> Result<(), Error> {
        if len > self.max_bytes {
            return Err(Error::new(ErrorKind::ResourceTooLarge)
                .with_message(format!(
                    "resource is {len} bytes, limit is {} bytes",
                    self.max_bytes
                ))
                .with_hint("Split the effect into smaller resources."));
        }
        Ok(())
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

pub enum SourceBytes<'a> {
    Borrowed(&'a [u8]),
    Mapped(Mmap),
}

impl Deref for SourceBytes<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            SourceBytes::Borrowed(bytes) => *bytes,
            SourceBytes::Mapped(mmap) => &mmap[..],
        }
    }
}

pub fn read_source<'a>(source: ByteSource<'a>, options: &DecodeOptions) -> Result<SourceBytes<'a>, Error> {
    match source {
        ByteSource::Slice(bytes) => {
            options.check_len(bytes.len())?;
            Ok(SourceBytes::Borrowed(bytes))
        }
        ByteSource::Str(text) => {
            options.check_len(text.len())?;
            Ok(SourceBytes::Borrowed(text.as_bytes()))
        }
        ByteSource::FileRange {
            file,
            offset,
            length,
        } => map_range(file, offset, length, options).map(SourceBytes::Mapped),
    }
}

fn map_range(file: &File, offset: u64, length: usize, options: &DecodeOptions) -> Result<Mmap, Error> {
    options.check_len(length)?;
    if length == 0 {
        return Err(Error::new(ErrorKind::OutOfRange)
            .with_message("byte range is empty")
            .with_field("length"));
    }
    let file_len = file
        .metadata()
        .map(|meta| meta.len())
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to stat resource file")
                .with_source(err)
        })?;
    let end = offset.checked_add(length as u64);
    if end.is_none_or(|end| end > file_len) {
        return Err(Error::new(ErrorKind::Io).with_message(format!(
            "range {offset}+{length} exceeds file length {file_len}"
        )));
    }
    // SAFETY: the map is read-only and dropped before the decode call returns; callers
    // must not truncate the file concurrently.
    unsafe {
        MmapOptions::new()
            .offset(offset)
            .len(length)
            .map(file)
            .map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to map resource range")
                    .with_source(err)
            })
    }
}
