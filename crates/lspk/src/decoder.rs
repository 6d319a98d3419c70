//! Entry extraction for both compression regimes.
//!
//! Per-entry packages decompress each entry independently from its own byte
//! range. Solid packages decompress one shared stream, cache it on the mounted
//! [`Package`], and slice entries out of it by their position in table order.

use crate::{
    compression::{self, Framing},
    CompressionMethod, HeaderFault, Package, PackageEntry, PackageError, Result,
};
use std::io::{Read, Seek, SeekFrom};

const SOLID_STREAM_NAME: &str = "<solid stream>";

/// Where the shared stream of a solid package lives and how it is split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SolidLayout {
    method: CompressionMethod,
    stream_offset: u64,
    compressed_len: u64,
    uncompressed_len: u64,
    /// Start of each entry inside the decompressed stream, in table order.
    starts: Vec<u64>,
}

impl SolidLayout {
    pub fn new(entries: &[PackageEntry], file_len: u64) -> Result<Self> {
        let method = entries
            .first()
            .map(|e| e.compression)
            .unwrap_or(CompressionMethod::None);
        if entries.iter().any(|e| e.compression != method) {
            return Err(HeaderFault::FileTable(
                "solid package mixes compression methods".to_string(),
            )
            .into());
        }

        let stream_offset = entries.iter().map(|e| e.offset).min().unwrap_or(0);
        let mut compressed_len = 0u64;
        let mut uncompressed_len = 0u64;
        let mut starts = Vec::with_capacity(entries.len());
        for entry in entries {
            starts.push(uncompressed_len);
            compressed_len = compressed_len.saturating_add(entry.compressed_size);
            uncompressed_len = uncompressed_len.saturating_add(entry.uncompressed_size);
        }

        if uncompressed_len > compression::max_decompressed_len(method, compressed_len) {
            return Err(HeaderFault::FileTable(format!(
                "solid stream declares {uncompressed_len} bytes from {compressed_len} stored bytes"
            ))
            .into());
        }

        if stream_offset.saturating_add(compressed_len) > file_len {
            return Err(HeaderFault::FileTable(
                "solid stream extends past the end of the package".to_string(),
            )
            .into());
        }

        Ok(Self {
            method,
            stream_offset,
            compressed_len,
            uncompressed_len,
            starts,
        })
    }
}

impl<TSource: Read + Seek> Package<TSource> {
    /// Load and decompress an entry by its exact path.
    pub fn extract(&mut self, name: &str) -> Result<Vec<u8>> {
        let index = self.index_of(name)?;
        self.extract_at(index)
    }

    /// Load the stored bytes of an entry without decompressing them.
    ///
    /// Not available for solid packages, whose entries have no standalone
    /// stored form.
    pub fn read_raw(&mut self, name: &str) -> Result<Box<[u8]>> {
        let index = self.index_of(name)?;
        if self.solid.is_some() {
            return Err(PackageError::Decompression {
                name: name.to_string(),
                source: crate::DecompressError::Corrupt {
                    method: self.entries[index].compression,
                    reason: "entries of a solid package have no standalone data".to_string(),
                },
            });
        }
        let entry = self.entries[index].clone();
        self.ensure_local_part(&entry)?;
        self.read_range(entry.offset, entry.compressed_size)
    }

    pub(crate) fn extract_at(&mut self, index: usize) -> Result<Vec<u8>> {
        let entry = self.entries[index].clone();
        self.ensure_local_part(&entry)?;

        if self.solid.is_some() {
            return self.extract_solid(index, &entry);
        }

        let stored = self.read_range(entry.offset, entry.compressed_size)?;
        compression::decompress(
            entry.compression,
            Framing::Block,
            &stored,
            declared_len(entry.uncompressed_size),
        )
        .map_err(|source| PackageError::Decompression {
            name: entry.name.clone(),
            source,
        })
    }

    fn extract_solid(&mut self, index: usize, entry: &PackageEntry) -> Result<Vec<u8>> {
        self.ensure_solid_stream()?;

        let (Some(layout), Some(stream)) = (&self.solid, &self.solid_stream) else {
            return Err(PackageError::EntryNotFound(entry.name.clone()));
        };
        let start = layout.starts[index] as usize;
        let end = start + entry.uncompressed_size as usize;
        Ok(stream[start..end].to_vec())
    }

    fn ensure_solid_stream(&mut self) -> Result<()> {
        if self.solid_stream.is_some() {
            return Ok(());
        }
        let Some(layout) = self.solid.clone() else {
            return Ok(());
        };

        tracing::debug!(
            "Decompressing solid stream offset={} size={}/{} method={}",
            layout.stream_offset,
            layout.compressed_len,
            layout.uncompressed_len,
            layout.method
        );

        let stored = self.read_range(layout.stream_offset, layout.compressed_len)?;
        let stream = compression::decompress(
            layout.method,
            Framing::Stream,
            &stored,
            declared_len(layout.uncompressed_len),
        )
        .map_err(|source| PackageError::Decompression {
            name: SOLID_STREAM_NAME.to_string(),
            source,
        })?;

        self.solid_stream = Some(stream.into_boxed_slice());
        Ok(())
    }

    fn ensure_local_part(&self, entry: &PackageEntry) -> Result<()> {
        if entry.archive_part != 0 {
            return Err(PackageError::ArchivePartUnavailable {
                name: entry.name.clone(),
                part: entry.archive_part,
            });
        }
        Ok(())
    }

    fn read_range(&mut self, offset: u64, len: u64) -> Result<Box<[u8]>> {
        self.source.seek(SeekFrom::Start(offset))?;
        let mut data = vec![0u8; len as usize];
        self.source.read_exact(&mut data)?;
        Ok(data.into_boxed_slice())
    }
}

/// Sizes that do not fit in memory saturate, so the codec rejects them.
fn declared_len(size: u64) -> usize {
    usize::try_from(size).unwrap_or(usize::MAX)
}
