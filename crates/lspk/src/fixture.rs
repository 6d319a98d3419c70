//! Minimal package writer for tests.
//!
//! Only enabled for this crate's own tests and behind the `fixtures` feature.
//! It writes exactly the layout the reader expects and nothing more: no
//! checksums, no multi-part output.

use crate::{
    compression::{self, Framing},
    entry::{encode_entry_name, FileEntry15, FileEntry18},
    CompressionMethod, PackageHeader, Result, MAGIC,
};
use binrw::BinWrite;
use byteorder::{WriteBytesExt, LE};
use camino::Utf8Path;
use std::io::{Cursor, Write};

#[derive(Debug, Clone)]
struct FixtureEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    archive_part: u32,
}

/// Builds package bytes in memory.
#[derive(Debug, Clone)]
pub struct PackageWriter {
    version: u32,
    solid: bool,
    priority: u8,
    entries: Vec<FixtureEntry>,
}

struct StoredEntry {
    offset: u64,
    size_on_disk: u64,
    uncompressed_size: u64,
}

impl PackageWriter {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            solid: false,
            priority: 0,
            entries: Vec::new(),
        }
    }

    /// Compress all entries as a single stream. Every entry must use the same
    /// compression method.
    pub fn solid(mut self) -> Self {
        self.solid = true;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_entry(
        mut self,
        name: impl Into<String>,
        data: &[u8],
        compression: CompressionMethod,
    ) -> Self {
        self.entries.push(FixtureEntry {
            name: name.into(),
            data: data.to_vec(),
            compression,
            archive_part: 0,
        });
        self
    }

    /// Declare an entry stored in another archive part. Its data is not written.
    pub fn with_entry_in_part(mut self, name: impl Into<String>, data: &[u8], part: u32) -> Self {
        self.entries.push(FixtureEntry {
            name: name.into(),
            data: data.to_vec(),
            compression: CompressionMethod::None,
            archive_part: part,
        });
        self
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        self.build_with_declared_sizes(|_, size| size)
    }

    /// Build, letting `declare` change the uncompressed size written for each
    /// entry (by index). Used to produce packages with lying size fields.
    pub fn build_with_declared_sizes(&self, declare: impl Fn(usize, u64) -> u64) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        let header_len = PackageHeader::size_for(self.version);
        out.write_all(&vec![0u8; header_len as usize])?;

        let stored = if self.solid {
            self.write_solid_data(&mut out, header_len)?
        } else {
            self.write_entry_data(&mut out)?
        };

        let mut table = Cursor::new(Vec::new());
        for (index, (entry, stored)) in self.entries.iter().zip(&stored).enumerate() {
            let flags = entry.compression as u32;
            let uncompressed_size = declare(index, stored.uncompressed_size);
            if self.version >= 18 {
                FileEntry18 {
                    name: encode_entry_name(&entry.name),
                    offset_lo: stored.offset as u32,
                    offset_hi: (stored.offset >> 32) as u16,
                    archive_part: entry.archive_part as u8,
                    flags: flags as u8,
                    size_on_disk: stored.size_on_disk as u32,
                    uncompressed_size: uncompressed_size as u32,
                }
                .write(&mut table)?;
            } else {
                FileEntry15 {
                    name: encode_entry_name(&entry.name),
                    offset: stored.offset,
                    size_on_disk: stored.size_on_disk,
                    uncompressed_size,
                    archive_part: entry.archive_part,
                    flags,
                    crc: 0,
                    unknown: 0,
                }
                .write(&mut table)?;
            }
        }
        let compressed_table = compression::compress(
            CompressionMethod::Lz4,
            Framing::Block,
            table.get_ref(),
        )?;

        let file_list_offset = out.position();
        out.write_u32::<LE>(self.entries.len() as u32)?;
        let file_list_size = if self.version >= 18 {
            out.write_u32::<LE>(compressed_table.len() as u32)?;
            8 + compressed_table.len()
        } else {
            4 + compressed_table.len()
        };
        out.write_all(&compressed_table)?;

        out.set_position(0);
        out.write_all(&MAGIC)?;
        out.write_u32::<LE>(self.version)?;
        out.write_u64::<LE>(file_list_offset)?;
        out.write_u32::<LE>(file_list_size as u32)?;
        out.write_u8(if self.solid {
            PackageHeader::SOLID_FLAG
        } else {
            0
        })?;
        out.write_u8(self.priority)?;
        out.write_all(&[0u8; 16])?;
        if self.version >= 16 {
            out.write_u16::<LE>(1)?;
        }

        Ok(out.into_inner())
    }

    pub fn write_to(&self, path: impl AsRef<Utf8Path>) -> Result<()> {
        std::fs::write(path.as_ref().as_std_path(), self.build()?)?;
        Ok(())
    }

    fn write_entry_data(&self, out: &mut Cursor<Vec<u8>>) -> Result<Vec<StoredEntry>> {
        let mut stored = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if entry.archive_part != 0 {
                stored.push(StoredEntry {
                    offset: 0,
                    size_on_disk: entry.data.len() as u64,
                    uncompressed_size: entry.data.len() as u64,
                });
                continue;
            }
            let data = compression::compress(entry.compression, Framing::Block, &entry.data)?;
            stored.push(StoredEntry {
                offset: out.position(),
                size_on_disk: data.len() as u64,
                uncompressed_size: entry.data.len() as u64,
            });
            out.write_all(&data)?;
        }
        Ok(stored)
    }

    fn write_solid_data(
        &self,
        out: &mut Cursor<Vec<u8>>,
        stream_offset: u64,
    ) -> Result<Vec<StoredEntry>> {
        let method = self
            .entries
            .first()
            .map(|e| e.compression)
            .unwrap_or_default();
        let plain: Vec<u8> = self.entries.iter().flat_map(|e| e.data.clone()).collect();
        let stream = compression::compress(method, Framing::Stream, &plain)?;
        out.write_all(&stream)?;

        // The first entry carries the whole stream's stored size.
        Ok(self
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| StoredEntry {
                offset: stream_offset,
                size_on_disk: if index == 0 { stream.len() as u64 } else { 0 },
                uncompressed_size: entry.data.len() as u64,
            })
            .collect())
    }
}
