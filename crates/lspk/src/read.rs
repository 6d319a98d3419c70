use binrw::BinRead;
use byteorder::{ReadBytesExt, LE};
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};

use crate::{
    compression::{self, Framing},
    decoder::SolidLayout,
    entry::{FileEntry15, FileEntry18},
    CompressionMethod, HeaderFault, Package, PackageEntry, PackageError, PackageHeader, Result,
};

/// Upper bound on the LZ4 expansion ratio, used to reject absurd entry counts
/// before allocating the decompressed file table.
const MAX_LZ4_RATIO: u64 = 255;

impl<TSource: Read + Seek> Package<TSource> {
    /// Parse the header and file table of a package.
    ///
    /// Fails without a partial index if the magic, version or file table is
    /// not valid.
    pub fn mount_from_reader(mut source: TSource) -> Result<Self> {
        let file_len = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;

        let mut reader = BufReader::new(&mut source);
        let header = PackageHeader::read(&mut reader)?;
        let entries = read_file_table(&mut reader, &header, file_len)?;
        drop(reader);

        let solid = if header.is_solid() {
            Some(SolidLayout::new(&entries, file_len)?)
        } else {
            None
        };

        tracing::debug!(
            "Mounted package v{} entries={} solid={} parts={}",
            header.version,
            entries.len(),
            solid.is_some(),
            header.num_parts
        );

        Ok(Self {
            header,
            entries,
            solid,
            solid_stream: None,
            source,
        })
    }
}

fn read_file_table<R: Read + Seek>(
    reader: &mut R,
    header: &PackageHeader,
    file_len: u64,
) -> Result<Vec<PackageEntry>> {
    if header.file_list_offset < PackageHeader::size_for(header.version)
        || header.file_list_offset >= file_len
    {
        return Err(table_fault(format!(
            "file list offset {} is outside the package ({} bytes)",
            header.file_list_offset, file_len
        )));
    }
    reader.seek(SeekFrom::Start(header.file_list_offset))?;

    let num_files = reader.read_u32::<LE>().map_err(table_eof)?;
    let compressed_len = if header.version >= 18 {
        reader.read_u32::<LE>().map_err(table_eof)?
    } else {
        header
            .file_list_size
            .checked_sub(4)
            .ok_or_else(|| table_fault("file list size is smaller than its count prefix"))?
    };

    let row_size = if header.version >= 18 {
        FileEntry18::SIZE
    } else {
        FileEntry15::SIZE
    } as u64;
    let table_len = u64::from(num_files) * row_size;

    if u64::from(compressed_len) > file_len
        || table_len > u64::from(compressed_len) * MAX_LZ4_RATIO + 64
    {
        return Err(table_fault(format!(
            "{num_files} entries cannot fit in a {compressed_len} byte file table"
        )));
    }

    let mut compressed = vec![0u8; compressed_len as usize];
    reader.read_exact(&mut compressed).map_err(table_eof)?;

    if num_files == 0 {
        return Ok(Vec::new());
    }

    let table = compression::decompress(
        CompressionMethod::Lz4,
        Framing::Block,
        &compressed,
        table_len as usize,
    )
    .map_err(|e| table_fault(e.to_string()))?;

    let mut cursor = Cursor::new(table);
    let mut entries = Vec::with_capacity(num_files as usize);
    for _ in 0..num_files {
        let entry = if header.version >= 18 {
            FileEntry18::read(&mut cursor)?.into_entry()?
        } else {
            FileEntry15::read(&mut cursor)?.into_entry()?
        };

        if entry.archive_part == 0 && !entry.end_offset().is_some_and(|end| end <= file_len) {
            return Err(table_fault(format!(
                "entry '{}' extends past the end of the package",
                entry.name
            )));
        }

        tracing::trace!(
            "entry name={} offset={} size={}/{} method={}",
            entry.name,
            entry.offset,
            entry.compressed_size,
            entry.uncompressed_size,
            entry.compression
        );
        entries.push(entry);
    }

    Ok(entries)
}

fn table_fault(reason: impl Into<String>) -> PackageError {
    HeaderFault::FileTable(reason.into()).into()
}

fn table_eof(err: io::Error) -> PackageError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        table_fault("file table is truncated")
    } else {
        PackageError::Io(err)
    }
}
