use crate::{CompressionMethod, HeaderFault, PackageError};
use binrw::binrw;

/// Size of the NUL-padded name field in every file table row.
pub const ENTRY_NAME_LEN: usize = 256;

/// One file inside a package, as described by its file table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    /// Package-relative path, always using `/` separators.
    pub name: String,
    /// Byte offset of the entry's data inside the package file.
    pub offset: u64,
    /// Size of the stored (possibly compressed) data.
    pub compressed_size: u64,
    /// Size of the data after decompression.
    pub uncompressed_size: u64,
    pub compression: CompressionMethod,
    /// Index of the archive part holding the data. Only part 0 (the package
    /// file itself) can be read.
    pub archive_part: u32,
}

impl PackageEntry {
    pub fn is_compressed(&self) -> bool {
        self.compression != CompressionMethod::None
    }

    /// Byte offset just past the stored data.
    pub fn end_offset(&self) -> Option<u64> {
        self.offset.checked_add(self.compressed_size)
    }

    fn from_parts(
        name: &[u8; ENTRY_NAME_LEN],
        offset: u64,
        compressed_size: u64,
        uncompressed_size: u64,
        flags: u32,
        archive_part: u32,
    ) -> Result<Self, PackageError> {
        let compression = CompressionMethod::from_flags(flags)?;

        // Stored entries are written with a zero uncompressed size.
        let uncompressed_size = if compression == CompressionMethod::None && uncompressed_size == 0
        {
            compressed_size
        } else {
            uncompressed_size
        };

        Ok(Self {
            name: decode_entry_name(name)?,
            offset,
            compressed_size,
            uncompressed_size,
            compression,
            archive_part,
        })
    }
}

fn decode_entry_name(raw: &[u8; ENTRY_NAME_LEN]) -> Result<String, PackageError> {
    let len = raw.iter().position(|&b| b == 0).unwrap_or(ENTRY_NAME_LEN);
    let name = std::str::from_utf8(&raw[..len]).map_err(|_| {
        HeaderFault::FileTable(format!(
            "entry name is not valid UTF-8: {:?}",
            String::from_utf8_lossy(&raw[..len])
        ))
    })?;
    if name.is_empty() {
        return Err(HeaderFault::FileTable("entry with an empty name".to_string()).into());
    }
    Ok(name.replace('\\', "/"))
}

#[cfg(any(test, feature = "fixtures"))]
pub(crate) fn encode_entry_name(name: &str) -> [u8; ENTRY_NAME_LEN] {
    let mut raw = [0u8; ENTRY_NAME_LEN];
    let bytes = name.as_bytes();
    let len = bytes.len().min(ENTRY_NAME_LEN - 1);
    raw[..len].copy_from_slice(&bytes[..len]);
    raw
}

/// File table row used by format version 18.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FileEntry18 {
    pub name: [u8; ENTRY_NAME_LEN],
    pub offset_lo: u32,
    pub offset_hi: u16,
    pub archive_part: u8,
    pub flags: u8,
    pub size_on_disk: u32,
    pub uncompressed_size: u32,
}

impl FileEntry18 {
    pub const SIZE: usize = ENTRY_NAME_LEN + 4 + 2 + 1 + 1 + 4 + 4;

    pub fn into_entry(self) -> Result<PackageEntry, PackageError> {
        let offset = u64::from(self.offset_lo) | (u64::from(self.offset_hi) << 32);
        PackageEntry::from_parts(
            &self.name,
            offset,
            u64::from(self.size_on_disk),
            u64::from(self.uncompressed_size),
            u32::from(self.flags),
            u32::from(self.archive_part),
        )
    }
}

/// File table row used by format versions 15 and 16.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FileEntry15 {
    pub name: [u8; ENTRY_NAME_LEN],
    pub offset: u64,
    pub size_on_disk: u64,
    pub uncompressed_size: u64,
    pub archive_part: u32,
    pub flags: u32,
    pub crc: u32,
    pub unknown: u32,
}

impl FileEntry15 {
    pub const SIZE: usize = ENTRY_NAME_LEN + 8 * 3 + 4 * 4;

    pub fn into_entry(self) -> Result<PackageEntry, PackageError> {
        PackageEntry::from_parts(
            &self.name,
            self.offset,
            self.size_on_disk,
            self.uncompressed_size,
            self.flags,
            self.archive_part,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::{BinRead, BinWrite};
    use std::io::Cursor;

    #[test]
    fn test_row_sizes() {
        let row18 = FileEntry18 {
            name: encode_entry_name("a"),
            offset_lo: 0,
            offset_hi: 0,
            archive_part: 0,
            flags: 0,
            size_on_disk: 0,
            uncompressed_size: 0,
        };
        let mut cursor = Cursor::new(Vec::new());
        row18.write(&mut cursor).unwrap();
        assert_eq!(cursor.position() as usize, FileEntry18::SIZE);
        assert_eq!(FileEntry18::SIZE, 272);

        let row15 = FileEntry15 {
            name: encode_entry_name("a"),
            offset: 0,
            size_on_disk: 0,
            uncompressed_size: 0,
            archive_part: 0,
            flags: 0,
            crc: 0,
            unknown: 0,
        };
        let mut cursor = Cursor::new(Vec::new());
        row15.write(&mut cursor).unwrap();
        assert_eq!(cursor.position() as usize, FileEntry15::SIZE);
        assert_eq!(FileEntry15::SIZE, 296);
    }

    #[test]
    fn test_v18_offset_combines_high_bits() {
        let row = FileEntry18 {
            name: encode_entry_name("Mods\\Alpha\\meta.lsx"),
            offset_lo: 0x1000,
            offset_hi: 0x2,
            archive_part: 0,
            flags: 0x21,
            size_on_disk: 10,
            uncompressed_size: 40,
        };

        let mut cursor = Cursor::new(Vec::new());
        row.write(&mut cursor).unwrap();
        cursor.set_position(0);
        let entry = FileEntry18::read(&mut cursor).unwrap().into_entry().unwrap();

        assert_eq!(entry.name, "Mods/Alpha/meta.lsx");
        assert_eq!(entry.offset, 0x2_0000_1000);
        assert_eq!(entry.compression, CompressionMethod::Zlib);
        assert_eq!(entry.uncompressed_size, 40);
    }

    #[test]
    fn test_stored_entry_size_normalised() {
        let row = FileEntry15 {
            name: encode_entry_name("readme.txt"),
            offset: 64,
            size_on_disk: 12,
            uncompressed_size: 0,
            archive_part: 0,
            flags: 0,
            crc: 0,
            unknown: 0,
        };
        let entry = row.into_entry().unwrap();
        assert_eq!(entry.uncompressed_size, 12);
        assert!(!entry.is_compressed());
    }

    #[test]
    fn test_invalid_name_rejected() {
        let mut name = [0u8; ENTRY_NAME_LEN];
        name[0] = 0xFF;
        name[1] = 0xFE;
        let row = FileEntry15 {
            name,
            offset: 0,
            size_on_disk: 0,
            uncompressed_size: 0,
            archive_part: 0,
            flags: 0,
            crc: 0,
            unknown: 0,
        };
        assert!(matches!(
            row.into_entry(),
            Err(PackageError::CorruptHeader(HeaderFault::FileTable(_)))
        ));
    }
}
