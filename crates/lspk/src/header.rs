use crate::{HeaderFault, PackageError};
use byteorder::{ReadBytesExt, LE};
use std::io::{self, Read};

/// Magic signature at the start of every package.
pub const MAGIC: [u8; 4] = *b"LSPK";

/// Format versions this reader understands.
pub const SUPPORTED_VERSIONS: [u32; 3] = [15, 16, 18];

/// The fixed-size package header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageHeader {
    pub version: u32,
    pub file_list_offset: u64,
    /// Size of the file list block, including its entry count prefix.
    pub file_list_size: u32,
    pub flags: u8,
    pub priority: u8,
    pub md5: [u8; 16],
    /// Number of archive parts. Always 1 for version 15, which has no field.
    pub num_parts: u16,
}

impl PackageHeader {
    /// All entries share a single compressed stream.
    pub const SOLID_FLAG: u8 = 0x04;

    pub fn is_solid(&self) -> bool {
        self.flags & Self::SOLID_FLAG != 0
    }

    /// On-disk size of the header (magic included) for a format version.
    pub fn size_for(version: u32) -> u64 {
        if version >= 16 {
            40
        } else {
            38
        }
    }

    /// Read and validate the header. Nothing past the version field is read
    /// when the magic or version is unrecognized.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, PackageError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).map_err(truncated)?;
        if magic != MAGIC {
            return Err(HeaderFault::BadMagic(u32::from_le_bytes(magic)).into());
        }

        let version = reader.read_u32::<LE>().map_err(truncated)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(HeaderFault::UnsupportedVersion(version).into());
        }

        let file_list_offset = reader.read_u64::<LE>().map_err(truncated)?;
        let file_list_size = reader.read_u32::<LE>().map_err(truncated)?;
        let flags = reader.read_u8().map_err(truncated)?;
        let priority = reader.read_u8().map_err(truncated)?;
        let mut md5 = [0u8; 16];
        reader.read_exact(&mut md5).map_err(truncated)?;
        let num_parts = if version >= 16 {
            reader.read_u16::<LE>().map_err(truncated)?
        } else {
            1
        };

        Ok(Self {
            version,
            file_list_offset,
            file_list_size,
            flags,
            priority,
            md5,
            num_parts,
        })
    }
}

fn truncated(err: io::Error) -> PackageError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        HeaderFault::Truncated.into()
    } else {
        PackageError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::{Cursor, Write};

    fn raw_header(magic: &[u8; 4], version: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_all(magic).unwrap();
        buf.write_u32::<LE>(version).unwrap();
        buf.write_u64::<LE>(40).unwrap();
        buf.write_u32::<LE>(8).unwrap();
        buf.write_u8(PackageHeader::SOLID_FLAG).unwrap();
        buf.write_u8(7).unwrap();
        buf.write_all(&[0u8; 16]).unwrap();
        if version >= 16 {
            buf.write_u16::<LE>(1).unwrap();
        }
        buf
    }

    #[test]
    fn test_read_v18_header() {
        let buf = raw_header(&MAGIC, 18);
        assert_eq!(buf.len() as u64, PackageHeader::size_for(18));

        let header = PackageHeader::read(&mut Cursor::new(buf)).unwrap();
        assert_eq!(header.version, 18);
        assert_eq!(header.file_list_offset, 40);
        assert_eq!(header.priority, 7);
        assert!(header.is_solid());
    }

    #[test]
    fn test_read_v15_header_has_no_parts_field() {
        let buf = raw_header(&MAGIC, 15);
        assert_eq!(buf.len() as u64, PackageHeader::size_for(15));

        let header = PackageHeader::read(&mut Cursor::new(buf)).unwrap();
        assert_eq!(header.num_parts, 1);
    }

    #[test]
    fn test_bad_magic() {
        let buf = raw_header(b"PK\x03\x04", 18);
        let err = PackageHeader::read(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(
            err,
            PackageError::CorruptHeader(HeaderFault::BadMagic(_))
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let buf = raw_header(&MAGIC, 13);
        let err = PackageHeader::read(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(
            err,
            PackageError::CorruptHeader(HeaderFault::UnsupportedVersion(13))
        ));
    }

    #[test]
    fn test_truncated_header() {
        let mut buf = raw_header(&MAGIC, 18);
        buf.truncate(12);
        let err = PackageHeader::read(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(
            err,
            PackageError::CorruptHeader(HeaderFault::Truncated)
        ));
    }
}
