use crate::error::{DecompressError, PackageError};
use std::fmt::Display;
use std::io::{self, Read, Write};

/// The compression method of a package entry, stored in the low nibble of the
/// entry flags.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Default)]
pub enum CompressionMethod {
    #[default]
    None = 0,
    Zlib = 1,
    Lz4 = 2,
    Zstd = 3,
}

/// How LZ4 data is framed. Per-entry data and the file table use raw blocks,
/// solid streams use the LZ4 frame format. Other codecs ignore this.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Framing {
    Block,
    Stream,
}

impl CompressionMethod {
    pub const FLAGS_MASK: u32 = 0x0F;

    /// Extract the method from raw entry flags. The high nibble carries a
    /// compression level hint and is ignored.
    pub fn from_flags(flags: u32) -> Result<Self, PackageError> {
        Self::try_from((flags & Self::FLAGS_MASK) as u8)
    }
}

impl Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CompressionMethod::None => "none",
            CompressionMethod::Zlib => "zlib",
            CompressionMethod::Lz4 => "lz4",
            CompressionMethod::Zstd => "zstd",
        })
    }
}

impl TryFrom<u8> for CompressionMethod {
    type Error = PackageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => CompressionMethod::None,
            1 => CompressionMethod::Zlib,
            2 => CompressionMethod::Lz4,
            3 => CompressionMethod::Zstd,
            _ => {
                return Err(crate::HeaderFault::FileTable(format!(
                    "unknown compression method {value}"
                ))
                .into())
            }
        })
    }
}

/// Slack added to every expansion bound so tiny inputs (empty streams, frame
/// headers) are never rejected.
const EXPANSION_SLACK: u64 = 64;

/// Largest output a codec can produce from `compressed_len` input bytes.
///
/// Zlib tops out near 1032:1 and LZ4 near 255:1. Zstd RLE blocks encode a
/// 128 KiB block in 4 bytes.
pub fn max_decompressed_len(method: CompressionMethod, compressed_len: u64) -> u64 {
    let ratio = match method {
        CompressionMethod::None => return compressed_len,
        CompressionMethod::Zlib => 1032,
        CompressionMethod::Lz4 => 255,
        CompressionMethod::Zstd => 32 * 1024,
    };
    compressed_len
        .saturating_mul(ratio)
        .saturating_add(EXPANSION_SLACK)
}

/// Decompress `input`, requiring the output to be exactly `expected_len` bytes.
///
/// A declared length the codec cannot reach from `input` is rejected before
/// decoding, and decoders never read more than `expected_len + 1` output
/// bytes.
pub fn decompress(
    method: CompressionMethod,
    framing: Framing,
    input: &[u8],
    expected_len: usize,
) -> Result<Vec<u8>, DecompressError> {
    let corrupt = |e: &dyn Display| DecompressError::Corrupt {
        method,
        reason: e.to_string(),
    };

    let limit = max_decompressed_len(method, input.len() as u64);
    if method != CompressionMethod::None && expected_len as u64 > limit {
        return Err(DecompressError::ImplausibleSize {
            declared: expected_len as u64,
            stored: input.len() as u64,
        });
    }

    let output = match (method, framing) {
        (CompressionMethod::None, _) => input.to_vec(),
        (CompressionMethod::Zlib, _) => {
            read_bounded(flate2::read::ZlibDecoder::new(input), input.len(), expected_len)
                .map_err(|e| corrupt(&e))?
        }
        (CompressionMethod::Lz4, Framing::Block) => {
            lz4_flex::block::decompress(input, expected_len).map_err(|e| corrupt(&e))?
        }
        (CompressionMethod::Lz4, Framing::Stream) => read_bounded(
            lz4_flex::frame::FrameDecoder::new(input),
            input.len(),
            expected_len,
        )
        .map_err(|e| corrupt(&e))?,
        (CompressionMethod::Zstd, _) => {
            let decoder = zstd::stream::read::Decoder::new(input).map_err(|e| corrupt(&e))?;
            read_bounded(decoder, input.len(), expected_len).map_err(|e| corrupt(&e))?
        }
    };

    if output.len() != expected_len {
        return Err(DecompressError::LengthMismatch {
            expected: expected_len as u64,
            actual: output.len() as u64,
        });
    }

    Ok(output)
}

fn read_bounded<R: Read>(reader: R, input_len: usize, expected_len: usize) -> io::Result<Vec<u8>> {
    // grows past this as data actually arrives
    let mut output = Vec::with_capacity(expected_len.min(input_len.saturating_mul(4)));
    reader
        .take((expected_len as u64).saturating_add(1))
        .read_to_end(&mut output)?;
    Ok(output)
}

/// Compress `data` with the given method and framing.
pub fn compress(method: CompressionMethod, framing: Framing, data: &[u8]) -> io::Result<Vec<u8>> {
    match (method, framing) {
        (CompressionMethod::None, _) => Ok(data.to_vec()),
        (CompressionMethod::Zlib, _) => {
            let mut encoder =
                flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
        (CompressionMethod::Lz4, Framing::Block) => Ok(lz4_flex::block::compress(data)),
        (CompressionMethod::Lz4, Framing::Stream) => {
            let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
            encoder.write_all(data)?;
            encoder.finish().map_err(io::Error::other)
        }
        (CompressionMethod::Zstd, _) => zstd::encode_all(data, 3),
    }
}
