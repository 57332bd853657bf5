use std::{error, fmt, io, result};

use crate::chunk::ChunkType;

pub type Result<T = ()> = result::Result<T, DecodingError>;

/// An error while reading, decoding or rewriting a PNG datastream.
#[derive(Debug)]
pub enum DecodingError {
    /// An error in IO of the underlying reader or writer.
    IoError(io::Error),
    /// The datastream is structurally malformed.
    Format(FormatError),
    /// The image data does not inflate to a well-sized scanline buffer.
    Corrupt(DataCorruptError),
    /// The datastream uses a feature this crate does not reconstruct.
    Unsupported(UnsupportedFeatureError),
    /// An allocation derived from the input would exceed the configured limits.
    LimitsExceeded,
}

/// Structural problems with the container, its header, palette, rows or text chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The first eight bytes are not the PNG signature.
    BadSignature,
    /// The input ended before the `IEND` chunk.
    Truncated,
    /// A chunk type code contains bytes that are not ASCII letters.
    InvalidChunkType([u8; 4]),
    /// A chunk length above 2^31 - 1.
    InvalidChunkLength(u32),
    /// Stored and computed checksums differ. Only reported when verification is enabled.
    CrcMismatch {
        chunk_type: ChunkType,
        stored: u32,
        computed: u32,
    },
    /// No `IHDR`, or `IHDR` is not the first chunk.
    MissingHeader,
    /// `IHDR` payload is not 13 bytes long.
    BadHeaderLength(u32),
    /// Zero width or height.
    InvalidDimensions { width: u32, height: u32 },
    /// A bit depth / color type pair the format does not allow.
    InvalidColorConfig { bit_depth: u8, color_type: u8 },
    /// `PLTE` payload is not a whole number of RGB triples, or has too many or no entries.
    BadPaletteLength(u32),
    /// An indexed image without a `PLTE` chunk ahead of its image data.
    MissingPalette,
    /// A row starts with a filter type other than 0 to 4.
    InvalidFilterType { row: u32, filter: u8 },
    /// A palette index points past the last palette entry.
    PaletteIndexOutOfRange { index: u8, palette_len: usize },
    /// No `IEND` chunk to close the datastream.
    MissingEndMarker,
    /// A text chunk lacks a required field terminator.
    MalformedTextChunk(&'static str),
}

/// The inflated image data is unusable.
#[derive(Debug)]
pub enum DataCorruptError {
    /// The zlib stream could not be inflated.
    Inflate(fdeflate::DecompressionError),
    /// The zlib stream ended early.
    UnexpectedEndOfStream,
    /// Inflated length differs from `height * (1 + stride)`.
    SizeMismatch { expected: usize, actual: usize },
}

/// Valid PNG features that reconstruction does not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedFeatureError {
    /// Adam7 or any other interlace method.
    Interlaced(u8),
    /// A compression method other than zlib/deflate (0).
    CompressionMethod(u8),
    /// A filter method other than adaptive filtering (0).
    FilterMethod(u8),
}

impl error::Error for DecodingError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            DecodingError::IoError(err) => Some(err),
            DecodingError::Format(err) => Some(err),
            DecodingError::Corrupt(err) => Some(err),
            DecodingError::Unsupported(err) => Some(err),
            DecodingError::LimitsExceeded => None,
        }
    }
}

impl fmt::Display for DecodingError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        use self::DecodingError::*;
        match self {
            IoError(err) => write!(fmt, "{}", err),
            Format(err) => write!(fmt, "{}", err),
            Corrupt(err) => write!(fmt, "{}", err),
            Unsupported(err) => write!(fmt, "{}", err),
            LimitsExceeded => write!(fmt, "limits are exceeded"),
        }
    }
}

impl error::Error for FormatError {}

impl fmt::Display for FormatError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        use self::FormatError::*;
        match self {
            BadSignature => write!(fmt, "Invalid PNG signature."),
            Truncated => write!(fmt, "Unexpected end of data before image end."),
            InvalidChunkType(code) => write!(fmt, "Invalid chunk type {:?}.", code),
            InvalidChunkLength(len) => {
                write!(fmt, "Chunk length {} exceeds the maximum of 2^31 - 1.", len)
            }
            CrcMismatch {
                chunk_type,
                stored,
                computed,
            } => write!(
                fmt,
                "CRC error: expected 0x{:x} have 0x{:x} while decoding {} chunk.",
                stored, computed, chunk_type
            ),
            MissingHeader => write!(fmt, "IHDR chunk missing or not first."),
            BadHeaderLength(len) => {
                write!(fmt, "IHDR chunk has length {}, expected 13.", len)
            }
            InvalidDimensions { width, height } => {
                write!(fmt, "Invalid image dimensions {}x{}.", width, height)
            }
            InvalidColorConfig {
                bit_depth,
                color_type,
            } => write!(
                fmt,
                "Invalid combination of bit-depth '{}' and color-type '{}'.",
                bit_depth, color_type
            ),
            BadPaletteLength(len) => write!(
                fmt,
                "PLTE chunk has length {}, expected a non-zero multiple of 3 up to 768.",
                len
            ),
            MissingPalette => write!(fmt, "Indexed image without a PLTE chunk before IDAT."),
            InvalidFilterType { row, filter } => {
                write!(fmt, "Invalid filter method ({}) in row {}.", filter, row)
            }
            PaletteIndexOutOfRange { index, palette_len } => write!(
                fmt,
                "Palette index {} out of range for a palette of {} entries.",
                index, palette_len
            ),
            MissingEndMarker => write!(fmt, "IEND chunk missing."),
            MalformedTextChunk(reason) => write!(fmt, "Malformed text chunk: {}.", reason),
        }
    }
}

impl error::Error for DataCorruptError {}

impl fmt::Display for DataCorruptError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match self {
            DataCorruptError::Inflate(err) => {
                write!(fmt, "Corrupt deflate stream. ")?;
                write!(fmt, "{:?}", err)
            }
            DataCorruptError::UnexpectedEndOfStream => {
                write!(fmt, "Deflate stream ended before its final block.")
            }
            DataCorruptError::SizeMismatch { expected, actual } => write!(
                fmt,
                "Image data inflated to {} bytes, expected {}.",
                actual, expected
            ),
        }
    }
}

impl error::Error for UnsupportedFeatureError {}

impl fmt::Display for UnsupportedFeatureError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match self {
            UnsupportedFeatureError::Interlaced(method) => {
                write!(fmt, "Interlace method {} is not supported.", method)
            }
            UnsupportedFeatureError::CompressionMethod(method) => {
                write!(fmt, "Unknown compression method {}.", method)
            }
            UnsupportedFeatureError::FilterMethod(method) => {
                write!(fmt, "Unknown filter method {}.", method)
            }
        }
    }
}

impl From<io::Error> for DecodingError {
    fn from(err: io::Error) -> DecodingError {
        DecodingError::IoError(err)
    }
}

impl From<FormatError> for DecodingError {
    fn from(err: FormatError) -> DecodingError {
        DecodingError::Format(err)
    }
}

impl From<DataCorruptError> for DecodingError {
    fn from(err: DataCorruptError) -> DecodingError {
        DecodingError::Corrupt(err)
    }
}

impl From<UnsupportedFeatureError> for DecodingError {
    fn from(err: UnsupportedFeatureError) -> DecodingError {
        DecodingError::Unsupported(err)
    }
}

impl From<DecodingError> for io::Error {
    fn from(err: DecodingError) -> io::Error {
        match err {
            DecodingError::IoError(err) => err,
            err => io::Error::new(io::ErrorKind::Other, err.to_string()),
        }
    }
}
