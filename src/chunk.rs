//! Chunk types and functions
#![allow(non_upper_case_globals)]
use core::fmt;
use std::io::{self, Write};

/// The eight bytes every PNG datastream starts with.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

// -- Ancillary chunk codes --

/// Textual data
pub const tEXt: [u8; 4] = *b"tEXt";
/// Compressed textual data
pub const zTXt: [u8; 4] = *b"zTXt";
/// International textual data
pub const iTXt: [u8; 4] = *b"iTXt";
/// Image last-modification time
pub const tIME: [u8; 4] = *b"tIME";

/// Type code of a chunk.
///
/// The four chunk types a minimal image is built from get their own variant. Every other code,
/// including critical codes this crate has no use for, lands in [`ChunkType::Ancillary`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum ChunkType {
    /// Image header
    IHDR,
    /// Palette
    PLTE,
    /// Image data
    IDAT,
    /// Image trailer
    IEND,
    /// Any other chunk, with its raw type code.
    Ancillary([u8; 4]),
}

impl ChunkType {
    pub fn from_bytes(code: [u8; 4]) -> Self {
        match &code {
            b"IHDR" => ChunkType::IHDR,
            b"PLTE" => ChunkType::PLTE,
            b"IDAT" => ChunkType::IDAT,
            b"IEND" => ChunkType::IEND,
            _ => ChunkType::Ancillary(code),
        }
    }

    pub const fn bytes(&self) -> [u8; 4] {
        match self {
            ChunkType::IHDR => *b"IHDR",
            ChunkType::PLTE => *b"PLTE",
            ChunkType::IDAT => *b"IDAT",
            ChunkType::IEND => *b"IEND",
            ChunkType::Ancillary(code) => *code,
        }
    }

    /// Returns true for the four chunk types that survive anonymization.
    pub fn is_required(&self) -> bool {
        !matches!(self, ChunkType::Ancillary(_))
    }

    /// Returns true if the chunk is critical according to its property bit.
    pub fn is_critical(&self) -> bool {
        is_critical(self.bytes())
    }
}

// -- Chunk type determination --

/// Returns true if the chunk is critical.
pub fn is_critical(type_: [u8; 4]) -> bool {
    type_[0] & 32 == 0
}

/// Returns true if the chunk is private.
pub fn is_private(type_: [u8; 4]) -> bool {
    type_[1] & 32 != 0
}

/// Checks whether the reserved bit of the chunk name is set.
/// If it is set the chunk name is invalid.
pub fn reserved_set(type_: [u8; 4]) -> bool {
    type_[2] & 32 != 0
}

/// Returns true if the chunk is safe to copy if unknown.
pub fn safe_to_copy(type_: [u8; 4]) -> bool {
    type_[3] & 32 != 0
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &c in &self.bytes() {
            write!(f, "{}", char::from(c).escape_debug())?;
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChunkType::Ancillary(code) => f
                .debug_struct("ChunkType")
                .field("type", &format_args!("{}", self))
                .field("critical", &is_critical(*code))
                .field("private", &is_private(*code))
                .field("reserved", &reserved_set(*code))
                .field("safecopy", &safe_to_copy(*code))
                .finish(),
            _ => write!(f, "{}", self),
        }
    }
}

/// A single chunk as it was read from the datastream.
///
/// The checksum is kept exactly as stored so the chunk can be written back out byte for byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    chunk_type: ChunkType,
    data: Vec<u8>,
    crc: u32,
}

impl Chunk {
    pub fn new(chunk_type: ChunkType, data: Vec<u8>, crc: u32) -> Self {
        Chunk {
            chunk_type,
            data,
            crc,
        }
    }

    pub fn chunk_type(&self) -> ChunkType {
        self.chunk_type
    }

    /// The payload, exactly `len()` bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Value of the length field.
    pub fn len(&self) -> u32 {
        self.data.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The stored checksum field.
    pub fn crc(&self) -> u32 {
        self.crc
    }

    /// CRC-32 over type code and payload, as it should have been stored.
    pub fn computed_crc(&self) -> u32 {
        crc32(self.chunk_type.bytes(), &self.data)
    }

    /// Writes length, type, payload and the stored checksum.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.len().to_be_bytes())?;
        w.write_all(&self.chunk_type.bytes())?;
        w.write_all(&self.data)?;
        w.write_all(&self.crc.to_be_bytes())
    }
}

pub fn crc32(chunk_type: [u8; 4], data: &[u8]) -> u32 {
    let mut crc = crc32fast::Hasher::new();
    crc.update(&chunk_type);
    crc.update(data);
    crc.finalize()
}

/// Writes a chunk with a freshly computed checksum.
pub fn encode_chunk<W: Write>(w: &mut W, chunk: ChunkType, data: &[u8]) -> io::Result<()> {
    w.write_all(&(data.len() as u32).to_be_bytes())?;
    w.write_all(&chunk.bytes())?;
    w.write_all(data)?;
    w.write_all(&crc32(chunk.bytes(), data).to_be_bytes())
}

/// Positions of the interesting chunks in a chunk sequence, built in a single pass.
///
/// `header`, `palette` and `end` record the first occurrence only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkIndex {
    header: Option<usize>,
    palette: Option<usize>,
    data: Vec<usize>,
    end: Option<usize>,
    text: Vec<usize>,
}

impl ChunkIndex {
    pub fn build(chunks: &[Chunk]) -> Self {
        let mut index = ChunkIndex::default();
        for (i, chunk) in chunks.iter().enumerate() {
            match chunk.chunk_type() {
                ChunkType::IHDR => {
                    index.header.get_or_insert(i);
                }
                ChunkType::PLTE => {
                    index.palette.get_or_insert(i);
                }
                ChunkType::IDAT => index.data.push(i),
                ChunkType::IEND => {
                    index.end.get_or_insert(i);
                }
                ChunkType::Ancillary(tEXt | zTXt | iTXt) => index.text.push(i),
                ChunkType::Ancillary(_) => {}
            }
        }
        index
    }

    pub fn header(&self) -> Option<usize> {
        self.header
    }

    pub fn palette(&self) -> Option<usize> {
        self.palette
    }

    /// Positions of all `IDAT` chunks, in encounter order.
    pub fn data(&self) -> &[usize] {
        &self.data
    }

    pub fn first_data(&self) -> Option<usize> {
        self.data.first().copied()
    }

    pub fn end(&self) -> Option<usize> {
        self.end
    }

    /// Positions of all `tEXt`, `zTXt` and `iTXt` chunks.
    pub fn text(&self) -> &[usize] {
        &self.text
    }
}
