mod header;
mod pixels;
mod read_chunks;
pub(crate) mod unfiltering_buffer;
mod zlib;

pub use self::header::{parse_ihdr, parse_ihdr_payload, parse_plte, resolve_palette};
pub use self::pixels::assemble;
pub use self::read_chunks::ChunkReader;
pub use self::unfiltering_buffer::{unfilter_scanlines, RasterBuffer};

use std::fmt;
use std::io::{Read, Write};

use self::zlib::ZlibStream;
use crate::anonymize::{anonymize, AnonymizeReport};
use crate::chunk::{Chunk, ChunkIndex, ChunkType};
use crate::common::{ImageHeader, Palette, PixelGrid};
use crate::error::{DecodingError, Result};
use crate::text_metadata::{TextChunk, DECOMPRESSION_LIMIT};

/// Limits on the resources the `Decoder` is allowed to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Maximum size of any single buffer derived from the input: a chunk payload, the inflated
    /// image data, the raster or the pixel grid. Default: 64 MiB.
    ///
    /// The pixel grid holds one `u16` per sample, so it needs twice as many bytes as an 8-bit
    /// image has samples. An image that fits the limit as a raster may still be refused by
    /// [`Container::decode`].
    pub bytes: usize,
}

impl Limits {
    pub(crate) fn check(&self, bytes: usize) -> Result<()> {
        if bytes > self.bytes {
            return Err(DecodingError::LimitsExceeded);
        }
        Ok(())
    }
}

impl Default for Limits {
    fn default() -> Limits {
        Limits {
            bytes: 1024 * 1024 * 64,
        }
    }
}

/// Decoder configuration options
#[derive(Clone, Copy, Debug)]
pub struct DecodeOptions {
    verify_crc: bool,
    ignore_adler32: bool,
    limits: Limits,
    text_decompression_limit: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            verify_crc: false,
            ignore_adler32: true,
            limits: Limits::default(),
            text_decompression_limit: DECOMPRESSION_LIMIT,
        }
    }
}

impl DecodeOptions {
    /// When set, every chunk's CRC-32 is checked against its type and payload.
    ///
    /// Defaults to `false`: the stored checksum is kept but not verified.
    pub fn set_verify_crc(&mut self, verify_crc: bool) {
        self.verify_crc = verify_crc;
    }

    /// When set, the Adler-32 trailer of the image data stream is not checked.
    ///
    /// Defaults to `true`.
    pub fn set_ignore_adler32(&mut self, ignore_adler32: bool) {
        self.ignore_adler32 = ignore_adler32;
    }

    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    /// Maximum inflated size of one compressed text field. Defaults to 2 MiB.
    pub fn set_text_decompression_limit(&mut self, limit: usize) {
        self.text_decompression_limit = limit;
    }

    pub fn verify_crc(&self) -> bool {
        self.verify_crc
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }
}

/// PNG Decoder
pub struct Decoder<R: Read> {
    read: R,
    options: DecodeOptions,
}

impl<R: Read> Decoder<R> {
    /// Create a new decoder configuration with default limits.
    pub fn new(r: R) -> Decoder<R> {
        Decoder::new_with_options(r, DecodeOptions::default())
    }

    /// Create a decoder configuration with custom `DecodeOptions`.
    pub fn new_with_options(r: R, options: DecodeOptions) -> Decoder<R> {
        Decoder { read: r, options }
    }

    pub fn set_limits(&mut self, limits: Limits) {
        self.options.set_limits(limits);
    }

    pub fn set_verify_crc(&mut self, verify_crc: bool) {
        self.options.set_verify_crc(verify_crc);
    }

    /// Checks the signature and returns a lazy reader over the chunks.
    pub fn chunks(self) -> Result<ChunkReader<R>> {
        ChunkReader::with_options(self.read, &self.options)
    }

    /// Reads every chunk up to and including `IEND`.
    pub fn read_container(self) -> Result<Container> {
        let options = self.options;
        let chunks = self.chunks()?.read_all()?;
        Ok(Container::new(chunks, options))
    }

    /// Reads the datastream and reconstructs its pixels.
    pub fn decode(self) -> Result<DecodedImage> {
        self.read_container()?.decode()
    }
}

/// All chunks of a datastream, indexed once.
#[derive(Clone, Debug)]
pub struct Container {
    chunks: Vec<Chunk>,
    index: ChunkIndex,
    options: DecodeOptions,
}

impl Container {
    pub fn new(chunks: Vec<Chunk>, options: DecodeOptions) -> Self {
        let index = ChunkIndex::build(&chunks);
        Container {
            chunks,
            index,
            options,
        }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn index(&self) -> &ChunkIndex {
        &self.index
    }

    /// Type codes of all chunks, in file order.
    pub fn chunk_types(&self) -> Vec<ChunkType> {
        self.chunks.iter().map(Chunk::chunk_type).collect()
    }

    pub fn header(&self) -> Result<ImageHeader> {
        parse_ihdr(&self.chunks)
    }

    pub fn palette(&self) -> Result<Option<Palette>> {
        resolve_palette(&self.chunks, &self.index, &self.header()?)
    }

    /// Concatenates and inflates the payloads of all `IDAT` chunks.
    pub fn image_data(&self) -> Result<Vec<u8>> {
        self.image_data_for(&self.header()?)
    }

    fn image_data_for(&self, header: &ImageHeader) -> Result<Vec<u8>> {
        unfiltering_buffer::check_supported(header)?;
        let expected = header
            .checked_raw_bytes()
            .ok_or(DecodingError::LimitsExceeded)?;
        self.options.limits.check(expected)?;

        let mut stream = ZlibStream::with_expected_size(self.options.limits, expected);
        stream.set_ignore_adler32(self.options.ignore_adler32);
        for &position in self.index.data() {
            stream.decompress(self.chunks[position].data())?;
        }
        stream.finish()
    }

    /// Inflates and unfilters the image data.
    pub fn raster(&self) -> Result<RasterBuffer> {
        let header = self.header()?;
        let data = self.image_data_for(&header)?;
        unfilter_scanlines(&data, &header, self.options.limits)
    }

    /// Runs the full reconstruction.
    pub fn decode(&self) -> Result<DecodedImage> {
        let header = self.header()?;
        let palette = resolve_palette(&self.chunks, &self.index, &header)?;
        let data = self.image_data_for(&header)?;
        let raster = unfilter_scanlines(&data, &header, self.options.limits)?;
        let grid = assemble(&raster, &header, palette.as_ref(), self.options.limits)?;
        Ok(DecodedImage {
            header,
            palette,
            raster,
            grid,
        })
    }

    /// Parses every `tEXt`, `zTXt` and `iTXt` chunk. A malformed chunk does not affect the others.
    pub fn text_chunks(&self) -> Vec<Result<TextChunk>> {
        self.index
            .text()
            .iter()
            .map(|&position| {
                TextChunk::parse(&self.chunks[position], self.options.text_decompression_limit)
            })
            .collect()
    }

    /// Writes the signature and the critical chunks only.
    pub fn anonymize<W: Write>(&self, w: &mut W) -> Result<AnonymizeReport> {
        anonymize(&self.chunks, w)
    }

    /// Describes each critical chunk, in file order.
    pub fn critical_summary(&self) -> Vec<CriticalChunk> {
        self.chunks
            .iter()
            .filter_map(|chunk| match chunk.chunk_type() {
                ChunkType::IHDR => match parse_ihdr_payload(chunk.data()) {
                    Ok(header) => Some(CriticalChunk::Header(header)),
                    Err(err) => {
                        log::warn!("skipping unreadable IHDR: {}", err);
                        None
                    }
                },
                ChunkType::PLTE => Some(CriticalChunk::Palette {
                    entries: chunk.data().len() / 3,
                }),
                ChunkType::IDAT => Some(CriticalChunk::Data {
                    compressed_bytes: chunk.len(),
                }),
                ChunkType::IEND => Some(CriticalChunk::End),
                ChunkType::Ancillary(_) => None,
            })
            .collect()
    }
}

/// Summary of one critical chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CriticalChunk {
    Header(ImageHeader),
    Palette { entries: usize },
    Data { compressed_bytes: u32 },
    End,
}

impl fmt::Display for CriticalChunk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CriticalChunk::Header(header) => write!(
                f,
                "IHDR: {} (compression {}, filter {}, interlace {})",
                header,
                header.compression_method,
                header.filter_method,
                header.interlace_method
            ),
            CriticalChunk::Palette { entries } => write!(f, "PLTE: {} entries", entries),
            CriticalChunk::Data { compressed_bytes } => {
                write!(f, "IDAT: {} bytes of compressed data", compressed_bytes)
            }
            CriticalChunk::End => write!(f, "IEND: end of image"),
        }
    }
}

/// Everything reconstruction produced.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub header: ImageHeader,
    pub palette: Option<Palette>,
    pub raster: RasterBuffer,
    pub grid: PixelGrid,
}
