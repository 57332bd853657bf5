//! Builds PNG datastreams in memory.

use std::io::Write;

use flate2::{write::ZlibEncoder, Compression};
use pngstrip::chunk::{encode_chunk, ChunkType, PNG_SIGNATURE};

pub fn ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8, interlace: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[bit_depth, color_type, 0, 0, interlace]);
    data
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Signature followed by `chunks`, each with a correct CRC.
pub fn png(chunks: &[(ChunkType, &[u8])]) -> Vec<u8> {
    let mut out = PNG_SIGNATURE.to_vec();
    for (chunk_type, data) in chunks {
        encode_chunk(&mut out, *chunk_type, data).unwrap();
    }
    out
}

/// A complete image with the filtered scanlines `raw` split over `idat_count` chunks.
#[allow(dead_code)]
pub fn simple_png(header: &[u8], raw: &[u8], idat_count: usize) -> Vec<u8> {
    let compressed = zlib(raw);
    let piece = compressed.len().div_ceil(idat_count.max(1)).max(1);
    let mut chunks = vec![(ChunkType::IHDR, header)];
    for part in compressed.chunks(piece) {
        chunks.push((ChunkType::IDAT, part));
    }
    chunks.push((ChunkType::IEND, &[][..]));
    png(&chunks)
}
