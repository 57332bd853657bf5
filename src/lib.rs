//! # PNG inspection, reconstruction and anonymization
//!
//! This crate splits a PNG datastream into chunks, reconstructs its pixels and rewrites it without
//! the ancillary chunks that may carry metadata.
//!
//! ## The decoder
//! The most important types for decoding purposes are [`Decoder`] and [`Container`]. `Decoder`
//! wraps a `std::io::Read` and reads every chunk up to `IEND` into a `Container`, which runs the
//! individual stages on demand:
//!
//! 1. the header and palette are parsed,
//! 2. the `IDAT` payloads are inflated as one zlib stream,
//! 3. the scanline filters are reversed row by row,
//! 4. and the samples are unpacked, palette entries resolved.
//!
//! ### Using the decoder
//! ```no_run
//! use std::fs::File;
//!
//! let decoder = pngstrip::Decoder::new(File::open("image.png").unwrap());
//! let container = decoder.read_container().unwrap();
//! println!("{:?}", container.chunk_types());
//!
//! let image = container.decode().unwrap();
//! println!("{}", image.header);
//! let (width, height) = (image.grid.width(), image.grid.height());
//! # let _ = (width, height);
//! ```
//!
//! ## Anonymization
//! [`anonymize()`] keeps the signature and the `IHDR`, `PLTE`, `IDAT` and `IEND` chunks, byte for
//! byte, and drops everything else.
//! ```no_run
//! use std::fs::File;
//! use std::io::BufWriter;
//!
//! let container = pngstrip::Decoder::new(File::open("image.png").unwrap())
//!     .read_container()
//!     .unwrap();
//! let mut out = BufWriter::new(File::create("anonymized.png").unwrap());
//! let report = container.anonymize(&mut out).unwrap();
//! println!("dropped {:?}", report.dropped);
//! ```

#![forbid(unsafe_code)]

pub mod anonymize;
pub mod chunk;
mod common;
mod decoder;
mod error;
mod filter;
pub mod pipeline;
pub mod text_metadata;

#[cfg(feature = "benchmarks")]
pub mod benchable_apis;

pub use crate::anonymize::{anonymize, anonymize_to_vec, AnonymizeReport};
pub use crate::common::*;
pub use crate::decoder::{
    assemble, parse_ihdr, parse_ihdr_payload, parse_plte, resolve_palette, unfilter_scanlines,
    ChunkReader, Container, CriticalChunk, DecodeOptions, DecodedImage, Decoder, Limits,
    RasterBuffer,
};
pub use crate::error::{
    DataCorruptError, DecodingError, FormatError, UnsupportedFeatureError,
};
pub use crate::filter::FilterType;
