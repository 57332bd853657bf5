use std::io::{self, Read};

use super::{DecodeOptions, Limits};
use crate::chunk::{Chunk, ChunkType, PNG_SIGNATURE};
use crate::error::{DecodingError, FormatError, Result};

/// Chunk lengths are limited to 2^31 - 1 bytes.
const MAX_CHUNK_LENGTH: u32 = i32::MAX as u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Positioned at the length field of the next chunk.
    ChunkStart,
    /// `IEND` was read or an error was returned. Nothing more is produced.
    Done,
}

/// Lazily splits a PNG datastream into chunks.
///
/// The signature is checked when the reader is created, so a stream with a bad signature never
/// yields a chunk. Afterwards every call to [`Iterator::next`] reads exactly one chunk. Iteration
/// ends after `IEND`, and is fused after the first error.
pub struct ChunkReader<R: Read> {
    reader: R,
    verify_crc: bool,
    limits: Limits,
    state: State,
    chunks_read: usize,
}

impl<R: Read> ChunkReader<R> {
    /// Reads and checks the signature with default options.
    pub fn new(r: R) -> Result<Self> {
        Self::with_options(r, &DecodeOptions::default())
    }

    /// Reads and checks the signature.
    pub fn with_options(mut r: R, options: &DecodeOptions) -> Result<Self> {
        let mut signature = [0; 8];
        read_exact_or_truncated(&mut r, &mut signature).map_err(|err| match err {
            DecodingError::Format(FormatError::Truncated) => FormatError::BadSignature.into(),
            err => err,
        })?;
        if signature != PNG_SIGNATURE {
            return Err(FormatError::BadSignature.into());
        }

        Ok(ChunkReader {
            reader: r,
            verify_crc: options.verify_crc,
            limits: options.limits,
            state: State::ChunkStart,
            chunks_read: 0,
        })
    }

    /// Number of chunks successfully read so far.
    pub fn chunks_read(&self) -> usize {
        self.chunks_read
    }

    /// Reads the remaining chunks up to and including `IEND`.
    pub fn read_all(self) -> Result<Vec<Chunk>> {
        self.collect()
    }

    fn read_chunk(&mut self) -> Result<Chunk> {
        let mut buf = [0; 4];

        read_exact_or_truncated(&mut self.reader, &mut buf)?;
        let length = u32::from_be_bytes(buf);
        if length > MAX_CHUNK_LENGTH {
            return Err(FormatError::InvalidChunkLength(length).into());
        }

        read_exact_or_truncated(&mut self.reader, &mut buf)?;
        if !buf.iter().all(u8::is_ascii_alphabetic) {
            return Err(FormatError::InvalidChunkType(buf).into());
        }
        let chunk_type = ChunkType::from_bytes(buf);

        if length as usize > self.limits.bytes {
            return Err(DecodingError::LimitsExceeded);
        }
        // A lying length field must not make us allocate before the bytes actually arrive.
        let mut data = Vec::new();
        let got = (&mut self.reader)
            .take(u64::from(length))
            .read_to_end(&mut data)?;
        if got != length as usize {
            return Err(FormatError::Truncated.into());
        }

        read_exact_or_truncated(&mut self.reader, &mut buf)?;
        let crc = u32::from_be_bytes(buf);

        let chunk = Chunk::new(chunk_type, data, crc);
        if self.verify_crc {
            let computed = chunk.computed_crc();
            if computed != crc {
                return Err(FormatError::CrcMismatch {
                    chunk_type,
                    stored: crc,
                    computed,
                }
                .into());
            }
        }

        log::debug!("read {} chunk, {} bytes", chunk_type, length);
        Ok(chunk)
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == State::Done {
            return None;
        }

        match self.read_chunk() {
            Ok(chunk) => {
                self.chunks_read += 1;
                if chunk.chunk_type() == ChunkType::IEND {
                    self.state = State::Done;
                }
                Some(Ok(chunk))
            }
            Err(err) => {
                self.state = State::Done;
                Some(Err(err))
            }
        }
    }
}

fn read_exact_or_truncated<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    r.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => FormatError::Truncated.into(),
        _ => DecodingError::IoError(err),
    })
}
