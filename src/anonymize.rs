//! Rewriting a datastream with only the chunks needed to show the image.

use std::io::Write;

use crate::chunk::{Chunk, ChunkIndex, ChunkType, PNG_SIGNATURE};
use crate::error::{FormatError, Result};

/// What an anonymization pass kept and removed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnonymizeReport {
    /// Type codes of the chunks that were written, in order.
    pub kept: Vec<ChunkType>,
    /// Type codes of the chunks that were left out, in order.
    pub dropped: Vec<ChunkType>,
}

impl AnonymizeReport {
    /// Returns true if the input had nothing to remove.
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }
}

/// Writes the signature followed by every `IHDR`, `PLTE`, `IDAT` and `IEND` chunk of `chunks`.
///
/// Chunks keep their relative order and are written byte for byte, including their stored
/// checksum. All other chunks are dropped. Nothing is written when `chunks` has no `IHDR` or no
/// `IEND`.
pub fn anonymize<W: Write>(chunks: &[Chunk], w: &mut W) -> Result<AnonymizeReport> {
    let index = ChunkIndex::build(chunks);
    if index.header().is_none() {
        return Err(FormatError::MissingHeader.into());
    }
    if index.end().is_none() {
        return Err(FormatError::MissingEndMarker.into());
    }

    w.write_all(&PNG_SIGNATURE)?;

    let mut report = AnonymizeReport::default();
    for chunk in chunks {
        let chunk_type = chunk.chunk_type();
        if chunk_type.is_required() {
            chunk.write_to(w)?;
            report.kept.push(chunk_type);
        } else {
            log::debug!("dropping {} chunk, {} bytes", chunk_type, chunk.len());
            report.dropped.push(chunk_type);
        }
    }

    log::info!(
        "anonymized: kept {} chunks, dropped {}",
        report.kept.len(),
        report.dropped.len()
    );
    Ok(report)
}

/// Same as [`anonymize`], collecting the output in memory.
pub fn anonymize_to_vec(chunks: &[Chunk]) -> Result<(Vec<u8>, AnonymizeReport)> {
    let mut out = Vec::new();
    let report = anonymize(chunks, &mut out)?;
    Ok((out, report))
}
