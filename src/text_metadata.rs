//! # Text chunks (tEXt/zTXt/iTXt) structs and functions
//!
//! The [PNG spec](https://www.w3.org/TR/2003/REC-PNG-20031110/#11textinfo) optionally allows for
//! embedded text chunks in the file. They may appear either before or after the image data
//! chunks. There are three kinds of text chunks.
//!  -   `tEXt`: This has a `keyword` and `text` field, and is ISO-8859-1 encoded.
//!  -   `zTXt`: This is semantically the same as `tEXt`, i.e. it has the same fields and
//!       encoding, but the `text` field is compressed before being written into the PNG file.
//!  -   `iTXt`: This chunk allows for its `text` field to be any valid UTF-8, and supports
//!        compression of the text field as well.
//!
//! ## Best-effort parsing
//!
//! Metadata is shown to people, so a single bad field should not hide the rest of the chunk. Only
//! a missing field terminator (or a missing flag or method byte) fails the parse. A field that
//! does not decode or inflate is replaced by a bracketed diagnostic such as
//! `[invalid UTF-8 language tag]` and a warning is logged.
//!
//! ```
//! use pngstrip::text_metadata::ITXtChunk;
//!
//! let chunk = ITXtChunk::parse(b"Title\0\0\0en\0Titel\0Hello", 1024).unwrap();
//! assert_eq!(chunk.keyword, "Title");
//! assert_eq!(chunk.language_tag, "en");
//! assert_eq!(chunk.text, "Hello");
//! ```

#![warn(missing_docs)]

use std::fmt;

use miniz_oxide::inflate::{decompress_to_vec_zlib_with_limit, TINFLStatus};

use crate::chunk::{self, Chunk, ChunkType};
use crate::error::{FormatError, Result};

/// Default decompression limit for compressed text chunks.
pub const DECOMPRESSION_LIMIT: usize = 2097152; // 2 MiB

/// Struct representing a tEXt chunk
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TEXtChunk {
    /// Keyword field of the tEXt chunk.
    pub keyword: String,
    /// Text field of tEXt chunk.
    pub text: String,
}

impl TEXtChunk {
    /// Parses a tEXt payload: a NUL-terminated Latin-1 keyword followed by Latin-1 text.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let (keyword, text) = split_at_nul(data, "tEXt keyword is not null-terminated")?;
        Ok(Self {
            keyword: iso_8859_1::decode(keyword),
            text: iso_8859_1::decode(text),
        })
    }
}

/// Struct representing a zTXt chunk
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZTXtChunk {
    /// Keyword field of the zTXt chunk.
    pub keyword: String,
    /// Compression method byte. Only 0 (zlib) is defined.
    pub compression_method: u8,
    /// Inflated text, or a bracketed diagnostic if it could not be inflated.
    pub text: String,
}

impl ZTXtChunk {
    /// Parses a zTXt payload and inflates its text, up to `limit` bytes.
    pub fn parse(data: &[u8], limit: usize) -> Result<Self> {
        let (keyword, rest) = split_at_nul(data, "zTXt keyword is not null-terminated")?;
        let (&compression_method, compressed) = rest
            .split_first()
            .ok_or(FormatError::MalformedTextChunk("zTXt compression method is missing"))?;

        let text = match inflate_text(compression_method, compressed, limit) {
            Ok(raw) => iso_8859_1::decode(&raw),
            Err(sentinel) => sentinel,
        };

        Ok(Self {
            keyword: iso_8859_1::decode(keyword),
            compression_method,
            text,
        })
    }
}

/// Struct encoding an iTXt chunk
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ITXtChunk {
    /// The keyword field, decoded as Latin-1.
    pub keyword: String,
    /// Indicates whether the text will be (or was) compressed in the PNG.
    pub compressed: bool,
    /// Compression method byte. Only meaningful when `compressed` is set.
    pub compression_method: u8,
    /// A hyphen separated list of languages that the keyword is translated to. This is ASCII-7 encoded.
    pub language_tag: String,
    /// Translated keyword. This is UTF-8 encoded.
    pub translated_keyword: String,
    /// Text field of iTXt chunk. It is UTF-8 encoded.
    pub text: String,
}

impl ITXtChunk {
    /// Parses an iTXt payload.
    ///
    /// Field order: keyword, NUL, compression flag, compression method, language tag, NUL,
    /// translated keyword, NUL, text. A flag of 1 means the text is zlib compressed (method 0);
    /// it is inflated up to `limit` bytes.
    pub fn parse(data: &[u8], limit: usize) -> Result<Self> {
        let (keyword, rest) = split_at_nul(data, "iTXt keyword is not null-terminated")?;
        let keyword = iso_8859_1::decode(keyword);

        let (&compression_flag, rest) = rest
            .split_first()
            .ok_or(FormatError::MalformedTextChunk("iTXt compression flag is missing"))?;
        let (&compression_method, rest) = rest
            .split_first()
            .ok_or(FormatError::MalformedTextChunk("iTXt compression method is missing"))?;

        let (language_tag, rest) =
            split_at_nul(rest, "iTXt language tag is not null-terminated")?;
        let (translated_keyword, text) =
            split_at_nul(rest, "iTXt translated keyword is not null-terminated")?;

        let language_tag = utf8_or_sentinel(language_tag, "language tag");
        let translated_keyword = utf8_or_sentinel(translated_keyword, "translated keyword");

        let compressed = match compression_flag {
            0 => false,
            1 => true,
            flag => {
                log::warn!(
                    "iTXt chunk {:?} has compression flag {}, reading its text as uncompressed",
                    keyword,
                    flag
                );
                false
            }
        };

        let text = if compressed {
            match inflate_text(compression_method, text, limit) {
                Ok(raw) => utf8_or_sentinel(&raw, "text"),
                Err(sentinel) => sentinel,
            }
        } else {
            utf8_or_sentinel(text, "text")
        };

        Ok(Self {
            keyword,
            compressed,
            compression_method,
            language_tag,
            translated_keyword,
            text,
        })
    }
}

/// Any of the three text chunk kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextChunk {
    /// An uncompressed Latin-1 `tEXt` chunk.
    Latin1(TEXtChunk),
    /// A compressed Latin-1 `zTXt` chunk.
    Compressed(ZTXtChunk),
    /// An international `iTXt` chunk.
    International(ITXtChunk),
}

impl TextChunk {
    /// Parses `chunk` according to its type code.
    pub fn parse(chunk: &Chunk, limit: usize) -> Result<Self> {
        match chunk.chunk_type() {
            ChunkType::Ancillary(chunk::tEXt) => TEXtChunk::parse(chunk.data()).map(Self::Latin1),
            ChunkType::Ancillary(chunk::zTXt) => {
                ZTXtChunk::parse(chunk.data(), limit).map(Self::Compressed)
            }
            ChunkType::Ancillary(chunk::iTXt) => {
                ITXtChunk::parse(chunk.data(), limit).map(Self::International)
            }
            _ => Err(FormatError::MalformedTextChunk("not a text chunk").into()),
        }
    }

    /// The keyword of the chunk.
    pub fn keyword(&self) -> &str {
        match self {
            TextChunk::Latin1(chunk) => &chunk.keyword,
            TextChunk::Compressed(chunk) => &chunk.keyword,
            TextChunk::International(chunk) => &chunk.keyword,
        }
    }

    /// The decoded text of the chunk.
    pub fn text(&self) -> &str {
        match self {
            TextChunk::Latin1(chunk) => &chunk.text,
            TextChunk::Compressed(chunk) => &chunk.text,
            TextChunk::International(chunk) => &chunk.text,
        }
    }
}

impl fmt::Display for TextChunk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TextChunk::International(chunk) if !chunk.language_tag.is_empty() => write!(
                f,
                "{} [{}] ({}): {}",
                chunk.keyword, chunk.language_tag, chunk.translated_keyword, chunk.text
            ),
            _ => write!(f, "{}: {}", self.keyword(), self.text()),
        }
    }
}

fn split_at_nul<'a>(data: &'a [u8], missing: &'static str) -> Result<(&'a [u8], &'a [u8])> {
    let nul = data
        .iter()
        .position(|&b| b == 0)
        .ok_or(FormatError::MalformedTextChunk(missing))?;
    Ok((&data[..nul], &data[nul + 1..]))
}

fn utf8_or_sentinel(data: &[u8], field: &str) -> String {
    match std::str::from_utf8(data) {
        Ok(text) => text.to_owned(),
        Err(err) => {
            log::warn!("text chunk {} is not valid UTF-8: {}", field, err);
            format!("[invalid UTF-8 {}]", field)
        }
    }
}

/// Inflates compressed text. On failure returns the diagnostic that replaces the text.
fn inflate_text(method: u8, data: &[u8], limit: usize) -> std::result::Result<Vec<u8>, String> {
    if method != 0 {
        log::warn!("text chunk uses unknown compression method {}", method);
        return Err(format!("[unsupported compression method {}]", method));
    }

    decompress_to_vec_zlib_with_limit(data, limit).map_err(|err| {
        let sentinel = match err.status {
            TINFLStatus::HasMoreOutput => {
                format!("[decompression failed: text exceeds {} bytes]", limit)
            }
            _ => "[decompression failed: corrupt zlib stream]".to_owned(),
        };
        log::warn!("could not inflate text chunk: {:?}", err.status);
        sentinel
    })
}

mod iso_8859_1 {
    /// Every byte is the code point of the same value.
    pub(super) fn decode(data: &[u8]) -> String {
        data.iter().map(|&b| char::from(b)).collect()
    }
}
