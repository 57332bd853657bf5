//! Parsing of the `IHDR` and `PLTE` chunks.

use crate::chunk::{Chunk, ChunkIndex, ChunkType};
use crate::common::{BitDepth, ColorType, ImageHeader, Palette};
use crate::error::{FormatError, Result};

const IHDR_LENGTH: usize = 13;

/// Parses the header from the first chunk of a datastream.
///
/// Fails with [`FormatError::MissingHeader`] unless the first chunk is `IHDR`.
pub fn parse_ihdr(chunks: &[Chunk]) -> Result<ImageHeader> {
    match chunks.first() {
        Some(chunk) if chunk.chunk_type() == ChunkType::IHDR => parse_ihdr_payload(chunk.data()),
        _ => Err(FormatError::MissingHeader.into()),
    }
}

/// Parses a 13 byte `IHDR` payload.
///
/// Interlaced images parse fine; reconstruction rejects them later.
pub fn parse_ihdr_payload(data: &[u8]) -> Result<ImageHeader> {
    let fields: &[u8; IHDR_LENGTH] = data
        .try_into()
        .map_err(|_| FormatError::BadHeaderLength(data.len() as u32))?;

    let width = u32::from_be_bytes([fields[0], fields[1], fields[2], fields[3]]);
    let height = u32::from_be_bytes([fields[4], fields[5], fields[6], fields[7]]);
    if width == 0 || height == 0 {
        return Err(FormatError::InvalidDimensions { width, height }.into());
    }

    let (raw_depth, raw_color) = (fields[8], fields[9]);
    let invalid_config = FormatError::InvalidColorConfig {
        bit_depth: raw_depth,
        color_type: raw_color,
    };
    let (bit_depth, color_type) = match (BitDepth::from_u8(raw_depth), ColorType::from_u8(raw_color))
    {
        (Some(depth), Some(color)) if color.is_combination_valid(depth) => (depth, color),
        _ => return Err(invalid_config.into()),
    };

    Ok(ImageHeader {
        width,
        height,
        bit_depth,
        color_type,
        compression_method: fields[10],
        filter_method: fields[11],
        interlace_method: fields[12],
    })
}

/// Parses a `PLTE` payload into its RGB entries.
pub fn parse_plte(data: &[u8]) -> Result<Palette> {
    let len = data.len();
    if len % 3 != 0 || len == 0 || len / 3 > Palette::MAX_ENTRIES {
        return Err(FormatError::BadPaletteLength(len as u32).into());
    }

    let entries = data
        .chunks_exact(3)
        .map(|rgb| [rgb[0], rgb[1], rgb[2]])
        .collect();
    Ok(Palette::from_entries(entries))
}

/// Finds and parses the palette for an image.
///
/// Indexed images must carry a `PLTE` chunk ahead of their first `IDAT`. Other color types may
/// carry a suggested palette, which is parsed when present.
pub fn resolve_palette(
    chunks: &[Chunk],
    index: &ChunkIndex,
    header: &ImageHeader,
) -> Result<Option<Palette>> {
    let position = index.palette();

    if header.color_type == ColorType::Indexed {
        let before_data = match (position, index.first_data()) {
            (Some(plte), Some(idat)) => plte < idat,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if !before_data {
            return Err(FormatError::MissingPalette.into());
        }
    }

    position
        .map(|plte| parse_plte(chunks[plte].data()))
        .transpose()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::DecodingError;

    fn ihdr(width: u32, height: u32, depth: u8, color: u8) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[depth, color, 0, 0, 0]);
        data
    }

    fn chunk(chunk_type: ChunkType, data: Vec<u8>) -> Chunk {
        Chunk::new(chunk_type, data, 0)
    }

    #[test]
    fn parses_all_header_fields() {
        let mut data = ihdr(640, 480, 16, 6);
        data[12] = 1;
        let header = parse_ihdr_payload(&data).unwrap();
        assert_eq!(header.size(), (640, 480));
        assert_eq!(header.bit_depth, BitDepth::Sixteen);
        assert_eq!(header.color_type, ColorType::Rgba);
        assert!(header.is_interlaced());
    }

    #[test]
    fn header_must_come_first() {
        let chunks = [
            chunk(ChunkType::Ancillary(*b"tEXt"), Vec::new()),
            chunk(ChunkType::IHDR, ihdr(1, 1, 8, 0)),
        ];
        assert!(matches!(
            parse_ihdr(&chunks),
            Err(DecodingError::Format(FormatError::MissingHeader))
        ));
        assert!(matches!(
            parse_ihdr(&[]),
            Err(DecodingError::Format(FormatError::MissingHeader))
        ));
    }

    #[test]
    fn rejects_malformed_headers() {
        assert!(matches!(
            parse_ihdr_payload(&[0; 12]),
            Err(DecodingError::Format(FormatError::BadHeaderLength(12)))
        ));
        assert!(matches!(
            parse_ihdr_payload(&ihdr(0, 5, 8, 0)),
            Err(DecodingError::Format(FormatError::InvalidDimensions {
                width: 0,
                height: 5
            }))
        ));
        for (depth, color) in [(16, 3), (4, 2), (3, 0), (8, 1), (2, 6)] {
            assert!(matches!(
                parse_ihdr_payload(&ihdr(1, 1, depth, color)),
                Err(DecodingError::Format(FormatError::InvalidColorConfig { bit_depth, color_type }))
                    if bit_depth == depth && color_type == color
            ));
        }
    }

    #[test]
    fn palette_length_checks() {
        let palette = parse_plte(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(palette.entries(), &[[1, 2, 3], [4, 5, 6]]);

        for len in [0, 4, 257 * 3] {
            assert!(matches!(
                parse_plte(&vec![0; len]),
                Err(DecodingError::Format(FormatError::BadPaletteLength(l))) if l as usize == len
            ));
        }
        assert_eq!(parse_plte(&[7; 256 * 3]).unwrap().len(), 256);
    }

    #[test]
    fn indexed_images_need_palette_before_data() {
        let header = parse_ihdr_payload(&ihdr(1, 1, 8, 3)).unwrap();
        let late = [
            chunk(ChunkType::IHDR, ihdr(1, 1, 8, 3)),
            chunk(ChunkType::IDAT, Vec::new()),
            chunk(ChunkType::PLTE, vec![0, 0, 0]),
            chunk(ChunkType::IEND, Vec::new()),
        ];
        let index = ChunkIndex::build(&late);
        assert!(matches!(
            resolve_palette(&late, &index, &header),
            Err(DecodingError::Format(FormatError::MissingPalette))
        ));

        let early = [
            chunk(ChunkType::IHDR, ihdr(1, 1, 8, 3)),
            chunk(ChunkType::PLTE, vec![9, 8, 7]),
            chunk(ChunkType::IDAT, Vec::new()),
            chunk(ChunkType::IEND, Vec::new()),
        ];
        let index = ChunkIndex::build(&early);
        let palette = resolve_palette(&early, &index, &header).unwrap().unwrap();
        assert_eq!(palette.get(0), Some([9, 8, 7]));
    }

    #[test]
    fn truecolor_images_do_not_need_palette() {
        let header = parse_ihdr_payload(&ihdr(1, 1, 8, 2)).unwrap();
        let chunks = [
            chunk(ChunkType::IHDR, ihdr(1, 1, 8, 2)),
            chunk(ChunkType::IDAT, Vec::new()),
        ];
        let index = ChunkIndex::build(&chunks);
        assert_eq!(resolve_palette(&chunks, &index, &header).unwrap(), None);
    }
}
