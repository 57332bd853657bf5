//! Turning reconstructed scanlines into resolved pixel samples.

use super::unfiltering_buffer::RasterBuffer;
use super::Limits;
use crate::common::{BitDepth, ChannelLayout, ColorType, ImageHeader, Palette, PixelGrid};
use crate::error::{DecodingError, FormatError, Result};

/// Maps every pixel of `raster` to its samples.
///
/// Sub-byte samples are unpacked most significant bits first and the pad bits at the end of a row
/// are skipped. 16-bit samples are big-endian. Indexed pixels are looked up in `palette` and come
/// out as 8-bit RGB. Values are never rescaled.
pub fn assemble(
    raster: &RasterBuffer,
    header: &ImageHeader,
    palette: Option<&Palette>,
    limits: Limits,
) -> Result<PixelGrid> {
    let (layout, sample_depth) = match header.color_type {
        ColorType::Grayscale => (ChannelLayout::Gray, header.bit_depth as u8),
        ColorType::GrayscaleAlpha => (ChannelLayout::GrayAlpha, header.bit_depth as u8),
        ColorType::Rgb => (ChannelLayout::Rgb, header.bit_depth as u8),
        ColorType::Rgba => (ChannelLayout::Rgba, header.bit_depth as u8),
        ColorType::Indexed => (ChannelLayout::Rgb, 8),
    };

    let total = (header.width as usize)
        .checked_mul(header.height as usize)
        .and_then(|px| px.checked_mul(layout.channels()))
        .ok_or(DecodingError::LimitsExceeded)?;
    limits.check(total.saturating_mul(std::mem::size_of::<u16>()))?;

    let per_row = header.width as usize * header.color_type.samples();
    let mut samples = Vec::with_capacity(total);

    match header.color_type {
        ColorType::Indexed => {
            let palette = palette.ok_or(FormatError::MissingPalette)?;
            for row in raster.rows() {
                for index in RowSamples::new(row, header.bit_depth).take(per_row) {
                    let index = index as u8;
                    let rgb = palette
                        .get(index.into())
                        .ok_or(FormatError::PaletteIndexOutOfRange {
                            index,
                            palette_len: palette.len(),
                        })?;
                    samples.extend(rgb.iter().map(|&c| u16::from(c)));
                }
            }
        }
        _ => {
            for row in raster.rows() {
                samples.extend(RowSamples::new(row, header.bit_depth).take(per_row));
            }
        }
    }

    log::debug!(
        "assembled {}x{} {:?} pixels",
        header.width,
        header.height,
        layout
    );
    Ok(PixelGrid::new(
        header.width,
        header.height,
        layout,
        sample_depth,
        samples,
    ))
}

/// Iterates the samples packed into one row, left to right.
struct RowSamples<'a> {
    row: &'a [u8],
    depth: BitDepth,
    pos: usize,
}

impl<'a> RowSamples<'a> {
    fn new(row: &'a [u8], depth: BitDepth) -> Self {
        RowSamples { row, depth, pos: 0 }
    }
}

impl Iterator for RowSamples<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        let sample = match self.depth {
            BitDepth::Sixteen => {
                let bytes = self.row.get(self.pos * 2..self.pos * 2 + 2)?;
                u16::from_be_bytes([bytes[0], bytes[1]])
            }
            BitDepth::Eight => u16::from(*self.row.get(self.pos)?),
            depth => {
                let bits = depth as usize;
                let bit = self.pos * bits;
                let byte = *self.row.get(bit / 8)?;
                let shift = 8 - bits - bit % 8;
                let mask = (1u8 << bits) - 1;
                u16::from((byte >> shift) & mask)
            }
        };
        self.pos += 1;
        Some(sample)
    }
}
