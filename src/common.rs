//! Common types shared between the decoding stages and their consumers

use std::fmt;

/// Describes how a pixel is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColorType {
    /// 1 grayscale sample.
    Grayscale = 0,
    /// 1 red sample, 1 green sample, 1 blue sample.
    Rgb = 2,
    /// 1 sample for the palette index.
    Indexed = 3,
    /// 1 grayscale sample, then 1 alpha sample.
    GrayscaleAlpha = 4,
    /// 1 red sample, 1 green sample, 1 blue sample, and finally, 1 alpha sample.
    Rgba = 6,
}

impl ColorType {
    /// Returns the number of samples used per pixel encoded in this way.
    pub fn samples(self) -> usize {
        self.samples_u8().into()
    }

    pub(crate) fn samples_u8(self) -> u8 {
        use self::ColorType::*;
        match self {
            Grayscale | Indexed => 1,
            Rgb => 3,
            GrayscaleAlpha => 2,
            Rgba => 4,
        }
    }

    /// u8 -> Self. Temporary solution until Rust provides a canonical one.
    pub fn from_u8(n: u8) -> Option<ColorType> {
        match n {
            0 => Some(ColorType::Grayscale),
            2 => Some(ColorType::Rgb),
            3 => Some(ColorType::Indexed),
            4 => Some(ColorType::GrayscaleAlpha),
            6 => Some(ColorType::Rgba),
            _ => None,
        }
    }

    /// Whether the PNG standard allows samples of `bit_depth` for this color type.
    pub fn is_combination_valid(self, bit_depth: BitDepth) -> bool {
        use BitDepth::*;
        match self {
            ColorType::Grayscale => true,
            ColorType::Indexed => bit_depth != Sixteen,
            ColorType::Rgb | ColorType::GrayscaleAlpha | ColorType::Rgba => {
                bit_depth == Eight || bit_depth == Sixteen
            }
        }
    }
}

/// Bit depth of the PNG file.
/// Specifies the number of bits per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum BitDepth {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
    Sixteen = 16,
}

impl BitDepth {
    /// u8 -> Self. Temporary solution until Rust provides a canonical one.
    pub fn from_u8(n: u8) -> Option<BitDepth> {
        match n {
            1 => Some(BitDepth::One),
            2 => Some(BitDepth::Two),
            4 => Some(BitDepth::Four),
            8 => Some(BitDepth::Eight),
            16 => Some(BitDepth::Sixteen),
            _ => None,
        }
    }

    pub(crate) fn into_u8(self) -> u8 {
        self as u8
    }
}

/// The number of bytes between a byte and its "left" neighbour during unfiltering.
///
/// Sub-byte pixels round up to one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum BytesPerPixel {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Six = 6,
    Eight = 8,
}

impl BytesPerPixel {
    pub(crate) fn from_usize(bpp: usize) -> Self {
        match bpp {
            1 => BytesPerPixel::One,
            2 => BytesPerPixel::Two,
            3 => BytesPerPixel::Three,
            4 => BytesPerPixel::Four,
            6 => BytesPerPixel::Six,
            8 => BytesPerPixel::Eight,
            _ => unreachable!("Not a possible byte rounded pixel width"),
        }
    }

    pub(crate) fn into_usize(self) -> usize {
        self as usize
    }
}

/// The validated contents of the `IHDR` chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: BitDepth,
    pub color_type: ColorType,
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlace_method: u8,
}

impl ImageHeader {
    /// Size of the image, width then height.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_interlaced(&self) -> bool {
        self.interlace_method != 0
    }

    /// Returns the number of bits per pixel.
    pub fn bits_per_pixel(&self) -> usize {
        self.color_type.samples() * self.bit_depth as usize
    }

    pub(crate) fn bpp_in_prediction(&self) -> BytesPerPixel {
        BytesPerPixel::from_usize(self.bits_per_pixel().div_ceil(8).max(1))
    }

    /// Bytes in one reconstructed row, excluding the filter type byte.
    pub fn checked_stride(&self) -> Option<usize> {
        let bits = u64::from(self.width)
            .checked_mul(u64::from(self.color_type.samples_u8()))?
            .checked_mul(u64::from(self.bit_depth.into_u8()))?;
        usize::try_from(bits.div_ceil(8)).ok()
    }

    /// Bytes of the inflated image data: every row plus its filter type byte.
    pub fn checked_raw_bytes(&self) -> Option<usize> {
        self.checked_stride()?
            .checked_add(1)?
            .checked_mul(self.height as usize)
    }

    /// Bytes of the reconstructed raster.
    pub fn checked_raster_bytes(&self) -> Option<usize> {
        self.checked_stride()?.checked_mul(self.height as usize)
    }
}

impl fmt::Display for ImageHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.color_type {
            ColorType::Grayscale => "grayscale",
            ColorType::Rgb => "RGB",
            ColorType::Indexed => "palette",
            ColorType::GrayscaleAlpha => "grayscale+alpha",
            ColorType::Rgba => "RGB+alpha",
        };
        write!(
            f,
            "{} x {} image, {}-bit {}, {}",
            self.width,
            self.height,
            self.bit_depth as u8,
            kind,
            if self.is_interlaced() {
                "interlaced"
            } else {
                "non-interlaced"
            }
        )
    }
}

/// The color table of an indexed image, in file order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<[u8; 3]>,
}

impl Palette {
    pub const MAX_ENTRIES: usize = 256;

    pub(crate) fn from_entries(entries: Vec<[u8; 3]>) -> Self {
        Palette { entries }
    }

    pub fn entries(&self) -> &[[u8; 3]] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<[u8; 3]> {
        self.entries.get(index).copied()
    }

    /// Lays the palette out as an RGB image, `columns` entries per row.
    ///
    /// Cells past the last entry stay black. `columns` is at most the number of entries.
    pub fn swatch(&self, columns: u32) -> PixelGrid {
        let columns = columns.min(self.entries.len() as u32).max(1);
        let rows = (self.entries.len() as u32).div_ceil(columns);
        let mut samples = vec![0u16; columns as usize * rows as usize * 3];
        for (cell, entry) in samples.chunks_exact_mut(3).zip(&self.entries) {
            for (sample, &value) in cell.iter_mut().zip(entry) {
                *sample = value.into();
            }
        }
        PixelGrid::new(columns, rows, ChannelLayout::Rgb, 8, samples)
    }
}

/// Channel layout of every pixel in a [`PixelGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl ChannelLayout {
    pub fn channels(self) -> usize {
        match self {
            ChannelLayout::Gray => 1,
            ChannelLayout::GrayAlpha => 2,
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }
}

/// Fully resolved pixels, row-major, one `u16` per sample.
///
/// Samples keep the value range of their bit depth: a 4-bit grayscale image holds values up to
/// 15, a 16-bit image values up to 65535. Palette images are resolved to 8-bit RGB.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    layout: ChannelLayout,
    sample_depth: u8,
    samples: Vec<u16>,
}

impl PixelGrid {
    pub(crate) fn new(
        width: u32,
        height: u32,
        layout: ChannelLayout,
        sample_depth: u8,
        samples: Vec<u16>,
    ) -> Self {
        debug_assert_eq!(
            samples.len(),
            width as usize * height as usize * layout.channels()
        );
        PixelGrid {
            width,
            height,
            layout,
            sample_depth,
            samples,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Bits per sample of the stored values.
    pub fn sample_depth(&self) -> u8 {
        self.sample_depth
    }

    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// The samples of the pixel at column `x`, row `y`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u16]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let channels = self.layout.channels();
        let start = (y as usize * self.width as usize + x as usize) * channels;
        self.samples.get(start..start + channels)
    }

    /// Rows of samples, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u16]> {
        let row_len = (self.width as usize * self.layout.channels()).max(1);
        self.samples.chunks_exact(row_len)
    }

    /// Single-channel luminance of every pixel; alpha is ignored.
    pub fn luminance(&self) -> SampleGrid {
        let channels = self.layout.channels();
        let values = self
            .samples
            .chunks_exact(channels)
            .map(|px| match self.layout {
                ChannelLayout::Gray | ChannelLayout::GrayAlpha => f64::from(px[0]),
                ChannelLayout::Rgb | ChannelLayout::Rgba => {
                    0.2989 * f64::from(px[0]) + 0.5870 * f64::from(px[1]) + 0.1140 * f64::from(px[2])
                }
            })
            .collect();
        SampleGrid {
            width: self.width,
            height: self.height,
            values,
        }
    }
}

/// A two dimensional grid of real-valued samples, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleGrid {
    pub width: u32,
    pub height: u32,
    pub values: Vec<f64>,
}

impl SampleGrid {
    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}
