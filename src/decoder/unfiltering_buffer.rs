use super::Limits;
use crate::common::ImageHeader;
use crate::error::{
    DataCorruptError, DecodingError, FormatError, Result, UnsupportedFeatureError,
};
use crate::filter::{unfilter, FilterType};

/// Reconstructed scanlines: `height` rows of exactly `stride` bytes, filter bytes stripped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterBuffer {
    stride: usize,
    height: u32,
    data: Vec<u8>,
}

impl RasterBuffer {
    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// All rows, back to back.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        self.data.get(start..start + self.stride)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(self.stride.max(1))
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

/// Rejects header fields that describe valid PNG features reconstruction does not handle.
pub(crate) fn check_supported(header: &ImageHeader) -> Result<()> {
    if header.compression_method != 0 {
        return Err(UnsupportedFeatureError::CompressionMethod(header.compression_method).into());
    }
    if header.filter_method != 0 {
        return Err(UnsupportedFeatureError::FilterMethod(header.filter_method).into());
    }
    if header.is_interlaced() {
        return Err(UnsupportedFeatureError::Interlaced(header.interlace_method).into());
    }
    Ok(())
}

/// Reverses the per-row filters of a fully inflated image.
///
/// `data` must hold exactly `height` rows of a filter type byte followed by `stride` filtered
/// bytes. The raster is allocated once and every row is reconstructed in place from the row above
/// it.
pub fn unfilter_scanlines(data: &[u8], header: &ImageHeader, limits: Limits) -> Result<RasterBuffer> {
    check_supported(header)?;

    let stride = header.checked_stride().ok_or(DecodingError::LimitsExceeded)?;
    let expected = header
        .checked_raw_bytes()
        .ok_or(DecodingError::LimitsExceeded)?;
    if data.len() != expected {
        return Err(DataCorruptError::SizeMismatch {
            expected,
            actual: data.len(),
        }
        .into());
    }
    let raster_len = header
        .checked_raster_bytes()
        .ok_or(DecodingError::LimitsExceeded)?;
    limits.check(raster_len)?;

    let bpp = header.bpp_in_prediction();
    let mut raster = vec![0u8; raster_len];

    for (row, line) in data.chunks_exact(stride + 1).enumerate() {
        let filter = FilterType::from_u8(line[0]).ok_or(FormatError::InvalidFilterType {
            row: row as u32,
            filter: line[0],
        })?;

        let (done, rest) = raster.split_at_mut(row * stride);
        let previous = match row {
            0 => &[][..],
            _ => &done[(row - 1) * stride..],
        };
        let current = &mut rest[..stride];
        current.copy_from_slice(&line[1..]);
        unfilter(filter, bpp, previous, current);

        log::trace!("row {}: {:?}", row, filter);
    }

    log::debug!("unfiltered {} rows of {} bytes", header.height, stride);
    Ok(RasterBuffer {
        stride,
        height: header.height,
        data: raster,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::{BitDepth, ColorType};

    fn header(width: u32, height: u32, color_type: ColorType, bit_depth: BitDepth) -> ImageHeader {
        ImageHeader {
            width,
            height,
            bit_depth,
            color_type,
            compression_method: 0,
            filter_method: 0,
            interlace_method: 0,
        }
    }

    #[test]
    fn gray_sub_scenario() {
        let header = header(2, 1, ColorType::Grayscale, BitDepth::Eight);
        let raster = unfilter_scanlines(&[1, 5, 3], &header, Limits::default()).unwrap();
        assert_eq!(raster.data(), &[5, 8]);
        assert_eq!(raster.stride(), 2);
    }

    #[test]
    fn rows_build_on_the_reconstructed_row_above() {
        let header = header(2, 3, ColorType::Grayscale, BitDepth::Eight);
        let data = [
            0, 10, 20, // None
            2, 1, 1, // Up
            3, 4, 4, // Avg: [4 + 11/2, 4 + (9 + 21)/2]
        ];
        let raster = unfilter_scanlines(&data, &header, Limits::default()).unwrap();
        assert_eq!(raster.row(0), Some(&[10, 20][..]));
        assert_eq!(raster.row(1), Some(&[11, 21][..]));
        assert_eq!(raster.row(2), Some(&[9, 19][..]));
        assert_eq!(raster.row(3), None);
    }

    #[test]
    fn filter_zero_is_identity() {
        let header = header(3, 2, ColorType::Rgb, BitDepth::Eight);
        let rows: Vec<u8> = (0..18).map(|i| i * 13).collect();
        let mut data = Vec::new();
        for row in rows.chunks(9) {
            data.push(0);
            data.extend_from_slice(row);
        }
        let raster = unfilter_scanlines(&data, &header, Limits::default()).unwrap();
        assert_eq!(raster.into_vec(), rows);
    }

    #[test]
    fn size_mismatch_in_both_directions() {
        let header = header(2, 2, ColorType::Grayscale, BitDepth::Eight);
        for len in [0, 5, 7] {
            let result = unfilter_scanlines(&vec![0; len], &header, Limits::default());
            assert!(matches!(
                result,
                Err(DecodingError::Corrupt(DataCorruptError::SizeMismatch { expected: 6, actual }))
                    if actual == len
            ));
        }
    }

    #[test]
    fn bad_filter_byte_reports_its_row() {
        let header = header(1, 2, ColorType::Grayscale, BitDepth::Eight);
        let result = unfilter_scanlines(&[0, 1, 7, 1], &header, Limits::default());
        assert!(matches!(
            result,
            Err(DecodingError::Format(FormatError::InvalidFilterType { row: 1, filter: 7 }))
        ));
    }

    #[test]
    fn interlaced_images_are_unsupported() {
        let mut header = header(1, 1, ColorType::Grayscale, BitDepth::Eight);
        header.interlace_method = 1;
        assert!(matches!(
            unfilter_scanlines(&[0, 0], &header, Limits::default()),
            Err(DecodingError::Unsupported(UnsupportedFeatureError::Interlaced(1)))
        ));
    }
}
