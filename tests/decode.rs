mod common;

use common::{ihdr, png, simple_png, zlib};
use pngstrip::chunk::ChunkType;
use pngstrip::{
    ChannelLayout, ColorType, DataCorruptError, DecodeOptions, DecodingError, Decoder,
    FormatError, Limits, UnsupportedFeatureError,
};

fn decode(bytes: &[u8]) -> Result<pngstrip::DecodedImage, DecodingError> {
    Decoder::new(bytes).decode()
}

#[test]
fn one_pixel_rgb() {
    let bytes = simple_png(&ihdr(1, 1, 8, 2, 0), &[0, 10, 20, 30], 1);
    let image = decode(&bytes).unwrap();
    assert_eq!(image.header.color_type, ColorType::Rgb);
    assert_eq!(image.raster.data(), &[10, 20, 30]);
    assert_eq!(image.grid.layout(), ChannelLayout::Rgb);
    assert_eq!(image.grid.pixel(0, 0), Some(&[10, 20, 30][..]));
    assert!(image.palette.is_none());
}

#[test]
fn two_pixel_gray_sub() {
    let bytes = simple_png(&ihdr(2, 1, 8, 0, 0), &[1, 5, 3], 1);
    let image = decode(&bytes).unwrap();
    assert_eq!(image.grid.samples(), &[5, 8]);
}

#[test]
fn image_data_split_over_many_chunks() {
    let width = 17u32;
    let height = 9u32;
    let stride = width as usize * 3;
    let mut raw = Vec::new();
    let mut expected = Vec::new();
    for y in 0..height {
        // Up on every row after the first: a constant delta of one per row.
        raw.push(if y == 0 { 0 } else { 2 });
        for x in 0..stride {
            let value = if y == 0 { (x * 7) as u8 } else { 1 };
            raw.push(value);
        }
        expected.extend((0..stride).map(|x| ((x * 7) as u8).wrapping_add(y as u8)));
    }

    let bytes = simple_png(&ihdr(width, height, 8, 2, 0), &raw, 5);
    let container = Decoder::new(&bytes[..]).read_container().unwrap();
    assert!(container.index().data().len() > 1);
    assert_eq!(container.raster().unwrap().into_vec(), expected);
}

#[test]
fn indexed_image_through_palette() {
    let palette: &[u8] = &[255, 0, 0, 0, 255, 0, 0, 0, 255];
    let idat = zlib(&[0, 0b0001_1000]);
    let bytes = png(&[
        (ChunkType::IHDR, &ihdr(3, 1, 2, 3, 0)),
        (ChunkType::PLTE, palette),
        (ChunkType::IDAT, &idat),
        (ChunkType::IEND, &[]),
    ]);
    let image = decode(&bytes).unwrap();
    assert_eq!(image.grid.samples(), &[255, 0, 0, 0, 255, 0, 0, 0, 255]);
    assert_eq!(image.palette.map(|p| p.len()), Some(3));
}

#[test]
fn indexed_image_without_palette() {
    let bytes = simple_png(&ihdr(1, 1, 8, 3, 0), &[0, 0], 1);
    assert!(matches!(
        decode(&bytes),
        Err(DecodingError::Format(FormatError::MissingPalette))
    ));
}

#[test]
fn palette_index_out_of_range() {
    let idat = zlib(&[0, 0, 1]);
    let bytes = png(&[
        (ChunkType::IHDR, &ihdr(2, 1, 8, 3, 0)),
        (ChunkType::PLTE, &[1, 2, 3]),
        (ChunkType::IDAT, &idat),
        (ChunkType::IEND, &[]),
    ]);
    assert!(matches!(
        decode(&bytes),
        Err(DecodingError::Format(FormatError::PaletteIndexOutOfRange {
            index: 1,
            palette_len: 1
        }))
    ));
}

#[test]
fn size_mismatch() {
    let header = ihdr(2, 2, 8, 0, 0);
    for raw in [&[0, 1, 2][..], &[0, 1, 2, 0, 3, 4, 5][..]] {
        let result = decode(&simple_png(&header, raw, 1));
        assert!(matches!(
            result,
            Err(DecodingError::Corrupt(DataCorruptError::SizeMismatch { expected: 6, .. }))
        ));
    }
}

#[test]
fn oversized_image_data_stops_at_the_expected_size() {
    // A 1x1 gray image needs 2 bytes, this stream inflates to 100 000.
    let bytes = simple_png(&ihdr(1, 1, 8, 0, 0), &[0; 100_000], 1);
    let mut decoder = Decoder::new(&bytes[..]);
    decoder.set_limits(Limits { bytes: 50_000 });
    assert!(matches!(
        decoder.decode(),
        Err(DecodingError::Corrupt(DataCorruptError::SizeMismatch { expected: 2, actual }))
            if actual > 2
    ));
}

#[test]
fn interlaced_is_unsupported() {
    let bytes = simple_png(&ihdr(1, 1, 8, 0, 1), &[0, 0], 1);
    let container = Decoder::new(&bytes[..]).read_container().unwrap();
    assert!(container.header().unwrap().is_interlaced());
    assert!(matches!(
        container.decode(),
        Err(DecodingError::Unsupported(UnsupportedFeatureError::Interlaced(1)))
    ));
}

#[test]
fn bad_signature_reads_nothing() {
    let mut bytes = simple_png(&ihdr(1, 1, 8, 0, 0), &[0, 0], 1);
    bytes[0] = 0x88;
    assert!(matches!(
        Decoder::new(&bytes[..]).chunks(),
        Err(DecodingError::Format(FormatError::BadSignature))
    ));
}

#[test]
fn truncated_file() {
    let bytes = simple_png(&ihdr(1, 1, 8, 0, 0), &[0, 0], 1);
    let cut = &bytes[..bytes.len() - 6];
    assert!(matches!(
        Decoder::new(cut).read_container(),
        Err(DecodingError::Format(FormatError::Truncated))
    ));
}

#[test]
fn crc_verification_is_opt_in() {
    let mut bytes = simple_png(&ihdr(1, 1, 8, 0, 0), &[0, 0], 1);
    // Last byte of the IHDR checksum.
    bytes[8 + 25 - 1] ^= 1;
    assert!(decode(&bytes).is_ok());

    let mut options = DecodeOptions::default();
    options.set_verify_crc(true);
    assert!(matches!(
        Decoder::new_with_options(&bytes[..], options).decode(),
        Err(DecodingError::Format(FormatError::CrcMismatch {
            chunk_type: ChunkType::IHDR,
            ..
        }))
    ));
}

#[test]
fn huge_dimensions_hit_the_limits() {
    let bytes = simple_png(&ihdr(100_000, 100_000, 8, 6, 0), &[0; 16], 1);
    let mut decoder = Decoder::new(&bytes[..]);
    decoder.set_limits(Limits { bytes: 1 << 20 });
    assert!(matches!(decoder.decode(), Err(DecodingError::LimitsExceeded)));
}

#[test]
fn missing_header() {
    let idat = zlib(&[0, 0]);
    let bytes = png(&[(ChunkType::IDAT, &idat), (ChunkType::IEND, &[])]);
    assert!(matches!(
        decode(&bytes),
        Err(DecodingError::Format(FormatError::MissingHeader))
    ));
}

#[test]
fn sixteen_bit_rgba() {
    let raw = [0, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0xFF, 0xFF];
    let image = decode(&simple_png(&ihdr(1, 1, 16, 6, 0), &raw, 1)).unwrap();
    assert_eq!(image.grid.sample_depth(), 16);
    assert_eq!(image.grid.pixel(0, 0), Some(&[0x0102, 0x0304, 0x0506, 0xFFFF][..]));
}

#[test]
fn critical_summary_lists_chunks_in_order() {
    let bytes = simple_png(&ihdr(4, 2, 8, 0, 0), &[0; 10], 2);
    let container = Decoder::new(&bytes[..]).read_container().unwrap();
    let summary: Vec<String> = container
        .critical_summary()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        summary[0],
        "IHDR: 4 x 2 image, 8-bit grayscale, non-interlaced (compression 0, filter 0, interlace 0)"
    );
    assert!(summary[1].starts_with("IDAT: "));
    assert_eq!(summary.last().map(String::as_str), Some("IEND: end of image"));
}

#[test]
fn pixel_grid_takes_two_bytes_per_sample() {
    let raw = vec![0; 200 * 201];
    let bytes = simple_png(&ihdr(200, 200, 8, 0, 0), &raw, 1);

    let mut options = DecodeOptions::default();
    options.set_limits(Limits { bytes: raw.len() });
    let container = Decoder::new_with_options(&bytes[..], options)
        .read_container()
        .unwrap();
    assert!(container.raster().is_ok());
    assert!(matches!(container.decode(), Err(DecodingError::LimitsExceeded)));

    options.set_limits(Limits { bytes: 200 * 200 * 2 });
    let container = Decoder::new_with_options(&bytes[..], options)
        .read_container()
        .unwrap();
    assert!(container.decode().is_ok());
}
