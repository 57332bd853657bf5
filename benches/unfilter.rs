//! Usage example:
//!
//! ```
//! $ cargo bench --bench=unfilter --features=benchmarks -- --save-baseline my_baseline
//! ... tweak something, say the Paeth filter ...
//! $ cargo bench --bench=unfilter --features=benchmarks -- filter=Paeth --baseline my_baseline
//! ```

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use pngstrip::benchable_apis;
use pngstrip::{BitDepth, ColorType, FilterType, ImageHeader, Limits};
use rand::Rng;

fn get_random_bytes<R: Rng>(rng: &mut R, n: usize) -> Vec<u8> {
    use rand::Fill;
    let mut result = vec![0u8; n];
    result.as_mut_slice().try_fill(rng).unwrap();
    result
}

fn unfilter_all(c: &mut Criterion) {
    let bpps = [1, 2, 3, 4, 6, 8];
    let filters = [
        FilterType::Sub,
        FilterType::Up,
        FilterType::Avg,
        FilterType::Paeth,
    ];
    for &filter in filters.iter() {
        for &bpp in bpps.iter() {
            bench_unfilter(c, filter, bpp);
        }
    }
}

fn bench_unfilter(c: &mut Criterion, filter: FilterType, bpp: u8) {
    let mut group = c.benchmark_group("unfilter");

    let mut rng = rand::thread_rng();
    let row_size = 4096 * (bpp as usize);
    let two_rows = get_random_bytes(&mut rng, row_size * 2);

    group.throughput(Throughput::Bytes(row_size as u64));
    group.bench_with_input(
        format!("filter={filter:?}/bpp={bpp}"),
        &two_rows,
        |b, two_rows| {
            let (prev_row, curr_row) = two_rows.split_at(row_size);
            let mut curr_row = curr_row.to_vec();
            b.iter(|| benchable_apis::unfilter(filter, bpp, prev_row, curr_row.as_mut_slice()));
        },
    );
}

/// Whole images with a random filter byte per row.
fn unfilter_scanlines(c: &mut Criterion) {
    let mut group = c.benchmark_group("unfilter_scanlines");
    let mut rng = rand::thread_rng();

    for (color_type, name) in [(ColorType::Rgb, "rgb8"), (ColorType::Rgba, "rgba8")] {
        let header = ImageHeader {
            width: 512,
            height: 512,
            bit_depth: BitDepth::Eight,
            color_type,
            compression_method: 0,
            filter_method: 0,
            interlace_method: 0,
        };
        let stride = header.checked_stride().unwrap();
        let mut data = get_random_bytes(&mut rng, header.checked_raw_bytes().unwrap());
        for row in data.chunks_exact_mut(stride + 1) {
            row[0] = rng.gen_range(0..5);
        }

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(name, &data, |b, data| {
            b.iter(|| pngstrip::unfilter_scanlines(data, &header, Limits::default()).unwrap());
        });
    }
}

criterion_group!(benches, unfilter_all, unfilter_scanlines);
criterion_main!(benches);
