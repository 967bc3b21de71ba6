use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fieldgrid_count::{CellCounter, CountParams};
use image::{Rgb, RgbImage};

/// A field-sized crop sprinkled with cells of a few sizes.
fn synthetic_field(size: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(size, size, Rgb([6, 6, 6]));
    let mut side = 5;
    for cy in (10..size - 30).step_by(37) {
        for cx in (10..size - 30).step_by(41) {
            for y in cy..cy + side {
                for x in cx..cx + side {
                    img.put_pixel(x, y, Rgb([30, 200, 80]));
                }
            }
            side = if side >= 16 { 5 } else { side + 3 };
        }
    }
    img
}

fn bench_count(c: &mut Criterion) {
    let counter = match CellCounter::new(CountParams::default()) {
        Ok(counter) => counter,
        Err(e) => panic!("default params rejected: {e}"),
    };
    let field = synthetic_field(390);
    c.bench_function("count_field_390px", |b| {
        b.iter(|| counter.count(black_box(&field)))
    });
}

criterion_group!(benches, bench_count);
criterion_main!(benches);
