use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pg_core::frame::FrameBuffer;
use pg_core::sample::sample_frame;
use pg_core::table::{GlyphMetadata, GlyphWeightTable};
use pg_glyph::mapper::LuminanceMapper;

fn table() -> GlyphWeightTable {
    let alphabet = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let entries = alphabet
        .chars()
        .enumerate()
        .map(|(i, ch)| GlyphMetadata {
            character: ch,
            glyph_image_path: format!("{ch}.png").into(),
            luminance_percentage: (i * 3) as f32,
        })
        .collect();
    GlyphWeightTable::new(alphabet, 10, 12, entries)
}

fn gradient(width: u32, height: u32) -> FrameBuffer {
    let mut fb = FrameBuffer::new(width, height);
    for (i, px) in fb.data.chunks_exact_mut(4).enumerate() {
        let v = (i % 256) as u8;
        px.copy_from_slice(&[v, v.wrapping_mul(3), v.wrapping_mul(7), 255]);
    }
    fb
}

fn bench_map_frame(c: &mut Criterion) {
    let mapper = match LuminanceMapper::new(table()) {
        Ok(m) => m,
        Err(e) => panic!("{e}"),
    };
    let frame = gradient(640, 480);

    c.bench_function("sample_640x480", |b| {
        b.iter(|| sample_frame(black_box(&frame)));
    });

    c.bench_function("map_frame_640x480", |b| {
        b.iter(|| mapper.map_frame(black_box(&frame)));
    });
}

criterion_group!(benches, bench_map_frame);
criterion_main!(benches);
