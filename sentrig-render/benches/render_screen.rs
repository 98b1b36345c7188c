use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use pprof::criterion::{Output, PProfProfiler};
use sentrig_core::{Screen, TextStim};
use sentrig_render::{SkiaRenderer, load_font};

fn harness() -> Option<SkiaRenderer> {
    let font = load_font(None).ok()?;
    SkiaRenderer::new(1920, 1080, font, [128, 128, 128, 255], [0, 0, 0, 255]).ok()
}

pub fn bench_render_screen(c: &mut Criterion) {
    let Some(warm) = harness() else {
        eprintln!("no system font found, skipping render benches");
        return;
    };
    drop(warm);

    let mut g = c.benchmark_group("render_screen");
    g.sample_size(40);

    let sentence = Screen::Text(TextStim::body(
        "A kaleidoscope of colors shifted within the stained-glass.",
    ));
    let fixation = Screen::Text(TextStim::fixation());

    g.bench_function("sentence_cold", |b| {
        b.iter_batched(
            || harness().unwrap(),
            |mut r| {
                black_box(r.render_screen(&sentence).data()[0]);
            },
            BatchSize::LargeInput,
        )
    });

    let mut cached = harness().unwrap();
    cached.render_screen(&sentence);
    g.bench_function("sentence_cached", |b| {
        b.iter(|| black_box(cached.render_screen(black_box(&sentence)).data()[0]))
    });

    g.bench_function("fixation_cached", |b| {
        b.iter(|| black_box(cached.render_screen(black_box(&fixation)).data()[0]))
    });

    g.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = bench_render_screen
}
criterion_main!(benches);
