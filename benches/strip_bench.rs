//! Strip synthesis and per-frame update benchmarks.

// criterion_group! expands to undocumented public functions.
#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Mat4, Quat, Vec3, Vec4};
use ribbon_chain::{
    chain::{storage::ChainStorage, BillboardChain, Element},
    geometry::strip::{build_indices, build_vertices, StripParams},
    renderer::headless::HeadlessBackend,
};

fn element(i: usize) -> Element {
    let t = i as f32 * 0.1;
    Element::new(
        Vec3::new(t.sin() * 5.0, t * 0.2, t.cos() * 5.0),
        0.5,
        t,
        Vec4::ONE,
        Quat::IDENTITY,
    )
}

fn filled_storage(max: usize, chains: usize) -> ChainStorage {
    let mut storage = ChainStorage::new(max, chains).unwrap();
    for c in 0..chains {
        // overfill so every chain has wrapped
        for i in 0..max + max / 2 {
            storage.add(c, element(i)).unwrap();
        }
    }
    storage
}

fn vertex_synthesis_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_vertices");
    let params = StripParams::default();
    let eye = Vec3::new(0.0, 3.0, 12.0);

    for &(max, chains) in &[(20, 1), (100, 4), (500, 16)] {
        let storage = filled_storage(max, chains);
        let mut out = Vec::with_capacity(storage.capacity() * 2);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{chains}x{max}")),
            &storage,
            |b, storage| {
                b.iter(|| {
                    build_vertices(storage.views(), &params, black_box(eye), &mut out);
                    black_box(out.len())
                });
            },
        );
    }

    group.finish();
}

fn index_synthesis_benchmark(c: &mut Criterion) {
    let lens = vec![500; 16];
    let mut out = Vec::new();
    c.bench_function("build_indices_16x500", |b| {
        b.iter(|| {
            build_indices(black_box(&lens).iter().copied(), &mut out);
            black_box(out.len())
        });
    });
}

fn update_and_render_benchmark(c: &mut Criterion) {
    let mut backend = HeadlessBackend::default();
    let mut chain = BillboardChain::new("bench", 200, 4).unwrap();
    for index in 0..4 {
        for i in 0..200 {
            chain.add_chain_element(index, element(i)).unwrap();
        }
    }
    let camera = Mat4::from_translation(Vec3::new(0.0, 3.0, 12.0));
    let mut frame = 0;

    c.bench_function("update_head_and_render_4x200", |b| {
        b.iter(|| {
            frame += 1;
            for index in 0..4 {
                chain.update_chain_element(index, 0, element(frame)).unwrap();
            }
            let _ = black_box(chain.render(&mut backend, Mat4::IDENTITY, &camera).unwrap());
            backend.take_draws().len()
        });
    });
}

criterion_group!(
    benches,
    vertex_synthesis_benchmark,
    index_synthesis_benchmark,
    update_and_render_benchmark
);
criterion_main!(benches);
