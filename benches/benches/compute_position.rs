// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `compute_position` over a [`Scene`].

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use kurbo::{Rect, Vec2};
use pollster::block_on;
use understory_anchor::middleware::arrow::{ArrowOptions, arrow};
use understory_anchor::middleware::auto_placement::{AutoPlacementOptions, auto_placement};
use understory_anchor::middleware::flip::{FlipOptions, flip};
use understory_anchor::middleware::hide::{HideStrategy, hide};
use understory_anchor::middleware::offset::offset;
use understory_anchor::middleware::shift::{ShiftOptions, shift};
use understory_anchor::scene::{ElementId, Scene, SceneElement};
use understory_anchor::{ComputePositionConfig, Placement, compute_position};

struct Fixture {
    scene: Scene,
    reference: ElementId,
    floating: ElementId,
    arrow: ElementId,
}

/// A reference inside `depth` nested clipping containers, near the bottom edge
/// of the viewport so flip has to restart.
fn fixture(depth: usize) -> Fixture {
    let mut scene = Scene::new(Rect::new(0.0, 0.0, 800.0, 600.0));
    let mut parent = None;
    for i in 0..depth {
        let inset = i as f64 * 4.0;
        let container = scene.insert(
            parent,
            SceneElement::new(Rect::new(inset, inset, 800.0 - inset, 600.0 - inset)).clips(),
        );
        parent = Some(container);
    }
    let reference = scene.insert(
        parent,
        SceneElement::new(Rect::new(380.0, 560.0, 420.0, 580.0)),
    );
    let floating = scene.insert(None, SceneElement::new(Rect::new(0.0, 0.0, 160.0, 80.0)));
    let arrow = scene.insert(
        Some(floating),
        SceneElement::new(Rect::new(0.0, 0.0, 8.0, 8.0)),
    );
    Fixture {
        scene,
        reference,
        floating,
        arrow,
    }
}

fn bench_placement_only(c: &mut Criterion) {
    let f = fixture(0);
    c.bench_function("compute_position/no_middleware", |b| {
        b.iter(|| {
            let config = ComputePositionConfig::new(&f.scene).placement(Placement::BOTTOM);
            let out = block_on(compute_position(&f.reference, &f.floating, config));
            black_box(out)
        });
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_position/pipeline");
    for depth in [0_usize, 4, 16] {
        let f = fixture(depth);
        group.bench_function(format!("offset_flip_shift_arrow_depth{depth}"), |b| {
            b.iter(|| {
                let config = ComputePositionConfig::new(&f.scene)
                    .placement(Placement::BOTTOM)
                    .with(offset(6.0))
                    .with(flip(FlipOptions::default()))
                    .with(shift(ShiftOptions::default()))
                    .with_opt(arrow(ArrowOptions::new(f.arrow)).ok())
                    .with(hide(HideStrategy::ReferenceHidden));
                let out = block_on(compute_position(&f.reference, &f.floating, config));
                black_box(out)
            });
        });
    }
    group.finish();
}

fn bench_auto_placement(c: &mut Criterion) {
    let f = fixture(4);
    c.bench_function("compute_position/auto_placement", |b| {
        b.iter(|| {
            let options = AutoPlacementOptions::default();
            let config = ComputePositionConfig::new(&f.scene).with(auto_placement(options));
            let out = block_on(compute_position(&f.reference, &f.floating, config));
            black_box(out)
        });
    });
}

fn bench_scrolled(c: &mut Criterion) {
    let mut f = fixture(4);
    c.bench_function("compute_position/after_scroll", |b| {
        b.iter(|| {
            f.scene.scroll_by(None, Vec2::new(0.0, 1.0));
            f.scene.scroll_by(None, Vec2::new(0.0, -1.0));
            let config = ComputePositionConfig::new(&f.scene)
                .with(flip(FlipOptions::default()))
                .with(shift(ShiftOptions::default()));
            let out = block_on(compute_position(&f.reference, &f.floating, config));
            black_box(out)
        });
    });
}

criterion_group!(
    benches,
    bench_placement_only,
    bench_pipeline,
    bench_auto_placement,
    bench_scrolled
);
criterion_main!(benches);
