//! # State Container Benchmark
//!
//! Measures the mutation paths that run every frame:
//! - entity churn with LIFO id reuse
//! - gated add/remove with live subscriptions
//! - a kinematics-style pass over a subscription's id list
//!
//! Run with: `cargo bench --package flagstate_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flagstate_core::ecs::accept_all;
use flagstate_core::{ComponentKind, Position, State, Velocity};

const ENTITY_COUNT: usize = 10_000;

fn populated(count: usize) -> (State, flagstate_core::ListenerId) {
    let mut state = State::new();
    let movers = state.listen_for_like_entities(
        ComponentKind::Position | ComponentKind::Velocity,
        accept_all(),
        accept_all(),
    );
    for i in 0..count {
        let f = i as f32;
        let id = state.create_entity().expect("id space");
        state.add(id, Position::new(f, f, f)).expect("position");
        state.add(id, Velocity::new(0.1, 0.2, 0.3)).expect("velocity");
    }
    (state, movers)
}

/// Create then delete, exercising the reclaim list.
fn bench_entity_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("entity_churn");

    for count in [1_000, ENTITY_COUNT] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut state = State::new();
            let mut ids = Vec::with_capacity(count);
            b.iter(|| {
                for _ in 0..count {
                    ids.push(state.create_entity().expect("id space"));
                }
                for id in ids.drain(..) {
                    state.delete_entity(id).expect("alive");
                }
                black_box(state.alive_count())
            });
        });
    }

    group.finish();
}

/// Toggle Velocity on every entity: two boundary crossings per entity.
fn bench_toggle_with_subscription(c: &mut Criterion) {
    let (mut state, movers) = populated(ENTITY_COUNT);
    let ids = state.matching_snapshot(movers);

    c.bench_function("toggle_velocity_10k", |b| {
        b.iter(|| {
            for &id in &ids {
                let velocity = state.remove::<Velocity>(id).expect("attached");
                state.add(id, velocity).expect("prerequisites");
            }
            black_box(state.matching(movers).len())
        });
    });
}

/// Integrate positions over the subscription's id list.
fn bench_integrate(c: &mut Criterion) {
    let (mut state, movers) = populated(ENTITY_COUNT);
    let dt = 1.0 / 60.0;

    c.bench_function("integrate_10k", |b| {
        b.iter(|| {
            for id in state.matching_snapshot(movers) {
                let Ok(&velocity) = state.get::<Velocity>(id) else { continue };
                if let Ok(position) = state.get_mut::<Position>(id) {
                    position.vec += velocity.vec * dt;
                }
            }
        });
    });
}

criterion_group!(benches, bench_entity_churn, bench_toggle_with_subscription, bench_integrate);
criterion_main!(benches);
