use cgmath::vec3;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use olivine_client::game_state::{
    input::{BoundAction, InputState},
    physics::PhysicsState,
    settings::{CameraSettings, GameSettings},
    GameState,
};
use olivine_core::{
    noise::GradientNoise,
    terrain::{OctaveNoiseGenerator, OctaveSet, OutOfExtentPolicy, TerrainChunkStore, TerrainExtent},
    Terrain,
};
use std::time::Duration;

fn physics_benchmarks(c: &mut Criterion) {
    let settings = CameraSettings::default();
    let mut terrain = Terrain::new(
        TerrainChunkStore::new(),
        OctaveNoiseGenerator::new(GradientNoise::new(0), OctaveSet::default()),
        TerrainExtent::new(8, 8),
        OutOfExtentPolicy::DefaultZero,
    )
    .unwrap();
    let mut input = InputState::new(Default::default());
    let mut physics = PhysicsState::new(&settings);
    let forward = input.keybinds().get(BoundAction::MoveForward);
    input.key_pressed(forward);

    c.bench_function("physics_step_walking", |b| {
        b.iter(|| {
            // Stay inside the window so the bench doesn't measure regeneration
            if physics.pos().x.abs() > 40.0 || physics.pos().z.abs() > 40.0 {
                physics.set_position(vec3(0.0, 20.0, 0.0));
            }
            physics
                .update(
                    &mut input,
                    &mut terrain,
                    &settings,
                    black_box(Duration::from_micros(16_667)),
                )
                .unwrap()
        })
    });
}

fn frame_benchmarks(c: &mut Criterion) {
    let mut game = GameState::new(GameSettings::default()).unwrap();
    c.bench_function("advance_frame_5x5", |b| {
        b.iter(|| game.advance_frame(black_box((1920, 1080))).unwrap())
    });
}

criterion_group!(benches, physics_benchmarks, frame_benchmarks);
criterion_main!(benches);
