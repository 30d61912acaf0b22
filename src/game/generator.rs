use crate::game::chart::{self, ChartData, Target, TargetId};
use glam::Vec2;
use rand::RngExt;

// Both generators take the random source by injection so seeded sessions
// (and the tests) reproduce the exact same chart.

const START_DELAY_MS: f64 = 2000.0;

/// Fallback chart used when nothing was imported: evenly spaced circles
/// with fully random placement.
pub fn random_chart<R: RngExt>(rng: &mut R) -> ChartData {
    const COUNT: u32 = 20;
    const INTERVAL_MS: f64 = 1000.0;

    let targets = (0..COUNT)
        .map(|i| {
            let position = Vec2::new(
                rng.random_range(100.0..=924.0),
                rng.random_range(100.0..=668.0),
            );
            Target::new(
                TargetId(i),
                position,
                START_DELAY_MS + f64::from(i) * INTERVAL_MS,
            )
        })
        .collect();

    ChartData {
        title: "Random Practice".to_string(),
        artist: "Generated".to_string(),
        audio: None,
        tempo_bpm: 120.0,
        targets,
        short_hash: chart::content_hash(b"generator:random:v1"),
    }
}

/// The named prototype chart: a fixed anchor loop with per-pass jitter,
/// denser than the random fallback.
pub fn sample_chart<R: RngExt>(rng: &mut R) -> ChartData {
    const COUNT: u32 = 24;
    const INTERVAL_MS: f64 = 800.0;
    const JITTER: f32 = 50.0;
    const ANCHORS: [(f32, f32); 8] = [
        (200.0, 200.0),
        (400.0, 300.0),
        (600.0, 200.0),
        (800.0, 300.0),
        (600.0, 400.0),
        (400.0, 500.0),
        (200.0, 400.0),
        (400.0, 300.0),
    ];

    let targets = (0..COUNT)
        .map(|i| {
            let (anchor_x, anchor_y) = ANCHORS[i as usize % ANCHORS.len()];
            let position = Vec2::new(
                anchor_x + rng.random_range(-JITTER..=JITTER),
                anchor_y + rng.random_range(-JITTER..=JITTER),
            );
            Target::new(
                TargetId(i),
                position,
                START_DELAY_MS + f64::from(i) * INTERVAL_MS,
            )
        })
        .collect();

    ChartData {
        title: "Sample Beatmap".to_string(),
        artist: "Generated".to_string(),
        audio: None,
        tempo_bpm: 150.0,
        targets,
        short_hash: chart::content_hash(b"generator:sample:v1"),
    }
}
