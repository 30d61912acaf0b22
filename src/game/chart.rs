use glam::Vec2;
use std::hash::Hasher;
use twox_hash::XxHash64;

// Authored coordinates are clamped into this box so every target stays
// clickable on-screen regardless of the chart's coordinate space.
pub const PLAYFIELD_MIN_X: f32 = 60.0;
pub const PLAYFIELD_MAX_X: f32 = 964.0;
pub const PLAYFIELD_MIN_Y: f32 = 60.0;
pub const PLAYFIELD_MAX_Y: f32 = 708.0;

/// Radius shared by every circle; the chart format carries no per-object size.
pub const TARGET_RADIUS: f32 = 60.0;

/// Opaque per-chart token; unique within one chart, assigned at construction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TargetId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TargetState {
    Pending,
    Active,
    Hit,
    Missed,
}

impl TargetState {
    #[inline(always)]
    pub fn is_terminal(self) -> bool {
        matches!(self, TargetState::Hit | TargetState::Missed)
    }
}

/// One timed circle. The authored fields never change after construction;
/// `state` only ever moves forward (Pending → Active → Hit/Missed, with the
/// sweep allowed to miss a still-pending target) and terminal states are
/// immutable, so the transition helpers below are the only mutation path.
#[derive(Clone, Debug)]
pub struct Target {
    pub id: TargetId,
    pub position: Vec2,
    pub scheduled_time_ms: f64,
    pub hit_radius: f32,
    state: TargetState,
}

impl Target {
    pub fn new(id: TargetId, position: Vec2, scheduled_time_ms: f64) -> Self {
        Self {
            id,
            position,
            scheduled_time_ms,
            hit_radius: TARGET_RADIUS,
            state: TargetState::Pending,
        }
    }

    #[inline(always)]
    pub fn state(&self) -> TargetState {
        self.state
    }

    #[inline(always)]
    pub fn is_resolved(&self) -> bool {
        self.state.is_terminal()
    }

    /// Pending → Active. Returns whether the transition happened.
    pub(crate) fn activate(&mut self) -> bool {
        if self.state == TargetState::Pending {
            self.state = TargetState::Active;
            true
        } else {
            false
        }
    }

    /// Active → Hit. Only an active target can be hit.
    pub(crate) fn mark_hit(&mut self) -> bool {
        if self.state == TargetState::Active {
            self.state = TargetState::Hit;
            true
        } else {
            false
        }
    }

    /// Pending/Active → Missed. A no-op once the target is resolved, which
    /// is what makes the two competing miss-detection paths race-safe.
    pub(crate) fn mark_missed(&mut self) -> bool {
        if self.state.is_terminal() {
            false
        } else {
            self.state = TargetState::Missed;
            true
        }
    }

    /// Spatial half of the judgement test: is the click inside the circle?
    #[inline(always)]
    pub fn contains(&self, point: Vec2) -> bool {
        self.position.distance_squared(point) <= self.hit_radius * self.hit_radius
    }
}

#[derive(Clone, Debug)]
pub struct AudioAsset {
    pub name: String,
    /// Opaque payload for the host's audio player; never decoded here.
    pub bytes: Vec<u8>,
}

/// A parsed or generated beatmap. Authored fields are immutable once built;
/// the per-target `state` is the only thing a session mutates.
#[derive(Clone, Debug)]
pub struct ChartData {
    pub title: String,
    pub artist: String,
    pub audio: Option<AudioAsset>,
    pub tempo_bpm: f64,
    /// Sorted by `scheduled_time_ms`, stable for equal timestamps.
    pub targets: Vec<Target>,
    /// Content key used for best-score persistence.
    pub short_hash: String,
}

impl ChartData {
    pub fn total_targets(&self) -> u32 {
        self.targets.len() as u32
    }
}

/// 16-hex-digit XxHash64 of the chart source, the persistence key for
/// per-chart bests.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    format!("{:016x}", hasher.finish())
}
