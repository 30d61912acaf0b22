// Shared timing window definitions to keep the scheduler and judgement in sync.

// All windows are in milliseconds of session time.

/// Lead time before a target's scheduled beat during which it is active (clickable).
pub const SPAWN_WINDOW_MS: f64 = 2000.0;

/// Maximum absolute timing error for a spatially-matching click to land.
pub const HIT_WINDOW_MS: f64 = 150.0;

/// Past-due age at which the miss sweep resolves any unresolved target.
pub const MISS_WINDOW_MS: f64 = 200.0;

/// Past-due age at which the tick pass retires an active target outright.
/// Wider than `MISS_WINDOW_MS`, so the sweep normally fires first; both
/// paths funnel through the same terminal transition.
pub const EXPIRE_GRACE_MS: f64 = 500.0;

// Grade cutoffs on the absolute timing error of a landed click.
pub const PERFECT_MS: f64 = 50.0;
pub const GREAT_MS: f64 = 100.0;
