// Health deltas applied per judged event. Health lives in [0, HEALTH_MAX];
// reaching 0 is terminal (defeat), and clicks on empty space cost nothing.

pub const HEALTH_MAX: f32 = 100.0;

pub const LIFE_HIT: f32 = 2.0;
pub const LIFE_MISS: f32 = -10.0;
