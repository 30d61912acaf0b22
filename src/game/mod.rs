pub mod chart;
pub mod gameplay;
pub mod generator;
pub mod judgment;
pub mod life;
pub mod parsing;
pub mod scores;
pub mod scoring;
pub mod stage_stats;
pub mod timing_windows;
