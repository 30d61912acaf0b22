use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Victory,
    Defeat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Rank {
    SS,
    S,
    A,
    B,
    C,
    D,
    F,
}

impl Rank {
    /// Accuracy tiers differ by outcome: a cleared chart never grades below
    /// C, and a failed one never reaches SS.
    pub fn for_session(outcome: Outcome, accuracy: f64) -> Rank {
        match outcome {
            Outcome::Victory => {
                if accuracy >= 98.0 {
                    Rank::SS
                } else if accuracy >= 95.0 {
                    Rank::S
                } else if accuracy >= 90.0 {
                    Rank::A
                } else if accuracy >= 85.0 {
                    Rank::B
                } else {
                    Rank::C
                }
            }
            Outcome::Defeat => {
                if accuracy >= 95.0 {
                    Rank::S
                } else if accuracy >= 90.0 {
                    Rank::A
                } else if accuracy >= 80.0 {
                    Rank::B
                } else if accuracy >= 70.0 {
                    Rank::C
                } else if accuracy >= 60.0 {
                    Rank::D
                } else {
                    Rank::F
                }
            }
        }
    }
}

/// End-of-session payload handed to the presentation layer.
#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
    pub outcome: Outcome,
    pub score: u64,
    /// Hit percentage over the whole chart; 0.0 for an empty chart.
    pub accuracy: f64,
    /// Combo held when the session ended. It resets on every miss, so this
    /// is not the peak; `max_combo` carries that.
    pub combo: u32,
    pub max_combo: u32,
    pub total_circles: u32,
    pub hit_circles: u32,
    pub rank: Rank,
}

impl SessionSummary {
    pub fn new(
        outcome: Outcome,
        score: u64,
        combo: u32,
        max_combo: u32,
        hit_circles: u32,
        total_circles: u32,
    ) -> Self {
        let accuracy = if total_circles > 0 {
            f64::from(hit_circles) / f64::from(total_circles) * 100.0
        } else {
            0.0
        };
        Self {
            outcome,
            score,
            accuracy,
            combo,
            max_combo,
            total_circles,
            hit_circles,
            rank: Rank::for_session(outcome, accuracy),
        }
    }
}
