use crate::game::timing_windows::{GREAT_MS, PERFECT_MS};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JudgeGrade {
    Perfect, // |error| < 50 ms
    Great,   // |error| < 100 ms
    Good,    // anything else inside the hit window
    Miss,
}

/// One resolved click, paired with the signed timing error that produced it.
/// Negative error means the click landed early.
#[derive(Clone, Debug, PartialEq)]
pub struct Judgment {
    pub time_error_ms: f64,
    pub grade: JudgeGrade,
}

pub fn grade_points_for(grade: JudgeGrade) -> u32 {
    match grade {
        JudgeGrade::Perfect => 300,
        JudgeGrade::Great => 200,
        JudgeGrade::Good => 100,
        JudgeGrade::Miss => 0,
    }
}

/// Classifies the absolute timing error of a click that already passed the
/// hit window. Errors past `GREAT_MS` still land, just for the low tier.
#[inline(always)]
pub fn classify_offset_ms(abs_error_ms: f64) -> JudgeGrade {
    if abs_error_ms < PERFECT_MS {
        JudgeGrade::Perfect
    } else if abs_error_ms < GREAT_MS {
        JudgeGrade::Great
    } else {
        JudgeGrade::Good
    }
}

#[cfg(test)]
mod tests {
    use super::{JudgeGrade, classify_offset_ms, grade_points_for};

    #[test]
    fn grade_cutoffs_are_exclusive_at_the_boundary() {
        assert_eq!(classify_offset_ms(0.0), JudgeGrade::Perfect);
        assert_eq!(classify_offset_ms(49.999), JudgeGrade::Perfect);
        assert_eq!(classify_offset_ms(50.0), JudgeGrade::Great);
        assert_eq!(classify_offset_ms(99.999), JudgeGrade::Great);
        assert_eq!(classify_offset_ms(100.0), JudgeGrade::Good);
        assert_eq!(classify_offset_ms(150.0), JudgeGrade::Good);
    }

    #[test]
    fn point_values_follow_the_grade_tiers() {
        assert_eq!(grade_points_for(JudgeGrade::Perfect), 300);
        assert_eq!(grade_points_for(JudgeGrade::Great), 200);
        assert_eq!(grade_points_for(JudgeGrade::Good), 100);
        assert_eq!(grade_points_for(JudgeGrade::Miss), 0);
    }
}
