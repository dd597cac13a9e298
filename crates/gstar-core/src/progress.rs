//! Playtime progress and story pacing.

use serde::Serialize;

/// Elapsed playtime against the game's target playtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayProgress {
    pub elapsed_seconds: u64,
    pub total_playtime_minutes: u32,
}

impl PlayProgress {
    pub fn new(elapsed_seconds: u64, total_playtime_minutes: u32) -> Self {
        Self {
            elapsed_seconds,
            total_playtime_minutes,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        u64::from(self.total_playtime_minutes) * 60
    }

    /// elapsed / total. Not capped: an overrun game reports more than 1.0.
    pub fn fraction(&self) -> f64 {
        match self.total_seconds() {
            0 => 0.0,
            total => self.elapsed_seconds as f64 / total as f64,
        }
    }

    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }

    /// Negative once the target playtime is exceeded.
    pub fn remaining_seconds(&self) -> i64 {
        self.total_seconds() as i64 - self.elapsed_seconds as i64
    }

    pub fn phase(&self) -> StoryPhase {
        StoryPhase::for_fraction(self.fraction())
    }
}

/// Pacing bands handed to the model as guidance.
///
/// Nothing enforces them structurally; the model may ignore them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StoryPhase {
    Rapport,
    Flirting,
    RomanticBuildUp,
    Confession,
    Ending,
}

impl StoryPhase {
    pub const ALL: [StoryPhase; 5] = [
        Self::Rapport,
        Self::Flirting,
        Self::RomanticBuildUp,
        Self::Confession,
        Self::Ending,
    ];

    pub fn for_fraction(fraction: f64) -> Self {
        match fraction {
            f if f < 0.30 => Self::Rapport,
            f if f < 0.60 => Self::Flirting,
            f if f < 0.80 => Self::RomanticBuildUp,
            f if f < 0.95 => Self::Confession,
            _ => Self::Ending,
        }
    }

    /// Percentage band as shown in prompts.
    pub fn band(&self) -> &'static str {
        match self {
            Self::Rapport => "0-30%",
            Self::Flirting => "30-60%",
            Self::RomanticBuildUp => "60-80%",
            Self::Confession => "80-95%",
            Self::Ending => "95%+",
        }
    }

    pub fn guidance(&self) -> &'static str {
        match self {
            Self::Rapport => {
                "Build the relationship fast: shared activities that raise closeness and affection."
            }
            Self::Flirting => "Heart-fluttering words and gestures; start flirting or push-and-pull.",
            Self::RomanticBuildUp => "Romantic atmosphere; set the mood for a confession.",
            Self::Confession => {
                "Move straight to the confession scene. No new events and no location changes. \
                 Confession, answer, ending within two or three scenes."
            }
            Self::Ending => {
                "The story is over. Reply with a single dialogue scene whose dialogue is exactly \"끝\"."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_is_not_capped() {
        let progress = PlayProgress::new(450, 5);
        assert_eq!(progress.fraction(), 1.5);
        assert_eq!(progress.remaining_seconds(), -150);
        assert_eq!(progress.phase(), StoryPhase::Ending);
    }

    #[test]
    fn test_phase_boundaries() {
        assert_eq!(StoryPhase::for_fraction(0.0), StoryPhase::Rapport);
        assert_eq!(StoryPhase::for_fraction(0.30), StoryPhase::Flirting);
        assert_eq!(StoryPhase::for_fraction(0.79), StoryPhase::RomanticBuildUp);
        assert_eq!(StoryPhase::for_fraction(0.80), StoryPhase::Confession);
        assert_eq!(StoryPhase::for_fraction(0.95), StoryPhase::Ending);
    }

    #[test]
    fn test_zero_playtime() {
        let progress = PlayProgress::new(30, 0);
        assert_eq!(progress.fraction(), 0.0);
        assert_eq!(progress.remaining_seconds(), -30);
    }

    #[test]
    fn test_percent() {
        let progress = PlayProgress::new(30, 5);
        assert!((progress.percent() - 10.0).abs() < f64::EPSILON);
    }
}
