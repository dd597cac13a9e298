//! Player emotion signal.
//!
//! The client submits a seven-way percentage distribution detected from the
//! player's face; only its dominant entry reaches the prompt.

use crate::error::{GstarError, Result};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Detected player emotions, in tie-breaking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

/// Percentages (0-100) per emotion. They are not required to sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EmotionDistribution {
    pub angry: u8,
    pub disgust: u8,
    pub fear: u8,
    pub happy: u8,
    pub sad: u8,
    pub surprise: u8,
    pub neutral: u8,
}

/// The highest-valued entry of a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DominantEmotion {
    pub emotion: Emotion,
    pub percent: u8,
}

impl std::fmt::Display for DominantEmotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}%)", self.emotion, self.percent)
    }
}

impl EmotionDistribution {
    pub fn get(&self, emotion: Emotion) -> u8 {
        match emotion {
            Emotion::Angry => self.angry,
            Emotion::Disgust => self.disgust,
            Emotion::Fear => self.fear,
            Emotion::Happy => self.happy,
            Emotion::Sad => self.sad,
            Emotion::Surprise => self.surprise,
            Emotion::Neutral => self.neutral,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for emotion in Emotion::iter() {
            if self.get(emotion) > 100 {
                return Err(GstarError::validation(format!(
                    "emotion.{emotion} must be between 0 and 100"
                )));
            }
        }
        Ok(())
    }

    /// Highest percentage; ties go to the emotion listed first in `Emotion`.
    pub fn dominant(&self) -> DominantEmotion {
        let mut best = DominantEmotion {
            emotion: Emotion::Angry,
            percent: self.angry,
        };
        for emotion in Emotion::iter() {
            let percent = self.get(emotion);
            if percent > best.percent {
                best = DominantEmotion { emotion, percent };
            }
        }
        best
    }
}
