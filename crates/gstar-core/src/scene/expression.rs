//! Character facial expression tags.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Sprite variant shown next to a character's line.
///
/// The client resolves `{character_id}_{expression}.png`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Expression {
    Anger,
    Blush,
    Embarrassed,
    Laugh,
    Sad,
    Smile,
    Surprise,
    Thinking,
    Worry,
}

impl Expression {
    /// Parses a model-supplied tag. Empty or unknown tags mean the default
    /// sprite and yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        tag.trim().to_lowercase().parse().ok()
    }

    /// Comma separated list of every tag, for prompts.
    pub fn catalog() -> String {
        Self::iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag() {
        assert_eq!(Expression::from_tag(" Smile "), Some(Expression::Smile));
        assert_eq!(Expression::from_tag(""), None);
        assert_eq!(Expression::from_tag("기본"), None);
    }

    #[test]
    fn test_catalog_order() {
        assert!(Expression::catalog().starts_with("anger, blush, embarrassed"));
        assert!(Expression::catalog().ends_with("worry"));
    }
}
