//! Character roster domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fixed roster entry that can appear in any game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Character {
    pub id: i64,
    pub name: String,
    /// Free-text personality description embedded in prompts
    pub personality: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCharacter {
    pub name: String,
    pub personality: String,
}

impl NewCharacter {
    pub fn new(name: impl Into<String>, personality: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            personality: personality.into(),
        }
    }
}

/// The three characters every fresh database is seeded with.
pub fn default_roster() -> Vec<NewCharacter> {
    vec![
        NewCharacter::new(
            "아리아나",
            "밝고 활발한 성격. 항상 긍정적이고 주변 사람들을 웃게 만드는 것을 좋아한다. 친구들에게 인기가 많으며 모든 일에 적극적으로 참여한다.",
        ),
        NewCharacter::new(
            "유나",
            "조용하고 차분한 성격. 책을 좋아하며 깊이 있는 대화를 선호한다. 겉으로는 냉정해 보이지만 속마음은 따뜻하고 세심하다.",
        ),
        NewCharacter::new(
            "소라",
            "도도하지만 따뜻한 성격. 처음엔 차갑게 대하지만 친해지면 누구보다 다정하다. 완벽주의자이며 자존심이 강하다.",
        ),
    ]
}
