//! Quiz payload and gate configuration.

use serde::{Deserialize, Serialize};

/// Identifier of a question inside the externally supplied quiz payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(u32);

impl QuestionId {
    /// Creates a new question identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Multiple-choice question surfaced by a quiz gate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Identifier of the question.
    pub id: QuestionId,
    /// Text shown to the player.
    pub prompt: String,
    /// Answer options in display order.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_option_index: usize,
}

impl Question {
    /// Reports whether `option` is the correct answer.
    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_option_index
    }
}

/// Condition that makes an armed quiz gate fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuizTrigger {
    /// Fires after every `count` kills. Leaks do not count.
    EveryKills {
        /// Kills required per question.
        count: u32,
    },
    /// Fires whenever a wave is cleared.
    WaveCleared,
}

impl Default for QuizTrigger {
    fn default() -> Self {
        Self::EveryKills { count: 10 }
    }
}

/// Economic consequence of answering a quiz question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizEffect {
    /// Gold granted for a correct answer.
    pub correct_gold: u32,
    /// Score granted for a correct answer.
    pub correct_score: u64,
    /// Lives removed for an incorrect answer.
    pub incorrect_lives: u32,
    /// Gold removed for an incorrect answer, clamped at zero.
    pub incorrect_gold: u32,
}

impl Default for QuizEffect {
    fn default() -> Self {
        Self {
            correct_gold: 15,
            correct_score: 50,
            incorrect_lives: 1,
            incorrect_gold: 0,
        }
    }
}
