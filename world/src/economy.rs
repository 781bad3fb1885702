//! Gold, lives, and score ledger.
//!
//! Every mutation goes through a named transaction so negative balances and
//! the terminal loss are checked in one place.

use quiz_defence_core::{InsufficientFunds, QuizEffect};

/// Outcome of a [`Economy::lose_life`] transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifeLoss {
    /// Lives actually removed after clamping.
    pub lost: u32,
    /// True only for the transaction that brought lives to zero.
    pub depleted: bool,
}

/// Outcome of a [`Economy::apply_quiz_effect`] transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuizSettlement {
    /// Gold added by a correct answer.
    pub gold_gained: u32,
    /// Gold removed by an incorrect answer.
    pub gold_lost: u32,
    /// Lives removed by an incorrect answer.
    pub lives_lost: u32,
    /// True when the settlement brought lives to zero.
    pub depleted: bool,
}

/// Gold, lives, and score counters of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Economy {
    gold: u32,
    lives: u32,
    score: u64,
}

impl Economy {
    /// Opens a ledger with the provided balances and a zero score.
    #[must_use]
    pub const fn new(gold: u32, lives: u32) -> Self {
        Self {
            gold,
            lives,
            score: 0,
        }
    }

    /// Current gold balance.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    /// Remaining lives.
    #[must_use]
    pub const fn lives(&self) -> u32 {
        self.lives
    }

    /// Accumulated score.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Deducts `amount` if the balance covers it; otherwise changes nothing.
    pub fn spend(&mut self, amount: u32) -> Result<(), InsufficientFunds> {
        match self.gold.checked_sub(amount) {
            Some(remaining) => {
                self.gold = remaining;
                Ok(())
            }
            None => Err(InsufficientFunds {
                required: amount,
                available: self.gold,
            }),
        }
    }

    /// Adds `amount` gold.
    pub fn reward(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Removes up to `amount` gold and returns what was actually taken.
    pub fn penalize(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.gold);
        self.gold -= taken;
        taken
    }

    /// Removes up to `count` lives.
    pub fn lose_life(&mut self, count: u32) -> LifeLoss {
        let lost = count.min(self.lives);
        let was_alive = self.lives > 0;
        self.lives -= lost;
        LifeLoss {
            lost,
            depleted: was_alive && self.lives == 0,
        }
    }

    /// Adds `points` to the score.
    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    /// Settles a quiz answer against the gate's effect.
    pub fn apply_quiz_effect(&mut self, correct: bool, effect: &QuizEffect) -> QuizSettlement {
        if correct {
            self.reward(effect.correct_gold);
            self.add_score(effect.correct_score);
            return QuizSettlement {
                gold_gained: effect.correct_gold,
                gold_lost: 0,
                lives_lost: 0,
                depleted: false,
            };
        }

        let gold_lost = self.penalize(effect.incorrect_gold);
        let loss = self.lose_life(effect.incorrect_lives);
        QuizSettlement {
            gold_gained: 0,
            gold_lost,
            lives_lost: loss.lost,
            depleted: loss.depleted,
        }
    }
}
