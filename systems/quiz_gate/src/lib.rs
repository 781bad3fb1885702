#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Quiz gate controller that interrupts play with multiple-choice questions.
//!
//! The gate watches the event stream for its trigger, draws questions from a
//! seeded shuffle of the pool, and settles answers into a [`QuizResolution`]
//! the tick driver turns into an economic effect.

use quiz_defence_core::{Event, PauseReason, Question, QuestionId, QuizEffect, QuizTrigger};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;

/// Configuration parameters required to construct the quiz gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    trigger: QuizTrigger,
    effect: QuizEffect,
    seed: u64,
    recycle: bool,
}

impl Config {
    /// Creates a configuration.
    ///
    /// With `recycle` set the pool is reshuffled once every question was
    /// asked; otherwise the gate exhausts.
    #[must_use]
    pub const fn new(trigger: QuizTrigger, effect: QuizEffect, seed: u64, recycle: bool) -> Self {
        Self {
            trigger,
            effect,
            seed,
            recycle,
        }
    }
}

/// Lifecycle of the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Watching for the trigger.
    Armed,
    /// A question is on screen and the simulation is frozen.
    AwaitingAnswer,
    /// The answer was settled; the gate re-arms on the next tick.
    Resolved,
    /// No questions are left to ask.
    Exhausted,
}

/// Reasons an answer submission is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize)]
pub enum AnswerError {
    /// No question is waiting for an answer.
    #[error("no quiz question is awaiting an answer")]
    NotAwaitingAnswer,
    /// The chosen option does not exist on the question.
    #[error("option {option} is out of range for a question with {options} options")]
    OptionOutOfRange {
        /// Submitted option index.
        option: usize,
        /// Number of options the question offers.
        options: usize,
    },
    /// The session already concluded.
    #[error("session is over")]
    SessionOver,
}

/// Settled answer to a quiz question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuizResolution {
    /// Question that was answered.
    pub question: QuestionId,
    /// Whether the answer was correct.
    pub correct: bool,
    /// Effect the world must apply.
    pub effect: QuizEffect,
}

/// Stateful controller deciding when to ask which question.
#[derive(Debug)]
pub struct QuizGate {
    questions: Vec<Question>,
    order: Vec<usize>,
    cursor: usize,
    rng: ChaCha8Rng,
    config: Config,
    state: GateState,
    pending: Option<usize>,
    kills: u32,
}

impl QuizGate {
    /// Creates a gate over the provided question pool.
    ///
    /// An empty pool starts exhausted and never triggers.
    #[must_use]
    pub fn new(questions: Vec<Question>, config: Config) -> Self {
        let mut gate = Self {
            order: (0..questions.len()).collect(),
            state: if questions.is_empty() {
                GateState::Exhausted
            } else {
                GateState::Armed
            },
            questions,
            cursor: 0,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            pending: None,
            kills: 0,
        };
        gate.order.shuffle(&mut gate.rng);
        gate
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> GateState {
        self.state
    }

    /// Kills counted toward the next question.
    #[must_use]
    pub const fn kills_toward_next(&self) -> u32 {
        self.kills
    }

    /// Question currently awaiting an answer.
    #[must_use]
    pub fn pending_question(&self) -> Option<&Question> {
        self.pending.and_then(|index| self.questions.get(index))
    }

    /// Reports whether the gate is holding the simulation.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.state == GateState::AwaitingAnswer
    }

    /// Evaluates the trigger against one tick worth of events.
    ///
    /// Emits `QuizTriggered` plus `SimulationPaused` when a question is
    /// drawn, or `QuizPoolExhausted` once the pool runs dry.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Event>) {
        if self.state == GateState::Resolved {
            self.state = GateState::Armed;
        }
        if self.state != GateState::Armed {
            return;
        }

        let fired = match self.config.trigger {
            QuizTrigger::EveryKills { count } => {
                let killed = events
                    .iter()
                    .filter(|event| matches!(event, Event::EnemyKilled { .. }))
                    .count();
                self.kills = self
                    .kills
                    .saturating_add(u32::try_from(killed).unwrap_or(u32::MAX));
                if count > 0 && self.kills >= count {
                    self.kills -= count;
                    true
                } else {
                    false
                }
            }
            QuizTrigger::WaveCleared => events
                .iter()
                .any(|event| matches!(event, Event::WaveCleared { .. })),
        };

        if fired {
            self.trigger(out);
        }
    }

    /// Settles the pending question with the chosen option.
    pub fn submit(&mut self, option: usize) -> Result<QuizResolution, AnswerError> {
        let question = self.awaiting()?;
        if option >= question.options.len() {
            return Err(AnswerError::OptionOutOfRange {
                option,
                options: question.options.len(),
            });
        }
        let correct = question.is_correct(option);
        Ok(self.resolve(correct))
    }

    /// Settles the pending question as incorrect because its countdown ran out.
    pub fn expire(&mut self) -> Result<QuizResolution, AnswerError> {
        let _ = self.awaiting()?;
        Ok(self.resolve(false))
    }

    fn awaiting(&self) -> Result<&Question, AnswerError> {
        if self.state != GateState::AwaitingAnswer {
            return Err(AnswerError::NotAwaitingAnswer);
        }
        self.pending_question().ok_or(AnswerError::NotAwaitingAnswer)
    }

    fn resolve(&mut self, correct: bool) -> QuizResolution {
        let question = self
            .pending_question()
            .map_or(QuestionId::new(0), |question| question.id);
        self.pending = None;
        self.state = GateState::Resolved;
        log::info!(
            "quiz question {} answered {}",
            question.get(),
            if correct { "correctly" } else { "incorrectly" }
        );
        QuizResolution {
            question,
            correct,
            effect: self.config.effect,
        }
    }

    fn trigger(&mut self, out: &mut Vec<Event>) {
        let Some(index) = self.draw() else {
            log::info!("quiz pool exhausted");
            self.state = GateState::Exhausted;
            out.push(Event::QuizPoolExhausted);
            return;
        };
        let Some(question) = self.questions.get(index) else {
            return;
        };

        self.pending = Some(index);
        self.state = GateState::AwaitingAnswer;
        out.push(Event::QuizTriggered {
            question: question.id,
        });
        out.push(Event::SimulationPaused {
            reason: PauseReason::Quiz,
        });
    }

    fn draw(&mut self) -> Option<usize> {
        if self.cursor >= self.order.len() {
            if !self.config.recycle || self.order.is_empty() {
                return None;
            }
            self.order.shuffle(&mut self.rng);
            self.cursor = 0;
        }
        let index = self.order.get(self.cursor).copied();
        self.cursor += 1;
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_defence_core::{EnemyId, EnemyKind, TowerId};

    fn question(id: u32) -> Question {
        Question {
            id: QuestionId::new(id),
            prompt: format!("question {id}"),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_option_index: 1,
        }
    }

    fn kill() -> Event {
        Event::EnemyKilled {
            enemy: EnemyId::new(0),
            kind: EnemyKind::Scout,
            tower: TowerId::new(0),
            bounty: 5,
        }
    }

    fn gate(pool: usize, count: u32, recycle: bool) -> QuizGate {
        QuizGate::new(
            (0..pool).map(|id| question(id as u32)).collect(),
            Config::new(
                QuizTrigger::EveryKills { count },
                QuizEffect::default(),
                7,
                recycle,
            ),
        )
    }

    #[test]
    fn triggers_after_the_configured_kills() {
        let mut gate = gate(3, 2, false);
        let mut out = Vec::new();

        gate.handle(&[kill()], &mut out);
        assert!(out.is_empty());
        assert_eq!(gate.kills_toward_next(), 1);

        gate.handle(&[kill()], &mut out);
        assert_eq!(gate.state(), GateState::AwaitingAnswer);
        assert!(matches!(out[0], Event::QuizTriggered { .. }));
        assert_eq!(
            out[1],
            Event::SimulationPaused {
                reason: PauseReason::Quiz
            }
        );
    }

    #[test]
    fn leaks_do_not_count_toward_the_trigger() {
        let mut gate = gate(3, 1, false);
        let mut out = Vec::new();
        gate.handle(
            &[Event::EnemyLeaked {
                enemy: EnemyId::new(0),
                kind: EnemyKind::Grunt,
                lives_lost: 1,
            }],
            &mut out,
        );
        assert!(out.is_empty());
        assert_eq!(gate.state(), GateState::Armed);
    }

    #[test]
    fn answers_are_rejected_unless_awaiting() {
        let mut gate = gate(1, 1, false);
        assert_eq!(gate.submit(0), Err(AnswerError::NotAwaitingAnswer));
        assert_eq!(gate.expire(), Err(AnswerError::NotAwaitingAnswer));

        let mut out = Vec::new();
        gate.handle(&[kill()], &mut out);
        assert_eq!(
            gate.submit(3),
            Err(AnswerError::OptionOutOfRange {
                option: 3,
                options: 3
            })
        );
        assert_eq!(gate.state(), GateState::AwaitingAnswer);

        let resolution = gate.submit(1).expect("question awaiting");
        assert!(resolution.correct);
        assert_eq!(gate.state(), GateState::Resolved);
        assert_eq!(gate.submit(1), Err(AnswerError::NotAwaitingAnswer));

        gate.handle(&[], &mut out);
        assert_eq!(gate.state(), GateState::Armed);
    }

    #[test]
    fn expiry_counts_as_incorrect() {
        let mut gate = gate(1, 1, false);
        let mut out = Vec::new();
        gate.handle(&[kill()], &mut out);
        let resolution = gate.expire().expect("question awaiting");
        assert!(!resolution.correct);
    }

    #[test]
    fn questions_are_drawn_without_replacement_then_exhaust() {
        let mut gate = gate(3, 1, false);
        let mut asked = Vec::new();
        for _ in 0..3 {
            let mut out = Vec::new();
            gate.handle(&[kill()], &mut out);
            asked.push(gate.pending_question().expect("drawn").id);
            let _ = gate.submit(0).expect("awaiting");
            gate.handle(&[], &mut out);
        }
        asked.sort();
        assert_eq!(
            asked,
            vec![QuestionId::new(0), QuestionId::new(1), QuestionId::new(2)]
        );

        let mut out = Vec::new();
        gate.handle(&[kill()], &mut out);
        assert_eq!(out, vec![Event::QuizPoolExhausted]);
        assert_eq!(gate.state(), GateState::Exhausted);

        gate.handle(&[kill(), kill()], &mut out);
        assert_eq!(out.len(), 1, "exhausted gates stay silent");
    }

    #[test]
    fn recycling_pools_reshuffle() {
        let mut gate = gate(2, 1, true);
        for _ in 0..5 {
            let mut out = Vec::new();
            gate.handle(&[kill()], &mut out);
            assert_eq!(gate.state(), GateState::AwaitingAnswer);
            let _ = gate.expire().expect("awaiting");
        }
    }

    #[test]
    fn empty_pool_starts_exhausted() {
        let mut gate = gate(0, 1, true);
        let mut out = Vec::new();
        gate.handle(&[kill()], &mut out);
        assert_eq!(gate.state(), GateState::Exhausted);
        assert!(out.is_empty());
    }

    #[test]
    fn wave_cleared_trigger_ignores_kills() {
        let mut gate = QuizGate::new(
            vec![question(0)],
            Config::new(QuizTrigger::WaveCleared, QuizEffect::default(), 1, false),
        );
        let mut out = Vec::new();
        gate.handle(&[kill(), kill()], &mut out);
        assert!(out.is_empty());

        gate.handle(&[Event::WaveCleared { stage: 0, wave: 0 }], &mut out);
        assert_eq!(gate.state(), GateState::AwaitingAnswer);
    }

    #[test]
    fn same_seed_draws_the_same_order() {
        let order = |seed| {
            let mut gate = QuizGate::new(
                (0..8).map(question).collect(),
                Config::new(QuizTrigger::EveryKills { count: 1 }, QuizEffect::default(), seed, false),
            );
            let mut asked = Vec::new();
            for _ in 0..8 {
                let mut out = Vec::new();
                gate.handle(&[kill()], &mut out);
                asked.push(gate.pending_question().map(|question| question.id));
                let _ = gate.expire();
                gate.handle(&[], &mut out);
            }
            asked
        };
        assert_eq!(order(99), order(99));
    }
}
