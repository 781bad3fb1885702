#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick driver of the Quiz Defence simulation.
//!
//! A [`Session`] owns the authoritative world plus every pure system and runs
//! them in a fixed order each timestep: world clock, wave scheduler, movement,
//! targeting and combat, terminal checks, then the quiz gate. Hosts feed it
//! wall-clock time through [`Session::advance`], submit player commands, and
//! read [`Session::snapshot`] or drain the typed event stream.

mod config;
mod session;

pub use config::{Bootstrap, ConfigError, MapTuning, QuizTuning, SessionConfig, Tuning};
pub use quiz_defence_system_quiz_gate::{AnswerError, GateState};
pub use quiz_defence_system_wave_scheduler::Phase;
pub use session::{Session, SessionSnapshot};
