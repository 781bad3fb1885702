#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that walks enemies along their lanes.

use std::time::Duration;

use quiz_defence_core::{Command, EnemyView, Event};

/// Pure system that reacts to elapsed time and emits lane advancement commands.
#[derive(Debug, Default)]
pub struct Movement;

impl Movement {
    /// Creates a new movement system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Consumes world events and the enemy snapshot to emit movement commands.
    ///
    /// Each enemy advances by its slowed speed multiplied by the time advanced
    /// in `events`; the world decides whether the step reaches the lane end.
    pub fn handle(&mut self, events: &[Event], enemies: &EnemyView, out: &mut Vec<Command>) {
        let elapsed = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt } => Some(*dt),
                _ => None,
            })
            .fold(Duration::ZERO, Duration::saturating_add);

        if elapsed.is_zero() || enemies.is_empty() {
            return;
        }

        let seconds = elapsed.as_secs_f32();
        for enemy in enemies.iter() {
            let distance = enemy.effective_speed() * seconds;
            if distance > 0.0 {
                out.push(Command::AdvanceEnemy {
                    enemy: enemy.id,
                    distance,
                });
            }
        }
    }
}
