#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduler that walks the stage descriptors and emits
//! spawn commands as their delays elapse.

use std::time::Duration;

use quiz_defence_core::{Command, Event, GameOver, SpawnEntry, StageDescriptor};
use serde::Serialize;

/// Configuration parameters required to construct the wave scheduler.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    opening_delay: Duration,
    between_waves: Duration,
}

impl Config {
    /// Creates a configuration from the pause before the first wave and the
    /// pause separating consecutive waves.
    #[must_use]
    pub const fn new(opening_delay: Duration, between_waves: Duration) -> Self {
        Self {
            opening_delay,
            between_waves,
        }
    }
}

/// Phase the scheduler is resting in between two ticks.
///
/// Clearing a wave is instantaneous: it is announced through
/// [`Event::WaveCleared`] and the scheduler moves straight on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for the opening delay before the first wave.
    Idle,
    /// Emitting the spawn entries of the current wave or waiting for its
    /// enemies to be resolved.
    Spawning,
    /// Pausing before the next wave of the same stage.
    BetweenWaves,
    /// Pausing after a cleared stage before the next stage begins.
    StageCleared,
    /// Every stage has been cleared.
    AllStagesCleared,
    /// The session was lost.
    Defeat,
}

/// Pure system that turns stage descriptors into wave and spawn commands.
#[derive(Debug)]
pub struct WaveScheduler {
    stages: Vec<StageDescriptor>,
    config: Config,
    phase: Phase,
    stage: usize,
    wave: usize,
    next_entry: usize,
    timer: Duration,
}

impl WaveScheduler {
    /// Creates a scheduler positioned before the first wave of the first stage.
    #[must_use]
    pub fn new(stages: Vec<StageDescriptor>, config: Config) -> Self {
        Self {
            stages,
            config,
            phase: Phase::Idle,
            stage: 0,
            wave: 0,
            next_entry: 0,
            timer: Duration::ZERO,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Reports whether the scheduler reached a terminal phase.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::AllStagesCleared | Phase::Defeat)
    }

    /// Consumes the tick's events and the live enemy count, emitting wave and
    /// spawn commands plus progression announcements.
    ///
    /// `enemy_count` must reflect the world after movement and combat of the
    /// previous tick; a wave only clears once every entry was spawned and no
    /// enemy remains.
    pub fn handle(
        &mut self,
        events: &[Event],
        enemy_count: usize,
        out: &mut Vec<Command>,
        announcements: &mut Vec<Event>,
    ) {
        if events.iter().any(|event| {
            matches!(
                event,
                Event::GameOver(GameOver {
                    victory: false,
                    ..
                })
            )
        }) {
            self.phase = Phase::Defeat;
            return;
        }

        if self.is_finished() {
            return;
        }

        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                self.timer = self.timer.saturating_add(*dt);
            }
        }

        loop {
            match self.phase {
                Phase::Idle => {
                    if !self.wait(self.config.opening_delay) {
                        return;
                    }
                    self.begin_wave(out);
                }
                Phase::BetweenWaves | Phase::StageCleared => {
                    if !self.wait(self.config.between_waves) {
                        return;
                    }
                    self.begin_wave(out);
                }
                Phase::Spawning => {
                    let spawned = self.spawn_due_entries(out);
                    if spawned || !self.all_spawned() || enemy_count > 0 {
                        return;
                    }
                    self.clear_wave(announcements);
                }
                Phase::AllStagesCleared | Phase::Defeat => return,
            }
        }
    }

    fn wait(&mut self, delay: Duration) -> bool {
        if self.timer < delay {
            return false;
        }
        self.timer -= delay;
        true
    }

    fn begin_wave(&mut self, out: &mut Vec<Command>) {
        self.phase = Phase::Spawning;
        self.next_entry = 0;
        out.push(Command::BeginWave {
            stage: index_u32(self.stage),
            wave: index_u32(self.wave),
        });
    }

    fn current_entries(&self) -> &[SpawnEntry] {
        self.stages
            .get(self.stage)
            .and_then(|stage| stage.waves.get(self.wave))
            .map(|wave| wave.spawns.as_slice())
            .unwrap_or_default()
    }

    fn all_spawned(&self) -> bool {
        self.next_entry >= self.current_entries().len()
    }

    fn spawn_due_entries(&mut self, out: &mut Vec<Command>) -> bool {
        let mut spawned = false;
        while let Some(entry) = self.current_entries().get(self.next_entry).copied() {
            if self.timer < entry.delay {
                break;
            }
            self.timer -= entry.delay;
            self.next_entry += 1;
            spawned = true;
            out.push(Command::SpawnEnemy {
                kind: entry.kind,
                lane: entry.lane,
            });
        }
        if self.all_spawned() {
            self.timer = Duration::ZERO;
        }
        spawned
    }

    fn clear_wave(&mut self, announcements: &mut Vec<Event>) {
        let stage = index_u32(self.stage);
        announcements.push(Event::WaveCleared {
            stage,
            wave: index_u32(self.wave),
        });
        self.timer = Duration::ZERO;

        let waves_in_stage = self
            .stages
            .get(self.stage)
            .map_or(0, |descriptor| descriptor.waves.len());
        if self.wave + 1 < waves_in_stage {
            self.wave += 1;
            self.phase = Phase::BetweenWaves;
            return;
        }

        log::info!("stage {} cleared", self.stage + 1);
        announcements.push(Event::StageCleared { stage });
        if self.stage + 1 < self.stages.len() {
            self.stage += 1;
            self.wave = 0;
            self.phase = Phase::StageCleared;
            return;
        }

        log::info!("all stages cleared");
        announcements.push(Event::AllStagesCleared);
        self.phase = Phase::AllStagesCleared;
    }
}

fn index_u32(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_defence_core::{EnemyKind, WaveDescriptor};

    fn tick(ms: u64) -> Event {
        Event::TimeAdvanced {
            dt: Duration::from_millis(ms),
        }
    }

    fn single_wave(delays: &[u64]) -> Vec<StageDescriptor> {
        vec![StageDescriptor::new(vec![WaveDescriptor::new(
            delays
                .iter()
                .map(|ms| SpawnEntry::new(EnemyKind::Grunt, Duration::from_millis(*ms)))
                .collect(),
        )])]
    }

    #[test]
    fn waits_for_the_opening_delay() {
        let mut scheduler = WaveScheduler::new(
            single_wave(&[0]),
            Config::new(Duration::from_secs(1), Duration::ZERO),
        );
        let mut commands = Vec::new();
        let mut announcements = Vec::new();

        scheduler.handle(&[tick(600)], 0, &mut commands, &mut announcements);
        assert!(commands.is_empty());
        assert_eq!(scheduler.phase(), Phase::Idle);

        scheduler.handle(&[tick(400)], 0, &mut commands, &mut announcements);
        assert_eq!(
            commands,
            vec![
                Command::BeginWave { stage: 0, wave: 0 },
                Command::SpawnEnemy {
                    kind: EnemyKind::Grunt,
                    lane: 0
                },
            ]
        );
        assert_eq!(scheduler.phase(), Phase::Spawning);
    }

    #[test]
    fn wave_waits_for_live_enemies_before_clearing() {
        let mut scheduler =
            WaveScheduler::new(single_wave(&[0]), Config::new(Duration::ZERO, Duration::ZERO));
        let mut commands = Vec::new();
        let mut announcements = Vec::new();

        scheduler.handle(&[tick(20)], 0, &mut commands, &mut announcements);
        assert!(announcements.is_empty(), "spawns of this tick are pending");

        scheduler.handle(&[tick(20)], 1, &mut commands, &mut announcements);
        assert!(announcements.is_empty(), "an enemy is still alive");

        scheduler.handle(&[tick(20)], 0, &mut commands, &mut announcements);
        assert_eq!(
            announcements,
            vec![
                Event::WaveCleared { stage: 0, wave: 0 },
                Event::StageCleared { stage: 0 },
                Event::AllStagesCleared,
            ]
        );
        assert!(scheduler.is_finished());
    }

    #[test]
    fn game_over_is_terminal() {
        let mut scheduler =
            WaveScheduler::new(single_wave(&[0, 0]), Config::new(Duration::ZERO, Duration::ZERO));
        let mut commands = Vec::new();
        let mut announcements = Vec::new();

        scheduler.handle(
            &[Event::GameOver(GameOver {
                victory: false,
                stage: 1,
                wave: 1,
                score: 0,
                stars: 0,
            })],
            0,
            &mut commands,
            &mut announcements,
        );
        scheduler.handle(&[tick(1_000)], 0, &mut commands, &mut announcements);

        assert_eq!(scheduler.phase(), Phase::Defeat);
        assert!(commands.is_empty());
        assert!(announcements.is_empty());
    }
}
