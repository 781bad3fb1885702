//! Fixed-timestep tick driver coordinating the world and the pure systems.

use std::time::Duration;

use quiz_defence_core::{
    CellCoord, Command, EnemySnapshot, Event, GameOver, PauseReason, PlacementError, Question,
    SellError, TargetingRule, TowerId, TowerKind, TowerSnapshot, UpgradeError,
};
use quiz_defence_system_movement::Movement;
use quiz_defence_system_quiz_gate::{
    self as quiz_gate, AnswerError, GateState, QuizGate, QuizResolution,
};
use quiz_defence_system_tower_combat::TowerCombat;
use quiz_defence_system_tower_targeting::TowerTargeting;
use quiz_defence_system_wave_scheduler::{self as wave_scheduler, Phase, WaveScheduler};
use quiz_defence_world::{self as world, query, World};
use serde::Serialize;

use crate::config::{ConfigError, SessionConfig};

/// Read-only copy of the session state handed to renderers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Current gold balance.
    pub gold: u32,
    /// Remaining lives.
    pub lives: u32,
    /// Accumulated score.
    pub score: u64,
    /// Zero-based index of the stage most recently opened.
    pub stage: u32,
    /// Zero-based index of the wave most recently opened.
    pub wave: u32,
    /// Phase of the wave scheduler.
    pub phase: Phase,
    /// Lifecycle state of the quiz gate.
    pub quiz: GateState,
    /// Kills already counted toward the next kill-triggered question.
    pub quiz_kills: u32,
    /// Whether the host paused the session.
    pub paused: bool,
    /// Whether ticks are currently applied.
    pub advancing: bool,
    /// Simulated time elapsed.
    pub elapsed: Duration,
    /// Live enemies in identifier order.
    pub enemies: Vec<EnemySnapshot>,
    /// Towers in identifier order.
    pub towers: Vec<TowerSnapshot>,
    /// Terminal result, once concluded.
    pub outcome: Option<GameOver>,
}

/// One playable tower-defence session.
///
/// All mutation happens through `&mut self`, so ticking and answering can
/// never interleave.
#[derive(Debug)]
pub struct Session {
    world: World,
    scheduler: WaveScheduler,
    movement: Movement,
    targeting: TowerTargeting,
    combat: TowerCombat,
    gate: QuizGate,
    timestep: Duration,
    accumulator: Duration,
    host_paused: bool,
    events: Vec<Event>,
    commands: Vec<Command>,
}

impl Session {
    /// Validates the configuration and prepares the first stage.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        let world_config = config.world_config()?;
        let SessionConfig { bootstrap, tuning } = config;

        let scheduler = WaveScheduler::new(
            bootstrap.stages,
            wave_scheduler::Config::new(tuning.opening_delay, tuning.between_waves),
        );
        let gate = QuizGate::new(
            bootstrap.quiz_questions,
            quiz_gate::Config::new(
                tuning.quiz.trigger,
                tuning.quiz.effect,
                tuning.quiz.seed,
                tuning.quiz.recycle,
            ),
        );

        log::info!(
            "session created: {} gold, {} lives, {}ms timestep",
            world_config.starting_gold,
            world_config.starting_lives,
            tuning.timestep.as_millis()
        );

        Ok(Self {
            world: World::new(world_config),
            scheduler,
            movement: Movement::new(),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            gate,
            timestep: tuning.timestep,
            accumulator: Duration::ZERO,
            host_paused: false,
            events: Vec::new(),
            commands: Vec::new(),
        })
    }

    /// Length of one tick.
    #[must_use]
    pub const fn timestep(&self) -> Duration {
        self.timestep
    }

    /// Reports whether ticks are applied: not concluded, not paused by the
    /// host, and no quiz question awaiting an answer.
    #[must_use]
    pub fn is_advancing(&self) -> bool {
        self.outcome().is_none() && !self.host_paused && !self.gate.is_blocking()
    }

    /// Terminal result, once the session concluded.
    #[must_use]
    pub fn outcome(&self) -> Option<GameOver> {
        query::outcome(&self.world)
    }

    /// Question currently awaiting an answer.
    #[must_use]
    pub fn pending_question(&self) -> Option<&Question> {
        self.gate.pending_question()
    }

    /// Takes every event produced since the previous call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Feeds wall-clock time into the fixed-timestep accumulator.
    ///
    /// Whole timesteps are simulated; the remainder carries over to the next
    /// call. Time passed while the session is not advancing is discarded.
    pub fn advance(&mut self, dt: Duration) {
        if !self.is_advancing() {
            self.accumulator = Duration::ZERO;
            return;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        while self.accumulator >= self.timestep {
            self.accumulator -= self.timestep;
            self.tick();
            if !self.is_advancing() {
                self.accumulator = Duration::ZERO;
                break;
            }
        }
    }

    /// Simulates exactly one timestep if the session is advancing.
    pub fn step(&mut self) {
        if self.is_advancing() {
            self.tick();
        }
    }

    /// Builds a tower, spending its cost.
    pub fn place_tower(
        &mut self,
        kind: TowerKind,
        cell: CellCoord,
    ) -> Result<TowerId, PlacementError> {
        let start = self.events.len();
        self.apply(Command::PlaceTower { kind, cell });
        self.events[start..]
            .iter()
            .find_map(|event| match event {
                Event::TowerPlaced { tower, .. } => Some(Ok(*tower)),
                Event::TowerPlacementRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(PlacementError::SessionOver))
    }

    /// Raises a tower one level and returns the new level.
    pub fn upgrade_tower(&mut self, tower: TowerId) -> Result<u32, UpgradeError> {
        let start = self.events.len();
        self.apply(Command::UpgradeTower { tower });
        self.events[start..]
            .iter()
            .find_map(|event| match event {
                Event::TowerUpgraded { level, .. } => Some(Ok(*level)),
                Event::TowerUpgradeRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(UpgradeError::SessionOver))
    }

    /// Sells a tower and returns the refunded gold.
    pub fn sell_tower(&mut self, tower: TowerId) -> Result<u32, SellError> {
        let start = self.events.len();
        self.apply(Command::SellTower { tower });
        self.events[start..]
            .iter()
            .find_map(|event| match event {
                Event::TowerSold { refund, .. } => Some(Ok(*refund)),
                Event::TowerSaleRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(SellError::SessionOver))
    }

    /// Changes the targeting rule of a tower. Returns `false` when the tower
    /// does not exist.
    pub fn set_targeting(&mut self, tower: TowerId, rule: TargetingRule) -> bool {
        let start = self.events.len();
        self.apply(Command::SetTargeting { tower, rule });
        let changed = self.events.len() > start;
        if !changed {
            log::warn!("cannot retarget unknown tower {}", tower.get());
        }
        changed
    }

    /// Answers the pending quiz question and returns whether it was correct.
    pub fn submit_answer(&mut self, option: usize) -> Result<bool, AnswerError> {
        if self.outcome().is_some() {
            log::warn!("answer submitted after the session concluded");
            return Err(AnswerError::SessionOver);
        }
        let resolution = self.gate.submit(option).map_err(|error| {
            log::warn!("answer rejected: {error}");
            error
        })?;
        self.settle(resolution);
        Ok(resolution.correct)
    }

    /// Settles the pending question as incorrect because the host countdown
    /// ran out.
    pub fn expire_question(&mut self) -> Result<(), AnswerError> {
        if self.outcome().is_some() {
            return Err(AnswerError::SessionOver);
        }
        let resolution = self.gate.expire().map_err(|error| {
            log::warn!("expiry rejected: {error}");
            error
        })?;
        self.settle(resolution);
        Ok(())
    }

    /// Suspends ticking on behalf of the host. Returns `false` if the
    /// session was already paused or concluded.
    pub fn pause(&mut self) -> bool {
        if self.host_paused || self.outcome().is_some() {
            return false;
        }
        self.host_paused = true;
        self.accumulator = Duration::ZERO;
        self.events.push(Event::SimulationPaused {
            reason: PauseReason::Host,
        });
        true
    }

    /// Lifts a host pause. Returns `false` if the host had not paused.
    pub fn resume(&mut self) -> bool {
        if !self.host_paused || self.outcome().is_some() {
            return false;
        }
        self.host_paused = false;
        self.events.push(Event::SimulationResumed {
            reason: PauseReason::Host,
        });
        true
    }

    /// Captures a read-only copy of the session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let economy = query::economy(&self.world);
        let progress = query::progress(&self.world);
        SessionSnapshot {
            gold: economy.gold(),
            lives: economy.lives(),
            score: economy.score(),
            stage: progress.stage,
            wave: progress.wave,
            phase: self.scheduler.phase(),
            quiz: self.gate.state(),
            quiz_kills: self.gate.kills_toward_next(),
            paused: self.host_paused,
            advancing: self.is_advancing(),
            elapsed: query::elapsed(&self.world),
            enemies: query::enemy_view(&self.world).into_vec(),
            towers: query::tower_view(&self.world).into_vec(),
            outcome: self.outcome(),
        }
    }

    fn apply(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.events);
    }

    fn settle(&mut self, resolution: QuizResolution) {
        self.events.push(Event::QuizResolved {
            question: resolution.question,
            correct: resolution.correct,
        });
        let start = self.events.len();
        self.apply(Command::ApplyQuizEffect {
            correct: resolution.correct,
            effect: resolution.effect,
        });
        if self.outcome().is_none() {
            if self.is_advancing() {
                self.events.push(Event::SimulationResumed {
                    reason: PauseReason::Quiz,
                });
            }
            return;
        }

        // A wrong answer took the last life; the scheduler still has to see it.
        let mut ignored = Vec::new();
        self.scheduler
            .handle(&self.events[start..], 0, &mut self.commands, &mut ignored);
        self.commands.clear();
    }

    fn tick(&mut self) {
        let mut tick_events = Vec::new();
        world::apply(
            &mut self.world,
            Command::Tick { dt: self.timestep },
            &mut tick_events,
        );

        let mut announcements = Vec::new();
        self.scheduler.handle(
            &tick_events,
            query::enemy_count(&self.world),
            &mut self.commands,
            &mut announcements,
        );
        tick_events.extend(announcements);
        self.flush_commands(&mut tick_events);

        let enemies = query::enemy_view(&self.world);
        self.movement.handle(&tick_events, &enemies, &mut self.commands);
        self.flush_commands(&mut tick_events);

        self.resolve_towers(&mut tick_events);

        if self.outcome().is_none()
            && tick_events
                .iter()
                .any(|event| matches!(event, Event::AllStagesCleared))
        {
            world::apply(
                &mut self.world,
                Command::Conclude { victory: true },
                &mut tick_events,
            );
        }

        if self.outcome().is_some() {
            let mut ignored = Vec::new();
            self.scheduler
                .handle(&tick_events, 0, &mut self.commands, &mut ignored);
            self.commands.clear();
        } else {
            let mut gate_events = Vec::new();
            self.gate.handle(&tick_events, &mut gate_events);
            tick_events.extend(gate_events);
        }

        self.events.extend(tick_events);
    }

    /// Fires every ready tower in identifier order, re-reading the roster
    /// after each shot that changed it.
    fn resolve_towers(&mut self, events: &mut Vec<Event>) {
        let towers = query::tower_view(&self.world);
        let mut enemies = query::enemy_view(&self.world);

        for tower in towers.iter() {
            if enemies.is_empty() {
                break;
            }
            if !tower.ready_in.is_zero() {
                continue;
            }
            let Some(target) = self.targeting.select(tower, &enemies) else {
                continue;
            };

            self.combat.handle(&towers, &[target], &mut self.commands);
            let before = events.len();
            self.flush_commands(events);
            if events.len() > before {
                enemies = query::enemy_view(&self.world);
            }
        }
    }

    fn flush_commands(&mut self, events: &mut Vec<Event>) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, events);
        }
    }
}
