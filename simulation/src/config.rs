//! Session bootstrap payload and tuning file.

use std::time::Duration;

use glam::Vec2;
use quiz_defence_core::{
    millis, EnemyCatalog, EnemyKind, Question, QuizEffect, QuizTrigger, StageDescriptor,
    TowerCatalog, TowerKind,
};
use quiz_defence_world::{Map, MapError, WorldConfig, DEFAULT_SELL_REFUND_PERCENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a session configuration is rejected before play starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The bootstrap payload is not valid JSON for a session.
    #[error("failed to parse session bootstrap: {0}")]
    Bootstrap(#[from] serde_json::Error),
    /// The tuning file is not valid TOML for a session.
    #[error("failed to parse tuning: {0}")]
    Tuning(#[from] toml::de::Error),
    /// A session needs at least one stage.
    #[error("session has no stages")]
    NoStages,
    /// A stage without waves would clear instantly.
    #[error("stage {stage} has no waves")]
    EmptyStage {
        /// Zero-based stage index.
        stage: usize,
    },
    /// A wave without spawns would clear instantly.
    #[error("stage {stage} wave {wave} has no spawns")]
    EmptyWave {
        /// Zero-based stage index.
        stage: usize,
        /// Zero-based wave index.
        wave: usize,
    },
    /// A spawn entry refers to a lane the map does not have.
    #[error("stage {stage} wave {wave} spawns on unknown lane {lane}")]
    UnknownLane {
        /// Zero-based stage index.
        stage: usize,
        /// Zero-based wave index.
        wave: usize,
        /// Lane index requested by the entry.
        lane: u32,
    },
    /// A question cannot be answered correctly.
    #[error("question {question} has no option at its correct index")]
    InvalidQuestion {
        /// Identifier of the question.
        question: u32,
    },
    /// The session would be lost before it starts.
    #[error("starting lives must be positive")]
    NoLives,
    /// The tick driver would never advance.
    #[error("timestep must be positive")]
    ZeroTimestep,
    /// Selling would mint gold.
    #[error("sell refund of {percent}% exceeds the investment")]
    RefundAboveInvestment {
        /// Configured refund percentage.
        percent: u32,
    },
    /// A tower kind has no buildable level.
    #[error("tower {kind:?} has no levels")]
    EmptyTowerProfile {
        /// Offending tower kind.
        kind: TowerKind,
    },
    /// An enemy would never reach the end of its lane.
    #[error("enemy {kind:?} needs a finite, positive speed")]
    InvalidEnemySpeed {
        /// Offending enemy kind.
        kind: EnemyKind,
    },
    /// An enemy would spawn dead.
    #[error("enemy {kind:?} has no health")]
    ZeroEnemyHealth {
        /// Offending enemy kind.
        kind: EnemyKind,
    },
    /// A slow would stop or speed up its target.
    #[error("tower {kind:?} level {level} slows by a factor outside 0..=1")]
    InvalidSlowFactor {
        /// Offending tower kind.
        kind: TowerKind,
        /// Zero-based level.
        level: usize,
    },
    /// A tower range must be a finite, non-negative distance.
    #[error("tower {kind:?} level {level} has an invalid range")]
    InvalidTowerRange {
        /// Offending tower kind.
        kind: TowerKind,
        /// Zero-based level.
        level: usize,
    },
    /// A kill-count trigger of zero never fires.
    #[error("quiz kill trigger must count at least one kill")]
    ZeroKillTrigger,
    /// The map geometry is invalid.
    #[error(transparent)]
    Map(#[from] MapError),
}

/// Payload the host supplies when a session starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bootstrap {
    /// Ordered stages to play.
    pub stages: Vec<StageDescriptor>,
    /// Question pool of the quiz gate.
    #[serde(default)]
    pub quiz_questions: Vec<Question>,
    /// Gold available at the start.
    pub starting_gold: u32,
    /// Lives available at the start.
    pub starting_lives: u32,
}

impl Bootstrap {
    /// Parses a bootstrap payload from JSON.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Grid and lane layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapTuning {
    /// Number of grid columns.
    pub columns: u32,
    /// Number of grid rows.
    pub rows: u32,
    /// Side length of a cell in world units.
    pub cell_size: f32,
    /// Waypoint polylines, one per lane.
    pub lanes: Vec<Vec<Vec2>>,
}

impl Default for MapTuning {
    fn default() -> Self {
        Self {
            columns: 16,
            rows: 9,
            cell_size: 50.0,
            lanes: vec![vec![
                Vec2::new(0.0, 75.0),
                Vec2::new(375.0, 75.0),
                Vec2::new(375.0, 375.0),
                Vec2::new(800.0, 375.0),
            ]],
        }
    }
}

/// Quiz gate behaviour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizTuning {
    /// Condition that surfaces a question.
    pub trigger: QuizTrigger,
    /// Consequence of the answer.
    pub effect: QuizEffect,
    /// Seed of the question shuffle.
    pub seed: u64,
    /// Reshuffle the pool once every question was asked.
    pub recycle: bool,
}

/// Balance and timing knobs, all optional in the tuning file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Length of one simulation tick.
    #[serde(rename = "timestep_ms", with = "millis")]
    pub timestep: Duration,
    /// Pause before the first wave.
    #[serde(rename = "opening_delay_ms", with = "millis")]
    pub opening_delay: Duration,
    /// Pause between waves and between stages.
    #[serde(rename = "between_waves_ms", with = "millis")]
    pub between_waves: Duration,
    /// Share of the investment refunded when a tower is sold.
    pub sell_refund_percent: u32,
    /// Grid and lanes.
    pub map: MapTuning,
    /// Tower stats.
    pub towers: TowerCatalog,
    /// Enemy stats.
    pub enemies: EnemyCatalog,
    /// Quiz gate behaviour.
    pub quiz: QuizTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            timestep: Duration::from_millis(20),
            opening_delay: Duration::from_secs(2),
            between_waves: Duration::from_secs(3),
            sell_refund_percent: DEFAULT_SELL_REFUND_PERCENT,
            map: MapTuning::default(),
            towers: TowerCatalog::default(),
            enemies: EnemyCatalog::default(),
            quiz: QuizTuning::default(),
        }
    }
}

impl Tuning {
    /// Parses a tuning file; omitted keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

/// Everything required to start a session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    /// Host-supplied payload.
    pub bootstrap: Bootstrap,
    /// Balance and timing.
    pub tuning: Tuning,
}

impl SessionConfig {
    /// Creates a configuration with default tuning.
    #[must_use]
    pub fn new(bootstrap: Bootstrap) -> Self {
        Self {
            bootstrap,
            tuning: Tuning::default(),
        }
    }

    /// Replaces the tuning.
    #[must_use]
    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Validates the configuration and derives the world parameters.
    pub(crate) fn world_config(&self) -> Result<WorldConfig, ConfigError> {
        let tuning = &self.tuning;
        if tuning.timestep.is_zero() {
            return Err(ConfigError::ZeroTimestep);
        }
        if tuning.sell_refund_percent > 100 {
            return Err(ConfigError::RefundAboveInvestment {
                percent: tuning.sell_refund_percent,
            });
        }
        if let Some(kind) = TowerKind::ALL
            .into_iter()
            .find(|kind| tuning.towers.profile(*kind).levels.is_empty())
        {
            return Err(ConfigError::EmptyTowerProfile { kind });
        }
        if self.bootstrap.starting_lives == 0 {
            return Err(ConfigError::NoLives);
        }
        if tuning.quiz.trigger == (QuizTrigger::EveryKills { count: 0 }) {
            return Err(ConfigError::ZeroKillTrigger);
        }
        validate_catalogs(&tuning.towers, &tuning.enemies)?;

        let map = Map::from_waypoints(
            tuning.map.columns,
            tuning.map.rows,
            tuning.map.cell_size,
            tuning.map.lanes.clone(),
        )?;
        self.validate_stages(&map)?;
        self.validate_questions()?;

        Ok(WorldConfig {
            map,
            towers: tuning.towers.clone(),
            enemies: tuning.enemies.clone(),
            starting_gold: self.bootstrap.starting_gold,
            starting_lives: self.bootstrap.starting_lives,
            sell_refund_percent: tuning.sell_refund_percent,
        })
    }

    fn validate_stages(&self, map: &Map) -> Result<(), ConfigError> {
        if self.bootstrap.stages.is_empty() {
            return Err(ConfigError::NoStages);
        }
        for (stage, descriptor) in self.bootstrap.stages.iter().enumerate() {
            if descriptor.waves.is_empty() {
                return Err(ConfigError::EmptyStage { stage });
            }
            for (wave, wave_descriptor) in descriptor.waves.iter().enumerate() {
                if wave_descriptor.spawns.is_empty() {
                    return Err(ConfigError::EmptyWave { stage, wave });
                }
                if let Some(entry) = wave_descriptor
                    .spawns
                    .iter()
                    .find(|entry| map.lane(entry.lane).is_none())
                {
                    return Err(ConfigError::UnknownLane {
                        stage,
                        wave,
                        lane: entry.lane,
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_questions(&self) -> Result<(), ConfigError> {
        match self
            .bootstrap
            .quiz_questions
            .iter()
            .find(|question| question.correct_option_index >= question.options.len())
        {
            Some(question) => Err(ConfigError::InvalidQuestion {
                question: question.id.get(),
            }),
            None => Ok(()),
        }
    }
}

fn validate_catalogs(towers: &TowerCatalog, enemies: &EnemyCatalog) -> Result<(), ConfigError> {
    for kind in EnemyKind::ALL {
        let stats = enemies.stats(kind);
        if !stats.speed.is_finite() || stats.speed <= 0.0 {
            return Err(ConfigError::InvalidEnemySpeed { kind });
        }
        if stats.health == 0 {
            return Err(ConfigError::ZeroEnemyHealth { kind });
        }
    }

    for kind in TowerKind::ALL {
        for (level, stats) in towers.profile(kind).levels.iter().enumerate() {
            if !stats.range.is_finite() || stats.range < 0.0 {
                return Err(ConfigError::InvalidTowerRange { kind, level });
            }
            if let Some(slow) = stats.slow {
                if !(0.0..=1.0).contains(&slow.factor) {
                    return Err(ConfigError::InvalidSlowFactor { kind, level });
                }
            }
        }
    }
    Ok(())
}
