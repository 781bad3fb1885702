//! Immutable stage and wave descriptors loaded at session start.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::EnemyKind;

/// One scheduled spawn within a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnEntry {
    /// Kind of enemy to spawn.
    pub kind: EnemyKind,
    /// Gap after the previous spawn of the wave (or after the wave opened).
    #[serde(rename = "delayMs", with = "crate::millis", default)]
    pub delay: Duration,
    /// Lane the enemy enters.
    #[serde(default)]
    pub lane: u32,
}

impl SpawnEntry {
    /// Creates an entry on lane zero.
    #[must_use]
    pub const fn new(kind: EnemyKind, delay: Duration) -> Self {
        Self {
            kind,
            delay,
            lane: 0,
        }
    }
}

/// Timed group of spawns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveDescriptor {
    /// Spawns in the order they happen.
    pub spawns: Vec<SpawnEntry>,
}

impl WaveDescriptor {
    /// Creates a wave from its spawn entries.
    #[must_use]
    pub fn new(spawns: Vec<SpawnEntry>) -> Self {
        Self { spawns }
    }
}

/// Ordered group of waves sharing a difficulty tier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDescriptor {
    /// Display name handed to the rendering collaborator.
    #[serde(default)]
    pub name: Option<String>,
    /// Waves in play order.
    pub waves: Vec<WaveDescriptor>,
}

impl StageDescriptor {
    /// Creates an unnamed stage from its waves.
    #[must_use]
    pub fn new(waves: Vec<WaveDescriptor>) -> Self {
        Self { name: None, waves }
    }
}
