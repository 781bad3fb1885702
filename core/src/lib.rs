#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Quiz Defence simulation.
//!
//! This crate defines the message surface that connects the tick driver, the
//! authoritative world, and pure systems. The driver submits [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems
//! and external observers to react to deterministically. Systems consume
//! event streams, query immutable snapshots, and respond exclusively with new
//! command batches.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod catalog;
mod quiz;
mod stage;

pub use catalog::{
    EnemyCatalog, EnemyKind, EnemyStats, SlowEffect, TargetingRule, TowerCatalog, TowerKind,
    TowerLevel, TowerProfile,
};
pub use quiz::{Question, QuestionId, QuizEffect, QuizTrigger};
pub use stage::{SpawnEntry, StageDescriptor, WaveDescriptor};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Announces that the scheduler opened a new wave.
    BeginWave {
        /// Zero-based stage index.
        stage: u32,
        /// Zero-based wave index within the stage.
        wave: u32,
    },
    /// Requests that a new enemy enter the provided lane.
    SpawnEnemy {
        /// Kind of enemy to create.
        kind: EnemyKind,
        /// Index of the lane the enemy follows.
        lane: u32,
    },
    /// Moves an enemy forward along its lane.
    AdvanceEnemy {
        /// Identifier of the enemy that moves.
        enemy: EnemyId,
        /// Distance in world units to travel.
        distance: f32,
    },
    /// Orders a tower to strike its chosen target.
    FireTower {
        /// Tower that fires.
        tower: TowerId,
        /// Enemy receiving the hit.
        target: EnemyId,
    },
    /// Requests placement of a tower on the provided cell.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Grid cell that hosts the tower.
        cell: CellCoord,
    },
    /// Requests that an existing tower advance to its next level.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Requests that an existing tower be sold for a partial refund.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
    /// Overrides the targeting rule used by a tower.
    SetTargeting {
        /// Identifier of the tower to reconfigure.
        tower: TowerId,
        /// Rule the tower should use from now on.
        rule: TargetingRule,
    },
    /// Applies the economic consequence of an answered quiz question.
    ApplyQuizEffect {
        /// Whether the submitted answer was correct.
        correct: bool,
        /// Effect bound to the quiz gate.
        effect: QuizEffect,
    },
    /// Ends the session with the provided result. Ignored once concluded.
    Conclude {
        /// Whether the player won.
        victory: bool,
    },
}

/// Events broadcast by the world and the tick driver after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a wave began spawning.
    WaveStarted {
        /// Zero-based stage index.
        stage: u32,
        /// Zero-based wave index within the stage.
        wave: u32,
    },
    /// Confirms that an enemy entered a lane.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Kind of the spawned enemy.
        kind: EnemyKind,
        /// Lane followed by the enemy.
        lane: u32,
    },
    /// Reports that a tower hit an enemy that survived.
    EnemyDamaged {
        /// Enemy that took damage.
        enemy: EnemyId,
        /// Tower that dealt the damage.
        tower: TowerId,
        /// Damage dealt by the hit.
        damage: u32,
        /// Health left after the hit.
        remaining: u32,
    },
    /// Reports that an enemy was destroyed by a tower.
    EnemyKilled {
        /// Enemy that died.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Tower that landed the final hit.
        tower: TowerId,
        /// Gold rewarded for the kill.
        bounty: u32,
    },
    /// Reports that an enemy reached the end of its lane alive.
    EnemyLeaked {
        /// Enemy that leaked.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Lives removed by the leak.
        lives_lost: u32,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Cell occupied by the tower.
        cell: CellCoord,
        /// Gold deducted for construction.
        cost: u32,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested for placement.
        kind: TowerKind,
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower advanced a level.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Level reached after the upgrade.
        level: u32,
        /// Gold deducted for the upgrade.
        cost: u32,
    },
    /// Reports that an upgrade request was rejected.
    TowerUpgradeRejected {
        /// Identifier of the tower targeted by the request.
        tower: TowerId,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Confirms that a tower was sold and removed.
    TowerSold {
        /// Identifier of the removed tower.
        tower: TowerId,
        /// Cell freed by the sale.
        cell: CellCoord,
        /// Gold refunded to the player.
        refund: u32,
    },
    /// Reports that a sell request was rejected.
    TowerSaleRejected {
        /// Identifier of the tower targeted by the request.
        tower: TowerId,
        /// Specific reason the sale failed.
        reason: SellError,
    },
    /// Confirms that a tower switched targeting rule.
    TargetingChanged {
        /// Identifier of the reconfigured tower.
        tower: TowerId,
        /// Rule now in effect.
        rule: TargetingRule,
    },
    /// Reports that every enemy of a wave was spawned and removed.
    WaveCleared {
        /// Zero-based stage index.
        stage: u32,
        /// Zero-based wave index within the stage.
        wave: u32,
    },
    /// Reports that the last wave of a stage was cleared.
    StageCleared {
        /// Zero-based stage index.
        stage: u32,
    },
    /// Reports that the final stage was cleared.
    AllStagesCleared,
    /// Announces that a quiz question is waiting for an answer.
    QuizTriggered {
        /// Question surfaced to the player.
        question: QuestionId,
    },
    /// Reports how a quiz question was answered.
    QuizResolved {
        /// Question that was answered.
        question: QuestionId,
        /// Whether the answer was correct.
        correct: bool,
    },
    /// Reports that no question was available for a trigger.
    QuizPoolExhausted,
    /// Reports the economic result of an applied quiz effect.
    QuizEffectApplied {
        /// Gold added by a correct answer.
        gold_gained: u32,
        /// Gold removed by an incorrect answer.
        gold_lost: u32,
        /// Lives removed by an incorrect answer.
        lives_lost: u32,
    },
    /// Announces that the simulation stopped advancing.
    SimulationPaused {
        /// Cause of the pause.
        reason: PauseReason,
    },
    /// Announces that the simulation advances again.
    SimulationResumed {
        /// Cause of the pause that ended.
        reason: PauseReason,
    },
    /// Terminal result of the session. Emitted exactly once.
    GameOver(GameOver),
}

/// Cause of a simulation pause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PauseReason {
    /// The host requested the pause.
    Host,
    /// A quiz gate is waiting for an answer.
    Quiz,
}

/// Final result of a session handed to the persistence collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameOver {
    /// Whether the player cleared every stage.
    pub victory: bool,
    /// One-based number of the stage reached.
    pub stage: u32,
    /// One-based number of the wave reached within the stage.
    pub wave: u32,
    /// Final score.
    pub score: u64,
    /// Star rating between zero and three.
    pub stars: u8,
}

impl GameOver {
    /// Rates a finished session from the lives that survived.
    ///
    /// Defeats earn no stars. A flawless victory earns three, keeping at least
    /// half of the starting lives earns two, and any other victory earns one.
    #[must_use]
    pub fn star_rating(victory: bool, lives: u32, starting_lives: u32) -> u8 {
        if !victory {
            return 0;
        }
        if lives >= starting_lives {
            3
        } else if u64::from(lives) * 2 >= u64::from(starting_lives) {
            2
        } else {
            1
        }
    }
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
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

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// World-space centre of the cell for the provided cell size.
    #[must_use]
    pub fn center(self, cell_size: f32) -> Vec2 {
        Vec2::new(
            (self.column as f32 + 0.5) * cell_size,
            (self.row as f32 + 0.5) * cell_size,
        )
    }
}

/// Slow effect currently applied to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ActiveSlow {
    /// Multiplier applied to the enemy's speed.
    pub factor: f32,
    /// Time left before the effect expires.
    pub remaining: Duration,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Kind of the enemy.
    pub kind: EnemyKind,
    /// Lane followed by the enemy.
    pub lane: u32,
    /// Current health.
    pub health: u32,
    /// Health at spawn time.
    pub max_health: u32,
    /// Base speed in world units per second.
    pub speed: f32,
    /// Distance travelled along the lane in world units.
    pub distance: f32,
    /// Fraction of the lane travelled, between zero and one.
    pub progress: f32,
    /// World-space position derived from the lane.
    pub position: Vec2,
    /// Slow effect in force, if any.
    pub slow: Option<ActiveSlow>,
}

impl EnemySnapshot {
    /// Speed after applying any active slow effect.
    #[must_use]
    pub fn effective_speed(&self) -> f32 {
        match self.slow {
            Some(slow) if !slow.remaining.is_zero() => self.speed * slow.factor,
            _ => self.speed,
        }
    }
}

/// Read-only snapshot describing all enemies within the lanes.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a snapshot by identifier.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Cell occupied by the tower.
    pub cell: CellCoord,
    /// World-space centre of the tower.
    pub position: Vec2,
    /// Zero-based upgrade level.
    pub level: u32,
    /// Rule used to choose between enemies in range.
    pub targeting: TargetingRule,
    /// Reach of the tower in world units.
    pub range: f32,
    /// Damage dealt per hit.
    pub damage: u32,
    /// Time left before the tower may fire again.
    pub ready_in: Duration,
    /// Total gold spent on construction and upgrades.
    pub invested: u32,
}

/// Read-only snapshot describing all placed towers.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a snapshot by identifier.
    #[must_use]
    pub fn get(&self, id: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured towers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no towers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Target chosen by a tower for the current tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TowerTarget {
    /// Tower that holds the target.
    pub tower: TowerId,
    /// Enemy selected by the tower's targeting rule.
    pub enemy: EnemyId,
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlacementError {
    /// A tower or a lane already occupies the requested cell.
    #[error("cell is already occupied")]
    CellOccupied,
    /// The requested cell lies beyond the configured grid bounds.
    #[error("cell lies outside the map")]
    OutOfBounds,
    /// The player cannot afford the tower.
    #[error("not enough gold to build the tower")]
    InsufficientFunds,
    /// The session already concluded.
    #[error("the session is over")]
    SessionOver,
}

/// Reasons a tower upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum UpgradeError {
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    UnknownTower,
    /// The tower already reached its last catalog level.
    #[error("tower is already at its maximum level")]
    MaxLevel,
    /// The player cannot afford the upgrade.
    #[error("not enough gold to upgrade the tower")]
    InsufficientFunds,
    /// The session already concluded.
    #[error("the session is over")]
    SessionOver,
}

/// Reasons a tower sale request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum SellError {
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    UnknownTower,
    /// The session already concluded.
    #[error("the session is over")]
    SessionOver,
}

/// Failure of an atomic gold spend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
#[error("insufficient funds: need {required} gold, have {available}")]
pub struct InsufficientFunds {
    /// Gold the transaction required.
    pub required: u32,
    /// Gold available when the transaction was attempted.
    pub available: u32,
}

/// Serde adapter that stores a [`Duration`] as whole milliseconds.
pub mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialises the duration as an integer number of milliseconds.
    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    /// Deserialises an integer number of milliseconds into a duration.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::{CellCoord, GameOver, PlacementError, TowerId, TowerKind};
    use glam::Vec2;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn contracts_round_trip_through_bincode() {
        assert_round_trip(&TowerId::new(42));
        assert_round_trip(&TowerKind::Frost);
        assert_round_trip(&PlacementError::CellOccupied);
        assert_round_trip(&GameOver {
            victory: true,
            stage: 2,
            wave: 3,
            score: 1_250,
            stars: 2,
        });
    }

    #[test]
    fn cell_center_sits_in_the_middle_of_the_cell() {
        let center = CellCoord::new(2, 1).center(40.0);
        assert_eq!(center, Vec2::new(100.0, 60.0));
    }

    #[test]
    fn star_rating_rewards_surviving_lives() {
        assert_eq!(GameOver::star_rating(false, 20, 20), 0);
        assert_eq!(GameOver::star_rating(true, 20, 20), 3);
        assert_eq!(GameOver::star_rating(true, 10, 20), 2);
        assert_eq!(GameOver::star_rating(true, 9, 20), 1);
        assert_eq!(GameOver::star_rating(true, 1, 0), 3);
    }

    #[test]
    fn placement_errors_render_human_readable_messages() {
        assert_eq!(
            PlacementError::InsufficientFunds.to_string(),
            "not enough gold to build the tower"
        );
    }
}
