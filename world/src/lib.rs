#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Quiz Defence.
//!
//! The world owns every enemy, every tower, and the economy ledger. Nothing
//! outside this crate mutates them directly: callers submit [`Command`] values
//! through [`apply`] and observe the resulting [`Event`] stream or the
//! read-only [`query`] functions.

use std::time::Duration;

use quiz_defence_core::{
    ActiveSlow, CellCoord, Command, EnemyCatalog, EnemyId, EnemyKind, Event, GameOver,
    PlacementError, QuizEffect, SellError, TowerCatalog, TowerId, TowerKind, UpgradeError,
};

mod economy;
mod enemies;
mod navigation;
mod towers;

pub use economy::{Economy, LifeLoss, QuizSettlement};
pub use navigation::{Lane, LaneError, Map, MapError};

use enemies::EnemyRoster;
use towers::TowerRegistry;

/// Share of the invested gold refunded when a tower is sold, by default.
pub const DEFAULT_SELL_REFUND_PERCENT: u32 = 70;

/// Static parameters the world is created from.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Grid and lanes.
    pub map: Map,
    /// Tower stats per kind and level.
    pub towers: TowerCatalog,
    /// Enemy stats per kind.
    pub enemies: EnemyCatalog,
    /// Gold available at the start of the session.
    pub starting_gold: u32,
    /// Lives available at the start of the session.
    pub starting_lives: u32,
    /// Percentage of the invested gold refunded on sale.
    pub sell_refund_percent: u32,
}

impl WorldConfig {
    /// Creates a configuration with default catalogs and refund rate.
    #[must_use]
    pub fn new(map: Map, starting_gold: u32, starting_lives: u32) -> Self {
        Self {
            map,
            towers: TowerCatalog::default(),
            enemies: EnemyCatalog::default(),
            starting_gold,
            starting_lives,
            sell_refund_percent: DEFAULT_SELL_REFUND_PERCENT,
        }
    }
}

/// Stage and wave most recently opened by the scheduler, zero-based.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    /// Zero-based stage index.
    pub stage: u32,
    /// Zero-based wave index within the stage.
    pub wave: u32,
}

/// Represents the authoritative Quiz Defence world state.
#[derive(Debug)]
pub struct World {
    map: Map,
    tower_catalog: TowerCatalog,
    enemy_catalog: EnemyCatalog,
    starting_lives: u32,
    sell_refund_percent: u32,
    economy: Economy,
    enemies: EnemyRoster,
    towers: TowerRegistry,
    progress: Progress,
    outcome: Option<GameOver>,
    tick_index: u64,
    elapsed: Duration,
}

impl World {
    /// Creates a world ready for simulation.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self {
            economy: Economy::new(config.starting_gold, config.starting_lives),
            map: config.map,
            tower_catalog: config.towers,
            enemy_catalog: config.enemies,
            starting_lives: config.starting_lives,
            sell_refund_percent: config.sell_refund_percent,
            enemies: EnemyRoster::new(),
            towers: TowerRegistry::new(),
            progress: Progress::default(),
            outcome: None,
            tick_index: 0,
            elapsed: Duration::ZERO,
        }
    }

    fn is_concluded(&self) -> bool {
        self.outcome.is_some()
    }

    fn advance_clock(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        self.elapsed = self.elapsed.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        for tower in self.towers.iter_mut() {
            tower.ready_in = tower.ready_in.saturating_sub(dt);
        }

        for enemy in self.enemies.iter_mut() {
            if std::mem::take(&mut enemy.slow_fresh) {
                continue;
            }
            if let Some(slow) = enemy.slow.as_mut() {
                slow.remaining = slow.remaining.saturating_sub(dt);
                if slow.remaining.is_zero() {
                    enemy.slow = None;
                }
            }
        }
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, lane: u32, out_events: &mut Vec<Event>) {
        if self.map.lane(lane).is_none() {
            log::warn!("ignoring spawn of {kind:?} on unknown lane {lane}");
            return;
        }
        let stats = *self.enemy_catalog.stats(kind);
        let enemy = self.enemies.spawn(kind, &stats, lane);
        out_events.push(Event::EnemySpawned { enemy, kind, lane });
    }

    fn advance_enemy(&mut self, id: EnemyId, distance: f32, out_events: &mut Vec<Event>) {
        if !distance.is_finite() || distance <= 0.0 {
            return;
        }
        let Some(enemy) = self.enemies.get_mut(id) else {
            return;
        };
        let Some(lane) = self.map.lane(enemy.lane) else {
            return;
        };

        let travelled = enemy.distance + distance;
        debug_assert!(travelled >= enemy.distance, "enemies never walk backwards");
        if travelled < lane.length() {
            enemy.distance = travelled;
            return;
        }

        let Some(leaked) = self.enemies.remove(id) else {
            return;
        };
        let loss = self.economy.lose_life(leaked.leak_cost);
        out_events.push(Event::EnemyLeaked {
            enemy: leaked.id,
            kind: leaked.kind,
            lives_lost: loss.lost,
        });
        if loss.depleted {
            self.conclude(false, out_events);
        }
    }

    fn fire_tower(&mut self, tower_id: TowerId, target: EnemyId, out_events: &mut Vec<Event>) {
        let Some(tower) = self.towers.get(tower_id) else {
            return;
        };
        if !tower.ready_in.is_zero() {
            return;
        }
        let Some(stats) = self.tower_catalog.level(tower.kind, tower.level).copied() else {
            return;
        };
        let Some(enemy) = self.enemies.get(target) else {
            return;
        };
        let Some(lane) = self.map.lane(enemy.lane) else {
            return;
        };

        let origin = self.map.cell_center(tower.cell);
        if origin.distance(lane.point_at(enemy.distance)) > stats.range {
            return;
        }

        if let Some(tower) = self.towers.get_mut(tower_id) {
            tower.ready_in = stats.cooldown();
        }

        let Some(enemy) = self.enemies.get_mut(target) else {
            return;
        };
        enemy.health = enemy.health.saturating_sub(stats.damage);
        if let Some(effect) = stats.slow {
            enemy.slow = Some(ActiveSlow {
                factor: effect.factor,
                remaining: effect.duration,
            });
            enemy.slow_fresh = true;
        }

        if enemy.health > 0 {
            out_events.push(Event::EnemyDamaged {
                enemy: target,
                tower: tower_id,
                damage: stats.damage,
                remaining: enemy.health,
            });
            return;
        }

        let Some(killed) = self.enemies.remove(target) else {
            return;
        };
        self.economy.reward(killed.bounty);
        self.economy.add_score(u64::from(killed.bounty));
        out_events.push(Event::EnemyKilled {
            enemy: killed.id,
            kind: killed.kind,
            tower: tower_id,
            bounty: killed.bounty,
        });
    }

    fn place_tower(&mut self, kind: TowerKind, cell: CellCoord) -> Result<(TowerId, u32), PlacementError> {
        if self.is_concluded() {
            return Err(PlacementError::SessionOver);
        }
        if !self.map.contains(cell) {
            return Err(PlacementError::OutOfBounds);
        }
        if self.map.is_reserved(cell) || self.towers.occupant(cell).is_some() {
            return Err(PlacementError::CellOccupied);
        }

        let profile = self.tower_catalog.profile(kind);
        let Some(base) = profile.levels.first() else {
            log::warn!("tower catalog has no levels for {kind:?}");
            return Err(PlacementError::InsufficientFunds);
        };
        let cost = base.cost;
        let targeting = profile.targeting;
        self.economy
            .spend(cost)
            .map_err(|_| PlacementError::InsufficientFunds)?;

        Ok((self.towers.insert(kind, cell, targeting, cost), cost))
    }

    fn upgrade_tower(&mut self, tower_id: TowerId) -> Result<(u32, u32), UpgradeError> {
        if self.is_concluded() {
            return Err(UpgradeError::SessionOver);
        }
        let Some(tower) = self.towers.get(tower_id) else {
            return Err(UpgradeError::UnknownTower);
        };
        let next_level = tower.level.saturating_add(1);
        let Some(next) = self.tower_catalog.level(tower.kind, next_level) else {
            return Err(UpgradeError::MaxLevel);
        };
        let cost = next.cost;
        self.economy
            .spend(cost)
            .map_err(|_| UpgradeError::InsufficientFunds)?;

        if let Some(tower) = self.towers.get_mut(tower_id) {
            tower.level = next_level;
            tower.invested = tower.invested.saturating_add(cost);
        }
        Ok((next_level, cost))
    }

    fn sell_tower(&mut self, tower_id: TowerId) -> Result<(CellCoord, u32), SellError> {
        if self.is_concluded() {
            return Err(SellError::SessionOver);
        }
        let Some(tower) = self.towers.remove(tower_id) else {
            return Err(SellError::UnknownTower);
        };
        let refund = u64::from(tower.invested) * u64::from(self.sell_refund_percent) / 100;
        let refund = u32::try_from(refund).unwrap_or(u32::MAX);
        self.economy.reward(refund);
        Ok((tower.cell, refund))
    }

    fn apply_quiz_effect(&mut self, correct: bool, effect: &QuizEffect, out_events: &mut Vec<Event>) {
        if self.is_concluded() {
            return;
        }
        let settlement = self.economy.apply_quiz_effect(correct, effect);
        out_events.push(Event::QuizEffectApplied {
            gold_gained: settlement.gold_gained,
            gold_lost: settlement.gold_lost,
            lives_lost: settlement.lives_lost,
        });
        if settlement.depleted {
            self.conclude(false, out_events);
        }
    }

    fn conclude(&mut self, victory: bool, out_events: &mut Vec<Event>) {
        if self.is_concluded() {
            return;
        }
        let outcome = GameOver {
            victory,
            stage: self.progress.stage.saturating_add(1),
            wave: self.progress.wave.saturating_add(1),
            score: self.economy.score(),
            stars: GameOver::star_rating(victory, self.economy.lives(), self.starting_lives),
        };
        log::info!(
            "session concluded: victory={} stage={} wave={} score={}",
            outcome.victory,
            outcome.stage,
            outcome.wave,
            outcome.score
        );
        self.outcome = Some(outcome);
        out_events.push(Event::GameOver(outcome));
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Once the session has concluded, simulation commands are ignored and
/// player commands are rejected with a `SessionOver` reason.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            if !world.is_concluded() {
                world.advance_clock(dt, out_events);
            }
        }
        Command::BeginWave { stage, wave } => {
            if !world.is_concluded() {
                world.progress = Progress { stage, wave };
                log::info!("stage {} wave {} started", stage + 1, wave + 1);
                out_events.push(Event::WaveStarted { stage, wave });
            }
        }
        Command::SpawnEnemy { kind, lane } => {
            if !world.is_concluded() {
                world.spawn_enemy(kind, lane, out_events);
            }
        }
        Command::AdvanceEnemy { enemy, distance } => {
            if !world.is_concluded() {
                world.advance_enemy(enemy, distance, out_events);
            }
        }
        Command::FireTower { tower, target } => {
            if !world.is_concluded() {
                world.fire_tower(tower, target, out_events);
            }
        }
        Command::PlaceTower { kind, cell } => match world.place_tower(kind, cell) {
            Ok((tower, cost)) => out_events.push(Event::TowerPlaced {
                tower,
                kind,
                cell,
                cost,
            }),
            Err(reason) => {
                log::debug!("placement of {kind:?} at {cell:?} rejected: {reason}");
                out_events.push(Event::TowerPlacementRejected { kind, cell, reason });
            }
        },
        Command::UpgradeTower { tower } => match world.upgrade_tower(tower) {
            Ok((level, cost)) => out_events.push(Event::TowerUpgraded { tower, level, cost }),
            Err(reason) => {
                log::debug!("upgrade of tower {} rejected: {reason}", tower.get());
                out_events.push(Event::TowerUpgradeRejected { tower, reason });
            }
        },
        Command::SellTower { tower } => match world.sell_tower(tower) {
            Ok((cell, refund)) => out_events.push(Event::TowerSold { tower, cell, refund }),
            Err(reason) => {
                log::debug!("sale of tower {} rejected: {reason}", tower.get());
                out_events.push(Event::TowerSaleRejected { tower, reason });
            }
        },
        Command::SetTargeting { tower, rule } => {
            if let Some(state) = world.towers.get_mut(tower) {
                state.targeting = rule;
                out_events.push(Event::TargetingChanged { tower, rule });
            }
        }
        Command::ApplyQuizEffect { correct, effect } => {
            world.apply_quiz_effect(correct, &effect, out_events);
        }
        Command::Conclude { victory } => world.conclude(victory, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use quiz_defence_core::{
        CellCoord, EnemySnapshot, EnemyView, GameOver, TowerCatalog, TowerId, TowerSnapshot,
        TowerView,
    };

    use super::{Economy, Map, Progress, World};

    /// Read-only access to the economy ledger.
    #[must_use]
    pub fn economy(world: &World) -> &Economy {
        &world.economy
    }

    /// Provides read-only access to the grid and lanes.
    #[must_use]
    pub fn map(world: &World) -> &Map {
        &world.map
    }

    /// Tower stat table the world was configured with.
    #[must_use]
    pub fn tower_catalog(world: &World) -> &TowerCatalog {
        &world.tower_catalog
    }

    /// Stage and wave most recently opened.
    #[must_use]
    pub fn progress(world: &World) -> Progress {
        world.progress
    }

    /// Terminal result, once the session has concluded.
    #[must_use]
    pub fn outcome(world: &World) -> Option<GameOver> {
        world.outcome
    }

    /// Number of live enemies.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Number of ticks applied so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Simulated time elapsed so far.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Tower standing on the provided cell, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: CellCoord) -> Option<TowerId> {
        world.towers.occupant(cell)
    }

    /// Captures a stable, identifier-ordered snapshot of every live enemy.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .enemies
            .iter()
            .filter_map(|enemy| {
                let lane = world.map.lane(enemy.lane)?;
                Some(EnemySnapshot {
                    id: enemy.id,
                    kind: enemy.kind,
                    lane: enemy.lane,
                    health: enemy.health,
                    max_health: enemy.max_health,
                    speed: enemy.speed,
                    distance: enemy.distance,
                    progress: lane.progress(enemy.distance),
                    position: lane.point_at(enemy.distance),
                    slow: enemy.slow,
                })
            })
            .collect();
        EnemyView::from_snapshots(snapshots)
    }

    /// Captures a stable, identifier-ordered snapshot of every tower.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        let snapshots = world
            .towers
            .iter()
            .filter_map(|tower| {
                let stats = world.tower_catalog.level(tower.kind, tower.level)?;
                Some(TowerSnapshot {
                    id: tower.id,
                    kind: tower.kind,
                    cell: tower.cell,
                    position: world.map.cell_center(tower.cell),
                    level: tower.level,
                    targeting: tower.targeting,
                    range: stats.range,
                    damage: stats.damage,
                    ready_in: tower.ready_in,
                    invested: tower.invested,
                })
            })
            .collect();
        TowerView::from_snapshots(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use quiz_defence_core::{EnemyStats, SlowEffect, TargetingRule, TowerLevel, TowerProfile};

    fn map() -> Map {
        Map::from_waypoints(
            4,
            3,
            50.0,
            vec![vec![Vec2::new(0.0, 25.0), Vec2::new(200.0, 25.0)]],
        )
        .expect("valid map")
    }

    fn world(gold: u32, lives: u32) -> World {
        let mut config = WorldConfig::new(map(), gold, lives);
        config.towers.arrow = TowerProfile {
            targeting: TargetingRule::First,
            levels: vec![
                TowerLevel {
                    cost: 50,
                    damage: 25,
                    range: 500.0,
                    fire_rate: 1.0,
                    slow: None,
                },
                TowerLevel {
                    cost: 30,
                    damage: 40,
                    range: 500.0,
                    fire_rate: 1.0,
                    slow: None,
                },
            ],
        };
        config.enemies.grunt = EnemyStats {
            tier: 1,
            health: 50,
            speed: 50.0,
            bounty: 10,
            leak_cost: 2,
        };
        World::new(config)
    }

    fn run(world: &mut World, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, command, &mut events);
        events
    }

    #[test]
    fn placement_spends_gold_exactly_once() {
        let mut world = world(100, 5);
        let events = run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Arrow,
                cell: CellCoord::new(1, 1),
            },
        );
        assert_eq!(
            events,
            vec![Event::TowerPlaced {
                tower: TowerId::new(0),
                kind: TowerKind::Arrow,
                cell: CellCoord::new(1, 1),
                cost: 50,
            }]
        );
        assert_eq!(query::economy(&world).gold(), 50);
    }

    #[test]
    fn placement_rejections_leave_state_unchanged() {
        let mut world = world(60, 5);
        let _ = run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Arrow,
                cell: CellCoord::new(1, 1),
            },
        );

        for (cell, reason) in [
            (CellCoord::new(1, 1), PlacementError::CellOccupied),
            (CellCoord::new(2, 0), PlacementError::CellOccupied),
            (CellCoord::new(9, 1), PlacementError::OutOfBounds),
            (CellCoord::new(2, 2), PlacementError::InsufficientFunds),
        ] {
            let events = run(
                &mut world,
                Command::PlaceTower {
                    kind: TowerKind::Arrow,
                    cell,
                },
            );
            assert_eq!(
                events,
                vec![Event::TowerPlacementRejected {
                    kind: TowerKind::Arrow,
                    cell,
                    reason,
                }]
            );
        }
        assert_eq!(query::economy(&world).gold(), 10);
        assert_eq!(query::tower_view(&world).len(), 1);
    }

    #[test]
    fn killing_blow_rewards_bounty_once() {
        let mut world = world(100, 5);
        let _ = run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Arrow,
                cell: CellCoord::new(1, 1),
            },
        );
        let _ = run(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Grunt,
                lane: 0,
            },
        );
        let tower = TowerId::new(0);
        let enemy = EnemyId::new(0);

        let first = run(&mut world, Command::FireTower { tower, target: enemy });
        assert_eq!(
            first,
            vec![Event::EnemyDamaged {
                enemy,
                tower,
                damage: 25,
                remaining: 25,
            }]
        );

        let cooling = run(&mut world, Command::FireTower { tower, target: enemy });
        assert!(cooling.is_empty(), "tower must respect its cooldown");

        let _ = run(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
        );
        let second = run(&mut world, Command::FireTower { tower, target: enemy });
        assert_eq!(
            second,
            vec![Event::EnemyKilled {
                enemy,
                kind: EnemyKind::Grunt,
                tower,
                bounty: 10,
            }]
        );
        assert_eq!(query::economy(&world).gold(), 60);
        assert_eq!(query::economy(&world).score(), 10);

        let _ = run(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
        );
        let again = run(&mut world, Command::FireTower { tower, target: enemy });
        assert!(again.is_empty(), "dead enemies cannot be rewarded twice");
        assert_eq!(query::economy(&world).gold(), 60);
        assert_eq!(query::enemy_count(&world), 0);
    }

    #[test]
    fn leaking_costs_lives_and_depletion_concludes_once() {
        let mut world = world(0, 3);
        for _ in 0..2 {
            let _ = run(
                &mut world,
                Command::SpawnEnemy {
                    kind: EnemyKind::Grunt,
                    lane: 0,
                },
            );
        }

        let first = run(
            &mut world,
            Command::AdvanceEnemy {
                enemy: EnemyId::new(0),
                distance: 500.0,
            },
        );
        assert_eq!(
            first,
            vec![Event::EnemyLeaked {
                enemy: EnemyId::new(0),
                kind: EnemyKind::Grunt,
                lives_lost: 2,
            }]
        );
        assert!(query::outcome(&world).is_none());

        let second = run(
            &mut world,
            Command::AdvanceEnemy {
                enemy: EnemyId::new(1),
                distance: 500.0,
            },
        );
        assert_eq!(second.len(), 2);
        assert!(matches!(
            second[1],
            Event::GameOver(GameOver { victory: false, stars: 0, .. })
        ));
        assert_eq!(query::economy(&world).lives(), 0);

        let after = run(&mut world, Command::Conclude { victory: true });
        assert!(after.is_empty(), "game over is emitted exactly once");
    }

    #[test]
    fn enemies_never_move_backwards() {
        let mut world = world(0, 3);
        let _ = run(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Grunt,
                lane: 0,
            },
        );
        let enemy = EnemyId::new(0);
        let _ = run(&mut world, Command::AdvanceEnemy { enemy, distance: 50.0 });
        let _ = run(&mut world, Command::AdvanceEnemy { enemy, distance: -10.0 });
        let _ = run(
            &mut world,
            Command::AdvanceEnemy {
                enemy,
                distance: f32::NAN,
            },
        );

        let view = query::enemy_view(&world);
        let snapshot = view.get(enemy).expect("enemy is alive");
        assert_eq!(snapshot.distance, 50.0);
        assert_eq!(snapshot.position, Vec2::new(50.0, 25.0));
        assert_eq!(snapshot.progress, 0.25);
    }

    #[test]
    fn upgrades_require_funds_and_stop_at_the_last_level() {
        let mut world = world(100, 3);
        let _ = run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Arrow,
                cell: CellCoord::new(1, 1),
            },
        );
        let tower = TowerId::new(0);

        let upgraded = run(&mut world, Command::UpgradeTower { tower });
        assert_eq!(
            upgraded,
            vec![Event::TowerUpgraded {
                tower,
                level: 1,
                cost: 30
            }]
        );
        assert_eq!(query::tower_view(&world).get(tower).map(|t| t.damage), Some(40));

        let maxed = run(&mut world, Command::UpgradeTower { tower });
        assert_eq!(
            maxed,
            vec![Event::TowerUpgradeRejected {
                tower,
                reason: UpgradeError::MaxLevel
            }]
        );
        assert_eq!(query::economy(&world).gold(), 20);
    }

    #[test]
    fn selling_refunds_part_of_the_investment_and_frees_the_cell() {
        let mut world = world(100, 3);
        let cell = CellCoord::new(1, 1);
        let _ = run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Arrow,
                cell,
            },
        );
        let tower = TowerId::new(0);

        let sold = run(&mut world, Command::SellTower { tower });
        assert_eq!(
            sold,
            vec![Event::TowerSold {
                tower,
                cell,
                refund: 35
            }]
        );
        assert_eq!(query::economy(&world).gold(), 85);
        assert_eq!(query::tower_at(&world, cell), None);

        let missing = run(&mut world, Command::SellTower { tower });
        assert_eq!(
            missing,
            vec![Event::TowerSaleRejected {
                tower,
                reason: SellError::UnknownTower
            }]
        );
    }

    #[test]
    fn ticks_decay_cooldowns_and_slows() {
        let mut world = world(100, 3);
        let _ = run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Arrow,
                cell: CellCoord::new(1, 1),
            },
        );
        let _ = run(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Grunt,
                lane: 0,
            },
        );
        let tower = TowerId::new(0);
        let _ = run(
            &mut world,
            Command::FireTower {
                tower,
                target: EnemyId::new(0),
            },
        );

        let events = run(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(400),
            },
        );
        assert_eq!(
            events,
            vec![Event::TimeAdvanced {
                dt: Duration::from_millis(400)
            }]
        );
        let view = query::tower_view(&world);
        assert_eq!(
            view.get(tower).map(|t| t.ready_in),
            Some(Duration::from_millis(600))
        );
        assert_eq!(query::tick_index(&world), 1);
        assert_eq!(query::elapsed(&world), Duration::from_millis(400));
    }

    #[test]
    fn concluded_world_ignores_simulation_and_rejects_players() {
        let mut world = world(100, 3);
        let concluded = run(&mut world, Command::Conclude { victory: true });
        assert!(matches!(
            concluded[..],
            [Event::GameOver(GameOver {
                victory: true,
                stage: 1,
                wave: 1,
                stars: 3,
                ..
            })]
        ));

        assert!(run(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1)
            }
        )
        .is_empty());
        assert!(run(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Boss,
                lane: 0
            }
        )
        .is_empty());

        let rejected = run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Arrow,
                cell: CellCoord::new(1, 1),
            },
        );
        assert_eq!(
            rejected,
            vec![Event::TowerPlacementRejected {
                kind: TowerKind::Arrow,
                cell: CellCoord::new(1, 1),
                reason: PlacementError::SessionOver,
            }]
        );
    }

    #[test]
    fn slows_cover_the_movement_step_after_the_hit() {
        let mut world = world(100, 3);
        let _ = run(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Arrow,
                cell: CellCoord::new(1, 1),
            },
        );
        world.tower_catalog.arrow.levels[0].slow = Some(SlowEffect {
            factor: 0.5,
            duration: Duration::from_millis(20),
        });
        let _ = run(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Grunt,
                lane: 0,
            },
        );
        let enemy = EnemyId::new(0);
        let _ = run(
            &mut world,
            Command::FireTower {
                tower: TowerId::new(0),
                target: enemy,
            },
        );

        let tick = Command::Tick {
            dt: Duration::from_millis(20),
        };
        let _ = run(&mut world, tick.clone());
        let slowed = query::enemy_view(&world);
        let grunt = slowed.get(enemy).expect("grunt is alive");
        assert_eq!(grunt.effective_speed(), 25.0);

        let _ = run(&mut world, tick);
        let recovered = query::enemy_view(&world);
        let grunt = recovered.get(enemy).expect("grunt is alive");
        assert_eq!(grunt.slow, None);
        assert_eq!(grunt.effective_speed(), 50.0);
    }
}
