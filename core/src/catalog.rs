//! Stat tables for towers and enemies.
//!
//! Both catalogs are plain configuration supplied at session start. Defaults
//! reproduce the balance the game ships with; hosts may override any entry.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Rule a tower uses to choose between enemies inside its range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetingRule {
    /// Enemy closest to the exit, i.e. with the highest path progress.
    #[default]
    First,
    /// Enemy furthest from the exit.
    Last,
    /// Enemy nearest to the tower.
    Closest,
    /// Enemy with the most remaining health.
    Strongest,
}

/// Types of towers that can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Fast, cheap single-target tower.
    Arrow,
    /// Slow, heavy-hitting tower.
    Cannon,
    /// Weak tower that slows its targets.
    Frost,
}

impl TowerKind {
    /// Every tower kind in catalog order.
    pub const ALL: [TowerKind; 3] = [TowerKind::Arrow, TowerKind::Cannon, TowerKind::Frost];

    /// Parses the lowercase name used in configuration files.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "arrow" => Some(Self::Arrow),
            "cannon" => Some(Self::Cannon),
            "frost" => Some(Self::Frost),
            _ => None,
        }
    }
}

/// Speed reduction applied by a tower hit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlowEffect {
    /// Multiplier applied to the target's speed, between zero and one.
    pub factor: f32,
    /// How long the effect lasts after the hit.
    #[serde(rename = "duration_ms", with = "crate::millis")]
    pub duration: Duration,
}

/// Stats of a tower at one upgrade level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerLevel {
    /// Gold required to build (level zero) or to reach this level.
    pub cost: u32,
    /// Damage dealt per hit.
    pub damage: u32,
    /// Reach in world units.
    pub range: f32,
    /// Hits per second.
    pub fire_rate: f32,
    /// Slow applied to targets, if any.
    #[serde(default)]
    pub slow: Option<SlowEffect>,
}

impl TowerLevel {
    /// Delay between two hits, `1 / fire_rate`.
    ///
    /// A non-positive fire rate yields [`Duration::MAX`] so the tower never
    /// fires again.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        if self.fire_rate <= 0.0 {
            return Duration::MAX;
        }
        Duration::try_from_secs_f32(1.0 / self.fire_rate).unwrap_or(Duration::MAX)
    }
}

/// Upgrade path and default behaviour of one tower kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerProfile {
    /// Rule newly placed towers start with.
    #[serde(default)]
    pub targeting: TargetingRule,
    /// Stats per level; index zero is the freshly built tower.
    pub levels: Vec<TowerLevel>,
}

/// Stat table for every tower kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerCatalog {
    /// Profile of [`TowerKind::Arrow`].
    pub arrow: TowerProfile,
    /// Profile of [`TowerKind::Cannon`].
    pub cannon: TowerProfile,
    /// Profile of [`TowerKind::Frost`].
    pub frost: TowerProfile,
}

impl TowerCatalog {
    /// Returns the profile for the provided kind.
    #[must_use]
    pub fn profile(&self, kind: TowerKind) -> &TowerProfile {
        match kind {
            TowerKind::Arrow => &self.arrow,
            TowerKind::Cannon => &self.cannon,
            TowerKind::Frost => &self.frost,
        }
    }

    /// Returns the stats of `kind` at `level`, if the level exists.
    #[must_use]
    pub fn level(&self, kind: TowerKind, level: u32) -> Option<&TowerLevel> {
        let index = usize::try_from(level).ok()?;
        self.profile(kind).levels.get(index)
    }
}

impl Default for TowerCatalog {
    fn default() -> Self {
        Self {
            arrow: TowerProfile {
                targeting: TargetingRule::First,
                levels: vec![
                    level(50, 10, 150.0, 2.0, None),
                    level(40, 16, 165.0, 2.5, None),
                    level(70, 24, 180.0, 3.0, None),
                ],
            },
            cannon: TowerProfile {
                targeting: TargetingRule::Strongest,
                levels: vec![
                    level(60, 35, 120.0, 0.6, None),
                    level(60, 55, 130.0, 0.7, None),
                    level(100, 80, 140.0, 0.8, None),
                ],
            },
            frost: TowerProfile {
                targeting: TargetingRule::First,
                levels: vec![
                    level(70, 4, 130.0, 1.0, Some(slow(0.5, 1_500))),
                    level(50, 6, 140.0, 1.2, Some(slow(0.4, 2_000))),
                ],
            },
        }
    }
}

fn level(cost: u32, damage: u32, range: f32, fire_rate: f32, slow: Option<SlowEffect>) -> TowerLevel {
    TowerLevel {
        cost,
        damage,
        range,
        fire_rate,
        slow,
    }
}

fn slow(factor: f32, millis: u64) -> SlowEffect {
    SlowEffect {
        factor,
        duration: Duration::from_millis(millis),
    }
}

/// Types of enemies the scheduler may spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Fast and fragile.
    Scout,
    /// Baseline enemy.
    Grunt,
    /// Slow and sturdy.
    Brute,
    /// Stage finale.
    Boss,
}

impl EnemyKind {
    /// Every enemy kind in catalog order.
    pub const ALL: [EnemyKind; 4] = [
        EnemyKind::Scout,
        EnemyKind::Grunt,
        EnemyKind::Brute,
        EnemyKind::Boss,
    ];
}

/// Stats shared by every enemy of one kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Difficulty tier, used by hosts for presentation.
    pub tier: u8,
    /// Health at spawn time.
    pub health: u32,
    /// Speed in world units per second.
    pub speed: f32,
    /// Gold rewarded when a tower kills the enemy.
    pub bounty: u32,
    /// Lives lost when the enemy leaks.
    pub leak_cost: u32,
}

/// Stat table for every enemy kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyCatalog {
    /// Stats of [`EnemyKind::Scout`].
    pub scout: EnemyStats,
    /// Stats of [`EnemyKind::Grunt`].
    pub grunt: EnemyStats,
    /// Stats of [`EnemyKind::Brute`].
    pub brute: EnemyStats,
    /// Stats of [`EnemyKind::Boss`].
    pub boss: EnemyStats,
}

impl EnemyCatalog {
    /// Returns the stats for the provided kind.
    #[must_use]
    pub fn stats(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Scout => &self.scout,
            EnemyKind::Grunt => &self.grunt,
            EnemyKind::Brute => &self.brute,
            EnemyKind::Boss => &self.boss,
        }
    }
}

impl Default for EnemyCatalog {
    fn default() -> Self {
        Self {
            scout: EnemyStats {
                tier: 1,
                health: 30,
                speed: 90.0,
                bounty: 5,
                leak_cost: 1,
            },
            grunt: EnemyStats {
                tier: 1,
                health: 60,
                speed: 60.0,
                bounty: 10,
                leak_cost: 1,
            },
            brute: EnemyStats {
                tier: 2,
                health: 180,
                speed: 40.0,
                bounty: 20,
                leak_cost: 2,
            },
            boss: EnemyStats {
                tier: 3,
                health: 900,
                speed: 30.0,
                bounty: 100,
                leak_cost: 5,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_is_the_inverse_of_fire_rate() {
        let stats = level(10, 1, 10.0, 4.0, None);
        assert_eq!(stats.cooldown(), Duration::from_millis(250));
    }

    #[test]
    fn non_positive_fire_rate_never_recovers() {
        let stats = level(10, 1, 10.0, 0.0, None);
        assert_eq!(stats.cooldown(), Duration::MAX);
    }

    #[test]
    fn catalog_levels_are_indexed_from_zero() {
        let catalog = TowerCatalog::default();
        assert_eq!(catalog.level(TowerKind::Arrow, 0).map(|l| l.cost), Some(50));
        assert_eq!(catalog.level(TowerKind::Cannon, 0).map(|l| l.cost), Some(60));
        assert!(catalog.level(TowerKind::Frost, 2).is_none());
    }

    #[test]
    fn partial_catalog_keeps_defaults_for_missing_kinds() {
        let parsed: TowerCatalog = serde_json::from_str(
            r#"{ "arrow": { "levels": [ { "cost": 5, "damage": 1, "range": 10.0, "fire_rate": 1.0 } ] } }"#,
        )
        .expect("valid catalog");
        assert_eq!(parsed.arrow.levels.len(), 1);
        assert_eq!(parsed.arrow.targeting, TargetingRule::First);
        assert_eq!(parsed.cannon, TowerCatalog::default().cannon);
    }

    #[test]
    fn tower_names_parse_case_insensitively() {
        assert_eq!(TowerKind::from_name("Cannon"), Some(TowerKind::Cannon));
        assert_eq!(TowerKind::from_name("laser"), None);
    }
}
