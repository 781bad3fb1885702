#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower targets from world snapshots.

use glam::Vec2;
use quiz_defence_core::{
    EnemyId, EnemyView, TargetingRule, TowerSnapshot, TowerTarget, TowerView,
};

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    enemy_workspace: Vec<EnemyCandidate>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes tower targets for the provided world snapshot.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments. Towers without an enemy in range are omitted.
    pub fn handle(&mut self, towers: &TowerView, enemies: &EnemyView, out: &mut Vec<TowerTarget>) {
        out.clear();

        if towers.is_empty() || enemies.is_empty() {
            return;
        }

        self.prepare_enemy_workspace(enemies);
        out.extend(towers.iter().filter_map(|tower| self.best_for(tower)));
    }

    /// Picks the target of a single tower.
    ///
    /// Callers that resolve shots one tower at a time pass a fresh view after
    /// every shot so towers never queue on an enemy that already died.
    pub fn select(&mut self, tower: &TowerSnapshot, enemies: &EnemyView) -> Option<TowerTarget> {
        if enemies.is_empty() {
            return None;
        }
        self.prepare_enemy_workspace(enemies);
        self.best_for(tower)
    }

    fn best_for(&self, tower: &TowerSnapshot) -> Option<TowerTarget> {
        let max_distance_sq = tower.range * tower.range;
        let mut best: Option<BestCandidate> = None;

        for candidate in &self.enemy_workspace {
            let distance_sq = candidate.position.distance_squared(tower.position);
            if distance_sq > max_distance_sq {
                continue;
            }

            let current = BestCandidate {
                enemy: candidate.id,
                distance_sq,
                progress: candidate.progress,
                health: candidate.health,
            };

            match &mut best {
                Some(existing) => {
                    if current.precedes(existing, tower.targeting) {
                        *existing = current;
                    }
                }
                None => best = Some(current),
            }
        }

        best.map(|candidate| TowerTarget {
            tower: tower.id,
            enemy: candidate.enemy,
        })
    }

    fn prepare_enemy_workspace(&mut self, enemies: &EnemyView) {
        self.enemy_workspace.clear();
        self.enemy_workspace.reserve(enemies.len());

        for snapshot in enemies.iter() {
            if snapshot.health == 0 {
                continue;
            }
            self.enemy_workspace.push(EnemyCandidate {
                id: snapshot.id,
                position: snapshot.position,
                progress: snapshot.progress,
                health: snapshot.health,
            });
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EnemyCandidate {
    id: EnemyId,
    position: Vec2,
    progress: f32,
    health: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    enemy: EnemyId,
    distance_sq: f32,
    progress: f32,
    health: u32,
}

impl BestCandidate {
    fn precedes(&self, other: &Self, rule: TargetingRule) -> bool {
        match rule {
            TargetingRule::First => {
                if self.progress != other.progress {
                    return self.progress > other.progress;
                }
            }
            TargetingRule::Last => {
                if self.progress != other.progress {
                    return self.progress < other.progress;
                }
            }
            TargetingRule::Closest => {
                if self.distance_sq != other.distance_sq {
                    return self.distance_sq < other.distance_sq;
                }
            }
            TargetingRule::Strongest => {
                if self.health != other.health {
                    return self.health > other.health;
                }
            }
        }

        self.enemy < other.enemy
    }
}
