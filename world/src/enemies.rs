//! Enemy storage and identifier allocation.

use std::collections::BTreeMap;

use quiz_defence_core::{ActiveSlow, EnemyId, EnemyKind, EnemyStats};

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) lane: u32,
    pub(crate) health: u32,
    pub(crate) max_health: u32,
    pub(crate) speed: f32,
    pub(crate) bounty: u32,
    pub(crate) leak_cost: u32,
    pub(crate) distance: f32,
    pub(crate) slow: Option<ActiveSlow>,
    /// Set when the slow landed after this tick's movement; the next clock
    /// advance keeps it whole so it affects at least one movement step.
    pub(crate) slow_fresh: bool,
}

/// Live enemies keyed by identifier so iteration order is deterministic.
#[derive(Debug)]
pub(crate) struct EnemyRoster {
    entries: BTreeMap<EnemyId, Enemy>,
    next_enemy_id: EnemyId,
}

impl EnemyRoster {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_enemy_id: EnemyId::new(0),
        }
    }

    /// Creates an enemy at the start of `lane` with full health.
    pub(crate) fn spawn(&mut self, kind: EnemyKind, stats: &EnemyStats, lane: u32) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(
            id,
            Enemy {
                id,
                kind,
                lane,
                health: stats.health,
                max_health: stats.health,
                speed: stats.speed,
                bounty: stats.bounty,
                leak_cost: stats.leak_cost,
                distance: 0.0,
                slow: None,
                slow_fresh: false,
            },
        );
        id
    }

    pub(crate) fn remove(&mut self, id: EnemyId) -> Option<Enemy> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.entries.values_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grunt() -> EnemyStats {
        EnemyStats {
            tier: 1,
            health: 60,
            speed: 60.0,
            bounty: 10,
            leak_cost: 1,
        }
    }

    #[test]
    fn spawned_enemies_start_at_full_health() {
        let mut roster = EnemyRoster::new();
        let id = roster.spawn(EnemyKind::Grunt, &grunt(), 1);
        let enemy = roster.get(id).expect("enemy exists");
        assert_eq!(enemy.health, 60);
        assert_eq!(enemy.max_health, 60);
        assert_eq!(enemy.lane, 1);
        assert_eq!(enemy.distance, 0.0);
    }

    #[test]
    fn removed_enemies_are_gone_for_good() {
        let mut roster = EnemyRoster::new();
        let first = roster.spawn(EnemyKind::Grunt, &grunt(), 0);
        let second = roster.spawn(EnemyKind::Grunt, &grunt(), 0);
        assert!(roster.remove(first).is_some());
        assert!(roster.remove(first).is_none());
        assert_eq!(roster.len(), 1);
        assert!(second > first);
    }
}
