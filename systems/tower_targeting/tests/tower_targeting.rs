use glam::Vec2;
use quiz_defence_core::{
    CellCoord, Command, EnemyId, EnemyKind, Event, TargetingRule, TowerId, TowerKind, TowerTarget,
};
use quiz_defence_system_tower_targeting::TowerTargeting;
use quiz_defence_world::{self as world, query, Map, World, WorldConfig};

fn prepared_world() -> World {
    let map = Map::from_waypoints(
        6,
        3,
        50.0,
        vec![vec![Vec2::new(0.0, 25.0), Vec2::new(300.0, 25.0)]],
    )
    .expect("valid map");
    let mut world = World::new(WorldConfig::new(map, 200, 10));
    let mut events = Vec::new();

    world::apply(
        &mut world,
        Command::PlaceTower {
            kind: TowerKind::Arrow,
            cell: CellCoord::new(2, 1),
        },
        &mut events,
    );
    for _ in 0..2 {
        world::apply(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Grunt,
                lane: 0,
            },
            &mut events,
        );
    }
    world::apply(
        &mut world,
        Command::AdvanceEnemy {
            enemy: EnemyId::new(0),
            distance: 150.0,
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::AdvanceEnemy {
            enemy: EnemyId::new(1),
            distance: 50.0,
        },
        &mut events,
    );
    assert!(
        events
            .iter()
            .any(|event| matches!(event, Event::TowerPlaced { .. })),
        "tower placement must succeed"
    );
    world
}

fn targets(world: &World) -> Vec<TowerTarget> {
    let mut system = TowerTargeting::new();
    let mut out = Vec::new();
    system.handle(
        &query::tower_view(world),
        &query::enemy_view(world),
        &mut out,
    );
    out
}

#[test]
fn default_rule_follows_the_leading_enemy() {
    let world = prepared_world();
    assert_eq!(
        targets(&world),
        vec![TowerTarget {
            tower: TowerId::new(0),
            enemy: EnemyId::new(0),
        }]
    );
}

#[test]
fn changing_the_rule_retargets_the_tower() {
    let mut world = prepared_world();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SetTargeting {
            tower: TowerId::new(0),
            rule: TargetingRule::Last,
        },
        &mut events,
    );

    assert_eq!(
        events,
        vec![Event::TargetingChanged {
            tower: TowerId::new(0),
            rule: TargetingRule::Last,
        }]
    );
    assert_eq!(
        targets(&world),
        vec![TowerTarget {
            tower: TowerId::new(0),
            enemy: EnemyId::new(1),
        }]
    );
}

#[test]
fn repeated_queries_are_stable() {
    let world = prepared_world();
    assert_eq!(targets(&world), targets(&world));
}
