use glam::Vec2;
use tilefall_core::{EntityKind, HeldKeys, TileGrid, TileId};
use tilefall_system_physics::{resolve, Entity, Extents, Physics, PhysicsTuning};

const TILE: f32 = 8.0;
const FLOOR_ROW: u32 = 15;

fn world_with_floor() -> TileGrid {
    let mut grid = TileGrid::new(20, 20);
    for y in FLOOR_ROW..20 {
        for x in 0..20 {
            grid.set(x, y, TileId::STONE);
        }
    }
    grid
}

fn falling_body(position: Vec2) -> Entity {
    Entity::new(
        EntityKind::Prop {
            applies_gravity: true,
        },
        position,
    )
    .with_extents(0.5, 1.0)
}

#[test]
fn falling_entity_lands_exactly_on_the_floor() {
    let grid = world_with_floor();
    let physics = Physics::new(PhysicsTuning::default());
    let bottom_tile = (FLOOR_ROW - 5) as f32;
    let mut entity = falling_body(Vec2::new(10.5 * TILE, (bottom_tile - 1.0) * TILE));

    let mut ticks = 0;
    while !entity.is_grounded() {
        physics.update(&mut entity, Some(&grid), 0.001, HeldKeys::NONE);
        ticks += 1;
        assert!(ticks < 10_000, "entity never landed");
    }

    let bottom_edge = entity.position().y + entity.height() * TILE;
    assert_eq!(bottom_edge, FLOOR_ROW as f32 * TILE);
    assert_eq!(entity.velocity().y, 0.0);

    for _ in 0..100 {
        physics.update(&mut entity, Some(&grid), 0.001, HeldKeys::NONE);
    }

    assert!(entity.is_grounded());
    assert_eq!(entity.position().y + entity.height() * TILE, FLOOR_ROW as f32 * TILE);
    assert_eq!(entity.velocity().y, 0.0);
}

fn drop_onto_floor(width: u32, height: u32, floor_row: u32, start_row: f32) -> Entity {
    let mut grid = TileGrid::new(width, height);
    for y in floor_row..height {
        for x in 0..width {
            grid.set(x, y, TileId::STONE);
        }
    }
    let physics = Physics::default();
    let column = (width / 2) as f32 + 0.5;
    let mut entity = falling_body(Vec2::new(column * TILE, start_row * TILE));

    let mut ticks = 0;
    while !entity.is_grounded() {
        physics.update(&mut entity, Some(&grid), 1.0 / 60.0, HeldKeys::NONE);
        ticks += 1;
        assert!(ticks < 10_000, "entity never landed");
    }
    entity
}

#[test]
fn short_drop_at_sixty_hertz_lands_on_the_floor_top() {
    let entity = drop_onto_floor(400, 200, 100, 94.0);

    assert_eq!(entity.position().y + entity.height() * TILE, 100.0 * TILE);
    assert_eq!(entity.velocity().y, 0.0);
}

#[test]
fn long_drop_at_sixty_hertz_does_not_tunnel_into_terrain() {
    let entity = drop_onto_floor(40, 80, 60, 0.0);

    assert_eq!(entity.position().y + entity.height() * TILE, 60.0 * TILE);
    assert_eq!(entity.velocity().y, 0.0);
}

#[test]
fn player_walks_along_the_floor_after_landing() {
    let grid = world_with_floor();
    let physics = Physics::default();
    let mut player = Entity::new(EntityKind::Player, Vec2::new(10.5 * TILE, 10.0 * TILE))
        .with_extents(0.5, 1.0);

    for _ in 0..5_000 {
        physics.update(&mut player, Some(&grid), 0.001, HeldKeys::NONE);
    }
    assert!(player.is_grounded());
    let start_x = player.position().x;

    let right = HeldKeys::NONE.with(tilefall_core::MovementKey::Right);
    for _ in 0..100 {
        physics.update(&mut player, Some(&grid), 0.001, right);
    }

    assert!(player.position().x > start_x);
    assert!(player.is_grounded());
    assert_eq!(player.position().y + TILE, FLOOR_ROW as f32 * TILE);
}

#[test]
fn left_probe_wins_when_both_sides_are_solid() {
    let mut grid = TileGrid::new(12, 12);
    for y in 0..12 {
        grid.set(4, y, TileId::STONE);
        grid.set(6, y, TileId::STONE);
    }
    let extents = Extents {
        width: 0.75,
        height: 1.0,
    };
    let mut velocity = Vec2::new(9.0, 0.0);

    let candidate = Vec2::new(5.5 * TILE, 3.0 * TILE);

    let resolution = resolve(candidate, candidate, extents, &mut velocity, &grid, TILE);

    assert_eq!(resolution.position.x - extents.width * TILE, 5.0 * TILE);
    assert_eq!(resolution.position.y, 3.0 * TILE);
    assert_eq!(velocity.x, 0.0);
}

#[test]
fn impulse_resolves_without_overshoot() {
    let physics = Physics::default();
    let mut entity = Entity::new(
        EntityKind::Prop {
            applies_gravity: false,
        },
        Vec2::ZERO,
    );
    let queued = entity.add_impulse(Vec2::new(10.0, 0.0), 1.0);
    assert_eq!(queued, Vec2::new(10.0, 0.0));

    let mut total_change = Vec2::ZERO;
    for _ in 0..10 {
        let before = entity.velocity();
        physics.update(&mut entity, None, 0.1, HeldKeys::NONE);
        total_change += entity.velocity() - before;
        assert!(entity.applied_impulse().x.abs() <= entity.pending_impulse().x.abs());
        assert!(entity.applied_impulse().y.abs() <= entity.pending_impulse().y.abs());
    }

    assert_eq!(total_change, Vec2::new(10.0, 0.0));
    assert_eq!(entity.pending_impulse(), Vec2::ZERO);
    assert_eq!(entity.applied_impulse(), Vec2::ZERO);
}

#[test]
fn impulse_moves_entity_through_open_air() {
    let grid = TileGrid::new(30, 30);
    let physics = Physics::default();
    let mut entity = Entity::new(
        EntityKind::Prop {
            applies_gravity: false,
        },
        Vec2::new(10.0 * TILE, 10.0 * TILE),
    );
    let _ = entity.add_impulse(Vec2::new(0.0, -16.0), 0.5);

    physics.update(&mut entity, Some(&grid), 0.5, HeldKeys::NONE);

    assert_eq!(entity.velocity(), Vec2::new(0.0, -8.0));
    assert_eq!(entity.position(), Vec2::new(10.0 * TILE, 10.0 * TILE - 4.0));
}

#[test]
fn out_of_world_candidates_are_left_unmodified() {
    let grid = world_with_floor();
    let extents = Extents {
        width: 0.5,
        height: 1.0,
    };

    let candidates = [
        Vec2::new(-0.5 * TILE, 14.0 * TILE),
        Vec2::new(20.0 * TILE, 14.0 * TILE),
        Vec2::new(5.0 * TILE, -3.0 * TILE),
        Vec2::new(5.0 * TILE, 19.5 * TILE),
    ];

    for candidate in candidates {
        let mut velocity = Vec2::new(4.0, 4.0);
        let resolution = resolve(candidate, candidate, extents, &mut velocity, &grid, TILE);
        assert_eq!(resolution.position, candidate, "candidate {candidate}");
        assert_eq!(resolution.grounded, None);
        assert_eq!(velocity, Vec2::new(4.0, 4.0));
    }
}

#[test]
fn entity_leaving_the_world_keeps_moving() {
    let grid = world_with_floor();
    let physics = Physics::default();
    let mut entity = Entity::new(
        EntityKind::Prop {
            applies_gravity: false,
        },
        Vec2::new(0.5 * TILE, 5.0 * TILE),
    )
    .with_velocity(Vec2::new(-80.0, 0.0));

    for _ in 0..10 {
        physics.update(&mut entity, Some(&grid), 0.1, HeldKeys::NONE);
    }

    assert!(entity.position().x < 0.0);
    assert_eq!(entity.velocity(), Vec2::new(-80.0, 0.0));
}
