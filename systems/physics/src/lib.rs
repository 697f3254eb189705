#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Entity physics integrated against the tile grid.
//!
//! Every tick an [`Entity`] runs a fixed pipeline: gravity toward the deep,
//! impulse integration, position integration, then collision clamping via
//! [`collision::resolve`]. The per-kind behaviour hook runs last. Without a
//! world the pipeline degrades to unclamped, weightless motion so entities can
//! still be animated outside of play.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tilefall_core::{EntityKind, HeldKeys, TileGrid};

pub mod collision;
pub mod input;

pub use collision::{resolve, Extents, Resolution};
pub use input::{direction, horizontal_direction};

/// Gravitational constant tuned for tile-scale worlds.
pub const GRAVITY_CONSTANT: f64 = 1.138_312_5;

const STONE_FRACTION: f64 = 0.36;
const STONE_DENSITY: f64 = 1_602.0;
const DIRT_FRACTION: f64 = 0.24;
const DIRT_DENSITY: f64 = 1_300.0;

/// Aggregate mass of a world's material.
///
/// Every block is one cubic metre; the material split is 36% stone,
/// 24% dirt and 40% air.
#[must_use]
pub fn world_mass(width: u32, height: u32) -> f64 {
    let blocks = f64::from(width) * f64::from(height);
    blocks * STONE_FRACTION * STONE_DENSITY + blocks * DIRT_FRACTION * DIRT_DENSITY
}

/// Tuning knobs for the physics pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Side length of a tile in world units.
    pub tile_size: f32,
    /// Constant `G` in the inverse-square gravity law.
    pub gravity_constant: f64,
    /// Lower clamp on the distance to the deep, in tiles.
    pub min_distance_tiles: f32,
    /// Squared remaining impulse below which an impulse counts as fully applied.
    pub impulse_epsilon: f32,
    /// Horizontal walking speed of players in world units per second.
    pub player_speed: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            tile_size: 8.0,
            gravity_constant: GRAVITY_CONSTANT,
            min_distance_tiles: 1.0,
            impulse_epsilon: f32::EPSILON,
            player_speed: 40.0,
        }
    }
}

/// Physically simulated body living in the world.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    kind: EntityKind,
    position: Vec2,
    velocity: Vec2,
    mass: f32,
    extents: Extents,
    grounded: bool,
    pending_impulse: Vec2,
    applied_impulse: Vec2,
}

impl Entity {
    /// Creates an entity at rest using the kind's default extents and unit mass.
    #[must_use]
    pub fn new(kind: EntityKind, position: Vec2) -> Self {
        let (width, height) = kind.default_extents();
        Self {
            kind,
            position,
            velocity: Vec2::ZERO,
            mass: 1.0,
            extents: Extents { width, height },
            grounded: false,
            pending_impulse: Vec2::ZERO,
            applied_impulse: Vec2::ZERO,
        }
    }

    /// Overrides the bounding extents, measured in tiles.
    #[must_use]
    pub fn with_extents(mut self, width: f32, height: f32) -> Self {
        self.extents = Extents { width, height };
        self
    }

    /// Overrides the mass. Non-positive or non-finite values are ignored.
    #[must_use]
    pub fn with_mass(mut self, mass: f32) -> Self {
        if mass > 0.0 && mass.is_finite() {
            self.mass = mass;
        }
        self
    }

    /// Overrides the initial velocity.
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Kind of the entity.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Position in world units; `x` is the centre line, `y` the top edge.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Velocity in world units per second.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Mass in kilograms.
    #[must_use]
    pub const fn mass(&self) -> f32 {
        self.mass
    }

    /// Bounding extents in tiles.
    #[must_use]
    pub const fn extents(&self) -> Extents {
        self.extents
    }

    /// Horizontal probe distance from the centre line, in tiles.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.extents.width
    }

    /// Height in tiles.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.extents.height
    }

    /// Whether the entity rests on a solid tile.
    #[must_use]
    pub const fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Whether the deep pulls on this entity.
    #[must_use]
    pub const fn applies_gravity(&self) -> bool {
        self.kind.applies_gravity()
    }

    /// Total impulse still being folded into the velocity.
    #[must_use]
    pub const fn pending_impulse(&self) -> Vec2 {
        self.pending_impulse
    }

    /// Part of the pending impulse already folded into the velocity.
    #[must_use]
    pub const fn applied_impulse(&self) -> Vec2 {
        self.applied_impulse
    }

    /// Queues `force` acting for `seconds`; returns the impulse added.
    ///
    /// Any part of an earlier impulse not yet folded into the velocity is
    /// merged with the new one and the accounting restarts from zero.
    pub fn add_impulse(&mut self, force: Vec2, seconds: f32) -> Vec2 {
        let impulse = force * seconds;
        self.pending_impulse = self.pending_impulse - self.applied_impulse + impulse;
        self.applied_impulse = Vec2::ZERO;
        impulse
    }

    /// Newton's second law.
    fn apply_force(&mut self, force: Vec2) {
        self.velocity += force / self.mass;
    }
}

/// Pure system advancing entities one tick at a time.
#[derive(Clone, Debug, Default)]
pub struct Physics {
    tuning: PhysicsTuning,
}

impl Physics {
    /// Creates the system with explicit tuning.
    #[must_use]
    pub const fn new(tuning: PhysicsTuning) -> Self {
        Self { tuning }
    }

    /// Tuning used by this system.
    #[must_use]
    pub const fn tuning(&self) -> &PhysicsTuning {
        &self.tuning
    }

    /// Advances `entity` by `dt_seconds`.
    ///
    /// `world` is the active tile grid, if any. `input` carries the movement
    /// keys held this tick and only affects kinds with input-driven behaviour.
    pub fn update(
        &self,
        entity: &mut Entity,
        world: Option<&TileGrid>,
        dt_seconds: f32,
        input: HeldKeys,
    ) {
        if dt_seconds <= 0.0 || !dt_seconds.is_finite() {
            tracing::warn!(dt_seconds, "skipping physics tick with invalid delta time");
            return;
        }

        if let Some(grid) = world {
            self.apply_gravity(entity, grid);
        }
        self.integrate_impulse(entity, dt_seconds);

        let candidate = entity.position + entity.velocity * dt_seconds;
        entity.position = match world {
            Some(grid) => {
                let resolution = resolve(
                    entity.position,
                    candidate,
                    entity.extents,
                    &mut entity.velocity,
                    grid,
                    self.tuning.tile_size,
                );
                if let Some(grounded) = resolution.grounded {
                    entity.grounded = grounded;
                }
                resolution.position
            }
            None => candidate,
        };

        self.run_behaviour(entity, input);
    }

    /// Newton's law of universal gravitation toward the deep.
    fn apply_gravity(&self, entity: &mut Entity, grid: &TileGrid) {
        if !entity.applies_gravity() || entity.grounded {
            return;
        }

        let tile_size = self.tuning.tile_size;
        let deep = Vec2::new(grid.width() as f32 * 0.5, grid.height() as f32) * tile_size;
        let min_distance = self.tuning.min_distance_tiles * tile_size;
        let distance_squared = entity
            .position
            .distance_squared(deep)
            .max(min_distance * min_distance)
            .max(f32::MIN_POSITIVE);

        let total_mass = world_mass(grid.width(), grid.height()) * f64::from(entity.mass);
        let force = self.tuning.gravity_constant * total_mass / f64::from(distance_squared);
        entity.apply_force(Vec2::new(0.0, force as f32));
    }

    /// Folds the pending impulse into the velocity without overshooting it.
    fn integrate_impulse(&self, entity: &mut Entity, dt_seconds: f32) {
        if entity.pending_impulse == Vec2::ZERO {
            entity.applied_impulse = Vec2::ZERO;
            return;
        }

        let remaining = entity.pending_impulse - entity.applied_impulse;
        let impulse_this_frame = entity.pending_impulse / dt_seconds;

        if remaining.length_squared() < self.tuning.impulse_epsilon
            || impulse_this_frame.length_squared() > remaining.length_squared()
        {
            entity.velocity += remaining;
            entity.pending_impulse = Vec2::ZERO;
            entity.applied_impulse = Vec2::ZERO;
        } else {
            entity.velocity += impulse_this_frame;
            entity.applied_impulse += impulse_this_frame;
        }
    }

    fn run_behaviour(&self, entity: &mut Entity, input: HeldKeys) {
        match entity.kind {
            EntityKind::Player => {
                entity.velocity.x = horizontal_direction(input).x * self.tuning.player_speed;
            }
            EntityKind::Prop { .. } => {}
        }
    }
}
