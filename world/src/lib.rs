#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative simulation session for Tilefall.
//!
//! A [`Session`] owns the selected world, the selected player and every live
//! entity. All mutations flow through [`apply`], which executes a single
//! [`Command`] and reports the outcome as [`Event`] values. Read access goes
//! through the [`query`] module.

use glam::Vec2;
use tilefall_core::{
    Command, Difficulty, EntityId, EntityKind, Event, GenerationError, HeldKeys, PlayerRecord,
    TileEditError, TileGrid, TileId, WorldRecord,
};
use tilefall_system_physics::{Entity, Physics, PhysicsTuning};
use tilefall_system_terrain::Generator;

/// Configuration applied when a session is created.
#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    /// Generator run by [`Command::GenerateTerrain`].
    pub generator: Generator,
    /// Physics tuning used on every tick.
    pub physics: PhysicsTuning,
}

/// Represents the authoritative Tilefall simulation state.
#[derive(Debug)]
pub struct Session {
    world: Option<WorldRecord>,
    player: Option<PlayerRecord>,
    entities: Vec<LiveEntity>,
    next_entity_id: u32,
    tick_index: u64,
    generator: Generator,
    physics: Physics,
}

impl Session {
    /// Creates an empty session with no world, player or entities.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            world: None,
            player: None,
            entities: Vec::new(),
            next_entity_id: 0,
            tick_index: 0,
            generator: config.generator,
            physics: Physics::new(config.physics),
        }
    }

    fn entity_mut(&mut self, entity: EntityId) -> Option<&mut Entity> {
        self.entities
            .iter_mut()
            .find(|live| live.id == entity)
            .map(|live| &mut live.body)
    }

    fn entity_index(&self, entity: EntityId) -> Option<usize> {
        self.entities.iter().position(|live| live.id == entity)
    }

    fn allocate_entity_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id = self.next_entity_id.saturating_add(1);
        id
    }

    fn tick(&mut self, dt_seconds: f32, held_keys: HeldKeys, out_events: &mut Vec<Event>) {
        let grid = self.world.as_ref().map(WorldRecord::grid);

        for live in &mut self.entities {
            let from = live.body.position();
            let was_grounded = live.body.is_grounded();

            self.physics.update(&mut live.body, grid, dt_seconds, held_keys);

            let to = live.body.position();
            if to != from {
                out_events.push(Event::EntityMoved {
                    entity: live.id,
                    from,
                    to,
                });
            }

            match (was_grounded, live.body.is_grounded()) {
                (false, true) => {
                    tracing::debug!(entity = live.id.get(), x = to.x, y = to.y, "entity landed");
                    out_events.push(Event::EntityLanded { entity: live.id });
                }
                (true, false) => out_events.push(Event::EntityLeftGround { entity: live.id }),
                _ => {}
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[derive(Clone, Debug)]
struct LiveEntity {
    id: EntityId,
    body: Entity,
}

/// Builds a freshly generated world: every cell starts as stone, then the
/// generator's passes run over it.
#[must_use]
pub fn new_world(
    name: impl Into<String>,
    difficulty: Difficulty,
    width: u32,
    height: u32,
    seed: u32,
    generator: &Generator,
) -> WorldRecord {
    let mut grid = TileGrid::filled(width, height, TileId::STONE);
    let report = generator.generate(seed, &mut grid);
    let record = WorldRecord::new(name, difficulty, grid);
    tracing::info!(
        name = record.name(),
        width,
        height,
        seed,
        cells_written = report.cells_written,
        "created world"
    );
    record
}

/// Applies the provided command to the session, mutating state deterministically.
pub fn apply(session: &mut Session, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SelectWorld { record } => {
            tracing::info!(
                name = record.name(),
                width = record.width(),
                height = record.height(),
                "world selected"
            );
            out_events.push(Event::WorldSelected {
                width: record.width(),
                height: record.height(),
            });
            session.world = Some(record);
        }
        Command::ClearWorld => {
            session.world = None;
            out_events.push(Event::WorldCleared);
        }
        Command::SelectPlayer { record } => {
            out_events.push(Event::PlayerSelected {
                name: record.name().to_owned(),
            });
            session.player = Some(record);
        }
        Command::GenerateTerrain { seed } => {
            let rejection = if session.world.is_none() {
                Some(GenerationError::NoWorld)
            } else if !session.entities.is_empty() {
                Some(GenerationError::EntitiesPresent)
            } else {
                None
            };

            if let Some(reason) = rejection {
                tracing::warn!(seed, ?reason, "terrain generation rejected");
                out_events.push(Event::GenerationRejected { seed, reason });
                return;
            }

            if let Some(world) = session.world.as_mut() {
                let report = session.generator.generate(seed, world.grid_mut());
                out_events.push(Event::TerrainGenerated {
                    seed,
                    cells_written: report.cells_written,
                });
            }
        }
        Command::SetTile { x, y, tile } => {
            let Some(world) = session.world.as_mut() else {
                out_events.push(Event::TileEditRejected {
                    x,
                    y,
                    reason: TileEditError::NoWorld,
                });
                return;
            };

            let grid = world.grid_mut();
            if !grid.contains(i64::from(x), i64::from(y)) {
                out_events.push(Event::TileEditRejected {
                    x,
                    y,
                    reason: TileEditError::OutOfBounds,
                });
                return;
            }

            grid.set(x, y, tile);
            out_events.push(Event::TileChanged { x, y, tile });
        }
        Command::SpawnEntity { kind, position } => {
            let id = session.allocate_entity_id();
            session.entities.push(LiveEntity {
                id,
                body: Entity::new(kind, position),
            });
            tracing::debug!(
                entity = id.get(),
                ?kind,
                x = position.x,
                y = position.y,
                "entity spawned"
            );
            out_events.push(Event::EntitySpawned { entity: id, kind });
        }
        Command::RemoveEntity { entity } => match session.entity_index(entity) {
            Some(index) => {
                let _ = session.entities.remove(index);
                out_events.push(Event::EntityRemoved { entity });
            }
            None => out_events.push(Event::EntityRejected { entity }),
        },
        Command::ApplyImpulse {
            entity,
            force,
            seconds,
        } => match session.entity_mut(entity) {
            Some(body) => {
                let impulse = body.add_impulse(force, seconds);
                out_events.push(Event::ImpulseQueued { entity, impulse });
            }
            None => out_events.push(Event::EntityRejected { entity }),
        },
        Command::Tick { dt, held_keys } => {
            session.tick_index = session.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            session.tick(dt.as_secs_f32(), held_keys, out_events);
        }
    }
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use glam::Vec2;
    use tilefall_core::{EntityId, EntityKind, PlayerRecord, TileGrid, WorldRecord};
    use tilefall_system_physics::Entity;

    use super::Session;

    /// Provides read-only access to the selected world, if any.
    #[must_use]
    pub fn world_record(session: &Session) -> Option<&WorldRecord> {
        session.world.as_ref()
    }

    /// Provides read-only access to the selected world's tile grid, if any.
    #[must_use]
    pub fn tile_grid(session: &Session) -> Option<&TileGrid> {
        session.world.as_ref().map(WorldRecord::grid)
    }

    /// Provides read-only access to the selected player, if any.
    #[must_use]
    pub fn selected_player(session: &Session) -> Option<&PlayerRecord> {
        session.player.as_ref()
    }

    /// Number of ticks processed since the session was created.
    #[must_use]
    pub fn tick_index(session: &Session) -> u64 {
        session.tick_index
    }

    /// Looks up the physics state of a single entity.
    #[must_use]
    pub fn entity(session: &Session, entity: EntityId) -> Option<&Entity> {
        session
            .entities
            .iter()
            .find(|live| live.id == entity)
            .map(|live| &live.body)
    }

    /// Captures a read-only view of every live entity.
    #[must_use]
    pub fn entity_view(session: &Session) -> EntityView {
        let mut snapshots: Vec<EntitySnapshot> = session
            .entities
            .iter()
            .map(|live| EntitySnapshot {
                id: live.id,
                kind: live.body.kind(),
                position: live.body.position(),
                velocity: live.body.velocity(),
                grounded: live.body.is_grounded(),
                pending_impulse: live.body.pending_impulse(),
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        EntityView { snapshots }
    }

    /// Read-only snapshot describing all live entities.
    #[derive(Clone, Debug, Default)]
    pub struct EntityView {
        snapshots: Vec<EntitySnapshot>,
    }

    impl EntityView {
        /// Iterator over the captured snapshots in identifier order.
        pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
            self.snapshots.iter()
        }

        /// Number of captured entities.
        #[must_use]
        pub fn len(&self) -> usize {
            self.snapshots.len()
        }

        /// Reports whether no entity is alive.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.snapshots.is_empty()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<EntitySnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single entity used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct EntitySnapshot {
        /// Identifier assigned to the entity.
        pub id: EntityId,
        /// Kind of the entity.
        pub kind: EntityKind,
        /// Position in world units.
        pub position: Vec2,
        /// Velocity in world units per second.
        pub velocity: Vec2,
        /// Whether the entity rests on a solid tile.
        pub grounded: bool,
        /// Impulse still being folded into the velocity.
        pub pending_impulse: Vec2,
    }
}

/// Spawns the player a few tiles above the highest solid tile of the world's
/// centre column, or at the world origin when that column is open.
#[must_use]
pub fn player_spawn_point(world: &WorldRecord, tile_size: f32) -> Vec2 {
    let grid = world.grid();
    let (width, height) = EntityKind::Player.default_extents();
    let column = grid.width() / 2;
    let surface = if grid.width() > 0 {
        (0..grid.height()).find(|row| grid.has_solid_tile(column, *row))
    } else {
        None
    };

    match surface {
        Some(row) => Vec2::new(
            (column as f32 + 0.5) * tile_size,
            (row as f32 - height - 2.0) * tile_size,
        ),
        _ => Vec2::new(width * tile_size, 0.0),
    }
}
