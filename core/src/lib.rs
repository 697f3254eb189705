#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tilefall engine.
//!
//! This crate defines the data model and the message surface that connects
//! adapters, the authoritative session, and pure systems. The [`TileGrid`] is
//! the single source of truth for terrain; [`WorldRecord`] and
//! [`PlayerRecord`] are the shapes handed to the persistence adapter. Adapters
//! submit [`Command`] values describing desired mutations, the session
//! executes them via its `apply` entry point and reports the outcome through
//! [`Event`] values.

use std::{num::NonZeroU32, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};

mod record;

pub use record::{Difficulty, PlayerRecord, RecordError, WorldRecord};

/// Identifier stored in every cell of the tile grid.
///
/// `0` is reserved for air. Every other value is collidable; the mapping from
/// an identifier to a concrete block type lives outside the core.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TileId(u16);

impl TileId {
    /// Empty cell that entities pass through.
    pub const AIR: Self = Self(0);
    /// Base material used to prefill freshly created worlds.
    pub const STONE: Self = Self(1);
    /// Material written by the default generation pass.
    pub const DIRT: Self = Self(2);

    /// Creates a tile identifier from its raw value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the raw identifier value.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }

    /// Reports whether entities collide with this tile.
    #[must_use]
    pub const fn is_solid(&self) -> bool {
        self.0 >= 1
    }
}

/// Dense rectangular grid of tiles addressed by `(x, y)`.
///
/// Tiles are stored row-major: the linear index of a cell is
/// `y * width + x`. The grid always holds exactly `width * height` tiles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<TileId>,
}

impl TileGrid {
    /// Creates a grid of the provided dimensions filled with air.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, TileId::AIR)
    }

    /// Creates a grid of the provided dimensions with every cell set to `tile`.
    #[must_use]
    pub fn filled(width: u32, height: u32, tile: TileId) -> Self {
        Self {
            width,
            height,
            tiles: vec![tile; cell_count(width, height)],
        }
    }

    /// Wraps an existing tile buffer, rejecting buffers of the wrong length.
    pub fn from_tiles(width: u32, height: u32, tiles: Vec<TileId>) -> Result<Self, RecordError> {
        let expected = cell_count(width, height);
        if tiles.len() != expected {
            return Err(RecordError::TileCountMismatch {
                width,
                height,
                expected,
                actual: tiles.len(),
            });
        }

        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.tiles.len()
    }

    /// Reports whether the signed coordinate lies inside the grid.
    #[must_use]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    /// Returns the tile stored at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics when the coordinate lies outside the grid.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> TileId {
        self.tiles[self.index(x, y)]
    }

    /// Overwrites the tile stored at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics when the coordinate lies outside the grid.
    pub fn set(&mut self, x: u32, y: u32, tile: TileId) {
        let index = self.index(x, y);
        self.tiles[index] = tile;
    }

    /// Reports whether the tile at `(x, y)` is collidable.
    ///
    /// # Panics
    ///
    /// Panics when the coordinate lies outside the grid.
    #[must_use]
    pub fn has_solid_tile(&self, x: u32, y: u32) -> bool {
        self.get(x, y).is_solid()
    }

    /// Sets every cell of the grid to `tile`.
    pub fn fill(&mut self, tile: TileId) {
        self.tiles.fill(tile);
    }

    /// Row-major view of every tile in the grid.
    #[must_use]
    pub fn tiles(&self) -> &[TileId] {
        &self.tiles
    }

    /// Counts the collidable cells.
    #[must_use]
    pub fn solid_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_solid()).count()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "tile ({x}, {y}) lies outside the {}x{} grid",
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }
}

fn cell_count(width: u32, height: u32) -> usize {
    let cells = u64::from(width) * u64::from(height);
    usize::try_from(cells).unwrap_or(usize::MAX)
}

/// One layer of procedural generation contributing to tile selection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoisePass {
    frequency: f32,
    octaves: NonZeroU32,
    persistence: f32,
    threshold: f32,
    #[serde(default = "unit_amplitude")]
    amplitude: f32,
    tile: TileId,
}

impl NoisePass {
    /// Creates a pass with unit amplitude.
    #[must_use]
    pub const fn new(
        frequency: f32,
        octaves: NonZeroU32,
        persistence: f32,
        threshold: f32,
        tile: TileId,
    ) -> Self {
        Self {
            frequency,
            octaves,
            persistence,
            threshold,
            amplitude: 1.0,
            tile,
        }
    }

    /// Default dirt layer written over the stone base of a new world.
    #[must_use]
    pub const fn dirt() -> Self {
        Self::new(150.0, FOUR_OCTAVES, 0.5, 0.0, TileId::DIRT)
    }

    /// Overrides the scale applied to this pass's noise contribution.
    #[must_use]
    pub const fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Feature period of the first octave, measured in tiles.
    #[must_use]
    pub const fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Number of summed noise layers.
    #[must_use]
    pub const fn octaves(&self) -> NonZeroU32 {
        self.octaves
    }

    /// Amplitude falloff applied to each successive octave.
    #[must_use]
    pub const fn persistence(&self) -> f32 {
        self.persistence
    }

    /// Accumulated noise value that must be exceeded before the pass writes.
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Scale applied to the pass's contribution before accumulation.
    #[must_use]
    pub const fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Tile written into cells whose accumulated noise exceeds the threshold.
    #[must_use]
    pub const fn tile(&self) -> TileId {
        self.tile
    }
}

const FOUR_OCTAVES: NonZeroU32 = match NonZeroU32::new(4) {
    Some(octaves) => octaves,
    None => unreachable!(),
};

fn unit_amplitude() -> f32 {
    1.0
}

/// Movement keys understood by the player behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKey {
    /// Walk toward decreasing x (`A`).
    Left,
    /// Walk toward increasing x (`D`).
    Right,
    /// Toward decreasing y (`W`).
    Up,
    /// Toward increasing y (`S`).
    Down,
}

impl MovementKey {
    /// Every movement key in declaration order.
    pub const ALL: [Self; 4] = [Self::Left, Self::Right, Self::Up, Self::Down];

    const fn bit(self) -> u8 {
        match self {
            Self::Left => 1,
            Self::Right => 1 << 1,
            Self::Up => 1 << 2,
            Self::Down => 1 << 3,
        }
    }
}

/// Set of movement keys held during a tick, supplied by the input adapter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HeldKeys(u8);

impl HeldKeys {
    /// No keys held.
    pub const NONE: Self = Self(0);

    /// Builds a key set from any sequence of keys.
    #[must_use]
    pub fn from_keys(keys: impl IntoIterator<Item = MovementKey>) -> Self {
        keys.into_iter().fold(Self::NONE, Self::with)
    }

    /// Returns a copy of the set with `key` added.
    #[must_use]
    pub const fn with(self, key: MovementKey) -> Self {
        Self(self.0 | key.bit())
    }

    /// Reports whether `key` is held.
    #[must_use]
    pub const fn contains(&self, key: MovementKey) -> bool {
        self.0 & key.bit() != 0
    }

    /// Reports whether no key is held.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates over the held keys in declaration order.
    pub fn iter(self) -> impl Iterator<Item = MovementKey> {
        MovementKey::ALL
            .into_iter()
            .filter(move |key| self.contains(*key))
    }
}

/// Unique identifier assigned to a live entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
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

/// Kinds of simulated entities sharing the physics pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Input-driven character; falls under gravity and walks with held keys.
    Player,
    /// Passive body with no behaviour beyond the shared pipeline.
    Prop {
        /// Whether the deep pulls on this prop.
        applies_gravity: bool,
    },
}

impl EntityKind {
    /// Reports whether gravity acts on entities of this kind.
    #[must_use]
    pub const fn applies_gravity(self) -> bool {
        match self {
            Self::Player => true,
            Self::Prop { applies_gravity } => applies_gravity,
        }
    }

    /// Bounding extents `(width, height)` in tile units for a freshly spawned entity.
    #[must_use]
    pub const fn default_extents(self) -> (f32, f32) {
        match self {
            Self::Player => (0.5, 3.0),
            Self::Prop { .. } => (0.5, 1.0),
        }
    }
}

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Makes the provided world the active simulation context.
    SelectWorld {
        /// World record whose grid becomes authoritative.
        record: WorldRecord,
    },
    /// Drops the active world; entities keep moving without gravity or collision.
    ClearWorld,
    /// Marks the provided player as the session's active player.
    SelectPlayer {
        /// Player record to activate.
        record: PlayerRecord,
    },
    /// Runs terrain generation over the active world.
    GenerateTerrain {
        /// Seed threaded into the noise field.
        seed: u32,
    },
    /// Overwrites a single tile between ticks.
    SetTile {
        /// Column of the edited tile.
        x: u32,
        /// Row of the edited tile.
        y: u32,
        /// Tile to store.
        tile: TileId,
    },
    /// Adds a new entity to the simulation.
    SpawnEntity {
        /// Kind of entity to create.
        kind: EntityKind,
        /// Initial position in world units.
        position: Vec2,
    },
    /// Removes an entity from play.
    RemoveEntity {
        /// Identifier of the entity to remove.
        entity: EntityId,
    },
    /// Queues an impulse that is folded into the entity's velocity over upcoming ticks.
    ApplyImpulse {
        /// Identifier of the receiving entity.
        entity: EntityId,
        /// Force applied, in world units.
        force: Vec2,
        /// Duration the force acts for, in seconds.
        seconds: f32,
    },
    /// Advances every entity by one simulation step.
    Tick {
        /// Simulated time elapsed since the previous tick.
        dt: Duration,
        /// Movement keys held during this tick.
        held_keys: HeldKeys,
    },
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a world became the active context.
    WorldSelected {
        /// Number of tile columns in the world.
        width: u32,
        /// Number of tile rows in the world.
        height: u32,
    },
    /// Confirms that the active world was dropped.
    WorldCleared,
    /// Confirms that a player became active.
    PlayerSelected {
        /// Name of the selected player.
        name: String,
    },
    /// Confirms that terrain generation completed.
    TerrainGenerated {
        /// Seed used for the run.
        seed: u32,
        /// Number of tile writes performed across all passes.
        cells_written: u64,
    },
    /// Reports that terrain generation was refused.
    GenerationRejected {
        /// Seed provided in the request.
        seed: u32,
        /// Specific reason generation was refused.
        reason: GenerationError,
    },
    /// Confirms that a tile was overwritten.
    TileChanged {
        /// Column of the edited tile.
        x: u32,
        /// Row of the edited tile.
        y: u32,
        /// Tile now stored in the cell.
        tile: TileId,
    },
    /// Reports that a tile edit was refused.
    TileEditRejected {
        /// Column provided in the request.
        x: u32,
        /// Row provided in the request.
        y: u32,
        /// Specific reason the edit failed.
        reason: TileEditError,
    },
    /// Confirms that an entity joined the simulation.
    EntitySpawned {
        /// Identifier allocated to the entity.
        entity: EntityId,
        /// Kind of the entity.
        kind: EntityKind,
    },
    /// Confirms that an entity left the simulation.
    EntityRemoved {
        /// Identifier of the removed entity.
        entity: EntityId,
    },
    /// Confirms that an impulse was queued on an entity.
    ImpulseQueued {
        /// Identifier of the receiving entity.
        entity: EntityId,
        /// Impulse added to the entity's pending total.
        impulse: Vec2,
    },
    /// Reports that a command referenced an entity that does not exist.
    EntityRejected {
        /// Identifier provided in the request.
        entity: EntityId,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an entity changed position during a tick.
    EntityMoved {
        /// Identifier of the entity that moved.
        entity: EntityId,
        /// Position before the tick.
        from: Vec2,
        /// Position committed by the tick.
        to: Vec2,
    },
    /// Announces that an entity came to rest on a solid tile.
    EntityLanded {
        /// Identifier of the entity that landed.
        entity: EntityId,
    },
    /// Announces that a grounded entity lost contact with the ground.
    EntityLeftGround {
        /// Identifier of the entity that became airborne.
        entity: EntityId,
    },
}

/// Reasons a generation request may be rejected by the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GenerationError {
    /// No world is selected.
    NoWorld,
    /// Entities already inhabit the world; generation only runs before they exist.
    EntitiesPresent,
}

/// Reasons a tile edit may be rejected by the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileEditError {
    /// No world is selected.
    NoWorld,
    /// The coordinate lies outside the world.
    OutOfBounds,
}

#[cfg(test)]
mod tests {
    use super::{HeldKeys, MovementKey, NoisePass, TileGrid, TileId};

    #[test]
    fn linear_index_is_row_major() {
        let mut grid = TileGrid::new(4, 3);
        grid.set(1, 2, TileId::STONE);

        assert_eq!(grid.tiles()[2 * 4 + 1], TileId::STONE);
        assert!(grid.has_solid_tile(1, 2));
        assert!(!grid.has_solid_tile(2, 1));
    }

    #[test]
    fn grid_holds_width_times_height_tiles() {
        let grid = TileGrid::filled(7, 5, TileId::STONE);
        assert_eq!(grid.cell_count(), 35);
        assert_eq!(grid.solid_count(), 35);
    }

    #[test]
    fn degenerate_grid_is_empty() {
        let grid = TileGrid::new(0, 12);
        assert!(grid.tiles().is_empty());
        assert!(!grid.contains(0, 0));
    }

    #[test]
    #[should_panic(expected = "outside the 4x4 grid")]
    fn out_of_bounds_read_panics() {
        let grid = TileGrid::new(4, 4);
        let _ = grid.get(4, 0);
    }

    #[test]
    #[should_panic(expected = "outside the 2x3 grid")]
    fn out_of_bounds_write_panics() {
        let mut grid = TileGrid::new(2, 3);
        grid.set(0, 3, TileId::DIRT);
    }

    #[test]
    fn from_tiles_rejects_length_mismatch() {
        let tiles = vec![TileId::AIR; 5];
        assert!(TileGrid::from_tiles(2, 3, tiles).is_err());
    }

    #[test]
    fn contains_rejects_negative_coordinates() {
        let grid = TileGrid::new(3, 3);
        assert!(grid.contains(2, 2));
        assert!(!grid.contains(-1, 0));
        assert!(!grid.contains(0, 3));
    }

    #[test]
    fn only_air_is_passable() {
        assert!(!TileId::AIR.is_solid());
        assert!(TileId::STONE.is_solid());
        assert!(TileId::new(u16::MAX).is_solid());
    }

    #[test]
    fn dirt_pass_matches_reference_tuning() {
        let pass = NoisePass::dirt();
        assert_eq!(pass.frequency(), 150.0);
        assert_eq!(pass.octaves().get(), 4);
        assert_eq!(pass.persistence(), 0.5);
        assert_eq!(pass.threshold(), 0.0);
        assert_eq!(pass.amplitude(), 1.0);
        assert_eq!(pass.tile(), TileId::DIRT);
    }

    #[test]
    fn held_keys_iterate_in_declaration_order() {
        let keys = HeldKeys::from_keys([MovementKey::Down, MovementKey::Left]);
        let held: Vec<_> = keys.iter().collect();
        assert_eq!(held, vec![MovementKey::Left, MovementKey::Down]);
        assert!(!keys.contains(MovementKey::Up));
        assert!(HeldKeys::NONE.is_empty());
    }
}
