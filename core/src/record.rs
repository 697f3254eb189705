//! Persisted shapes of worlds and players.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{TileGrid, TileId};

/// Difficulty chosen when a world is created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    /// Default difficulty.
    #[default]
    Easy,
    /// Intermediate difficulty.
    Normal,
    /// Hardest difficulty.
    Hard,
}

/// Errors raised when a record violates the grid invariants.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The tile buffer does not hold exactly `width * height` entries.
    #[error("a {width}x{height} world needs {expected} tiles but the record holds {actual}")]
    TileCountMismatch {
        /// Declared number of columns.
        width: u32,
        /// Declared number of rows.
        height: u32,
        /// Tile count implied by the dimensions.
        expected: usize,
        /// Tile count found in the record.
        actual: usize,
    },
}

/// Everything persisted about a world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WorldRecordRepr", into = "WorldRecordRepr")]
pub struct WorldRecord {
    name: String,
    difficulty: Difficulty,
    grid: TileGrid,
}

impl WorldRecord {
    /// Creates a record around an existing grid.
    #[must_use]
    pub fn new(name: impl Into<String>, difficulty: Difficulty, grid: TileGrid) -> Self {
        Self {
            name: name.into(),
            difficulty,
            grid,
        }
    }

    /// Display name of the world.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Difficulty chosen at creation.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Terrain of the world.
    #[must_use]
    pub const fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Mutable access to the terrain.
    pub fn grid_mut(&mut self) -> &mut TileGrid {
        &mut self.grid
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.grid.width()
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.grid.height()
    }
}

/// Flat on-disk layout of a [`WorldRecord`].
#[derive(Clone, Debug, Serialize, Deserialize)]
struct WorldRecordRepr {
    name: String,
    difficulty: Difficulty,
    world_width: u32,
    world_height: u32,
    tiles: Vec<u16>,
}

impl TryFrom<WorldRecordRepr> for WorldRecord {
    type Error = RecordError;

    fn try_from(repr: WorldRecordRepr) -> Result<Self, Self::Error> {
        let tiles = repr.tiles.into_iter().map(TileId::new).collect();
        let grid = TileGrid::from_tiles(repr.world_width, repr.world_height, tiles)?;
        Ok(Self {
            name: repr.name,
            difficulty: repr.difficulty,
            grid,
        })
    }
}

impl From<WorldRecord> for WorldRecordRepr {
    fn from(record: WorldRecord) -> Self {
        Self {
            world_width: record.grid.width(),
            world_height: record.grid.height(),
            tiles: record.grid.tiles().iter().map(TileId::get).collect(),
            name: record.name,
            difficulty: record.difficulty,
        }
    }
}

/// Everything persisted about a player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    name: String,
}

impl PlayerRecord {
    /// Creates a player record.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Display name of the player.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
