//! Clamps proposed entity positions against solid tiles.
//!
//! At most one vertical and one horizontal correction is made per call. A
//! correction on one axis can reintroduce overlap on the other; that case is
//! left for the next tick.

use glam::Vec2;
use tilefall_core::TileGrid;

/// Bounding extents of an entity, measured in tiles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extents {
    /// Distance from the centre line to each horizontal probe.
    pub width: f32,
    /// Distance from the top edge to the bottom edge.
    pub height: f32,
}

/// Outcome of clamping a candidate position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
    /// Position to commit.
    pub position: Vec2,
    /// Whether the entity rests on a solid tile, or `None` when the candidate
    /// fell outside the world and no clamp was attempted.
    pub grounded: Option<bool>,
}

/// Clamps `candidate` so the entity does not sink into solid tiles.
///
/// `previous` is the position committed on the prior tick. Every row of the
/// entity's column between the previous and the proposed bottom edge is
/// probed, so a fast fall stops on the first solid row it crosses. Components
/// of `velocity` are zeroed on the axes that were corrected.
#[must_use]
pub fn resolve(
    previous: Vec2,
    candidate: Vec2,
    extents: Extents,
    velocity: &mut Vec2,
    grid: &TileGrid,
    tile_size: f32,
) -> Resolution {
    let mut position = candidate;
    let tile_x = candidate.x / tile_size;
    let ground_y = (candidate.y / tile_size + extents.height).floor();
    let column = tile_x.floor();

    let Some((column, ground_row)) = grid_cell(grid, column, ground_y) else {
        tracing::trace!(
            x = candidate.x,
            y = candidate.y,
            "candidate outside world, skipping clamp"
        );
        return Resolution {
            position,
            grounded: None,
        };
    };

    let previous_row = (previous.y / tile_size + extents.height).floor();
    let first_row = if previous_row.is_finite() {
        previous_row.clamp(0.0, ground_y) as u32
    } else {
        ground_row
    };
    let landing_row = (first_row..=ground_row).find(|row| grid.has_solid_tile(column, *row));

    if let Some(row) = landing_row {
        position.y = (row as f32 - extents.height) * tile_size;
        velocity.y = 0.0;
    }

    clamp_horizontal(&mut position, extents, velocity, grid, tile_size);

    Resolution {
        position,
        grounded: Some(landing_row.is_some()),
    }
}

fn clamp_horizontal(
    position: &mut Vec2,
    extents: Extents,
    velocity: &mut Vec2,
    grid: &TileGrid,
    tile_size: f32,
) {
    let tile_x = position.x / tile_size;
    let left = (tile_x - extents.width).floor();
    let right = (tile_x + extents.width).floor();
    let columns = 0.0..grid.width() as f32;
    if !columns.contains(&left) || !columns.contains(&right) {
        tracing::trace!(x = position.x, "horizontal probes outside world, skipping clamp");
        return;
    }

    let top = position.y / tile_size;
    let first_row = top.floor().max(0.0) as i64;
    let last_row = ((top + extents.height).ceil() - 1.0) as i64;
    let touches = |column: f32| {
        (first_row..=last_row).any(|row| {
            grid.contains(column as i64, row) && grid.has_solid_tile(column as u32, row as u32)
        })
    };

    if touches(left) {
        position.x = (left + 1.0 + extents.width) * tile_size;
        velocity.x = 0.0;
    } else if touches(right) {
        position.x = (right - extents.width) * tile_size;
        velocity.x = 0.0;
    }
}

fn grid_cell(grid: &TileGrid, column: f32, row: f32) -> Option<(u32, u32)> {
    if !column.is_finite() || !row.is_finite() {
        return None;
    }
    if !grid.contains(column as i64, row as i64) {
        return None;
    }
    Some((column as u32, row as u32))
}
