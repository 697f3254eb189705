//! Human readable summaries of stored worlds.

use std::{collections::BTreeMap, fmt::Write as _};

use tilefall_core::{TileGrid, TileId, WorldRecord};

/// Counts how many cells hold each tile id.
pub(crate) fn tile_histogram(grid: &TileGrid) -> BTreeMap<TileId, usize> {
    let mut histogram = BTreeMap::new();
    for tile in grid.tiles() {
        *histogram.entry(*tile).or_insert(0) += 1;
    }
    histogram
}

fn tile_glyph(tile: TileId) -> char {
    match tile {
        TileId::AIR => '.',
        TileId::STONE => '#',
        TileId::DIRT => '%',
        _ => '?',
    }
}

fn tile_label(tile: TileId) -> String {
    match tile {
        TileId::AIR => "air".to_owned(),
        TileId::STONE => "stone".to_owned(),
        TileId::DIRT => "dirt".to_owned(),
        other => format!("tile {}", other.get()),
    }
}

/// Renders the grid one text line per row.
pub(crate) fn ascii_map(grid: &TileGrid) -> String {
    let mut map = String::with_capacity(grid.cell_count() + grid.height() as usize);
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            map.push(tile_glyph(grid.get(x, y)));
        }
        map.push('\n');
    }
    map
}

/// Multi-line description of a world: header, histogram and optional map.
pub(crate) fn describe(record: &WorldRecord, ascii: bool) -> String {
    let grid = record.grid();
    let mut report = String::new();
    let _ = writeln!(
        report,
        "{} ({:?}): {}x{} tiles, {} solid",
        record.name(),
        record.difficulty(),
        grid.width(),
        grid.height(),
        grid.solid_count()
    );
    for (tile, count) in tile_histogram(grid) {
        let _ = writeln!(report, "  {:>8}: {count}", tile_label(tile));
    }
    if ascii {
        report.push_str(&ascii_map(grid));
    }
    report
}
