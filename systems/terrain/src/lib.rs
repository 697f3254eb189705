#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic terrain generation driven by layered noise passes.
//!
//! Generation walks every cell of a [`TileGrid`] in raster order and feeds it
//! through the configured [`NoisePass`] sequence. The noise value accumulates
//! across passes within a cell: each pass adds its contribution and then tests
//! the running total against its own threshold, writing its tile whenever the
//! total is exceeded. Later passes therefore overwrite earlier ones.

use tilefall_core::{NoisePass, TileGrid};
use tilefall_system_noise::Noise;

/// Pure system that rewrites a grid's tiles from an ordered list of passes.
#[derive(Clone, Debug, PartialEq)]
pub struct Generator {
    passes: Vec<NoisePass>,
}

impl Generator {
    /// Creates a generator that applies `passes` in order.
    #[must_use]
    pub fn new(passes: Vec<NoisePass>) -> Self {
        Self { passes }
    }

    /// Passes applied by this generator, in order.
    #[must_use]
    pub fn passes(&self) -> &[NoisePass] {
        &self.passes
    }

    /// Rewrites `grid` in place from the noise field of `seed`.
    pub fn generate(&self, seed: u32, grid: &mut TileGrid) -> GenerationReport {
        generate(seed, grid, &self.passes)
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(vec![NoisePass::dirt()])
    }
}

/// Summary of a generation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Number of tile writes performed, counting overwrites.
    pub cells_written: u64,
    /// Number of writes performed by each pass, in pass order.
    pub per_pass_writes: Vec<u64>,
}

/// Rewrites `grid` in place from the noise field of `seed` using `passes`.
///
/// Cells where no pass fires keep whatever tile they held before the call.
pub fn generate(seed: u32, grid: &mut TileGrid, passes: &[NoisePass]) -> GenerationReport {
    let noise = Noise::new(seed);
    let mut report = GenerationReport {
        cells_written: 0,
        per_pass_writes: vec![0; passes.len()],
    };

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let mut noise_value = 0.0;
            for (index, pass) in passes.iter().enumerate() {
                noise_value += pass.amplitude()
                    * noise.octave_perlin(
                        x as f32,
                        y as f32,
                        pass.frequency(),
                        pass.octaves().get(),
                        pass.persistence(),
                    );

                if noise_value > pass.threshold() {
                    grid.set(x, y, pass.tile());
                    report.per_pass_writes[index] += 1;
                    report.cells_written += 1;
                }
            }
        }
    }

    tracing::debug!(
        seed,
        width = grid.width(),
        height = grid.height(),
        passes = passes.len(),
        cells_written = report.cells_written,
        "terrain generated"
    );

    report
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;
    use tilefall_core::TileId;

    fn octaves(count: u32) -> NonZeroU32 {
        NonZeroU32::new(count).expect("non-zero octaves")
    }

    #[test]
    fn default_generator_uses_single_dirt_pass() {
        assert_eq!(Generator::default().passes(), &[NoisePass::dirt()]);
    }

    #[test]
    fn passes_never_firing_leave_prefill_untouched() {
        let mut grid = TileGrid::filled(16, 12, TileId::STONE);
        let unreachable = NoisePass::new(6.0, octaves(3), 0.5, 10.0, TileId::DIRT);

        let report = generate(4, &mut grid, &[unreachable]);

        assert_eq!(report.cells_written, 0);
        assert_eq!(grid, TileGrid::filled(16, 12, TileId::STONE));
    }

    #[test]
    fn negative_threshold_always_fires() {
        let mut grid = TileGrid::new(9, 7);
        let always = NoisePass::new(6.0, octaves(2), 0.5, -10.0, TileId::DIRT);

        let report = generate(4, &mut grid, &[always]);

        assert_eq!(report.cells_written, 63);
        assert!(grid.tiles().iter().all(|tile| *tile == TileId::DIRT));
    }

    #[test]
    fn later_passes_win_when_both_fire() {
        let mut grid = TileGrid::new(8, 8);
        let first = NoisePass::new(5.0, octaves(2), 0.5, -10.0, TileId::DIRT);
        let second = NoisePass::new(5.0, octaves(2), 0.5, -20.0, TileId::STONE);

        let report = generate(12, &mut grid, &[first, second]);

        assert_eq!(report.per_pass_writes, vec![64, 64]);
        assert!(grid.tiles().iter().all(|tile| *tile == TileId::STONE));
    }

    #[test]
    fn contributions_accumulate_across_passes() {
        let seed = 21;
        let pass = NoisePass::new(7.0, octaves(3), 0.5, f32::MAX, TileId::DIRT);
        let second = NoisePass::new(7.0, octaves(3), 0.5, 0.0, TileId::STONE);
        let noise = Noise::new(seed);

        let mut grid = TileGrid::new(10, 10);
        let _ = generate(seed, &mut grid, &[pass, second]);

        for y in 0..10 {
            for x in 0..10 {
                let single = noise.octave_perlin(x as f32, y as f32, 7.0, 3, 0.5);
                let expected = if single + single > 0.0 {
                    TileId::STONE
                } else {
                    TileId::AIR
                };
                assert_eq!(grid.get(x, y), expected, "cell ({x}, {y})");
            }
        }
    }

    #[test]
    fn amplitude_scales_the_contribution() {
        let mut grid = TileGrid::new(12, 12);
        let muted = NoisePass::dirt().with_amplitude(0.0);

        let report = generate(7, &mut grid, &[muted]);

        assert_eq!(report.cells_written, 0);
    }
}
