#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic coherent noise used by terrain generation.
//!
//! [`Noise`] implements gradient ("improved Perlin") noise over a permutation
//! table shuffled from a seed. Identical seeds and coordinates always produce
//! identical samples, and samples vary continuously across lattice boundaries.

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

const TABLE_SIZE: usize = 256;

/// Seeded gradient noise field.
#[derive(Clone)]
pub struct Noise {
    seed: u32,
    permutation: [u8; TABLE_SIZE * 2],
}

impl Noise {
    /// Builds the noise field for `seed`.
    #[must_use]
    pub fn new(seed: u32) -> Self {
        let mut table: Vec<u8> = (0..=u8::MAX).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed));
        table.shuffle(&mut rng);

        let mut permutation = [0; TABLE_SIZE * 2];
        for (index, slot) in permutation.iter_mut().enumerate() {
            *slot = table[index % TABLE_SIZE];
        }

        Self { seed, permutation }
    }

    /// Seed the field was built from.
    #[must_use]
    pub const fn seed(&self) -> u32 {
        self.seed
    }

    /// Samples a single octave at `(x, y)` in lattice units.
    ///
    /// Samples at integer lattice points are zero; everywhere else the value
    /// stays within `[-2, 2]` and is typically within `[-1, 1]`.
    #[must_use]
    pub fn perlin(&self, x: f32, y: f32) -> f32 {
        let x_floor = x.floor();
        let y_floor = y.floor();
        let xi = lattice_index(x_floor);
        let yi = lattice_index(y_floor);
        let x = x - x_floor;
        let y = y - y_floor;
        let u = fade(x);
        let v = fade(y);

        let p = &self.permutation;
        let a = usize::from(p[xi]) + yi;
        let b = usize::from(p[xi + 1]) + yi;
        let aa = p[a];
        let ab = p[a + 1];
        let ba = p[b];
        let bb = p[b + 1];

        let bottom = lerp(u, gradient(aa, x, y), gradient(ba, x - 1.0, y));
        let top = lerp(u, gradient(ab, x, y - 1.0), gradient(bb, x - 1.0, y - 1.0));
        lerp(v, bottom, top)
    }

    /// Sums `octaves` layers of noise sampled at `(x, y)` tile coordinates.
    ///
    /// `frequency` is the feature period of the first octave in tiles. Each
    /// further octave doubles the sampling rate and scales its amplitude by
    /// `persistence`. The sum is normalised by the total amplitude, so the
    /// result stays in the range of a single octave. A non-positive
    /// `frequency` or zero `octaves` yields `0.0`.
    #[must_use]
    pub fn octave_perlin(
        &self,
        x: f32,
        y: f32,
        frequency: f32,
        octaves: u32,
        persistence: f32,
    ) -> f32 {
        if frequency <= 0.0 || !frequency.is_finite() {
            return 0.0;
        }

        let mut total = 0.0;
        let mut max_value = 0.0;
        let mut amplitude = 1.0;
        let mut scale = frequency.recip();

        for _ in 0..octaves {
            total += self.perlin(x * scale, y * scale) * amplitude;
            max_value += amplitude;
            amplitude *= persistence;
            scale *= 2.0;
        }

        if max_value == 0.0 {
            0.0
        } else {
            total / max_value
        }
    }
}

impl std::fmt::Debug for Noise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Noise").field("seed", &self.seed).finish()
    }
}

fn lattice_index(floor: f32) -> usize {
    (floor as i64).rem_euclid(TABLE_SIZE as i64) as usize
}

fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f32, a: f32, b: f32) -> f32 {
    a + t * (b - a)
}

fn gradient(hash: u8, x: f32, y: f32) -> f32 {
    match hash & 7 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}
