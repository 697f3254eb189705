//! Maps held movement keys to direction vectors.

use glam::Vec2;
use tilefall_core::{HeldKeys, MovementKey};

fn key_vector(key: MovementKey) -> Vec2 {
    match key {
        MovementKey::Left => Vec2::new(-1.0, 0.0),
        MovementKey::Right => Vec2::new(1.0, 0.0),
        MovementKey::Up => Vec2::new(0.0, -1.0),
        MovementKey::Down => Vec2::new(0.0, 1.0),
    }
}

/// Unit vector pointing where the held keys steer, or zero when they cancel out.
#[must_use]
pub fn direction(keys: HeldKeys) -> Vec2 {
    keys.iter()
        .map(key_vector)
        .fold(Vec2::ZERO, |sum, vector| sum + vector)
        .normalize_or_zero()
}

/// Like [`direction`], restricted to the left/right keys.
#[must_use]
pub fn horizontal_direction(keys: HeldKeys) -> Vec2 {
    let horizontal = keys
        .iter()
        .filter(|key| matches!(key, MovementKey::Left | MovementKey::Right));
    direction(HeldKeys::from_keys(horizontal))
}
