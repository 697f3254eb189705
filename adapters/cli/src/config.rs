//! TOML configuration shared by every subcommand.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use tilefall_core::NoisePass;
use tilefall_system_physics::PhysicsTuning;
use tilefall_system_terrain::Generator;
use tilefall_world::SessionConfig;

/// Top-level configuration file layout.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TilefallConfig {
    pub(crate) generation: GenerationConfig,
    pub(crate) physics: PhysicsTuning,
}

/// Terrain generation section.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GenerationConfig {
    pub(crate) passes: Vec<NoisePass>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            passes: Generator::default().passes().to_vec(),
        }
    }
}

impl TilefallConfig {
    /// Reads the file at `path`, or falls back to defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            passes = config.generation.passes.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub(crate) fn generator(&self) -> Generator {
        Generator::new(self.generation.passes.clone())
    }

    pub(crate) fn session_config(&self) -> SessionConfig {
        SessionConfig {
            generator: self.generator(),
            physics: self.physics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilefall_core::TileId;

    #[test]
    fn empty_file_yields_defaults() {
        let config = TilefallConfig::parse("").expect("parse");

        assert_eq!(config, TilefallConfig::default());
        assert_eq!(config.generation.passes, vec![NoisePass::dirt()]);
        assert_eq!(config.physics, PhysicsTuning::default());
    }

    #[test]
    fn passes_and_physics_overrides_are_read() {
        let config = TilefallConfig::parse(
            r#"
            [[generation.passes]]
            frequency = 150.0
            octaves = 4
            persistence = 0.5
            threshold = 0.0
            tile = 2

            [[generation.passes]]
            frequency = 12.0
            octaves = 2
            persistence = 0.25
            threshold = 0.4
            amplitude = 0.5
            tile = 0

            [physics]
            tile_size = 16.0
            player_speed = 55.0
            "#,
        )
        .expect("parse");

        let passes = &config.generation.passes;
        assert_eq!(passes.len(), 2);
        assert_eq!(passes[0], NoisePass::dirt());
        assert_eq!(passes[1].tile(), TileId::AIR);
        assert_eq!(passes[1].amplitude(), 0.5);
        assert_eq!(passes[1].octaves().get(), 2);
        assert_eq!(config.physics.tile_size, 16.0);
        assert_eq!(config.physics.player_speed, 55.0);
        assert_eq!(
            config.physics.gravity_constant,
            PhysicsTuning::default().gravity_constant
        );
    }

    #[test]
    fn zero_octaves_are_rejected() {
        let error = TilefallConfig::parse(
            r#"
            [[generation.passes]]
            frequency = 10.0
            octaves = 0
            persistence = 0.5
            threshold = 0.0
            tile = 1
            "#,
        );

        assert!(error.is_err());
    }

    #[test]
    fn unknown_sections_are_rejected() {
        assert!(TilefallConfig::parse("[render]\nscale = 2").is_err());
    }

    #[test]
    fn missing_file_reports_its_path() {
        let directory = tempfile::tempdir().expect("tempdir");
        let path = directory.path().join("missing.toml");

        let error = TilefallConfig::load(Some(&path)).expect_err("must fail");

        assert!(format!("{error:#}").contains("missing.toml"));
    }

    #[test]
    fn config_file_feeds_session_config() {
        let directory = tempfile::tempdir().expect("tempdir");
        let path = directory.path().join("tilefall.toml");
        fs::write(&path, "[physics]\nmin_distance_tiles = 2.0\n").expect("write");

        let config = TilefallConfig::load(Some(&path)).expect("load");
        let session = config.session_config();

        assert_eq!(session.physics.min_distance_tiles, 2.0);
        assert_eq!(session.generator, Generator::default());
    }
}
