#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for creating, inspecting and simulating Tilefall worlds.

mod config;
mod inspect;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec2;
use tilefall_core::{Command, Difficulty, EntityKind, Event, HeldKeys, MovementKey, PlayerRecord};
use tilefall_world::{apply, new_world, player_spawn_point, query, Session};

use crate::config::TilefallConfig;

#[derive(Debug, Parser)]
#[command(name = "tilefall")]
#[command(about = "Create, inspect and simulate Tilefall worlds")]
struct Cli {
    /// TOML file overriding generation passes and physics tuning.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fill a new world with stone, run terrain generation and save it
    NewWorld {
        #[arg(long)]
        name: String,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// Generation seed; a random one is drawn when omitted
        #[arg(long)]
        seed: Option<u32>,
        #[arg(long, value_enum, default_value_t = DifficultyArg::Easy)]
        difficulty: DifficultyArg,
        #[arg(long)]
        out: PathBuf,
        /// Replace an existing file at `--out`
        #[arg(long)]
        force: bool,
    },
    /// Save a new player record
    NewPlayer {
        #[arg(long)]
        name: String,
        #[arg(long)]
        out: PathBuf,
        /// Replace an existing file at `--out`
        #[arg(long)]
        force: bool,
    },
    /// Print dimensions and a tile histogram of a saved world
    Inspect {
        #[arg(long)]
        world: PathBuf,
        /// Also dump the map, one character per tile
        #[arg(long)]
        ascii: bool,
    },
    /// Drop the player into a saved world and run the physics headlessly
    Simulate {
        #[arg(long)]
        world: PathBuf,
        #[arg(long, default_value_t = 600)]
        ticks: u32,
        /// Seconds per tick
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,
        /// Spawn x in world units; defaults to above the centre column
        #[arg(long, requires = "y")]
        x: Option<f32>,
        /// Spawn y in world units
        #[arg(long, requires = "x")]
        y: Option<f32>,
        /// Movement keys held for the whole run, e.g. "d" or "aw"
        #[arg(long, value_parser = parse_held_keys, default_value = "")]
        hold: HeldKeys,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DifficultyArg {
    Easy,
    Normal,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(value: DifficultyArg) -> Self {
        match value {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Normal => Difficulty::Normal,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

fn parse_held_keys(value: &str) -> Result<HeldKeys, String> {
    value
        .chars()
        .map(|key| match key.to_ascii_lowercase() {
            'a' => Ok(MovementKey::Left),
            'd' => Ok(MovementKey::Right),
            'w' => Ok(MovementKey::Up),
            's' => Ok(MovementKey::Down),
            other => Err(format!("unknown movement key '{other}', expected w/a/s/d")),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(HeldKeys::from_keys)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

/// Entry point for the Tilefall command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = TilefallConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::NewWorld {
            name,
            width,
            height,
            seed,
            difficulty,
            out,
            force,
        } => {
            let seed = seed.unwrap_or_else(rand::random);
            let record = new_world(
                name,
                difficulty.into(),
                width,
                height,
                seed,
                &config.generator(),
            );
            let saved = if force {
                tilefall_storage::write_world_file(&out, &record)
            } else {
                tilefall_storage::create_world_file(&out, &record)
            };
            saved.with_context(|| format!("failed to save world to {}", out.display()))?;
            println!("{}", inspect::describe(&record, false).trim_end());
            Ok(())
        }
        Commands::NewPlayer { name, out, force } => {
            let record = PlayerRecord::new(name);
            let saved = if force {
                tilefall_storage::write_player_file(&out, &record)
            } else {
                tilefall_storage::create_player_file(&out, &record)
            };
            saved.with_context(|| format!("failed to save player to {}", out.display()))
        }
        Commands::Inspect { world, ascii } => {
            let record = tilefall_storage::read_world_file(&world)
                .with_context(|| format!("failed to load world {}", world.display()))?;
            print!("{}", inspect::describe(&record, ascii));
            Ok(())
        }
        Commands::Simulate {
            world,
            ticks,
            dt,
            x,
            y,
            hold,
        } => {
            let record = tilefall_storage::read_world_file(&world)
                .with_context(|| format!("failed to load world {}", world.display()))?;
            let spawn = match (x, y) {
                (Some(x), Some(y)) => Vec2::new(x, y),
                _ => player_spawn_point(&record, config.physics.tile_size),
            };
            simulate(&config, record, spawn, ticks, dt, hold)
        }
    }
}

fn simulate(
    config: &TilefallConfig,
    record: tilefall_core::WorldRecord,
    spawn: Vec2,
    ticks: u32,
    dt: f32,
    held_keys: HeldKeys,
) -> Result<()> {
    let dt = match Duration::try_from_secs_f32(dt) {
        Ok(dt) if !dt.is_zero() => dt,
        _ => bail!("--dt must be a positive number of seconds, got {dt}"),
    };

    let mut session = Session::new(config.session_config());
    let mut events = Vec::new();
    apply(&mut session, Command::SelectWorld { record }, &mut events);
    apply(
        &mut session,
        Command::SpawnEntity {
            kind: EntityKind::Player,
            position: spawn,
        },
        &mut events,
    );

    let mut landings = 0_u32;
    for tick in 1..=ticks {
        events.clear();
        apply(&mut session, Command::Tick { dt, held_keys }, &mut events);
        for event in &events {
            if let Event::EntityLanded { entity } = event {
                landings += 1;
                if let Some(body) = query::entity(&session, *entity) {
                    tracing::info!(
                        tick,
                        entity = entity.get(),
                        x = body.position().x,
                        y = body.position().y,
                        "landed"
                    );
                }
            }
        }
    }

    for snapshot in query::entity_view(&session).iter() {
        println!(
            "entity {} ({:?}) at ({:.3}, {:.3}) velocity ({:.3}, {:.3}) grounded={}",
            snapshot.id.get(),
            snapshot.kind,
            snapshot.position.x,
            snapshot.position.y,
            snapshot.velocity.x,
            snapshot.velocity.y,
            snapshot.grounded
        );
    }
    tracing::info!(
        ticks = query::tick_index(&session),
        landings,
        "simulation finished"
    );
    Ok(())
}
