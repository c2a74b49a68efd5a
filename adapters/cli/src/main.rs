#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Setlerio session.
//!
//! The session generates terrain, founds a town center at the origin, orders a
//! tower through the tile menu and asks carriers to haul wood home, then steps
//! the simulation on a simulated wall clock and prints a summary.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use setlerio_core::{
    BuildingKind, Command, Event, HexCoord, Occupant, ResourceCounts, ResourceKind,
    SimulationConfig,
};
use setlerio_system_builder::{Builder, BuilderInput};
use setlerio_system_terrain::TerrainGenerator;
use setlerio_world::{self as world, clock::FrameGate, query, World};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const TOWER_SITE: HexCoord = HexCoord::new(1, 1);
const WOOD_NODE: HexCoord = HexCoord::new(3, 0);
const WOOD_NODE_UNITS: u32 = 5;
const HAULED_WOOD: u32 = 3;

/// Runs a scripted Setlerio session without a window.
#[derive(Debug, Parser)]
#[command(name = "setlerio", version, about)]
struct CliArgs {
    /// TOML file with simulation settings. Defaults apply when it is missing.
    #[arg(long, value_name = "PATH", default_value = "setlerio.toml")]
    config: PathBuf,
    /// Overrides the terrain seed from the configuration.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of wall-clock frames to simulate.
    #[arg(long, default_value_t = 600)]
    frames: u64,
    /// Simulated milliseconds between frames.
    #[arg(long, value_name = "MS", default_value_t = 16)]
    frame_ms: u64,
    /// Abort on the first rejected command.
    #[arg(long, conflicts_with = "lenient")]
    strict: bool,
    /// Log rejected commands and keep going.
    #[arg(long)]
    lenient: bool,
}

impl CliArgs {
    fn strict(&self) -> bool {
        if self.strict {
            true
        } else if self.lenient {
            false
        } else {
            cfg!(debug_assertions)
        }
    }
}

/// Entry point for the Setlerio command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    let mut config = load_config(&args.config)?;
    if let Some(seed) = args.seed {
        config.terrain.seed = seed;
    }

    let mut session = Session::new(config, args.strict())?;
    session.run(args.frames, args.frame_ms)?;
    session.print_summary();
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn load_config(path: &Path) -> Result<SimulationConfig> {
    if !path.exists() {
        info!(path = %path.display(), "no configuration file, using defaults");
        return Ok(SimulationConfig::default());
    }

    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration from {}", path.display()))?;
    SimulationConfig::from_toml_str(&source)
        .with_context(|| format!("invalid configuration in {}", path.display()))
}

struct Session {
    world: World,
    builder: Builder,
    strict: bool,
    delivered: u32,
    rejections: usize,
}

impl Session {
    fn new(config: SimulationConfig, strict: bool) -> Result<Self> {
        let terrain = TerrainGenerator::new(config.terrain.clone()).command();
        let mut session = Self {
            world: World::new(config),
            builder: Builder::new(),
            strict,
            delivered: 0,
            rejections: 0,
        };

        println!("{}", query::welcome_banner(&session.world));
        session.apply(terrain)?;
        session.apply(Command::PlaceInfluenceOwner {
            hex: HexCoord::ORIGIN,
            kind: BuildingKind::TownCenter,
        })?;
        session.apply(Command::PlaceOccupant {
            hex: WOOD_NODE,
            occupant: Occupant::ResourceNode(ResourceCounts::single(
                ResourceKind::Wood,
                WOOD_NODE_UNITS,
            )),
        })?;
        session.apply(Command::RequestHaul {
            destination: HexCoord::ORIGIN,
            counts: ResourceCounts::single(ResourceKind::Wood, HAULED_WOOD),
        })?;
        Ok(session)
    }

    fn run(&mut self, frames: u64, frame_ms: u64) -> Result<()> {
        let mut gate = FrameGate::new(query::config(&self.world).tick_rate);
        let mut menu_step = 0;

        for frame in 0..frames {
            let now_ms = frame.saturating_mul(frame_ms);
            if !gate.try_begin_frame(now_ms) {
                continue;
            }

            let input = scripted_input(menu_step);
            menu_step += 1;
            let mut commands = Vec::new();
            let world = &self.world;
            self.builder
                .handle(input, |hex| query::tile_info(world, hex), &mut commands);
            for command in commands {
                self.apply(command)?;
            }

            self.apply(Command::Tick)?;
        }
        Ok(())
    }

    fn apply(&mut self, command: Command) -> Result<()> {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        for event in events {
            self.observe(event)?;
        }
        Ok(())
    }

    fn observe(&mut self, event: Event) -> Result<()> {
        match event {
            Event::CommandRejected { reason } => {
                self.rejections += 1;
                if self.strict {
                    bail!("command rejected: {reason}");
                }
                warn!(%reason, "continuing after rejected command");
            }
            Event::BuildRejected { hex, kind, missing } => {
                info!(%hex, %kind, %missing, "build refused");
            }
            Event::ConstructionCompleted { hex, kind } => {
                info!(%hex, %kind, "construction completed");
            }
            Event::HaulDelivered { resource, .. } => {
                if resource == ResourceKind::Wood {
                    self.delivered += 1;
                }
            }
            Event::TimeAdvanced { .. } => {}
            other => debug!(?other, "event"),
        }
        Ok(())
    }

    fn print_summary(&self) {
        let world = &self.world;
        println!("ticks simulated: {}", query::current_tick(world));
        println!(
            "territory: {} occupied tiles, {} border tiles",
            query::occupied_tiles(world),
            query::border(world).len()
        );
        match query::occupant(world, TOWER_SITE) {
            Some(Occupant::Building { kind, stage }) => {
                println!("{TOWER_SITE}: {kind} ({stage:?})");
            }
            other => println!("{TOWER_SITE}: {other:?}"),
        }
        if let Some(job) = query::construction(world, TOWER_SITE) {
            println!("  {:.0}% built", job.progress * 100.0);
        }
        println!(
            "wood delivered: {}/{HAULED_WOOD}, outstanding: {}",
            self.delivered,
            query::outstanding_hauls(world).get(ResourceKind::Wood)
        );
        let resources: Vec<String> = query::resources(world)
            .iter()
            .map(|(kind, amount)| format!("{kind} {amount}"))
            .collect();
        println!("stock: {}", resources.join(", "));
        println!("rejected commands: {}", self.rejections);
    }
}

/// Player input replayed on consecutive simulated frames.
fn scripted_input(step: u32) -> BuilderInput {
    match step {
        0 => BuilderInput {
            hovered: Some(TOWER_SITE),
            clicked: Some(TOWER_SITE),
            ..BuilderInput::default()
        },
        // "Build" submenu, then its second row.
        1 => BuilderInput {
            chosen_option: Some(0),
            ..BuilderInput::default()
        },
        2 => BuilderInput {
            chosen_option: Some(1),
            ..BuilderInput::default()
        },
        _ => BuilderInput::default(),
    }
}
