#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Setlerio.
//!
//! The [`World`] owns every piece of mutable simulation state: the frame
//! clock, the deferred event scheduler, the spatial registry, the claimed
//! area, the resource ledger, construction jobs, toasts, and carriers.
//! Adapters mutate it through [`apply`] and read it through [`query`].

mod area;
pub mod clock;
mod construction;
pub mod drawables;
pub mod ledger;
mod logistics;
pub mod pathfinding;
mod registry;
pub mod scheduler;
mod toast;

use std::{collections::BTreeMap, mem, ops::ControlFlow};

use setlerio_core::{
    BuildError, Command, DrawPriority, Event, HexCoord, HexLayout, PreconditionError,
    SimulationConfig, TerrainKind, WELCOME_BANNER,
};
use tracing::{debug, warn};

use crate::{
    area::InfluenceArea,
    clock::FrameClock,
    construction::ConstructionJob,
    drawables::{DrawKind, DrawableHandle, Drawables},
    ledger::ResourceLedger,
    logistics::Logistics,
    pathfinding::SearchTree,
    registry::Registry,
    scheduler::{
        run_due_events, EventCallback, EventDuration, EventHandle, Scheduler, SchedulerHost,
    },
    toast::Toasts,
};

pub use area::BorderEdge;
pub use construction::ConstructionSnapshot;
pub use logistics::{CarrierView, TripView};
pub use toast::ToastView;

/// Represents the authoritative Setlerio world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: SimulationConfig,
    layout: HexLayout,
    clock: FrameClock,
    scheduler: Scheduler<World>,
    registry: Registry,
    terrain: BTreeMap<HexCoord, (TerrainKind, DrawableHandle)>,
    area: InfluenceArea,
    ledger: ResourceLedger,
    jobs: BTreeMap<HexCoord, ConstructionJob>,
    drawables: Drawables,
    toasts: Toasts,
    logistics: Logistics,
    pending_events: Vec<Event>,
}

impl World {
    /// Creates a new world configured by `config`.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            banner: WELCOME_BANNER,
            layout: config.layout(),
            clock: FrameClock::new(config.tick_rate),
            ledger: ResourceLedger::new(config.starting_resources),
            scheduler: Scheduler::new(),
            registry: Registry::default(),
            terrain: BTreeMap::new(),
            area: InfluenceArea::default(),
            jobs: BTreeMap::new(),
            drawables: Drawables::default(),
            toasts: Toasts::default(),
            logistics: Logistics::default(),
            pending_events: Vec::new(),
            config,
        }
    }

    /// Schedules a timed callback operating on the world.
    ///
    /// The callback first runs `start_offset` ticks after the next tick.
    pub fn schedule(
        &mut self,
        start_offset: u64,
        duration: EventDuration,
        callback: EventCallback<World>,
    ) -> EventHandle {
        let now = self.clock.current_tick();
        self.scheduler.push(now, start_offset, duration, callback)
    }

    /// Schedules a timed callback at an absolute tick after the current one.
    pub fn schedule_at(
        &mut self,
        start: u64,
        duration: EventDuration,
        callback: EventCallback<World>,
    ) -> Result<EventHandle, PreconditionError> {
        let now = self.clock.current_tick();
        self.scheduler.push_at(now, start, duration, callback)
    }

    /// Cancels a scheduled callback. Unknown handles are ignored.
    pub fn cancel_event(&mut self, handle: EventHandle) -> bool {
        self.scheduler.cancel(handle)
    }

    /// Breadth-first search from `start` across occupied registry tiles.
    ///
    /// See [`pathfinding::path_find_with`] for the visiting rules.
    pub fn path_find<V>(&self, start: HexCoord, visit: V) -> SearchTree
    where
        V: FnMut(HexCoord) -> ControlFlow<()>,
    {
        pathfinding::path_find_with(start, |hex| self.registry.contains(hex), visit)
    }

    fn configure_terrain(&mut self, tiles: Vec<(HexCoord, TerrainKind)>) {
        for (_, (_, drawable)) in mem::take(&mut self.terrain) {
            self.drawables.remove(drawable);
        }
        for (hex, kind) in tiles {
            let drawable = self
                .drawables
                .push(DrawPriority::Terrain, DrawKind::Terrain, Some(hex));
            if let Some((_, previous)) = self.terrain.insert(hex, (kind, drawable)) {
                self.drawables.remove(previous);
            }
        }
        self.emit(Event::TerrainConfigured {
            tiles: self.terrain.len(),
        });
    }

    fn ticks_for(&self, duration_ms: u64) -> u64 {
        self.clock.ticks_for(duration_ms)
    }

    fn emit(&mut self, event: Event) {
        self.pending_events.push(event);
    }

    fn reject(&mut self, reason: PreconditionError) {
        warn!(%reason, "command rejected");
        self.emit(Event::CommandRejected { reason });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl SchedulerHost for World {
    fn scheduler_mut(&mut self) -> &mut Scheduler<Self> {
        &mut self.scheduler
    }
}

/// Applies the provided command to the world, mutating its state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick => {
            let now = world.clock.advance();
            world.emit(Event::TimeAdvanced { tick: now });
            run_due_events(world, now);
            world.dispatch_hauls();
        }
        Command::ConfigureTerrain { tiles } => world.configure_terrain(tiles),
        Command::PlaceInfluenceOwner { hex, kind } => {
            if let Err(reason) = world.place_influence_owner(hex, kind) {
                world.reject(reason);
            }
        }
        Command::PlaceOccupant { hex, occupant } => {
            if !world.set_occupant(hex, occupant, false) {
                debug!(%hex, "tile already occupied");
            }
        }
        Command::RequestBuild { hex, kind } => match world.request_build(hex, kind) {
            Ok(_) => {}
            Err(BuildError::Insufficient(missing)) => {
                warn!(%hex, ?kind, %missing, "build rejected");
                for shortfall in &missing.missing {
                    world.push_toast(shortfall.to_string());
                }
                world.emit(Event::BuildRejected { hex, kind, missing });
            }
            Err(BuildError::Precondition(reason)) => world.reject(reason),
        },
        Command::CancelConstruction { hex } => {
            if let Err(reason) = world.cancel_construction(hex) {
                world.reject(reason);
            }
        }
        Command::DestroyBuilding { hex } => {
            if let Err(reason) = world.destroy_building(hex) {
                world.reject(reason);
            }
        }
        Command::RequestHaul {
            destination,
            counts,
        } => world.request_haul(destination, counts),
    }

    out_events.append(&mut world.pending_events);
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use setlerio_core::{
        BuildingKind, HexCoord, HexLayout, Occupant, ResourceCounts, SimulationConfig,
        TerrainKind, TileInfo,
    };

    use super::{
        BorderEdge, CarrierView, ConstructionSnapshot, ToastView, World,
    };
    use crate::drawables::Drawable;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }

    /// Pixel layout of the hex grid.
    #[must_use]
    pub fn layout(world: &World) -> HexLayout {
        world.layout
    }

    /// Tick reached by the most recent `Tick` command.
    #[must_use]
    pub fn current_tick(world: &World) -> u64 {
        world.clock.current_tick()
    }

    /// Number of live scheduled events.
    #[must_use]
    pub fn scheduled_events(world: &World) -> usize {
        world.scheduler.len()
    }

    /// Occupant registered at the tile.
    #[must_use]
    pub fn occupant(world: &World, hex: HexCoord) -> Option<Occupant> {
        world.occupant(hex).copied()
    }

    /// Number of tiles with a registered occupant.
    #[must_use]
    pub fn occupied_tiles(world: &World) -> usize {
        world.registry.len()
    }

    /// Base terrain of the tile.
    #[must_use]
    pub fn terrain_at(world: &World, hex: HexCoord) -> Option<TerrainKind> {
        world.terrain.get(&hex).map(|(kind, _)| *kind)
    }

    /// Reports whether any influence owner claims the tile.
    #[must_use]
    pub fn is_claimed(world: &World, hex: HexCoord) -> bool {
        world.area.is_claimed(hex)
    }

    /// Influence owners and their building kinds.
    #[must_use]
    pub fn influence_owners(world: &World) -> Vec<(HexCoord, BuildingKind)> {
        world.area.owners().collect()
    }

    /// Tiles in the border set, in coordinate order.
    #[must_use]
    pub fn border(world: &World) -> Vec<HexCoord> {
        world.area.border().collect()
    }

    /// Polygon sides outlining the claimed area.
    #[must_use]
    pub fn border_edges(world: &World) -> Vec<BorderEdge> {
        world.area.border_edges()
    }

    /// Construction job running on the tile.
    #[must_use]
    pub fn construction(world: &World, hex: HexCoord) -> Option<ConstructionSnapshot> {
        world.jobs.get(&hex).map(|job| job.snapshot(hex))
    }

    /// Current resource stock.
    #[must_use]
    pub fn resources(world: &World) -> ResourceCounts {
        world.ledger.balance()
    }

    /// Snapshot of a tile consumed by input systems.
    #[must_use]
    pub fn tile_info(world: &World, hex: HexCoord) -> TileInfo {
        TileInfo {
            hex,
            occupant: world.occupant(hex).copied(),
            claimed: world.area.is_claimed(hex),
            construction: world.jobs.get(&hex).map(|job| job.target()),
        }
    }

    /// Toasts currently on screen, oldest first.
    #[must_use]
    pub fn toasts(world: &World) -> Vec<ToastView> {
        world.toasts.views()
    }

    /// Toast messages waiting for their turn to appear.
    #[must_use]
    pub fn queued_toasts(world: &World) -> usize {
        world.toasts.queued()
    }

    /// Carriers and their trips.
    #[must_use]
    pub fn carriers(world: &World) -> Vec<CarrierView> {
        world.logistics.views()
    }

    /// Resource units still waiting for a carrier.
    #[must_use]
    pub fn outstanding_hauls(world: &World) -> ResourceCounts {
        world.logistics.outstanding()
    }

    /// Drawables in draw order, culling anchored entries on invisible tiles.
    #[must_use]
    pub fn drawables<F>(world: &World, visible: F) -> Vec<Drawable>
    where
        F: FnMut(HexCoord) -> bool,
    {
        world.drawables.layered(visible)
    }

    /// Number of registered drawables.
    #[must_use]
    pub fn drawable_count(world: &World) -> usize {
        world.drawables.len()
    }
}
