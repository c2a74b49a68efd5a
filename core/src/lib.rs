#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Setlerio simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems query immutable snapshots such as
//! [`TileInfo`] and respond exclusively with new command batches.

pub mod config;
pub mod hex;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use config::{ConfigError, SimulationConfig, TerrainConfig, ToastTiming, WalkRange};
pub use hex::{
    FractionalHex, HexCoord, HexLayout, HexParseError, PixelPoint, NEIGHBOR_OFFSETS,
};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Setlerio.";

/// Unique identifier assigned to a carrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CarrierId(u32);

impl CarrierId {
    /// Creates a new carrier identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Kinds of resources tracked by the stockpile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Feeds the settlers.
    Food,
    /// Felled timber.
    Wood,
    /// Quarried stone.
    Stone,
    /// Smelted iron.
    Iron,
    /// Minted gold.
    Gold,
}

impl ResourceKind {
    /// Every resource kind in stockpile order.
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Food,
        ResourceKind::Wood,
        ResourceKind::Stone,
        ResourceKind::Iron,
        ResourceKind::Gold,
    ];

    /// Lowercase name used in player-facing messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ResourceKind::Food => "food",
            ResourceKind::Wood => "wood",
            ResourceKind::Stone => "stone",
            ResourceKind::Iron => "iron",
            ResourceKind::Gold => "gold",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Amount of every resource kind, used for stockpiles, costs, and deposits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourceCounts {
    /// Units of food.
    pub food: u32,
    /// Units of wood.
    pub wood: u32,
    /// Units of stone.
    pub stone: u32,
    /// Units of iron.
    pub iron: u32,
    /// Units of gold.
    pub gold: u32,
}

impl ResourceCounts {
    /// Counts holding `amount` units of a single kind.
    #[must_use]
    pub fn single(kind: ResourceKind, amount: u32) -> Self {
        let mut counts = Self::default();
        *counts.get_mut(kind) = amount;
        counts
    }

    /// Units of the provided kind.
    #[must_use]
    pub const fn get(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Food => self.food,
            ResourceKind::Wood => self.wood,
            ResourceKind::Stone => self.stone,
            ResourceKind::Iron => self.iron,
            ResourceKind::Gold => self.gold,
        }
    }

    /// Mutable access to the units of the provided kind.
    pub fn get_mut(&mut self, kind: ResourceKind) -> &mut u32 {
        match kind {
            ResourceKind::Food => &mut self.food,
            ResourceKind::Wood => &mut self.wood,
            ResourceKind::Stone => &mut self.stone,
            ResourceKind::Iron => &mut self.iron,
            ResourceKind::Gold => &mut self.gold,
        }
    }

    /// Iterates every kind with a non-zero amount.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, u32)> + '_ {
        ResourceKind::ALL
            .into_iter()
            .map(|kind| (kind, self.get(kind)))
            .filter(|(_, amount)| *amount > 0)
    }

    /// Sum of all units.
    #[must_use]
    pub fn total(&self) -> u32 {
        ResourceKind::ALL
            .into_iter()
            .fold(0u32, |total, kind| total.saturating_add(self.get(kind)))
    }

    /// Reports whether every amount is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Adds `other` to these counts, saturating at the numeric limit.
    pub fn add(&mut self, other: &ResourceCounts) {
        for kind in ResourceKind::ALL {
            let slot = self.get_mut(kind);
            *slot = slot.saturating_add(other.get(kind));
        }
    }

    /// Counts scaled by `fraction`, rounding every kind down.
    #[must_use]
    pub fn scaled(&self, fraction: f64) -> ResourceCounts {
        let mut scaled = ResourceCounts::default();
        for kind in ResourceKind::ALL {
            let amount = (f64::from(self.get(kind)) * fraction).floor();
            *scaled.get_mut(kind) = amount.clamp(0.0, f64::from(u32::MAX)) as u32;
        }
        scaled
    }
}

/// Shortfall of a single resource kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[error("Not enough {}", .kind.name())]
pub struct MissingResource {
    /// Kind that is short.
    pub kind: ResourceKind,
    /// Units the request needs.
    pub required: u32,
    /// Units the stockpile holds.
    pub available: u32,
}

/// Recoverable failure raised when the stockpile cannot cover a request.
///
/// Displays one `Not enough <resource>` line per short resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[error("{}", describe_missing(.missing))]
pub struct InsufficientResources {
    /// Every resource kind that is short, in stockpile order.
    pub missing: Vec<MissingResource>,
}

fn describe_missing(missing: &[MissingResource]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Base terrain covering a hex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Open grassland.
    Meadow,
    /// Woodland.
    Forest,
    /// Impassable peaks.
    Mountains,
    /// Arid sand.
    Desert,
}

/// Inner and outer claim radii of an influence owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InfluenceRadii {
    /// Tiles within this many steps are interior.
    pub inner: u32,
    /// Tiles within this many steps (and not interior) are fringe.
    pub outer: u32,
}

/// Building types known to the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Starting building that anchors the settlement.
    TownCenter,
    /// Small production building.
    LumberjackHut,
    /// Extends the claimed area.
    Tower,
}

impl BuildingKind {
    /// Every building kind in catalog order.
    pub const ALL: [BuildingKind; 3] = [
        BuildingKind::TownCenter,
        BuildingKind::LumberjackHut,
        BuildingKind::Tower,
    ];

    /// Player-facing name of the building.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            BuildingKind::TownCenter => "town center",
            BuildingKind::LumberjackHut => "lumberjack's hut",
            BuildingKind::Tower => "tower",
        }
    }

    /// Resources deducted when construction is ordered.
    #[must_use]
    pub fn requirements(self) -> ResourceCounts {
        match self {
            BuildingKind::TownCenter => ResourceCounts::default(),
            BuildingKind::LumberjackHut => ResourceCounts {
                wood: 2,
                stone: 2,
                ..ResourceCounts::default()
            },
            BuildingKind::Tower => ResourceCounts {
                wood: 2,
                stone: 3,
                ..ResourceCounts::default()
            },
        }
    }

    /// Time construction takes.
    #[must_use]
    pub const fn build_duration_ms(self) -> u64 {
        match self {
            BuildingKind::TownCenter => 0,
            BuildingKind::LumberjackHut => 3_000,
            BuildingKind::Tower => 5_000,
        }
    }

    /// Claim radii when the building is an influence owner.
    #[must_use]
    pub const fn influence(self) -> Option<InfluenceRadii> {
        match self {
            BuildingKind::TownCenter => Some(InfluenceRadii { inner: 2, outer: 3 }),
            BuildingKind::LumberjackHut => None,
            BuildingKind::Tower => Some(InfluenceRadii { inner: 1, outer: 2 }),
        }
    }

    /// Reports whether the building can never be destroyed.
    #[must_use]
    pub const fn is_indestructible(self) -> bool {
        matches!(self, BuildingKind::TownCenter)
    }

    /// Reports whether players may order this building.
    #[must_use]
    pub const fn is_orderable(self) -> bool {
        !matches!(self, BuildingKind::TownCenter)
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Lifecycle stage of a building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingStage {
    /// Construction was ordered and is still running.
    UnderConstruction,
    /// Construction finished.
    Built,
}

/// Content registered on a claimed tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupant {
    /// Claimed tile with nothing on it.
    Blank,
    /// Natural feature standing on the tile.
    TerrainFeature(TerrainKind),
    /// Building in some stage of its lifecycle.
    Building {
        /// Type of building.
        kind: BuildingKind,
        /// Stage of the building.
        stage: BuildingStage,
    },
    /// Deposit of resources waiting to be hauled.
    ResourceNode(ResourceCounts),
}

impl Occupant {
    /// Building kind when the occupant is a building in any stage.
    #[must_use]
    pub const fn building(&self) -> Option<BuildingKind> {
        match self {
            Occupant::Building { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Layers renderers draw, from back to front.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DrawPriority {
    /// Base terrain.
    Terrain,
    /// Occupants and construction progress.
    Buildings,
    /// Outline of the claimed area.
    Border,
    /// Notification toasts.
    Toasts,
    /// Tile menus.
    Menu,
}

/// Read-only snapshot of a tile used by input systems.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileInfo {
    /// Coordinate of the tile.
    pub hex: HexCoord,
    /// Registered occupant, if any.
    pub occupant: Option<Occupant>,
    /// Whether any influence owner claims the tile.
    pub claimed: bool,
    /// Target of the construction job running on the tile.
    pub construction: Option<BuildingKind>,
}

/// Actions a player can trigger from a tile menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileAction {
    /// Order construction of the provided building.
    Build(BuildingKind),
    /// Abort the construction running on the tile.
    CancelConstruction,
    /// Tear down the building on the tile.
    Destroy,
}

impl TileAction {
    /// Command that carries out the action on the provided tile.
    #[must_use]
    pub const fn into_command(self, hex: HexCoord) -> Command {
        match self {
            TileAction::Build(kind) => Command::RequestBuild { hex, kind },
            TileAction::CancelConstruction => Command::CancelConstruction { hex },
            TileAction::Destroy => Command::DestroyBuilding { hex },
        }
    }
}

/// Programmer errors raised when an operation's preconditions do not hold.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    /// An event was scheduled at or before the current tick.
    #[error("event scheduled at tick {start} which is not after the current tick {now}")]
    ScheduledInPast {
        /// Requested start tick.
        start: u64,
        /// Current tick.
        now: u64,
    },
    /// The tile is not blank or already has a construction job.
    #[error("tile {hex} is not available for construction")]
    TileUnavailable {
        /// Offending tile.
        hex: HexCoord,
    },
    /// The building kind cannot be ordered by players.
    #[error("{kind} cannot be ordered")]
    NotBuildable {
        /// Offending kind.
        kind: BuildingKind,
    },
    /// No construction job runs on the tile.
    #[error("no construction is running on tile {hex}")]
    NoConstruction {
        /// Offending tile.
        hex: HexCoord,
    },
    /// The tile holds no building.
    #[error("tile {hex} holds no building")]
    NoBuilding {
        /// Offending tile.
        hex: HexCoord,
    },
    /// The building on the tile is still under construction.
    #[error("the building on tile {hex} is not finished")]
    NotBuilt {
        /// Offending tile.
        hex: HexCoord,
    },
    /// The building on the tile cannot be destroyed.
    #[error("the {kind} on tile {hex} cannot be destroyed")]
    Indestructible {
        /// Offending tile.
        hex: HexCoord,
        /// Kind of the building.
        kind: BuildingKind,
    },
    /// No influence owner is registered at the tile.
    #[error("tile {hex} is not an influence owner")]
    NotInfluenceOwner {
        /// Offending tile.
        hex: HexCoord,
    },
    /// The building kind does not project influence.
    #[error("{kind} does not project influence")]
    NoInfluence {
        /// Offending kind.
        kind: BuildingKind,
    },
    /// A coordinate hash could not be parsed.
    #[error(transparent)]
    MalformedHash(#[from] HexParseError),
}

/// Failures raised when ordering construction.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// The stockpile cannot cover the building's requirements.
    #[error(transparent)]
    Insufficient(#[from] InsufficientResources),
    /// The request violated a precondition.
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation by exactly one tick.
    Tick,
    /// Replaces the base terrain layer.
    ConfigureTerrain {
        /// Terrain assigned to each generated tile.
        tiles: Vec<(HexCoord, TerrainKind)>,
    },
    /// Installs a finished influence-owning building, bypassing construction.
    PlaceInfluenceOwner {
        /// Tile receiving the building.
        hex: HexCoord,
        /// Kind of the building.
        kind: BuildingKind,
    },
    /// Places an occupant on a tile unless the tile is already occupied.
    PlaceOccupant {
        /// Target tile.
        hex: HexCoord,
        /// Occupant to register.
        occupant: Occupant,
    },
    /// Orders construction of a building on a blank tile.
    RequestBuild {
        /// Target tile.
        hex: HexCoord,
        /// Kind of building to construct.
        kind: BuildingKind,
    },
    /// Aborts the construction running on a tile.
    CancelConstruction {
        /// Target tile.
        hex: HexCoord,
    },
    /// Tears down a finished building.
    DestroyBuilding {
        /// Target tile.
        hex: HexCoord,
    },
    /// Asks carriers to bring resources to a tile.
    RequestHaul {
        /// Tile the resources should be delivered to.
        destination: HexCoord,
        /// Units requested.
        counts: ResourceCounts,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Tick reached after advancing.
        tick: u64,
    },
    /// Confirms that the base terrain layer was replaced.
    TerrainConfigured {
        /// Number of tiles carrying terrain.
        tiles: usize,
    },
    /// Announces a new influence owner.
    InfluenceOwnerAdded {
        /// Tile of the owner.
        hex: HexCoord,
        /// Kind of the owning building.
        kind: BuildingKind,
    },
    /// Announces that an influence owner stopped projecting influence.
    InfluenceOwnerRemoved {
        /// Tile of the former owner.
        hex: HexCoord,
        /// Kind of the former owning building.
        kind: BuildingKind,
    },
    /// Reports the size of the border set after it changed.
    BorderChanged {
        /// Number of tiles in the border set.
        tiles: usize,
    },
    /// Reports that a tile lost its claim and its occupant was removed.
    TileReleased {
        /// Released tile.
        hex: HexCoord,
        /// Occupant that was removed, if any.
        occupant: Option<Occupant>,
    },
    /// Confirms that construction started.
    ConstructionStarted {
        /// Tile under construction.
        hex: HexCoord,
        /// Kind being constructed.
        kind: BuildingKind,
        /// Number of ticks the construction takes.
        duration_ticks: u64,
    },
    /// Confirms that construction finished.
    ConstructionCompleted {
        /// Tile of the finished building.
        hex: HexCoord,
        /// Kind of the finished building.
        kind: BuildingKind,
    },
    /// Confirms that construction was aborted.
    ConstructionCancelled {
        /// Tile whose construction was aborted.
        hex: HexCoord,
        /// Kind that was being constructed.
        kind: BuildingKind,
        /// Resources returned to the stockpile.
        refunded: ResourceCounts,
    },
    /// Confirms that a finished building was destroyed.
    BuildingDestroyed {
        /// Tile of the former building.
        hex: HexCoord,
        /// Kind of the former building.
        kind: BuildingKind,
        /// Resources returned to the stockpile.
        refunded: ResourceCounts,
    },
    /// Reports that a build order could not be paid for.
    BuildRejected {
        /// Requested tile.
        hex: HexCoord,
        /// Requested kind.
        kind: BuildingKind,
        /// Shortfall that prevented the order.
        missing: InsufficientResources,
    },
    /// Reports that a command violated a precondition.
    CommandRejected {
        /// Violated precondition.
        reason: PreconditionError,
    },
    /// Announces that carriers appeared in the world.
    CarriersSpawned {
        /// Tile the carriers stand on.
        hex: HexCoord,
        /// Number of carriers spawned.
        count: u32,
    },
    /// Confirms that a carrier set off to fetch a resource unit.
    CarrierDispatched {
        /// Carrier performing the trip.
        carrier: CarrierId,
        /// Tile the carrier started from.
        from: HexCoord,
        /// Resource node the unit was reserved from.
        source: HexCoord,
        /// Tile the unit is delivered to.
        destination: HexCoord,
        /// Kind of the carried unit.
        resource: ResourceKind,
    },
    /// Confirms that a carried unit reached its destination.
    HaulDelivered {
        /// Carrier that completed the trip.
        carrier: CarrierId,
        /// Tile the unit was delivered to.
        destination: HexCoord,
        /// Kind of the delivered unit.
        resource: ResourceKind,
    },
}
