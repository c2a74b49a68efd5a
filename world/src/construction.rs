//! Construction lifecycle: order, progress, completion, cancellation, and
//! demolition of buildings.

use setlerio_core::{
    BuildError, BuildingKind, BuildingStage, DrawPriority, Event, HexCoord, Occupant,
    PreconditionError, ResourceCounts,
};
use tracing::{debug, info};

use crate::{
    drawables::{DrawKind, DrawableHandle},
    scheduler::{EventDuration, EventHandle, EventProgress},
    World,
};

/// Share of the cost returned when construction is cancelled.
const CANCEL_REFUND: f64 = 1.0;
/// Share of the cost returned when a finished building is destroyed.
const DESTROY_REFUND: f64 = 0.5;

/// Everything that must be torn down to abort a construction job.
#[derive(Debug)]
struct Cancellable {
    event: EventHandle,
    progress_drawable: DrawableHandle,
}

/// Construction running on a tile.
#[derive(Debug)]
pub(crate) struct ConstructionJob {
    target: BuildingKind,
    duration: u64,
    progress: f64,
    cancel: Cancellable,
}

impl ConstructionJob {
    pub(crate) fn target(&self) -> BuildingKind {
        self.target
    }

    pub(crate) fn snapshot(&self, tile: HexCoord) -> ConstructionSnapshot {
        ConstructionSnapshot {
            tile,
            target: self.target,
            progress: self.progress,
        }
    }
}

/// Read-only view of a construction job.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstructionSnapshot {
    /// Tile under construction.
    pub tile: HexCoord,
    /// Building being constructed.
    pub target: BuildingKind,
    /// Completed fraction in `0.0..=1.0`.
    pub progress: f64,
}

impl World {
    /// Orders construction of `kind` on a blank tile and returns the number of
    /// ticks the construction takes.
    ///
    /// The building is finished on the tick that completes that many ticks
    /// after the order; a zero-length construction finishes on the next tick.
    ///
    /// Resources are deducted immediately. Nothing changes when the order is
    /// rejected.
    pub fn request_build(&mut self, hex: HexCoord, kind: BuildingKind) -> Result<u64, BuildError> {
        if !kind.is_orderable() {
            return Err(PreconditionError::NotBuildable { kind }.into());
        }
        if self.occupant(hex) != Some(&Occupant::Blank) || self.jobs.contains_key(&hex) {
            return Err(PreconditionError::TileUnavailable { hex }.into());
        }
        self.ledger.deduct(&kind.requirements())?;

        let _ = self.set_occupant(
            hex,
            Occupant::Building {
                kind,
                stage: BuildingStage::UnderConstruction,
            },
            true,
        );
        let progress_drawable = self.drawables.push(
            DrawPriority::Buildings,
            DrawKind::ConstructionProgress { progress: 0.0 },
            Some(hex),
        );
        let duration = self.ticks_for(kind.build_duration_ms());
        let event = self.schedule(
            0,
            EventDuration::Ticks(duration.saturating_sub(1)),
            Box::new(move |world: &mut World, progress| world.advance_construction(hex, progress)),
        );
        let _ = self.jobs.insert(
            hex,
            ConstructionJob {
                target: kind,
                duration,
                progress: 0.0,
                cancel: Cancellable {
                    event,
                    progress_drawable,
                },
            },
        );

        info!(%hex, ?kind, duration, "construction started");
        self.emit(Event::ConstructionStarted {
            hex,
            kind,
            duration_ticks: duration,
        });
        Ok(duration)
    }

    /// Aborts the construction on the tile, refunds its full cost, and
    /// reverts the tile to blank.
    pub fn cancel_construction(&mut self, hex: HexCoord) -> Result<ResourceCounts, PreconditionError> {
        let refunded = self
            .abort_job(hex)
            .ok_or(PreconditionError::NoConstruction { hex })?;
        let _ = self.set_occupant(hex, Occupant::Blank, true);
        Ok(refunded)
    }

    /// Destroys a finished building, refunds half its cost, and reverts the
    /// tile to blank. Registered influence owners give up their area.
    pub fn destroy_building(&mut self, hex: HexCoord) -> Result<ResourceCounts, PreconditionError> {
        let Some(&Occupant::Building { kind, stage }) = self.occupant(hex) else {
            return Err(PreconditionError::NoBuilding { hex });
        };
        if stage != BuildingStage::Built {
            return Err(PreconditionError::NotBuilt { hex });
        }
        if kind.is_indestructible() {
            return Err(PreconditionError::Indestructible { hex, kind });
        }

        let owns_area = self.area.is_owner(hex);

        let refunded = self.ledger.restore(&kind.requirements(), DESTROY_REFUND);
        let _ = self.set_occupant(hex, Occupant::Blank, true);
        if owns_area {
            self.remove_influence_owner(hex)?;
        }

        info!(%hex, ?kind, "building destroyed");
        self.emit(Event::BuildingDestroyed {
            hex,
            kind,
            refunded,
        });
        Ok(refunded)
    }

    /// Aborts any job on the tile, leaving the tile's occupant alone.
    pub(crate) fn abort_construction(&mut self, hex: HexCoord) {
        let _ = self.abort_job(hex);
    }

    fn abort_job(&mut self, hex: HexCoord) -> Option<ResourceCounts> {
        let job = self.jobs.remove(&hex)?;
        let _ = self.scheduler.cancel(job.cancel.event);
        self.drawables.remove(job.cancel.progress_drawable);
        let refunded = self
            .ledger
            .restore(&job.target.requirements(), CANCEL_REFUND);

        info!(%hex, kind = ?job.target, "construction cancelled");
        self.emit(Event::ConstructionCancelled {
            hex,
            kind: job.target,
            refunded,
        });
        Some(refunded)
    }

    fn advance_construction(&mut self, hex: HexCoord, progress: EventProgress) {
        let Some(job) = self.jobs.get_mut(&hex) else {
            return;
        };
        job.progress = if job.duration == 0 {
            1.0
        } else {
            ((progress.elapsed + 1) as f64 / job.duration as f64).min(1.0)
        };
        let drawable = job.cancel.progress_drawable;
        let kind = DrawKind::ConstructionProgress {
            progress: job.progress,
        };
        self.drawables.update(drawable, kind);
        debug!(%hex, elapsed = progress.elapsed, "construction progressed");

        if progress.is_final() {
            self.complete_construction(hex);
        }
    }

    fn complete_construction(&mut self, hex: HexCoord) {
        let Some(job) = self.jobs.remove(&hex) else {
            return;
        };
        self.drawables.remove(job.cancel.progress_drawable);
        let kind = job.target;
        let _ = self.set_occupant(
            hex,
            Occupant::Building {
                kind,
                stage: BuildingStage::Built,
            },
            true,
        );

        info!(%hex, ?kind, "construction completed");
        self.emit(Event::ConstructionCompleted { hex, kind });
        if kind.influence().is_some() {
            if let Err(reason) = self.add_influence_owner(hex, kind) {
                self.reject(reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use setlerio_core::{ResourceKind, SimulationConfig};

    use super::*;
    use crate::query;

    fn world_with_stock(wood: u32, stone: u32) -> World {
        let config = SimulationConfig {
            starting_resources: ResourceCounts {
                wood,
                stone,
                ..ResourceCounts::default()
            },
            ..SimulationConfig::default()
        };
        let mut world = World::new(config);
        world
            .place_influence_owner(HexCoord::ORIGIN, BuildingKind::TownCenter)
            .expect("town center");
        world
    }

    #[test]
    fn town_center_cannot_be_ordered() {
        let mut world = world_with_stock(10, 10);
        assert_eq!(
            world.request_build(HexCoord::new(1, 0), BuildingKind::TownCenter),
            Err(BuildError::Precondition(PreconditionError::NotBuildable {
                kind: BuildingKind::TownCenter
            }))
        );
    }

    #[test]
    fn occupied_or_unclaimed_tiles_are_unavailable() {
        let mut world = world_with_stock(10, 10);
        for hex in [HexCoord::ORIGIN, HexCoord::new(9, 9)] {
            assert_eq!(
                world.request_build(hex, BuildingKind::LumberjackHut),
                Err(BuildError::Precondition(PreconditionError::TileUnavailable {
                    hex
                }))
            );
        }
    }

    #[test]
    fn request_deducts_and_reserves_the_tile() {
        let mut world = world_with_stock(4, 4);
        let hex = HexCoord::new(1, 0);

        let duration = world
            .request_build(hex, BuildingKind::LumberjackHut)
            .expect("affordable");

        assert_eq!(duration, 180);
        assert_eq!(query::resources(&world).wood, 2);
        assert_eq!(query::resources(&world).stone, 2);
        assert_eq!(
            world.occupant(hex),
            Some(&Occupant::Building {
                kind: BuildingKind::LumberjackHut,
                stage: BuildingStage::UnderConstruction,
            })
        );
        assert_eq!(
            world.request_build(hex, BuildingKind::Tower),
            Err(BuildError::Precondition(PreconditionError::TileUnavailable {
                hex
            }))
        );
    }

    #[test]
    fn destroy_refunds_half_rounded_down() {
        let mut world = world_with_stock(2, 3);
        let hex = HexCoord::new(0, 1);
        let _ = world
            .request_build(hex, BuildingKind::LumberjackHut)
            .expect("affordable");
        assert_eq!(
            world.destroy_building(hex),
            Err(PreconditionError::NotBuilt { hex })
        );
        let _ = world.set_occupant(
            hex,
            Occupant::Building {
                kind: BuildingKind::LumberjackHut,
                stage: BuildingStage::Built,
            },
            true,
        );

        let refunded = world.destroy_building(hex).expect("destructible");

        assert_eq!(refunded.get(ResourceKind::Wood), 1);
        assert_eq!(refunded.get(ResourceKind::Stone), 1);
        assert_eq!(world.occupant(hex), Some(&Occupant::Blank));
        assert!(query::construction(&world, hex).is_none());
    }

    #[test]
    fn town_center_is_indestructible() {
        let mut world = world_with_stock(0, 0);
        assert_eq!(
            world.destroy_building(HexCoord::ORIGIN),
            Err(PreconditionError::Indestructible {
                hex: HexCoord::ORIGIN,
                kind: BuildingKind::TownCenter,
            })
        );
        assert_eq!(
            world.destroy_building(HexCoord::new(1, 0)),
            Err(PreconditionError::NoBuilding {
                hex: HexCoord::new(1, 0)
            })
        );
    }
}
