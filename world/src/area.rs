//! Claimed area and its border.
//!
//! A tile is interior when it lies within the inner radius of any influence
//! owner, fringe when it lies within an outer radius but is not interior, and
//! unclaimed otherwise. The border set holds exactly the fringe tiles that
//! touch an unclaimed tile.

use std::collections::{BTreeMap, BTreeSet};

use setlerio_core::{
    BuildingKind, BuildingStage, DrawPriority, Event, HexCoord, Occupant, PreconditionError,
};
use tracing::info;

use crate::{
    drawables::{DrawKind, DrawableHandle},
    World,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Claim {
    Interior,
    Fringe,
    Unclaimed,
}

/// Polygon side of a border tile that faces unclaimed land.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BorderEdge {
    /// Border tile.
    pub hex: HexCoord,
    /// Side index into the hex polygon, matching the neighbour offset table.
    pub side: usize,
}

/// Influence owners and the border they induce.
#[derive(Debug, Default)]
pub(crate) struct InfluenceArea {
    owners: BTreeMap<HexCoord, BuildingKind>,
    border: BTreeSet<HexCoord>,
    drawable: Option<DrawableHandle>,
}

impl InfluenceArea {
    fn classify(&self, hex: HexCoord) -> Claim {
        let mut claim = Claim::Unclaimed;
        for (owner, kind) in &self.owners {
            let Some(radii) = kind.influence() else {
                continue;
            };
            let steps = hex.steps_to(*owner);
            if steps <= radii.inner {
                return Claim::Interior;
            }
            if steps <= radii.outer {
                claim = Claim::Fringe;
            }
        }
        claim
    }

    fn belongs_to_border(&self, hex: HexCoord) -> bool {
        self.classify(hex) == Claim::Fringe
            && hex
                .neighbors()
                .any(|neighbor| self.classify(neighbor) == Claim::Unclaimed)
    }

    /// Recomputes membership for every tile within `radius` of `center`.
    fn refresh(&mut self, center: HexCoord, radius: u32) -> bool {
        let mut changed = false;
        for hex in center.range(radius, 0) {
            changed |= if self.belongs_to_border(hex) {
                self.border.insert(hex)
            } else {
                self.border.remove(&hex)
            };
        }
        changed
    }

    pub(crate) fn is_claimed(&self, hex: HexCoord) -> bool {
        self.classify(hex) != Claim::Unclaimed
    }

    pub(crate) fn is_owner(&self, hex: HexCoord) -> bool {
        self.owners.contains_key(&hex)
    }

    pub(crate) fn owners(&self) -> impl Iterator<Item = (HexCoord, BuildingKind)> + '_ {
        self.owners.iter().map(|(hex, kind)| (*hex, *kind))
    }

    pub(crate) fn border(&self) -> impl Iterator<Item = HexCoord> + '_ {
        self.border.iter().copied()
    }

    pub(crate) fn border_edges(&self) -> Vec<BorderEdge> {
        self.border
            .iter()
            .flat_map(|hex| {
                (0..6)
                    .filter(|side| self.classify(hex.neighbor(*side)) == Claim::Unclaimed)
                    .map(|side| BorderEdge { hex: *hex, side })
            })
            .collect()
    }
}

impl World {
    /// Installs a finished influence-owning building and claims its area.
    pub fn place_influence_owner(
        &mut self,
        hex: HexCoord,
        kind: BuildingKind,
    ) -> Result<(), PreconditionError> {
        if kind.influence().is_none() {
            return Err(PreconditionError::NoInfluence { kind });
        }
        let _ = self.set_occupant(
            hex,
            Occupant::Building {
                kind,
                stage: BuildingStage::Built,
            },
            true,
        );
        self.add_influence_owner(hex, kind)
    }

    /// Registers an influence owner, blanks its interior, and updates the
    /// border around it.
    pub fn add_influence_owner(
        &mut self,
        hex: HexCoord,
        kind: BuildingKind,
    ) -> Result<(), PreconditionError> {
        let radii = kind
            .influence()
            .ok_or(PreconditionError::NoInfluence { kind })?;
        let _ = self.area.owners.insert(hex, kind);

        for tile in hex.range(radii.inner, 0) {
            let _ = self.set_occupant(tile, Occupant::Blank, false);
        }
        let changed = self.area.refresh(hex, radii.outer + 1);
        self.border_updated(changed);

        info!(%hex, ?kind, "influence owner added");
        self.emit(Event::InfluenceOwnerAdded { hex, kind });
        self.spawn_carriers(hex);
        Ok(())
    }

    /// Removes a destructible influence owner and releases every tile that
    /// no remaining owner claims.
    pub fn remove_influence_owner(&mut self, hex: HexCoord) -> Result<(), PreconditionError> {
        let kind = *self
            .area
            .owners
            .get(&hex)
            .ok_or(PreconditionError::NotInfluenceOwner { hex })?;
        if kind.is_indestructible() {
            return Err(PreconditionError::Indestructible { hex, kind });
        }
        let _ = self.area.owners.remove(&hex);
        let outer = kind.influence().map_or(0, |radii| radii.outer);

        for tile in hex.range(outer, 0) {
            if self.area.classify(tile) != Claim::Unclaimed {
                continue;
            }
            let _ = self.area.border.remove(&tile);
            if let Some(occupant) = self.remove_occupant(tile) {
                self.emit(Event::TileReleased {
                    hex: tile,
                    occupant: Some(occupant),
                });
            }
        }
        let changed = self.area.refresh(hex, outer + 1);
        self.border_updated(changed);

        info!(%hex, ?kind, "influence owner removed");
        self.emit(Event::InfluenceOwnerRemoved { hex, kind });
        Ok(())
    }

    fn border_updated(&mut self, changed: bool) {
        match (self.area.drawable, self.area.border.is_empty()) {
            (None, false) => {
                self.area.drawable =
                    Some(self.drawables.push(DrawPriority::Border, DrawKind::Border, None));
            }
            (Some(handle), true) => {
                self.drawables.remove(handle);
                self.area.drawable = None;
            }
            _ => {}
        }
        if changed {
            self.emit(Event::BorderChanged {
                tiles: self.area.border.len(),
            });
        }
    }
}
