//! Spatial registry of tile occupants.
//!
//! Every registered tile carries a drawable. Replacing or removing an occupant
//! releases that drawable and aborts any construction job on the tile first.

use std::collections::BTreeMap;

use setlerio_core::{DrawPriority, HexCoord, Occupant};

use crate::{
    drawables::{DrawKind, DrawableHandle},
    World,
};

#[derive(Debug)]
struct RegistryEntry {
    occupant: Occupant,
    drawable: DrawableHandle,
}

/// Occupants keyed by tile.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: BTreeMap<HexCoord, RegistryEntry>,
}

impl Registry {
    pub(crate) fn contains(&self, hex: HexCoord) -> bool {
        self.entries.contains_key(&hex)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl World {
    /// Occupant registered at the tile.
    #[must_use]
    pub fn occupant(&self, hex: HexCoord) -> Option<&Occupant> {
        self.registry.entries.get(&hex).map(|entry| &entry.occupant)
    }

    /// Registers `occupant` at the tile.
    ///
    /// Without `overwrite` an occupied tile is left untouched and `false` is
    /// returned. Otherwise any previous occupant is released first.
    pub fn set_occupant(&mut self, hex: HexCoord, occupant: Occupant, overwrite: bool) -> bool {
        if !overwrite && self.registry.contains(hex) {
            return false;
        }

        let _ = self.release_tile(hex);
        let drawable = self
            .drawables
            .push(DrawPriority::Buildings, DrawKind::Occupant, Some(hex));
        let _ = self
            .registry
            .entries
            .insert(hex, RegistryEntry { occupant, drawable });
        true
    }

    /// Removes the tile's occupant and returns it.
    pub fn remove_occupant(&mut self, hex: HexCoord) -> Option<Occupant> {
        self.release_tile(hex)
    }

    fn release_tile(&mut self, hex: HexCoord) -> Option<Occupant> {
        self.abort_construction(hex);
        let entry = self.registry.entries.remove(&hex)?;
        self.drawables.remove(entry.drawable);
        Some(entry.occupant)
    }
}

#[cfg(test)]
mod tests {
    use setlerio_core::{ResourceCounts, ResourceKind, TerrainKind};

    use super::*;
    use crate::query;

    #[test]
    fn set_without_overwrite_keeps_occupied_tiles() {
        let mut world = World::default();
        let hex = HexCoord::new(1, 1);

        assert!(world.set_occupant(hex, Occupant::TerrainFeature(TerrainKind::Forest), false));
        assert!(!world.set_occupant(hex, Occupant::Blank, false));
        assert_eq!(
            world.occupant(hex),
            Some(&Occupant::TerrainFeature(TerrainKind::Forest))
        );

        let node = Occupant::ResourceNode(ResourceCounts::single(ResourceKind::Stone, 3));
        assert!(world.set_occupant(hex, node, true));
        assert_eq!(world.occupant(hex), Some(&node));
    }

    #[test]
    fn replacing_and_removing_release_the_drawable() {
        let mut world = World::default();
        let hex = HexCoord::new(-2, 5);

        let _ = world.set_occupant(hex, Occupant::Blank, false);
        let _ = world.set_occupant(hex, Occupant::Blank, true);
        assert_eq!(query::drawable_count(&world), 1);

        assert_eq!(world.remove_occupant(hex), Some(Occupant::Blank));
        assert_eq!(world.remove_occupant(hex), None);
        assert_eq!(query::drawable_count(&world), 0);
        assert_eq!(query::occupied_tiles(&world), 0);
    }
}
