//! Registry of drawable descriptors consumed by renderers.

use std::collections::BTreeMap;

use setlerio_core::{DrawPriority, HexCoord};

/// Identifier of a registered drawable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawableHandle(u64);

/// Describes what a renderer should draw for an entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawKind {
    /// Base terrain of the anchored tile.
    Terrain,
    /// Registered occupant of the anchored tile.
    Occupant,
    /// Progress bar of the construction on the anchored tile.
    ConstructionProgress {
        /// Completed fraction in `0.0..=1.0`.
        progress: f64,
    },
    /// Outline of the claimed area.
    Border,
    /// Stack of notification toasts.
    Toasts,
    /// Carriers and their trips.
    CarrierTrips,
}

/// Registered drawable descriptor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Drawable {
    /// Layer the entry is drawn on.
    pub priority: DrawPriority,
    /// What to draw.
    pub kind: DrawKind,
    /// Tile the entry is attached to, if any. Anchored entries are culled
    /// when their tile is not visible.
    pub anchor: Option<HexCoord>,
}

/// Drawable registry ordered by priority and then registration.
#[derive(Debug, Default)]
pub(crate) struct Drawables {
    next_handle: u64,
    entries: BTreeMap<DrawableHandle, Drawable>,
}

impl Drawables {
    pub(crate) fn push(
        &mut self,
        priority: DrawPriority,
        kind: DrawKind,
        anchor: Option<HexCoord>,
    ) -> DrawableHandle {
        let handle = DrawableHandle(self.next_handle);
        self.next_handle += 1;
        let _ = self.entries.insert(
            handle,
            Drawable {
                priority,
                kind,
                anchor,
            },
        );
        handle
    }

    /// Removes an entry; unknown handles are ignored.
    pub(crate) fn remove(&mut self, handle: DrawableHandle) {
        let _ = self.entries.remove(&handle);
    }

    pub(crate) fn update(&mut self, handle: DrawableHandle, kind: DrawKind) {
        if let Some(entry) = self.entries.get_mut(&handle) {
            entry.kind = kind;
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in draw order, skipping anchored entries on invisible tiles.
    pub(crate) fn layered<F>(&self, mut visible: F) -> Vec<Drawable>
    where
        F: FnMut(HexCoord) -> bool,
    {
        let mut layered: Vec<(DrawPriority, DrawableHandle, Drawable)> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.anchor.map_or(true, &mut visible))
            .map(|(handle, entry)| (entry.priority, *handle, *entry))
            .collect();
        layered.sort_by_key(|(priority, handle, _)| (*priority, *handle));
        layered.into_iter().map(|(_, _, entry)| entry).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layered_orders_by_priority_then_registration() {
        let mut drawables = Drawables::default();
        let _ = drawables.push(DrawPriority::Toasts, DrawKind::Toasts, None);
        let _ = drawables.push(
            DrawPriority::Buildings,
            DrawKind::Occupant,
            Some(HexCoord::new(1, 0)),
        );
        let _ = drawables.push(DrawPriority::Terrain, DrawKind::Terrain, Some(HexCoord::ORIGIN));
        let _ = drawables.push(
            DrawPriority::Buildings,
            DrawKind::ConstructionProgress { progress: 0.5 },
            Some(HexCoord::new(1, 0)),
        );

        let kinds: Vec<_> = drawables.layered(|_| true).into_iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DrawKind::Terrain,
                DrawKind::Occupant,
                DrawKind::ConstructionProgress { progress: 0.5 },
                DrawKind::Toasts,
            ]
        );
    }

    #[test]
    fn invisible_anchors_are_culled() {
        let mut drawables = Drawables::default();
        let _ = drawables.push(DrawPriority::Border, DrawKind::Border, None);
        let _ = drawables.push(DrawPriority::Terrain, DrawKind::Terrain, Some(HexCoord::new(9, 9)));

        let layered = drawables.layered(|hex| hex == HexCoord::ORIGIN);
        assert_eq!(layered.len(), 1);
        assert_eq!(layered[0].kind, DrawKind::Border);
    }

    #[test]
    fn remove_is_idempotent_and_update_changes_kind() {
        let mut drawables = Drawables::default();
        let handle = drawables.push(
            DrawPriority::Buildings,
            DrawKind::ConstructionProgress { progress: 0.0 },
            None,
        );
        drawables.update(handle, DrawKind::ConstructionProgress { progress: 0.25 });
        assert_eq!(
            drawables.layered(|_| true)[0].kind,
            DrawKind::ConstructionProgress { progress: 0.25 }
        );

        drawables.remove(handle);
        drawables.remove(handle);
        assert_eq!(drawables.len(), 0);
    }
}
