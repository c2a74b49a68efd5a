//! Breadth-first reachability search over occupied tiles.

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    ops::ControlFlow,
};

use setlerio_core::HexCoord;

/// Result of a breadth-first search.
///
/// Records every tile that was enqueued, in discovery order, together with the
/// tile it was discovered from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchTree {
    start: HexCoord,
    parents: BTreeMap<HexCoord, HexCoord>,
    order: Vec<HexCoord>,
    terminated_early: bool,
}

impl SearchTree {
    /// Tile the search started from.
    #[must_use]
    pub const fn start(&self) -> HexCoord {
        self.start
    }

    /// Enqueued tiles in discovery order, starting with the start tile.
    #[must_use]
    pub fn discovered(&self) -> &[HexCoord] {
        &self.order
    }

    /// Reports whether the tile was enqueued by the search.
    #[must_use]
    pub fn contains(&self, hex: HexCoord) -> bool {
        hex == self.start || self.parents.contains_key(&hex)
    }

    /// Reports whether the visitor stopped the search.
    #[must_use]
    pub const fn terminated_early(&self) -> bool {
        self.terminated_early
    }

    /// Number of steps from the start along the discovered tree.
    #[must_use]
    pub fn distance_from_start(&self, hex: HexCoord) -> Option<u32> {
        self.path_to(hex)
            .map(|path| u32::try_from(path.len() - 1).unwrap_or(u32::MAX))
    }

    /// Tiles leading from the start to `hex`, both ends included.
    #[must_use]
    pub fn path_to(&self, hex: HexCoord) -> Option<Vec<HexCoord>> {
        if !self.contains(hex) {
            return None;
        }

        let mut path = vec![hex];
        let mut cursor = hex;
        while let Some(parent) = self.parents.get(&cursor) {
            path.push(*parent);
            cursor = *parent;
        }
        path.reverse();
        Some(path)
    }
}

/// Breadth-first search from `start` across tiles for which `is_occupied`
/// holds.
///
/// `visit` sees every tile discovered through adjacency before the occupancy
/// check, including tiles that were already visited, so callers can look for
/// targets that are not themselves traversable. Returning
/// [`ControlFlow::Break`] stops the whole search immediately. The start tile is
/// expanded whether or not it is occupied.
pub fn path_find_with<O, V>(start: HexCoord, mut is_occupied: O, mut visit: V) -> SearchTree
where
    O: FnMut(HexCoord) -> bool,
    V: FnMut(HexCoord) -> ControlFlow<()>,
{
    let mut tree = SearchTree {
        start,
        parents: BTreeMap::new(),
        order: vec![start],
        terminated_early: false,
    };
    let mut visited = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        for neighbor in current.neighbors() {
            if visit(neighbor).is_break() {
                tree.terminated_early = true;
                return tree;
            }

            if visited.contains(&neighbor) || !is_occupied(neighbor) {
                continue;
            }

            let _ = visited.insert(neighbor);
            let _ = tree.parents.insert(neighbor, current);
            tree.order.push(neighbor);
            queue.push_back(neighbor);
        }
    }

    tree
}
