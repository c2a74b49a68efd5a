#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure, seeded terrain generator producing the world's base terrain layer.
//!
//! The map is a disc ringed by desert. Inside it every tile rolls meadow or
//! forest, or seeds a short random walk of mountains or desert. Walks never
//! enter tiles next to the origin or next to earlier walks, which keeps the
//! starting area open and stops ranges from clumping.

use std::collections::{BTreeMap, BTreeSet};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use setlerio_core::{Command, HexCoord, TerrainConfig, TerrainKind, WalkRange};

/// Seeded terrain generator.
#[derive(Debug, Clone)]
pub struct TerrainGenerator {
    config: TerrainConfig,
    rng: ChaCha8Rng,
    tiles: BTreeMap<HexCoord, TerrainKind>,
    forbidden: BTreeSet<HexCoord>,
}

impl TerrainGenerator {
    /// Creates a generator seeded from the configuration.
    #[must_use]
    pub fn new(config: TerrainConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            tiles: BTreeMap::new(),
            forbidden: BTreeSet::new(),
        }
    }

    /// Generates the terrain layer. The same seed always yields the same map.
    #[must_use]
    pub fn generate(mut self) -> BTreeMap<HexCoord, TerrainKind> {
        self.forbidden.extend(HexCoord::ORIGIN.neighbors());
        let size = i32::try_from(self.config.radius).unwrap_or(i32::MAX);
        let radius = f64::from(size);

        for hex in disc(size) {
            let distance = euclidean(hex);
            if distance < radius && distance > radius - 1.5 {
                self.grow(TerrainKind::Desert, hex, self.config.desert_walk, true);
            }
        }

        for hex in disc(size) {
            if euclidean(hex) >= radius || self.tiles.contains_key(&hex) {
                continue;
            }

            let roll: f64 = self.rng.gen();
            if roll < self.config.meadow {
                let _ = self.tiles.insert(hex, TerrainKind::Meadow);
            } else if roll < self.config.forest {
                let _ = self.tiles.insert(hex, TerrainKind::Forest);
            } else if roll < self.config.mountains {
                self.grow(TerrainKind::Mountains, hex, self.config.mountain_walk, false);
            } else {
                self.grow(TerrainKind::Desert, hex, self.config.desert_walk, false);
            }
            let _ = self.tiles.entry(hex).or_insert(TerrainKind::Meadow);
        }

        let _ = self.tiles.insert(HexCoord::ORIGIN, TerrainKind::Meadow);
        self.tiles
    }

    /// Generates the terrain layer wrapped in the command that installs it.
    #[must_use]
    pub fn command(self) -> Command {
        Command::ConfigureTerrain {
            tiles: self.generate().into_iter().collect(),
        }
    }

    /// Paints a random walk of `terrain` starting at `start`.
    ///
    /// The walk length is drawn uniformly from `walk` and the walk stops early
    /// on a forbidden tile unless `ignore_forbidden` is set. Once it ends, the
    /// neighbours of every painted tile become forbidden.
    fn grow(
        &mut self,
        terrain: TerrainKind,
        start: HexCoord,
        walk: WalkRange,
        ignore_forbidden: bool,
    ) {
        let span = f64::from(walk.max.saturating_sub(walk.min));
        let mut left = f64::from(walk.min) + self.rng.gen::<f64>() * span;
        let mut cursor = start;
        let mut walked = Vec::new();

        while left > 0.0 && (ignore_forbidden || !self.forbidden.contains(&cursor)) {
            let _ = self.tiles.insert(cursor, terrain);
            walked.push(cursor);
            cursor = cursor.neighbor(self.rng.gen_range(0..6));
            left -= 1.0;
        }

        for hex in walked {
            self.forbidden.extend(hex.neighbors());
        }
    }
}

fn disc(size: i32) -> impl Iterator<Item = HexCoord> {
    (-size..=size).flat_map(move |y| (-size..=size).map(move |x| HexCoord::new(x, y)))
}

fn euclidean(hex: HexCoord) -> f64 {
    f64::from(hex.x()).hypot(f64::from(hex.y()))
}
