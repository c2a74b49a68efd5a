//! Axial hex coordinates and the pixel-space layout used to present them.
//!
//! The tiling is flat-topped. The two axial axes are not orthogonal in pixel
//! space; [`HexLayout::to_pixel`] and [`HexLayout::to_hex`] are exact linear
//! inverses of each other, so rounding the fractional result of `to_hex`
//! recovers every lattice coordinate.

use std::{
    fmt, iter,
    num::ParseIntError,
    ops::{Add, Mul, Neg, Sub},
    str::FromStr,
};

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Point expressed in pixel space.
pub type PixelPoint = DVec2;

/// Separator placed between the two components of a coordinate hash.
pub const HASH_SEPARATOR: char = ',';

/// Default width of a single hex measured in pixels.
pub const DEFAULT_HEX_WIDTH: f64 = 160.0;

/// Axial offsets of the six neighbours of a hex.
///
/// Entry `i` lies across polygon side `i`, the side spanning
/// [`HexLayout::hex_vertices`] entries `i` and `i + 1`. Consecutive entries are
/// adjacent directions, which is what the ring walk relies on.
pub const NEIGHBOR_OFFSETS: [HexCoord; 6] = [
    HexCoord::new(-1, 1),
    HexCoord::new(0, 1),
    HexCoord::new(1, 0),
    HexCoord::new(1, -1),
    HexCoord::new(0, -1),
    HexCoord::new(-1, 0),
];

/// Axial coordinate identifying a single hex cell.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct HexCoord {
    x: i32,
    y: i32,
}

impl HexCoord {
    /// Coordinate of the map origin.
    pub const ORIGIN: Self = Self::new(0, 0);

    /// Creates a new axial coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// First axial component.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Second axial component.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Multiplies both components by `factor`.
    #[must_use]
    pub const fn scale(self, factor: i32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Neighbour across the provided polygon side (taken modulo six).
    #[must_use]
    pub fn neighbor(self, side: usize) -> Self {
        self + NEIGHBOR_OFFSETS[side % NEIGHBOR_OFFSETS.len()]
    }

    /// Iterates the six neighbours in side order.
    pub fn neighbors(self) -> impl Iterator<Item = HexCoord> {
        NEIGHBOR_OFFSETS.into_iter().map(move |offset| self + offset)
    }

    /// Number of hex steps separating two coordinates.
    #[must_use]
    pub fn steps_to(self, other: HexCoord) -> u32 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        let steps = (dx.abs() + dy.abs() + (dx + dy).abs()) / 2;
        u32::try_from(steps).unwrap_or(u32::MAX)
    }

    /// Centre of the hex in pixel space.
    #[must_use]
    pub fn to_pixel(self, layout: &HexLayout) -> PixelPoint {
        layout.to_pixel(self)
    }

    /// Euclidean distance between the centres of two hexes in pixel space.
    #[must_use]
    pub fn pixel_distance(self, other: HexCoord, layout: &HexLayout) -> f64 {
        self.to_pixel(layout).distance(other.to_pixel(layout))
    }

    /// Stable string key of the form `"x,y"`.
    #[must_use]
    pub fn to_hash(self) -> String {
        self.to_string()
    }

    /// Parses a key produced by [`HexCoord::to_hash`].
    pub fn from_hash(hash: &str) -> Result<Self, HexParseError> {
        hash.parse()
    }

    /// Every coordinate exactly `radius` steps away.
    ///
    /// Yields `6 * radius` coordinates, or the centre alone for radius zero.
    #[must_use]
    pub fn ring(self, radius: u32) -> Vec<HexCoord> {
        if radius == 0 {
            return vec![self];
        }

        let steps = i32::try_from(radius).unwrap_or(i32::MAX);
        let mut cells = Vec::with_capacity(6 * radius as usize);
        let mut cursor = self + NEIGHBOR_OFFSETS[4].scale(steps);
        for direction in NEIGHBOR_OFFSETS {
            for _ in 0..radius {
                cells.push(cursor);
                cursor = cursor + direction;
            }
        }
        cells
    }

    /// Every coordinate whose step distance lies within `min_radius..=max_radius`,
    /// ordered ring by ring outwards.
    #[must_use]
    pub fn range(self, max_radius: u32, min_radius: u32) -> Vec<HexCoord> {
        (min_radius..=max_radius)
            .flat_map(|radius| self.ring(radius))
            .collect()
    }
}

impl Add for HexCoord {
    type Output = HexCoord;

    fn add(self, rhs: HexCoord) -> HexCoord {
        HexCoord::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for HexCoord {
    type Output = HexCoord;

    fn sub(self, rhs: HexCoord) -> HexCoord {
        HexCoord::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for HexCoord {
    type Output = HexCoord;

    fn neg(self) -> HexCoord {
        HexCoord::new(-self.x, -self.y)
    }
}

impl Mul<i32> for HexCoord {
    type Output = HexCoord;

    fn mul(self, rhs: i32) -> HexCoord {
        self.scale(rhs)
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{HASH_SEPARATOR}{}", self.x, self.y)
    }
}

impl FromStr for HexCoord {
    type Err = HexParseError;

    fn from_str(hash: &str) -> Result<Self, Self::Err> {
        let mut parts = hash.split(HASH_SEPARATOR);
        let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(HexParseError::ComponentCount {
                hash: hash.to_owned(),
            });
        };

        Ok(Self::new(parse_component(x)?, parse_component(y)?))
    }
}

fn parse_component(component: &str) -> Result<i32, HexParseError> {
    component
        .parse()
        .map_err(|source| HexParseError::InvalidComponent {
            component: component.to_owned(),
            source,
        })
}

/// Reasons a coordinate hash can fail to parse.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HexParseError {
    /// The hash did not contain exactly one separator.
    #[error("hex hash `{hash}` should consist of two numbers separated by `,`")]
    ComponentCount {
        /// Offending hash.
        hash: String,
    },
    /// One of the components is not an integer.
    #[error("component `{component}` of a hex hash is not an integer")]
    InvalidComponent {
        /// Offending component text.
        component: String,
        /// Underlying integer parse failure.
        source: ParseIntError,
    },
}

/// Hex position with fractional components, produced by [`HexLayout::to_hex`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractionalHex {
    /// First axial component.
    pub x: f64,
    /// Second axial component.
    pub y: f64,
}

impl FractionalHex {
    /// Rounds each component to the nearest integer.
    #[must_use]
    pub fn round(self) -> HexCoord {
        HexCoord::new(self.x.round() as i32, self.y.round() as i32)
    }
}

/// Pixel dimensions of a single hex and the transforms derived from them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HexLayout {
    width: f64,
}

impl Default for HexLayout {
    fn default() -> Self {
        Self::new(DEFAULT_HEX_WIDTH)
    }
}

impl HexLayout {
    /// Creates a layout for hexes of the provided pixel width.
    #[must_use]
    pub const fn new(width: f64) -> Self {
        Self { width }
    }

    /// Corner-to-corner width of a hex.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Flat-to-flat height of a hex.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.width * 0.75
    }

    /// Length of the flat top edge.
    #[must_use]
    pub fn base_width(&self) -> f64 {
        self.width * 0.5
    }

    fn column_span(&self) -> f64 {
        self.base_width() + self.width
    }

    /// Maps a lattice coordinate to the pixel centre of its hex.
    #[must_use]
    pub fn to_pixel(&self, hex: HexCoord) -> PixelPoint {
        let x = f64::from(hex.x());
        let y = f64::from(hex.y());
        DVec2::new(
            (x + y) * self.column_span() / 2.0,
            (x - y) * self.height() / 2.0,
        )
    }

    /// Maps a pixel position back into fractional hex space.
    #[must_use]
    pub fn to_hex(&self, point: PixelPoint) -> FractionalHex {
        let across = point.x / self.column_span();
        let down = point.y / self.height();
        FractionalHex {
            x: across + down,
            y: across - down,
        }
    }

    /// Hex whose polygon contains the provided pixel position.
    ///
    /// Component rounding alone resolves points near the slanted sides to the
    /// wrong hex, so the rounded hex and its neighbours are tested against the
    /// polygon.
    #[must_use]
    pub fn hex_at(&self, point: PixelPoint) -> HexCoord {
        let rounded = self.to_hex(point).round();
        iter::once(rounded)
            .chain(rounded.neighbors())
            .find(|candidate| self.contains_pixel(point - self.to_pixel(*candidate)))
            .unwrap_or(rounded)
    }

    /// Polygon corners relative to the hex centre, clockwise from the top-left.
    #[must_use]
    pub fn hex_vertices(&self) -> [PixelPoint; 6] {
        let half_base = self.base_width() / 2.0;
        let half_width = self.width / 2.0;
        let half_height = self.height() / 2.0;
        [
            DVec2::new(-half_base, -half_height),
            DVec2::new(half_base, -half_height),
            DVec2::new(half_width, 0.0),
            DVec2::new(half_base, half_height),
            DVec2::new(-half_base, half_height),
            DVec2::new(-half_width, 0.0),
        ]
    }

    /// Reports whether an offset from a hex centre falls inside its polygon.
    #[must_use]
    pub fn contains_pixel(&self, offset: PixelPoint) -> bool {
        let abs_x = offset.x.abs();
        let abs_y = offset.y.abs();
        if abs_y > self.height() / 2.0 || abs_x > self.width / 2.0 {
            return false;
        }
        if abs_x <= self.base_width() / 2.0 {
            return true;
        }
        (self.width / 2.0 - abs_x) / (self.width - self.base_width()) >= abs_y / self.height()
    }
}
