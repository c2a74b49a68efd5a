//! Tunable simulation parameters loaded from TOML.

use serde::{Deserialize, Serialize};

use crate::{hex::HexLayout, ResourceCounts};

/// Tunable parameters that shape a simulation session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of simulation ticks per real-time second.
    pub tick_rate: u32,
    /// Corner-to-corner width of a hex in pixels.
    pub hex_width: f64,
    /// Stockpile available when the session starts.
    pub starting_resources: ResourceCounts,
    /// Number of carriers spawned at the first influence owner.
    pub carriers: u32,
    /// Time a carrier needs to cross a single hex.
    pub carrier_step_ms: u64,
    /// Timing of toast notifications.
    pub toast: ToastTiming,
    /// Parameters of the terrain generator.
    pub terrain: TerrainConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            hex_width: crate::hex::DEFAULT_HEX_WIDTH,
            starting_resources: ResourceCounts {
                wood: 2,
                stone: 10,
                ..ResourceCounts::default()
            },
            carriers: 10,
            carrier_step_ms: 400,
            toast: ToastTiming::default(),
            terrain: TerrainConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// Fields absent from the document keep their default values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Verifies that the configured values describe a runnable session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::InvalidTickRate);
        }
        if !(self.hex_width.is_finite() && self.hex_width > 0.0) {
            return Err(ConfigError::InvalidHexWidth {
                width: self.hex_width,
            });
        }

        let terrain = &self.terrain;
        let thresholds = [terrain.meadow, terrain.forest, terrain.mountains];
        let ordered = thresholds.windows(2).all(|pair| pair[0] <= pair[1]);
        let bounded = thresholds
            .iter()
            .all(|threshold| (0.0..=1.0).contains(threshold));
        if !(ordered && bounded) {
            return Err(ConfigError::UnorderedThresholds {
                meadow: terrain.meadow,
                forest: terrain.forest,
                mountains: terrain.mountains,
            });
        }

        for walk in [terrain.desert_walk, terrain.mountain_walk] {
            if walk.min > walk.max {
                return Err(ConfigError::InvalidWalkRange {
                    min: walk.min,
                    max: walk.max,
                });
            }
        }

        Ok(())
    }

    /// Hex layout derived from the configured width.
    #[must_use]
    pub fn layout(&self) -> HexLayout {
        HexLayout::new(self.hex_width)
    }
}

/// Animation timing applied to toast notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToastTiming {
    /// Duration of both the fade-in and the fade-out.
    pub animation_ms: u64,
    /// Time a toast stays fully visible between the two animations.
    pub visible_ms: u64,
}

impl Default for ToastTiming {
    fn default() -> Self {
        Self {
            animation_ms: 200,
            visible_ms: 5_000,
        }
    }
}

/// Inclusive bounds on the length of a terrain random walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WalkRange {
    /// Shortest walk.
    pub min: u32,
    /// Longest walk.
    pub max: u32,
}

/// Parameters of the seeded terrain generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerrainConfig {
    /// Radius of the generated disc measured in hex steps.
    pub radius: u32,
    /// Seed feeding the generator's random number stream.
    pub seed: u64,
    /// Rolls below this value produce meadow.
    pub meadow: f64,
    /// Rolls below this value (and above `meadow`) produce forest.
    pub forest: f64,
    /// Rolls below this value (and above `forest`) grow a mountain range;
    /// anything above grows a desert patch.
    pub mountains: f64,
    /// Length of desert walks.
    pub desert_walk: WalkRange,
    /// Length of mountain walks.
    pub mountain_walk: WalkRange,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            radius: 28,
            seed: 0x5e71_e710,
            meadow: 0.4,
            forest: 0.85,
            mountains: 0.95,
            desert_walk: WalkRange { min: 1, max: 2 },
            mountain_walk: WalkRange { min: 3, max: 5 },
        }
    }
}

/// Reasons a configuration document can be rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document is not valid TOML or does not match the schema.
    #[error("failed to parse simulation config")]
    Parse(#[from] toml::de::Error),
    /// The tick rate was zero.
    #[error("tick rate must be positive")]
    InvalidTickRate,
    /// The hex width was zero, negative, or not finite.
    #[error("hex width must be a positive number, got {width}")]
    InvalidHexWidth {
        /// Offending width.
        width: f64,
    },
    /// The terrain thresholds are not ordered within `0..=1`.
    #[error(
        "terrain thresholds must satisfy 0 <= meadow <= forest <= mountains <= 1, \
         got {meadow}/{forest}/{mountains}"
    )]
    UnorderedThresholds {
        /// Meadow threshold.
        meadow: f64,
        /// Forest threshold.
        forest: f64,
        /// Mountains threshold.
        mountains: f64,
    },
    /// A walk range has its bounds swapped.
    #[error("walk range {min}..={max} is empty")]
    InvalidWalkRange {
        /// Lower bound.
        min: u32,
        /// Upper bound.
        max: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = SimulationConfig::from_toml_str("").expect("parse");
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.starting_resources.stone, 10);
        assert_eq!(config.starting_resources.wood, 2);
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let config = SimulationConfig::from_toml_str(
            r#"
            tick_rate = 30

            [starting_resources]
            stone = 1

            [terrain]
            radius = 6
            "#,
        )
        .expect("parse");

        assert_eq!(config.tick_rate, 30);
        assert_eq!(config.starting_resources.stone, 1);
        assert_eq!(config.starting_resources.wood, 0);
        assert_eq!(config.terrain.radius, 6);
        assert_eq!(config.terrain.forest, 0.85);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = SimulationConfig::from_toml_str("tick_rat = 30").expect_err("typo");
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_tick_rate_is_rejected() {
        let error = SimulationConfig::from_toml_str("tick_rate = 0").expect_err("invalid");
        assert!(matches!(error, ConfigError::InvalidTickRate));
    }

    #[test]
    fn unordered_thresholds_are_rejected() {
        let error = SimulationConfig::from_toml_str("[terrain]\nforest = 0.2")
            .expect_err("forest below meadow");
        assert!(matches!(error, ConfigError::UnorderedThresholds { .. }));
    }

    #[test]
    fn swapped_walk_range_is_rejected() {
        let error =
            SimulationConfig::from_toml_str("[terrain]\ndesert_walk = { min = 4, max = 1 }")
                .expect_err("swapped");
        assert!(matches!(
            error,
            ConfigError::InvalidWalkRange { min: 4, max: 1 }
        ));
    }

    #[test]
    fn layout_follows_hex_width() {
        let config = SimulationConfig {
            hex_width: 80.0,
            ..SimulationConfig::default()
        };
        assert_eq!(config.layout().height(), 60.0);
    }
}
