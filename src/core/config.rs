//! Battle configuration with documented defaults
//!
//! Everything that varies between games (map size, budget, deployment zone)
//! lives here. Rules that every game shares live in `battle::constants`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::battle::constants::{
    DEFAULT_BUDGET, DEFAULT_DEPLOY_COLS, DEFAULT_GRID_COLS, DEFAULT_GRID_ROWS,
    EVENT_LOG_CAPACITY,
};
use crate::core::error::{MusterError, Result};
use crate::core::types::GridBounds;

/// Configuration for one battle
///
/// Loaded from TOML; any omitted field falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    // === GRID ===
    /// Number of tile columns
    pub grid_cols: i32,

    /// Number of tile rows
    pub grid_rows: i32,

    // === ECONOMY ===
    /// Budget each side starts with during setup
    ///
    /// At the default 500, a side affords ten Foot or four Planners.
    pub budget: u32,

    /// Width of each side's deployment zone in columns
    ///
    /// Side 1 deploys in the leftmost columns, side 2 in the rightmost.
    /// Zones must not overlap.
    pub deploy_cols: i32,

    // === PRESENTATION ===
    /// Maximum number of entries kept in the event log
    pub log_capacity: usize,

    // === DETERMINISM ===
    /// Seed for the AI's random choices; entropy when unset
    pub seed: Option<u64>,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            grid_cols: DEFAULT_GRID_COLS,
            grid_rows: DEFAULT_GRID_ROWS,
            budget: DEFAULT_BUDGET,
            deploy_cols: DEFAULT_DEPLOY_COLS,
            log_capacity: EVENT_LOG_CAPACITY,
            seed: None,
        }
    }
}

impl BattleConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config with a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn bounds(&self) -> GridBounds {
        GridBounds::new(self.grid_cols, self.grid_rows)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: BattleConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.grid_cols <= 0 || self.grid_rows <= 0 {
            return Err(MusterError::InvalidConfig(format!(
                "grid must be non-empty, got {}x{}",
                self.grid_cols, self.grid_rows
            )));
        }

        if self.budget == 0 {
            return Err(MusterError::InvalidConfig("budget must be positive".into()));
        }

        if self.deploy_cols <= 0 || self.deploy_cols * 2 > self.grid_cols {
            return Err(MusterError::InvalidConfig(format!(
                "deploy_cols ({}) must be in 1..={}",
                self.deploy_cols,
                self.grid_cols / 2
            )));
        }

        if self.log_capacity == 0 {
            return Err(MusterError::InvalidConfig(
                "log_capacity must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(BattleConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = BattleConfig::from_toml_str("budget = 800\nseed = 7\n").unwrap();
        assert_eq!(config.budget, 800);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.grid_cols, DEFAULT_GRID_COLS);
    }

    #[test]
    fn test_overlapping_zones_rejected() {
        let config = BattleConfig {
            grid_cols: 10,
            deploy_cols: 6,
            ..BattleConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MusterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(matches!(
            BattleConfig::from_toml_str("budget = \"lots\""),
            Err(MusterError::TomlError(_))
        ));
    }

    #[test]
    fn test_shipped_sample_loads() {
        let config = BattleConfig::load("data/battle.toml").expect("sample config should load");
        assert!(config.validate().is_ok());
    }
}
