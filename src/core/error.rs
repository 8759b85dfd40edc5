use thiserror::Error;

use crate::battle::execution::BattlePhase;
use crate::core::types::{GridPos, Side};

#[derive(Error, Debug)]
pub enum MusterError {
    #[error("Unknown archetype: {0}")]
    UnknownArchetype(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MusterError>;

/// Why the engine refused a command. A rejected command changes nothing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Not allowed during {0:?}")]
    InvalidPhase(BattlePhase),

    #[error("{0} is already locked in")]
    SideLocked(Side),

    #[error("Not enough budget: need {cost}, have {left}")]
    BudgetExceeded { cost: u32, left: u32 },

    #[error("No unit of that type to remove")]
    NoneToRemove,

    #[error("{0} has no units to lock in")]
    EmptyArmy(Side),

    #[error("{0} is already locked in")]
    AlreadyLocked(Side),

    #[error("Budget {requested} is below the {spent} already spent")]
    BudgetBelowSpent { requested: u32, spent: u32 },

    #[error("No units left to place")]
    DeployQueueEmpty,

    #[error("Place units inside your zone ({0} is outside)")]
    OutOfZone(GridPos),

    #[error("Tile {0} is off the map")]
    OutOfBounds(GridPos),

    #[error("Tile {0} is already occupied")]
    TileOccupied(GridPos),

    #[error("Target out of range ({distance:.1} > {range})")]
    OutOfRange { distance: f64, range: f64 },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("No command unit selected")]
    NoSelection,
}
