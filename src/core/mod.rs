pub mod config;
pub mod error;
pub mod types;

pub use config::BattleConfig;
pub use error::{CommandError, MusterError};
pub use types::{GridBounds, GridPos, Round, Side, UnitId};
