//! Battle system constants - all tunable values in one place
//!
//! Defense is MULTIPLICATIVE: each allied Foot near a target scales incoming
//! damage by `AURA_DAMAGE_FACTOR`. Never mix in flat damage reduction.

use crate::battle::unit_type::Archetype;

// Grid
pub const DEFAULT_GRID_COLS: i32 = 40;
pub const DEFAULT_GRID_ROWS: i32 = 28;

// Economy
pub const DEFAULT_BUDGET: u32 = 500;
pub const DEFAULT_DEPLOY_COLS: i32 = 8;

// Damage
pub const AURA_DAMAGE_FACTOR: f64 = 0.8; // retained per nearby allied Foot
pub const MIN_DAMAGE: u32 = 1;

// AI radii (tiles)
pub const PLANNER_RETREAT_RADIUS: f64 = 5.0;
pub const RALLY_ARRIVAL_RADIUS: f64 = 0.5;

// Event log
pub const EVENT_LOG_CAPACITY: usize = 40;

/// Order in which a locked composition is queued for deployment
pub const DEPLOY_ORDER: [Archetype; 4] = [
    Archetype::Foot,
    Archetype::Archer,
    Archetype::Cavalry,
    Archetype::Planner,
];

/// Order in which archetypes act during round resolution
pub const RESOLUTION_ORDER: [Archetype; 4] = [
    Archetype::Planner,
    Archetype::Foot,
    Archetype::Archer,
    Archetype::Cavalry,
];
