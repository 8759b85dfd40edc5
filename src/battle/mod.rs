//! Battle system - turn-based tactical combat on a square grid
//!
//! Two players buy armies under a shared budget, place them in their
//! deployment zones, then alternate rounds in which every unit of the
//! active side is driven by its archetype's AI.
//!
//! Key rules:
//! - Foot soldiers shield nearby allies (multiplicative damage reduction)
//! - Archers lose half their damage at close range
//! - Cavalry charge and strike everything near their landing tile
//! - Planners fight badly but can rally allies to a tile

pub mod ai;
pub mod army;
pub mod constants;
pub mod events;
pub mod execution;
pub mod formation_layout;
pub mod movement;
pub mod resolution;
pub mod unit_type;
pub mod units;

// Re-exports for convenient access
pub use ai::{AiCommander, BattleAI, DecisionContext, MoveReason, UnitIntent};
pub use army::{in_deploy_zone, ArmyBuilder, Composition, Deployment};
pub use constants::*;
pub use events::{BattleEvent, BattleEventType, EventLog, Notifier, StateChanged};
pub use execution::{check_battle_end, BattleOutcome, BattlePhase, BattleSnapshot, BattleState};
pub use formation_layout::deployment_slots;
pub use movement::{rally_step, reached_rally, step_away, step_toward};
pub use resolution::{
    apply_damage, aura_count, can_attack, defense_multiplier, effective_damage, enemies_in_range,
    nearest_enemy_in_range, resolve_attack, round_half_up, DamageOutcome, Strike,
};
pub use unit_type::{Ability, Archetype, ArchetypeProfile};
pub use units::{ArmyStatus, Unit};
