//! Autonomous unit AI
//!
//! Architecture: Trait + Data hybrid
//! - BattleAI trait defines the interface the engine drives each round
//! - DecisionContext is the read-only view one unit decides from
//! - UnitIntent is the decision; the engine validates and applies it

mod commander;
mod decision_context;

pub use commander::AiCommander;
pub use decision_context::DecisionContext;

use serde::Serialize;

use crate::core::types::{GridPos, UnitId};

/// Why a unit is moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MoveReason {
    Advance, // Toward the nearest enemy
    Rally,   // Toward a rally point
    Regroup, // Back to a protector
    Retreat, // Away from a threat
}

/// What one unit does this round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnitIntent {
    Hold,
    Move { to: GridPos, reason: MoveReason },
    /// Attack aimed at `target`; area attackers hit everyone in range
    Attack { target: UnitId },
    /// Move, then strike everything in range at charge damage if `strike`
    Charge { to: GridPos, strike: bool },
}

/// Trait for battle AI implementations
pub trait BattleAI {
    /// Decide one unit's action for the current round
    fn decide(&mut self, context: &DecisionContext) -> UnitIntent;

    /// Where a command unit would rally its allies, if anywhere
    fn plan_rally(&mut self, _context: &DecisionContext) -> Option<GridPos> {
        None
    }

    /// Restart any randomness (called on engine reset)
    fn reseed(&mut self, _seed: Option<u64>) {}
}
