//! Units and per-side roster summaries
//!
//! A unit is created at its deployment tile and never leaves its side's
//! roster. Death is latched: once health reaches zero the unit stays dead.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::battle::unit_type::{Archetype, ArchetypeProfile};
use crate::core::types::{GridPos, Side, UnitId};

/// A unit on the battlefield
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub archetype: Archetype,
    pub side: Side,

    // Position (authoritative for combat)
    pub position: GridPos,

    // Vitals
    pub health: u32,
    alive: bool,

    // Round flags, reset when the unit's side begins a round
    pub has_acted: bool,
    pub has_moved: bool,

    // Set by the last hit, cleared on the next round reset
    pub just_hit: bool,

    // Rally target from a command unit
    pub rally: Option<GridPos>,
}

impl Unit {
    pub fn new(id: UnitId, archetype: Archetype, side: Side, position: GridPos) -> Self {
        Self {
            id,
            archetype,
            side,
            position,
            health: archetype.profile().max_health,
            alive: true,
            has_acted: false,
            has_moved: false,
            just_hit: false,
            rally: None,
        }
    }

    pub fn profile(&self) -> &'static ArchetypeProfile {
        self.archetype.profile()
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Latch death. Only the combat resolver calls this.
    pub(crate) fn mark_dead(&mut self) {
        self.health = 0;
        self.alive = false;
    }

    pub fn distance_to(&self, other: &Unit) -> f64 {
        self.position.distance(&other.position)
    }

    pub fn distance_to_pos(&self, pos: GridPos) -> f64 {
        self.position.distance(&pos)
    }

    pub fn is_enemy_of(&self, other: &Unit) -> bool {
        self.side != other.side
    }

    pub fn health_percent(&self) -> u32 {
        let max = self.profile().max_health.max(1);
        (self.health * 100 + max / 2) / max
    }

    pub fn has_rally(&self) -> bool {
        self.rally.is_some()
    }

    pub fn set_rally(&mut self, target: GridPos) {
        self.rally = Some(target);
    }

    pub fn clear_rally(&mut self) {
        self.rally = None;
    }

    /// Start-of-round reset
    pub fn reset_round_flags(&mut self) {
        self.has_acted = false;
        self.has_moved = false;
        self.just_hit = false;
    }

    /// Short tag for log lines, e.g. `F#3`
    pub fn tag(&self) -> String {
        format!("{}{}", self.profile().abbr, self.id)
    }
}

/// Alive/total counts for one side
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArmyStatus {
    pub alive: usize,
    pub total: usize,
    /// Living units by archetype
    pub by_archetype: AHashMap<Archetype, usize>,
}

impl ArmyStatus {
    pub fn from_units<'a>(side: Side, units: impl IntoIterator<Item = &'a Unit>) -> Self {
        let mut status = ArmyStatus::default();
        for unit in units.into_iter().filter(|u| u.side == side) {
            status.total += 1;
            if unit.is_alive() {
                status.alive += 1;
                *status.by_archetype.entry(unit.archetype).or_insert(0) += 1;
            }
        }
        status
    }

    /// `F×3 A×1` style breakdown in catalog order
    pub fn breakdown(&self) -> String {
        Archetype::ALL
            .iter()
            .filter_map(|a| {
                self.by_archetype
                    .get(a)
                    .map(|n| format!("{}×{}", a.profile().abbr, n))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
