//! One unit's view of the battle
//!
//! Built fresh for every decision from the live roster, so units killed
//! earlier in the round are already gone from it.

use ordered_float::OrderedFloat;

use crate::battle::resolution::can_attack;
use crate::battle::units::Unit;
use crate::core::types::{GridBounds, GridPos};

/// AI's decision-making context
pub struct DecisionContext<'a> {
    pub unit: &'a Unit,
    /// Living allies, excluding `unit`, in roster order
    pub allies: Vec<&'a Unit>,
    /// Living enemies in roster order
    pub enemies: Vec<&'a Unit>,
    pub bounds: GridBounds,
}

impl<'a> DecisionContext<'a> {
    pub fn new(units: &'a [Unit], index: usize, bounds: GridBounds) -> Self {
        let unit = &units[index];
        let (allies, enemies): (Vec<&Unit>, Vec<&Unit>) = units
            .iter()
            .filter(|u| u.is_alive() && u.id != unit.id)
            .partition(|u| u.side == unit.side);

        Self {
            unit,
            allies,
            enemies,
            bounds,
        }
    }

    pub fn position(&self) -> GridPos {
        self.unit.position
    }

    /// Nearest of `candidates`; ties go to the earlier entry
    pub fn nearest(&self, candidates: &[&'a Unit]) -> Option<&'a Unit> {
        candidates
            .iter()
            .copied()
            .min_by_key(|u| OrderedFloat(self.unit.distance_to(u)))
    }

    pub fn nearest_enemy(&self) -> Option<&'a Unit> {
        self.nearest(&self.enemies)
    }

    /// Enemies within attack range right now
    pub fn enemies_in_range(&self) -> Vec<&'a Unit> {
        self.enemies
            .iter()
            .copied()
            .filter(|e| can_attack(self.unit, e))
            .collect()
    }

    /// Enemies within `radius` of an arbitrary tile
    pub fn enemies_within(&self, from: GridPos, radius: f64) -> Vec<&'a Unit> {
        self.enemies
            .iter()
            .copied()
            .filter(|e| e.distance_to_pos(from) <= radius)
            .collect()
    }

    /// Living allies Foot hold formation around
    pub fn protectors(&self) -> Vec<&'a Unit> {
        self.allies
            .iter()
            .copied()
            .filter(|a| a.archetype.is_protector())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::unit_type::Archetype;
    use crate::core::types::{Side, UnitId};

    fn roster() -> Vec<Unit> {
        let mut units = vec![
            Unit::new(UnitId(0), Archetype::Foot, Side::One, GridPos::new(0, 0)),
            Unit::new(UnitId(1), Archetype::Archer, Side::One, GridPos::new(1, 0)),
            Unit::new(UnitId(2), Archetype::Foot, Side::Two, GridPos::new(2, 0)),
            Unit::new(UnitId(3), Archetype::Foot, Side::Two, GridPos::new(9, 0)),
            Unit::new(UnitId(4), Archetype::Cavalry, Side::Two, GridPos::new(1, 1)),
        ];
        units[4].mark_dead();
        units
    }

    #[test]
    fn test_context_splits_living_allies_and_enemies() {
        let units = roster();
        let ctx = DecisionContext::new(&units, 0, GridBounds::new(40, 28));
        assert_eq!(ctx.allies.len(), 1);
        assert_eq!(ctx.enemies.len(), 2);
        assert_eq!(ctx.protectors().len(), 1);
    }

    #[test]
    fn test_nearest_and_in_range() {
        let units = roster();
        let ctx = DecisionContext::new(&units, 0, GridBounds::new(40, 28));
        assert_eq!(ctx.nearest_enemy().map(|u| u.id), Some(UnitId(2)));
        let in_range: Vec<UnitId> = ctx.enemies_in_range().iter().map(|u| u.id).collect();
        assert_eq!(in_range, vec![UnitId(2)]);
        assert_eq!(ctx.enemies_within(GridPos::new(9, 1), 1.0).len(), 1);
    }
}
