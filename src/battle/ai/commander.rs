//! AI Commander - greedy per-archetype unit heuristics
//!
//! No search or lookahead: every decision looks only at the current state.
//! Random choices come from a seeded ChaCha stream so battles replay.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::battle::ai::decision_context::DecisionContext;
use crate::battle::ai::{BattleAI, MoveReason, UnitIntent};
use crate::battle::constants::PLANNER_RETREAT_RADIUS;
use crate::battle::movement::{rally_step, reached_rally, step_away, step_toward};
use crate::battle::unit_type::Archetype;
use crate::battle::units::Unit;
use crate::core::types::GridPos;

/// AI Commander implementing BattleAI trait
pub struct AiCommander {
    rng: ChaCha8Rng,
}

impl AiCommander {
    /// Seeded commander; entropy when `seed` is `None`
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: Self::make_rng(seed),
        }
    }

    fn make_rng(seed: Option<u64>) -> ChaCha8Rng {
        match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    fn pick<'a>(&mut self, candidates: &[&'a Unit]) -> Option<&'a Unit> {
        candidates.choose(&mut self.rng).copied()
    }

    fn advance(ctx: &DecisionContext) -> UnitIntent {
        match ctx.nearest_enemy() {
            Some(enemy) => move_to(ctx, enemy.position, MoveReason::Advance),
            None => UnitIntent::Hold,
        }
    }

    /// Back away from the nearest enemy inside the retreat radius, else stay
    fn decide_planner(&mut self, ctx: &DecisionContext) -> UnitIntent {
        let threats = ctx.enemies_within(ctx.position(), PLANNER_RETREAT_RADIUS);
        let Some(threat) = ctx.nearest(&threats) else {
            return UnitIntent::Hold;
        };

        let to = step_away(
            ctx.position(),
            threat.position,
            ctx.unit.profile().move_speed,
            ctx.bounds,
        );
        if to == ctx.position() {
            UnitIntent::Hold
        } else {
            UnitIntent::Move {
                to,
                reason: MoveReason::Retreat,
            }
        }
    }

    /// Rallied Foot keep formation with protectors before anything else
    fn decide_foot(&mut self, ctx: &DecisionContext) -> UnitIntent {
        let unit = ctx.unit;
        let rallied = unit.has_rally() && !reached_rally(unit);

        if rallied {
            let protectors = ctx.protectors();
            let aura = unit.archetype.aura_range().unwrap_or(0.0);
            let in_formation = protectors.iter().any(|p| unit.distance_to(p) <= aura);
            if !in_formation {
                if let Some(protector) = ctx.nearest(&protectors) {
                    return move_to(ctx, protector.position, MoveReason::Regroup);
                }
            }
        }

        if let Some(target) = self.pick(&ctx.enemies_in_range()) {
            return UnitIntent::Attack { target: target.id };
        }

        if rallied {
            if let Some(to) = rally_step(unit, ctx.bounds) {
                return UnitIntent::Move {
                    to,
                    reason: MoveReason::Rally,
                };
            }
        }

        Self::advance(ctx)
    }

    /// Prefer targets beyond the penalty radius; back off when crowded
    fn decide_archer(&mut self, ctx: &DecisionContext) -> UnitIntent {
        let unit = ctx.unit;
        let penalty_range = unit.archetype.melee_penalty().map_or(0.0, |(range, _)| range);
        let in_range = ctx.enemies_in_range();

        let clear_shots: Vec<&Unit> = in_range
            .iter()
            .copied()
            .filter(|e| unit.distance_to(e) > penalty_range)
            .collect();
        if let Some(target) = self.pick(&clear_shots) {
            return UnitIntent::Attack { target: target.id };
        }

        if let Some(target) = self.pick(&in_range) {
            return UnitIntent::Attack { target: target.id };
        }

        let crowding = ctx.enemies_within(ctx.position(), penalty_range);
        if let Some(threat) = ctx.nearest(&crowding) {
            let to = step_away(
                ctx.position(),
                threat.position,
                unit.profile().move_speed,
                ctx.bounds,
            );
            return UnitIntent::Move {
                to,
                reason: MoveReason::Retreat,
            };
        }

        Self::advance(ctx)
    }

    /// Always close in at full speed, striking if anything ends up in range
    fn decide_cavalry(&mut self, ctx: &DecisionContext) -> UnitIntent {
        let Some(enemy) = ctx.nearest_enemy() else {
            return UnitIntent::Hold;
        };

        let to = step_toward(
            ctx.position(),
            enemy.position,
            ctx.unit.profile().move_speed,
            ctx.bounds,
        );
        let strike = !ctx
            .enemies_within(to, ctx.unit.profile().attack_range)
            .is_empty();

        UnitIntent::Charge { to, strike }
    }
}

fn move_to(ctx: &DecisionContext, target: GridPos, reason: MoveReason) -> UnitIntent {
    let to = step_toward(
        ctx.position(),
        target,
        ctx.unit.profile().move_speed,
        ctx.bounds,
    );
    UnitIntent::Move { to, reason }
}

impl BattleAI for AiCommander {
    fn decide(&mut self, context: &DecisionContext) -> UnitIntent {
        match context.unit.archetype {
            Archetype::Planner => self.decide_planner(context),
            Archetype::Foot => self.decide_foot(context),
            Archetype::Archer => self.decide_archer(context),
            Archetype::Cavalry => self.decide_cavalry(context),
        }
    }

    /// Rally everyone onto the nearest enemy
    fn plan_rally(&mut self, context: &DecisionContext) -> Option<GridPos> {
        context.nearest_enemy().map(|e| e.position)
    }

    fn reseed(&mut self, seed: Option<u64>) {
        self.rng = Self::make_rng(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{GridBounds, Side, UnitId};

    const BOUNDS: GridBounds = GridBounds { cols: 40, rows: 28 };

    fn unit(id: u32, archetype: Archetype, side: Side, x: i32, y: i32) -> Unit {
        Unit::new(UnitId(id), archetype, side, GridPos::new(x, y))
    }

    fn decide(units: &[Unit], index: usize) -> UnitIntent {
        let mut ai = AiCommander::new(Some(7));
        ai.decide(&DecisionContext::new(units, index, BOUNDS))
    }

    #[test]
    fn test_planner_retreats_from_close_enemy() {
        let units = vec![
            unit(0, Archetype::Planner, Side::One, 10, 10),
            unit(1, Archetype::Foot, Side::Two, 13, 10),
        ];
        assert_eq!(
            decide(&units, 0),
            UnitIntent::Move {
                to: GridPos::new(9, 10),
                reason: MoveReason::Retreat
            }
        );
    }

    #[test]
    fn test_planner_holds_when_safe() {
        let units = vec![
            unit(0, Archetype::Planner, Side::One, 10, 10),
            unit(1, Archetype::Foot, Side::Two, 30, 10),
        ];
        assert_eq!(decide(&units, 0), UnitIntent::Hold);
    }

    #[test]
    fn test_foot_attacks_when_enemy_in_range() {
        let units = vec![
            unit(0, Archetype::Foot, Side::One, 10, 10),
            unit(1, Archetype::Archer, Side::Two, 11, 10),
        ];
        assert_eq!(decide(&units, 0), UnitIntent::Attack { target: UnitId(1) });
    }

    #[test]
    fn test_foot_advances_without_rally() {
        let units = vec![
            unit(0, Archetype::Foot, Side::One, 0, 0),
            unit(1, Archetype::Archer, Side::Two, 6, 0),
        ];
        assert_eq!(
            decide(&units, 0),
            UnitIntent::Move {
                to: GridPos::new(5, 0),
                reason: MoveReason::Advance
            }
        );
    }

    #[test]
    fn test_rallied_foot_regroups_before_attacking() {
        let mut units = vec![
            unit(0, Archetype::Foot, Side::One, 10, 10),
            unit(1, Archetype::Archer, Side::One, 20, 10),
            unit(2, Archetype::Foot, Side::Two, 11, 10),
        ];
        units[0].set_rally(GridPos::new(0, 10));
        assert_eq!(
            decide(&units, 0),
            UnitIntent::Move {
                to: GridPos::new(15, 10),
                reason: MoveReason::Regroup
            }
        );
    }

    #[test]
    fn test_rallied_foot_in_formation_follows_rally() {
        let mut units = vec![
            unit(0, Archetype::Foot, Side::One, 10, 10),
            unit(1, Archetype::Archer, Side::One, 11, 10),
            unit(2, Archetype::Foot, Side::Two, 30, 10),
        ];
        units[0].set_rally(GridPos::new(10, 20));
        assert_eq!(
            decide(&units, 0),
            UnitIntent::Move {
                to: GridPos::new(10, 15),
                reason: MoveReason::Rally
            }
        );
    }

    #[test]
    fn test_rallied_foot_without_protectors_follows_rally() {
        let mut units = vec![
            unit(0, Archetype::Foot, Side::One, 10, 10),
            unit(1, Archetype::Foot, Side::Two, 30, 10),
        ];
        units[0].set_rally(GridPos::new(12, 10));
        assert_eq!(
            decide(&units, 0),
            UnitIntent::Move {
                to: GridPos::new(12, 10),
                reason: MoveReason::Rally
            }
        );
    }

    #[test]
    fn test_archer_prefers_unpenalised_target() {
        let units = vec![
            unit(0, Archetype::Archer, Side::One, 10, 10),
            unit(1, Archetype::Foot, Side::Two, 11, 10),
            unit(2, Archetype::Foot, Side::Two, 20, 10),
        ];
        for seed in 0..20 {
            let mut ai = AiCommander::new(Some(seed));
            let intent = ai.decide(&DecisionContext::new(&units, 0, BOUNDS));
            assert_eq!(intent, UnitIntent::Attack { target: UnitId(2) });
        }
    }

    #[test]
    fn test_archer_accepts_penalised_target() {
        let units = vec![
            unit(0, Archetype::Archer, Side::One, 10, 10),
            unit(1, Archetype::Foot, Side::Two, 11, 10),
        ];
        assert_eq!(decide(&units, 0), UnitIntent::Attack { target: UnitId(1) });
    }

    #[test]
    fn test_archer_advances_when_nothing_in_range() {
        let units = vec![
            unit(0, Archetype::Archer, Side::One, 0, 0),
            unit(1, Archetype::Foot, Side::Two, 30, 0),
        ];
        assert_eq!(
            decide(&units, 0),
            UnitIntent::Move {
                to: GridPos::new(4, 0),
                reason: MoveReason::Advance
            }
        );
    }

    #[test]
    fn test_cavalry_charges_into_range() {
        let units = vec![
            unit(0, Archetype::Cavalry, Side::One, 0, 0),
            unit(1, Archetype::Foot, Side::Two, 15, 0),
        ];
        assert_eq!(
            decide(&units, 0),
            UnitIntent::Charge {
                to: GridPos::new(15, 0),
                strike: true
            }
        );
    }

    #[test]
    fn test_cavalry_no_strike_when_still_far() {
        let units = vec![
            unit(0, Archetype::Cavalry, Side::One, 0, 0),
            unit(1, Archetype::Foot, Side::Two, 30, 0),
        ];
        assert_eq!(
            decide(&units, 0),
            UnitIntent::Charge {
                to: GridPos::new(20, 0),
                strike: false
            }
        );
    }

    #[test]
    fn test_same_seed_same_choices() {
        let units = vec![
            unit(0, Archetype::Foot, Side::One, 10, 10),
            unit(1, Archetype::Archer, Side::Two, 11, 10),
            unit(2, Archetype::Archer, Side::Two, 10, 11),
            unit(3, Archetype::Archer, Side::Two, 9, 10),
        ];
        let run = |seed| {
            let mut ai = AiCommander::new(Some(seed));
            (0..10)
                .map(|_| ai.decide(&DecisionContext::new(&units, 0, BOUNDS)))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(3), run(3));
    }

    #[test]
    fn test_plan_rally_targets_nearest_enemy() {
        let units = vec![
            unit(0, Archetype::Planner, Side::One, 0, 0),
            unit(1, Archetype::Foot, Side::Two, 30, 0),
            unit(2, Archetype::Foot, Side::Two, 20, 5),
        ];
        let mut ai = AiCommander::new(Some(1));
        let ctx = DecisionContext::new(&units, 0, BOUNDS);
        assert_eq!(ai.plan_rally(&ctx), Some(GridPos::new(20, 5)));
    }
}
