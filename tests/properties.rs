//! Property tests for budgets and damage

use proptest::prelude::*;

use muster::battle::*;
use muster::core::{GridPos, Side, UnitId};

fn archetype() -> impl Strategy<Value = Archetype> {
    prop_oneof![
        Just(Archetype::Foot),
        Just(Archetype::Archer),
        Just(Archetype::Cavalry),
        Just(Archetype::Planner),
    ]
}

fn side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::One), Just(Side::Two)]
}

proptest! {
    #[test]
    fn budget_invariant_holds_through_any_commands(
        budget in 0u32..1000,
        commands in prop::collection::vec((side(), archetype(), any::<bool>()), 0..40),
    ) {
        let mut builder = ArmyBuilder::new(budget);
        for (side, archetype, add) in commands {
            let _ = if add {
                builder.add_unit(side, archetype)
            } else {
                builder.remove_unit(side, archetype)
            };
            for s in Side::BOTH {
                let c = builder.composition(s);
                prop_assert_eq!(c.budget_left + c.spent(), builder.total_budget);
            }
        }
    }

    #[test]
    fn damage_is_at_least_one(
        attacker in archetype(),
        dx in -20i32..=20,
        dy in -20i32..=20,
        shields in 0usize..4,
        charging in any::<bool>(),
    ) {
        let mut units = vec![
            Unit::new(UnitId(0), attacker, Side::One, GridPos::new(20 + dx, 14 + dy)),
            Unit::new(UnitId(1), Archetype::Foot, Side::Two, GridPos::new(20, 14)),
        ];
        for i in 0..shields {
            units.push(Unit::new(
                UnitId(2 + i as u32),
                Archetype::Foot,
                Side::Two,
                GridPos::new(21, 13 + i as i32),
            ));
        }
        prop_assert!(effective_damage(&units[0], &units[1], &units, charging) >= 1);
    }

    #[test]
    fn damage_non_increasing_in_shield_count(attacker in archetype(), charging in any::<bool>()) {
        let mut units = vec![
            Unit::new(UnitId(0), attacker, Side::One, GridPos::new(10, 10)),
            Unit::new(UnitId(1), Archetype::Foot, Side::Two, GridPos::new(11, 10)),
        ];
        let mut previous = effective_damage(&units[0], &units[1], &units, charging);
        for k in 0..3u32 {
            units.push(Unit::new(
                UnitId(2 + k),
                Archetype::Foot,
                Side::Two,
                GridPos::new(12, 9 + k as i32),
            ));
            let damage = effective_damage(&units[0], &units[1], &units, charging);
            prop_assert!(damage <= previous);
            previous = damage;
        }
    }

    #[test]
    fn dead_units_stay_dead(hits in prop::collection::vec(1u32..80, 1..10)) {
        let mut unit = Unit::new(UnitId(0), Archetype::Foot, Side::One, GridPos::new(0, 0));
        let mut killed = 0;
        for hit in hits {
            match apply_damage(&mut unit, hit) {
                DamageOutcome::Killed => killed += 1,
                DamageOutcome::AlreadyDead => prop_assert!(!unit.is_alive()),
                DamageOutcome::Wounded => prop_assert!(unit.is_alive()),
            }
        }
        prop_assert!(killed <= 1);
    }
}
