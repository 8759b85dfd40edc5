//! Combat resolution: damage, defense and death
//!
//! Pure functions over a unit population. Defense is multiplicative: every
//! other living allied Foot whose aura covers the target scales incoming
//! damage by `AURA_DAMAGE_FACTOR`.

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::battle::constants::{AURA_DAMAGE_FACTOR, MIN_DAMAGE};
use crate::battle::units::Unit;
use crate::core::error::CommandError;
use crate::core::types::UnitId;

/// What a call to `apply_damage` did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DamageOutcome {
    AlreadyDead,
    Wounded,
    Killed,
}

/// One target's share of an attack
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strike {
    pub target: UnitId,
    pub damage: u32,
    pub outcome: DamageOutcome,
}

impl Strike {
    pub fn killed(&self) -> bool {
        self.outcome == DamageOutcome::Killed
    }
}

/// Round halves upward, the way the damage tables are tuned
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Count living allied Foot (excluding the target itself) whose aura covers the target
pub fn aura_count(target: &Unit, units: &[Unit]) -> usize {
    units
        .iter()
        .filter(|u| u.id != target.id && u.is_alive() && u.side == target.side)
        .filter(|u| {
            u.archetype
                .aura_range()
                .is_some_and(|range| u.distance_to(target) <= range)
        })
        .count()
}

/// Fraction of incoming damage the target keeps taking
pub fn defense_multiplier(target: &Unit, units: &[Unit]) -> f64 {
    AURA_DAMAGE_FACTOR.powi(aura_count(target, units) as i32)
}

/// Damage `attacker` would deal to `target` right now
///
/// Charge bonus, then close-range penalty, then the target's aura defense.
/// Always at least `MIN_DAMAGE`.
pub fn effective_damage(attacker: &Unit, target: &Unit, units: &[Unit], charging: bool) -> u32 {
    let mut damage = attacker.profile().damage;

    if charging {
        if let Some(multiplier) = attacker.archetype.charge_multiplier() {
            damage *= multiplier;
        }
    }

    if let Some((range, factor)) = attacker.archetype.melee_penalty() {
        if attacker.distance_to(target) <= range {
            damage *= factor;
        }
    }

    damage *= defense_multiplier(target, units);

    (round_half_up(damage).max(0.0) as u32).max(MIN_DAMAGE)
}

/// Subtract health; a dead unit is never damaged again
pub fn apply_damage(unit: &mut Unit, amount: u32) -> DamageOutcome {
    if !unit.is_alive() {
        return DamageOutcome::AlreadyDead;
    }

    unit.health = unit.health.saturating_sub(amount);
    unit.just_hit = true;

    if unit.health == 0 {
        unit.mark_dead();
        DamageOutcome::Killed
    } else {
        DamageOutcome::Wounded
    }
}

pub fn can_attack(attacker: &Unit, target: &Unit) -> bool {
    attacker.distance_to(target) <= attacker.profile().attack_range
}

/// Indices of living enemies within range, in roster order
pub fn enemies_in_range(attacker: &Unit, units: &[Unit]) -> Vec<usize> {
    units
        .iter()
        .enumerate()
        .filter(|(_, u)| u.is_alive() && attacker.is_enemy_of(u) && can_attack(attacker, u))
        .map(|(i, _)| i)
        .collect()
}

/// Nearest living enemy in range; ties go to the earlier roster entry
pub fn nearest_enemy_in_range(attacker: &Unit, units: &[Unit]) -> Option<usize> {
    enemies_in_range(attacker, units)
        .into_iter()
        .min_by_key(|&i| OrderedFloat(attacker.distance_to(&units[i])))
}

/// Resolve one attack by `units[attacker]`
///
/// Area attackers hit every living enemy in range; `target` only has to be
/// one of them. Single-target attackers hit `target`, or the nearest enemy
/// in range when none is given. All damage is computed against the state
/// before the attack, then applied.
pub fn resolve_attack(
    units: &mut [Unit],
    attacker: usize,
    target: Option<UnitId>,
    charging: bool,
) -> Result<Vec<Strike>, CommandError> {
    let attacker_unit = &units[attacker];

    let explicit = match target {
        Some(id) => {
            let index = units
                .iter()
                .position(|u| u.id == id && u.is_alive() && attacker_unit.is_enemy_of(u))
                .ok_or_else(|| {
                    CommandError::InvalidSelection(format!("{id} is not a living enemy"))
                })?;
            let distance = attacker_unit.distance_to(&units[index]);
            let range = attacker_unit.profile().attack_range;
            if distance > range {
                return Err(CommandError::OutOfRange { distance, range });
            }
            Some(index)
        }
        None => None,
    };

    let victims: Vec<usize> = if attacker_unit.profile().area_attack {
        enemies_in_range(attacker_unit, units)
    } else {
        explicit
            .or_else(|| nearest_enemy_in_range(attacker_unit, units))
            .into_iter()
            .collect()
    };

    let planned: Vec<(usize, u32)> = victims
        .into_iter()
        .map(|i| (i, effective_damage(attacker_unit, &units[i], units, charging)))
        .collect();

    Ok(planned
        .into_iter()
        .map(|(i, damage)| Strike {
            target: units[i].id,
            damage,
            outcome: apply_damage(&mut units[i], damage),
        })
        .collect())
}
