//! Archetype catalog: the four unit types and their fixed profiles
//!
//! Profiles are data. Special rules hang off the `Ability` variant each
//! archetype carries, so combat and AI code dispatch on the variant instead
//! of on names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::MusterError;

/// Type of unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Archetype {
    Foot,    // Cheap anvil, aura
    Archer,  // Glass cannon
    #[serde(rename = "HORSE", alias = "CAVALRY")]
    Cavalry, // Fast, charges
    Planner, // Command unit
}

/// The one special rule an archetype carries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Ability {
    /// Allies of this unit within `range` take reduced damage
    DefenseAura { range: f64 },
    /// Damage scaled by `factor` against targets within `range`
    MeleePenalty { range: f64, factor: f64 },
    /// May move then attack in one round at `multiplier` damage
    Charge { multiplier: f64 },
    /// May rally allies within `range` once per round
    Command { range: f64 },
}

/// Fixed stats for an archetype
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchetypeProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub abbr: char,
    pub cost: u32,
    pub max_health: u32,
    pub move_speed: f64,  // Max Euclidean travel per round
    pub damage: f64,
    pub attack_range: f64,
    pub base_defense: u32, // Catalog data only, see constants
    pub area_attack: bool, // Hits every enemy in range
    pub ability: Ability,
}

static FOOT: ArchetypeProfile = ArchetypeProfile {
    id: "FOOT",
    name: "Foot Soldier",
    abbr: 'F',
    cost: 50,
    max_health: 100,
    move_speed: 5.0,
    damage: 10.0,
    attack_range: 2.0,
    base_defense: 5,
    area_attack: true,
    ability: Ability::DefenseAura { range: 2.0 },
};

static ARCHER: ArchetypeProfile = ArchetypeProfile {
    id: "ARCHER",
    name: "Archer",
    abbr: 'A',
    cost: 75,
    max_health: 100,
    move_speed: 4.0,
    damage: 5.0,
    attack_range: 20.0,
    base_defense: 0,
    area_attack: false,
    ability: Ability::MeleePenalty {
        range: 3.0,
        factor: 0.5,
    },
};

static CAVALRY: ArchetypeProfile = ArchetypeProfile {
    id: "HORSE",
    name: "Cavalry",
    abbr: 'C',
    cost: 100,
    max_health: 100,
    move_speed: 20.0,
    damage: 10.0,
    attack_range: 4.0,
    base_defense: 0,
    area_attack: true,
    ability: Ability::Charge { multiplier: 1.5 },
};

static PLANNER: ArchetypeProfile = ArchetypeProfile {
    id: "PLANNER",
    name: "Planner",
    abbr: 'P',
    cost: 125,
    max_health: 100,
    move_speed: 1.0,
    damage: 1.0,
    attack_range: 2.0,
    base_defense: 0,
    area_attack: false,
    ability: Ability::Command { range: 10.0 },
};

impl Archetype {
    pub const ALL: [Archetype; 4] = [
        Archetype::Foot,
        Archetype::Archer,
        Archetype::Cavalry,
        Archetype::Planner,
    ];

    /// Get the fixed profile for this archetype
    pub fn profile(self) -> &'static ArchetypeProfile {
        match self {
            Archetype::Foot => &FOOT,
            Archetype::Archer => &ARCHER,
            Archetype::Cavalry => &CAVALRY,
            Archetype::Planner => &PLANNER,
        }
    }

    pub fn cost(self) -> u32 {
        self.profile().cost
    }

    pub fn aura_range(self) -> Option<f64> {
        match self.profile().ability {
            Ability::DefenseAura { range } => Some(range),
            _ => None,
        }
    }

    /// `(range, factor)` of the close-target penalty, if any
    pub fn melee_penalty(self) -> Option<(f64, f64)> {
        match self.profile().ability {
            Ability::MeleePenalty { range, factor } => Some((range, factor)),
            _ => None,
        }
    }

    pub fn charge_multiplier(self) -> Option<f64> {
        match self.profile().ability {
            Ability::Charge { multiplier } => Some(multiplier),
            _ => None,
        }
    }

    pub fn command_range(self) -> Option<f64> {
        match self.profile().ability {
            Ability::Command { range } => Some(range),
            _ => None,
        }
    }

    /// Can this archetype issue rally orders?
    pub fn can_command(self) -> bool {
        self.command_range().is_some()
    }

    /// Do Foot units hold formation around this archetype?
    pub fn is_protector(self) -> bool {
        matches!(self, Archetype::Archer | Archetype::Cavalry)
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name)
    }
}

impl FromStr for Archetype {
    type Err = MusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FOOT" | "F" => Ok(Archetype::Foot),
            "ARCHER" | "A" => Ok(Archetype::Archer),
            "HORSE" | "CAVALRY" | "C" => Ok(Archetype::Cavalry),
            "PLANNER" | "P" => Ok(Archetype::Planner),
            _ => Err(MusterError::UnknownArchetype(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cavalry_fastest() {
        let cavalry = Archetype::Cavalry.profile().move_speed;
        for archetype in Archetype::ALL {
            assert!(archetype.profile().move_speed <= cavalry);
        }
    }

    #[test]
    fn test_archer_outranges_everyone() {
        assert!(Archetype::Archer.profile().attack_range > Archetype::Cavalry.profile().attack_range);
        assert_eq!(Archetype::Archer.melee_penalty(), Some((3.0, 0.5)));
    }

    #[test]
    fn test_each_ability_on_one_archetype() {
        assert_eq!(Archetype::Foot.aura_range(), Some(2.0));
        assert_eq!(Archetype::Cavalry.charge_multiplier(), Some(1.5));
        assert_eq!(Archetype::Planner.command_range(), Some(10.0));
        assert!(Archetype::Foot.charge_multiplier().is_none());
        assert!(!Archetype::Archer.can_command());
    }

    #[test]
    fn test_area_attackers() {
        assert!(Archetype::Foot.profile().area_attack);
        assert!(Archetype::Cavalry.profile().area_attack);
        assert!(!Archetype::Archer.profile().area_attack);
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!("foot".parse::<Archetype>().unwrap(), Archetype::Foot);
        assert_eq!("HORSE".parse::<Archetype>().unwrap(), Archetype::Cavalry);
        assert_eq!("cavalry".parse::<Archetype>().unwrap(), Archetype::Cavalry);
        assert!("dragon".parse::<Archetype>().is_err());
    }

    #[test]
    fn test_serde_uses_catalog_ids() {
        let json = serde_json::to_string(&Archetype::Cavalry).unwrap();
        assert_eq!(json, "\"HORSE\"");
        let back: Archetype = serde_json::from_str("\"CAVALRY\"").unwrap();
        assert_eq!(back, Archetype::Cavalry);
    }
}
