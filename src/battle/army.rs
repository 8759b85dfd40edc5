//! Army building: budgeted composition during setup, queued placement during deployment
//!
//! Composition invariant per side, until lock-in:
//! `budget_left + Σ count[a] * cost[a] == total_budget`.

use std::collections::VecDeque;

use ahash::AHashMap;
use serde::Serialize;

use crate::battle::constants::DEPLOY_ORDER;
use crate::battle::unit_type::Archetype;
use crate::core::error::CommandError;
use crate::core::types::{GridPos, Side};

/// One side's purchased units
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Composition {
    counts: AHashMap<Archetype, u32>,
    pub budget_left: u32,
    pub locked: bool,
}

impl Composition {
    pub fn new(budget: u32) -> Self {
        Self {
            counts: AHashMap::new(),
            budget_left: budget,
            locked: false,
        }
    }

    pub fn count(&self, archetype: Archetype) -> u32 {
        self.counts.get(&archetype).copied().unwrap_or(0)
    }

    pub fn total_units(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Budget already committed to units
    pub fn spent(&self) -> u32 {
        self.counts.iter().map(|(a, n)| a.cost() * n).sum()
    }

    fn add(&mut self, side: Side, archetype: Archetype) -> Result<(), CommandError> {
        if self.locked {
            return Err(CommandError::SideLocked(side));
        }
        let cost = archetype.cost();
        if self.budget_left < cost {
            return Err(CommandError::BudgetExceeded {
                cost,
                left: self.budget_left,
            });
        }
        *self.counts.entry(archetype).or_insert(0) += 1;
        self.budget_left -= cost;
        Ok(())
    }

    fn remove(&mut self, side: Side, archetype: Archetype) -> Result<(), CommandError> {
        if self.locked {
            return Err(CommandError::SideLocked(side));
        }
        match self.counts.get_mut(&archetype) {
            Some(n) if *n > 0 => {
                *n -= 1;
                self.budget_left += archetype.cost();
                Ok(())
            }
            _ => Err(CommandError::NoneToRemove),
        }
    }

    /// Every purchased unit, in deployment order
    pub fn deploy_queue(&self) -> VecDeque<Archetype> {
        DEPLOY_ORDER
            .iter()
            .flat_map(|&a| std::iter::repeat(a).take(self.count(a) as usize))
            .collect()
    }
}

/// Both sides' compositions under a shared budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArmyBuilder {
    pub total_budget: u32,
    compositions: [Composition; 2],
}

impl ArmyBuilder {
    pub fn new(total_budget: u32) -> Self {
        Self {
            total_budget,
            compositions: [Composition::new(total_budget), Composition::new(total_budget)],
        }
    }

    pub fn composition(&self, side: Side) -> &Composition {
        &self.compositions[side.index()]
    }

    pub fn add_unit(&mut self, side: Side, archetype: Archetype) -> Result<(), CommandError> {
        self.compositions[side.index()].add(side, archetype)
    }

    pub fn remove_unit(&mut self, side: Side, archetype: Archetype) -> Result<(), CommandError> {
        self.compositions[side.index()].remove(side, archetype)
    }

    /// Lock a side's composition. Returns whether both sides are now locked.
    pub fn lock_in(&mut self, side: Side) -> Result<bool, CommandError> {
        let composition = &mut self.compositions[side.index()];
        if composition.locked {
            return Err(CommandError::AlreadyLocked(side));
        }
        if composition.total_units() == 0 {
            return Err(CommandError::EmptyArmy(side));
        }
        composition.locked = true;
        Ok(self.both_locked())
    }

    pub fn both_locked(&self) -> bool {
        self.compositions.iter().all(|c| c.locked)
    }

    /// Change the shared budget, keeping what each side already bought
    pub fn set_budget(&mut self, amount: u32) -> Result<(), CommandError> {
        if let Some(side) = Side::BOTH
            .into_iter()
            .find(|s| self.composition(*s).locked)
        {
            return Err(CommandError::SideLocked(side));
        }
        let spent = self.compositions.iter().map(|c| c.spent()).max().unwrap_or(0);
        if amount < spent {
            return Err(CommandError::BudgetBelowSpent {
                requested: amount,
                spent,
            });
        }
        self.total_budget = amount;
        for composition in &mut self.compositions {
            composition.budget_left = amount - composition.spent();
        }
        Ok(())
    }
}

/// Placement progress during the deployment phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deployment {
    pub side: Side,
    pub queue: VecDeque<Archetype>,
}

impl Deployment {
    pub fn new(side: Side, queue: VecDeque<Archetype>) -> Self {
        Self { side, queue }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

/// Is `pos` inside `side`'s deployment zone?
///
/// Side 1 owns the leftmost `zone_cols` columns, side 2 the rightmost.
pub fn in_deploy_zone(side: Side, pos: GridPos, grid_cols: i32, zone_cols: i32) -> bool {
    match side {
        Side::One => pos.x < zone_cols,
        Side::Two => pos.x >= grid_cols - zone_cols,
    }
}
