//! Battle engine: phase state machine and round resolution
//!
//! SETUP -> DEPLOY -> BATTLE (sides alternate) -> GAME_OVER.
//! Each round: reset flags -> optional rally -> AI resolution in archetype
//! order -> win check -> next side.
//!
//! Every command either commits (and notifies subscribers) or is rejected
//! with a `CommandError` and leaves the state exactly as it was.

use std::sync::mpsc::Receiver;

use serde::{Deserialize, Serialize};

use crate::battle::ai::{AiCommander, BattleAI, DecisionContext, UnitIntent};
use crate::battle::army::{in_deploy_zone, ArmyBuilder, Composition, Deployment};
use crate::battle::constants::RESOLUTION_ORDER;
use crate::battle::events::{BattleEventType, EventLog, Notifier, StateChanged};
use crate::battle::movement::reached_rally;
use crate::battle::resolution::resolve_attack;
use crate::battle::unit_type::Archetype;
use crate::battle::units::{ArmyStatus, Unit};
use crate::core::config::BattleConfig;
use crate::core::error::{CommandError, MusterError};
use crate::core::types::{GridPos, Round, Side, UnitId};

/// Battle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattlePhase {
    #[default]
    Setup, // Buying units
    Deploy,         // Placing units
    Battle,         // Waiting for a command
    ResolvingRound, // AI acting for the active side
    GameOver,       // Terminal until reset
}

/// Battle outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattleOutcome {
    #[default]
    Undecided,
    Victory(Side),
    Draw,
}

impl BattleOutcome {
    /// 0 for a draw, the winning player's number, or `None` while undecided
    pub fn winner_code(&self) -> Option<u8> {
        match self {
            BattleOutcome::Undecided => None,
            BattleOutcome::Draw => Some(0),
            BattleOutcome::Victory(side) => Some(side.number()),
        }
    }
}

/// Decide the battle from the rosters, if it is over
pub fn check_battle_end(units: &[Unit]) -> Option<BattleOutcome> {
    let alive = |side: Side| units.iter().any(|u| u.side == side && u.is_alive());
    match (alive(Side::One), alive(Side::Two)) {
        (false, false) => Some(BattleOutcome::Draw),
        (true, false) => Some(BattleOutcome::Victory(Side::One)),
        (false, true) => Some(BattleOutcome::Victory(Side::Two)),
        (true, true) => None,
    }
}

fn rejected(err: CommandError) -> CommandError {
    tracing::warn!("Command rejected: {}", err);
    err
}

/// Complete battle state
///
/// Owns both rosters; nothing outside the engine holds a unit.
pub struct BattleState {
    pub config: BattleConfig,

    // Phase
    pub phase: BattlePhase,
    pub outcome: BattleOutcome,

    // Setup / deploy
    pub builder: ArmyBuilder,
    pub deployment: Option<Deployment>,

    // Both rosters, in insertion order
    pub units: Vec<Unit>,

    // Turn
    pub active_side: Side,
    pub round: Round,
    pub selected: Option<UnitId>,

    // Log
    pub log: EventLog,

    next_unit_id: u32,
    ai: Box<dyn BattleAI>,
    notifier: Notifier,
}

impl BattleState {
    /// Engine with the default AI commander
    ///
    /// `config` is expected to have passed `BattleConfig::validate`; use
    /// `try_new` for configs loaded from outside.
    pub fn new(config: BattleConfig) -> Self {
        let ai = Box::new(AiCommander::new(config.seed));
        Self::with_ai(config, ai)
    }

    /// Validate `config`, then build the engine
    pub fn try_new(config: BattleConfig) -> Result<Self, MusterError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Engine driven by a custom AI
    pub fn with_ai(config: BattleConfig, ai: Box<dyn BattleAI>) -> Self {
        Self {
            phase: BattlePhase::Setup,
            outcome: BattleOutcome::Undecided,
            builder: ArmyBuilder::new(config.budget),
            deployment: None,
            units: Vec::new(),
            active_side: Side::One,
            round: 1,
            selected: None,
            log: EventLog::new(config.log_capacity),
            next_unit_id: 0,
            ai,
            notifier: Notifier::new(),
            config,
        }
    }

    /// Start a battle from hand-placed units, skipping setup and deployment
    ///
    /// Placements ignore zones and budget; used for scenarios.
    pub fn from_placements(
        config: BattleConfig,
        placements: &[(Side, Archetype, GridPos)],
    ) -> Self {
        let mut state = Self::new(config);
        for &(side, archetype, position) in placements {
            state.spawn(side, archetype, position);
        }
        state.start_battle();
        state
    }

    // ===== NOTIFICATION =====

    pub fn subscribe(&mut self) -> Receiver<StateChanged> {
        self.notifier.subscribe()
    }

    /// Count of committed commands since creation
    pub fn revision(&self) -> u64 {
        self.notifier.revision()
    }

    fn commit(&mut self) {
        self.notifier.publish(self.phase);
    }

    fn log_event(&mut self, event_type: BattleEventType, description: String) {
        self.log.push(self.round, event_type, description);
    }

    fn require_phase(&self, phase: BattlePhase) -> Result<(), CommandError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(CommandError::InvalidPhase(self.phase))
        }
    }

    // ===== QUERIES =====

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, BattlePhase::GameOver)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Roster of one side, dead included, in insertion order
    pub fn roster(&self, side: Side) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |u| u.side == side)
    }

    pub fn alive_units(&self, side: Side) -> impl Iterator<Item = &Unit> {
        self.roster(side).filter(|u| u.is_alive())
    }

    /// Living unit on a tile
    pub fn unit_at(&self, pos: GridPos) -> Option<&Unit> {
        self.units.iter().find(|u| u.is_alive() && u.position == pos)
    }

    pub fn army_status(&self, side: Side) -> ArmyStatus {
        ArmyStatus::from_units(side, &self.units)
    }

    pub fn has_planners(&self, side: Side) -> bool {
        self.alive_units(side).any(|u| u.archetype.can_command())
    }

    pub fn composition(&self, side: Side) -> &Composition {
        self.builder.composition(side)
    }

    /// Side currently placing units, during deployment
    pub fn deploying_side(&self) -> Option<Side> {
        self.deployment.as_ref().map(|d| d.side)
    }

    pub fn deploy_remaining(&self) -> usize {
        self.deployment.as_ref().map_or(0, |d| d.remaining())
    }

    // ===== SETUP =====

    pub fn set_budget(&mut self, amount: u32) -> Result<(), CommandError> {
        self.require_phase(BattlePhase::Setup)
            .and_then(|_| self.builder.set_budget(amount))
            .map_err(rejected)?;

        for side in Side::BOTH {
            self.log_event(
                BattleEventType::CompositionChanged { side },
                format!("{} budget set to {}", side, amount),
            );
        }
        self.commit();
        Ok(())
    }

    pub fn add_unit(&mut self, side: Side, archetype: Archetype) -> Result<(), CommandError> {
        self.require_phase(BattlePhase::Setup)
            .and_then(|_| self.builder.add_unit(side, archetype))
            .map_err(rejected)?;

        let left = self.builder.composition(side).budget_left;
        self.log_event(
            BattleEventType::CompositionChanged { side },
            format!("{} recruited {} ({} left)", side, archetype, left),
        );
        self.commit();
        Ok(())
    }

    pub fn remove_unit(&mut self, side: Side, archetype: Archetype) -> Result<(), CommandError> {
        self.require_phase(BattlePhase::Setup)
            .and_then(|_| self.builder.remove_unit(side, archetype))
            .map_err(rejected)?;

        let left = self.builder.composition(side).budget_left;
        self.log_event(
            BattleEventType::CompositionChanged { side },
            format!("{} dismissed {} ({} left)", side, archetype, left),
        );
        self.commit();
        Ok(())
    }

    /// Lock a side's composition; deployment begins once both are locked
    pub fn lock_in(&mut self, side: Side) -> Result<(), CommandError> {
        let both_locked = self
            .require_phase(BattlePhase::Setup)
            .and_then(|_| self.builder.lock_in(side))
            .map_err(rejected)?;

        let total = self.builder.composition(side).total_units();
        self.log_event(
            BattleEventType::ArmyLocked { side },
            format!("{} locked in {} units", side, total),
        );
        if both_locked {
            self.start_deploy();
        }
        self.commit();
        Ok(())
    }

    // ===== DEPLOY =====

    fn start_deploy(&mut self) {
        self.phase = BattlePhase::Deploy;
        let queue = self.builder.composition(Side::One).deploy_queue();
        self.deployment = Some(Deployment::new(Side::One, queue));
        tracing::info!("Deployment started");
        self.log_event(
            BattleEventType::PhaseChanged {
                phase: BattlePhase::Deploy,
            },
            format!("{}: place your units", Side::One),
        );
    }

    fn validate_placement(&self, pos: GridPos) -> Result<Side, CommandError> {
        self.require_phase(BattlePhase::Deploy)?;
        let deployment = self
            .deployment
            .as_ref()
            .filter(|d| d.remaining() > 0)
            .ok_or(CommandError::DeployQueueEmpty)?;

        if !self.config.bounds().contains(pos) {
            return Err(CommandError::OutOfBounds(pos));
        }
        if !in_deploy_zone(
            deployment.side,
            pos,
            self.config.grid_cols,
            self.config.deploy_cols,
        ) {
            return Err(CommandError::OutOfZone(pos));
        }
        if self.unit_at(pos).is_some() {
            return Err(CommandError::TileOccupied(pos));
        }
        Ok(deployment.side)
    }

    /// Place the next queued unit of the deploying side
    pub fn place_unit(&mut self, col: i32, row: i32) -> Result<UnitId, CommandError> {
        let pos = GridPos::new(col, row);
        let side = self.validate_placement(pos).map_err(rejected)?;

        let Some(archetype) = self.deployment.as_mut().and_then(|d| d.queue.pop_front()) else {
            return Err(rejected(CommandError::DeployQueueEmpty));
        };
        let id = self.spawn(side, archetype, pos);

        if self.deploy_remaining() == 0 {
            match side {
                Side::One => {
                    let queue = self.builder.composition(Side::Two).deploy_queue();
                    self.deployment = Some(Deployment::new(Side::Two, queue));
                    self.log_event(
                        BattleEventType::PhaseChanged {
                            phase: BattlePhase::Deploy,
                        },
                        format!("{}: place your units", Side::Two),
                    );
                }
                Side::Two => self.start_battle(),
            }
        }

        self.commit();
        Ok(id)
    }

    fn spawn(&mut self, side: Side, archetype: Archetype, position: GridPos) -> UnitId {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        self.units.push(Unit::new(id, archetype, side, position));
        self.log_event(
            BattleEventType::UnitPlaced {
                unit_id: id,
                position,
            },
            format!("{} placed {} at {}", side, archetype, position),
        );
        id
    }

    // ===== BATTLE =====

    fn start_battle(&mut self) {
        self.deployment = None;
        self.phase = BattlePhase::Battle;
        self.active_side = Side::One;
        self.round = 1;
        tracing::info!("Battle started with {} units", self.units.len());
        self.log_event(
            BattleEventType::PhaseChanged {
                phase: BattlePhase::Battle,
            },
            "Battle has begun!".into(),
        );
        self.begin_round();
    }

    fn begin_round(&mut self) {
        let side = self.active_side;
        for unit in self.units.iter_mut().filter(|u| u.side == side && u.is_alive()) {
            unit.reset_round_flags();
        }
        self.selected = None;
        self.log_event(
            BattleEventType::RoundStarted { side },
            format!("--- Round {}: {}'s turn ---", self.round, side),
        );
    }

    fn validate_command_unit(&self, id: UnitId) -> Result<usize, CommandError> {
        let index = self
            .units
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| CommandError::InvalidSelection(format!("no unit {id}")))?;
        let unit = &self.units[index];

        if !unit.is_alive() {
            return Err(CommandError::InvalidSelection(format!("{} is dead", unit.tag())));
        }
        if unit.side != self.active_side {
            return Err(CommandError::InvalidSelection(format!(
                "{} belongs to {}",
                unit.tag(),
                unit.side
            )));
        }
        if unit.has_acted {
            return Err(CommandError::InvalidSelection(format!(
                "{} already acted",
                unit.tag()
            )));
        }
        if !unit.archetype.can_command() {
            return Err(CommandError::InvalidSelection(format!(
                "{} cannot give orders",
                unit.tag()
            )));
        }
        Ok(index)
    }

    /// Select a living, not-yet-acted command unit of the active side
    pub fn select_command_unit(&mut self, id: UnitId) -> Result<(), CommandError> {
        self.require_phase(BattlePhase::Battle)
            .and_then(|_| self.validate_command_unit(id))
            .map_err(rejected)?;

        self.selected = Some(id);
        self.commit();
        Ok(())
    }

    pub fn clear_selection(&mut self) -> Result<(), CommandError> {
        self.require_phase(BattlePhase::Battle)
            .and_then(|_| self.selected.ok_or(CommandError::NoSelection))
            .map_err(rejected)?;

        self.selected = None;
        self.commit();
        Ok(())
    }

    /// Rally every living ally within command range of the selected unit to a tile
    ///
    /// Returns how many allies received the order.
    pub fn issue_rally_order(&mut self, col: i32, row: i32) -> Result<usize, CommandError> {
        let target = GridPos::new(col, row);
        let planner_index = self
            .require_phase(BattlePhase::Battle)
            .and_then(|_| self.selected.ok_or(CommandError::NoSelection))
            .and_then(|id| {
                if self.config.bounds().contains(target) {
                    self.validate_command_unit(id)
                } else {
                    Err(CommandError::OutOfBounds(target))
                }
            })
            .map_err(rejected)?;

        let planner = &self.units[planner_index];
        let (planner_id, side, origin) = (planner.id, planner.side, planner.position);
        let range = planner.archetype.command_range().unwrap_or(0.0);

        let mut rallied = 0;
        for unit in self.units.iter_mut().filter(|u| {
            u.is_alive() && u.side == side && u.id != planner_id && u.distance_to_pos(origin) <= range
        }) {
            unit.set_rally(target);
            rallied += 1;
        }

        self.units[planner_index].has_acted = true;
        self.selected = None;
        tracing::debug!("{} rallied {} allies to {}", planner_id, rallied, target);
        self.log_event(
            BattleEventType::RallyOrdered {
                planner: planner_id,
                target,
                allies: rallied,
            },
            format!("Planner rallied {} allies to {}", rallied, target),
        );
        self.commit();
        Ok(rallied)
    }

    /// Run the AI for every remaining unit of the active side, then pass the turn
    pub fn end_round(&mut self) -> Result<(), CommandError> {
        self.require_phase(BattlePhase::Battle).map_err(rejected)?;

        self.phase = BattlePhase::ResolvingRound;
        self.selected = None;
        self.resolve_round();

        if self.phase == BattlePhase::ResolvingRound {
            self.phase = BattlePhase::Battle;
            if self.settle_outcome().is_none() {
                self.active_side = self.active_side.opponent();
                if self.active_side == Side::One {
                    self.round += 1;
                }
                self.begin_round();
            }
        }

        self.commit();
        Ok(())
    }

    fn resolve_round(&mut self) {
        let side = self.active_side;
        let bounds = self.config.bounds();

        'resolve: for archetype in RESOLUTION_ORDER {
            let queue: Vec<usize> = self
                .units
                .iter()
                .enumerate()
                .filter(|(_, u)| u.side == side && u.archetype == archetype)
                .map(|(i, _)| i)
                .collect();

            for index in queue {
                let unit = &self.units[index];
                if !unit.is_alive() || unit.has_acted {
                    continue;
                }

                let context = DecisionContext::new(&self.units, index, bounds);
                let intent = self.ai.decide(&context);
                tracing::debug!("{} decides {:?}", self.units[index].tag(), intent);

                self.execute_intent(index, intent);
                self.units[index].has_acted = true;

                if self.phase == BattlePhase::GameOver {
                    break 'resolve;
                }
            }
        }
    }

    fn execute_intent(&mut self, index: usize, intent: UnitIntent) {
        match intent {
            UnitIntent::Hold => {}
            UnitIntent::Move { to, .. } => self.move_unit(index, to),
            UnitIntent::Attack { target } => self.attack(index, Some(target), false),
            UnitIntent::Charge { to, strike } => {
                self.move_unit(index, to);
                if strike {
                    self.attack(index, None, true);
                }
            }
        }
    }

    fn move_unit(&mut self, index: usize, to: GridPos) {
        let unit = &mut self.units[index];
        let from = unit.position;
        if from == to {
            return;
        }

        unit.position = to;
        unit.has_moved = true;
        if reached_rally(unit) {
            unit.clear_rally();
        }

        let (unit_id, tag) = (unit.id, unit.tag());
        self.log_event(
            BattleEventType::UnitMoved { unit_id, from, to },
            format!("{} moves {} -> {}", tag, from, to),
        );
    }

    fn attack(&mut self, index: usize, target: Option<UnitId>, charging: bool) {
        let strikes = match resolve_attack(&mut self.units, index, target, charging) {
            Ok(strikes) => strikes,
            Err(err) => {
                tracing::warn!("{} attack failed: {}", self.units[index].tag(), err);
                return;
            }
        };

        let (attacker, attacker_tag) = (self.units[index].id, self.units[index].tag());
        let mut any_killed = false;
        for strike in &strikes {
            let target_tag = self.unit(strike.target).map(Unit::tag).unwrap_or_default();
            let verb = if charging { "charges" } else { "hits" };
            self.log_event(
                BattleEventType::UnitAttacked {
                    attacker,
                    target: strike.target,
                    damage: strike.damage,
                },
                format!("{} {} {}: {} dmg", attacker_tag, verb, target_tag, strike.damage),
            );
            if strike.killed() {
                any_killed = true;
                self.log_event(
                    BattleEventType::UnitKilled {
                        unit_id: strike.target,
                    },
                    format!("{} is killed", target_tag),
                );
            }
        }

        if any_killed {
            self.settle_outcome();
        }
    }

    /// Check for a winner; ends the battle immediately if there is one
    ///
    /// Subscribers are notified when this call is what ends the battle.
    pub fn check_win(&mut self) -> Option<BattleOutcome> {
        let was_over = self.is_finished();
        let outcome = self.settle_outcome();
        if outcome.is_some() && !was_over {
            self.commit();
        }
        outcome
    }

    /// Win check without notifying; the enclosing command commits
    fn settle_outcome(&mut self) -> Option<BattleOutcome> {
        match self.phase {
            BattlePhase::GameOver => return Some(self.outcome),
            BattlePhase::Battle | BattlePhase::ResolvingRound => {}
            _ => return None,
        }

        let outcome = check_battle_end(&self.units)?;
        self.end_battle(outcome);
        Some(outcome)
    }

    fn end_battle(&mut self, outcome: BattleOutcome) {
        self.phase = BattlePhase::GameOver;
        self.outcome = outcome;
        self.selected = None;
        tracing::info!("Battle ended on round {}: {:?}", self.round, outcome);
        let description = match outcome {
            BattleOutcome::Victory(side) => format!("{} wins!", side),
            _ => "Draw!".to_string(),
        };
        self.log_event(BattleEventType::BattleEnded { outcome }, description);
    }

    /// Back to an empty SETUP from any phase
    pub fn reset(&mut self) {
        self.phase = BattlePhase::Setup;
        self.outcome = BattleOutcome::Undecided;
        self.builder = ArmyBuilder::new(self.config.budget);
        self.deployment = None;
        self.units.clear();
        self.active_side = Side::One;
        self.round = 1;
        self.selected = None;
        self.log.clear();
        self.next_unit_id = 0;
        self.ai.reseed(self.config.seed);
        tracing::info!("Battle reset");
        self.commit();
    }

    // ===== PRESENTATION =====

    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            phase: self.phase,
            active_side: self.active_side,
            round: self.round,
            outcome: self.outcome,
            winner: self.outcome.winner_code(),
            units: self.units.clone(),
            compositions: Side::BOTH.map(|s| self.composition(s).clone()),
            armies: Side::BOTH.map(|s| self.army_status(s)),
            deploying_side: self.deploying_side(),
            deploy_remaining: self.deploy_remaining(),
            selected: self.selected,
            log: self.log.recent(self.config.log_capacity),
            revision: self.revision(),
        }
    }
}

/// Read-only view for rendering and tooling
#[derive(Debug, Clone, Serialize)]
pub struct BattleSnapshot {
    pub phase: BattlePhase,
    pub active_side: Side,
    pub round: Round,
    pub outcome: BattleOutcome,
    pub winner: Option<u8>,
    pub units: Vec<Unit>,
    pub compositions: [Composition; 2],
    pub armies: [ArmyStatus; 2],
    pub deploying_side: Option<Side>,
    pub deploy_remaining: usize,
    pub selected: Option<UnitId>,
    pub log: Vec<String>,
    pub revision: u64,
}
