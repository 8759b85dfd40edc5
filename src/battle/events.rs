//! Battle event log and change notifications
//!
//! The log is a bounded, most-recent-first record for the presentation
//! layer. Notifications tell subscribers that a command committed a change.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};

use serde::{Deserialize, Serialize};

use crate::battle::execution::{BattleOutcome, BattlePhase};
use crate::core::types::{GridPos, Round, Side, UnitId};

/// Log entry for battle events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleEvent {
    pub round: Round,
    pub event_type: BattleEventType,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEventType {
    CompositionChanged { side: Side },
    ArmyLocked { side: Side },
    PhaseChanged { phase: BattlePhase },
    UnitPlaced { unit_id: UnitId, position: GridPos },
    RoundStarted { side: Side },
    RallyOrdered { planner: UnitId, target: GridPos, allies: usize },
    UnitMoved { unit_id: UnitId, from: GridPos, to: GridPos },
    UnitAttacked { attacker: UnitId, target: UnitId, damage: u32 },
    UnitKilled { unit_id: UnitId },
    BattleEnded { outcome: BattleOutcome },
}

/// Bounded log, newest entry first
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<BattleEvent>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, round: Round, event_type: BattleEventType, description: String) {
        self.entries.push_front(BattleEvent {
            round,
            event_type,
            description,
        });
        self.entries.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &BattleEvent> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&BattleEvent> {
        self.entries.front()
    }

    /// Descriptions of the `n` newest entries
    pub fn recent(&self, n: usize) -> Vec<String> {
        self.entries
            .iter()
            .take(n)
            .map(|e| e.description.clone())
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Sent to subscribers after every committed command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChanged {
    pub revision: u64,
    pub phase: BattlePhase,
}

/// Fan-out of change notifications
#[derive(Debug, Default)]
pub struct Notifier {
    subscribers: Vec<Sender<StateChanged>>,
    revision: u64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<StateChanged> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Number of committed changes so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Bump the revision and tell everyone still listening
    pub fn publish(&mut self, phase: BattlePhase) {
        self.revision += 1;
        let change = StateChanged {
            revision: self.revision,
            phase,
        };
        self.subscribers.retain(|tx| tx.send(change).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_newest_first_and_bounded() {
        let mut log = EventLog::new(3);
        for i in 0..5 {
            log.push(
                1,
                BattleEventType::RoundStarted { side: Side::One },
                format!("entry {i}"),
            );
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.recent(2), vec!["entry 4", "entry 3"]);
        assert_eq!(log.latest().unwrap().description, "entry 4");
    }

    #[test]
    fn test_notifier_reaches_subscribers() {
        let mut notifier = Notifier::new();
        let rx = notifier.subscribe();
        notifier.publish(BattlePhase::Setup);
        notifier.publish(BattlePhase::Deploy);

        let changes: Vec<StateChanged> = rx.try_iter().collect();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[1].revision, 2);
        assert_eq!(changes[1].phase, BattlePhase::Deploy);
    }

    #[test]
    fn test_dropped_subscriber_pruned() {
        let mut notifier = Notifier::new();
        let rx = notifier.subscribe();
        let _kept = notifier.subscribe();
        drop(rx);
        notifier.publish(BattlePhase::Setup);
        assert_eq!(notifier.subscriber_count(), 1);
    }
}
