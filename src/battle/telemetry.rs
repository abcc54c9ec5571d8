//! Per-(battle, player) telemetry aggregation.
//!
//! Counters are monotone: a recorded turn only ever adds. Replays of the
//! same (battle, turn, player) key are ignored so retried writes cannot
//! double-count.

use schema::{TelemetryRecord, TurnRecord};
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct TelemetryAggregator {
    applied: HashSet<(String, u32, String)>,
}

impl TelemetryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one turn into the player's telemetry. Returns false (and leaves
    /// the record untouched) when this turn was already recorded.
    pub fn record_turn(&mut self, telemetry: &mut TelemetryRecord, turn: &TurnRecord) -> bool {
        let key = (
            turn.battle_id.clone(),
            turn.turn_number,
            turn.player_id.clone(),
        );
        if !self.applied.insert(key) {
            return false;
        }

        telemetry.total_turns += 1;
        telemetry.total_damage_dealt += turn.damage_dealt as u64;
        telemetry.total_healing_done += turn.healing_done as u64;
        telemetry.total_card_switches += turn.card_switches;
        if turn.focus_completed {
            telemetry.total_focus_completed += 1;
        }
        if turn.special_triggered {
            telemetry.total_special_triggered += 1;
        }
        for usage in &turn.move_usage {
            *telemetry
                .move_frequency
                .entry(usage.move_id.clone())
                .or_insert(0) += usage.count;
        }

        // Running mean over the turns this player has recorded.
        let n = telemetry.total_turns as f64;
        telemetry.average_turn_duration_ms +=
            (turn.duration_ms as f64 - telemetry.average_turn_duration_ms) / n;

        true
    }

    /// Drop the replay keys for a battle. Called once the battle reaches a
    /// terminal state; nothing records turns for it afterwards.
    pub fn forget_battle(&mut self, battle_id: &str) {
        self.applied.retain(|(recorded, _, _)| recorded != battle_id);
    }

    #[cfg(test)]
    pub(crate) fn replay_key_count(&self) -> usize {
        self.applied.len()
    }
}
