//! Stable session hashing for deterministic verification.
//! This module exists to keep hashing concerns separate from simulation control code.
//! It does not own save encoding or integrity checks.

use std::hash::Hasher;

use xxhash_rust::xxh3::Xxh3;

use super::*;

impl Game {
    /// Hash of the game state plus the session bookkeeping around it.
    pub fn snapshot_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write_u64(self.seed);
        hasher.write_u64(self.ids.peek());
        match self.scheduler.phase() {
            BattlePhase::Idle => hasher.write_u8(0),
            BattlePhase::Running { started_at } => {
                hasher.write_u8(1);
                hasher.write_u64(started_at);
            }
            BattlePhase::Ended { winner } => {
                hasher.write_u8(2);
                hasher.write_u8(winner as u8);
            }
        }
        hasher.write_u64(self.state.snapshot_hash());
        hasher.finish()
    }
}
