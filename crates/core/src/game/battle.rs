//! Battle session control and round-end housekeeping.
//! This module exists to connect the combat scheduler to rewards, loot, and enemy regeneration.
//! It does not own activation timing, which lives in `combat`.

use super::*;
use crate::combat::{TickReport, clear_timers};
use crate::state::BattleMarker;

/// Where victory loot goes, in order of preference.
const LOOT_TARGETS: [Owner; 3] = [Owner::Player, Owner::PlayerStash, Owner::SharedStash];

impl Game {
    pub fn start_battle(&mut self, now: Millis) -> Result<(), GameError> {
        self.scheduler.start(&mut self.state.combatants(), now)?;
        self.state.battle = Some(BattleMarker { started_at: now });
        self.log.push(LogEvent::BattleStarted { at: now });
        Ok(())
    }

    /// Advances the running battle to `now`. When the battle ends on this
    /// tick, the round is settled before returning.
    pub fn tick(&mut self, now: Millis) -> Result<TickReport, GameError> {
        let report = self.scheduler.tick(&mut self.state.combatants(), now)?;
        self.log.extend(report.activations.iter().map(|activation| LogEvent::ItemActivated {
            side: activation.side,
            item: activation.item,
            damage: activation.damage,
            heal: activation.heal,
            at: activation.at,
        }));
        if let Some(winner) = report.outcome {
            self.finish_round(winner);
        }
        Ok(report)
    }

    /// Stops the battle without a winner. Health and items stay as they are.
    pub fn abandon_battle(&mut self) -> Result<(), GameError> {
        self.scheduler.abandon(&mut self.state.combatants())?;
        self.state.battle = None;
        self.log.push(LogEvent::BattleAbandoned);
        Ok(())
    }

    fn finish_round(&mut self, winner: Winner) {
        self.scheduler.reset();
        self.state.battle = None;
        clear_timers(&mut self.state.combatants());
        self.log.push(LogEvent::BattleEnded { winner });

        if winner == Winner::Player {
            let margin = self.state.health.player.saturating_sub(self.state.health.enemy);
            let reward = margin.max(self.config.min_victory_reward);
            self.state.gold = self.state.gold.saturating_add(reward);
            self.log.push(LogEvent::RewardGranted { gold: reward });
            self.drop_loot();
        }

        self.state.health.restore(Side::Player);
        self.fill_shop();
        self.spawn_enemy();
        tracing::info!(?winner, gold = self.state.gold, "round settled");
    }

    fn drop_loot(&mut self) {
        let Some(index) = self.random_template() else {
            return;
        };
        match self.spawn_into(index, &LOOT_TARGETS) {
            Some((key, into)) => {
                let item = self.state.items[key].id;
                self.log.push(LogEvent::LootDropped { item, into });
            }
            None => {
                let template_key = self.content.templates()[index].key.clone();
                tracing::info!(template = %template_key, "no room for loot, discarded");
                self.log.push(LogEvent::LootDiscarded { template_key });
            }
        }
    }

    /// Replaces the enemy with a new roster and stash at full health.
    pub(super) fn spawn_enemy(&mut self) {
        self.state.health.restore(Side::Enemy);
        self.state.discard_grid(Owner::Enemy);
        self.state.discard_grid(Owner::EnemyStash);

        let roster_items = self.spawn_random(Owner::Enemy, self.config.enemy_items);
        let span = (self.config.enemy_stash_max - self.config.enemy_stash_min).saturating_add(1);
        let stash_count = self.config.enemy_stash_min + self.pick(span);
        let stash_items = self.spawn_random(Owner::EnemyStash, stash_count);

        self.log.push(LogEvent::EnemyGenerated { roster_items, stash_items });
        tracing::info!(roster_items, stash_items, "enemy generated");
    }

    /// First-fits `count` random items into `owner`. Returns how many fit.
    fn spawn_random(&mut self, owner: Owner, count: usize) -> usize {
        let mut placed = 0;
        for _ in 0..count {
            if let Some(index) = self.random_template()
                && self.spawn_into(index, &[owner]).is_some()
            {
                placed += 1;
            }
        }
        placed
    }
}
