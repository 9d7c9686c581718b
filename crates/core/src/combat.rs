//! Cooldown-driven battle resolution between the two rosters.
//! This module exists to advance per-item timers and apply their effects one `tick` at a time.
//! It does not own round-end rewards, enemy generation, or the clock that drives it.

use crate::error::GameError;
use crate::grid::RosterGrid;
use crate::state::{HealthPools, Items};
use crate::types::{ItemId, Millis, Side, Winner};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CombatRules {
    /// Ends the battle once this much time has passed since `start`.
    pub time_limit_ms: Option<Millis>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BattlePhase {
    Idle,
    Running { started_at: Millis },
    Ended { winner: Winner },
}

/// The slice of game state a battle reads and writes.
pub struct Combatants<'a> {
    pub items: &'a mut Items,
    pub player_roster: &'a RosterGrid,
    pub enemy_roster: &'a RosterGrid,
    pub health: &'a mut HealthPools,
}

impl Combatants<'_> {
    fn roster(&self, side: Side) -> &RosterGrid {
        match side {
            Side::Player => self.player_roster,
            Side::Enemy => self.enemy_roster,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Activation {
    pub side: Side,
    pub item: ItemId,
    pub damage: u32,
    pub heal: u32,
    pub at: Millis,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub activations: Vec<Activation>,
    /// Set on the tick that ended the battle.
    pub outcome: Option<Winner>,
}

#[derive(Clone, Debug)]
pub struct CombatScheduler {
    rules: CombatRules,
    phase: BattlePhase,
}

impl CombatScheduler {
    pub fn new(rules: CombatRules) -> Self {
        Self { rules, phase: BattlePhase::Idle }
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, BattlePhase::Running { .. })
    }

    pub fn start(&mut self, combatants: &mut Combatants<'_>, now: Millis) -> Result<(), GameError> {
        if self.phase != BattlePhase::Idle {
            return Err(GameError::AlreadyRunning);
        }
        for side in Side::BOTH {
            for key in combatants.roster(side).unique_instances() {
                if let Some(item) = combatants.items.get_mut(key) {
                    item.next_activation = Some(now.saturating_add(item.cooldown_ms));
                }
            }
        }
        self.phase = BattlePhase::Running { started_at: now };
        tracing::info!(now, "battle started");
        Ok(())
    }

    /// A scheduler for a battle that was running when the game was saved.
    /// Timers already stored on the items are kept as they are.
    pub fn resumed(rules: CombatRules, started_at: Millis) -> Self {
        Self { rules, phase: BattlePhase::Running { started_at } }
    }

    pub fn tick(
        &mut self,
        combatants: &mut Combatants<'_>,
        now: Millis,
    ) -> Result<TickReport, GameError> {
        let BattlePhase::Running { started_at } = self.phase else {
            return Err(GameError::NotRunning);
        };

        let mut report = TickReport::default();
        for side in Side::BOTH {
            for key in combatants.roster(side).unique_instances() {
                let Some(item) = combatants.items.get_mut(key) else {
                    continue;
                };
                let Some(due) = item.next_activation else {
                    item.next_activation = Some(now.saturating_add(item.cooldown_ms));
                    continue;
                };
                if now < due {
                    continue;
                }
                // Rescheduled from `now`, not from `due`; late ticks drift.
                item.next_activation = Some(now.saturating_add(item.cooldown_ms));
                let (damage, heal) = (item.damage, item.heal);
                let activation = Activation { side, item: item.id, damage, heal, at: now };
                combatants.health.damage(side.opponent(), activation.damage);
                combatants.health.heal(side, activation.heal);
                tracing::debug!(
                    ?side,
                    item = %activation.item,
                    damage = activation.damage,
                    heal = activation.heal,
                    now,
                    "item activated"
                );
                report.activations.push(activation);
            }
        }

        let timed_out = self
            .rules
            .time_limit_ms
            .is_some_and(|limit| now.saturating_sub(started_at) >= limit);
        if combatants.health.anyone_down() || timed_out {
            let winner = combatants.health.leader();
            self.phase = BattlePhase::Ended { winner };
            report.outcome = Some(winner);
            tracing::info!(
                ?winner,
                player_hp = combatants.health.player,
                enemy_hp = combatants.health.enemy,
                timed_out,
                "battle ended"
            );
        }
        Ok(report)
    }

    /// Stops a running battle and discards every pending roster timer.
    pub fn abandon(&mut self, combatants: &mut Combatants<'_>) -> Result<(), GameError> {
        if !self.is_running() {
            return Err(GameError::NotRunning);
        }
        clear_timers(combatants);
        self.phase = BattlePhase::Idle;
        tracing::info!("battle abandoned");
        Ok(())
    }

    /// Returns to Idle after the caller has handled an ended battle.
    pub fn reset(&mut self) -> Option<Winner> {
        match self.phase {
            BattlePhase::Ended { winner } => {
                self.phase = BattlePhase::Idle;
                Some(winner)
            }
            _ => None,
        }
    }
}

pub(crate) fn clear_timers(combatants: &mut Combatants<'_>) {
    for side in Side::BOTH {
        for key in combatants.roster(side).unique_instances() {
            if let Some(item) = combatants.items.get_mut(key) {
                item.next_activation = None;
            }
        }
    }
}
