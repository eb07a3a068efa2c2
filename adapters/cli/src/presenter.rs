//! Console presentation sink for simulation events.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};
use waypoint_defence_core::Event;

/// Running totals gathered from the event stream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct MatchStats {
    pub(crate) enemies_spawned: u32,
    pub(crate) enemies_killed: u32,
    pub(crate) enemies_leaked: u32,
    pub(crate) towers_placed: u32,
    pub(crate) placements_rejected: u32,
    pub(crate) towers_upgraded: u32,
    pub(crate) towers_sold: u32,
    pub(crate) shots_fired: u32,
    pub(crate) waves_cleared: u32,
}

/// Logs presentation-facing events and tallies match statistics.
#[derive(Debug, Default)]
pub(crate) struct ConsolePresenter {
    elapsed: Duration,
    announced_countdown: Option<u64>,
    stats: MatchStats,
}

impl ConsolePresenter {
    pub(crate) fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub(crate) fn stats(&self) -> &MatchStats {
        &self.stats
    }

    pub(crate) fn observe(&mut self, events: &[Event]) {
        for event in events {
            self.present(event);
        }
    }

    fn present(&mut self, event: &Event) {
        match event {
            Event::TimeAdvanced { dt } => self.elapsed = self.elapsed.saturating_add(*dt),
            Event::PlayModeChanged { mode } => info!(target: "td.hud", ?mode, "play mode"),
            Event::MatchReset => {
                *self = Self::default();
                info!(target: "td.hud", "match restarted");
            }
            Event::BalanceChanged { balance, low_funds } => {
                info!(target: "td.hud", balance, low_funds, "balance");
            }
            Event::EnemySpawned { .. } => self.stats.enemies_spawned += 1,
            Event::EnemyDied { .. } => self.stats.enemies_killed += 1,
            Event::EnemyReachedGoal { .. } => self.stats.enemies_leaked += 1,
            Event::GoalReached { count, max_allowed } => {
                warn!(target: "td.hud", count, max_allowed, "enemy reached the goal");
            }
            Event::MatchEnded { outcome } => info!(target: "td.hud", ?outcome, "match over"),
            Event::TowerPlaced { tower, tile, .. } => {
                self.stats.towers_placed += 1;
                info!(
                    target: "td.hud",
                    tower = tower.get(),
                    column = tile.column(),
                    row = tile.row(),
                    "tower placed"
                );
            }
            Event::TowerPlacementRejected { reason, .. } => {
                self.stats.placements_rejected += 1;
                warn!(target: "td.hud", ?reason, "cannot place tower");
            }
            Event::TowerStateChanged {
                tower,
                level,
                upgrade_cost,
                can_upgrade,
            } => {
                if *level > 1 {
                    self.stats.towers_upgraded += 1;
                }
                info!(
                    target: "td.hud",
                    tower = tower.get(),
                    level,
                    upgrade_cost,
                    can_upgrade,
                    "tower state"
                );
            }
            Event::TowerUpgradeRejected { tower, reason } => {
                warn!(target: "td.hud", tower = tower.get(), ?reason, "cannot upgrade tower");
            }
            Event::TowerSold { refund, .. } => {
                self.stats.towers_sold += 1;
                info!(target: "td.hud", refund, "tower sold");
            }
            Event::ProjectileFired { .. } => self.stats.shots_fired += 1,
            Event::WaveCountdown { remaining } => {
                let seconds = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
                if self.announced_countdown != Some(seconds) {
                    self.announced_countdown = Some(seconds);
                    info!(target: "td.hud", seconds, "next wave in");
                }
            }
            Event::WaveStarted { wave, enemy_count } => {
                self.announced_countdown = None;
                info!(target: "td.hud", wave = wave + 1, enemy_count, "wave incoming");
            }
            Event::WaveEnded { wave } => {
                self.stats.waves_cleared += 1;
                info!(target: "td.hud", wave = wave + 1, "wave cleared");
            }
            Event::ProjectileHit { .. }
            | Event::ProjectileExpired { .. }
            | Event::TowerSaleRejected { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_defence_core::{EnemyId, TowerId};

    #[test]
    fn tallies_match_statistics() {
        let mut presenter = ConsolePresenter::default();
        presenter.observe(&[
            Event::TimeAdvanced {
                dt: Duration::from_millis(250),
            },
            Event::EnemyDied {
                enemy: EnemyId::new(0),
                reward: 5,
            },
            Event::EnemyReachedGoal {
                enemy: EnemyId::new(1),
            },
            Event::TowerStateChanged {
                tower: TowerId::new(0),
                level: 2,
                upgrade_cost: 100,
                can_upgrade: true,
            },
            Event::WaveEnded { wave: 0 },
            Event::TimeAdvanced {
                dt: Duration::from_millis(250),
            },
        ]);

        assert_eq!(presenter.elapsed(), Duration::from_millis(500));
        assert_eq!(
            presenter.stats(),
            &MatchStats {
                enemies_killed: 1,
                enemies_leaked: 1,
                towers_upgraded: 1,
                waves_cleared: 1,
                ..MatchStats::default()
            }
        );
    }

    #[test]
    fn reset_clears_statistics() {
        let mut presenter = ConsolePresenter::default();
        presenter.observe(&[
            Event::TimeAdvanced {
                dt: Duration::from_secs(3),
            },
            Event::WaveEnded { wave: 0 },
            Event::MatchReset,
        ]);

        assert_eq!(presenter.elapsed(), Duration::ZERO);
        assert_eq!(presenter.stats(), &MatchStats::default());
    }
}
