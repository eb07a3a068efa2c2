//! End-of-run summary rendered as text or JSON.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use serde::Serialize;
use waypoint_defence_core::MatchOutcome;
use waypoint_defence_system_bootstrap::Session;
use waypoint_defence_world::query;

use crate::presenter::{ConsolePresenter, MatchStats};

/// Snapshot of a finished or interrupted run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct MatchReport {
    pub(crate) outcome: Option<MatchOutcome>,
    pub(crate) elapsed_secs: f32,
    pub(crate) frames: u64,
    pub(crate) balance: u32,
    pub(crate) goal_reach_count: u32,
    pub(crate) max_enemies_allowed: u32,
    pub(crate) waves_total: u32,
    #[serde(flatten)]
    pub(crate) stats: MatchStats,
}

impl MatchReport {
    pub(crate) fn collect(session: &Session, presenter: &ConsolePresenter) -> Self {
        let world = session.world();
        let tracker = query::outcome_tracker(world);
        Self {
            outcome: query::outcome(world),
            elapsed_secs: presenter.elapsed().as_secs_f32(),
            frames: session.frames(),
            balance: query::balance(world),
            goal_reach_count: tracker.goal_reach_count(),
            max_enemies_allowed: tracker.max_enemies_allowed(),
            waves_total: session.scheduler().wave_count(),
            stats: presenter.stats().clone(),
        }
    }

    pub(crate) fn to_text(&self) -> String {
        let outcome = match self.outcome {
            Some(MatchOutcome::Victory) => "victory",
            Some(MatchOutcome::Defeat) => "defeat",
            None => "unresolved",
        };
        let stats = &self.stats;

        let mut text = String::new();
        let _ = writeln!(text, "Outcome: {outcome}");
        let _ = writeln!(
            text,
            "Elapsed: {:.1}s over {} frames",
            self.elapsed_secs, self.frames
        );
        let _ = writeln!(text, "Balance: {}", self.balance);
        let _ = writeln!(
            text,
            "Waves cleared: {}/{}",
            stats.waves_cleared, self.waves_total
        );
        let _ = writeln!(
            text,
            "Enemies: {} spawned, {} killed, {} leaked ({}/{} allowed)",
            stats.enemies_spawned,
            stats.enemies_killed,
            stats.enemies_leaked,
            self.goal_reach_count,
            self.max_enemies_allowed
        );
        let _ = writeln!(
            text,
            "Towers: {} placed, {} rejected, {} upgrades, {} sold",
            stats.towers_placed, stats.placements_rejected, stats.towers_upgraded, stats.towers_sold
        );
        let _ = write!(text, "Shots fired: {}", stats.shots_fired);
        text
    }

    pub(crate) fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize match report")
    }
}
