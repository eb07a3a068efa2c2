#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduler that sequences waves and paces enemy spawns.
//!
//! The scheduler never touches the world directly. It reacts to the events
//! broadcast by the world, emits [`Command::SpawnEnemy`] and
//! [`Command::DeclareVictory`] requests, and publishes wave lifecycle events
//! for presentation layers.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use waypoint_defence_core::{Command, Event, MatchConfig, WaveConfig};

/// Configuration parameters required to construct the wave scheduler.
#[derive(Clone, Debug)]
pub struct Config {
    waves: Vec<WaveConfig>,
    time_between_waves: Duration,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration from explicit wave definitions.
    #[must_use]
    pub fn new(waves: Vec<WaveConfig>, time_between_waves: Duration, rng_seed: u64) -> Self {
        Self {
            waves,
            time_between_waves,
            rng_seed,
        }
    }

    /// Extracts the scheduler settings from a match configuration.
    #[must_use]
    pub fn from_match(config: &MatchConfig) -> Self {
        Self::new(
            config.waves.clone(),
            config.time_between_waves(),
            config.rng_seed,
        )
    }
}

/// Resumable paced spawn sequence for the active wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnTask {
    wave: u32,
    remaining: u32,
    interval: Duration,
    until_next: Duration,
}

impl SpawnTask {
    fn new(wave: u32, count: u32, interval: Duration) -> Self {
        Self {
            wave,
            remaining: count,
            interval,
            until_next: Duration::ZERO,
        }
    }

    /// Zero-based index of the wave the task spawns for.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Enemies the task has yet to emit.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Time until the next resumption.
    #[must_use]
    pub const fn until_next(&self) -> Duration {
        self.until_next
    }

    /// Consumes `elapsed` and reports how many spawns fell due.
    fn poll(&mut self, elapsed: Duration) -> u32 {
        let mut budget = elapsed;
        let mut due = 0;
        while self.remaining > 0 {
            if self.until_next > budget {
                self.until_next -= budget;
                break;
            }
            budget -= self.until_next;
            self.remaining -= 1;
            self.until_next = self.interval;
            due += 1;
        }
        due
    }
}

/// Pure system that sequences waves and tracks wave population.
#[derive(Debug)]
pub struct WaveScheduler {
    config: Config,
    rng: ChaCha8Rng,
    wave_index: u32,
    remaining_to_spawn: u32,
    remaining_alive: u32,
    countdown: Duration,
    active: bool,
    match_over: bool,
    spawn_task: Option<SpawnTask>,
}

impl WaveScheduler {
    /// Creates a scheduler waiting for the first wave countdown to elapse.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            countdown: config.time_between_waves,
            wave_index: 0,
            remaining_to_spawn: 0,
            remaining_alive: 0,
            active: false,
            match_over: false,
            spawn_task: None,
            config,
        }
    }

    /// Consumes world events, emitting spawn commands and wave lifecycle events.
    ///
    /// Population notifications are processed before simulated time advances,
    /// so a wave can end in the same batch its last enemy resolves.
    pub fn handle(
        &mut self,
        events: &[Event],
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                Event::EnemyDied { .. } | Event::EnemyReachedGoal { .. } => {
                    self.enemy_resolved(out_commands);
                }
                Event::MatchEnded { outcome } => {
                    if self.spawn_task.take().is_some() {
                        debug!(target: "td.waves", ?outcome, "spawn task cancelled");
                    }
                    self.match_over = true;
                }
                Event::MatchReset => self.reset(),
                _ => {}
            }
        }

        if !elapsed.is_zero() {
            self.advance(elapsed, out_commands, out_events);
        }
    }

    fn advance(
        &mut self,
        elapsed: Duration,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        if self.match_over {
            return;
        }

        let mut budget = elapsed;
        if !self.active {
            self.countdown = self.countdown.saturating_sub(elapsed);
            out_events.push(Event::WaveCountdown {
                remaining: self.countdown,
            });
            if !self.countdown.is_zero() {
                return;
            }
            self.start_wave(out_commands, out_events);
            budget = Duration::ZERO;
        }

        let due = self
            .spawn_task
            .as_mut()
            .map_or(0, |task| task.poll(budget));
        for _ in 0..due {
            self.spawn_one(out_commands);
        }
        if self.spawn_task.map_or(false, |task| task.remaining == 0) {
            self.spawn_task = None;
        }

        if self.is_wave_complete() {
            self.end_wave(out_commands, out_events);
        }
    }

    fn start_wave(&mut self, out_commands: &mut Vec<Command>, out_events: &mut Vec<Event>) {
        let Some(wave) = self.current_wave() else {
            self.declare_victory(out_commands);
            return;
        };

        let enemy_count = wave.enemy_count;
        let interval = wave.spawn_interval();
        self.remaining_to_spawn = enemy_count;
        self.remaining_alive = enemy_count;
        self.active = true;
        self.countdown = self.config.time_between_waves;
        self.spawn_task = Some(SpawnTask::new(self.wave_index, enemy_count, interval));

        info!(target: "td.waves", wave = self.wave_index, enemy_count, "wave started");
        out_events.push(Event::WaveStarted {
            wave: self.wave_index,
            enemy_count,
        });
    }

    fn spawn_one(&mut self, out_commands: &mut Vec<Command>) {
        let Some(kinds) = self
            .config
            .waves
            .get(self.wave_index as usize)
            .map(|wave| &wave.enemy_types)
        else {
            return;
        };
        if kinds.is_empty() {
            return;
        }

        let kind = kinds[self.rng.gen_range(0..kinds.len())];
        self.remaining_to_spawn = self.remaining_to_spawn.saturating_sub(1);
        out_commands.push(Command::SpawnEnemy {
            kind,
            wave: self.wave_index,
        });
    }

    fn end_wave(&mut self, out_commands: &mut Vec<Command>, out_events: &mut Vec<Event>) {
        let wave = self.wave_index;
        self.wave_index += 1;
        self.active = false;
        self.countdown = self.config.time_between_waves;

        info!(target: "td.waves", wave, "wave ended");
        out_events.push(Event::WaveEnded { wave });

        if self.is_campaign_complete() {
            self.declare_victory(out_commands);
        }
    }

    fn enemy_resolved(&mut self, out_commands: &mut Vec<Command>) {
        self.remaining_alive = self.remaining_alive.saturating_sub(1);
        if self.is_campaign_complete() && self.remaining_alive == 0 {
            self.declare_victory(out_commands);
        }
    }

    fn declare_victory(&mut self, out_commands: &mut Vec<Command>) {
        if self.match_over {
            return;
        }
        info!(target: "td.waves", waves = self.wave_count(), "campaign complete");
        out_commands.push(Command::DeclareVictory);
    }

    fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.config.rng_seed);
        self.wave_index = 0;
        self.remaining_to_spawn = 0;
        self.remaining_alive = 0;
        self.countdown = self.config.time_between_waves;
        self.active = false;
        self.match_over = false;
        self.spawn_task = None;
    }

    fn current_wave(&self) -> Option<&WaveConfig> {
        self.config.waves.get(self.wave_index as usize)
    }

    /// Zero-based index of the current or next wave.
    #[must_use]
    pub const fn wave_index(&self) -> u32 {
        self.wave_index
    }

    /// Number of configured waves.
    #[must_use]
    pub fn wave_count(&self) -> u32 {
        u32::try_from(self.config.waves.len()).unwrap_or(u32::MAX)
    }

    /// Enemies of the active wave not yet spawned.
    #[must_use]
    pub const fn remaining_to_spawn(&self) -> u32 {
        self.remaining_to_spawn
    }

    /// Enemies of the active wave not yet dead or at the goal.
    #[must_use]
    pub const fn remaining_alive(&self) -> u32 {
        self.remaining_alive
    }

    /// Time left before the next wave starts.
    #[must_use]
    pub const fn countdown(&self) -> Duration {
        self.countdown
    }

    /// Reports whether a wave is in progress.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Reports whether the scheduler observed the end of the match.
    #[must_use]
    pub const fn is_match_over(&self) -> bool {
        self.match_over
    }

    /// Paced spawn sequence of the active wave, if it is still running.
    #[must_use]
    pub const fn spawn_task(&self) -> Option<&SpawnTask> {
        self.spawn_task.as_ref()
    }

    /// Reports whether the active wave spawned and resolved every enemy.
    #[must_use]
    pub const fn is_wave_complete(&self) -> bool {
        self.active && self.remaining_alive == 0 && self.remaining_to_spawn == 0
    }

    /// Reports whether every configured wave was played.
    #[must_use]
    pub fn is_campaign_complete(&self) -> bool {
        self.wave_index >= self.wave_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_poll_spawns_immediately() {
        let mut task = SpawnTask::new(0, 3, Duration::from_secs(1));
        assert_eq!(task.poll(Duration::ZERO), 1);
        assert_eq!(task.remaining(), 2);
        assert_eq!(task.until_next(), Duration::from_secs(1));
    }

    #[test]
    fn poll_catches_up_on_large_steps() {
        let mut task = SpawnTask::new(0, 5, Duration::from_millis(400));
        assert_eq!(task.poll(Duration::ZERO), 1);
        assert_eq!(task.poll(Duration::from_millis(1_000)), 2);
        assert_eq!(task.until_next(), Duration::from_millis(200));
        assert_eq!(task.poll(Duration::from_secs(10)), 2);
        assert_eq!(task.remaining(), 0);
        assert_eq!(task.poll(Duration::from_secs(10)), 0);
    }
}
