#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Match driver that wires the world to the pure systems.
//!
//! A [`Session`] owns the world, the wave scheduler and the input builder and
//! advances them in a fixed order each frame: player inputs first, then the
//! world tick, then the scheduler exchange until no further commands remain.

use std::time::Duration;

use tracing::{debug, info};
use waypoint_defence_core::{Command, ConfigError, Event, MatchConfig};
use waypoint_defence_system_builder::{Builder, Input};
use waypoint_defence_system_spawning::{self as spawning, WaveScheduler};
use waypoint_defence_world::{self as world, query, World};

/// Running match together with the systems that drive it.
#[derive(Debug)]
pub struct Session {
    world: World,
    scheduler: WaveScheduler,
    builder: Builder,
    backlog: Vec<Event>,
    frame: Vec<Event>,
    frames: u64,
}

impl Session {
    /// Validates `config` and creates a session ready for its first frame.
    pub fn new(config: MatchConfig) -> Result<Self, ConfigError> {
        let scheduler = WaveScheduler::new(spawning::Config::from_match(&config));
        let world = World::new(config)?;
        info!(
            target: "td.session",
            waves = scheduler.wave_count(),
            "session ready"
        );

        Ok(Self {
            world,
            scheduler,
            builder: Builder::new(),
            backlog: Vec::new(),
            frame: Vec::new(),
            frames: 0,
        })
    }

    /// Banner shown when the experience starts.
    #[must_use]
    pub fn welcome_banner(&self) -> &'static str {
        query::welcome_banner(&self.world)
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Read-only access to the wave scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &WaveScheduler {
        &self.scheduler
    }

    /// Read-only access to the input builder.
    #[must_use]
    pub fn builder(&self) -> &Builder {
        &self.builder
    }

    /// Number of frames advanced since the session was created.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Applies `inputs`, advances the simulation by `dt` and returns every
    /// event produced during the frame in emission order.
    pub fn tick(&mut self, dt: Duration, inputs: &[Input]) -> &[Event] {
        self.frame.clear();
        self.frames += 1;

        for input in inputs {
            let commands = self.translate(std::slice::from_ref(input));
            for command in commands {
                self.execute(command);
            }
        }

        self.execute(Command::Tick { dt });
        self.drain_backlog();
        &self.frame
    }

    /// Restores every component to its initial match state.
    pub fn reset_match(&mut self) -> &[Event] {
        self.frame.clear();
        self.execute(Command::ResetMatch);
        self.drain_backlog();
        &self.frame
    }

    /// Lets the builder observe every pending event, executing any commands
    /// it emits in response until it has nothing left to say.
    fn drain_backlog(&mut self) {
        while !self.backlog.is_empty() {
            for command in self.translate(&[]) {
                debug!(target: "td.session", ?command, "builder command");
                self.execute(command);
            }
        }
    }

    fn translate(&mut self, inputs: &[Input]) -> Vec<Command> {
        let backlog = std::mem::take(&mut self.backlog);
        let world = &self.world;
        let mut commands = Vec::new();
        self.builder.handle(
            &backlog,
            inputs,
            |point| query::tower_at(world, point),
            &mut commands,
        );
        commands
    }

    fn execute(&mut self, command: Command) {
        let mut pending = Vec::new();
        world::apply(&mut self.world, command, &mut pending);

        while !pending.is_empty() {
            let mut commands = Vec::new();
            let mut published = Vec::new();
            self.scheduler.handle(&pending, &mut commands, &mut published);
            self.record(pending);
            self.record(published);

            pending = Vec::new();
            for command in commands {
                debug!(target: "td.session", ?command, "scheduler command");
                world::apply(&mut self.world, command, &mut pending);
            }
        }
    }

    fn record(&mut self, events: Vec<Event>) {
        self.backlog.extend(events.iter().cloned());
        self.frame.extend(events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_defence_core::{Point, TowerKind};

    #[test]
    fn frame_leaves_no_unobserved_events() {
        let mut session = Session::new(MatchConfig::default()).expect("default config is valid");
        let placed = session
            .tick(
                Duration::from_millis(100),
                &[
                    Input::SelectTowerKind(TowerKind::new(0)),
                    Input::PlaceAt(Point::new(9.5, 4.5)),
                ],
            )
            .iter()
            .any(|event| matches!(event, Event::TowerPlaced { .. }));

        assert!(placed);
        assert!(session.backlog.is_empty());
        assert_eq!(session.builder().armed(), None);

        let _ = session.reset_match();
        assert!(session.backlog.is_empty());
    }
}
