#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure input-translation system that turns player intents into world commands.

use tracing::debug;
use waypoint_defence_core::{Command, Event, PlayMode, Point, TowerId, TowerKind};

/// Discrete player intent supplied by an adapter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Input {
    /// Arms placement of the provided tower template.
    SelectTowerKind(TowerKind),
    /// Places the armed tower template on the tile containing the point.
    PlaceAt(Point),
    /// Selects the tower standing on the tile containing the point.
    SelectTowerAt(Point),
    /// Clears both the armed template and the selected tower.
    Deselect,
    /// Upgrades the selected tower.
    UpgradeSelected,
    /// Sells the selected tower.
    SellSelected,
    /// Pauses a running match or resumes a paused one.
    TogglePause,
    /// Restarts the match from its initial state.
    Restart,
}

/// Input system that tracks selection state and emits player commands.
#[derive(Debug, Clone)]
pub struct Builder {
    play_mode: PlayMode,
    armed: Option<TowerKind>,
    selected: Option<TowerId>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Creates a new builder system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            play_mode: PlayMode::Running,
            armed: None,
            selected: None,
        }
    }

    /// Tower template currently armed for placement.
    #[must_use]
    pub const fn armed(&self) -> Option<TowerKind> {
        self.armed
    }

    /// Tower currently selected for upgrade or sale.
    #[must_use]
    pub const fn selected(&self) -> Option<TowerId> {
        self.selected
    }

    /// Play mode last reported by the world.
    #[must_use]
    pub const fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    /// Consumes world events and player inputs to emit commands.
    ///
    /// The `tower_at` closure should mirror the semantics of the world's
    /// `query::tower_at` helper so the system can resolve clicked towers.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        inputs: &[Input],
        mut tower_at: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(Point) -> Option<TowerId>,
    {
        for event in events {
            self.observe(event);
        }

        for input in inputs {
            match *input {
                Input::SelectTowerKind(kind) => {
                    self.armed = Some(kind);
                    self.selected = None;
                }
                Input::PlaceAt(at) => match self.armed {
                    Some(kind) => out.push(Command::PlaceTower { kind, at }),
                    None => debug!(target: "td.input", "placement ignored without armed tower"),
                },
                Input::SelectTowerAt(at) => {
                    self.selected = tower_at(at);
                    if self.selected.is_some() {
                        self.armed = None;
                    }
                }
                Input::Deselect => {
                    self.armed = None;
                    self.selected = None;
                }
                Input::UpgradeSelected => {
                    if let Some(tower) = self.selected {
                        out.push(Command::UpgradeTower { tower });
                    }
                }
                Input::SellSelected => {
                    if let Some(tower) = self.selected {
                        out.push(Command::SellTower { tower });
                    }
                }
                Input::TogglePause => out.push(Command::SetPlayMode {
                    mode: self.play_mode.toggled(),
                }),
                Input::Restart => out.push(Command::ResetMatch),
            }
        }
    }

    fn observe(&mut self, event: &Event) {
        match event {
            Event::PlayModeChanged { mode } => self.play_mode = *mode,
            Event::TowerPlaced { kind, .. } => {
                if self.armed == Some(*kind) {
                    self.armed = None;
                }
            }
            Event::TowerSold { tower, .. } => {
                if self.selected == Some(*tower) {
                    self.selected = None;
                }
            }
            Event::MatchReset => *self = Self::new(),
            _ => {}
        }
    }
}
