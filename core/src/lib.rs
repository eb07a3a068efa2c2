#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Waypoint Defence simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and presentation layers to react to deterministically. Systems
//! consume event streams, query immutable snapshots, and respond exclusively
//! with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod config;

pub use config::{
    ConfigError, EnemyTemplate, GridConfig, MatchConfig, TowerTemplate, WaveConfig,
    DEFAULT_LOW_FUNDS_THRESHOLD,
};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Waypoint Defence.";

/// Distance below which an enemy counts as having reached a waypoint.
pub const WAYPOINT_EPSILON: f32 = 0.1;

/// Distance below which a projectile counts as having struck its target.
pub const PROJECTILE_HIT_RADIUS: f32 = 0.1;

/// Describes whether the simulation clock is currently allowed to advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayMode {
    /// Ticks advance enemies, towers, projectiles and waves.
    Running,
    /// Ticks are ignored until the match resumes.
    Paused,
}

impl PlayMode {
    /// Returns the opposite play mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Running => Self::Paused,
            Self::Paused => Self::Running,
        }
    }
}

/// Terminal result of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// Every wave was cleared before too many enemies reached the goal.
    Victory,
    /// The number of enemies that reached the goal hit the configured limit.
    Defeat,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the world transition to the provided play mode.
    SetPlayMode {
        /// Mode the world should activate.
        mode: PlayMode,
    },
    /// Requests that a new enemy enters the path at its first waypoint.
    SpawnEnemy {
        /// Template used to construct the enemy.
        kind: EnemyKind,
        /// Zero-based index of the wave that produced the enemy.
        wave: u32,
    },
    /// Reports that the campaign was completed with no enemies remaining.
    DeclareVictory,
    /// Requests placement of a tower on the tile containing `at`.
    PlaceTower {
        /// Template used to construct the tower.
        kind: TowerKind,
        /// World-space point chosen by the player; snapped to its tile centre.
        at: Point,
    },
    /// Requests that an existing tower advances one upgrade level.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Requests that an existing tower is sold and its tile released.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
    /// Restores every component to its initial match state.
    ResetMatch,
}

/// Events broadcast by the world and systems after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the simulation entered a new play mode.
    PlayModeChanged {
        /// Mode that became active after processing commands.
        mode: PlayMode,
    },
    /// Confirms that every component returned to its initial state.
    MatchReset,
    /// Reports the ledger balance after any credit or debit.
    BalanceChanged {
        /// Balance after the change.
        balance: u32,
        /// Indicates whether the balance sits below the low-funds threshold.
        low_funds: bool,
    },
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Identifier allocated to the enemy.
        enemy: EnemyId,
        /// Template the enemy was built from.
        kind: EnemyKind,
        /// Position of the first waypoint.
        position: Point,
    },
    /// Reports that an enemy's health was depleted.
    EnemyDied {
        /// Identifier of the enemy that died.
        enemy: EnemyId,
        /// Currency credited for the kill.
        reward: u32,
    },
    /// Reports that an enemy travelled past the final waypoint.
    EnemyReachedGoal {
        /// Identifier of the enemy that reached the goal.
        enemy: EnemyId,
    },
    /// Reports the running count of enemies that reached the goal.
    GoalReached {
        /// Number of enemies that reached the goal so far.
        count: u32,
        /// Number of goal arrivals that ends the match in defeat.
        max_allowed: u32,
    },
    /// Announces the terminal outcome of the match. Emitted at most once per match.
    MatchEnded {
        /// Result of the match.
        outcome: MatchOutcome,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Template the tower was built from.
        kind: TowerKind,
        /// Tile reserved by the tower.
        tile: TileCoord,
        /// Centre of the reserved tile.
        position: Point,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Template requested for placement.
        kind: TowerKind,
        /// Point provided in the placement request.
        at: Point,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports the presentation-facing state of a tower after any change.
    TowerStateChanged {
        /// Identifier of the tower.
        tower: TowerId,
        /// One-based level suitable for display.
        level: u32,
        /// Currency required for the next upgrade.
        upgrade_cost: u32,
        /// Indicates whether another upgrade is permitted.
        can_upgrade: bool,
    },
    /// Reports that a tower upgrade request was rejected.
    TowerUpgradeRejected {
        /// Identifier of the tower targeted for upgrade.
        tower: TowerId,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Confirms that a tower was sold and its tile released.
    TowerSold {
        /// Identifier of the sold tower.
        tower: TowerId,
        /// Tile released by the sale.
        tile: TileCoord,
        /// Currency credited for the sale.
        refund: u32,
    },
    /// Reports that a tower sale request was rejected.
    TowerSaleRejected {
        /// Identifier of the tower targeted for sale.
        tower: TowerId,
        /// Specific reason the sale failed.
        reason: SaleError,
    },
    /// Confirms that a tower launched a projectile.
    ProjectileFired {
        /// Identifier allocated to the projectile.
        projectile: ProjectileId,
        /// Tower that fired.
        tower: TowerId,
        /// Enemy the projectile homes on.
        target: EnemyId,
    },
    /// Reports that a projectile struck its target.
    ProjectileHit {
        /// Identifier of the projectile.
        projectile: ProjectileId,
        /// Enemy that was struck.
        enemy: EnemyId,
        /// Damage applied to the enemy.
        damage: i32,
    },
    /// Reports that a projectile lost its target before impact.
    ProjectileExpired {
        /// Identifier of the projectile.
        projectile: ProjectileId,
    },
    /// Reports the time left before the next wave starts.
    WaveCountdown {
        /// Remaining countdown.
        remaining: Duration,
    },
    /// Announces that a wave began spawning.
    WaveStarted {
        /// Zero-based index of the wave.
        wave: u32,
        /// Number of enemies the wave will spawn.
        enemy_count: u32,
    },
    /// Announces that every enemy of a wave spawned and resolved.
    WaveEnded {
        /// Zero-based index of the wave.
        wave: u32,
    },
}

/// Unique identifier assigned to an enemy.
///
/// Identifiers are never reused within a match, so a stale identifier simply
/// fails to resolve once the enemy has been released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the projectile identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index into the enemy template table of a [`MatchConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnemyKind(u32);

impl EnemyKind {
    /// Creates a new enemy kind referencing the provided template index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Retrieves the template index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index into the tower template table of a [`MatchConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TowerKind(u32);

impl TowerKind {
    /// Creates a new tower kind referencing the provided template index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Retrieves the template index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location in continuous world space measured in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Location of a single build tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The match already ended.
    MatchOver,
    /// The requested tower kind has no template.
    UnknownKind,
    /// The point lies outside the grid or on a tile crossed by the path.
    Unbuildable,
    /// Another tower already reserves the tile.
    Occupied,
    /// The ledger cannot cover the build cost.
    InsufficientFunds,
}

/// Reasons a tower upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeError {
    /// The match already ended.
    MatchOver,
    /// No tower with the provided identifier exists.
    MissingTower,
    /// The tower already reached its maximum upgrade level.
    MaxLevel,
    /// The ledger cannot cover the upgrade cost.
    InsufficientFunds,
}

/// Reasons a tower sale request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleError {
    /// The match already ended.
    MatchOver,
    /// No tower with the provided identifier exists.
    MissingTower,
}

/// Lifecycle state of an enemy unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyState {
    /// Following the waypoint path.
    Traveling,
    /// Health was depleted. Terminal.
    Dead,
    /// Travelled past the final waypoint. Terminal.
    ReachedGoal,
}

impl EnemyState {
    /// Reports whether the state is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Traveling)
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Template the enemy was built from.
    pub kind: EnemyKind,
    /// Current world-space position.
    pub position: Point,
    /// Remaining health.
    pub health: i32,
    /// Health the enemy spawned with.
    pub max_health: i32,
    /// Index of the waypoint the enemy is travelling toward.
    pub path_index: usize,
}

/// Read-only snapshot describing all live enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of live enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Template the tower was built from.
    pub kind: TowerKind,
    /// Tile reserved by the tower.
    pub tile: TileCoord,
    /// Centre of the reserved tile.
    pub position: Point,
    /// Current targeting radius in world units.
    pub range: f32,
    /// Current shots per second.
    pub fire_rate: f32,
    /// Zero-based upgrade level.
    pub upgrade_level: u32,
    /// Highest reachable upgrade level.
    pub max_upgrade_level: u32,
    /// Currency required for the next upgrade.
    pub upgrade_cost: u32,
    /// Time until the tower may fire again.
    pub cooldown: Duration,
    /// Enemy currently targeted, if any.
    pub target: Option<EnemyId>,
}

impl TowerSnapshot {
    /// Currency credited when the tower is sold.
    #[must_use]
    pub const fn sell_value(&self) -> u32 {
        sell_value(self.upgrade_cost)
    }

    /// Reports whether another upgrade is permitted.
    #[must_use]
    pub const fn can_upgrade(&self) -> bool {
        self.upgrade_level < self.max_upgrade_level
    }
}

/// Read-only snapshot describing all placed towers.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a projectile in flight.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile.
    pub id: ProjectileId,
    /// Current world-space position.
    pub position: Point,
    /// Enemy the projectile homes on.
    pub target: EnemyId,
}

/// Currency refunded for a tower whose next upgrade costs `upgrade_cost`.
///
/// Sales return half of the current upgrade cost, rounded down.
#[must_use]
pub const fn sell_value(upgrade_cost: u32) -> u32 {
    upgrade_cost / 2
}
