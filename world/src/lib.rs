#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Waypoint Defence.
//!
//! The world owns every enemy, tower and projectile together with the
//! economy ledger and the match outcome tracker. It only changes in response
//! to [`Command`] values passed to [`apply`] and reports every change as an
//! [`Event`].

mod enemies;
mod grid;
mod ledger;
mod outcome;
mod projectiles;
mod towers;

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use tracing::{debug, info, warn};
use waypoint_defence_core::{
    sell_value, Command, ConfigError, EnemyId, EnemyKind, Event, MatchConfig, PlacementError,
    PlayMode, Point, ProjectileId, SaleError, TowerId, TowerKind, UpgradeError, WELCOME_BANNER,
};

use enemies::Enemy;
use grid::BuildGrid;
use projectiles::{Flight, Projectile};
use towers::{TowerRegistry, TowerState};

pub use ledger::EconomyLedger;
pub use outcome::OutcomeTracker;

/// Represents the authoritative Waypoint Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: MatchConfig,
    play_mode: PlayMode,
    ledger: EconomyLedger,
    outcome: OutcomeTracker,
    grid: BuildGrid,
    enemies: BTreeMap<EnemyId, Enemy>,
    towers: TowerRegistry,
    projectiles: BTreeMap<ProjectileId, Projectile>,
    next_enemy_id: EnemyId,
    next_projectile_id: ProjectileId,
}

impl World {
    /// Creates a world for the provided match, rejecting unusable configurations.
    pub fn new(config: MatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            target: "td.world",
            waypoints = config.path.len(),
            waves = config.waves.len(),
            starting_money = config.starting_money,
            "world created"
        );

        Ok(Self {
            banner: WELCOME_BANNER,
            play_mode: PlayMode::Running,
            ledger: EconomyLedger::new(config.starting_money, config.low_funds_threshold),
            outcome: OutcomeTracker::new(config.max_enemies_allowed),
            grid: BuildGrid::new(&config.grid, &config.path),
            enemies: BTreeMap::new(),
            towers: TowerRegistry::new(),
            projectiles: BTreeMap::new(),
            next_enemy_id: EnemyId::new(0),
            next_projectile_id: ProjectileId::new(0),
            config,
        })
    }

    fn step(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let arrivals = self.advance_enemies(dt);
        self.advance_towers(dt, out_events);
        self.advance_projectiles(dt, out_events);
        self.resolve_arrivals(arrivals, out_events);
    }

    /// Moves every enemy and returns those standing past the final waypoint.
    ///
    /// Goal side effects wait until projectiles resolved so a killing hit in
    /// the same tick takes priority.
    fn advance_enemies(&mut self, dt: Duration) -> Vec<EnemyId> {
        let path = &self.config.path;
        self.enemies
            .iter_mut()
            .filter_map(|(id, enemy)| enemy.advance(dt, path).then_some(*id))
            .collect()
    }

    fn resolve_arrivals(&mut self, arrivals: Vec<EnemyId>, out_events: &mut Vec<Event>) {
        for id in arrivals {
            let Some(enemy) = self.enemies.get_mut(&id) else {
                continue;
            };
            if !enemy.reach_goal() {
                continue;
            }

            info!(target: "td.enemies", enemy = id.get(), "enemy reached goal");
            out_events.push(Event::EnemyReachedGoal { enemy: id });
            self.outcome.report_goal_reached(out_events);
            let _ = self.enemies.remove(&id);
        }
    }

    fn advance_towers(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let positions: Vec<(EnemyId, Point)> = self
            .enemies
            .iter()
            .map(|(id, enemy)| (*id, enemy.position()))
            .collect();

        let shots: Vec<_> = self
            .towers
            .iter_mut()
            .filter_map(|tower| tower.advance(dt, &positions))
            .collect();

        for shot in shots {
            let id = self.next_projectile_id;
            self.next_projectile_id = ProjectileId::new(id.get().saturating_add(1));
            let _ = self.projectiles.insert(id, Projectile::launch(id, &shot));
            out_events.push(Event::ProjectileFired {
                projectile: id,
                tower: shot.tower,
                target: shot.target,
            });
        }
    }

    fn advance_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let in_flight: Vec<ProjectileId> = self.projectiles.keys().copied().collect();
        for id in in_flight {
            let Some(projectile) = self.projectiles.get_mut(&id) else {
                continue;
            };
            let target = self
                .enemies
                .get(&projectile.target())
                .map(Enemy::position);

            match projectile.advance(dt, target) {
                Flight::InFlight => {}
                Flight::Expired => {
                    let _ = self.projectiles.remove(&id);
                    out_events.push(Event::ProjectileExpired { projectile: id });
                }
                Flight::Hit { enemy, damage } => {
                    let _ = self.projectiles.remove(&id);
                    out_events.push(Event::ProjectileHit {
                        projectile: id,
                        enemy,
                        damage,
                    });
                    self.damage_enemy(enemy, damage, out_events);
                }
            }
        }
    }

    fn damage_enemy(&mut self, id: EnemyId, damage: i32, out_events: &mut Vec<Event>) {
        let Some(enemy) = self.enemies.get_mut(&id) else {
            return;
        };
        if !enemy.take_damage(damage) {
            return;
        }

        let reward = enemy.reward();
        info!(target: "td.enemies", enemy = id.get(), reward, "enemy died");
        out_events.push(Event::EnemyDied { enemy: id, reward });
        self.ledger.credit(reward, out_events);
        let _ = self.enemies.remove(&id);
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, wave: u32, out_events: &mut Vec<Event>) {
        if self.outcome.is_over() {
            debug!(target: "td.enemies", "spawn after match end ignored");
            return;
        }
        let Some(template) = self.config.enemy(kind) else {
            warn!(
                target: "td.enemies",
                kind = kind.get(),
                "spawn requested for unknown enemy kind"
            );
            return;
        };

        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
        let enemy = Enemy::spawn(id, kind, template, &self.config.path);
        debug!(
            target: "td.enemies",
            enemy = id.get(),
            name = %template.name,
            wave,
            "enemy spawned"
        );
        out_events.push(Event::EnemySpawned {
            enemy: id,
            kind,
            position: enemy.position(),
        });
        let _ = self.enemies.insert(id, enemy);
    }

    fn place_tower(
        &mut self,
        kind: TowerKind,
        at: Point,
        out_events: &mut Vec<Event>,
    ) -> Result<(), PlacementError> {
        if self.outcome.is_over() {
            return Err(PlacementError::MatchOver);
        }
        let template = self
            .config
            .tower(kind)
            .ok_or(PlacementError::UnknownKind)?;
        let tile = self
            .grid
            .tile_at(at)
            .filter(|tile| self.grid.is_buildable(*tile))
            .ok_or(PlacementError::Unbuildable)?;
        if self.grid.occupant(tile).is_some() {
            return Err(PlacementError::Occupied);
        }
        if !self.ledger.debit(template.build_cost, out_events) {
            return Err(PlacementError::InsufficientFunds);
        }

        let id = self.towers.allocate();
        let position = self.grid.tile_centre(tile);
        let tower = TowerState::from_template(id, kind, tile, position, template);
        info!(
            target: "td.towers",
            tower = id.get(),
            name = %template.name,
            column = tile.column(),
            row = tile.row(),
            "tower placed"
        );

        self.grid.occupy(tile, id);
        out_events.push(Event::TowerPlaced {
            tower: id,
            kind,
            tile,
            position,
        });
        out_events.push(tower.state_event());
        self.towers.insert(tower);
        Ok(())
    }

    fn upgrade_tower(
        &mut self,
        id: TowerId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), UpgradeError> {
        if self.outcome.is_over() {
            return Err(UpgradeError::MatchOver);
        }
        let tower = self.towers.get_mut(id).ok_or(UpgradeError::MissingTower)?;
        if !tower.can_upgrade() {
            return Err(UpgradeError::MaxLevel);
        }
        if !self.ledger.debit(tower.upgrade_cost(), out_events) {
            return Err(UpgradeError::InsufficientFunds);
        }
        if !tower.upgrade() {
            return Err(UpgradeError::MaxLevel);
        }

        info!(target: "td.towers", tower = id.get(), "tower upgraded");
        out_events.push(tower.state_event());
        Ok(())
    }

    fn sell_tower(&mut self, id: TowerId, out_events: &mut Vec<Event>) -> Result<(), SaleError> {
        if self.outcome.is_over() {
            return Err(SaleError::MatchOver);
        }
        let tower = self.towers.remove(id).ok_or(SaleError::MissingTower)?;
        let refund = sell_value(tower.upgrade_cost());

        self.grid.release(tower.tile);
        self.ledger.credit(refund, out_events);
        info!(target: "td.towers", tower = id.get(), refund, "tower sold");
        out_events.push(Event::TowerSold {
            tower: id,
            tile: tower.tile,
            refund,
        });
        Ok(())
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        self.enemies.clear();
        self.projectiles.clear();
        self.towers.clear();
        self.grid.clear();
        self.outcome.reset();
        self.next_enemy_id = EnemyId::new(0);
        self.next_projectile_id = ProjectileId::new(0);

        info!(target: "td.world", "match reset");
        out_events.push(Event::MatchReset);
        if self.play_mode != PlayMode::Running {
            self.play_mode = PlayMode::Running;
            out_events.push(Event::PlayModeChanged {
                mode: PlayMode::Running,
            });
        }
        self.ledger.reset(self.config.starting_money, out_events);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            if world.play_mode == PlayMode::Paused || world.outcome.is_over() {
                return;
            }
            out_events.push(Event::TimeAdvanced { dt });
            world.step(dt, out_events);
        }
        Command::SetPlayMode { mode } => {
            if world.play_mode != mode {
                world.play_mode = mode;
                debug!(target: "td.world", ?mode, "play mode changed");
                out_events.push(Event::PlayModeChanged { mode });
            }
        }
        Command::SpawnEnemy { kind, wave } => world.spawn_enemy(kind, wave, out_events),
        Command::DeclareVictory => world.outcome.report_victory(out_events),
        Command::PlaceTower { kind, at } => {
            if let Err(reason) = world.place_tower(kind, at, out_events) {
                debug!(target: "td.towers", ?reason, "tower placement rejected");
                out_events.push(Event::TowerPlacementRejected { kind, at, reason });
            }
        }
        Command::UpgradeTower { tower } => {
            if let Err(reason) = world.upgrade_tower(tower, out_events) {
                debug!(target: "td.towers", tower = tower.get(), ?reason, "tower upgrade rejected");
                out_events.push(Event::TowerUpgradeRejected { tower, reason });
            }
        }
        Command::SellTower { tower } => {
            if let Err(reason) = world.sell_tower(tower, out_events) {
                debug!(target: "td.towers", tower = tower.get(), ?reason, "tower sale rejected");
                out_events.push(Event::TowerSaleRejected { tower, reason });
            }
        }
        Command::ResetMatch => world.reset(out_events),
    }
}

pub(crate) fn to_vec2(point: Point) -> Vec2 {
    Vec2::new(point.x(), point.y())
}

pub(crate) fn to_point(vector: Vec2) -> Point {
    Point::new(vector.x, vector.y)
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{EconomyLedger, OutcomeTracker, World};
    use waypoint_defence_core::{
        EnemyId, EnemySnapshot, EnemyView, MatchConfig, MatchOutcome, PlayMode, Point,
        ProjectileSnapshot, TileCoord, TowerId, TowerSnapshot, TowerView,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Configuration the world was created from.
    #[must_use]
    pub fn config(world: &World) -> &MatchConfig {
        &world.config
    }

    /// Waypoints shared by every enemy.
    #[must_use]
    pub fn path(world: &World) -> &[Point] {
        &world.config.path
    }

    /// Reports the play mode currently active within the world.
    #[must_use]
    pub fn play_mode(world: &World) -> PlayMode {
        world.play_mode
    }

    /// Provides read-only access to the economy ledger.
    #[must_use]
    pub fn ledger(world: &World) -> &EconomyLedger {
        &world.ledger
    }

    /// Current ledger balance.
    #[must_use]
    pub fn balance(world: &World) -> u32 {
        world.ledger.balance()
    }

    /// Provides read-only access to the match outcome tracker.
    #[must_use]
    pub fn outcome_tracker(world: &World) -> &OutcomeTracker {
        &world.outcome
    }

    /// Terminal outcome, if the match ended.
    #[must_use]
    pub fn outcome(world: &World) -> Option<MatchOutcome> {
        world.outcome.outcome()
    }

    /// Reports whether the match ended.
    #[must_use]
    pub fn is_over(world: &World) -> bool {
        world.outcome.is_over()
    }

    /// Captures a read-only view of the live enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.values().map(|enemy| enemy.snapshot()).collect())
    }

    /// Snapshot of a single live enemy.
    #[must_use]
    pub fn enemy(world: &World, id: EnemyId) -> Option<EnemySnapshot> {
        world.enemies.get(&id).map(|enemy| enemy.snapshot())
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Snapshot of a single placed tower.
    #[must_use]
    pub fn tower(world: &World, id: TowerId) -> Option<TowerSnapshot> {
        world.towers.get(id).map(|tower| tower.snapshot())
    }

    /// Tower reserving the tile that contains `point`, if any.
    #[must_use]
    pub fn tower_at(world: &World, point: Point) -> Option<TowerId> {
        world
            .grid
            .tile_at(point)
            .and_then(|tile| world.grid.occupant(tile))
    }

    /// Tile containing `point`, if it lies inside the build grid.
    #[must_use]
    pub fn tile_at(world: &World, point: Point) -> Option<TileCoord> {
        world.grid.tile_at(point)
    }

    /// Reports whether a tower could be placed on `tile` right now.
    #[must_use]
    pub fn is_tile_available(world: &World, tile: TileCoord) -> bool {
        world.grid.is_buildable(tile) && world.grid.occupant(tile).is_none()
    }

    /// Snapshots of every projectile in flight, ordered by identifier.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .values()
            .map(|projectile| projectile.snapshot())
            .collect()
    }
}
