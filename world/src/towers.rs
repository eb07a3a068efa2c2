//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use tracing::debug;
use waypoint_defence_core::{
    EnemyId, Event, Point, TileCoord, TowerId, TowerKind, TowerSnapshot, TowerTemplate,
};

/// Launch request produced when a tower fires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Shot {
    pub(crate) tower: TowerId,
    pub(crate) origin: Point,
    pub(crate) target: EnemyId,
    pub(crate) speed: f32,
    pub(crate) damage: i32,
}

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Template the tower was constructed from.
    pub(crate) kind: TowerKind,
    /// Tile reserved by the tower.
    pub(crate) tile: TileCoord,
    /// Centre of the reserved tile.
    pub(crate) position: Point,
    range: f32,
    fire_rate: f32,
    range_step: f32,
    fire_rate_step: f32,
    upgrade_level: u32,
    max_upgrade_level: u32,
    upgrade_cost: u32,
    upgrade_cost_step: u32,
    projectile_speed: f32,
    projectile_damage: i32,
    cooldown: Duration,
    /// Enemies inside range, oldest entry first.
    tracked: Vec<EnemyId>,
    target: Option<EnemyId>,
}

impl TowerState {
    pub(crate) fn from_template(
        id: TowerId,
        kind: TowerKind,
        tile: TileCoord,
        position: Point,
        template: &TowerTemplate,
    ) -> Self {
        let mut state = Self {
            id,
            kind,
            tile,
            position,
            range: template.range,
            fire_rate: template.fire_rate,
            range_step: template.range_step,
            fire_rate_step: template.fire_rate_step,
            upgrade_level: 0,
            max_upgrade_level: template.max_upgrade_level,
            upgrade_cost: template.upgrade_cost,
            upgrade_cost_step: template.upgrade_cost_step,
            projectile_speed: template.projectile_speed,
            projectile_damage: template.projectile_damage,
            cooldown: Duration::ZERO,
            tracked: Vec::new(),
            target: None,
        };
        state.cooldown = state.fire_interval().unwrap_or(Duration::MAX);
        state
    }

    pub(crate) const fn upgrade_cost(&self) -> u32 {
        self.upgrade_cost
    }

    pub(crate) const fn can_upgrade(&self) -> bool {
        self.upgrade_level < self.max_upgrade_level
    }

    /// Time between shots, or `None` when the tower cannot fire at all.
    fn fire_interval(&self) -> Option<Duration> {
        if !(self.fire_rate > 0.0) {
            return None;
        }
        Duration::try_from_secs_f32(self.fire_rate.recip()).ok()
    }

    /// Advances the cooldown, refreshes targeting and fires when ready.
    ///
    /// `enemies` lists every live enemy in ascending identifier order.
    pub(crate) fn advance(&mut self, dt: Duration, enemies: &[(EnemyId, Point)]) -> Option<Shot> {
        self.cooldown = self.cooldown.saturating_sub(dt);
        self.refresh_tracking(enemies);

        let target_valid = self
            .target
            .map_or(false, |target| self.tracked.contains(&target));
        if !target_valid {
            self.target = self.tracked.first().copied();
        }

        let target = self.target?;
        if !self.cooldown.is_zero() {
            return None;
        }

        let Some(interval) = self.fire_interval() else {
            debug!(target: "td.towers", tower = self.id.get(), "tower cannot fire");
            return None;
        };
        self.cooldown = interval;
        Some(Shot {
            tower: self.id,
            origin: self.position,
            target,
            speed: self.projectile_speed,
            damage: self.projectile_damage,
        })
    }

    fn refresh_tracking(&mut self, enemies: &[(EnemyId, Point)]) {
        let origin = self.position;
        let range = self.range;
        let in_range: Vec<EnemyId> = enemies
            .iter()
            .filter(|(_, position)| origin.distance(*position) <= range)
            .map(|(id, _)| *id)
            .collect();

        self.tracked.retain(|id| in_range.contains(id));
        for id in in_range {
            if !self.tracked.contains(&id) {
                self.tracked.push(id);
            }
        }
    }

    /// Advances one upgrade level. Returns `false` at the maximum level.
    ///
    /// Funds are the caller's concern; this only mutates the tower.
    pub(crate) fn upgrade(&mut self) -> bool {
        if !self.can_upgrade() {
            debug!(
                target: "td.towers",
                tower = self.id.get(),
                level = self.upgrade_level,
                "tower already at max level"
            );
            return false;
        }

        self.upgrade_level += 1;
        self.range += self.range_step;
        self.fire_rate += self.fire_rate_step;
        self.upgrade_cost = self.upgrade_cost.saturating_add(self.upgrade_cost_step);
        true
    }

    pub(crate) fn state_event(&self) -> Event {
        Event::TowerStateChanged {
            tower: self.id,
            level: self.upgrade_level + 1,
            upgrade_cost: self.upgrade_cost,
            can_upgrade: self.can_upgrade(),
        }
    }

    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            tile: self.tile,
            position: self.position,
            range: self.range,
            fire_rate: self.fire_rate,
            upgrade_level: self.upgrade_level,
            max_upgrade_level: self.max_upgrade_level,
            upgrade_cost: self.upgrade_cost,
            cooldown: self.cooldown,
            target: self.target,
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    pub(crate) fn allocate(&mut self) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        id
    }

    pub(crate) fn insert(&mut self, state: TowerState) {
        let _ = self.entries.insert(state.id, state);
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<TowerState> {
        self.entries.remove(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_tower_id = TowerId::new(0);
    }
}
