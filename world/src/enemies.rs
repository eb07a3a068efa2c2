//! Enemy units following the shared waypoint path.

use std::time::Duration;

use glam::Vec2;
use waypoint_defence_core::{
    EnemyId, EnemyKind, EnemySnapshot, EnemyState, EnemyTemplate, Point, WAYPOINT_EPSILON,
};

use crate::{to_point, to_vec2};

/// Authoritative state of a single enemy.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    id: EnemyId,
    kind: EnemyKind,
    position: Vec2,
    speed: f32,
    health: i32,
    max_health: i32,
    reward: u32,
    path_index: usize,
    state: EnemyState,
}

impl Enemy {
    /// Places a new enemy on the first waypoint, heading for the second.
    pub(crate) fn spawn(
        id: EnemyId,
        kind: EnemyKind,
        template: &EnemyTemplate,
        path: &[Point],
    ) -> Self {
        let start = path.first().copied().unwrap_or_default();
        Self {
            id,
            kind,
            position: to_vec2(start),
            speed: template.speed,
            health: template.health,
            max_health: template.health,
            reward: template.reward,
            path_index: 1,
            state: EnemyState::Traveling,
        }
    }

    pub(crate) fn position(&self) -> Point {
        to_point(self.position)
    }

    pub(crate) const fn reward(&self) -> u32 {
        self.reward
    }

    #[cfg(test)]
    pub(crate) const fn state(&self) -> EnemyState {
        self.state
    }

    /// Moves toward the current waypoint.
    ///
    /// Returns `true` while a travelling enemy stands past the final waypoint.
    /// The caller completes the transition with [`Enemy::reach_goal`].
    pub(crate) fn advance(&mut self, dt: Duration, path: &[Point]) -> bool {
        if self.state.is_terminal() {
            return false;
        }

        if let Some(waypoint) = path.get(self.path_index) {
            let target = to_vec2(*waypoint);
            self.position = move_towards(self.position, target, self.speed * dt.as_secs_f32());
            if self.position.distance(target) < WAYPOINT_EPSILON {
                self.path_index += 1;
            }
        }

        self.path_index >= path.len()
    }

    /// Marks a travelling enemy as [`EnemyState::ReachedGoal`].
    ///
    /// Returns `true` exactly once; dead enemies never reach the goal.
    pub(crate) fn reach_goal(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = EnemyState::ReachedGoal;
        true
    }

    /// Applies damage. Returns `true` exactly once, when the hit kills the enemy.
    pub(crate) fn take_damage(&mut self, amount: i32) -> bool {
        if self.state.is_terminal() {
            return false;
        }

        self.health = self.health.saturating_sub(amount.max(0));
        if self.health <= 0 {
            self.state = EnemyState::Dead;
            return true;
        }
        false
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position(),
            health: self.health,
            max_health: self.max_health,
            path_index: self.path_index,
        }
    }
}

fn move_towards(current: Vec2, target: Vec2, max_step: f32) -> Vec2 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_step || distance <= f32::EPSILON {
        target
    } else {
        current + delta / distance * max_step
    }
}
