//! Homing projectiles launched by towers.

use std::time::Duration;

use glam::Vec2;
use waypoint_defence_core::{
    EnemyId, Point, ProjectileId, ProjectileSnapshot, PROJECTILE_HIT_RADIUS,
};

use crate::{to_point, to_vec2, towers::Shot};

/// Result of advancing a projectile by one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Flight {
    /// Still travelling toward the target.
    InFlight,
    /// Struck the target; the projectile is spent.
    Hit { enemy: EnemyId, damage: i32 },
    /// The target was released before impact.
    Expired,
}

#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    id: ProjectileId,
    position: Vec2,
    target: EnemyId,
    speed: f32,
    damage: i32,
}

impl Projectile {
    pub(crate) fn launch(id: ProjectileId, shot: &Shot) -> Self {
        Self {
            id,
            position: to_vec2(shot.origin),
            target: shot.target,
            speed: shot.speed,
            damage: shot.damage,
        }
    }

    pub(crate) const fn target(&self) -> EnemyId {
        self.target
    }

    /// Homes on `target_position`, the target's current location, or expires
    /// when the target no longer exists.
    pub(crate) fn advance(&mut self, dt: Duration, target_position: Option<Point>) -> Flight {
        let Some(target_position) = target_position else {
            return Flight::Expired;
        };

        let target = to_vec2(target_position);
        let step = self.speed * dt.as_secs_f32();
        let offset = target - self.position;
        let distance = offset.length();

        if distance <= step + PROJECTILE_HIT_RADIUS {
            self.position = target;
            return Flight::Hit {
                enemy: self.target,
                damage: self.damage,
            };
        }

        self.position += offset / distance * step;
        Flight::InFlight
    }

    pub(crate) fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            position: to_point(self.position),
            target: self.target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_defence_core::TowerId;

    fn projectile() -> Projectile {
        Projectile::launch(
            ProjectileId::new(0),
            &Shot {
                tower: TowerId::new(0),
                origin: Point::new(0.0, 0.0),
                target: EnemyId::new(9),
                speed: 4.0,
                damage: 3,
            },
        )
    }

    #[test]
    fn travels_then_hits() {
        let mut projectile = projectile();
        let target = Some(Point::new(3.0, 0.0));

        assert_eq!(
            projectile.advance(Duration::from_millis(500), target),
            Flight::InFlight
        );
        assert!((projectile.snapshot().position.x() - 2.0).abs() < 1e-5);
        assert_eq!(
            projectile.advance(Duration::from_millis(500), target),
            Flight::Hit {
                enemy: EnemyId::new(9),
                damage: 3,
            }
        );
    }

    #[test]
    fn expires_without_target() {
        let mut projectile = projectile();
        assert_eq!(
            projectile.advance(Duration::from_millis(16), None),
            Flight::Expired
        );
    }

    #[test]
    fn follows_moving_target() {
        let mut projectile = projectile();
        let _ = projectile.advance(Duration::from_millis(250), Some(Point::new(0.0, 5.0)));
        let position = projectile.snapshot().position;
        assert!(position.x().abs() < 1e-5);
        assert!((position.y() - 1.0).abs() < 1e-5);
    }
}
