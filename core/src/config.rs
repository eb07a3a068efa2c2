//! Authored match configuration and its startup validation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{EnemyKind, Point, TowerKind};

/// Balance below which presentation layers flag low funds by default.
pub const DEFAULT_LOW_FUNDS_THRESHOLD: u32 = 20;

/// Complete description of a playable match.
///
/// Every field has a default taken from the bundled demo level so partial
/// configuration files only need to override what they change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Currency available when the match starts or restarts.
    pub starting_money: u32,
    /// Balance below which the ledger reports low funds.
    pub low_funds_threshold: u32,
    /// Number of enemies that may reach the goal before the match is lost.
    pub max_enemies_allowed: u32,
    /// Pause between the end of one wave and the start of the next, in seconds.
    pub time_between_waves_secs: f32,
    /// Seed for enemy type selection.
    pub rng_seed: u64,
    /// Waypoints shared by every enemy, from spawn to goal.
    pub path: Vec<Point>,
    /// Build grid layout.
    pub grid: GridConfig,
    /// Enemy templates referenced by [`EnemyKind`] indices.
    pub enemies: Vec<EnemyTemplate>,
    /// Tower templates referenced by [`TowerKind`] indices.
    pub towers: Vec<TowerTemplate>,
    /// Waves in the order they are played.
    pub waves: Vec<WaveConfig>,
}

/// Square tile grid that towers are placed on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Side length of a tile in world units.
    pub tile_size: f32,
    /// Tiles whose centre lies closer than this to the path are unbuildable.
    pub path_clearance: f32,
}

/// Authored enemy archetype.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    /// Human readable name used in logs.
    pub name: String,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Health the enemy spawns with.
    pub health: i32,
    /// Damage dealt to the player. Reserved; not consumed by the simulation.
    #[serde(default)]
    pub damage: i32,
    /// Currency credited when the enemy dies.
    pub reward: u32,
}

/// Authored tower archetype.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerTemplate {
    /// Human readable name used in logs.
    pub name: String,
    /// Currency debited when the tower is placed.
    pub build_cost: u32,
    /// Targeting radius in world units.
    pub range: f32,
    /// Shots per second.
    pub fire_rate: f32,
    /// Currency required for the first upgrade.
    pub upgrade_cost: u32,
    /// Range gained per upgrade.
    pub range_step: f32,
    /// Fire rate gained per upgrade.
    pub fire_rate_step: f32,
    /// Amount the upgrade cost grows per upgrade.
    pub upgrade_cost_step: u32,
    /// Highest reachable zero-based upgrade level.
    pub max_upgrade_level: u32,
    /// Projectile speed in world units per second.
    pub projectile_speed: f32,
    /// Damage applied by each projectile.
    pub projectile_damage: i32,
}

/// Authored wave definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    /// Enemy kinds the wave draws from uniformly.
    pub enemy_types: Vec<EnemyKind>,
    /// Number of enemies the wave spawns.
    pub enemy_count: u32,
    /// Delay between consecutive spawns, in seconds.
    pub spawn_interval_secs: f32,
}

impl WaveConfig {
    /// Delay between consecutive spawns.
    #[must_use]
    pub fn spawn_interval(&self) -> Duration {
        seconds(self.spawn_interval_secs)
    }
}

impl MatchConfig {
    /// Looks up the enemy template referenced by `kind`.
    #[must_use]
    pub fn enemy(&self, kind: EnemyKind) -> Option<&EnemyTemplate> {
        usize::try_from(kind.get())
            .ok()
            .and_then(|index| self.enemies.get(index))
    }

    /// Looks up the tower template referenced by `kind`.
    #[must_use]
    pub fn tower(&self, kind: TowerKind) -> Option<&TowerTemplate> {
        usize::try_from(kind.get())
            .ok()
            .and_then(|index| self.towers.get(index))
    }

    /// Pause between waves.
    #[must_use]
    pub fn time_between_waves(&self) -> Duration {
        seconds(self.time_between_waves_secs)
    }

    /// Checks every precondition required to start a match.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.is_empty() {
            return Err(ConfigError::MissingPath);
        }
        if self.path.len() < 2 {
            return Err(ConfigError::PathTooShort {
                points: self.path.len(),
            });
        }
        if self.waves.is_empty() {
            return Err(ConfigError::NoWaves);
        }
        if self.enemies.is_empty() {
            return Err(ConfigError::NoEnemyTemplates);
        }
        if self.towers.is_empty() {
            return Err(ConfigError::NoTowerTemplates);
        }
        if self.max_enemies_allowed == 0 {
            return Err(ConfigError::ZeroGoalAllowance);
        }
        if !(self.time_between_waves_secs.is_finite() && self.time_between_waves_secs >= 0.0) {
            return Err(ConfigError::InvalidWaveCountdown);
        }
        if self.grid.columns == 0 || self.grid.rows == 0 || !(self.grid.tile_size > 0.0) {
            return Err(ConfigError::InvalidGrid);
        }

        for (index, enemy) in self.enemies.iter().enumerate() {
            if !(enemy.speed > 0.0) || enemy.health <= 0 {
                return Err(ConfigError::InvalidEnemy { enemy: index });
            }
        }

        for (index, tower) in self.towers.iter().enumerate() {
            if !(tower.fire_rate.is_finite() && tower.fire_rate > 0.0) {
                return Err(ConfigError::NonPositiveFireRate { tower: index });
            }
            let stats_valid = non_negative(tower.range)
                && non_negative(tower.range_step)
                && non_negative(tower.fire_rate_step)
                && tower.projectile_speed.is_finite()
                && tower.projectile_speed > 0.0;
            if !stats_valid {
                return Err(ConfigError::InvalidTower { tower: index });
            }
        }

        for (wave, definition) in self.waves.iter().enumerate() {
            if definition.enemy_types.is_empty() {
                return Err(ConfigError::EmptyWave { wave });
            }
            if definition.enemy_count == 0 {
                return Err(ConfigError::ZeroEnemyCount { wave });
            }
            if !(definition.spawn_interval_secs.is_finite() && definition.spawn_interval_secs > 0.0)
            {
                return Err(ConfigError::NonPositiveSpawnInterval { wave });
            }
            if let Some(kind) = definition
                .enemy_types
                .iter()
                .find(|kind| self.enemy(**kind).is_none())
            {
                return Err(ConfigError::UnknownEnemyKind {
                    wave,
                    kind: kind.get(),
                });
            }
        }

        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            starting_money: 100,
            low_funds_threshold: DEFAULT_LOW_FUNDS_THRESHOLD,
            max_enemies_allowed: 10,
            time_between_waves_secs: 5.0,
            rng_seed: 0x5eed_d3f3,
            path: vec![
                Point::new(0.5, 2.5),
                Point::new(10.5, 2.5),
                Point::new(10.5, 8.5),
                Point::new(20.5, 8.5),
                Point::new(20.5, 2.5),
                Point::new(31.5, 2.5),
            ],
            grid: GridConfig::default(),
            enemies: vec![
                EnemyTemplate {
                    name: "grunt".to_owned(),
                    speed: 2.0,
                    health: 6,
                    damage: 1,
                    reward: 10,
                },
                EnemyTemplate {
                    name: "runner".to_owned(),
                    speed: 3.5,
                    health: 3,
                    damage: 1,
                    reward: 6,
                },
                EnemyTemplate {
                    name: "brute".to_owned(),
                    speed: 1.2,
                    health: 16,
                    damage: 2,
                    reward: 25,
                },
            ],
            towers: vec![
                TowerTemplate {
                    name: "basic".to_owned(),
                    build_cost: 50,
                    range: 5.0,
                    fire_rate: 1.0,
                    upgrade_cost: 50,
                    range_step: 1.0,
                    fire_rate_step: 0.2,
                    upgrade_cost_step: 50,
                    max_upgrade_level: 3,
                    projectile_speed: 10.0,
                    projectile_damage: 2,
                },
                TowerTemplate {
                    name: "sniper".to_owned(),
                    build_cost: 80,
                    range: 8.0,
                    fire_rate: 0.5,
                    upgrade_cost: 70,
                    range_step: 1.5,
                    fire_rate_step: 0.1,
                    upgrade_cost_step: 60,
                    max_upgrade_level: 3,
                    projectile_speed: 18.0,
                    projectile_damage: 6,
                },
            ],
            waves: vec![
                WaveConfig {
                    enemy_types: vec![EnemyKind::new(0)],
                    enemy_count: 5,
                    spawn_interval_secs: 1.5,
                },
                WaveConfig {
                    enemy_types: vec![EnemyKind::new(0), EnemyKind::new(1)],
                    enemy_count: 8,
                    spawn_interval_secs: 1.0,
                },
                WaveConfig {
                    enemy_types: vec![EnemyKind::new(0), EnemyKind::new(1), EnemyKind::new(2)],
                    enemy_count: 12,
                    spawn_interval_secs: 0.8,
                },
            ],
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 32,
            rows: 12,
            tile_size: 1.0,
            path_clearance: 0.75,
        }
    }
}

/// Startup preconditions that prevent a match from being created.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No waypoint path was assigned.
    #[error("no waypoint path assigned")]
    MissingPath,
    /// The path cannot lead anywhere.
    #[error("waypoint path needs at least two points, found {points}")]
    PathTooShort {
        /// Number of points provided.
        points: usize,
    },
    /// No wave definitions were provided.
    #[error("at least one wave definition is required")]
    NoWaves,
    /// No enemy templates were provided.
    #[error("at least one enemy template is required")]
    NoEnemyTemplates,
    /// No tower templates were provided.
    #[error("at least one tower template is required")]
    NoTowerTemplates,
    /// The loss threshold would end the match before it starts.
    #[error("max_enemies_allowed must be greater than zero")]
    ZeroGoalAllowance,
    /// The inter-wave pause is negative or not a number.
    #[error("time_between_waves_secs must be a finite, non-negative number")]
    InvalidWaveCountdown,
    /// The grid has no tiles or a non-positive tile size.
    #[error("build grid must have positive dimensions and tile size")]
    InvalidGrid,
    /// An enemy template has a non-positive speed or health.
    #[error("enemy template {enemy} needs positive speed and health")]
    InvalidEnemy {
        /// Index of the offending template.
        enemy: usize,
    },
    /// A tower template cannot fire.
    #[error("tower template {tower} needs a positive fire rate")]
    NonPositiveFireRate {
        /// Index of the offending template.
        tower: usize,
    },
    /// A tower template has a negative range or upgrade step, or a projectile
    /// that cannot move.
    #[error("tower template {tower} has an invalid range, upgrade step or projectile speed")]
    InvalidTower {
        /// Index of the offending template.
        tower: usize,
    },
    /// A wave has no enemy kinds to draw from.
    #[error("wave {wave} lists no enemy types")]
    EmptyWave {
        /// Zero-based wave index.
        wave: usize,
    },
    /// A wave spawns no enemies.
    #[error("wave {wave} must spawn at least one enemy")]
    ZeroEnemyCount {
        /// Zero-based wave index.
        wave: usize,
    },
    /// A wave's spawn interval is zero, negative or not a number.
    #[error("wave {wave} needs a positive spawn interval")]
    NonPositiveSpawnInterval {
        /// Zero-based wave index.
        wave: usize,
    },
    /// A wave references an enemy kind with no template.
    #[error("wave {wave} references unknown enemy kind {kind}")]
    UnknownEnemyKind {
        /// Zero-based wave index.
        wave: usize,
        /// Unresolved template index.
        kind: u32,
    },
}

fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(MatchConfig::default().validate(), Ok(()));
    }

    #[test]
    fn missing_path_is_fatal() {
        let config = MatchConfig {
            path: Vec::new(),
            ..MatchConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingPath));
    }

    #[test]
    fn single_point_path_is_rejected() {
        let config = MatchConfig {
            path: vec![Point::new(0.0, 0.0)],
            ..MatchConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::PathTooShort { points: 1 })
        );
    }

    #[test]
    fn waves_are_required() {
        let config = MatchConfig {
            waves: Vec::new(),
            ..MatchConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoWaves));
    }

    #[test]
    fn wave_with_unknown_enemy_is_rejected() {
        let mut config = MatchConfig::default();
        config.waves[1].enemy_types.push(EnemyKind::new(17));
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownEnemyKind { wave: 1, kind: 17 })
        );
    }

    #[test]
    fn wave_needs_positive_interval_and_count() {
        let mut config = MatchConfig::default();
        config.waves[0].spawn_interval_secs = 0.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositiveSpawnInterval { wave: 0 })
        );

        let mut config = MatchConfig::default();
        config.waves[2].enemy_count = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroEnemyCount { wave: 2 })
        );
    }

    #[test]
    fn tower_upgrade_steps_cannot_shrink_stats() {
        let mut config = MatchConfig::default();
        config.towers[0].fire_rate_step = -1.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidTower { tower: 0 })
        );

        let mut config = MatchConfig::default();
        config.towers[1].range_step = f32::NAN;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidTower { tower: 1 })
        );

        let mut config = MatchConfig::default();
        config.towers[1].projectile_speed = 0.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidTower { tower: 1 })
        );

        let mut config = MatchConfig::default();
        config.towers[0].fire_rate = f32::INFINITY;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositiveFireRate { tower: 0 })
        );
    }

    #[test]
    fn template_lookup_respects_bounds() {
        let config = MatchConfig::default();
        assert_eq!(
            config.tower(TowerKind::new(0)).map(|t| t.name.as_str()),
            Some("basic")
        );
        assert!(config.tower(TowerKind::new(5)).is_none());
        assert!(config.enemy(EnemyKind::new(2)).is_some());
        assert!(config.enemy(EnemyKind::new(3)).is_none());
    }

    #[test]
    fn durations_convert_from_seconds() {
        let config = MatchConfig::default();
        assert_eq!(config.time_between_waves(), Duration::from_secs(5));
        assert_eq!(
            config.waves[0].spawn_interval(),
            Duration::from_millis(1_500)
        );
    }

    #[test]
    fn config_round_trips_through_bincode() {
        let config = MatchConfig::default();
        let bytes = bincode::serialize(&config).expect("serialize");
        let restored: MatchConfig = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, config);
    }
}
