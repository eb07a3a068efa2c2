//! Build grid that towers reserve tiles on.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use waypoint_defence_core::{GridConfig, Point, TileCoord, TowerId};

use crate::to_vec2;

#[derive(Debug)]
pub(crate) struct BuildGrid {
    columns: u32,
    rows: u32,
    tile_size: f32,
    /// Tiles crossed by the waypoint path.
    blocked: BTreeSet<TileCoord>,
    occupied: BTreeMap<TileCoord, TowerId>,
}

impl BuildGrid {
    pub(crate) fn new(config: &GridConfig, path: &[Point]) -> Self {
        let mut grid = Self {
            columns: config.columns,
            rows: config.rows,
            tile_size: config.tile_size,
            blocked: BTreeSet::new(),
            occupied: BTreeMap::new(),
        };

        for row in 0..grid.rows {
            for column in 0..grid.columns {
                let tile = TileCoord::new(column, row);
                let centre = to_vec2(grid.tile_centre(tile));
                let crossed = path.windows(2).any(|segment| {
                    distance_to_segment(centre, to_vec2(segment[0]), to_vec2(segment[1]))
                        <= config.path_clearance
                });
                if crossed {
                    let _ = grid.blocked.insert(tile);
                }
            }
        }

        grid
    }

    /// Tile containing `point`, if it lies inside the grid.
    pub(crate) fn tile_at(&self, point: Point) -> Option<TileCoord> {
        if !(point.x() >= 0.0 && point.y() >= 0.0) {
            return None;
        }

        let column = (point.x() / self.tile_size).floor();
        let row = (point.y() / self.tile_size).floor();
        if column >= self.columns as f32 || row >= self.rows as f32 {
            return None;
        }

        Some(TileCoord::new(column as u32, row as u32))
    }

    pub(crate) fn tile_centre(&self, tile: TileCoord) -> Point {
        Point::new(
            (tile.column() as f32 + 0.5) * self.tile_size,
            (tile.row() as f32 + 0.5) * self.tile_size,
        )
    }

    pub(crate) fn is_buildable(&self, tile: TileCoord) -> bool {
        tile.column() < self.columns && tile.row() < self.rows && !self.blocked.contains(&tile)
    }

    pub(crate) fn occupant(&self, tile: TileCoord) -> Option<TowerId> {
        self.occupied.get(&tile).copied()
    }

    pub(crate) fn occupy(&mut self, tile: TileCoord, tower: TowerId) {
        let _ = self.occupied.insert(tile, tower);
    }

    pub(crate) fn release(&mut self, tile: TileCoord) {
        let _ = self.occupied.remove(&tile);
    }

    pub(crate) fn clear(&mut self) {
        self.occupied.clear();
    }
}

fn distance_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let segment = end - start;
    let length_squared = segment.length_squared();
    if length_squared <= f32::EPSILON {
        return point.distance(start);
    }

    let t = ((point - start).dot(segment) / length_squared).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> BuildGrid {
        let config = GridConfig {
            columns: 6,
            rows: 4,
            tile_size: 2.0,
            path_clearance: 1.0,
        };
        let path = [Point::new(0.0, 3.0), Point::new(12.0, 3.0)];
        BuildGrid::new(&config, &path)
    }

    #[test]
    fn snaps_points_to_tiles() {
        let grid = grid();
        assert_eq!(grid.tile_at(Point::new(3.9, 0.1)), Some(TileCoord::new(1, 0)));
        assert_eq!(grid.tile_centre(TileCoord::new(1, 0)), Point::new(3.0, 1.0));
        assert_eq!(grid.tile_at(Point::new(12.0, 1.0)), None);
        assert_eq!(grid.tile_at(Point::new(-0.5, 1.0)), None);
    }

    #[test]
    fn path_tiles_are_unbuildable() {
        let grid = grid();
        assert!(!grid.is_buildable(TileCoord::new(0, 1)));
        assert!(!grid.is_buildable(TileCoord::new(5, 1)));
        assert!(grid.is_buildable(TileCoord::new(0, 0)));
        assert!(grid.is_buildable(TileCoord::new(3, 3)));
        assert!(!grid.is_buildable(TileCoord::new(6, 0)));
    }

    #[test]
    fn occupancy_tracks_reservations() {
        let mut grid = grid();
        let tile = TileCoord::new(2, 0);
        grid.occupy(tile, TowerId::new(4));
        assert_eq!(grid.occupant(tile), Some(TowerId::new(4)));

        grid.release(tile);
        assert_eq!(grid.occupant(tile), None);

        grid.occupy(tile, TowerId::new(5));
        grid.clear();
        assert_eq!(grid.occupant(tile), None);
    }
}
