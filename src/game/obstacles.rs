//! Static map geometry - obstacle generation, hit-testing and spawn search

use rand::Rng;
use serde::Serialize;
use std::sync::Arc;

/// Map area the base obstacle count was tuned for
const REFERENCE_AREA: f32 = 2500.0 * 1900.0;
const REFERENCE_OBSTACLE_COUNT: usize = 100;

const SPAWN_ATTEMPTS: usize = 50;
const ITEM_SPAWN_ATTEMPTS: usize = 80;
/// Extra clearance around items so they never sit flush against a wall
const ITEM_CLEARANCE: f32 = 12.0;
const FALLBACK_SPAWN: (f32, f32) = (100.0, 100.0);

/// Axis-aligned rectangle, (x, y) is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Obstacle {
    /// Half-open overlap test against the box [left, right) x [top, bottom)
    fn overlaps(&self, left: f32, top: f32, right: f32, bottom: f32) -> bool {
        left < self.x + self.width
            && right > self.x
            && top < self.y + self.height
            && bottom > self.y
    }
}

/// Immutable collision geometry for the match map
#[derive(Debug, Clone)]
pub struct ObstacleField {
    obstacles: Arc<[Obstacle]>,
    world_width: f32,
    world_height: f32,
}

impl ObstacleField {
    /// Procedurally generate obstacles, scaling the count with world area
    pub fn generate<R: Rng>(rng: &mut R, world_width: f32, world_height: f32) -> Self {
        let count = Self::obstacle_count(world_width, world_height);
        let span_x = (world_width - 300.0).max(0.0);
        let span_y = (world_height - 300.0).max(0.0);

        let obstacles: Vec<Obstacle> = (0..count)
            .map(|_| Obstacle {
                x: 100.0 + rng.gen::<f32>() * span_x,
                y: 100.0 + rng.gen::<f32>() * span_y,
                width: 60.0 + rng.gen::<f32>() * 100.0,
                height: 60.0 + rng.gen::<f32>() * 100.0,
            })
            .collect();

        Self::from_obstacles(obstacles, world_width, world_height)
    }

    pub fn from_obstacles(obstacles: Vec<Obstacle>, world_width: f32, world_height: f32) -> Self {
        Self {
            obstacles: obstacles.into(),
            world_width,
            world_height,
        }
    }

    /// Number of obstacles for a world, never below the reference count
    pub fn obstacle_count(world_width: f32, world_height: f32) -> usize {
        let area_scale = (world_width * world_height) / REFERENCE_AREA;
        let scaled = (REFERENCE_OBSTACLE_COUNT as f32 * area_scale).round() as usize;
        scaled.max(REFERENCE_OBSTACLE_COUNT)
    }

    #[cfg(test)]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Shared handle for snapshots; obstacles never change after generation
    pub fn shared(&self) -> Arc<[Obstacle]> {
        Arc::clone(&self.obstacles)
    }

    /// Does a square of side `size` centered at (center_x, center_y) touch any obstacle
    pub fn collides(&self, center_x: f32, center_y: f32, size: f32) -> bool {
        let half = size / 2.0;
        let left = center_x - half;
        let right = center_x + half;
        let top = center_y - half;
        let bottom = center_y + half;

        self.obstacles
            .iter()
            .any(|o| o.overlaps(left, top, right, bottom))
    }

    /// Random free position for a square of side `size`, or the fallback point
    pub fn find_spawn<R: Rng>(&self, rng: &mut R, size: f32) -> (f32, f32) {
        self.search(rng, size, size, SPAWN_ATTEMPTS)
            .unwrap_or(FALLBACK_SPAWN)
    }

    /// Random free position for an item, falling back to a player spawn point
    pub fn find_item_spawn<R: Rng>(&self, rng: &mut R, item_size: f32, player_size: f32) -> (f32, f32) {
        match self.search(rng, item_size, item_size + ITEM_CLEARANCE, ITEM_SPAWN_ATTEMPTS) {
            Some(pos) => pos,
            None => self.find_spawn(rng, player_size),
        }
    }

    fn search<R: Rng>(&self, rng: &mut R, size: f32, probe: f32, attempts: usize) -> Option<(f32, f32)> {
        let half = size / 2.0;
        let span_x = (self.world_width - size).max(0.0);
        let span_y = (self.world_height - size).max(0.0);

        (0..attempts).find_map(|_| {
            let x = half + rng.gen::<f32>() * span_x;
            let y = half + rng.gen::<f32>() * span_y;
            (!self.collides(x, y, probe)).then_some((x, y))
        })
    }
}
