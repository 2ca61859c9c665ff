/// Game rules: scoring values and encounter geometry.
///
/// Pure functions only. The session decides *when* these apply;
/// this module decides *how much* and *whether*.

use glam::Vec2;

pub const PELLET_POINTS: u32 = 10;
pub const POWER_PELLET_POINTS: u32 = 50;

/// First ghost eaten in a frightened window.
pub const GHOST_BASE_POINTS: u32 = 200;
/// Ceiling for the doubling combo (200, 400, 800, 1600, 1600, ...).
pub const GHOST_MAX_POINTS: u32 = 1600;

/// Distance from the tile edge to an entity's collision circle.
const COLLISION_INSET: f32 = 2.0;

/// Points for eating a ghost when `combo` ghosts were already eaten
/// in the current frightened window.
pub fn ghost_points(combo: u32) -> u32 {
    let mut points = GHOST_BASE_POINTS;
    for _ in 0..combo {
        if points >= GHOST_MAX_POINTS {
            break;
        }
        points = points.saturating_mul(2);
    }
    points.min(GHOST_MAX_POINTS)
}

/// Collision radius shared by player and ghosts.
pub fn collision_radius(tile_size: f32) -> f32 {
    tile_size / 2.0 - COLLISION_INSET
}

/// Circles of radius `ra` and `rb` touch or overlap.
pub fn collides(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) <= reach * reach
}
