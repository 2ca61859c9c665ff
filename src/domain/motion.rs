/// Motion model: continuous pixel movement constrained by the tile grid.
///
/// Entities travel `step` pixels per tick along one axis. They may only
/// change heading near a cell center (the turn window), and a committed
/// turn snaps the perpendicular coordinate onto the center so drift never
/// accumulates. Forward moves are validated against the four corners of
/// the entity footprint; a blocked move leaves the entity stationary.
///
///   - Turn window: `turn_factor * step`, never below half a step, so an
///     entity sitting on a center can turn the same tick input arrives.
///   - Footprint: a square of half-extent `tile/2 - FOOTPRINT_INSET`.
///   - X wraps over the maze pixel width (tunnels). Y never wraps.

use glam::Vec2;

use super::entity::Direction;
use super::maze::Maze;

/// Pixels between the footprint edge and the tile edge.
pub const FOOTPRINT_INSET: f32 = 1.0;

/// Smallest allowed turn window, as a fraction of the per-tick step.
pub const MIN_TURN_FACTOR: f32 = 0.5;

/// Per-entity movement parameters for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    /// Pixels travelled per tick.
    pub step: f32,
    /// Alignment threshold in pixels.
    pub turn_window: f32,
    pub half_extent: f32,
    turn_factor: f32,
}

impl Motion {
    pub fn new(step: f32, turn_factor: f32, tile_size: f32) -> Self {
        let turn_factor = turn_factor.max(MIN_TURN_FACTOR);
        Motion {
            step,
            turn_window: step * turn_factor,
            half_extent: tile_size / 2.0 - FOOTPRINT_INSET,
            turn_factor,
        }
    }

    /// Same entity at a different speed; the turn window scales along.
    pub fn with_step(self, step: f32) -> Self {
        Motion {
            step,
            turn_window: step * self.turn_factor,
            ..self
        }
    }
}

/// Vector from `pos` to the center of the cell containing it.
pub fn offset_to_center(maze: &Maze, pos: Vec2) -> Vec2 {
    let (gx, gy) = maze.cell_at(pos);
    maze.cell_center(gx, gy) - pos
}

/// Within the turn window of the cell center on both axes.
pub fn is_aligned(maze: &Maze, pos: Vec2, motion: &Motion) -> bool {
    let off = offset_to_center(maze, pos);
    off.x.abs() <= motion.turn_window && off.y.abs() <= motion.turn_window
}

pub fn snap_to_center(maze: &Maze, pos: Vec2) -> Vec2 {
    let (gx, gy) = maze.cell_at(pos);
    maze.cell_center(gx, gy)
}

/// Snap only the coordinate perpendicular to `dir` onto the cell center.
/// Progress along `dir` is kept.
pub fn snap_across(maze: &Maze, pos: Vec2, dir: Direction) -> Vec2 {
    let center = snap_to_center(maze, pos);
    if dir.is_vertical() {
        Vec2::new(center.x, pos.y)
    } else {
        Vec2::new(pos.x, center.y)
    }
}

/// Wrap a horizontal pixel coordinate into [0, width).
pub fn wrap_x(x: f32, width: f32) -> f32 {
    let wrapped = x.rem_euclid(width);
    // rem_euclid can round up to `width` for tiny negative inputs.
    if wrapped >= width { 0.0 } else { wrapped }
}

/// Keep a position inside the vertical pixel bounds of the maze.
pub fn clamp_row(maze: &Maze, pos: Vec2) -> Vec2 {
    let half = maze.tile_size / 2.0;
    let max = maze.pixel_height() - half;
    Vec2::new(pos.x, pos.y.clamp(half, max.max(half)))
}

/// No footprint corner of an entity centred at `pos` touches a wall.
pub fn footprint_clear(maze: &Maze, pos: Vec2, half_extent: f32) -> bool {
    let h = half_extent;
    [
        Vec2::new(-h, -h),
        Vec2::new(h, -h),
        Vec2::new(-h, h),
        Vec2::new(h, h),
    ]
    .iter()
    .all(|corner| !maze.is_wall_at_pixel(pos + *corner))
}

/// Try to commit `desired` as the new heading.
///
/// The turn goes through when the neighbouring cell is open and either
/// the perpendicular offset to the cell center is inside the turn window,
/// or this tick's travel would carry the entity across that center.
/// A reversal back toward the current cell's center is always open.
/// On success the perpendicular coordinate is snapped onto the center.
/// Returns the heading to use this tick.
pub fn resolve_turn(
    maze: &Maze,
    pos: &mut Vec2,
    current: Option<Direction>,
    desired: Option<Direction>,
    motion: &Motion,
) -> Option<Direction> {
    let want = match desired {
        Some(d) if Some(d) != current => d,
        _ => return current,
    };

    let (gx, gy) = maze.cell_at(*pos);
    let back_to_center = current == Some(want.opposite())
        && offset_to_center(maze, *pos).dot(want.unit()) > 0.0;
    if !back_to_center && !maze.is_open_toward(gx, gy, want) {
        return current;
    }

    let center = maze.cell_center(gx, gy);
    let offset = if want.is_vertical() {
        center.x - pos.x
    } else {
        center.y - pos.y
    };

    let crossing = current.is_some_and(|cur| {
        if cur.is_vertical() == want.is_vertical() {
            return false;
        }
        let u = cur.unit();
        let travel = if cur.is_vertical() { u.y } else { u.x } * motion.step;
        let after = offset - travel;
        offset != 0.0 && (after == 0.0 || after.signum() != offset.signum())
    });

    if offset.abs() > motion.turn_window && !crossing {
        return current;
    }

    *pos = snap_across(maze, *pos, want);
    Some(want)
}

/// Move one step along `dir`.
///
/// When the destination footprint hits a wall the heading is dropped; the
/// entity settles onto its cell center if that center is still ahead of
/// it, otherwise it stays exactly where it was.
pub fn advance(
    maze: &Maze,
    pos: &mut Vec2,
    dir: Option<Direction>,
    motion: &Motion,
) -> Option<Direction> {
    let d = dir?;
    let unit = d.unit();
    let next = *pos + unit * motion.step;

    if footprint_clear(maze, next, motion.half_extent) {
        *pos = Vec2::new(wrap_x(next.x, maze.pixel_width()), next.y);
        return Some(d);
    }

    let ahead = offset_to_center(maze, *pos).dot(unit);
    if ahead > 0.0 {
        *pos += unit * ahead;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::maze::tests::{maze_from, TILE};
    use proptest::prelude::*;

    fn player_motion() -> Motion {
        Motion::new(12.0, 0.5, TILE)
    }

    fn center(x: i32, y: i32) -> Vec2 {
        Vec2::new(x as f32 * TILE + 8.0, y as f32 * TILE + 8.0)
    }

    // ── Alignment ──

    #[test]
    fn turn_window_never_below_half_step() {
        let m = Motion::new(12.0, 0.1, TILE);
        assert_eq!(m.turn_window, 6.0);
        assert_eq!(m.with_step(6.0).turn_window, 3.0);
        assert_eq!(m.half_extent, 7.0);
    }

    #[test]
    fn aligned_within_window_on_both_axes() {
        let maze = maze_from(&["   ", "   "]);
        let m = player_motion();
        assert!(is_aligned(&maze, center(1, 1), &m));
        assert!(is_aligned(&maze, center(1, 1) + Vec2::new(6.0, -6.0), &m));
        assert!(!is_aligned(&maze, center(1, 1) + Vec2::new(6.5, 0.0), &m));
    }

    // ── Turning ──

    #[test]
    fn turn_from_center_commits_same_tick() {
        let maze = maze_from(&[
            "# #",
            "   ",
            "###",
        ]);
        let mut pos = center(1, 1);
        let dir = resolve_turn(&maze, &mut pos, Some(Direction::Right), Some(Direction::Up), &player_motion());
        assert_eq!(dir, Some(Direction::Up));
        assert_eq!(pos, center(1, 1));
    }

    #[test]
    fn turn_into_wall_is_ignored() {
        let maze = maze_from(&[
            "###",
            "   ",
            "###",
        ]);
        let mut pos = center(1, 1);
        let dir = resolve_turn(&maze, &mut pos, Some(Direction::Right), Some(Direction::Up), &player_motion());
        assert_eq!(dir, Some(Direction::Right));
    }

    #[test]
    fn turn_inside_window_snaps_perpendicular_axis() {
        let maze = maze_from(&[
            "# #",
            "   ",
            "###",
        ]);
        let mut pos = center(1, 1) + Vec2::new(5.0, 0.0);
        let dir = resolve_turn(&maze, &mut pos, Some(Direction::Right), Some(Direction::Up), &player_motion());
        assert_eq!(dir, Some(Direction::Up));
        assert_eq!(pos, center(1, 1));
    }

    #[test]
    fn turn_outside_window_waits_unless_crossing() {
        let maze = maze_from(&[
            "# #",
            "   ",
            "###",
        ]);
        // Past the center and moving away from it: no crossing.
        let mut pos = center(1, 1) + Vec2::new(7.0, 0.0);
        let m = Motion::new(16.0, 0.1, TILE);
        let mut fast = m;
        fast.turn_window = 2.0;
        let dir = resolve_turn(&maze, &mut pos, Some(Direction::Right), Some(Direction::Up), &fast);
        assert_eq!(dir, Some(Direction::Right));

        // Before the center, about to cross it this tick.
        let mut pos = center(1, 1) - Vec2::new(7.0, 0.0);
        let dir = resolve_turn(&maze, &mut pos, Some(Direction::Right), Some(Direction::Up), &fast);
        assert_eq!(dir, Some(Direction::Up));
        assert_eq!(pos.x, center(1, 1).x);
    }

    #[test]
    fn reversal_is_immediate() {
        let maze = maze_from(&["    "]);
        let mut pos = center(1, 0) + Vec2::new(3.0, 0.0);
        let dir = resolve_turn(&maze, &mut pos, Some(Direction::Right), Some(Direction::Left), &player_motion());
        assert_eq!(dir, Some(Direction::Left));
        assert_eq!(pos, center(1, 0) + Vec2::new(3.0, 0.0));
    }

    #[test]
    fn reversal_past_center_returns_even_with_wall_behind() {
        let maze = maze_from(&["#   "]);
        let m = player_motion();
        let mut pos = center(1, 0) + Vec2::new(3.0, 0.0);
        let dir = resolve_turn(&maze, &mut pos, Some(Direction::Right), Some(Direction::Left), &m);
        assert_eq!(dir, Some(Direction::Left));

        let dir = advance(&maze, &mut pos, dir, &m);
        assert_eq!(dir, None);
        assert_eq!(pos, center(1, 0));

        // Sitting on the center, the wall really is in the way.
        let dir = resolve_turn(&maze, &mut pos, Some(Direction::Right), Some(Direction::Left), &m);
        assert_eq!(dir, Some(Direction::Right));
    }

    #[test]
    fn snap_across_keeps_progress_along_heading() {
        let maze = maze_from(&["   ", "   "]);
        let pos = center(1, 1) + Vec2::new(4.0, -3.0);
        assert_eq!(snap_across(&maze, pos, Direction::Right), center(1, 1) + Vec2::new(4.0, 0.0));
        assert_eq!(snap_across(&maze, pos, Direction::Up), center(1, 1) + Vec2::new(0.0, -3.0));
    }

    // ── Forward motion ──

    #[test]
    fn advance_moves_one_step() {
        let maze = maze_from(&["    "]);
        let mut pos = center(0, 0);
        let dir = advance(&maze, &mut pos, Some(Direction::Right), &player_motion());
        assert_eq!(dir, Some(Direction::Right));
        assert_eq!(pos, center(0, 0) + Vec2::new(12.0, 0.0));
    }

    #[test]
    fn advance_into_wall_from_center_stays_put() {
        let maze = maze_from(&[" # "]);
        let mut pos = center(0, 0);
        let dir = advance(&maze, &mut pos, Some(Direction::Right), &player_motion());
        assert_eq!(dir, None);
        assert_eq!(pos, center(0, 0));
    }

    #[test]
    fn advance_blocked_before_center_settles_on_center() {
        let maze = maze_from(&["  #"]);
        let mut pos = center(1, 0) - Vec2::new(4.0, 0.0);
        let dir = advance(&maze, &mut pos, Some(Direction::Right), &player_motion());
        assert_eq!(dir, None);
        assert_eq!(pos, center(1, 0));
    }

    #[test]
    fn advance_without_direction_is_noop() {
        let maze = maze_from(&["  "]);
        let mut pos = center(0, 0);
        assert_eq!(advance(&maze, &mut pos, None, &player_motion()), None);
        assert_eq!(pos, center(0, 0));
    }

    #[test]
    fn vertical_edge_is_a_wall() {
        let maze = maze_from(&["   "]);
        let mut pos = center(1, 0);
        assert_eq!(advance(&maze, &mut pos, Some(Direction::Up), &player_motion()), None);
        assert_eq!(pos, center(1, 0));
    }

    // ── Tunnel ──

    #[test]
    fn tunnel_wraps_left_edge_to_right_edge() {
        let maze = maze_from(&["    "]);
        let mut pos = center(0, 0);
        advance(&maze, &mut pos, Some(Direction::Left), &player_motion());
        assert_eq!(pos.x, 64.0 - 4.0);
    }

    #[test]
    fn clamp_row_keeps_ghosts_inside() {
        let maze = maze_from(&["  ", "  "]);
        assert_eq!(clamp_row(&maze, Vec2::new(3.0, -5.0)).y, 8.0);
        assert_eq!(clamp_row(&maze, Vec2::new(3.0, 99.0)).y, 24.0);
    }

    // ── Properties ──

    proptest! {
        #[test]
        fn wrap_x_lands_in_range_and_preserves_offset(x in -2000.0f32..2000.0) {
            let w = 448.0;
            let wrapped = wrap_x(x, w);
            prop_assert!((0.0..w).contains(&wrapped));
            let turns = (x - wrapped) / w;
            prop_assert!((turns - turns.round()).abs() < 1e-3);
        }

        #[test]
        fn repeated_tunnel_crossings_preserve_displacement(ticks in 1usize..200) {
            let maze = maze_from(&["        "]);
            let m = player_motion();
            let start = center(3, 0);
            let mut pos = start;
            for _ in 0..ticks {
                advance(&maze, &mut pos, Some(Direction::Left), &m);
            }
            let expected = wrap_x(start.x - ticks as f32 * m.step, maze.pixel_width());
            prop_assert!((pos.x - expected).abs() < 1e-2);
            prop_assert_eq!(pos.y, start.y);
        }

        #[test]
        fn entities_never_end_inside_walls(
            moves in proptest::collection::vec(0usize..4, 1..120),
        ) {
            let maze = maze_from(&[
                "#########",
                "#   #   #",
                "# # # # #",
                "         ",
                "# ##### #",
                "#       #",
                "#########",
            ]);
            let m = player_motion();
            let mut pos = center(1, 1);
            let mut dir = None;
            for pick in moves {
                let desired = Some(Direction::ALL[pick]);
                dir = resolve_turn(&maze, &mut pos, dir, desired, &m);
                let before = pos;
                let blocked_from_center = dir.is_some_and(|d| {
                    pos == snap_to_center(&maze, pos)
                        && !footprint_clear(&maze, pos + d.unit() * m.step, m.half_extent)
                });
                dir = advance(&maze, &mut pos, dir, &m);
                prop_assert!(footprint_clear(&maze, pos, m.half_extent));
                if blocked_from_center {
                    prop_assert_eq!(pos, before);
                }
            }
        }
    }
}
