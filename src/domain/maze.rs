/// Maze grid: tile topology, wall queries and pellet consumption.
///
/// Rows are hard-bounded: anything above or below the grid is a wall.
/// Columns wrap (tunnels), but `is_wall` does not wrap by itself;
/// callers wrap with `wrap_column` first. Helpers that take a pixel
/// position (`cell_at`, `is_wall_at_pixel`) wrap for you.

use glam::Vec2;
use thiserror::Error;

use super::entity::Direction;
use super::tile::Tile;

/// Search radius (in tiles) when snapping a spawn onto an open tile.
const OPEN_TILE_SEARCH_RADIUS: i32 = 6;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MazeError {
    #[error("maze has no rows")]
    Empty,
    #[error("maze row {row} is {found} columns wide, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("maze has no open tiles")]
    Sealed,
}

#[derive(Clone, Debug)]
pub struct Maze {
    pub width: usize,
    pub height: usize,
    pub tile_size: f32,
    tiles: Vec<Vec<Tile>>,
    /// Pristine layout, used to refill the maze for the next level.
    base: Vec<Vec<Tile>>,
}

/// Result of parsing maze text: the grid plus any spawn markers found.
#[derive(Clone, Debug)]
pub struct ParsedMaze {
    pub maze: Maze,
    pub player_spawn: Option<(i32, i32)>,
    pub ghost_homes: Vec<(i32, i32)>,
}

impl Maze {
    /// Parse maze text. `P` marks the player spawn, `G` a ghost home
    /// (both are floor); see `Tile::from_char` for the rest.
    pub fn parse(rows: &[&str], tile_size: f32) -> Result<ParsedMaze, MazeError> {
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        if width == 0 {
            return Err(MazeError::Empty);
        }

        let mut tiles = Vec::with_capacity(rows.len());
        let mut player_spawn = None;
        let mut ghost_homes = Vec::new();

        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(MazeError::Ragged { row: y, expected: width, found });
            }
            let mut line = Vec::with_capacity(width);
            for (x, ch) in row.chars().enumerate() {
                match ch {
                    'P' => player_spawn = Some((x as i32, y as i32)),
                    'G' => ghost_homes.push((x as i32, y as i32)),
                    _ => {}
                }
                line.push(Tile::from_char(ch));
            }
            tiles.push(line);
        }

        let maze = Maze {
            width,
            height: tiles.len(),
            tile_size,
            base: tiles.clone(),
            tiles,
        };
        Ok(ParsedMaze { maze, player_spawn, ghost_homes })
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<Tile> {
        if self.in_bounds(x, y) {
            Some(self.tiles[y as usize][x as usize])
        } else {
            None
        }
    }

    /// Out-of-range cells (either axis) are walls. Columns are not wrapped here.
    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.tile(x, y).map_or(true, Tile::is_wall)
    }

    /// Clear a pellet at (x, y). Returns (consumed, was_power).
    pub fn consume_pellet_at(&mut self, x: i32, y: i32) -> (bool, bool) {
        if !self.in_bounds(x, y) {
            return (false, false);
        }
        let tile = &mut self.tiles[y as usize][x as usize];
        if !tile.is_edible() {
            return (false, false);
        }
        let power = tile.is_power();
        *tile = Tile::Empty;
        (true, power)
    }

    pub fn wrap_column(&self, x: i32) -> i32 {
        x.rem_euclid(self.width as i32)
    }

    /// Neighbouring cell in `dir`, with the column wrapped.
    pub fn neighbour(&self, x: i32, y: i32, dir: Direction) -> (i32, i32) {
        let (dx, dy) = dir.delta();
        (self.wrap_column(x + dx), y + dy)
    }

    pub fn is_open_toward(&self, x: i32, y: i32, dir: Direction) -> bool {
        let (nx, ny) = self.neighbour(x, y, dir);
        !self.is_wall(nx, ny)
    }

    // ── Pixel space ──

    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * self.tile_size
    }

    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * self.tile_size
    }

    /// Grid cell containing a pixel position (column wrapped, row raw).
    pub fn cell_at(&self, pos: Vec2) -> (i32, i32) {
        let gx = (pos.x / self.tile_size).floor() as i32;
        let gy = (pos.y / self.tile_size).floor() as i32;
        (self.wrap_column(gx), gy)
    }

    pub fn cell_center(&self, x: i32, y: i32) -> Vec2 {
        let half = self.tile_size / 2.0;
        Vec2::new(
            x as f32 * self.tile_size + half,
            y as f32 * self.tile_size + half,
        )
    }

    pub fn is_wall_at_pixel(&self, pos: Vec2) -> bool {
        let (gx, gy) = self.cell_at(pos);
        self.is_wall(gx, gy)
    }

    /// Closest non-wall tile to (x, y), searching outward ring by ring.
    /// Falls back to (x, y) itself when nothing open is within range.
    pub fn nearest_open_tile(&self, x: i32, y: i32) -> (i32, i32) {
        if !self.is_wall(x, y) {
            return (x, y);
        }
        for r in 1..=OPEN_TILE_SEARCH_RADIUS {
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx.abs() != r && dy.abs() != r {
                        continue;
                    }
                    let (nx, ny) = (x + dx, y + dy);
                    if !self.is_wall(nx, ny) {
                        return (nx, ny);
                    }
                }
            }
        }
        (x, y)
    }

    /// First non-wall tile in row-major order.
    pub fn first_open_tile(&self) -> Option<(i32, i32)> {
        (0..self.height as i32)
            .flat_map(|y| (0..self.width as i32).map(move |x| (x, y)))
            .find(|&(x, y)| !self.is_wall(x, y))
    }

    // ── Level lifecycle ──

    pub fn pellets_remaining(&self) -> usize {
        self.tiles
            .iter()
            .flatten()
            .filter(|t| t.is_edible())
            .count()
    }

    /// Restore every pellet to the pristine layout.
    pub fn refill(&mut self) {
        self.tiles.clone_from(&self.base);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TILE: f32 = 16.0;

    pub(crate) fn maze_from(rows: &[&str]) -> Maze {
        match Maze::parse(rows, TILE) {
            Ok(parsed) => parsed.maze,
            Err(e) => panic!("bad test maze: {e}"),
        }
    }

    #[test]
    fn parse_reads_tiles_and_markers() {
        let parsed = Maze::parse(&["#.o#", "#PG#"], TILE).expect("parse");
        let m = &parsed.maze;
        assert_eq!((m.width, m.height), (4, 2));
        assert_eq!(m.tile(1, 0), Some(Tile::Pellet));
        assert_eq!(m.tile(2, 0), Some(Tile::PowerPellet));
        assert_eq!(m.tile(1, 1), Some(Tile::Empty));
        assert_eq!(parsed.player_spawn, Some((1, 1)));
        assert_eq!(parsed.ghost_homes, vec![(2, 1)]);
    }

    #[test]
    fn parse_rejects_empty_and_ragged() {
        assert_eq!(Maze::parse(&[], TILE).err(), Some(MazeError::Empty));
        assert_eq!(
            Maze::parse(&["###", "##"], TILE).err(),
            Some(MazeError::Ragged { row: 1, expected: 3, found: 2 })
        );
    }

    #[test]
    fn rows_outside_grid_are_walls() {
        let m = maze_from(&["   "]);
        assert!(!m.is_wall(1, 0));
        assert!(m.is_wall(1, -1));
        assert!(m.is_wall(1, 1));
    }

    #[test]
    fn is_wall_does_not_wrap_columns() {
        let m = maze_from(&["   "]);
        assert!(m.is_wall(-1, 0));
        assert!(m.is_wall(3, 0));
        assert!(!m.is_wall(m.wrap_column(-1), 0));
        assert_eq!(m.wrap_column(3), 0);
    }

    #[test]
    fn pellet_consumption_is_single_use() {
        let mut m = maze_from(&[".o "]);
        assert_eq!(m.consume_pellet_at(0, 0), (true, false));
        assert_eq!(m.consume_pellet_at(0, 0), (false, false));
        assert_eq!(m.consume_pellet_at(1, 0), (true, true));
        assert_eq!(m.consume_pellet_at(1, 0), (false, false));
        assert_eq!(m.consume_pellet_at(2, 0), (false, false));
        assert_eq!(m.consume_pellet_at(9, 0), (false, false));
        assert_eq!(m.consume_pellet_at(0, -1), (false, false));
    }

    #[test]
    fn refill_restores_pellets() {
        let mut m = maze_from(&["..o"]);
        m.consume_pellet_at(0, 0);
        m.consume_pellet_at(2, 0);
        assert_eq!(m.pellets_remaining(), 1);
        m.refill();
        assert_eq!(m.pellets_remaining(), 3);
    }

    #[test]
    fn cell_at_wraps_columns_and_floors() {
        let m = maze_from(&["    ", "    "]);
        assert_eq!(m.cell_at(Vec2::new(8.0, 8.0)), (0, 0));
        assert_eq!(m.cell_at(Vec2::new(-1.0, 20.0)), (3, 1));
        assert_eq!(m.cell_at(Vec2::new(64.0, 0.0)), (0, 0));
        assert_eq!(m.cell_center(1, 1), Vec2::new(24.0, 24.0));
    }

    #[test]
    fn nearest_open_tile_searches_rings() {
        let m = maze_from(&[
            "#####",
            "#####",
            "## ##",
        ]);
        assert_eq!(m.nearest_open_tile(2, 2), (2, 2));
        assert_eq!(m.nearest_open_tile(2, 1), (2, 2));
        assert_eq!(m.nearest_open_tile(2, 0), (2, 2));
    }

    #[test]
    fn nearest_open_tile_falls_back_to_request() {
        let m = maze_from(&["###"]);
        assert_eq!(m.nearest_open_tile(1, 0), (1, 0));
        assert_eq!(m.first_open_tile(), None);
    }

    #[test]
    fn first_open_tile_scans_rows() {
        let m = maze_from(&["###", "#.#"]);
        assert_eq!(m.first_open_tile(), Some((1, 1)));
    }
}
