/// Maze layouts: the built-in maze and optional maze files.
///
/// ## Sources (priority order):
///   1. `game.maze_file` from config.toml, if set and valid
///   2. Built-in classic maze
///
/// ## Tile legend:
///   '#' = Wall          '.' = Pellet        'o' = Power pellet
///   'P' = Player spawn  'G' = Ghost home    anything else = Empty
///
/// Lines starting with `;` are comments. Trailing blank lines are ignored,
/// every other row must be the same width. Files without markers get the
/// classic spawn cells, snapped onto the nearest open tile.

use std::path::Path;

use crate::config::GameConfig;
use crate::domain::maze::{Maze, MazeError, ParsedMaze};

/// Pixel size of one maze tile.
pub const TILE_SIZE: f32 = 16.0;

pub const DEFAULT_PLAYER_SPAWN: (i32, i32) = (13, 23);
pub const DEFAULT_GHOST_HOMES: [(i32, i32); 4] = [(13, 14), (14, 14), (13, 15), (14, 15)];

#[rustfmt::skip]
pub const DEFAULT_MAZE: [&str; 31] = [
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o####.#####.##.#####.####o#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##.########.##.####.#",
    "#.####.##.########.##.####.#",
    "#......##....##....##......#",
    "######.##### ## #####.######",
    "     #.##### ## #####.#     ",
    "     #.##          ##.#     ",
    "     #.## ###--### ##.#     ",
    "######.## #      # ##.######",
    "      .   #  GG  #   .      ",
    "######.## #  GG  # ##.######",
    "     #.## ######## ##.#     ",
    "     #.##          ##.#     ",
    "     #.## ######## ##.#     ",
    "######.## ######## ##.######",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#.####.#####.##.#####.####.#",
    "#o..##.......P .......##..o#",
    "###.##.##.########.##.##.###",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.##.##########.#",
    "#.##########.##.##########.#",
    "#..........................#",
    "############################",
];

/// A playable maze with resolved spawn cells.
#[derive(Clone, Debug)]
pub struct Layout {
    pub maze: Maze,
    pub player_spawn: (i32, i32),
    /// At least one entry; ghosts cycle through them.
    pub ghost_homes: Vec<(i32, i32)>,
}

impl Layout {
    /// Resolve markers, filling in classic spawn cells where missing.
    pub fn from_parsed(parsed: ParsedMaze) -> Result<Layout, MazeError> {
        let ParsedMaze { maze, player_spawn, ghost_homes } = parsed;
        let fallback = maze.first_open_tile().ok_or(MazeError::Sealed)?;

        let snap = |(x, y): (i32, i32)| {
            let cell = maze.nearest_open_tile(x, y);
            if maze.is_wall(cell.0, cell.1) { fallback } else { cell }
        };

        let player_spawn = snap(player_spawn.unwrap_or(DEFAULT_PLAYER_SPAWN));
        let ghost_homes: Vec<(i32, i32)> = if ghost_homes.is_empty() {
            DEFAULT_GHOST_HOMES.iter().copied().map(snap).collect()
        } else {
            ghost_homes
        };

        Ok(Layout { maze, player_spawn, ghost_homes })
    }

    /// Home cell for the ghost with index `id`.
    pub fn ghost_home(&self, id: usize) -> (i32, i32) {
        self.ghost_homes[id % self.ghost_homes.len()]
    }
}

pub fn default_layout() -> Result<Layout, MazeError> {
    Layout::from_parsed(Maze::parse(&DEFAULT_MAZE, TILE_SIZE)?)
}

/// Parse maze file contents.
pub fn parse_maze_text(text: &str) -> Result<Layout, MazeError> {
    let mut rows: Vec<&str> = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.starts_with(';'))
        .collect();
    while rows.last().is_some_and(|l| l.trim().is_empty()) {
        rows.pop();
    }
    Layout::from_parsed(Maze::parse(&rows, TILE_SIZE)?)
}

/// Layout for a new session. A broken maze file is reported and skipped.
pub fn load_layout(config: &GameConfig) -> Result<Layout, MazeError> {
    if let Some(path) = &config.game.maze_file {
        match load_maze_file(path) {
            Ok(layout) => {
                log::info!("loaded maze {}", path.display());
                return Ok(layout);
            }
            Err(e) => log::warn!("maze file {}: {e}; using built-in maze", path.display()),
        }
    }
    default_layout()
}

fn load_maze_file(path: &Path) -> Result<Layout, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_maze_text(&text)?)
}
