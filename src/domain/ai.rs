/// Ghost AI: local, greedy direction choice made at cell centers.
///
/// Three modes, derived each tick from the session's frightened timer and
/// the ghost's own state:
///   1. **Wander** (Normal): random among open directions, never
///      reversing unless it is a dead end.
///   2. **Flee** (Normal, frightened): the open neighbour farthest from
///      the player's cell.
///   3. **Recover** (Eaten): wanders back into play at full speed.
///
/// No search, no lookahead. Randomness comes from the caller's `Rng`,
/// so a seeded generator makes every choice reproducible.

use rand::seq::IndexedRandom;
use rand::Rng;

use super::entity::{reversed, Direction, GhostState};
use super::maze::Maze;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GhostMode {
    Wander,
    Flee,
    Recover,
}

impl GhostMode {
    pub fn of(state: GhostState, frightened: bool) -> GhostMode {
        match (state, frightened) {
            (GhostState::Eaten, _) => GhostMode::Recover,
            (GhostState::Normal, true) => GhostMode::Flee,
            (GhostState::Normal, false) => GhostMode::Wander,
        }
    }
}

/// Pick a heading for a ghost standing on the center of `cell`.
pub fn choose_direction<R: Rng + ?Sized>(
    maze: &Maze,
    cell: (i32, i32),
    current: Option<Direction>,
    mode: GhostMode,
    player_cell: (i32, i32),
    rng: &mut R,
) -> Direction {
    match mode {
        GhostMode::Flee => flee_direction(maze, cell, player_cell)
            .unwrap_or_else(|| wander_direction(maze, cell, current, rng)),
        GhostMode::Wander | GhostMode::Recover => wander_direction(maze, cell, current, rng),
    }
}

// ── Wander ──

/// Uniform choice among open directions other than the reversal.
/// Dead ends allow the reversal; a fully enclosed cell falls back to Left.
pub fn wander_direction<R: Rng + ?Sized>(
    maze: &Maze,
    (x, y): (i32, i32),
    current: Option<Direction>,
    rng: &mut R,
) -> Direction {
    let back = reversed(current);
    let eligible: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|&d| current.is_none() || d != back)
        .filter(|&d| maze.is_open_toward(x, y, d))
        .collect();

    if let Some(&d) = eligible.choose(rng) {
        return d;
    }
    if maze.is_open_toward(x, y, back) {
        return back;
    }
    Direction::Left
}

// ── Flee ──

/// Open neighbour maximising squared grid distance to the player.
/// Candidates are tried Up, Down, Left, Right; the first maximum wins.
pub fn flee_direction(
    maze: &Maze,
    (x, y): (i32, i32),
    (px, py): (i32, i32),
) -> Option<Direction> {
    let mut best: Option<(Direction, i64)> = None;
    for d in Direction::ALL {
        if !maze.is_open_toward(x, y, d) {
            continue;
        }
        let (nx, ny) = maze.neighbour(x, y, d);
        let (dx, dy) = ((nx - px) as i64, (ny - py) as i64);
        let dist = dx * dx + dy * dy;
        if best.map_or(true, |(_, b)| dist > b) {
            best = Some((d, dist));
        }
    }
    best.map(|(d, _)| d)
}
