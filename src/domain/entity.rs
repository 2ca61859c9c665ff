/// Entities: Player and Ghost, plus the shared direction type.
/// Positions are continuous pixel coordinates; the grid cell an entity
/// occupies is derived from its position, never stored.

use glam::Vec2;

/// Axis-aligned movement direction.
/// "No direction" is expressed as `Option<Direction>::None` at use sites.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Candidate order for ghost policies. Flee tie-breaking depends on it.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Grid step (dx, dy). Screen coordinates: +y is down.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn unit(self) -> Vec2 {
        let (dx, dy) = self.delta();
        Vec2::new(dx as f32, dy as f32)
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }
}

/// Reverse a possibly-stationary heading. A stationary entity is sent Left.
pub fn reversed(dir: Option<Direction>) -> Direction {
    dir.map_or(Direction::Left, Direction::opposite)
}

/// Frame input: the direction the player is steering toward this tick.
/// Meta keys (pause, quit, leaderboard) never reach the simulation.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub direction: Option<Direction>,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Vec2,
    pub dir: Option<Direction>,
    /// Queued turn; committed by the motion model when the maze allows it.
    pub desired: Option<Direction>,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Player {
            pos,
            dir: None,
            desired: None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GhostState {
    Normal,
    /// Eaten during the current frightened window; recovering at home.
    Eaten,
}

#[derive(Clone, Debug)]
pub struct Ghost {
    pub id: usize,
    pub pos: Vec2,
    pub dir: Option<Direction>,
    pub state: GhostState,
    /// Grid cell the ghost returns to when eaten or on reset.
    pub home: (i32, i32),
}

impl Ghost {
    pub fn new(id: usize, pos: Vec2, home: (i32, i32)) -> Self {
        Ghost {
            id,
            pos,
            dir: Some(Direction::Left),
            state: GhostState::Normal,
            home,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for d in Direction::ALL {
            assert_ne!(d.opposite(), d);
            assert_eq!(d.opposite().opposite(), d);
            assert_eq!(d.opposite().is_vertical(), d.is_vertical());
        }
    }

    #[test]
    fn delta_matches_screen_axes() {
        assert_eq!(Direction::Up.delta(), (0, -1));
        assert_eq!(Direction::Right.unit(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn reversing_no_direction_picks_left() {
        assert_eq!(reversed(None), Direction::Left);
        assert_eq!(reversed(Some(Direction::Up)), Direction::Down);
    }

    #[test]
    fn new_ghost_starts_normal_heading_left() {
        let g = Ghost::new(2, Vec2::new(8.0, 8.0), (0, 0));
        assert_eq!(g.state, GhostState::Normal);
        assert_eq!(g.dir, Some(Direction::Left));
    }
}
