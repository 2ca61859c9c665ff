/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Empty,
    Wall,
    Pellet,
    PowerPellet,
}

impl Tile {
    /// Map a maze text character to a tile.
    /// Spawn markers and unknown characters are floor.
    pub fn from_char(ch: char) -> Tile {
        match ch {
            '#' => Tile::Wall,
            '.' => Tile::Pellet,
            'o' => Tile::PowerPellet,
            _ => Tile::Empty,
        }
    }

    pub fn is_wall(self) -> bool {
        matches!(self, Tile::Wall)
    }

    /// Can the player eat this tile?
    pub fn is_edible(self) -> bool {
        matches!(self, Tile::Pellet | Tile::PowerPellet)
    }

    pub fn is_power(self) -> bool {
        matches!(self, Tile::PowerPellet)
    }
}
