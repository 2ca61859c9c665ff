/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and HUD feedback.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PelletEaten { x: i32, y: i32 },
    PowerPelletEaten { x: i32, y: i32 },
    FrightenedEnded,
    GhostEaten { id: usize, points: u32 },
    PlayerDied { lives_left: u32 },
    GameOver { score: u32 },
    /// First time this game's score passes the stored best.
    NewHighScore { score: u32 },
    LevelCleared { level: u32 },
}
