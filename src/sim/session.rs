/// SessionState: everything one running game owns.
///
/// Every subsystem receives the session explicitly; there is no global
/// state. The simulation mutates it in `step`, the renderer only reads it.
///
/// ## Lifecycle
///   NameEntry → Playing ⇄ (paused / leaderboard overlay) → GameOver
///   GameOver → Playing again via `new_game`, keeping the name and clock.

use crate::config::GameConfig;
use crate::domain::entity::{Direction, Ghost, GhostState, Player};
use crate::domain::maze::Maze;
use crate::domain::motion::Motion;
use crate::sim::clock::Clock;
use crate::sim::level::Layout;
use crate::sim::save::HighScoreRecord;

/// Longest accepted player name, in characters.
pub const MAX_NAME_LEN: usize = 12;
pub const DEFAULT_NAME: &str = "PLAYER";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    NameEntry,
    Playing,
    GameOver,
}

#[derive(Clone, Debug)]
pub struct SessionState {
    pub maze: Maze,
    pub player: Player,
    pub ghosts: Vec<Ghost>,
    pub player_spawn: (i32, i32),

    pub score: u32,
    pub lives: u32,
    pub level: u32,
    pub clock: Clock,
    /// Ghosts eaten in the current frightened window.
    pub combo: u32,

    /// Best score known to this session (stored or just set).
    pub high_score: u32,
    pub high_score_name: String,
    /// `NewHighScore` already reported for this game.
    pub high_score_announced: bool,

    pub player_name: String,
    pub phase: Phase,
    pub paused: bool,
    pub show_leaderboard: bool,
    /// First quit press shows the leaderboard; the second one exits.
    pub quit_armed: bool,
    pub leaderboard: Vec<HighScoreRecord>,

    pub player_motion: Motion,
    pub ghost_motion: Motion,
    pub frightened_ticks: u64,
    pub starting_lives: u32,
}

impl SessionState {
    pub fn new(layout: Layout, config: &GameConfig) -> Self {
        let speed = &config.speed;
        let tile = layout.maze.tile_size;
        let player_pos = layout.maze.cell_center(layout.player_spawn.0, layout.player_spawn.1);

        let ghosts = (0..config.game.ghosts)
            .map(|id| {
                let home = layout.ghost_home(id);
                Ghost::new(id, layout.maze.cell_center(home.0, home.1), home)
            })
            .collect();

        SessionState {
            player: Player::new(player_pos),
            ghosts,
            player_spawn: layout.player_spawn,
            maze: layout.maze,
            score: 0,
            lives: config.game.lives,
            level: 1,
            clock: Clock::new(),
            combo: 0,
            high_score: 0,
            high_score_name: String::new(),
            high_score_announced: false,
            player_name: String::new(),
            phase: Phase::NameEntry,
            paused: false,
            show_leaderboard: false,
            quit_armed: false,
            leaderboard: Vec::new(),
            player_motion: Motion::new(speed.player_step(), speed.turn_window, tile),
            ghost_motion: Motion::new(speed.ghost_step(), speed.turn_window, tile),
            frightened_ticks: speed.frightened_ticks,
            starting_lives: config.game.lives,
        }
    }

    pub fn is_frightened(&self) -> bool {
        self.clock.is_frightened()
    }

    pub fn player_cell(&self) -> (i32, i32) {
        self.maze.cell_at(self.player.pos)
    }

    /// Adopt a stored best as this session's high score.
    pub fn set_known_high_score(&mut self, best: Option<HighScoreRecord>) {
        if let Some(rec) = best {
            self.high_score = u32::try_from(rec.score).unwrap_or(u32::MAX);
            self.high_score_name = rec.name;
        }
    }

    /// Put the player and every ghost back on their spawn cells and end
    /// any frightened window. Pellets, score and lives are untouched.
    pub fn reset_positions(&mut self) {
        let (sx, sy) = self.player_spawn;
        self.player = Player::new(self.maze.cell_center(sx, sy));
        for g in &mut self.ghosts {
            g.pos = self.maze.cell_center(g.home.0, g.home.1);
            g.dir = Some(Direction::Left);
            g.state = GhostState::Normal;
        }
        self.clock.clear_frightened();
        self.combo = 0;
    }

    /// Send an eaten ghost back to the open tile nearest its home.
    pub fn send_home(&mut self, idx: usize) {
        let home = self.ghosts[idx].home;
        let (hx, hy) = self.maze.nearest_open_tile(home.0, home.1);
        let center = self.maze.cell_center(hx, hy);
        let g = &mut self.ghosts[idx];
        g.pos = center;
        g.dir = None;
        g.state = GhostState::Eaten;
    }

    /// Fresh game on a refilled maze. The tick clock keeps running.
    pub fn new_game(&mut self) {
        self.maze.refill();
        self.reset_positions();
        self.score = 0;
        self.lives = self.starting_lives;
        self.level = 1;
        self.high_score_announced = false;
        self.paused = false;
        self.show_leaderboard = false;
        self.quit_armed = false;
        self.phase = Phase::Playing;
    }

    // ── Name entry ──

    /// Append a typed character if it is allowed and the name has room.
    pub fn push_name_char(&mut self, ch: char) -> bool {
        let allowed = ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '_' | '-');
        if !allowed || self.player_name.chars().count() >= MAX_NAME_LEN {
            return false;
        }
        self.player_name.push(ch);
        true
    }

    pub fn pop_name_char(&mut self) {
        self.player_name.pop();
    }

    /// Finish name entry and start playing.
    pub fn confirm_name(&mut self) {
        let trimmed = self.player_name.trim();
        self.player_name = if trimmed.is_empty() {
            DEFAULT_NAME.to_string()
        } else {
            trimmed.to_string()
        };
        self.phase = Phase::Playing;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use glam::Vec2;
    use crate::sim::level::{default_layout, parse_maze_text};

    pub(crate) fn session_from(text: &str) -> SessionState {
        let layout = parse_maze_text(text).unwrap();
        let mut s = SessionState::new(layout, &GameConfig::default());
        s.phase = Phase::Playing;
        s
    }

    pub(crate) fn ghost_spawn_pos(s: &SessionState, idx: usize) -> Vec2 {
        let (hx, hy) = s.ghosts[idx].home;
        s.maze.cell_center(hx, hy)
    }

    #[test]
    fn new_session_spawns_default_cast() {
        let s = SessionState::new(default_layout().unwrap(), &GameConfig::default());
        assert_eq!(s.ghosts.len(), 4);
        assert_eq!(s.lives, 3);
        assert_eq!(s.phase, Phase::NameEntry);
        assert_eq!(s.player.pos, Vec2::new(13.0 * 16.0 + 8.0, 23.0 * 16.0 + 8.0));
        assert_eq!(s.player_motion.step, 12.0);
        assert_eq!(s.ghost_motion.step, 10.5);
        assert!(s.ghosts.iter().all(|g| g.dir == Some(Direction::Left)));
    }

    #[test]
    fn reset_positions_clears_frightened_and_combo() {
        let mut s = session_from("#####\n#P G#\n#####");
        s.player.pos = Vec2::new(40.0, 24.0);
        s.ghosts[0].state = GhostState::Eaten;
        s.ghosts[0].dir = None;
        s.clock.frighten(50);
        s.combo = 3;
        s.reset_positions();
        assert_eq!(s.player.pos, Vec2::new(24.0, 24.0));
        assert_eq!(s.ghosts[0].pos, ghost_spawn_pos(&s, 0));
        assert_eq!(s.ghosts[0].state, GhostState::Normal);
        assert_eq!(s.ghosts[0].dir, Some(Direction::Left));
        assert!(!s.is_frightened());
        assert_eq!(s.combo, 0);
    }

    #[test]
    fn send_home_marks_ghost_eaten() {
        let mut s = session_from("#####\n#P G#\n#####");
        s.ghosts[1].pos = Vec2::new(24.0, 24.0);
        s.send_home(1);
        assert_eq!(s.ghosts[1].state, GhostState::Eaten);
        assert_eq!(s.ghosts[1].dir, None);
        assert_eq!(s.ghosts[1].pos, Vec2::new(56.0, 24.0));
    }

    #[test]
    fn name_entry_filters_and_caps() {
        let mut s = session_from("###\n#P#\n###");
        for ch in "Ann_B-3 !?".chars() {
            s.push_name_char(ch);
        }
        assert_eq!(s.player_name, "Ann_B-3 ");
        for _ in 0..20 {
            s.push_name_char('x');
        }
        assert_eq!(s.player_name.chars().count(), MAX_NAME_LEN);
        s.pop_name_char();
        assert_eq!(s.player_name.chars().count(), MAX_NAME_LEN - 1);
    }

    #[test]
    fn empty_name_becomes_default() {
        let mut s = session_from("###\n#P#\n###");
        s.phase = Phase::NameEntry;
        s.player_name = "   ".into();
        s.confirm_name();
        assert_eq!(s.player_name, DEFAULT_NAME);
        assert_eq!(s.phase, Phase::Playing);
    }

    #[test]
    fn stored_high_score_is_adopted() {
        let mut s = session_from("###\n#P#\n###");
        s.set_known_high_score(Some(HighScoreRecord { name: "Zed".into(), score: 900 }));
        assert_eq!((s.high_score, s.high_score_name.as_str()), (900, "Zed"));
        s.set_known_high_score(None);
        assert_eq!(s.high_score, 900);
    }

    #[test]
    fn new_game_restores_lives_and_pellets() {
        let mut s = session_from("#####\n#P..#\n#####");
        s.maze.consume_pellet_at(2, 1);
        s.lives = 0;
        s.score = 500;
        s.phase = Phase::GameOver;
        s.new_game();
        assert_eq!(s.maze.pellets_remaining(), 2);
        assert_eq!((s.lives, s.score, s.level), (3, 0, 1));
        assert_eq!(s.phase, Phase::Playing);
    }
}
