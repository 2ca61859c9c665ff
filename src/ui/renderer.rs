/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The renderer only reads the session; it never changes game state.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Direction, Ghost, GhostState};
use crate::domain::tile::Tile;
use crate::sim::session::{Phase, SessionState, MAX_NAME_LEN};

/// Frightened ghosts flash white during this many final ticks of the window.
const FLASH_TICKS: u64 = 120;
/// Ticks per flash half-period.
const FLASH_PERIOD: u64 = 10;

const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const WALL: Color = Color::Rgb { r: 40, g: 60, b: 200 };
const PELLET: Color = Color::Rgb { r: 255, g: 200, b: 170 };
const PLAYER: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const FRIGHTENED: Color = Color::Rgb { r: 60, g: 90, b: 255 };

const GHOST_COLORS: [Color; 4] = [
    Color::Rgb { r: 255, g: 50, b: 50 },   // red
    Color::Rgb { r: 255, g: 150, b: 200 }, // pink
    Color::Rgb { r: 60, g: 220, b: 255 },  // cyan
    Color::Rgb { r: 255, g: 170, b: 60 },  // orange
];

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }

    fn fill_box(&mut self, x0: usize, y0: usize, w: usize, h: usize, bg: Color) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                self.set(x, y, Cell::new(' ', Color::White, bg));
            }
        }
    }
}

// ── Pure presentation helpers ──

/// Each maze tile is two terminal columns wide.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

fn tile_glyph(tile: Tile) -> (&'static str, Color, Color) {
    match tile {
        Tile::Wall => ("  ", WALL, WALL),
        Tile::Pellet => (" ·", PELLET, BASE_BG),
        Tile::PowerPellet => (" ●", PELLET, BASE_BG),
        Tile::Empty => ("  ", Color::White, BASE_BG),
    }
}

fn player_glyph(dir: Option<Direction>) -> &'static str {
    match dir {
        Some(Direction::Left) => "ᗤ ",
        Some(Direction::Up) => "ᗢ ",
        Some(Direction::Down) => "ᗣ ",
        Some(Direction::Right) | None => "ᗧ ",
    }
}

/// Glyph and color for a ghost, given the session's frightened window.
fn ghost_look(s: &SessionState, g: &Ghost) -> (&'static str, Color) {
    if g.state == GhostState::Eaten {
        return ("°°", Color::White);
    }
    if !s.is_frightened() {
        return ("ᗝ ", GHOST_COLORS[g.id % GHOST_COLORS.len()]);
    }
    let left = s.clock.frightened_remaining();
    let flash = left <= FLASH_TICKS && (left / FLASH_PERIOD) % 2 == 0;
    ("ᗝ ", if flash { Color::White } else { FRIGHTENED })
}

fn hud_line(s: &SessionState, tick_rate_hz: u32) -> String {
    let lives = "♥".repeat(s.lives.min(9) as usize);
    let mut hud = format!(
        " SCORE {:<7} HI {:<7} {:<12} LIVES {:<9} LEVEL {}",
        s.score, s.high_score, s.high_score_name, lives, s.level,
    );
    if s.is_frightened() {
        let secs = s.clock.frightened_remaining() as f64 / f64::from(tick_rate_hz.max(1));
        hud.push_str(&format!("  POWER {secs:.1}s"));
    }
    hud
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    tick_rate_hz: u32,
}

impl Renderer {
    pub fn new(tick_rate_hz: u32) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            tick_rate_hz,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, s: &SessionState) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change → clear for clean transition
        if self.last_phase != Some(s.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(s.phase);
        }

        self.front.clear();
        self.compose_game(s);

        match s.phase {
            Phase::NameEntry => self.compose_name_entry(s),
            Phase::GameOver => self.compose_game_over(s),
            Phase::Playing if s.show_leaderboard => self.compose_leaderboard(s),
            Phase::Playing if s.paused => self.compose_pause_overlay(),
            Phase::Playing => {}
        }

        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors, never ResetColor: the terminal default may differ from BASE_BG.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, s: &SessionState) {
        // ── HUD row ──
        self.front.fill_row(HUD_ROW, HUD_BG);
        let hud = hud_line(s, self.tick_rate_hz);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Maze ──
        let m = &s.maze;
        for gy in 0..m.height as i32 {
            for gx in 0..m.width as i32 {
                let tile = m.tile(gx, gy).unwrap_or_default();
                let (glyph, fg, bg) = tile_glyph(tile);
                self.put_cell(gx, gy, glyph, fg, bg);
            }
        }

        // ── Entities: ghosts first so the player stays visible ──
        for g in &s.ghosts {
            let (glyph, fg) = ghost_look(s, g);
            let (gx, gy) = m.cell_at(g.pos);
            self.put_cell(gx, gy, glyph, fg, BASE_BG);
        }
        let (px, py) = s.player_cell();
        self.put_cell(px, py, player_glyph(s.player.dir), PLAYER, BASE_BG);

        // ── Help bar ──
        let help_row = MAP_ROW + m.height + 1;
        let help = " Arrows/WASD:Move  Space/P:Pause  L:Scores  Q:Quit  │  Pad: Start/A/Select";
        self.front.put_str(0, help_row, help, Color::DarkGrey, BASE_BG);
    }

    /// Draw a two-column glyph for maze cell (gx, gy).
    fn put_cell(&mut self, gx: i32, gy: i32, glyph: &str, fg: Color, bg: Color) {
        if gx < 0 || gy < 0 { return; }
        let col = gx as usize * CELL_W;
        let row = MAP_ROW + gy as usize;
        self.front.put_str(col, row, glyph, fg, bg);
    }

    /// Centered dark box over the maze area; returns its top-left corner.
    fn overlay_box(&mut self, s: &SessionState, w: usize, h: usize) -> (usize, usize) {
        let view_cols = (s.maze.width * CELL_W).min(self.front.width);
        let view_rows = s.maze.height;
        let box_w = w.min(view_cols);
        let box_h = h.min(view_rows);
        let box_x = view_cols.saturating_sub(box_w) / 2;
        let box_y = MAP_ROW + view_rows.saturating_sub(box_h) / 2;
        self.front.fill_box(box_x, box_y, box_w, box_h, Color::Rgb { r: 40, g: 40, b: 40 });
        (box_x, box_y)
    }

    fn compose_name_entry(&mut self, s: &SessionState) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let (x, y) = self.overlay_box(s, 36, 8);
        self.front.put_str(x + 2, y + 1, "ENTER YOUR NAME", PLAYER, dim);
        let field = format!("> {:<width$}_", s.player_name, width = MAX_NAME_LEN);
        self.front.put_str(x + 2, y + 3, &field, Color::White, dim);
        self.front.put_str(x + 2, y + 5, "Enter: start   Backspace: erase", Color::Grey, dim);
    }

    fn compose_pause_overlay(&mut self) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let hdr = Color::Rgb { r: 255, g: 220, b: 50 };
        let key_c = Color::Rgb { r: 100, g: 200, b: 255 };

        let view_cols = self.front.width.min(56);
        let box_x = view_cols.saturating_sub(30) / 2;
        let box_y = MAP_ROW + 10;
        self.front.fill_box(box_x, box_y, 30, 8, dim);

        self.front.put_str(box_x + 6, box_y + 1, "╔════════════════╗", hdr, dim);
        self.front.put_str(box_x + 6, box_y + 2, "║     PAUSED     ║", hdr, dim);
        self.front.put_str(box_x + 6, box_y + 3, "╚════════════════╝", hdr, dim);
        self.front.put_str(box_x + 2, box_y + 5, "Space/P  Resume", key_c, dim);
        self.front.put_str(box_x + 2, box_y + 6, "L  Scores   Q  Quit", key_c, dim);
    }

    fn compose_leaderboard(&mut self, s: &SessionState) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let (x, y) = self.overlay_box(s, 36, 16);
        self.compose_leaderboard_rows(s, x, y, dim);
        let hint = if s.quit_armed { "Q again: quit   Esc: back" } else { "L/Esc: back" };
        self.front.put_str(x + 2, y + 14, hint, Color::Grey, dim);
    }

    fn compose_leaderboard_rows(&mut self, s: &SessionState, x: usize, y: usize, bg: Color) {
        self.front.put_str(x + 2, y + 1, "HIGH SCORES", PLAYER, bg);
        if s.leaderboard.is_empty() {
            self.front.put_str(x + 2, y + 3, "no scores yet", Color::Grey, bg);
        }
        for (i, rec) in s.leaderboard.iter().enumerate() {
            let mine = rec.name.trim().eq_ignore_ascii_case(s.player_name.trim());
            let fg = if mine { PLAYER } else { Color::White };
            let line = format!("{:>2}. {:<12} {:>8}", i + 1, rec.name, rec.score);
            self.front.put_str(x + 2, y + 3 + i, &line, fg, bg);
        }
    }

    fn compose_game_over(&mut self, s: &SessionState) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let (x, y) = self.overlay_box(s, 36, 20);
        self.front.put_str(x + 2, y + 1, "GAME OVER", GHOST_COLORS[0], dim);
        let score = format!("{}  {}", s.player_name, s.score);
        self.front.put_str(x + 2, y + 2, &score, Color::White, dim);
        self.compose_leaderboard_rows(s, x, y + 3, dim);
        self.front.put_str(x + 2, y + 18, "Enter: new game   Q: quit", Color::Grey, dim);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::session::tests::session_from;

    #[test]
    fn ghosts_keep_their_colors_when_calm() {
        let s = session_from("#####\n#P G#\n#####");
        assert_eq!(ghost_look(&s, &s.ghosts[0]).1, GHOST_COLORS[0]);
        assert_eq!(ghost_look(&s, &s.ghosts[2]).1, GHOST_COLORS[2]);
    }

    #[test]
    fn frightened_ghosts_flash_near_the_end() {
        let mut s = session_from("#####\n#P G#\n#####");
        s.clock.frighten(300);
        assert_eq!(ghost_look(&s, &s.ghosts[0]).1, FRIGHTENED);

        let mut s = session_from("#####\n#P G#\n#####");
        s.clock.frighten(FLASH_TICKS);
        assert_eq!(ghost_look(&s, &s.ghosts[0]).1, Color::White);
        for _ in 0..FLASH_PERIOD {
            s.clock.advance();
        }
        assert_eq!(ghost_look(&s, &s.ghosts[0]).1, FRIGHTENED);
    }

    #[test]
    fn eaten_ghosts_show_eyes() {
        let mut s = session_from("#####\n#P G#\n#####");
        s.ghosts[1].state = GhostState::Eaten;
        assert_eq!(ghost_look(&s, &s.ghosts[1]).0, "°°");
    }

    #[test]
    fn hud_shows_power_countdown() {
        let mut s = session_from("#####\n#P G#\n#####");
        s.score = 120;
        assert!(!hud_line(&s, 60).contains("POWER"));
        s.clock.frighten(90);
        let hud = hud_line(&s, 60);
        assert!(hud.contains("SCORE 120"));
        assert!(hud.contains("POWER 1.5s"));
        assert!(hud.contains("♥♥♥"));
    }
}
