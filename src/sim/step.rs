/// The step function: advances the session by one tick.
///
/// Processing order:
///   1. Clock advance
///   2. Input (desired heading)
///   3. Player movement (turn, then advance)
///   4. Pellet pickup
///   5. Ghost movement (decide at cell centers, then advance)
///   6. Encounters (at most one per tick)
///   7. Frightened expiry
///   8. Level clear
///   9. High score
///
/// Nothing runs while paused or outside the Playing phase: the clock
/// stands still and no events are produced.

use rand::Rng;

use crate::domain::ai::{self, GhostMode};
use crate::domain::entity::{reversed, FrameInput, GhostState};
use crate::domain::motion;
use crate::domain::rules;
use super::event::GameEvent;
use super::save::ScoreStore;
use super::session::{Phase, SessionState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step<R: Rng + ?Sized>(
    s: &mut SessionState,
    input: FrameInput,
    rng: &mut R,
    scores: &mut dyn ScoreStore,
) -> Vec<GameEvent> {
    if s.phase != Phase::Playing || s.paused { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    s.clock.advance();

    if let Some(dir) = input.direction {
        s.player.desired = Some(dir);
    }

    resolve_player_movement(s);
    resolve_pellets(s, &mut events);
    resolve_ghost_movement(s, rng);
    resolve_encounters(s, &mut events);
    resolve_timers(s, &mut events);
    resolve_level_clear(s, &mut events);
    resolve_high_score(s, scores, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player_movement(s: &mut SessionState) {
    let m = s.player_motion;
    let p = &mut s.player;
    p.dir = motion::resolve_turn(&s.maze, &mut p.pos, p.dir, p.desired, &m);
    p.dir = motion::advance(&s.maze, &mut p.pos, p.dir, &m);
    p.pos = motion::clamp_row(&s.maze, p.pos);
}

// ══════════════════════════════════════════════════════════════
// Pellets
// ══════════════════════════════════════════════════════════════

/// Eat whatever lies in the player's cell once the player is on its center.
fn resolve_pellets(s: &mut SessionState, events: &mut Vec<GameEvent>) {
    if !motion::is_aligned(&s.maze, s.player.pos, &s.player_motion) { return; }

    let (x, y) = s.player_cell();
    match s.maze.consume_pellet_at(x, y) {
        (false, _) => {}
        (true, false) => {
            s.score += rules::PELLET_POINTS;
            events.push(GameEvent::PelletEaten { x, y });
        }
        (true, true) => {
            s.score += rules::POWER_PELLET_POINTS;
            enter_frightened(s);
            events.push(GameEvent::PowerPelletEaten { x, y });
        }
    }
}

/// Start (or restart) the frightened window. Every ghost turns around.
fn enter_frightened(s: &mut SessionState) {
    s.clock.frighten(s.frightened_ticks);
    s.combo = 0;
    for g in &mut s.ghosts {
        g.dir = Some(reversed(g.dir));
        g.state = GhostState::Normal;
    }
}

// ══════════════════════════════════════════════════════════════
// Ghosts
// ══════════════════════════════════════════════════════════════

fn resolve_ghost_movement<R: Rng + ?Sized>(s: &mut SessionState, rng: &mut R) {
    let frightened = s.is_frightened();
    let player_cell = s.player_cell();
    let base = s.ghost_motion;

    for g in &mut s.ghosts {
        let mode = GhostMode::of(g.state, frightened);
        let m = if mode == GhostMode::Flee { base.with_step(base.step / 2.0) } else { base };
        let cell = s.maze.cell_at(g.pos);

        // Decide at centers, snapping only across the chosen heading. A wall
        // straight ahead mid-cell pulls the ghost back onto the center first.
        if motion::is_aligned(&s.maze, g.pos, &m) {
            let next = ai::choose_direction(&s.maze, cell, g.dir, mode, player_cell, rng);
            g.pos = motion::snap_across(&s.maze, g.pos, next);
            g.dir = Some(next);
        } else if g.dir.is_some_and(|d| !s.maze.is_open_toward(cell.0, cell.1, d)) {
            g.pos = motion::snap_to_center(&s.maze, g.pos);
            g.dir = Some(ai::choose_direction(&s.maze, cell, g.dir, mode, player_cell, rng));
        }

        g.dir = motion::advance(&s.maze, &mut g.pos, g.dir, &m);
        g.pos = motion::clamp_row(&s.maze, g.pos);
    }
}

// ══════════════════════════════════════════════════════════════
// Encounters
// ══════════════════════════════════════════════════════════════

/// First touching ghost in order decides the outcome; the rest wait a tick.
fn resolve_encounters(s: &mut SessionState, events: &mut Vec<GameEvent>) {
    let r = rules::collision_radius(s.maze.tile_size);
    let player = s.player.pos;
    let Some(idx) = s.ghosts.iter().position(|g| rules::collides(player, r, g.pos, r)) else {
        return;
    };

    if s.is_frightened() {
        let points = rules::ghost_points(s.combo);
        s.score += points;
        s.combo += 1;
        s.send_home(idx);
        events.push(GameEvent::GhostEaten { id: s.ghosts[idx].id, points });
        return;
    }

    s.lives = s.lives.saturating_sub(1);
    s.reset_positions();
    events.push(GameEvent::PlayerDied { lives_left: s.lives });

    if s.lives == 0 {
        s.phase = Phase::GameOver;
        log::info!("game over: {} scored {}", s.player_name, s.score);
        events.push(GameEvent::GameOver { score: s.score });
    }
}

// ══════════════════════════════════════════════════════════════
// Timers
// ══════════════════════════════════════════════════════════════

fn resolve_timers(s: &mut SessionState, events: &mut Vec<GameEvent>) {
    if !s.clock.expire() { return; }

    s.combo = 0;
    for g in &mut s.ghosts {
        g.state = GhostState::Normal;
    }
    events.push(GameEvent::FrightenedEnded);
}

// ══════════════════════════════════════════════════════════════
// Level clear
// ══════════════════════════════════════════════════════════════

/// Only checked on ticks that ate something, so a pellet-free maze never clears.
fn resolve_level_clear(s: &mut SessionState, events: &mut Vec<GameEvent>) {
    if s.phase != Phase::Playing { return; }
    let ate = events.iter().any(|e| {
        matches!(e, GameEvent::PelletEaten { .. } | GameEvent::PowerPelletEaten { .. })
    });
    if !ate || s.maze.pellets_remaining() > 0 { return; }

    s.level += 1;
    s.maze.refill();
    s.reset_positions();
    log::info!("level {} cleared", s.level - 1);
    events.push(GameEvent::LevelCleared { level: s.level });
}

// ══════════════════════════════════════════════════════════════
// High score
// ══════════════════════════════════════════════════════════════

fn resolve_high_score(s: &mut SessionState, scores: &mut dyn ScoreStore, events: &mut Vec<GameEvent>) {
    if s.score <= s.high_score { return; }

    s.high_score = s.score;
    s.high_score_name.clone_from(&s.player_name);
    if !s.high_score_announced {
        s.high_score_announced = true;
        events.push(GameEvent::NewHighScore { score: s.score });
    }

    if let Err(e) = scores.save_high_score(&s.player_name, i64::from(s.score)) {
        log::warn!("high score not saved: {e}");
    }
}
