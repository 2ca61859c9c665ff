/// Keyboard state tracker.
///
/// Tracks which keys are currently held so a heading can be requested
/// every tick while a key is down, and which keys were freshly pressed
/// for one-shot actions (pause, leaderboard, quit, confirm).
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::Direction;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// Heading requested by a key: arrows or WASD.
pub fn key_direction(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Direction::Right),
        _ => None,
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling
    /// and name entry.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,

    /// Last heading key pressed, kept while it is held.
    latest_direction: Option<(KeyCode, Direction)>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
            latest_direction: None,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else { continue };
            self.raw_events.push(key);

            match key.kind {
                KeyEventKind::Release if self.honor_release => {
                    self.last_active.remove(&key.code);
                }
                KeyEventKind::Release => {
                    // Enhancement not confirmed; timeout-based expiry instead
                }
                _ => {
                    let was_held = self.is_held(key.code);
                    self.last_active.insert(key.code, Instant::now());
                    if !was_held {
                        self.fresh_presses.push(key.code);
                    }
                    if let Some(dir) = key_direction(key.code) {
                        self.latest_direction = Some((key.code, dir));
                    }
                }
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Heading to request this tick: the most recent heading key still held.
    pub fn direction(&self) -> Option<Direction> {
        match self.latest_direction {
            Some((code, dir)) if self.is_held(code) => Some(dir),
            _ => None,
        }
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .is_some_and(|t| t.elapsed() < HOLD_TIMEOUT)
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Characters typed this frame (Press and Repeat only), for name entry.
    pub fn typed_chars(&self) -> impl Iterator<Item = char> + '_ {
        self.raw_events.iter()
            .filter(|k| k.kind != KeyEventKind::Release)
            .filter(|k| !k.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT))
            .filter_map(|k| match k.code {
                KeyCode::Char(c) => Some(c),
                _ => None,
            })
    }

    /// Backspace presses this frame, for name entry.
    pub fn backspaces(&self) -> usize {
        self.raw_events.iter()
            .filter(|k| k.kind != KeyEventKind::Release && k.code == KeyCode::Backspace)
            .count()
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn arrows_and_wasd_map_to_headings() {
        assert_eq!(key_direction(KeyCode::Up), Some(Direction::Up));
        assert_eq!(key_direction(KeyCode::Char('a')), Some(Direction::Left));
        assert_eq!(key_direction(KeyCode::Char('D')), Some(Direction::Right));
        assert_eq!(key_direction(KeyCode::Char('s')), Some(Direction::Down));
        assert_eq!(key_direction(KeyCode::Char('p')), None);
        assert_eq!(key_direction(KeyCode::Enter), None);
    }

    #[test]
    fn typed_chars_skip_control_combos() {
        let mut input = InputState::new();
        input.raw_events = vec![
            press(KeyCode::Char('a'), KeyModifiers::NONE),
            press(KeyCode::Char('c'), KeyModifiers::CONTROL),
            press(KeyCode::Char('B'), KeyModifiers::SHIFT),
            press(KeyCode::Backspace, KeyModifiers::NONE),
        ];
        assert_eq!(input.typed_chars().collect::<String>(), "aB");
        assert_eq!(input.backspaces(), 1);
        assert!(input.ctrl_c_pressed());
    }

    #[test]
    fn no_heading_without_keys() {
        let input = InputState::new();
        assert_eq!(input.direction(), None);
    }
}
