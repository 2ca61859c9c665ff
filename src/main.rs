/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use config::GameConfig;
use domain::entity::FrameInput;
use sim::event::GameEvent;
use sim::level::load_layout;
use sim::save::{self, FileScoreStore, ScoreStore};
use sim::session::{Phase, SessionState};
use sim::step;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
/// Ticks run per frame at most; a longer stall drops the backlog.
const MAX_CATCH_UP_TICKS: u32 = 4;
const LOG_ENV: &str = "PACMAN_LOG";

fn main() {
    init_logging();

    let config = GameConfig::load();
    let layout = match load_layout(&config) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("No playable maze: {e}");
            return;
        }
    };

    let mut store = FileScoreStore::from_env();
    let mut session = SessionState::new(layout, &config);
    session.set_known_high_score(store.load_high_score());

    let mut rng = match config.game.seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_rng(&mut rand::rng()),
    };

    let mut renderer = Renderer::new(config.speed.tick_rate_hz);
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new(&config.audio);

    let result = game_loop(&mut session, &mut renderer, sound.as_ref(), &mut rng, &mut store, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing!");
    println!("Final Score: {}", session.score);
}

/// Logs go to `pacman.log` in the config directory; the terminal is in
/// raw alternate-screen mode while playing.
fn init_logging() {
    let Ok(dir) = save::config_dir() else { return };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(dir.join("pacman.log")) else {
        return;
    };
    let filters = std::env::var(LOG_ENV).unwrap_or_else(|_| "warn".into());
    let _ = env_logger::Builder::new()
        .parse_filters(&filters)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

fn game_loop(
    session: &mut SessionState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    rng: &mut Pcg32,
    store: &mut FileScoreStore,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        log::info!("gamepad connected");
    }

    let tick_rate = config.speed.tick_duration();
    let mut last_frame = Instant::now();
    let mut backlog = Duration::ZERO;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }

        let actions = read_meta(&kb, &gp, session.phase);
        let mut quit = false;
        for action in actions {
            quit |= apply_meta(session, action, store);
        }
        if quit {
            break;
        }
        if session.phase == Phase::NameEntry {
            for _ in 0..kb.backspaces() {
                session.pop_name_char();
            }
            for ch in kb.typed_chars() {
                session.push_name_char(ch);
            }
        }

        let now = Instant::now();
        backlog += now.duration_since(last_frame);
        last_frame = now;

        let running = session.phase == Phase::Playing && !session.paused && !session.show_leaderboard;
        if !running {
            backlog = Duration::ZERO;
        }

        let mut ticks = 0;
        while running && backlog >= tick_rate && ticks < MAX_CATCH_UP_TICKS {
            let input = FrameInput { direction: kb.direction().or_else(|| gp.direction()) };
            let events = step::step(session, input, rng, store);
            process_sound_events(sound, &events);
            if events.iter().any(|e| matches!(e, GameEvent::GameOver { .. })) {
                session.leaderboard = store.leaderboard();
            }
            backlog -= tick_rate;
            ticks += 1;
        }
        if ticks == MAX_CATCH_UP_TICKS {
            backlog = Duration::ZERO;
        }

        renderer.render(session)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::PelletEaten { .. } => sfx.play_pellet(),
            GameEvent::PowerPelletEaten { .. } => sfx.play_power(),
            GameEvent::GhostEaten { .. } => sfx.play_ghost(),
            GameEvent::PlayerDied { lives_left } if *lives_left > 0 => sfx.play_death(),
            GameEvent::GameOver { .. } => sfx.play_game_over(),
            GameEvent::LevelCleared { .. } => sfx.play_level_clear(),
            _ => {}
        }
    }
}

// ── Meta keys ──

const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char(' '), KeyCode::Char('p'), KeyCode::Char('P')];
const KEYS_SCORES: &[KeyCode] = &[KeyCode::Char('l'), KeyCode::Char('L')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Meta {
    Pause,
    Leaderboard,
    Quit,
    Back,
    Confirm,
}

/// One-shot actions pressed this frame. Letters are name input while
/// the name is being typed, so only Enter and Esc count there.
fn read_meta(kb: &InputState, gp: &GamepadState, phase: Phase) -> Vec<Meta> {
    let mut actions = Vec::new();
    if kb.was_pressed(KeyCode::Enter) || gp.confirm_pressed() {
        actions.push(Meta::Confirm);
    }
    if kb.was_pressed(KeyCode::Esc) {
        actions.push(Meta::Back);
    }
    if phase == Phase::NameEntry {
        return actions;
    }
    if kb.any_pressed(KEYS_PAUSE) || gp.pause_pressed() {
        actions.push(Meta::Pause);
    }
    if kb.any_pressed(KEYS_SCORES) {
        actions.push(Meta::Leaderboard);
    }
    if kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
        actions.push(Meta::Quit);
    }
    actions
}

/// Apply a meta action. Returns true when the game should exit.
fn apply_meta(s: &mut SessionState, action: Meta, store: &FileScoreStore) -> bool {
    match (s.phase, action) {
        (Phase::NameEntry, Meta::Confirm) => {
            s.confirm_name();
            log::info!("player {} started", s.player_name);
        }
        (Phase::NameEntry, Meta::Back) => return true,
        (Phase::NameEntry, _) => {}

        (Phase::GameOver, Meta::Confirm) => s.new_game(),
        (Phase::GameOver, Meta::Quit | Meta::Back) => return true,
        (Phase::GameOver, _) => {}

        (Phase::Playing, Meta::Pause) => {
            if !s.show_leaderboard {
                s.paused = !s.paused;
            }
        }
        (Phase::Playing, Meta::Leaderboard) => {
            s.show_leaderboard = !s.show_leaderboard;
            s.quit_armed = false;
            if s.show_leaderboard {
                s.leaderboard = store.leaderboard();
            }
        }
        (Phase::Playing, Meta::Quit) => {
            if s.quit_armed {
                return true;
            }
            s.quit_armed = true;
            s.show_leaderboard = true;
            s.leaderboard = store.leaderboard();
        }
        (Phase::Playing, Meta::Back) => {
            s.show_leaderboard = false;
            s.quit_armed = false;
        }
        (Phase::Playing, Meta::Confirm) => {}
    }
    false
}
