/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or the
/// config directory (see `sim::save::config_dir`). Falls back to sensible
/// defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::sim::save;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub game: RulesConfig,
    pub audio: AudioConfig,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_hz: u32,
    pub player_speed: f32,       // pixels per second
    pub ghost_speed: f32,        // pixels per second, halved while fleeing
    pub frightened_ticks: u64,
    pub turn_window: f32,        // fraction of the per-tick step
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    pub lives: u32,
    pub ghosts: usize,
    pub seed: Option<u64>,
    pub maze_file: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct AudioConfig {
    pub enabled: bool,
    pub sounds_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub pause: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

impl SpeedConfig {
    pub fn player_step(&self) -> f32 {
        self.player_speed / self.tick_rate_hz as f32
    }

    pub fn ghost_step(&self) -> f32 {
        self.ghost_speed / self.tick_rate_hz as f32
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz))
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    game: TomlGame,
    #[serde(default)]
    audio: TomlAudio,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_hz: u32,
    #[serde(default = "default_player_speed")]
    player_speed: f32,
    #[serde(default = "default_ghost_speed")]
    ghost_speed: f32,
    #[serde(default = "default_frightened_ticks")]
    frightened_ticks: u64,
    #[serde(default = "default_turn_window")]
    turn_window: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGame {
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default = "default_ghosts")]
    ghosts: usize,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    maze_file: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TomlAudio {
    #[serde(default)]
    enabled: bool,
    #[serde(default = "default_sounds_dir")]
    sounds_dir: String,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pause")]
    pause: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

// ── Defaults ──

fn default_tick_rate() -> u32 { 60 }
fn default_player_speed() -> f32 { 720.0 }   // 12 px per tick at 60 Hz
fn default_ghost_speed() -> f32 { 630.0 }    // 10.5 px per tick at 60 Hz
fn default_frightened_ticks() -> u64 { 120 } // 2 s at 60 Hz
fn default_turn_window() -> f32 { 0.5 }
fn default_lives() -> u32 { 3 }
fn default_ghosts() -> usize { 4 }
fn default_sounds_dir() -> String { "assets/sounds".into() }

fn default_pause() -> Vec<String> { vec!["Start".into()] }
fn default_confirm() -> Vec<String> { vec!["A".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_hz: default_tick_rate(),
            player_speed: default_player_speed(),
            ghost_speed: default_ghost_speed(),
            frightened_ticks: default_frightened_ticks(),
            turn_window: default_turn_window(),
        }
    }
}

impl Default for TomlGame {
    fn default() -> Self {
        TomlGame {
            lives: default_lives(),
            ghosts: default_ghosts(),
            seed: None,
            maze_file: None,
        }
    }
}

impl Default for TomlAudio {
    fn default() -> Self {
        TomlAudio {
            enabled: false,
            sounds_dir: default_sounds_dir(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            pause: default_pause(),
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) config directory. Missing file or keys fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let speed = &cfg.speed;
        if speed.tick_rate_hz == 0 {
            log::warn!("speed.tick_rate_hz must be positive; using {}", default_tick_rate());
        }

        GameConfig {
            speed: SpeedConfig {
                tick_rate_hz: if speed.tick_rate_hz == 0 { default_tick_rate() } else { speed.tick_rate_hz },
                player_speed: speed.player_speed.max(0.0),
                ghost_speed: speed.ghost_speed.max(0.0),
                frightened_ticks: speed.frightened_ticks,
                turn_window: speed.turn_window,
            },
            game: RulesConfig {
                lives: cfg.game.lives.max(1),
                ghosts: cfg.game.ghosts,
                seed: cfg.game.seed,
                maze_file: cfg.game.maze_file
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| resolve_path(&s, search_dirs, |p| p.is_file())),
            },
            audio: AudioConfig {
                enabled: cfg.audio.enabled,
                sounds_dir: resolve_path(&cfg.audio.sounds_dir, search_dirs, |p| p.is_dir()),
            },
            gamepad: GamepadConfig {
                pause: cfg.gamepad.pause,
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
            },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

/// Absolute paths are kept; relative ones are searched for in the
/// candidate directories, defaulting to relative-to-CWD.
fn resolve_path(raw: &str, search_dirs: &[PathBuf], exists: impl Fn(&PathBuf) -> bool) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(raw))
        .find(|p| exists(p))
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD + config dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.contains(&cwd) {
            dirs.push(cwd);
        }
    }

    // 3. Config directory (~/.config/pacman or $PACMAN_CONFIG_DIR)
    if let Ok(cfg) = save::config_dir() {
        if cfg.is_dir() && !dirs.contains(&cfg) {
            dirs.push(cfg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => return parse_toml(&text, &path),
            Err(e) => log::warn!("could not read {}: {e}", path.display()),
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str, path: &std::path::Path) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => {
            log::info!("using {}", path.display());
            cfg
        }
        Err(e) => {
            log::warn!("{} parse error: {e}; using default settings", path.display());
            TomlConfig::default()
        }
    }
}
