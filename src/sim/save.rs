/// High-score persistence: a small JSON leaderboard on disk.
///
/// ## Location
///   `$PACMAN_CONFIG_DIR` if set, otherwise the user config directory
///   (`$XDG_CONFIG_HOME/pacman`, `~/.config/pacman`, `%APPDATA%\pacman`).
///   The directory is created on first write.
///
/// ## File format
///   `highscore.json`: JSON array of `{ "name": .., "score": .. }`.
///   A single object is also accepted (older files). When no readable
///   JSON exists, the legacy `highscore.txt` (one integer) is used.
///
/// Writes go to a temp file that is renamed over the target, so a crash
/// never leaves a half-written leaderboard. The simulation only talks to
/// this module through the `ScoreStore` trait and never fails a tick on
/// a persistence error.

use std::cmp::Reverse;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_DIR_ENV: &str = "PACMAN_CONFIG_DIR";

const APP_DIR: &str = "pacman";
const SCORES_FILE: &str = "highscore.json";
const LEGACY_FILE: &str = "highscore.txt";

/// Rows shown on the leaderboard screen.
pub const LEADERBOARD_SIZE: usize = 10;

// ══════════════════════════════════════════════════════════════
// Public types
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("no config directory available (set {CONFIG_DIR_ENV})")]
    NoConfigDir,
    #[error("score must be non-negative, got {0}")]
    NegativeScore(i64),
    #[error("high score file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("high score encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreRecord {
    #[serde(default)]
    pub name: String,
    pub score: i64,
}

/// What the simulation needs from persistence.
pub trait ScoreStore {
    /// Best record on file, or None when nothing (valid) is stored.
    fn load_high_score(&self) -> Option<HighScoreRecord>;

    /// Record `score` for `name`, keeping the larger of old and new.
    fn save_high_score(&mut self, name: &str, score: i64) -> Result<(), SaveError>;
}

/// On-disk JSON form: an array, or a lone record from older versions.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredScores {
    Many(Vec<HighScoreRecord>),
    One(HighScoreRecord),
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

fn non_empty_var(key: &str) -> Option<OsString> {
    std::env::var_os(key).filter(|v| !v.is_empty())
}

/// Directory holding the leaderboard, config overrides and the log file.
/// Not created here.
pub fn config_dir() -> Result<PathBuf, SaveError> {
    if let Some(dir) = non_empty_var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = non_empty_var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join(APP_DIR));
    }
    if let Some(home) = non_empty_var("HOME") {
        return Ok(PathBuf::from(home).join(".config").join(APP_DIR));
    }
    if let Some(appdata) = non_empty_var("APPDATA") {
        return Ok(PathBuf::from(appdata).join(APP_DIR));
    }
    Err(SaveError::NoConfigDir)
}

// ══════════════════════════════════════════════════════════════
// File-backed store
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default)]
pub struct FileScoreStore {
    /// Fixed directory; None resolves `config_dir()` on every access.
    dir: Option<PathBuf>,
}

impl FileScoreStore {
    /// Store rooted at the environment-selected config directory.
    pub fn from_env() -> Self {
        FileScoreStore { dir: None }
    }

    /// Store rooted at an explicit directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        FileScoreStore { dir: Some(dir.into()) }
    }

    fn dir(&self) -> Result<PathBuf, SaveError> {
        match &self.dir {
            Some(d) => Ok(d.clone()),
            None => config_dir(),
        }
    }

    /// Every stored record, unsorted. Missing files mean an empty list.
    pub fn records(&self) -> Result<Vec<HighScoreRecord>, SaveError> {
        let dir = self.dir()?;

        match fs::read_to_string(dir.join(SCORES_FILE)) {
            Ok(text) => match serde_json::from_str::<StoredScores>(&text) {
                Ok(StoredScores::Many(list)) => return Ok(valid_only(list)),
                Ok(StoredScores::One(rec)) => return Ok(valid_only(vec![rec])),
                Err(e) => log::warn!("ignoring unreadable {SCORES_FILE}: {e}"),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        match fs::read_to_string(dir.join(LEGACY_FILE)) {
            Ok(text) => Ok(parse_legacy(&text).into_iter().collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Records sorted by descending score, at most `LEADERBOARD_SIZE`.
    /// Read failures are logged and produce an empty board.
    pub fn leaderboard(&self) -> Vec<HighScoreRecord> {
        let mut list = self.records().unwrap_or_else(|e| {
            log::warn!("could not load leaderboard: {e}");
            Vec::new()
        });
        list.sort_by_key(|r| Reverse(r.score));
        list.truncate(LEADERBOARD_SIZE);
        list
    }

    pub fn best(&self) -> Result<Option<HighScoreRecord>, SaveError> {
        let list = self.records()?;
        // First of equal maxima wins, matching file order.
        let mut best: Option<HighScoreRecord> = None;
        for rec in list {
            if best.as_ref().map_or(true, |b| rec.score > b.score) {
                best = Some(rec);
            }
        }
        Ok(best)
    }

    /// Upsert by trimmed, case-insensitive name; the larger score wins.
    pub fn save_record(&self, name: &str, score: i64) -> Result<(), SaveError> {
        if score < 0 {
            return Err(SaveError::NegativeScore(score));
        }
        let dir = self.dir()?;
        fs::create_dir_all(&dir)?;

        let mut list = self.records()?;
        let key = name.trim();
        match list.iter_mut().find(|r| r.name.trim().eq_ignore_ascii_case(key)) {
            Some(existing) => existing.score = existing.score.max(score),
            None => list.push(HighScoreRecord {
                name: name.to_string(),
                score,
            }),
        }

        let path = dir.join(SCORES_FILE);
        let tmp = dir.join(format!("{SCORES_FILE}.tmp"));
        fs::write(&tmp, serde_json::to_string_pretty(&list)?)?;
        fs::rename(&tmp, &path)?;
        log::debug!("saved high score {score} for {key:?} to {}", path.display());
        Ok(())
    }
}

impl ScoreStore for FileScoreStore {
    fn load_high_score(&self) -> Option<HighScoreRecord> {
        self.best().unwrap_or_else(|e| {
            log::warn!("could not load high score: {e}");
            None
        })
    }

    fn save_high_score(&mut self, name: &str, score: i64) -> Result<(), SaveError> {
        self.save_record(name, score)
    }
}

fn valid_only(list: Vec<HighScoreRecord>) -> Vec<HighScoreRecord> {
    list.into_iter().filter(|r| r.score >= 0).collect()
}

/// Legacy file: first line holds a non-negative integer score.
fn parse_legacy(text: &str) -> Option<HighScoreRecord> {
    let line = text.lines().next()?.trim();
    let score: i64 = line.parse().ok()?;
    (score >= 0).then(|| HighScoreRecord {
        name: String::new(),
        score,
    })
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory store for simulation tests.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub best: Option<HighScoreRecord>,
        pub saves: Vec<(String, i64)>,
        pub fail: bool,
    }

    impl ScoreStore for MemoryStore {
        fn load_high_score(&self) -> Option<HighScoreRecord> {
            self.best.clone()
        }

        fn save_high_score(&mut self, name: &str, score: i64) -> Result<(), SaveError> {
            if self.fail {
                return Err(SaveError::NoConfigDir);
            }
            self.saves.push((name.to_string(), score));
            self.best = Some(HighScoreRecord { name: name.to_string(), score });
            Ok(())
        }
    }

    fn scratch_dir() -> PathBuf {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "pacman-save-test-{}-{n}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn rec(name: &str, score: i64) -> HighScoreRecord {
        HighScoreRecord { name: name.to_string(), score }
    }

    #[test]
    fn empty_directory_has_no_scores() {
        let store = FileScoreStore::at(scratch_dir());
        assert_eq!(store.records().unwrap(), vec![]);
        assert_eq!(store.load_high_score(), None);
        assert!(store.leaderboard().is_empty());
    }

    #[test]
    fn save_then_load_best() {
        let mut store = FileScoreStore::at(scratch_dir());
        store.save_high_score("ann", 300).unwrap();
        store.save_high_score("bob", 900).unwrap();
        store.save_high_score("cy", 500).unwrap();
        assert_eq!(store.load_high_score(), Some(rec("bob", 900)));
    }

    #[test]
    fn upsert_matches_trimmed_case_insensitive_name() {
        let store = FileScoreStore::at(scratch_dir());
        store.save_record("Ann", 300).unwrap();
        store.save_record("  ann ", 200).unwrap();
        assert_eq!(store.records().unwrap(), vec![rec("Ann", 300)]);
        store.save_record("ANN", 700).unwrap();
        assert_eq!(store.records().unwrap(), vec![rec("Ann", 700)]);
    }

    #[test]
    fn negative_score_is_rejected() {
        let dir = scratch_dir();
        let store = FileScoreStore::at(&dir);
        assert!(matches!(store.save_record("x", -1), Err(SaveError::NegativeScore(-1))));
        assert!(!dir.join(SCORES_FILE).exists());
    }

    #[test]
    fn single_object_file_is_accepted() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(SCORES_FILE), r#"{"name":"old","score":1234}"#).unwrap();
        let store = FileScoreStore::at(&dir);
        assert_eq!(store.load_high_score(), Some(rec("old", 1234)));
    }

    #[test]
    fn legacy_text_is_used_without_json() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(LEGACY_FILE), " 4200 \n").unwrap();
        let store = FileScoreStore::at(&dir);
        assert_eq!(store.load_high_score(), Some(rec("", 4200)));
    }

    #[test]
    fn corrupt_json_falls_back_to_legacy() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(SCORES_FILE), "not json").unwrap();
        fs::write(dir.join(LEGACY_FILE), "77").unwrap();
        let store = FileScoreStore::at(&dir);
        assert_eq!(store.records().unwrap(), vec![rec("", 77)]);
    }

    #[test]
    fn negative_legacy_score_is_ignored() {
        assert_eq!(parse_legacy("-5"), None);
        assert_eq!(parse_legacy("abc"), None);
        assert_eq!(parse_legacy(""), None);
    }

    #[test]
    fn leaderboard_is_sorted_and_capped() {
        let store = FileScoreStore::at(scratch_dir());
        for i in 0..12 {
            store.save_record(&format!("p{i}"), i * 10).unwrap();
        }
        let board = store.leaderboard();
        assert_eq!(board.len(), LEADERBOARD_SIZE);
        assert_eq!(board[0], rec("p11", 110));
        assert!(board.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn write_leaves_no_temp_file() {
        let dir = scratch_dir();
        let store = FileScoreStore::at(&dir);
        store.save_record("a", 1).unwrap();
        assert!(dir.join(SCORES_FILE).exists());
        assert!(!dir.join(format!("{SCORES_FILE}.tmp")).exists());
    }
}
