/// Sound engine: arcade sound effects via rodio.
///
/// Effects are loaded once at init from WAV files in the sounds directory
/// (`pellet.wav`, `power.wav`, `ghost.wav`, `death.wav`). Any file that is
/// missing or unreadable is replaced by a procedurally generated beep, and
/// the level-clear and game-over jingles are always generated.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Audio is off unless `PACMAN_ENABLE_AUDIO=1` or `audio.enabled = true`;
/// `PACMAN_DISABLE_AUDIO=1` always wins. Compile without the "sound"
/// feature to drop audio entirely (the stub SoundEngine does nothing).

use crate::config::AudioConfig;

pub const ENABLE_ENV: &str = "PACMAN_ENABLE_AUDIO";
pub const DISABLE_ENV: &str = "PACMAN_DISABLE_AUDIO";

/// Decide whether to open an audio device from config plus the two
/// environment switches (values as read from the environment).
pub fn audio_enabled(configured: bool, enable: Option<&str>, disable: Option<&str>) -> bool {
    let on = |v: Option<&str>| v.is_some_and(|s| s.trim() == "1");
    if on(disable) {
        return false;
    }
    configured || on(enable)
}

fn audio_enabled_from_env(cfg: &AudioConfig) -> bool {
    let enable = std::env::var(ENABLE_ENV).ok();
    let disable = std::env::var(DISABLE_ENV).ok();
    audio_enabled(cfg.enabled, enable.as_deref(), disable.as_deref())
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use crate::config::AudioConfig;

    const SAMPLE_RATE: u32 = 22050;

    /// WAV buffers for each sound effect, ready to decode.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_pellet: Arc<Vec<u8>>,
        sfx_power: Arc<Vec<u8>>,
        sfx_ghost: Arc<Vec<u8>>,
        sfx_death: Arc<Vec<u8>>,
        sfx_level: Arc<Vec<u8>>,
        sfx_game_over: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new(cfg: &AudioConfig) -> Option<Self> {
            if !super::audio_enabled_from_env(cfg) {
                log::debug!("audio disabled");
                return None;
            }
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output: {e}");
                    return None;
                }
            };

            let dir = cfg.sounds_dir.as_path();
            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_pellet: Arc::new(load_or(dir, "pellet.wav", gen_pellet)),
                sfx_power: Arc::new(load_or(dir, "power.wav", gen_power)),
                sfx_ghost: Arc::new(load_or(dir, "ghost.wav", gen_ghost)),
                sfx_death: Arc::new(load_or(dir, "death.wav", gen_death)),
                sfx_level: Arc::new(make_wav(&gen_level_clear())),
                sfx_game_over: Arc::new(make_wav(&gen_game_over())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_pellet(&self) { self.play(&self.sfx_pellet); }
        pub fn play_power(&self) { self.play(&self.sfx_power); }
        pub fn play_ghost(&self) { self.play(&self.sfx_ghost); }
        pub fn play_death(&self) { self.play(&self.sfx_death); }
        pub fn play_level_clear(&self) { self.play(&self.sfx_level); }
        pub fn play_game_over(&self) { self.play(&self.sfx_game_over); }
    }

    /// File bytes if they decode as audio, otherwise the generated fallback.
    fn load_or(dir: &Path, name: &str, fallback: fn() -> Vec<f32>) -> Vec<u8> {
        let path = dir.join(name);
        match std::fs::read(&path) {
            Ok(bytes) if rodio::Decoder::new(Cursor::new(bytes.clone())).is_ok() => {
                log::debug!("loaded {}", path.display());
                bytes
            }
            Ok(_) => {
                log::warn!("{} is not playable audio; using a beep", path.display());
                make_wav(&fallback())
            }
            Err(_) => make_wav(&fallback()),
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Simple sine blip at given frequency and duration
    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32); // linear fade out
                (t * freq * 2.0 * std::f32::consts::PI).sin() * env * volume
            })
            .collect()
    }

    /// Square-ish note sequence, each note fading over its own length.
    fn gen_notes(notes: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
                    + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.3;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Pellet: the short "waka" blip
    fn gen_pellet() -> Vec<f32> {
        gen_blip(660.0, 0.04, 0.2)
    }

    /// Power pellet: rising sweep
    fn gen_power() -> Vec<f32> {
        let duration = 0.25;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 300.0 + t * 600.0; // 300Hz → 900Hz
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - t * 0.5;
                (ti * freq * 2.0 * std::f32::consts::PI).sin() * env * 0.25
            })
            .collect()
    }

    /// Ghost eaten: quick ascending arpeggio C6→E6→G6
    fn gen_ghost() -> Vec<f32> {
        gen_notes(&[(1047.0, 0.045), (1319.0, 0.045), (1568.0, 0.045)], 0.25)
    }

    /// Death: sad descending tone
    fn gen_death() -> Vec<f32> {
        let mut samples = gen_notes(
            &[(440.0, 0.12), (370.0, 0.12), (311.0, 0.12), (261.0, 0.12)], // A4→F#4→Eb4→C4
            0.3,
        );
        // Final fade
        let fade_len = samples.len() / 4;
        let total = samples.len();
        for (i, s) in samples.iter_mut().enumerate().skip(total - fade_len) {
            *s *= (total - i) as f32 / fade_len as f32;
        }
        samples
    }

    /// Level clear: victory ascending fanfare
    fn gen_level_clear() -> Vec<f32> {
        gen_notes(&[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.3)], 0.3) // C5→E5→G5→C6
    }

    /// Game over: slow low descent
    fn gen_game_over() -> Vec<f32> {
        gen_notes(&[(392.0, 0.2), (330.0, 0.2), (262.0, 0.4)], 0.3) // G4→E4→C4
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn generated_wav_decodes() {
            let wav = make_wav(&gen_pellet());
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(wav.len(), 44 + gen_pellet().len() * 2);
            assert!(rodio::Decoder::new(Cursor::new(wav)).is_ok());
        }

        #[test]
        fn missing_file_falls_back_to_beep() {
            let dir = std::env::temp_dir().join("pacman-no-such-sounds");
            let bytes = load_or(&dir, "pellet.wav", gen_pellet);
            assert_eq!(bytes, make_wav(&gen_pellet()));
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new(cfg: &AudioConfig) -> Option<Self> {
        audio_enabled_from_env(cfg).then_some(SoundEngine)
    }
    pub fn play_pellet(&self) {}
    pub fn play_power(&self) {}
    pub fn play_ghost(&self) {}
    pub fn play_death(&self) {}
    pub fn play_level_clear(&self) {}
    pub fn play_game_over(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_is_opt_in() {
        assert!(!audio_enabled(false, None, None));
        assert!(audio_enabled(true, None, None));
        assert!(audio_enabled(false, Some("1"), None));
        assert!(!audio_enabled(false, Some("yes"), None));
    }

    #[test]
    fn disable_switch_always_wins() {
        assert!(!audio_enabled(true, Some("1"), Some("1")));
        assert!(audio_enabled(true, None, Some("0")));
    }
}
