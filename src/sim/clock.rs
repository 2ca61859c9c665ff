/// Game clock: a monotonic tick counter plus the frightened-mode expiry.
///
/// Timers are absolute expiry ticks compared against the counter, never
/// countdowns. A paused session simply does not advance the clock, so
/// pausing cannot eat into a frightened window.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Clock {
    tick: u64,
    /// Tick at which frightened mode ends. 0 = inactive.
    frightened_until: u64,
}

impl Clock {
    pub fn new() -> Self {
        Clock::default()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn frightened_until(&self) -> u64 {
        self.frightened_until
    }

    /// Advance one tick and return the new tick number.
    pub fn advance(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    pub fn is_frightened(&self) -> bool {
        self.frightened_until > self.tick
    }

    /// Start (or restart) a frightened window lasting `duration` ticks.
    pub fn frighten(&mut self, duration: u64) {
        self.frightened_until = self.tick + duration;
    }

    pub fn clear_frightened(&mut self) {
        self.frightened_until = 0;
    }

    /// Ticks left in the frightened window (0 when inactive).
    pub fn frightened_remaining(&self) -> u64 {
        self.frightened_until().saturating_sub(self.tick)
    }

    /// Clear an elapsed window. Returns true exactly once per window,
    /// on the first check at or after its expiry tick.
    pub fn expire(&mut self) -> bool {
        if self.frightened_until != 0 && self.tick >= self.frightened_until {
            self.frightened_until = 0;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn clock_at(tick: u64) -> Clock {
        let mut c = Clock::new();
        for _ in 0..tick {
            c.advance();
        }
        c
    }

    #[test]
    fn new_clock_is_calm() {
        let c = Clock::new();
        assert_eq!(c.tick(), 0);
        assert!(!c.is_frightened());
        assert_eq!(c.frightened_remaining(), 0);
    }

    #[test]
    fn expire_fires_once() {
        let mut c = clock_at(5);
        c.frighten(2);
        assert!(!c.expire());
        c.advance();
        assert!(!c.expire());
        c.advance();
        assert!(c.expire());
        assert!(!c.expire());
        assert_eq!(c.frightened_until(), 0);
    }

    #[test]
    fn refrighten_extends_window() {
        let mut c = clock_at(10);
        c.frighten(120);
        c.advance();
        c.frighten(120);
        assert_eq!(c.frightened_until(), 131);
        assert_eq!(c.frightened_remaining(), 120);
    }

    proptest! {
        #[test]
        fn frightened_exactly_for_duration(start in 0u64..500, duration in 1u64..400) {
            let mut c = clock_at(start);
            c.frighten(duration);
            prop_assert_eq!(c.frightened_until(), start + duration);
            for t in start..start + duration {
                prop_assert_eq!(c.tick(), t);
                prop_assert!(c.is_frightened());
                c.advance();
            }
            for _ in 0..5 {
                prop_assert!(!c.is_frightened());
                c.advance();
            }
        }
    }
}
