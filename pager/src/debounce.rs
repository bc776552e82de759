//! Pushbutton debouncing: fixed-interval sampling into a 3-stage shift
//! register, unanimous consensus, then rising-edge detection.
//!
//! Any mixed window keeps the previous stable level, so a single bouncing
//! sample can never flip the output. A press is only reported after three
//! agreeing samples, i.e. 20-30 ms after the contacts settle.

/// Number of samples that must agree before the stable level changes
pub const WINDOW: usize = 3;

/// Sampling interval used by the firmware
pub const DEFAULT_INTERVAL_US: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebounceConfig {
    /// Minimum time between two samples, in microseconds
    pub interval_us: u64,
    /// Invert the raw level (button pulls the line low when pressed)
    pub active_low: bool,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            interval_us: DEFAULT_INTERVAL_US,
            active_low: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    config: DebounceConfig,
    /// `[0]` is the most recent sample
    samples: [bool; WINDOW],
    stable: bool,
    prev_stable: bool,
    last_sample_us: u64,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DebounceConfig::default())
    }
}

impl Debouncer {
    pub const fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            samples: [false; WINDOW],
            stable: false,
            prev_stable: false,
            last_sample_us: 0,
        }
    }

    /// Take a sample if more than one interval has passed since the last one.
    ///
    /// Returns `true` if a sample was taken.
    pub fn sample(&mut self, now_us: u64, raw_level: bool) -> bool {
        if now_us.wrapping_sub(self.last_sample_us) <= self.config.interval_us {
            return false;
        }
        self.last_sample_us = now_us;

        self.samples.copy_within(0..WINDOW - 1, 1);
        self.samples[0] = raw_level != self.config.active_low;

        if self.samples.iter().all(|&s| s) {
            self.stable = true;
        } else if self.samples.iter().all(|&s| !s) {
            self.stable = false;
        }
        true
    }

    /// Compare against the previous call and report a false -> true transition.
    ///
    /// Must be called exactly once per loop iteration; the edge is only
    /// reported on the first call after the transition.
    pub fn rising_edge(&mut self) -> bool {
        let rise = !self.prev_stable && self.stable;
        self.prev_stable = self.stable;
        rise
    }

    /// Sample (when due) and run edge detection
    pub fn update(&mut self, now_us: u64, raw_level: bool) -> bool {
        self.sample(now_us, raw_level);
        self.rising_edge()
    }

    /// Debounced logical level
    pub fn is_pressed(&self) -> bool {
        self.stable
    }

    pub fn samples(&self) -> [bool; WINDOW] {
        self.samples
    }

    /// Raw level of a released button
    pub fn idle_level(&self) -> bool {
        self.config.active_low
    }
}
