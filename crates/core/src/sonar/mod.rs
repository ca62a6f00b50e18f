//! Tri-sensor ultrasonic ranging
//!
//! Drives three HC-SR04 class sensors in round-robin, one armed at a time
//! so their pings cannot cross-talk. Echo edges are timestamped in
//! interrupt context into [`EchoCapture`]; the main-loop [`Sonar::run`]
//! poll consumes completed round-trip times, clamps them, filters each
//! channel through a rolling median and publishes calibrated distances at
//! a fixed cadence.
//!
//! A channel that produces no echo within its slot is fed the clamped
//! maximum duration instead, so a missing echo degrades to "far" rather
//! than going stale.

mod median;

pub use median::RunningMedian;

use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Number of multiplexed ranging sensors.
pub const SONAR_COUNT: usize = 3;

/// Channel indices.
pub const LEFT: usize = 0;
pub const CENTER: usize = 1;
pub const RIGHT: usize = 2;

/// Raw round-trip times are clamped to this before entering the median
/// window; the same value is injected on timeout.
const MAX_DURATION_US: u32 = 4000;

/// Microseconds of round-trip time per centimeter of distance.
const US_ROUNDTRIP_CM: u32 = 57;

/// Samples per channel in the median window.
const MEDIAN_WINDOW: usize = 9;

/// Fires the 10 µs trigger pulse on a ranging sensor.
///
/// Implemented by the firmware layer over its trigger pins.
pub trait SonarTrigger {
    fn pulse(&mut self, channel: usize);
}

/// Echo timing for one channel, written from interrupt context.
///
/// Two-write/one-flag protocol: the rising edge stores the start stamp and
/// clears the duration; the falling edge writes the duration last. A
/// nonzero duration is the "capture complete" flag the poller consumes
/// with an atomic swap-to-zero.
struct EchoCell {
    start_us: AtomicU32,
    duration_us: AtomicU32,
}

impl EchoCell {
    const fn new() -> Self {
        Self {
            start_us: AtomicU32::new(0),
            duration_us: AtomicU32::new(0),
        }
    }

    fn record_edge(&self, rising: bool, now_us: u32) {
        if rising {
            self.start_us.store(now_us, Ordering::Relaxed);
            self.duration_us.store(0, Ordering::Relaxed);
        } else {
            let start = self.start_us.load(Ordering::Relaxed);
            self.duration_us
                .store(now_us.wrapping_sub(start).max(1), Ordering::Relaxed);
        }
    }

    fn take(&self) -> u32 {
        self.duration_us.swap(0, Ordering::Relaxed)
    }
}

/// Shared echo capture state for all three channels.
///
/// The armed index selects the one channel whose edges are interpreted;
/// edges for any other channel are dropped at the interrupt boundary, the
/// way a disarmed sensor's stray reflections must be.
pub struct EchoCapture {
    cells: [EchoCell; SONAR_COUNT],
    armed: AtomicUsize,
}

impl EchoCapture {
    pub const fn new() -> Self {
        Self {
            cells: [EchoCell::new(), EchoCell::new(), EchoCell::new()],
            armed: AtomicUsize::new(0),
        }
    }

    /// Channel currently interpreting echo edges.
    pub fn armed(&self) -> usize {
        self.armed.load(Ordering::Relaxed)
    }

    /// Record an echo-pin edge. Call from the echo interrupt handler.
    ///
    /// Edges for channels other than the armed one are ignored.
    pub fn record_edge(&self, channel: usize, rising: bool, now_us: u32) {
        if channel >= SONAR_COUNT || channel != self.armed() {
            return;
        }
        self.cells[channel].record_edge(rising, now_us);
    }

    fn set_armed(&self, channel: usize) {
        self.armed.store(channel, Ordering::Relaxed);
    }

    fn take(&self, channel: usize) -> u32 {
        self.cells[channel].take()
    }
}

/// Ranging configuration.
#[derive(Debug, Clone)]
pub struct SonarConfig {
    pub enabled: bool,
    /// Hard obstacle threshold per channel (left, center, right), cm
    pub trigger_below_cm: [u16; SONAR_COUNT],
    /// Extra margin on top of the hard threshold for the near predicate, cm
    pub near_zone_cm: u16,
    /// Slot time per channel before a missing echo is treated as "far"
    pub cycle_timeout_ms: u64,
    /// Cadence at which filtered distances are converted and published
    pub publish_period_ms: u64,
    /// How long the near predicate stays latched after triggering
    pub near_hold_ms: u64,
    /// Round to the nearest centimeter instead of truncating
    pub round_to_nearest: bool,
}

impl Default for SonarConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_below_cm: [25, 25, 25],
            near_zone_cm: 10,
            cycle_timeout_ms: 50,
            publish_period_ms: 200,
            near_hold_ms: 5000,
            round_to_nearest: false,
        }
    }
}

/// Time-multiplexed tri-sensor ranging service.
pub struct Sonar<'a, T: SonarTrigger> {
    capture: &'a EchoCapture,
    trigger: T,
    config: SonarConfig,
    filters: [RunningMedian<MEDIAN_WINDOW>; SONAR_COUNT],
    distances_cm: [u16; SONAR_COUNT],
    added: bool,
    timeout_at_ms: u64,
    next_publish_ms: u64,
    near_latched_until_ms: u64,
}

impl<'a, T: SonarTrigger> Sonar<'a, T> {
    pub fn new(capture: &'a EchoCapture, trigger: T, config: SonarConfig) -> Self {
        Self {
            capture,
            trigger,
            config,
            filters: [RunningMedian::new(); SONAR_COUNT],
            distances_cm: [0; SONAR_COUNT],
            added: false,
            timeout_at_ms: 0,
            next_publish_ms: 0,
            near_latched_until_ms: 0,
        }
    }

    /// Poll routine; call once per control-loop tick.
    ///
    /// Consumes at most one completed capture, handles the per-channel
    /// slot timeout and advances the round-robin, and republishes
    /// distances when the publish period elapses. Never blocks.
    pub fn run(&mut self, now_ms: u64) {
        if !self.config.enabled {
            self.distances_cm = [0; SONAR_COUNT];
            return;
        }

        let armed = self.capture.armed();
        let duration = self.capture.take(armed);
        if duration != 0 {
            self.added = true;
            self.filters[armed].add(duration.min(MAX_DURATION_US));
        }

        if now_ms > self.timeout_at_ms {
            if !self.added {
                // No echo this slot: degrade to "far", not to stale
                self.filters[armed].add(MAX_DURATION_US);
            }
            let next = (armed + 1) % SONAR_COUNT;
            let _ = self.capture.take(next);
            self.capture.set_armed(next);
            self.trigger.pulse(next);
            self.timeout_at_ms = now_ms + self.config.cycle_timeout_ms;
            self.added = false;
        }

        if now_ms > self.next_publish_ms {
            self.next_publish_ms = now_ms + self.config.publish_period_ms;
            for channel in 0..SONAR_COUNT {
                let raw = self.filters[channel].median().unwrap_or(0);
                self.distances_cm[channel] = self.convert_cm(raw);
            }
        }
    }

    pub fn distance_left_cm(&self) -> u16 {
        self.distances_cm[LEFT]
    }

    pub fn distance_center_cm(&self) -> u16 {
        self.distances_cm[CENTER]
    }

    pub fn distance_right_cm(&self) -> u16 {
        self.distances_cm[RIGHT]
    }

    pub fn distances_cm(&self) -> [u16; SONAR_COUNT] {
        self.distances_cm
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Any channel inside its hard obstacle threshold.
    pub fn obstacle(&self) -> bool {
        if !self.config.enabled {
            return false;
        }
        let hit = (0..SONAR_COUNT)
            .any(|ch| self.distances_cm[ch] < self.config.trigger_below_cm[ch]);
        if hit {
            crate::log_info!(
                "sonar obstacle: L={} C={} R={}",
                self.distances_cm[LEFT],
                self.distances_cm[CENTER],
                self.distances_cm[RIGHT]
            );
        }
        hit
    }

    /// Any channel inside threshold-plus-margin, latched for the hold
    /// window once triggered.
    ///
    /// While the latch is active the distances are not re-evaluated; the
    /// predicate re-arms only after the window lapses.
    pub fn near_obstacle(&mut self, now_ms: u64) -> bool {
        if !self.config.enabled {
            return false;
        }
        if self.near_latched_until_ms != 0 && now_ms < self.near_latched_until_ms {
            return true;
        }
        self.near_latched_until_ms = 0;
        let near = (0..SONAR_COUNT).any(|ch| {
            self.distances_cm[ch] < self.config.trigger_below_cm[ch] + self.config.near_zone_cm
        });
        if near {
            self.near_latched_until_ms = now_ms + self.config.near_hold_ms;
            crate::log_info!(
                "sonar near obstacle: L={} C={} R={}",
                self.distances_cm[LEFT],
                self.distances_cm[CENTER],
                self.distances_cm[RIGHT]
            );
        }
        near
    }

    fn convert_cm(&self, duration_us: u32) -> u16 {
        if self.config.round_to_nearest {
            let rounded = (duration_us + US_ROUNDTRIP_CM / 2) / US_ROUNDTRIP_CM;
            rounded.max(u32::from(duration_us > 0)) as u16
        } else {
            (duration_us / US_ROUNDTRIP_CM) as u16
        }
    }
}
