//! Debounced digital event sensors
//!
//! Two acquisition patterns feed the operation layer with stable booleans:
//!
//! - **Interrupt-latched** ([`TriggerCell`] + [`Bumper`]): the pin-change
//!   handler latches a "triggered since" timestamp on the active edge and
//!   clears it on release; the poll reports "triggered" only after the
//!   signal has stayed asserted longer than the configured trigger time,
//!   rejecting mechanical bounce and impulse contact.
//! - **Rate-limited level poll** ([`PolledSwitch`]): the poll reads the
//!   level through an injected [`LevelInput`] at 10 Hz and caches the
//!   result, which is cheap enough for lift/rain/stop signals that need no
//!   dwell filtering.

use core::sync::atomic::{AtomicU32, Ordering};

/// Poll period of the level-polled sensors (10 Hz).
const LEVEL_POLL_PERIOD_MS: u64 = 100;

/// Reads the electrical state of a digital trigger line.
///
/// `true` means the line is at its active level (pressed / raining /
/// lifted), whatever polarity the board wires.
pub trait LevelInput {
    fn is_active(&mut self) -> bool;
}

/// Interrupt-latched "triggered since" timestamp.
///
/// Written only by the pin-change interrupt handler, read only by the
/// owning poll. Zero means released; an active edge at boot time is nudged
/// to 1 ms so it is never mistaken for "released".
#[derive(Default)]
pub struct TriggerCell {
    since_ms: AtomicU32,
}

impl TriggerCell {
    pub const fn new() -> Self {
        Self {
            since_ms: AtomicU32::new(0),
        }
    }

    /// Record a pin change. Call from the interrupt handler only.
    pub fn record(&self, active: bool, now_ms: u32) {
        let value = if active { now_ms.max(1) } else { 0 };
        self.since_ms.store(value, Ordering::Relaxed);
    }

    /// Timestamp of the latest active edge, 0 while released.
    pub fn triggered_since(&self) -> u32 {
        self.since_ms.load(Ordering::Relaxed)
    }
}

/// Bumper configuration.
#[derive(Debug, Clone, Copy)]
pub struct BumperConfig {
    /// Contact must stay asserted this long before it counts, ms
    pub trigger_time_ms: u32,
}

impl Default for BumperConfig {
    fn default() -> Self {
        Self {
            trigger_time_ms: 100,
        }
    }
}

/// Two-sided mechanical bumper with dwell-time filtering.
pub struct Bumper<'a> {
    left: &'a TriggerCell,
    right: &'a TriggerCell,
    config: BumperConfig,
}

impl<'a> Bumper<'a> {
    pub fn new(left: &'a TriggerCell, right: &'a TriggerCell, config: BumperConfig) -> Self {
        Self {
            left,
            right,
            config,
        }
    }

    /// Per-side triggered state: asserted and held past the trigger time.
    pub fn triggered(&self, now_ms: u32) -> (bool, bool) {
        let held = |since: u32| since != 0 && now_ms.wrapping_sub(since) > self.config.trigger_time_ms;
        (
            held(self.left.triggered_since()),
            held(self.right.triggered_since()),
        )
    }

    /// Either side triggered.
    pub fn obstacle(&self, now_ms: u32) -> bool {
        let (left, right) = self.triggered(now_ms);
        left || right
    }
}

/// Rate-limited polled switch; the shared body of the lift, rain and
/// stop-button sensors.
pub struct PolledSwitch<I: LevelInput> {
    input: I,
    active: bool,
    next_poll_ms: u64,
}

impl<I: LevelInput> PolledSwitch<I> {
    pub fn new(input: I) -> Self {
        Self {
            input,
            active: false,
            next_poll_ms: 0,
        }
    }

    /// Poll routine; reads the line at most every 100 ms.
    pub fn run(&mut self, now_ms: u64) {
        if now_ms < self.next_poll_ms {
            return;
        }
        self.next_poll_ms = now_ms + LEVEL_POLL_PERIOD_MS;
        self.active = self.input.is_active();
    }

    /// Cached triggered state from the most recent poll.
    pub fn triggered(&self) -> bool {
        self.active
    }
}

/// Operator stop button.
pub type StopButton<I> = PolledSwitch<I>;

/// Rain detector.
pub type RainSensor<I> = PolledSwitch<I>;

/// Chassis lift detector.
pub type LiftSensor<I> = PolledSwitch<I>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_contact_below_trigger_time_is_ignored() {
        let left = TriggerCell::new();
        let right = TriggerCell::new();
        let bumper = Bumper::new(&left, &right, BumperConfig::default());

        left.record(true, 1000);
        // 80 ms later: shorter than the 100 ms trigger time
        assert_eq!(bumper.triggered(1080), (false, false));

        left.record(false, 1080);
        assert_eq!(bumper.triggered(1300), (false, false));
    }

    #[test]
    fn held_contact_reports_triggered() {
        let left = TriggerCell::new();
        let right = TriggerCell::new();
        let bumper = Bumper::new(&left, &right, BumperConfig::default());

        right.record(true, 1000);
        assert_eq!(bumper.triggered(1101), (false, true));
        assert!(bumper.obstacle(1101));

        // Release clears immediately
        right.record(false, 1200);
        assert!(!bumper.obstacle(1300));
    }

    #[test]
    fn active_edge_at_time_zero_still_latches() {
        let left = TriggerCell::new();
        let right = TriggerCell::new();
        let bumper = Bumper::new(&left, &right, BumperConfig::default());

        left.record(true, 0);
        assert_eq!(bumper.triggered(200), (true, false));
    }

    struct MockLevel {
        active: bool,
        reads: u32,
    }

    impl LevelInput for MockLevel {
        fn is_active(&mut self) -> bool {
            self.reads += 1;
            self.active
        }
    }

    #[test]
    fn polled_switch_caches_between_polls() {
        let mut switch = PolledSwitch::new(MockLevel {
            active: true,
            reads: 0,
        });

        switch.run(0);
        assert!(switch.triggered());
        assert_eq!(switch.input.reads, 1);

        // The line releases, but the next poll slot has not come up yet
        switch.input.active = false;
        switch.run(50);
        assert!(switch.triggered());
        assert_eq!(switch.input.reads, 1);

        switch.run(100);
        assert!(!switch.triggered());
        assert_eq!(switch.input.reads, 2);
    }
}
