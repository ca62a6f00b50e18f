//! Motor driver abstraction
//!
//! Maps signed speed requests onto pin-level direction/PWM output for a
//! configured driver chip, and reads back the chip's fault, current-sense
//! and odometry signals.
//!
//! # Features
//!
//! - Platform-independent pin traits (`PwmOut`, `DigitalOut`, `DigitalIn`,
//!   `AnalogIn`); the firmware layer wraps its HAL types behind them
//! - Named [`DriverChip`] profiles (MC33926, DRV8308, A4931) describing
//!   direction-pin polarity, PWM inversion, fault/enable active levels and
//!   the minimum PWM a chip can sustain
//! - Per-channel [`MotorChannel`]: speed mapping, fault read, fault-reset
//!   sequence, calibrated current sense
//! - [`OdometryCounter`]: interrupt-fed tick counter with spike rejection,
//!   read-and-cleared atomically by the poll
//!
//! # Speed mapping
//!
//! Requests are signed 8-bit PWM magnitudes (−255..=+255). A nonzero
//! magnitude below the chip's `min_pwm_speed` is raised to that minimum,
//! keeping its sign: below it the driver IC cannot reliably detect the PWM
//! edge and would hold its previous output.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

/// Milliseconds an odometry tick edge is ignored after the previous one.
const ODOMETRY_SPIKE_REJECT_MS: u32 = 3;

/// Logic level of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl core::ops::Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Motor control error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorError {
    /// Speed request outside −255..=+255
    InvalidSpeed,
    /// PWM hardware unavailable or write failed
    HardwareFault,
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::InvalidSpeed => write!(f, "speed outside -255..=255"),
            MotorError::HardwareFault => write!(f, "PWM hardware fault"),
        }
    }
}

/// PWM output pin abstraction.
///
/// Duty is an 8-bit magnitude (0..=255). Platform implementations scale to
/// their timer resolution.
pub trait PwmOut {
    fn set_duty(&mut self, duty: u8) -> Result<(), MotorError>;
}

/// Push-pull digital output abstraction.
pub trait DigitalOut {
    fn set_level(&mut self, level: Level);
}

/// Digital input abstraction.
pub trait DigitalIn {
    fn level(&mut self) -> Level;
}

/// Analog input abstraction, reporting the sensed voltage in volts.
pub trait AnalogIn {
    fn read_volts(&mut self) -> f32;
}

/// Static descriptor of a motor driver IC.
///
/// Selected at configuration time and never mutated afterwards; exactly one
/// profile is bound per physical motor channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverChip {
    pub name: &'static str,
    /// Invert the PWM magnitude when driving forward (nPWM input)
    pub forward_pwm_invert: bool,
    /// Direction-pin level for forward motion
    pub forward_dir_level: Level,
    /// Invert the PWM magnitude when driving in reverse
    pub reverse_pwm_invert: bool,
    /// Direction-pin level for reverse motion
    pub reverse_dir_level: Level,
    /// Level of the fault line when the chip reports a fault
    pub fault_active: Level,
    /// Level of the enable line that enables the chip
    pub enable_active: Level,
    /// Smallest PWM magnitude the chip sustains reliably
    pub min_pwm_speed: i16,
}

impl DriverChip {
    pub const MC33926: Self = Self {
        name: "MC33926",
        forward_pwm_invert: false,
        forward_dir_level: Level::Low,
        reverse_pwm_invert: true,
        reverse_dir_level: Level::High,
        fault_active: Level::Low,
        enable_active: Level::High,
        min_pwm_speed: 0,
    };

    pub const DRV8308: Self = Self {
        name: "DRV8308",
        forward_pwm_invert: false,
        forward_dir_level: Level::Low,
        reverse_pwm_invert: false,
        reverse_dir_level: Level::High,
        fault_active: Level::Low,
        enable_active: Level::Low,
        min_pwm_speed: 2,
    };

    pub const A4931: Self = Self {
        name: "A4931",
        forward_pwm_invert: false,
        forward_dir_level: Level::Low,
        reverse_pwm_invert: false,
        reverse_dir_level: Level::High,
        fault_active: Level::Low,
        enable_active: Level::Low,
        min_pwm_speed: 15,
    };

    /// Neutral profile for boards with their own driver electronics.
    pub const CUSTOM: Self = Self {
        name: "CUSTOM",
        forward_pwm_invert: false,
        forward_dir_level: Level::Low,
        reverse_pwm_invert: false,
        reverse_dir_level: Level::High,
        fault_active: Level::Low,
        enable_active: Level::Low,
        min_pwm_speed: 0,
    };
}

/// Offset/scale calibration converting sensed volts to amperes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentSense {
    pub offset_volts: f32,
    pub amps_per_volt: f32,
}

impl CurrentSense {
    /// Brushless gear/mow driver boards
    pub const BRUSHLESS: Self = Self {
        offset_volts: -1.65,
        amps_per_volt: 7.57,
    };

    /// Brushed gear driver boards
    pub const BRUSHED: Self = Self {
        offset_volts: 0.0,
        amps_per_volt: 1.905,
    };

    /// Brushed mow channel (half the sense resistance)
    pub const BRUSHED_MOW: Self = Self {
        offset_volts: 0.0,
        amps_per_volt: 3.81,
    };

    pub fn amps(&self, volts: f32) -> f32 {
        (volts + self.offset_volts) * self.amps_per_volt
    }
}

/// One physical motor channel bound to a driver chip profile.
pub struct MotorChannel<P, D, F, E, S>
where
    P: PwmOut,
    D: DigitalOut,
    F: DigitalIn,
    E: DigitalOut,
    S: AnalogIn,
{
    pwm: P,
    dir: D,
    fault: F,
    enable: E,
    sense: S,
    chip: DriverChip,
    sense_cal: CurrentSense,
}

impl<P, D, F, E, S> MotorChannel<P, D, F, E, S>
where
    P: PwmOut,
    D: DigitalOut,
    F: DigitalIn,
    E: DigitalOut,
    S: AnalogIn,
{
    /// Bind pins to a chip profile. Pins must be configured by the caller;
    /// the channel is not enabled until [`enable`](Self::enable) is called.
    pub fn new(
        pwm: P,
        dir: D,
        fault: F,
        enable: E,
        sense: S,
        chip: DriverChip,
        sense_cal: CurrentSense,
    ) -> Self {
        Self {
            pwm,
            dir,
            fault,
            enable,
            sense,
            chip,
            sense_cal,
        }
    }

    pub fn chip(&self) -> &DriverChip {
        &self.chip
    }

    /// Assert the chip's enable line.
    pub fn enable(&mut self) {
        self.enable.set_level(self.chip.enable_active);
    }

    /// Deassert the chip's enable line.
    pub fn disable(&mut self) {
        self.enable.set_level(!self.chip.enable_active);
    }

    /// Drive the channel at a signed PWM magnitude.
    ///
    /// Nonzero magnitudes below the chip's minimum are raised to the
    /// minimum, preserving sign; zero stays zero.
    pub fn set_speed(&mut self, speed: i16) -> Result<(), MotorError> {
        if !(-255..=255).contains(&speed) {
            return Err(MotorError::InvalidSpeed);
        }

        let speed = if speed != 0 && speed.abs() < self.chip.min_pwm_speed {
            self.chip.min_pwm_speed * speed.signum()
        } else {
            speed
        };
        let magnitude = speed.unsigned_abs() as u8;

        if speed < 0 {
            self.dir.set_level(self.chip.reverse_dir_level);
            if self.chip.reverse_pwm_invert {
                self.pwm.set_duty(255 - magnitude)?;
            } else {
                self.pwm.set_duty(magnitude)?;
            }
        } else {
            self.dir.set_level(self.chip.forward_dir_level);
            if self.chip.forward_pwm_invert {
                self.pwm.set_duty(255 - magnitude)?;
            } else {
                self.pwm.set_duty(magnitude)?;
            }
        }
        Ok(())
    }

    /// True while the chip's fault line is at its active level.
    pub fn fault(&mut self) -> bool {
        self.fault.level() == self.chip.fault_active
    }

    /// Clear a latched fault by toggling the enable line off and on.
    ///
    /// No-op when no fault is present.
    pub fn reset_fault(&mut self) {
        if self.fault() {
            self.enable.set_level(!self.chip.enable_active);
            self.enable.set_level(self.chip.enable_active);
        }
    }

    /// Calibrated channel current in amperes.
    pub fn current(&mut self) -> f32 {
        self.sense_cal.amps(self.sense.read_volts())
    }
}

/// Interrupt-fed odometry tick counter.
///
/// `record_tick` is the only writer and runs in interrupt context; `take`
/// is the only reader and runs from the owning poll routine. Edges closer
/// together than the spike-rejection window are discarded as noise.
#[derive(Default)]
pub struct OdometryCounter {
    ticks: AtomicU32,
    accept_after_ms: AtomicU32,
}

impl OdometryCounter {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
            accept_after_ms: AtomicU32::new(0),
        }
    }

    /// Count one encoder edge. Call from the tick interrupt handler only.
    pub fn record_tick(&self, now_ms: u32) {
        // Single writer: plain load/store ordering is sufficient
        if now_ms < self.accept_after_ms.load(Ordering::Relaxed) {
            return;
        }
        self.accept_after_ms.store(
            now_ms.wrapping_add(ODOMETRY_SPIKE_REJECT_MS),
            Ordering::Relaxed,
        );
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Return the ticks accumulated since the last call and reset the
    /// counter, atomically with respect to concurrent `record_tick` calls.
    pub fn take(&self) -> u32 {
        self.ticks.swap(0, Ordering::Relaxed)
    }

    /// Current count without clearing.
    pub fn peek(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockPwm {
        duty: u8,
    }

    impl PwmOut for MockPwm {
        fn set_duty(&mut self, duty: u8) -> Result<(), MotorError> {
            self.duty = duty;
            Ok(())
        }
    }

    struct MockOut {
        level: Level,
        history: std::vec::Vec<Level>,
    }

    impl MockOut {
        fn new() -> Self {
            Self {
                level: Level::Low,
                history: std::vec::Vec::new(),
            }
        }
    }

    impl DigitalOut for MockOut {
        fn set_level(&mut self, level: Level) {
            self.level = level;
            self.history.push(level);
        }
    }

    struct MockIn {
        level: Level,
    }

    impl DigitalIn for MockIn {
        fn level(&mut self) -> Level {
            self.level
        }
    }

    struct MockAdc {
        volts: f32,
    }

    impl AnalogIn for MockAdc {
        fn read_volts(&mut self) -> f32 {
            self.volts
        }
    }

    fn channel(
        chip: DriverChip,
        fault_level: Level,
        volts: f32,
    ) -> MotorChannel<MockPwm, MockOut, MockIn, MockOut, MockAdc> {
        MotorChannel::new(
            MockPwm { duty: 0 },
            MockOut::new(),
            MockIn { level: fault_level },
            MockOut::new(),
            MockAdc { volts },
            chip,
            CurrentSense::BRUSHED,
        )
    }

    #[test]
    fn forward_sets_dir_and_pwm() {
        let mut ch = channel(DriverChip::DRV8308, Level::High, 0.0);
        ch.set_speed(100).unwrap();
        assert_eq!(ch.dir.level, Level::Low);
        assert_eq!(ch.pwm.duty, 100);
    }

    #[test]
    fn reverse_inverts_pwm_when_profile_says_so() {
        // MC33926 drives reverse with inverted PWM
        let mut ch = channel(DriverChip::MC33926, Level::High, 0.0);
        ch.set_speed(-100).unwrap();
        assert_eq!(ch.dir.level, Level::High);
        assert_eq!(ch.pwm.duty, 155);
    }

    #[test]
    fn small_magnitude_raised_to_chip_minimum() {
        let mut ch = channel(DriverChip::A4931, Level::High, 0.0);

        ch.set_speed(5).unwrap();
        assert_eq!(ch.pwm.duty, 15);

        ch.set_speed(-5).unwrap();
        assert_eq!(ch.pwm.duty, 15);
        assert_eq!(ch.dir.level, Level::High);
    }

    #[test]
    fn zero_stays_zero() {
        let mut ch = channel(DriverChip::A4931, Level::High, 0.0);
        ch.set_speed(0).unwrap();
        assert_eq!(ch.pwm.duty, 0);
    }

    #[test]
    fn out_of_range_speed_rejected() {
        let mut ch = channel(DriverChip::CUSTOM, Level::High, 0.0);
        assert_eq!(ch.set_speed(256), Err(MotorError::InvalidSpeed));
        assert_eq!(ch.set_speed(-256), Err(MotorError::InvalidSpeed));
    }

    #[test]
    fn fault_read_against_active_level() {
        let mut ch = channel(DriverChip::MC33926, Level::Low, 0.0);
        assert!(ch.fault());
        ch.fault.level = Level::High;
        assert!(!ch.fault());
    }

    #[test]
    fn fault_reset_toggles_enable_off_then_on() {
        let mut ch = channel(DriverChip::MC33926, Level::Low, 0.0);
        ch.reset_fault();
        // MC33926 enable is active-high: expect Low then High
        assert_eq!(ch.enable.history, [Level::Low, Level::High]);
    }

    #[test]
    fn fault_reset_noop_without_fault() {
        let mut ch = channel(DriverChip::MC33926, Level::High, 0.0);
        ch.reset_fault();
        assert!(ch.enable.history.is_empty());
    }

    #[test]
    fn current_uses_offset_and_scale() {
        let mut ch = channel(DriverChip::CUSTOM, Level::High, 2.0);
        assert!((ch.current() - 3.81).abs() < 0.001);

        let cal = CurrentSense::BRUSHLESS;
        assert!((cal.amps(1.65) - 0.0).abs() < 0.001);
    }

    #[test]
    fn odometry_counts_and_clears() {
        let odo = OdometryCounter::new();
        odo.record_tick(10);
        odo.record_tick(20);
        assert_eq!(odo.peek(), 2);
        assert_eq!(odo.take(), 2);
        assert_eq!(odo.take(), 0);
    }

    #[test]
    fn odometry_rejects_spikes() {
        let odo = OdometryCounter::new();
        odo.record_tick(10);
        odo.record_tick(11); // within the 3 ms window
        odo.record_tick(12);
        odo.record_tick(14); // accepted again
        assert_eq!(odo.take(), 2);
    }
}
