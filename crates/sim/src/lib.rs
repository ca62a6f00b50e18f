//! mowbot_sim - Host-side simulation harness for the mowbot behavioral core
//!
//! Scriptable mock implementations of every collaborator seam, bundled
//! into a [`SimRobot`] that owns an operation controller and steps it the
//! way the firmware main loop would. Scenario tests drive the harness
//! through event sequences and assert on the resulting operation flow.

use mowbot_core::op::{
    BatteryControl, GpsControl, GpsSolution, HazardDetector, LineTracker, MotionControl,
    Navigator, OpConfig, OpContext, OpController, OpKind, WayMode,
};
use mowbot_core::telemetry::Stats;

/// Scripted mapping/navigation service.
///
/// Route planning outcomes are plain fields the test flips between steps.
pub struct SimNav {
    /// Result of the next `start_docking` call
    pub dock_route: bool,
    /// Result of the next `start_mowing` call
    pub mow_route: bool,
    /// Result of the next `next_point` call
    pub has_points: bool,
    /// Result of the next `retry_docking` call
    pub retry_ok: bool,
    pub docking: bool,
    pub undocking: bool,
    pub mow_idx: usize,
    pub way: WayMode,
    pub clear_obstacle_calls: u32,
    pub dock_plans: u32,
    pub mow_plans: u32,
}

impl Default for SimNav {
    fn default() -> Self {
        Self {
            dock_route: true,
            mow_route: true,
            has_points: true,
            retry_ok: false,
            docking: false,
            undocking: false,
            mow_idx: 0,
            way: WayMode::Free,
            clear_obstacle_calls: 0,
            dock_plans: 0,
            mow_plans: 0,
        }
    }
}

impl Navigator for SimNav {
    fn start_docking(&mut self, _x: f32, _y: f32) -> bool {
        self.dock_plans += 1;
        if self.dock_route {
            self.docking = true;
        }
        self.dock_route
    }

    fn start_mowing(&mut self, _x: f32, _y: f32) -> bool {
        self.mow_plans += 1;
        if self.mow_route {
            self.docking = false;
        }
        self.mow_route
    }

    fn next_point(&mut self, _first: bool) -> bool {
        self.has_points
    }

    fn repeat_last_mowing_point(&mut self) {}

    fn set_last_target_point(&mut self, _x: f32, _y: f32) {}

    fn clear_obstacles(&mut self) {
        self.clear_obstacle_calls += 1;
    }

    fn is_docking(&self) -> bool {
        self.docking
    }

    fn is_undocking(&self) -> bool {
        self.undocking
    }

    fn retry_docking(&mut self, _x: f32, _y: f32) -> bool {
        self.retry_ok
    }

    fn mow_points_idx(&self) -> usize {
        self.mow_idx
    }

    fn way_mode(&self) -> WayMode {
        self.way
    }
}

/// Recorded motion commands.
#[derive(Default)]
pub struct SimMotion {
    pub linear: f32,
    pub angular: f32,
    pub mow_on: bool,
    pub hard_stops: u32,
}

impl MotionControl for SimMotion {
    fn set_linear_angular_speed(&mut self, linear: f32, angular: f32) {
        self.linear = linear;
        self.angular = angular;
    }

    fn set_mow_state(&mut self, on: bool) {
        self.mow_on = on;
    }

    fn stop_immediately(&mut self) {
        self.linear = 0.0;
        self.angular = 0.0;
        self.hard_stops += 1;
    }
}

/// Battery/charger stand-in.
#[derive(Default)]
pub struct SimBattery {
    pub connected: bool,
    pub charging_enabled: bool,
    pub idle_resets: u32,
    /// Every `enable_charging` argument, in call order
    pub charge_calls: Vec<bool>,
}

impl BatteryControl for SimBattery {
    fn charger_connected(&self) -> bool {
        self.connected
    }

    fn reset_idle(&mut self) {
        self.idle_resets += 1;
    }

    fn enable_charging(&mut self, on: bool) {
        self.charging_enabled = on;
        self.charge_calls.push(on);
    }
}

/// Records line-tracking delegation.
#[derive(Default)]
pub struct SimTracker {
    pub calls: u32,
    pub last_docking: bool,
}

impl LineTracker for SimTracker {
    fn track_line(&mut self, docking: bool) {
        self.calls += 1;
        self.last_docking = docking;
    }
}

/// Scripted hazard detection.
#[derive(Default)]
pub struct SimDetector {
    pub obstacle: bool,
    pub rotation: bool,
    pub malfunction_checks: u32,
}

impl HazardDetector for SimDetector {
    fn detect_sensor_malfunction(&mut self) {
        self.malfunction_checks += 1;
    }

    fn detect_obstacle(&mut self) -> bool {
        self.obstacle
    }

    fn detect_obstacle_rotation(&mut self) -> bool {
        self.rotation
    }
}

/// Scripted GPS receiver.
pub struct SimGps {
    pub solution: GpsSolution,
    pub reboots: u32,
}

impl Default for SimGps {
    fn default() -> Self {
        Self {
            solution: GpsSolution::Fixed,
            reboots: 0,
        }
    }
}

impl GpsControl for SimGps {
    fn solution(&self) -> GpsSolution {
        self.solution
    }

    fn reboot(&mut self) {
        self.reboots += 1;
    }
}

macro_rules! ctx {
    ($robot:expr) => {
        OpContext {
            nav: &mut $robot.nav,
            motor: &mut $robot.motion,
            battery: &mut $robot.battery,
            tracker: &mut $robot.tracker,
            detector: &mut $robot.detector,
            gps: &mut $robot.gps,
            stats: &mut $robot.stats,
            pos_x: $robot.x,
            pos_y: $robot.y,
            now_ms: $robot.now_ms,
        }
    };
}

/// A whole robot on the bench: mock collaborators plus the operation
/// controller, stepped like the firmware main loop.
pub struct SimRobot {
    pub nav: SimNav,
    pub motion: SimMotion,
    pub battery: SimBattery,
    pub tracker: SimTracker,
    pub detector: SimDetector,
    pub gps: SimGps,
    pub stats: Stats,
    pub controller: OpController,
    pub now_ms: u64,
    pub x: f32,
    pub y: f32,
}

impl SimRobot {
    pub fn new(config: OpConfig) -> Self {
        Self {
            nav: SimNav::default(),
            motion: SimMotion::default(),
            battery: SimBattery::default(),
            tracker: SimTracker::default(),
            detector: SimDetector::default(),
            gps: SimGps::default(),
            stats: Stats::default(),
            controller: OpController::new(config),
            now_ms: 0,
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn start(&mut self, initial: OpKind) {
        self.controller.start(initial, &mut ctx!(self));
    }

    pub fn active(&self) -> OpKind {
        self.controller.active()
    }

    /// One control-loop tick at the current simulation time.
    pub fn tick(&mut self) {
        self.controller.tick(&mut ctx!(self));
    }

    /// Advance simulated time, then tick.
    pub fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
        self.tick();
    }

    pub fn change_op(&mut self, to: OpKind, operator_initiated: bool) {
        self.controller.change_op(to, operator_initiated, &mut ctx!(self));
    }

    pub fn resume(&mut self) {
        self.controller.resume(&mut ctx!(self));
    }

    // Event injection, the way the firmware wiring would deliver it.

    pub fn on_target_reached(&mut self) {
        self.controller.on_target_reached(&mut ctx!(self));
    }

    pub fn on_gps_fix_timeout(&mut self) {
        self.controller.on_gps_fix_timeout(&mut ctx!(self));
    }

    pub fn on_gps_no_signal(&mut self) {
        self.controller.on_gps_no_signal(&mut ctx!(self));
    }

    pub fn on_kidnapped(&mut self, state: bool) {
        self.controller.on_kidnapped(state, &mut ctx!(self));
    }

    pub fn on_obstacle_rotation(&mut self) {
        self.controller.on_obstacle_rotation(&mut ctx!(self));
    }

    pub fn on_obstacle(&mut self) {
        self.controller.on_obstacle(&mut ctx!(self));
    }

    pub fn on_motor_error(&mut self) {
        self.controller.on_motor_error(&mut ctx!(self));
    }

    pub fn on_rain_triggered(&mut self) {
        self.controller.on_rain_triggered(&mut ctx!(self));
    }

    /// Physical charger contact: updates the battery mock, then fires the
    /// edge.
    pub fn on_charger_connected(&mut self) {
        self.battery.connected = true;
        self.controller.on_charger_connected(&mut ctx!(self));
    }

    pub fn on_charger_disconnected(&mut self) {
        self.battery.connected = false;
        self.controller.on_charger_disconnected(&mut ctx!(self));
    }

    pub fn on_charging_completed(&mut self) {
        self.controller.on_charging_completed(&mut ctx!(self));
    }

    pub fn on_no_further_waypoints(&mut self) {
        self.controller.on_no_further_waypoints(&mut ctx!(self));
    }
}
