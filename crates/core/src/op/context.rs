//! Collaborator seams and shared operation state
//!
//! Operations never talk to hardware or services directly; everything they
//! need arrives through [`OpContext`], refreshed by the main loop each
//! tick. The traits here are the full surface the behavior layer
//! consumes: navigation, motion, battery, line tracking, hazard detection
//! and the GPS receiver are specified only at these seams.

use super::OpKind;
use crate::telemetry::Stats;

/// Route mode the navigator is currently driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WayMode {
    /// Final approach leg into the docking station
    Dock,
    /// Regular mowing route
    Mow,
    /// Free running between route points
    Free,
}

/// GPS solution quality, ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GpsSolution {
    Invalid,
    Float,
    Fixed,
}

/// Last sensor condition that forced a transition, for telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorTrigger {
    #[default]
    None,
    MapNoRoute,
    GpsInvalid,
    Kidnapped,
    Obstacle,
    MotorFault,
}

/// Mapping / route planning service.
pub trait Navigator {
    /// Plan a route from the given position to the docking station.
    fn start_docking(&mut self, x: f32, y: f32) -> bool;
    /// Plan the mowing route from the given position.
    fn start_mowing(&mut self, x: f32, y: f32) -> bool;
    /// Advance to the next route point; `first` marks the initial advance
    /// after planning. Returns false when no waypoint remains.
    fn next_point(&mut self, first: bool) -> bool;
    /// Re-queue the last mowing point so mowing resumes where it stopped.
    fn repeat_last_mowing_point(&mut self);
    /// Seed progress tracking with the point the robot is actually at.
    fn set_last_target_point(&mut self, x: f32, y: f32);
    /// Forget tracked obstacles, giving routing a fresh chance.
    fn clear_obstacles(&mut self);
    fn is_docking(&self) -> bool;
    fn is_undocking(&self) -> bool;
    /// Whether the current dock attempt can be retried from a different
    /// approach; plans the retry when it can.
    fn retry_docking(&mut self, x: f32, y: f32) -> bool;
    /// Index into the mowing route; nonzero means mowing is not complete.
    fn mow_points_idx(&self) -> usize;
    fn way_mode(&self) -> WayMode;
}

/// Drive and mow motor commands.
pub trait MotionControl {
    /// Request linear (m/s) and angular (rad/s) speed, ramped.
    fn set_linear_angular_speed(&mut self, linear: f32, angular: f32);
    /// Switch the mow motor on or off.
    fn set_mow_state(&mut self, on: bool);
    /// Stop without ramping; used when the robot must not move another cm.
    fn stop_immediately(&mut self);
}

/// Battery and charger primitives.
pub trait BatteryControl {
    fn charger_connected(&self) -> bool;
    /// Keep the idle power-off timer from expiring.
    fn reset_idle(&mut self);
    fn enable_charging(&mut self, on: bool);
}

/// Line (route segment) tracking controller.
pub trait LineTracker {
    fn track_line(&mut self, docking: bool);
}

/// Malfunction and obstacle detection.
pub trait HazardDetector {
    fn detect_sensor_malfunction(&mut self);
    /// True when an obstacle was detected this tick.
    fn detect_obstacle(&mut self) -> bool;
    /// True when a rotation attempt was blocked by an obstacle.
    fn detect_obstacle_rotation(&mut self) -> bool;
}

/// GPS receiver control.
pub trait GpsControl {
    fn solution(&self) -> GpsSolution;
    /// Request a receiver reboot; recovery is observed via `solution()`.
    fn reboot(&mut self);
}

/// Everything an operation may touch during a hook call.
///
/// Built by the main loop per tick; `now_ms` and the position snapshot are
/// refreshed before every call.
pub struct OpContext<'a> {
    pub nav: &'a mut dyn Navigator,
    pub motor: &'a mut dyn MotionControl,
    pub battery: &'a mut dyn BatteryControl,
    pub tracker: &'a mut dyn LineTracker,
    pub detector: &'a mut dyn HazardDetector,
    pub gps: &'a mut dyn GpsControl,
    pub stats: &'a mut Stats,
    /// Estimated position, map frame
    pub pos_x: f32,
    pub pos_y: f32,
    /// Control-loop time, milliseconds
    pub now_ms: u64,
}

/// A transition requested by an operation hook.
///
/// Hooks record the request; the controller performs it once the hook
/// returns, keeping the swap atomic with respect to the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpRequest {
    Change { to: OpKind, remember: bool },
    Resume,
}

/// State shared across operation variants.
///
/// The cross-variant flags the behaviors coordinate through, owned by the
/// controller and handed to every hook.
#[derive(Debug, Default)]
pub struct OpShared {
    /// Pending transition request; a newer request overwrites an older one
    pub(super) pending: Option<OpRequest>,
    /// The last external command was operator-issued
    pub initiated_by_operator: bool,
    /// The docking attempt in progress was operator-issued
    pub docking_initiated_by_operator: bool,
    /// Docking was triggered by rain; blocks automatic mow restart
    pub dock_reason_rain: bool,
    /// Motor fault budget; re-armed whenever a route point is reached
    pub motor_error_count: u32,
    /// Last sensor condition that forced a transition
    pub sensor: SensorTrigger,
    /// When a usable GPS fix was last seen, ms
    pub last_fix_time_ms: u64,
}

impl OpShared {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a transition with no way back.
    pub fn request(&mut self, to: OpKind) {
        self.pending = Some(OpRequest::Change {
            to,
            remember: false,
        });
    }

    /// Request a transition, remembering the current operation as the
    /// resume target.
    pub fn request_with_resume(&mut self, to: OpKind) {
        self.pending = Some(OpRequest::Change { to, remember: true });
    }

    /// Request a return to the remembered resume target.
    pub fn request_resume(&mut self) {
        self.pending = Some(OpRequest::Resume);
    }
}
