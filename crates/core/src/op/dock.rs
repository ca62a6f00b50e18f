//! Docking operation
//!
//! Drives the robot back to the charging station along a planned dock
//! route. Entry plans the route and may immediately re-route into recovery
//! or the error state when planning fails; while driving, every relevant
//! event has a fixed reaction, from escape maneuvers on obstacles to
//! waiting states on GPS loss.

use super::context::{OpContext, OpShared, SensorTrigger, WayMode};
use super::traits::Op;
use super::OpKind;

/// Docking behavior configuration.
#[derive(Debug, Clone, Copy)]
pub struct DockParams {
    /// A docking station exists (as opposed to a plain charge point)
    pub docking_station: bool,
    /// Resume mowing automatically after a full charge
    pub auto_start: bool,
    /// Escape maneuvers are allowed instead of hard-stopping on obstacles
    pub obstacle_avoidance: bool,
    /// Consecutive routing failures tolerated before giving up
    pub routing_failure_limit: u32,
}

impl Default for DockParams {
    fn default() -> Self {
        Self {
            docking_station: true,
            auto_start: true,
            obstacle_avoidance: true,
            routing_failure_limit: 60,
        }
    }
}

/// Dock operation state.
pub struct DockOp {
    params: DockParams,
    last_routing_failed: bool,
    routing_failed_count: u32,
}

impl DockOp {
    pub fn new(params: DockParams) -> Self {
        Self {
            params,
            last_routing_failed: false,
            routing_failed_count: 0,
        }
    }

    /// Consecutive routing failures so far.
    pub fn routing_failed_count(&self) -> u32 {
        self.routing_failed_count
    }
}

impl Op for DockOp {
    fn name(&self) -> &'static str {
        "Dock"
    }

    fn begin(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        crate::log_info!("OP_DOCK");
        ctx.motor.set_linear_angular_speed(0.0, 0.0);
        ctx.motor.set_mow_state(false);

        // A fresh operator command or a previously failed route both get a
        // clean slate of tracked obstacles
        if shared.initiated_by_operator || self.last_routing_failed {
            ctx.nav.clear_obstacles();
        }
        if shared.initiated_by_operator {
            shared.docking_initiated_by_operator = true;
            shared.dock_reason_rain = false;
        } else {
            shared.docking_initiated_by_operator = false;
        }

        let mut routing_failed = false;
        if ctx.nav.start_docking(ctx.pos_x, ctx.pos_y) {
            if ctx.nav.next_point(true) {
                ctx.nav.repeat_last_mowing_point();
                shared.last_fix_time_ms = ctx.now_ms;
                ctx.nav.set_last_target_point(ctx.pos_x, ctx.pos_y);
            } else {
                crate::log_error!("dock: no waypoints");
                routing_failed = true;
            }
        } else {
            routing_failed = true;
        }

        if routing_failed {
            shared.sensor = SensorTrigger::MapNoRoute;
            ctx.motor.set_mow_state(false);
            self.last_routing_failed = true;
            self.routing_failed_count += 1;
            ctx.stats.routing_errors += 1;
            if self.routing_failed_count > self.params.routing_failure_limit {
                crate::log_error!("dock: too many routing errors");
                shared.request(OpKind::Error);
            } else {
                shared.request_with_resume(OpKind::GpsRebootRecovery);
            }
        } else {
            self.last_routing_failed = false;
            self.routing_failed_count = 0;
        }
    }

    fn run(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        ctx.tracker.track_line(true);
        ctx.detector.detect_sensor_malfunction();
        if ctx.detector.detect_obstacle() {
            self.on_obstacle(shared, ctx);
        } else if ctx.detector.detect_obstacle_rotation() {
            self.on_obstacle_rotation(shared, ctx);
        }
        // Docking is not an idle state
        ctx.battery.reset_idle();
    }

    fn end(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}

    fn on_target_reached(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        // Reaching any route point re-arms the obstacle and fault budgets
        ctx.nav.clear_obstacles();
        shared.motor_error_count = 0;
        shared.sensor = SensorTrigger::None;
    }

    fn on_gps_fix_timeout(&mut self, shared: &mut OpShared, _ctx: &mut OpContext<'_>) {
        shared.request_with_resume(OpKind::GpsWaitFix);
    }

    fn on_gps_no_signal(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        // Undocking runs on odometry alone; no GPS needed yet
        if !ctx.nav.is_undocking() {
            shared.sensor = SensorTrigger::GpsInvalid;
            shared.request_with_resume(OpKind::GpsWaitFloat);
        }
    }

    fn on_kidnapped(&mut self, state: bool, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        if state {
            shared.sensor = SensorTrigger::Kidnapped;
            ctx.motor.stop_immediately();
            ctx.motor.set_mow_state(false);
            shared.request_with_resume(OpKind::KidnapWait);
        }
    }

    fn on_obstacle_rotation(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        crate::log_error!("dock: rotation blocked by obstacle");
        ctx.stats.mow_obstacles += 1;
        shared.sensor = SensorTrigger::Obstacle;
        shared.request(OpKind::Error);
    }

    fn on_obstacle(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        if ctx.battery.charger_connected() {
            // Dock-connector proximity fakes obstacles; not a real one
            crate::log_info!("dock: obstacle ignored, charger connected");
            return;
        }
        crate::log_info!("dock: obstacle");
        ctx.stats.mow_obstacles += 1;
        if ctx.nav.is_docking() && ctx.nav.retry_docking(ctx.pos_x, ctx.pos_y) {
            shared.request_with_resume(OpKind::EscapeReverse);
            return;
        }
        if self.params.obstacle_avoidance && ctx.nav.way_mode() != WayMode::Dock {
            shared.request_with_resume(OpKind::EscapeReverse);
        } else {
            shared.sensor = SensorTrigger::Obstacle;
            crate::log_error!("dock: obstacle on final leg");
            shared.request(OpKind::Error);
        }
    }

    fn on_motor_error(&mut self, shared: &mut OpShared, _ctx: &mut OpContext<'_>) {
        shared.motor_error_count += 1;
        shared.sensor = SensorTrigger::MotorFault;
        crate::log_error!("dock: motor error");
        shared.request(OpKind::Error);
    }

    fn on_charger_connected(&mut self, shared: &mut OpShared, _ctx: &mut OpContext<'_>) {
        shared.request(OpKind::Charge);
    }

    fn on_charging_completed(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        if self.params.docking_station
            && !shared.docking_initiated_by_operator
            && ctx.nav.mow_points_idx() > 0
            && self.params.auto_start
            && !shared.dock_reason_rain
        {
            crate::log_info!("dock: charging completed, resuming mowing");
            shared.initiated_by_operator = false;
            shared.request(OpKind::Mow);
        }
    }

    fn on_no_further_waypoints(&mut self, shared: &mut OpShared, _ctx: &mut OpContext<'_>) {
        crate::log_info!("docking finished");
        shared.request(OpKind::Idle);
    }
}
