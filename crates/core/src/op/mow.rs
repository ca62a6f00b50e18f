//! Mowing operation
//!
//! The working state: follows the planned mowing route with the blades
//! running. Structurally the mirror image of docking (same routing-retry
//! ladder on entry, same hazard reactions while driving) plus the edges
//! that send the robot home: rain, and route completion.

use super::context::{OpContext, OpShared, SensorTrigger};
use super::traits::Op;
use super::OpKind;

/// Mowing behavior configuration.
#[derive(Debug, Clone, Copy)]
pub struct MowParams {
    /// A docking station exists; route completion heads home
    pub docking_station: bool,
    /// Escape maneuvers are allowed instead of hard-stopping on obstacles
    pub obstacle_avoidance: bool,
    /// Consecutive routing failures tolerated before giving up
    pub routing_failure_limit: u32,
}

impl Default for MowParams {
    fn default() -> Self {
        Self {
            docking_station: true,
            obstacle_avoidance: true,
            routing_failure_limit: 60,
        }
    }
}

/// Mow operation state.
pub struct MowOp {
    params: MowParams,
    last_routing_failed: bool,
    routing_failed_count: u32,
}

impl MowOp {
    pub fn new(params: MowParams) -> Self {
        Self {
            params,
            last_routing_failed: false,
            routing_failed_count: 0,
        }
    }
}

impl Op for MowOp {
    fn name(&self) -> &'static str {
        "Mow"
    }

    fn begin(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        crate::log_info!("OP_MOW");
        ctx.motor.set_linear_angular_speed(0.0, 0.0);
        ctx.motor.set_mow_state(false);

        if shared.initiated_by_operator || self.last_routing_failed {
            ctx.nav.clear_obstacles();
        }

        let mut routing_failed = false;
        if ctx.nav.start_mowing(ctx.pos_x, ctx.pos_y) {
            if ctx.nav.next_point(true) {
                shared.last_fix_time_ms = ctx.now_ms;
                ctx.nav.set_last_target_point(ctx.pos_x, ctx.pos_y);
                // Blades only once a route exists
                ctx.motor.set_mow_state(true);
            } else {
                crate::log_error!("mow: no waypoints");
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
                crate::log_error!("mow: too many routing errors");
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
        ctx.tracker.track_line(false);
        ctx.detector.detect_sensor_malfunction();
        if ctx.detector.detect_obstacle() {
            self.on_obstacle(shared, ctx);
        } else if ctx.detector.detect_obstacle_rotation() {
            self.on_obstacle_rotation(shared, ctx);
        }
        ctx.battery.reset_idle();
    }

    fn end(&mut self, _shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        // Whatever comes next, it does not mow until it says so
        ctx.motor.set_mow_state(false);
    }

    fn on_target_reached(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        ctx.nav.clear_obstacles();
        shared.motor_error_count = 0;
        shared.sensor = SensorTrigger::None;
    }

    fn on_gps_fix_timeout(&mut self, shared: &mut OpShared, _ctx: &mut OpContext<'_>) {
        shared.request_with_resume(OpKind::GpsWaitFix);
    }

    fn on_gps_no_signal(&mut self, shared: &mut OpShared, _ctx: &mut OpContext<'_>) {
        shared.sensor = SensorTrigger::GpsInvalid;
        shared.request_with_resume(OpKind::GpsWaitFloat);
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
        crate::log_error!("mow: rotation blocked by obstacle");
        ctx.stats.mow_obstacles += 1;
        shared.sensor = SensorTrigger::Obstacle;
        shared.request(OpKind::Error);
    }

    fn on_obstacle(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        crate::log_info!("mow: obstacle");
        ctx.stats.mow_obstacles += 1;
        if self.params.obstacle_avoidance {
            shared.request_with_resume(OpKind::EscapeReverse);
        } else {
            shared.sensor = SensorTrigger::Obstacle;
            crate::log_error!("mow: obstacle");
            shared.request(OpKind::Error);
        }
    }

    fn on_motor_error(&mut self, shared: &mut OpShared, _ctx: &mut OpContext<'_>) {
        shared.motor_error_count += 1;
        shared.sensor = SensorTrigger::MotorFault;
        crate::log_error!("mow: motor error");
        shared.request(OpKind::Error);
    }

    fn on_rain_triggered(&mut self, shared: &mut OpShared, _ctx: &mut OpContext<'_>) {
        crate::log_info!("mow: rain detected, heading to dock");
        shared.dock_reason_rain = true;
        shared.initiated_by_operator = false;
        shared.request(OpKind::Dock);
    }

    fn on_no_further_waypoints(&mut self, shared: &mut OpShared, _ctx: &mut OpContext<'_>) {
        crate::log_info!("mowing finished");
        shared.initiated_by_operator = false;
        if self.params.docking_station {
            shared.request(OpKind::Dock);
        } else {
            shared.request(OpKind::Idle);
        }
    }
}
