//! Reverse-escape operation
//!
//! Short timed reverse away from an obstacle, then back to whatever was
//! interrupted. A second obstacle while already escaping means the robot
//! is wedged, and that is an error, not another retry.

use super::context::{OpContext, OpShared, SensorTrigger};
use super::traits::Op;
use super::OpKind;

/// Escape maneuver configuration.
#[derive(Debug, Clone, Copy)]
pub struct EscapeParams {
    /// Reverse speed magnitude, m/s
    pub reverse_speed: f32,
    /// How long to back up, ms
    pub duration_ms: u64,
}

impl Default for EscapeParams {
    fn default() -> Self {
        Self {
            reverse_speed: 0.25,
            duration_ms: 3000,
        }
    }
}

pub struct EscapeReverseOp {
    params: EscapeParams,
    until_ms: u64,
}

impl EscapeReverseOp {
    pub fn new(params: EscapeParams) -> Self {
        Self {
            params,
            until_ms: 0,
        }
    }
}

impl Op for EscapeReverseOp {
    fn name(&self) -> &'static str {
        "EscapeReverse"
    }

    fn begin(&mut self, _shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        crate::log_info!("OP_ESCAPE_REVERSE");
        ctx.motor.set_linear_angular_speed(-self.params.reverse_speed, 0.0);
        self.until_ms = ctx.now_ms + self.params.duration_ms;
    }

    fn run(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        if ctx.now_ms >= self.until_ms {
            ctx.motor.set_linear_angular_speed(0.0, 0.0);
            crate::log_info!("escape finished");
            shared.request_resume();
        }
    }

    fn end(&mut self, _shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        ctx.motor.set_linear_angular_speed(0.0, 0.0);
    }

    fn on_obstacle(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        crate::log_error!("escape: obstacle while reversing");
        ctx.stats.mow_obstacles += 1;
        shared.sensor = SensorTrigger::Obstacle;
        shared.request(OpKind::Error);
    }
}
