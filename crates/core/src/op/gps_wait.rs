//! GPS wait operations
//!
//! Two narrow recovery states that hold the robot still until the GPS
//! solution is good enough to continue, then resume the interrupted
//! operation. Each doubles as its own watchdog: waiting longer than the
//! configured limit is an error.

use super::context::{GpsSolution, OpContext, OpShared};
use super::traits::Op;
use super::OpKind;

/// GPS recovery configuration, shared by the wait and reboot states.
#[derive(Debug, Clone, Copy)]
pub struct GpsWaitParams {
    /// Give up and error out after waiting this long, ms
    pub timeout_ms: u64,
}

impl Default for GpsWaitParams {
    fn default() -> Self {
        Self {
            timeout_ms: 300_000,
        }
    }
}

/// Wait for a fixed (RTK) solution.
pub struct GpsWaitFixOp {
    params: GpsWaitParams,
    entered_ms: u64,
}

impl GpsWaitFixOp {
    pub fn new(params: GpsWaitParams) -> Self {
        Self {
            params,
            entered_ms: 0,
        }
    }
}

impl Op for GpsWaitFixOp {
    fn name(&self) -> &'static str {
        "GpsWaitFix"
    }

    fn begin(&mut self, _shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        crate::log_info!("OP_GPS_WAIT_FIX");
        ctx.motor.set_linear_angular_speed(0.0, 0.0);
        ctx.motor.set_mow_state(false);
        self.entered_ms = ctx.now_ms;
    }

    fn run(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        if ctx.gps.solution() == GpsSolution::Fixed {
            crate::log_info!("gps fix acquired");
            shared.last_fix_time_ms = ctx.now_ms;
            shared.request_resume();
        } else if ctx.now_ms.saturating_sub(self.entered_ms) > self.params.timeout_ms {
            crate::log_error!("gps fix wait timed out");
            shared.request(OpKind::Error);
        }
    }

    fn end(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}
}

/// Wait for at least a float solution.
pub struct GpsWaitFloatOp {
    params: GpsWaitParams,
    entered_ms: u64,
}

impl GpsWaitFloatOp {
    pub fn new(params: GpsWaitParams) -> Self {
        Self {
            params,
            entered_ms: 0,
        }
    }
}

impl Op for GpsWaitFloatOp {
    fn name(&self) -> &'static str {
        "GpsWaitFloat"
    }

    fn begin(&mut self, _shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        crate::log_info!("OP_GPS_WAIT_FLOAT");
        ctx.motor.set_linear_angular_speed(0.0, 0.0);
        ctx.motor.set_mow_state(false);
        self.entered_ms = ctx.now_ms;
    }

    fn run(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        if ctx.gps.solution() >= GpsSolution::Float {
            crate::log_info!("gps signal recovered");
            shared.request_resume();
        } else if ctx.now_ms.saturating_sub(self.entered_ms) > self.params.timeout_ms {
            crate::log_error!("gps float wait timed out");
            shared.request(OpKind::Error);
        }
    }

    fn end(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}
}
