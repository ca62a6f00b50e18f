//! GPS reboot recovery operation
//!
//! Last-resort GPS recovery: reboot the receiver, hold still until the
//! solution returns to fixed, then resume the interrupted operation.
//! Entered when route planning keeps failing, on the theory that a
//! drifting solution poisoned the map position.

use super::context::{GpsSolution, OpContext, OpShared};
use super::gps_wait::GpsWaitParams;
use super::traits::Op;
use super::OpKind;

pub struct GpsRebootRecoveryOp {
    params: GpsWaitParams,
    entered_ms: u64,
}

impl GpsRebootRecoveryOp {
    pub fn new(params: GpsWaitParams) -> Self {
        Self {
            params,
            entered_ms: 0,
        }
    }
}

impl Op for GpsRebootRecoveryOp {
    fn name(&self) -> &'static str {
        "GpsRebootRecovery"
    }

    fn begin(&mut self, _shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        crate::log_info!("OP_GPS_REBOOT_RECOVERY");
        ctx.motor.set_linear_angular_speed(0.0, 0.0);
        ctx.motor.set_mow_state(false);
        ctx.gps.reboot();
        self.entered_ms = ctx.now_ms;
    }

    fn run(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        if ctx.gps.solution() == GpsSolution::Fixed {
            crate::log_info!("gps fix after reboot");
            shared.last_fix_time_ms = ctx.now_ms;
            shared.request_resume();
        } else if ctx.now_ms.saturating_sub(self.entered_ms) > self.params.timeout_ms {
            crate::log_error!("gps reboot recovery timed out");
            shared.request(OpKind::Error);
        }
    }

    fn end(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}
}
