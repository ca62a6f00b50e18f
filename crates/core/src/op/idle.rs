//! Idle operation
//!
//! Holding state with everything stopped. The battery idle timer keeps
//! running, so a robot left idle long enough powers itself off.

use super::context::{OpContext, OpShared};
use super::traits::Op;
use super::OpKind;

#[derive(Default)]
pub struct IdleOp;

impl Op for IdleOp {
    fn name(&self) -> &'static str {
        "Idle"
    }

    fn begin(&mut self, _shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        crate::log_info!("OP_IDLE");
        ctx.motor.set_linear_angular_speed(0.0, 0.0);
        ctx.motor.set_mow_state(false);
    }

    fn run(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}

    fn end(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}

    fn on_charger_connected(&mut self, shared: &mut OpShared, _ctx: &mut OpContext<'_>) {
        shared.request(OpKind::Charge);
    }
}
