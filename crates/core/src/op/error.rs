//! Error operation
//!
//! Terminal for the session: everything stopped, nothing reacted to.
//! Only an external operator command leaves this state.

use super::context::{OpContext, OpShared};
use super::traits::Op;

#[derive(Default)]
pub struct ErrorOp;

impl Op for ErrorOp {
    fn name(&self) -> &'static str {
        "Error"
    }

    fn begin(&mut self, _shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        crate::log_error!("OP_ERROR");
        ctx.motor.stop_immediately();
        ctx.motor.set_mow_state(false);
    }

    fn run(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}

    fn end(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}
}
