//! Kidnap wait operation
//!
//! The robot was lifted or displaced. Hold everything until it is put
//! back where the estimator expects it, then resume; give up with an
//! error if that never happens.

use super::context::{OpContext, OpShared};
use super::traits::Op;
use super::OpKind;

/// Kidnap recovery configuration.
#[derive(Debug, Clone, Copy)]
pub struct KidnapParams {
    /// Give up and error out after waiting this long, ms
    pub timeout_ms: u64,
}

impl Default for KidnapParams {
    fn default() -> Self {
        Self { timeout_ms: 60_000 }
    }
}

pub struct KidnapWaitOp {
    params: KidnapParams,
    entered_ms: u64,
}

impl KidnapWaitOp {
    pub fn new(params: KidnapParams) -> Self {
        Self {
            params,
            entered_ms: 0,
        }
    }
}

impl Op for KidnapWaitOp {
    fn name(&self) -> &'static str {
        "KidnapWait"
    }

    fn begin(&mut self, _shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        crate::log_info!("OP_KIDNAP_WAIT");
        ctx.motor.stop_immediately();
        ctx.motor.set_mow_state(false);
        self.entered_ms = ctx.now_ms;
    }

    fn run(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        if ctx.now_ms.saturating_sub(self.entered_ms) > self.params.timeout_ms {
            crate::log_error!("kidnap wait timed out");
            shared.request(OpKind::Error);
        }
    }

    fn end(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}

    fn on_kidnapped(&mut self, state: bool, shared: &mut OpShared, _ctx: &mut OpContext<'_>) {
        if !state {
            crate::log_info!("kidnap resolved");
            shared.request_resume();
        }
    }
}
