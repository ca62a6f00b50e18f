//! Charging operation
//!
//! Holds at the charge contacts with charging enabled. Once the battery
//! reports full, mowing resumes automatically when the dock was reached
//! automatically, the route is unfinished and rain was not the reason for
//! coming home; otherwise the robot stays docked.

use super::context::{OpContext, OpShared};
use super::traits::Op;
use super::OpKind;

/// Charging behavior configuration.
#[derive(Debug, Clone, Copy)]
pub struct ChargeParams {
    /// A docking station exists (as opposed to a plain charge point)
    pub docking_station: bool,
    /// Resume mowing automatically after a full charge
    pub auto_start: bool,
}

impl Default for ChargeParams {
    fn default() -> Self {
        Self {
            docking_station: true,
            auto_start: true,
        }
    }
}

pub struct ChargeOp {
    params: ChargeParams,
}

impl ChargeOp {
    pub fn new(params: ChargeParams) -> Self {
        Self { params }
    }
}

impl Op for ChargeOp {
    fn name(&self) -> &'static str {
        "Charge"
    }

    fn begin(&mut self, _shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        crate::log_info!("OP_CHARGE");
        ctx.motor.set_linear_angular_speed(0.0, 0.0);
        ctx.motor.set_mow_state(false);
        ctx.battery.enable_charging(true);
    }

    fn run(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}

    fn end(&mut self, _shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        ctx.battery.enable_charging(false);
    }

    fn on_charger_disconnected(&mut self, shared: &mut OpShared, _ctx: &mut OpContext<'_>) {
        crate::log_info!("charge: charger disconnected");
        shared.request(OpKind::Idle);
    }

    fn on_charging_completed(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>) {
        if self.params.docking_station
            && !shared.docking_initiated_by_operator
            && ctx.nav.mow_points_idx() > 0
            && self.params.auto_start
            && !shared.dock_reason_rain
        {
            crate::log_info!("charge: completed, resuming mowing");
            shared.initiated_by_operator = false;
            shared.request(OpKind::Mow);
        }
    }
}
