//! Operation trait definition
//!
//! Interface every robot behavior implements. Lifecycle hooks are called
//! by the controller; event hooks are reached through the controller's
//! injection entry points when a collaborator detects the corresponding
//! condition. Every event hook defaults to a no-op; a behavior overrides
//! exactly the edges it reacts to.

use super::context::{OpContext, OpShared};

/// One discrete robot behavior.
pub trait Op {
    /// Stable identifier for logging and telemetry.
    fn name(&self) -> &'static str;

    /// One-shot entry actions. May request a further transition through
    /// `shared` when entry itself fails (e.g. no route to the dock).
    fn begin(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>);

    /// Per-tick behavior; must complete in bounded time without blocking.
    fn run(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>);

    /// One-shot exit cleanup, called strictly before the successor's
    /// `begin()`.
    fn end(&mut self, shared: &mut OpShared, ctx: &mut OpContext<'_>);

    /// The active route point was reached.
    fn on_target_reached(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}

    /// No usable fix for longer than the estimator tolerates.
    fn on_gps_fix_timeout(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}

    /// GPS signal lost entirely.
    fn on_gps_no_signal(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}

    /// Kidnap state changed (robot lifted/displaced, or put back down).
    fn on_kidnapped(&mut self, _state: bool, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}

    /// A rotation attempt was blocked by an obstacle.
    fn on_obstacle_rotation(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}

    /// An obstacle was detected ahead.
    fn on_obstacle(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}

    /// A motor driver reported a fault.
    fn on_motor_error(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}

    /// The rain sensor triggered.
    fn on_rain_triggered(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}

    /// The charger made physical contact.
    fn on_charger_connected(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}

    /// The charger contact was lost.
    fn on_charger_disconnected(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}

    /// The battery finished charging.
    fn on_charging_completed(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}

    /// The current route has no further waypoints.
    fn on_no_further_waypoints(&mut self, _shared: &mut OpShared, _ctx: &mut OpContext<'_>) {}
}
