//! Operation state machine
//!
//! One discrete robot behavior at a time. Each behavior is an operation
//! with entry/exit/per-tick logic and a table of event reactions; the
//! [`OpController`] owns every variant, executes the active one each
//! control-loop tick and performs transitions between them.
//!
//! # Lifecycle
//!
//! 1. `begin()` - called once on entry; may itself request a further
//!    transition (e.g. a failed docking route heads straight into recovery)
//! 2. `run()` - called every control-loop tick while active; never blocks
//! 3. `end()` - called once on exit, strictly before the next `begin()`
//!
//! # Edges
//!
//! Transitions are driven by event callbacks (`on_obstacle`,
//! `on_kidnapped`, `on_charger_connected`, ...) injected by the
//! collaborators that detect the physical condition. The active operation
//! decides, per its own semantics, which transition an edge causes; the
//! controller only executes it.
//!
//! Recovery operations (GPS wait, kidnap wait, reboot recovery) remember
//! the interrupted operation through the controller's single resume slot
//! and return to it once their condition clears.

mod charge;
mod context;
mod controller;
mod dock;
mod error;
mod escape;
mod gps_reboot;
mod gps_wait;
mod idle;
mod kidnap;
mod mow;
mod traits;

pub use charge::{ChargeOp, ChargeParams};
pub use context::{
    BatteryControl, GpsControl, GpsSolution, HazardDetector, LineTracker, MotionControl,
    Navigator, OpContext, OpRequest, OpShared, SensorTrigger, WayMode,
};
pub use controller::OpController;
pub use dock::{DockOp, DockParams};
pub use error::ErrorOp;
pub use escape::{EscapeParams, EscapeReverseOp};
pub use gps_reboot::GpsRebootRecoveryOp;
pub use gps_wait::{GpsWaitFixOp, GpsWaitFloatOp, GpsWaitParams};
pub use idle::IdleOp;
pub use kidnap::{KidnapParams, KidnapWaitOp};
pub use mow::{MowOp, MowParams};
pub use traits::Op;

/// Closed set of operation variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Idle,
    Dock,
    Mow,
    Charge,
    Error,
    EscapeReverse,
    GpsWaitFix,
    GpsWaitFloat,
    GpsRebootRecovery,
    KidnapWait,
}

/// Aggregated operation configuration.
#[derive(Debug, Clone, Default)]
pub struct OpConfig {
    pub dock: DockParams,
    pub mow: MowParams,
    pub charge: ChargeParams,
    pub escape: EscapeParams,
    pub gps_wait: GpsWaitParams,
    pub kidnap: KidnapParams,
}
