//! Operation controller
//!
//! Owns one instance of every operation variant and the identity of the
//! active one. All transitions flow through here: the outgoing operation's
//! `end()` always runs before the incoming one's `begin()`, and a
//! `begin()` that immediately requests a further transition (a failed
//! route heading into recovery) is resolved before control returns to the
//! loop.
//!
//! Hooks never switch operations themselves: they record an [`OpRequest`]
//! in the shared state and the controller drains it, which keeps the
//! "exactly one operation is current" invariant trivially true and keeps
//! transitions out of interrupt context by construction.

use super::context::{OpContext, OpRequest, OpShared};
use super::traits::Op;
use super::{
    ChargeOp, DockOp, ErrorOp, EscapeReverseOp, GpsRebootRecoveryOp, GpsWaitFixOp,
    GpsWaitFloatOp, IdleOp, KidnapWaitOp, MowOp, OpConfig, OpKind,
};
use crate::telemetry::{Transition, TransitionLog};

/// Longest request chain a single entry point may resolve. Anything deeper
/// is a request cycle between `begin()` implementations.
const MAX_TRANSITION_CHAIN: u32 = 8;

/// Calls a method on the variant selected by an [`OpKind`].
///
/// Expands to direct field accesses so the variant and the shared state
/// can be borrowed disjointly.
macro_rules! dispatch {
    ($self:ident, $kind:expr, $method:ident($($args:expr),*)) => {
        match $kind {
            OpKind::Idle => $self.idle.$method($($args),*),
            OpKind::Dock => $self.dock.$method($($args),*),
            OpKind::Mow => $self.mow.$method($($args),*),
            OpKind::Charge => $self.charge.$method($($args),*),
            OpKind::Error => $self.error.$method($($args),*),
            OpKind::EscapeReverse => $self.escape.$method($($args),*),
            OpKind::GpsWaitFix => $self.gps_wait_fix.$method($($args),*),
            OpKind::GpsWaitFloat => $self.gps_wait_float.$method($($args),*),
            OpKind::GpsRebootRecovery => $self.gps_reboot.$method($($args),*),
            OpKind::KidnapWait => $self.kidnap.$method($($args),*),
        }
    };
}

/// Owner of the operation state machine.
pub struct OpController {
    idle: IdleOp,
    dock: DockOp,
    mow: MowOp,
    charge: ChargeOp,
    error: ErrorOp,
    escape: EscapeReverseOp,
    gps_wait_fix: GpsWaitFixOp,
    gps_wait_float: GpsWaitFloatOp,
    gps_reboot: GpsRebootRecoveryOp,
    kidnap: KidnapWaitOp,
    active: OpKind,
    resume_to: Option<OpKind>,
    shared: OpShared,
    transitions: TransitionLog,
    started: bool,
}

impl OpController {
    pub fn new(config: OpConfig) -> Self {
        Self {
            idle: IdleOp,
            dock: DockOp::new(config.dock),
            mow: MowOp::new(config.mow),
            charge: ChargeOp::new(config.charge),
            error: ErrorOp,
            escape: EscapeReverseOp::new(config.escape),
            gps_wait_fix: GpsWaitFixOp::new(config.gps_wait),
            gps_wait_float: GpsWaitFloatOp::new(config.gps_wait),
            gps_reboot: GpsRebootRecoveryOp::new(config.gps_wait),
            kidnap: KidnapWaitOp::new(config.kidnap),
            active: OpKind::Idle,
            resume_to: None,
            shared: OpShared::new(),
            transitions: TransitionLog::new(),
            started: false,
        }
    }

    /// Currently active operation.
    pub fn active(&self) -> OpKind {
        self.active
    }

    /// Name of the active operation, for logging and telemetry.
    pub fn active_name(&self) -> &'static str {
        self.name_of(self.active)
    }

    /// Remembered operation a recovery state would resume to.
    pub fn resume_target(&self) -> Option<OpKind> {
        self.resume_to
    }

    /// Read-only view of the cross-operation flags.
    pub fn shared(&self) -> &OpShared {
        &self.shared
    }

    /// Recorded transitions; drained by the telemetry layer.
    pub fn transitions(&self) -> &TransitionLog {
        &self.transitions
    }

    pub fn transitions_mut(&mut self) -> &mut TransitionLog {
        &mut self.transitions
    }

    /// Enter the initial operation. Must be called once before `tick`.
    pub fn start(&mut self, initial: OpKind, ctx: &mut OpContext<'_>) {
        self.transition(initial, false, ctx);
        self.drain_requests(ctx);
    }

    /// Switch operations on external command.
    ///
    /// `operator_initiated` marks commands issued by a person, which
    /// docking treats differently from automatic docking. Main-loop
    /// context only; never call from an interrupt handler.
    pub fn change_op(&mut self, to: OpKind, operator_initiated: bool, ctx: &mut OpContext<'_>) {
        self.shared.initiated_by_operator = operator_initiated;
        self.transition(to, false, ctx);
        self.drain_requests(ctx);
    }

    /// Return to the remembered operation, if any.
    pub fn resume(&mut self, ctx: &mut OpContext<'_>) {
        if let Some(target) = self.resume_to.take() {
            self.transition(target, false, ctx);
            self.drain_requests(ctx);
        }
    }

    /// Run the active operation for one control-loop tick.
    pub fn tick(&mut self, ctx: &mut OpContext<'_>) {
        if !self.started {
            return;
        }
        let active = self.active;
        dispatch!(self, active, run(&mut self.shared, ctx));
        self.drain_requests(ctx);
    }

    fn name_of(&self, kind: OpKind) -> &'static str {
        dispatch!(self, kind, name())
    }

    fn transition(&mut self, to: OpKind, remember: bool, ctx: &mut OpContext<'_>) {
        let from = self.active;
        if self.started {
            dispatch!(self, from, end(&mut self.shared, ctx));
            if remember {
                self.resume_to = Some(from);
            }
            let record = Transition {
                from: self.name_of(from),
                to: self.name_of(to),
                at_ms: ctx.now_ms,
            };
            crate::log_info!("op: {} -> {}", record.from, record.to);
            self.transitions.push(record);
        } else {
            crate::log_info!("op: start {}", self.name_of(to));
        }
        self.active = to;
        self.started = true;
        dispatch!(self, to, begin(&mut self.shared, ctx));
    }

    fn drain_requests(&mut self, ctx: &mut OpContext<'_>) {
        let mut depth = 0u32;
        while let Some(request) = self.shared.pending.take() {
            depth += 1;
            if depth > MAX_TRANSITION_CHAIN {
                crate::log_error!("op: transition chain too deep, stopping in error state");
                self.transition(OpKind::Error, false, ctx);
                break;
            }
            match request {
                OpRequest::Change { to, remember } => self.transition(to, remember, ctx),
                OpRequest::Resume => {
                    if let Some(target) = self.resume_to.take() {
                        self.transition(target, false, ctx);
                    }
                }
            }
        }
    }

    // Event injection entry points. Called by the collaborator that
    // detects the condition, from main-loop context; the active operation
    // decides what, if anything, the edge means.

    pub fn on_target_reached(&mut self, ctx: &mut OpContext<'_>) {
        if !self.started {
            return;
        }
        let active = self.active;
        dispatch!(self, active, on_target_reached(&mut self.shared, ctx));
        self.drain_requests(ctx);
    }

    pub fn on_gps_fix_timeout(&mut self, ctx: &mut OpContext<'_>) {
        if !self.started {
            return;
        }
        let active = self.active;
        dispatch!(self, active, on_gps_fix_timeout(&mut self.shared, ctx));
        self.drain_requests(ctx);
    }

    pub fn on_gps_no_signal(&mut self, ctx: &mut OpContext<'_>) {
        if !self.started {
            return;
        }
        let active = self.active;
        dispatch!(self, active, on_gps_no_signal(&mut self.shared, ctx));
        self.drain_requests(ctx);
    }

    pub fn on_kidnapped(&mut self, state: bool, ctx: &mut OpContext<'_>) {
        if !self.started {
            return;
        }
        let active = self.active;
        dispatch!(self, active, on_kidnapped(state, &mut self.shared, ctx));
        self.drain_requests(ctx);
    }

    pub fn on_obstacle_rotation(&mut self, ctx: &mut OpContext<'_>) {
        if !self.started {
            return;
        }
        let active = self.active;
        dispatch!(self, active, on_obstacle_rotation(&mut self.shared, ctx));
        self.drain_requests(ctx);
    }

    pub fn on_obstacle(&mut self, ctx: &mut OpContext<'_>) {
        if !self.started {
            return;
        }
        let active = self.active;
        dispatch!(self, active, on_obstacle(&mut self.shared, ctx));
        self.drain_requests(ctx);
    }

    pub fn on_motor_error(&mut self, ctx: &mut OpContext<'_>) {
        if !self.started {
            return;
        }
        let active = self.active;
        dispatch!(self, active, on_motor_error(&mut self.shared, ctx));
        self.drain_requests(ctx);
    }

    pub fn on_rain_triggered(&mut self, ctx: &mut OpContext<'_>) {
        if !self.started {
            return;
        }
        let active = self.active;
        dispatch!(self, active, on_rain_triggered(&mut self.shared, ctx));
        self.drain_requests(ctx);
    }

    pub fn on_charger_connected(&mut self, ctx: &mut OpContext<'_>) {
        if !self.started {
            return;
        }
        let active = self.active;
        dispatch!(self, active, on_charger_connected(&mut self.shared, ctx));
        self.drain_requests(ctx);
    }

    pub fn on_charger_disconnected(&mut self, ctx: &mut OpContext<'_>) {
        if !self.started {
            return;
        }
        let active = self.active;
        dispatch!(self, active, on_charger_disconnected(&mut self.shared, ctx));
        self.drain_requests(ctx);
    }

    pub fn on_charging_completed(&mut self, ctx: &mut OpContext<'_>) {
        if !self.started {
            return;
        }
        let active = self.active;
        dispatch!(self, active, on_charging_completed(&mut self.shared, ctx));
        self.drain_requests(ctx);
    }

    pub fn on_no_further_waypoints(&mut self, ctx: &mut OpContext<'_>) {
        if !self.started {
            return;
        }
        let active = self.active;
        dispatch!(self, active, on_no_further_waypoints(&mut self.shared, ctx));
        self.drain_requests(ctx);
    }
}
