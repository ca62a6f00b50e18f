//! Scenario tests driving the operation state machine end to end through
//! the simulation harness: routing-retry ladders, obstacle handling,
//! recovery-and-resume flows and the charge/auto-restart decision.

use mowbot_core::op::{ChargeParams, GpsSolution, OpConfig, OpKind};
use mowbot_sim::SimRobot;

#[test]
fn first_routing_failure_retries_through_reboot_recovery() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.nav.dock_route = false;

    robot.start(OpKind::Dock);

    assert_eq!(robot.active(), OpKind::GpsRebootRecovery);
    assert_eq!(robot.controller.resume_target(), Some(OpKind::Dock));
    assert_eq!(robot.gps.reboots, 1);
    assert_eq!(robot.stats.routing_errors, 1);
}

#[test]
fn routing_failure_ladder_gives_up_on_the_61st_attempt() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.nav.dock_route = false;

    // Failure 1 happens on entry; the GPS solution is fine, so every tick
    // of reboot recovery resumes docking, which fails again
    robot.start(OpKind::Dock);
    for attempt in 2..=60 {
        robot.advance(10);
        assert_eq!(
            robot.active(),
            OpKind::GpsRebootRecovery,
            "attempt {} should still retry",
            attempt
        );
    }

    // Attempt 61 exceeds the limit of 60 consecutive failures
    robot.advance(10);
    assert_eq!(robot.active(), OpKind::Error);
    assert_eq!(robot.stats.routing_errors, 61);

    // Terminal: no further retries happen on their own
    robot.advance(1000);
    assert_eq!(robot.active(), OpKind::Error);
}

#[test]
fn routing_success_resets_the_failure_ladder() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.nav.dock_route = false;

    robot.start(OpKind::Dock);
    for _ in 0..20 {
        robot.advance(10);
    }
    assert_eq!(robot.active(), OpKind::GpsRebootRecovery);

    // Route comes back: docking proceeds and the counter resets
    robot.nav.dock_route = true;
    robot.advance(10);
    assert_eq!(robot.active(), OpKind::Dock);

    // A later string of failures starts counting from zero again
    robot.nav.dock_route = false;
    robot.change_op(OpKind::Dock, false);
    for _ in 0..50 {
        robot.advance(10);
        assert_eq!(robot.active(), OpKind::GpsRebootRecovery);
    }
}

#[test]
fn obstacle_while_charger_connected_changes_nothing() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Dock);
    robot.battery.connected = true;

    robot.on_obstacle();

    assert_eq!(robot.active(), OpKind::Dock);
    assert_eq!(robot.stats.mow_obstacles, 0);
}

#[test]
fn dock_obstacle_with_retry_escapes_and_resumes() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Dock);
    robot.nav.retry_ok = true;

    robot.on_obstacle();
    assert_eq!(robot.active(), OpKind::EscapeReverse);
    assert_eq!(robot.controller.resume_target(), Some(OpKind::Dock));
    assert!(robot.motion.linear < 0.0, "should be reversing");
    assert_eq!(robot.stats.mow_obstacles, 1);

    // Maneuver time elapses; control returns to docking
    robot.advance(3001);
    assert_eq!(robot.active(), OpKind::Dock);
}

#[test]
fn dock_obstacle_on_final_leg_is_fatal() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Dock);
    robot.nav.retry_ok = false;
    robot.nav.way = mowbot_core::op::WayMode::Dock;

    robot.on_obstacle();
    assert_eq!(robot.active(), OpKind::Error);
}

#[test]
fn rotation_blocked_by_obstacle_is_fatal() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Mow);

    robot.on_obstacle_rotation();
    assert_eq!(robot.active(), OpKind::Error);
    assert_eq!(robot.stats.mow_obstacles, 1);
}

#[test]
fn mow_obstacle_escapes_and_resumes_mowing() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Mow);
    assert!(robot.motion.mow_on);

    robot.on_obstacle();
    assert_eq!(robot.active(), OpKind::EscapeReverse);

    robot.advance(3001);
    assert_eq!(robot.active(), OpKind::Mow);
    assert_eq!(robot.nav.mow_plans, 2, "mow route replanned on resume");
    assert!(robot.motion.mow_on, "blades back on after resume");
}

#[test]
fn kidnap_holds_until_put_back_down() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Mow);

    robot.on_kidnapped(true);
    assert_eq!(robot.active(), OpKind::KidnapWait);
    assert!(!robot.motion.mow_on);
    assert!(robot.motion.hard_stops >= 1);

    // Still waiting while kidnapped
    robot.advance(1000);
    assert_eq!(robot.active(), OpKind::KidnapWait);

    robot.on_kidnapped(false);
    assert_eq!(robot.active(), OpKind::Mow);
}

#[test]
fn kidnap_wait_times_out_into_error() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Mow);

    robot.on_kidnapped(true);
    robot.advance(60_001);
    assert_eq!(robot.active(), OpKind::Error);
}

#[test]
fn gps_signal_loss_waits_for_float_then_resumes() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Mow);
    robot.gps.solution = GpsSolution::Invalid;

    robot.on_gps_no_signal();
    assert_eq!(robot.active(), OpKind::GpsWaitFloat);

    robot.advance(5000);
    assert_eq!(robot.active(), OpKind::GpsWaitFloat);

    robot.gps.solution = GpsSolution::Float;
    robot.advance(100);
    assert_eq!(robot.active(), OpKind::Mow);
}

#[test]
fn gps_wait_times_out_into_error() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Mow);
    robot.gps.solution = GpsSolution::Invalid;

    robot.on_gps_fix_timeout();
    assert_eq!(robot.active(), OpKind::GpsWaitFix);

    robot.advance(300_001);
    assert_eq!(robot.active(), OpKind::Error);
}

#[test]
fn docking_route_exhausted_parks_idle() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Dock);

    robot.on_no_further_waypoints();
    assert_eq!(robot.active(), OpKind::Idle);
}

#[test]
fn mowing_complete_heads_home() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Mow);

    robot.on_no_further_waypoints();
    assert_eq!(robot.active(), OpKind::Dock);
    assert!(!robot.motion.mow_on, "blades off on the way home");
}

#[test]
fn charging_completed_resumes_unfinished_mowing() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Mow);
    robot.nav.mow_idx = 5;

    // Battery monitor sends the robot home mid-route
    robot.change_op(OpKind::Dock, false);
    robot.on_charger_connected();
    assert_eq!(robot.active(), OpKind::Charge);
    assert!(robot.battery.charging_enabled);

    robot.on_charging_completed();
    assert_eq!(robot.active(), OpKind::Mow);
    assert!(!robot.battery.charging_enabled, "charging off after leaving");
}

#[test]
fn operator_docking_stays_docked_after_charge() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Mow);
    robot.nav.mow_idx = 5;

    robot.change_op(OpKind::Dock, true);
    robot.on_charger_connected();
    robot.on_charging_completed();

    assert_eq!(robot.active(), OpKind::Charge);
}

#[test]
fn completed_route_stays_docked_after_charge() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Mow);
    robot.nav.mow_idx = 0;

    robot.change_op(OpKind::Dock, false);
    robot.on_charger_connected();
    robot.on_charging_completed();

    assert_eq!(robot.active(), OpKind::Charge);
}

#[test]
fn auto_start_disabled_stays_docked_after_charge() {
    let config = OpConfig {
        charge: ChargeParams {
            auto_start: false,
            ..ChargeParams::default()
        },
        ..OpConfig::default()
    };
    let mut robot = SimRobot::new(config);
    robot.start(OpKind::Mow);
    robot.nav.mow_idx = 5;

    robot.change_op(OpKind::Dock, false);
    robot.on_charger_connected();
    robot.on_charging_completed();

    assert_eq!(robot.active(), OpKind::Charge);
}

#[test]
fn rain_docking_blocks_the_auto_restart() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Mow);
    robot.nav.mow_idx = 5;

    robot.on_rain_triggered();
    assert_eq!(robot.active(), OpKind::Dock);

    robot.on_charger_connected();
    robot.on_charging_completed();
    assert_eq!(robot.active(), OpKind::Charge, "rain keeps the robot in");
}

#[test]
fn charge_lifecycle_pairs_begin_and_end() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Idle);

    robot.change_op(OpKind::Charge, false);
    robot.change_op(OpKind::Idle, false);
    robot.change_op(OpKind::Charge, false);

    // begin() enables charging, end() disables it; the strict
    // end-before-next-begin ordering shows as a clean alternation
    assert_eq!(robot.battery.charge_calls, [true, false, true]);
}

#[test]
fn resume_without_target_is_a_noop() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Mow);

    robot.resume();
    assert_eq!(robot.active(), OpKind::Mow);
    assert!(robot.controller.resume_target().is_none());
}

#[test]
fn charger_disconnect_during_charge_goes_idle() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Dock);
    robot.on_charger_connected();
    assert_eq!(robot.active(), OpKind::Charge);

    robot.on_charger_disconnected();
    assert_eq!(robot.active(), OpKind::Idle);
}

#[test]
fn line_tracking_sees_the_docking_flag() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Dock);
    robot.tick();
    assert!(robot.tracker.last_docking);

    robot.change_op(OpKind::Mow, false);
    robot.tick();
    assert!(!robot.tracker.last_docking);
}

#[test]
fn run_detected_obstacle_flows_through_the_obstacle_edge() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Mow);

    // The detector reports an obstacle during the tick itself
    robot.detector.obstacle = true;
    robot.tick();

    assert_eq!(robot.active(), OpKind::EscapeReverse);
    assert_eq!(robot.stats.mow_obstacles, 1);
}

#[test]
fn transitions_are_recorded_for_telemetry() {
    let mut robot = SimRobot::new(OpConfig::default());
    robot.start(OpKind::Idle);
    robot.change_op(OpKind::Dock, false);
    robot.on_charger_connected();

    let recorded: Vec<(&str, &str)> = robot
        .controller
        .transitions()
        .iter()
        .map(|t| (t.from, t.to))
        .collect();
    assert_eq!(recorded, [("Idle", "Dock"), ("Dock", "Charge")]);
}
