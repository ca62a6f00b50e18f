//! mowbot_core - Pure no_std behavioral core for the mowbot autonomous mower
//!
//! This crate contains the platform-agnostic decision layer of the robot:
//! the operation state machine and the sensor-acquisition logic that feeds
//! it. Everything here can be tested on host without hardware.
//!
//! # Design Principles
//!
//! - **Pure no_std**: No std library dependencies outside of tests
//! - **Trait abstractions**: Collaborators (navigation, motion, battery,
//!   line tracking, GPS) and pins are injected via traits
//! - **Interrupt/poll split**: Interrupt handlers write single atomic
//!   cells; the owning component polls, filters and publishes stable values
//! - **No blocking**: every `run()` and poll routine completes in bounded
//!   time so the cooperative main loop keeps its tick rate
//!
//! # Modules
//!
//! - [`op`]: Operation state machine (controller, operation variants,
//!   collaborator trait seams)
//! - [`sonar`]: Tri-sensor ultrasonic ranging with rolling-median filtering
//! - [`sensors`]: Debounced digital event sensors (bumper, lift, rain,
//!   stop button)
//! - [`motor`]: Motor driver abstraction (chip profiles, PWM/direction
//!   mapping, fault and current sense, odometry counters)
//! - [`telemetry`]: Statistics counters and the bounded transition log

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

mod logging;

pub mod motor;
pub mod op;
pub mod sensors;
pub mod sonar;
pub mod telemetry;
