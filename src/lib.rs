//! Parking Simulation Library
//!
//! A traffic and parking-lot simulation that can run independently or with a Bevy UI.

pub mod simulation;

#[cfg(feature = "ui")]
pub mod ui;
