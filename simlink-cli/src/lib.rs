//! # simlink-cli: episode runner
//!
//! Connects to a simulator, waits for the controlled platform to appear,
//! and drives a configured number of episodes with a built-in policy.
//! Optionally records every observation as a Tacview ACMI replay.

pub mod config;
pub mod runner;
