//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (get, set, list, path, init)
//! - [`create`] - Create an aircraft
//! - [`reset`] - Reset the simulation
//! - [`scenario`] - Scenario and sector loading
//! - [`status`] - Engine link and simulation status
//! - [`step`] - Advance the simulation in stepped mode
//! - [`watch`] - Follow live simulation state

pub mod common;
pub mod config;
pub mod create;
pub mod reset;
pub mod scenario;
pub mod status;
pub mod step;
pub mod watch;
