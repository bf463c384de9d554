//! CLI command implementations

pub mod can_delete;
pub mod config;
pub mod controller;
pub mod reconcile;
pub mod webhook;
