//! focusflow - a focus timer with work/break sessions, history and crash recovery
//!
//! This library provides the timer state machine and its persistence; the
//! `focusflow` binary is a small terminal host around it.

pub mod app;
pub mod config;
pub mod logging;
pub mod stats;
pub mod store;
pub mod task;
pub mod theme;
pub mod timer;
