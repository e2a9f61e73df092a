//! Test infrastructure for the velt application
//!
//! Provides:
//! - A recording host that implements every host capability in memory
//! - Configuration and event fixtures
//! - Verification helpers for submitted forwarding objectives

pub mod fixtures;
mod recording;
mod verification;

pub use recording::{HostCall, RecordingHost};
pub use verification::*;
