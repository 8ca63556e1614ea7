//! Library entrypoint for uabuild.
//!
//! The primary interface is the `uabuild` binary. This lib target exists to
//! expose the pipeline stages to integration tests.

pub mod config;
pub mod deps;
pub mod error;
pub mod output;
pub mod package;
pub mod platform;
pub mod provision;
pub mod resolver;
pub mod toolchain;
