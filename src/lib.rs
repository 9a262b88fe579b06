#![forbid(unsafe_code)]

//! Run headless coding agents as subprocesses and extract the progress
//! signals they embed in their output.

pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod runner;
pub mod signal;

pub use config::RunnerConfig;
pub use errors::{AppError, Result};
pub use models::adapter::AdapterDescriptor;
pub use models::run::{RunOptions, RunResult};
pub use models::signal::{Signal, SignalKind};
pub use monitor::{monitor, MonitorOptions};
pub use runner::run;
