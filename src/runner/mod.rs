//! Agent subprocess execution.
//!
//! - `codec`: [`OutputCodec`](codec::OutputCodec) newline framing for the
//!   child's stdout and stderr.
//! - `process`: [`run`](process::run), one agent invocation from launch to
//!   aggregated [`RunResult`](crate::models::run::RunResult).

pub mod codec;
pub mod process;

pub use process::run;
