//! Signal protocol handling.
//!
//! - `parser`: [`SignalParser`](parser::SignalParser), the per-run state
//!   machine turning stdout lines into [`Signal`](crate::models::signal::Signal)s.

pub mod parser;

pub use parser::SignalParser;
