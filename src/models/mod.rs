//! Domain model module declarations.

pub mod adapter;
pub mod run;
pub mod signal;
