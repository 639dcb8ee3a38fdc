//! Shared types for snipx executors
//!
//! Every executor, whatever runtime it drives, answers with the same
//! two-field [`ExecutionResult`]. The rules that turn captured stdout/stderr
//! and an exit condition into that result live in [`contract`].

pub mod contract;
pub mod types;

pub use contract::{
    classify, precheck, render, trim_line_endings, NO_CODE, NO_OUTPUT, STDERR_SEPARATOR,
};
pub use types::*;
