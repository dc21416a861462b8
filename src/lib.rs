//! Intermediate Value Theorem calculator.
//!
//! A formula in `x` is parsed by [`expr`], checked against a target value on
//! an interval by [`ivt`], and drawn by [`plot`]. The remaining modules are
//! the command surfaces built on top of those three.

pub mod check;
pub mod cli;
pub mod config;
pub mod expr;
pub mod ivt;
#[cfg(feature = "line")]
pub mod line_mode;
pub mod logging;
pub mod output;
pub mod plot;
pub mod prompt;
pub mod query;
#[cfg(feature = "tui")]
mod render_help;
#[cfg(feature = "tui")]
pub mod tui_mode;
