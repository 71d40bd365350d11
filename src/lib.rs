//! uartlog library
//!
//! Receive loop and process wiring for the `uartlog` binary. The building
//! blocks live in the `uartlog-core`, `uartlog-link` and `uartlog-render`
//! crates.

pub mod cli;
pub mod runner;
pub mod session;
pub mod signals;

pub use cli::Args;
pub use runner::run;
pub use session::{Session, SessionStats};
