//! # uartlog-link - Serial Link Handling
//!
//! Everything that touches the byte stream before it becomes text: the serial
//! port itself, newline framing, crash dump capture, the external backtrace
//! tool, and forwarding of operator input back to the device.
//!
//! Depends on [`uartlog_core`] for configuration and error handling.
//!
//! ## Public API
//!
//! ### Transport
//! - [`SerialLink`] - Open a port and split it into read/write handles
//! - [`available_port_names()`] - Ports present on this machine
//!
//! ### Framing
//! - [`Framer`] - Lazy `\n`-delimited lines over a blocking reader
//!
//! ### Crash Capture
//! - [`CrashCapture`] - `###CRASH###` / `###END###` state machine
//! - [`CrashDump`] - Captured dump and its destination
//! - [`FeedResult`] - Result of feeding a line to the capture
//!
//! ### Backtraces
//! - [`BacktraceTool`] - Turns a dump file into a backtrace
//! - [`GdbBacktrace`] - gdb + CrashDebug implementation
//! - [`ToolAvailability`] - Startup check for the external tools
//!
//! ### Input
//! - [`InputForwarder`] - Relay operator lines to the link

pub mod backtrace;
pub mod crash;
pub mod forwarder;
pub mod framer;
pub mod serial;
pub mod tool_availability;

// Public API re-exports
pub use backtrace::{BacktraceTool, GdbBacktrace, ToolOutput};
pub use crash::{
    CrashCapture, CrashDump, DumpEnd, FeedResult, CRASH_END_MARKER, CRASH_START_MARKER,
};
pub use forwarder::{spawn_stdin_forwarder, ForwarderStats, InputForwarder};
pub use framer::{Framer, RawLine};
pub use serial::{available_port_names, SerialLink};
pub use tool_availability::ToolAvailability;
