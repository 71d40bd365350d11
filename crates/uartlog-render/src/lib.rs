//! # uartlog-render - Console Presentation
//!
//! Turns parsed lines into console text: local receive time, colored envelope
//! fields, level-colored message, and highlighted device timestamps.
//!
//! ## Public API
//!
//! - [`Presenter`] - Renders [`uartlog_core::ParsedLine`] values
//! - [`palette`] - Colors and styles used on the console

pub mod palette;
pub mod presenter;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use presenter::Presenter;
