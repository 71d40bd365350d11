//! Tool availability checking for crash decoding
//!
//! Crash capture still works without the external tools (the dump is written
//! to disk), but the operator should know up front that no backtrace will be
//! printed.

use std::path::PathBuf;

use uartlog_core::Config;

/// Availability of the external crash decoding tools
#[derive(Debug, Clone, Default)]
pub struct ToolAvailability {
    /// Resolved gdb executable, if found
    pub gdb_path: Option<PathBuf>,

    /// Resolved CrashDebug executable, if found
    pub crashdebug_path: Option<PathBuf>,
}

impl ToolAvailability {
    /// Check tool availability (run once at startup)
    pub fn check(config: &Config) -> Self {
        let gdb_path = which::which(&config.gdb)
            .inspect_err(|e| tracing::debug!("{} lookup failed: {}", config.gdb, e))
            .ok();
        let crashdebug_path = which::which(&config.crashdebug)
            .inspect_err(|e| tracing::debug!("{} lookup failed: {}", config.crashdebug, e))
            .ok();

        Self {
            gdb_path,
            crashdebug_path,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.gdb_path.is_some() && self.crashdebug_path.is_some()
    }

    /// User-facing warnings for every missing tool
    pub fn warnings(&self, config: &Config) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.gdb_path.is_none() {
            warnings.push(format!(
                "'{}' not found; crash dumps will be saved but not decoded",
                config.gdb
            ));
        }
        if self.crashdebug_path.is_none() {
            warnings.push(format!(
                "CrashDebug not found at '{}'; set [debugger] crashdebug or --crashdebug",
                config.crashdebug
            ));
        }
        warnings
    }
}
