//! Session configuration
//!
//! Settings come from an optional `uartlog.toml` and are overridden by CLI
//! flags. The merged [`Config`] is built once at startup and shared read-only
//! (behind an `Arc`) by every component.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::prelude::*;

pub const CONFIG_FILENAME: &str = "uartlog.toml";

/// Default link speed of the firmware UART (8N1)
pub const DEFAULT_BAUD_RATE: u32 = 1_000_000;

pub const DEFAULT_DUMP_FILE: &str = "last_crash_dump.txt";

pub const DEFAULT_GDB: &str = "arm-none-eabi-gdb";

/// Relative prefix the firmware build puts in front of `__FILE__`
pub const DEFAULT_STRIP_PREFIX: &str = "../";

/// Diagnostic log filter when neither `[log] filter` nor `UARTLOG_LOG` is set
pub const DEFAULT_LOG_FILTER: &str = "uartlog=info,warn";

/// Platform-specific path of the CrashDebug extraction executable
pub fn default_crashdebug() -> String {
    if cfg!(target_os = "macos") {
        "../CrashDebug/osx64/CrashDebug".to_string()
    } else {
        "../CrashDebug/lin64/CrashDebug".to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings file
// ─────────────────────────────────────────────────────────────────────────────

/// Contents of `uartlog.toml`; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub link: LinkSettings,
    pub debugger: DebuggerSettings,
    pub display: DisplaySettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    pub baud: u32,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            baud: DEFAULT_BAUD_RATE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DebuggerSettings {
    /// Firmware ELF with debug symbols; enables crash capture when set
    pub elf: Option<PathBuf>,
    pub gdb: String,
    pub crashdebug: String,
    pub dump_file: PathBuf,
}

impl Default for DebuggerSettings {
    fn default() -> Self {
        Self {
            elf: None,
            gdb: DEFAULT_GDB.to_string(),
            crashdebug: default_crashdebug(),
            dump_file: PathBuf::from(DEFAULT_DUMP_FILE),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub full: bool,
    pub color: bool,
    pub strip_prefix: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            full: false,
            color: true,
            strip_prefix: DEFAULT_STRIP_PREFIX.to_string(),
        }
    }
}

/// Diagnostic log file (never the console)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing` filter directives, e.g. `uartlog=debug`
    pub filter: String,
    /// Defaults to `<data_local_dir>/uartlog/logs`
    pub dir: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            dir: None,
        }
    }
}

/// Load settings from `dir/uartlog.toml`
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(dir: &Path) -> Settings {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match read_settings(&config_path) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Ignoring {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Load settings from an explicit path. Unlike [`load_settings`], a missing
/// or invalid file is an error.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    read_settings(path)
}

fn read_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    let settings = toml::from_str(&content)
        .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
    debug!("Loaded settings from {:?}", path);
    Ok(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable per-session configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Serial port name (`/dev/ttyACM0`, `COM3`)
    pub port: String,
    pub baud_rate: u32,

    /// Firmware ELF; `None` disables crash capture
    pub elf: Option<PathBuf>,
    pub gdb: String,
    pub crashdebug: String,
    pub dump_file: PathBuf,

    /// Full local date, full file paths and timestamp deltas
    pub full: bool,
    pub color: bool,
    /// Removed from source paths when not in full mode
    pub strip_prefix: String,

    pub log_filter: String,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Config for `port` with every other value at its default
    pub fn new(port: impl Into<String>) -> Self {
        Self::from_settings(port, Settings::default())
    }

    pub fn from_settings(port: impl Into<String>, settings: Settings) -> Self {
        Self {
            port: port.into(),
            baud_rate: settings.link.baud,
            elf: settings.debugger.elf,
            gdb: settings.debugger.gdb,
            crashdebug: settings.debugger.crashdebug,
            dump_file: settings.debugger.dump_file,
            full: settings.display.full,
            color: settings.display.color,
            strip_prefix: settings.display.strip_prefix,
            log_filter: settings.log.filter,
            log_dir: settings.log.dir,
        }
    }

    pub fn crash_capture_enabled(&self) -> bool {
        self.elf.is_some()
    }
}
