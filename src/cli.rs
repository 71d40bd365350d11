//! Command line interface

use std::path::{Path, PathBuf};

use clap::Parser;
use uartlog_core::config::CONFIG_FILENAME;
use uartlog_core::prelude::*;
use uartlog_core::{load_settings, load_settings_from, Config, Settings};

/// uartlog - firmware log viewer and crash-dump catcher for a serial link
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "uartlog")]
#[command(about = "Live firmware log viewer with crash dump capture", long_about = None)]
pub struct Args {
    /// Serial port (e.g. /dev/ttyACM0, COM3)
    #[arg(short, long)]
    pub port: String,

    /// Firmware ELF; enables crash dump capture and backtraces
    #[arg(short, long, value_name = "ELF")]
    pub elf: Option<PathBuf>,

    /// Baud rate [default: 1000000]
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Full date, full source paths and timestamp deltas
    #[arg(long)]
    pub full: bool,

    /// Settings file [default: ./uartlog.toml if present]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debugger executable
    #[arg(long, value_name = "EXE")]
    pub gdb: Option<String>,

    /// CrashDebug executable
    #[arg(long, value_name = "EXE")]
    pub crashdebug: Option<String>,

    /// Where crash dumps are written (overwritten by every crash)
    #[arg(long, value_name = "PATH")]
    pub dump_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Args {
    /// Settings from `--config`, or from `uartlog.toml` in `cwd`
    pub fn load_settings(&self, cwd: &Path) -> Result<Settings> {
        match &self.config {
            Some(path) => load_settings_from(path),
            None => {
                debug!("Looking for {} in {}", CONFIG_FILENAME, cwd.display());
                Ok(load_settings(cwd))
            }
        }
    }

    /// Merge flags over `settings`; flags win
    pub fn into_config(self, settings: Settings) -> Config {
        let mut config = Config::from_settings(self.port, settings);
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        if self.elf.is_some() {
            config.elf = self.elf;
        }
        if let Some(gdb) = self.gdb {
            config.gdb = gdb;
        }
        if let Some(crashdebug) = self.crashdebug {
            config.crashdebug = crashdebug;
        }
        if let Some(dump_file) = self.dump_file {
            config.dump_file = dump_file;
        }
        config.full |= self.full;
        if self.no_color {
            config.color = false;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_port_is_required() {
        let err = Args::try_parse_from(["uartlog"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["uartlog", "-p", "/dev/ttyACM0"]).into_config(Settings::default());
        assert_eq!(config.port, "/dev/ttyACM0");
        assert_eq!(config.baud_rate, 1_000_000);
        assert!(config.elf.is_none());
        assert!(!config.crash_capture_enabled());
        assert!(!config.full);
        assert!(config.color);
    }

    #[test]
    fn test_short_flags() {
        let config = parse(&["uartlog", "-p", "COM3", "-e", "app.elf", "-b", "115200", "--full"])
            .into_config(Settings::default());
        assert_eq!(config.port, "COM3");
        assert_eq!(config.elf, Some(PathBuf::from("app.elf")));
        assert_eq!(config.baud_rate, 115_200);
        assert!(config.full);
        assert!(config.crash_capture_enabled());
    }

    #[test]
    fn test_flags_override_settings() {
        let mut settings = Settings::default();
        settings.link.baud = 9600;
        settings.debugger.elf = Some(PathBuf::from("from_file.elf"));
        settings.debugger.gdb = "gdb-multiarch".to_string();

        let config = parse(&[
            "uartlog",
            "--port",
            "/dev/ttyUSB0",
            "--baud",
            "460800",
            "--elf",
            "cli.elf",
            "--dump-file",
            "/tmp/dump.txt",
            "--no-color",
        ])
        .into_config(settings);

        assert_eq!(config.baud_rate, 460_800);
        assert_eq!(config.elf, Some(PathBuf::from("cli.elf")));
        assert_eq!(config.gdb, "gdb-multiarch");
        assert_eq!(config.dump_file, PathBuf::from("/tmp/dump.txt"));
        assert!(!config.color);
    }

    #[test]
    fn test_settings_used_when_flags_absent() {
        let mut settings = Settings::default();
        settings.link.baud = 9600;
        settings.display.full = true;
        settings.display.color = false;

        let config = parse(&["uartlog", "-p", "COM1"]).into_config(settings);
        assert_eq!(config.baud_rate, 9600);
        assert!(config.full);
        assert!(!config.color);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let temp = tempdir().unwrap();
        let args = parse(&["uartlog", "-p", "COM1", "--config", "/nonexistent/uartlog.toml"]);
        let err = args.load_settings(temp.path()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_settings_file_in_cwd() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("uartlog.toml"), "[link]\nbaud = 57600\n").unwrap();
        let args = parse(&["uartlog", "-p", "COM1"]);
        let settings = args.load_settings(temp.path()).unwrap();
        assert_eq!(settings.link.baud, 57_600);
    }
}
