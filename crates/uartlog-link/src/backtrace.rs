//! Backtrace extraction for captured crash dumps.
//!
//! The dump is decoded by running gdb in batch mode against the firmware ELF,
//! with CrashDebug acting as a fake remote target that serves registers and
//! memory from the dump file.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use uartlog_core::prelude::*;
use uartlog_core::Config;

/// Captured result of one backtrace tool run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Everything the tool wrote to stdout
    pub stdout: String,

    /// Exit code, `None` if terminated by a signal
    pub code: Option<i32>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Something that turns a dump file into a human-readable backtrace
pub trait BacktraceTool {
    /// The command line, for display before it runs
    fn command_line(&self, dump: &Path) -> String;

    /// Run synchronously and capture stdout. Blocks until the tool exits.
    fn backtrace(&self, dump: &Path) -> Result<ToolOutput>;
}

/// `arm-none-eabi-gdb` + CrashDebug
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GdbBacktrace {
    pub gdb: String,
    pub crashdebug: String,
    pub elf: PathBuf,
}

impl GdbBacktrace {
    /// Build from the session config; `None` when no ELF is configured
    pub fn from_config(config: &Config) -> Option<Self> {
        let elf = config.elf.clone()?;
        Some(Self {
            gdb: config.gdb.clone(),
            crashdebug: config.crashdebug.clone(),
            elf,
        })
    }

    /// The `target remote | ...` pipe that serves the dump to gdb
    fn remote_target(&self, dump: &Path) -> String {
        format!(
            "target remote | {} --elf {} --dump {}",
            self.crashdebug,
            self.elf.display(),
            dump.display()
        )
    }

    pub fn args(&self, dump: &Path) -> Vec<String> {
        vec![
            "--batch".to_string(),
            "--quiet".to_string(),
            self.elf.display().to_string(),
            "-ex".to_string(),
            "set target-charset ASCII".to_string(),
            "-ex".to_string(),
            self.remote_target(dump),
            "-ex".to_string(),
            "set print pretty on".to_string(),
            "-ex".to_string(),
            "bt full".to_string(),
            "-ex".to_string(),
            "quit".to_string(),
        ]
    }
}

impl BacktraceTool for GdbBacktrace {
    fn command_line(&self, dump: &Path) -> String {
        let args: Vec<String> = self
            .args(dump)
            .into_iter()
            .map(|arg| {
                if arg.contains(' ') {
                    format!("\"{}\"", arg)
                } else {
                    arg
                }
            })
            .collect();
        format!("{} {}", self.gdb, args.join(" "))
    }

    fn backtrace(&self, dump: &Path) -> Result<ToolOutput> {
        info!("Running backtrace tool: {}", self.command_line(dump));

        let output = Command::new(&self.gdb)
            .args(self.args(dump))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::tool(format!("'{}' not found in PATH", self.gdb))
                } else {
                    Error::tool(format!("failed to run '{}': {}", self.gdb, e))
                }
            })?;

        let result = ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            code: output.status.code(),
        };

        if result.success() {
            info!("Backtrace tool finished ({} bytes)", result.stdout.len());
        } else {
            warn!("Backtrace tool exited with {:?}", result.code);
        }

        Ok(result)
    }
}
