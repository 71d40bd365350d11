//! End-to-end receive loop tests
//!
//! Drive a [`Session`] over an in-memory byte stream, through the real framer,
//! crash capture, parser and presenter, with a scripted backtrace tool.

use std::cell::RefCell;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::{tempdir, TempDir};
use uartlog::Session;
use uartlog_core::{Config, Error, Result};
use uartlog_link::{BacktraceTool, Framer, ToolOutput};
use uartlog_render::test_utils::{contains_ansi_codes, strip_ansi_codes};

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

/// Records every dump it is asked to decode, along with the dump contents
/// at that moment
#[derive(Clone, Default)]
struct ScriptedTool {
    calls: Rc<RefCell<Vec<Vec<u8>>>>,
    stdout: String,
    code: Option<i32>,
    fail: bool,
}

impl ScriptedTool {
    fn printing(stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            code: Some(0),
            ..Self::default()
        }
    }

    /// Prints `stdout` and then exits with `code`, like gdb losing the target
    fn exiting(code: i32, stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            code: Some(code),
            ..Self::default()
        }
    }

    fn missing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl BacktraceTool for ScriptedTool {
    fn command_line(&self, dump: &Path) -> String {
        format!("scripted-gdb --dump {}", dump.display())
    }

    fn backtrace(&self, dump: &Path) -> Result<ToolOutput> {
        self.calls.borrow_mut().push(std::fs::read(dump)?);
        if self.fail {
            return Err(Error::tool("'scripted-gdb' not found in PATH"));
        }
        Ok(ToolOutput {
            stdout: self.stdout.clone(),
            code: self.code,
        })
    }
}

struct Fixture {
    temp: TempDir,
    config: Config,
}

impl Fixture {
    fn new(with_elf: bool) -> Self {
        let temp = tempdir().unwrap();
        let mut config = Config::new("/dev/ttyTEST");
        config.color = false;
        config.dump_file = temp.path().join("last_crash_dump.txt");
        if with_elf {
            config.elf = Some(temp.path().join("firmware.elf"));
        }
        Self { temp, config }
    }

    fn dump_path(&self) -> PathBuf {
        self.config.dump_file.clone()
    }

    /// Run `input` through a session and return the console output
    fn run(&self, tool: Option<ScriptedTool>, input: &[u8]) -> String {
        let mut session = Session::new(&self.config, tool, Vec::new());
        let mut framer = Framer::new(Cursor::new(input.to_vec()));
        session.run(&mut framer).unwrap();
        String::from_utf8(session.into_console()).unwrap()
    }
}

/// Console lines with the local time column removed
fn without_local_time(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| match line.split_once(" [") {
            Some((time, rest)) if time.contains(':') && !time.contains('[') => {
                format!("[{}", rest)
            }
            _ => line.to_string(),
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Crash capture
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_crash_dump_between_log_lines() {
    let fixture = Fixture::new(true);
    let tool = ScriptedTool::printing("#0  0x0800 in main () at main.c:10\n");

    let output = fixture.run(
        Some(tool.clone()),
        b"###CRASH###\nAA\nBB\n###END###\n[1700000000:1:1:main.c:5] next log\n",
    );

    assert_eq!(tool.call_count(), 1);
    assert_eq!(tool.calls.borrow()[0], b"AA\nBB\n");
    assert_eq!(std::fs::read(fixture.dump_path()).unwrap(), b"AA\nBB\n");

    let lines = without_local_time(&output);
    assert_eq!(lines[0], "Crash detected, retrieving crash info...");
    assert!(lines[1].starts_with("scripted-gdb --dump "));
    assert_eq!(lines[2], "Crash info retrieved.");
    assert_eq!(lines[3], "#0  0x0800 in main () at main.c:10");
    assert_eq!(lines[4], "---------");
    assert_eq!(lines[5], "[1700000000:1:main.c:5] next log");
    assert_eq!(lines.len(), 6);
}

#[test]
fn test_dump_keeps_crlf_and_whitespace() {
    let fixture = Fixture::new(true);
    let tool = ScriptedTool::printing("");

    fixture.run(
        Some(tool.clone()),
        b"  ###CRASH###  \r\nR0 00000000\r\n\r\n ###END###\r\n",
    );

    assert_eq!(
        std::fs::read(fixture.dump_path()).unwrap(),
        b"R0 00000000\r\n\r\n"
    );
    assert_eq!(tool.call_count(), 1);
}

#[test]
fn test_each_episode_overwrites_dump() {
    let fixture = Fixture::new(true);
    let tool = ScriptedTool::printing("bt\n");

    let output = fixture.run(
        Some(tool.clone()),
        b"###CRASH###\nFIRST\nDUMP\n###END###\nbetween\n###CRASH###\nSECOND\n###END###\n",
    );

    assert_eq!(tool.call_count(), 2);
    assert_eq!(tool.calls.borrow()[0], b"FIRST\nDUMP\n");
    assert_eq!(tool.calls.borrow()[1], b"SECOND\n");
    assert_eq!(std::fs::read(fixture.dump_path()).unwrap(), b"SECOND\n");
    assert_eq!(output.matches("---------").count(), 2);
    assert!(output.contains("\nbetween\n"));
}

#[test]
fn test_markers_pass_through_without_elf() {
    let fixture = Fixture::new(false);
    let tool = ScriptedTool::printing("never");

    let output = fixture.run(Some(tool.clone()), b"###CRASH###\nAA\n###END###\n");

    assert_eq!(tool.call_count(), 0);
    assert_eq!(output, "###CRASH###\nAA\n###END###\n");
    assert!(!fixture.dump_path().exists());
}

#[test]
fn test_missing_tool_still_prints_separator() {
    let fixture = Fixture::new(true);
    let tool = ScriptedTool::missing();

    let output = fixture.run(Some(tool.clone()), b"###CRASH###\nAA\n###END###\nafter\n");

    assert_eq!(tool.call_count(), 1);
    assert!(output.contains("Crash info retrieved.\nERROR: Backtrace tool error: "));
    assert!(output.ends_with("---------\nafter\n"));
}

#[test]
fn test_failing_tool_output_is_still_printed() {
    let fixture = Fixture::new(true);
    let tool = ScriptedTool::exiting(1, "partial bt\n");

    let output = fixture.run(
        Some(tool.clone()),
        b"###CRASH###\nAA\n###END###\n[1700000000:1:1:main.c:5] next log\n",
    );

    assert_eq!(tool.call_count(), 1);
    assert!(output.contains("Crash info retrieved.\npartial bt\n---------\n"));
    let lines = without_local_time(&output);
    assert_eq!(lines.last().unwrap(), "[1700000000:1:main.c:5] next log");
}

#[test]
fn test_stream_end_while_capturing_saves_partial_dump() {
    let fixture = Fixture::new(true);
    let tool = ScriptedTool::printing("never");

    let output = fixture.run(Some(tool.clone()), b"log\n###CRASH###\nAA\nBB");

    assert_eq!(tool.call_count(), 0);
    assert_eq!(std::fs::read(fixture.dump_path()).unwrap(), b"AA\nBB");
    assert!(output.ends_with("Crash dump incomplete: stream ended before end marker\n"));
}

#[test]
fn test_second_start_marker_is_rejected() {
    let fixture = Fixture::new(true);
    let tool = ScriptedTool::printing("bt\n");

    let output = fixture.run(
        Some(tool.clone()),
        b"###CRASH###\nAA\n###CRASH###\nBB\n###END###\n",
    );

    assert_eq!(tool.calls.borrow()[0], b"AA\nBB\n");
    assert!(output.contains("WARNING: crash marker received while a dump is open"));
}

#[test]
fn test_unwritable_dump_skips_tool() {
    let mut fixture = Fixture::new(true);
    fixture.config.dump_file = fixture.temp.path().join("missing-dir").join("dump.txt");
    let tool = ScriptedTool::printing("never");

    let output = fixture.run(Some(tool.clone()), b"###CRASH###\nAA\n###END###\nafter\n");

    assert_eq!(tool.call_count(), 0);
    assert!(output.contains("ERROR: Failed to write crash dump to "));
    assert!(output.ends_with("after\n"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Log lines
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_records_and_passthrough() {
    let fixture = Fixture::new(false);

    let output = fixture.run(
        None,
        b"[1700000000:6:4:../src/radio.c:88] tx timeout\r\nbootloader v1.2\nnoise [ 1:2] 12345\n",
    );

    let lines = without_local_time(&output);
    assert_eq!(lines[0], "[1700000000:6:src/radio.c:88] tx timeout");
    assert_eq!(lines[1], "bootloader v1.2");
    assert_eq!(lines[2], "noise [ 1:2] 12345");
}

#[test]
fn test_envelope_mismatch_passes_through_verbatim() {
    let fixture = Fixture::new(false);

    let output = fixture.run(None, b"[1700000000:1:12:a.c:1] two-digit level\n");

    assert_eq!(output, "[1700000000:1:12:a.c:1] two-digit level\n");
}

#[test]
fn test_full_mode_adds_deltas() {
    let mut fixture = Fixture::new(false);
    fixture.config.full = true;

    let output = fixture.run(None, b"[1700000000:1:1:../main.c:1] since 1700000000\n");

    let line = output.trim_end();
    assert!(line.contains(" [1700000000("));
    assert!(line.contains(":1:../main.c:1] since 1700000000("));
    assert!(line.ends_with("s)"));
}

#[test]
fn test_invalid_utf8_line_is_reported_and_dropped() {
    let fixture = Fixture::new(false);

    let output = fixture.run(None, b"before\n\xff\xfe bad\nafter\n");

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], "before");
    assert!(lines[1].starts_with("ERROR: Line is not valid UTF-8"));
    assert_eq!(lines[2], "after");
    assert_eq!(lines.len(), 3);
}

#[test]
fn test_colored_output_matches_plain() {
    let plain_fixture = Fixture::new(false);
    let mut color_fixture = Fixture::new(false);
    color_fixture.config.color = true;
    let input = b"[1700000000:3:2:../src/main.c:42] warn 1700000000\n";

    let plain = without_local_time(&plain_fixture.run(None, input));
    let colored_raw = color_fixture.run(None, input);
    let colored = without_local_time(&strip_ansi_codes(&colored_raw));

    assert!(contains_ansi_codes(&colored_raw) || std::env::var_os("NO_COLOR").is_some());
    assert_eq!(plain, colored);
}

#[test]
fn test_partial_last_line_is_rendered() {
    let fixture = Fixture::new(false);
    let output = fixture.run(None, b"first\nno newline at end");
    assert_eq!(output, "first\nno newline at end\n");
}
