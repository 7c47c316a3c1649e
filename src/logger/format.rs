//! Log formatting and console output with ANSI colors
//!
//! Handles:
//! - Colorized output with aligned tag and level columns
//! - Timestamp prefix
//! - Broken pipe handling for piped commands
use chrono::Local;
use colored::*;
use std::io::{ stdout, ErrorKind, Write };

use super::tags::LogTag;

/// Column widths for alignment
const TAG_WIDTH: usize = 10;
const LEVEL_WIDTH: usize = 8;

/// Format and output a log message
pub fn format_and_log(tag: LogTag, level: &str, message: &str) {
    let time = Local::now().format("%H:%M:%S").to_string();

    let tag_plain = tag.to_plain_string();
    let tag_pad = " ".repeat(TAG_WIDTH.saturating_sub(tag_plain.len()));
    let level_pad = " ".repeat(LEVEL_WIDTH.saturating_sub(level.len()));

    let level_colored = match level {
        "ERROR" => level.red().bold(),
        "WARNING" => level.yellow().bold(),
        "DEBUG" => level.purple(),
        "VERBOSE" => level.dimmed(),
        _ => level.normal(),
    };

    let line = format!(
        "{} [{}]{} [{}]{} {}",
        time.dimmed(),
        tag.colored(),
        tag_pad,
        level_colored,
        level_pad,
        message
    );

    print_stdout_safe(&line);
}

/// Print to stdout, ignoring broken pipes (e.g. `reflector-cast | head`)
fn print_stdout_safe(line: &str) {
    let mut out = stdout();
    if let Err(e) = writeln!(out, "{}", line) {
        if e.kind() == ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
    }
    let _ = out.flush();
}
