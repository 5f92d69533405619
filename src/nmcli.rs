//! Helpers for NetworkManager's `nmcli` in terse (`-t`) mode.

use std::time::Duration;

use crate::error::{Result, WanderError};
use crate::process::{self, ToolOutput};

/// Timeout for quick nmcli queries (status, list, show).
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(15);

/// nmcli's exit status for "timeout expired" (`--wait`).
pub const EXIT_TIMEOUT: i32 = 3;

/// Run nmcli and fail on a non-zero exit.
pub fn query(args: &[&str]) -> Result<String> {
    let output = process::run("nmcli", args, QUERY_TIMEOUT)?;
    if !output.success() {
        return Err(WanderError::tool("nmcli", output.error_message()));
    }
    Ok(output.stdout)
}

/// Run nmcli without interpreting the exit status.
pub fn exec(args: &[&str], timeout: Duration) -> Result<ToolOutput> {
    process::run("nmcli", args, timeout)
}

/// Split one terse line into fields, honoring `\:` and `\\` escapes.
pub fn split_terse(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next) => current.push(next),
                None => current.push('\\'),
            },
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Split a `KEY:VALUE` line from `device show` on its first unescaped colon.
pub fn split_key_value(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once(':')?;
    Some((key.to_string(), unescape(value)))
}

fn unescape(value: &str) -> String {
    split_terse(value).join(":")
}

/// `--` is how nmcli prints an empty value.
pub fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == "--" {
        None
    } else {
        Some(value.to_string())
    }
}
