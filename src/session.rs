//! Per-session append-only log.
//!
//! Every component writes human-readable progress lines here, and networks
//! that drop out of range are recorded as pretty-printed JSON. The sink is
//! a file for `wander` sessions and stdout for one-off CLI probes.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::network::ObservedNetwork;

/// File name of the log for a session started at `started`.
pub fn session_file_name(started: DateTime<Local>) -> String {
    started.format("%Y-%m-%d_%H%M%S.log").to_string()
}

pub struct SessionLog {
    out: Box<dyn Write + Send>,
    path: Option<PathBuf>,
    echo: bool,
}

impl SessionLog {
    /// Create the log file for a session started at `started` inside `dir`.
    pub fn create(dir: &Path, started: DateTime<Local>) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

        let path = dir.join(session_file_name(started));
        let file = File::create(&path)
            .with_context(|| format!("Failed to create session log: {}", path.display()))?;

        Ok(Self {
            out: Box::new(BufWriter::new(file)),
            path: Some(path),
            echo: true,
        })
    }

    /// Log straight to stdout, used by the one-shot CLI commands.
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout(), false)
    }

    /// Log into an arbitrary writer; `echo` mirrors lines through tracing.
    pub fn from_writer(writer: impl Write + Send + 'static, echo: bool) -> Self {
        Self {
            out: Box::new(writer),
            path: None,
            echo,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one line (multi-line text is written verbatim).
    pub fn line(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        if self.echo {
            info!(target: "session", "{}", message);
        }
        let result = if message.ends_with('\n') {
            self.out.write_all(message.as_bytes())
        } else {
            writeln!(self.out, "{}", message)
        };
        if let Err(e) = result {
            warn!("session log write failed: {}", e);
        }
    }

    /// Write the terminal record of a network that left radio range.
    pub fn record(&mut self, network: &ObservedNetwork) {
        self.line("> recording seen network");
        match serde_json::to_string_pretty(network) {
            Ok(json) => self.line(json),
            Err(e) => self.line(format!("can't marshal data: {}", e)),
        }
    }

    pub fn flush(&mut self) {
        if let Err(e) = self.out.flush() {
            warn!("session log flush failed: {}", e);
        }
    }
}

impl Drop for SessionLog {
    fn drop(&mut self) {
        let _ = self.out.flush();
    }
}
