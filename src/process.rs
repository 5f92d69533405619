//! Bounded-wait execution of external tools.
//!
//! Every command this crate shells out to (`nmcli`, `wpa_cli`, `avahi-browse`,
//! `ip`) goes through [`run`], which enforces a deadline. Output pipes are
//! drained on helper threads so a chatty child can never block on a full
//! pipe while we poll it.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{Result, WanderError};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured result of a finished child process.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Error text, preferring stderr and falling back to stdout.
    pub fn error_message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Runs `program` with `args`, killing it once `timeout` elapses.
///
/// A spawn failure is a [`WanderError::ToolInvocation`], an expired deadline
/// is a [`WanderError::Timeout`]. A non-zero exit is not an error here;
/// callers inspect [`ToolOutput::status`].
pub fn run(program: &str, args: &[&str], timeout: Duration) -> Result<ToolOutput> {
    debug!("exec: {} {}", program, args.join(" "));

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| WanderError::tool(program, e))?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match wait_until(&mut child, Instant::now() + timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(WanderError::Timeout {
                operation: format!("{} {}", program, args.join(" ")),
                timeout,
            });
        }
        Err(e) => {
            let _ = child.kill();
            return Err(WanderError::tool(program, e));
        }
    };

    Ok(ToolOutput {
        status,
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    })
}

fn wait_until(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}
