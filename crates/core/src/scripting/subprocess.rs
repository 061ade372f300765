//! Running the host process.
//!
//! [`run_command`] is the only place an execution waits: it spawns the
//! configured [`Command`], drains both output pipes, and kills the child if
//! the whole operation outlives its deadline.

use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::executor::{ScriptError, ScriptInput, ScriptOutput};

/// Per-stream capture limit (10 MiB); the rest of a stream is discarded.
const MAX_OUTPUT_BYTES: u64 = 10 * 1024 * 1024;

/// Run `cmd` to completion or until `input.timeout` elapses.
///
/// The deadline starts at spawn and covers both the child's exit and the
/// draining of its pipes, so a descendant that keeps stdout or stderr open
/// cannot hold the caller past it. Program and arguments come from the
/// caller; environment comes from `input`. The child gets no stdin.
pub async fn run_command(
    cmd: &mut Command,
    input: ScriptInput,
) -> Result<ScriptOutput, ScriptError> {
    cmd.envs(input.env_vars)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let started = Instant::now();
    let deadline = started + input.timeout;
    let mut child = cmd.spawn()?;
    let mut stdout = drain(child.stdout.take());
    let mut stderr = drain(child.stderr.take());

    let status = match tokio::time::timeout_at(deadline, child.wait()).await {
        Ok(status) => status?,
        Err(_) => {
            stdout.abort();
            stderr.abort();
            // Dropping `child` kills it.
            return Err(timed_out(started));
        }
    };
    let duration_ms = elapsed_ms(started);

    let drained = tokio::time::timeout_at(deadline, async {
        let out = (&mut stdout).await.unwrap_or_default();
        let err = (&mut stderr).await.unwrap_or_default();
        (out, err)
    })
    .await;
    let Ok((out, err)) = drained else {
        // The host exited but something it started still holds a pipe.
        stdout.abort();
        stderr.abort();
        return Err(timed_out(started));
    };

    Ok(ScriptOutput {
        stdout: lossy(out),
        stderr: lossy(err),
        exit_code: status.code().unwrap_or(-1),
        duration_ms,
    })
}

/// Collect a pipe on a separate task so the child can be awaited meanwhile.
fn drain<R>(pipe: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(pipe) = pipe {
            // A read error just truncates the capture.
            let _ = pipe.take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await;
        }
        buf
    })
}

fn lossy(bytes: Vec<u8>) -> String {
    String::from_utf8_lossy(&bytes).into_owned()
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn timed_out(started: Instant) -> ScriptError {
    ScriptError::Timeout {
        elapsed_ms: elapsed_ms(started),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
