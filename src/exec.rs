//! Bounded subprocess execution.
//!
//! One child per [`Invocation`]. The child gets a null stdin and piped
//! stdout/stderr. Capture is capped per stream: bytes past the cap are read and
//! discarded so the child never blocks on a full pipe, and the result is
//! flagged as truncated. A timeout signals the child and is reported as
//! [`ExecError::Timeout`], which is distinct from a normal non-zero exit.

use crate::error::ExecError;
use crate::limits::ResourceLimits;
use crate::output::RawInvocation;
use crate::request::Invocation;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::time::timeout;

/// Run an invocation to completion under `limits`.
///
/// # Errors
///
/// - `ExecError::SpawnFailed` if the process couldn't be started or waited on
/// - `ExecError::Timeout` if the process exceeded the timeout
pub async fn run(invocation: &Invocation, limits: &ResourceLimits) -> Result<RawInvocation, ExecError> {
    let start = Instant::now();

    let mut cmd = Command::new(&invocation.program);
    cmd.args(invocation.argv.as_slice())
        .envs(&invocation.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = &invocation.cwd {
        cmd.current_dir(cwd);
    }

    tracing::debug!(
        program = %invocation.program.display(),
        argc = invocation.argv.len(),
        "Spawning process"
    );

    let mut child = cmd.spawn().map_err(|e| ExecError::SpawnFailed {
        reason: e.to_string(),
    })?;

    let stdout = child.stdout.take().ok_or_else(|| ExecError::SpawnFailed {
        reason: "stdout was not captured".to_string(),
    })?;
    let stderr = child.stderr.take().ok_or_else(|| ExecError::SpawnFailed {
        reason: "stderr was not captured".to_string(),
    })?;

    let max = limits.max_buffer;
    let capture = async {
        let (out, err) = tokio::join!(read_capped(stdout, max), read_capped(stderr, max));
        let out = out.map_err(|e| ExecError::SpawnFailed {
            reason: format!("stdout read error: {}", e),
        })?;
        let err = err.map_err(|e| ExecError::SpawnFailed {
            reason: format!("stderr read error: {}", e),
        })?;
        let status = child.wait().await.map_err(|e| ExecError::SpawnFailed {
            reason: format!("wait error: {}", e),
        })?;
        Ok::<_, ExecError>((out, err, status))
    };

    let result = timeout(limits.timeout, capture).await;

    match result {
        Ok(Ok(((stdout_buf, stdout_cut), (stderr_buf, stderr_cut), status))) => {
            let truncated = stdout_cut || stderr_cut;
            if truncated {
                tracing::warn!(
                    program = %invocation.program.display(),
                    limit = max,
                    "Captured output truncated"
                );
            }

            let mut raw = RawInvocation::from_bytes(
                &stdout_buf,
                &stderr_buf,
                status.code().unwrap_or(-1),
            )
            .with_duration_ms(start.elapsed().as_millis() as u64);
            raw.truncated = truncated;
            Ok(raw)
        }
        Ok(Err(error)) => {
            let _ = child.kill().await;
            Err(error)
        }
        Err(_) => {
            let elapsed = start.elapsed();
            terminate(&mut child, limits).await;
            tracing::warn!(
                program = %invocation.program.display(),
                ?elapsed,
                "Process timed out"
            );
            Err(ExecError::Timeout {
                limit: limits.timeout,
                elapsed,
            })
        }
    }
}

/// Run an invocation synchronously.
///
/// Creates a current-thread runtime, or borrows the ambient one from a
/// scoped thread when called inside a runtime. The ambient runtime must be
/// multi-threaded: a current-thread runtime blocked here cannot drive the
/// child's I/O.
pub fn run_sync(invocation: &Invocation, limits: &ResourceLimits) -> Result<RawInvocation, ExecError> {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        std::thread::scope(|s| {
            s.spawn(|| handle.block_on(run(invocation, limits)))
                .join()
                .map_err(|_| ExecError::SpawnFailed {
                    reason: "runner thread panicked".to_string(),
                })?
        })
    } else {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ExecError::SpawnFailed {
                reason: format!("failed to create runtime: {}", e),
            })?;
        rt.block_on(run(invocation, limits))
    }
}

/// Read a stream to EOF, keeping at most `max` bytes.
async fn read_capped<R: AsyncRead + Unpin>(
    mut reader: R,
    max: usize,
) -> std::io::Result<(Vec<u8>, bool)> {
    let mut kept = Vec::new();
    let mut truncated = false;
    let mut buf = [0u8; 8192];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let room = max.saturating_sub(kept.len());
        if n > room {
            truncated = true;
        }
        kept.extend_from_slice(&buf[..n.min(room)]);
    }

    Ok((kept, truncated))
}

/// Send the configured signal, then SIGKILL after the grace period.
async fn terminate(child: &mut Child, limits: &ResourceLimits) {
    if let Some(pid) = child.id() {
        // SAFETY: `pid` belongs to a child we spawned and have not reaped yet.
        unsafe {
            libc::kill(pid as libc::pid_t, limits.kill_signal);
        }
        if timeout(limits.kill_grace, child.wait()).await.is_ok() {
            return;
        }
    }
    let _ = child.kill().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_capped_truncates() {
        let data: &[u8] = b"0123456789";
        let (kept, truncated) = read_capped(data, 4).await.unwrap();
        assert_eq!(kept, b"0123");
        assert!(truncated);
    }

    #[tokio::test]
    async fn test_read_capped_exact_fit() {
        let data: &[u8] = b"0123";
        let (kept, truncated) = read_capped(data, 4).await.unwrap();
        assert_eq!(kept, b"0123");
        assert!(!truncated);
    }

    #[tokio::test]
    async fn test_read_capped_empty() {
        let data: &[u8] = b"";
        let (kept, truncated) = read_capped(data, 4).await.unwrap();
        assert!(kept.is_empty());
        assert!(!truncated);
    }
}
