//! Process execution
//!
//! The inference binary is reached only through [`InferenceRunner`], so the
//! rest of the crate never spawns processes directly.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::{timeout, Duration};

/// Captured output of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runner errors
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Process did not finish in time")]
    Timeout,
    #[error("Failed to start process: {0}")]
    Spawn(#[source] io::Error),
    #[error("Failed to collect process output: {0}")]
    Io(#[source] io::Error),
}

/// Capability to run the inference binary once
#[async_trait]
pub trait InferenceRunner: Send + Sync {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        timeout: Duration,
    ) -> Result<RunOutput, RunError>;
}

/// Runs the binary as a child process
pub struct ProcessRunner;

#[async_trait]
impl InferenceRunner for ProcessRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        limit: Duration,
    ) -> Result<RunOutput, RunError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own group, so helpers the binary starts can be killed along with it.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(RunError::Spawn)?;
        let mut group = ProcessGroup::new(child.id());
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Pipes are drained while waiting so a chatty child cannot block on a full pipe.
        let collect = async {
            let (status, stdout, stderr) =
                tokio::join!(child.wait(), read_pipe(stdout), read_pipe(stderr));
            Ok::<_, io::Error>((status?, stdout?, stderr?))
        };

        match timeout(limit, collect).await {
            Ok(Ok((status, stdout, stderr))) => {
                group.release();
                Ok(RunOutput {
                    exit_code: status.code(),
                    stdout: String::from_utf8_lossy(&stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                })
            }
            Ok(Err(e)) => Err(RunError::Io(e)),
            Err(_) => {
                tracing::warn!(
                    "Process {} exceeded {:?}, killing its process group",
                    program.display(),
                    limit
                );
                group.kill();
                // Reaps the leader; the group signal may already have terminated it.
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill timed out process: {}", e);
                }
                Err(RunError::Timeout)
            }
        }
    }
}

/// Kills the child's process group unless released
///
/// Dropping the guard (cancelled request, I/O error) kills the group too.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pid: Option<u32>) -> Self {
        Self { pgid: pid }
    }

    fn release(&mut self) {
        self.pgid = None;
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pgid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!("Failed to kill process group {}: {}", pgid, e),
    }
}

// Without process groups only the direct child is killed.
#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}

async fn read_pipe<R>(pipe: Option<R>) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::write_script;
    #[cfg(target_os = "linux")]
    use crate::test_support::{read_pid, wait_until_dead};

    #[tokio::test]
    async fn test_captures_streams_separately() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "streams", "echo \"out $1\"\necho err >&2\nexit 0");

        let output = ProcessRunner
            .run(&script, &["one".to_string()], Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout, "out one\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[tokio::test]
    async fn test_reports_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "fail", "exit 7");

        let output = ProcessRunner
            .run(&script, &[], Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(output.exit_code, Some(7));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ProcessRunner
            .run(&dir.path().join("nope"), &[], Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(RunError::Spawn(_))));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timeout_kills_process() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let script = write_script(
            dir.path(),
            "sleeper",
            &format!("echo $$ > {}\nexec sleep 200", pid_file.display()),
        );

        let started = std::time::Instant::now();
        let result = ProcessRunner
            .run(&script, &[], Duration::from_millis(500))
            .await;
        assert!(matches!(result, Err(RunError::Timeout)));
        assert!(started.elapsed() < Duration::from_secs(5));

        let pid = read_pid(&pid_file);
        assert!(wait_until_dead(pid).await, "process {pid} still running");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timeout_kills_processes_started_by_child() {
        let dir = tempfile::tempdir().unwrap();
        let shell_pid = dir.path().join("shell.pid");
        let sleep_pid = dir.path().join("sleep.pid");
        let script = write_script(
            dir.path(),
            "wrapper",
            &format!(
                "echo $$ > {}\nsleep 200 &\necho $! > {}\nwait",
                shell_pid.display(),
                sleep_pid.display()
            ),
        );

        let result = ProcessRunner
            .run(&script, &[], Duration::from_millis(500))
            .await;
        assert!(matches!(result, Err(RunError::Timeout)));

        for pid_file in [shell_pid, sleep_pid] {
            let pid = read_pid(&pid_file);
            assert!(wait_until_dead(pid).await, "process {pid} still running");
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_dropped_run_kills_process_group() {
        let dir = tempfile::tempdir().unwrap();
        let sleep_pid = dir.path().join("sleep.pid");
        let script = write_script(
            dir.path(),
            "wrapper",
            &format!("sleep 200 &\necho $! > {}\nwait", sleep_pid.display()),
        );

        let runner = ProcessRunner;
        let run = runner.run(&script, &[], Duration::from_secs(60));
        let cancelled = tokio::time::timeout(Duration::from_millis(500), run).await;
        assert!(cancelled.is_err());

        let pid = read_pid(&sleep_pid);
        assert!(wait_until_dead(pid).await, "process {pid} still running");
    }
}
