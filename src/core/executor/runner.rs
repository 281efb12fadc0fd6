// src/core/executor/runner.rs

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::error::ExecutionFailure;
use crate::core::models::CommandResult;
use crate::core::tools::ToolCommand;

/// CSI sequences ending in `m` (colors) or `K` (erase line).
static RE_ANSI: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-?9;]*[mK]").unwrap());

/// Something that can turn a `ToolCommand` into a `CommandResult`.
///
/// Implementations must never fail: every problem is reported through
/// `CommandResult::failure`.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &ToolCommand, cancel: &CancellationToken) -> CommandResult;
}

/// Runs commands as child processes, without a shell.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

/// Decodes raw process output, removes terminal escapes and trims it.
pub fn normalize_output(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    RE_ANSI.replace_all(&text, "").trim().to_string()
}

#[async_trait]
impl CommandExecutor for ProcessRunner {
    async fn execute(&self, command: &ToolCommand, cancel: &CancellationToken) -> CommandResult {
        debug!(command = %command, "Spawning process.");

        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(c) => c,
            Err(e) => {
                warn!(command = %command, error = %e, "Failed to spawn process.");
                return CommandResult::failed(command.clone(), ExecutionFailure::Spawn(e.to_string()));
            }
        };

        // Dropping this future drops the child, and kill_on_drop reaps it.
        let limit = self.timeout;
        let bounded = async move {
            let wait = child.wait_with_output();
            match limit {
                Some(limit) => tokio::time::timeout(limit, wait)
                    .await
                    .map_err(|_| ExecutionFailure::Timeout(limit)),
                None => Ok(wait.await),
            }
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ExecutionFailure::Cancelled),
            res = bounded => res,
        };

        match outcome {
            Ok(Ok(output)) => {
                let stdout = normalize_output(&output.stdout);
                let stderr = normalize_output(&output.stderr);
                if output.status.success() {
                    debug!(command = %command, bytes = stdout.len(), "Process finished.");
                    CommandResult::success(command.clone(), stdout, stderr)
                } else {
                    warn!(command = %command, status = ?output.status.code(), "Process exited with failure.");
                    let failure = ExecutionFailure::NonZeroExit {
                        code: output.status.code(),
                        stderr: stderr.clone(),
                    };
                    CommandResult {
                        command: command.clone(),
                        output: stdout,
                        stderr,
                        failure: Some(failure),
                    }
                }
            }
            Ok(Err(e)) => {
                warn!(command = %command, error = %e, "Failed while waiting for process.");
                CommandResult::failed(command.clone(), ExecutionFailure::Wait(e.to_string()))
            }
            Err(failure) => {
                warn!(command = %command, %failure, "Process did not complete.");
                CommandResult::failed(command.clone(), failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tools::Tool;

    fn sh(script: &str) -> ToolCommand {
        ToolCommand {
            tool: Tool::Whois,
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    #[test]
    fn strips_color_and_erase_sequences() {
        let raw = b"  \x1b[1;32m[+]\x1b[0m found\x1b[K  \n";
        assert_eq!(normalize_output(raw), "[+] found");
    }

    #[tokio::test]
    async fn captures_clean_stdout() {
        let runner = ProcessRunner::default();
        let result = runner
            .execute(&sh(r"printf '\033[31mred\033[0m text\n'"), &CancellationToken::new())
            .await;
        assert!(result.succeeded());
        assert_eq!(result.output, "red text");
    }

    #[tokio::test]
    async fn non_zero_exit_keeps_output() {
        let runner = ProcessRunner::default();
        let result = runner
            .execute(&sh("echo partial; echo oops >&2; exit 3"), &CancellationToken::new())
            .await;
        assert!(!result.succeeded());
        assert_eq!(result.output, "partial");
        assert_eq!(
            result.failure,
            Some(ExecutionFailure::NonZeroExit { code: Some(3), stderr: "oops".to_string() })
        );
    }

    #[tokio::test]
    async fn missing_binary_is_a_value() {
        let runner = ProcessRunner::default();
        let cmd = ToolCommand {
            tool: Tool::Dig,
            program: "/nonexistent/vanguard-missing-tool".to_string(),
            args: vec![],
        };
        let result = runner.execute(&cmd, &CancellationToken::new()).await;
        assert!(matches!(result.failure, Some(ExecutionFailure::Spawn(_))));
        assert_eq!(result.command, cmd);
    }

    #[tokio::test]
    async fn timeout_terminates_process() {
        let runner = ProcessRunner::new(Some(Duration::from_millis(100)));
        let started = std::time::Instant::now();
        let result = runner.execute(&sh("sleep 5"), &CancellationToken::new()).await;
        assert!(matches!(result.failure, Some(ExecutionFailure::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn cancellation_terminates_process() {
        let runner = ProcessRunner::default();
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });
        let result = runner.execute(&sh("sleep 5"), &token).await;
        assert_eq!(result.failure, Some(ExecutionFailure::Cancelled));
    }
}
