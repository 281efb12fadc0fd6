// src/core/executor/dispatcher.rs

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::core::error::ExecutionFailure;
use crate::core::executor::runner::CommandExecutor;
use crate::core::models::CommandResult;
use crate::core::tools::ToolCommand;

/// Fans a batch of commands out to concurrent tasks and joins them all.
///
/// Each command yields exactly one `CommandResult`, so a failing, timed out
/// or even panicking command never takes its siblings down with it. The
/// call returns only once every task in the batch has settled.
#[derive(Clone)]
pub struct Dispatcher {
    executor: Arc<dyn CommandExecutor>,
    max_concurrency: Option<usize>,
}

impl Dispatcher {
    /// `max_concurrency` of `None` runs the whole batch at once.
    pub fn new(executor: Arc<dyn CommandExecutor>, max_concurrency: Option<usize>) -> Self {
        Self { executor, max_concurrency }
    }

    pub async fn run_all(&self, commands: Vec<ToolCommand>, cancel: &CancellationToken) -> Vec<CommandResult> {
        info!(count = commands.len(), cap = ?self.max_concurrency, "Dispatching command batch.");
        let limiter = self.max_concurrency.map(|n| Arc::new(Semaphore::new(n.max(1))));

        let handles: Vec<(ToolCommand, JoinHandle<CommandResult>)> = commands
            .into_iter()
            .map(|command| {
                let executor = Arc::clone(&self.executor);
                let limiter = limiter.clone();
                let cancel = cancel.clone();
                let task_command = command.clone();

                let handle = tokio::spawn(async move {
                    let _permit = match limiter {
                        Some(sem) => tokio::select! {
                            biased;
                            _ = cancel.cancelled() => {
                                return CommandResult::failed(task_command, ExecutionFailure::Cancelled);
                            }
                            permit = sem.acquire_owned() => permit.ok(),
                        },
                        None => None,
                    };
                    executor.execute(&task_command, &cancel).await
                });
                (command, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (command, handle) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    error!(command = %command, error = %e, "Command task did not complete.");
                    results.push(CommandResult::failed(command, ExecutionFailure::Panicked(e.to_string())));
                }
            }
        }

        let failed = results.iter().filter(|r| !r.succeeded()).count();
        debug!(total = results.len(), failed, "Command batch joined.");
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::executor::runner::ProcessRunner;
    use crate::core::tools::Tool;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Sleeps briefly, tracks how many calls overlap, and fails or panics on request.
    #[derive(Default)]
    struct Scripted {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl CommandExecutor for Scripted {
        async fn execute(&self, command: &ToolCommand, _cancel: &CancellationToken) -> CommandResult {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(40)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);

            match command.program.as_str() {
                "panic" => panic!("scripted panic"),
                "fail" => CommandResult::failed(command.clone(), ExecutionFailure::Spawn("no such tool".into())),
                _ => CommandResult::success(command.clone(), format!("ran {}", command), String::new()),
            }
        }
    }

    fn cmd(program: &str) -> ToolCommand {
        ToolCommand { tool: Tool::Whois, program: program.to_string(), args: vec![] }
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_batch() {
        let dispatcher = Dispatcher::new(Arc::new(Scripted::default()), None);
        let results = dispatcher.run_all(vec![cmd("fail"), cmd("ok")], &CancellationToken::new()).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results.iter().filter(|r| r.succeeded()).count(), 1);
        let failed = results.iter().find(|r| !r.succeeded()).unwrap();
        assert_eq!(failed.command.program, "fail");
    }

    #[tokio::test]
    async fn panicking_task_becomes_failure() {
        let dispatcher = Dispatcher::new(Arc::new(Scripted::default()), None);
        let results = dispatcher.run_all(vec![cmd("panic"), cmd("ok")], &CancellationToken::new()).await;

        assert_eq!(results.len(), 2);
        let panicked = results.iter().find(|r| r.command.program == "panic").unwrap();
        assert!(matches!(panicked.failure, Some(ExecutionFailure::Panicked(_))));
    }

    #[tokio::test]
    async fn worker_cap_bounds_overlap() {
        let scripted = Arc::new(Scripted::default());
        let dispatcher = Dispatcher::new(scripted.clone(), Some(2));
        let batch = (0..6).map(|_| cmd("ok")).collect();
        let results = dispatcher.run_all(batch, &CancellationToken::new()).await;

        assert_eq!(results.len(), 6);
        assert!(scripted.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn unbounded_runs_everything_at_once() {
        let scripted = Arc::new(Scripted::default());
        let dispatcher = Dispatcher::new(scripted.clone(), None);
        let batch = (0..5).map(|_| cmd("ok")).collect();
        dispatcher.run_all(batch, &CancellationToken::new()).await;

        assert_eq!(scripted.peak.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn cancelled_batch_skips_queued_commands() {
        let dispatcher = Dispatcher::new(Arc::new(Scripted::default()), Some(1));
        let token = CancellationToken::new();
        token.cancel();
        let results = dispatcher.run_all(vec![cmd("ok"), cmd("ok")], &token).await;

        assert!(results.iter().all(|r| r.failure == Some(ExecutionFailure::Cancelled)));
    }

    #[tokio::test]
    async fn real_processes_fail_independently() {
        let dispatcher = Dispatcher::new(Arc::new(ProcessRunner::default()), None);
        let sh = |script: &str| ToolCommand {
            tool: Tool::Dig,
            program: "sh".into(),
            args: vec!["-c".into(), script.into()],
        };
        let results = dispatcher
            .run_all(vec![sh("exit 1"), sh("echo ok")], &CancellationToken::new())
            .await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|r| !r.succeeded()));
        assert!(results.iter().any(|r| r.succeeded() && r.output == "ok"));
    }
}
