// src/core/recon/mod.rs

// Each workflow lives in its own file as an `impl Recon` block.
pub mod analysis;
mod scripts;
mod services;
mod subdomains;
mod tech;
mod waf;
mod whois;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::core::error::ReconError;
use crate::core::executor::{CommandExecutor, Dispatcher, ProcessRunner};
use crate::core::models::{CommandResult, ReconReport};
use crate::core::target::Domain;
use crate::core::tools::{ToolCommand, ToolRegistry};

use self::analysis::analyze_report;

/// Runs the reconnaissance workflows against a domain.
///
/// One `Recon` should own a given results directory: the lock that keeps
/// report aggregation from overlapping report generation lives here.
pub struct Recon {
    dispatcher: Dispatcher,
    tools: ToolRegistry,
    results_dir: PathBuf,
    results_lock: Arc<Mutex<()>>,
    script_scan_enabled: bool,
}

impl Recon {
    pub fn new(dispatcher: Dispatcher, tools: ToolRegistry, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            dispatcher,
            tools,
            results_dir: results_dir.into(),
            results_lock: Arc::new(Mutex::new(())),
            script_scan_enabled: false,
        }
    }

    /// Adds the NSE script battery to `full_scan`.
    pub fn with_script_scan(mut self, enabled: bool) -> Self {
        self.script_scan_enabled = enabled;
        self
    }

    /// Wires a `ProcessRunner` with the given limits.
    pub fn with_process_runner(
        tools: ToolRegistry,
        results_dir: impl Into<PathBuf>,
        timeout: Option<Duration>,
        max_concurrency: Option<usize>,
    ) -> Self {
        let runner: Arc<dyn CommandExecutor> = Arc::new(ProcessRunner::new(timeout));
        Self::new(Dispatcher::new(runner, max_concurrency), tools, results_dir)
    }

    /// Runs every workflow in dependency order and analyzes the outcome.
    ///
    /// WHOIS, WAF and subdomain enumeration start together. Port scanning,
    /// fingerprinting and the optional script battery wait for the
    /// subdomains they need. A failing workflow is recorded in the report
    /// and never stops the others.
    pub async fn full_scan(&self, domain: &Domain, cancel: &CancellationToken) -> ReconReport {
        info!(target = %domain, "Starting full reconnaissance.");
        let started_at = Utc::now();

        let (whois, waf, subdomains) = tokio::join!(
            self.whois_and_nameservers(domain, cancel),
            self.waf(domain, cancel),
            self.subdomains(domain, cancel),
        );

        let known = subdomains
            .as_ref()
            .map(|r| r.subdomains.clone())
            .unwrap_or_default();
        let scripts = async {
            if self.script_scan_enabled {
                Some(self.script_scan(domain, &known, cancel).await)
            } else {
                None
            }
        };
        let (services, technologies, scripts) = tokio::join!(
            self.services(domain, &known, cancel),
            self.technologies(domain, &known, cancel),
            scripts,
        );

        let mut report = ReconReport {
            target: domain.clone(),
            started_at,
            finished_at: Utc::now(),
            whois: whois.map_err(|e| e.to_string()),
            waf: waf.map_err(|e| e.to_string()),
            subdomains: subdomains.map_err(|e| e.to_string()),
            services: services.map_err(|e| e.to_string()),
            technologies: technologies.map_err(|e| e.to_string()),
            scripts: scripts.map(|r| r.map_err(|e| e.to_string())),
            analysis: Vec::new(),
        };
        report.analysis = analyze_report(&report);

        info!(target = %domain, findings = report.analysis.len(), "Reconnaissance finished.");
        report
    }

    async fn dispatch_one(&self, command: ToolCommand, cancel: &CancellationToken) -> CommandResult {
        let mut results = self.dispatcher.run_all(vec![command.clone()], cancel).await;
        results
            .pop()
            .unwrap_or_else(|| CommandResult::failed(command, crate::core::error::ExecutionFailure::Cancelled))
    }
}

fn ensure_active(cancel: &CancellationToken) -> Result<(), ReconError> {
    if cancel.is_cancelled() {
        Err(ReconError::Cancelled)
    } else {
        Ok(())
    }
}

/// Executors and fixtures shared by the workflow tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::core::error::ExecutionFailure;
    use crate::core::tools::Tool;

    /// Answers commands from canned output and records what was asked.
    /// Lookup is by the rendered command line first, then by tool.
    #[derive(Default)]
    pub struct ScriptedExecutor {
        by_command: HashMap<String, String>,
        by_tool: HashMap<Tool, String>,
        failing_tools: Vec<Tool>,
        pub calls: StdMutex<Vec<ToolCommand>>,
        /// Optional side effect run for each command (used to write nmap reports).
        pub on_execute: Option<Box<dyn Fn(&ToolCommand) + Send + Sync>>,
    }

    impl ScriptedExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn answer(mut self, command_line: &str, output: &str) -> Self {
            self.by_command.insert(command_line.to_string(), output.to_string());
            self
        }

        pub fn answer_tool(mut self, tool: Tool, output: &str) -> Self {
            self.by_tool.insert(tool, output.to_string());
            self
        }

        pub fn fail_tool(mut self, tool: Tool) -> Self {
            self.failing_tools.push(tool);
            self
        }

        pub fn calls(&self) -> Vec<ToolCommand> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandExecutor for ScriptedExecutor {
        async fn execute(&self, command: &ToolCommand, _cancel: &CancellationToken) -> CommandResult {
            self.calls.lock().unwrap().push(command.clone());
            if let Some(hook) = &self.on_execute {
                hook(command);
            }
            if self.failing_tools.contains(&command.tool) {
                return CommandResult::failed(command.clone(), ExecutionFailure::Spawn("not installed".into()));
            }
            let output = self
                .by_command
                .get(&command.to_string())
                .or_else(|| self.by_tool.get(&command.tool))
                .cloned()
                .unwrap_or_default();
            CommandResult::success(command.clone(), output, String::new())
        }
    }

    pub fn recon_with(executor: Arc<ScriptedExecutor>, results_dir: &Path) -> Recon {
        let dispatcher = Dispatcher::new(executor, None);
        Recon::new(dispatcher, ToolRegistry::default(), results_dir)
    }

    pub fn example() -> Domain {
        Domain::parse("example.com").unwrap()
    }
}
