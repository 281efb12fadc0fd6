// src/core/recon/tech.rs

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{Recon, ensure_active};
use crate::core::error::ReconError;
use crate::core::models::TechReport;
use crate::core::parsers::parse_technologies;
use crate::core::target::Domain;
use crate::core::tools::{Tool, ToolCommand};

fn whatweb_command(recon: &Recon, host: &Domain) -> ToolCommand {
    recon
        .tools
        .command(Tool::Whatweb, ["--color=never".to_string(), host.to_string()])
}

impl Recon {
    /// Fingerprints the web stack of every known subdomain, one whatweb run
    /// per host.
    pub async fn technologies(
        &self,
        domain: &Domain,
        subdomains: &[Domain],
        cancel: &CancellationToken,
    ) -> Result<TechReport, ReconError> {
        ensure_active(cancel)?;
        if subdomains.is_empty() {
            return Err(ReconError::MissingPrerequisite {
                workflow: "technologies",
                what: "subdomains",
                cause: None,
            });
        }

        let commands = subdomains.iter().map(|host| whatweb_command(self, host)).collect();
        info!(target = %domain, hosts = subdomains.len(), "Fingerprinting web technologies.");
        let results = self.dispatcher.run_all(commands, cancel).await;
        ensure_active(cancel)?;

        for failed in results.iter().filter(|r| !r.succeeded()) {
            warn!(command = %failed.command, error = ?failed.error(), "Fingerprinting failed.");
        }
        Ok(parse_technologies(results.iter().map(|r| r.output.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::recon::testing::{ScriptedExecutor, example, recon_with};

    #[tokio::test]
    async fn fingerprints_each_subdomain() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .answer(
                    "whatweb --color=never www.example.com",
                    "https://www.example.com/ [200 OK] HTTPServer[nginx/1.25.3], Title[Welcome]",
                )
                .answer(
                    "whatweb --color=never api.example.com",
                    "ERROR Opening: https://api.example.com - Connection refused",
                ),
        );
        let dir = tempfile::tempdir().unwrap();
        let recon = recon_with(executor.clone(), dir.path());
        let subs = ["www.example.com", "api.example.com"].map(|s| Domain::parse(s).unwrap());

        let report = recon
            .technologies(&example(), &subs, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.keys().collect::<Vec<_>>(), vec!["www.example.com"]);
        assert_eq!(report["www.example.com"][0].to_string(), "HTTPServer [nginx/1.25.3]");
        assert_eq!(executor.calls().len(), 2);
        assert!(executor.calls().iter().all(|c| c.tool == Tool::Whatweb));
    }

    #[tokio::test]
    async fn needs_subdomains() {
        let executor = Arc::new(ScriptedExecutor::new());
        let dir = tempfile::tempdir().unwrap();
        let recon = recon_with(executor.clone(), dir.path());

        let err = recon
            .technologies(&example(), &[], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReconError::MissingPrerequisite { workflow: "technologies", .. }));
        assert!(executor.calls().is_empty());
    }
}
