// src/core/recon/subdomains.rs

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{Recon, ensure_active};
use crate::core::error::ReconError;
use crate::core::models::SubdomainReport;
use crate::core::parsers::{parse_subdomains, parse_waf_results};
use crate::core::target::Domain;
use crate::core::tools::{Tool, ToolCommand};

/// The enumeration battery, one command per tool.
fn enumeration_commands(recon: &Recon, domain: &Domain) -> Vec<ToolCommand> {
    let d = domain.to_string();
    let tools = &recon.tools;
    vec![
        tools.command(Tool::Sublist3r, ["-d".to_string(), d.clone()]),
        tools.command(Tool::Knockpy, ["-d".to_string(), d.clone()]),
        tools.command(Tool::Nmap, ["--script".to_string(), "dns-brute".to_string(), d.clone()]),
        tools.command(Tool::Fierce, ["--domain".to_string(), d.clone()]),
        tools.command(Tool::Dnsmap, [d.clone()]),
        tools.command(
            Tool::Dnsenum,
            [
                "--enum", "--threads", "10", "--dnsserver", "1.1.1.1", "--fqdns", "--noreverse",
            ]
            .into_iter()
            .map(str::to_string)
            .chain([d.clone()]),
        ),
        tools.command(Tool::Subfinder, ["-d".to_string(), d]),
    ]
}

impl Recon {
    /// Runs the enumeration battery, then checks every discovered subdomain
    /// for a WAF.
    pub async fn subdomains(
        &self,
        domain: &Domain,
        cancel: &CancellationToken,
    ) -> Result<SubdomainReport, ReconError> {
        ensure_active(cancel)?;
        let battery = enumeration_commands(self, domain);
        info!(target = %domain, tools = battery.len(), "Enumerating subdomains.");

        let results = self.dispatcher.run_all(battery, cancel).await;
        ensure_active(cancel)?;

        for failed in results.iter().filter(|r| !r.succeeded()) {
            warn!(command = %failed.command, error = ?failed.error(), "Enumeration tool failed.");
        }
        let subdomains = parse_subdomains(domain, results.iter().map(|r| r.output.as_str()));
        info!(target = %domain, count = subdomains.len(), "Subdomain enumeration finished.");

        if subdomains.is_empty() {
            return Ok(SubdomainReport { subdomains, waf: Default::default() });
        }

        let waf_checks = subdomains
            .iter()
            .map(|sub| self.tools.command(Tool::Wafw00f, [sub.to_string()]))
            .collect();
        let waf_results = self.dispatcher.run_all(waf_checks, cancel).await;
        ensure_active(cancel)?;

        let waf = parse_waf_results(&waf_results);
        Ok(SubdomainReport { subdomains, waf })
    }
}
