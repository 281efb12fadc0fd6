// src/core/recon/whois.rs

use std::collections::HashSet;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{Recon, ensure_active};
use crate::core::error::ReconError;
use crate::core::models::WhoisReport;
use crate::core::parsers::{parse_nameserver_status, parse_whois};
use crate::core::target::Domain;
use crate::core::tools::{Tool, ToolCommand};

impl Recon {
    /// WHOIS lookup followed by a zone-transfer attempt against every
    /// nameserver the registry lists.
    pub async fn whois_and_nameservers(
        &self,
        domain: &Domain,
        cancel: &CancellationToken,
    ) -> Result<WhoisReport, ReconError> {
        ensure_active(cancel)?;
        info!(target = %domain, "Running WHOIS lookup.");

        let lookup = self
            .dispatch_one(self.tools.command(Tool::Whois, [domain.to_string()]), cancel)
            .await;
        ensure_active(cancel)?;
        let whois = parse_whois(lookup.output.lines());
        if whois.is_empty() {
            warn!(target = %domain, error = ?lookup.error(), "WHOIS output had no recognizable fields.");
        }

        let listed = whois.name_servers();
        if listed.is_empty() {
            return Err(ReconError::MissingPrerequisite {
                workflow: "whois",
                what: "Name Server",
                cause: lookup.error(),
            });
        }

        // Nameservers come from remote output: only well-formed hostnames
        // are queried. The rest stay in the list and end up unreachable.
        // `ns1.example.com` and `ns1.example.com.` are the same server.
        let mut seen = HashSet::new();
        let mut nameservers = Vec::with_capacity(listed.len());
        let mut transfers = Vec::new();
        for raw in listed {
            match Domain::parse(&raw) {
                Ok(ns) => {
                    if seen.insert(ns.to_string()) {
                        transfers.push(axfr_command(self, &ns, domain));
                        nameservers.push(ns.to_string());
                    }
                }
                Err(e) => {
                    if seen.insert(raw.clone()) {
                        warn!(nameserver = %raw, error = %e, "Not querying malformed nameserver.");
                        nameservers.push(raw);
                    }
                }
            }
        }

        info!(target = %domain, count = transfers.len(), "Requesting zone transfers from nameservers.");
        let results = self.dispatcher.run_all(transfers, cancel).await;
        ensure_active(cancel)?;

        let zone_transfer = parse_nameserver_status(&nameservers, &results);
        Ok(WhoisReport { whois, nameservers, zone_transfer })
    }
}

fn axfr_command(recon: &Recon, nameserver: &Domain, domain: &Domain) -> ToolCommand {
    recon
        .tools
        .command(Tool::Dig, [format!("@{nameserver}"), "axfr".to_string(), domain.to_string()])
}
