// src/core/recon/scripts.rs

use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::services::{NmapScan, dir_error, nmap_scan, read_reports};
use super::{Recon, ensure_active};
use crate::core::error::ReconError;
use crate::core::models::{NseCategory, ScriptScanReport};
use crate::core::target::Domain;

/// Subdirectory of the results directory holding the battery's reports.
pub const SCRIPT_REPORTS_DIR: &str = "scripts";

/// Fragmented, decoy-covered, rate-bounded version scan over every port.
const BATTERY_BASE_ARGS: [&str; 16] = [
    "-Pn",
    "-f",
    "--mtu",
    "24",
    "-D",
    "RND:10",
    "--min-rate",
    "2000",
    "--max-rate",
    "5000",
    "--max-retries",
    "2",
    "--defeat-rst-ratelimit",
    "--randomize-hosts",
    "-sV",
    "-p-",
];

impl Recon {
    /// Runs one nmap pass per NSE category against every subdomain.
    ///
    /// Earlier reports are never reused: each run overwrites the battery of
    /// the hosts it scans. Reports left from earlier runs against other
    /// subdomains of the same domain are still returned.
    pub async fn script_scan(
        &self,
        domain: &Domain,
        subdomains: &[Domain],
        cancel: &CancellationToken,
    ) -> Result<ScriptScanReport, ReconError> {
        ensure_active(cancel)?;
        if subdomains.is_empty() {
            return Err(ReconError::MissingPrerequisite {
                workflow: "scripts",
                what: "subdomains",
                cause: None,
            });
        }

        let _guard = self.results_lock.lock().await;
        let dir = self.results_dir.join(SCRIPT_REPORTS_DIR);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| dir_error(&dir, e))?;

        let mut scans: Vec<NmapScan> = Vec::with_capacity(subdomains.len() * 7);
        for host in subdomains {
            for category in NseCategory::iter() {
                let name = category.name();
                scans.push(nmap_scan(self, &dir, &BATTERY_BASE_ARGS, name, &["--script", name], host));
            }
        }
        info!(target = %domain, hosts = subdomains.len(), scans = scans.len(), "Running NSE script battery.");

        let scan_results = self.run_nmap_scans(scans, cancel).await;
        ensure_active(cancel)?;

        let reports = read_reports(&dir, NseCategory::names(), domain).await?;
        Ok(ScriptScanReport { reports, scan_results })
    }
}
