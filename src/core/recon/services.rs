// src/core/recon/services.rs

use std::io;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Recon, ensure_active};
use crate::core::error::ReconError;
use crate::core::models::{CommandResult, PortServiceReport, ReportSource, ScanProfile, ServicesReport};
use crate::core::parsers::nmap_xml::{parse_port_service_dir, report_file_name};
use crate::core::target::Domain;
use crate::core::tools::{Tool, ToolCommand};

const NMAP_BASE_ARGS: [&str; 6] = ["-Pn", "-f", "-A", "-O", "-sVC", "-p-"];

fn profile_args(profile: ScanProfile) -> &'static [&'static str] {
    match profile {
        ScanProfile::Default => &[],
        ScanProfile::Vuln => &["--script", "vuln"],
    }
}

/// One nmap run and the XML report it writes.
pub(super) struct NmapScan {
    pub command: ToolCommand,
    pub output: PathBuf,
}

/// `nmap <base> <extra> <host> -oX <dir>/scan_<profile>_<host>.xml`
pub(super) fn nmap_scan(
    recon: &Recon,
    dir: &Path,
    base: &[&str],
    profile: &str,
    extra: &[&str],
    host: &Domain,
) -> NmapScan {
    let output = dir.join(report_file_name(profile, host.as_str()));
    let args = base
        .iter()
        .chain(extra)
        .map(|a| a.to_string())
        .chain([
            host.to_string(),
            "-oX".to_string(),
            output.to_string_lossy().into_owned(),
        ]);
    NmapScan { command: recon.tools.command(Tool::Nmap, args), output }
}

fn service_scan(recon: &Recon, profile: ScanProfile, host: &Domain) -> NmapScan {
    nmap_scan(recon, &recon.results_dir, &NMAP_BASE_ARGS, profile.name(), profile_args(profile), host)
}

pub(super) fn dir_error(dir: &Path, source: io::Error) -> ReconError {
    ReconError::ResultsDirectory { path: dir.display().to_string(), source }
}

/// True when the report was produced for `domain` or one of its subdomains.
fn belongs_to(report: &PortServiceReport, domain: &Domain) -> bool {
    Domain::parse(&report.host).is_ok_and(|host| host == *domain || host.is_subdomain_of(domain))
}

/// Parses the reports in `dir` on the blocking pool and keeps those that
/// belong to `domain`.
pub(super) async fn read_reports(
    dir: &Path,
    profiles: Vec<&'static str>,
    domain: &Domain,
) -> Result<Vec<PortServiceReport>, ReconError> {
    let path = dir.to_path_buf();
    let reports = tokio::task::spawn_blocking(move || parse_port_service_dir(&path, &profiles))
        .await
        .map_err(|e| dir_error(dir, io::Error::other(e)))?
        .map_err(|e| dir_error(dir, e))?;

    let (own, foreign): (Vec<_>, Vec<_>) = reports.into_iter().partition(|r| belongs_to(r, domain));
    if !foreign.is_empty() {
        debug!(target = %domain, skipped = foreign.len(), "Ignoring reports of other targets.");
    }
    Ok(own)
}

impl Recon {
    /// Dispatches `scans` and deletes the report of every run that failed.
    /// nmap writes its XML incrementally, so a killed or timed-out run leaves
    /// a partial file that must not be read back as a result.
    pub(super) async fn run_nmap_scans(
        &self,
        scans: Vec<NmapScan>,
        cancel: &CancellationToken,
    ) -> Vec<CommandResult> {
        let (commands, outputs): (Vec<_>, Vec<_>) =
            scans.into_iter().map(|s| (s.command, s.output)).unzip();
        let results = self.dispatcher.run_all(commands, cancel).await;

        for (result, output) in results.iter().zip(&outputs) {
            if result.succeeded() {
                continue;
            }
            warn!(command = %result.command, error = ?result.error(), "Port scan failed.");
            match tokio::fs::remove_file(output).await {
                Ok(()) => debug!(file = %output.display(), "Removed report of failed scan."),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(file = %output.display(), error = %e, "Could not remove report of failed scan."),
            }
        }
        results
    }

    /// Port and service discovery for the known subdomains.
    ///
    /// Reports of this domain already present in the results directory are
    /// returned as they are, without scanning again. Otherwise every
    /// subdomain gets one nmap run per scan profile and the fresh reports
    /// are parsed once all scans have finished.
    pub async fn services(
        &self,
        domain: &Domain,
        subdomains: &[Domain],
        cancel: &CancellationToken,
    ) -> Result<ServicesReport, ReconError> {
        ensure_active(cancel)?;
        let _guard = self.results_lock.lock().await;

        tokio::fs::create_dir_all(&self.results_dir)
            .await
            .map_err(|e| dir_error(&self.results_dir, e))?;

        let cached = read_reports(&self.results_dir, ScanProfile::NAMES.to_vec(), domain).await?;
        if !cached.is_empty() {
            info!(target = %domain, reports = cached.len(), "Using existing scan reports.");
            return Ok(ServicesReport { source: ReportSource::Cached, reports: cached, scan_results: Vec::new() });
        }

        if subdomains.is_empty() {
            return Err(ReconError::MissingPrerequisite {
                workflow: "services",
                what: "subdomains",
                cause: None,
            });
        }

        let scans: Vec<NmapScan> = subdomains
            .iter()
            .flat_map(|host| ScanProfile::ALL.map(|profile| service_scan(self, profile, host)))
            .collect();
        info!(target = %domain, hosts = subdomains.len(), scans = scans.len(), "Scanning ports and services.");

        let scan_results = self.run_nmap_scans(scans, cancel).await;
        ensure_active(cancel)?;

        let reports = read_reports(&self.results_dir, ScanProfile::NAMES.to_vec(), domain).await?;
        Ok(ServicesReport { source: ReportSource::Scanned, reports, scan_results })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use super::*;
    use crate::core::recon::testing::{ScriptedExecutor, example, recon_with};

    const REPORT: &str = r#"<nmaprun><host><ports>
<port protocol="tcp" portid="21"><state state="open"/><service name="ftp"/></port>
<port protocol="tcp" portid="443"><state state="open"/><service name="https"/></port>
</ports></host></nmaprun>"#;

    fn subs() -> Vec<Domain> {
        vec![Domain::parse("mail.example.com").unwrap()]
    }

    #[test]
    fn nmap_arguments_per_profile() {
        let dir = tempfile::tempdir().unwrap();
        let recon = recon_with(Arc::new(ScriptedExecutor::new()), dir.path());
        let host = Domain::parse("mail.example.com").unwrap();

        let default = service_scan(&recon, ScanProfile::Default, &host);
        let out = dir.path().join("scan_default_mail.example.com.xml");
        assert_eq!(
            default.command.to_string(),
            format!("nmap -Pn -f -A -O -sVC -p- mail.example.com -oX {}", out.display())
        );
        assert_eq!(default.output, out);

        let vuln = service_scan(&recon, ScanProfile::Vuln, &host).command;
        assert_eq!(&vuln.args[6..8], ["--script", "vuln"]);
        assert!(vuln.args.last().unwrap().ends_with("scan_vuln_mail.example.com.xml"));
    }

    #[tokio::test]
    async fn cached_reports_short_circuit_and_are_stable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("scan_default_mail.example.com.xml"), REPORT).unwrap();
        let executor = Arc::new(ScriptedExecutor::new());
        let recon = recon_with(executor.clone(), dir.path());
        let cancel = CancellationToken::new();

        let first = recon.services(&example(), &subs(), &cancel).await.unwrap();
        let second = recon.services(&example(), &subs(), &cancel).await.unwrap();

        assert_eq!(first.source, ReportSource::Cached);
        assert_eq!(first, second);
        assert_eq!(first.reports[0].ports.len(), 2);
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn scans_then_parses_fresh_reports() {
        let dir = tempfile::tempdir().unwrap();
        let results_dir = dir.path().join("results");
        let executor = Arc::new(writing_reports(REPORT));
        let recon = recon_with(executor.clone(), &results_dir);

        let report = recon
            .services(&example(), &subs(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.source, ReportSource::Scanned);
        assert_eq!(report.scan_results.len(), 2);
        let keys: Vec<&str> = report.reports.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["default_mail.example.com", "vuln_mail.example.com"]);
        assert_eq!(executor.calls().len(), 2);

        // A second call finds the reports and does not scan again.
        let again = recon
            .services(&example(), &subs(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(again.source, ReportSource::Cached);
        assert_eq!(again.reports, report.reports);
        assert_eq!(executor.calls().len(), 2);
    }

    /// Stand-in for nmap: writes `report` to the `-oX` path.
    fn writing_reports(report: &'static str) -> ScriptedExecutor {
        let mut executor = ScriptedExecutor::new();
        executor.on_execute = Some(Box::new(move |cmd: &ToolCommand| {
            if let Some(i) = cmd.args.iter().position(|a| a == "-oX") {
                fs::write(&cmd.args[i + 1], report).unwrap();
            }
        }));
        executor
    }

    #[tokio::test]
    async fn reports_of_other_targets_are_not_a_cache_hit() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("scan_default_mail.example.com.xml"), REPORT).unwrap();
        let executor = Arc::new(ScriptedExecutor::new());
        let recon = recon_with(executor.clone(), dir.path());
        let other = Domain::parse("other.org").unwrap();
        let www = Domain::parse("www.other.org").unwrap();

        let report = recon
            .services(&other, &[www], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.source, ReportSource::Scanned);
        assert!(report.reports.iter().all(|r| r.host != "mail.example.com"));
        assert_eq!(executor.calls().len(), 2);
        // The other target's cached report is still served to its own domain.
        let mine = recon.services(&example(), &subs(), &CancellationToken::new()).await.unwrap();
        assert_eq!(mine.source, ReportSource::Cached);
        assert_eq!(mine.reports[0].host, "mail.example.com");
    }

    #[tokio::test]
    async fn failed_scans_leave_no_report_behind() {
        let dir = tempfile::tempdir().unwrap();
        let truncated = "<?xml version=\"1.0\"?><nmaprun scanner=\"nmap\"><verbose level=\"0\"/>";
        let executor = Arc::new(writing_reports(truncated).fail_tool(Tool::Nmap));
        let recon = recon_with(executor.clone(), dir.path());

        let report = recon
            .services(&example(), &subs(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(report.reports.is_empty());
        assert!(report.scan_results.iter().all(|r| !r.succeeded()));
        assert!(!dir.path().join("scan_default_mail.example.com.xml").exists());
        assert!(!dir.path().join("scan_vuln_mail.example.com.xml").exists());

        // Nothing was cached, so the next call scans again.
        let again = recon
            .services(&example(), &subs(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(again.source, ReportSource::Scanned);
        assert_eq!(executor.calls().len(), 4);
    }

    #[tokio::test]
    async fn no_subdomains_and_no_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let recon = recon_with(Arc::new(ScriptedExecutor::new()), dir.path());
        let err = recon
            .services(&example(), &[], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReconError::MissingPrerequisite { workflow: "services", .. }));
    }
}
