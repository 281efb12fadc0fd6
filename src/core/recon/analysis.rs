// src/core/recon/analysis.rs

use std::collections::BTreeSet;

use tracing::debug;

use crate::core::knowledge_base::{
    DNSSEC_UNSIGNED, RISKY_SERVICE_EXPOSED, SCRIPT_VULNERABLE, SCRIPTS_UNAVAILABLE,
    SERVER_VERSION_DISCLOSED, SERVICES_UNAVAILABLE, SUBDOMAIN_WAF_MISSING, SUBDOMAINS_NONE,
    WAF_MISSING, WAF_UNREACHABLE, WHOIS_FAILED, ZONE_TRANSFER_ALLOWED,
};
use crate::core::models::{AnalysisFinding, PortServiceReport, ReconReport, Severity, WafVerdict};

/// Services that should not face the internet, by nmap service name.
const RISKY_SERVICES: &[&str] = &[
    "ftp",
    "telnet",
    "microsoft-ds",
    "netbios-ssn",
    "ms-wbt-server",
    "vnc",
    "mysql",
    "postgresql",
    "ms-sql-s",
    "redis",
    "mongodb",
    "memcache",
    "elasticsearch",
];

/// whatweb plugins that echo a response header naming the server software.
const BANNER_PLUGINS: &[&str] = &["HTTPServer", "X-Powered-By"];

/// `host:port/proto (script)` for every script that reports a vulnerability.
fn vulnerable_scripts<'a>(reports: impl IntoIterator<Item = &'a PortServiceReport>) -> BTreeSet<String> {
    let mut hits = BTreeSet::new();
    for report in reports {
        for port in &report.ports {
            for script in port.scripts.iter().filter(|s| s.is_vulnerable()) {
                hits.insert(format!("{}:{}/{} ({})", report.host, port.port_id, port.protocol, script.id));
            }
        }
    }
    hits
}

/// Derives the security findings of a finished report.
pub fn analyze_report(report: &ReconReport) -> Vec<AnalysisFinding> {
    let mut analyses = Vec::new();

    match &report.whois {
        Ok(whois) => {
            for ns in whois.leaking_nameservers() {
                debug!(nameserver = %ns, "Zone transfer allowed, adding Critical finding.");
                analyses.push(AnalysisFinding::new(Severity::Critical, ZONE_TRANSFER_ALLOWED).about(ns));
            }
            let unsigned = whois
                .whois
                .dnssec
                .as_deref()
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("unsigned"));
            if unsigned {
                analyses.push(AnalysisFinding::new(Severity::Info, DNSSEC_UNSIGNED));
            }
        }
        Err(_) => analyses.push(AnalysisFinding::new(Severity::Info, WHOIS_FAILED)),
    }

    if let Ok(verdicts) = &report.waf {
        for (host, verdict) in verdicts {
            match verdict {
                WafVerdict::NoWaf => {
                    analyses.push(AnalysisFinding::new(Severity::Warning, WAF_MISSING).about(host))
                }
                WafVerdict::ConnectionFailed => {
                    analyses.push(AnalysisFinding::new(Severity::Info, WAF_UNREACHABLE).about(host))
                }
                _ => {}
            }
        }
    }

    match &report.subdomains {
        Ok(subs) if subs.subdomains.is_empty() => {
            analyses.push(AnalysisFinding::new(Severity::Info, SUBDOMAINS_NONE))
        }
        Ok(subs) => {
            for (host, verdict) in &subs.waf {
                if *verdict == WafVerdict::NoWaf {
                    analyses.push(AnalysisFinding::new(Severity::Warning, SUBDOMAIN_WAF_MISSING).about(host));
                }
            }
        }
        Err(_) => analyses.push(AnalysisFinding::new(Severity::Info, SUBDOMAINS_NONE)),
    }

    match &report.services {
        Ok(services) => {
            // Both scan profiles list the same ports: report each one once.
            let mut exposed = BTreeSet::new();
            for report in &services.reports {
                for port in &report.ports {
                    if port.state == "open" && RISKY_SERVICES.contains(&port.service.as_str()) {
                        exposed.insert(format!(
                            "{}:{}/{} ({})",
                            report.host, port.port_id, port.protocol, port.service
                        ));
                    }
                }
            }
            for subject in exposed {
                debug!(%subject, "Risky service exposed, adding Critical finding.");
                analyses.push(AnalysisFinding::new(Severity::Critical, RISKY_SERVICE_EXPOSED).about(subject));
            }
        }
        Err(_) => analyses.push(AnalysisFinding::new(Severity::Info, SERVICES_UNAVAILABLE)),
    }

    // The vuln service profile and the battery may flag the same script.
    let service_reports = report.services.iter().flat_map(|s| &s.reports);
    let battery_reports = report.scripts.iter().flatten().flat_map(|s| &s.reports);
    for subject in vulnerable_scripts(service_reports.chain(battery_reports)) {
        debug!(%subject, "Vulnerable script result, adding Critical finding.");
        analyses.push(AnalysisFinding::new(Severity::Critical, SCRIPT_VULNERABLE).about(subject));
    }
    if let Some(Err(_)) = &report.scripts {
        analyses.push(AnalysisFinding::new(Severity::Info, SCRIPTS_UNAVAILABLE));
    }

    if let Ok(technologies) = &report.technologies {
        for (host, techs) in technologies {
            let banners = techs
                .iter()
                .filter(|t| BANNER_PLUGINS.contains(&t.name.as_str()))
                .flat_map(|t| &t.details)
                .filter(|d| d.bytes().any(|b| b.is_ascii_digit()));
            for banner in banners {
                analyses.push(
                    AnalysisFinding::new(Severity::Info, SERVER_VERSION_DISCLOSED).about(format!("{host} ({banner})")),
                );
            }
        }
    }

    analyses
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use super::*;
    use crate::core::models::{
        PortEntry, ReportSource, ScriptOutput, ScriptScanReport, ServicesReport, SubdomainReport,
        Technology, WhoisRecord, WhoisReport, ZoneTransferStatus,
    };
    use crate::core::target::Domain;

    fn port(id: &str, state: &str, service: &str) -> PortEntry {
        PortEntry {
            port_id: id.into(),
            protocol: "tcp".into(),
            state: state.into(),
            service: service.into(),
            scripts: Vec::new(),
        }
    }

    fn subjects<'a>(findings: &'a [AnalysisFinding], code: &str) -> Vec<Option<&'a str>> {
        findings.iter().filter(|f| f.code == code).map(|f| f.subject.as_deref()).collect()
    }

    fn report() -> ReconReport {
        let whois = WhoisRecord { dnssec: Some("unsigned".into()), ..Default::default() };
        let ports = vec![port("21", "open", "ftp"), port("23", "closed", "telnet"), port("443", "open", "https")];
        ReconReport {
            target: Domain::parse("example.com").unwrap(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            whois: Ok(WhoisReport {
                whois,
                nameservers: vec!["ns1.example.com".into(), "ns2.example.com".into()],
                zone_transfer: BTreeMap::from([("ns1.example.com".into(), ZoneTransferStatus::Refused)]),
            }),
            waf: Ok(BTreeMap::from([("example.com".into(), WafVerdict::Detected("Cloudflare".into()))])),
            subdomains: Ok(SubdomainReport {
                subdomains: vec![Domain::parse("mail.example.com").unwrap()],
                waf: BTreeMap::from([("mail.example.com".into(), WafVerdict::NoWaf)]),
            }),
            services: Ok(ServicesReport {
                source: ReportSource::Scanned,
                reports: ["default", "vuln"]
                    .into_iter()
                    .map(|p| PortServiceReport {
                        key: format!("{p}_mail.example.com"),
                        profile: Some(p.into()),
                        host: "mail.example.com".into(),
                        ports: ports.clone(),
                    })
                    .collect(),
                scan_results: Vec::new(),
            }),
            technologies: Ok(BTreeMap::from([(
                "mail.example.com".into(),
                vec![Technology { name: "HTTPServer".into(), details: vec!["nginx".into()] }],
            )])),
            scripts: None,
            analysis: Vec::new(),
        }
    }

    #[test]
    fn findings_from_a_full_report() {
        let findings = analyze_report(&report());
        let codes: Vec<(&str, Option<&str>)> =
            findings.iter().map(|f| (f.code.as_str(), f.subject.as_deref())).collect();
        assert_eq!(
            codes,
            vec![
                (ZONE_TRANSFER_ALLOWED, Some("ns2.example.com")),
                (DNSSEC_UNSIGNED, None),
                (SUBDOMAIN_WAF_MISSING, Some("mail.example.com")),
                (RISKY_SERVICE_EXPOSED, Some("mail.example.com:21/tcp (ftp)")),
            ]
        );
    }

    #[test]
    fn script_and_banner_findings() {
        let mut r = report();
        let mut vulnerable = port("445", "open", "microsoft-ds");
        vulnerable.scripts = vec![
            ScriptOutput { id: "smb-vuln-ms17-010".into(), output: "State: VULNERABLE".into() },
            ScriptOutput { id: "smb-vuln-ms10-054".into(), output: "State: NOT VULNERABLE".into() },
        ];
        let battery = PortServiceReport {
            key: "vuln_mail.example.com".into(),
            profile: Some("vuln".into()),
            host: "mail.example.com".into(),
            ports: vec![vulnerable],
        };
        // Same hit from the vuln service profile and from the battery.
        if let Ok(services) = &mut r.services {
            services.reports.push(battery.clone());
        }
        r.scripts = Some(Ok(ScriptScanReport { reports: vec![battery], scan_results: Vec::new() }));
        r.technologies = Ok(BTreeMap::from([(
            "mail.example.com".into(),
            vec![
                Technology { name: "HTTPServer".into(), details: vec!["nginx/1.18.0 (Ubuntu)".into()] },
                Technology { name: "Title".into(), details: vec!["Release 2.0".into()] },
            ],
        )]));

        let findings = analyze_report(&r);
        assert_eq!(
            subjects(&findings, SCRIPT_VULNERABLE),
            vec![Some("mail.example.com:445/tcp (smb-vuln-ms17-010)")]
        );
        assert_eq!(
            subjects(&findings, SERVER_VERSION_DISCLOSED),
            vec![Some("mail.example.com (nginx/1.18.0 (Ubuntu))")]
        );
        assert!(subjects(&findings, SCRIPTS_UNAVAILABLE).is_empty());

        r.scripts = Some(Err("missing prerequisite".into()));
        assert_eq!(analyze_report(&r).iter().filter(|f| f.code == SCRIPTS_UNAVAILABLE).count(), 1);
    }

    #[test]
    fn failed_workflows_become_info_findings() {
        let mut r = report();
        r.whois = Err("missing prerequisite".into());
        r.subdomains = Err("cancelled".into());
        r.services = Err("cancelled".into());
        r.waf = Ok(BTreeMap::from([("example.com".into(), WafVerdict::NoWaf)]));

        let findings = analyze_report(&r);
        let codes: Vec<&str> = findings.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(codes, vec![WHOIS_FAILED, WAF_MISSING, SUBDOMAINS_NONE, SERVICES_UNAVAILABLE]);
        assert!(findings.iter().all(|f| f.severity != Severity::Critical));
    }
}
