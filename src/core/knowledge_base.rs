//! Static catalogue of every finding the analysis step can raise, with the
//! explanation and remediation text shown in the details panel.

use crate::core::models::Severity;
use std::fmt;

/// Groups findings in the user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingCategory {
    /// Registration data and authoritative nameservers.
    Dns,
    /// Web application firewall coverage of the domain and its subdomains.
    Waf,
    /// Hosts and network services reachable from the outside.
    Surface,
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingCategory::Dns => write!(f, "DNS & Registration"),
            FindingCategory::Waf => write!(f, "Web Application Firewall"),
            FindingCategory::Surface => write!(f, "Attack Surface"),
        }
    }
}

/// Everything needed to present one finding to a user.
pub struct FindingDetail {
    /// Machine-readable identifier (e.g., "RECON_WAF_MISSING").
    pub code: &'static str,
    pub title: &'static str,
    pub category: FindingCategory,
    pub severity: Severity,
    pub description: &'static str,
    pub remediation: &'static str,
}

pub const ZONE_TRANSFER_ALLOWED: &str = "RECON_ZONE_TRANSFER_ALLOWED";
pub const DNSSEC_UNSIGNED: &str = "RECON_DNSSEC_UNSIGNED";
pub const WHOIS_FAILED: &str = "RECON_WHOIS_FAILED";
pub const WAF_MISSING: &str = "RECON_WAF_MISSING";
pub const WAF_UNREACHABLE: &str = "RECON_WAF_UNREACHABLE";
pub const SUBDOMAIN_WAF_MISSING: &str = "RECON_SUBDOMAIN_WAF_MISSING";
pub const SUBDOMAINS_NONE: &str = "RECON_SUBDOMAINS_NONE";
pub const RISKY_SERVICE_EXPOSED: &str = "RECON_RISKY_SERVICE_EXPOSED";
pub const SERVICES_UNAVAILABLE: &str = "RECON_SERVICES_UNAVAILABLE";
pub const SCRIPT_VULNERABLE: &str = "RECON_SCRIPT_VULNERABLE";
pub const SCRIPTS_UNAVAILABLE: &str = "RECON_SCRIPTS_UNAVAILABLE";
pub const SERVER_VERSION_DISCLOSED: &str = "RECON_SERVER_VERSION_DISCLOSED";

static FINDINGS: &[FindingDetail] = &[
    // --- DNS & Registration ---
    FindingDetail {
        code: ZONE_TRANSFER_ALLOWED,
        title: "Zone Transfer Allowed",
        category: FindingCategory::Dns,
        severity: Severity::Critical,
        description: "This nameserver answered a full zone transfer (AXFR) request from an arbitrary client. Anyone can download every record in the zone, including internal hostnames, mail routing and service endpoints that are not meant to be public.",
        remediation: "Restrict AXFR on the nameserver to the IP addresses of your secondary servers (for example 'allow-transfer' in BIND) or require TSIG-signed transfers."
    },
    FindingDetail {
        code: DNSSEC_UNSIGNED,
        title: "DNSSEC Not Enabled",
        category: FindingCategory::Dns,
        severity: Severity::Info,
        description: "The registry reports the delegation as unsigned. Resolvers cannot verify that answers for this domain are authentic, which leaves room for cache poisoning and spoofed responses.",
        remediation: "Sign the zone at your DNS provider and publish the resulting DS record through your registrar."
    },
    FindingDetail {
        code: WHOIS_FAILED,
        title: "Registration Data Unavailable",
        category: FindingCategory::Dns,
        severity: Severity::Info,
        description: "The WHOIS lookup did not return the nameservers for this domain, so the zone transfer checks could not run. The registry may rate-limit queries or redact its output.",
        remediation: "Check that the 'whois' tool is installed and retry later. Results for nameserver checks are incomplete until this succeeds."
    },
    // --- Web Application Firewall ---
    FindingDetail {
        code: WAF_MISSING,
        title: "No WAF on Root Domain",
        category: FindingCategory::Waf,
        severity: Severity::Warning,
        description: "No web application firewall was fingerprinted in front of the main site. Common attacks such as SQL injection or automated credential stuffing reach the application unfiltered.",
        remediation: "Put the site behind a WAF or a CDN with WAF rules enabled, and confirm the origin server only accepts traffic from it."
    },
    FindingDetail {
        code: WAF_UNREACHABLE,
        title: "WAF Check Failed",
        category: FindingCategory::Waf,
        severity: Severity::Info,
        description: "The WAF fingerprinting run could not connect to the main site, so its protection status is unknown.",
        remediation: "Verify the site answers over HTTPS and that the 'wafw00f' tool is installed, then run the scan again."
    },
    FindingDetail {
        code: SUBDOMAIN_WAF_MISSING,
        title: "Subdomain Without WAF",
        category: FindingCategory::Waf,
        severity: Severity::Warning,
        description: "This subdomain serves web content with no firewall in front of it. Attackers often target forgotten subdomains because they bypass the protections of the main site.",
        remediation: "Route the subdomain through the same WAF as the main site, or decommission it if it is no longer needed."
    },
    // --- Attack Surface ---
    FindingDetail {
        code: SUBDOMAINS_NONE,
        title: "No Subdomains Discovered",
        category: FindingCategory::Surface,
        severity: Severity::Info,
        description: "None of the enumeration tools reported a subdomain. Either the domain has none, or the enumeration tools are missing or blocked, in which case the port scan had nothing to examine.",
        remediation: "Check that the enumeration tools (sublist3r, subfinder, dnsenum...) are installed and reachable on PATH."
    },
    FindingDetail {
        code: RISKY_SERVICE_EXPOSED,
        title: "Risky Service Exposed",
        category: FindingCategory::Surface,
        severity: Severity::Critical,
        description: "A service that is frequently brute-forced or exploited (plain-text protocols, remote desktop, file sharing or an unauthenticated database) is open to the internet on this host.",
        remediation: "Close the port on the perimeter firewall, or restrict it to a VPN or known source addresses. Replace plain-text protocols with their encrypted equivalents."
    },
    FindingDetail {
        code: SERVICES_UNAVAILABLE,
        title: "Port Scan Unavailable",
        category: FindingCategory::Surface,
        severity: Severity::Info,
        description: "No port and service reports could be produced for this domain, so exposed services were not assessed.",
        remediation: "Make sure nmap is installed, that the results directory is writable and that subdomains were discovered."
    },
    FindingDetail {
        code: SCRIPT_VULNERABLE,
        title: "NSE Script Reports a Vulnerability",
        category: FindingCategory::Surface,
        severity: Severity::Critical,
        description: "An nmap NSE script confirmed a known vulnerability on this port (its output carries 'State: VULNERABLE'). These checks test for specific published flaws, so a positive result usually has a public exploit.",
        remediation: "Look up the script id in the NSE documentation to find the CVE it tests, then patch or upgrade the affected service. Take the port off the internet until it is fixed."
    },
    FindingDetail {
        code: SCRIPTS_UNAVAILABLE,
        title: "Script Battery Unavailable",
        category: FindingCategory::Surface,
        severity: Severity::Info,
        description: "The NSE script battery was enabled but produced no reports for this domain.",
        remediation: "Make sure nmap is installed and can open raw sockets (decoys and fragmentation need root), and that subdomains were discovered."
    },
    FindingDetail {
        code: SERVER_VERSION_DISCLOSED,
        title: "Server Version Disclosed",
        category: FindingCategory::Surface,
        severity: Severity::Info,
        description: "The web server announces its exact software version through the Server or X-Powered-By header. This lets an attacker match the host against known vulnerabilities for that release without probing.",
        remediation: "Hide version details in the response headers (for example 'server_tokens off' in nginx, 'ServerTokens Prod' in Apache, 'expose_php = Off' for PHP)."
    },
];

/// Retrieves the detail for a finding code, or `None` for an unknown code.
pub fn get_finding_detail(code: &str) -> Option<&'static FindingDetail> {
    FINDINGS.iter().find(|f| f.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<_> = FINDINGS.iter().map(|f| f.code).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), FINDINGS.len());
    }

    #[test]
    fn lookup() {
        let detail = get_finding_detail(ZONE_TRANSFER_ALLOWED).unwrap();
        assert_eq!(detail.severity, Severity::Critical);
        assert_eq!(detail.category, FindingCategory::Dns);
        assert!(get_finding_detail("NOPE").is_none());
    }
}
