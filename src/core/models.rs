// src/core/models.rs

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::core::error::ExecutionFailure;
use crate::core::target::Domain;
use crate::core::tools::ToolCommand;

// --- Reusable Result Types ---

/// Outcome of one workflow inside a report. Errors are flattened to strings
/// so the whole report stays serializable.
pub type StepResult<T> = Result<T, String>;

// --- Analysis ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// A finding produced by the analysis step; `code` keys into the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisFinding {
    pub severity: Severity,
    pub code: String,
    /// The host or nameserver the finding is about, when it is about one.
    pub subject: Option<String>,
}

impl AnalysisFinding {
    pub fn new(severity: Severity, code: &str) -> Self {
        Self { severity, code: code.to_string(), subject: None }
    }

    pub fn about(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

// --- Process Execution ---

/// The normalized outcome of running one external command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandResult {
    pub command: ToolCommand,
    /// stdout with ANSI sequences removed and surrounding whitespace trimmed.
    /// Kept even when the process failed, since tools often report their
    /// verdict and then exit non-zero.
    pub output: String,
    pub stderr: String,
    pub failure: Option<ExecutionFailure>,
}

impl CommandResult {
    pub fn success(command: ToolCommand, output: String, stderr: String) -> Self {
        Self { command, output, stderr, failure: None }
    }

    pub fn failed(command: ToolCommand, failure: ExecutionFailure) -> Self {
        Self { command, output: String::new(), stderr: String::new(), failure: Some(failure) }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    pub fn error(&self) -> Option<String> {
        self.failure.as_ref().map(|f| f.to_string())
    }
}

// --- WHOIS ---

/// The WHOIS labels the parser recognizes, in the order registries print them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum WhoisField {
    DomainName,
    SponsoringRegistrar,
    RegistryDomainId,
    RegistrarWhoisServer,
    RegistrarUrl,
    UpdatedDate,
    CreationDate,
    RegistryExpiryDate,
    Registrar,
    RegistrarIanaId,
    RegistrarAbuseContactEmail,
    RegistrarAbuseContactPhone,
    DomainStatus,
    RegistrantName,
    AdminName,
    AdminEmail,
    NameServer,
    Dnssec,
    IcannComplaintUrl,
}

impl WhoisField {
    /// The label exactly as it appears on the left of the colon.
    pub fn label(self) -> &'static str {
        match self {
            WhoisField::DomainName => "Domain Name",
            WhoisField::SponsoringRegistrar => "Sponsoring Registrar",
            WhoisField::RegistryDomainId => "Registry Domain ID",
            WhoisField::RegistrarWhoisServer => "Registrar WHOIS Server",
            WhoisField::RegistrarUrl => "Registrar URL",
            WhoisField::UpdatedDate => "Updated Date",
            WhoisField::CreationDate => "Creation Date",
            WhoisField::RegistryExpiryDate => "Registry Expiry Date",
            WhoisField::Registrar => "Registrar",
            WhoisField::RegistrarIanaId => "Registrar IANA ID",
            WhoisField::RegistrarAbuseContactEmail => "Registrar Abuse Contact Email",
            WhoisField::RegistrarAbuseContactPhone => "Registrar Abuse Contact Phone",
            WhoisField::DomainStatus => "Domain Status",
            WhoisField::RegistrantName => "Registrant Name",
            WhoisField::AdminName => "Admin Name",
            WhoisField::AdminEmail => "Admin Email",
            WhoisField::NameServer => "Name Server",
            WhoisField::Dnssec => "DNSSEC",
            WhoisField::IcannComplaintUrl => "URL of the ICANN Whois Inaccuracy Complaint Form",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WhoisRecord {
    pub domain_name: Option<String>,
    pub sponsoring_registrar: Option<String>,
    pub registry_domain_id: Option<String>,
    pub registrar_whois_server: Option<String>,
    pub registrar_url: Option<String>,
    pub updated_date: Option<String>,
    pub creation_date: Option<String>,
    pub registry_expiry_date: Option<String>,
    pub registrar: Option<String>,
    pub registrar_iana_id: Option<String>,
    pub registrar_abuse_contact_email: Option<String>,
    pub registrar_abuse_contact_phone: Option<String>,
    pub domain_status: Option<String>,
    pub registrant_name: Option<String>,
    pub admin_name: Option<String>,
    pub admin_email: Option<String>,
    /// Unique nameservers joined with ", ".
    pub name_server: Option<String>,
    pub dnssec: Option<String>,
    pub icann_complaint_url: Option<String>,
}

impl WhoisRecord {
    pub fn get(&self, field: WhoisField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: WhoisField, value: String) {
        *self.slot_mut(field) = Some(value);
    }

    pub fn is_empty(&self) -> bool {
        WhoisField::iter().all(|f| self.get(f).is_none())
    }

    /// The `Name Server` field split back into individual hosts.
    pub fn name_servers(&self) -> Vec<String> {
        self.name_server
            .as_deref()
            .map(|joined| {
                joined
                    .split(", ")
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn slot(&self, field: WhoisField) -> &Option<String> {
        match field {
            WhoisField::DomainName => &self.domain_name,
            WhoisField::SponsoringRegistrar => &self.sponsoring_registrar,
            WhoisField::RegistryDomainId => &self.registry_domain_id,
            WhoisField::RegistrarWhoisServer => &self.registrar_whois_server,
            WhoisField::RegistrarUrl => &self.registrar_url,
            WhoisField::UpdatedDate => &self.updated_date,
            WhoisField::CreationDate => &self.creation_date,
            WhoisField::RegistryExpiryDate => &self.registry_expiry_date,
            WhoisField::Registrar => &self.registrar,
            WhoisField::RegistrarIanaId => &self.registrar_iana_id,
            WhoisField::RegistrarAbuseContactEmail => &self.registrar_abuse_contact_email,
            WhoisField::RegistrarAbuseContactPhone => &self.registrar_abuse_contact_phone,
            WhoisField::DomainStatus => &self.domain_status,
            WhoisField::RegistrantName => &self.registrant_name,
            WhoisField::AdminName => &self.admin_name,
            WhoisField::AdminEmail => &self.admin_email,
            WhoisField::NameServer => &self.name_server,
            WhoisField::Dnssec => &self.dnssec,
            WhoisField::IcannComplaintUrl => &self.icann_complaint_url,
        }
    }

    fn slot_mut(&mut self, field: WhoisField) -> &mut Option<String> {
        match field {
            WhoisField::DomainName => &mut self.domain_name,
            WhoisField::SponsoringRegistrar => &mut self.sponsoring_registrar,
            WhoisField::RegistryDomainId => &mut self.registry_domain_id,
            WhoisField::RegistrarWhoisServer => &mut self.registrar_whois_server,
            WhoisField::RegistrarUrl => &mut self.registrar_url,
            WhoisField::UpdatedDate => &mut self.updated_date,
            WhoisField::CreationDate => &mut self.creation_date,
            WhoisField::RegistryExpiryDate => &mut self.registry_expiry_date,
            WhoisField::Registrar => &mut self.registrar,
            WhoisField::RegistrarIanaId => &mut self.registrar_iana_id,
            WhoisField::RegistrarAbuseContactEmail => &mut self.registrar_abuse_contact_email,
            WhoisField::RegistrarAbuseContactPhone => &mut self.registrar_abuse_contact_phone,
            WhoisField::DomainStatus => &mut self.domain_status,
            WhoisField::RegistrantName => &mut self.registrant_name,
            WhoisField::AdminName => &mut self.admin_name,
            WhoisField::AdminEmail => &mut self.admin_email,
            WhoisField::NameServer => &mut self.name_server,
            WhoisField::Dnssec => &mut self.dnssec,
            WhoisField::IcannComplaintUrl => &mut self.icann_complaint_url,
        }
    }
}

// --- WAF ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WafVerdict {
    NoWaf,
    Detected(String),
    /// The tool reported a WAF but the vendor name could not be extracted.
    UnidentifiedWaf,
    ConnectionFailed,
}

impl WafVerdict {
    pub fn is_protected(&self) -> bool {
        matches!(self, WafVerdict::Detected(_) | WafVerdict::UnidentifiedWaf)
    }
}

impl fmt::Display for WafVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WafVerdict::NoWaf => f.write_str("No contiene WAF"),
            WafVerdict::Detected(vendor) => f.write_str(vendor),
            WafVerdict::UnidentifiedWaf => f.write_str("WAF genérico"),
            WafVerdict::ConnectionFailed => f.write_str("Falló al conectar"),
        }
    }
}

/// Verdicts keyed by the host named in each wafw00f run's own banner.
pub type WafVerdicts = BTreeMap<String, WafVerdict>;

// --- Nameservers ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneTransferStatus {
    Refused,
    Unreachable,
}

impl fmt::Display for ZoneTransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneTransferStatus::Refused => f.write_str("Falló la transferencia de zona"),
            ZoneTransferStatus::Unreachable => f.write_str("Sin acceso"),
        }
    }
}

/// A nameserver missing from this map answered the AXFR: the zone leaked.
pub type NameserverStatus = BTreeMap<String, ZoneTransferStatus>;

// --- Ports / Services ---

pub const UNKNOWN_SERVICE: &str = "Desconocido";

/// The two nmap passes run against every host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanProfile {
    Default,
    Vuln,
}

impl ScanProfile {
    pub const ALL: [ScanProfile; 2] = [ScanProfile::Default, ScanProfile::Vuln];
    pub const NAMES: [&'static str; 2] = ["default", "vuln"];

    /// Name used in report file names.
    pub fn name(self) -> &'static str {
        match self {
            ScanProfile::Default => Self::NAMES[0],
            ScanProfile::Vuln => Self::NAMES[1],
        }
    }
}

/// NSE script categories of the extended script battery, one nmap run each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NseCategory {
    Auth,
    Brute,
    Default,
    Exploit,
    Fuzzer,
    Intrusive,
    Vuln,
}

impl NseCategory {
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn names() -> Vec<&'static str> {
        Self::iter().map(Self::name).collect()
    }
}

/// One `<script>` result attached to a port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScriptOutput {
    pub id: String,
    pub output: String,
}

impl ScriptOutput {
    /// True when the script reports a `State: VULNERABLE` (or `LIKELY
    /// VULNERABLE`) line. `NOT VULNERABLE` does not count.
    pub fn is_vulnerable(&self) -> bool {
        self.output.lines().any(|line| {
            let line = line.trim();
            line.starts_with("State:") && line.contains("VULNERABLE") && !line.contains("NOT VULNERABLE")
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortEntry {
    pub port_id: String,
    pub protocol: String,
    pub state: String,
    pub service: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scripts: Vec<ScriptOutput>,
}

/// All ports found in one `scan_*.xml` report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortServiceReport {
    /// The file name without `scan_` and `.xml`.
    pub key: String,
    /// The scan profile or NSE category named in the key, when it names one.
    pub profile: Option<String>,
    pub host: String,
    pub ports: Vec<PortEntry>,
}

// --- Workflow Reports ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WhoisReport {
    pub whois: WhoisRecord,
    pub nameservers: Vec<String>,
    pub zone_transfer: NameserverStatus,
}

impl WhoisReport {
    /// Nameservers that answered the zone transfer.
    pub fn leaking_nameservers(&self) -> impl Iterator<Item = &str> {
        self.nameservers
            .iter()
            .filter(|ns| !self.zone_transfer.contains_key(ns.as_str()))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubdomainReport {
    pub subdomains: Vec<Domain>,
    pub waf: WafVerdicts,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReportSource {
    /// Reports already present in the results directory were parsed as-is.
    Cached,
    /// Scans were dispatched during this call.
    Scanned,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServicesReport {
    pub source: ReportSource,
    pub reports: Vec<PortServiceReport>,
    pub scan_results: Vec<CommandResult>,
}

/// Results of the NSE script battery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScriptScanReport {
    pub reports: Vec<PortServiceReport>,
    pub scan_results: Vec<CommandResult>,
}

// --- Technologies ---

/// A whatweb plugin hit, e.g. `HTTPServer[nginx/1.18.0]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Technology {
    pub name: String,
    pub details: Vec<String>,
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.details.is_empty() {
            write!(f, " [{}]", self.details.join(", "))?;
        }
        Ok(())
    }
}

/// Technologies keyed by the host of the fingerprinted URL.
pub type TechReport = BTreeMap<String, Vec<Technology>>;

// --- Main Report ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconReport {
    pub target: Domain,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub whois: StepResult<WhoisReport>,
    pub waf: StepResult<WafVerdicts>,
    pub subdomains: StepResult<SubdomainReport>,
    pub services: StepResult<ServicesReport>,
    pub technologies: StepResult<TechReport>,
    /// `None` when the script battery is disabled.
    pub scripts: Option<StepResult<ScriptScanReport>>,
    pub analysis: Vec<AnalysisFinding>,
}
