// src/core/parsers/nmap_xml.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, info, warn};

use crate::core::models::{PortEntry, PortServiceReport, ScriptOutput, UNKNOWN_SERVICE};

const REPORT_PREFIX: &str = "scan_";
const REPORT_SUFFIX: &str = ".xml";
const UNKNOWN_STATE: &str = "unknown";

/// The part of a `scan_*.xml` file name between prefix and suffix.
pub fn report_key(file_name: &str) -> Option<&str> {
    file_name
        .strip_prefix(REPORT_PREFIX)?
        .strip_suffix(REPORT_SUFFIX)
        .filter(|key| !key.is_empty())
}

/// File name used for the report of `host` under `profile`.
pub fn report_file_name(profile: &str, host: &str) -> String {
    format!("{REPORT_PREFIX}{profile}_{}{REPORT_SUFFIX}", host.replace('/', "_"))
}

/// Splits a report key into its profile and host when it starts with one
/// of `profiles`.
fn split_key<'k>(key: &'k str, profiles: &[&str]) -> (Option<String>, &'k str) {
    profiles
        .iter()
        .find_map(|p| {
            key.strip_prefix(p)
                .and_then(|rest| rest.strip_prefix('_'))
                .filter(|host| !host.is_empty())
                .map(|host| (Some(p.to_string()), host))
        })
        .unwrap_or((None, key))
}

fn attr(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, String> {
    match e.try_get_attribute(name).map_err(|err| err.to_string())? {
        Some(a) => a
            .unescape_value()
            .map(|v| Some(v.into_owned()))
            .map_err(|err| err.to_string()),
        None => Ok(None),
    }
}

/// Extracts every `<port>` of an nmap XML report, in document order, with
/// the `<script>` results nested under it.
///
/// A report that stops before `</nmaprun>` is an error: nmap writes the
/// document as it goes, so a run killed halfway leaves a truncated file.
pub fn parse_nmap_ports(xml: &str) -> Result<Vec<PortEntry>, String> {
    let mut reader = Reader::from_str(xml);
    let mut ports = Vec::new();
    let mut current: Option<PortEntry> = None;
    let mut finished = false;

    loop {
        let (element, self_closing) = match reader.read_event() {
            Ok(Event::Start(e)) => (e, false),
            Ok(Event::Empty(e)) => (e, true),
            Ok(Event::End(e)) => {
                match e.name().as_ref() {
                    b"port" => ports.extend(current.take()),
                    b"nmaprun" => finished = true,
                    _ => {}
                }
                continue;
            }
            Ok(Event::Eof) => break,
            Ok(_) => continue,
            Err(e) => return Err(format!("malformed XML at byte {}: {e}", reader.buffer_position())),
        };

        match element.name().as_ref() {
            b"port" => {
                let entry = PortEntry {
                    port_id: attr(&element, "portid")?.unwrap_or_default(),
                    protocol: attr(&element, "protocol")?.unwrap_or_default(),
                    state: UNKNOWN_STATE.to_string(),
                    service: UNKNOWN_SERVICE.to_string(),
                    scripts: Vec::new(),
                };
                if self_closing {
                    ports.push(entry);
                } else {
                    current = Some(entry);
                }
            }
            b"state" => {
                if let (Some(port), Some(state)) = (current.as_mut(), attr(&element, "state")?) {
                    port.state = state;
                }
            }
            b"service" => {
                if let (Some(port), Some(name)) = (current.as_mut(), attr(&element, "name")?) {
                    port.service = name;
                }
            }
            b"script" => {
                if let (Some(port), Some(id)) = (current.as_mut(), attr(&element, "id")?) {
                    let output = attr(&element, "output")?.unwrap_or_default();
                    port.scripts.push(ScriptOutput { id, output: output.trim().to_string() });
                }
            }
            _ => {}
        }
    }

    if current.is_some() {
        return Err("unterminated <port> element".to_string());
    }
    if !finished {
        return Err("report ends before </nmaprun>".to_string());
    }
    Ok(ports)
}

/// Parses every `scan_*.xml` report in `dir`, one `PortServiceReport` per
/// file, sorted by file name. `profiles` are the key prefixes split off
/// into `PortServiceReport::profile`. Unreadable or malformed files are
/// skipped.
pub fn parse_port_service_dir(dir: &Path, profiles: &[&str]) -> io::Result<Vec<PortServiceReport>> {
    let mut files: Vec<(String, PathBuf)> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            report_key(&name)?;
            Some((name, entry.path()))
        })
        .collect();
    files.sort();

    let mut reports = Vec::with_capacity(files.len());
    for (name, path) in files {
        let Some(key) = report_key(&name) else { continue };

        let xml = match fs::read_to_string(&path) {
            Ok(xml) => xml,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Could not read scan report.");
                continue;
            }
        };
        let ports = match parse_nmap_ports(&xml) {
            Ok(ports) => ports,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping unparsable scan report.");
                continue;
            }
        };

        let (profile, host) = split_key(key, profiles);
        debug!(file = %name, ports = ports.len(), "Parsed scan report.");
        reports.push(PortServiceReport {
            key: key.to_string(),
            profile,
            host: host.to_string(),
            ports,
        });
    }

    info!(dir = %dir.display(), reports = reports.len(), "Aggregated port/service reports.");
    Ok(reports)
}
