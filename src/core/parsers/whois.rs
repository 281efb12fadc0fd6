// src/core/parsers/whois.rs

use std::collections::HashMap;

use once_cell::sync::Lazy;
use strum::IntoEnumIterator;
use tracing::debug;

use crate::core::models::{WhoisField, WhoisRecord};

static LABELS: Lazy<HashMap<&'static str, WhoisField>> =
    Lazy::new(|| WhoisField::iter().map(|f| (f.label(), f)).collect());

/// Parses `Label: value` lines of WHOIS output into a `WhoisRecord`.
///
/// Each line is split on its first colon. Lines whose label is not one of
/// the recognized fields are ignored, so the function never fails; input
/// without any known label simply produces an empty record. For repeated
/// labels the last value wins, except `Name Server`, whose values are
/// lower-cased, deduplicated in first-seen order and joined with ", ".
pub fn parse_whois<'a, I>(lines: I) -> WhoisRecord
where
    I: IntoIterator<Item = &'a str>,
{
    let mut record = WhoisRecord::default();
    let mut name_servers: Vec<String> = Vec::new();

    for line in lines {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let Some(&field) = LABELS.get(label.trim()) else {
            continue;
        };
        let value = value.trim();

        if field == WhoisField::NameServer {
            let ns = value.to_ascii_lowercase();
            if !ns.is_empty() && !name_servers.contains(&ns) {
                name_servers.push(ns);
            }
        } else {
            record.set(field, value.to_string());
        }
    }

    if !name_servers.is_empty() {
        debug!(count = name_servers.len(), "Collected WHOIS nameservers.");
        record.set(WhoisField::NameServer, name_servers.join(", "));
    }
    record
}
