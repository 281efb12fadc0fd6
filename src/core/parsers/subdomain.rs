// src/core/parsers/subdomain.rs

use std::collections::BTreeSet;

use regex::Regex;
use tracing::{debug, error};

use crate::core::target::Domain;

/// Harvests `<label>.<domain>` hosts from the combined output of the
/// enumeration tools.
///
/// Matching is case-insensitive and results are lower-cased and
/// deduplicated. Hosts under other domains are ignored, as are matches that
/// would not pass hostname validation.
pub fn parse_subdomains<'a, I>(domain: &Domain, outputs: I) -> Vec<Domain>
where
    I: IntoIterator<Item = &'a str>,
{
    let pattern = format!(r"(?i)([a-z0-9-]+)\.{}\b", regex::escape(domain.as_str()));
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            error!(pattern = %pattern, error = %e, "Could not build subdomain pattern.");
            return Vec::new();
        }
    };

    let mut found = BTreeSet::new();
    for output in outputs {
        for caps in re.captures_iter(output) {
            let label = &caps[1];
            match Domain::parse(&format!("{label}.{domain}")) {
                Ok(sub) if sub.is_subdomain_of(domain) => {
                    found.insert(sub);
                }
                Ok(_) => {}
                Err(e) => debug!(label, error = %e, "Discarding malformed subdomain."),
            }
        }
    }

    debug!(domain = %domain, count = found.len(), "Harvested subdomains.");
    found.into_iter().collect()
}
