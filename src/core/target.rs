// src/core/target.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::ReconError;

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// A hostname that passed allow-list validation.
///
/// Every value that ends up in a tool's argument vector goes through
/// `Domain::parse` first, whether it came from the user or was scraped out
/// of another tool's output. Only ASCII letters, digits, hyphens and dots
/// survive, so nothing a tool receives can be read as a flag or a shell
/// metacharacter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Domain(String);

impl Domain {
    pub fn parse(input: &str) -> Result<Self, ReconError> {
        let invalid = |reason| ReconError::InvalidDomain { input: input.to_string(), reason };

        // A single trailing dot is the fully-qualified form used by dig and whois.
        let trimmed = input.trim();
        let host = trimmed.strip_suffix('.').unwrap_or(trimmed).to_ascii_lowercase();

        if host.is_empty() {
            return Err(invalid("empty hostname"));
        }
        if host.len() > MAX_HOSTNAME_LEN {
            return Err(invalid("hostname longer than 253 characters"));
        }

        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() < 2 {
            return Err(invalid("hostname needs at least two labels"));
        }
        for label in &labels {
            if label.is_empty() {
                return Err(invalid("empty label"));
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(invalid("label longer than 63 characters"));
            }
            if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
                return Err(invalid("only letters, digits and hyphens are allowed"));
            }
            if label.starts_with('-') || label.ends_with('-') {
                return Err(invalid("labels cannot start or end with a hyphen"));
            }
        }

        let tld = labels[labels.len() - 1];
        if tld.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("top-level label cannot be numeric"));
        }

        Ok(Domain(host))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `self` sits strictly below `parent` in the DNS tree.
    pub fn is_subdomain_of(&self, parent: &Domain) -> bool {
        self.0.len() > parent.0.len()
            && self.0.ends_with(parent.as_str())
            && self.0.as_bytes()[self.0.len() - parent.0.len() - 1] == b'.'
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Domain {
    type Error = ReconError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Domain::parse(&value)
    }
}

impl From<Domain> for String {
    fn from(value: Domain) -> Self {
        value.0
    }
}
