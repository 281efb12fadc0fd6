// src/core/parsers/mod.rs

// One parser per tool output grammar. All of them are pure: text in,
// records out, no shared state.
pub mod nameserver;
pub mod nmap_xml;
pub mod subdomain;
pub mod tech;
pub mod waf;
pub mod whois;

pub use nameserver::parse_nameserver_status;
pub use subdomain::parse_subdomains;
pub use tech::parse_technologies;
pub use waf::parse_waf_results;
pub use whois::parse_whois;
