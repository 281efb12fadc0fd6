// src/ui/widgets/mod.rs

pub mod analysis_view; // Findings list with details.
pub mod disclaimer_popup;
pub mod footer;
pub mod input;
pub mod log_view;
pub mod results; // Raw recon data: WHOIS, nameservers, WAF, ports.
pub mod summary;
