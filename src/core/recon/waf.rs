// src/core/recon/waf.rs

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{Recon, ensure_active};
use crate::core::error::ReconError;
use crate::core::models::{WafVerdict, WafVerdicts};
use crate::core::parsers::parse_waf_results;
use crate::core::target::Domain;
use crate::core::tools::Tool;

impl Recon {
    /// Single WAF check against the root domain.
    pub async fn waf(&self, domain: &Domain, cancel: &CancellationToken) -> Result<WafVerdicts, ReconError> {
        ensure_active(cancel)?;
        info!(target = %domain, "Probing root domain for a WAF.");

        let check = self
            .dispatch_one(self.tools.command(Tool::Wafw00f, [domain.to_string()]), cancel)
            .await;
        ensure_active(cancel)?;

        let mut verdicts = parse_waf_results(std::slice::from_ref(&check));
        if verdicts.is_empty() {
            warn!(target = %domain, error = ?check.error(), "WAF check produced no banner.");
            verdicts.insert(domain.to_string(), WafVerdict::ConnectionFailed);
        }
        Ok(verdicts)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::recon::testing::{ScriptedExecutor, example, recon_with};

    #[tokio::test]
    async fn detects_vendor_on_root_domain() {
        let executor = Arc::new(ScriptedExecutor::new().answer(
            "wafw00f example.com",
            "[*] Checking https://example.com\n[+] The site https://example.com is behind Cloudflare (Cloudflare Inc.) WAF.",
        ));
        let dir = tempfile::tempdir().unwrap();
        let recon = recon_with(executor, dir.path());

        let verdicts = recon.waf(&example(), &CancellationToken::new()).await.unwrap();
        assert_eq!(verdicts.len(), 1);
        assert!(verdicts["example.com"].is_protected());
    }

    #[tokio::test]
    async fn missing_tool_degrades_to_connection_failed() {
        let executor = Arc::new(ScriptedExecutor::new().fail_tool(Tool::Wafw00f));
        let dir = tempfile::tempdir().unwrap();
        let recon = recon_with(executor, dir.path());

        let verdicts = recon.waf(&example(), &CancellationToken::new()).await.unwrap();
        assert_eq!(verdicts.get("example.com"), Some(&WafVerdict::ConnectionFailed));
    }
}
