// src/core/parsers/waf.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::core::models::{CommandResult, WafVerdict, WafVerdicts};

static RE_CHECKING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\*\] Checking https?://([^/\s]+)").unwrap());
static RE_BEHIND: Lazy<Regex> = Lazy::new(|| Regex::new(r"behind (.+?) WAF").unwrap());

const NO_WAF: &str = "No WAF detected by the generic detection";
const IS_BEHIND: &str = "is behind";

/// Classifies a single wafw00f run.
///
/// Returns the host named in the `[*] Checking https://<host>` banner with
/// its verdict, or `None` when no banner is present.
pub fn parse_waf_output(text: &str) -> Option<(String, WafVerdict)> {
    let host = RE_CHECKING.captures(text)?.get(1)?.as_str().to_string();

    let verdict = if text.contains(NO_WAF) {
        WafVerdict::NoWaf
    } else if text.contains(IS_BEHIND) {
        match RE_BEHIND.captures(text).and_then(|c| c.get(1)) {
            Some(vendor) => WafVerdict::Detected(vendor.as_str().trim().to_string()),
            None => WafVerdict::UnidentifiedWaf,
        }
    } else {
        WafVerdict::ConnectionFailed
    };

    debug!(host = %host, verdict = %verdict, "Parsed WAF verdict.");
    Some((host, verdict))
}

/// Merges many wafw00f runs into one map keyed by banner host, so the order
/// of the outputs does not matter. Outputs without a banner contribute
/// nothing.
pub fn parse_waf<'a, I>(outputs: I) -> WafVerdicts
where
    I: IntoIterator<Item = &'a str>,
{
    outputs.into_iter().filter_map(parse_waf_output).collect()
}

/// Convenience over dispatcher results.
pub fn parse_waf_results(results: &[CommandResult]) -> WafVerdicts {
    parse_waf(results.iter().map(|r| r.output.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_waf_detected() {
        let verdicts = parse_waf(["[*] Checking https://example.com\nNo WAF detected by the generic detection"]);
        assert_eq!(verdicts.get("example.com"), Some(&WafVerdict::NoWaf));
        assert_eq!(verdicts["example.com"].to_string(), "No contiene WAF");
    }

    #[test]
    fn vendor_is_extracted() {
        let verdicts = parse_waf(["[*] Checking https://example.com\nThe site example.com is behind Cloudflare WAF"]);
        assert_eq!(verdicts.get("example.com"), Some(&WafVerdict::Detected("Cloudflare".into())));
    }

    #[test]
    fn real_wafw00f_banner() {
        let out = "\
[*] Checking https://shop.example.com
[+] The site https://shop.example.com is behind Cloudflare (Cloudflare Inc.) WAF.
[~] Number of requests: 2";
        let (host, verdict) = parse_waf_output(out).unwrap();
        assert_eq!(host, "shop.example.com");
        assert_eq!(verdict, WafVerdict::Detected("Cloudflare (Cloudflare Inc.)".into()));
    }

    #[test]
    fn behind_without_vendor_is_generic() {
        let (_, verdict) = parse_waf_output("[*] Checking https://a.example.com\nit is behind something").unwrap();
        assert_eq!(verdict, WafVerdict::UnidentifiedWaf);
    }

    #[test]
    fn neither_phrase_means_connection_failed() {
        let (_, verdict) = parse_waf_output("[*] Checking https://down.example.com\n[-] Site down!").unwrap();
        assert_eq!(verdict, WafVerdict::ConnectionFailed);
    }

    #[test]
    fn outputs_without_banner_are_dropped() {
        let verdicts = parse_waf([
            "ERROR: could not resolve",
            "[*] Checking https://b.example.com\nNo WAF detected by the generic detection",
            "",
        ]);
        assert_eq!(verdicts.len(), 1);
        assert!(verdicts.contains_key("b.example.com"));
    }

    #[test]
    fn keyed_by_banner_not_order() {
        let a = "[*] Checking https://a.example.com\nNo WAF detected by the generic detection";
        let b = "[*] Checking https://b.example.com\nis behind Akamai WAF";
        assert_eq!(parse_waf([a, b]), parse_waf([b, a]));
    }
}
