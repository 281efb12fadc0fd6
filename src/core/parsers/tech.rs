// src/core/parsers/tech.rs

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::core::models::{TechReport, Technology};

/// `<url> [<status>] <plugin>, <plugin>, ...` as printed by whatweb.
static RESULT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<url>https?://\S+)\s+\[(?P<status>[^\]]*)\]\s*(?P<plugins>.*)$").unwrap());

/// Splits on commas that are not inside brackets: `Title[a, b]` is one plugin.
fn split_plugins(plugins: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in plugins.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&plugins[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&plugins[start..]);
    parts.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect()
}

/// `Country[UNITED STATES][US]` becomes `Country` with two details.
fn parse_plugin(plugin: &str) -> Technology {
    let (name, mut rest) = match plugin.find('[') {
        Some(i) => (&plugin[..i], &plugin[i..]),
        None => (plugin, ""),
    };
    let mut details = Vec::new();
    while let Some(open) = rest.find('[') {
        let mut depth = 0usize;
        let mut close = None;
        for (i, c) in rest[open..].char_indices() {
            match c {
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(open + i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(close) = close else { break };
        let detail = rest[open + 1..close].trim();
        if !detail.is_empty() {
            details.push(detail.to_string());
        }
        rest = &rest[close + 1..];
    }
    Technology { name: name.trim().to_string(), details }
}

/// Technologies per host across whatweb outputs. Redirect chains print one
/// line per hop; hops on the same host are merged and exact repeats dropped.
/// Error lines and anything else without a result banner are ignored.
pub fn parse_technologies<'a, I>(outputs: I) -> TechReport
where
    I: IntoIterator<Item = &'a str>,
{
    let mut by_host: BTreeMap<String, BTreeSet<Technology>> = BTreeMap::new();
    for line in outputs.into_iter().flat_map(str::lines) {
        let Some(caps) = RESULT_LINE.captures(line.trim()) else { continue };
        let Some(host) = Url::parse(&caps["url"])
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        else {
            continue;
        };
        by_host
            .entry(host)
            .or_default()
            .extend(split_plugins(&caps["plugins"]).into_iter().map(parse_plugin));
    }
    by_host.into_iter().map(|(host, techs)| (host, techs.into_iter().collect())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = "http://shop.example.com [301 Moved Permanently] Country[UNITED STATES][US], HTTPServer[nginx/1.18.0 (Ubuntu)], IP[93.184.216.34], RedirectLocation[https://shop.example.com/], nginx[1.18.0]\n\
https://shop.example.com/ [200 OK] Country[UNITED STATES][US], HTML5, HTTPServer[nginx/1.18.0 (Ubuntu)], IP[93.184.216.34], Title[Shop, Home], X-Powered-By[PHP/7.4.3], nginx[1.18.0]";

    fn names(report: &TechReport, host: &str) -> Vec<String> {
        report[host].iter().map(|t| t.name.clone()).collect()
    }

    #[test]
    fn merges_redirect_hops_per_host() {
        let report = parse_technologies([OUTPUT]);
        assert_eq!(report.len(), 1);
        assert_eq!(
            names(&report, "shop.example.com"),
            vec!["Country", "HTML5", "HTTPServer", "IP", "RedirectLocation", "Title", "X-Powered-By", "nginx"]
        );
        let country = report["shop.example.com"].iter().find(|t| t.name == "Country").unwrap();
        assert_eq!(country.details, vec!["UNITED STATES", "US"]);
        let title = report["shop.example.com"].iter().find(|t| t.name == "Title").unwrap();
        assert_eq!(title.details, vec!["Shop, Home"]);
        assert_eq!(title.to_string(), "Title [Shop, Home]");
    }

    #[test]
    fn error_lines_are_skipped() {
        let report = parse_technologies([
            "ERROR Opening: https://dead.example.com - Connection refused - connect(2)",
            "",
            "https://API.example.com [403 Forbidden] UncommonHeaders[x-request-id]",
        ]);
        assert_eq!(report.keys().collect::<Vec<_>>(), vec!["api.example.com"]);
        assert_eq!(report["api.example.com"][0].details, vec!["x-request-id"]);
    }

    #[test]
    fn bare_plugins_have_no_details() {
        assert_eq!(split_plugins("HTML5, Script[text/javascript], JQuery"), vec!["HTML5", "Script[text/javascript]", "JQuery"]);
        assert_eq!(parse_plugin("HTML5"), Technology { name: "HTML5".into(), details: Vec::new() });
        assert_eq!(parse_plugin("Meta[a[b]]").details, vec!["a[b]"]);
    }
}
