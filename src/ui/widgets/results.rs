// src/ui/widgets/results.rs
use crate::app::App;
use crate::core::models::{PortServiceReport, ReconReport, ReportSource, StepResult, WafVerdicts, WhoisField};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, Wrap},
};
use strum::IntoEnumIterator;

/// Renders the collected recon data of the finished report as scrollable text.
pub fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
    let results_block = Block::default()
        .borders(Borders::ALL)
        .title("Recon Data (Navigate with ↑ ↓, Tab for findings)");

    let Some(report) = &app.scan_report else {
        let p = Paragraph::new("No data yet.").block(results_block).alignment(Alignment::Center);
        frame.render_widget(p, area);
        return;
    };

    let lines = build_results_text(report);
    let (offset, scroll) = clamp_scroll(app.scroll_offset, lines.len());
    app.scroll_offset = offset;
    app.report_scroll_state = app
        .report_scroll_state
        .content_length(lines.len())
        .position(offset);
    let results_paragraph = Paragraph::new(lines)
        .block(results_block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(results_paragraph, area);

    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight),
        area,
        &mut app.report_scroll_state,
    );
}

/// Keeps the offset on the last line at most and converts it to the `u16`
/// ratatui scrolls by.
fn clamp_scroll(offset: usize, line_count: usize) -> (usize, u16) {
    let offset = offset.min(line_count.saturating_sub(1));
    (offset, u16::try_from(offset).unwrap_or(u16::MAX))
}

fn heading(title: &str) -> Line<'static> {
    Line::from(Span::styled(title.to_string(), Style::default().bold().underlined()))
}

fn failed(e: &str) -> Line<'static> {
    Line::from(Span::styled(format!("  Failed: {e}"), Style::default().fg(Color::Red)))
}

fn waf_lines(verdicts: &WafVerdicts) -> Vec<Line<'static>> {
    verdicts
        .iter()
        .map(|(host, verdict)| {
            let style = if verdict.is_protected() {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Yellow)
            };
            Line::from(vec![Span::raw(format!("  {host}: ")), Span::styled(verdict.to_string(), style)])
        })
        .collect()
}

fn step<T>(lines: &mut Vec<Line<'static>>, result: &StepResult<T>, render: impl FnOnce(&T, &mut Vec<Line<'static>>)) {
    match result {
        Ok(value) => render(value, lines),
        Err(e) => lines.push(failed(e)),
    }
}

fn build_results_text(report: &ReconReport) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(format!("Target: {}", report.target)),
        Line::from(format!(
            "Duration: {}s",
            (report.finished_at - report.started_at).num_seconds()
        )),
        Line::from(""),
        heading("WHOIS"),
    ];

    step(&mut lines, &report.whois, |whois, lines| {
        for field in WhoisField::iter() {
            if let Some(value) = whois.whois.get(field) {
                lines.push(Line::from(format!("  {}: {}", field.label(), value)));
            }
        }
        lines.push(Line::from(""));
        lines.push(heading("Nameservers"));
        for ns in &whois.nameservers {
            let status = match whois.zone_transfer.get(ns) {
                Some(status) => Span::styled(status.to_string(), Style::default().fg(Color::Green)),
                None => Span::styled("zone transfer allowed", Style::default().fg(Color::Red).bold()),
            };
            lines.push(Line::from(vec![Span::raw(format!("  {ns}: ")), status]));
        }
    });

    lines.push(Line::from(""));
    lines.push(heading("WAF (root domain)"));
    step(&mut lines, &report.waf, |verdicts, lines| lines.extend(waf_lines(verdicts)));

    lines.push(Line::from(""));
    lines.push(heading("WAF (subdomains)"));
    step(&mut lines, &report.subdomains, |subs, lines| {
        if subs.waf.is_empty() {
            lines.push(Line::from("  No verdicts."));
        }
        lines.extend(waf_lines(&subs.waf));
    });

    lines.push(Line::from(""));
    lines.push(heading("Ports & Services"));
    step(&mut lines, &report.services, |services, lines| {
        if services.source == ReportSource::Cached {
            lines.push(Line::from(Span::styled(
                "  (existing reports, no new scan)",
                Style::default().fg(Color::DarkGray),
            )));
        }
        lines.extend(port_lines(&services.reports));
    });

    lines.push(Line::from(""));
    lines.push(heading("Technologies"));
    step(&mut lines, &report.technologies, |techs, lines| {
        if techs.is_empty() {
            lines.push(Line::from("  Nothing fingerprinted."));
        }
        for (host, found) in techs {
            lines.push(Line::from(Span::styled(format!("  {host}"), Style::default().fg(Color::Cyan))));
            for tech in found {
                lines.push(Line::from(format!("    {tech}")));
            }
        }
    });

    if let Some(scripts) = &report.scripts {
        lines.push(Line::from(""));
        lines.push(heading("NSE Script Battery"));
        step(&mut lines, scripts, |battery, lines| lines.extend(port_lines(&battery.reports)));
    }

    lines
}

fn port_lines(reports: &[PortServiceReport]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for r in reports {
        lines.push(Line::from(Span::styled(format!("  {}", r.key), Style::default().fg(Color::Cyan))));
        if r.ports.is_empty() {
            lines.push(Line::from("    no ports"));
        }
        for p in &r.ports {
            let style = if p.state == "open" {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            lines.push(Line::from(Span::styled(
                format!("    {}/{} {} {}", p.port_id, p.protocol, p.state, p.service),
                style,
            )));
            for script in &p.scripts {
                let style = if script.is_vulnerable() {
                    Style::default().fg(Color::Red).bold()
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                let first = script.output.lines().next().unwrap_or_default();
                lines.push(Line::from(Span::styled(format!("      {}: {first}", script.id), style)));
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_offset_is_bounded() {
        assert_eq!(clamp_scroll(3, 10), (3, 3));
        assert_eq!(clamp_scroll(50, 10), (9, 9));
        assert_eq!(clamp_scroll(5, 0), (0, 0));
        assert_eq!(clamp_scroll(100_000, 200_000), (100_000, u16::MAX));
    }
}
