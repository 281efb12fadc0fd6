// src/ui/widgets/summary.rs

use crate::app::{App, AppState};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph},
};

/// Renders the summary widget: overall score, gauge, recon checks, issue
/// counts and the discovered subdomains with their WAF verdicts. Content is
/// drawn only once the scan has finished.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary_container = Block::default().borders(Borders::ALL).title("Summary");
    frame.render_widget(summary_container, area);

    let summary_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Score & Rating section
            Constraint::Length(1), // Gauge chart
            Constraint::Length(1), // Spacer
            Constraint::Length(5), // Recon checks
            Constraint::Length(1), // Spacer
            Constraint::Length(3), // Issues Found section
            Constraint::Length(1), // Spacer
            Constraint::Min(0),    // Subdomains
        ])
        .split(area);

    if !matches!(app.state, AppState::Finished) {
        return;
    }

    // --- Score & Rating Section ---
    let (rating_text, rating_style) = match app.summary.score {
        90..=100 => ("Excellent", Style::default().fg(Color::Green)),
        75..=89 => ("Good", Style::default().fg(Color::Cyan)),
        50..=74 => ("Needs Improvement", Style::default().fg(Color::Yellow)),
        _ => ("Poor", Style::default().fg(Color::Red)),
    };
    let score_line = Line::from(format!("{}/100 ({})", app.summary.score, rating_text)).style(rating_style);
    let score_text = Text::from(vec![Line::from("Overall Score".bold()), score_line]);
    frame.render_widget(Paragraph::new(score_text).alignment(Alignment::Center), summary_chunks[0]);

    // --- Gauge Chart (Animated) ---
    let score_gauge = Gauge::default()
        .percent(app.displayed_score as u16)
        .label("")
        .style(Style::default().fg(if app.displayed_score >= 80 {
            Color::Green
        } else if app.displayed_score >= 50 {
            Color::Yellow
        } else {
            Color::Red
        }));
    frame.render_widget(score_gauge, summary_chunks[1]);

    // --- Recon Checks Section ---
    let checks_block = Block::default().title("RECON CHECKS".bold());
    let checks_to_render = [
        ("Zone transfer refused", app.summary.zone_transfer_check_passed),
        ("WAF on root domain", app.summary.root_waf_check_passed),
        ("WAF on subdomains", app.summary.subdomain_waf_check_passed),
        ("No risky services", app.summary.services_check_passed),
    ];
    let checks_lines: Vec<Line> = checks_to_render
        .into_iter()
        .map(|(name, passed)| {
            let (icon, style) = if passed {
                ("✓", Style::default().fg(Color::Green))
            } else {
                ("✗", Style::default().fg(Color::Red))
            };
            Line::from(vec![Span::styled(format!("{} ", icon), style), Span::raw(name)])
        })
        .collect();
    frame.render_widget(Paragraph::new(checks_lines).block(checks_block), summary_chunks[3]);

    // --- Issue Details Section ---
    let issues_block = Block::default().title("ISSUES FOUND".bold());
    let details_text = Text::from(vec![
        Line::from(vec![
            Span::raw("Critical: "),
            Span::styled(app.summary.critical_issues.to_string(), Style::default().fg(Color::Red)),
        ]),
        Line::from(vec![
            Span::raw("Warnings: "),
            Span::styled(app.summary.warning_issues.to_string(), Style::default().fg(Color::Yellow)),
        ]),
    ]);
    frame.render_widget(Paragraph::new(details_text).block(issues_block), summary_chunks[5]);

    // --- Subdomains Section ---
    let subs_block = Block::default().title("SUBDOMAINS".bold());
    let mut sub_lines = Vec::new();
    if let Some(report) = &app.scan_report {
        match &report.subdomains {
            Ok(subs) if subs.subdomains.is_empty() => sub_lines.push(Line::from("None discovered.")),
            Ok(subs) => {
                for sub in &subs.subdomains {
                    let verdict = subs.waf.get(sub.as_str());
                    let style = match verdict {
                        Some(v) if v.is_protected() => Style::default().fg(Color::Green),
                        Some(_) => Style::default().fg(Color::Yellow),
                        None => Style::default().fg(Color::DarkGray),
                    };
                    let label = verdict.map_or_else(|| "no verdict".to_string(), ToString::to_string);
                    sub_lines.push(Line::from(vec![
                        Span::raw("- "),
                        Span::styled(sub.to_string(), Style::default().fg(Color::Cyan)),
                        Span::styled(format!(" ({label})"), style),
                    ]));
                }
            }
            Err(e) => sub_lines.push(Line::from(Span::styled(
                format!("Enumeration failed: {}", e),
                Style::default().fg(Color::Red),
            ))),
        }
    }
    frame.render_widget(Paragraph::new(sub_lines).block(subs_block), summary_chunks[7]);
}
