// src/ui/widgets/analysis_view.rs

use crate::app::{App, AppState, SPINNER_CHARS};
use crate::core::knowledge_base::{self, FindingCategory};
use crate::core::models::Severity;
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

pub fn render_analysis_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let main_block = Block::default()
        .borders(Borders::ALL)
        .title("Analysis Report (Navigate with ↑ ↓)");

    if !matches!(app.state, AppState::Finished) {
        let content = match app.state {
            AppState::Idle => Paragraph::new("Scan results will appear here...").alignment(Alignment::Center),
            AppState::Scanning => {
                let spinner_char = SPINNER_CHARS[app.spinner_frame];
                Paragraph::new(Line::from(vec![
                    Span::styled(format!("{} ", spinner_char), Style::default().fg(Color::Cyan)),
                    Span::raw("Running recon tools... This can take a while."),
                ]))
                .alignment(Alignment::Center)
            }
            AppState::Finished => Paragraph::new(""),
        };
        frame.render_widget(content.block(main_block), area);
        return;
    }

    let inner_area = main_block.inner(area);
    frame.render_widget(main_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Min(0)])
        .split(inner_area);

    let items: Vec<ListItem> = app
        .all_findings
        .iter()
        .map(|f| {
            let (category, title, severity) = match knowledge_base::get_finding_detail(&f.code) {
                Some(detail) => (Some(detail.category), detail.title, detail.severity),
                None => (None, "Unknown Finding", f.severity),
            };

            let category_prefix = match category {
                Some(FindingCategory::Dns) => "[DNS] ",
                Some(FindingCategory::Waf) => "[WAF] ",
                Some(FindingCategory::Surface) => "[SURFACE] ",
                None => "",
            };

            let title_style = match severity {
                Severity::Critical => Style::default().fg(Color::Red),
                Severity::Warning => Style::default().fg(Color::Yellow),
                Severity::Info => Style::default().fg(Color::Cyan),
            };

            let mut spans = vec![
                Span::styled(category_prefix, Style::default().fg(Color::DarkGray)),
                Span::styled(title, title_style),
            ];
            if let Some(subject) = &f.subject {
                spans.push(Span::styled(format!("  {subject}"), Style::default().fg(Color::Gray)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let findings_list = List::new(items)
        .block(Block::default())
        .highlight_style(Style::new().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    frame.render_stateful_widget(findings_list, chunks[0], &mut app.analysis_list_state);

    let detail_block = Block::default().borders(Borders::TOP).title("Details");
    let selected = app
        .analysis_list_state
        .selected()
        .and_then(|i| app.all_findings.get(i))
        .and_then(|f| knowledge_base::get_finding_detail(&f.code));

    match selected {
        Some(detail) => {
            let text = vec![
                Line::from(""),
                Line::from(format!("{}", detail.category).dark_gray()),
                Line::from(""),
                Line::from("WHAT IT IS:".yellow().bold()),
                Line::from(detail.description),
                Line::from(""),
                Line::from("HOW TO FIX:".yellow().bold()),
                Line::from(detail.remediation),
            ];
            let p = Paragraph::new(text).wrap(Wrap { trim: true }).block(detail_block);
            frame.render_widget(p, chunks[1]);
        }
        None => render_placeholder_details(frame, app, detail_block, chunks[1]),
    }
}

fn render_placeholder_details(frame: &mut Frame, app: &App, block: Block, area: Rect) {
    let total_issues = app.summary.critical_issues + app.summary.warning_issues;

    let placeholder_text = if total_issues == 0 {
        Text::from(vec![
            Line::from(""),
            Line::from("✓ NO EXPOSURE FOUND".bold().fg(Color::Green)),
            Line::from(""),
            Line::from("No critical or warning issues were found during reconnaissance."),
            Line::from(""),
            Line::from("Press Tab to browse the collected data."),
        ])
    } else {
        Text::from("Select an item above to see details.")
    };

    let p = Paragraph::new(placeholder_text).alignment(Alignment::Center).block(block);
    frame.render_widget(p, area);
}
