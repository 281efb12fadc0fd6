// src/ui/layout.rs

use ratatui::layout::{Constraint, Layout, Rect};

const SUMMARY_WIDTH: u16 = 42;
const LOG_PANEL_HEIGHT: u16 = 12;

pub struct AppLayout {
    pub input: Rect,
    pub report: Rect,
    pub summary: Rect,
    pub footer: Rect,
    /// Full-width strip above the footer, present while logs are shown.
    pub log_panel: Option<Rect>,
}

/// Input bar on top, report and summary side by side, footer at the bottom.
/// The summary keeps a fixed width so subdomain lines stay readable.
pub fn create_layout(area: Rect, show_logs: bool) -> AppLayout {
    let log_height = if show_logs { LOG_PANEL_HEIGHT } else { 0 };
    let [input, content, logs, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(8),
        Constraint::Length(log_height),
        Constraint::Length(1),
    ])
    .areas(area);

    let [report, summary] =
        Layout::horizontal([Constraint::Min(40), Constraint::Length(SUMMARY_WIDTH)]).areas(content);

    AppLayout {
        input,
        report,
        summary,
        footer,
        log_panel: show_logs.then_some(logs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_panel_only_when_shown() {
        let area = Rect::new(0, 0, 120, 40);

        let hidden = create_layout(area, false);
        assert!(hidden.log_panel.is_none());
        assert_eq!(hidden.summary.width, SUMMARY_WIDTH);
        assert_eq!(hidden.footer.y, 39);

        let shown = create_layout(area, true);
        let logs = shown.log_panel.unwrap();
        assert_eq!(logs.height, LOG_PANEL_HEIGHT);
        assert_eq!(logs.width, 120);
        assert!(shown.report.height < hidden.report.height);
    }
}
