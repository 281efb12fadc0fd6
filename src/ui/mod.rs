// src/ui/mod.rs

use crate::app::{App, ReportView};
use ratatui::prelude::*;

mod layout;
mod widgets;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let layout = layout::create_layout(area, app.show_logs);

    widgets::input::render_input(frame, app, layout.input);

    match app.view {
        ReportView::Findings => widgets::analysis_view::render_analysis_view(frame, app, layout.report),
        ReportView::Data => widgets::results::render_results(frame, app, layout.report),
    }

    widgets::summary::render_summary(frame, app, layout.summary);
    if let Some(log_area) = layout.log_panel {
        widgets::log_view::render_log_view(frame, app, log_area);
    }
    widgets::footer::render_footer(frame, app, layout.footer);

    if app.show_disclaimer {
        widgets::disclaimer_popup::render_disclaimer_popup(frame, area);
    }
}
