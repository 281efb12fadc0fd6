// src/ui/widgets/input.rs
use crate::app::{App, AppState};
use ratatui::{
    layout::Position,
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

/// Renders the input box. A validation error replaces the title.
pub fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let input_block = match &app.input_error {
        Some(err) => Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(format!("Target Domain: {err}")),
        None => Block::default().borders(Borders::ALL).title("Target Domain"),
    };
    let input_paragraph = Paragraph::new(app.input.as_str())
        .block(input_block)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(input_paragraph, area);

    // Show the cursor only when in the Idle state.
    if matches!(app.state, AppState::Idle) && !app.show_disclaimer {
        frame.set_cursor_position(Position::new(area.x + app.input.len() as u16 + 1, area.y + 1));
    }
}
