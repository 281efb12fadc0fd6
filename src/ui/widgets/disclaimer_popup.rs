// src/ui/widgets/disclaimer_popup.rs

use ratatui::{
    layout::Flex,
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// Renders the modal disclaimer shown at startup, centered over the UI.
pub fn render_disclaimer_popup(frame: &mut Frame, area: Rect) {
    let disclaimer_text = Text::from(vec![
        Line::from("IMPORTANT LEGAL DISCLAIMER".bold().yellow()),
        Line::from(""),
        Line::from("Vanguard Recon drives active reconnaissance tools (zone transfers, subdomain brute forcing, full port and vulnerability scans) against the domain you enter. It is intended for professionals assessing assets they are explicitly authorized to test."),
        Line::from(""),
        Line::from("Probing infrastructure without written permission is ILLEGAL in many jurisdictions. Zone transfer requests, brute-force enumeration and nmap vulnerability scripts are noisy and will be seen by the target."),
        Line::from(""),
        Line::from("By continuing, you confirm that:"),
        Line::from("1. You own the target domain or hold written authorization to assess it and all of its subdomains."),
        Line::from("2. You accept that scan reports are written to disk and reused on later runs."),
        Line::from("3. The authors assume NO liability for misuse or for any damage caused by this program."),
        Line::from(""),
        Line::from("Press ".bold() + "Enter".bold().yellow() + " to Acknowledge and Continue, ".bold() + "Esc".bold().yellow() + " to quit".bold()),
    ]);

    let block = Block::default()
        .title("Disclaimer")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let popup_area = centered_rect(70, 80, area);

    let popup = Paragraph::new(disclaimer_text)
        .block(block)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    frame.render_widget(Clear, popup_area);
    frame.render_widget(popup, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(row);
    popup
}
