//! Ratatui drawing for the progress screen.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Clear, Paragraph};
use ratatui::Frame;

use crate::app::App;

/// Rows used by the inline viewport.
pub const VIEWPORT_HEIGHT: u16 = 8;

const HELP_TEXT: &str = "Press any key to quit";
const HELP_COLOR: Color = Color::Rgb(0x62, 0x62, 0x62);
const FINISHED_COLOR: Color = Color::Rgb(0x73, 0xF5, 0x9C);

pub fn draw(frame: &mut Frame<'_>, app: &App) {
    frame.render_widget(Clear, frame.area());
    frame.render_widget(Paragraph::new(render(app)), frame.area());
}

/// Build the full frame: bar, banner, optional status, help line.
fn render(app: &App) -> Text<'static> {
    let pad = " ".repeat(app.padding() as usize);
    let mut lines = Vec::with_capacity(VIEWPORT_HEIGHT as usize);

    lines.push(Line::from(""));
    lines.push(padded(&pad, app.progress().line()));
    lines.push(Line::from(""));
    lines.push(padded(&pad, banner(app)));
    if let Some(status) = app.status() {
        lines.push(padded(
            &pad,
            Line::from(Span::styled(
                status.to_string(),
                Style::default().add_modifier(Modifier::DIM),
            )),
        ));
    }
    lines.push(Line::from(""));
    lines.push(padded(
        &pad,
        Line::from(Span::styled(HELP_TEXT, Style::default().fg(HELP_COLOR))),
    ));

    Text::from(lines)
}

fn banner(app: &App) -> Line<'static> {
    let elapsed = app.stopwatch().view();
    if let Some(err) = app.error() {
        return Line::from(vec![
            Span::styled(
                "Error: ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::raw(err.to_string()),
        ]);
    }
    if app.completed() {
        return Line::from(Span::styled(
            format!("Finished in {elapsed}"),
            Style::default()
                .fg(FINISHED_COLOR)
                .add_modifier(Modifier::BOLD),
        ));
    }
    Line::from(format!("Elapsed: {elapsed}"))
}

fn padded(pad: &str, line: Line<'static>) -> Line<'static> {
    let mut spans = Vec::with_capacity(line.spans.len() + 1);
    spans.push(Span::raw(pad.to_string()));
    spans.extend(line.spans);
    Line::from(spans)
}
