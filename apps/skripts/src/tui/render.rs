use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use client_core::ReviewStatus;

use super::app::{Notice, ReviewApp, ReviewRow};

const POPUP_WIDTH: u16 = 52;

pub fn render<T: ReviewRow>(frame: &mut Frame, app: &ReviewApp<T>) {
    let [header, banner, body, status] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, app, header);
    render_undo_banner(frame, app, banner);
    render_body(frame, app, body);
    render_status(frame, app, status);
    render_confirmation(frame, app, frame.area());
}

fn render_header<T: ReviewRow>(frame: &mut Frame, app: &ReviewApp<T>, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let key = Style::default().fg(Color::Cyan);
    let lines = vec![
        Line::from(Span::styled(
            format!(" {}", app.surface.title),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(" j/k", key),
            Span::styled(" move  ", dim),
            Span::styled("Enter", key),
            Span::styled(format!(" {}  ", app.surface.verb.to_lowercase()), dim),
            Span::styled("u", key),
            Span::styled(" undo  ", dim),
            Span::styled("q", key),
            Span::styled(" quit", dim),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_undo_banner<T: ReviewRow>(frame: &mut Frame, app: &ReviewApp<T>, area: Rect) {
    let (Some(token), Some(remaining)) = (app.controller.undo(), app.controller.undo_remaining())
    else {
        return;
    };
    let seconds = remaining.as_millis().div_ceil(1000);
    let line = Line::from(vec![
        Span::raw(format!(" {} \"{}\". ", app.surface.done, token.item.label())),
        Span::styled("u", Style::default().fg(Color::Cyan)),
        Span::raw(format!(" to undo ({seconds}s)")),
    ]);
    frame.render_widget(
        Paragraph::new(line).style(Style::default().fg(Color::Yellow)),
        area,
    );
}

fn render_body<T: ReviewRow>(frame: &mut Frame, app: &ReviewApp<T>, area: Rect) {
    if let Some(error) = &app.load_error {
        let paragraph = Paragraph::new(format!(" {error}"))
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
        return;
    }

    match app.controller.status() {
        ReviewStatus::Loading => {
            frame.render_widget(Paragraph::new(" Loading..."), area);
        }
        ReviewStatus::Complete => {
            frame.render_widget(
                Paragraph::new(format!(" {}", app.surface.complete))
                    .style(Style::default().fg(Color::Green)),
                area,
            );
        }
        ReviewStatus::Active => render_list(frame, app, area),
    }
}

fn render_list<T: ReviewRow>(frame: &mut Frame, app: &ReviewApp<T>, area: Rect) {
    let focus = app.controller.focus_index();
    let selected = Style::default().add_modifier(Modifier::REVERSED);
    let dim = Style::default().fg(Color::DarkGray);

    let mut lines: Vec<Line> = Vec::new();
    let mut focus_line = 0usize;
    for (index, item) in app.controller.items().iter().enumerate() {
        if index == focus {
            focus_line = lines.len();
            lines.push(Line::from(Span::styled(format!("> {}", item.label()), selected)));
        } else {
            lines.push(Line::from(format!("  {}", item.label())));
        }
        if let Some(detail) = item.detail() {
            lines.push(Line::from(Span::styled(format!("    {detail}"), dim)));
        }
    }

    // Keep the focused row (and its detail line) on screen.
    let visible = usize::from(area.height);
    let offset = (focus_line + 2).saturating_sub(visible);
    let offset = u16::try_from(offset).unwrap_or(u16::MAX);
    frame.render_widget(Paragraph::new(lines).scroll((offset, 0)), area);
}

fn render_status<T: ReviewRow>(frame: &mut Frame, app: &ReviewApp<T>, area: Rect) {
    let line = match &app.notice {
        Some(Notice::Error(text)) => {
            Line::from(Span::styled(format!(" {text}"), Style::default().fg(Color::Red)))
        }
        Some(Notice::Info(text)) => Line::from(format!(" {text}")),
        None if app.controller.is_busy() => Line::from(Span::styled(
            " Working...",
            Style::default().fg(Color::DarkGray),
        )),
        None => {
            let count = app.controller.items().len();
            Line::from(Span::styled(
                format!(" {count} left"),
                Style::default().fg(Color::DarkGray),
            ))
        }
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_confirmation<T: ReviewRow>(frame: &mut Frame, app: &ReviewApp<T>, area: Rect) {
    let Some(item) = app.controller.pending_confirmation() else {
        return;
    };
    let key = Style::default().fg(Color::Cyan);

    let mut lines = vec![
        Line::from(Span::styled(
            format!(" {}?", app.surface.verb),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("  {}", item.label())),
        Line::from(""),
    ];
    if app.controller.is_busy() {
        lines.push(Line::from("  Working..."));
    } else {
        lines.push(Line::from(vec![
            Span::styled("  y/Enter", key),
            Span::raw(" confirm  "),
            Span::styled("n/Esc", key),
            Span::raw(" cancel"),
        ]));
    }

    let width = POPUP_WIDTH.min(area.width.saturating_sub(2));
    let height = (lines.len() as u16 + 2).min(area.height);
    let popup = centered_rect_fixed(width, height, area);
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL)),
        popup,
    );
}

fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
#[path = "../tests/render_tests.rs"]
mod tests;
