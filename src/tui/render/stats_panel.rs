use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::model::AssigneeAggregate;
use crate::tui::app::App;
use crate::util::format::{format_hours, format_percent};
use crate::util::unicode::{display_width, fit_to_width};

/// Render the aggregation summary: totals, then assignees board-wide and
/// for the column under the cursor
pub fn render_stats_panel(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width.saturating_sub(2) as usize;
    let result = &app.result;
    let label = Style::default().fg(app.theme.dim).bg(bg);
    let value = Style::default().fg(app.theme.text_bright).bg(bg);

    let mut lines = vec![
        stat_line("total", format_hours(result.total_estimate_seconds), label, value),
        stat_line(
            "cards",
            format!("{} ({} open)", result.cards_processed, result.open_card_count()),
            label,
            value,
        ),
        stat_line(
            "estimated",
            format!(
                "{} ({})",
                result.cards_with_time,
                format_percent(result.percent_with_time())
            ),
            label,
            value,
        ),
    ];
    if let Some(milestone) = &result.current_milestone {
        lines.push(stat_line("milestone", milestone.clone(), label, value));
    }

    lines.push(Line::from(""));
    lines.push(section_title(app, "Assignees"));
    push_assignees(&mut lines, app, result.assignee_time_map.values(), width);

    let cursor_title = app
        .board
        .columns
        .get(app.cursor.column)
        .and_then(|c| c.resolved_title());
    if let Some(title) = cursor_title
        && let Some(people) = result.column_assignees(title)
    {
        lines.push(Line::from(""));
        lines.push(section_title(app, &format!("In {}", title)));
        push_assignees(&mut lines, app, people.values(), width);
    }

    let block = Block::default()
        .title(" Stats ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.dim).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn stat_line<'a>(name: &'a str, text: String, label: Style, value: Style) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:<10}", name), label),
        Span::styled(text, value),
    ])
}

fn section_title<'a>(app: &App, text: &str) -> Line<'a> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(app.theme.text)
            .bg(app.theme.background)
            .add_modifier(Modifier::BOLD),
    ))
}

/// One row per assignee: name left, hours right-aligned
fn push_assignees<'a, 'b>(
    lines: &mut Vec<Line<'a>>,
    app: &App,
    people: impl Iterator<Item = &'b AssigneeAggregate>,
    width: usize,
) {
    let bg = app.theme.background;
    let mut any = false;
    for person in people {
        any = true;
        let hours = format_hours(person.time_estimate_seconds);
        let name_width = width.saturating_sub(display_width(&hours) + 1);
        lines.push(Line::from(vec![
            Span::styled(
                fit_to_width(&person.name, name_width),
                Style::default().fg(app.theme.purple).bg(bg),
            ),
            Span::styled(" ", Style::default().bg(bg)),
            Span::styled(hours, Style::default().fg(app.theme.text_bright).bg(bg)),
        ]));
    }
    if !any {
        lines.push(Line::from(Span::styled(
            "no estimated cards",
            Style::default().fg(app.theme.dim).bg(bg),
        )));
    }
}
