use super::app::{App, HistoryEntry};
use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, ListState, Paragraph,
        Wrap,
    },
    Frame, Terminal,
};
use std::time::Duration;
use unicode_width::UnicodeWidthStr;
use super::helpers::{format_with_spaces, highlight_functions, wrap_text};
use crate::ivt::Outcome;
use crate::output::{describe_termination, format_number, step_line};
use crate::plot::Samples;
use crate::render_help::render_help;

const MIN_TERMINAL_WIDTH: u16 = 50;
const MIN_TERMINAL_HEIGHT: u16 = 10;
// Ширина, начиная с которой график выводится рядом с историей
const PLOT_SPLIT_WIDTH: u16 = 100;

pub fn run_ui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| {
            if app.show_help {
                render_help(f, app);
            } else {
                ui(f, app);
            }
        })?;

        if app.should_quit {
            break;
        }

        if crossterm::event::poll(Duration::from_millis(50))? {
            match crossterm::event::read()? {
                Event::Key(KeyEvent { code, modifiers, kind, .. }) if kind == KeyEventKind::Press => {
                    handle_key_event(app, code, modifiers);
                }
                Event::Mouse(event) => {
                    handle_mouse_event(app, event);
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn handle_key_event(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    if app.show_help {
        match code {
            KeyCode::Down => app.help_scroll = app.help_scroll.saturating_add(1),
            KeyCode::Up => app.help_scroll = app.help_scroll.saturating_sub(1),
            KeyCode::PageDown => app.help_scroll = app.help_scroll.saturating_add(10),
            KeyCode::PageUp => app.help_scroll = app.help_scroll.saturating_sub(10),
            KeyCode::Esc => {
                app.show_help = false;
                app.help_scroll = 0;
            }
            _ => {}
        }
    } else {
        match code {
            KeyCode::Char('c') | KeyCode::Char('C') if modifiers.contains(KeyModifiers::CONTROL) => {
                app.should_quit = true;
            }
            KeyCode::Char(c) if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                app.insert_char(c);
            }
            KeyCode::Backspace => app.backspace(),
            KeyCode::Delete => app.delete_char(),
            KeyCode::Left if modifiers.contains(KeyModifiers::CONTROL) => {
                app.move_cursor_by_words(-1);
            }
            KeyCode::Right if modifiers.contains(KeyModifiers::CONTROL) => {
                app.move_cursor_by_words(1);
            }
            KeyCode::Left => app.move_cursor(-1),
            KeyCode::Right => app.move_cursor(1),
            KeyCode::Home => {
                app.cursor_position = 0;
                app.input_scroll = 0;
            }
            KeyCode::End => {
                app.cursor_position = app.input.chars().count();
            }
            KeyCode::Up => app.navigate_history(-1),
            KeyCode::Down => app.navigate_history(1),
            KeyCode::PageUp => app.scroll_history(-1),
            KeyCode::PageDown => app.scroll_history(1),
            KeyCode::Enter => app.submit(),
            KeyCode::F(1) => {
                app.show_help = true;
                app.help_scroll = 0;
            }
            KeyCode::Esc => app.show_help = false,
            KeyCode::Char('u') | KeyCode::Char('U') if modifiers.contains(KeyModifiers::CONTROL) => {
                app.clear_input();
            }
            _ => {}
        }
    }
}

fn handle_mouse_event(app: &mut App, event: crossterm::event::MouseEvent) {
    if app.show_help {
        match event.kind {
            MouseEventKind::ScrollDown => app.help_scroll = app.help_scroll.saturating_add(3),
            MouseEventKind::ScrollUp => app.help_scroll = app.help_scroll.saturating_sub(3),
            _ => {}
        }
    } else {
        match event.kind {
            MouseEventKind::ScrollDown => {
                app.history_scroll = app.history_scroll.saturating_add(3);
            }
            MouseEventKind::ScrollUp => {
                app.history_scroll = app.history_scroll.saturating_sub(3);
            }
            _ => {}
        }
    }
}

fn ui(frame: &mut Frame, app: &mut App) {
    let terminal_size = frame.size();

    app.terminal_too_small = terminal_size.width < MIN_TERMINAL_WIDTH ||
                             terminal_size.height < MIN_TERMINAL_HEIGHT;

    if app.terminal_too_small {
        render_resize_message(frame, terminal_size);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(3),
        ])
        .split(terminal_size);

    render_input(frame, app, layout[0]);
    render_status(frame, layout[1]);

    let has_plot = app
        .selected_entry()
        .map_or(false, |entry| entry.samples.is_some());
    if has_plot && terminal_size.width >= PLOT_SPLIT_WIDTH {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(layout[2]);
        render_history(frame, app, body[0]);
        render_plot(frame, app, body[1]);
    } else {
        render_history(frame, app, layout[2]);
    }
    app.list_height = layout[2].height as usize;
}

fn render_resize_message(frame: &mut Frame, area: Rect) {
    let message = format!(
        "Terminal too small! Min size: {}x{}. Current: {}x{}",
        MIN_TERMINAL_WIDTH,
        MIN_TERMINAL_HEIGHT,
        area.width,
        area.height
    );

    let text = vec![
        Line::from(Span::styled(
            message,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Please resize your terminal window",
            Style::default().fg(Color::Yellow)
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Resize Required ")
        .title_alignment(Alignment::Center);

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn render_history(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" History ")
        .title_alignment(Alignment::Center);

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    if app.history.is_empty() {
        let empty_msg = Paragraph::new("No queries yet. Try: x**3 - 6*x**2 + 11*x - 6; 0; 1.5; 0")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(empty_msg, inner_area);
        return;
    }

    let mut items = Vec::new();
    app.item_start_indices.clear();

    let wrap_width = inner_area.width.saturating_sub(4) as usize;

    for (i, entry) in app.history.iter().enumerate() {
        app.item_start_indices.push(items.len());

        let is_selected = i == app.cursor_history;
        let base_style = Style::default()
            .fg(if is_selected { Color::Yellow } else { Color::Cyan });

        let input = format_with_spaces(&entry.input);
        let input_lines = wrap_text(&input, wrap_width);

        for (line_idx, line) in input_lines.into_iter().enumerate() {
            let mut result_spans = vec![];

            if line_idx == 0 {
                result_spans.push(Span::styled("> ", Style::default().fg(Color::Green)));
            } else {
                result_spans.push(Span::styled("  ", Style::default()));
            }

            let expr_spans = highlight_functions(&line, base_style);
            result_spans.extend(expr_spans);

            items.push(ListItem::new(Line::from(result_spans)));
        }

        let (message, message_style) = match &entry.result {
            Ok(report) => (report.outcome.to_string(), outcome_style(&report.outcome)),
            Err(e) => (
                format!("Error: {}", e),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
        };
        for line in wrap_text(&message, wrap_width) {
            items.push(ListItem::new(Line::from(Span::styled(
                format!("  {}", line),
                message_style,
            ))));
        }

        if entry.detailed_mode {
            if let Ok(report) = &entry.result {
                for (j, step) in entry.detailed_steps.iter().enumerate() {
                    push_detail(&mut items, &step_line(j, step), wrap_width, Color::DarkGray);
                }
                let summary = format!(
                    "Iterations: {} ({})",
                    report.iterations,
                    describe_termination(report.termination)
                );
                push_detail(&mut items, &summary, wrap_width, Color::DarkGray);
            }

            let time_str = format!("Time: {:.6} ms", entry.duration.as_secs_f64() * 1000.0);
            push_detail(&mut items, &time_str, wrap_width, Color::Magenta);
        }

        if i < app.history.len() - 1 {
            let separator = Span::styled(
                "-".repeat(inner_area.width as usize),
                Style::default().fg(Color::DarkGray)
            );
            items.push(ListItem::new(Line::from(separator)));
        }
    }

    if app.scroll_to_bottom {
        app.history_scroll = items.len().saturating_sub(inner_area.height as usize);
        app.scroll_to_bottom = false;
    }

    let selected_index = if app.cursor_history < app.item_start_indices.len() {
        Some(app.item_start_indices[app.cursor_history])
    } else {
        None
    };

    let list = List::new(items)
        .block(Block::default())
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let mut state = ListState::default()
        .with_selected(selected_index)
        .with_offset(app.history_scroll);

    frame.render_stateful_widget(list, inner_area, &mut state);
}

fn outcome_style(outcome: &Outcome) -> Style {
    let color = match outcome {
        Outcome::Found { .. } => Color::LightGreen,
        Outcome::NotFound => Color::Yellow,
        Outcome::Inapplicable { .. } => Color::Red,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn push_detail(items: &mut Vec<ListItem<'static>>, text: &str, wrap_width: usize, color: Color) {
    for (idx, line) in wrap_text(text, wrap_width).into_iter().enumerate() {
        let prefix = if idx == 0 { "    - " } else { "      " };
        items.push(ListItem::new(Line::from(Span::styled(
            format!("{}{}", prefix, line),
            Style::default().fg(color),
        ))));
    }
}

fn render_plot(frame: &mut Frame, app: &App, area: Rect) {
    let Some((entry, samples)) = app
        .selected_entry()
        .and_then(|entry| entry.samples.as_ref().map(|samples| (entry, samples)))
    else {
        return;
    };

    let [x_lo, x_hi] = samples.x_bounds();
    let [y_lo, y_hi] = samples.y_bounds();
    let axis = [(x_lo, 0.0), (x_hi, 0.0)];
    let a_marker = [(samples.a, y_lo), (samples.a, y_hi)];
    let b_marker = [(samples.b, y_lo), (samples.b, y_hi)];

    let line = |name: String, color: Color, data| {
        Dataset::default()
            .name(name)
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color))
            .data(data)
    };
    let datasets = vec![
        line("y = 0".to_string(), Color::DarkGray, &axis[..]),
        line(format!("a = {}", format_number(samples.a)), Color::Green, &a_marker[..]),
        line(format!("b = {}", format_number(samples.b)), Color::Red, &b_marker[..]),
        line("f(x)".to_string(), Color::Cyan, &samples.points[..]),
    ];

    let label_style = Style::default().fg(Color::DarkGray);
    let bound_labels = |lo: f64, hi: f64| {
        vec![
            Span::styled(format_number(lo), label_style),
            Span::styled(format_number((lo + hi) / 2.0), label_style),
            Span::styled(format_number(hi), label_style),
        ]
    };

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(plot_title(entry, samples))
                .title_alignment(Alignment::Center),
        )
        .x_axis(
            Axis::default()
                .title("x")
                .style(label_style)
                .bounds([x_lo, x_hi])
                .labels(bound_labels(x_lo, x_hi)),
        )
        .y_axis(
            Axis::default()
                .title("f(x)")
                .style(label_style)
                .bounds([y_lo, y_hi])
                .labels(bound_labels(y_lo, y_hi)),
        );

    frame.render_widget(chart, area);
}

fn plot_title(entry: &HistoryEntry, samples: &Samples) -> String {
    let c = entry
        .result
        .as_ref()
        .ok()
        .and_then(|report| report.outcome.c())
        .map(|c| format!(", c = {:.6}", c))
        .unwrap_or_default();
    let skipped = if samples.skipped > 0 {
        format!(", {} points undefined", samples.skipped)
    } else {
        String::new()
    };
    format!(" Graph [{}, {}]{}{} ", format_number(samples.a), format_number(samples.b), c, skipped)
}

fn render_status(frame: &mut Frame, area: Rect) {
    let keys = [
        ("Enter", "Evaluate"),
        ("Up/Down or PgUp/PgDn", "Navigate"),
        ("F1", "Help"),
        ("Ctrl+U", "Clear Input"),
        ("Ctrl+C", "Quit"),
    ];

    let spans: Vec<Span> = keys
        .iter()
        .flat_map(|(key, desc)| {
            vec![
                Span::styled(
                    *key,
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" {} ", desc),
                    Style::default().fg(Color::DarkGray),
                ),
            ]
        })
        .collect();

    let line = Line::from(spans);
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));

    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" f(x); a; b; N ")
        .title_alignment(Alignment::Center);

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let visible_width = (inner_area.width.saturating_sub(2)) as usize;
    let total_chars = app.input.chars().count();
    app.adjust_input_scroll(visible_width);

    let visible_input: String = app.input
        .chars()
        .skip(app.input_scroll)
        .take(visible_width)
        .collect();

    let input_line = format!("> {}", visible_input);
    let paragraph = Paragraph::new(input_line);
    frame.render_widget(paragraph, inner_area);

    let visible_cursor = app.cursor_position.saturating_sub(app.input_scroll);
    let visible_prefix = visible_input.chars().take(visible_cursor).collect::<String>();
    let cursor_x = inner_area.x + 2 + visible_prefix.width() as u16;
    let cursor_y = inner_area.y;
    frame.set_cursor(cursor_x, cursor_y);

    let scroll_indicator_style = Style::default().fg(Color::DarkGray);

    if app.input_scroll > 0 {
        let left_indicator = Paragraph::new("<").style(scroll_indicator_style);
        frame.render_widget(left_indicator, Rect::new(inner_area.x, inner_area.y, 1, 1));
    }

    if total_chars > app.input_scroll + visible_width {
        let right_indicator = Paragraph::new(">").style(scroll_indicator_style);
        frame.render_widget(
            right_indicator,
            Rect::new(inner_area.x + inner_area.width - 1, inner_area.y, 1, 1),
        );
    }
}
