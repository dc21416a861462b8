use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::expr::Func;
use crate::tui_mode::app::App;

/// Queries shown at the end of the help screen.
pub(crate) const EXAMPLES: [&str; 4] = [
    "x**3 - 6*x**2 + 11*x - 6; 0; 1.5; 0",
    "details exp(x) - 2; 0; 1",
    "sin(x); -pi/2; pi/2; 0.5",
    "x^2 + 1; 0; 2",
];

fn section(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
    ))
}

pub fn render_help(frame: &mut Frame, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" IVT Calculator Help ")
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black));

    let function_names: Vec<&str> = Func::ALL.iter().map(|f| f.name()).collect();

    let mut help_text = vec![
        Line::from(Span::styled(
            "IVT Calculator - Intermediate Value Theorem by bisection",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        section("Query:"),
        Line::from("  f(x); a; b; N   find c in [a, b] with f(c) = N"),
        Line::from(format!(
            "  N may be left out, the configured default is {}",
            app.config.solver.default_target
        )),
        Line::from("  a, b and N may be constant formulas such as pi/2"),
        Line::from(""),
        section("Outcomes:"),
        Line::from("  There exists a c = ...        c was located within the tolerance"),
        Line::from("  Could not find an exact value  the interval shrank without reaching N"),
        Line::from("  IVT does not hold             N is not between f(a) and f(b)"),
        Line::from(""),
        section("Operators:"),
        Line::from("  + - * /   arithmetic"),
        Line::from("  ^ or **   power (right associative, 2^3^2 = 512)"),
        Line::from("  %         remainder"),
        Line::from(""),
        section("Functions (radians):"),
    ];
    for chunk in function_names.chunks(7) {
        help_text.push(Line::from(format!("  {}", chunk.join(", "))));
    }
    help_text.extend([
        Line::from("  log(v) is the natural logarithm, log(v, base) uses the given base"),
        Line::from(""),
        section("Constants:"),
        Line::from("  pi : π (3.14159...)"),
        Line::from("  e  : Euler's number (2.71828...)"),
        Line::from(""),
        section("Advanced Features:"),
        Line::from("  details <query> : Show every bisection step with time"),
        Line::from("  clear : Clear query history"),
        Line::from("  Ctrl+U : Clear current input"),
        Line::from("  help : Show this help screen"),
        Line::from("  quit : Exit the calculator"),
        Line::from(""),
        section("Navigation:"),
        Line::from("  ← → : Move cursor left/right"),
        Line::from("  Ctrl+←/→ : Move cursor by words"),
        Line::from("  Home/End : Move to start/end of line"),
        Line::from("  ↑ ↓ : Navigate query history, the graph follows the selection"),
        Line::from("  PgUp/PgDn : Page through history"),
        Line::from("  Mouse wheel : Scroll through history"),
        Line::from("  Esc : Close this help"),
        Line::from(""),
        section("Examples:"),
    ]);
    help_text.extend(EXAMPLES.iter().map(|example| Line::from(format!("  {}", example))));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll as u16, 0));

    frame.render_widget(Clear, frame.size());
    frame.render_widget(paragraph, frame.size());
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::Config;
    use crate::ivt::{Outcome, Trace};
    use crate::query::Query;

    #[test]
    fn examples_show_each_outcome_they_promise() {
        let config = Config::default();
        let outcomes: Vec<Outcome> = EXAMPLES
            .iter()
            .map(|example| {
                let query = Query::parse(example, config.solver.default_target).unwrap();
                query
                    .run(&config.evaluator(), &mut Trace::new(query.detailed))
                    .unwrap()
                    .outcome
            })
            .collect();

        assert!(outcomes[..3].iter().all(Outcome::is_found), "{outcomes:?}");
        assert!(matches!(outcomes[3], Outcome::Inapplicable { .. }));
    }
}
