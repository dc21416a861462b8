//! Text shared by every command surface.

use crate::ivt::{Report, Step, Termination};

pub fn format_number(x: f64) -> String {
    if x.abs() > 1e10 || (x.abs() < 1e-5 && x != 0.0) {
        format!("{:.6e}", x)
    } else {
        let s = format!("{:.6}", x);
        let s = s.trim_end_matches('0').trim_end_matches('.');
        if s == "-0" {
            "0".to_string()
        } else {
            s.to_string()
        }
    }
}

pub fn describe_termination(termination: Termination) -> &'static str {
    match termination {
        Termination::HypothesisFailed => "hypothesis not met",
        Termination::ValueReached => "f(c) within tolerance of N",
        Termination::WidthReached => "interval narrower than tolerance",
        Termination::MachinePrecision => "floating-point resolution exhausted",
    }
}

pub fn step_line(index: usize, step: &Step) -> String {
    format!(
        "Step {}: [{}, {}] c = {}, f(c) = {}",
        index + 1,
        format_number(step.a),
        format_number(step.b),
        format_number(step.c),
        format_number(step.f_c)
    )
}

/// The outcome message, followed by the step trace when one was recorded.
pub fn report_lines(report: &Report, steps: &[Step], detailed: bool) -> Vec<String> {
    let mut lines = vec![report.outcome.to_string()];
    if detailed {
        if !steps.is_empty() {
            lines.push("Step-by-step bisection:".to_string());
            lines.extend(steps.iter().enumerate().map(|(i, step)| format!("  {}", step_line(i, step))));
        }
        lines.push(format!(
            "Iterations: {} ({})",
            report.iterations,
            describe_termination(report.termination)
        ));
    }
    lines
}
