//! One-line queries: `[details] <f(x)> ; <a> ; <b> [; <N>]`.

use thiserror::Error;

use crate::config::Config;
use crate::expr::{EvalError, Function, ParseError};
use crate::ivt::{self, Evaluator, Report, Trace};
use crate::output::{format_number, report_lines};
use crate::plot::{render_text, Samples};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("expected '<f(x)>; <a>; <b>' with an optional '; <N>'")]
    Shape,

    #[error("please enter a query after 'details'")]
    EmptyDetails,

    #[error("invalid value for {field}: {reason}")]
    Value { field: &'static str, reason: String },

    #[error("invalid function: {0}")]
    Function(#[from] ParseError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub function: Function,
    pub a: f64,
    pub b: f64,
    pub n: f64,
    pub detailed: bool,
}

/// Splits a leading or trailing `details` keyword off the input.
pub fn strip_details(input: &str) -> (bool, &str) {
    if input.eq_ignore_ascii_case("details") {
        return (true, "");
    }
    if let Some(rest) = input
        .get(..8)
        .filter(|head| head.eq_ignore_ascii_case("details "))
        .map(|_| &input[8..])
    {
        return (true, rest.trim());
    }
    let split = input.len().saturating_sub(8);
    if let Some(rest) = input
        .get(split..)
        .filter(|tail| tail.len() == 8 && tail.eq_ignore_ascii_case(" details"))
        .map(|_| &input[..split])
    {
        return (true, rest.trim());
    }
    (false, input)
}

/// Reads a number; constant formulas such as `pi/2` are accepted too.
pub fn parse_value(field: &'static str, text: &str) -> Result<f64, QueryError> {
    let text = text.trim();
    if let Ok(value) = text.parse::<f64>() {
        return Ok(value);
    }

    let invalid = |reason: String| QueryError::Value { field, reason };
    let function = Function::parse(text).map_err(|e| invalid(e.to_string()))?;
    if function.expr().has_var() {
        return Err(invalid("must not depend on x".to_string()));
    }
    function.call(0.0).map_err(|e| invalid(e.to_string()))
}

impl Query {
    pub fn parse(input: &str, default_target: f64) -> Result<Self, QueryError> {
        let (detailed, body) = strip_details(input.trim());
        if detailed && body.is_empty() {
            return Err(QueryError::EmptyDetails);
        }

        let parts: Vec<&str> = body.split(';').map(str::trim).collect();
        if !(3..=4).contains(&parts.len()) || parts[0].is_empty() {
            return Err(QueryError::Shape);
        }

        let function = Function::parse(parts[0])?;
        let a = parse_value("a", parts[1])?;
        let b = parse_value("b", parts[2])?;
        let n = match parts.get(3) {
            Some(text) if !text.is_empty() => parse_value("N", text)?,
            _ => default_target,
        };

        Ok(Query {
            function,
            a,
            b,
            n,
            detailed,
        })
    }

    pub fn run(
        &self,
        evaluator: &Evaluator,
        trace: &mut Trace,
    ) -> Result<Report, ivt::Error<EvalError>> {
        evaluator.run(|x| self.function.call(x), self.a, self.b, self.n, trace)
    }
}

/// Parses and evaluates one query, returning the lines to show for it.
///
/// Errors are rendered as a single `Error: ...` line.
pub fn respond(input: &str, config: &Config) -> Vec<String> {
    let query = match Query::parse(input, config.solver.default_target) {
        Ok(query) => query,
        Err(e) => return vec![format!("Error: {}", e)],
    };

    let mut trace = Trace::new(query.detailed);
    let report = match query.run(&config.evaluator(), &mut trace) {
        Ok(report) => report,
        Err(e) => return vec![format!("Error: {}", e)],
    };

    let mut lines = vec![format!(
        "f(x) = {} on [{}, {}], N = {}",
        query.function.expr(),
        format_number(query.a),
        format_number(query.b),
        format_number(query.n)
    )];
    lines.extend(report_lines(&report, &trace.steps, query.detailed));
    if config.plot.enabled {
        let samples = Samples::collect(|x| query.function.call(x), query.a, query.b, &config.plot);
        lines.push(String::new());
        lines.extend(
            render_text(&query.function, &samples, config.plot.width, config.plot.height)
                .lines()
                .map(str::to_string),
        );
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::ivt::Outcome;

    #[test]
    fn full_query() {
        let query = Query::parse("x**3 - 6*x**2 + 11*x - 6; 0; 1.5; 0", 7.0).unwrap();
        assert_eq!(query.function.source(), "x**3 - 6*x**2 + 11*x - 6");
        assert_eq!((query.a, query.b, query.n), (0.0, 1.5, 0.0));
        assert!(!query.detailed);
    }

    #[test]
    fn missing_or_blank_target_uses_default() {
        let query = Query::parse("x; -1; 1", 0.25).unwrap();
        assert_eq!(query.n, 0.25);
        let query = Query::parse("x; -1; 1;  ", 0.25).unwrap();
        assert_eq!(query.n, 0.25);
    }

    #[test]
    fn details_prefix_and_suffix() {
        let query = Query::parse("DETAILS x; -1; 1", 0.0).unwrap();
        assert!(query.detailed);
        assert_eq!(query.function.source(), "x");

        let query = Query::parse("x; -1; 1 details", 0.0).unwrap();
        assert!(query.detailed);
        assert_eq!(query.b, 1.0);

        assert_eq!(Query::parse("details", 0.0), Err(QueryError::EmptyDetails));
    }

    #[test]
    fn constant_endpoints() {
        let query = Query::parse("sin(x); -pi/2; pi/2", 0.0).unwrap();
        assert_relative_eq!(query.a, -std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(query.b, std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn malformed_queries() {
        assert_eq!(Query::parse("x; 1", 0.0), Err(QueryError::Shape));
        assert_eq!(Query::parse("x; 1; 2; 3; 4", 0.0), Err(QueryError::Shape));
        assert_eq!(Query::parse("; 1; 2", 0.0), Err(QueryError::Shape));
        assert!(matches!(
            Query::parse("x; one; 2", 0.0),
            Err(QueryError::Value { field: "a", .. })
        ));
        assert!(matches!(
            Query::parse("x; 0; x + 1", 0.0),
            Err(QueryError::Value { field: "b", .. })
        ));
        assert!(matches!(
            Query::parse("x +; 0; 1", 0.0),
            Err(QueryError::Function(ParseError::UnexpectedEnd))
        ));
    }

    #[test]
    fn runs_against_evaluator() {
        let query = Query::parse("x**2 + 1; 0; 2", 0.0).unwrap();
        let report = query
            .run(&Evaluator::default(), &mut Trace::new(false))
            .unwrap();
        assert!(matches!(report.outcome, Outcome::Inapplicable { .. }));
    }

    #[test]
    fn respond_renders_message_and_plot() {
        let config = Config::default();
        let lines = respond("x; -1; 1", &config);
        assert_eq!(lines[0], "f(x) = x on [-1, 1], N = 0");
        assert_eq!(lines[1], "There exists a c = 0.000000 such that f(c) ≈ 0.");
        assert_eq!(lines[2], "");
        assert_eq!(
            lines.last().map(String::as_str),
            Some("x in [-2, 2]   a = -1   b = 1")
        );
    }

    #[test]
    fn respond_with_details_and_errors() {
        let mut config = Config::default();
        config.plot.enabled = false;

        let lines = respond("details x; -1; 3", &config);
        assert_eq!(lines[2], "Step-by-step bisection:");
        assert!(lines[3].contains("Step 1: [-1, 3] c = 1, f(c) = 1"));
        assert_eq!(lines.last().unwrap(), "Iterations: 2 (f(c) within tolerance of N)");

        assert_eq!(
            respond("1/x; -1; 1", &config),
            vec!["Error: f(0) could not be evaluated: division by zero".to_string()]
        );
        assert!(respond("x; 1", &config)[0].starts_with("Error: expected"));
    }
}
