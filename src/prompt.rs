//! Plain question-and-answer flow over any reader and writer.

use std::io::{BufRead, Write};

use anyhow::{bail, Result};

use crate::config::Config;
use crate::expr::Function;
use crate::ivt::Trace;
use crate::output::{format_number, report_lines};
use crate::plot::{render_text, Samples};
use crate::query::parse_value;

fn read_line<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> Result<String> {
    write!(out, "{}", prompt)?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("input closed");
    }
    Ok(line.trim().to_string())
}

fn read_function<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Function> {
    loop {
        let text = read_line(
            input,
            out,
            "Enter a function of x (e.g., x**3 - 6*x**2 + 11*x - 6): ",
        )?;
        match Function::parse(&text) {
            Ok(function) => return Ok(function),
            Err(e) => writeln!(out, "Invalid function: {}", e)?,
        }
    }
}

fn read_number<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    field: &'static str,
    prompt: &str,
    default: Option<f64>,
) -> Result<f64> {
    loop {
        let text = read_line(input, out, prompt)?;
        if text.is_empty() {
            if let Some(value) = default {
                return Ok(value);
            }
        }
        match parse_value(field, &text) {
            Ok(value) if value.is_finite() => return Ok(value),
            Ok(_) => writeln!(out, "Invalid number, please try again.")?,
            Err(e) => writeln!(out, "{}, please try again.", e)?,
        }
    }
}

/// Asks for one function, interval and target, then prints the verdict.
///
/// A failure to evaluate the function is returned to the caller.
pub fn run_prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, config: &Config) -> Result<()> {
    writeln!(out, "Advanced IVT Calculator")?;

    let function = read_function(input, out)?;
    let a = read_number(input, out, "a", "Enter the starting point a: ", None)?;
    let b = read_number(input, out, "b", "Enter the ending point b: ", None)?;
    let default = config.solver.default_target;
    let n = read_number(
        input,
        out,
        "N",
        &format!("Enter the target value N (default is {}): ", format_number(default)),
        Some(default),
    )?;

    let mut trace = Trace::new(false);
    let report = config
        .evaluator()
        .run(|x| function.call(x), a, b, n, &mut trace)?;
    for line in report_lines(&report, &trace.steps, false) {
        writeln!(out, "{}", line)?;
    }

    if config.plot.enabled {
        let samples = Samples::collect(|x| function.call(x), a, b, &config.plot);
        writeln!(out)?;
        writeln!(out, "Graph of f(x) = {} with interval [{}, {}]", function.expr(), a, b)?;
        write!(out, "{}", render_text(&function, &samples, config.plot.width, config.plot.height))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use crate::expr::EvalError;
    use crate::ivt;

    fn no_plot() -> Config {
        let mut config = Config::default();
        config.plot.enabled = false;
        config
    }

    fn session(script: &str, config: &Config) -> (Result<()>, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        let result = run_prompt(&mut input, &mut out, config);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn cubic_session() {
        let (result, out) = session("x**3 - 6*x**2 + 11*x - 6\n0\n1.5\n\n", &no_plot());
        result.unwrap();
        assert!(out.starts_with("Advanced IVT Calculator\n"));
        assert!(out.contains("Enter the target value N (default is 0): "));
        assert!(out.contains("There exists a c = 1.000000 such that f(c) ≈ 0."));
    }

    #[test]
    fn inapplicable_session() {
        let (result, out) = session("x**2 + 1\n0\n2\n0\n", &no_plot());
        result.unwrap();
        assert!(out.contains("IVT does not hold: N = 0 is not between f(a) = 1 and f(b) = 5."));
    }

    #[test]
    fn reprompts_on_bad_input() {
        let (result, out) = session("x +\nx\nabc\n-1\n1\nzero\n0\n", &no_plot());
        result.unwrap();
        assert!(out.contains("Invalid function: unexpected end of input"));
        assert!(out.contains("invalid value for a"));
        assert!(out.contains("invalid value for N"));
        assert!(out.contains("There exists a c = 0.000000"));
    }

    #[test]
    fn configured_default_target() {
        let mut config = no_plot();
        config.solver.default_target = 0.5;
        let (result, out) = session("x\n0\n1\n\n", &config);
        result.unwrap();
        assert!(out.contains("(default is 0.5)"));
        assert!(out.contains("There exists a c = 0.500000 such that f(c) ≈ 0.5."));
    }

    #[test]
    fn evaluation_failure_is_returned() {
        let (result, _) = session("1 / x\n-1\n1\n0\n", &no_plot());
        let err = result.unwrap_err();
        let ivt_err = err
            .downcast_ref::<ivt::Error<EvalError>>()
            .expect("evaluation error");
        assert!(matches!(ivt_err, ivt::Error::Function { x, .. } if *x == 0.0));
    }

    #[test]
    fn closed_input_is_an_error() {
        let (result, _) = session("x\n0\n", &no_plot());
        assert!(result.is_err());
    }

    #[test]
    fn plot_follows_message() {
        let (result, out) = session("x\n-1\n1\n0\n", &Config::default());
        result.unwrap();
        let message = out.find("There exists").unwrap();
        let graph = out.find("Graph of f(x) = x with interval [-1, 1]").unwrap();
        assert!(message < graph);
        assert!(out.contains("a = -1"));
    }
}
