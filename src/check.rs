//! The non-interactive `check` command.

use std::io::Write;

use anyhow::Result;
use tracing::debug;

use crate::cli::CheckArgs;
use crate::config::Config;
use crate::expr::Function;
use crate::ivt::{Outcome, Trace};
use crate::output::report_lines;
use crate::plot::{render_text, Samples};

/// `c` was located.
pub const EXIT_FOUND: u8 = 0;
/// The hypothesis failed or the search ended without reaching `N`.
pub const EXIT_NOT_FOUND: u8 = 1;
/// The formula, the inputs or the output could not be handled.
pub const EXIT_ERROR: u8 = 2;

/// Evaluates one function and interval and writes the report to `out`.
///
/// # Errors
///
/// Returns an error for an unparsable formula, unusable inputs, a function
/// that cannot be evaluated during the search, or a failed write.
pub fn run_check<W: Write>(args: &CheckArgs, config: &Config, out: &mut W) -> Result<Outcome> {
    let function = Function::parse(&args.function)?;
    let n = args.target.unwrap_or(config.solver.default_target);

    let mut trace = Trace::new(args.details);
    let report = config
        .evaluator()
        .run(|x| function.call(x), args.a, args.b, n, &mut trace)?;
    debug!(outcome = ?report.outcome, iterations = report.iterations, "check finished");

    writeln!(out, "f(x) = {}", function.expr())?;
    for line in report_lines(&report, &trace.steps, args.details) {
        writeln!(out, "{}", line)?;
    }
    if config.plot.enabled {
        let samples = Samples::collect(|x| function.call(x), args.a, args.b, &config.plot);
        writeln!(out)?;
        write!(out, "{}", render_text(&function, &samples, config.plot.width, config.plot.height))?;
    }
    Ok(report.outcome)
}

/// Maps the result of [`run_check`] to the process exit status.
pub fn exit_status(result: &Result<Outcome>) -> u8 {
    match result {
        Ok(outcome) if outcome.is_found() => EXIT_FOUND,
        Ok(_) => EXIT_NOT_FOUND,
        Err(_) => EXIT_ERROR,
    }
}
