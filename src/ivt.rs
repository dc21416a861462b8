//! Intermediate Value Theorem check and bisection search.
//!
//! [`Evaluator::run`] first decides whether the target `N` lies between
//! `f(a)` and `f(b)`. If it does, the interval is halved until a midpoint
//! `c` with `|f(c) - N| < tolerance` turns up or the interval itself becomes
//! narrower than the tolerance.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, trace, warn};

pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// How the working interval is narrowed after each midpoint evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Narrowing {
    /// Move the lower bound when `f(c) < N`, otherwise the upper bound.
    ///
    /// Only reliable when `f` is non-decreasing from `a` to `b`.
    #[default]
    AssumeIncreasing,

    /// Keep the half whose endpoint values still straddle `N`.
    Bracket,
}

/// The three ways an evaluation can end without a failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Found { c: f64, n: f64 },
    NotFound,
    Inapplicable { n: f64, f_a: f64, f_b: f64 },
}

impl Outcome {
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found { .. })
    }

    /// The located point, if any.
    #[must_use]
    pub fn c(&self) -> Option<f64> {
        match self {
            Outcome::Found { c, .. } => Some(*c),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Found { c, n } => {
                write!(f, "There exists a c = {c:.6} such that f(c) ≈ {n}.")
            }
            Outcome::NotFound => {
                f.write_str("Could not find an exact value, but IVT suggests it should exist.")
            }
            Outcome::Inapplicable { n, f_a, f_b } => write!(
                f,
                "IVT does not hold: N = {n} is not between f(a) = {f_a} and f(b) = {f_b}."
            ),
        }
    }
}

/// Why the evaluation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// `N` was outside the endpoint values; no bisection ran.
    HypothesisFailed,
    /// A midpoint satisfied `|f(c) - N| < tolerance`.
    ValueReached,
    /// The interval became no wider than the tolerance.
    WidthReached,
    /// Floating-point resolution ran out before the width did.
    MachinePrecision,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
    pub outcome: Outcome,
    pub iterations: usize,
    pub termination: Termination,
}

/// One bisection iteration: the bounds it started from and its midpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub f_c: f64,
}

pub struct Trace {
    pub steps: Vec<Step>,
    pub detailed_mode: bool,
}

impl Trace {
    pub fn new(detailed_mode: bool) -> Self {
        Trace {
            steps: Vec::new(),
            detailed_mode,
        }
    }

    pub fn add_step(&mut self, step: Step) {
        if self.detailed_mode {
            self.steps.push(step);
        }
    }
}

#[derive(Debug, Error)]
pub enum Error<E> {
    #[error("invalid input: {name} must be finite, got {value}")]
    NonFiniteInput { name: &'static str, value: f64 },

    #[error("invalid tolerance: must be finite and > 0, got {0}")]
    InvalidTolerance(f64),

    #[error("f({x}) could not be evaluated: {source}")]
    Function {
        x: f64,
        #[source]
        source: E,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluator {
    pub tolerance: f64,
    pub narrowing: Narrowing,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            narrowing: Narrowing::default(),
        }
    }
}

impl Evaluator {
    #[must_use]
    pub fn new(tolerance: f64, narrowing: Narrowing) -> Self {
        Self {
            tolerance,
            narrowing,
        }
    }

    /// Checks the IVT hypothesis for `N` on `[a, b]` and searches for `c`.
    ///
    /// The endpoints may be given in either order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Function`] as soon as `f` fails at any point, and an
    /// input error when `a`, `b`, `N` or the tolerance is not usable.
    pub fn run<F, E>(
        &self,
        mut f: F,
        a: f64,
        b: f64,
        n: f64,
        trace: &mut Trace,
    ) -> Result<Report, Error<E>>
    where
        F: FnMut(f64) -> Result<f64, E>,
    {
        for (name, value) in [("a", a), ("b", b), ("N", n)] {
            if !value.is_finite() {
                return Err(Error::NonFiniteInput { name, value });
            }
        }
        let tol = self.tolerance;
        if !(tol.is_finite() && tol > 0.0) {
            return Err(Error::InvalidTolerance(tol));
        }

        let mut call = |x: f64| {
            f(x).map_err(|source| {
                warn!(x, "function evaluation failed");
                Error::Function { x, source }
            })
        };

        let f_a = call(a)?;
        let f_b = call(b)?;
        debug!(a, b, n, f_a, f_b, "evaluated endpoints");

        // Written out so a NaN endpoint value never counts as containing N.
        let contains = (f_a <= n && n <= f_b) || (f_b <= n && n <= f_a);
        if !contains {
            return Ok(Report {
                outcome: Outcome::Inapplicable { n, f_a, f_b },
                iterations: 0,
                termination: Termination::HypothesisFailed,
            });
        }

        let (mut lo, mut hi) = (a, b);
        let mut f_lo = f_a;
        let mut iterations = 0;
        let mut termination = Termination::WidthReached;

        while (hi - lo).abs() > tol {
            let c = (lo + hi) / 2.0;
            if !(c > lo.min(hi) && c < lo.max(hi)) {
                termination = Termination::MachinePrecision;
                break;
            }

            let f_c = call(c)?;
            iterations += 1;
            trace.add_step(Step {
                a: lo,
                b: hi,
                c,
                f_c,
            });
            trace!(iterations, c, f_c, "bisection step");

            if (f_c - n).abs() < tol {
                debug!(c, iterations, "target value reached");
                return Ok(Report {
                    outcome: Outcome::Found { c, n },
                    iterations,
                    termination: Termination::ValueReached,
                });
            }

            let move_lo = match self.narrowing {
                Narrowing::AssumeIncreasing => f_c < n,
                Narrowing::Bracket => f_lo != n && (f_c < n) == (f_lo < n),
            };
            if move_lo {
                lo = c;
                f_lo = f_c;
            } else {
                hi = c;
            }
        }

        debug!(iterations, ?termination, lo, hi, "no value within tolerance");
        Ok(Report {
            outcome: Outcome::NotFound,
            iterations,
            termination,
        })
    }
}

/// Runs the default evaluator without recording steps.
///
/// # Errors
///
/// See [`Evaluator::run`].
pub fn evaluate<F, E>(f: F, a: f64, b: f64, n: f64) -> Result<Outcome, Error<E>>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    Evaluator::default()
        .run(f, a, b, n, &mut Trace::new(false))
        .map(|report| report.outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_abs_diff_eq;

    use crate::expr::{EvalError, Function};

    fn pure(f: impl Fn(f64) -> f64) -> impl FnMut(f64) -> Result<f64, Infallible> {
        move |x| Ok(f(x))
    }

    fn run(src: &str, a: f64, b: f64, n: f64) -> Report {
        let function = Function::parse(src).expect("valid formula");
        Evaluator::default()
            .run(|x| function.call(x), a, b, n, &mut Trace::new(false))
            .expect("evaluates")
    }

    #[test]
    fn cubic_crossing_near_one() {
        let report = run("x**3 - 6*x**2 + 11*x - 6", 0.0, 1.5, 0.0);
        let c = report.outcome.c().expect("found");
        assert_abs_diff_eq!(c, 1.0, epsilon = 1e-6);
        assert_eq!(report.termination, Termination::ValueReached);
        assert_eq!(report.iterations, 20);
    }

    #[test]
    fn hypothesis_fails_when_target_outside_range() {
        let report = run("x**2 + 1", 0.0, 2.0, 0.0);
        assert_eq!(
            report.outcome,
            Outcome::Inapplicable {
                n: 0.0,
                f_a: 1.0,
                f_b: 5.0
            }
        );
        assert_eq!(report.iterations, 0);
        assert_eq!(report.termination, Termination::HypothesisFailed);
    }

    #[test]
    fn identity_hits_target_on_first_midpoint() {
        let report = run("x", -1.0, 1.0, 0.0);
        assert_eq!(report.outcome, Outcome::Found { c: 0.0, n: 0.0 });
        assert_eq!(report.iterations, 1);
    }

    #[test]
    fn endpoint_values_are_inclusive() {
        let outcome = evaluate(pure(|x| x), 0.0, 1.0, 1.0).unwrap();
        assert!(outcome.is_found());
        let outcome = evaluate(pure(|x| x), 0.0, 1.0, 0.0).unwrap();
        assert!(outcome.is_found());
        let outcome = evaluate(pure(|x| x * x), 0.0, 2.0, 4.0).unwrap();
        assert!(!matches!(outcome, Outcome::Inapplicable { .. }));
    }

    #[test]
    fn strictly_outside_is_inapplicable() {
        for (a, b, n) in [(0.0, 1.0, 3.5), (0.0, 1.0, -0.1), (1.0, 0.0, 3.5), (1.0, 0.0, -0.5)] {
            let outcome = evaluate(pure(|x| 3.0 * x), a, b, n).unwrap();
            assert!(matches!(outcome, Outcome::Inapplicable { .. }), "{a} {b} {n}");
        }
        // Equal endpoint values on both sides: only that value is contained.
        let outcome = evaluate(pure(|x| x * x), -1.0, 1.0, 0.5).unwrap();
        assert_eq!(
            outcome,
            Outcome::Inapplicable {
                n: 0.5,
                f_a: 1.0,
                f_b: 1.0
            }
        );
    }

    #[test]
    fn nan_endpoint_value_is_inapplicable() {
        let outcome = evaluate(pure(|x| if x > 0.5 { f64::NAN } else { x }), 0.0, 1.0, 0.2)
            .unwrap();
        assert!(matches!(outcome, Outcome::Inapplicable { .. }));
    }

    #[test]
    fn increasing_functions_never_inapplicable() {
        let cases: [(fn(f64) -> f64, f64, f64); 4] = [
            (|x| x, -3.0, 5.0),
            (|x| x * x * x, -2.0, 2.0),
            (f64::exp, 0.0, 3.0),
            (|x| 2.0 * x + 1.0, 0.0, 10.0),
        ];
        for (f, a, b) in cases {
            let n = (f(a) + f(b)) / 2.0 + 0.123;
            let outcome = evaluate(pure(f), a, b, n).unwrap();
            assert!(!matches!(outcome, Outcome::Inapplicable { .. }));
        }
    }

    #[test]
    fn width_exhausted_reports_not_found() {
        // The crossing at sqrt(2) is steeper than the value tolerance allows.
        let report = run("x**2 - 2", 0.0, 2.0, 0.0);
        assert_eq!(report.outcome, Outcome::NotFound);
        assert_eq!(report.termination, Termination::WidthReached);
        assert_eq!(report.iterations, 21);
    }

    #[test]
    fn iterations_bounded_by_log2_of_width() {
        let evaluator = Evaluator::default();
        for (a, b) in [(0.0, 2.0), (-100.0, 37.5), (3.0, 3.25), (1e3, -1e3)] {
            let report = evaluator
                .run(pure(|x| x * x * x - 2.0), a, b, 1e-3, &mut Trace::new(false))
                .unwrap();
            let bound = ((b - a).abs() / evaluator.tolerance).log2().ceil() as usize;
            assert!(report.iterations <= bound, "{a} {b}: {}", report.iterations);
        }
    }

    #[test]
    fn decreasing_function_needs_bracket_narrowing() {
        let decreasing = |x: f64| -x;

        let outcome = evaluate(pure(decreasing), -1.0, 1.0, 0.3).unwrap();
        assert_eq!(outcome, Outcome::NotFound);

        let bracket = Evaluator::new(DEFAULT_TOLERANCE, Narrowing::Bracket);
        let report = bracket
            .run(pure(decreasing), -1.0, 1.0, 0.3, &mut Trace::new(false))
            .unwrap();
        let c = report.outcome.c().expect("found");
        assert_abs_diff_eq!(c, -0.3, epsilon = 1e-6);
    }

    #[test]
    fn reversed_interval_with_bracket_narrowing() {
        let bracket = Evaluator::new(DEFAULT_TOLERANCE, Narrowing::Bracket);
        let report = bracket
            .run(pure(|x| x), 1.0, -1.0, 0.3, &mut Trace::new(false))
            .unwrap();
        assert_abs_diff_eq!(report.outcome.c().unwrap(), 0.3, epsilon = 1e-6);

        let outcome = evaluate(pure(|x| x), 1.0, -1.0, 0.3).unwrap();
        assert_eq!(outcome, Outcome::NotFound);
    }

    #[test]
    fn bracket_narrowing_on_non_monotone_function() {
        // Rises then falls; the crossing of 0.5 sits on the falling side.
        let hump = |x: f64| 1.0 - (x - 1.0) * (x - 1.0);
        let bracket = Evaluator::new(DEFAULT_TOLERANCE, Narrowing::Bracket);
        let report = bracket
            .run(pure(hump), 0.5, 3.0, 0.5, &mut Trace::new(false))
            .unwrap();
        let c = report.outcome.c().expect("found");
        assert_abs_diff_eq!(hump(c), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn degenerate_interval_skips_bisection() {
        let report = Evaluator::default()
            .run(pure(|x| x), 2.0, 2.0, 2.0, &mut Trace::new(false))
            .unwrap();
        assert_eq!(report.outcome, Outcome::NotFound);
        assert_eq!(report.iterations, 0);
    }

    #[test]
    fn machine_precision_stops_the_loop() {
        let a = 1e12;
        let b = a + 0.25;
        let report = Evaluator::default()
            .run(pure(|x| x - 1e12), a, b, 0.3, &mut Trace::new(false))
            .unwrap();
        assert!(matches!(report.outcome, Outcome::Inapplicable { .. }));

        let report = Evaluator::default()
            .run(pure(|_| 0.0_f64), a, b, 0.0, &mut Trace::new(false))
            .unwrap();
        assert!(report.outcome.is_found());

        let step = |x: f64| if x < 1e12 + 0.1 { -1.0 } else { 1.0 };
        let report = Evaluator::default()
            .run(pure(step), a, b, 0.0, &mut Trace::new(false))
            .unwrap();
        assert_eq!(report.outcome, Outcome::NotFound);
        assert_eq!(report.termination, Termination::MachinePrecision);
    }

    #[test]
    fn evaluation_failure_propagates_with_location() {
        let function = Function::parse("1 / x").unwrap();
        let err = evaluate(|x| function.call(x), -1.0, 1.0, 0.0).unwrap_err();
        match err {
            Error::Function { x, source } => {
                assert_eq!(x, 0.0);
                assert_eq!(source, EvalError::DivisionByZero);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let function = Function::parse("sqrt(x)").unwrap();
        let err = evaluate(|x| function.call(x), -1.0, 1.0, 0.0).unwrap_err();
        assert!(matches!(err, Error::Function { x, .. } if x == -1.0));
    }

    #[test]
    fn rejects_unusable_inputs() {
        let err = evaluate(pure(|x| x), f64::NAN, 1.0, 0.0).unwrap_err();
        assert!(matches!(err, Error::NonFiniteInput { name: "a", .. }));
        let err = evaluate(pure(|x| x), 0.0, f64::INFINITY, 0.0).unwrap_err();
        assert!(matches!(err, Error::NonFiniteInput { name: "b", .. }));

        let zero_tol = Evaluator::new(0.0, Narrowing::AssumeIncreasing);
        let err = zero_tol
            .run(pure(|x| x), 0.0, 1.0, 0.5, &mut Trace::new(false))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTolerance(_)));
    }

    #[test]
    fn trace_records_only_in_detailed_mode() {
        let mut quiet = Trace::new(false);
        Evaluator::default()
            .run(pure(|x| x), -1.0, 3.0, 0.0, &mut quiet)
            .unwrap();
        assert!(quiet.steps.is_empty());

        let mut detailed = Trace::new(true);
        let report = Evaluator::default()
            .run(pure(|x| x), -1.0, 3.0, 0.0, &mut detailed)
            .unwrap();
        assert_eq!(detailed.steps.len(), report.iterations);
        assert_eq!(
            detailed.steps[0],
            Step {
                a: -1.0,
                b: 3.0,
                c: 1.0,
                f_c: 1.0
            }
        );
        assert_eq!(detailed.steps[1].b, 1.0);
    }

    #[test]
    fn messages() {
        assert_eq!(
            Outcome::Found { c: 1.0000004768, n: 0.0 }.to_string(),
            "There exists a c = 1.000000 such that f(c) ≈ 0."
        );
        assert_eq!(
            Outcome::NotFound.to_string(),
            "Could not find an exact value, but IVT suggests it should exist."
        );
        assert_eq!(
            Outcome::Inapplicable {
                n: 0.0,
                f_a: 1.0,
                f_b: 5.0
            }
            .to_string(),
            "IVT does not hold: N = 0 is not between f(a) = 1 and f(b) = 5."
        );
    }
}
