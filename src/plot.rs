//! Sampling and text rendering of `f(x)` around the interval `[a, b]`.

use termplot::plot::Graph;
use termplot::{Domain, Plot, Size};

use crate::config::PlotSettings;
use crate::expr::Function;
use crate::output::format_number;

/// Evenly spaced samples of a function over `[min(a, b) - margin, max(a, b) + margin]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Samples {
    pub points: Vec<(f64, f64)>,
    /// Sample points where the function could not be evaluated.
    pub skipped: usize,
    pub a: f64,
    pub b: f64,
    x_range: [f64; 2],
}

impl Samples {
    /// Samples `f`; failed evaluations leave gaps instead of aborting.
    pub fn collect<F, E>(mut f: F, a: f64, b: f64, settings: &PlotSettings) -> Self
    where
        F: FnMut(f64) -> Result<f64, E>,
    {
        let start = a.min(b) - settings.margin;
        let end = a.max(b) + settings.margin;
        let count = settings.samples.max(2);
        let last = (count - 1) as f64;

        let mut points = Vec::with_capacity(count);
        let mut skipped = 0;
        for i in 0..count {
            let x = start + (end - start) * (i as f64 / last);
            match f(x) {
                Ok(y) if y.is_finite() => points.push((x, y)),
                _ => skipped += 1,
            }
        }

        Samples {
            points,
            skipped,
            a,
            b,
            x_range: [start, end],
        }
    }

    /// Horizontal plot range, widened when the interval is a single point.
    pub fn x_bounds(&self) -> [f64; 2] {
        widen(self.x_range)
    }

    /// Vertical plot range; always includes the x-axis.
    pub fn y_bounds(&self) -> [f64; 2] {
        let (lo, hi) = self
            .points
            .iter()
            .fold((0.0_f64, 0.0_f64), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
        widen([lo, hi])
    }
}

fn widen([lo, hi]: [f64; 2]) -> [f64; 2] {
    if hi - lo > f64::EPSILON * lo.abs().max(hi.abs()).max(1.0) {
        [lo, hi]
    } else {
        [lo - 1.0, hi + 1.0]
    }
}

/// Renders `function` as a terminal plot over the sampled range.
///
/// The curve and the x-axis are drawn by termplot; a legend line below the
/// plot names the endpoints and the number of undefined sample points.
pub fn render_text(function: &Function, samples: &Samples, width: usize, height: usize) -> String {
    let [x_lo, x_hi] = samples.x_bounds();
    let [y_lo, y_hi] = samples.y_bounds();

    let curve = function.clone();
    let mut plot = Plot::default();
    plot.set_domain(Domain(x_lo..x_hi))
        .set_codomain(Domain(y_lo..y_hi))
        .set_size(Size::new(width, height))
        .set_title(&format!("f(x) = {}", function.expr()))
        .set_x_label("x")
        .set_y_label("f(x)")
        .add_plot(Box::new(Graph::new(|_| 0.0)))
        .add_plot(Box::new(Graph::new(move |x| {
            curve.call(x).unwrap_or(f64::NAN)
        })));

    let mut out = format!("{plot}\n");
    out.push_str(&legend(samples));
    out.push('\n');
    out
}

/// The line printed under the plot: endpoint markers and gaps.
pub fn legend(samples: &Samples) -> String {
    let mut line = format!(
        "x in [{}, {}]   a = {}   b = {}",
        format_number(samples.x_range[0]),
        format_number(samples.x_range[1]),
        format_number(samples.a),
        format_number(samples.b)
    );
    if samples.skipped > 0 {
        line.push_str(&format!("   ({} points undefined)", samples.skipped));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;

    fn settings(samples: usize, margin: f64) -> PlotSettings {
        PlotSettings {
            samples,
            margin,
            ..PlotSettings::default()
        }
    }

    #[test]
    fn samples_span_interval_plus_margin() {
        let samples = Samples::collect(
            |x| Ok::<_, Infallible>(x),
            2.0,
            0.0,
            &settings(5, 1.0),
        );
        let xs: Vec<f64> = samples.points.iter().map(|p| p.0).collect();
        assert_eq!(xs, vec![-1.0, 0.0, 1.0, 2.0, 3.0]);
        assert_eq!(samples.skipped, 0);
        assert_eq!(samples.x_bounds(), [-1.0, 3.0]);
    }

    #[test]
    fn undefined_points_are_skipped() {
        let reciprocal = Function::parse("1 / x").unwrap();
        let samples = Samples::collect(|x| reciprocal.call(x), -1.0, 1.0, &settings(5, 0.0));
        assert_eq!(samples.points.len(), 4);
        assert_eq!(samples.skipped, 1);
    }

    #[test]
    fn y_bounds_include_axis() {
        let samples = Samples::collect(
            |x| Ok::<_, Infallible>(x * x + 1.0),
            0.0,
            2.0,
            &settings(3, 0.0),
        );
        let [lo, hi] = samples.y_bounds();
        assert_relative_eq!(lo, 0.0);
        assert_relative_eq!(hi, 5.0);
    }

    #[test]
    fn flat_function_still_has_a_range() {
        let samples = Samples::collect(
            |_| Ok::<_, Infallible>(0.0),
            1.0,
            1.0,
            &settings(4, 0.0),
        );
        assert_eq!(samples.x_bounds(), [0.0, 2.0]);
        assert_eq!(samples.y_bounds(), [-1.0, 1.0]);
    }

    #[test]
    fn text_plot_ends_with_legend() {
        let identity = Function::parse("x").unwrap();
        let samples = Samples::collect(|x| identity.call(x), -1.0, 1.0, &PlotSettings::default());
        let text = render_text(&identity, &samples, 40, 20);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.len() > 1);
        assert_eq!(lines.last().copied(), Some("x in [-2, 2]   a = -1   b = 1"));
    }

    #[test]
    fn legend_reports_gaps() {
        let reciprocal = Function::parse("1 / x").unwrap();
        let samples = Samples::collect(|x| reciprocal.call(x), -1.0, 1.0, &settings(5, 0.0));
        assert_eq!(
            legend(&samples),
            "x in [-1, 1]   a = -1   b = 1   (1 points undefined)"
        );
        let text = render_text(&reciprocal, &samples, 20, 10);
        assert!(text.ends_with("(1 points undefined)\n"));
    }
}
