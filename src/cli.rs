//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::ivt::Narrowing;

/// Intermediate Value Theorem calculator.
#[derive(Debug, Parser)]
#[command(name = "ivtcalc", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "IVTCALC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Interactive front end
    #[arg(short, long, value_enum, global = true)]
    pub mode: Option<Mode>,

    /// Bisection tolerance (overrides the config file)
    #[arg(long, global = true)]
    pub tolerance: Option<f64>,

    /// Keep the half-interval that still brackets N instead of assuming f increases
    #[arg(long, global = true)]
    pub bracket: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Full-screen terminal UI
    Tui,
    /// Line editor with history
    Line,
    /// One question at a time on stdin
    Prompt,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate a single function and interval, then exit
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Function of x, e.g. "x**3 - 6*x**2 + 11*x - 6"
    #[arg(allow_hyphen_values = true)]
    pub function: String,

    /// Starting point a
    #[arg(short = 'a', allow_negative_numbers = true)]
    pub a: f64,

    /// Ending point b
    #[arg(short = 'b', allow_negative_numbers = true)]
    pub b: f64,

    /// Target value N (defaults to the configured target, normally 0)
    #[arg(short = 'n', long = "target", allow_negative_numbers = true)]
    pub target: Option<f64>,

    /// Print every bisection step
    #[arg(long)]
    pub details: bool,

    /// Skip the text plot
    #[arg(long)]
    pub no_plot: bool,
}

impl Cli {
    /// Applies flag overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(tolerance) = self.tolerance {
            config.solver.tolerance = tolerance;
        }
        if self.bracket {
            config.solver.narrowing = Narrowing::Bracket;
        }
        if let Some(Command::Check(args)) = &self.command {
            if args.no_plot {
                config.plot.enabled = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interactive_defaults() {
        let cli = Cli::parse_from(["ivtcalc"]);
        assert!(cli.command.is_none());
        assert!(cli.mode.is_none());
        assert!(!cli.bracket);
    }

    #[test]
    fn test_mode_selection() {
        let cli = Cli::parse_from(["ivtcalc", "--mode", "prompt"]);
        assert_eq!(cli.mode, Some(Mode::Prompt));
    }

    #[test]
    fn test_check_command() {
        let cli = Cli::parse_from([
            "ivtcalc", "check", "-x + 1", "-a", "-1", "-b", "2.5", "-n", "-0.5", "--details",
        ]);
        match cli.command {
            Some(Command::Check(args)) => {
                assert_eq!(args.function, "-x + 1");
                assert_eq!(args.a, -1.0);
                assert_eq!(args.b, 2.5);
                assert_eq!(args.target, Some(-0.5));
                assert!(args.details);
                assert!(!args.no_plot);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "ivtcalc", "--tolerance", "1e-3", "--bracket", "check", "x", "-a", "0", "-b", "1",
            "--no-plot",
        ]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.solver.tolerance, 1e-3);
        assert_eq!(config.solver.narrowing, Narrowing::Bracket);
        assert!(!config.plot.enabled);
    }
}
