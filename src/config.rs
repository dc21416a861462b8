//! Configuration loaded from an optional TOML file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::ivt::{Evaluator, Narrowing, DEFAULT_TOLERANCE};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub solver: SolverSettings,
    pub plot: PlotSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverSettings {
    /// Width and value threshold of the bisection.
    pub tolerance: f64,
    pub narrowing: Narrowing,
    /// Target used when `N` is left blank.
    pub default_target: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotSettings {
    pub enabled: bool,
    pub samples: usize,
    /// Extra room sampled on each side of the interval.
    pub margin: f64,
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            narrowing: Narrowing::default(),
            default_target: 0.0,
        }
    }
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            samples: 400,
            margin: 1.0,
            width: 72,
            height: 20,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Loads the file at `path`, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let tolerance = self.solver.tolerance;
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "solver.tolerance must be finite and > 0, got {}",
                tolerance
            )));
        }
        if !self.solver.default_target.is_finite() {
            return Err(ConfigError::Invalid(
                "solver.default_target must be finite".to_string(),
            ));
        }
        if self.plot.samples < 2 {
            return Err(ConfigError::Invalid(format!(
                "plot.samples must be at least 2, got {}",
                self.plot.samples
            )));
        }
        if !(self.plot.margin.is_finite() && self.plot.margin >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "plot.margin must be finite and >= 0, got {}",
                self.plot.margin
            )));
        }
        if self.plot.width < 8 || self.plot.height < 4 {
            return Err(ConfigError::Invalid(format!(
                "plot size must be at least 8x4, got {}x{}",
                self.plot.width, self.plot.height
            )));
        }
        Ok(())
    }

    pub fn evaluator(&self) -> Evaluator {
        Evaluator::new(self.solver.tolerance, self.solver.narrowing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.solver.tolerance, 1e-6);
        assert_eq!(config.solver.narrowing, Narrowing::AssumeIncreasing);
        assert_eq!(config.solver.default_target, 0.0);
        assert!(config.plot.enabled);
        assert_eq!(config.plot.samples, 400);
        assert_eq!(config.log.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [solver]
            narrowing = "bracket"
            default_target = 2.5

            [plot]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.solver.narrowing, Narrowing::Bracket);
        assert_eq!(config.solver.default_target, 2.5);
        assert_eq!(config.solver.tolerance, 1e-6);
        assert!(!config.plot.enabled);
        assert_eq!(config.plot.margin, 1.0);
        assert_eq!(config.evaluator().narrowing, Narrowing::Bracket);
    }

    #[test]
    fn test_empty_file() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_toml("[solver]\ntolerance = 0.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml("[plot]\nsamples = 1"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml("[plot]\nmargin = -1.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml("[solver]\nnarrowing = \"sideways\""),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            Config::from_toml("[solver]\ntolerence = 1e-3"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/ivtcalc.toml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }
}
