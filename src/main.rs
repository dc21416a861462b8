use std::io;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;

use ivtcalc::cli::{Cli, Command, Mode};
use ivtcalc::config::Config;
use ivtcalc::{check, logging, prompt};
#[cfg(feature = "line")]
use ivtcalc::line_mode;
#[cfg(feature = "tui")]
use ivtcalc::tui_mode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(check::EXIT_ERROR)
        }
    }
}

fn default_mode() -> Mode {
    if cfg!(feature = "tui") {
        Mode::Tui
    } else if cfg!(feature = "line") {
        Mode::Line
    } else {
        Mode::Prompt
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    let mode = cli.mode.unwrap_or_else(default_mode);
    let screen_owned = cli.command.is_none() && mode != Mode::Prompt;
    logging::init(&config.log, screen_owned)?;
    info!(?mode, tolerance = config.solver.tolerance, "starting");

    if let Some(Command::Check(args)) = &cli.command {
        let result = check::run_check(args, &config, &mut io::stdout().lock());
        if let Err(e) = &result {
            eprintln!("Error: {:#}", e);
        }
        return Ok(ExitCode::from(check::exit_status(&result)));
    }

    match mode {
        Mode::Prompt => {
            let stdin = io::stdin();
            prompt::run_prompt(&mut stdin.lock(), &mut io::stdout(), &config)?;
        }
        #[cfg(feature = "tui")]
        Mode::Tui => tui_mode::run_tui(config)?,
        #[cfg(feature = "line")]
        Mode::Line => line_mode::run_line(&config)?,
        #[allow(unreachable_patterns)]
        other => bail!("this build does not include the {:?} front end", other),
    }
    Ok(ExitCode::SUCCESS)
}
