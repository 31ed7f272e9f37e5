use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use chief::config::Config;
use chief::render;
use chief::runner::{orchestrator_for, ScenarioRunner, CHECK_TIMEOUT};
use chief::scenario::{self, Scenario};
use chief::{clog, clog_error, Result};

/// Chief - scenario runner for a multi-agent orchestrator
#[derive(Parser, Debug)]
#[command(name = "chief")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:
    CHIEF_DEBUG=1|trace    Enable debug (or trace) logging
    CHIEF_SCENARIO         Default scenario
    CHIEF_MOCK             Use the simulated orchestrator (default true)
    CHIEF_BUDGET           Spending limit in USD
    CHIEF_TIMEOUT          Run timeout in seconds
    CHIEF_VERBOSE          Print progress events
    CHIEF_API_KEY          API key for live runs (or ANTHROPIC_API_KEY)")]
pub struct Cli {
    /// Enable debug logging (writes to ~/.chief/chief.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Config file (default ~/.chief/chief.toml)
    #[arg(short = 'c', long, env = "CHIEF_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run a scenario and print its events and report
    Run {
        /// basic, fullstack or enterprise
        #[arg(short, long)]
        scenario: Option<String>,

        /// Use the simulated orchestrator
        #[arg(long, conflicts_with = "live")]
        mock: bool,

        /// Use the live orchestrator (needs an API key)
        #[arg(long)]
        live: bool,

        /// Spending limit in USD
        #[arg(long)]
        budget: Option<f64>,

        /// Timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Print progress events and mirror warnings to stderr
        #[arg(short, long)]
        verbose: bool,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a scenario's plan without running it
    Plan {
        #[arg(short, long)]
        scenario: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// List available scenarios
    Scenarios,

    /// Run a mock end-to-end self check
    Check {
        #[arg(short, long, conflicts_with = "all")]
        scenario: Option<String>,

        /// Check every scenario
        #[arg(long)]
        all: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            clog_error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the selected command. `Ok(false)` means it ran but did not succeed.
fn dispatch(cli: Cli) -> Result<bool> {
    chief::log::init(None, cli.debug);
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(path) = &config.log_file {
        chief::log::redirect(path);
    }
    clog!("Chief starting: {:?}", cli.command);

    match cli.command {
        Command::Scenarios => {
            print!("{}", render::format_scenarios());
            Ok(true)
        }
        Command::Plan { scenario, json } => {
            let scenario = resolve_scenario(scenario.as_deref(), &config)?;
            let plan = scenario::plan(scenario, &config.planner)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print!("{}", render::format_plan(&plan));
            }
            Ok(true)
        }
        Command::Run {
            scenario,
            mock,
            live,
            budget,
            timeout,
            verbose,
            json,
        } => {
            if let Some(s) = scenario {
                config.scenario = s.parse()?;
            }
            if mock {
                config.mock = true;
            }
            if live {
                config.mock = false;
            }
            if let Some(budget) = budget {
                config.budget = budget;
            }
            if let Some(timeout) = timeout {
                config.timeout_secs = timeout;
            }
            config.verbose |= verbose;
            run_scenario(&config, json)
        }
        Command::Check { scenario, all } => {
            let scenarios = if all {
                Scenario::all().to_vec()
            } else {
                vec![resolve_scenario(scenario.as_deref(), &config)?]
            };
            config.mock = true;
            run_checks(&config, &scenarios)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env()?;
    Ok(config)
}

fn resolve_scenario(flag: Option<&str>, config: &Config) -> Result<Scenario> {
    match flag {
        Some(s) => s.parse(),
        None => Ok(config.scenario),
    }
}

fn run_scenario(config: &Config, json: bool) -> Result<bool> {
    config.validate()?;
    chief::log::set_echo(config.verbose);
    let plan = scenario::plan(config.scenario, &config.planner)?;
    let orchestrator = orchestrator_for(config)?;

    if !json {
        println!(
            "Running '{}' ({} tasks, budget ${:.2}, {} mode)",
            plan.scenario,
            plan.tasks.len(),
            config.budget,
            if config.mock { "mock" } else { "live" }
        );
    }

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(async {
        let mut runner = ScenarioRunner::new(orchestrator, config.timeout());
        runner
            .run(&plan, |event| {
                if json {
                    return;
                }
                if let Some(line) = render::format_event(event, config.verbose) {
                    println!("  {}", line);
                }
            })
            .await
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!();
        print!("{}", render::format_outcome(&outcome));
    }
    Ok(outcome.is_success())
}

fn run_checks(config: &Config, scenarios: &[Scenario]) -> Result<bool> {
    config.validate()?;
    let rt = tokio::runtime::Runtime::new()?;
    let mut passed = true;

    for &scenario in scenarios {
        let plan = scenario::plan(scenario, &config.planner)?;
        let orchestrator = orchestrator_for(config)?;
        let report = rt.block_on(async {
            ScenarioRunner::new(orchestrator, CHECK_TIMEOUT)
                .check(&plan)
                .await
        })?;
        print!("{}", render::format_check(&report));
        passed &= report.passed();
    }
    Ok(passed)
}
