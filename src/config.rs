use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::orchestration::SimulationConfig;
use crate::scenario::{PlannerConfig, Scenario};
use crate::{clog_debug, Error, Result};

/// Environment variables that can hold the API key for live runs.
pub const API_KEY_VARS: [&str; 2] = ["CHIEF_API_KEY", "ANTHROPIC_API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub scenario: Scenario,
    /// Use the in-process simulated orchestrator.
    pub mock: bool,
    /// Spending limit in USD.
    pub budget: f64,
    pub timeout_secs: u64,
    pub verbose: bool,
    pub log_file: Option<PathBuf>,
    pub planner: PlannerConfig,
    pub simulation: SimulationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scenario: Scenario::Basic,
            mock: true,
            budget: 10.0,
            timeout_secs: 300,
            verbose: false,
            log_file: None,
            planner: PlannerConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Config {
    pub fn chief_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".chief"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::chief_dir()?.join("chief.toml"))
    }

    /// Load from the default location, or defaults when the file is absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        clog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            clog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        clog_debug!(
            "Config loaded: scenario={}, mock={}, budget={}, timeout={}s",
            config.scenario,
            config.mock,
            config.budget,
            config.timeout_secs
        );
        Ok(config)
    }

    /// Apply `CHIEF_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` to read variables.
    ///
    /// # Errors
    /// `Configuration` when a variable is set to an unparseable value.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CHIEF_SCENARIO") {
            self.scenario = v.parse()?;
        }
        if let Some(v) = lookup("CHIEF_MOCK") {
            self.mock = parse_bool("CHIEF_MOCK", &v)?;
        }
        if let Some(v) = lookup("CHIEF_BUDGET") {
            self.budget = v
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("CHIEF_BUDGET is not a number: '{}'", v)))?;
        }
        if let Some(v) = lookup("CHIEF_TIMEOUT") {
            self.timeout_secs = v.trim().parse().map_err(|_| {
                Error::config(format!("CHIEF_TIMEOUT is not a whole number of seconds: '{}'", v))
            })?;
        }
        if let Some(v) = lookup("CHIEF_VERBOSE") {
            self.verbose = parse_bool("CHIEF_VERBOSE", &v)?;
        }
        Ok(())
    }

    /// Check the settings a run depends on.
    pub fn validate(&self) -> Result<()> {
        if !self.budget.is_finite() || self.budget <= 0.0 {
            return Err(Error::config(format!(
                "budget must be a positive amount, got {}",
                self.budget
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("timeout must be at least one second"));
        }
        if self.simulation.max_concurrent == 0 {
            return Err(Error::config("simulation.max_concurrent must be at least 1"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Simulation settings with the run budget applied.
    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            budget_limit: Some(self.budget),
            ..self.simulation.clone()
        }
    }

    /// API key for live runs, read through `lookup`.
    pub fn api_key_with<F>(lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        API_KEY_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .find(|v| !v.trim().is_empty())
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::config(format!(
            "{} must be true or false, got '{}'",
            name, other
        ))),
    }
}
