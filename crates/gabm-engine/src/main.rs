//! Command-line runner for the GABM opinion simulation.
//!
//! # Startup Sequence
//!
//! 1. Resolve the config path: first CLI argument, else `GABM_CONFIG`,
//!    else `gabm-config.yaml` when it exists, else built-in defaults
//! 2. Load configuration
//! 3. Initialize structured logging (tracing), level from config unless
//!    `RUST_LOG` is set
//! 4. Build the environment from config
//! 5. Run the configured number of rounds with seeded partner selection
//! 6. Log the result and optionally write the opinion history as JSON

mod error;

use std::path::{Path, PathBuf};

use gabm_agents::GroupRole;
use gabm_core::{RandomPartners, RunResult, SimulationConfig, run_rounds, scenario};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Environment variable naming the config file.
const CONFIG_ENV_VAR: &str = "GABM_CONFIG";

/// Config file looked for in the working directory.
const DEFAULT_CONFIG_FILE: &str = "gabm-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, scenario setup, the run, or writing
/// the history fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1-2. Resolve and load configuration.
    let path = resolve_config_path(
        std::env::args().nth(1),
        std::env::var(CONFIG_ENV_VAR).ok(),
        Path::new(DEFAULT_CONFIG_FILE).exists(),
    );
    let config = load_config(path.as_deref())?;

    // 3. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        config = ?path,
        seed = config.world.seed,
        current_year = config.world.current_year,
        place = %config.world.place,
        rounds = config.rounds,
        population = config.population(),
        "gabm-engine starting"
    );

    // 4. Build the environment.
    let mut scenario = scenario::build(&config).map_err(EngineError::from)?;
    info!(
        agents = scenario.env.agents().count(),
        groups = scenario.env.groups().count(),
        fixed = scenario.env.agents_with_role(GroupRole::Fixed).len(),
        mutable = scenario.env.agents_with_role(GroupRole::Mutable).len(),
        "Scenario built"
    );

    // 5. Run.
    let mut partners = RandomPartners::new(config.world.seed);
    let result = run_rounds(&mut scenario, config.rounds, &mut partners).map_err(EngineError::from)?;

    // 6. Report.
    log_run_end(&result, scenario.env.warnings().len());
    if let Some(history_path) = config.output.history_path.as_deref() {
        write_history(&result, history_path)?;
        info!(path = %history_path.display(), snapshots = result.history.len(), "History written");
    }

    Ok(())
}

/// Pick the config file: CLI argument, then the environment variable, then
/// the default file when it exists. `None` means built-in defaults.
fn resolve_config_path(
    cli_arg: Option<String>,
    env_var: Option<String>,
    default_exists: bool,
) -> Option<PathBuf> {
    cli_arg
        .filter(|s| !s.is_empty())
        .or_else(|| env_var.filter(|s| !s.is_empty()))
        .map(PathBuf::from)
        .or_else(|| default_exists.then(|| PathBuf::from(DEFAULT_CONFIG_FILE)))
}

/// Load configuration from `path`, or defaults when there is none.
fn load_config(path: Option<&Path>) -> Result<SimulationConfig, EngineError> {
    match path {
        Some(p) => Ok(SimulationConfig::from_file(p)?),
        None => Ok(SimulationConfig::default()),
    }
}

/// Log the end of the run.
fn log_run_end(result: &RunResult, warnings: usize) {
    match result.final_summary() {
        Some(summary) => {
            for (topic, mean) in &summary.means {
                info!(
                    rounds = result.summaries.len(),
                    topic = %topic,
                    mean,
                    mutable_mean = summary.mutable_means.get(topic),
                    warnings,
                    "Simulation ended"
                );
            }
        }
        None => warn!("Simulation ended with no rounds executed"),
    }
}

/// Write the opinion history as pretty-printed JSON.
fn write_history(result: &RunResult, path: &Path) -> Result<(), EngineError> {
    let json = result.history.to_json()?;
    let output_err = |e: std::io::Error| EngineError::Output {
        path: path.display().to_string(),
        message: e.to_string(),
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(output_err)?;
    }
    std::fs::write(path, json).map_err(output_err)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn s(value: &str) -> Option<String> {
        Some(value.to_owned())
    }

    #[test]
    fn cli_argument_wins() {
        let path = resolve_config_path(s("a.yaml"), s("b.yaml"), true);
        assert_eq!(path, Some(PathBuf::from("a.yaml")));
    }

    #[test]
    fn env_var_before_default_file() {
        assert_eq!(
            resolve_config_path(None, s("b.yaml"), true),
            Some(PathBuf::from("b.yaml"))
        );
        assert_eq!(
            resolve_config_path(s(""), s("b.yaml"), false),
            Some(PathBuf::from("b.yaml"))
        );
    }

    #[test]
    fn default_file_then_builtin_defaults() {
        assert_eq!(
            resolve_config_path(None, None, true),
            Some(PathBuf::from(DEFAULT_CONFIG_FILE))
        );
        assert_eq!(resolve_config_path(None, s(""), false), None);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/gabm-config.yaml")));
        assert!(matches!(result, Err(EngineError::Config { .. })));
        assert!(load_config(None).is_ok());
    }

    #[test]
    fn history_is_written_as_json() {
        let config = SimulationConfig::default();
        let mut scenario = scenario::build(&config).unwrap();
        let mut partners = RandomPartners::new(config.world.seed);
        let result = run_rounds(&mut scenario, 2, &mut partners).unwrap();

        let dir = std::env::temp_dir().join(format!("gabm-engine-{}", std::process::id()));
        let path = dir.join("nested").join("history.json");
        write_history(&result, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: gabm_types::OpinionHistory = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, result.history);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
