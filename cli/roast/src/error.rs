//! Error handling and display for the CLI.

use colored::Colorize;
use roast_testing::{ConfigError, SetupError, CONFIG_PATH_ENV, ENV_PREFIX};
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("no scenario matches {0:?}")]
    NothingSelected(String),

    #[error("{failed} of {total} scenarios failed")]
    ScenariosFailed { failed: usize, total: usize },

    #[error("cleanup failed for {0} resource(s)")]
    CleanupFailed(usize),
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    if let Some(hint) = hint(err) {
        eprintln!("\n{}", format!("Hint: {hint}").yellow());
    }
}

fn hint(err: &anyhow::Error) -> Option<String> {
    if let Some(config_err) = err.downcast_ref::<ConfigError>() {
        return match config_err {
            ConfigError::Missing(key) => Some(format!(
                "Set {ENV_PREFIX}{} or add `{key}` to the file named by {CONFIG_PATH_ENV}.",
                key.to_uppercase()
            )),
            ConfigError::Read { .. } | ConfigError::Parse { .. } => {
                Some(format!("Check the file named by {CONFIG_PATH_ENV}."))
            }
            ConfigError::InvalidValue { .. } => None,
        };
    }

    if err.downcast_ref::<SetupError>().is_some() {
        return Some("Check compute_url and events_url.".to_string());
    }

    match err.downcast_ref::<CliError>()? {
        CliError::NothingSelected(_) => Some("Run `roast list` to see scenario tags.".to_string()),
        CliError::ScenariosFailed { .. } => {
            Some("Rerun with RUST_LOG=debug for per-attempt poll logs.".to_string())
        }
        CliError::CleanupFailed(_) => {
            Some("Servers may have been left behind; delete them by hand.".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_hint_names_env_var() {
        let err = anyhow::Error::new(ConfigError::Missing("image_ref"));
        let hint = hint(&err).unwrap();
        assert!(hint.contains("ROAST_IMAGE_REF"), "{hint}");
    }

    #[test]
    fn test_failed_run_has_hint() {
        let err = anyhow::Error::new(CliError::ScenariosFailed {
            failed: 1,
            total: 7,
        });
        assert_eq!(err.to_string(), "1 of 7 scenarios failed");
        assert!(hint(&err).is_some());
    }

    #[test]
    fn test_unrelated_error_has_no_hint() {
        assert!(hint(&anyhow::anyhow!("boom")).is_none());
    }
}
