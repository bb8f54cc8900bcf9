//! Sequential scenario runner.

use std::time::Duration;

use roast_testing::{ConfigError, RoastConfig, Services, SuiteContext};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::catalog::Scenario;

/// Result of one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub name: &'static str,
    pub suite: &'static str,
    pub passed: bool,
    /// Failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Results of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<Outcome>,
    /// Resources whose cleanup failed, with the error.
    pub cleanup_failures: Vec<(String, String)>,
    /// Set when `fail_fast` stopped the run early.
    pub stopped_early: bool,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    /// Every scenario passed and cleanup left nothing behind.
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.cleanup_failures.is_empty()
    }
}

/// Options for [`run`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Stop after the first failing scenario.
    pub fail_fast: bool,
}

/// Run `scenarios` in order.
///
/// Consecutive scenarios of the same suite share one [`SuiteContext`]; each
/// suite is torn down before the next starts, whether or not its scenarios
/// passed.
pub async fn run(
    scenarios: &[Scenario],
    config: &RoastConfig,
    services: &Services,
    options: RunOptions,
) -> Result<RunReport, ConfigError> {
    let mut report = RunReport::default();

    for group in scenarios.chunk_by(|a, b| a.suite == b.suite) {
        let suite = group[0].suite;
        let ctx = SuiteContext::new(suite, config, services.clone())?;
        info!(suite = %suite, scenarios = group.len(), "Starting suite");

        for scenario in group {
            let outcome = run_one(scenario, &ctx).await;
            let failed = !outcome.passed;
            report.outcomes.push(outcome);
            if failed && options.fail_fast {
                report.stopped_early = true;
                break;
            }
        }

        let cleanup = ctx.teardown().await;
        report.cleanup_failures.extend(cleanup.failed);

        if report.stopped_early {
            warn!(suite = %suite, "Stopping after first failure");
            break;
        }
    }

    info!(
        passed = report.passed(),
        failed = report.failed(),
        cleanup_failures = report.cleanup_failures.len(),
        "Run finished"
    );
    Ok(report)
}

async fn run_one(scenario: &Scenario, ctx: &SuiteContext) -> Outcome {
    let name = scenario.meta.name;
    info!(scenario = %name, "Running scenario");
    let start = Instant::now();

    let result = (scenario.run)(ctx).await;
    let duration = start.elapsed();

    match result {
        Ok(()) => {
            info!(scenario = %name, elapsed_ms = duration.as_millis() as u64, "Scenario passed");
            Outcome {
                name,
                suite: scenario.suite,
                passed: true,
                error: None,
                duration,
            }
        }
        Err(e) => {
            error!(scenario = %name, error = %e, elapsed_ms = duration.as_millis() as u64, "Scenario failed");
            Outcome {
                name,
                suite: scenario.suite,
                passed: false,
                error: Some(e.to_string()),
                duration,
            }
        }
    }
}
