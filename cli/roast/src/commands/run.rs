//! Run a scenario selection.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use roast_e2e::{Outcome, RunOptions, RunReport};
use roast_events::InMemoryEventStore;
use roast_id::{FlavorId, ImageId};
use roast_testing::{RoastConfig, Services, SimulatedCompute, TagFilter};
use serde::Serialize;
use tabled::Tabled;
use tracing::info;

use crate::error::CliError;
use crate::output::{
    print_failure, print_json, print_output, print_success, print_warning, OutputFormat,
};

use super::CommandContext;

/// State changes settle this fast on the in-memory control plane.
const SIMULATED_SETTLE: Duration = Duration::from_secs(2);

/// Run scenarios.
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Tag filter, e.g. `type=smoke,net=no`. Repeating a key matches either value.
    #[arg(long)]
    tags: Option<TagFilter>,

    /// Stop after the first failing scenario.
    #[arg(long)]
    fail_fast: bool,

    /// Run against an in-memory control plane instead of `compute_url`.
    #[arg(long)]
    simulated: bool,
}

/// One scenario result row.
#[derive(Debug, Clone, Serialize, Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Scenario")]
    name: &'static str,

    #[tabled(rename = "Suite")]
    suite: &'static str,

    #[tabled(rename = "Result")]
    result: &'static str,

    #[tabled(rename = "Time")]
    time: String,

    #[tabled(rename = "Error")]
    error: String,
}

impl From<&Outcome> for OutcomeRow {
    fn from(outcome: &Outcome) -> Self {
        Self {
            name: outcome.name,
            suite: outcome.suite,
            result: if outcome.passed { "PASS" } else { "FAIL" },
            time: format!("{:.1}s", outcome.duration.as_secs_f64()),
            error: outcome.error.clone().unwrap_or_default(),
        }
    }
}

impl RunCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let filter = self.tags.unwrap_or_default();
        let scenarios = roast_e2e::select(&filter);
        if scenarios.is_empty() {
            return Err(CliError::NothingSelected(filter.to_string()).into());
        }

        let mut config = RoastConfig::load()?;
        let services = if self.simulated {
            simulated_services(&mut config)?
        } else {
            Services::live(&config)?
        };

        info!(
            scenarios = scenarios.len(),
            simulated = self.simulated,
            compute_url = %config.compute_url,
            "Starting run"
        );

        let options = RunOptions {
            fail_fast: self.fail_fast,
        };
        let report = roast_e2e::run(&scenarios, &config, &services, options)
            .await
            .context("failed to set up suite")?;

        print_report(&report, ctx.format);
        verdict(&report)
    }
}

/// In-memory services. Fills in the image and flavor when unset and
/// shortens poll intervals to match the faster settle time.
fn simulated_services(config: &mut RoastConfig) -> Result<Services> {
    if config.image_ref.is_none() {
        config.image_ref = Some(ImageId::parse("simulated-image")?);
    }
    if config.flavor_ref.is_none() {
        config.flavor_ref = Some(FlavorId::parse("simulated-flavor")?);
    }
    config.server_status_interval_secs = 1;
    config.ping_interval_secs = 1;

    let store = Arc::new(InMemoryEventStore::new());
    let compute = SimulatedCompute::new()
        .with_settle(SIMULATED_SETTLE)
        .with_network(config.network_name.clone())
        .with_events(Arc::clone(&store));

    Ok(Services::simulated(Arc::new(compute), Some(store)))
}

fn print_report(report: &RunReport, format: OutputFormat) {
    if format == OutputFormat::Json {
        print_json(report);
        return;
    }

    let rows: Vec<OutcomeRow> = report.outcomes.iter().map(OutcomeRow::from).collect();
    print_output(&rows, format);

    for (resource, error) in &report.cleanup_failures {
        print_warning(&format!("cleanup of {resource} failed: {error}"));
    }
    if report.stopped_early {
        print_warning("stopped after the first failure (--fail-fast)");
    }

    let summary = format!("{} passed, {} failed", report.passed(), report.failed());
    if report.is_success() {
        print_success(&summary);
    } else {
        print_failure(&summary);
    }
}

fn verdict(report: &RunReport) -> Result<()> {
    if report.failed() > 0 {
        return Err(CliError::ScenariosFailed {
            failed: report.failed(),
            total: report.outcomes.len(),
        }
        .into());
    }
    if !report.cleanup_failures.is_empty() {
        return Err(CliError::CleanupFailed(report.cleanup_failures.len()).into());
    }
    Ok(())
}
