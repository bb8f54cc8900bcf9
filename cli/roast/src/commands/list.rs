//! List the scenario table.

use anyhow::Result;
use clap::Args;
use roast_e2e::Scenario;
use roast_testing::TagFilter;
use serde::Serialize;
use tabled::Tabled;

use crate::output::print_output;

use super::CommandContext;

/// List scenarios.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Tag filter, e.g. `type=smoke,net=no`. Repeating a key matches either value.
    #[arg(long)]
    tags: Option<TagFilter>,
}

/// One scenario row.
#[derive(Debug, Clone, Serialize, Tabled)]
struct ScenarioRow {
    #[tabled(rename = "Name")]
    name: &'static str,

    #[tabled(rename = "Suite")]
    suite: &'static str,

    #[tabled(rename = "Type")]
    #[serde(rename = "type")]
    category: &'static str,

    #[tabled(rename = "Net")]
    net: &'static str,

    #[tabled(rename = "Summary")]
    summary: &'static str,
}

impl From<&Scenario> for ScenarioRow {
    fn from(scenario: &Scenario) -> Self {
        Self {
            name: scenario.meta.name,
            suite: scenario.suite,
            category: scenario.meta.category.as_str(),
            net: scenario.meta.network.as_str(),
            summary: scenario.meta.summary,
        }
    }
}

impl ListCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let filter = self.tags.unwrap_or_default();
        let rows: Vec<ScenarioRow> = roast_e2e::select(&filter)
            .iter()
            .map(ScenarioRow::from)
            .collect();

        print_output(&rows, ctx.format);
        Ok(())
    }
}
