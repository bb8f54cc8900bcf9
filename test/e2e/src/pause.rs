//! Pause and unpause.

use roast_compute::{ServerStatus, ACCEPTED};
use roast_testing::SuiteContext;
use tracing::info;

use crate::error::ScenarioError;

/// A server can be paused and then unpaused.
///
/// Both actions must answer 202, and the server must report PAUSED and then
/// ACTIVE again.
pub async fn pause_unpause_server(ctx: &SuiteContext) -> Result<(), ScenarioError> {
    let server = ctx.server().await?;
    let behaviors = ctx.behaviors();

    ctx.client().pause(&server.id).await?.expect_status(ACCEPTED)?;
    behaviors
        .wait_for_server_status(&server.id, ServerStatus::Paused)
        .await?;
    info!(server_id = %server.id, "Server paused");

    ctx.client()
        .unpause(&server.id)
        .await?
        .expect_status(ACCEPTED)?;
    behaviors
        .wait_for_server_status(&server.id, ServerStatus::Active)
        .await?;
    info!(server_id = %server.id, "Server unpaused");

    Ok(())
}
