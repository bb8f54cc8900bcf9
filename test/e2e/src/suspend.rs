//! Suspend and resume, and what a suspended server refuses.

use roast_compute::{RebootType, Server, ServerStatus, ACCEPTED};
use roast_testing::SuiteContext;
use tracing::info;

use crate::error::ScenarioError;

/// Suspend `server`, wait for SUSPENDED, then wait for its address to stop
/// answering.
async fn suspend_until_unreachable(
    ctx: &SuiteContext,
    server: &Server,
) -> Result<std::net::IpAddr, ScenarioError> {
    let addr = ctx.accessible_ip(server)?;

    ctx.client()
        .suspend(&server.id)
        .await?
        .expect_status(ACCEPTED)?;
    ctx.behaviors()
        .wait_for_server_status(&server.id, ServerStatus::Suspended)
        .await?;
    ctx.wait_until_unreachable(addr).await?;
    info!(server_id = %server.id, address = %addr, "Server suspended and unreachable");

    Ok(addr)
}

/// A server can be suspended and then resumed.
///
/// After suspending, the server reports SUSPENDED and its address stops
/// answering. After resuming, it reports ACTIVE, answers again and accepts
/// remote logins.
pub async fn suspend_resume_server(ctx: &SuiteContext) -> Result<(), ScenarioError> {
    let server = ctx.server().await?;
    let addr = suspend_until_unreachable(ctx, server).await?;

    ctx.client()
        .resume(&server.id)
        .await?
        .expect_status(ACCEPTED)?;
    ctx.behaviors()
        .wait_for_server_status(&server.id, ServerStatus::Active)
        .await?;
    ctx.wait_until_reachable(addr).await?;
    ctx.verify_remote_access(server).await?;
    info!(server_id = %server.id, "Server resumed");

    Ok(())
}

/// A hard reboot does not bring a suspended server back.
///
/// The reboot must be refused as a conflicting action, and the address must
/// stay unreachable.
pub async fn suspend_reboot_hard_server(ctx: &SuiteContext) -> Result<(), ScenarioError> {
    let server = ctx.server().await?;
    let addr = suspend_until_unreachable(ctx, server).await?;

    match ctx.client().reboot(&server.id, RebootType::Hard).await {
        Err(e) if e.is_action_in_progress() => {
            info!(server_id = %server.id, error = %e, "Reboot refused");
        }
        Err(e) => return Err(e.into()),
        Ok(response) => {
            return Err(ScenarioError::ExpectedConflict {
                action: "reboot(HARD)".to_string(),
                status: response.status,
            })
        }
    }

    ctx.wait_until_unreachable(addr).await?;
    Ok(())
}
