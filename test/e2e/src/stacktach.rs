//! Usage records written for a newly created server.

use roast_events::{
    validate_attributes_in_launch_response, validate_launch_entry_field_values,
    validate_no_deletes_entry_returned, validate_no_exists_entry_returned, wait_for_launch,
    ExpectedLaunch, ServerEvents,
};
use roast_testing::SuiteContext;

use crate::error::ScenarioError;

/// Records for the suite server, once its launch has been recorded.
async fn server_events(ctx: &SuiteContext) -> Result<ServerEvents, ScenarioError> {
    let server = ctx.server().await?;
    let store = ctx.events().ok_or(ScenarioError::MissingEventStore)?;
    Ok(wait_for_launch(store, server.id.as_str(), ctx.event_poll()).await?)
}

/// The launch record is present with every attribute set.
pub async fn launch_entry_on_create_server_response(
    ctx: &SuiteContext,
) -> Result<(), ScenarioError> {
    let events = server_events(ctx).await?;
    validate_attributes_in_launch_response(&events)?;
    Ok(())
}

/// The launch record's values match the server.
pub async fn launch_entry_fields_on_create_server_response(
    ctx: &SuiteContext,
) -> Result<(), ScenarioError> {
    let events = server_events(ctx).await?;
    let server = ctx.server().await?;

    let flavor_id = server
        .flavor_id()
        .unwrap_or(&ctx.behaviors().settings().flavor_ref);
    let expected = ExpectedLaunch {
        instance: server.id.to_string(),
        flavor_id: flavor_id.to_string(),
        tenant_id: server.tenant_id.clone(),
        launched_at: server.launched_at,
    };

    validate_launch_entry_field_values(&events, &expected, ctx.launched_at_tolerance())?;
    Ok(())
}

pub async fn no_delete_entry_on_create_server_response(
    ctx: &SuiteContext,
) -> Result<(), ScenarioError> {
    validate_no_deletes_entry_returned(&server_events(ctx).await?)?;
    Ok(())
}

pub async fn no_exist_entry_on_create_server_response(
    ctx: &SuiteContext,
) -> Result<(), ScenarioError> {
    validate_no_exists_entry_returned(&server_events(ctx).await?)?;
    Ok(())
}
