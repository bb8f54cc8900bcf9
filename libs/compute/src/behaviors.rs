//! Composite server operations built from client calls and status waits.

use std::net::IpAddr;
use std::sync::Arc;

use roast_id::{random_name, FlavorId, ImageId, ServerId};
use roast_net::{select_accessible_address, IpVersion};
use roast_poll::{PollConfig, StateTransitionVerifier};
use tracing::info;

use crate::client::ComputeClient;
use crate::error::ComputeError;
use crate::types::{CreateServerRequest, CreatedServer, Server, ServerStatus};

/// Status code the API returns for accepted asynchronous requests.
pub const ACCEPTED: u16 = 202;

/// Settings the behaviors need beyond the client.
#[derive(Debug, Clone)]
pub struct BehaviorSettings {
    /// Timing of status waits.
    pub status_poll: PollConfig,

    /// Image for new servers.
    pub image_ref: ImageId,

    /// Flavor for new servers.
    pub flavor_ref: FlavorId,

    /// Prefix for generated server names.
    pub name_prefix: String,

    /// Network whose address is used to reach servers.
    pub network_name: String,

    /// IP version of the address used to reach servers.
    pub ip_version: IpVersion,
}

/// Server operations shared by all scenarios.
#[derive(Clone)]
pub struct ServerBehaviors {
    client: Arc<dyn ComputeClient>,
    verifier: StateTransitionVerifier<Arc<dyn ComputeClient>>,
    settings: BehaviorSettings,
}

impl ServerBehaviors {
    pub fn new(client: Arc<dyn ComputeClient>, settings: BehaviorSettings) -> Self {
        Self {
            verifier: StateTransitionVerifier::new(Arc::clone(&client)),
            client,
            settings,
        }
    }

    pub fn client(&self) -> &Arc<dyn ComputeClient> {
        &self.client
    }

    pub fn settings(&self) -> &BehaviorSettings {
        &self.settings
    }

    /// Wait until the server reports `expected`, using the configured timing.
    ///
    /// ERROR ends the wait early unless it is the expected status.
    pub async fn wait_for_server_status(
        &self,
        id: &ServerId,
        expected: ServerStatus,
    ) -> Result<(), ComputeError> {
        self.wait_for_server_status_with(id, expected, &self.settings.status_poll)
            .await
    }

    /// Wait until the server reports `expected`, using explicit timing.
    pub async fn wait_for_server_status_with(
        &self,
        id: &ServerId,
        expected: ServerStatus,
        poll: &PollConfig,
    ) -> Result<(), ComputeError> {
        let terminal: &[ServerStatus] = if expected == ServerStatus::Error {
            &[]
        } else {
            &[ServerStatus::Error]
        };

        self.verifier
            .wait_for_state_unless(id, &expected, terminal, poll)
            .await?;
        Ok(())
    }

    /// Create a server from the configured image and flavor and wait for it
    /// to become ACTIVE.
    ///
    /// The returned document carries the admin password from the create
    /// response. Registering the server for cleanup is the caller's job;
    /// callers that must register before waiting use [`Self::create_server`]
    /// and [`Self::wait_for_active`] instead.
    pub async fn create_active_server(&self) -> Result<Server, ComputeError> {
        let created = self.create_server().await?;
        self.wait_for_active(created).await
    }

    /// Request a new server; fails unless the API answers 202.
    pub async fn create_server(&self) -> Result<CreatedServer, ComputeError> {
        let request = CreateServerRequest {
            name: random_name(&self.settings.name_prefix),
            image_ref: self.settings.image_ref.clone(),
            flavor_ref: self.settings.flavor_ref.clone(),
        };
        info!(
            name = %request.name,
            image = %request.image_ref,
            flavor = %request.flavor_ref,
            "Creating server"
        );

        let created = self.client.create_server(&request).await?;
        if created.status != ACCEPTED {
            return Err(ComputeError::UnexpectedStatusCode {
                expected: ACCEPTED,
                actual: created.status,
            });
        }
        Ok(created)
    }

    /// Wait for a newly created server to become ACTIVE and fetch it.
    pub async fn wait_for_active(&self, created: CreatedServer) -> Result<Server, ComputeError> {
        self.wait_for_server_status(&created.id, ServerStatus::Active)
            .await?;

        let mut server = self.client.get_server(&created.id).await?;
        server.admin_pass = created.admin_pass;
        info!(server_id = %server.id, "Server active");
        Ok(server)
    }

    /// The address tests use to reach the server.
    pub fn get_accessible_ip_address(&self, server: &Server) -> Result<IpAddr, ComputeError> {
        Ok(select_accessible_address(
            &server.addresses,
            &self.settings.network_name,
            self.settings.ip_version,
        )?)
    }
}

impl std::fmt::Debug for ServerBehaviors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBehaviors")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
