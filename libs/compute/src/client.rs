//! Compute client interface.

use async_trait::async_trait;
use roast_id::ServerId;
use roast_poll::StatusSource;

use crate::error::ComputeError;
use crate::types::{
    ActionResponse, CreateServerRequest, CreatedServer, RebootType, Server, ServerAction,
    ServerStatus,
};

/// Operations a lifecycle scenario performs against the compute API.
#[async_trait]
pub trait ComputeClient: Send + Sync {
    /// Create a server. Returns as soon as the API accepts the request.
    async fn create_server(
        &self,
        request: &CreateServerRequest,
    ) -> Result<CreatedServer, ComputeError>;

    /// Fetch the server document.
    async fn get_server(&self, id: &ServerId) -> Result<Server, ComputeError>;

    /// Delete a server.
    async fn delete_server(&self, id: &ServerId) -> Result<ActionResponse, ComputeError>;

    /// Post an action to the server.
    async fn server_action(
        &self,
        id: &ServerId,
        action: ServerAction,
    ) -> Result<ActionResponse, ComputeError>;

    /// Fetch only the status label.
    async fn get_status(&self, id: &ServerId) -> Result<ServerStatus, ComputeError> {
        Ok(self.get_server(id).await?.status)
    }

    async fn pause(&self, id: &ServerId) -> Result<ActionResponse, ComputeError> {
        self.server_action(id, ServerAction::Pause).await
    }

    async fn unpause(&self, id: &ServerId) -> Result<ActionResponse, ComputeError> {
        self.server_action(id, ServerAction::Unpause).await
    }

    async fn suspend(&self, id: &ServerId) -> Result<ActionResponse, ComputeError> {
        self.server_action(id, ServerAction::Suspend).await
    }

    async fn resume(&self, id: &ServerId) -> Result<ActionResponse, ComputeError> {
        self.server_action(id, ServerAction::Resume).await
    }

    async fn reboot(
        &self,
        id: &ServerId,
        kind: RebootType,
    ) -> Result<ActionResponse, ComputeError> {
        self.server_action(id, ServerAction::Reboot(kind)).await
    }
}

#[async_trait]
impl<'c> StatusSource for dyn ComputeClient + 'c {
    type Id = ServerId;
    type State = ServerStatus;
    type Error = ComputeError;

    async fn current_status(&self, id: &ServerId) -> Result<ServerStatus, ComputeError> {
        self.get_status(id).await
    }
}
