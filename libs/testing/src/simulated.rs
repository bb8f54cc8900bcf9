//! In-memory compute control plane for exercising scenarios without a
//! deployment.
//!
//! Actions are accepted immediately and take effect once `settle` has passed
//! on the tokio clock, so tests running with a paused clock observe the same
//! status sequence a real deployment would report. Only ACTIVE servers answer
//! probes. When an event store is attached, servers leave launch and delete
//! records in it the way the real notification pipeline would.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use roast_compute::{
    ActionResponse, ComputeClient, ComputeError, CreateServerRequest, CreatedServer, RebootType,
    ResourceRef, Server, ServerAction, ServerStatus, ACCEPTED,
};
use roast_events::{DeleteEntry, InMemoryEventStore, LaunchEntry};
use roast_id::{random_name, RequestId, ServerId};
use roast_net::{AddressEntry, IpVersion, NetworkError, RemoteAccessCheck, DEFAULT_SSH_PORT};
use roast_poll::ReachabilityProbe;
use tokio::time::Instant;
use tracing::{debug, info};

/// Default time an accepted action takes to complete.
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(12);

const NO_CONTENT: u16 = 204;

/// A transition that has been accepted but not yet completed.
#[derive(Debug, Clone)]
struct PendingTransition {
    task: &'static str,
    target: ServerStatus,
    /// `None` when the settle time runs past the end of the clock.
    completes_at: Option<Instant>,
}

#[derive(Debug)]
struct SimServer {
    document: Server,
    pending: Option<PendingTransition>,
}

#[derive(Debug, Default)]
struct State {
    servers: HashMap<ServerId, SimServer>,
    addresses: HashMap<IpAddr, ServerId>,
    next_host: u32,
    next_record: i64,
    actions: Vec<(ServerId, String)>,
}

/// Simulated compute API.
#[derive(Debug)]
pub struct SimulatedCompute {
    state: Mutex<State>,
    settle: Duration,
    tenant_id: String,
    network_name: String,
    events: Option<Arc<InMemoryEventStore>>,
}

impl Default for SimulatedCompute {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCompute {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            settle: DEFAULT_SETTLE,
            tenant_id: "5820".to_string(),
            network_name: "public".to_string(),
            events: None,
        }
    }

    /// Time between accepting an action and reporting its target status.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Network servers' addresses are reported on.
    pub fn with_network(mut self, name: impl Into<String>) -> Self {
        self.network_name = name.into();
        self
    }

    /// Record launch and delete events into `store`.
    pub fn with_events(mut self, store: Arc<InMemoryEventStore>) -> Self {
        self.events = Some(store);
        self
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Force a server into `status`, dropping any in-flight transition.
    pub fn set_status(&self, id: &ServerId, status: ServerStatus) -> Result<(), ComputeError> {
        let mut state = self.lock();
        let server = state
            .servers
            .get_mut(id)
            .ok_or_else(|| not_found(id))?;
        server.pending = None;
        server.document.status = status;
        Ok(())
    }

    /// Number of servers that exist.
    pub fn server_count(&self) -> usize {
        self.lock().servers.len()
    }

    pub fn contains(&self, id: &ServerId) -> bool {
        self.lock().servers.contains_key(id)
    }

    /// Actions accepted so far, in order, as `(server, action name)`.
    pub fn actions(&self) -> Vec<(ServerId, String)> {
        self.lock().actions.clone()
    }

    fn completion_time(&self) -> Option<Instant> {
        Instant::now().checked_add(self.settle)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Complete the server's pending transition if it is due.
    fn settle_server(&self, state: &mut State, id: &ServerId) {
        let now = Instant::now();
        let Some(server) = state.servers.get_mut(id) else {
            return;
        };
        let due = server
            .pending
            .as_ref()
            .is_some_and(|p| p.completes_at.is_some_and(|at| at <= now));
        if !due {
            return;
        }
        let Some(pending) = server.pending.take() else {
            return;
        };

        debug!(
            server_id = %id,
            task = pending.task,
            status = %pending.target,
            "[SIM] Transition complete"
        );
        server.document.status = pending.target;

        if server.document.status == ServerStatus::Active && server.document.launched_at.is_none()
        {
            let launched_at = Utc::now();
            server.document.launched_at = Some(launched_at);
            let document = server.document.clone();
            state.next_record += 1;
            let record_id = state.next_record;
            if let Some(events) = &self.events {
                events.record_launch(LaunchEntry {
                    id: Some(record_id),
                    instance: document.id.to_string(),
                    request_id: Some(RequestId::new().to_string()),
                    instance_type_id: document.flavor_id().map(ToString::to_string),
                    instance_flavor_id: document.flavor_id().map(ToString::to_string),
                    launched_at: Some(launched_at),
                    tenant: document.tenant_id.clone(),
                    os_architecture: Some("x64".to_string()),
                    os_distro: Some("org.ubuntu".to_string()),
                    os_version: Some("22.04".to_string()),
                    rax_options: Some("0".to_string()),
                });
            }
        }
    }

    fn allocate_addresses(&self, state: &mut State, id: &ServerId) -> Vec<AddressEntry> {
        state.next_host += 1;
        let host = state.next_host;
        let v4 = IpAddr::V4(Ipv4Addr::new(
            198,
            51,
            (host / 250) as u8 + 100,
            (host % 250) as u8 + 1,
        ));
        let v6 = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, host as u16 + 1));
        for addr in [v4, v6] {
            state.addresses.insert(addr, id.clone());
        }
        vec![
            AddressEntry {
                addr: v4,
                version: IpVersion::V4,
            },
            AddressEntry {
                addr: v6,
                version: IpVersion::V6,
            },
        ]
    }
}

fn not_found(id: &ServerId) -> ComputeError {
    ComputeError::NotFound(format!("server {id}"))
}

/// `(interim status, target status)` for `action` from `current`, or `None`
/// if the action is not allowed there.
fn plan(action: ServerAction, current: &ServerStatus) -> Option<(ServerStatus, ServerStatus)> {
    use ServerStatus::*;

    match (action, current) {
        (ServerAction::Pause, Active) => Some((Active, Paused)),
        (ServerAction::Unpause, Paused) => Some((Paused, Active)),
        (ServerAction::Suspend, Active) => Some((Active, Suspended)),
        (ServerAction::Resume, Suspended) => Some((Suspended, Active)),
        (ServerAction::Reboot(RebootType::Soft), Active) => Some((Reboot, Active)),
        (ServerAction::Reboot(RebootType::Hard), Active | Shutoff) => Some((HardReboot, Active)),
        _ => None,
    }
}

fn task_name(action: ServerAction) -> &'static str {
    match action {
        ServerAction::Pause => "pausing",
        ServerAction::Unpause => "unpausing",
        ServerAction::Suspend => "suspending",
        ServerAction::Resume => "resuming",
        ServerAction::Reboot(RebootType::Soft) => "rebooting",
        ServerAction::Reboot(RebootType::Hard) => "rebooting_hard",
    }
}

#[async_trait]
impl ComputeClient for SimulatedCompute {
    async fn create_server(
        &self,
        request: &CreateServerRequest,
    ) -> Result<CreatedServer, ComputeError> {
        let mut state = self.lock();
        let id = ServerId::random();
        let addresses = self.allocate_addresses(&mut state, &id);
        let admin_pass = random_name("pw");

        let document = Server {
            id: id.clone(),
            name: request.name.clone(),
            status: ServerStatus::Build,
            tenant_id: Some(self.tenant_id.clone()),
            image: Some(ResourceRef {
                id: request.image_ref.clone(),
            }),
            flavor: Some(ResourceRef {
                id: request.flavor_ref.clone(),
            }),
            addresses: [(self.network_name.clone(), addresses)].into_iter().collect(),
            created: Some(Utc::now()),
            launched_at: None,
            admin_pass: None,
        };
        state.servers.insert(
            id.clone(),
            SimServer {
                document,
                pending: Some(PendingTransition {
                    task: "spawning",
                    target: ServerStatus::Active,
                    completes_at: self.completion_time(),
                }),
            },
        );

        info!(server_id = %id, name = %request.name, "[SIM] Server accepted");
        Ok(CreatedServer {
            id,
            admin_pass: Some(admin_pass),
            status: ACCEPTED,
        })
    }

    async fn get_server(&self, id: &ServerId) -> Result<Server, ComputeError> {
        let mut state = self.lock();
        self.settle_server(&mut state, id);
        state
            .servers
            .get(id)
            .map(|s| s.document.clone())
            .ok_or_else(|| not_found(id))
    }

    async fn delete_server(&self, id: &ServerId) -> Result<ActionResponse, ComputeError> {
        let mut state = self.lock();
        let server = state.servers.remove(id).ok_or_else(|| not_found(id))?;
        state.addresses.retain(|_, owner| owner != id);

        if let (Some(events), Some(launched_at)) = (&self.events, server.document.launched_at) {
            state.next_record += 1;
            events.record_delete(DeleteEntry {
                id: Some(state.next_record),
                instance: id.to_string(),
                launched_at: Some(launched_at),
                deleted_at: Some(Utc::now()),
            });
        }

        info!(server_id = %id, "[SIM] Server deleted");
        Ok(ActionResponse::new(NO_CONTENT))
    }

    async fn server_action(
        &self,
        id: &ServerId,
        action: ServerAction,
    ) -> Result<ActionResponse, ComputeError> {
        let mut state = self.lock();
        self.settle_server(&mut state, id);
        let completes_at = self.completion_time();
        let server = state.servers.get_mut(id).ok_or_else(|| not_found(id))?;

        if let Some(pending) = &server.pending {
            return Err(ComputeError::ActionInProgress {
                message: format!(
                    "Cannot '{}' instance {id} while it is in task_state {}",
                    action.name(),
                    pending.task
                ),
            });
        }

        let (interim, target) = plan(action, &server.document.status).ok_or_else(|| {
            ComputeError::ActionInProgress {
                message: format!(
                    "Cannot '{}' instance {id} while it is in vm_state {}",
                    action.name(),
                    server.document.status.as_str().to_ascii_lowercase()
                ),
            }
        })?;

        server.document.status = interim;
        server.pending = Some(PendingTransition {
            task: task_name(action),
            target,
            completes_at,
        });
        state.actions.push((id.clone(), action.to_string()));

        info!(server_id = %id, action = %action, "[SIM] Action accepted");
        Ok(ActionResponse {
            status: ACCEPTED,
            request_id: Some(RequestId::new().to_string()),
        })
    }
}

#[async_trait]
impl ReachabilityProbe for SimulatedCompute {
    type Error = NetworkError;

    async fn probe(&self, addr: IpAddr) -> Result<bool, NetworkError> {
        let mut state = self.lock();
        let Some(id) = state.addresses.get(&addr).cloned() else {
            return Ok(false);
        };
        self.settle_server(&mut state, &id);
        Ok(state
            .servers
            .get(&id)
            .is_some_and(|s| s.document.status == ServerStatus::Active))
    }
}

#[async_trait]
impl RemoteAccessCheck for SimulatedCompute {
    async fn check(&self, addr: IpAddr) -> Result<(), NetworkError> {
        if self.probe(addr).await? {
            Ok(())
        } else {
            Err(NetworkError::RemoteAccess {
                addr: SocketAddr::new(addr, DEFAULT_SSH_PORT),
                message: "connection refused".to_string(),
            })
        }
    }
}
