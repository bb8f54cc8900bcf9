//! Per-suite context handed to every scenario.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use roast_compute::{ComputeClient, ComputeError, HttpComputeClient, Server, ServerBehaviors};
use roast_events::{EventStore, EventStoreError, HttpEventStore, InMemoryEventStore};
use roast_net::{NetworkError, PingProber, RemoteAccessCheck, SshBannerCheck};
use roast_poll::{PollConfig, PollError, ReachabilityProbe, ReachabilityVerifier};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::{ConfigError, RoastConfig};
use crate::registry::{CleanupReport, ResourceRegistry};
use crate::simulated::SimulatedCompute;

/// Reachability probe shared by all suites.
pub type DynProbe = Arc<dyn ReachabilityProbe<Error = NetworkError>>;

/// Errors building the services for a run.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("compute client: {0}")]
    Compute(#[from] ComputeError),

    #[error("event store client: {0}")]
    Events(#[from] EventStoreError),
}

/// External services the scenarios talk to.
#[derive(Clone)]
pub struct Services {
    pub compute: Arc<dyn ComputeClient>,
    pub prober: DynProbe,
    pub remote_access: Arc<dyn RemoteAccessCheck>,
    /// Absent when no event store is configured.
    pub events: Option<Arc<dyn EventStore>>,
}

impl Services {
    /// Clients for a live deployment.
    pub fn live(config: &RoastConfig) -> Result<Self, SetupError> {
        let compute = HttpComputeClient::new(
            &config.compute_url,
            config.auth_token.as_deref(),
            config.request_timeout(),
        )?;

        let events = match &config.events_url {
            Some(url) => Some(Arc::new(HttpEventStore::new(url, config.request_timeout())?)
                as Arc<dyn EventStore>),
            None => None,
        };

        Ok(Self {
            compute: Arc::new(compute),
            prober: Arc::new(PingProber::default()),
            remote_access: Arc::new(SshBannerCheck::new(
                config.ssh_port,
                config.request_timeout(),
            )),
            events,
        })
    }

    /// Services backed by an in-memory control plane.
    pub fn simulated(
        compute: Arc<SimulatedCompute>,
        events: Option<Arc<InMemoryEventStore>>,
    ) -> Self {
        Self {
            compute: Arc::clone(&compute) as Arc<dyn ComputeClient>,
            prober: Arc::clone(&compute) as DynProbe,
            remote_access: compute,
            events: events.map(|store| store as Arc<dyn EventStore>),
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("events", &self.events.is_some())
            .finish_non_exhaustive()
    }
}

/// Everything one suite's scenarios share.
///
/// A suite's server is created on first use and deleted by [`Self::teardown`],
/// so scenarios of the same suite run against the same server while
/// different suites never see each other's.
pub struct SuiteContext {
    name: String,
    services: Services,
    behaviors: ServerBehaviors,
    reachability: ReachabilityVerifier<DynProbe>,
    ping_poll: PollConfig,
    event_poll: PollConfig,
    launched_at_tolerance: Duration,
    registry: ResourceRegistry,
    server: OnceCell<Server>,
}

impl SuiteContext {
    pub fn new(
        name: impl Into<String>,
        config: &RoastConfig,
        services: Services,
    ) -> Result<Self, ConfigError> {
        let behaviors =
            ServerBehaviors::new(Arc::clone(&services.compute), config.behavior_settings()?);

        Ok(Self {
            name: name.into(),
            reachability: ReachabilityVerifier::new(Arc::clone(&services.prober)),
            behaviors,
            services,
            ping_poll: config.ping_poll(),
            event_poll: config.status_poll(),
            launched_at_tolerance: config.launched_at_tolerance(),
            registry: ResourceRegistry::new(),
            server: OnceCell::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &Arc<dyn ComputeClient> {
        &self.services.compute
    }

    pub fn behaviors(&self) -> &ServerBehaviors {
        &self.behaviors
    }

    pub fn reachability(&self) -> &ReachabilityVerifier<DynProbe> {
        &self.reachability
    }

    /// Timing of reachability waits.
    pub fn ping_poll(&self) -> &PollConfig {
        &self.ping_poll
    }

    /// Timing of waits for event records to appear.
    pub fn event_poll(&self) -> &PollConfig {
        &self.event_poll
    }

    pub fn launched_at_tolerance(&self) -> Duration {
        self.launched_at_tolerance
    }

    pub fn events(&self) -> Option<&dyn EventStore> {
        self.services.events.as_deref()
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// The suite's ACTIVE server, created on first call.
    ///
    /// The server is registered for cleanup before waiting on it, so a
    /// server that never becomes ACTIVE is still deleted.
    pub async fn server(&self) -> Result<&Server, ComputeError> {
        self.server
            .get_or_try_init(|| async {
                let created = self.behaviors.create_server().await?;
                self.registry
                    .register_server(Arc::clone(&self.services.compute), created.id.clone());
                self.behaviors.wait_for_active(created).await
            })
            .await
    }

    /// Address of `server` on the configured network.
    pub fn accessible_ip(&self, server: &Server) -> Result<IpAddr, ComputeError> {
        self.behaviors.get_accessible_ip_address(server)
    }

    pub async fn wait_until_unreachable(&self, addr: IpAddr) -> Result<(), PollError> {
        self.reachability
            .wait_until_unreachable(addr, &self.ping_poll)
            .await
    }

    pub async fn wait_until_reachable(&self, addr: IpAddr) -> Result<(), PollError> {
        self.reachability
            .wait_until_reachable(addr, &self.ping_poll)
            .await
    }

    /// Confirm `server` accepts remote logins on its accessible address.
    pub async fn verify_remote_access(&self, server: &Server) -> Result<(), ComputeError> {
        let addr = self.accessible_ip(server)?;
        self.services.remote_access.check(addr).await?;
        Ok(())
    }

    /// Delete everything the suite created.
    pub async fn teardown(&self) -> CleanupReport {
        let report = self.registry.cleanup().await;
        info!(
            suite = %self.name,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "Suite cleanup finished"
        );
        report
    }
}

impl std::fmt::Debug for SuiteContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteContext")
            .field("name", &self.name)
            .field("server", &self.server.get().map(|s| &s.id))
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
