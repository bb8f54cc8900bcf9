//! Event store access.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use roast_poll::{retry_until, Observation, PollConfig, PollError};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::EventStoreError;
use crate::types::{DeleteEntry, EventKind, ExistsEntry, LaunchEntry, ServerEvents};

/// Read access to the usage records of a server.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn launches(&self, instance: &str) -> Result<Vec<LaunchEntry>, EventStoreError>;

    async fn deletes(&self, instance: &str) -> Result<Vec<DeleteEntry>, EventStoreError>;

    async fn exists(&self, instance: &str) -> Result<Vec<ExistsEntry>, EventStoreError>;

    /// Fetch every record kind for `instance`.
    async fn server_events(&self, instance: &str) -> Result<ServerEvents, EventStoreError> {
        Ok(ServerEvents {
            instance: instance.to_string(),
            launches: self.launches(instance).await?,
            deletes: self.deletes(instance).await?,
            exists: self.exists(instance).await?,
        })
    }
}

/// Poll until at least one launch record exists for `instance`, then fetch
/// all of its records.
///
/// Records are written asynchronously from the compute service's
/// notifications, so they can lag the server reaching ACTIVE.
pub async fn wait_for_launch(
    store: &dyn EventStore,
    instance: &str,
    poll: &PollConfig,
) -> Result<ServerEvents, PollError> {
    let what = format!("launch entry for {instance}");
    retry_until(poll, &what, move || async move {
        let launches = store.launches(instance).await?;
        let observation = if launches.is_empty() {
            Observation::Pending("no launch entries".to_string())
        } else {
            Observation::Matched(())
        };
        Ok::<_, EventStoreError>(observation)
    })
    .await?;

    store.server_events(instance).await.map_err(|e| PollError::Source {
        what,
        source: Box::new(e),
    })
}

// =============================================================================
// HTTP Store
// =============================================================================

/// Event store reached over its HTTP query API
/// (`GET {base}/db/usage/{launches|deletes|exists}/?instance={id}`).
#[derive(Debug, Clone)]
pub struct HttpEventStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEventStore {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, EventStoreError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| EventStoreError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        kind: EventKind,
        instance: &str,
    ) -> Result<Vec<T>, EventStoreError> {
        let url = format!("{}/db/usage/{}/", self.base_url, kind.collection());
        debug!(url = %url, instance = %instance, "Fetching usage records");

        let response = self
            .client
            .get(&url)
            .query(&[("instance", instance)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EventStoreError::Status {
                status: status.as_u16(),
                what: format!("{kind} entries for {instance}"),
            });
        }

        let body = response.bytes().await?;
        let entries: Vec<T> = serde_json::from_slice(&body)?;
        debug!(kind = %kind, instance = %instance, count = entries.len(), "Fetched usage records");
        Ok(entries)
    }
}

#[async_trait]
impl EventStore for HttpEventStore {
    async fn launches(&self, instance: &str) -> Result<Vec<LaunchEntry>, EventStoreError> {
        self.fetch(EventKind::Launch, instance).await
    }

    async fn deletes(&self, instance: &str) -> Result<Vec<DeleteEntry>, EventStoreError> {
        self.fetch(EventKind::Delete, instance).await
    }

    async fn exists(&self, instance: &str) -> Result<Vec<ExistsEntry>, EventStoreError> {
        self.fetch(EventKind::Exists, instance).await
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// In-memory event store for testing and development.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    records: Mutex<HashMap<String, ServerEvents>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_server<R>(&self, instance: &str, f: impl FnOnce(&mut ServerEvents) -> R) -> R {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let events = records
            .entry(instance.to_string())
            .or_insert_with(|| ServerEvents {
                instance: instance.to_string(),
                ..Default::default()
            });
        f(events)
    }

    pub fn record_launch(&self, entry: LaunchEntry) {
        let instance = entry.instance.clone();
        self.with_server(&instance, |events| events.launches.push(entry));
    }

    pub fn record_delete(&self, entry: DeleteEntry) {
        let instance = entry.instance.clone();
        self.with_server(&instance, |events| events.deletes.push(entry));
    }

    pub fn record_exists(&self, entry: ExistsEntry) {
        let instance = entry.instance.clone();
        self.with_server(&instance, |events| events.exists.push(entry));
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn launches(&self, instance: &str) -> Result<Vec<LaunchEntry>, EventStoreError> {
        Ok(self.with_server(instance, |events| events.launches.clone()))
    }

    async fn deletes(&self, instance: &str) -> Result<Vec<DeleteEntry>, EventStoreError> {
        Ok(self.with_server(instance, |events| events.deletes.clone()))
    }

    async fn exists(&self, instance: &str) -> Result<Vec<ExistsEntry>, EventStoreError> {
        Ok(self.with_server(instance, |events| events.exists.clone()))
    }
}
