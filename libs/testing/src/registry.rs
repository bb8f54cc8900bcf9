//! Cleanup of resources created during a run.

use std::future::Future;
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use roast_compute::ComputeClient;
use roast_id::ServerId;
use tracing::{info, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

type Deleter = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), BoxError>> + Send>;

struct Registration {
    resource_id: String,
    deleter: Deleter,
}

/// Outcome of [`ResourceRegistry::cleanup`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted: Vec<String>,
    /// Resource ID and error message for each failed deleter.
    pub failed: Vec<(String, String)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Resources to delete when a suite finishes.
///
/// Deleters run in reverse registration order. A failing deleter is logged
/// and the rest still run.
#[derive(Default)]
pub struct ResourceRegistry {
    entries: Mutex<Vec<Registration>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `deleter` to run for `resource_id` at cleanup.
    pub fn register<F, Fut, E>(&self, resource_id: impl Into<String>, deleter: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let resource_id = resource_id.into();
        info!(resource_id = %resource_id, "Registered resource for cleanup");
        let deleter: Deleter =
            Box::new(move || Box::pin(async move { deleter().await.map_err(Into::into) }));
        self.lock().push(Registration {
            resource_id,
            deleter,
        });
    }

    /// Register a server to be deleted through `client`.
    ///
    /// A server that is already gone counts as deleted.
    pub fn register_server(&self, client: Arc<dyn ComputeClient>, id: ServerId) {
        self.register(id.to_string(), move || async move {
            match client.delete_server(&id).await {
                Ok(_) => Ok(()),
                Err(e) if e.is_not_found() => Ok(()),
                Err(e) => Err(e),
            }
        });
    }

    /// Number of resources awaiting cleanup.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run and drop every registered deleter, newest first.
    pub async fn cleanup(&self) -> CleanupReport {
        let entries = std::mem::take(&mut *self.lock());
        let mut report = CleanupReport::default();

        for Registration {
            resource_id,
            deleter,
        } in entries.into_iter().rev()
        {
            match deleter().await {
                Ok(()) => {
                    info!(resource_id = %resource_id, "Deleted resource");
                    report.deleted.push(resource_id);
                }
                Err(e) => {
                    warn!(resource_id = %resource_id, error = %e, "Failed to delete resource");
                    report.failed.push((resource_id, e.to_string()));
                }
            }
        }

        report
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Registration>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<String> = self.lock().iter().map(|r| r.resource_id.clone()).collect();
        f.debug_struct("ResourceRegistry")
            .field("resources", &ids)
            .finish()
    }
}
