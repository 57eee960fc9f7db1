use crate::domain::ports::{CrmClient, CrmContact};
use crate::error::AppError;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info_span, warn, Instrument};

/// Runs `fut` on its own task. The caller never sees the outcome; failures are logged.
pub fn spawn_detached<F>(task: &'static str, fut: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), AppError>> + Send + 'static,
{
    let span = info_span!("detached_task", task);
    tokio::spawn(
        async move {
            if let Err(e) = fut.await {
                warn!("Detached task failed: {}", e);
            }
        }
        .instrument(span),
    )
}

#[derive(Clone, Default)]
pub struct CrmDispatcher {
    client: Option<Arc<dyn CrmClient>>,
}

impl CrmDispatcher {
    pub fn new(client: Option<Arc<dyn CrmClient>>) -> Self {
        Self { client }
    }

    pub fn sync_contact(&self, contact: CrmContact) -> Option<JoinHandle<()>> {
        let client = self.client.clone()?;
        Some(spawn_detached("crm_sync", async move {
            client.upsert_contact(&contact).await
        }))
    }
}
