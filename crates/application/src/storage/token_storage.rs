//! Session token persistence with an optional cloud mirror.

use std::sync::Arc;

use parking_lot::Mutex;
use tally_domain::{StorageKey, token_preview};
use tokio::sync::watch;

use super::AppStorage;
use crate::ports::CloudStorage;

/// Reads and writes the session token.
///
/// The local settings object is the source of truth for reads. Writes are
/// mirrored into cloud storage when the platform supports it, so a session
/// survives a reinstall of the client.
///
/// Cloud operations run in the order they were issued, including removals
/// left running in the background, so a stale removal never deletes a
/// newer token.
#[derive(Clone)]
pub struct TokenStorage {
    storage: Arc<AppStorage>,
    cloud: Arc<dyn CloudStorage>,
    /// Last queued cloud operation; its sender is dropped when it finishes.
    cloud_queue: Arc<Mutex<Option<watch::Receiver<()>>>>,
}

impl TokenStorage {
    /// Creates a token storage on top of the shared settings object.
    #[must_use]
    pub fn new(storage: Arc<AppStorage>, cloud: Arc<dyn CloudStorage>) -> Self {
        Self {
            storage,
            cloud,
            cloud_queue: Arc::new(Mutex::new(None)),
        }
    }

    /// Pulls the token from cloud storage into the local store, if present.
    pub async fn init(&self) {
        if !self.cloud.is_supported() {
            return;
        }
        let pending = self.cloud_queue.lock().clone();
        wait_for(pending).await;

        match self.cloud.get_item(StorageKey::AccessToken.as_str()).await {
            Ok(Some(token)) if !token.is_empty() => {
                tracing::debug!(token = %token_preview(&token), "Token restored from cloud storage");
                self.storage.set(StorageKey::AccessToken, Some(&token));
            }
            Ok(_) => {}
            Err(error) => tracing::warn!(%error, "Cloud storage read failed"),
        }
    }

    /// Returns the stored session token.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.storage.get(StorageKey::AccessToken)
    }

    /// Stores `token` locally and mirrors a present token to the cloud.
    pub async fn set_access_token(&self, token: Option<&str>) {
        self.storage.set(StorageKey::AccessToken, token.as_ref());

        let Some(token) = token else {
            return;
        };
        if !self.cloud.is_supported() {
            return;
        }

        let (_done, previous) = self.enqueue();
        wait_for(previous).await;
        if let Err(error) = self
            .cloud
            .set_item(StorageKey::AccessToken.as_str(), token)
            .await
        {
            tracing::warn!(%error, "Cloud storage write failed");
        }
    }

    /// Removes the token from the local store only.
    pub fn remove_local(&self) {
        self.storage.delete(StorageKey::AccessToken);
    }

    /// Removes the token from the cloud mirror only.
    pub async fn remove_cloud(&self) {
        if !self.cloud.is_supported() {
            return;
        }
        let (_done, previous) = self.enqueue();
        wait_for(previous).await;
        self.remove_cloud_item().await;
    }

    /// Queues removal of the cloud token and returns without waiting.
    ///
    /// Later cloud writes wait for the removal to land. Without a tokio
    /// runtime the cloud token is left in place.
    pub fn remove_cloud_in_background(&self) {
        if !self.cloud.is_supported() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No runtime, cloud token left in place");
            return;
        };

        let (done, previous) = self.enqueue();
        let tokens = self.clone();
        runtime.spawn(async move {
            wait_for(previous).await;
            tokens.remove_cloud_item().await;
            drop(done);
        });
    }

    /// Takes the next place in the cloud queue.
    ///
    /// Returns the sender to drop once the operation is done, and the
    /// operation to wait for first.
    fn enqueue(&self) -> (watch::Sender<()>, Option<watch::Receiver<()>>) {
        let (done, finished) = watch::channel(());
        let previous = self.cloud_queue.lock().replace(finished);
        (done, previous)
    }

    async fn remove_cloud_item(&self) {
        if let Err(error) = self
            .cloud
            .remove_item(StorageKey::AccessToken.as_str())
            .await
        {
            tracing::warn!(%error, "Cloud storage remove failed");
        }
    }

    /// Removes the token everywhere.
    pub async fn remove_access_token(&self) {
        self.remove_local();
        self.remove_cloud().await;
    }
}

/// Waits until the sender of `pending` is dropped.
async fn wait_for(pending: Option<watch::Receiver<()>>) {
    if let Some(mut pending) = pending {
        // only ever errors, once the operation drops its sender
        while pending.changed().await.is_ok() {}
    }
}

impl std::fmt::Debug for TokenStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStorage")
            .field("has_token", &self.access_token().is_some())
            .field("cloud_supported", &self.cloud.is_supported())
            .finish()
    }
}
