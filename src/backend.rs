//! Per-credential backend instance cache.
//!
//! The cache maps a [`Credential`] to the [`BackendHandle`] built for it and
//! never evicts. Construction is serialized per key through a
//! `tokio::sync::OnceCell`: concurrent first-time callers for the same
//! credential all await one construction and observe the same instance,
//! while different credentials construct independently. A failed or
//! timed-out construction removes its empty cell, so nothing is kept for the
//! credential and the next caller retries.

use crate::capability::{BackendFactory, BackendHandle, Credential};
use crate::error::{Error, Result};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tracing;

type InstanceCell = Arc<OnceCell<BackendHandle>>;

/// Lazily constructed, process-lifetime backend instances keyed by credential.
pub struct InstanceCache {
    /// Builds a backend for a never-seen credential
    factory: Arc<dyn BackendFactory>,
    /// One construction cell per credential; the lock is only held to fetch a cell
    instances: Mutex<HashMap<Credential, InstanceCell>>,
    /// Upper bound on one construction attempt
    init_timeout: Duration,
}

impl InstanceCache {
    /// Create an empty cache around `factory`
    pub fn new(factory: Arc<dyn BackendFactory>, init_timeout: Duration) -> Self {
        Self {
            factory,
            instances: Mutex::new(HashMap::new()),
            init_timeout,
        }
    }

    /// Return the instance for `credential`, constructing it on first use.
    ///
    /// # Errors
    ///
    /// * [`Error::BackendConstruction`] when the factory fails
    /// * [`Error::Timeout`] when construction exceeds the configured bound
    ///
    /// Neither outcome is cached.
    pub async fn get_or_create(&self, credential: &Credential) -> Result<BackendHandle> {
        let cell = {
            let mut instances = self.instances.lock().await;
            instances
                .entry(credential.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        if let Some(instance) = cell.get() {
            tracing::trace!("Reusing cached backend instance");
            return Ok(instance.clone());
        }

        let outcome = cell
            .get_or_try_init(|| async {
                tracing::info!("Constructing backend instance for new credential");
                match tokio::time::timeout(self.init_timeout, self.factory.create(credential)).await
                {
                    Ok(Ok(instance)) => Ok(instance),
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "Backend construction failed");
                        Err(match e {
                            Error::BackendConstruction(msg) => Error::BackendConstruction(msg),
                            other => Error::BackendConstruction(other.to_string()),
                        })
                    }
                    Err(_) => {
                        tracing::warn!(
                            timeout_secs = self.init_timeout.as_secs(),
                            "Backend construction timed out"
                        );
                        Err(Error::Timeout(format!(
                            "Backend construction exceeded {:?}",
                            self.init_timeout
                        )))
                    }
                }
            })
            .await;

        match outcome {
            Ok(instance) => {
                // A waiter that retried after a failed attempt fills a cell
                // that may already have been dropped from the map
                self.instances
                    .lock()
                    .await
                    .entry(credential.clone())
                    .or_insert_with(|| cell.clone());
                Ok(instance.clone())
            }
            Err(e) => {
                self.forget_empty_cell(credential, &cell).await;
                Err(e)
            }
        }
    }

    /// Drop the map entry for `credential` if it still holds this empty cell.
    ///
    /// A concurrent retry may already have replaced or filled the entry; that
    /// entry is left alone.
    async fn forget_empty_cell(&self, credential: &Credential, cell: &InstanceCell) {
        let mut instances = self.instances.lock().await;
        let stale = instances
            .get(credential)
            .is_some_and(|current| Arc::ptr_eq(current, cell) && !current.initialized());
        if stale {
            instances.remove(credential);
        }
    }

    /// Number of constructed instances
    pub async fn len(&self) -> usize {
        let instances = self.instances.lock().await;
        instances.values().filter(|cell| cell.initialized()).count()
    }

    /// Whether no instance has been constructed yet
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Whether an instance exists for `credential`
    pub async fn contains(&self, credential: &Credential) -> bool {
        let instances = self.instances.lock().await;
        instances
            .get(credential)
            .is_some_and(|cell| cell.initialized())
    }
}
