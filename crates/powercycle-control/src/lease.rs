//! Per-resource transition leases.
//!
//! The controller assumes it is the only writer for a resource while a
//! transition runs. Within one process this is enforced here: a lease is
//! taken before the initial state query and released when the transition
//! ends, whatever its outcome. A second request for the same resource fails
//! fast with `ControlError::LeaseHeld` instead of interleaving commands.
//!
//! Leases are in-memory only. Multiple processes driving the same resource
//! still need an external lock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use powercycle_core::{LifecycleState, ResourceId, TransitionOutcome, TransitionRequest};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{ControlError, Result};
use crate::service::TransitionEngine;

/// A held lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lease {
    /// Unique token identifying this holder.
    pub token: Uuid,
    /// When the lease was taken.
    pub acquired_at: DateTime<Utc>,
}

/// Registry of held leases keyed by resource.
#[derive(Debug, Default)]
pub struct LeaseRegistry {
    held: Mutex<HashMap<ResourceId, Lease>>,
}

impl LeaseRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lease for `resource_id`.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::LeaseHeld` if another holder has it.
    pub fn acquire(self: &Arc<Self>, resource_id: &ResourceId) -> Result<LeaseGuard> {
        let mut held = self.held.lock();
        if held.contains_key(resource_id) {
            return Err(ControlError::LeaseHeld(resource_id.clone()));
        }

        let lease = Lease {
            token: Uuid::new_v4(),
            acquired_at: Utc::now(),
        };
        held.insert(resource_id.clone(), lease);
        tracing::debug!(resource_id = %resource_id, token = %lease.token, "Lease acquired");

        Ok(LeaseGuard {
            registry: Arc::clone(self),
            resource_id: resource_id.clone(),
            lease,
        })
    }

    /// The current lease for `resource_id`, if any.
    #[must_use]
    pub fn holder(&self, resource_id: &ResourceId) -> Option<Lease> {
        self.held.lock().get(resource_id).copied()
    }

    /// Number of leases currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.held.lock().len()
    }

    /// Whether no lease is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.lock().is_empty()
    }

    fn release(&self, resource_id: &ResourceId, token: Uuid) {
        let mut held = self.held.lock();
        // Only remove our own entry.
        if held.get(resource_id).is_some_and(|l| l.token == token) {
            held.remove(resource_id);
            tracing::debug!(resource_id = %resource_id, token = %token, "Lease released");
        }
    }
}

/// Releases the lease on drop.
#[derive(Debug)]
pub struct LeaseGuard {
    registry: Arc<LeaseRegistry>,
    resource_id: ResourceId,
    lease: Lease,
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        self.registry.release(&self.resource_id, self.lease.token);
    }
}

/// Wraps an engine so that at most one transition runs per resource.
pub struct LeasedEngine<E: TransitionEngine> {
    inner: E,
    leases: Arc<LeaseRegistry>,
}

impl<E: TransitionEngine> LeasedEngine<E> {
    /// Wrap `inner` with a fresh lease registry.
    #[must_use]
    pub fn new(inner: E) -> Self {
        Self::with_registry(inner, Arc::new(LeaseRegistry::new()))
    }

    /// Wrap `inner` sharing an existing registry.
    #[must_use]
    pub fn with_registry(inner: E, leases: Arc<LeaseRegistry>) -> Self {
        Self { inner, leases }
    }

    /// The lease registry.
    #[must_use]
    pub fn leases(&self) -> &Arc<LeaseRegistry> {
        &self.leases
    }
}

#[async_trait]
impl<E: TransitionEngine> TransitionEngine for LeasedEngine<E> {
    async fn execute(
        &self,
        request: &TransitionRequest,
        cancel: &CancellationToken,
    ) -> TransitionOutcome {
        let _guard = match self.leases.acquire(&request.resource_id) {
            Ok(guard) => guard,
            Err(e) => {
                let held_since = self
                    .leases
                    .holder(&request.resource_id)
                    .map(|lease| lease.acquired_at);
                tracing::warn!(
                    resource_id = %request.resource_id,
                    kind = %request.kind,
                    held_since = ?held_since,
                    "Transition refused, lease held"
                );
                return e.to_outcome(request.resource_id.as_str());
            }
        };

        self.inner.execute(request, cancel).await
    }

    async fn describe(&self, resource_id: &ResourceId) -> Result<LifecycleState> {
        self.inner.describe(resource_id).await
    }
}
