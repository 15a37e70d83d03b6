//! Scripted compute API for testing.
//!
//! [`MockCompute`] keeps a per-resource state plus a queue of observations
//! that the next `describe_state` calls return in order. Once the queue is
//! drained the last observed state is repeated. Scripts registered with
//! [`MockCompute::on_stop`] / [`MockCompute::on_start`] are appended to the
//! queue whenever the matching command is accepted, which models the
//! asynchronous, eventually consistent control plane.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use powercycle_core::{LifecycleState, ResourceId};

use crate::compute::ComputeApi;
use crate::error::{ControlError, Result};
use crate::executor::Action;

/// One scripted answer to a state query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The query succeeds and reports this state.
    State(LifecycleState),
    /// The query fails with a transient error.
    Unavailable,
}

impl From<LifecycleState> for Observation {
    fn from(state: LifecycleState) -> Self {
        Self::State(state)
    }
}

/// A scripted compute API.
#[derive(Debug, Default)]
pub struct MockCompute {
    resources: Mutex<HashMap<ResourceId, MockResource>>,
}

#[derive(Debug)]
struct MockResource {
    state: LifecycleState,
    queued: VecDeque<Observation>,
    on_stop: Vec<Observation>,
    on_start: Vec<Observation>,
    refusal: Option<String>,
    describe_calls: usize,
    stop_calls: usize,
    start_calls: usize,
}

impl MockResource {
    fn new(state: LifecycleState) -> Self {
        Self {
            state,
            queued: VecDeque::new(),
            on_stop: Vec::new(),
            on_start: Vec::new(),
            refusal: None,
            describe_calls: 0,
            stop_calls: 0,
            start_calls: 0,
        }
    }
}

impl MockCompute {
    /// Create an empty mock that knows no resources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource in the given state.
    #[must_use]
    pub fn with_resource(self, resource_id: ResourceId, state: LifecycleState) -> Self {
        self.insert(resource_id, state);
        self
    }

    /// Register (or reset) a resource in the given state.
    pub fn insert(&self, resource_id: ResourceId, state: LifecycleState) {
        self.resources
            .lock()
            .insert(resource_id, MockResource::new(state));
    }

    /// Queue observations returned by the next state queries.
    pub fn queue<I, O>(&self, resource_id: &ResourceId, observations: I)
    where
        I: IntoIterator<Item = O>,
        O: Into<Observation>,
    {
        self.with(resource_id, |r| {
            r.queued.extend(observations.into_iter().map(Into::into));
        });
    }

    /// Observations queued each time a stop is accepted.
    pub fn on_stop<I, O>(&self, resource_id: &ResourceId, observations: I)
    where
        I: IntoIterator<Item = O>,
        O: Into<Observation>,
    {
        self.with(resource_id, |r| {
            r.on_stop = observations.into_iter().map(Into::into).collect();
        });
    }

    /// Observations queued each time a start is accepted.
    pub fn on_start<I, O>(&self, resource_id: &ResourceId, observations: I)
    where
        I: IntoIterator<Item = O>,
        O: Into<Observation>,
    {
        self.with(resource_id, |r| {
            r.on_start = observations.into_iter().map(Into::into).collect();
        });
    }

    /// Make every stop and start for the resource fail with `message`.
    pub fn refuse_actions(&self, resource_id: &ResourceId, message: impl Into<String>) {
        let message = message.into();
        self.with(resource_id, |r| r.refusal = Some(message));
    }

    /// Number of state queries made for the resource.
    #[must_use]
    pub fn describe_calls(&self, resource_id: &ResourceId) -> usize {
        self.resources
            .lock()
            .get(resource_id)
            .map_or(0, |r| r.describe_calls)
    }

    /// Number of stop commands issued for the resource, refused or not.
    #[must_use]
    pub fn stop_calls(&self, resource_id: &ResourceId) -> usize {
        self.resources
            .lock()
            .get(resource_id)
            .map_or(0, |r| r.stop_calls)
    }

    /// Number of start commands issued for the resource, refused or not.
    #[must_use]
    pub fn start_calls(&self, resource_id: &ResourceId) -> usize {
        self.resources
            .lock()
            .get(resource_id)
            .map_or(0, |r| r.start_calls)
    }

    fn with(&self, resource_id: &ResourceId, f: impl FnOnce(&mut MockResource)) {
        if let Some(resource) = self.resources.lock().get_mut(resource_id) {
            f(resource);
        }
    }

    fn command(&self, resource_id: &ResourceId, action: Action) -> Result<()> {
        let mut resources = self.resources.lock();
        let resource = resources
            .get_mut(resource_id)
            .ok_or_else(|| ControlError::ResourceNotFound(resource_id.clone()))?;

        let script = match action {
            Action::Stop => {
                resource.stop_calls += 1;
                resource.on_stop.clone()
            }
            Action::Start => {
                resource.start_calls += 1;
                resource.on_start.clone()
            }
        };

        if let Some(message) = &resource.refusal {
            return Err(ControlError::ActionRejected {
                resource_id: resource_id.clone(),
                action,
                message: message.clone(),
            });
        }

        resource.queued.extend(script);
        Ok(())
    }
}

#[async_trait]
impl ComputeApi for MockCompute {
    async fn describe_state(&self, resource_id: &ResourceId) -> Result<LifecycleState> {
        let mut resources = self.resources.lock();
        let resource = resources
            .get_mut(resource_id)
            .ok_or_else(|| ControlError::ResourceNotFound(resource_id.clone()))?;

        resource.describe_calls += 1;
        match resource.queued.pop_front() {
            Some(Observation::State(state)) => {
                resource.state = state;
                Ok(state)
            }
            Some(Observation::Unavailable) => Err(ControlError::TransientQuery {
                resource_id: resource_id.clone(),
                message: "compute API unavailable".to_string(),
            }),
            None => Ok(resource.state),
        }
    }

    async fn stop(&self, resource_id: &ResourceId) -> Result<()> {
        self.command(resource_id, Action::Stop)
    }

    async fn start(&self, resource_id: &ResourceId) -> Result<()> {
        self.command(resource_id, Action::Start)
    }
}
