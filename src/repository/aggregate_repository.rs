//! Aggregate Repository
//!
//! Persists pending aggregate changes and rebuilds aggregates by replaying
//! events, starting from the latest snapshot when one exists.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;

use crate::aggregate::Aggregate;
use crate::domain::OperationContext;
use crate::event_store::{Event, EventStore, EventStoreError, NewEvent, Snapshot};

/// Repository for one aggregate type, backed by a shared event store
#[derive(Debug)]
pub struct Repository<A: Aggregate> {
    store: Arc<EventStore<A::Event>>,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A: Aggregate> Clone for Repository<A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _aggregate: PhantomData,
        }
    }
}

impl<A: Aggregate> Repository<A> {
    /// Create a new Repository over an event store
    pub fn new(store: Arc<EventStore<A::Event>>) -> Self {
        Self {
            store,
            _aggregate: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<EventStore<A::Event>> {
        &self.store
    }

    // =========================================================================
    // Saving
    // =========================================================================

    /// Persist the aggregate's pending changes
    pub fn save(&self, aggregate: &mut A) -> Result<Vec<Event<A::Event>>, EventStoreError> {
        self.save_with_context(aggregate, &OperationContext::default())
    }

    /// Persist the aggregate's pending changes, tagging each event with `context`.
    ///
    /// All changes are appended in one atomic batch guarded by the aggregate's
    /// committed version. Pending changes are cleared only on success.
    pub fn save_with_context(
        &self,
        aggregate: &mut A,
        context: &OperationContext,
    ) -> Result<Vec<Event<A::Event>>, EventStoreError> {
        if aggregate.uncommitted_changes().is_empty() {
            return Ok(Vec::new());
        }

        let aggregate_id = aggregate.id().to_string();
        let expected_version = aggregate.committed_version();

        let new_events = aggregate
            .uncommitted_changes()
            .iter()
            .cloned()
            .map(|data| {
                NewEvent::new(A::aggregate_type(), aggregate_id.as_str(), data)
                    .with_context(context.clone())
            })
            .collect();

        let stored = self
            .store
            .append_events(&aggregate_id, expected_version, new_events)?;

        aggregate.mark_changes_committed();

        if aggregate.should_snapshot(self.store.snapshot_interval()) {
            if let Some(last) = stored.last() {
                // Events are committed at this point; snapshot failures are only logged
                if let Err(e) = self.take_snapshot(aggregate, last.version) {
                    tracing::warn!(
                        "Snapshot failed for {} aggregate {}: {}",
                        A::aggregate_type(),
                        aggregate_id,
                        e
                    );
                }
            }
        }

        Ok(stored)
    }

    fn take_snapshot(&self, aggregate: &A, version: u64) -> Result<(), EventStoreError> {
        let state = serde_json::to_value(aggregate)?;

        self.store.save_snapshot(Snapshot {
            aggregate_id: aggregate.id().to_string(),
            aggregate_type: A::aggregate_type().to_string(),
            version,
            stream_version: aggregate.version(),
            state,
            taken_at: Utc::now(),
        })?;

        tracing::info!(
            "Snapshot saved for {} aggregate {} at version {}",
            A::aggregate_type(),
            aggregate.id(),
            aggregate.version()
        );

        Ok(())
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load an aggregate by replaying events (with snapshot optimization)
    pub fn get_by_id(&self, id: &str) -> Result<A, EventStoreError> {
        let Some(snapshot) = self.store.get_snapshot(id) else {
            return self.load_from_history(id);
        };

        let mut aggregate: A = serde_json::from_value(snapshot.state)?;
        let tail = self.store.get_events_since(id, snapshot.version);

        tracing::debug!(
            "Loading {} from snapshot at version {} plus {} event(s)",
            id,
            snapshot.stream_version,
            tail.len()
        );

        for event in &tail {
            aggregate.apply(&event.data);
        }

        Ok(aggregate)
    }

    /// Load an aggregate by replaying its full history, ignoring snapshots
    pub fn load_from_history(&self, id: &str) -> Result<A, EventStoreError> {
        let events = self.store.get_events(id);
        if events.is_empty() {
            return Err(EventStoreError::AggregateNotFound(id.to_string()));
        }

        let mut aggregate = A::with_id(id);
        for event in &events {
            aggregate.apply(&event.data);
        }

        Ok(aggregate)
    }
}
