//! In-memory Event Store
//!
//! Append-only event log keyed by aggregate id, with a global version counter,
//! optimistic concurrency control and snapshot storage.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{DomainEvent, OperationContext};

use super::EventStoreError;

/// Default number of aggregate versions between two snapshots
pub const DEFAULT_SNAPSHOT_INTERVAL: u64 = 10;

/// Event as persisted in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<E> {
    pub id: Uuid,
    pub aggregate_id: String,
    pub aggregate_type: String,
    pub event_type: String,
    pub data: E,
    /// Global version, strictly increasing across all aggregates
    pub version: u64,
    /// 1-based position within the aggregate's own stream
    pub stream_version: u64,
    pub context: OperationContext,
    pub timestamp: DateTime<Utc>,
}

/// Event waiting to be appended
#[derive(Debug, Clone)]
pub struct NewEvent<E> {
    pub id: Option<Uuid>,
    pub aggregate_id: String,
    pub aggregate_type: String,
    pub data: E,
    pub context: OperationContext,
    pub timestamp: Option<DateTime<Utc>>,
}

impl<E: DomainEvent> NewEvent<E> {
    /// Create a new event for an aggregate
    pub fn new(aggregate_type: &str, aggregate_id: impl Into<String>, data: E) -> Self {
        Self {
            id: None,
            aggregate_id: aggregate_id.into(),
            aggregate_type: aggregate_type.to_string(),
            data,
            context: OperationContext::default(),
            timestamp: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_context(mut self, context: OperationContext) -> Self {
        self.context = context;
        self
    }
}

/// Materialized aggregate state at a given version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub aggregate_id: String,
    pub aggregate_type: String,
    /// Global version of the last event folded into `state`
    pub version: u64,
    pub stream_version: u64,
    pub state: serde_json::Value,
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug)]
struct StoreState<E> {
    streams: HashMap<String, Vec<Event<E>>>,
    snapshots: HashMap<String, Snapshot>,
    last_version: u64,
}

/// Event Store for persisting and retrieving events
///
/// Construct one per ledger and share it by `Arc`; there is no global state.
#[derive(Debug)]
pub struct EventStore<E> {
    state: RwLock<StoreState<E>>,
    snapshot_interval: u64,
}

impl<E: DomainEvent> Default for EventStore<E> {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_INTERVAL)
    }
}

impl<E: DomainEvent> EventStore<E> {
    /// Create an empty store. A `snapshot_interval` of 0 disables snapshots.
    pub fn new(snapshot_interval: u64) -> Self {
        Self {
            state: RwLock::new(StoreState {
                streams: HashMap::new(),
                snapshots: HashMap::new(),
                last_version: 0,
            }),
            snapshot_interval,
        }
    }

    pub fn snapshot_interval(&self) -> u64 {
        self.snapshot_interval
    }

    // =========================================================================
    // Appending
    // =========================================================================

    /// Append one event, expecting the aggregate stream to hold exactly
    /// `expected_version` events.
    pub fn append_event(
        &self,
        event: NewEvent<E>,
        expected_version: u64,
    ) -> Result<Event<E>, EventStoreError> {
        let aggregate_id = event.aggregate_id.clone();
        let mut stored = self.append_events(&aggregate_id, expected_version, vec![event])?;
        stored
            .pop()
            .ok_or_else(|| EventStoreError::InvalidEventData("no event appended".to_string()))
    }

    /// Atomically append a batch of events to one aggregate.
    ///
    /// The expected version is checked once under the write lock; either every
    /// event is appended or none is.
    pub fn append_events(
        &self,
        aggregate_id: &str,
        expected_version: u64,
        events: Vec<NewEvent<E>>,
    ) -> Result<Vec<Event<E>>, EventStoreError> {
        if aggregate_id.is_empty() {
            return Err(EventStoreError::InvalidEventData(
                "aggregate id must not be empty".to_string(),
            ));
        }
        if let Some(foreign) = events.iter().find(|e| e.aggregate_id != aggregate_id) {
            return Err(EventStoreError::InvalidEventData(format!(
                "event for aggregate {} in batch for {}",
                foreign.aggregate_id, aggregate_id
            )));
        }

        let mut state = self.state.write();

        let current_version = state
            .streams
            .get(aggregate_id)
            .map_or(0, |stream| stream.len() as u64);

        if current_version != expected_version {
            tracing::warn!(
                aggregate_id,
                expected = expected_version,
                actual = current_version,
                "Rejected append: concurrency conflict"
            );
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id: aggregate_id.to_string(),
                expected: expected_version,
                actual: current_version,
            });
        }

        let mut appended = Vec::with_capacity(events.len());
        let mut last_version = state.last_version;
        let mut stream_version = current_version;

        for new_event in events {
            last_version += 1;
            stream_version += 1;

            appended.push(Event {
                id: new_event.id.unwrap_or_else(Uuid::new_v4),
                aggregate_id: new_event.aggregate_id,
                aggregate_type: new_event.aggregate_type,
                event_type: new_event.data.event_type().to_string(),
                data: new_event.data,
                version: last_version,
                stream_version,
                context: new_event.context,
                timestamp: new_event.timestamp.unwrap_or_else(Utc::now),
            });
        }

        state.last_version = last_version;
        state
            .streams
            .entry(aggregate_id.to_string())
            .or_default()
            .extend(appended.iter().cloned());

        tracing::debug!(
            "Appended {} event(s) to {} (stream version {}, global version {})",
            appended.len(),
            aggregate_id,
            stream_version,
            last_version
        );

        Ok(appended)
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Get all events for an aggregate, in append order
    pub fn get_events(&self, aggregate_id: &str) -> Vec<Event<E>> {
        self.state
            .read()
            .streams
            .get(aggregate_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Get the events of an aggregate whose global version exceeds `version`
    pub fn get_events_since(&self, aggregate_id: &str, version: u64) -> Vec<Event<E>> {
        self.state
            .read()
            .streams
            .get(aggregate_id)
            .map(|stream| {
                stream
                    .iter()
                    .filter(|event| event.version > version)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get every stored event across all aggregates, ordered by global version
    pub fn get_all_events(&self) -> Vec<Event<E>> {
        let mut events: Vec<Event<E>> = self
            .state
            .read()
            .streams
            .values()
            .flat_map(|stream| stream.iter().cloned())
            .collect();
        events.sort_by_key(|event| event.version);
        events
    }

    /// Number of events stored for an aggregate
    pub fn current_version(&self, aggregate_id: &str) -> u64 {
        self.state
            .read()
            .streams
            .get(aggregate_id)
            .map_or(0, |stream| stream.len() as u64)
    }

    /// Highest global version handed out so far
    pub fn last_version(&self) -> u64 {
        self.state.read().last_version
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Store a snapshot, replacing any previous one for the aggregate
    pub fn save_snapshot(&self, snapshot: Snapshot) -> Result<(), EventStoreError> {
        let mut state = self.state.write();

        let points_at_event = state
            .streams
            .get(&snapshot.aggregate_id)
            .is_some_and(|stream| stream.iter().any(|e| e.version == snapshot.version));

        if !points_at_event {
            return Err(EventStoreError::InvalidSnapshot {
                aggregate_id: snapshot.aggregate_id,
                version: snapshot.version,
            });
        }

        state
            .snapshots
            .insert(snapshot.aggregate_id.clone(), snapshot);
        Ok(())
    }

    /// Get the latest snapshot for an aggregate
    pub fn get_snapshot(&self, aggregate_id: &str) -> Option<Snapshot> {
        self.state.read().snapshots.get(aggregate_id).cloned()
    }
}
