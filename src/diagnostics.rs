//! Reporting of failures the synchronization engine recovers from.
//!
//! Discovery never aborts on a single bad service or operation; each such
//! case is handed to a [`SyncReporter`] so operators and tests can see it.

use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Something a discovery or reconciliation pass swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Listing the services of a deployment space failed.
    ScopeEnumerationFailed { space: String, error: String },
    /// A service descriptor could not be fetched (transport error or incident).
    DescriptorFetchFailed {
        space: String,
        service_id: String,
        error: String,
    },
    /// One declared operation was not translated.
    OperationSkipped {
        service_id: String,
        location: String,
        reason: String,
    },
    /// A schema reference cycle was replaced by an empty schema.
    SchemaCycle {
        service_id: String,
        operation_id: String,
        reference: String,
    },
    /// The tool name override lookup failed; default names were used.
    OverrideLookupFailed { service_id: String, error: String },
    /// Two candidates of one pass share a name; the later one was dropped.
    DuplicateCandidate { name: String, service_id: String },
    /// A whole pass failed; the registry keeps whatever state it reached.
    PassFailed { error: String },
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScopeEnumerationFailed { space, error } => {
                write!(f, "cannot list decision services in '{space}': {error}")
            }
            Self::DescriptorFetchFailed {
                space,
                service_id,
                error,
            } => write!(f, "cannot fetch descriptor of '{service_id}' in '{space}': {error}"),
            Self::OperationSkipped {
                service_id,
                location,
                reason,
            } => write!(f, "skipped {location} of '{service_id}': {reason}"),
            Self::SchemaCycle {
                service_id,
                operation_id,
                reference,
            } => write!(
                f,
                "reference cycle at {reference} in {service_id}/{operation_id}, replaced by an empty schema"
            ),
            Self::OverrideLookupFailed { service_id, error } => {
                write!(f, "tool name override lookup failed for '{service_id}': {error}")
            }
            Self::DuplicateCandidate { name, service_id } => {
                write!(f, "tool '{name}' from '{service_id}' duplicates an earlier tool, dropped")
            }
            Self::PassFailed { error } => write!(f, "tool synchronization pass failed: {error}"),
        }
    }
}

/// Sink for [`SyncEvent`]s.
pub trait SyncReporter: Send + Sync {
    fn report(&self, event: SyncEvent);
}

/// Default reporter: one `warn!` line per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl SyncReporter for TracingReporter {
    fn report(&self, event: SyncEvent) {
        warn!("{}", event);
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    events: Arc<Mutex<Vec<SyncEvent>>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events reported so far.
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl SyncReporter for CollectingReporter {
    fn report(&self, event: SyncEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
