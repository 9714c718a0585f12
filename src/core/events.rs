//! Write events emitted by record stores
//!
//! Stores append one [`RecordEvent`] per write, wrapped in an
//! [`EventEnvelope`]. The journal makes the order of writes inside a nested
//! mutation observable:
//!
//! ```text
//! resolve(Task{user: {create: ..}})
//!   ├─▶ Saved { model: "User", .. }      (before-phase)
//!   └─▶ Saved { model: "Task", .. }      (owner, carries user_id)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A single write performed by a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RecordEvent {
    /// A record was inserted or updated
    Saved {
        model: String,
        key: Value,
        created: bool,
        attributes: Map<String, Value>,
    },
    /// Records were deleted by key
    Deleted { model: String, keys: Vec<Value> },
    /// A pivot row was added or its attributes replaced
    PivotAttached {
        pivot: String,
        parent_key: Value,
        related_key: Value,
        attributes: Map<String, Value>,
    },
    /// A pivot row was removed
    PivotDetached {
        pivot: String,
        parent_key: Value,
        related_key: Value,
    },
}

impl RecordEvent {
    /// The model or pivot table the event touched
    pub fn target(&self) -> &str {
        match self {
            RecordEvent::Saved { model, .. } | RecordEvent::Deleted { model, .. } => model,
            RecordEvent::PivotAttached { pivot, .. } | RecordEvent::PivotDetached { pivot, .. } => {
                pivot
            }
        }
    }

    pub fn action(&self) -> &str {
        match self {
            RecordEvent::Saved { created: true, .. } => "created",
            RecordEvent::Saved { created: false, .. } => "updated",
            RecordEvent::Deleted { .. } => "deleted",
            RecordEvent::PivotAttached { .. } => "attached",
            RecordEvent::PivotDetached { .. } => "detached",
        }
    }
}

/// Envelope wrapping an event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: RecordEvent,
}

impl EventEnvelope {
    /// Create a new event envelope
    pub fn new(event: RecordEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}
