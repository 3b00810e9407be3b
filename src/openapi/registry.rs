//! Deduplicated store of named component schemas.
//!
//! Conflict policy is deterministic first-wins: a later registration under
//! an already-taken name is dropped and recorded in the diagnostics list —
//! never an error. Identical re-registrations are a silent no-op.

use std::collections::BTreeMap;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;

/// Concurrency-safe name → schema store for one build pass.
///
/// Typical usage is single-threaded, but the underlying load-or-store keeps
/// independent builds sharing one registry safe.
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: DashMap<String, Value>,
    dropped: Mutex<Vec<String>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under `name`. Returns `true` if the schema was
    /// stored; `false` if the name was already taken (first wins).
    pub fn register(&self, name: impl Into<String>, schema: Value) -> bool {
        let name = name.into();
        match self.schemas.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(schema);
                tracing::debug!(schema_name = %name, "registered component schema");
                true
            }
            dashmap::mapref::entry::Entry::Occupied(e) => {
                if *e.get() != schema {
                    tracing::warn!(
                        schema_name = %name,
                        "conflicting schema under an already-registered name; keeping the first"
                    );
                    self.dropped.lock().push(name);
                }
                false
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Names whose later, conflicting registrations were dropped.
    pub fn dropped(&self) -> Vec<String> {
        self.dropped.lock().clone()
    }

    /// Drain into the sorted component map of the document.
    pub fn into_components(self) -> BTreeMap<String, Value> {
        self.schemas.into_iter().collect()
    }
}
