//! Document Context
//!
//! Process-wide presentation context shared by the mode controller and the
//! module loader. It carries two kinds of state:
//!
//! - **Markers**: mode-tagged flags the renderer styles against
//!   (`mode-countdown`, `mode-fireworks`)
//! - **Module requests**: identifiers of modules that have already been
//!   requested, so a module is never requested twice
//!
//! Clones are handles to the same context.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct DocumentInner {
    markers: BTreeSet<String>,
    module_requests: Vec<String>,
}

/// Shared handle to the document context
#[derive(Clone, Debug, Default)]
pub struct Document {
    inner: Arc<Mutex<DocumentInner>>,
}

impl Document {
    /// Create an empty document context
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a marker
    pub fn add_marker(&self, marker: &str) {
        self.inner.lock().markers.insert(marker.to_string());
    }

    /// Remove a marker (no-op when absent)
    pub fn remove_marker(&self, marker: &str) {
        self.inner.lock().markers.remove(marker);
    }

    /// Whether a marker is applied
    pub fn has_marker(&self, marker: &str) -> bool {
        self.inner.lock().markers.contains(marker)
    }

    /// Snapshot of all applied markers, sorted
    pub fn markers(&self) -> Vec<String> {
        self.inner.lock().markers.iter().cloned().collect()
    }

    /// Record a module request; returns false if one already exists
    pub fn insert_module_request(&self, id: &str) -> bool {
        let mut inner = self.inner.lock();
        if inner.module_requests.iter().any(|existing| existing == id) {
            return false;
        }
        inner.module_requests.push(id.to_string());
        true
    }

    /// Whether a request for this module identifier exists
    pub fn has_module_request(&self, id: &str) -> bool {
        self.inner
            .lock()
            .module_requests
            .iter()
            .any(|existing| existing == id)
    }

    /// Module identifiers in the order they were requested
    pub fn module_requests(&self) -> Vec<String> {
        self.inner.lock().module_requests.clone()
    }
}
