//! Keeping the outgoing view alive while its exits play.
//!
//! The navigation gate asks the host's `RetentionAdapter` to detain the
//! outgoing scope when a request starts and releases it only after the
//! route change has been committed (or the request abandoned).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{ElementId, Millis, ScopeId};

/// What the gate hands to the adapter: the scope and a snapshot of the
/// elements it contained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewHandle {
    pub scope: ScopeId,
    pub elements: Vec<ElementId>,
    pub detained_at: Millis,
}

impl ViewHandle {
    pub fn new(scope: ScopeId, elements: Vec<ElementId>, detained_at: Millis) -> Self {
        Self {
            scope,
            elements,
            detained_at,
        }
    }
}

/// Hook into the host's view caching.
pub trait RetentionAdapter {
    /// Whether the outgoing view of `scope` should stay mounted while
    /// navigation is gated.
    fn should_detain_outgoing(&self, scope: &ScopeId) -> bool;

    fn detain(&mut self, scope: &ScopeId, handle: ViewHandle);

    /// Drop whatever was detained for `scope`. Releasing an unknown scope
    /// is a no-op.
    fn release(&mut self, scope: &ScopeId);
}

/// In-memory adapter storing one handle per scope.
#[derive(Debug, Default)]
pub struct ViewRetainer {
    stored: HashMap<ScopeId, ViewHandle>,
    /// Scopes that are never detained.
    exempt: Vec<ScopeId>,
    released: usize,
}

impl ViewRetainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never detain `scope`.
    pub fn exempt(mut self, scope: ScopeId) -> Self {
        self.exempt.push(scope);
        self
    }

    pub fn is_detained(&self, scope: &ScopeId) -> bool {
        self.stored.contains_key(scope)
    }

    pub fn detained_count(&self) -> usize {
        self.stored.len()
    }

    pub fn handle(&self, scope: &ScopeId) -> Option<&ViewHandle> {
        self.stored.get(scope)
    }

    /// Number of releases that dropped a stored handle.
    pub fn released_count(&self) -> usize {
        self.released
    }
}

impl RetentionAdapter for ViewRetainer {
    fn should_detain_outgoing(&self, scope: &ScopeId) -> bool {
        !self.exempt.contains(scope)
    }

    fn detain(&mut self, scope: &ScopeId, handle: ViewHandle) {
        self.stored.insert(scope.clone(), handle);
    }

    fn release(&mut self, scope: &ScopeId) {
        if self.stored.remove(scope).is_some() {
            self.released += 1;
        }
    }
}

/// Adapter for hosts without view caching.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRetention;

impl RetentionAdapter for NoRetention {
    fn should_detain_outgoing(&self, _scope: &ScopeId) -> bool {
        false
    }

    fn detain(&mut self, _scope: &ScopeId, _handle: ViewHandle) {}

    fn release(&mut self, _scope: &ScopeId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detain_and_release() {
        let mut retainer = ViewRetainer::new();
        let home = ScopeId::new("home");
        assert!(retainer.should_detain_outgoing(&home));

        retainer.detain(&home, ViewHandle::new(home.clone(), vec![ElementId::new("a")], 0.0));
        assert!(retainer.is_detained(&home));
        assert_eq!(retainer.handle(&home).map(|h| h.elements.len()), Some(1));

        retainer.release(&home);
        retainer.release(&home);
        assert!(!retainer.is_detained(&home));
        assert_eq!(retainer.released_count(), 1);
    }

    #[test]
    fn test_exempt_scopes() {
        let retainer = ViewRetainer::new().exempt(ScopeId::new("login"));
        assert!(!retainer.should_detain_outgoing(&ScopeId::new("login")));
        assert!(retainer.should_detain_outgoing(&ScopeId::new("home")));
        assert!(!NoRetention.should_detain_outgoing(&ScopeId::new("home")));
    }
}
