//! Route commit contract.
//!
//! The gate never changes the route itself. Once a barrier releases it
//! calls `RouteCommitter::commit`, which the host backs with its router.

use std::collections::HashSet;

use crate::error::CommitError;
use crate::types::Location;

/// Executes a route change.
pub trait RouteCommitter {
    fn commit(&mut self, target: &Location) -> Result<(), CommitError>;
}

impl<F> RouteCommitter for F
where
    F: FnMut(&Location) -> Result<(), CommitError>,
{
    fn commit(&mut self, target: &Location) -> Result<(), CommitError> {
        self(target)
    }
}

/// Router that only records where it has been.
#[derive(Debug, Clone)]
pub struct MemoryRouter {
    current: Location,
    history: Vec<Location>,
    refused: HashSet<Location>,
}

impl MemoryRouter {
    pub fn new(initial: Location) -> Self {
        Self {
            current: initial.clone(),
            history: vec![initial],
            refused: HashSet::new(),
        }
    }

    /// Make every commit to `target` fail.
    pub fn refuse(mut self, target: Location) -> Self {
        self.refused.insert(target);
        self
    }

    pub fn current(&self) -> &Location {
        &self.current
    }

    /// Every location committed so far, the initial one first.
    pub fn history(&self) -> &[Location] {
        &self.history
    }

    pub fn commit_count(&self) -> usize {
        self.history.len() - 1
    }
}

impl RouteCommitter for MemoryRouter {
    fn commit(&mut self, target: &Location) -> Result<(), CommitError> {
        if self.refused.contains(target) {
            return Err(CommitError::new(target.clone(), "route refused"));
        }
        self.current = target.clone();
        self.history.push(target.clone());
        Ok(())
    }
}
