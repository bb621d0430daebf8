//! Core identifiers and lifecycle types.
//!
//! - `ElementId`: stable identity of one animated element
//! - `ScopeId` / `Location`: which view an element belongs to and where the
//!   router is pointing
//! - `ElementStatus`: the per-element lifecycle state machine
//! - `Generation`: navigation generation used by the enter re-entrancy guard
//! - `RequestId`: identity of a navigation request

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Milliseconds, either a duration or an absolute frame timestamp.
pub type Millis = f64;

/// Stable identifier of an animated element, unique for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh `motion-N` identifier.
    pub fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(format!("motion-{}", COUNTER.fetch_add(1, Ordering::Relaxed)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The set of elements belonging to one view/route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(String);

impl ScopeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScopeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A router location such as `/work?tab=2#top`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(String);

impl Location {
    /// Create a location, trimming surrounding whitespace.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let trimmed = url.trim();
        if trimmed.len() == url.len() {
            Self(url)
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Route path with query, hash and the leading slash removed.
    ///
    /// `/work?tab=2#top` → `work`, `/` → ``.
    pub fn path(&self) -> &str {
        let end = self
            .0
            .find(|c| c == '?' || c == '#')
            .unwrap_or(self.0.len());
        let path = &self.0[..end];
        path.strip_prefix('/').unwrap_or(path)
    }

    /// The scope whose elements render this location.
    pub fn scope(&self) -> ScopeId {
        ScopeId::new(self.path())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Location {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Lifecycle status of an animated element.
///
/// Status only ever moves forward: `Idle → Entering → Settled → Exiting →
/// Disposed`. Forward skips are allowed (an element that never entered can
/// exit), backward moves are not. Interaction excursions never touch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementStatus {
    #[default]
    Idle,
    Entering,
    Settled,
    Exiting,
    Disposed,
}

impl ElementStatus {
    fn rank(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Entering => 1,
            Self::Settled => 2,
            Self::Exiting => 3,
            Self::Disposed => 4,
        }
    }

    /// Whether moving from `self` to `next` respects the lifecycle order.
    pub fn can_advance_to(self, next: ElementStatus) -> bool {
        next.rank() > self.rank()
    }

    /// True once the element has been torn down.
    pub fn is_disposed(self) -> bool {
        self == Self::Disposed
    }
}

/// Navigation generation. Bumped by the gate on every commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Identifier of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nav-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = ElementId::generate();
        let b = ElementId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("motion-"));
    }

    #[test]
    fn test_location_path_and_scope() {
        assert_eq!(Location::new("/work?tab=2#top").path(), "work");
        assert_eq!(Location::new("/play").scope(), ScopeId::new("play"));
        assert_eq!(Location::new("/").path(), "");
        assert_eq!(Location::new("about#team").path(), "about");
        assert_eq!(Location::new("  /home ").as_str(), "/home");
    }

    #[test]
    fn test_status_only_moves_forward() {
        use ElementStatus::*;
        assert!(Idle.can_advance_to(Entering));
        assert!(Entering.can_advance_to(Settled));
        assert!(Settled.can_advance_to(Exiting));
        assert!(Exiting.can_advance_to(Disposed));
        assert!(Idle.can_advance_to(Exiting));

        assert!(!Settled.can_advance_to(Entering));
        assert!(!Exiting.can_advance_to(Settled));
        assert!(!Disposed.can_advance_to(Idle));
        assert!(!Settled.can_advance_to(Settled));
    }

    #[test]
    fn test_generation_next() {
        assert_eq!(Generation::default().next(), Generation(1));
    }
}
