//! Motion lifecycle events.
//!
//! Controllers and the navigation gate push events into an `EventQueue`
//! while the runtime processes a tick. Hosts drain the queue afterwards to
//! react to state changes (toggle an "animating" indicator, log commits).
//!
//! ```ignore
//! runtime.tick(now);
//! for event in runtime.drain_events() {
//!     if let MotionEvent::Gate(GateEvent::Committed { target, .. }) = event {
//!         println!("now showing {target}");
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::signal::{CancelReason, ExitOutcome};
use crate::types::{ElementId, Generation, Location, RequestId, ScopeId};

/// Per-element lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementEvent {
    Registered {
        element: ElementId,
        scope: ScopeId,
    },
    EnterStarted {
        element: ElementId,
        generation: Generation,
        delay_ms: f64,
    },
    /// The element reached its `enter` state.
    Settled { element: ElementId },
    ExitStarted { element: ElementId },
    ExitFinished {
        element: ElementId,
        outcome: ExitOutcome,
    },
    /// Snapped back to `enter` by a cancellation.
    Cancelled { element: ElementId },
    Disposed { element: ElementId },
}

impl ElementEvent {
    pub fn element(&self) -> &ElementId {
        match self {
            Self::Registered { element, .. }
            | Self::EnterStarted { element, .. }
            | Self::Settled { element }
            | Self::ExitStarted { element }
            | Self::ExitFinished { element, .. }
            | Self::Cancelled { element }
            | Self::Disposed { element } => element,
        }
    }
}

/// Why a barrier was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierRelease {
    /// Every exit signal resolved.
    AllResolved,
    /// The deadline passed first.
    Deadline,
}

/// Navigation gate event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateEvent {
    Requested {
        request: RequestId,
        target: Location,
    },
    /// A queued request was parked behind the active barrier.
    Queued { request: RequestId },
    BarrierStarted {
        request: RequestId,
        deadline: f64,
        waiting_on: usize,
    },
    BarrierReleased {
        request: RequestId,
        reason: BarrierRelease,
    },
    Committed {
        request: RequestId,
        target: Location,
    },
    Cancelled {
        request: RequestId,
        reason: CancelReason,
    },
    Rejected { request: RequestId },
    CommitFailed {
        request: RequestId,
        reason: String,
    },
    /// Exit animations started or finished gating navigation.
    AnimatingChanged { animating: bool },
}

impl GateEvent {
    pub fn request(&self) -> Option<RequestId> {
        match self {
            Self::Requested { request, .. }
            | Self::Queued { request }
            | Self::BarrierStarted { request, .. }
            | Self::BarrierReleased { request, .. }
            | Self::Committed { request, .. }
            | Self::Cancelled { request, .. }
            | Self::Rejected { request }
            | Self::CommitFailed { request, .. } => Some(*request),
            Self::AnimatingChanged { .. } => None,
        }
    }
}

/// Wrapper for both event families.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MotionEvent {
    Element(ElementEvent),
    Gate(GateEvent),
}

impl MotionEvent {
    pub fn is_commit(&self) -> bool {
        matches!(self, Self::Gate(GateEvent::Committed { .. }))
    }
}

impl From<ElementEvent> for MotionEvent {
    fn from(event: ElementEvent) -> Self {
        Self::Element(event)
    }
}

impl From<GateEvent> for MotionEvent {
    fn from(event: GateEvent) -> Self {
        Self::Gate(event)
    }
}

/// Queue for collecting events during a tick.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<MotionEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: impl Into<MotionEvent>) {
        self.events.push_back(event.into());
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn pop(&mut self) -> Option<MotionEvent> {
        self.events.pop_front()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = MotionEvent> + '_ {
        self.events.drain(..)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MotionEvent> {
        self.events.iter()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Events concerning one element.
    pub fn events_for_element(&self, id: &ElementId) -> Vec<&ElementEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                MotionEvent::Element(event) if event.element() == id => Some(event),
                _ => None,
            })
            .collect()
    }
}

static_assertions::assert_impl_all!(EventQueue: Send);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_order_and_filter() {
        let mut queue = EventQueue::new();
        let card = ElementId::new("card");
        queue.push(ElementEvent::ExitStarted { element: card.clone() });
        queue.push(GateEvent::AnimatingChanged { animating: true });
        queue.push(ElementEvent::ExitFinished {
            element: card.clone(),
            outcome: ExitOutcome::Completed,
        });

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.events_for_element(&card).len(), 2);
        assert!(matches!(
            queue.pop(),
            Some(MotionEvent::Element(ElementEvent::ExitStarted { .. }))
        ));
        assert_eq!(queue.drain().count(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_event_json_tags() {
        let event = MotionEvent::Gate(GateEvent::Committed {
            request: RequestId(3),
            target: Location::new("/work"),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "gate");
        assert_eq!(json["type"], "committed");
        assert_eq!(json["target"], "/work");
        assert!(event.is_commit());
    }
}
