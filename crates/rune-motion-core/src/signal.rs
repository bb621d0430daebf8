//! Completion signals.
//!
//! An `ExitSignal` resolves when one element's exit animation is over; a
//! `NavigationTicket` resolves when a navigation request is settled. Both
//! are `futures::channel::oneshot` receivers underneath, so they can be
//! awaited, or checked without blocking from a frame loop with
//! `try_outcome`. A signal whose sender is dropped resolves as well: it can
//! never block a barrier.

use futures::channel::oneshot;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::CommitError;
use crate::types::Location;

/// How an element's exit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitOutcome {
    /// The exit tween ran to completion.
    Completed,
    /// Nothing to animate, or the engine refused the tween.
    Skipped,
    /// The element was torn down mid-exit.
    Interrupted,
    /// The element was cancelled and snapped back.
    Cancelled,
}

/// Why a navigation request was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// A newer request replaced this one.
    Superseded,
    /// The host cancelled navigation.
    Aborted,
    /// The gate went away before settling the request.
    Dropped,
}

/// How a navigation request was settled.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
    Committed(Location),
    Cancelled(CancelReason),
    /// Refused by the `reject` collision policy.
    Rejected,
    /// The router refused the route change.
    Failed(CommitError),
    /// Target equals the current location; nothing to do.
    Unchanged,
}

impl NavigationOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

/// Shared receiver logic for both signal kinds.
#[derive(Debug)]
struct Slot<T> {
    rx: oneshot::Receiver<T>,
    resolved: Option<T>,
}

impl<T: Clone> Slot<T> {
    fn try_take(&mut self, on_dropped: impl FnOnce() -> T) -> Option<T> {
        if self.resolved.is_none() {
            match self.rx.try_recv() {
                Ok(Some(value)) => self.resolved = Some(value),
                Ok(None) => {}
                Err(oneshot::Canceled) => self.resolved = Some(on_dropped()),
            }
        }
        self.resolved.clone()
    }

    fn poll_take(&mut self, cx: &mut Context<'_>, on_dropped: impl FnOnce() -> T) -> Poll<T> {
        if let Some(value) = &self.resolved {
            return Poll::Ready(value.clone());
        }
        let value = match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(value)) => value,
            Poll::Ready(Err(oneshot::Canceled)) => on_dropped(),
            Poll::Pending => return Poll::Pending,
        };
        self.resolved = Some(value.clone());
        Poll::Ready(value)
    }
}

/// Sending half of a signal. Resolving consumes it.
#[derive(Debug)]
pub struct Resolver<T>(oneshot::Sender<T>);

impl<T> Resolver<T> {
    /// Resolve the paired signal. A dropped signal is not an error.
    pub fn resolve(self, value: T) {
        let _ = self.0.send(value);
    }

    pub fn is_abandoned(&self) -> bool {
        self.0.is_canceled()
    }
}

/// Completion of one element's exit.
#[derive(Debug)]
pub struct ExitSignal(Slot<ExitOutcome>);

impl ExitSignal {
    /// A pending signal and its resolver.
    pub fn pending() -> (Resolver<ExitOutcome>, ExitSignal) {
        let (tx, rx) = oneshot::channel();
        (Resolver(tx), ExitSignal(Slot { rx, resolved: None }))
    }

    /// A signal that is already resolved.
    pub fn resolved(outcome: ExitOutcome) -> ExitSignal {
        let (resolver, signal) = Self::pending();
        resolver.resolve(outcome);
        signal
    }

    /// The outcome, if the signal has resolved.
    pub fn try_outcome(&mut self) -> Option<ExitOutcome> {
        self.0.try_take(|| ExitOutcome::Interrupted)
    }

    pub fn is_resolved(&mut self) -> bool {
        self.try_outcome().is_some()
    }
}

impl Future for ExitSignal {
    type Output = ExitOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.0.poll_take(cx, || ExitOutcome::Interrupted)
    }
}

/// Handle returned for a navigation request.
#[derive(Debug)]
pub struct NavigationTicket(Slot<NavigationOutcome>);

impl NavigationTicket {
    pub fn pending() -> (Resolver<NavigationOutcome>, NavigationTicket) {
        let (tx, rx) = oneshot::channel();
        (Resolver(tx), NavigationTicket(Slot { rx, resolved: None }))
    }

    pub fn resolved(outcome: NavigationOutcome) -> NavigationTicket {
        let (resolver, ticket) = Self::pending();
        resolver.resolve(outcome);
        ticket
    }

    pub fn try_outcome(&mut self) -> Option<NavigationOutcome> {
        self.0
            .try_take(|| NavigationOutcome::Cancelled(CancelReason::Dropped))
    }

    pub fn is_settled(&mut self) -> bool {
        self.try_outcome().is_some()
    }
}

impl Future for NavigationTicket {
    type Output = NavigationOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.0
            .poll_take(cx, || NavigationOutcome::Cancelled(CancelReason::Dropped))
    }
}
