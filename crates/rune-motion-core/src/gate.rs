//! Navigation gate.
//!
//! A navigation request does not change the route right away. The gate
//! snapshots the outgoing scope, starts every exit in it and raises a
//! barrier. The route change is committed at whichever comes first:
//! - every exit signal of the snapshot has resolved
//! - the barrier deadline, `now + max(fallback_timeout, longest_exit)`
//!
//! A declared exit longer than `max_exit_window_ms` no longer stretches the
//! deadline; such a scope is held for the fallback timeout only. A request
//! that supersedes one for the same target keeps the original deadline.
//!
//! Only one barrier is active at a time. A request that arrives while one
//! is active is resolved by the configured `CollisionPolicy`.

use rune_config::{CollisionPolicy, GateConfig, MotionConfig};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::controller::ControllerContext;
use crate::engine::VisualEngine;
use crate::events::{BarrierRelease, EventQueue, GateEvent};
use crate::registry::ElementRegistry;
use crate::retention::{RetentionAdapter, ViewHandle};
use crate::router::RouteCommitter;
use crate::signal::{CancelReason, ExitSignal, NavigationOutcome, NavigationTicket, Resolver};
use crate::types::{ElementId, Generation, Location, Millis, RequestId, ScopeId};

/// Collaborators the gate works through during one call.
pub struct GateContext<'a> {
    pub registry: &'a mut ElementRegistry,
    pub engine: &'a mut dyn VisualEngine,
    pub retention: &'a mut dyn RetentionAdapter,
    pub router: &'a mut dyn RouteCommitter,
    pub events: &'a mut EventQueue,
    pub now: Millis,
}

impl GateContext<'_> {
    fn split(&mut self) -> (&mut ElementRegistry, ControllerContext<'_>) {
        (
            &mut *self.registry,
            ControllerContext {
                engine: &mut *self.engine,
                events: &mut *self.events,
                now: self.now,
            },
        )
    }
}

/// Lifecycle of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Waiting behind the active barrier.
    Pending,
    AwaitingExit,
    Committed,
    Cancelled,
}

/// One navigation intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationRequest {
    pub id: RequestId,
    pub target: Location,
    /// Location when the request started gating.
    pub origin: Location,
    pub status: RequestStatus,
    pub barrier_deadline: Option<Millis>,
    pub requested_at: Millis,
    pub settled_at: Option<Millis>,
}

#[derive(Debug)]
struct Barrier {
    request: NavigationRequest,
    resolvers: Vec<Resolver<NavigationOutcome>>,
    waits: Vec<(ElementId, ExitSignal)>,
    outgoing: ScopeId,
    detained: bool,
}

#[derive(Debug)]
struct Queued {
    request: NavigationRequest,
    resolver: Resolver<NavigationOutcome>,
}

/// State carried over from a superseded barrier.
#[derive(Debug, Default)]
struct Carried {
    waits: Option<Vec<(ElementId, ExitSignal)>>,
    deadline: Option<Millis>,
    detained: bool,
}

/// Barriers route commits on exit completion or timeout.
#[derive(Debug)]
pub struct NavigationGate {
    config: GateConfig,
    debug: bool,
    current: Location,
    generation: Generation,
    next_request: u64,
    active: Option<Barrier>,
    queue: VecDeque<Queued>,
    history: VecDeque<NavigationRequest>,
    animating: bool,
}

impl NavigationGate {
    pub fn new(config: &MotionConfig, initial: Location) -> Self {
        Self {
            config: config.gate.clone(),
            debug: config.debug.enabled,
            current: initial,
            generation: Generation::default(),
            next_request: 0,
            active: None,
            queue: VecDeque::new(),
            history: VecDeque::new(),
            animating: false,
        }
    }

    pub fn current_location(&self) -> &Location {
        &self.current
    }

    /// Bumped on every commit.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// A barrier is active.
    pub fn is_navigating(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_navigating_to(&self, target: &Location) -> bool {
        self.active.as_ref().is_some_and(|b| &b.request.target == target)
    }

    /// Exit animations are holding a route change back.
    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn active_request(&self) -> Option<&NavigationRequest> {
        self.active.as_ref().map(|b| &b.request)
    }

    /// Number of exit signals in the active barrier.
    pub fn waiting_on(&self) -> usize {
        self.active.as_ref().map_or(0, |b| b.waits.len())
    }

    pub fn queued(&self) -> impl Iterator<Item = &NavigationRequest> {
        self.queue.iter().map(|q| &q.request)
    }

    /// Settled requests, oldest first.
    pub fn requests(&self) -> impl Iterator<Item = &NavigationRequest> {
        self.history.iter()
    }

    fn record(&mut self, request: NavigationRequest) {
        if self.config.history_limit == 0 {
            return;
        }
        while self.history.len() >= self.config.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(request);
    }

    fn release_view(&self, scope: &ScopeId, ctx: &mut GateContext<'_>) {
        if self.debug {
            debug!(scope = %scope, "releasing outgoing view");
        }
        ctx.retention.release(scope);
    }

    fn set_animating(&mut self, animating: bool, ctx: &mut GateContext<'_>) {
        if self.animating != animating {
            self.animating = animating;
            ctx.events.push(GateEvent::AnimatingChanged { animating });
        }
    }

    /// Ask to navigate to `target`.
    pub fn request_navigation(&mut self, target: Location, ctx: &mut GateContext<'_>) -> NavigationTicket {
        let (resolver, ticket) = NavigationTicket::pending();
        self.next_request += 1;
        let mut request = NavigationRequest {
            id: RequestId(self.next_request),
            origin: self.current.clone(),
            target,
            status: RequestStatus::Pending,
            barrier_deadline: None,
            requested_at: ctx.now,
            settled_at: None,
        };
        ctx.events.push(GateEvent::Requested {
            request: request.id,
            target: request.target.clone(),
        });
        if self.debug {
            debug!(request = %request.id, target = %request.target, "navigation requested");
        }

        let Some(active) = self.active.take() else {
            self.begin(request, vec![resolver], Carried::default(), ctx);
            return ticket;
        };

        match self.config.collision_policy {
            CollisionPolicy::Supersede => self.supersede(active, request, resolver, ctx),
            CollisionPolicy::Queue => {
                self.active = Some(active);
                ctx.events.push(GateEvent::Queued { request: request.id });
                self.queue.push_back(Queued { request, resolver });
            }
            CollisionPolicy::Reject => {
                self.active = Some(active);
                request.status = RequestStatus::Cancelled;
                request.settled_at = Some(ctx.now);
                ctx.events.push(GateEvent::Rejected { request: request.id });
                resolver.resolve(NavigationOutcome::Rejected);
                self.record(request);
            }
        }
        ticket
    }

    fn supersede(
        &mut self,
        active: Barrier,
        request: NavigationRequest,
        resolver: Resolver<NavigationOutcome>,
        ctx: &mut GateContext<'_>,
    ) {
        let Barrier {
            request: mut old,
            resolvers,
            waits,
            detained,
            ..
        } = active;

        old.status = RequestStatus::Cancelled;
        old.settled_at = Some(ctx.now);
        for r in resolvers {
            r.resolve(NavigationOutcome::Cancelled(CancelReason::Superseded));
        }
        ctx.events.push(GateEvent::Cancelled {
            request: old.id,
            reason: CancelReason::Superseded,
        });
        if self.debug {
            debug!(request = %old.id, by = %request.id, "navigation superseded");
        }

        let carried = if old.target == request.target {
            Carried {
                waits: Some(waits),
                deadline: old.barrier_deadline,
                detained,
            }
        } else {
            Carried {
                detained,
                ..Carried::default()
            }
        };
        self.record(old);
        self.begin(request, vec![resolver], carried, ctx);
    }

    /// Start gating `request`, or settle it at once when there is nothing
    /// to gate.
    fn begin(
        &mut self,
        mut request: NavigationRequest,
        resolvers: Vec<Resolver<NavigationOutcome>>,
        carried: Carried,
        ctx: &mut GateContext<'_>,
    ) {
        let outgoing = self.current.scope();
        request.origin = self.current.clone();

        if request.target == self.current {
            if carried.detained {
                self.release_view(&outgoing, ctx);
            }
            request.status = RequestStatus::Cancelled;
            request.settled_at = Some(ctx.now);
            for r in resolvers {
                r.resolve(NavigationOutcome::Unchanged);
            }
            if self.debug {
                debug!(request = %request.id, target = %request.target, "already at target");
            }
            self.record(request);
            self.set_animating(false, ctx);
            self.start_next(ctx);
            return;
        }

        let detained = if carried.detained {
            true
        } else if self.config.detain_outgoing && ctx.retention.should_detain_outgoing(&outgoing) {
            let elements = ctx
                .registry
                .all_for_scope(&outgoing)
                .map(|e| e.id.clone())
                .collect();
            let handle = ViewHandle::new(outgoing.clone(), elements, ctx.now);
            if self.debug {
                debug!(scope = %outgoing, elements = handle.elements.len(), "detaining outgoing view");
            }
            ctx.retention.detain(&outgoing, handle);
            true
        } else {
            false
        };

        let waits = match carried.waits {
            Some(waits) => waits,
            None => {
                let (registry, mut cx) = ctx.split();
                registry.run_exit_scope(&outgoing, &mut cx)
            }
        };
        let deadline = carried.deadline.unwrap_or_else(|| {
            ctx.now + self.barrier_window(ctx.registry.longest_exit_duration(&outgoing))
        });

        request.status = RequestStatus::AwaitingExit;
        request.barrier_deadline = Some(deadline);
        ctx.events.push(GateEvent::BarrierStarted {
            request: request.id,
            deadline,
            waiting_on: waits.len(),
        });
        if self.debug {
            debug!(
                request = %request.id,
                target = %request.target,
                scope = %outgoing,
                waiting_on = waits.len(),
                deadline,
                "exit barrier raised"
            );
        }

        self.active = Some(Barrier {
            request,
            resolvers,
            waits,
            outgoing,
            detained,
        });
        self.poll(ctx);
    }

    /// Length of a fresh barrier given the longest declared exit.
    fn barrier_window(&self, longest: Millis) -> Millis {
        let fallback = self.config.fallback_timeout_ms;
        if longest <= self.config.max_exit_window_ms {
            fallback.max(longest)
        } else {
            fallback
        }
    }

    /// Check the active barrier and commit when it can be released.
    pub fn poll(&mut self, ctx: &mut GateContext<'_>) {
        let Some(barrier) = self.active.as_mut() else {
            return;
        };
        let stalled: Vec<String> = barrier
            .waits
            .iter_mut()
            .filter_map(|(id, signal)| (!signal.is_resolved()).then(|| id.to_string()))
            .collect();
        if stalled.is_empty() {
            self.release(BarrierRelease::AllResolved, ctx);
            return;
        }
        let deadline = barrier.request.barrier_deadline.unwrap_or(f64::INFINITY);
        if ctx.now >= deadline {
            warn!(
                request = %barrier.request.id,
                target = %barrier.request.target,
                stalled = ?stalled,
                "exit barrier deadline reached, committing"
            );
            self.release(BarrierRelease::Deadline, ctx);
            return;
        }
        self.set_animating(true, ctx);
    }

    fn release(&mut self, reason: BarrierRelease, ctx: &mut GateContext<'_>) {
        let Some(Barrier {
            mut request,
            resolvers,
            outgoing,
            detained,
            ..
        }) = self.active.take()
        else {
            return;
        };
        ctx.events.push(GateEvent::BarrierReleased {
            request: request.id,
            reason,
        });

        let outcome = match ctx.router.commit(&request.target) {
            Ok(()) => {
                self.current = request.target.clone();
                self.generation = self.generation.next();
                request.status = RequestStatus::Committed;
                ctx.events.push(GateEvent::Committed {
                    request: request.id,
                    target: request.target.clone(),
                });
                if self.debug {
                    debug!(request = %request.id, target = %request.target, reason = ?reason, "navigation committed");
                }
                NavigationOutcome::Committed(request.target.clone())
            }
            Err(e) => {
                warn!(request = %request.id, error = %e, "route commit failed");
                request.status = RequestStatus::Cancelled;
                ctx.events.push(GateEvent::CommitFailed {
                    request: request.id,
                    reason: e.reason.clone(),
                });
                NavigationOutcome::Failed(e)
            }
        };
        request.settled_at = Some(ctx.now);

        if detained {
            self.release_view(&outgoing, ctx);
        }
        for r in resolvers {
            r.resolve(outcome.clone());
        }
        self.set_animating(false, ctx);
        self.record(request);

        if outcome.is_committed() {
            let scope = self.current.scope();
            let generation = self.generation;
            let (registry, mut cx) = ctx.split();
            registry.run_enter_scope(&scope, generation, &mut cx);
        }
        self.start_next(ctx);
    }

    fn start_next(&mut self, ctx: &mut GateContext<'_>) {
        if self.active.is_some() {
            return;
        }
        if let Some(Queued { request, resolver }) = self.queue.pop_front() {
            self.begin(request, vec![resolver], Carried::default(), ctx);
        }
    }

    /// Abandon the active barrier and every queued request. Elements keep
    /// whatever partial exit state they reached.
    pub fn cancel(&mut self, ctx: &mut GateContext<'_>) -> bool {
        let mut cancelled = false;
        if let Some(barrier) = self.active.take() {
            cancelled = true;
            let Barrier {
                mut request,
                resolvers,
                outgoing,
                detained,
                ..
            } = barrier;
            if detained {
                self.release_view(&outgoing, ctx);
            }
            for r in resolvers {
                r.resolve(NavigationOutcome::Cancelled(CancelReason::Aborted));
            }
            request.status = RequestStatus::Cancelled;
            request.settled_at = Some(ctx.now);
            ctx.events.push(GateEvent::Cancelled {
                request: request.id,
                reason: CancelReason::Aborted,
            });
            self.record(request);
        }
        while let Some(Queued { mut request, resolver }) = self.queue.pop_front() {
            cancelled = true;
            resolver.resolve(NavigationOutcome::Cancelled(CancelReason::Aborted));
            request.status = RequestStatus::Cancelled;
            request.settled_at = Some(ctx.now);
            ctx.events.push(GateEvent::Cancelled {
                request: request.id,
                reason: CancelReason::Aborted,
            });
            self.record(request);
        }
        self.set_animating(false, ctx);
        cancelled
    }
}

static_assertions::assert_impl_all!(NavigationGate: Send);
