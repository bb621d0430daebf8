//! Runtime facade.
//!
//! `MotionRuntime` owns the registry, the gate and the host collaborators
//! and exposes the host-facing surface: mount/unmount hooks, navigation
//! intents, interaction events and the per-frame `tick`.
//!
//! # Frame order
//!
//! ```text
//! tick(now)
//!   ├── engine.advance(now)        completions
//!   ├── registry.handle_completion settle / resolve exits
//!   ├── registry.flush_staged      enter tweens staged last frame
//!   ├── registry.process_timers    hover-leave debounce
//!   ├── gate.poll                  may commit and run the entrance
//!   └── entrance of idle elements in the current scope
//! ```

use rune_config::MotionConfig;
use std::sync::Arc;

use crate::controller::{ControllerContext, Interaction};
use crate::engine::VisualEngine;
use crate::events::{EventQueue, MotionEvent};
use crate::gate::{GateContext, NavigationGate};
use crate::registry::{AnimatedElement, ElementRegistry};
use crate::retention::RetentionAdapter;
use crate::router::RouteCommitter;
use crate::signal::{ExitSignal, NavigationTicket};
use crate::types::{ElementId, Location, Millis};

/// Host-facing entry point.
pub struct MotionRuntime<E, R, C> {
    config: Arc<MotionConfig>,
    registry: ElementRegistry,
    gate: NavigationGate,
    engine: E,
    retention: R,
    router: C,
    events: EventQueue,
    now: Millis,
}

impl<E, R, C> MotionRuntime<E, R, C>
where
    E: VisualEngine,
    R: RetentionAdapter,
    C: RouteCommitter,
{
    pub fn new(config: MotionConfig, engine: E, retention: R, router: C, initial: Location) -> Self {
        let gate = NavigationGate::new(&config, initial);
        let config = Arc::new(config);
        Self {
            registry: ElementRegistry::new(config.clone()),
            config,
            gate,
            engine,
            retention,
            router,
            events: EventQueue::new(),
            now: 0.0,
        }
    }

    fn controller_cx(&mut self) -> (&mut ElementRegistry, ControllerContext<'_>) {
        (
            &mut self.registry,
            ControllerContext {
                engine: &mut self.engine,
                events: &mut self.events,
                now: self.now,
            },
        )
    }

    fn gate_cx(&mut self) -> (&mut NavigationGate, GateContext<'_>) {
        (
            &mut self.gate,
            GateContext {
                registry: &mut self.registry,
                engine: &mut self.engine,
                retention: &mut self.retention,
                router: &mut self.router,
                events: &mut self.events,
                now: self.now,
            },
        )
    }

    /// Mount hook. The element enters on a following tick once its scope
    /// is current and no barrier is active.
    pub fn mount(&mut self, element: AnimatedElement) -> bool {
        let (registry, mut cx) = self.controller_cx();
        registry.register(element, &mut cx)
    }

    /// Unmount hook. Resolves the element's pending exit.
    pub fn unmount(&mut self, id: &ElementId) -> bool {
        let (registry, mut cx) = self.controller_cx();
        registry.unregister(id, &mut cx)
    }

    /// Navigation intent, gated on the exits of the current scope.
    pub fn request_navigation(&mut self, target: impl Into<Location>) -> NavigationTicket {
        let target = target.into();
        let (gate, mut ctx) = self.gate_cx();
        gate.request_navigation(target, &mut ctx)
    }

    /// Abandon the active navigation and the queue.
    pub fn cancel_navigation(&mut self) -> bool {
        let (gate, mut ctx) = self.gate_cx();
        gate.cancel(&mut ctx)
    }

    /// Advance one frame.
    pub fn tick(&mut self, now: Millis) {
        if now > self.now {
            self.now = now;
        }
        let completions = self.engine.advance(self.now);
        {
            let (registry, mut cx) = self.controller_cx();
            for completion in &completions {
                registry.handle_completion(completion, &mut cx);
            }
            registry.flush_staged(&mut cx);
            registry.process_timers(&mut cx);
        }
        {
            let (gate, mut ctx) = self.gate_cx();
            gate.poll(&mut ctx);
        }
        if !self.gate.is_navigating() {
            let scope = self.gate.current_location().scope();
            let generation = self.gate.generation();
            if self.registry.has_idle(&scope) {
                let (registry, mut cx) = self.controller_cx();
                registry.run_enter_scope(&scope, generation, &mut cx);
            }
        }
    }

    /// Start one element's exit outside of navigation.
    pub fn run_exit(&mut self, id: &ElementId) -> Option<ExitSignal> {
        let (registry, mut cx) = self.controller_cx();
        registry.run_exit(id, &mut cx)
    }

    pub fn cancel(&mut self, id: &ElementId) -> bool {
        let (registry, mut cx) = self.controller_cx();
        registry.cancel(id, &mut cx)
    }

    /// Cancel every element's animations.
    pub fn cancel_all(&mut self) {
        let (registry, mut cx) = self.controller_cx();
        registry.cancel_all(&mut cx);
    }

    pub fn interaction_start(&mut self, id: &ElementId, kind: Interaction) -> bool {
        let (registry, mut cx) = self.controller_cx();
        registry.start_interaction(id, kind, &mut cx)
    }

    pub fn interaction_end(&mut self, id: &ElementId, kind: Interaction) -> bool {
        let (registry, mut cx) = self.controller_cx();
        registry.end_interaction(id, kind, &mut cx)
    }

    pub fn hover_start(&mut self, id: &ElementId) -> bool {
        self.interaction_start(id, Interaction::Hover)
    }

    pub fn hover_end(&mut self, id: &ElementId) -> bool {
        self.interaction_end(id, Interaction::Hover)
    }

    pub fn tap_start(&mut self, id: &ElementId) -> bool {
        self.interaction_start(id, Interaction::Tap)
    }

    pub fn tap_end(&mut self, id: &ElementId) -> bool {
        self.interaction_end(id, Interaction::Tap)
    }

    pub fn focus_start(&mut self, id: &ElementId) -> bool {
        self.interaction_start(id, Interaction::Focus)
    }

    pub fn focus_end(&mut self, id: &ElementId) -> bool {
        self.interaction_end(id, Interaction::Focus)
    }

    /// Element scrolled into view.
    pub fn in_view_start(&mut self, id: &ElementId) -> bool {
        self.interaction_start(id, Interaction::InView)
    }

    pub fn in_view_end(&mut self, id: &ElementId) -> bool {
        self.interaction_end(id, Interaction::InView)
    }

    pub fn drain_events(&mut self) -> Vec<MotionEvent> {
        self.events.drain().collect()
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    pub fn gate(&self) -> &NavigationGate {
        &self.gate
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn retention(&self) -> &R {
        &self.retention
    }

    pub fn router(&self) -> &C {
        &self.router
    }

    pub fn current_location(&self) -> &Location {
        self.gate.current_location()
    }

    pub fn is_navigating(&self) -> bool {
        self.gate.is_navigating()
    }

    pub fn is_animating(&self) -> bool {
        self.gate.is_animating()
    }
}
