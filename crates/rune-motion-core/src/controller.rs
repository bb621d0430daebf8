//! Per-element animation state machine.
//!
//! An `AnimationController` owns one `AnimatedElement` and drives it
//! through `Idle → Entering → Settled → Exiting → Disposed`. Interaction
//! excursions (hover, tap, focus, in-view) run beside that lifecycle
//! without touching it.
//!
//! Entrance is split over two frames: `run_enter` applies `initial` at once
//! and stages the tween toward `enter`; `flush_staged`, called on the next
//! frame, hands the staged tween to the engine.

use rune_config::MotionConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::engine::{TweenId, TweenOptions, VisualEngine};
use crate::events::{ElementEvent, EventQueue};
use crate::registry::AnimatedElement;
use crate::signal::{ExitOutcome, ExitSignal, Resolver};
use crate::transition::{resolve_phase, ResolvedTransition, TransitionPhase};
use crate::types::{ElementId, ElementStatus, Generation, Millis};
use crate::value::PropertyMap;
use crate::variant::VisualState;

/// What a controller needs from the outside world during one call.
pub struct ControllerContext<'a> {
    pub engine: &'a mut dyn VisualEngine,
    pub events: &'a mut EventQueue,
    /// Frame timestamp.
    pub now: Millis,
}

/// Interaction excursion kinds, in descending precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    Tap,
    Hover,
    Focus,
    InView,
}

impl Interaction {
    pub const ALL: [Interaction; 4] = [
        Interaction::Tap,
        Interaction::Hover,
        Interaction::Focus,
        Interaction::InView,
    ];
}

#[derive(Debug)]
struct StagedEnter {
    props: PropertyMap,
    options: TweenOptions,
}

/// State machine for one animated element.
#[derive(Debug)]
pub struct AnimationController {
    element: AnimatedElement,
    config: Arc<MotionConfig>,
    generation: Option<Generation>,
    staged: Option<StagedEnter>,
    enter_tween: Option<TweenId>,
    exit_tween: Option<TweenId>,
    exit_waiters: Vec<Resolver<ExitOutcome>>,
    exit_outcome: Option<ExitOutcome>,
    /// Active excursions. `None` when the engine refused the tween and the
    /// state was applied directly.
    active: BTreeMap<Interaction, Option<TweenId>>,
    restoring: Vec<TweenId>,
    hover_leave_at: Option<Millis>,
}

impl AnimationController {
    pub fn new(element: AnimatedElement, config: Arc<MotionConfig>) -> Self {
        Self {
            element,
            config,
            generation: None,
            staged: None,
            enter_tween: None,
            exit_tween: None,
            exit_waiters: Vec::new(),
            exit_outcome: None,
            active: BTreeMap::new(),
            restoring: Vec::new(),
            hover_leave_at: None,
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.element.id
    }

    pub fn element(&self) -> &AnimatedElement {
        &self.element
    }

    pub(crate) fn element_mut(&mut self) -> &mut AnimatedElement {
        &mut self.element
    }

    pub fn status(&self) -> ElementStatus {
        self.element.status
    }

    /// Generation of the most recent entrance.
    pub fn generation(&self) -> Option<Generation> {
        self.generation
    }

    /// An exit is running and has not resolved yet.
    pub fn is_exit_pending(&self) -> bool {
        !self.exit_waiters.is_empty()
    }

    /// An enter tween is waiting for the next frame.
    pub fn has_staged_enter(&self) -> bool {
        self.staged.is_some()
    }

    pub fn is_interacting(&self, kind: Interaction) -> bool {
        self.active.contains_key(&kind)
    }

    /// Stagger override for the next entrance. `None` restores the
    /// element's own delay.
    pub fn override_delay(&mut self, delay_ms: Option<Millis>) {
        self.element.effective_delay = delay_ms;
    }

    /// Enter timing including any stagger override.
    pub fn enter_transition(&self) -> ResolvedTransition {
        resolve_phase(
            TransitionPhase::Enter,
            &self.element.transition,
            self.element.enter.as_ref().and_then(|s| s.transition.as_ref()),
            &self.config.transition,
        )
        .with_delay_override(self.element.effective_delay)
    }

    pub fn exit_transition(&self) -> ResolvedTransition {
        resolve_phase(
            TransitionPhase::Exit,
            &self.element.transition,
            self.element.exit.as_ref().and_then(|s| s.transition.as_ref()),
            &self.config.transition,
        )
    }

    /// Exit span: duration plus delay.
    pub fn duration_ms(&self) -> Millis {
        self.exit_transition().span_ms()
    }

    /// Declared enter span, stagger overrides excluded.
    pub fn enter_duration_ms(&self) -> Millis {
        resolve_phase(
            TransitionPhase::Enter,
            &self.element.transition,
            self.element.enter.as_ref().and_then(|s| s.transition.as_ref()),
            &self.config.transition,
        )
        .span_ms()
    }

    fn advance_status(&mut self, next: ElementStatus) -> bool {
        if self.element.status.can_advance_to(next) {
            self.element.status = next;
            true
        } else {
            false
        }
    }

    fn apply_props(&self, props: &PropertyMap, cx: &mut ControllerContext<'_>) {
        if props.is_empty() {
            return;
        }
        if let Err(e) = cx.engine.apply(&self.element.id, props) {
            warn!(element = %self.element.id, error = %e, "failed to apply visual state");
        }
    }

    fn apply_state(&self, state: &VisualState, cx: &mut ControllerContext<'_>) {
        let props = state.resolve(&self.element.id);
        self.apply_props(&props, cx);
    }

    /// Run the entrance for `generation`.
    ///
    /// Returns `false` when the call is a no-op: already settled, already
    /// entering for this generation, or past the enter phase.
    pub fn run_enter(&mut self, generation: Generation, cx: &mut ControllerContext<'_>) -> bool {
        match self.element.status {
            ElementStatus::Settled | ElementStatus::Exiting | ElementStatus::Disposed => {
                return false;
            }
            ElementStatus::Entering => {
                if self.generation.is_some_and(|g| g >= generation) {
                    return false;
                }
                self.staged = None;
                if let Some(tween) = self.enter_tween.take() {
                    cx.engine.stop(tween);
                }
                if self.config.debug.enabled {
                    debug!(element = %self.element.id, generation = generation.0, "restarting entrance");
                }
            }
            ElementStatus::Idle => {}
        }
        self.generation = Some(generation);

        if let Some(initial) = &self.element.initial {
            self.apply_state(initial, cx);
        }

        let Some(enter) = &self.element.enter else {
            self.settle(cx);
            return true;
        };
        let props = enter.resolve(&self.element.id);
        let transition = self.enter_transition();

        self.advance_status(ElementStatus::Entering);
        self.staged = Some(StagedEnter {
            props,
            options: TweenOptions::from(&transition),
        });
        cx.events.push(ElementEvent::EnterStarted {
            element: self.element.id.clone(),
            generation,
            delay_ms: transition.delay_ms,
        });
        true
    }

    /// Hand a tween staged on the previous frame to the engine.
    pub fn flush_staged(&mut self, cx: &mut ControllerContext<'_>) {
        let Some(staged) = self.staged.take() else {
            return;
        };
        match cx.engine.animate(&self.element.id, &staged.props, &staged.options) {
            Ok(tween) => self.enter_tween = Some(tween),
            Err(e) => {
                warn!(element = %self.element.id, error = %e, "enter transition failed to start");
                self.apply_props(&staged.props, cx);
                self.settle(cx);
            }
        }
    }

    fn settle(&mut self, cx: &mut ControllerContext<'_>) {
        self.enter_tween = None;
        if self.advance_status(ElementStatus::Settled) {
            cx.events.push(ElementEvent::Settled {
                element: self.element.id.clone(),
            });
        }
    }

    fn finish_exit(&mut self, outcome: ExitOutcome, cx: &mut ControllerContext<'_>) {
        self.exit_tween = None;
        self.exit_outcome = Some(outcome);
        for waiter in self.exit_waiters.drain(..) {
            waiter.resolve(outcome);
        }
        cx.events.push(ElementEvent::ExitFinished {
            element: self.element.id.clone(),
            outcome,
        });
    }

    /// Route an engine completion. Unknown tweens are ignored.
    pub fn on_completion(&mut self, tween: TweenId, cx: &mut ControllerContext<'_>) {
        if self.enter_tween == Some(tween) {
            self.settle(cx);
        } else if self.exit_tween == Some(tween) {
            self.finish_exit(ExitOutcome::Completed, cx);
        } else {
            for slot in self.active.values_mut() {
                if *slot == Some(tween) {
                    *slot = None;
                }
            }
            self.restoring.retain(|t| *t != tween);
        }
    }

    /// Start the exit and return a signal for its completion.
    ///
    /// Without an `exit` state the signal is already resolved and nothing
    /// is mutated. A second call while the exit runs joins it.
    pub fn run_exit(&mut self, cx: &mut ControllerContext<'_>) -> ExitSignal {
        if let Some(outcome) = self.exit_outcome {
            return ExitSignal::resolved(outcome);
        }
        if self.element.status.is_disposed() {
            return ExitSignal::resolved(ExitOutcome::Interrupted);
        }
        if self.is_exit_pending() {
            let (resolver, signal) = ExitSignal::pending();
            self.exit_waiters.push(resolver);
            return signal;
        }
        let Some(exit) = &self.element.exit else {
            if self.config.debug.enabled {
                debug!(element = %self.element.id, "no exit state, skipping");
            }
            return ExitSignal::resolved(ExitOutcome::Skipped);
        };
        let props = exit.resolve(&self.element.id);
        let transition = self.exit_transition();

        self.stop_tweens(cx);
        self.advance_status(ElementStatus::Exiting);
        cx.events.push(ElementEvent::ExitStarted {
            element: self.element.id.clone(),
        });

        if transition.is_instant() {
            self.apply_props(&props, cx);
            self.finish_exit(ExitOutcome::Completed, cx);
            return ExitSignal::resolved(ExitOutcome::Completed);
        }

        match cx
            .engine
            .animate(&self.element.id, &props, &TweenOptions::from(&transition))
        {
            Ok(tween) => {
                self.exit_tween = Some(tween);
                let (resolver, signal) = ExitSignal::pending();
                self.exit_waiters.push(resolver);
                signal
            }
            Err(e) => {
                warn!(element = %self.element.id, error = %e, "exit transition failed to start");
                self.finish_exit(ExitOutcome::Skipped, cx);
                ExitSignal::resolved(ExitOutcome::Skipped)
            }
        }
    }

    /// Stop everything, snap to `enter` and resolve pending exit signals.
    ///
    /// A cancelled exit is terminal: the element stays `Exiting`, later
    /// `run_exit` calls return the cached `Cancelled` outcome without
    /// animating, and `run_enter` is a no-op.
    pub fn cancel(&mut self, cx: &mut ControllerContext<'_>) {
        if self.element.status.is_disposed() {
            return;
        }
        self.stop_tweens(cx);
        if let Some(tween) = self.exit_tween.take() {
            cx.engine.stop(tween);
        }
        if let Some(enter) = &self.element.enter {
            self.apply_state(enter, cx);
        }
        if matches!(self.element.status, ElementStatus::Idle | ElementStatus::Entering) {
            self.settle(cx);
        }
        if self.is_exit_pending() {
            self.finish_exit(ExitOutcome::Cancelled, cx);
        }
        cx.events.push(ElementEvent::Cancelled {
            element: self.element.id.clone(),
        });
    }

    /// Tear down: stop tweens, pass through `Exiting` when an exit state
    /// exists, resolve pending signals as interrupted.
    pub fn dispose(&mut self, cx: &mut ControllerContext<'_>) {
        if self.element.status.is_disposed() {
            return;
        }
        self.stop_tweens(cx);
        if let Some(tween) = self.exit_tween.take() {
            cx.engine.stop(tween);
        }
        if self.element.exit.is_some() {
            self.advance_status(ElementStatus::Exiting);
        }
        if self.is_exit_pending() {
            self.finish_exit(ExitOutcome::Interrupted, cx);
        }
        self.advance_status(ElementStatus::Disposed);
        cx.events.push(ElementEvent::Disposed {
            element: self.element.id.clone(),
        });
    }

    /// Stop enter and interaction tweens.
    fn stop_tweens(&mut self, cx: &mut ControllerContext<'_>) {
        self.staged = None;
        if let Some(tween) = self.enter_tween.take() {
            cx.engine.stop(tween);
        }
        for tween in std::mem::take(&mut self.active).into_values().flatten() {
            cx.engine.stop(tween);
        }
        for tween in self.restoring.drain(..) {
            cx.engine.stop(tween);
        }
        self.hover_leave_at = None;
    }

    fn state_for(&self, kind: Interaction) -> Option<&VisualState> {
        match kind {
            Interaction::Hover => self.element.hover.as_ref(),
            Interaction::Tap => self.element.tap.as_ref(),
            Interaction::Focus => self.element.focus.as_ref(),
            Interaction::InView => self.element.in_view.as_ref(),
        }
    }

    /// State excursions return to.
    fn base_state(&self) -> Option<&VisualState> {
        match self.element.status {
            ElementStatus::Entering | ElementStatus::Settled => {
                self.element.enter.as_ref().or(self.element.initial.as_ref())
            }
            _ => self.element.initial.as_ref(),
        }
    }

    fn interaction_options(&self, state: &VisualState) -> TweenOptions {
        let transition = resolve_phase(
            TransitionPhase::Interaction,
            &self.element.transition,
            state.transition.as_ref(),
            &self.config.transition,
        );
        TweenOptions::from(&transition)
    }

    /// Begin an excursion. Accepted while `Idle` or `Settled` and only
    /// when the element declares a state for `kind`.
    pub fn start_interaction(&mut self, kind: Interaction, cx: &mut ControllerContext<'_>) -> bool {
        if !matches!(self.element.status, ElementStatus::Idle | ElementStatus::Settled) {
            return false;
        }
        if self.state_for(kind).is_none() {
            return false;
        }
        if kind == Interaction::Hover {
            self.hover_leave_at = None;
        }
        if self.active.contains_key(&kind) {
            return true;
        }
        let Some(state) = self.state_for(kind) else {
            return false;
        };
        let props = state.resolve(&self.element.id);
        let options = self.interaction_options(state);

        let tween = match cx.engine.animate(&self.element.id, &props, &options) {
            Ok(tween) => Some(tween),
            Err(e) => {
                warn!(element = %self.element.id, interaction = ?kind, error = %e, "interaction transition failed to start");
                self.apply_props(&props, cx);
                None
            }
        };
        self.active.insert(kind, tween);
        true
    }

    /// End an excursion. Hover restores after the configured debounce.
    pub fn end_interaction(&mut self, kind: Interaction, cx: &mut ControllerContext<'_>) -> bool {
        if !self.active.contains_key(&kind) {
            return false;
        }
        let debounce = self.config.interaction.hover_leave_delay_ms;
        if kind == Interaction::Hover && debounce > 0.0 {
            self.hover_leave_at = Some(cx.now + debounce);
            return true;
        }
        self.restore(kind, cx);
        true
    }

    /// Fire a pending hover-leave restore whose debounce has elapsed.
    pub fn process_timers(&mut self, cx: &mut ControllerContext<'_>) {
        if self.hover_leave_at.is_some_and(|at| cx.now >= at) {
            self.hover_leave_at = None;
            self.restore(Interaction::Hover, cx);
        }
    }

    /// Animate the properties touched by `kind` back to whatever still
    /// applies: a higher-precedence active excursion, else the base state.
    fn restore(&mut self, kind: Interaction, cx: &mut ControllerContext<'_>) {
        let Some(tween) = self.active.remove(&kind) else {
            return;
        };
        if let Some(tween) = tween {
            cx.engine.stop(tween);
        }
        let Some(state) = self.state_for(kind) else {
            return;
        };

        let id = &self.element.id;
        let targets: PropertyMap = state
            .properties
            .keys()
            .filter_map(|property| {
                let from_active = Interaction::ALL
                    .iter()
                    .filter(|k| self.active.contains_key(k))
                    .find_map(|k| self.state_for(*k).and_then(|s| s.resolve_one(id, property)));
                let value = from_active
                    .or_else(|| self.base_state().and_then(|s| s.resolve_one(id, property)))
                    .or_else(|| {
                        self.element
                            .initial
                            .as_ref()
                            .and_then(|s| s.resolve_one(id, property))
                    })?;
                Some((property.clone(), value))
            })
            .collect();
        if targets.is_empty() {
            return;
        }
        let options = self.interaction_options(state);

        match cx.engine.animate(id, &targets, &options) {
            Ok(tween) => self.restoring.push(tween),
            Err(e) => {
                warn!(element = %id, interaction = ?kind, error = %e, "interaction restore failed to start");
                self.apply_props(&targets, cx);
            }
        }
    }
}

static_assertions::assert_impl_all!(AnimationController: Send);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TimelineEngine;
    use crate::transition::TransitionSpec;
    use crate::types::ScopeId;
    use crate::value::MotionValue;

    struct Harness {
        engine: TimelineEngine,
        events: EventQueue,
        now: Millis,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                engine: TimelineEngine::new(),
                events: EventQueue::new(),
                now: 0.0,
            }
        }

        fn cx(&mut self) -> ControllerContext<'_> {
            ControllerContext {
                engine: &mut self.engine,
                events: &mut self.events,
                now: self.now,
            }
        }

        /// Advance the engine and route completions into `controller`.
        fn frame(&mut self, controller: &mut AnimationController, now: Millis) {
            self.now = now;
            let done = self.engine.advance(now);
            let mut cx = self.cx();
            for c in done {
                controller.on_completion(c.tween, &mut cx);
            }
            controller.flush_staged(&mut cx);
            controller.process_timers(&mut cx);
        }
    }

    fn card() -> AnimatedElement {
        AnimatedElement::new("card", ScopeId::new("home"))
            .with_initial(VisualState::new().with("opacity", 0.0))
            .with_enter(VisualState::new().with("opacity", 1.0))
            .with_exit(VisualState::new().with("opacity", 0.0))
            .with_hover(VisualState::new().with("scale", 1.1))
            .with_transition(TransitionSpec::new().with_duration(100.0))
    }

    fn controller(element: AnimatedElement) -> AnimationController {
        AnimationController::new(element, Arc::new(MotionConfig::default()))
    }

    fn opacity(h: &Harness) -> Option<f64> {
        h.engine
            .value(&ElementId::new("card"), "opacity")
            .and_then(MotionValue::as_number)
    }

    #[test]
    fn test_enter_applies_initial_then_yields_a_frame() {
        let mut h = Harness::new();
        let mut c = controller(card());

        assert!(c.run_enter(Generation(1), &mut h.cx()));
        assert_eq!(c.status(), ElementStatus::Entering);
        assert_eq!(opacity(&h), Some(0.0));
        assert!(c.has_staged_enter());
        assert_eq!(h.engine.active_count(), 0);

        h.frame(&mut c, 16.0);
        assert!(!c.has_staged_enter());
        assert_eq!(h.engine.active_count(), 1);

        h.frame(&mut c, 116.0);
        assert_eq!(c.status(), ElementStatus::Settled);
        assert_eq!(opacity(&h), Some(1.0));
    }

    #[test]
    fn test_enter_reentrancy_guard() {
        let mut h = Harness::new();
        let mut c = controller(card());

        assert!(c.run_enter(Generation(1), &mut h.cx()));
        h.frame(&mut c, 16.0);
        assert!(!c.run_enter(Generation(1), &mut h.cx()));
        assert_eq!(h.engine.active_count(), 1);

        // newer generation restarts instead of stacking
        assert!(c.run_enter(Generation(2), &mut h.cx()));
        assert_eq!(h.engine.active_count(), 0);
        h.frame(&mut c, 32.0);
        assert_eq!(h.engine.active_count(), 1);

        h.frame(&mut c, 200.0);
        assert_eq!(c.status(), ElementStatus::Settled);
        assert!(!c.run_enter(Generation(3), &mut h.cx()));
    }

    #[test]
    fn test_exit_without_target_resolves_immediately() {
        let mut h = Harness::new();
        let element = AnimatedElement::new("card", ScopeId::new("home"))
            .with_enter(VisualState::new().with("opacity", 1.0));
        let mut c = controller(element);

        let mut signal = c.run_exit(&mut h.cx());
        assert_eq!(signal.try_outcome(), Some(ExitOutcome::Skipped));
        assert_eq!(h.engine.active_count(), 0);
        assert!(h.engine.values(c.id()).is_none());
        assert_eq!(c.status(), ElementStatus::Idle);
    }

    #[test]
    fn test_exit_resolves_on_completion_and_joins() {
        let mut h = Harness::new();
        let mut c = controller(card());
        c.run_enter(Generation(1), &mut h.cx());
        h.frame(&mut c, 16.0);
        h.frame(&mut c, 200.0);

        let mut first = c.run_exit(&mut h.cx());
        let mut second = c.run_exit(&mut h.cx());
        assert_eq!(c.status(), ElementStatus::Exiting);
        assert_eq!(h.engine.active_count(), 1);
        assert_eq!(first.try_outcome(), None);

        h.frame(&mut c, 250.0);
        assert_eq!(first.try_outcome(), None);
        h.frame(&mut c, 300.0);
        assert_eq!(first.try_outcome(), Some(ExitOutcome::Completed));
        assert_eq!(second.try_outcome(), Some(ExitOutcome::Completed));
        assert_eq!(opacity(&h), Some(0.0));

        // later requests see the recorded outcome
        assert!(c.run_exit(&mut h.cx()).is_resolved());
    }

    #[test]
    fn test_zero_length_exit_applies_exit_state() {
        let mut h = Harness::new();
        let element = card().with_exit(
            VisualState::new()
                .with("opacity", 0.25)
                .with_transition(TransitionSpec::new().with_duration(0.0).with_delay(0.0)),
        );
        let mut c = controller(element);
        let mut signal = c.run_exit(&mut h.cx());
        assert_eq!(signal.try_outcome(), Some(ExitOutcome::Completed));
        assert_eq!(opacity(&h), Some(0.25));
    }

    #[test]
    fn test_cancel_snaps_to_enter_and_resolves_exit() {
        let mut h = Harness::new();
        let mut c = controller(card());
        c.run_enter(Generation(1), &mut h.cx());
        h.frame(&mut c, 16.0);
        h.frame(&mut c, 200.0);

        let mut signal = c.run_exit(&mut h.cx());
        h.frame(&mut c, 250.0);
        c.cancel(&mut h.cx());

        assert_eq!(signal.try_outcome(), Some(ExitOutcome::Cancelled));
        assert_eq!(opacity(&h), Some(1.0));
        assert_eq!(c.status(), ElementStatus::Exiting);
        assert_eq!(h.engine.active_count(), 0);

        let mut again = c.run_exit(&mut h.cx());
        assert_eq!(again.try_outcome(), Some(ExitOutcome::Cancelled));
        assert_eq!(h.engine.active_count(), 0);
        assert!(!c.run_enter(Generation(2), &mut h.cx()));
        h.frame(&mut c, 400.0);
        assert_eq!(c.status(), ElementStatus::Exiting);
        assert_eq!(opacity(&h), Some(1.0));
    }

    #[test]
    fn test_cancel_during_entrance_settles() {
        let mut h = Harness::new();
        let mut c = controller(card());
        c.run_enter(Generation(1), &mut h.cx());
        h.frame(&mut c, 16.0);
        c.cancel(&mut h.cx());
        assert_eq!(c.status(), ElementStatus::Settled);
        assert_eq!(opacity(&h), Some(1.0));
    }

    #[test]
    fn test_dispose_mid_exit_interrupts() {
        let mut h = Harness::new();
        let mut c = controller(card());
        let mut signal = c.run_exit(&mut h.cx());
        c.dispose(&mut h.cx());
        assert_eq!(signal.try_outcome(), Some(ExitOutcome::Interrupted));
        assert_eq!(c.status(), ElementStatus::Disposed);
        assert!(c.run_exit(&mut h.cx()).is_resolved());
    }

    #[test]
    fn test_dispose_passes_through_exiting_when_exit_declared() {
        let mut h = Harness::new();
        let mut c = controller(card());
        c.dispose(&mut h.cx());
        assert_eq!(c.status(), ElementStatus::Disposed);

        let disposed = h
            .events
            .drain()
            .any(|e| matches!(e, crate::events::MotionEvent::Element(ElementEvent::Disposed { .. })));
        assert!(disposed);
    }

    #[test]
    fn test_hover_restores_after_debounce() {
        let mut h = Harness::new();
        let mut c = controller(card().with_enter(
            VisualState::new().with("opacity", 1.0).with("scale", 1.0),
        ));
        c.run_enter(Generation(1), &mut h.cx());
        h.frame(&mut c, 16.0);
        h.frame(&mut c, 200.0);
        assert_eq!(c.status(), ElementStatus::Settled);

        assert!(c.start_interaction(Interaction::Hover, &mut h.cx()));
        h.frame(&mut c, 300.0);
        let scale = |h: &Harness| h.engine.value(&ElementId::new("card"), "scale").and_then(MotionValue::as_number);
        assert_eq!(scale(&h), Some(1.1));

        h.now = 300.0;
        assert!(c.end_interaction(Interaction::Hover, &mut h.cx()));
        h.frame(&mut c, 350.0);
        assert!(c.is_interacting(Interaction::Hover));

        // leave debounce (100ms) fires at 400
        h.frame(&mut c, 400.0);
        assert!(!c.is_interacting(Interaction::Hover));
        h.frame(&mut c, 500.0);
        assert_eq!(scale(&h), Some(1.0));
        assert_eq!(c.status(), ElementStatus::Settled);
    }

    #[test]
    fn test_hover_reenter_cancels_restore() {
        let mut h = Harness::new();
        let mut c = controller(card());
        assert!(c.start_interaction(Interaction::Hover, &mut h.cx()));
        h.now = 10.0;
        c.end_interaction(Interaction::Hover, &mut h.cx());
        h.now = 50.0;
        assert!(c.start_interaction(Interaction::Hover, &mut h.cx()));
        h.frame(&mut c, 500.0);
        assert!(c.is_interacting(Interaction::Hover));
    }

    #[test]
    fn test_interactions_rejected_while_entering_or_missing() {
        let mut h = Harness::new();
        let mut c = controller(card());
        c.run_enter(Generation(1), &mut h.cx());
        assert!(!c.start_interaction(Interaction::Hover, &mut h.cx()));
        assert!(!c.start_interaction(Interaction::Tap, &mut h.cx()));
        assert!(!c.end_interaction(Interaction::Focus, &mut h.cx()));
    }

    #[test]
    fn test_duration_priority() {
        let config = MotionConfig::default();
        let c = controller(AnimatedElement::new("a", ScopeId::new("s")));
        assert_eq!(c.duration_ms(), config.transition.duration_ms);

        let c = controller(
            AnimatedElement::new("b", ScopeId::new("s"))
                .with_transition(TransitionSpec::new().with_duration(400.0).with_delay(50.0))
                .with_exit(
                    VisualState::new()
                        .with("opacity", 0.0)
                        .with_transition(TransitionSpec::new().with_duration(200.0)),
                ),
        );
        assert_eq!(c.duration_ms(), 250.0);
        assert_eq!(c.enter_duration_ms(), 450.0);
    }
}
