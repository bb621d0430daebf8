//! Element registry.
//!
//! The registry owns every live `AnimationController`, keyed by element id,
//! and keeps a few eagerly maintained indexes:
//! - children of each parent, in registration order
//! - per-scope exit and enter duration aggregates
//!
//! It also runs the scope-wide flows the gate and runtime need: the
//! staggered entrance of a scope, the exits of a scope, cancellation, and
//! routing of engine completions.

use rune_config::MotionConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::controller::{AnimationController, ControllerContext, Interaction};
use crate::engine::Completion;
use crate::error::Result;
use crate::events::ElementEvent;
use crate::signal::ExitSignal;
use crate::stagger::{self, DispatchStep, StaggerParams};
use crate::transition::TransitionSpec;
use crate::types::{ElementId, ElementStatus, Generation, Millis, ScopeId};
use crate::variant::VisualState;

/// An element whose visual state the runtime orchestrates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimatedElement {
    #[serde(default = "ElementId::generate")]
    pub id: ElementId,
    pub scope: ScopeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<VisualState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enter: Option<VisualState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<VisualState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover: Option<VisualState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tap: Option<VisualState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<VisualState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_view: Option<VisualState>,
    #[serde(default)]
    pub transition: TransitionSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ElementId>,

    /// Position among the parent's registered children.
    #[serde(skip)]
    pub child_index: usize,
    /// Number of registered children of this element.
    #[serde(skip)]
    pub child_count: usize,
    /// Delay after a stagger override.
    #[serde(skip)]
    pub effective_delay: Option<Millis>,
    #[serde(skip)]
    pub status: ElementStatus,
}

impl AnimatedElement {
    pub fn new(id: impl Into<ElementId>, scope: ScopeId) -> Self {
        Self {
            id: id.into(),
            scope,
            initial: None,
            enter: None,
            exit: None,
            hover: None,
            tap: None,
            focus: None,
            in_view: None,
            transition: TransitionSpec::default(),
            parent: None,
            child_index: 0,
            child_count: 0,
            effective_delay: None,
            status: ElementStatus::Idle,
        }
    }

    /// Parse an element description.
    ///
    /// ```
    /// use rune_motion_core::AnimatedElement;
    ///
    /// let el = AnimatedElement::from_json(r#"{
    ///     "id": "hero", "scope": "home",
    ///     "initial": {"opacity": 0}, "enter": {"opacity": 1},
    ///     "transition": {"duration_ms": 400}
    /// }"#).unwrap();
    /// assert_eq!(el.id.as_str(), "hero");
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_initial(mut self, state: VisualState) -> Self {
        self.initial = Some(state);
        self
    }

    pub fn with_enter(mut self, state: VisualState) -> Self {
        self.enter = Some(state);
        self
    }

    pub fn with_exit(mut self, state: VisualState) -> Self {
        self.exit = Some(state);
        self
    }

    pub fn with_hover(mut self, state: VisualState) -> Self {
        self.hover = Some(state);
        self
    }

    pub fn with_tap(mut self, state: VisualState) -> Self {
        self.tap = Some(state);
        self
    }

    pub fn with_focus(mut self, state: VisualState) -> Self {
        self.focus = Some(state);
        self
    }

    pub fn with_in_view(mut self, state: VisualState) -> Self {
        self.in_view = Some(state);
        self
    }

    pub fn with_transition(mut self, transition: TransitionSpec) -> Self {
        self.transition = transition;
        self
    }

    pub fn with_parent(mut self, parent: impl Into<ElementId>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ScopeAggregates {
    longest_exit: Millis,
    longest_enter: Millis,
    total_exit: Millis,
}

/// Owner of all live animated elements.
#[derive(Debug)]
pub struct ElementRegistry {
    config: Arc<MotionConfig>,
    controllers: HashMap<ElementId, AnimationController>,
    /// Registration order.
    order: Vec<ElementId>,
    /// Parent id → registered children in registration order.
    children: HashMap<ElementId, Vec<ElementId>>,
    aggregates: HashMap<ScopeId, ScopeAggregates>,
}

impl ElementRegistry {
    pub fn new(config: Arc<MotionConfig>) -> Self {
        Self {
            config,
            controllers: HashMap::new(),
            order: Vec::new(),
            children: HashMap::new(),
            aggregates: HashMap::new(),
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.controllers.contains_key(id)
    }

    /// Register an element. Registering an id twice is a no-op and returns
    /// `false`.
    pub fn register(&mut self, element: AnimatedElement, cx: &mut ControllerContext<'_>) -> bool {
        if self.controllers.contains_key(&element.id) {
            if self.config.debug.enabled {
                debug!(element = %element.id, "already registered");
            }
            return false;
        }
        let id = element.id.clone();
        let scope = element.scope.clone();
        let parent = element.parent.clone();

        self.controllers
            .insert(id.clone(), AnimationController::new(element, self.config.clone()));
        self.order.push(id.clone());
        if let Some(parent) = parent {
            self.children.entry(parent.clone()).or_default().push(id.clone());
            self.reindex_children(&parent);
        }
        self.reindex_children(&id);
        self.recompute_scope(&scope);

        if self.config.debug.enabled {
            debug!(element = %id, scope = %scope, "registered");
        }
        cx.events.push(ElementEvent::Registered { element: id, scope });
        true
    }

    /// Dispose and remove an element. Unknown ids are a no-op and return
    /// `false`.
    pub fn unregister(&mut self, id: &ElementId, cx: &mut ControllerContext<'_>) -> bool {
        let Some(mut controller) = self.controllers.remove(id) else {
            return false;
        };
        controller.dispose(cx);
        self.order.retain(|e| e != id);

        let element = controller.element();
        if let Some(parent) = &element.parent {
            if let Some(siblings) = self.children.get_mut(parent) {
                siblings.retain(|e| e != id);
                if siblings.is_empty() {
                    self.children.remove(parent);
                }
            }
            self.reindex_children(parent);
        }
        self.recompute_scope(&element.scope);

        if self.config.debug.enabled {
            debug!(element = %id, scope = %element.scope, "unregistered");
        }
        true
    }

    fn reindex_children(&mut self, parent: &ElementId) {
        let children = self.children.get(parent).cloned().unwrap_or_default();
        let count = children.len();
        for (index, child) in children.iter().enumerate() {
            if let Some(c) = self.controllers.get_mut(child) {
                c.element_mut().child_index = index;
            }
        }
        if let Some(c) = self.controllers.get_mut(parent) {
            c.element_mut().child_count = count;
        }
    }

    fn recompute_scope(&mut self, scope: &ScopeId) {
        let mut agg = ScopeAggregates::default();
        let mut any = false;
        for c in self.controllers.values().filter(|c| &c.element().scope == scope) {
            any = true;
            let exit = c.duration_ms();
            agg.longest_exit = agg.longest_exit.max(exit);
            agg.total_exit += exit;
            agg.longest_enter = agg.longest_enter.max(c.enter_duration_ms());
        }
        if any {
            self.aggregates.insert(scope.clone(), agg);
        } else {
            self.aggregates.remove(scope);
        }
    }

    /// Every registered element in registration order.
    pub fn all(&self) -> impl Iterator<Item = &AnimatedElement> {
        self.order
            .iter()
            .filter_map(|id| self.controllers.get(id).map(AnimationController::element))
    }

    pub fn all_for_scope<'a>(&'a self, scope: &'a ScopeId) -> impl Iterator<Item = &'a AnimatedElement> {
        self.all().filter(move |e| &e.scope == scope)
    }

    pub fn get(&self, id: &ElementId) -> Option<&AnimatedElement> {
        self.controllers.get(id).map(AnimationController::element)
    }

    pub fn controller(&self, id: &ElementId) -> Option<&AnimationController> {
        self.controllers.get(id)
    }

    pub fn children_of(&self, id: &ElementId) -> &[ElementId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Longest exit span in `scope`, `0` when empty.
    pub fn longest_exit_duration(&self, scope: &ScopeId) -> Millis {
        self.aggregates.get(scope).map_or(0.0, |a| a.longest_exit)
    }

    /// Longest declared enter span in `scope`, `0` when empty.
    pub fn longest_enter_duration(&self, scope: &ScopeId) -> Millis {
        self.aggregates.get(scope).map_or(0.0, |a| a.longest_enter)
    }

    /// Sum of exit spans in `scope`.
    pub fn total_exit_duration(&self, scope: &ScopeId) -> Millis {
        self.aggregates.get(scope).map_or(0.0, |a| a.total_exit)
    }

    /// Whether any element of `scope` still waits to enter.
    pub fn has_idle(&self, scope: &ScopeId) -> bool {
        self.controllers
            .values()
            .any(|c| &c.element().scope == scope && c.status() == ElementStatus::Idle)
    }

    /// Run the entrance of every idle element of `scope`.
    ///
    /// Roots go first in registration order; each dispatched parent
    /// dispatches its own children through the stagger plan. An idle child
    /// whose parent already entered runs on its own delay.
    pub fn run_enter_scope(
        &mut self,
        scope: &ScopeId,
        generation: Generation,
        cx: &mut ControllerContext<'_>,
    ) -> usize {
        let candidates: Vec<ElementId> = self.all_for_scope(scope).map(|e| e.id.clone()).collect();
        let mut started = 0;
        for id in candidates {
            let Some(c) = self.controllers.get(&id) else {
                continue;
            };
            if c.status() != ElementStatus::Idle {
                continue;
            }
            let parent_pending = c
                .element()
                .parent
                .as_ref()
                .and_then(|p| self.controllers.get(p))
                .is_some_and(|p| p.status() == ElementStatus::Idle && &p.element().scope == scope);
            if parent_pending {
                continue;
            }
            started += self.enter_tree(&id, generation, None, cx);
        }
        if started > 0 && self.config.debug.enabled {
            debug!(scope = %scope, generation = generation.0, started, "entrance dispatched");
        }
        started
    }

    /// Dispatch `id` and, one level at a time, its children.
    fn enter_tree(
        &mut self,
        id: &ElementId,
        generation: Generation,
        delay: Option<Millis>,
        cx: &mut ControllerContext<'_>,
    ) -> usize {
        let Some(c) = self.controllers.get(id) else {
            return 0;
        };
        let params = StaggerParams::from_transition(&c.element().transition);
        let children: Vec<ElementId> = self.children_of(id).to_vec();
        let plan = stagger::plan(params.as_ref(), &children);

        let mut started = 0;
        for step in plan.steps {
            match step {
                DispatchStep::Parent { delay_ms } => {
                    if let Some(c) = self.controllers.get_mut(id) {
                        c.override_delay(delay_ms.or(delay));
                        if c.run_enter(generation, cx) {
                            started += 1;
                        }
                    }
                }
                DispatchStep::Child(slot) => {
                    started += self.enter_tree(&slot.id, generation, slot.delay_ms, cx);
                }
            }
        }
        started
    }

    /// Start the exit of every element of `scope`, in registration order.
    pub fn run_exit_scope(
        &mut self,
        scope: &ScopeId,
        cx: &mut ControllerContext<'_>,
    ) -> Vec<(ElementId, ExitSignal)> {
        let ids: Vec<ElementId> = self.all_for_scope(scope).map(|e| e.id.clone()).collect();
        ids.into_iter()
            .filter_map(|id| {
                let signal = self.controllers.get_mut(&id)?.run_exit(cx);
                Some((id, signal))
            })
            .collect()
    }

    /// Start the exit of one element.
    pub fn run_exit(&mut self, id: &ElementId, cx: &mut ControllerContext<'_>) -> Option<ExitSignal> {
        Some(self.controllers.get_mut(id)?.run_exit(cx))
    }

    pub fn cancel(&mut self, id: &ElementId, cx: &mut ControllerContext<'_>) -> bool {
        match self.controllers.get_mut(id) {
            Some(c) => {
                c.cancel(cx);
                true
            }
            None => false,
        }
    }

    /// Cancel every element.
    pub fn cancel_all(&mut self, cx: &mut ControllerContext<'_>) {
        for id in &self.order {
            if let Some(c) = self.controllers.get_mut(id) {
                c.cancel(cx);
            }
        }
    }

    /// Route an engine completion to its element.
    pub fn handle_completion(&mut self, completion: &Completion, cx: &mut ControllerContext<'_>) {
        if let Some(c) = self.controllers.get_mut(&completion.target) {
            c.on_completion(completion.tween, cx);
        }
    }

    /// Flush enter tweens staged on the previous frame.
    pub fn flush_staged(&mut self, cx: &mut ControllerContext<'_>) {
        for id in &self.order {
            if let Some(c) = self.controllers.get_mut(id) {
                c.flush_staged(cx);
            }
        }
    }

    pub fn process_timers(&mut self, cx: &mut ControllerContext<'_>) {
        for c in self.controllers.values_mut() {
            c.process_timers(cx);
        }
    }

    pub fn start_interaction(
        &mut self,
        id: &ElementId,
        kind: Interaction,
        cx: &mut ControllerContext<'_>,
    ) -> bool {
        self.controllers
            .get_mut(id)
            .is_some_and(|c| c.start_interaction(kind, cx))
    }

    pub fn end_interaction(
        &mut self,
        id: &ElementId,
        kind: Interaction,
        cx: &mut ControllerContext<'_>,
    ) -> bool {
        self.controllers
            .get_mut(id)
            .is_some_and(|c| c.end_interaction(kind, cx))
    }
}

static_assertions::assert_impl_all!(ElementRegistry: Send);
