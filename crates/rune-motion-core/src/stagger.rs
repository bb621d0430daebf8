//! Stagger coordination.
//!
//! Given a parent's stagger parameters and its children in sibling order,
//! `plan` produces the per-child effective delays and the order in which the
//! parent and children are dispatched. Planning is pure; the registry walks
//! the returned steps and recurses one level at a time.

use serde::{Deserialize, Serialize};

use crate::transition::{OrderingPolicy, StaggerDirection, TransitionSpec};
use crate::types::{ElementId, Millis};

/// Stagger parameters declared by a parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaggerParams {
    pub spacing_ms: Millis,
    pub direction: StaggerDirection,
    pub start_delay_ms: Millis,
    pub when: OrderingPolicy,
}

impl StaggerParams {
    /// Stagger parameters from a transition, or `None` when the transition
    /// declares neither a spacing nor a child-start delay.
    pub fn from_transition(spec: &TransitionSpec) -> Option<Self> {
        if !spec.declares_stagger() {
            return None;
        }
        let ms = |v: Option<Millis>| v.filter(|v| v.is_finite()).unwrap_or(0.0).max(0.0);
        Some(Self {
            spacing_ms: ms(spec.stagger_children_ms),
            direction: spec.stagger_direction.unwrap_or_default(),
            start_delay_ms: ms(spec.delay_children_ms),
            when: spec.when.unwrap_or_default(),
        })
    }

    /// Stagger index of child `index` among `count` siblings.
    pub fn stagger_index(&self, index: usize, count: usize) -> usize {
        match self.direction {
            StaggerDirection::Forward => index,
            StaggerDirection::Reverse => count.saturating_sub(1).saturating_sub(index),
        }
    }

    /// `child_start_delay + stagger_index * spacing`
    pub fn child_delay(&self, stagger_index: usize) -> Millis {
        self.start_delay_ms + stagger_index as Millis * self.spacing_ms
    }

    /// Parent delay under `AfterChildren`: `child_start_delay + n * spacing`.
    pub fn after_children_delay(&self, count: usize) -> Millis {
        self.start_delay_ms + count as Millis * self.spacing_ms
    }
}

/// One child's slot in a stagger pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildSlot {
    pub id: ElementId,
    pub child_index: usize,
    pub stagger_index: usize,
    /// Delay override, `None` when stagger is inactive.
    pub delay_ms: Option<Millis>,
}

/// A dispatch step, in the order the registry must execute them.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchStep {
    /// Run the parent, overriding its delay when `Some`.
    Parent { delay_ms: Option<Millis> },
    Child(ChildSlot),
}

/// Result of planning one parent and its direct children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StaggerPlan {
    pub steps: Vec<DispatchStep>,
}

impl StaggerPlan {
    pub fn children(&self) -> impl Iterator<Item = &ChildSlot> {
        self.steps.iter().filter_map(|step| match step {
            DispatchStep::Child(slot) => Some(slot),
            DispatchStep::Parent { .. } => None,
        })
    }

    pub fn parent_delay(&self) -> Option<Millis> {
        self.steps.iter().find_map(|step| match step {
            DispatchStep::Parent { delay_ms } => *delay_ms,
            DispatchStep::Child(_) => None,
        })
    }

    /// Position of the parent step within the dispatch order.
    pub fn parent_position(&self) -> usize {
        self.steps
            .iter()
            .position(|step| matches!(step, DispatchStep::Parent { .. }))
            .unwrap_or(0)
    }
}

/// Plan a stagger pass.
///
/// Stagger is active when `params` is `Some` and there is at least one
/// child. Inactive plans dispatch the parent first and leave every child on
/// its own delay. Active plans dispatch children in ascending stagger index.
pub fn plan(params: Option<&StaggerParams>, children: &[ElementId]) -> StaggerPlan {
    let count = children.len();
    let params = match params {
        Some(p) if count > 0 => p,
        _ => {
            let mut steps = Vec::with_capacity(count + 1);
            steps.push(DispatchStep::Parent { delay_ms: None });
            steps.extend(children.iter().enumerate().map(|(i, id)| {
                DispatchStep::Child(ChildSlot {
                    id: id.clone(),
                    child_index: i,
                    stagger_index: i,
                    delay_ms: None,
                })
            }));
            return StaggerPlan { steps };
        }
    };

    let mut slots: Vec<ChildSlot> = children
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let stagger_index = params.stagger_index(i, count);
            ChildSlot {
                id: id.clone(),
                child_index: i,
                stagger_index,
                delay_ms: Some(params.child_delay(stagger_index)),
            }
        })
        .collect();
    slots.sort_by_key(|slot| slot.stagger_index);

    let mut steps = Vec::with_capacity(count + 1);
    match params.when {
        OrderingPolicy::Together | OrderingPolicy::BeforeChildren => {
            steps.push(DispatchStep::Parent { delay_ms: None });
            steps.extend(slots.into_iter().map(DispatchStep::Child));
        }
        OrderingPolicy::AfterChildren => {
            steps.extend(slots.into_iter().map(DispatchStep::Child));
            steps.push(DispatchStep::Parent {
                delay_ms: Some(params.after_children_delay(count)),
            });
        }
    }
    StaggerPlan { steps }
}
