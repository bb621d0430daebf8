//! Transition timing.
//!
//! - `TransitionSpec`: author-facing timing where every field is optional
//! - `ResolvedTransition`: concrete timing handed to the visual engine
//! - `resolve_transition`: per-field precedence between a state override,
//!   the element default and the configured default
//!
//! # Example
//!
//! ```
//! use rune_motion_core::transition::{resolve_transition, TransitionSpec};
//! use rune_config::TransitionDefaults;
//!
//! let element = TransitionSpec::new().with_duration(400.0);
//! let exit = TransitionSpec::new().with_delay(50.0);
//! let resolved = resolve_transition(&element, Some(&exit), &TransitionDefaults::default());
//! assert_eq!(resolved.duration_ms, 400.0);
//! assert_eq!(resolved.delay_ms, 50.0);
//! ```

use rune_config::TransitionDefaults;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::easing::EasingFunction;
use crate::types::Millis;

/// How many extra times a tween plays after the first run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// Play `n` additional times; `Count(0)` plays once.
    Count(u32),
    /// Loop until stopped. Never reports completion.
    Infinite,
}

impl Default for Repeat {
    fn default() -> Self {
        Self::ONCE
    }
}

impl Repeat {
    pub const ONCE: Repeat = Repeat::Count(0);

    /// Normalized repeat count (`None` for infinite).
    pub fn count(self) -> Option<u32> {
        match self {
            Self::Count(n) => Some(n),
            Self::Infinite => None,
        }
    }

    pub fn is_infinite(self) -> bool {
        matches!(self, Self::Infinite)
    }
}

/// Accepts `true` (loop forever), `false`, a count, or `"infinite"`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RepeatRepr {
    Flag(bool),
    Count(u32),
    Name(String),
}

impl Serialize for Repeat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.count() {
            Some(n) => RepeatRepr::Count(n).serialize(serializer),
            None => RepeatRepr::Name("infinite".into()).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Repeat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RepeatRepr::deserialize(deserializer)? {
            RepeatRepr::Flag(true) => Ok(Self::Infinite),
            RepeatRepr::Flag(false) => Ok(Self::ONCE),
            RepeatRepr::Count(n) => Ok(Self::Count(n)),
            RepeatRepr::Name(name) if name.eq_ignore_ascii_case("infinite") => Ok(Self::Infinite),
            RepeatRepr::Name(name) => Err(serde::de::Error::custom(format!(
                "invalid repeat `{name}`, expected a count, a bool or \"infinite\""
            ))),
        }
    }
}

/// Order in which children are staggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaggerDirection {
    /// First child starts first.
    #[default]
    Forward,
    /// Last child starts first.
    Reverse,
}

impl StaggerDirection {
    /// Maps the `1` / `-1` convention used in view markup.
    pub fn from_sign(sign: i32) -> Self {
        if sign < 0 { Self::Reverse } else { Self::Forward }
    }
}

/// When the parent animates relative to its staggered children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    /// Parent runs alongside the children at its own delay.
    #[default]
    Together,
    /// Parent is dispatched before the children.
    BeforeChildren,
    /// Parent waits until the last child has started.
    AfterChildren,
}

/// Author-facing transition timing. Every field is optional so that
/// overrides can be layered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<Millis>,
    /// Delay used for exits in place of `delay_ms`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_delay_ms: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub easing: Option<EasingFunction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<Repeat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_delay_ms: Option<Millis>,
    /// Spacing between consecutive children.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stagger_children_ms: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stagger_direction: Option<StaggerDirection>,
    /// Delay before the first child starts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_children_ms: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<OrderingPolicy>,
}

impl TransitionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(mut self, duration_ms: Millis) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_delay(mut self, delay_ms: Millis) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    pub fn with_exit_delay(mut self, delay_ms: Millis) -> Self {
        self.exit_delay_ms = Some(delay_ms);
        self
    }

    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = Some(repeat);
        self
    }

    pub fn with_repeat_delay(mut self, delay_ms: Millis) -> Self {
        self.repeat_delay_ms = Some(delay_ms);
        self
    }

    /// Stagger children by `spacing_ms` in `direction`.
    pub fn with_stagger(mut self, spacing_ms: Millis, direction: StaggerDirection) -> Self {
        self.stagger_children_ms = Some(spacing_ms);
        self.stagger_direction = Some(direction);
        self
    }

    pub fn with_delay_children(mut self, delay_ms: Millis) -> Self {
        self.delay_children_ms = Some(delay_ms);
        self
    }

    pub fn with_when(mut self, when: OrderingPolicy) -> Self {
        self.when = Some(when);
        self
    }

    /// True when any stagger field is declared.
    pub fn declares_stagger(&self) -> bool {
        self.stagger_children_ms.is_some() || self.delay_children_ms.is_some()
    }
}

/// Which transition is being resolved. Exits prefer `exit_delay_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    Enter,
    Exit,
    Interaction,
}

/// Concrete timing for one tween.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTransition {
    pub duration_ms: Millis,
    pub delay_ms: Millis,
    pub easing: EasingFunction,
    pub repeat: Repeat,
    pub repeat_delay_ms: Millis,
}

impl ResolvedTransition {
    /// `duration + delay` of one run.
    pub fn span_ms(&self) -> Millis {
        self.duration_ms + self.delay_ms
    }

    /// A transition with nothing to wait for.
    pub fn is_instant(&self) -> bool {
        self.duration_ms <= 0.0 && self.delay_ms <= 0.0
    }

    /// Replace the delay with a stagger override when one is present.
    pub fn with_delay_override(mut self, delay_ms: Option<Millis>) -> Self {
        if let Some(delay) = delay_ms {
            self.delay_ms = delay;
        }
        self
    }
}

fn sanitize(value: Millis) -> Millis {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Default easing from configuration, falling back to `ease` for an
/// unknown name.
pub fn default_easing(defaults: &TransitionDefaults) -> EasingFunction {
    EasingFunction::from_name(&defaults.easing).unwrap_or_else(|e| {
        warn!(error = %e, "falling back to `ease`");
        EasingFunction::Ease
    })
}

/// Resolve enter timing. See [`resolve_phase`].
pub fn resolve_transition(
    element: &TransitionSpec,
    state: Option<&TransitionSpec>,
    defaults: &TransitionDefaults,
) -> ResolvedTransition {
    resolve_phase(TransitionPhase::Enter, element, state, defaults)
}

/// Resolve timing field by field.
///
/// Each field takes the first value present in: the state override, the
/// element default, the configured default. For exits the delay chain is
/// state `delay_ms`, element `exit_delay_ms`, element `delay_ms`, default.
/// A stagger override is applied afterwards with
/// [`ResolvedTransition::with_delay_override`] and always wins.
pub fn resolve_phase(
    phase: TransitionPhase,
    element: &TransitionSpec,
    state: Option<&TransitionSpec>,
    defaults: &TransitionDefaults,
) -> ResolvedTransition {
    let pick = |field: fn(&TransitionSpec) -> Option<Millis>| {
        state.and_then(field).or_else(|| field(element))
    };

    let delay = match phase {
        TransitionPhase::Exit => state
            .and_then(|s| s.delay_ms)
            .or(element.exit_delay_ms)
            .or(element.delay_ms),
        TransitionPhase::Enter | TransitionPhase::Interaction => pick(|s| s.delay_ms),
    };

    ResolvedTransition {
        duration_ms: sanitize(pick(|s| s.duration_ms).unwrap_or(defaults.duration_ms)),
        delay_ms: sanitize(delay.unwrap_or(defaults.delay_ms)),
        easing: state
            .and_then(|s| s.easing)
            .or(element.easing)
            .unwrap_or_else(|| default_easing(defaults)),
        repeat: state
            .and_then(|s| s.repeat)
            .or(element.repeat)
            .unwrap_or(Repeat::ONCE),
        repeat_delay_ms: sanitize(
            pick(|s| s.repeat_delay_ms).unwrap_or(defaults.repeat_delay_ms),
        ),
    }
}
