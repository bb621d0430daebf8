//! Visual mutation engine contract and a reference timeline engine.
//!
//! The orchestration layer never interpolates anything itself. It asks a
//! `VisualEngine` to apply property maps and to run tweens, and learns about
//! finished tweens only through the completions returned by
//! [`VisualEngine::advance`].
//!
//! `TimelineEngine` keeps the current value of every `(element, property)`
//! pair and interpolates numbers, lengths and colors. Starting a tween on a
//! pair that is already animating retargets it: the newer tween takes the
//! property over from its current value.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::easing::EasingFunction;
use crate::error::EngineError;
use crate::transition::{Repeat, ResolvedTransition};
use crate::types::{ElementId, Millis};
use crate::value::{MotionValue, PropertyMap};

/// Identifier of a running tween, unique per engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TweenId(pub u64);

/// Timing of one tween.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenOptions {
    pub duration_ms: Millis,
    pub delay_ms: Millis,
    pub easing: EasingFunction,
    pub repeat: Repeat,
    pub repeat_delay_ms: Millis,
}

impl From<&ResolvedTransition> for TweenOptions {
    fn from(t: &ResolvedTransition) -> Self {
        Self {
            duration_ms: t.duration_ms,
            delay_ms: t.delay_ms,
            easing: t.easing,
            repeat: t.repeat,
            repeat_delay_ms: t.repeat_delay_ms,
        }
    }
}

impl Default for TweenOptions {
    fn default() -> Self {
        Self {
            duration_ms: 300.0,
            delay_ms: 0.0,
            easing: EasingFunction::Ease,
            repeat: Repeat::ONCE,
            repeat_delay_ms: 0.0,
        }
    }
}

/// A tween that ran to its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub tween: TweenId,
    pub target: ElementId,
}

/// Contract between the orchestration layer and whatever moves pixels.
///
/// `advance` is the only source of completions. A stopped tween never
/// completes.
pub trait VisualEngine {
    /// Set properties immediately.
    fn apply(&mut self, target: &ElementId, props: &PropertyMap) -> Result<(), EngineError>;

    /// Start a tween from the current values toward `props`. The delay is
    /// measured from the engine's current time.
    fn animate(
        &mut self,
        target: &ElementId,
        props: &PropertyMap,
        options: &TweenOptions,
    ) -> Result<TweenId, EngineError>;

    /// Stop a tween where it is. Unknown ids are ignored.
    fn stop(&mut self, tween: TweenId);

    /// Move the clock to `now` and return the tweens that finished.
    fn advance(&mut self, now: Millis) -> Vec<Completion>;
}

#[derive(Debug, Clone)]
struct ActiveTween {
    target: ElementId,
    from: PropertyMap,
    to: PropertyMap,
    start: Millis,
    options: TweenOptions,
    /// Every property was taken over by a newer tween.
    superseded: bool,
}

impl ActiveTween {
    /// Eased progress at `now`, and whether the tween is over.
    fn progress(&self, now: Millis) -> Option<(f64, bool)> {
        if now < self.start {
            return None;
        }
        let elapsed = now - self.start;
        let duration = self.options.duration_ms;
        let cycle = duration + self.options.repeat_delay_ms;

        let finished = match self.options.repeat.count() {
            Some(n) => {
                let total = duration * f64::from(n + 1) + self.options.repeat_delay_ms * f64::from(n);
                elapsed >= total
            }
            None => false,
        };
        if finished {
            return Some((1.0, true));
        }
        if duration <= 0.0 {
            return Some((1.0, false));
        }

        let local = if cycle > 0.0 { elapsed % cycle } else { elapsed };
        let linear = (local / duration).min(1.0);
        Some((self.options.easing.evaluate(linear), false))
    }
}

/// Reference `VisualEngine` that interpolates in memory.
#[derive(Debug, Default)]
pub struct TimelineEngine {
    now: Millis,
    next_id: u64,
    tweens: BTreeMap<TweenId, ActiveTween>,
    /// Only one tween drives a given `(element, property)` pair.
    property_index: HashMap<(ElementId, String), TweenId>,
    values: HashMap<ElementId, PropertyMap>,
}

impl TimelineEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine clock, the `now` of the last `advance`.
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Current value of one property.
    pub fn value(&self, target: &ElementId, property: &str) -> Option<&MotionValue> {
        self.values.get(target)?.get(property)
    }

    /// Current values of every property of `target`.
    pub fn values(&self, target: &ElementId) -> Option<&PropertyMap> {
        self.values.get(target)
    }

    /// Number of tweens that have not finished or been stopped.
    pub fn active_count(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_animating(&self, target: &ElementId) -> bool {
        self.tweens.values().any(|t| &t.target == target && !t.superseded)
    }

    /// Drop every value and tween of `target`.
    pub fn detach(&mut self, target: &ElementId) {
        self.values.remove(target);
        self.tweens.retain(|_, t| &t.target != target);
        self.property_index.retain(|(element, _), _| element != target);
    }

    fn allocate_id(&mut self) -> TweenId {
        self.next_id += 1;
        TweenId(self.next_id)
    }

    /// Hand `property` of `target` to `owner`, detaching it from the tween
    /// that held it before.
    fn claim(&mut self, target: &ElementId, property: &str, owner: TweenId) {
        let key = (target.clone(), property.to_string());
        if let Some(previous) = self.property_index.insert(key, owner) {
            if let Some(tween) = self.tweens.get_mut(&previous) {
                tween.from.remove(property);
                tween.to.remove(property);
                if tween.to.is_empty() {
                    tween.superseded = true;
                }
            }
        }
    }

    fn release_properties(&mut self, id: TweenId, tween: &ActiveTween) {
        for property in tween.to.keys() {
            let key = (tween.target.clone(), property.clone());
            if self.property_index.get(&key) == Some(&id) {
                self.property_index.remove(&key);
            }
        }
    }
}

impl VisualEngine for TimelineEngine {
    fn apply(&mut self, target: &ElementId, props: &PropertyMap) -> Result<(), EngineError> {
        for property in props.keys() {
            let key = (target.clone(), property.clone());
            if let Some(owner) = self.property_index.remove(&key) {
                if let Some(tween) = self.tweens.get_mut(&owner) {
                    tween.from.remove(property);
                    tween.to.remove(property);
                    if tween.to.is_empty() {
                        tween.superseded = true;
                    }
                }
            }
        }
        let values = self.values.entry(target.clone()).or_default();
        for (property, value) in props {
            values.insert(property.clone(), value.clone());
        }
        Ok(())
    }

    fn animate(
        &mut self,
        target: &ElementId,
        props: &PropertyMap,
        options: &TweenOptions,
    ) -> Result<TweenId, EngineError> {
        if !options.duration_ms.is_finite() || !options.delay_ms.is_finite() {
            return Err(EngineError::Other(format!(
                "non-finite timing for {target}: duration {} delay {}",
                options.duration_ms, options.delay_ms
            )));
        }

        let id = self.allocate_id();
        let current = self.values.get(target);
        let from: PropertyMap = props
            .iter()
            .map(|(property, to)| {
                let start = current
                    .and_then(|values| values.get(property))
                    .cloned()
                    .unwrap_or_else(|| to.clone());
                (property.clone(), start)
            })
            .collect();

        for property in props.keys() {
            self.claim(target, property, id);
        }

        self.tweens.insert(
            id,
            ActiveTween {
                target: target.clone(),
                from,
                to: props.clone(),
                start: self.now + options.delay_ms.max(0.0),
                options: *options,
                superseded: false,
            },
        );
        Ok(id)
    }

    fn stop(&mut self, tween: TweenId) {
        if let Some(removed) = self.tweens.remove(&tween) {
            self.release_properties(tween, &removed);
        }
    }

    fn advance(&mut self, now: Millis) -> Vec<Completion> {
        if now > self.now {
            self.now = now;
        }
        let now = self.now;

        let mut finished = Vec::new();
        for (id, tween) in &self.tweens {
            if tween.superseded {
                finished.push(*id);
                continue;
            }
            let Some((eased, done)) = tween.progress(now) else {
                continue;
            };
            let values = self.values.entry(tween.target.clone()).or_default();
            for (property, to) in &tween.to {
                let value = match tween.from.get(property) {
                    Some(from) if !done => from.interpolate(to, eased),
                    _ => to.clone(),
                };
                values.insert(property.clone(), value);
            }
            if done {
                finished.push(*id);
            }
        }

        finished
            .into_iter()
            .filter_map(|id| {
                let tween = self.tweens.remove(&id)?;
                self.release_properties(id, &tween);
                Some(Completion {
                    tween: id,
                    target: tween.target,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opacity(v: f64) -> PropertyMap {
        PropertyMap::from([("opacity".to_string(), MotionValue::number(v))])
    }

    fn linear(duration_ms: Millis) -> TweenOptions {
        TweenOptions {
            duration_ms,
            easing: EasingFunction::Linear,
            ..TweenOptions::default()
        }
    }

    #[test]
    fn test_tween_interpolates_and_completes() {
        let mut engine = TimelineEngine::new();
        let card = ElementId::new("card");
        engine.apply(&card, &opacity(0.0)).unwrap();
        let id = engine.animate(&card, &opacity(1.0), &linear(100.0)).unwrap();

        assert!(engine.advance(50.0).is_empty());
        assert_eq!(engine.value(&card, "opacity"), Some(&MotionValue::number(0.5)));

        let done = engine.advance(100.0);
        assert_eq!(done, vec![Completion { tween: id, target: card.clone() }]);
        assert_eq!(engine.value(&card, "opacity"), Some(&MotionValue::number(1.0)));
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_delay_is_relative_to_engine_clock() {
        let mut engine = TimelineEngine::new();
        let card = ElementId::new("card");
        engine.advance(1000.0);
        engine.apply(&card, &opacity(0.0)).unwrap();
        let options = TweenOptions { delay_ms: 200.0, ..linear(100.0) };
        engine.animate(&card, &opacity(1.0), &options).unwrap();

        assert!(engine.advance(1150.0).is_empty());
        assert_eq!(engine.value(&card, "opacity"), Some(&MotionValue::number(0.0)));
        assert_eq!(engine.advance(1300.0).len(), 1);
    }

    #[test]
    fn test_stopped_tween_never_completes() {
        let mut engine = TimelineEngine::new();
        let card = ElementId::new("card");
        let id = engine.animate(&card, &opacity(1.0), &linear(100.0)).unwrap();
        engine.stop(id);
        assert!(engine.advance(500.0).is_empty());
    }

    #[test]
    fn test_retarget_takes_over_property() {
        let mut engine = TimelineEngine::new();
        let card = ElementId::new("card");
        engine.apply(&card, &opacity(0.0)).unwrap();
        let first = engine.animate(&card, &opacity(1.0), &linear(100.0)).unwrap();
        engine.advance(50.0);

        let second = engine.animate(&card, &opacity(0.0), &linear(100.0)).unwrap();
        let done = engine.advance(60.0);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].tween, first);

        engine.advance(100.0);
        let value = engine.value(&card, "opacity").and_then(MotionValue::as_number).unwrap();
        assert!(value < 0.5 && value > 0.0);

        let done = engine.advance(150.0);
        assert_eq!(done[0].tween, second);
        assert_eq!(engine.value(&card, "opacity"), Some(&MotionValue::number(0.0)));
    }

    #[test]
    fn test_repeat_counts_and_infinite() {
        let mut engine = TimelineEngine::new();
        let card = ElementId::new("card");
        let twice = TweenOptions {
            repeat: Repeat::Count(1),
            repeat_delay_ms: 50.0,
            ..linear(100.0)
        };
        engine.animate(&card, &opacity(1.0), &twice).unwrap();
        assert!(engine.advance(200.0).is_empty());
        assert_eq!(engine.advance(250.0).len(), 1);

        let spinner = ElementId::new("spinner");
        let forever = TweenOptions { repeat: Repeat::Infinite, ..linear(100.0) };
        engine.animate(&spinner, &opacity(1.0), &forever).unwrap();
        assert!(engine.advance(100_000.0).is_empty());
        assert!(engine.is_animating(&spinner));
    }

    #[test]
    fn test_zero_duration_completes_on_next_advance() {
        let mut engine = TimelineEngine::new();
        let card = ElementId::new("card");
        engine.animate(&card, &opacity(0.3), &linear(0.0)).unwrap();
        assert_eq!(engine.advance(0.0).len(), 1);
        assert_eq!(engine.value(&card, "opacity"), Some(&MotionValue::number(0.3)));
    }

    #[test]
    fn test_non_finite_timing_is_rejected() {
        let mut engine = TimelineEngine::new();
        let card = ElementId::new("card");
        assert!(engine.animate(&card, &opacity(1.0), &linear(f64::NAN)).is_err());
    }
}
