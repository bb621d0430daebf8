//! Visual states.
//!
//! A `VisualState` is what an element looks like at one point of its life
//! (`initial`, `enter`, `exit`, or an interaction excursion): a map of raw
//! property values plus an optional timing override.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::transition::TransitionSpec;
use crate::types::ElementId;
use crate::value::{resolve_value, MotionValue, PropertyMap, RawValue};

/// Named visual state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    #[serde(flatten)]
    pub properties: BTreeMap<String, RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionSpec>,
}

impl VisualState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a property.
    pub fn with(mut self, property: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.properties.insert(property.into(), value.into());
        self
    }

    pub fn with_transition(mut self, transition: TransitionSpec) -> Self {
        self.transition = Some(transition);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn contains(&self, property: &str) -> bool {
        self.properties.contains_key(property)
    }

    /// Resolve every property, skipping the ones that fail to parse.
    pub fn resolve(&self, element: &ElementId) -> PropertyMap {
        self.properties
            .iter()
            .filter_map(|(name, raw)| match resolve_value(name, raw) {
                Ok(value) => Some((name.clone(), value)),
                Err(e) => {
                    warn!(element = %element, property = %name, error = %e, "skipping property");
                    None
                }
            })
            .collect()
    }

    /// Resolve only `property`, if present and valid.
    pub fn resolve_one(&self, element: &ElementId, property: &str) -> Option<MotionValue> {
        let raw = self.properties.get(property)?;
        match resolve_value(property, raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(element = %element, property = %property, error = %e, "skipping property");
                None
            }
        }
    }
}
