//! Easing functions for transition timing.
//!
//! Elements name their easing the way authors write it in view markup:
//! either a CSS-style keyword (`"ease-in-out"`) or a cubic bezier given as
//! four control values (`[0.4, 0.0, 0.2, 1.0]`).
//!
//! ```
//! use rune_motion_core::easing::EasingFunction;
//!
//! let ease = EasingFunction::from_name("ease-out").unwrap();
//! let progress = ease.evaluate(0.5);
//! assert!(progress > 0.5);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Easing function for transition timing.
///
/// Maps linear progress in `[0, 1]` to eased progress.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "EasingRepr", into = "EasingRepr")]
pub enum EasingFunction {
    /// No easing.
    Linear,
    /// CSS `ease`, `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
    #[default]
    Ease,
    /// CSS `ease-in`, `cubic-bezier(0.42, 0, 1, 1)`.
    EaseIn,
    /// CSS `ease-out`, `cubic-bezier(0, 0, 0.58, 1)`.
    EaseOut,
    /// CSS `ease-in-out`, `cubic-bezier(0.42, 0, 0.58, 1)`.
    EaseInOut,
    /// Custom curve. x values are in `[0, 1]`.
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

/// Wire form: a keyword or four bezier control values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum EasingRepr {
    Name(String),
    Bezier([f64; 4]),
}

impl TryFrom<EasingRepr> for EasingFunction {
    type Error = ValueError;

    fn try_from(repr: EasingRepr) -> Result<Self, Self::Error> {
        match repr {
            EasingRepr::Name(name) => Self::from_name(&name),
            EasingRepr::Bezier([x1, y1, x2, y2]) => Self::cubic_bezier(x1, y1, x2, y2),
        }
    }
}

impl From<EasingFunction> for EasingRepr {
    fn from(easing: EasingFunction) -> Self {
        match easing {
            EasingFunction::Linear => Self::Name("linear".into()),
            EasingFunction::Ease => Self::Name("ease".into()),
            EasingFunction::EaseIn => Self::Name("ease-in".into()),
            EasingFunction::EaseOut => Self::Name("ease-out".into()),
            EasingFunction::EaseInOut => Self::Name("ease-in-out".into()),
            EasingFunction::CubicBezier { x1, y1, x2, y2 } => Self::Bezier([x1, y1, x2, y2]),
        }
    }
}

impl EasingFunction {
    /// Parse a CSS-style easing keyword. Accepts `ease_in` and `easeIn`
    /// spellings as well as `ease-in`.
    pub fn from_name(name: &str) -> Result<Self, ValueError> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "linear" => Ok(Self::Linear),
            "ease" => Ok(Self::Ease),
            "easein" => Ok(Self::EaseIn),
            "easeout" => Ok(Self::EaseOut),
            "easeinout" => Ok(Self::EaseInOut),
            _ => Err(ValueError::UnknownEasing(name.to_string())),
        }
    }

    /// Create a custom cubic bezier easing.
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, ValueError> {
        if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
            return Err(ValueError::InvalidBezier([x1, y1, x2, y2]));
        }
        Ok(Self::CubicBezier { x1, y1, x2, y2 })
    }

    /// Evaluate the easing at `t` (clamped to `[0, 1]`).
    pub fn evaluate(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Self::Linear => t,
            Self::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(x1, y1, x2, y2, t),
        }
    }
}

fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, progress: f64) -> f64 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }
    let t = solve_bezier_x(x1, x2, progress);
    bezier_component(y1, y2, t)
}

/// Newton-Raphson for the curve parameter whose x equals `target_x`.
fn solve_bezier_x(x1: f64, x2: f64, target_x: f64) -> f64 {
    let mut t = target_x;
    for _ in 0..8 {
        let x = bezier_component(x1, x2, t) - target_x;
        if x.abs() < 1e-7 {
            break;
        }
        let dx = bezier_derivative(x1, x2, t);
        if dx.abs() < 1e-7 {
            break;
        }
        t = (t - x / dx).clamp(0.0, 1.0);
    }
    t
}

/// `3(1-t)²t·p1 + 3(1-t)t²·p2 + t³`
#[inline]
fn bezier_component(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t
}

#[inline]
fn bezier_derivative(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear() {
        let e = EasingFunction::Linear;
        assert_eq!(e.evaluate(0.0), 0.0);
        assert_eq!(e.evaluate(0.25), 0.25);
        assert_eq!(e.evaluate(1.0), 1.0);
    }

    #[test]
    fn test_endpoints_are_fixed() {
        for e in [
            EasingFunction::Ease,
            EasingFunction::EaseIn,
            EasingFunction::EaseOut,
            EasingFunction::EaseInOut,
        ] {
            assert_eq!(e.evaluate(0.0), 0.0);
            assert_eq!(e.evaluate(1.0), 1.0);
            assert_eq!(e.evaluate(-3.0), 0.0);
            assert_eq!(e.evaluate(7.0), 1.0);
        }
    }

    #[test]
    fn test_curve_shapes() {
        assert!(EasingFunction::EaseIn.evaluate(0.5) < 0.5);
        assert!(EasingFunction::EaseOut.evaluate(0.5) > 0.5);
        let mid = EasingFunction::EaseInOut.evaluate(0.5);
        assert!((mid - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_from_name_spellings() {
        assert_eq!(EasingFunction::from_name("ease-in-out").unwrap(), EasingFunction::EaseInOut);
        assert_eq!(EasingFunction::from_name("easeOut").unwrap(), EasingFunction::EaseOut);
        assert_eq!(EasingFunction::from_name("EASE_IN").unwrap(), EasingFunction::EaseIn);
        assert!(matches!(
            EasingFunction::from_name("wobble"),
            Err(ValueError::UnknownEasing(_))
        ));
    }

    #[test]
    fn test_bezier_validation() {
        assert!(EasingFunction::cubic_bezier(0.4, 0.0, 0.2, 1.0).is_ok());
        assert!(EasingFunction::cubic_bezier(1.4, 0.0, 0.2, 1.0).is_err());
    }

    #[test]
    fn test_serde_forms() {
        let e: EasingFunction = serde_json::from_str("\"ease-out\"").unwrap();
        assert_eq!(e, EasingFunction::EaseOut);

        let e: EasingFunction = serde_json::from_str("[0.4, 0.0, 0.2, 1.0]").unwrap();
        assert!(matches!(e, EasingFunction::CubicBezier { .. }));

        assert!(serde_json::from_str::<EasingFunction>("\"bounce\"").is_err());
        assert_eq!(serde_json::to_string(&EasingFunction::Linear).unwrap(), "\"linear\"");
    }
}
