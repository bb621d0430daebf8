//! Visual property values.
//!
//! Authors describe targets loosely (`"opacity": 0`, `"y": "20px"`,
//! `"backgroundColor": "aqua"`). `resolve_value` turns one raw entry into a
//! typed `MotionValue`; a value that cannot be parsed is reported as a
//! `ValueError` so the caller can skip just that property.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ValueError;

/// Resolved property name → value map handed to the visual engine.
pub type PropertyMap = BTreeMap<String, MotionValue>;

/// A raw property value as written by an author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Unit of a length value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    Px,
    Percent,
    Em,
    Rem,
    Vw,
    Vh,
    Deg,
}

impl LengthUnit {
    const SUFFIXES: [(&'static str, LengthUnit); 7] = [
        ("rem", LengthUnit::Rem),
        ("px", LengthUnit::Px),
        ("em", LengthUnit::Em),
        ("vw", LengthUnit::Vw),
        ("vh", LengthUnit::Vh),
        ("deg", LengthUnit::Deg),
        ("%", LengthUnit::Percent),
    ];

    fn suffix(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Percent => "%",
            Self::Em => "em",
            Self::Rem => "rem",
            Self::Vw => "vw",
            Self::Vh => "vh",
            Self::Deg => "deg",
        }
    }
}

/// A typed, interpolatable visual property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MotionValue {
    /// Unitless number (opacity, scale, ...).
    Number { value: f64 },
    /// Number with a unit.
    Length { value: f64, unit: LengthUnit },
    /// RGBA, each component in `[0, 1]`.
    Color { rgba: [f64; 4] },
    /// Anything else; switches discretely at the end of a tween.
    Keyword { value: String },
}

impl MotionValue {
    pub fn number(value: f64) -> Self {
        Self::Number { value }
    }

    pub fn px(value: f64) -> Self {
        Self::Length {
            value,
            unit: LengthUnit::Px,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<[f64; 4]> {
        match self {
            Self::Color { rgba } => Some(*rgba),
            _ => None,
        }
    }

    /// Interpolate toward `to` by `t` in `[0, 1]`.
    ///
    /// Values of different shapes (or lengths with different units) do not
    /// blend; they hold `self` until `t` reaches 1.
    pub fn interpolate(&self, to: &MotionValue, t: f64) -> MotionValue {
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        match (self, to) {
            (Self::Number { value: a }, Self::Number { value: b }) => Self::number(lerp(*a, *b)),
            (Self::Length { value: a, unit: ua }, Self::Length { value: b, unit: ub })
                if ua == ub =>
            {
                Self::Length {
                    value: lerp(*a, *b),
                    unit: *ua,
                }
            }
            (Self::Color { rgba: a }, Self::Color { rgba: b }) => Self::Color {
                rgba: [
                    lerp(a[0], b[0]),
                    lerp(a[1], b[1]),
                    lerp(a[2], b[2]),
                    lerp(a[3], b[3]),
                ],
            },
            _ if t >= 1.0 => to.clone(),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for MotionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number { value } => write!(f, "{value}"),
            Self::Length { value, unit } => write!(f, "{value}{}", unit.suffix()),
            Self::Color { rgba } => write!(
                f,
                "rgba({}, {}, {}, {})",
                (rgba[0] * 255.0).round(),
                (rgba[1] * 255.0).round(),
                (rgba[2] * 255.0).round(),
                rgba[3]
            ),
            Self::Keyword { value } => f.write_str(value),
        }
    }
}

/// Properties whose text values must parse as colors.
fn is_color_property(property: &str) -> bool {
    let lower = property.to_ascii_lowercase();
    lower.ends_with("color") || lower == "fill" || lower == "stroke"
}

/// Resolve one raw property value.
pub fn resolve_value(property: &str, raw: &RawValue) -> Result<MotionValue, ValueError> {
    match raw {
        RawValue::Number(value) => {
            if value.is_finite() {
                Ok(MotionValue::number(*value))
            } else {
                Err(ValueError::NotFinite {
                    property: property.to_string(),
                    value: *value,
                })
            }
        }
        RawValue::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(ValueError::Empty(property.to_string()));
            }
            if is_color_property(property) {
                return parse_color(text).map(|rgba| MotionValue::Color { rgba });
            }
            if text.starts_with('#') || text.starts_with("rgb") {
                return parse_color(text).map(|rgba| MotionValue::Color { rgba });
            }
            if let Ok(value) = text.parse::<f64>() {
                if value.is_finite() {
                    return Ok(MotionValue::number(value));
                }
            }
            if let Some(length) = parse_length(text) {
                return length;
            }
            Ok(MotionValue::Keyword {
                value: text.to_string(),
            })
        }
    }
}

/// `Some(Ok)` for a well-formed length, `Some(Err)` for a known unit with
/// a bad number, `None` when the text has no length unit.
fn parse_length(text: &str) -> Option<Result<MotionValue, ValueError>> {
    let (number, unit) = LengthUnit::SUFFIXES
        .iter()
        .find_map(|(suffix, unit)| text.strip_suffix(suffix).map(|n| (n, *unit)))?;
    // `translateY(20px)` ends in `px)` and is not a length
    if number.is_empty() || !number.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.' || c == '+') {
        return None;
    }
    Some(match number.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(MotionValue::Length { value, unit }),
        _ => Err(ValueError::InvalidLength(text.to_string())),
    })
}

const NAMED_COLORS: [(&str, [u8; 3]); 11] = [
    ("aqua", [0x00, 0xff, 0xff]),
    ("red", [0xff, 0x00, 0x00]),
    ("blue", [0x00, 0x00, 0xff]),
    ("green", [0x00, 0x80, 0x00]),
    ("yellow", [0xff, 0xff, 0x00]),
    ("purple", [0x80, 0x00, 0x80]),
    ("orange", [0xff, 0xa5, 0x00]),
    ("black", [0x00, 0x00, 0x00]),
    ("white", [0xff, 0xff, 0xff]),
    ("gray", [0x80, 0x80, 0x80]),
    ("transparent", [0x00, 0x00, 0x00]),
];

/// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`, `rgba(..)` or a named color.
pub fn parse_color(text: &str) -> Result<[f64; 4], ValueError> {
    let invalid = || ValueError::InvalidColor(text.to_string());
    let lower = text.trim().to_ascii_lowercase();

    if let Some(hex) = lower.strip_prefix('#') {
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()
            .ok_or_else(invalid)?;
        let channel = |hi: u8, lo: u8| f64::from(hi * 16 + lo) / 255.0;
        return match digits.as_slice() {
            [r, g, b] => Ok([channel(*r, *r), channel(*g, *g), channel(*b, *b), 1.0]),
            [r1, r2, g1, g2, b1, b2] => Ok([
                channel(*r1, *r2),
                channel(*g1, *g2),
                channel(*b1, *b2),
                1.0,
            ]),
            [r1, r2, g1, g2, b1, b2, a1, a2] => Ok([
                channel(*r1, *r2),
                channel(*g1, *g2),
                channel(*b1, *b2),
                channel(*a1, *a2),
            ]),
            _ => Err(invalid()),
        };
    }

    let body = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'));
    if let Some(body) = body {
        let parts: Vec<f64> = body
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| invalid())?;
        let in_range = |v: f64, max: f64| v.is_finite() && (0.0..=max).contains(&v);
        return match parts.as_slice() {
            [r, g, b] if [r, g, b].iter().all(|v| in_range(**v, 255.0)) => {
                Ok([r / 255.0, g / 255.0, b / 255.0, 1.0])
            }
            [r, g, b, a]
                if [r, g, b].iter().all(|v| in_range(**v, 255.0)) && in_range(*a, 1.0) =>
            {
                Ok([r / 255.0, g / 255.0, b / 255.0, *a])
            }
            _ => Err(invalid()),
        };
    }

    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(name, [r, g, b])| {
            let alpha = if *name == "transparent" { 0.0 } else { 1.0 };
            [
                f64::from(*r) / 255.0,
                f64::from(*g) / 255.0,
                f64::from(*b) / 255.0,
                alpha,
            ]
        })
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_and_lengths() {
        assert_eq!(
            resolve_value("opacity", &RawValue::Number(0.5)).unwrap(),
            MotionValue::number(0.5)
        );
        assert_eq!(
            resolve_value("y", &"20px".into()).unwrap(),
            MotionValue::px(20.0)
        );
        assert_eq!(
            resolve_value("width", &"50%".into()).unwrap(),
            MotionValue::Length {
                value: 50.0,
                unit: LengthUnit::Percent
            }
        );
        assert_eq!(
            resolve_value("scale", &"1.2".into()).unwrap(),
            MotionValue::number(1.2)
        );
        assert!(matches!(
            resolve_value("x", &"1.2.3px".into()),
            Err(ValueError::InvalidLength(_))
        ));
    }

    #[test]
    fn test_keywords_pass_through() {
        assert_eq!(
            resolve_value("transform", &"translateY(20px)".into()).unwrap(),
            MotionValue::Keyword {
                value: "translateY(20px)".into()
            }
        );
        assert_eq!(
            resolve_value("display", &"none".into()).unwrap(),
            MotionValue::Keyword {
                value: "none".into()
            }
        );
    }

    #[test]
    fn test_colors() {
        assert_eq!(parse_color("#fff").unwrap(), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(parse_color("#ff0000").unwrap(), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(parse_color("rgba(0, 0, 255, 0.5)").unwrap(), [0.0, 0.0, 1.0, 0.5]);
        assert_eq!(parse_color("aqua").unwrap(), [0.0, 1.0, 1.0, 1.0]);
        assert!(parse_color("#ggg").is_err());
        assert!(parse_color("rgb(300, 0, 0)").is_err());
    }

    #[test]
    fn test_color_properties_require_colors() {
        assert!(matches!(
            resolve_value("backgroundColor", &"not-a-color".into()),
            Err(ValueError::InvalidColor(_))
        ));
        assert!(resolve_value("borderColor", &"red".into()).is_ok());
    }

    #[test]
    fn test_rejects_empty_and_non_finite() {
        assert!(matches!(
            resolve_value("opacity", &"  ".into()),
            Err(ValueError::Empty(_))
        ));
        assert!(matches!(
            resolve_value("opacity", &RawValue::Number(f64::INFINITY)),
            Err(ValueError::NotFinite { .. })
        ));
    }

    #[test]
    fn test_interpolation() {
        let a = MotionValue::number(0.0);
        let b = MotionValue::number(10.0);
        assert_eq!(a.interpolate(&b, 0.5), MotionValue::number(5.0));

        let red = MotionValue::Color { rgba: [1.0, 0.0, 0.0, 1.0] };
        let blue = MotionValue::Color { rgba: [0.0, 0.0, 1.0, 1.0] };
        assert_eq!(red.interpolate(&blue, 0.5).as_color(), Some([0.5, 0.0, 0.5, 1.0]));

        let px = MotionValue::px(10.0);
        let pct = MotionValue::Length { value: 50.0, unit: LengthUnit::Percent };
        assert_eq!(px.interpolate(&pct, 0.5), px);
        assert_eq!(px.interpolate(&pct, 1.0), pct);
    }

    #[test]
    fn test_display() {
        assert_eq!(MotionValue::px(20.0).to_string(), "20px");
        assert_eq!(
            MotionValue::Color { rgba: [1.0, 0.0, 0.0, 1.0] }.to_string(),
            "rgba(255, 0, 0, 1)"
        );
    }
}
