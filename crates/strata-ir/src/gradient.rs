use serde::{Deserialize, Serialize};
use strata_core::Color;

/// Gradient shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientKind {
    Linear,
    Radial,
}

/// A two-color gradient fill description.
///
/// The drawable geometry (axis endpoints or center/radius plus color
/// stops) is derived by the render crate from the target dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientSpec {
    #[serde(rename = "type")]
    pub kind: GradientKind,
    /// Axis rotation in degrees (linear gradients only).
    #[serde(default)]
    pub rotation: f64,
    /// Position of the start color stop, in [0, 1).
    #[serde(default)]
    pub spread: f64,
    pub start_color: Color,
    pub end_color: Color,
}

impl GradientSpec {
    pub fn linear(start_color: Color, end_color: Color) -> Self {
        Self {
            kind: GradientKind::Linear,
            rotation: 0.0,
            spread: 0.0,
            start_color,
            end_color,
        }
    }

    pub fn radial(start_color: Color, end_color: Color) -> Self {
        Self {
            kind: GradientKind::Radial,
            rotation: 0.0,
            spread: 0.0,
            start_color,
            end_color,
        }
    }

    /// Builder: rotate the gradient axis.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    /// Builder: move the start stop.
    pub fn with_spread(mut self, spread: f64) -> Self {
        self.spread = spread;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let g = GradientSpec::linear(Color::BLACK, Color::WHITE);
        assert_eq!(g.rotation, 0.0);
        assert_eq!(g.spread, 0.0);
        assert_eq!(g.kind, GradientKind::Linear);
    }

    #[test]
    fn test_serde_kind_tag() {
        let g = GradientSpec::radial(Color::RED, Color::BLUE).with_spread(0.25);
        let json = serde_json::to_string(&g).unwrap();
        assert!(json.contains("\"type\":\"radial\""));
        let back: GradientSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, g);
    }
}
