//! Fade curve shapes for volume ramps
//!
//! A curve maps normalized progress `t` (0.0 start of fade, 1.0 end) to a
//! mix factor between the start and target volume.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FadeCurve {
    /// v(t) = t, constant rate of change
    Linear,

    /// v(t) = t², slow start, fast finish
    Exponential,

    /// v(t) = 1 - (1-t)², fast start, slow finish
    Logarithmic,

    /// v(t) = 0.5 × (1 - cos(π × t))
    SCurve,
}

impl FadeCurve {
    /// Mix factor at progress `t` (clamped to 0..=1)
    pub fn factor(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => t,
            FadeCurve::Exponential => t * t,
            FadeCurve::Logarithmic => {
                let inv = 1.0 - t;
                1.0 - inv * inv
            }
            FadeCurve::SCurve => 0.5 * (1.0 - (PI * t).cos()),
        }
    }

    /// Volume between `from` and `to` at progress `t`
    pub fn ramp(&self, from: f32, to: f32, t: f32) -> f32 {
        from + (to - from) * self.factor(t)
    }

    /// Parse from config text
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" => Some(FadeCurve::Linear),
            "exponential" => Some(FadeCurve::Exponential),
            "logarithmic" => Some(FadeCurve::Logarithmic),
            "cosine" | "scurve" | "s-curve" | "s_curve" => Some(FadeCurve::SCurve),
            _ => None,
        }
    }
}

impl Default for FadeCurve {
    /// Volume fades are linear unless configured otherwise
    fn default() -> Self {
        FadeCurve::Linear
    }
}
