//! Layer blend modes.

use serde::{Deserialize, Serialize};

/// How a layer combines with what is below it.
///
/// The declaration order is the cycle order used when stepping through
/// modes with next/previous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerMode {
    #[default]
    Normal,
    Dissolve,
    Multiply,
    Divide,
    Screen,
    Overlay,
    Dodge,
    Burn,
    HardLight,
    SoftLight,
    GrainExtract,
    GrainMerge,
    Difference,
    Addition,
    Subtract,
    DarkenOnly,
    LightenOnly,
    Hue,
    Saturation,
    Color,
    Value,
    LchHue,
    LchChroma,
    LchColor,
    LchLightness,
}

impl LayerMode {
    /// All modes in cycle order.
    pub const ALL: [LayerMode; 25] = [
        LayerMode::Normal,
        LayerMode::Dissolve,
        LayerMode::Multiply,
        LayerMode::Divide,
        LayerMode::Screen,
        LayerMode::Overlay,
        LayerMode::Dodge,
        LayerMode::Burn,
        LayerMode::HardLight,
        LayerMode::SoftLight,
        LayerMode::GrainExtract,
        LayerMode::GrainMerge,
        LayerMode::Difference,
        LayerMode::Addition,
        LayerMode::Subtract,
        LayerMode::DarkenOnly,
        LayerMode::LightenOnly,
        LayerMode::Hue,
        LayerMode::Saturation,
        LayerMode::Color,
        LayerMode::Value,
        LayerMode::LchHue,
        LayerMode::LchChroma,
        LayerMode::LchColor,
        LayerMode::LchLightness,
    ];

    /// Position in the cycle.
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&m| m == self).unwrap_or(0)
    }

    /// Mode at a cycle position; out-of-range positions give `Normal`.
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or_default()
    }

    /// Modes that mix the color components together instead of working
    /// per channel.
    pub fn is_component_mode(self) -> bool {
        matches!(
            self,
            LayerMode::Hue
                | LayerMode::Saturation
                | LayerMode::Color
                | LayerMode::Value
                | LayerMode::LchHue
                | LayerMode::LchChroma
                | LayerMode::LchColor
                | LayerMode::LchLightness
        )
    }
}
