use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Result, VisualiserError};

/// Selects which renderer draws the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStyle {
    #[default]
    Bars,
    Waveform,
    #[serde(alias = "circle")]
    Radial,
}

impl RenderStyle {
    pub const ALL: [RenderStyle; 3] = [
        RenderStyle::Bars,
        RenderStyle::Waveform,
        RenderStyle::Radial,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RenderStyle::Bars => "bars",
            RenderStyle::Waveform => "waveform",
            RenderStyle::Radial => "radial",
        }
    }
}

impl fmt::Display for RenderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RenderStyle {
    type Err = VisualiserError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bars" => Ok(RenderStyle::Bars),
            "waveform" => Ok(RenderStyle::Waveform),
            "radial" | "circle" => Ok(RenderStyle::Radial),
            other => Err(VisualiserError::InvalidParameter(format!(
                "unknown render style `{other}`"
            ))),
        }
    }
}

/// 8-bit RGB colour, serialised as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear blend towards `other`; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = VisualiserError;

    fn from_str(value: &str) -> Result<Self> {
        let invalid =
            || VisualiserError::InvalidParameter(format!("`{value}` is not a #rrggbb colour"));
        let hex = value.trim().strip_prefix('#').ok_or_else(invalid)?;
        // `from_str_radix` alone would accept a sign in front of each pair.
        if hex.len() != 6 || !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = VisualiserError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// Render configuration read once per frame.
///
/// Each field has a single writer (the matching control) and is only read by
/// the renderer of the next tick, so a write never affects a frame that is
/// already being drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderParameters {
    style: RenderStyle,
    sensitivity: f32,
    color: Rgb,
}

impl Default for RenderParameters {
    fn default() -> Self {
        Self {
            style: RenderStyle::Bars,
            sensitivity: 5.0,
            color: Rgb::new(0x00, 0xff, 0xcc),
        }
    }
}

impl RenderParameters {
    pub fn new(style: RenderStyle, sensitivity: f32, color: Rgb) -> Result<Self> {
        let mut params = Self::default();
        params.set_style(style);
        params.set_sensitivity(sensitivity)?;
        params.set_color(color);
        Ok(params)
    }

    pub fn style(&self) -> RenderStyle {
        self.style
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn set_style(&mut self, style: RenderStyle) {
        tracing::debug!(%style, "render style changed");
        self.style = style;
    }

    /// Rejects negative and non-finite values; the previous value is kept.
    pub fn set_sensitivity(&mut self, sensitivity: f32) -> Result<()> {
        if !sensitivity.is_finite() || sensitivity < 0.0 {
            return Err(VisualiserError::InvalidParameter(format!(
                "sensitivity must be a finite, non-negative number (got {sensitivity})"
            )));
        }

        tracing::debug!(sensitivity, "sensitivity changed");
        self.sensitivity = sensitivity;
        Ok(())
    }

    pub fn set_color(&mut self, color: Rgb) {
        tracing::debug!(%color, "render colour changed");
        self.color = color;
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.sensitivity.is_finite() || self.sensitivity < 0.0 {
            return Err(VisualiserError::InvalidConfig(format!(
                "render.sensitivity must be a finite, non-negative number (got {})",
                self.sensitivity
            )));
        }
        Ok(())
    }
}
