use std::str::FromStr;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Lighten, Srgb};

use crate::config::ChartColors;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            to_color32(Hsl::new(hue, 0.75, 0.55).into_color(), 255)
        })
        .collect()
}

fn to_color32(rgb: Srgb, alpha: u8) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgba_unmultiplied(rgb.red, rgb.green, rgb.blue, alpha)
}

// ---------------------------------------------------------------------------
// Chart styles
// ---------------------------------------------------------------------------

/// Line and area fill colour of one trend chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStyle {
    pub line: Color32,
    /// Lighter, translucent variant for the area under the line.
    pub fill: Color32,
}

impl SeriesStyle {
    pub fn from_rgb(rgb: Srgb) -> Self {
        let hsl: Hsl = rgb.into_color();
        SeriesStyle {
            line: to_color32(rgb, 255),
            fill: to_color32(hsl.lighten(0.35).into_color(), 40),
        }
    }

    /// Parse `#rrggbb`. Unparseable input yields `None`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let rgb = Srgb::<u8>::from_str(hex.trim()).ok()?;
        Some(Self::from_rgb(rgb.into_format()))
    }
}

/// Styles for the three trend charts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPalette {
    pub daily: SeriesStyle,
    pub periodic: SeriesStyle,
    pub auxiliary: SeriesStyle,
}

impl ChartPalette {
    /// Styles from configured hex colours; bad entries fall back to evenly
    /// spaced hues.
    pub fn from_config(colors: &ChartColors) -> Self {
        let fallback = generate_palette(3);
        let pick = |hex: &str, idx: usize| {
            SeriesStyle::from_hex(hex).unwrap_or_else(|| {
                log::warn!("invalid chart colour '{hex}', using a generated one");
                let c = fallback[idx];
                SeriesStyle::from_rgb(Srgb::new(c.r(), c.g(), c.b()).into_format())
            })
        };
        ChartPalette {
            daily: pick(&colors.daily, 0),
            periodic: pick(&colors.periodic, 1),
            auxiliary: pick(&colors.auxiliary, 2),
        }
    }
}
