//! Page geometry resolution
//!
//! Converts the canvas size chosen in the editor (a named preset or custom
//! dimensions) into the physical units the renderer and the remote export
//! services need. Twips (1/1440 inch) are what the DOCX converter expects;
//! pixels size the on-screen canvas.

use serde::{Deserialize, Serialize};

/// Twips per inch
pub const TWIPS_PER_INCH: f64 = 1440.0;

/// Millimetres per inch
pub const MM_PER_INCH: f64 = 25.4;

/// CSS pixels per inch
pub const PX_PER_INCH: f64 = 96.0;

/// Letter width in inches
const LETTER_WIDTH: f64 = 8.5;

/// Letter height in inches
const LETTER_HEIGHT: f64 = 11.0;

/// Default page margin in inches
const DEFAULT_MARGIN_IN: f64 = 1.0;

/// Narrow page margin in inches (A5 and metric custom sizes)
const NARROW_MARGIN_IN: f64 = 0.75;

/// Measurement unit of a canvas size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Inches
    #[default]
    In,
    /// Millimetres
    Mm,
    /// CSS pixels
    Px,
}

/// Named canvas size presets offered by the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CanvasPreset {
    A4,
    A5,
    #[default]
    Letter,
    Workbook,
    Custom,
}

/// A canvas size in its own unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasGeometry {
    pub width: f64,
    pub height: f64,
    pub unit: Unit,
}

impl Default for CanvasGeometry {
    fn default() -> Self {
        CanvasPreset::Letter.dimensions()
    }
}

impl CanvasGeometry {
    /// Width and height in inches
    pub fn to_inches(&self) -> (f64, f64) {
        (
            to_inches(self.width, self.unit),
            to_inches(self.height, self.unit),
        )
    }

    /// Width and height in CSS pixels, for sizing the on-screen canvas
    pub fn to_pixels(&self) -> (f64, f64) {
        (
            to_pixels(self.width, self.unit),
            to_pixels(self.height, self.unit),
        )
    }
}

impl CanvasPreset {
    /// Fixed dimensions of a preset
    ///
    /// `Custom` has no fixed size and yields the Letter dimensions.
    pub fn dimensions(self) -> CanvasGeometry {
        let (width, height) = match self {
            CanvasPreset::A4 => (8.27, 11.69),
            CanvasPreset::A5 => (5.83, 8.27),
            CanvasPreset::Letter | CanvasPreset::Workbook | CanvasPreset::Custom => {
                (LETTER_WIDTH, LETTER_HEIGHT)
            }
        };
        CanvasGeometry {
            width,
            height,
            unit: Unit::In,
        }
    }
}

/// What the user picked in the canvas size controls
///
/// Custom width and height are kept as the raw text the user typed; they
/// only matter when `preset` is [`CanvasPreset::Custom`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanvasSelection {
    pub preset: CanvasPreset,
    pub custom_width: Option<String>,
    pub custom_height: Option<String>,
    pub custom_unit: Unit,
}

impl CanvasSelection {
    /// Selection of a named preset
    pub fn preset(preset: CanvasPreset) -> Self {
        Self {
            preset,
            ..Self::default()
        }
    }

    /// Selection of a custom size
    pub fn custom(width: &str, height: &str, unit: Unit) -> Self {
        Self {
            preset: CanvasPreset::Custom,
            custom_width: Some(width.to_string()),
            custom_height: Some(height.to_string()),
            custom_unit: unit,
        }
    }

    /// The canvas size this selection stands for
    ///
    /// When either custom value is missing, non-numeric or not positive the
    /// whole canvas falls back to Letter in inches, whatever unit was chosen.
    pub fn canvas(&self) -> CanvasGeometry {
        if self.preset != CanvasPreset::Custom {
            return self.preset.dimensions();
        }
        match (
            parse_dimension(self.custom_width.as_deref()),
            parse_dimension(self.custom_height.as_deref()),
        ) {
            (Some(width), Some(height)) => CanvasGeometry {
                width,
                height,
                unit: self.custom_unit,
            },
            _ => CanvasPreset::Letter.dimensions(),
        }
    }

    /// Page margin in inches
    ///
    /// Looked up from the selection rather than derived from the page size.
    pub fn margin_inches(&self) -> f64 {
        match (self.preset, self.custom_unit) {
            (CanvasPreset::A5, _) => NARROW_MARGIN_IN,
            (CanvasPreset::Custom, Unit::Mm) => NARROW_MARGIN_IN,
            _ => DEFAULT_MARGIN_IN,
        }
    }
}

/// Resolved page geometry in twips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub width_twips: u32,
    pub height_twips: u32,
    pub margin_twips: u32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        resolve_geometry(&CanvasSelection::default())
    }
}

impl PageGeometry {
    /// Page width in inches
    pub fn width_inches(&self) -> f64 {
        twips_to_inches(self.width_twips)
    }

    /// Page height in inches
    pub fn height_inches(&self) -> f64 {
        twips_to_inches(self.height_twips)
    }

    /// Margin in inches
    pub fn margin_inches(&self) -> f64 {
        twips_to_inches(self.margin_twips)
    }

    /// CSS `@page` rule describing this geometry
    pub fn css_page_rule(&self) -> String {
        format!(
            "@page{{size:{}in {}in;margin:{}in;}}",
            format_inches(self.width_inches()),
            format_inches(self.height_inches()),
            format_inches(self.margin_inches())
        )
    }
}

/// Resolve a canvas selection into twips
///
/// Has no error states: malformed custom input falls back to Letter.
pub fn resolve_geometry(selection: &CanvasSelection) -> PageGeometry {
    let (width_in, height_in) = selection.canvas().to_inches();
    PageGeometry {
        width_twips: in_to_twips(width_in),
        height_twips: in_to_twips(height_in),
        margin_twips: in_to_twips(selection.margin_inches()),
    }
}

/// Convert millimetres to inches
pub fn mm_to_inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

/// Convert inches to twips, rounding to the nearest twip
pub fn in_to_twips(inches: f64) -> u32 {
    (inches * TWIPS_PER_INCH).round().max(0.0) as u32
}

/// Convert a value in `unit` to CSS pixels
pub fn to_pixels(value: f64, unit: Unit) -> f64 {
    match unit {
        Unit::In => value * PX_PER_INCH,
        Unit::Mm => value * PX_PER_INCH / MM_PER_INCH,
        Unit::Px => value,
    }
}

fn to_inches(value: f64, unit: Unit) -> f64 {
    match unit {
        Unit::In => value,
        Unit::Mm => mm_to_inches(value),
        Unit::Px => value / PX_PER_INCH,
    }
}

fn twips_to_inches(twips: u32) -> f64 {
    f64::from(twips) / TWIPS_PER_INCH
}

fn format_inches(value: f64) -> String {
    let rounded = format!("{:.3}", value);
    rounded
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn parse_dimension(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversions() {
        assert_eq!(mm_to_inches(25.4), 1.0);
        assert_eq!(in_to_twips(1.0), 1440);
        assert_eq!(in_to_twips(0.75), 1080);
        assert_eq!(in_to_twips(8.27), 11909);
        assert_eq!(to_pixels(1.0, Unit::In), 96.0);
        assert!((to_pixels(25.4, Unit::Mm) - 96.0).abs() < 1e-9);
        assert_eq!(to_pixels(300.0, Unit::Px), 300.0);
    }

    #[test]
    fn test_margin_lookup() {
        let a5 = resolve_geometry(&CanvasSelection::preset(CanvasPreset::A5));
        assert_eq!(a5.margin_twips, 1080);

        let letter = resolve_geometry(&CanvasSelection::preset(CanvasPreset::Letter));
        assert_eq!(letter.margin_twips, 1440);

        let custom_mm = resolve_geometry(&CanvasSelection::custom("210", "297", Unit::Mm));
        assert_eq!(custom_mm.margin_twips, 1080);

        let custom_in = resolve_geometry(&CanvasSelection::custom("6", "9", Unit::In));
        assert_eq!(custom_in.margin_twips, 1440);

        let a4 = resolve_geometry(&CanvasSelection::preset(CanvasPreset::A4));
        assert_eq!(a4.margin_twips, 1440);
    }

    #[test]
    fn test_preset_page_sizes() {
        let letter = resolve_geometry(&CanvasSelection::default());
        assert_eq!((letter.width_twips, letter.height_twips), (12240, 15840));

        let a4 = resolve_geometry(&CanvasSelection::preset(CanvasPreset::A4));
        assert_eq!((a4.width_twips, a4.height_twips), (11909, 16834));

        let workbook = resolve_geometry(&CanvasSelection::preset(CanvasPreset::Workbook));
        assert_eq!(workbook, letter);
    }

    #[test]
    fn test_custom_millimetres_convert_to_inches() {
        let geometry = resolve_geometry(&CanvasSelection::custom("254", "127", Unit::Mm));
        assert_eq!(geometry.width_twips, 14400);
        assert_eq!(geometry.height_twips, 7200);
    }

    #[test]
    fn test_malformed_custom_input_falls_back_to_letter() {
        let geometry = resolve_geometry(&CanvasSelection::custom("wide", "", Unit::In));
        assert_eq!(geometry.width_twips, 12240);
        assert_eq!(geometry.height_twips, 15840);

        let zero = CanvasSelection::custom("0", "-3", Unit::In).canvas();
        assert_eq!((zero.width, zero.height), (8.5, 11.0));
    }

    #[test]
    fn test_malformed_metric_input_falls_back_to_letter_inches() {
        let selection = CanvasSelection::custom("wide", "tall", Unit::Mm);
        assert_eq!(selection.canvas(), CanvasPreset::Letter.dimensions());

        let geometry = resolve_geometry(&selection);
        assert_eq!((geometry.width_twips, geometry.height_twips), (12240, 15840));
        assert_eq!(geometry.margin_twips, 1080);

        // One good value is not enough to keep the chosen unit
        let half = CanvasSelection::custom("210", "", Unit::Px).canvas();
        assert_eq!(half.unit, Unit::In);
        assert_eq!((half.width, half.height), (8.5, 11.0));
    }

    #[test]
    fn test_canvas_pixels() {
        let (width, height) = CanvasPreset::Letter.dimensions().to_pixels();
        assert_eq!(width, 816.0);
        assert_eq!(height, 1056.0);
    }

    #[test]
    fn test_css_page_rule() {
        let geometry = resolve_geometry(&CanvasSelection::preset(CanvasPreset::A5));
        assert_eq!(geometry.css_page_rule(), "@page{size:5.83in 8.27in;margin:0.75in;}");
    }
}
