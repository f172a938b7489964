//! Color parsing, rounding, and tolerant comparison.
//!
//! Token files write colors as CSS-like strings (`#ffbe16`, `rgb(...)`,
//! `hsla(...)`, ...). The variables API stores them as floating-point RGBA
//! objects with every channel in `0.0..=1.0`. Converting 8-bit channels to
//! floats and back is lossy, so stored colors are compared with a small
//! absolute tolerance instead of exact equality.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Maximum per-channel difference for two colors to compare equal.
pub const COLOR_EPSILON: f64 = 0.002;

/// Decimal places kept on each channel before a color is submitted.
pub const COLOR_PRECISION: i32 = 5;

/// A normalized RGBA color. A missing alpha means fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
}

impl Color {
    /// An opaque color without an explicit alpha channel.
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Color { r, g, b, a: None }
    }

    /// A color with an explicit alpha channel.
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Color { r, g, b, a: Some(a) }
    }

    /// Alpha channel, defaulting to opaque.
    pub fn alpha(&self) -> f64 {
        self.a.unwrap_or(1.0)
    }

    /// Round every channel to [`COLOR_PRECISION`] decimal places.
    pub fn rounded(self) -> Self {
        Color {
            r: round_channel(self.r),
            g: round_channel(self.g),
            b: round_channel(self.b),
            a: self.a.map(round_channel),
        }
    }
}

fn round_channel(value: f64) -> f64 {
    let scale = 10f64.powi(COLOR_PRECISION);
    (value * scale).round() / scale
}

static RGB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rgb\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*\)$").unwrap()
});
static RGBA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rgba\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*([\d.]+)\s*\)$")
        .unwrap()
});
static HSL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^hsl\(\s*(\d{1,3})\s*,\s*(\d{1,3})%\s*,\s*(\d{1,3})%\s*\)$").unwrap()
});
static HSLA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^hsla\(\s*(\d{1,3})\s*,\s*(\d{1,3})%\s*,\s*(\d{1,3})%\s*,\s*([\d.]+)\s*\)$")
        .unwrap()
});
static HEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([A-Fa-f0-9]{3}|[A-Fa-f0-9]{6})$").unwrap());
static FLOAT_RGB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\{\s*r:\s*([\d.]+)\s*,\s*g:\s*([\d.]+)\s*,\s*b:\s*([\d.]+)\s*(?:,\s*opacity:\s*([\d.]+)\s*)?\}$",
    )
    .unwrap()
});

/// Parse a color string into a normalized [`Color`].
///
/// Supported notations: `rgb()`, `rgba()`, `hsl()`, `hsla()`, 3- and 6-digit
/// hex, and the float-object form `{r: 1, g: 0.5, b: 0, opacity: 0.5}`.
/// Anything else fails with [`SyncError::InvalidColorFormat`].
pub fn parse_color(text: &str) -> Result<Color> {
    let color = text.trim();
    let invalid = || SyncError::InvalidColorFormat(text.to_string());

    if let Some(caps) = RGB_RE.captures(color) {
        Ok(Color::rgb(
            bounded(&caps[1], 255, text)? / 255.0,
            bounded(&caps[2], 255, text)? / 255.0,
            bounded(&caps[3], 255, text)? / 255.0,
        ))
    } else if let Some(caps) = RGBA_RE.captures(color) {
        Ok(Color::rgba(
            bounded(&caps[1], 255, text)? / 255.0,
            bounded(&caps[2], 255, text)? / 255.0,
            bounded(&caps[3], 255, text)? / 255.0,
            unit(&caps[4], text)?,
        ))
    } else if let Some(caps) = HSL_RE.captures(color) {
        Ok(hsl_to_rgb(
            bounded(&caps[1], 360, text)?,
            bounded(&caps[2], 100, text)? / 100.0,
            bounded(&caps[3], 100, text)? / 100.0,
        ))
    } else if let Some(caps) = HSLA_RE.captures(color) {
        let rgb = hsl_to_rgb(
            bounded(&caps[1], 360, text)?,
            bounded(&caps[2], 100, text)? / 100.0,
            bounded(&caps[3], 100, text)? / 100.0,
        );
        Ok(Color {
            a: Some(unit(&caps[4], text)?),
            ..rgb
        })
    } else if let Some(caps) = HEX_RE.captures(color) {
        let digits = &caps[1];
        let expanded: String = if digits.len() == 3 {
            digits.chars().flat_map(|c| [c, c]).collect()
        } else {
            digits.to_string()
        };
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map(|v| f64::from(v) / 255.0)
                .map_err(|_| invalid())
        };
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    } else if let Some(caps) = FLOAT_RGB_RE.captures(color) {
        Ok(Color {
            r: unit(&caps[1], text)?,
            g: unit(&caps[2], text)?,
            b: unit(&caps[3], text)?,
            a: caps.get(4).map(|m| unit(m.as_str(), text)).transpose()?,
        })
    } else {
        Err(invalid())
    }
}

/// An integer channel in `0..=max`.
fn bounded(digits: &str, max: u16, text: &str) -> Result<f64> {
    match digits.parse::<u16>() {
        Ok(value) if value <= max => Ok(f64::from(value)),
        _ => Err(SyncError::InvalidColorFormat(text.to_string())),
    }
}

/// A fractional channel in `0.0..=1.0`.
fn unit(digits: &str, text: &str) -> Result<f64> {
    match digits.parse::<f64>() {
        Ok(value) if (0.0..=1.0).contains(&value) => Ok(value),
        _ => Err(SyncError::InvalidColorFormat(text.to_string())),
    }
}

/// Convert HSL (hue in degrees, saturation and lightness in `0..=1`) to RGB.
fn hsl_to_rgb(hue_degrees: f64, s: f64, l: f64) -> Color {
    if s == 0.0 {
        return Color::rgb(l, l, l);
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let h = (hue_degrees / 360.0).rem_euclid(1.0);
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    Color::rgb(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

/// Compare two colors channel by channel within [`COLOR_EPSILON`].
pub fn colors_approximately_equal(a: &Color, b: &Color) -> bool {
    (a.r - b.r).abs() < COLOR_EPSILON
        && (a.g - b.g).abs() < COLOR_EPSILON
        && (a.b - b.b).abs() < COLOR_EPSILON
        && (a.alpha() - b.alpha()).abs() < COLOR_EPSILON
}

/// Format a color as `#rrggbb`, or `#rrggbbaa` when it is not fully opaque.
pub fn rgb_to_hex(color: &Color) -> String {
    let to_hex = |channel: f64| format!("{:02x}", (channel.clamp(0.0, 1.0) * 255.0).round() as u8);

    let mut hex = format!("#{}{}{}", to_hex(color.r), to_hex(color.g), to_hex(color.b));
    if let Some(alpha) = color.a {
        if alpha != 1.0 {
            hex.push_str(&to_hex(alpha));
        }
    }
    hex
}

/// Format a color for a token file.
///
/// Opaque colors use `#rrggbb`. Translucent colors use `rgba(...)` so the
/// result can be parsed back with [`parse_color`].
pub fn format_color(color: &Color) -> String {
    if color.alpha() == 1.0 {
        return rgb_to_hex(&Color { a: None, ..*color });
    }
    let byte = |channel: f64| (channel.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "rgba({}, {}, {}, {})",
        byte(color.r),
        byte(color.g),
        byte(color.b),
        round_channel(color.alpha())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &Color, b: &Color) {
        assert!(
            colors_approximately_equal(a, b),
            "expected {a:?} to approximately equal {b:?}"
        );
    }

    #[test]
    fn parse_rgb_and_hex() {
        assert_eq!(parse_color("rgb(0,0,0)").unwrap(), Color::rgb(0.0, 0.0, 0.0));
        assert_eq!(parse_color("#ffffff").unwrap(), Color::rgb(1.0, 1.0, 1.0));
        assert_eq!(
            parse_color("#fff").unwrap(),
            parse_color("#ffffff").unwrap()
        );
        assert_eq!(
            parse_color("  rgb( 255 , 0 , 51 ) ").unwrap(),
            Color::rgb(1.0, 0.0, 0.2)
        );
    }

    #[test]
    fn parse_rgba() {
        let c = parse_color("rgba(255, 255, 255, 0.5)").unwrap();
        assert_eq!(c, Color::rgba(1.0, 1.0, 1.0, 0.5));
    }

    #[test]
    fn parse_hsl() {
        assert_close(&parse_color("hsl(0, 100%, 50%)").unwrap(), &Color::rgb(1.0, 0.0, 0.0));
        assert_close(&parse_color("hsl(120, 100%, 50%)").unwrap(), &Color::rgb(0.0, 1.0, 0.0));
        assert_close(&parse_color("hsl(240, 100%, 25%)").unwrap(), &Color::rgb(0.0, 0.0, 0.5));
    }

    #[test]
    fn parse_hsl_achromatic() {
        assert_eq!(
            parse_color("hsl(200, 0%, 40%)").unwrap(),
            Color::rgb(0.4, 0.4, 0.4)
        );
    }

    #[test]
    fn parse_hsla_keeps_alpha() {
        let c = parse_color("hsla(0, 100%, 50%, 0.25)").unwrap();
        assert_close(&c, &Color::rgba(1.0, 0.0, 0.0, 0.25));
    }

    #[test]
    fn parse_float_object() {
        assert_eq!(
            parse_color("{r: 1, g: 0.5, b: 0}").unwrap(),
            Color::rgb(1.0, 0.5, 0.0)
        );
        assert_eq!(
            parse_color("{ r: 0.1, g: 0.2, b: 0.3, opacity: 0.4 }").unwrap(),
            Color::rgba(0.1, 0.2, 0.3, 0.4)
        );
    }

    #[test]
    fn parse_rejects_unknown_formats() {
        for input in ["notacolor", "#ffff", "#12345g", "rgb(1,2)", "hsl(1, 2, 3)", ""] {
            assert!(
                matches!(parse_color(input), Err(SyncError::InvalidColorFormat(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn parse_rejects_out_of_range_channels() {
        for input in [
            "rgb(300,0,0)",
            "rgb(0, 256, 0)",
            "rgba(0,0,0,2)",
            "hsl(0,150%,50%)",
            "hsl(0, 50%, 101%)",
            "hsl(400, 50%, 50%)",
            "hsla(0, 50%, 50%, 1.5)",
            "{r: 1.2, g: 0, b: 0}",
            "{r: 1, g: 0, b: 0, opacity: 3}",
        ] {
            assert!(
                matches!(parse_color(input), Err(SyncError::InvalidColorFormat(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn approximate_equality() {
        let black = Color::rgb(0.0, 0.0, 0.0);
        assert!(colors_approximately_equal(&black, &black));
        assert!(colors_approximately_equal(&black, &Color::rgba(0.0, 0.0, 0.0, 1.0)));
        assert!(colors_approximately_equal(
            &Color::rgba(0.0, 0.0, 0.0, 0.5),
            &Color::rgba(0.0, 0.0, 0.0, 0.5)
        ));
        assert!(!colors_approximately_equal(&black, &Color::rgba(0.0, 0.0, 0.0, 0.0)));
    }

    #[test]
    fn tolerance_boundary() {
        let black = Color::rgb(0.0, 0.0, 0.0);
        assert!(colors_approximately_equal(&black, &Color::rgb(0.001, 0.0, 0.0)));
        assert!(!colors_approximately_equal(&black, &Color::rgb(0.0028, 0.0, 0.0)));
        assert!(!colors_approximately_equal(&black, &Color::rgb(0.0, 0.0, 0.0028)));
    }

    #[test]
    fn rounding_stays_within_tolerance() {
        let parsed = parse_color("#ffbe16").unwrap();
        let rounded = parsed.rounded();
        assert_eq!(rounded, Color::rgb(1.0, 0.7451, 0.08627));
        assert_close(&parsed, &rounded);
    }

    #[test]
    fn hex_output() {
        assert_eq!(rgb_to_hex(&Color::rgb(1.0, 1.0, 1.0)), "#ffffff");
        assert_eq!(rgb_to_hex(&Color::rgb(0.0, 0.0, 0.0)), "#000000");
        assert_eq!(rgb_to_hex(&Color::rgb(0.5, 0.5, 0.5)), "#808080");
        assert_eq!(
            rgb_to_hex(&Color::rgb(0.3686274509803922, 0.8784313725490196, 0.8627450980392157)),
            "#5ee0dc"
        );
    }

    #[test]
    fn hex_output_with_alpha() {
        assert_eq!(rgb_to_hex(&Color::rgba(1.0, 1.0, 1.0, 1.0)), "#ffffff");
        assert_eq!(rgb_to_hex(&Color::rgba(0.0, 0.0, 0.0, 0.5)), "#00000080");
        assert_eq!(rgb_to_hex(&Color::rgba(0.5, 0.5, 0.5, 0.5)), "#80808080");
        assert_eq!(
            rgb_to_hex(&Color::rgba(
                0.3686274509803922,
                0.8784313725490196,
                0.8627450980392157,
                0.0
            )),
            "#5ee0dc00"
        );
    }

    #[test]
    fn format_for_token_files() {
        assert_eq!(format_color(&Color::rgba(1.0, 1.0, 1.0, 1.0)), "#ffffff");
        assert_eq!(format_color(&Color::rgb(0.0, 0.0, 0.0)), "#000000");
        let translucent = Color::rgba(0.0, 0.0, 0.0, 0.5);
        assert_eq!(format_color(&translucent), "rgba(0, 0, 0, 0.5)");
        assert_close(&parse_color(&format_color(&translucent)).unwrap(), &translucent);
    }

    #[test]
    fn hex_round_trip() {
        for hex in ["#ffbe16", "#010101", "#5ee0dc"] {
            assert_eq!(rgb_to_hex(&parse_color(hex).unwrap()), hex);
        }
    }
}
