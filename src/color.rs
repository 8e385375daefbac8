//! Color engine: document color models decoded to sRGB, plus tinting.
//!
//! Input is a raw [`Color`] `(model, value)`; the four component bytes are
//! `col0..col3` from the least significant byte of `value` up.

use crate::icc::{self, ProfileColorSpace, RgbMatrixShaper};
use crate::types::Color;

pub(crate) fn cdr_round(d: f64) -> i32 {
    if d > 0.0 {
        (d + 0.5).floor() as i32
    } else {
        (d - 0.5).ceil() as i32
    }
}

/// CMYK components in [0, 1].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CmykColor {
    pub c: f64,
    pub m: f64,
    pub y: f64,
    pub k: f64,
}

impl CmykColor {
    /// Unpacks a color value; components are percentages when `percentage`
    /// (CMYK100), byte-scaled otherwise (CMYK255).
    pub fn unpack(color_value: u32, percentage: bool) -> Self {
        let div = if percentage { 100.0 } else { 255.0 };
        CmykColor {
            c: (color_value & 0xff) as f64 / div,
            m: ((color_value >> 8) & 0xff) as f64 / div,
            y: ((color_value >> 16) & 0xff) as f64 / div,
            k: ((color_value >> 24) & 0xff) as f64 / div,
        }
    }

    pub fn apply_tint(&mut self, tint: f64) {
        let tint = tint.clamp(0.0, 1.0);
        self.c *= tint;
        self.m *= tint;
        self.y *= tint;
        self.k *= tint;
    }

    pub fn pack(&self, percentage: bool) -> u32 {
        let mul = if percentage { 100.0 } else { 255.0 };
        let q = |v: f64| cdr_round((v * mul).clamp(0.0, mul)) as u32;
        q(self.c) | (q(self.m) << 8) | (q(self.y) << 16) | (q(self.k) << 24)
    }
}

/// RGB components in [0, 1].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RgbColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl RgbColor {
    pub fn unpack(color_value: u32) -> Self {
        RgbColor {
            r: (color_value & 0xff) as f64 / 255.0,
            g: ((color_value >> 8) & 0xff) as f64 / 255.0,
            b: ((color_value >> 16) & 0xff) as f64 / 255.0,
        }
    }

    /// Linear blend toward white by `1 - tint`.
    pub fn apply_tint(&mut self, tint: f64) {
        let tint = tint.clamp(0.0, 1.0);
        self.r = 1.0 + self.r * tint - tint;
        self.g = 1.0 + self.g * tint - tint;
        self.b = 1.0 + self.b * tint - tint;
    }

    pub fn pack(&self) -> u32 {
        let q = |v: f64| cdr_round((v * 255.0).clamp(0.0, 255.0)) as u32;
        q(self.r) | (q(self.g) << 8) | (q(self.b) << 16)
    }
}

/// Lab with L in [0, 100]; `biased` selects the 0x80-offset a/b encoding.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LabColor {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl LabColor {
    pub fn unpack(color_value: u32, biased: bool) -> Self {
        let col1 = ((color_value >> 8) & 0xff) as u8;
        let col2 = ((color_value >> 16) & 0xff) as u8;
        let (a, b) = if biased {
            ((col1.wrapping_sub(0x80)) as i8 as f64, (col2.wrapping_sub(0x80)) as i8 as f64)
        } else {
            (col1 as i8 as f64, col2 as i8 as f64)
        };
        LabColor { l: (color_value & 0xff) as f64 * 100.0 / 255.0, a, b }
    }

    /// L is pulled toward white, a/b scaled down.
    pub fn apply_tint(&mut self, tint: f64) {
        let tint = tint.clamp(0.0, 1.0);
        self.l = (1.0 - tint) * 100.0 + tint * self.l;
        self.a *= tint;
        self.b *= tint;
    }

    pub fn pack(&self, biased: bool) -> u32 {
        let l = cdr_round((self.l * 255.0 / 100.0).clamp(0.0, 255.0)) as u32;
        let a = cdr_round(self.a.clamp(-128.0, 127.0)) as i8 as u8;
        let b = cdr_round(self.b.clamp(-128.0, 127.0)) as i8 as u8;
        let (a, b) = if biased {
            (a.wrapping_add(0x80), b.wrapping_add(0x80))
        } else {
            (a, b)
        };
        l | ((a as u32) << 8) | ((b as u32) << 16)
    }
}

// TODO: one swatch table currently serves all three channels; obtain the
// real per-channel HKS tables and split this up.
const HKS_TABLE: [u8; 86] = [
    0xff, 0xe3, 0x00, 0x00, 0xff, 0x8f, 0x00, 0x00, 0xff, 0x9b, 0x1d, 0x00, 0xe2, 0x1f, 0x33,
    0x00, 0x78, 0x89, 0x3a, 0x00, 0xca, 0x22, 0x6f, 0x00, 0xb2, 0x34, 0x86, 0x00, 0xb0, 0x3b,
    0x8e, 0x00, 0x54, 0x3c, 0xcb, 0x00, 0x28, 0x53, 0xd2, 0x00, 0x55, 0x96, 0xd3, 0x00, 0x00,
    0xd2, 0xa0, 0x00, 0x00, 0x98, 0x55, 0x00, 0x00, 0x6a, 0x7d, 0x00, 0x2a, 0x6a, 0x40, 0x00,
    0x46, 0xc6, 0x0d, 0x00, 0xea, 0xa9, 0x00, 0x00, 0x92, 0x6d, 0x2b, 0x00, 0x7a, 0x5e, 0x1f,
    0x00, 0x66, 0x22, 0x8d, 0x00, 0xad, 0x80, 0x59, 0x00, 0x83, 0x41,
];

/// The three replaceable color transforms of a parse: CMYK→sRGB, Lab→sRGB
/// and RGB→sRGB. Defaults are built in; a document-supplied profile replaces
/// the transform of the matching input color space.
#[derive(Debug, Clone, Default)]
pub struct ColorTransforms {
    rgb_profile: Option<RgbMatrixShaper>,
}

impl ColorTransforms {
    pub fn new() -> Self {
        ColorTransforms::default()
    }

    /// Installs a document profile into the transform of its color space.
    /// Profiles that cannot be evaluated keep the built-in transform.
    pub fn set_color_transform(&mut self, profile: &[u8]) {
        if profile.is_empty() {
            return;
        }
        match icc::color_space(profile) {
            ProfileColorSpace::Rgb => {
                if let Some(shaper) = RgbMatrixShaper::parse(profile) {
                    self.rgb_profile = Some(shaper);
                } else {
                    log::warn!("unsupported RGB profile shape, keeping built-in transform");
                }
            }
            ProfileColorSpace::Cmyk => {
                // LUT-based CMYK profiles are not evaluated here
                log::warn!("document CMYK profile ignored, keeping built-in transform");
            }
            ProfileColorSpace::Other => {}
        }
    }

    fn transform_rgb(&self, r: u8, g: u8, b: u8) -> (u8, u8, u8) {
        match &self.rgb_profile {
            Some(shaper) => shaper.transform(r, g, b),
            None => (r, g, b),
        }
    }

    /// Components as percentages 0–100.
    fn transform_cmyk(&self, c: f64, m: f64, y: f64, k: f64) -> (u8, u8, u8) {
        let c = (c / 100.0).clamp(0.0, 1.0);
        let m = (m / 100.0).clamp(0.0, 1.0);
        let y = (y / 100.0).clamp(0.0, 1.0);
        let k = (k / 100.0).clamp(0.0, 1.0);
        let q = |v: f64| cdr_round((v * 255.0).clamp(0.0, 255.0)) as u8;
        (
            q((1.0 - c) * (1.0 - k)),
            q((1.0 - m) * (1.0 - k)),
            q((1.0 - y) * (1.0 - k)),
        )
    }

    /// Decodes `(model, value)` into packed `0xRRGGBB` sRGB.
    pub fn rgb_color(&self, color: &Color) -> u32 {
        let col0 = (color.value & 0xff) as u8;
        let col1 = ((color.value >> 8) & 0xff) as u8;
        let col2 = ((color.value >> 16) & 0xff) as u8;
        let col3 = ((color.value >> 24) & 0xff) as u8;

        let (red, green, blue) = match color.model {
            0x01 | 0x02 => {
                // CMYK100
                self.transform_cmyk(col0 as f64, col1 as f64, col2 as f64, col3 as f64)
            }
            0x03 | 0x11 => {
                // CMYK255
                self.transform_cmyk(
                    col0 as f64 * 100.0 / 255.0,
                    col1 as f64 * 100.0 / 255.0,
                    col2 as f64 * 100.0 / 255.0,
                    col3 as f64 * 100.0 / 255.0,
                )
            }
            0x04 => (255 - col0, 255 - col1, 255 - col2), // CMY
            0x00 | 0x05 => self.transform_rgb(col2, col1, col0), // BGR on disk
            0x06 => {
                // HSB
                let mut hue = ((col1 as u16) << 8) | col0 as u16;
                let saturation = col2 as f64 / 255.0;
                let brightness = col3 as f64 / 255.0;
                while hue > 360 {
                    hue -= 360;
                }
                let (sat_red, sat_green, sat_blue) = hue_sectors(hue);
                let q = |sat: f64| {
                    cdr_round(255.0 * (1.0 - saturation + saturation * sat.min(1.0)) * brightness)
                        as u8
                };
                (q(sat_red), q(sat_green), q(sat_blue))
            }
            0x07 => {
                // HLS
                let mut hue = ((col1 as u16) << 8) | col0 as u16;
                let lightness = col2 as f64 / 255.0;
                let saturation = col3 as f64 / 255.0;
                while hue > 360 {
                    hue -= 360;
                }
                let (sat_red, sat_green, sat_blue) = hue_sectors(hue);
                let tmp = |sat: f64| 2.0 * saturation * sat.min(1.0) + 1.0 - saturation;
                let q = |t: f64| {
                    if lightness < 0.5 {
                        cdr_round(255.0 * lightness * t) as u8
                    } else {
                        cdr_round(255.0 * ((1.0 - lightness) * t + 2.0 * lightness - 1.0)) as u8
                    }
                };
                (q(tmp(sat_red)), q(tmp(sat_green)), q(tmp(sat_blue)))
            }
            0x09 => (col0, col0, col0), // Grayscale
            0x0c => {
                let lab = LabColor::unpack(color.value, false);
                icc::lab_to_srgb(lab.l, lab.a, lab.b)
            }
            0x12 => {
                let lab = LabColor::unpack(color.value, true);
                icc::lab_to_srgb(lab.l, lab.a, lab.b)
            }
            0x19 => hks_color(color.value),
            _ => (0, 0, 0),
        };
        ((red as u32) << 16) | ((green as u32) << 8) | blue as u32
    }

    pub fn rgb_color_string(&self, color: &Color) -> String {
        format!("#{:06x}", self.rgb_color(color))
    }

    /// Bitmap pixels carry their own color-model numbering; remap into the
    /// fill-color space before decoding.
    pub fn bmp_color(&self, color: &Color) -> u32 {
        match color.model {
            0 => self.rgb_color(&Color::new(0, color.value)),
            1 => self.rgb_color(&Color::new(5, color.value)),
            2 => self.rgb_color(&Color::new(4, color.value)),
            3 => self.rgb_color(&Color::new(3, color.value)),
            4 => self.rgb_color(&Color::new(6, color.value)),
            5 => self.rgb_color(&Color::new(9, color.value)),
            6 => self.rgb_color(&Color::new(8, color.value)),
            7 => self.rgb_color(&Color::new(7, color.value)),
            8 | 9 => color.value,
            10 => self.rgb_color(&Color::new(5, color.value)),
            11 => self.rgb_color(&Color::new(18, color.value)),
            _ => color.value,
        }
    }
}

/// Common six-sector hue ramp shared by the HSB and HLS decodings.
fn hue_sectors(hue: u16) -> (f64, f64, f64) {
    if hue < 120 {
        ((120 - hue) as f64 / 60.0, hue as f64 / 60.0, 0.0)
    } else if hue < 240 {
        (0.0, (240 - hue) as f64 / 60.0, (hue - 120) as f64 / 60.0)
    } else {
        ((hue - 240) as f64 / 60.0, 0.0, (360 - hue) as f64 / 60.0)
    }
}

/// Spot color by HKS swatch index with tint/black adjustment encoded in the
/// divisors of 86 and 10.
fn hks_color(color_value: u32) -> (u8, u8, u8) {
    let mut hks = ((color_value & 0xffff) as u16).wrapping_add(85);
    let hks_index = (hks % 86) as usize;
    hks /= 86;
    let black_percent: u32 = match hks / 10 {
        2 => 10,
        3 => 30,
        4 => 50,
        _ => 0,
    };
    let color_percent: u32 = if hks % 10 != 0 { (hks % 10) as u32 * 10 } else { 100 };

    let mix = |swatch: u8| -> u8 {
        let tmp = cdr_round(
            (1.0 - black_percent as f64 / 100.0)
                * (255.0 * (1.0 - color_percent as f64 / 100.0)
                    + swatch as f64 * color_percent as f64 / 100.0),
        );
        tmp.clamp(0, 255) as u8
    };
    (
        mix(HKS_TABLE[hks_index]),
        mix(HKS_TABLE[hks_index]),
        mix(HKS_TABLE[hks_index]),
    )
}

/// Applies a spot tint to a raw color, per the model family.
pub fn apply_tint(color: &Color, tint: f64) -> Color {
    match color.model {
        0x01 | 0x02 => {
            let mut c = CmykColor::unpack(color.value, true);
            c.apply_tint(tint);
            Color::new(color.model, c.pack(true))
        }
        0x03 | 0x11 => {
            let mut c = CmykColor::unpack(color.value, false);
            c.apply_tint(tint);
            Color::new(color.model, c.pack(false))
        }
        0x00 | 0x05 => {
            let mut c = RgbColor::unpack(color.value);
            c.apply_tint(tint);
            Color::new(color.model, c.pack())
        }
        0x0c => {
            let mut c = LabColor::unpack(color.value, false);
            c.apply_tint(tint);
            Color::new(color.model, c.pack(false))
        }
        0x12 => {
            let mut c = LabColor::unpack(color.value, true);
            c.apply_tint(tint);
            Color::new(color.model, c.pack(true))
        }
        _ => *color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmyk_zero_is_white() {
        let transforms = ColorTransforms::new();
        for model in [1u16, 2, 3] {
            assert_eq!(
                transforms.rgb_color(&Color::new(model, 0)),
                0xffffff,
                "model {}",
                model
            );
        }
    }

    #[test]
    fn test_cmyk_full_black() {
        let transforms = ColorTransforms::new();
        // model 2, K = 100
        assert_eq!(transforms.rgb_color_string(&Color::new(2, 0x6400_0000)), "#000000");
    }

    #[test]
    fn test_rgb_is_bgr_on_disk() {
        let transforms = ColorTransforms::new();
        assert_eq!(transforms.rgb_color(&Color::new(5, 0x0000_00ff)), 0x0000ff);
        assert_eq!(transforms.rgb_color(&Color::new(5, 0x00ff_0000)), 0xff0000);
    }

    #[test]
    fn test_cmy_inverts() {
        let transforms = ColorTransforms::new();
        assert_eq!(transforms.rgb_color(&Color::new(4, 0x00ff_ffff)), 0x000000);
        assert_eq!(transforms.rgb_color(&Color::new(4, 0)), 0xffffff);
    }

    #[test]
    fn test_grayscale_replicates() {
        let transforms = ColorTransforms::new();
        assert_eq!(transforms.rgb_color(&Color::new(9, 0x80)), 0x808080);
    }

    #[test]
    fn test_hsb_sectors() {
        let transforms = ColorTransforms::new();
        // hue 0, full saturation + brightness: red sector dominates
        let red = transforms.rgb_color(&Color::new(6, 0xffff_0000));
        assert_eq!(red >> 16, 0xff);
        // zero brightness is black no matter the hue
        assert_eq!(transforms.rgb_color(&Color::new(6, 0x00ff_0078)), 0);
    }

    #[test]
    fn test_hls_extremes() {
        let transforms = ColorTransforms::new();
        // full lightness is white, zero lightness is black
        assert_eq!(transforms.rgb_color(&Color::new(7, 0x00ff_0000)), 0x000000);
        assert_eq!(transforms.rgb_color(&Color::new(7, 0x00ff_ff00)) & 0xffffff, 0xffffff);
    }

    #[test]
    fn test_rgb_tint_blends_toward_white() {
        let mut c = RgbColor::unpack(0x0000_0080);
        c.apply_tint(0.5);
        assert!((c.r - (0.5 + 0.5 * 128.0 / 255.0)).abs() < 1e-9);
        assert_eq!(c.g, 0.5);

        let untinted = apply_tint(&Color::new(5, 0x0000_0080), 1.0);
        assert_eq!(untinted.value, 0x0000_0080);
    }

    #[test]
    fn test_cmyk_tint_scales_components() {
        let mut c = CmykColor::unpack(0x6400_0000, true);
        c.apply_tint(0.5);
        assert!((c.k - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_hks_channels_currently_equal() {
        let (r, g, b) = hks_color(3);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn test_unsupported_profile_keeps_builtin() {
        let mut transforms = ColorTransforms::new();
        transforms.set_color_transform(b"garbage bytes");
        assert_eq!(transforms.rgb_color(&Color::new(5, 0x0000_00ff)), 0x0000ff);
    }
}
