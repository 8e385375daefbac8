//! Document data model shared by the parsers and both collector passes.

use serde_derive::{Deserialize, Serialize};

use crate::path::Path;
use crate::transform::Transform;
use crate::CDR_EPSILON;

/// Axis-aligned box, constructed from any two opposite corners.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Rect {
            x: x0.min(x1),
            y: y0.min(y1),
            w: (x1 - x0).abs(),
            h: (y1 - y0).abs(),
        }
    }

    pub fn width(&self) -> f64 {
        self.w
    }

    pub fn height(&self) -> f64 {
        self.h
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }
}

/// A raw document color: model discriminant plus packed component bytes.
/// Decoding to sRGB is the color engine's job.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub model: u16,
    pub value: u32,
}

impl Color {
    pub fn new(model: u16, value: u32) -> Self {
        Color { model, value }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub color: Color,
    pub offset: f64,
}

impl GradientStop {
    pub fn new(color: Color, offset: f64) -> Self {
        GradientStop { color, offset }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub gradient_type: u8,
    pub mode: u8,
    pub angle: f64,
    pub mid_point: f64,
    pub edge_offset: i32,
    pub center_x_offset: i32,
    pub center_y_offset: i32,
    pub stops: Vec<GradientStop>,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageFill {
    pub id: u32,
    pub width: f64,
    pub height: f64,
    pub is_relative: bool,
    pub x_offset: f64,
    pub y_offset: f64,
    pub rcp_offset: f64,
    pub flags: u8,
}

impl ImageFill {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        width: f64,
        height: f64,
        is_relative: bool,
        x_offset: f64,
        y_offset: f64,
        rcp_offset: f64,
        flags: u8,
    ) -> Self {
        ImageFill { id, width, height, is_relative, x_offset, y_offset, rcp_offset, flags }
    }
}

/// `fill_type` uses `u16::MAX` as the "unset" sentinel, distinct from the
/// explicit `none` (0) a document may declare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillStyle {
    pub fill_type: u16,
    pub color1: Color,
    pub color2: Color,
    pub gradient: Gradient,
    pub image_fill: ImageFill,
}

impl Default for FillStyle {
    fn default() -> Self {
        FillStyle {
            fill_type: u16::MAX,
            color1: Color::default(),
            color2: Color::default(),
            gradient: Gradient::default(),
            image_fill: ImageFill::default(),
        }
    }
}

impl FillStyle {
    pub fn new(
        fill_type: u16,
        color1: Color,
        color2: Color,
        gradient: Gradient,
        image_fill: ImageFill,
    ) -> Self {
        FillStyle { fill_type, color1, color2, gradient, image_fill }
    }
}

/// `line_type` uses `u16::MAX` as the "unset" sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub line_type: u16,
    pub caps_type: u16,
    pub join_type: u16,
    pub line_width: f64,
    pub stretch: f64,
    pub angle: f64,
    pub color: Color,
    pub dash_array: Vec<u32>,
    pub start_marker_id: u32,
    pub end_marker_id: u32,
}

impl Default for LineStyle {
    fn default() -> Self {
        LineStyle {
            line_type: u16::MAX,
            caps_type: 0,
            join_type: 0,
            line_width: 0.0,
            stretch: 0.0,
            angle: 0.0,
            color: Color::default(),
            dash_array: Vec::new(),
            start_marker_id: 0,
            end_marker_id: 0,
        }
    }
}

impl LineStyle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        line_type: u16,
        caps_type: u16,
        join_type: u16,
        line_width: f64,
        stretch: f64,
        angle: f64,
        color: Color,
        dash_array: Vec<u32>,
        start_marker_id: u32,
        end_marker_id: u32,
    ) -> Self {
        LineStyle {
            line_type,
            caps_type,
            join_type,
            line_width,
            stretch,
            angle,
            color,
            dash_array,
            start_marker_id,
            end_marker_id,
        }
    }
}

/// Character style. Fields carry documented "unset" sentinels so that styles
/// can be stacked: an override only wins for the fields it actually sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterStyle {
    pub char_set: u16,
    pub font_name: String,
    pub font_size: f64,
    pub align: u32,
    pub left_indent: f64,
    pub first_indent: f64,
    pub right_indent: f64,
    pub line_style: LineStyle,
    pub fill_style: FillStyle,
    pub parent_id: u32,
}

impl Default for CharacterStyle {
    fn default() -> Self {
        CharacterStyle {
            char_set: u16::MAX,
            font_name: String::new(),
            font_size: 0.0,
            align: 0,
            left_indent: 0.0,
            first_indent: 0.0,
            right_indent: 0.0,
            line_style: LineStyle::default(),
            fill_style: FillStyle::default(),
            parent_id: 0,
        }
    }
}

impl CharacterStyle {
    /// Copies onto `self` only those fields `over` sets.
    pub fn override_character_style(&mut self, over: &CharacterStyle) {
        if over.char_set != u16::MAX || !over.font_name.is_empty() {
            self.char_set = over.char_set;
            self.font_name = over.font_name.clone();
        }
        if over.font_size.abs() > CDR_EPSILON {
            self.font_size = over.font_size;
        }
        if over.align != 0 {
            self.align = over.align;
        }
        if over.left_indent != 0.0 && over.first_indent != 0.0 && over.right_indent != 0.0 {
            self.left_indent = over.left_indent;
            self.first_indent = over.first_indent;
            self.right_indent = over.right_indent;
        }
        if over.line_style.line_type != u16::MAX {
            self.line_style = over.line_style.clone();
        }
        if over.fill_style.fill_type != u16::MAX {
            self.fill_style = over.fill_style.clone();
        }
    }
}

/// Rosette generator: the recorded base path is rotated around the origin
/// and the composite is mapped by `[rx 0 cx; 0 ry cy]`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub num_angles: u32,
    pub next_point: u32,
    pub rx: f64,
    pub ry: f64,
    pub cx: f64,
    pub cy: f64,
}

impl Polygon {
    pub fn new(num_angles: u32, next_point: u32, rx: f64, ry: f64, cx: f64, cy: f64) -> Self {
        Polygon { num_angles, next_point, rx, ry, cx, cy }
    }

    pub fn create(&self, path: &mut Path) {
        if self.num_angles == 0 || self.next_point == 0 {
            return;
        }
        let mut tmp_path = path.clone();
        let step = 2.0 * std::f64::consts::PI / self.num_angles as f64;
        let leap = self.next_point as f64 * step;
        if self.num_angles % self.next_point != 0 {
            let tmp_trafo = Transform::new(leap.cos(), leap.sin(), 0.0, -leap.sin(), leap.cos(), 0.0);
            for _ in 1..self.num_angles {
                tmp_path.transform(&tmp_trafo);
                path.append_path(&tmp_path);
            }
        } else {
            let tmp_trafo = Transform::new(leap.cos(), leap.sin(), 0.0, -leap.sin(), leap.cos(), 0.0);
            let tmp_shift = Transform::new(step.cos(), step.sin(), 0.0, -step.sin(), step.cos(), 0.0);
            for i in 0..self.next_point {
                if i != 0 {
                    tmp_path.transform(&tmp_shift);
                    path.append_path(&tmp_path);
                }
                for _ in 1..self.num_angles / self.next_point {
                    tmp_path.transform(&tmp_trafo);
                    path.append_path(&tmp_path);
                }
                path.append_close_path();
            }
        }
        path.append_close_path();
        let trafo = Transform::new(self.rx, 0.0, self.cx, 0.0, self.ry, self.cy);
        path.transform(&trafo);
    }
}

/// Raw path-point data: control points and per-point "segment boundary
/// here" markers, lowered onto a path at flush time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplineData {
    pub points: Vec<(f64, f64)>,
    pub knot_vector: Vec<u32>,
}

impl SplineData {
    pub fn new(points: Vec<(f64, f64)>, knot_vector: Vec<u32>) -> Self {
        SplineData { points, knot_vector }
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.knot_vector.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() || self.knot_vector.is_empty()
    }

    pub fn create(&self, path: &mut Path) {
        if self.is_empty() {
            return;
        }
        path.append_move_to(self.points[0].0, self.points[0].1);
        let mut tmp_points = vec![self.points[0]];
        for i in 1..self.points.len().min(self.knot_vector.len()) {
            tmp_points.push(self.points[i]);
            if self.knot_vector[i] != 0 {
                Self::flush_segment(&tmp_points, path);
                tmp_points.clear();
                tmp_points.push(self.points[i]);
            }
        }
        if tmp_points.len() > 1 {
            Self::flush_segment(&tmp_points, path);
        }
    }

    fn flush_segment(tmp_points: &[(f64, f64)], path: &mut Path) {
        match tmp_points.len() {
            0 | 1 => {}
            2 => path.append_line_to(tmp_points[1].0, tmp_points[1].1),
            3 => path.append_quadratic_bezier_to(
                tmp_points[1].0,
                tmp_points[1].1,
                tmp_points[2].0,
                tmp_points[2].1,
            ),
            _ => path.append_spline_to(tmp_points.to_vec()),
        }
    }
}

/// An image positioned by its two bounding corners.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image {
    pub data: Vec<u8>,
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
}

impl Image {
    pub fn new(data: Vec<u8>, x1: f64, x2: f64, y1: f64, y2: f64) -> Self {
        Image { data, x1, x2, y1, y2 }
    }

    pub fn middle_x(&self) -> f64 {
        (self.x1 + self.x2) / 2.0
    }

    pub fn middle_y(&self) -> f64 {
        (self.y1 + self.y2) / 2.0
    }
}

/// 1-bpp tiling mask, expanded against fore/back colors at paint time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub width: u32,
    pub height: u32,
    pub pattern: Vec<u8>,
}

impl Pattern {
    pub fn new(width: u32, height: u32, pattern: Vec<u8>) -> Self {
        Pattern { width, height, pattern }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub width: f64,
    pub height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Page {
    pub fn new(width: f64, height: f64, offset_x: f64, offset_y: f64) -> Self {
        Page { width, height, offset_x, offset_y }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub name: String,
    pub encoding: u16,
}

impl Font {
    pub fn new(name: String, encoding: u16) -> Self {
        Font { name, encoding }
    }
}

/// A run of characters sharing one character style.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub char_style: CharacterStyle,
}

impl TextRun {
    pub fn new(text: String, char_style: CharacterStyle) -> Self {
        TextRun { text, char_style }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLine {
    pub runs: Vec<TextRun>,
}

impl TextLine {
    pub fn append(&mut self, run: TextRun) {
        self.runs.push(run);
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_from_any_corners() {
        let a = Rect::from_corners(1.0, 5.0, 4.0, 2.0);
        let b = Rect::from_corners(4.0, 2.0, 1.0, 5.0);
        assert_eq!(a, b);
        assert_eq!(a.width(), 3.0);
        assert_eq!(a.height(), 3.0);
        assert_eq!(a.min_x(), 1.0);
        assert_eq!(a.min_y(), 2.0);
    }

    #[test]
    fn test_override_keeps_unset_fields() {
        let mut base = CharacterStyle {
            font_name: "Garamond".to_string(),
            char_set: 0,
            font_size: 12.0,
            align: 1,
            ..Default::default()
        };
        let over = CharacterStyle { font_size: 18.0, ..Default::default() };
        base.override_character_style(&over);
        assert_eq!(base.font_size, 18.0);
        assert_eq!(base.font_name, "Garamond");
        assert_eq!(base.align, 1);
    }

    #[test]
    fn test_override_font_pair() {
        let mut base = CharacterStyle::default();
        let over = CharacterStyle {
            char_set: 0xcc,
            font_name: "Arial".to_string(),
            ..Default::default()
        };
        base.override_character_style(&over);
        assert_eq!(base.char_set, 0xcc);
        assert_eq!(base.font_name, "Arial");
    }

    #[test]
    fn test_spline_data_three_point_fallback_is_quadratic() {
        let data = SplineData::new(
            vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)],
            vec![1, 0, 0],
        );
        let mut path = Path::new();
        data.create(&mut path);
        let mut nodes = Vec::new();
        path.write_out(&mut nodes);
        let actions: Vec<_> =
            nodes.iter().filter_map(|n| n.get_str("libwpg:path-action")).collect();
        assert_eq!(actions, ["M", "Q"]);
        // end point of the quadratic is the real third point
        assert_eq!(nodes[1].get_double("svg:x"), Some(2.0));
        assert_eq!(nodes[1].get_double("svg:y"), Some(0.0));
    }

    #[test]
    fn test_polygon_rosette_scales_and_centers() {
        let mut path = Path::new();
        path.append_move_to(1.0, 0.0);
        path.append_line_to(0.9, 0.1);
        Polygon::new(5, 1, 2.0, 2.0, 10.0, 10.0).create(&mut path);
        assert!(path.is_closed());
        let mut nodes = Vec::new();
        path.write_out(&mut nodes);
        // base shape plus four rotated copies
        assert_eq!(nodes.len(), 10);
        // every point ends up translated around (10, 10)
        for node in &nodes {
            let x = node.get_double("svg:x").unwrap();
            let y = node.get_double("svg:y").unwrap();
            assert!((x - 10.0).abs() <= 2.0 + 1e-9);
            assert!((y - 10.0).abs() <= 2.0 + 1e-9);
        }
    }
}
