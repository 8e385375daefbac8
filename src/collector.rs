//! The collector capability set and the state shared between the two passes.

use std::collections::BTreeMap;

use crate::color::ColorTransforms;
use crate::transform::Transforms;
use crate::types::{CharacterStyle, Color, Page, Pattern, TextLine};

/// State written by the styles pass and read by the content pass. Resources
/// keyed by id are immutable once written.
pub struct ParserState {
    /// image-id → encoded BMP bytes
    pub bmps: BTreeMap<u32, Vec<u8>>,
    /// pattern-id → 1-bpp mask
    pub patterns: BTreeMap<u32, Pattern>,
    /// vector-pattern-id → embedded SVG bytes (written during pass 2)
    pub vects: BTreeMap<u32, Vec<u8>>,
    pub pages: Vec<Page>,
    pub document_palette: BTreeMap<u32, Color>,
    /// text-id → lines of styled runs
    pub texts: BTreeMap<u32, Vec<TextLine>>,
    pub color_transforms: ColorTransforms,
}

impl Default for ParserState {
    fn default() -> Self {
        ParserState::new()
    }
}

impl ParserState {
    pub fn new() -> Self {
        ParserState {
            bmps: BTreeMap::new(),
            patterns: BTreeMap::new(),
            vects: BTreeMap::new(),
            pages: Vec::new(),
            document_palette: BTreeMap::new(),
            texts: BTreeMap::new(),
            color_transforms: ColorTransforms::new(),
        }
    }

    pub fn rgb_color_string(&self, color: &Color) -> String {
        self.color_transforms.rgb_color_string(color)
    }
}

/// Everything a record decoder may report. The default implementations do
/// nothing, so each pass overrides only what it consumes.
#[allow(unused_variables)]
pub trait Collector {
    fn collect_page(&mut self, level: u32) {}
    fn collect_object(&mut self, level: u32) {}
    fn collect_group(&mut self, level: u32) {}
    fn collect_vect(&mut self, level: u32) {}
    fn collect_other_list(&mut self) {}
    fn collect_cubic_bezier(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {}
    fn collect_quadratic_bezier(&mut self, x1: f64, y1: f64, x: f64, y: f64) {}
    fn collect_move_to(&mut self, x: f64, y: f64) {}
    fn collect_line_to(&mut self, x: f64, y: f64) {}
    fn collect_arc_to(&mut self, rx: f64, ry: f64, large_arc: bool, sweep: bool, x: f64, y: f64) {}
    fn collect_close_path(&mut self) {}
    fn collect_level(&mut self, level: u32) {}
    fn collect_transform(&mut self, transforms: &Transforms, consider_group_transform: bool) {}
    fn collect_fill_style(&mut self, fill_style: crate::types::FillStyle) {}
    fn collect_line_style(&mut self, line_style: crate::types::LineStyle) {}
    fn collect_rotate(&mut self, angle: f64, cx: f64, cy: f64) {}
    fn collect_flags(&mut self, flags: u32, consider_flags: bool) {}
    fn collect_page_size(&mut self, width: f64, height: f64, offset_x: f64, offset_y: f64) {}
    fn collect_polygon_transform(
        &mut self,
        num_angles: u32,
        next_point: u32,
        rx: f64,
        ry: f64,
        cx: f64,
        cy: f64,
    ) {
    }
    fn collect_bitmap(&mut self, image_id: u32, x1: f64, x2: f64, y1: f64, y2: f64) {}
    fn collect_bmp(
        &mut self,
        image_id: u32,
        color_model: u32,
        width: u32,
        height: u32,
        bpp: u32,
        palette: &[u32],
        bitmap: &[u8],
    ) {
    }
    fn collect_bmp_raw(&mut self, image_id: u32, bitmap: &[u8]) {}
    fn collect_bmpf(&mut self, pattern_id: u32, width: u32, height: u32, pattern: &[u8]) {}
    fn collect_ppdt(&mut self, points: &[(f64, f64)], knot_vector: &[u32]) {}
    fn collect_fill_transform(&mut self, fill_trafos: &Transforms) {}
    fn collect_fill_opacity(&mut self, opacity: f64) {}
    fn collect_polygon(&mut self) {}
    fn collect_spline(&mut self) {}
    fn collect_color_profile(&mut self, profile: &[u8]) {}
    fn collect_bbox(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) {}
    fn collect_spnd(&mut self, spnd: u32) {}
    fn collect_vector_pattern(&mut self, id: u32, data: &[u8]) {}
    fn collect_palette_entry(&mut self, color_id: u32, user_id: u32, color: &Color) {}
    fn collect_text(
        &mut self,
        text_id: u32,
        style_id: u32,
        data: &[u8],
        char_descriptions: &[u8],
        style_overrides: &BTreeMap<u32, CharacterStyle>,
    ) {
    }
    fn collect_artistic_text(&mut self, x: f64, y: f64) {}
    fn collect_paragraph_text(&mut self, x: f64, y: f64, width: f64, height: f64) {}
    fn collect_stld(&mut self, id: u32, char_style: &CharacterStyle) {}
    fn collect_outl_id(&mut self, id: u32) {}
}
