//! Pass 2: consumes the record stream a second time and builds the per-page
//! output-element stack, flushed to the sink in reverse insertion order so
//! the author's front-to-back declaration becomes back-to-front rendering.

use base64::Engine;

use crate::collector::{Collector, ParserState};
use crate::color::ColorTransforms;
use crate::paint::{OutputElementList, PaintSink};
use crate::path::Path;
use crate::props::{PropertyList, PropertyValue};
use crate::svg::SvgGenerator;
use crate::transform::{Transform, Transforms};
use crate::types::{
    Color, FillStyle, Image, LineStyle, Page, Pattern, Polygon, Rect, SplineData, TextLine,
};
use crate::CDR_EPSILON;

const SVG_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";

fn base64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

fn almost_zero(v: f64) -> bool {
    v.abs() <= CDR_EPSILON
}

pub struct ContentCollector<'a, 'b> {
    painter: &'b mut dyn PaintSink,
    is_page_properties: bool,
    is_page_started: bool,
    ignore_page: bool,
    page: Page,
    page_index: usize,
    current_fill_style: FillStyle,
    current_line_style: LineStyle,
    spnd: u32,
    current_object_level: u32,
    current_vect_level: u32,
    current_page_level: u32,
    current_image: Image,
    current_text: Option<Vec<TextLine>>,
    current_bbox: Rect,
    current_text_box: Rect,
    current_path: Path,
    current_transforms: Transforms,
    fill_transforms: Transforms,
    polygon: Option<Polygon>,
    is_in_polygon: bool,
    is_in_spline: bool,
    // the active stack: content, or the vector-pattern side stack
    in_vect_output: bool,
    content_output_elements: Vec<OutputElementList>,
    fill_output_elements: Vec<OutputElementList>,
    group_levels: Vec<u32>,
    group_transforms: Vec<Transforms>,
    spline_data: SplineData,
    fill_opacity: f64,
    ps: &'a mut ParserState,
}

impl<'a, 'b> ContentCollector<'a, 'b> {
    pub fn new(ps: &'a mut ParserState, painter: &'b mut dyn PaintSink) -> Self {
        let page = ps.pages.first().copied().unwrap_or_default();
        ContentCollector {
            painter,
            is_page_properties: false,
            is_page_started: false,
            ignore_page: false,
            page,
            page_index: 0,
            current_fill_style: FillStyle::default(),
            current_line_style: LineStyle::default(),
            spnd: 0,
            current_object_level: 0,
            current_vect_level: 0,
            current_page_level: 0,
            current_image: Image::default(),
            current_text: None,
            current_bbox: Rect::default(),
            current_text_box: Rect::default(),
            current_path: Path::new(),
            current_transforms: Transforms::new(),
            fill_transforms: Transforms::new(),
            polygon: None,
            is_in_polygon: false,
            is_in_spline: false,
            in_vect_output: false,
            content_output_elements: Vec::new(),
            fill_output_elements: Vec::new(),
            group_levels: Vec::new(),
            group_transforms: Vec::new(),
            spline_data: SplineData::default(),
            fill_opacity: 1.0,
            ps,
        }
    }

    /// Flushes the page if one is still open; call after the final record.
    pub fn finalize(&mut self) {
        if self.is_page_started {
            self.end_page();
        }
    }

    fn push_output(&mut self, element: OutputElementList) {
        if self.in_vect_output {
            self.fill_output_elements.push(element);
        } else {
            self.content_output_elements.push(element);
        }
    }

    fn start_page(&mut self, width: f64, height: f64) {
        if self.ignore_page {
            return;
        }
        let mut props = PropertyList::new();
        props.insert("svg:width", PropertyValue::Double(width));
        props.insert("svg:height", PropertyValue::Double(height));
        self.painter.start_graphics(&props);
        self.is_page_started = true;
    }

    fn end_page(&mut self) {
        if !self.is_page_started {
            return;
        }
        while let Some(element) = self.content_output_elements.pop() {
            element.draw(self.painter);
        }
        self.painter.end_graphics();
        self.is_page_started = false;
    }

    fn fill_properties(&self, props: &mut PropertyList, stops_vec: &mut Vec<PropertyList>) {
        if self.fill_opacity < 1.0 {
            props.insert("draw:opacity", PropertyValue::Percent(self.fill_opacity));
        }
        let fill = &self.current_fill_style;
        if fill.fill_type == 0 || fill.fill_type == u16::MAX {
            props.insert("draw:fill", PropertyValue::from("none"));
            return;
        }
        match fill.fill_type {
            1 => {
                // Solid
                props.insert("draw:fill", PropertyValue::from("solid"));
                props.insert(
                    "draw:fill-color",
                    PropertyValue::from(self.ps.rgb_color_string(&fill.color1)),
                );
                props.insert("svg:fill-rule", PropertyValue::from("evenodd"));
            }
            2 => self.gradient_properties(props, stops_vec),
            7 => {
                // Pattern
                if let Some(pattern) = self.ps.patterns.get(&fill.image_fill.id) {
                    props.insert("draw:fill", PropertyValue::from("bitmap"));
                    let image = generate_bitmap_from_pattern(
                        &self.ps.color_transforms,
                        pattern,
                        &fill.color1,
                        &fill.color2,
                    );
                    props.insert("draw:fill-image", PropertyValue::from(base64_encode(&image)));
                    props.insert("libwpg:mime-type", PropertyValue::from("image/bmp"));
                    props.insert("style:repeat", PropertyValue::from("repeat"));
                    self.image_fill_attributes(props);
                } else {
                    // We did not find the pattern, so fill solid with the
                    // background colour
                    props.insert("draw:fill", PropertyValue::from("solid"));
                    props.insert(
                        "draw:fill-color",
                        PropertyValue::from(self.ps.rgb_color_string(&fill.color2)),
                    );
                    props.insert("svg:fill-rule", PropertyValue::from("evenodd"));
                }
            }
            9 | 11 => {
                // Bitmap | Texture
                if let Some(bmp) = self.ps.bmps.get(&fill.image_fill.id) {
                    props.insert("libwpg:mime-type", PropertyValue::from("image/bmp"));
                    props.insert("draw:fill", PropertyValue::from("bitmap"));
                    props.insert("draw:fill-image", PropertyValue::from(base64_encode(bmp)));
                    props.insert("style:repeat", PropertyValue::from("repeat"));
                    self.image_fill_attributes(props);
                } else {
                    props.insert("draw:fill", PropertyValue::from("none"));
                }
            }
            10 => {
                // Full color: an embedded vector drawing
                if let Some(svg) = self.ps.vects.get(&fill.image_fill.id) {
                    props.insert("draw:fill", PropertyValue::from("bitmap"));
                    props.insert("libwpg:mime-type", PropertyValue::from("image/svg+xml"));
                    props.insert("draw:fill-image", PropertyValue::from(base64_encode(svg)));
                    props.insert("style:repeat", PropertyValue::from("repeat"));
                    self.image_fill_attributes(props);
                } else {
                    props.insert("draw:fill", PropertyValue::from("none"));
                }
            }
            _ => {
                props.insert("draw:fill", PropertyValue::from("none"));
            }
        }
    }

    fn gradient_properties(&self, props: &mut PropertyList, stops_vec: &mut Vec<PropertyList>) {
        let fill = &self.current_fill_style;
        let gradient = &fill.gradient;
        match gradient.stops.len() {
            0 => {
                props.insert("draw:fill", PropertyValue::from("none"));
            }
            1 => {
                props.insert("draw:fill", PropertyValue::from("solid"));
                props.insert(
                    "draw:fill-color",
                    PropertyValue::from(self.ps.rgb_color_string(&gradient.stops[0].color)),
                );
                props.insert("svg:fill-rule", PropertyValue::from("evenodd"));
            }
            2 => {
                let mut angle = gradient.angle * 180.0 / std::f64::consts::PI;
                while angle < 0.0 {
                    angle += 360.0;
                }
                while angle > 360.0 {
                    angle -= 360.0;
                }
                props.insert("draw:fill", PropertyValue::from("gradient"));
                props.insert(
                    "draw:start-color",
                    PropertyValue::from(self.ps.rgb_color_string(&gradient.stops[0].color)),
                );
                props.insert(
                    "draw:end-color",
                    PropertyValue::from(self.ps.rgb_color_string(&gradient.stops[1].color)),
                );
                props.insert("draw:angle", PropertyValue::Int(angle as i32));
                match gradient.gradient_type {
                    1 | 3 => {
                        // linear | conical
                        props.insert("draw:style", PropertyValue::from("linear"));
                        angle += 90.0;
                        while angle < 0.0 {
                            angle += 360.0;
                        }
                        while angle > 360.0 {
                            angle -= 360.0;
                        }
                        props.insert("draw:angle", PropertyValue::Int(angle as i32));
                        props.insert(
                            "draw:border",
                            PropertyValue::Percent(gradient.edge_offset as f64 / 100.0),
                        );
                    }
                    2 | 4 => {
                        props.insert(
                            "draw:border",
                            PropertyValue::Percent(2.0 * gradient.edge_offset as f64 / 100.0),
                        );
                        props.insert(
                            "draw:style",
                            PropertyValue::from(if gradient.gradient_type == 2 {
                                "radial"
                            } else {
                                "square"
                            }),
                        );
                        // the producer stores a single center offset for both axes
                        props.insert(
                            "svg:cx",
                            PropertyValue::Percent(0.5 + gradient.center_x_offset as f64 / 200.0),
                        );
                        props.insert(
                            "svg:cy",
                            PropertyValue::Percent(0.5 + gradient.center_x_offset as f64 / 200.0),
                        );
                    }
                    _ => {
                        props.insert("draw:style", PropertyValue::from("linear"));
                        angle += 90.0;
                        while angle < 0.0 {
                            angle += 360.0;
                        }
                        while angle > 360.0 {
                            angle -= 360.0;
                        }
                        props.insert("draw:angle", PropertyValue::Int(angle as i32));
                        self.gradient_stops(stops_vec);
                    }
                }
            }
            _ => {
                // more than two stops: emit an explicit stop vector
                props.insert("draw:fill", PropertyValue::from("gradient"));
                props.insert("draw:style", PropertyValue::from("linear"));
                let mut angle = gradient.angle * 180.0 / std::f64::consts::PI + 90.0;
                while angle < 0.0 {
                    angle += 360.0;
                }
                while angle > 360.0 {
                    angle -= 360.0;
                }
                props.insert("draw:angle", PropertyValue::Int(angle as i32));
                self.gradient_stops(stops_vec);
            }
        }
    }

    fn gradient_stops(&self, stops_vec: &mut Vec<PropertyList>) {
        for stop in &self.current_fill_style.gradient.stops {
            let mut element = PropertyList::new();
            element.insert("svg:offset", PropertyValue::Percent(stop.offset));
            element.insert(
                "svg:stop-color",
                PropertyValue::from(self.ps.rgb_color_string(&stop.color)),
            );
            element.insert("svg:stop-opacity", PropertyValue::Percent(self.fill_opacity));
            stops_vec.push(element);
        }
    }

    /// Shared sizing and reference-point attributes of all image fills.
    fn image_fill_attributes(&self, props: &mut PropertyList) {
        let image_fill = &self.current_fill_style.image_fill;
        if image_fill.is_relative {
            props.insert("svg:width", PropertyValue::Percent(image_fill.width));
            props.insert("svg:height", PropertyValue::Percent(image_fill.height));
        } else {
            let mut scale_x = 1.0;
            let mut scale_y = 1.0;
            if image_fill.flags & 0x04 != 0 {
                // scale fill with image
                scale_x = self.current_transforms.scale_x();
                scale_y = self.current_transforms.scale_y();
            }
            props.insert("svg:width", PropertyValue::Double(image_fill.width * scale_x));
            props.insert("svg:height", PropertyValue::Double(image_fill.height * scale_y));
        }
        props.insert("draw:fill-image-ref-point", PropertyValue::from("bottom-left"));
        if image_fill.is_relative {
            if image_fill.x_offset != 0.0 && image_fill.x_offset != 1.0 {
                props.insert(
                    "draw:fill-image-ref-point-x",
                    PropertyValue::Percent(image_fill.x_offset),
                );
            }
            if image_fill.y_offset != 0.0 && image_fill.y_offset != 1.0 {
                props.insert(
                    "draw:fill-image-ref-point-y",
                    PropertyValue::Percent(image_fill.y_offset),
                );
            }
        } else if image_fill.width != 0.0 {
            if self.fill_transforms.translate_x() != 0.0 {
                let mut x_offset = self.fill_transforms.translate_x() / image_fill.width;
                while x_offset < 0.0 {
                    x_offset += 1.0;
                }
                while x_offset > 1.0 {
                    x_offset -= 1.0;
                }
                props.insert("draw:fill-image-ref-point-x", PropertyValue::Percent(x_offset));
            }
            if self.fill_transforms.translate_y() != 0.0 {
                // tile offsets are expressed in multiples of the tile width
                let mut y_offset = self.fill_transforms.translate_y() / image_fill.width;
                while y_offset < 0.0 {
                    y_offset += 1.0;
                }
                while y_offset > 1.0 {
                    y_offset -= 1.0;
                }
                props.insert(
                    "draw:fill-image-ref-point-y",
                    PropertyValue::Percent(1.0 - y_offset),
                );
            }
        }
    }

    fn line_properties(&self, props: &mut PropertyList) {
        let line = &self.current_line_style;
        if line.line_type == u16::MAX {
            props.insert("draw:stroke", PropertyValue::from("solid"));
            props.insert("svg:stroke-width", PropertyValue::Double(0.0));
            props.insert("svg:stroke-color", PropertyValue::from("#000000"));
            return;
        }
        if line.line_type & 0x1 != 0 {
            props.insert("draw:stroke", PropertyValue::from("none"));
        } else if line.line_type & 0x6 != 0 {
            if !line.dash_array.is_empty() && (line.line_type & 0x4 != 0) {
                props.insert("draw:stroke", PropertyValue::from("dash"));
            } else {
                props.insert("draw:stroke", PropertyValue::from("solid"));
            }
            let mut scale = 1.0;
            if line.line_type & 0x20 != 0 {
                // scale line with object
                scale = self.current_transforms.scale_x();
                let scale_y = self.current_transforms.scale_y();
                if scale_y > scale {
                    scale = scale_y;
                }
            }
            scale *= line.stretch;
            props.insert("svg:stroke-width", PropertyValue::Double(line.line_width * scale));
            props.insert(
                "svg:stroke-color",
                PropertyValue::from(self.ps.rgb_color_string(&line.color)),
            );

            match line.caps_type {
                1 => props.insert("svg:stroke-linecap", PropertyValue::from("round")),
                2 => props.insert("svg:stroke-linecap", PropertyValue::from("square")),
                _ => props.insert("svg:stroke-linecap", PropertyValue::from("butt")),
            }

            match line.join_type {
                1 => props.insert("svg:stroke-linejoin", PropertyValue::from("round")),
                2 => props.insert("svg:stroke-linejoin", PropertyValue::from("bevel")),
                _ => props.insert("svg:stroke-linejoin", PropertyValue::from("miter")),
            }

            if !line.dash_array.is_empty() {
                // partition the dash array into two runs with a common gap
                let mut dots1: i32 = 0;
                let mut dots2: i32 = 0;
                let mut dots1len: u32 = 0;
                let mut dots2len: u32 = 0;
                let mut gap: u32 = 0;

                if line.dash_array.len() >= 2 {
                    dots1len = line.dash_array[0];
                    gap = line.dash_array[1];
                }

                let count = line.dash_array.len() / 2;
                let mut i = 0usize;
                while i < count {
                    if dots1len != line.dash_array[2 * i] {
                        break;
                    }
                    dots1 += 1;
                    gap = gap.max(line.dash_array[2 * i + 1]);
                    i += 1;
                }
                if i < count {
                    dots2len = line.dash_array[2 * i];
                    gap = gap.max(line.dash_array[2 * i + 1]);
                }
                while i < count {
                    if dots2len != line.dash_array[2 * i] {
                        break;
                    }
                    dots2 += 1;
                    gap = gap.max(line.dash_array[2 * i + 1]);
                    i += 1;
                }
                if dots2 == 0 {
                    dots2 = dots1;
                    dots2len = dots1len;
                }
                props.insert("draw:dots1", PropertyValue::Int(dots1));
                props.insert(
                    "draw:dots1-length",
                    PropertyValue::Point(72.0 * line.line_width * scale * dots1len as f64),
                );
                props.insert("draw:dots2", PropertyValue::Int(dots2));
                props.insert(
                    "draw:dots2-length",
                    PropertyValue::Point(72.0 * line.line_width * scale * dots2len as f64),
                );
                props.insert(
                    "draw:distance",
                    PropertyValue::Point(72.0 * line.line_width * scale * gap as f64),
                );
            }
        } else {
            props.insert("draw:stroke", PropertyValue::from("solid"));
            props.insert("svg:stroke-width", PropertyValue::Double(0.0));
            props.insert("svg:stroke-color", PropertyValue::from("#000000"));
        }
    }

    fn flush_current_path(&mut self) {
        log::debug!("ContentCollector::flush_current_path");
        let mut output_element = OutputElementList::new();
        if !self.current_path.is_empty() || (!self.spline_data.is_empty() && self.is_in_spline) {
            if self.is_in_polygon {
                if let Some(polygon) = self.polygon.take() {
                    polygon.create(&mut self.current_path);
                }
            }
            self.polygon = None;
            self.is_in_polygon = false;
            if !self.spline_data.is_empty() && self.is_in_spline {
                self.spline_data.create(&mut self.current_path);
            }
            self.spline_data.clear();
            self.is_in_spline = false;

            let mut style = PropertyList::new();
            let mut gradient = Vec::new();
            self.fill_properties(&mut style, &mut gradient);
            self.line_properties(&mut style);
            output_element.add_style(style, gradient);

            self.current_path.transform_stack(&self.current_transforms);
            if let Some(group_trafo) = self.group_transforms.last() {
                self.current_path.transform_stack(group_trafo);
            }
            let offset_trafo =
                Transform::new(1.0, 0.0, -self.page.offset_x, 0.0, 1.0, -self.page.offset_y);
            self.current_path.transform(&offset_trafo);
            let flip_trafo = Transform::new(1.0, 0.0, 0.0, 0.0, -1.0, self.page.height);
            self.current_path.transform(&flip_trafo);

            let mut path = Vec::new();
            self.current_path.write_out(&mut path);
            let is_path_closed = self.current_path.is_closed();

            let mut tmp_path: Vec<PropertyList> = Vec::new();
            let mut first_point = true;
            let mut was_move = false;
            let mut initial_x = 0.0;
            let mut initial_y = 0.0;
            let mut previous_x = 0.0;
            let mut previous_y = 0.0;
            for node in path {
                if !node.contains("libwpg:path-action") {
                    continue;
                }
                let (Some(x), Some(y)) = (node.get_double("svg:x"), node.get_double("svg:y"))
                else {
                    continue;
                };
                let mut ignore_m = false;
                if first_point {
                    initial_x = x;
                    initial_y = y;
                    first_point = false;
                    was_move = true;
                } else if node.get_str("libwpg:path-action") == Some("M") {
                    // needed for a good path generation from polygons
                    if almost_zero(previous_x - x) && almost_zero(previous_y - y) {
                        ignore_m = true;
                    } else if !tmp_path.is_empty() {
                        if !was_move {
                            if (almost_zero(initial_x - previous_x)
                                && almost_zero(initial_y - previous_y))
                                || is_path_closed
                            {
                                let mut close = PropertyList::new();
                                close.insert("libwpg:path-action", PropertyValue::from("Z"));
                                tmp_path.push(close);
                            }
                        } else {
                            tmp_path.pop();
                        }
                    }
                    if !ignore_m {
                        initial_x = x;
                        initial_y = y;
                        was_move = true;
                    }
                } else {
                    was_move = false;
                }

                if !ignore_m {
                    tmp_path.push(node);
                    previous_x = x;
                    previous_y = y;
                }
            }
            if !tmp_path.is_empty() {
                if !was_move {
                    if (almost_zero(initial_x - previous_x) && almost_zero(initial_y - previous_y))
                        || is_path_closed
                    {
                        let mut close = PropertyList::new();
                        close.insert("libwpg:path-action", PropertyValue::from("Z"));
                        tmp_path.push(close);
                    }
                } else {
                    tmp_path.pop();
                }
            }
            if !tmp_path.is_empty() {
                output_element.add_path(tmp_path);
            }
            self.current_path.clear();
        }

        if !self.current_image.data.is_empty() {
            let mut cx = self.current_image.middle_x();
            let mut cy = self.current_image.middle_y();
            let mut corner1 = (self.current_image.x1, self.current_image.y1);
            let mut corner2 = (self.current_image.x1, self.current_image.y2);
            let mut corner3 = (self.current_image.x2, self.current_image.y2);
            for (x, y) in [&mut corner1, &mut corner2, &mut corner3] {
                self.current_transforms.apply_to_point(x, y);
            }
            self.current_transforms.apply_to_point(&mut cx, &mut cy);
            if let Some(group_trafo) = self.group_transforms.last() {
                group_trafo.apply_to_point(&mut cx, &mut cy);
                for (x, y) in [&mut corner1, &mut corner2, &mut corner3] {
                    group_trafo.apply_to_point(x, y);
                }
            }
            let offset_trafo =
                Transform::new(1.0, 0.0, -self.page.offset_x, 0.0, 1.0, -self.page.offset_y);
            let flip_trafo = Transform::new(1.0, 0.0, 0.0, 0.0, -1.0, self.page.height);
            for trafo in [&offset_trafo, &flip_trafo] {
                trafo.apply_to_point(&mut cx, &mut cy);
                for (x, y) in [&mut corner1, &mut corner2, &mut corner3] {
                    trafo.apply_to_point(x, y);
                }
            }
            let flip_x = self.current_transforms.flip_x();
            let flip_y = self.current_transforms.flip_y();
            let width = ((corner2.0 - corner3.0) * (corner2.0 - corner3.0)
                + (corner2.1 - corner3.1) * (corner2.1 - corner3.1))
                .sqrt();
            let height = ((corner2.0 - corner1.0) * (corner2.0 - corner1.0)
                + (corner2.1 - corner1.1) * (corner2.1 - corner1.1))
                .sqrt();
            let mut rotate = (corner3.1 - corner2.1).atan2(corner3.0 - corner2.0);

            let mut props = PropertyList::new();
            props.insert("svg:x", PropertyValue::Double(cx - width / 2.0));
            props.insert("svg:width", PropertyValue::Double(width));
            props.insert("svg:y", PropertyValue::Double(cy - height / 2.0));
            props.insert("svg:height", PropertyValue::Double(height));

            if flip_x {
                props.insert("draw:mirror-horizontal", PropertyValue::Bool(true));
                rotate = std::f64::consts::PI - rotate;
            }
            if flip_y {
                props.insert("draw:mirror-vertical", PropertyValue::Bool(true));
                rotate = -rotate;
            }
            while rotate < 0.0 {
                rotate += 2.0 * std::f64::consts::PI;
            }
            while rotate > 2.0 * std::f64::consts::PI {
                rotate -= 2.0 * std::f64::consts::PI;
            }
            if rotate != 0.0 {
                props.insert(
                    "libwpg:rotate",
                    PropertyValue::Generic(rotate * 180.0 / std::f64::consts::PI),
                );
            }
            props.insert("libwpg:mime-type", PropertyValue::from("image/bmp"));
            output_element.add_graphic_object(props, self.current_image.data.clone());
        }

        if let Some(text) = self.current_text.take() {
            if !text.is_empty() && !text[0].is_empty() {
                self.flush_text(&text, &mut output_element);
            }
        }

        self.current_image = Image::default();
        if !output_element.is_empty() {
            self.push_output(output_element);
        }
        self.current_transforms.clear();
        self.fill_transforms = Transforms::new();
        self.fill_opacity = 1.0;
        self.current_text = None;
    }

    fn flush_text(&mut self, text: &[TextLine], output_element: &mut OutputElementList) {
        let mut x1 = self.current_text_box.x;
        let mut y1 = self.current_text_box.y;
        let mut x2 = self.current_text_box.x + self.current_text_box.w;
        let mut y2 = self.current_text_box.y - self.current_text_box.h;
        if !almost_zero(self.current_text_box.h) && !almost_zero(self.current_text_box.w) {
            self.current_transforms.apply_to_point(&mut x1, &mut y1);
            self.current_transforms.apply_to_point(&mut x2, &mut y2);
            if let Some(group_trafo) = self.group_transforms.last() {
                group_trafo.apply_to_point(&mut x1, &mut y1);
                group_trafo.apply_to_point(&mut x2, &mut y2);
            }
        } else if !almost_zero(self.current_bbox.width()) && !almost_zero(self.current_bbox.height())
        {
            // recover the frame from the bounding box, shifted by alignment
            y1 = self.current_bbox.min_y();
            y2 = self.current_bbox.min_y() + self.current_bbox.height();
            match text[0].runs[0].char_style.align {
                2 => {
                    // Center
                    x1 = self.current_bbox.min_x() - self.current_bbox.width() / 4.0;
                    x2 = self.current_bbox.min_x() + 3.0 * self.current_bbox.width() / 4.0;
                }
                3 => {
                    // Right
                    x1 = self.current_bbox.min_x() - self.current_bbox.width() / 2.0;
                    x2 = self.current_bbox.min_x() + self.current_bbox.width() / 2.0;
                }
                _ => {
                    x1 = self.current_bbox.min_x();
                    x2 = self.current_bbox.min_x() + self.current_bbox.width();
                }
            }
        }

        let offset_trafo =
            Transform::new(1.0, 0.0, -self.page.offset_x, 0.0, 1.0, -self.page.offset_y);
        let flip_trafo = Transform::new(1.0, 0.0, 0.0, 0.0, -1.0, self.page.height);
        offset_trafo.apply_to_point(&mut x1, &mut y1);
        offset_trafo.apply_to_point(&mut x2, &mut y2);
        flip_trafo.apply_to_point(&mut x1, &mut y1);
        flip_trafo.apply_to_point(&mut x2, &mut y2);
        if x1 > x2 {
            std::mem::swap(&mut x1, &mut x2);
        }
        if y1 > y2 {
            std::mem::swap(&mut y1, &mut y2);
        }

        let mut frame_props = PropertyList::new();
        frame_props.insert("svg:width", PropertyValue::Double((x2 - x1).abs()));
        frame_props.insert("svg:height", PropertyValue::Double((y2 - y1).abs()));
        frame_props.insert("svg:x", PropertyValue::Double(x1));
        frame_props.insert("svg:y", PropertyValue::Double(y1));
        frame_props.insert("fo:padding-top", PropertyValue::Double(0.0));
        frame_props.insert("fo:padding-bottom", PropertyValue::Double(0.0));
        frame_props.insert("fo:padding-left", PropertyValue::Double(0.0));
        frame_props.insert("fo:padding-right", PropertyValue::Double(0.0));
        output_element.add_start_text_object(frame_props);

        for line in text {
            if line.is_empty() {
                continue;
            }
            let mut para_props = PropertyList::new();
            // the format never discloses direction; treat every run as LTR
            let rtl = false;
            match line.runs[0].char_style.align {
                1 => {
                    // Left
                    para_props.insert(
                        "fo:text-align",
                        PropertyValue::from(if rtl { "end" } else { "left" }),
                    );
                }
                2 => para_props.insert("fo:text-align", PropertyValue::from("center")),
                3 => {
                    // Right
                    para_props.insert(
                        "fo:text-align",
                        PropertyValue::from(if rtl { "left" } else { "end" }),
                    );
                }
                4 => para_props.insert("fo:text-align", PropertyValue::from("justify")),
                5 => para_props.insert("fo:text-align", PropertyValue::from("full")),
                _ => {}
            }
            output_element.add_start_text_line(para_props);
            for run in &line.runs {
                let mut span_props = PropertyList::new();
                let font_size =
                    crate::color::cdr_round(144.0 * run.char_style.font_size) as f64 / 2.0;
                span_props.insert("fo:font-size", PropertyValue::Point(font_size));
                if !run.char_style.font_name.is_empty() {
                    span_props.insert(
                        "style:font-name",
                        PropertyValue::from(run.char_style.font_name.clone()),
                    );
                }
                if run.char_style.fill_style.fill_type != u16::MAX {
                    span_props.insert(
                        "fo:color",
                        PropertyValue::from(
                            self.ps.rgb_color_string(&run.char_style.fill_style.color1),
                        ),
                    );
                }
                output_element.add_start_text_span(span_props);
                output_element.add_insert_text(run.text.clone());
                output_element.add_end_text_span();
            }
            output_element.add_end_text_line();
        }
        output_element.add_end_text_object();
    }
}

/// Expands a 1-bpp pattern against its fore/back colors into a 32-bit BMP.
fn generate_bitmap_from_pattern(
    transforms: &ColorTransforms,
    pattern: &Pattern,
    fg_color: &Color,
    bg_color: &Color,
) -> Vec<u8> {
    use crate::styles_collector::{write_u16, write_u32};

    let height = pattern.height;
    let width = pattern.width;
    let Some(pixel_size) = height.checked_mul(width) else {
        return Vec::new();
    };
    let Some(dib_image_size) = pixel_size.checked_mul(4) else {
        return Vec::new();
    };
    let dib_offset_bits: u32 = 14 + 40;
    let Some(dib_file_size) = dib_image_size.checked_add(dib_offset_bits) else {
        return Vec::new();
    };

    let mut bitmap = Vec::with_capacity(dib_file_size as usize);
    write_u16(&mut bitmap, 0x4d42);
    write_u32(&mut bitmap, dib_file_size);
    write_u16(&mut bitmap, 0);
    write_u16(&mut bitmap, 0);
    write_u32(&mut bitmap, dib_offset_bits);

    write_u32(&mut bitmap, 40);
    write_u32(&mut bitmap, width);
    write_u32(&mut bitmap, height);
    write_u16(&mut bitmap, 1);
    write_u16(&mut bitmap, 32);
    write_u32(&mut bitmap, 0);
    write_u32(&mut bitmap, dib_image_size);
    write_u32(&mut bitmap, 0);
    write_u32(&mut bitmap, 0);
    write_u32(&mut bitmap, 0);
    write_u32(&mut bitmap, 0);

    // pattern rows are padded to whole bytes
    let line_width = (width as usize + 7) / 8;
    let foreground = transforms.rgb_color(fg_color);
    let background = transforms.rgb_color(bg_color);

    for j in (1..=height as usize).rev() {
        let mut i = 0usize;
        let mut k = 0u32;
        while i < line_width && k < width {
            let Some(&byte) = pattern.pattern.get((j - 1) * line_width + i) else {
                return bitmap;
            };
            let mut c = byte;
            i += 1;
            let mut l = 0;
            while k < width && l < 8 {
                if c & 0x80 != 0 {
                    write_u32(&mut bitmap, background);
                } else {
                    write_u32(&mut bitmap, foreground);
                }
                c <<= 1;
                l += 1;
                k += 1;
            }
        }
    }
    bitmap
}

impl Collector for ContentCollector<'_, '_> {
    fn collect_page(&mut self, level: u32) {
        self.is_page_properties = true;
        self.ignore_page = false;
        self.current_page_level = level;
        if let Some(page) = self.ps.pages.get(self.page_index).copied() {
            self.page = page;
        }
        self.page_index += 1;
    }

    fn collect_object(&mut self, level: u32) {
        if !self.is_page_started && self.current_vect_level == 0 && !self.ignore_page {
            self.start_page(self.page.width, self.page.height);
        }
        self.current_object_level = level;
        self.current_fill_style = FillStyle::default();
        self.current_line_style = LineStyle::default();
        self.current_bbox = Rect::default();
    }

    fn collect_group(&mut self, level: u32) {
        if !self.is_page_started && self.current_vect_level == 0 && !self.ignore_page {
            self.start_page(self.page.width, self.page.height);
        }
        // objects are drawn in reverse order, so group marks are reversed too
        let mut output_element = OutputElementList::new();
        output_element.add_end_group();
        self.push_output(output_element);
        self.group_levels.push(level);
        self.group_transforms.push(Transforms::new());
    }

    fn collect_vect(&mut self, level: u32) {
        self.current_vect_level = level;
        self.in_vect_output = true;
        self.page = Page::default();
    }

    fn collect_flags(&mut self, flags: u32, consider_flags: bool) {
        if self.is_page_properties && (flags & 0x00ff_0000) == 0 {
            if !self.is_page_started {
                self.start_page(self.page.width, self.page.height);
            }
        } else if self.is_page_properties && consider_flags {
            self.ignore_page = true;
        }
        self.is_page_properties = false;
    }

    fn collect_other_list(&mut self) {}

    fn collect_cubic_bezier(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        self.current_path.append_cubic_bezier_to(x1, y1, x2, y2, x, y);
    }

    fn collect_quadratic_bezier(&mut self, x1: f64, y1: f64, x: f64, y: f64) {
        self.current_path.append_quadratic_bezier_to(x1, y1, x, y);
    }

    fn collect_move_to(&mut self, x: f64, y: f64) {
        self.current_path.append_move_to(x, y);
    }

    fn collect_line_to(&mut self, x: f64, y: f64) {
        self.current_path.append_line_to(x, y);
    }

    fn collect_arc_to(&mut self, rx: f64, ry: f64, large_arc: bool, sweep: bool, x: f64, y: f64) {
        self.current_path.append_arc_to(rx, ry, 0.0, large_arc, sweep, x, y);
    }

    fn collect_close_path(&mut self) {
        self.current_path.append_close_path();
    }

    fn collect_level(&mut self, level: u32) {
        if level <= self.current_object_level {
            self.flush_current_path();
            self.current_object_level = 0;
        }
        while self
            .group_levels
            .last()
            .map(|&top| level <= top)
            .unwrap_or(false)
        {
            // reversed rendering order: a closing group emits its start mark
            let mut output_element = OutputElementList::new();
            output_element.add_start_group(PropertyList::new());
            self.push_output(output_element);
            self.group_levels.pop();
            self.group_transforms.pop();
        }
        if self.current_vect_level != 0
            && self.spnd != 0
            && self.group_levels.is_empty()
            && !self.fill_output_elements.is_empty()
        {
            // serialize the collected vector pattern through the SVG sink
            let mut generator = SvgGenerator::new();
            let mut props = PropertyList::new();
            props.insert("svg:width", PropertyValue::Double(self.page.width));
            props.insert("svg:height", PropertyValue::Double(self.page.height));
            generator.start_graphics(&props);
            while let Some(element) = self.fill_output_elements.pop() {
                element.draw(&mut generator);
            }
            generator.end_graphics();
            let svg = generator.into_svg();
            if !svg.is_empty() {
                let mut output = SVG_HEADER.as_bytes().to_vec();
                output.extend_from_slice(svg.as_bytes());
                self.ps.vects.insert(self.spnd, output);
            }
            self.spnd = 0;
            self.page = Page::default();
        }
        if level <= self.current_vect_level {
            self.current_vect_level = 0;
            self.in_vect_output = false;
            self.page = self
                .ps
                .pages
                .get(if self.page_index != 0 { self.page_index - 1 } else { 0 })
                .copied()
                .unwrap_or_default();
        }
        if level <= self.current_page_level {
            self.end_page();
            self.current_page_level = 0;
        }
    }

    fn collect_transform(&mut self, transforms: &Transforms, consider_group_transform: bool) {
        if self.current_object_level != 0 {
            self.current_transforms = transforms.clone();
        } else if consider_group_transform {
            if let Some(top) = self.group_transforms.last_mut() {
                *top = transforms.clone();
            }
        }
    }

    fn collect_fill_transform(&mut self, fill_trafos: &Transforms) {
        self.fill_transforms = fill_trafos.clone();
    }

    fn collect_fill_style(&mut self, fill_style: FillStyle) {
        self.current_fill_style = fill_style;
    }

    fn collect_line_style(&mut self, line_style: LineStyle) {
        self.current_line_style = line_style;
    }

    fn collect_rotate(&mut self, angle: f64, cx: f64, cy: f64) {
        let to_origin = Transform::new(1.0, 0.0, -cx, 0.0, 1.0, -cy);
        self.current_path.transform(&to_origin);
        let rotation =
            Transform::new(angle.cos(), -angle.sin(), 0.0, angle.sin(), angle.cos(), 0.0);
        self.current_path.transform(&rotation);
        let back = Transform::new(1.0, 0.0, cx, 0.0, 1.0, cy);
        self.current_path.transform(&back);
    }

    fn collect_polygon(&mut self) {
        self.is_in_polygon = true;
    }

    fn collect_spline(&mut self) {
        self.is_in_spline = true;
    }

    fn collect_polygon_transform(
        &mut self,
        num_angles: u32,
        next_point: u32,
        rx: f64,
        ry: f64,
        cx: f64,
        cy: f64,
    ) {
        self.polygon = Some(Polygon::new(num_angles, next_point, rx, ry, cx, cy));
    }

    fn collect_bitmap(&mut self, image_id: u32, x1: f64, x2: f64, y1: f64, y2: f64) {
        if let Some(bmp) = self.ps.bmps.get(&image_id) {
            self.current_image = Image::new(bmp.clone(), x1, x2, y1, y2);
        }
    }

    fn collect_ppdt(&mut self, points: &[(f64, f64)], knot_vector: &[u32]) {
        self.spline_data = SplineData::new(points.to_vec(), knot_vector.to_vec());
    }

    fn collect_fill_opacity(&mut self, opacity: f64) {
        self.fill_opacity = opacity;
    }

    fn collect_bbox(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) {
        let bbox = Rect::from_corners(x0, y0, x1, y1);
        if self.current_vect_level != 0 && self.page.width == 0.0 && self.page.height == 0.0 {
            self.page.width = bbox.width();
            self.page.height = bbox.height();
            self.page.offset_x = bbox.min_x();
            self.page.offset_y = bbox.min_y();
        }
        self.current_bbox = bbox;
    }

    fn collect_spnd(&mut self, spnd: u32) {
        if self.current_vect_level != 0 && self.spnd == 0 {
            self.spnd = spnd;
        } else if self.current_vect_level == 0 {
            self.spnd = spnd;
        }
    }

    fn collect_vector_pattern(&mut self, id: u32, data: &[u8]) {
        if !crate::document::CmxDocument::is_supported(data) {
            return;
        }
        let mut svg_output = Vec::new();
        if !crate::document::CmxDocument::generate_svg(data, &mut svg_output) {
            return;
        }
        if let Some(first) = svg_output.first() {
            let mut output = SVG_HEADER.as_bytes().to_vec();
            output.extend_from_slice(first.as_bytes());
            self.ps.vects.insert(id, output);
        }
    }

    fn collect_artistic_text(&mut self, x: f64, y: f64) {
        self.current_text_box = Rect::from_corners(x, y, x, y);
        self.current_bbox.w *= 2.0;
        self.current_text = self.ps.texts.get(&self.spnd).cloned();
    }

    fn collect_paragraph_text(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.current_text_box = Rect { x, y, w: width, h: height };
        self.current_text = self.ps.texts.get(&self.spnd).cloned();
    }
}
