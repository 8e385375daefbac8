//! A compact SVG-writing paint sink.
//!
//! This exists for two reasons: embedded vector patterns are serialized to
//! SVG for later reuse as fill images, and the `generate_svg` convenience
//! entry points need an in-process backend. It covers the paint-event
//! vocabulary this crate emits and no more.

use crate::paint::PaintSink;
use crate::props::PropertyList;

/// Device-independent inches → SVG user units (points).
const UNITS_PER_INCH: f64 = 72.0;

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn num(v: f64) -> String {
    let s = format!("{:.4}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[derive(Default)]
pub struct SvgGenerator {
    outputs: Vec<String>,
    current: String,
    style: PropertyList,
    stops: Vec<PropertyList>,
}

impl SvgGenerator {
    pub fn new() -> Self {
        SvgGenerator::default()
    }

    /// All finished pages, one SVG document each.
    pub fn into_outputs(self) -> Vec<String> {
        self.outputs
    }

    /// The first finished page, or an empty string when none was produced.
    pub fn into_svg(mut self) -> String {
        if self.outputs.is_empty() {
            String::new()
        } else {
            self.outputs.swap_remove(0)
        }
    }

    fn fill_attributes(&self) -> String {
        let mut attrs = String::new();
        match self.style.get_str("draw:fill") {
            Some("solid") => {
                let color = self.style.get_str("draw:fill-color").unwrap_or("#000000");
                attrs.push_str(&format!(" fill=\"{}\"", color));
            }
            Some("gradient") => {
                // flattened: the first stop color stands in for the ramp
                let color = self
                    .style
                    .get_str("draw:start-color")
                    .or_else(|| self.stops.first().and_then(|s| s.get_str("svg:stop-color")))
                    .unwrap_or("#000000");
                attrs.push_str(&format!(" fill=\"{}\"", color));
            }
            _ => attrs.push_str(" fill=\"none\""),
        }
        if self.style.get_str("svg:fill-rule") == Some("evenodd") {
            attrs.push_str(" fill-rule=\"evenodd\"");
        }
        match self.style.get_str("draw:stroke") {
            Some("none") | None => attrs.push_str(" stroke=\"none\""),
            Some(_) => {
                let color = self.style.get_str("svg:stroke-color").unwrap_or("#000000");
                let width = self.style.get_double("svg:stroke-width").unwrap_or(0.0);
                attrs.push_str(&format!(
                    " stroke=\"{}\" stroke-width=\"{}\"",
                    color,
                    num(width * UNITS_PER_INCH)
                ));
                if self.style.get_str("draw:stroke") == Some("dash") {
                    let dash = self.style.get_double("draw:dots1-length").unwrap_or(0.0);
                    let gap = self.style.get_double("draw:distance").unwrap_or(0.0);
                    attrs.push_str(&format!(
                        " stroke-dasharray=\"{},{}\"",
                        num(dash),
                        num(gap)
                    ));
                }
                if let Some(cap) = self.style.get_str("svg:stroke-linecap") {
                    attrs.push_str(&format!(" stroke-linecap=\"{}\"", cap));
                }
                if let Some(join) = self.style.get_str("svg:stroke-linejoin") {
                    attrs.push_str(&format!(" stroke-linejoin=\"{}\"", join));
                }
            }
        }
        attrs
    }
}

impl PaintSink for SvgGenerator {
    fn start_graphics(&mut self, props: &PropertyList) {
        self.current.clear();
        let width = props.get_double("svg:width").unwrap_or(0.0);
        let height = props.get_double("svg:height").unwrap_or(0.0);
        self.current.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" version=\"1.1\" width=\"{}in\" height=\"{}in\" viewBox=\"0 0 {} {}\">\n",
            num(width),
            num(height),
            num(width * UNITS_PER_INCH),
            num(height * UNITS_PER_INCH)
        ));
    }

    fn end_graphics(&mut self) {
        self.current.push_str("</svg>\n");
        self.outputs.push(std::mem::take(&mut self.current));
    }

    fn start_group(&mut self, _props: &PropertyList) {
        self.current.push_str("<g>\n");
    }

    fn end_group(&mut self) {
        self.current.push_str("</g>\n");
    }

    fn set_style(&mut self, props: &PropertyList, gradient_stops: &[PropertyList]) {
        self.style = props.clone();
        self.stops = gradient_stops.to_vec();
    }

    fn draw_path(&mut self, nodes: &[PropertyList]) {
        let mut d = String::new();
        for node in nodes {
            let Some(action) = node.get_str("libwpg:path-action") else {
                continue;
            };
            let x = node.get_double("svg:x").unwrap_or(0.0) * UNITS_PER_INCH;
            let y = node.get_double("svg:y").unwrap_or(0.0) * UNITS_PER_INCH;
            match action {
                "M" => d.push_str(&format!("M{} {} ", num(x), num(y))),
                "L" => d.push_str(&format!("L{} {} ", num(x), num(y))),
                "C" => {
                    let x1 = node.get_double("svg:x1").unwrap_or(0.0) * UNITS_PER_INCH;
                    let y1 = node.get_double("svg:y1").unwrap_or(0.0) * UNITS_PER_INCH;
                    let x2 = node.get_double("svg:x2").unwrap_or(0.0) * UNITS_PER_INCH;
                    let y2 = node.get_double("svg:y2").unwrap_or(0.0) * UNITS_PER_INCH;
                    d.push_str(&format!(
                        "C{} {} {} {} {} {} ",
                        num(x1),
                        num(y1),
                        num(x2),
                        num(y2),
                        num(x),
                        num(y)
                    ));
                }
                "Q" => {
                    let x1 = node.get_double("svg:x1").unwrap_or(0.0) * UNITS_PER_INCH;
                    let y1 = node.get_double("svg:y1").unwrap_or(0.0) * UNITS_PER_INCH;
                    d.push_str(&format!("Q{} {} {} {} ", num(x1), num(y1), num(x), num(y)));
                }
                "A" => {
                    let rx = node.get_double("svg:rx").unwrap_or(0.0) * UNITS_PER_INCH;
                    let ry = node.get_double("svg:ry").unwrap_or(0.0) * UNITS_PER_INCH;
                    let rotate = node.get_double("libwpg:rotate").unwrap_or(0.0);
                    let large = node.get_double("libwpg:large-arc").unwrap_or(0.0) != 0.0;
                    let sweep = node.get_double("libwpg:sweep").unwrap_or(0.0) != 0.0;
                    d.push_str(&format!(
                        "A{} {} {} {} {} {} {} ",
                        num(rx),
                        num(ry),
                        num(rotate),
                        large as u8,
                        sweep as u8,
                        num(x),
                        num(y)
                    ));
                }
                "Z" => d.push_str("Z "),
                _ => {}
            }
        }
        self.current.push_str(&format!(
            "<path d=\"{}\"{}/>\n",
            d.trim_end(),
            self.fill_attributes()
        ));
    }

    fn draw_graphic_object(&mut self, props: &PropertyList, data: &[u8]) {
        use base64::Engine;
        let x = props.get_double("svg:x").unwrap_or(0.0) * UNITS_PER_INCH;
        let y = props.get_double("svg:y").unwrap_or(0.0) * UNITS_PER_INCH;
        let width = props.get_double("svg:width").unwrap_or(0.0) * UNITS_PER_INCH;
        let height = props.get_double("svg:height").unwrap_or(0.0) * UNITS_PER_INCH;
        let mime = props.get_str("libwpg:mime-type").unwrap_or("image/bmp");
        let payload = base64::engine::general_purpose::STANDARD.encode(data);
        self.current.push_str(&format!(
            "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" xlink:href=\"data:{};base64,{}\"/>\n",
            num(x),
            num(y),
            num(width),
            num(height),
            mime,
            payload
        ));
    }

    fn start_text_object(&mut self, props: &PropertyList) {
        let x = props.get_double("svg:x").unwrap_or(0.0) * UNITS_PER_INCH;
        let y = props.get_double("svg:y").unwrap_or(0.0) * UNITS_PER_INCH;
        self.current
            .push_str(&format!("<text x=\"{}\" y=\"{}\">", num(x), num(y)));
    }

    fn start_text_line(&mut self, _props: &PropertyList) {}

    fn start_text_span(&mut self, props: &PropertyList) {
        let mut attrs = String::new();
        if let Some(size) = props.get_double("fo:font-size") {
            attrs.push_str(&format!(" font-size=\"{}\"", num(size)));
        }
        if let Some(font) = props.get_str("style:font-name") {
            attrs.push_str(&format!(" font-family=\"{}\"", escape_xml(font)));
        }
        if let Some(color) = props.get_str("fo:color") {
            attrs.push_str(&format!(" fill=\"{}\"", color));
        }
        self.current.push_str(&format!("<tspan{}>", attrs));
    }

    fn insert_text(&mut self, text: &str) {
        self.current.push_str(&escape_xml(text));
    }

    fn end_text_span(&mut self) {
        self.current.push_str("</tspan>");
    }

    fn end_text_line(&mut self) {}

    fn end_text_object(&mut self) {
        self.current.push_str("</text>\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::PropertyValue;

    #[test]
    fn test_page_produces_svg_document() {
        let mut generator = SvgGenerator::new();
        let mut props = PropertyList::new();
        props.insert("svg:width", PropertyValue::Double(2.0));
        props.insert("svg:height", PropertyValue::Double(1.0));
        generator.start_graphics(&props);

        let mut style = PropertyList::new();
        style.insert("draw:fill", PropertyValue::from("solid"));
        style.insert("draw:fill-color", PropertyValue::from("#ff0000"));
        style.insert("draw:stroke", PropertyValue::from("none"));
        generator.set_style(&style, &[]);

        let mut m = PropertyList::new();
        m.insert("libwpg:path-action", PropertyValue::from("M"));
        m.insert("svg:x", PropertyValue::Double(0.0));
        m.insert("svg:y", PropertyValue::Double(0.0));
        let mut l = PropertyList::new();
        l.insert("libwpg:path-action", PropertyValue::from("L"));
        l.insert("svg:x", PropertyValue::Double(1.0));
        l.insert("svg:y", PropertyValue::Double(1.0));
        let mut z = PropertyList::new();
        z.insert("libwpg:path-action", PropertyValue::from("Z"));
        generator.draw_path(&[m, l, z]);
        generator.end_graphics();

        let svg = generator.into_svg();
        assert!(svg.starts_with("<svg "));
        assert!(svg.contains("width=\"2in\""));
        assert!(svg.contains("M0 0 L72 72 Z"));
        assert!(svg.contains("fill=\"#ff0000\""));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut generator = SvgGenerator::new();
        generator.start_graphics(&PropertyList::new());
        generator.start_text_object(&PropertyList::new());
        generator.start_text_span(&PropertyList::new());
        generator.insert_text("a < b & c");
        generator.end_text_span();
        generator.end_text_object();
        generator.end_graphics();
        assert!(generator.into_svg().contains("a &lt; b &amp; c"));
    }
}
