//! Shared helpers: a byte-stream builder for synthesized documents and a
//! recording paint sink.

use cdrimport::{PaintSink, PropertyList};

/// Little-endian byte assembler for synthesized test documents.
#[derive(Default, Clone)]
pub struct Bytes(pub Vec<u8>);

#[allow(dead_code)]
impl Bytes {
    pub fn new() -> Self {
        Bytes::default()
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }

    pub fn u16(mut self, v: u16) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn s16(mut self, v: i16) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn s32(mut self, v: i32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f64(mut self, v: f64) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// 32-bit coordinate: inches × 254000
    pub fn coord32(self, inches: f64) -> Self {
        self.s32((inches * 254000.0).round() as i32)
    }

    /// 16-bit coordinate: units × 1000
    pub fn coord16(self, units: f64) -> Self {
        self.s16((units * 1000.0).round() as i16)
    }

    /// 32-bit angle: degrees × 1,000,000
    pub fn angle32(self, degrees: f64) -> Self {
        self.s32((degrees * 1_000_000.0).round() as i32)
    }

    /// 16-bit angle: degrees × 10
    pub fn angle16(self, degrees: f64) -> Self {
        self.s16((degrees * 10.0).round() as i16)
    }

    pub fn tag(mut self, tag: &[u8; 4]) -> Self {
        self.0.extend_from_slice(tag);
        self
    }

    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.0.extend_from_slice(data);
        self
    }

    /// A leaf chunk: fourCC + length + body.
    pub fn chunk(mut self, tag: &[u8; 4], body: &Bytes) -> Self {
        self.0.extend_from_slice(tag);
        self.0.extend_from_slice(&(body.0.len() as u32).to_le_bytes());
        self.0.extend_from_slice(&body.0);
        self
    }

    /// A LIST chunk: "LIST" + length + list type + children.
    pub fn list(mut self, list_type: &[u8; 4], children: &Bytes) -> Self {
        self.0.extend_from_slice(b"LIST");
        self.0
            .extend_from_slice(&((children.0.len() + 4) as u32).to_le_bytes());
        self.0.extend_from_slice(list_type);
        self.0.extend_from_slice(&children.0);
        self
    }

    /// The outermost RIFF container.
    pub fn riff(list_type: &[u8; 4], children: &Bytes) -> Vec<u8> {
        let mut out = b"RIFF".to_vec();
        out.extend_from_slice(&((children.0.len() + 4) as u32).to_le_bytes());
        out.extend_from_slice(list_type);
        out.extend_from_slice(&children.0);
        out
    }
}

fn fmt_props(props: &PropertyList) -> String {
    props
        .iter()
        .map(|(k, v)| format!("{}={}", k, v.to_propstring()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Records every paint event as a readable line.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<String>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink::default()
    }

    pub fn names(&self) -> Vec<String> {
        self.events
            .iter()
            .map(|e| e.split('(').next().unwrap_or(e).to_string())
            .collect()
    }
}

impl PaintSink for RecordingSink {
    fn start_graphics(&mut self, props: &PropertyList) {
        self.events.push(format!("startGraphics({})", fmt_props(props)));
    }

    fn end_graphics(&mut self) {
        self.events.push("endGraphics".to_string());
    }

    fn start_group(&mut self, _props: &PropertyList) {
        self.events.push("startGroup".to_string());
    }

    fn end_group(&mut self) {
        self.events.push("endGroup".to_string());
    }

    fn set_style(&mut self, props: &PropertyList, gradient_stops: &[PropertyList]) {
        let mut line = format!("setStyle({})", fmt_props(props));
        for stop in gradient_stops {
            line.push_str(&format!(" stop[{}]", fmt_props(stop)));
        }
        self.events.push(line);
    }

    fn draw_path(&mut self, nodes: &[PropertyList]) {
        let parts: Vec<String> = nodes
            .iter()
            .map(|node| {
                let action = node.get_str("libwpg:path-action").unwrap_or("?");
                let mut part = action.to_string();
                for key in [
                    "svg:x1",
                    "svg:y1",
                    "svg:x2",
                    "svg:y2",
                    "svg:rx",
                    "svg:ry",
                    "libwpg:rotate",
                    "libwpg:large-arc",
                    "libwpg:sweep",
                    "svg:x",
                    "svg:y",
                ] {
                    if let Some(v) = node.get(key) {
                        part.push_str(&format!(" {}", v.to_propstring()));
                    }
                }
                part
            })
            .collect();
        self.events.push(format!("drawPath({})", parts.join(" | ")));
    }

    fn draw_graphic_object(&mut self, props: &PropertyList, data: &[u8]) {
        self.events.push(format!(
            "drawGraphicObject({}; {} bytes)",
            fmt_props(props),
            data.len()
        ));
    }

    fn start_text_object(&mut self, props: &PropertyList) {
        self.events
            .push(format!("startTextObject({})", fmt_props(props)));
    }

    fn start_text_line(&mut self, props: &PropertyList) {
        self.events.push(format!("startTextLine({})", fmt_props(props)));
    }

    fn start_text_span(&mut self, props: &PropertyList) {
        self.events.push(format!("startTextSpan({})", fmt_props(props)));
    }

    fn insert_text(&mut self, text: &str) {
        self.events.push(format!("insertText({})", text));
    }

    fn end_text_span(&mut self) {
        self.events.push("endTextSpan".to_string());
    }

    fn end_text_line(&mut self) {
        self.events.push("endTextLine".to_string());
    }

    fn end_text_object(&mut self) {
        self.events.push("endTextObject".to_string());
    }
}
