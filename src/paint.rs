//! Paint events and the sink contract.
//!
//! Events are a tagged enum rather than boxed trait objects: cheaper,
//! totally matchable, trivial to clone.

use crate::props::PropertyList;

/// The paint-interface every rendering backend implements. Values are
/// device-independent: lengths in inches, colors `#RRGGBB`, angles in
/// degrees unless a property says otherwise.
pub trait PaintSink {
    fn start_graphics(&mut self, props: &PropertyList);
    fn end_graphics(&mut self);
    fn start_group(&mut self, props: &PropertyList);
    fn end_group(&mut self);
    fn set_style(&mut self, props: &PropertyList, gradient_stops: &[PropertyList]);
    fn draw_path(&mut self, nodes: &[PropertyList]);
    fn draw_graphic_object(&mut self, props: &PropertyList, data: &[u8]);
    fn start_text_object(&mut self, props: &PropertyList);
    fn start_text_line(&mut self, props: &PropertyList);
    fn start_text_span(&mut self, props: &PropertyList);
    fn insert_text(&mut self, text: &str);
    fn end_text_span(&mut self);
    fn end_text_line(&mut self);
    fn end_text_object(&mut self);
}

/// One deferred paint event.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputElement {
    Style { props: PropertyList, stops: Vec<PropertyList> },
    Path { nodes: Vec<PropertyList> },
    GraphicObject { props: PropertyList, data: Vec<u8> },
    StartTextObject { props: PropertyList },
    StartTextLine { props: PropertyList },
    StartTextSpan { props: PropertyList },
    InsertText { text: String },
    EndTextSpan,
    EndTextLine,
    EndTextObject,
    StartGroup { props: PropertyList },
    EndGroup,
}

impl OutputElement {
    pub fn draw(&self, sink: &mut dyn PaintSink) {
        match self {
            OutputElement::Style { props, stops } => sink.set_style(props, stops),
            OutputElement::Path { nodes } => sink.draw_path(nodes),
            OutputElement::GraphicObject { props, data } => sink.draw_graphic_object(props, data),
            OutputElement::StartTextObject { props } => sink.start_text_object(props),
            OutputElement::StartTextLine { props } => sink.start_text_line(props),
            OutputElement::StartTextSpan { props } => sink.start_text_span(props),
            OutputElement::InsertText { text } => sink.insert_text(text),
            OutputElement::EndTextSpan => sink.end_text_span(),
            OutputElement::EndTextLine => sink.end_text_line(),
            OutputElement::EndTextObject => sink.end_text_object(),
            OutputElement::StartGroup { props } => sink.start_group(props),
            OutputElement::EndGroup => sink.end_group(),
        }
    }
}

/// The events one collected object contributes, drawn in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputElementList {
    elements: Vec<OutputElement>,
}

impl OutputElementList {
    pub fn new() -> Self {
        OutputElementList::default()
    }

    pub fn draw(&self, sink: &mut dyn PaintSink) {
        for element in &self.elements {
            element.draw(sink);
        }
    }

    pub fn add_style(&mut self, props: PropertyList, stops: Vec<PropertyList>) {
        self.elements.push(OutputElement::Style { props, stops });
    }

    pub fn add_path(&mut self, nodes: Vec<PropertyList>) {
        self.elements.push(OutputElement::Path { nodes });
    }

    pub fn add_graphic_object(&mut self, props: PropertyList, data: Vec<u8>) {
        self.elements.push(OutputElement::GraphicObject { props, data });
    }

    pub fn add_start_text_object(&mut self, props: PropertyList) {
        self.elements.push(OutputElement::StartTextObject { props });
    }

    pub fn add_start_text_line(&mut self, props: PropertyList) {
        self.elements.push(OutputElement::StartTextLine { props });
    }

    pub fn add_start_text_span(&mut self, props: PropertyList) {
        self.elements.push(OutputElement::StartTextSpan { props });
    }

    pub fn add_insert_text(&mut self, text: String) {
        self.elements.push(OutputElement::InsertText { text });
    }

    pub fn add_end_text_span(&mut self) {
        self.elements.push(OutputElement::EndTextSpan);
    }

    pub fn add_end_text_line(&mut self) {
        self.elements.push(OutputElement::EndTextLine);
    }

    pub fn add_end_text_object(&mut self) {
        self.elements.push(OutputElement::EndTextObject);
    }

    pub fn add_start_group(&mut self, props: PropertyList) {
        self.elements.push(OutputElement::StartGroup { props });
    }

    pub fn add_end_group(&mut self) {
        self.elements.push(OutputElement::EndGroup);
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
