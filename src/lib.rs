//! # cdrimport
//!
//! cdrimport is a one-way importer for the CorelDRAW family of vector
//! graphics formats: the RIFF-chunked native document format (CDR) and the
//! Corel Presentation Exchange metafile format (CMX). Parsing emits a
//! back-to-front ordered sequence of device-independent drawing events into
//! a caller-supplied [`PaintSink`], suitable for rendering to SVG or any
//! other vector backend.
//!
//! # Getting started
//!
//! ```rust
//! use cdrimport::CdrDocument;
//!
//! let data = std::fs::read("drawing.cdr").unwrap_or_default();
//!
//! if CdrDocument::is_supported(&data) {
//!     let mut pages = Vec::new();
//!     if CdrDocument::generate_svg(&data, &mut pages) {
//!         for (n, svg) in pages.iter().enumerate() {
//!             println!("page {}: {} bytes of SVG", n + 1, svg.len());
//!         }
//!     }
//! }
//! ```
//!
//! For custom backends, implement [`PaintSink`] and call
//! [`CdrDocument::parse`] / [`CmxDocument::parse`] instead. The parse is a
//! strict two-pass affair: a styles pass materializes every id-keyed
//! resource (bitmaps, patterns, palettes, fonts, character styles), then a
//! content pass replays the document and flushes resolved paint events.
//! Both passes are deterministic functions of the input bytes.

pub mod cdr_parser;
pub mod cmx_parser;
pub mod collector;
pub mod color;
pub mod common;
pub mod constants;
pub mod content_collector;
pub mod document;
pub mod errors;
pub mod icc;
pub mod paint;
pub mod path;
pub mod props;
pub mod stream;
pub mod styles_collector;
pub mod svg;
pub mod transform;
pub mod types;
pub mod zip;

pub use collector::{Collector, ParserState};
pub use document::{CdrDocument, CmxDocument};
pub use errors::{Error, Result};
pub use paint::{OutputElement, OutputElementList, PaintSink};
pub use path::{Path, PathElement};
pub use props::{PropertyList, PropertyValue};
pub use svg::SvgGenerator;
pub use transform::{Transform, Transforms};
pub use types::{
    CharacterStyle, Color, FillStyle, Font, Gradient, GradientStop, Image, ImageFill, LineStyle,
    Page, Pattern, Polygon, Rect, SplineData, TextLine, TextRun,
};

/// Coordinate comparisons tolerance used throughout the pipeline.
pub const CDR_EPSILON: f64 = 1e-6;
