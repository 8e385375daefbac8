//! Public entry points: format detection and the two-pass parse drive.

use std::io::{Cursor, Read};

use crate::cdr_parser::CdrParser;
use crate::cmx_parser::CmxParser;
use crate::collector::ParserState;
use crate::constants::{FOURCC_RIFF, FOURCC_RIFX};
use crate::content_collector::ContentCollector;
use crate::paint::PaintSink;
use crate::stream::{InternalStream, Seek};
use crate::styles_collector::StylesCollector;
use crate::svg::SvgGenerator;

const OLE_MAGIC: [u8; 8] = [0xd0, 0xcf, 0x11, 0xe0, 0xa1, 0xb1, 0x1a, 0xe1];
const OLE_MAIN_STREAM: &str = "PerfectOffice_MAIN";

/// Unwraps an OLE-compound wrapper down to the raw RIFF byte view.
fn resolve_input(data: &[u8]) -> Option<InternalStream> {
    if data.starts_with(&OLE_MAGIC) {
        let mut compound = cfb::CompoundFile::open(Cursor::new(data)).ok()?;
        let mut stream = compound.open_stream(OLE_MAIN_STREAM).ok()?;
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).ok()?;
        return Some(InternalStream::new(buffer));
    }
    Some(InternalStream::from_slice(data))
}

/// RIFF/RIFX magic plus a case-insensitive format triplet at offset 8.
fn has_riff_signature(input: &mut InternalStream, signature: &[u8; 3]) -> bool {
    input.seek(0, Seek::Set);
    let Ok(riff) = input.read_fourcc() else {
        return false;
    };
    if riff != FOURCC_RIFF && riff != FOURCC_RIFX {
        return false;
    }
    input.seek(4, Seek::Cur);
    for &expected in signature {
        let Ok(byte) = input.read_u8() else {
            return false;
        };
        if !byte.eq_ignore_ascii_case(&expected) {
            return false;
        }
    }
    true
}

/// Importer for the RIFF-chunked native document format.
pub struct CdrDocument;

impl CdrDocument {
    /// Analyzes the content of the input to see if it can be parsed.
    pub fn is_supported(data: &[u8]) -> bool {
        match resolve_input(data) {
            Some(mut input) => has_riff_signature(&mut input, b"CDR"),
            None => false,
        }
    }

    /// The main parsing routine: makes callbacks into `painter` as the
    /// document is consumed. Returns true when any content was emitted.
    pub fn parse(data: &[u8], painter: &mut dyn PaintSink) -> bool {
        let Some(mut input) = resolve_input(data) else {
            return false;
        };
        if !has_riff_signature(&mut input, b"CDR") {
            return false;
        }
        input.seek(0, Seek::Set);

        let mut ps = ParserState::new();
        let mut ret = {
            let mut styles_collector = StylesCollector::new(&mut ps);
            let mut styles_parser = CdrParser::new(&mut styles_collector);
            styles_parser.parse(&mut input)
        };
        if ret {
            input.seek(0, Seek::Set);
            let mut content_collector = ContentCollector::new(&mut ps, painter);
            let mut content_parser = CdrParser::new(&mut content_collector);
            ret = content_parser.parse(&mut input);
            content_collector.finalize();
        }
        ret
    }

    /// Convenience for applications that support SVG internally: one
    /// serialized SVG document per page.
    pub fn generate_svg(data: &[u8], output: &mut Vec<String>) -> bool {
        let mut generator = SvgGenerator::new();
        let result = CdrDocument::parse(data, &mut generator);
        if result {
            *output = generator.into_outputs();
        }
        result
    }
}

/// Importer for the related binary metafile format.
pub struct CmxDocument;

impl CmxDocument {
    /// Analyzes the content of the input to see if it can be parsed.
    pub fn is_supported(data: &[u8]) -> bool {
        match resolve_input(data) {
            Some(mut input) => has_riff_signature(&mut input, b"CMX"),
            None => false,
        }
    }

    /// The main parsing routine: makes callbacks into `painter` as the
    /// document is consumed. Returns true when any content was emitted.
    pub fn parse(data: &[u8], painter: &mut dyn PaintSink) -> bool {
        let Some(mut input) = resolve_input(data) else {
            return false;
        };
        if !has_riff_signature(&mut input, b"CMX") {
            return false;
        }
        input.seek(0, Seek::Set);

        let mut ps = ParserState::new();
        let mut ret = {
            let mut styles_collector = StylesCollector::new(&mut ps);
            let mut styles_parser = CmxParser::new(&mut styles_collector);
            styles_parser.parse(&mut input)
        };
        if ps.pages.is_empty() {
            ret = false;
        }
        if ret {
            input.seek(0, Seek::Set);
            let mut content_collector = ContentCollector::new(&mut ps, painter);
            let mut content_parser = CmxParser::new(&mut content_collector);
            ret = content_parser.parse(&mut input);
            content_collector.finalize();
        }
        ret
    }

    /// Convenience for applications that support SVG internally: one
    /// serialized SVG document per page.
    pub fn generate_svg(data: &[u8], output: &mut Vec<String>) -> bool {
        let mut generator = SvgGenerator::new();
        let result = CmxDocument::parse(data, &mut generator);
        if result {
            *output = generator.into_outputs();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_detection() {
        assert!(CdrDocument::is_supported(b"RIFF\x04\x00\x00\x00CDRA"));
        assert!(CdrDocument::is_supported(b"RIFF\x04\x00\x00\x00cdrA"));
        assert!(!CdrDocument::is_supported(b"RIFF\x04\x00\x00\x00CMX1"));
        assert!(CmxDocument::is_supported(b"RIFF\x04\x00\x00\x00CMX1"));
        assert!(!CdrDocument::is_supported(b"JUNK\x04\x00\x00\x00CDRA"));
        assert!(!CdrDocument::is_supported(b"RIFF\x04\x00"));
    }
}
