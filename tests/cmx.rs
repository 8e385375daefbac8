//! End-to-end CMX scenarios over synthesized byte streams.

mod common;

use cdrimport::CmxDocument;
use common::{Bytes, RecordingSink};
use pretty_assertions::assert_eq;

/// 32-byte file id + 16-byte platform + byte order + coordinate size +
/// version + unit/scale + section offsets + bounding box.
fn cmx_header(coord_size: &[u8; 2], bbox: [f64; 4]) -> Bytes {
    let mut file_id = *b"{Corel Binary Meta File}\0\0\0\0\0\0\0\0";
    file_id[31] = 0;
    let mut header = Bytes::new()
        .bytes(&file_id)
        .bytes(b"Windows 3.1\0\0\0\0\0")
        .bytes(b"2   ")
        .bytes(coord_size)
        .bytes(b"0001")
        .bytes(b"0000")
        .u16(35) // base unit
        .f64(1.0)
        .bytes(&[0u8; 12])
        .u32(0)
        .u32(0)
        .u32(0);
    for v in bbox {
        header = if coord_size == b"4 " {
            header.coord32(v)
        } else {
            header.coord16(v)
        };
    }
    header
}

/// One 32-bit-precision instruction: size, opcode, tag stream.
fn instruction32(code: i16, tags: &[(u8, Bytes)]) -> Bytes {
    let mut body = Bytes::new();
    for (tag_id, tag_body) in tags {
        body = body
            .u8(*tag_id)
            .u16(3 + tag_body.0.len() as u16)
            .bytes(&tag_body.0);
    }
    body = body.u8(255);
    Bytes::new()
        .s16(4 + body.0.len() as i16)
        .s16(code)
        .bytes(&body.0)
}

/// One 16-bit-precision instruction: size, opcode, flat body.
fn instruction16(code: i16, body: &Bytes) -> Bytes {
    Bytes::new()
        .s16(4 + body.0.len() as i16)
        .s16(code)
        .bytes(&body.0)
}

fn begin_page32(flags: u32, bbox: [f64; 4]) -> Bytes {
    let mut spec = Bytes::new().u16(0).u32(flags);
    for v in bbox {
        spec = spec.coord32(v);
    }
    instruction32(9, &[(1, spec)])
}

fn rectangle32(cx: f64, cy: f64, w: f64, h: f64, r: f64, angle: f64) -> Bytes {
    let spec = Bytes::new()
        .coord32(cx)
        .coord32(cy)
        .coord32(w)
        .coord32(h)
        .coord32(r)
        .angle32(angle);
    instruction32(68, &[(2, spec)])
}

fn cmx_document(coord_size: &[u8; 2], bbox: [f64; 4], instructions: &Bytes) -> Vec<u8> {
    let children = Bytes::new()
        .chunk(b"cont", &cmx_header(coord_size, bbox))
        .chunk(b"page", instructions);
    Bytes::riff(b"CMX1", &children)
}

#[test]
fn test_single_rectangle_32bit() {
    let instructions = Bytes::new()
        .bytes(&begin_page32(0, [0.0, -1.0, 2.0, 1.0]).0)
        .bytes(&rectangle32(1.0, 1.0, 2.0, 2.0, 0.0, 0.0).0);
    let data = cmx_document(b"4 ", [0.0, -1.0, 2.0, 1.0], &instructions);

    assert!(CmxDocument::is_supported(&data));
    let mut sink = RecordingSink::new();
    assert!(CmxDocument::parse(&data, &mut sink));

    assert_eq!(
        sink.events[0],
        "startGraphics(svg:width=2in, svg:height=2in)"
    );
    assert!(sink.events[1].starts_with("setStyle("));
    assert!(sink.events[1].contains("draw:fill=none"));
    assert_eq!(
        sink.events[2],
        "drawPath(M 0in 1in | L 0in -1in | L 2in -1in | L 2in 1in | L 0in 1in | Z)"
    );
    assert_eq!(sink.events[3], "endGraphics");
    assert_eq!(sink.events.len(), 4);
}

#[test]
fn test_single_rectangle_16bit_matches_32bit() {
    // same drawing in 16-bit precision: 16-bit layouts are flat, with the
    // rectangle specification behind a 3-byte prefix
    let begin_page = {
        let mut body = Bytes::new().u16(0).u32(0);
        for v in [0.0, -1.0, 2.0, 1.0] {
            body = body.coord16(v);
        }
        instruction16(9, &body)
    };
    let rectangle = {
        let body = Bytes::new()
            .bytes(&[0, 0, 0])
            .coord16(1.0)
            .coord16(1.0)
            .coord16(2.0)
            .coord16(2.0)
            .coord16(0.0)
            .angle16(0.0);
        instruction16(68, &body)
    };
    let instructions = Bytes::new().bytes(&begin_page.0).bytes(&rectangle.0);
    let data = cmx_document(b"2 ", [0.0, -1.0, 2.0, 1.0], &instructions);

    let mut sink = RecordingSink::new();
    assert!(CmxDocument::parse(&data, &mut sink));
    assert_eq!(
        sink.events[2],
        "drawPath(M 0in 1in | L 0in -1in | L 2in -1in | L 2in 1in | L 0in 1in | Z)"
    );
}

#[test]
fn test_full_circle_is_two_arcs() {
    let ellipse = {
        let spec = Bytes::new()
            .coord32(0.0)
            .coord32(0.0)
            .coord32(2.0) // stored diameters
            .coord32(2.0)
            .angle32(0.0)
            .angle32(0.0)
            .angle32(0.0)
            .u8(0);
        instruction32(66, &[(2, spec)])
    };
    let instructions = Bytes::new()
        .bytes(&begin_page32(0, [0.0, -2.0, 2.0, 0.0]).0)
        .bytes(&ellipse.0);
    let data = cmx_document(b"4 ", [0.0, -2.0, 2.0, 0.0], &instructions);

    let mut sink = RecordingSink::new();
    assert!(CmxDocument::parse(&data, &mut sink));

    // the page flip inverts the collected sweep, radii survive unchanged
    assert_eq!(
        sink.events[2],
        "drawPath(M 1in 0in | A 1in 1in 0 false false 0in 1in | A 1in 1in 0 true false 1in 0in | Z)"
    );
}

#[test]
fn test_ellipse_pie_slice_closes_through_center() {
    let ellipse = {
        let spec = Bytes::new()
            .coord32(0.0)
            .coord32(0.0)
            .coord32(2.0)
            .coord32(2.0)
            .angle32(0.0)
            .angle32(90.0)
            .angle32(0.0)
            .u8(1); // pie
        instruction32(66, &[(2, spec)])
    };
    let instructions = Bytes::new()
        .bytes(&begin_page32(0, [0.0, -2.0, 2.0, 0.0]).0)
        .bytes(&ellipse.0);
    let data = cmx_document(b"4 ", [0.0, -2.0, 2.0, 0.0], &instructions);

    let mut sink = RecordingSink::new();
    assert!(CmxDocument::parse(&data, &mut sink));
    let path = &sink.events[2];
    // arc, two legs through the center, closed
    assert!(path.contains("A 1in 1in"));
    assert!(path.contains("L 0in 0in"));
    assert!(path.ends_with("Z)"));
}

#[test]
fn test_rounded_rectangle_has_corner_quadratics() {
    let instructions = Bytes::new()
        .bytes(&begin_page32(0, [0.0, -1.0, 2.0, 1.0]).0)
        .bytes(&rectangle32(1.0, 1.0, 2.0, 2.0, 0.25, 0.0).0);
    let data = cmx_document(b"4 ", [0.0, -1.0, 2.0, 1.0], &instructions);

    let mut sink = RecordingSink::new();
    assert!(CmxDocument::parse(&data, &mut sink));
    let path = &sink.events[2];
    assert_eq!(path.matches("Q ").count(), 4);
}

#[test]
fn test_ignored_page_emits_nothing() {
    let instructions = Bytes::new()
        .bytes(&begin_page32(0x0081_0000, [0.0, -1.0, 2.0, 1.0]).0)
        .bytes(&rectangle32(1.0, 1.0, 2.0, 2.0, 0.0, 0.0).0);
    let data = cmx_document(b"4 ", [0.0, -1.0, 2.0, 1.0], &instructions);

    let mut sink = RecordingSink::new();
    CmxDocument::parse(&data, &mut sink);
    assert_eq!(sink.events, Vec::<String>::new());
}

#[test]
fn test_parse_is_deterministic() {
    let instructions = Bytes::new()
        .bytes(&begin_page32(0, [0.0, -1.0, 2.0, 1.0]).0)
        .bytes(&rectangle32(1.0, 1.0, 2.0, 2.0, 0.0, 30.0).0);
    let data = cmx_document(b"4 ", [0.0, -1.0, 2.0, 1.0], &instructions);

    let mut first = RecordingSink::new();
    assert!(CmxDocument::parse(&data, &mut first));
    let mut second = RecordingSink::new();
    assert!(CmxDocument::parse(&data, &mut second));
    assert_eq!(first.events, second.events);
}

#[test]
fn test_truncated_instruction_keeps_earlier_content() {
    let instructions = Bytes::new()
        .bytes(&begin_page32(0, [0.0, -1.0, 2.0, 1.0]).0)
        .bytes(&rectangle32(1.0, 1.0, 2.0, 2.0, 0.0, 0.0).0)
        // an instruction that promises more bytes than the chunk holds
        .s16(64)
        .s16(68)
        .u8(2);
    let data = cmx_document(b"4 ", [0.0, -1.0, 2.0, 1.0], &instructions);

    let mut sink = RecordingSink::new();
    assert!(CmxDocument::parse(&data, &mut sink));
    assert!(sink.events.iter().any(|e| e.starts_with("drawPath")));
    assert_eq!(sink.events.last().unwrap(), "endGraphics");
}
