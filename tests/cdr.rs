//! End-to-end CDR scenarios over synthesized byte streams.

mod common;

use cdrimport::CdrDocument;
use common::{Bytes, RecordingSink};
use pretty_assertions::assert_eq;

fn zlib(data: &[u8]) -> Vec<u8> {
    use flate2::{write::ZlibEncoder, Compression};
    use std::io::Write;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// (model, value) color reference without palette indirection.
fn color(model: u16, value: u32) -> Bytes {
    Bytes::new().u16(model).u32(value).u16(0).u16(0)
}

fn vrsn(version: u16) -> Bytes {
    Bytes::new().chunk(b"vrsn", &Bytes::new().u16(version))
}

fn mcfg(width: f64, height: f64) -> Bytes {
    Bytes::new().chunk(b"mcfg", &Bytes::new().coord32(width).coord32(height))
}

fn fild_solid(id: u32, model: u16, value: u32) -> Bytes {
    Bytes::new().chunk(
        b"fild",
        &Bytes::new().u32(id).u16(1).bytes(&color(model, value).0),
    )
}

fn outl(id: u32) -> Bytes {
    Bytes::new().chunk(
        b"outl",
        &Bytes::new()
            .u32(id)
            .u16(2) // draws, not dashed
            .u16(0)
            .u16(0)
            .coord32(0.01)
            .u16(100)
            .angle32(0.0)
            .bytes(&color(5, 0).0)
            .u16(0)
            .u32(0)
            .u32(0),
    )
}

/// Object record with an argument table; offsets are relative to the chunk
/// start, the type table is stored back to front.
fn loda(chunk_type: u32, args: &[(u32, Bytes)]) -> Bytes {
    let header_len = 20usize;
    let mut arg_data = Vec::new();
    let mut offsets = Vec::new();
    let mut off = header_len;
    for (_, body) in args {
        offsets.push(off as u32);
        arg_data.extend_from_slice(&body.0);
        off += body.0.len();
    }
    let start_of_args = off;
    let start_of_arg_types = start_of_args + 4 * args.len();
    let total = start_of_arg_types + 4 * args.len();

    let mut body = Bytes::new()
        .u32(total as u32)
        .u32(args.len() as u32)
        .u32(start_of_args as u32)
        .u32(start_of_arg_types as u32)
        .u32(chunk_type)
        .bytes(&arg_data);
    for offset in &offsets {
        body = body.u32(*offset);
    }
    for (arg_type, _) in args.iter().rev() {
        body = body.u32(*arg_type);
    }
    Bytes::new().chunk(b"loda", &body)
}

fn rect_coords(w: f64, h: f64, r: f64) -> Bytes {
    Bytes::new().coord32(w).coord32(h).coord32(r)
}

fn rect_object(fill_id: u32, outl_id: u32) -> Bytes {
    let loda = loda(
        0x01,
        &[
            (0x1e, rect_coords(1.0, 1.0, 0.0)),
            (0x14, Bytes::new().u32(fill_id)),
            (0x0a, Bytes::new().u32(outl_id)),
        ],
    );
    Bytes::new().list(b"obj ", &loda)
}

fn page_with(objects: &Bytes) -> Bytes {
    let children = Bytes::new()
        .chunk(b"flgs", &Bytes::new().u32(0))
        .bytes(&objects.0);
    Bytes::new().list(b"page", &children)
}

/// A trailing pad byte keeps the walker ticking past the last list, which
/// is where the final object flush and page close fire.
fn document(children: Bytes) -> Vec<u8> {
    Bytes::riff(b"CDRA", &children.u8(0))
}

fn rect_document() -> Vec<u8> {
    document(
        Bytes::new()
            .bytes(&vrsn(1300).0)
            .bytes(&mcfg(2.0, 2.0).0)
            .bytes(&fild_solid(1, 2, 0x6400_0000).0)
            .bytes(&outl(1).0)
            .bytes(&page_with(&rect_object(1, 1)).0),
    )
}

#[test]
fn test_empty_supported_cdr() {
    let data = b"RIFF\x04\x00\x00\x00CDRA";
    assert!(CdrDocument::is_supported(data));
    let mut sink = RecordingSink::new();
    assert!(CdrDocument::parse(data, &mut sink));
    assert_eq!(sink.events, Vec::<String>::new());
}

#[test]
fn test_solid_rectangle() {
    let data = rect_document();
    assert!(CdrDocument::is_supported(&data));

    let mut sink = RecordingSink::new();
    assert!(CdrDocument::parse(&data, &mut sink));

    assert_eq!(
        sink.events[0],
        "startGraphics(svg:width=2in, svg:height=2in)"
    );
    let style = &sink.events[1];
    assert!(style.contains("draw:fill=solid"));
    assert!(style.contains("draw:fill-color=#000000"));
    assert!(style.contains("svg:fill-rule=evenodd"));
    assert!(style.contains("draw:stroke=solid"));
    assert!(style.contains("svg:stroke-width=0.01in"));
    assert!(style.contains("svg:stroke-color=#000000"));
    assert_eq!(
        sink.events[2],
        "drawPath(M 1in 1in | L 1in 0in | L 2in 0in | L 2in 1in | L 1in 1in | Z)"
    );
    assert_eq!(sink.events[3], "endGraphics");
}

#[test]
fn test_two_stop_linear_gradient() {
    let fild = Bytes::new().chunk(
        b"fild",
        &Bytes::new()
            .u32(1)
            .u16(2)
            .u8(1) // linear
            .u8(0)
            .angle32(0.0)
            .s32(0) // mid point
            .s32(0) // edge offset
            .s32(0)
            .s32(0)
            .u16(2)
            .bytes(&color(5, 0x00ff_0000).0)
            .u16(0)
            .bytes(&color(5, 0x00ff_ffff).0)
            .u16(100),
    );
    let data = document(
        Bytes::new()
            .bytes(&vrsn(1300).0)
            .bytes(&mcfg(2.0, 2.0).0)
            .bytes(&fild.0)
            .bytes(&outl(1).0)
            .bytes(&page_with(&rect_object(1, 1)).0),
    );

    let mut sink = RecordingSink::new();
    assert!(CdrDocument::parse(&data, &mut sink));
    let style = &sink.events[1];
    assert!(style.contains("draw:fill=gradient"));
    assert!(style.contains("draw:style=linear"));
    assert!(style.contains("draw:angle=90"));
    assert!(style.contains("draw:start-color=#ff0000"));
    assert!(style.contains("draw:end-color=#ffffff"));
    assert!(style.contains("draw:border=0%"));
}

#[test]
fn test_group_markers_balanced() {
    let objects = Bytes::new()
        .bytes(&rect_object(1, 1).0)
        .bytes(&rect_object(1, 1).0);
    let group = Bytes::new().list(b"grp ", &objects);
    let data = document(
        Bytes::new()
            .bytes(&vrsn(1300).0)
            .bytes(&mcfg(2.0, 2.0).0)
            .bytes(&fild_solid(1, 2, 0).0)
            .bytes(&outl(1).0)
            .bytes(&page_with(&group).0),
    );

    let mut sink = RecordingSink::new();
    assert!(CdrDocument::parse(&data, &mut sink));

    let names = sink.names();
    let starts = names.iter().filter(|n| *n == "startGroup").count();
    let ends = names.iter().filter(|n| *n == "endGroup").count();
    assert_eq!(starts, 1);
    assert_eq!(ends, 1);
    // reversal puts the group start before its members on output
    let start_pos = names.iter().position(|n| n == "startGroup").unwrap();
    let end_pos = names.iter().position(|n| n == "endGroup").unwrap();
    assert!(start_pos < end_pos);
    assert_eq!(names.iter().filter(|n| *n == "drawPath").count(), 2);
}

#[test]
fn test_vector_pattern_fill() {
    // an embedded drawing collected under spnd 42 ...
    let inner_object = Bytes::new().list(
        b"obj ",
        &Bytes::new()
            .chunk(
                b"bbox",
                &Bytes::new().coord32(0.0).coord32(0.0).coord32(1.0).coord32(1.0),
            )
            .bytes(&loda(0x01, &[(0x1e, rect_coords(1.0, 1.0, 0.0))]).0),
    );
    let vect = Bytes::new().list(
        b"vect",
        &Bytes::new()
            .chunk(b"spnd", &Bytes::new().u32(42))
            .bytes(&inner_object.0),
    );
    // ... referenced by a full-color fill on a page object
    let fild = Bytes::new().chunk(
        b"fild",
        &Bytes::new()
            .u32(2)
            .u16(10)
            .u32(42)
            .coord32(1.0)
            .coord32(1.0)
            .u8(1)
            .coord32(0.0)
            .coord32(0.0)
            .coord32(0.0)
            .u8(0),
    );
    let data = document(
        Bytes::new()
            .bytes(&vrsn(1300).0)
            .bytes(&mcfg(2.0, 2.0).0)
            .bytes(&vect.0)
            .bytes(&fild.0)
            .bytes(&outl(1).0)
            .bytes(&page_with(&rect_object(2, 1)).0),
    );

    let mut sink = RecordingSink::new();
    assert!(CdrDocument::parse(&data, &mut sink));

    // the nested drawing produced no painter events of its own
    assert_eq!(
        sink.names().iter().filter(|n| *n == "startGraphics").count(),
        1
    );
    let style = &sink.events[1];
    assert!(style.contains("draw:fill=bitmap"));
    assert!(style.contains("libwpg:mime-type=image/svg+xml"));
    assert!(style.contains("draw:fill-image="));
    assert!(style.contains("svg:width=100%"));
}

#[test]
fn test_artistic_text() {
    let fntt = Bytes::new().chunk(
        b"fntt",
        &Bytes::new().u16(1).u16(0).bytes(b"Arial\0"),
    );
    let stlt = Bytes::new().chunk(
        b"stlt",
        &Bytes::new()
            .u32(1) // one record
            .u32(5)
            .u32(0)
            .u16(1)
            .f64(0.25)
            .u32(1) // left
            .u32(0)
            .u32(0),
    );
    let txsm = Bytes::new().chunk(
        b"txsm",
        &Bytes::new()
            .u32(9)
            .u32(5)
            .u16(0)
            .u16(2)
            .bytes(&[0, 0])
            .bytes(b"Hi"),
    );
    let text_object = Bytes::new().list(
        b"obj ",
        &Bytes::new()
            .chunk(b"spnd", &Bytes::new().u32(9))
            .chunk(
                b"bbox",
                &Bytes::new().coord32(0.0).coord32(0.0).coord32(1.0).coord32(0.5),
            )
            .bytes(&loda(0x04, &[(0x1e, Bytes::new().coord32(0.0).coord32(0.0))]).0),
    );
    let data = document(
        Bytes::new()
            .bytes(&vrsn(1300).0)
            .bytes(&mcfg(2.0, 2.0).0)
            .bytes(&fntt.0)
            .bytes(&stlt.0)
            .bytes(&txsm.0)
            .bytes(&page_with(&text_object).0),
    );

    let mut sink = RecordingSink::new();
    assert!(CdrDocument::parse(&data, &mut sink));

    let names = sink.names();
    let expected_tail = [
        "startTextObject",
        "startTextLine",
        "startTextSpan",
        "insertText",
        "endTextSpan",
        "endTextLine",
        "endTextObject",
    ];
    let start = names
        .iter()
        .position(|n| n == "startTextObject")
        .expect("text object emitted");
    assert_eq!(&names[start..start + expected_tail.len()], &expected_tail);
    assert!(sink.events[start + 1].contains("fo:text-align=left"));
    assert!(sink.events[start + 2].contains("fo:font-size=18pt"));
    assert!(sink.events[start + 2].contains("style:font-name=Arial"));
    assert_eq!(sink.events[start + 3], "insertText(Hi)");
}

#[test]
fn test_spline_lowering() {
    let ppdt = Bytes::new().chunk(
        b"ppdt",
        &Bytes::new()
            .u16(3)
            .coord32(0.0)
            .coord32(0.0)
            .coord32(1.0)
            .coord32(1.0)
            .coord32(2.0)
            .coord32(0.0)
            .u32(1)
            .u32(0)
            .u32(0),
    );
    let spline_object = Bytes::new().list(b"obj ", &ppdt);
    let data = document(
        Bytes::new()
            .bytes(&vrsn(1300).0)
            .bytes(&mcfg(2.0, 2.0).0)
            .bytes(&page_with(&spline_object).0),
    );

    let mut sink = RecordingSink::new();
    assert!(CdrDocument::parse(&data, &mut sink));
    assert_eq!(sink.events[2], "drawPath(M 1in 1in | Q 2in 0in 3in 1in)");
}

#[test]
fn test_bitmap_object() {
    let bmp = Bytes::new().chunk(
        b"bmp ",
        &Bytes::new()
            .u32(7)
            .u32(5) // single channel
            .u32(2)
            .u32(2)
            .u32(8)
            .u32(0)
            .bytes(&[0x00, 0x40, 0x80, 0xff]),
    );
    let bitmap_object = Bytes::new().list(
        b"obj ",
        &loda(
            0x05,
            &[(
                0x1e,
                Bytes::new()
                    .u32(7)
                    .coord32(0.0)
                    .coord32(0.0)
                    .coord32(1.0)
                    .coord32(1.0),
            )],
        ),
    );
    let data = document(
        Bytes::new()
            .bytes(&vrsn(1300).0)
            .bytes(&mcfg(2.0, 2.0).0)
            .bytes(&bmp.0)
            .bytes(&page_with(&bitmap_object).0),
    );

    let mut sink = RecordingSink::new();
    assert!(CdrDocument::parse(&data, &mut sink));
    let object = sink
        .events
        .iter()
        .find(|e| e.starts_with("drawGraphicObject"))
        .expect("graphic object emitted");
    assert!(object.contains("libwpg:mime-type=image/bmp"));
    // 54-byte header plus 2×2 pixels at 4 bytes
    assert!(object.contains("70 bytes"));
    assert!(object.contains("svg:width=1in"));
    assert!(object.contains("svg:height=1in"));
}

#[test]
fn test_pattern_fill() {
    let bmpf = Bytes::new().chunk(
        b"bmpf",
        &Bytes::new().u32(3).u32(8).u32(1).bytes(&[0xaa]),
    );
    let fild = Bytes::new().chunk(
        b"fild",
        &Bytes::new()
            .u32(1)
            .u16(7)
            .u32(3)
            .coord32(1.0)
            .coord32(1.0)
            .u8(1)
            .coord32(0.0)
            .coord32(0.0)
            .coord32(0.0)
            .u8(0)
            .bytes(&color(5, 0).0)
            .bytes(&color(5, 0x00ff_ffff).0),
    );
    let data = document(
        Bytes::new()
            .bytes(&vrsn(1300).0)
            .bytes(&mcfg(2.0, 2.0).0)
            .bytes(&bmpf.0)
            .bytes(&fild.0)
            .bytes(&outl(1).0)
            .bytes(&page_with(&rect_object(1, 1)).0),
    );

    let mut sink = RecordingSink::new();
    assert!(CdrDocument::parse(&data, &mut sink));
    let style = &sink.events[1];
    assert!(style.contains("draw:fill=bitmap"));
    assert!(style.contains("libwpg:mime-type=image/bmp"));
    assert!(style.contains("draw:fill-image="));
    assert!(style.contains("style:repeat=repeat"));
}

#[test]
fn test_missing_pattern_degrades_to_background() {
    let fild = Bytes::new().chunk(
        b"fild",
        &Bytes::new()
            .u32(1)
            .u16(7)
            .u32(99) // never materialized
            .coord32(1.0)
            .coord32(1.0)
            .u8(1)
            .coord32(0.0)
            .coord32(0.0)
            .coord32(0.0)
            .u8(0)
            .bytes(&color(5, 0).0)
            .bytes(&color(5, 0x00ff_0000).0),
    );
    let data = document(
        Bytes::new()
            .bytes(&vrsn(1300).0)
            .bytes(&mcfg(2.0, 2.0).0)
            .bytes(&fild.0)
            .bytes(&outl(1).0)
            .bytes(&page_with(&rect_object(1, 1)).0),
    );

    let mut sink = RecordingSink::new();
    assert!(CdrDocument::parse(&data, &mut sink));
    let style = &sink.events[1];
    assert!(style.contains("draw:fill=solid"));
    assert!(style.contains("draw:fill-color=#ff0000"));
}

#[test]
fn test_compressed_list() {
    // one "flgs" record whose stored length field indexes the side table
    let inner = Bytes::new().tag(b"flgs").u32(0).u32(0);
    let chunk_data = zlib(&inner.0);
    let table = zlib(&4u32.to_le_bytes());

    let cmpr_body = Bytes::new()
        .u32(chunk_data.len() as u32)
        .u32(inner.0.len() as u32)
        .u32(1)
        .u32(0)
        .tag(b"CPng")
        .u16(1)
        .u16(4)
        .bytes(&chunk_data)
        .bytes(&table);
    let cmpr = Bytes::new().list(b"cmpr", &cmpr_body);

    let data = document(
        Bytes::new()
            .bytes(&vrsn(1300).0)
            .bytes(&mcfg(2.0, 2.0).0)
            .bytes(&cmpr.0)
            .bytes(&fild_solid(1, 2, 0x6400_0000).0)
            .bytes(&outl(1).0)
            .bytes(&page_with(&rect_object(1, 1)).0),
    );

    let mut sink = RecordingSink::new();
    assert!(CdrDocument::parse(&data, &mut sink));
    assert!(sink.events.iter().any(|e| e.starts_with("drawPath")));
}

#[test]
fn test_ole_wrapped_document() {
    use std::io::{Cursor, Write};

    let payload = rect_document();
    let mut compound = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
    {
        let mut stream = compound.create_stream("PerfectOffice_MAIN").unwrap();
        stream.write_all(&payload).unwrap();
    }
    let data = compound.into_inner().into_inner();

    assert!(CdrDocument::is_supported(&data));
    let mut sink = RecordingSink::new();
    assert!(CdrDocument::parse(&data, &mut sink));
    assert!(sink.events.iter().any(|e| e.starts_with("drawPath")));
}

#[test]
fn test_generate_svg() {
    let mut pages = Vec::new();
    assert!(CdrDocument::generate_svg(&rect_document(), &mut pages));
    assert_eq!(pages.len(), 1);
    assert!(pages[0].starts_with("<svg "));
    assert!(pages[0].contains("<path "));
}

#[test]
fn test_truncated_record_recovers_at_chunk_boundary() {
    // a fild that promises a solid fill but ends mid-color, followed by a
    // healthy page; the bad chunk is skipped and the page still renders
    let broken_fild = Bytes::new().chunk(b"fild", &Bytes::new().u32(1).u16(1).u16(2));
    let data = document(
        Bytes::new()
            .bytes(&vrsn(1300).0)
            .bytes(&mcfg(2.0, 2.0).0)
            .bytes(&broken_fild.0)
            .bytes(&outl(1).0)
            .bytes(&page_with(&rect_object(1, 1)).0),
    );

    let mut sink = RecordingSink::new();
    assert!(CdrDocument::parse(&data, &mut sink));
    // the fill id resolves to nothing, so the object degrades to no fill
    assert!(sink.events[1].contains("draw:fill=none"));
    assert!(sink.events.iter().any(|e| e.starts_with("drawPath")));
}
