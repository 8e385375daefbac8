//! FourCC and instruction constants of the two container formats.

use crate::stream::fourcc;

// RIFF structure

pub const FOURCC_RIFF: u32 = fourcc(b"RIFF");
pub const FOURCC_RIFX: u32 = fourcc(b"RIFX");
pub const FOURCC_LIST: u32 = fourcc(b"LIST");
pub const FOURCC_CMPR: u32 = fourcc(b"cmpr");
pub const FOURCC_CPNG: u32 = fourcc(b"CPng");

// Document list types

pub const FOURCC_PAGE: u32 = fourcc(b"page");
pub const FOURCC_OBJ: u32 = fourcc(b"obj ");
pub const FOURCC_GRP: u32 = fourcc(b"grp ");
pub const FOURCC_VECT: u32 = fourcc(b"vect");

// Leaf records

pub const FOURCC_VRSN: u32 = fourcc(b"vrsn");
pub const FOURCC_DISP: u32 = fourcc(b"DISP");
pub const FOURCC_MCFG: u32 = fourcc(b"mcfg");
pub const FOURCC_ICCD: u32 = fourcc(b"iccd");
pub const FOURCC_LODA: u32 = fourcc(b"loda");
pub const FOURCC_TRFD: u32 = fourcc(b"trfd");
pub const FOURCC_FTIL: u32 = fourcc(b"ftil");
pub const FOURCC_FILD: u32 = fourcc(b"fild");
pub const FOURCC_FILC: u32 = fourcc(b"filc");
pub const FOURCC_OUTL: u32 = fourcc(b"outl");
pub const FOURCC_BMP: u32 = fourcc(b"bmp ");
pub const FOURCC_BMPF: u32 = fourcc(b"bmpf");
pub const FOURCC_BMPT: u32 = fourcc(b"bmpt");
pub const FOURCC_VPAT: u32 = fourcc(b"vpat");
pub const FOURCC_PPDT: u32 = fourcc(b"ppdt");
pub const FOURCC_FNTT: u32 = fourcc(b"fntt");
pub const FOURCC_FONT: u32 = fourcc(b"font");
pub const FOURCC_STLT: u32 = fourcc(b"stlt");
pub const FOURCC_STYD: u32 = fourcc(b"styd");
pub const FOURCC_TXSM: u32 = fourcc(b"txsm");
pub const FOURCC_TXTJ: u32 = fourcc(b"txtj");
pub const FOURCC_BBOX: u32 = fourcc(b"bbox");
pub const FOURCC_SPND: u32 = fourcc(b"spnd");
pub const FOURCC_FLGS: u32 = fourcc(b"flgs");
pub const FOURCC_RCLR: u32 = fourcc(b"rclr");

// CMX records

pub const FOURCC_CONT: u32 = fourcc(b"cont");
pub const FOURCC_CCMM: u32 = fourcc(b"ccmm");

// Object record (`loda`) geometry discriminants

pub const LODA_TYPE_SPND: u32 = 0x00;
pub const LODA_TYPE_RECTANGLE: u32 = 0x01;
pub const LODA_TYPE_ELLIPSE: u32 = 0x02;
pub const LODA_TYPE_LINE_AND_CURVE: u32 = 0x03;
pub const LODA_TYPE_ARTISTIC_TEXT: u32 = 0x04;
pub const LODA_TYPE_BITMAP: u32 = 0x05;
pub const LODA_TYPE_PARAGRAPH_TEXT: u32 = 0x06;
pub const LODA_TYPE_POLYGON: u32 = 0x14;
pub const LODA_TYPE_PATH: u32 = 0x25;

// Object record argument types

pub const LODA_ARG_COORDS: u32 = 0x001e;
pub const LODA_ARG_FILL_ID: u32 = 0x0014;
pub const LODA_ARG_OUTL_ID: u32 = 0x000a;
pub const LODA_ARG_ROTATE: u32 = 0x2efe;
pub const LODA_ARG_OPACITY: u32 = 0x01f4;

// Style record (`styd`) argument types

pub const STYD_NAME: u32 = 0xc8;
pub const STYD_FILL_ID: u32 = 0xcd;
pub const STYD_OUTL_ID: u32 = 0xd2;
pub const STYD_FONTS: u32 = 0xdc;
pub const STYD_ALIGN: u32 = 0xe1;
pub const STYD_BULLETS: u32 = 0xe6;
pub const STYD_INTERVALS: u32 = 0xeb;
pub const STYD_TABS: u32 = 0xf0;
pub const STYD_IDENTS: u32 = 0xf5;
pub const STYD_HYPHENS: u32 = 0xfa;
pub const STYD_SET5S: u32 = 0xff;
pub const STYD_DROPCAPS: u32 = 0x104;

// CMX page instruction opcodes

pub const CMX_COMMAND_BEGIN_PAGE: i16 = 9;
pub const CMX_COMMAND_END_PAGE: i16 = 10;
pub const CMX_COMMAND_BEGIN_LAYER: i16 = 11;
pub const CMX_COMMAND_END_LAYER: i16 = 12;
pub const CMX_COMMAND_BEGIN_GROUP: i16 = 13;
pub const CMX_COMMAND_END_GROUP: i16 = 14;
pub const CMX_COMMAND_DRAW_CHARS: i16 = 65;
pub const CMX_COMMAND_ELLIPSE: i16 = 66;
pub const CMX_COMMAND_POLY_CURVE: i16 = 67;
pub const CMX_COMMAND_RECTANGLE: i16 = 68;
pub const CMX_COMMAND_DRAW_IMAGE: i16 = 69;
pub const CMX_COMMAND_JUMP_ABSOLUTE: i16 = 111;

// CMX tag stream

pub const CMX_TAG_END: u8 = 255;

pub const CMX_TAG_BEGIN_PAGE_PAGE_SPECIFICATION: u8 = 1;
pub const CMX_TAG_BEGIN_PAGE_MATRIX: u8 = 2;

pub const CMX_TAG_POLY_CURVE_RENDERING_ATTR: u8 = 1;
pub const CMX_TAG_POLY_CURVE_POINT_LIST: u8 = 2;

pub const CMX_TAG_ELLIPSE_RENDERING_ATTR: u8 = 1;
pub const CMX_TAG_ELLIPSE_SPECIFICATION: u8 = 2;

pub const CMX_TAG_RECTANGLE_RENDERING_ATTR: u8 = 1;
pub const CMX_TAG_RECTANGLE_SPECIFICATION: u8 = 2;

pub const CMX_TAG_JUMP_ABSOLUTE_OFFSET: u8 = 1;

pub const CMX_TAG_RENDER_ATTR_OUTLINE_SPEC: u8 = 1;
