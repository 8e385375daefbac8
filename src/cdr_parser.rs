//! CDR parser: RIFF tree walker plus the fourCC record decoders.
//!
//! Chunks are byte-aligned, with tolerated zero-byte padding before every
//! chunk header. A `cmpr` list carries a DEFLATE-compressed body plus a
//! side table of rewritten chunk lengths which is threaded into the nested
//! descent: inside such a list, the stored 32-bit length field of a chunk
//! is an index into that table.

use std::collections::BTreeMap;

use crate::collector::Collector;
use crate::common::{self, Precision};
use crate::constants::*;
use crate::errors::{Error, Result};
use crate::stream::{fourcc_str, InternalStream, Seek};
use crate::transform::{Transform, Transforms};
use crate::types::{
    CharacterStyle, Color, FillStyle, Font, Gradient, GradientStop, ImageFill, LineStyle,
};

pub struct CdrParser<'c> {
    collector: &'c mut dyn Collector,
    version: u16,
    precision: Precision,
    fill_styles: BTreeMap<u32, FillStyle>,
    line_styles: BTreeMap<u32, LineStyle>,
    fonts: BTreeMap<u16, Font>,
    palette: BTreeMap<u32, Color>,
}

impl<'c> CdrParser<'c> {
    pub fn new(collector: &'c mut dyn Collector) -> Self {
        CdrParser {
            collector,
            version: 0,
            precision: Precision::Bits32,
            fill_styles: BTreeMap::new(),
            line_styles: BTreeMap::new(),
            fonts: BTreeMap::new(),
            palette: BTreeMap::new(),
        }
    }

    pub fn parse(&mut self, input: &mut InternalStream) -> bool {
        self.parse_records(input, None, None, 0)
    }

    fn parse_records(
        &mut self,
        input: &mut InternalStream,
        size: Option<usize>,
        block_lengths: Option<&[u32]>,
        level: u32,
    ) -> bool {
        self.collector.collect_level(level);
        let end_position = size.map(|s| input.tell() + s);
        while !input.at_end() && end_position.map(|end| input.tell() < end).unwrap_or(true) {
            if !self.parse_record(input, block_lengths, level) {
                return false;
            }
        }
        true
    }

    fn parse_record(
        &mut self,
        input: &mut InternalStream,
        block_lengths: Option<&[u32]>,
        level: u32,
    ) -> bool {
        self.collector.collect_level(level);
        loop {
            match input.read_u8() {
                Ok(0) => continue,
                Ok(_) => {
                    input.seek(-1, Seek::Cur);
                    break;
                }
                Err(_) => return true,
            }
        }
        let header = (|| -> Result<(u32, usize)> {
            let four_cc = input.read_fourcc()?;
            let mut length = input.read_u32(false)? as usize;
            if let Some(table) = block_lengths {
                length = *table.get(length).ok_or(Error::EndOfStream)? as usize;
            }
            Ok((four_cc, length))
        })();
        let Ok((four_cc, length)) = header else {
            return false;
        };
        let position = input.tell();
        log::debug!("record: {} length 0x{:08x}", fourcc_str(four_cc), length);

        if four_cc == FOURCC_RIFF || four_cc == FOURCC_RIFX || four_cc == FOURCC_LIST {
            let Ok(list_type) = input.read_fourcc() else {
                return false;
            };
            log::debug!("list type: {}", fourcc_str(list_type));
            if list_type == FOURCC_CMPR {
                if !self.parse_compressed_list(input, length, position) {
                    return false;
                }
            } else {
                match list_type {
                    FOURCC_PAGE => self.collector.collect_page(level),
                    FOURCC_OBJ => self.collector.collect_object(level),
                    FOURCC_GRP => self.collector.collect_group(level),
                    FOURCC_VECT => self.collector.collect_vect(level),
                    _ => self.collector.collect_other_list(),
                }
                if !self.parse_records(
                    input,
                    Some(length.saturating_sub(4)),
                    block_lengths,
                    level + 1,
                ) {
                    return false;
                }
            }
        } else if self.read_record(four_cc, length, input).is_err() {
            log::warn!("skipping undecodable {} record", fourcc_str(four_cc));
        }

        input.seek((position + length) as i64, Seek::Set);
        true
    }

    /// A `cmpr` list: sizes + `CPng` marker + version tuple, then two
    /// DEFLATE streams, the chunk data and the block-length rewrite table.
    fn parse_compressed_list(
        &mut self,
        input: &mut InternalStream,
        length: usize,
        position: usize,
    ) -> bool {
        let header = (|| -> Result<(u32, u32, u32)> {
            let cmpr_size = input.read_u32(false)?;
            let uncmpr_size = input.read_u32(false)?;
            let blocks = input.read_u32(false)?;
            input.seek(4, Seek::Cur);
            if input.read_fourcc()? != FOURCC_CPNG {
                return Err(Error::Signature);
            }
            if input.read_u16(false)? != 1 || input.read_u16(false)? != 4 {
                return Err(Error::Signature);
            }
            Ok((cmpr_size, uncmpr_size, blocks))
        })();
        let Ok((cmpr_size, uncmpr_size, _blocks)) = header else {
            return false;
        };
        log::debug!(
            "compressed list: {} bytes, {} uncompressed",
            cmpr_size,
            uncmpr_size
        );

        let mut chunk_stream = InternalStream::substream(input, cmpr_size as usize, true);
        let blocks_length = (length + position).saturating_sub(input.tell());
        let mut blocks_stream = InternalStream::substream(input, blocks_length, true);
        let mut block_lengths = Vec::new();
        while !blocks_stream.at_end() {
            match blocks_stream.read_u32(false) {
                Ok(len) => block_lengths.push(len),
                Err(_) => break,
            }
        }
        let table = if block_lengths.is_empty() { None } else { Some(block_lengths.as_slice()) };
        self.parse_records(&mut chunk_stream, None, table, 0)
    }

    fn read_record(
        &mut self,
        four_cc: u32,
        length: usize,
        input: &mut InternalStream,
    ) -> Result<()> {
        match four_cc {
            FOURCC_VRSN => {
                self.version = input.read_u16(false)?;
                log::debug!("document version {}", self.version);
            }
            FOURCC_DISP => self.read_disp(input, length)?,
            FOURCC_MCFG => self.read_mcfg(input)?,
            FOURCC_ICCD => {
                let profile = input.read(length)?.to_vec();
                self.collector.collect_color_profile(&profile);
            }
            FOURCC_LODA => self.read_loda(input)?,
            FOURCC_TRFD => {
                let trafos = self.read_transforms(input)?;
                self.collector.collect_transform(&trafos, true);
            }
            FOURCC_FTIL => {
                let trafos = self.read_transforms(input)?;
                self.collector.collect_fill_transform(&trafos);
            }
            FOURCC_FILD | FOURCC_FILC => self.read_fild(input)?,
            FOURCC_OUTL => self.read_outl(input)?,
            FOURCC_BMP => self.read_bmp(input, length)?,
            FOURCC_BMPF => self.read_bmpf(input, length)?,
            FOURCC_BMPT => {
                let image_id = input.read_u32(false)?;
                let data = input.read(length.saturating_sub(4))?.to_vec();
                self.collector.collect_bmp_raw(image_id, &data);
            }
            FOURCC_VPAT => {
                let pattern_id = input.read_u32(false)?;
                let data = input.read(length.saturating_sub(4))?.to_vec();
                self.collector.collect_vector_pattern(pattern_id, &data);
            }
            FOURCC_PPDT => self.read_ppdt(input)?,
            FOURCC_FNTT | FOURCC_FONT => self.read_fntt(input, length)?,
            FOURCC_STLT => self.read_stlt(input)?,
            FOURCC_STYD => self.read_styd(input)?,
            FOURCC_TXSM | FOURCC_TXTJ => self.read_txsm(input)?,
            FOURCC_BBOX => {
                let x0 = self.read_coordinate(input)?;
                let y0 = self.read_coordinate(input)?;
                let x1 = self.read_coordinate(input)?;
                let y1 = self.read_coordinate(input)?;
                self.collector.collect_bbox(x0, y0, x1, y1);
            }
            FOURCC_SPND => {
                let spnd = input.read_u32(false)?;
                self.collector.collect_spnd(spnd);
            }
            FOURCC_FLGS => {
                let flags = input.read_u32(false)?;
                self.collector.collect_flags(flags, self.version >= 400);
            }
            FOURCC_RCLR => self.read_rclr(input)?,
            _ => {}
        }
        Ok(())
    }

    fn read_coordinate(&self, input: &mut InternalStream) -> Result<f64> {
        common::read_coordinate(input, false, self.precision)
    }

    fn read_angle(&self, input: &mut InternalStream) -> Result<f64> {
        common::read_angle(input, false, self.precision)
    }

    /// 8-bit preview bitmap; reassembled into a BMP blob for debugging.
    fn read_disp(&mut self, input: &mut InternalStream, length: usize) -> Result<()> {
        let mut preview_image = Vec::with_capacity(length + 14);
        preview_image.extend_from_slice(&[0x42, 0x4d]);
        preview_image.extend_from_slice(&((length as u32 + 8).to_le_bytes()));
        preview_image.extend_from_slice(&[0, 0, 0, 0]);
        let start_position = input.tell();
        input.seek(0x18, Seek::Cur);
        let length_x = length as i64 + 10 - input.read_u32(false)? as i64;
        input.seek(start_position as i64, Seek::Set);
        preview_image.extend_from_slice(&(length_x as u32).to_le_bytes());
        input.seek(4, Seek::Cur);
        preview_image.extend_from_slice(input.read(length.saturating_sub(4))?);
        log::debug!("decoded {} byte preview bitmap", preview_image.len());
        Ok(())
    }

    /// Document configuration: the default page size.
    fn read_mcfg(&mut self, input: &mut InternalStream) -> Result<()> {
        let width = self.read_coordinate(input)?;
        let height = self.read_coordinate(input)?;
        self.collector
            .collect_page_size(width, height, -width / 2.0, -height / 2.0);
        Ok(())
    }

    /// Object record: an argument table whose offsets and (reversed) types
    /// index the geometry, style references and modifiers of one object.
    fn read_loda(&mut self, input: &mut InternalStream) -> Result<()> {
        let start = input.tell();
        let _chunk_length = input.read_u32(false)?;
        let num_args = input.read_u32(false)? as usize;
        let start_of_args = input.read_u32(false)? as usize;
        let start_of_arg_types = input.read_u32(false)? as usize;
        let chunk_type = input.read_u32(false)?;
        if num_args > 0xffff {
            return Err(Error::EndOfStream);
        }

        input.seek((start + start_of_args) as i64, Seek::Set);
        let mut arg_offsets = Vec::with_capacity(num_args);
        for _ in 0..num_args {
            arg_offsets.push(input.read_u32(false)? as usize);
        }
        // the producer stores the type table back to front
        input.seek((start + start_of_arg_types) as i64, Seek::Set);
        let mut arg_types = vec![0u32; num_args];
        for i in (0..num_args).rev() {
            arg_types[i] = input.read_u32(false)?;
        }

        for i in 0..num_args {
            input.seek((start + arg_offsets[i]) as i64, Seek::Set);
            match arg_types[i] {
                LODA_ARG_COORDS => self.read_loda_coords(chunk_type, input)?,
                LODA_ARG_FILL_ID => {
                    let fill_id = input.read_u32(false)?;
                    let style = self.fill_styles.get(&fill_id).cloned().unwrap_or_default();
                    self.collector.collect_fill_style(style);
                }
                LODA_ARG_OUTL_ID => {
                    let outl_id = input.read_u32(false)?;
                    let style = self.line_styles.get(&outl_id).cloned().unwrap_or_default();
                    self.collector.collect_line_style(style);
                }
                LODA_ARG_ROTATE => {
                    let angle = self.read_angle(input)?;
                    let cx = self.read_coordinate(input)?;
                    let cy = self.read_coordinate(input)?;
                    self.collector.collect_rotate(angle, cx, cy);
                }
                LODA_ARG_OPACITY => {
                    let opacity = input.read_u16(false)?;
                    self.collector.collect_fill_opacity(opacity as f64 / 1000.0);
                }
                other => {
                    log::debug!("ignoring object argument type 0x{:x}", other);
                }
            }
        }
        Ok(())
    }

    fn read_loda_coords(&mut self, chunk_type: u32, input: &mut InternalStream) -> Result<()> {
        match chunk_type {
            LODA_TYPE_RECTANGLE => self.read_rectangle(input),
            LODA_TYPE_ELLIPSE => self.read_ellipse(input),
            LODA_TYPE_LINE_AND_CURVE | LODA_TYPE_PATH => self.read_line_and_curve(input),
            LODA_TYPE_ARTISTIC_TEXT => {
                let x = self.read_coordinate(input)?;
                let y = self.read_coordinate(input)?;
                self.collector.collect_artistic_text(x, y);
                Ok(())
            }
            LODA_TYPE_BITMAP => {
                let image_id = input.read_u32(false)?;
                let x1 = self.read_coordinate(input)?;
                let y1 = self.read_coordinate(input)?;
                let x2 = self.read_coordinate(input)?;
                let y2 = self.read_coordinate(input)?;
                self.collector.collect_bitmap(image_id, x1, x2, y1, y2);
                Ok(())
            }
            LODA_TYPE_PARAGRAPH_TEXT => {
                let x = self.read_coordinate(input)?;
                let y = self.read_coordinate(input)?;
                let width = self.read_coordinate(input)?;
                let height = self.read_coordinate(input)?;
                self.collector.collect_paragraph_text(x, y, width, height);
                Ok(())
            }
            LODA_TYPE_POLYGON => self.read_polygon(input),
            LODA_TYPE_SPND => {
                let spnd = input.read_u32(false)?;
                self.collector.collect_spnd(spnd);
                Ok(())
            }
            other => {
                log::debug!("ignoring object geometry type 0x{:x}", other);
                Ok(())
            }
        }
    }

    /// A rectangle spanning (0,0)–(width,height) in object space; the
    /// object transform positions it on the page.
    fn read_rectangle(&mut self, input: &mut InternalStream) -> Result<()> {
        let width = self.read_coordinate(input)?;
        let height = self.read_coordinate(input)?;
        let radius = self.read_coordinate(input)?;
        let x0 = 0.0;
        let y0 = 0.0;
        let x1 = width;
        let y1 = height;
        if radius > 0.0 {
            self.collector.collect_move_to(x0, y0 - radius);
            self.collector.collect_line_to(x0, y1 + radius);
            self.collector.collect_quadratic_bezier(x0, y1, x0 + radius, y1);
            self.collector.collect_line_to(x1 - radius, y1);
            self.collector.collect_quadratic_bezier(x1, y1, x1, y1 + radius);
            self.collector.collect_line_to(x1, y0 - radius);
            self.collector.collect_quadratic_bezier(x1, y0, x1 - radius, y0);
            self.collector.collect_line_to(x0 + radius, y0);
            self.collector.collect_quadratic_bezier(x0, y0, x0, y0 - radius);
        } else {
            self.collector.collect_move_to(x0, y0);
            self.collector.collect_line_to(x0, y1);
            self.collector.collect_line_to(x1, y1);
            self.collector.collect_line_to(x1, y0);
            self.collector.collect_line_to(x0, y0);
        }
        Ok(())
    }

    fn read_ellipse(&mut self, input: &mut InternalStream) -> Result<()> {
        let x = self.read_coordinate(input)?;
        let y = self.read_coordinate(input)?;
        let angle1 = self.read_angle(input)?;
        let mut angle2 = self.read_angle(input)?;
        let pie = input.read_u8()? != 0;

        let cx = x / 2.0;
        let cy = y / 2.0;
        let rx = cx.abs();
        let ry = cy.abs();

        if angle1 != angle2 {
            if angle2 < angle1 {
                angle2 += 2.0 * std::f64::consts::PI;
            }
            let x0 = cx + rx * angle1.cos();
            let y0 = cy - ry * angle1.sin();
            let x1 = cx + rx * angle2.cos();
            let y1 = cy - ry * angle2.sin();
            let large_arc =
                !(-std::f64::consts::PI..=std::f64::consts::PI).contains(&(angle2 - angle1));

            self.collector.collect_move_to(x0, y0);
            self.collector.collect_arc_to(rx, ry, large_arc, true, x1, y1);
            if pie {
                self.collector.collect_line_to(cx, cy);
                self.collector.collect_line_to(x0, y0);
                self.collector.collect_close_path();
            }
        } else {
            let x0 = cx + rx;
            let y0 = cy;
            let x1 = cx;
            let y1 = cy - ry;

            self.collector.collect_move_to(x0, y0);
            self.collector.collect_arc_to(rx, ry, false, true, x1, y1);
            self.collector.collect_arc_to(rx, ry, true, true, x0, y0);
        }
        Ok(())
    }

    fn read_line_and_curve(&mut self, input: &mut InternalStream) -> Result<()> {
        let point_num = input.read_u16(false)?;
        let mut points = Vec::with_capacity(point_num as usize);
        let mut point_types = Vec::with_capacity(point_num as usize);
        for _ in 0..point_num {
            let x = self.read_coordinate(input)?;
            let y = self.read_coordinate(input)?;
            points.push((x, y));
        }
        for _ in 0..point_num {
            point_types.push(input.read_u8()?);
        }
        common::output_path(self.collector, &points, &point_types);
        Ok(())
    }

    /// Polygon parameters plus the base path the rosette replicates.
    fn read_polygon(&mut self, input: &mut InternalStream) -> Result<()> {
        let num_angles = input.read_u32(false)?;
        let next_point = input.read_u32(false)?;
        let rx = self.read_coordinate(input)?;
        let ry = self.read_coordinate(input)?;
        let cx = self.read_coordinate(input)?;
        let cy = self.read_coordinate(input)?;
        self.collector
            .collect_polygon_transform(num_angles, next_point, rx, ry, cx, cy);
        self.collector.collect_polygon();
        self.read_line_and_curve(input)
    }

    fn read_transforms(&mut self, input: &mut InternalStream) -> Result<Transforms> {
        let count = input.read_u16(false)?;
        let mut trafos = Transforms::new();
        for _ in 0..count {
            let matrix_type = input.read_u16(false)?;
            if matrix_type == 2 {
                let v0 = input.read_double(false)?;
                let v3 = input.read_double(false)?;
                let v1 = input.read_double(false)?;
                let v4 = input.read_double(false)?;
                let x0 = input.read_double(false)?;
                let y0 = input.read_double(false)?;
                trafos.append(Transform::new(v0, v1, x0, v3, v4, y0));
            } else {
                trafos.append(Transform::default());
            }
        }
        Ok(trafos)
    }

    /// A color reference: either immediate `(model, value)` or a palette
    /// entry with a tint.
    fn read_color(&mut self, input: &mut InternalStream) -> Result<Color> {
        let model = input.read_u16(false)?;
        let value = input.read_u32(false)?;
        let palette_ref = input.read_u16(false)?;
        let tint = input.read_u16(false)?;
        if palette_ref != 0 {
            let base = self
                .palette
                .get(&(palette_ref as u32))
                .copied()
                .unwrap_or_default();
            Ok(crate::color::apply_tint(&base, tint as f64 / 100.0))
        } else {
            Ok(Color::new(model, value))
        }
    }

    fn read_image_fill(&mut self, input: &mut InternalStream) -> Result<ImageFill> {
        let id = input.read_u32(false)?;
        let width = self.read_coordinate(input)?;
        let height = self.read_coordinate(input)?;
        let is_relative = input.read_u8()? != 0;
        let x_offset = self.read_coordinate(input)?;
        let y_offset = self.read_coordinate(input)?;
        let rcp_offset = self.read_coordinate(input)?;
        let flags = input.read_u8()?;
        Ok(ImageFill::new(
            id, width, height, is_relative, x_offset, y_offset, rcp_offset, flags,
        ))
    }

    fn read_fild(&mut self, input: &mut InternalStream) -> Result<()> {
        let fill_id = input.read_u32(false)?;
        let fill_type = input.read_u16(false)?;
        let mut color1 = Color::default();
        let mut color2 = Color::default();
        let mut gradient = Gradient::default();
        let mut image_fill = ImageFill::default();
        match fill_type {
            1 => {
                // Solid
                color1 = self.read_color(input)?;
            }
            2 => {
                // Gradient
                gradient.gradient_type = input.read_u8()?;
                gradient.mode = input.read_u8()?;
                gradient.angle = self.read_angle(input)?;
                gradient.mid_point = input.read_s32(false)? as f64 / 100.0;
                gradient.edge_offset = input.read_s32(false)?;
                gradient.center_x_offset = input.read_s32(false)?;
                gradient.center_y_offset = input.read_s32(false)?;
                let stop_count = input.read_u16(false)?;
                for _ in 0..stop_count {
                    let color = self.read_color(input)?;
                    let offset = input.read_u16(false)? as f64 / 100.0;
                    gradient.stops.push(GradientStop::new(color, offset));
                }
            }
            7 => {
                // Pattern: two-color tile
                image_fill = self.read_image_fill(input)?;
                color1 = self.read_color(input)?;
                color2 = self.read_color(input)?;
            }
            9 | 10 | 11 => {
                // Bitmap, full-color vector, texture
                image_fill = self.read_image_fill(input)?;
            }
            _ => {}
        }
        self.fill_styles.insert(
            fill_id,
            FillStyle::new(fill_type, color1, color2, gradient, image_fill),
        );
        Ok(())
    }

    fn read_outl(&mut self, input: &mut InternalStream) -> Result<()> {
        let line_id = input.read_u32(false)?;
        let line_type = input.read_u16(false)?;
        let caps_type = input.read_u16(false)?;
        let join_type = input.read_u16(false)?;
        let line_width = self.read_coordinate(input)?;
        let stretch = input.read_u16(false)? as f64 / 100.0;
        let angle = self.read_angle(input)?;
        let color = self.read_color(input)?;
        let dash_count = input.read_u16(false)?;
        let mut dash_array = Vec::with_capacity(dash_count as usize);
        for _ in 0..dash_count {
            dash_array.push(input.read_u16(false)? as u32);
        }
        let start_marker_id = input.read_u32(false)?;
        let end_marker_id = input.read_u32(false)?;
        self.line_styles.insert(
            line_id,
            LineStyle::new(
                line_type,
                caps_type,
                join_type,
                line_width,
                stretch,
                angle,
                color,
                dash_array,
                start_marker_id,
                end_marker_id,
            ),
        );
        Ok(())
    }

    fn read_bmp(&mut self, input: &mut InternalStream, length: usize) -> Result<()> {
        let start = input.tell();
        let image_id = input.read_u32(false)?;
        let color_model = input.read_u32(false)?;
        let width = input.read_u32(false)?;
        let height = input.read_u32(false)?;
        let bpp = input.read_u32(false)?;
        let palette_size = input.read_u32(false)? as usize;
        if palette_size > 256 {
            return Err(Error::EndOfStream);
        }
        let mut palette = Vec::with_capacity(palette_size);
        for _ in 0..palette_size {
            // BGR byte triplets
            let b = input.read_u8()? as u32;
            let g = input.read_u8()? as u32;
            let r = input.read_u8()? as u32;
            palette.push(b | (g << 8) | (r << 16));
        }
        let consumed = input.tell() - start;
        let data = input.read(length.saturating_sub(consumed))?.to_vec();
        self.collector
            .collect_bmp(image_id, color_model, width, height, bpp, &palette, &data);
        Ok(())
    }

    fn read_bmpf(&mut self, input: &mut InternalStream, length: usize) -> Result<()> {
        let pattern_id = input.read_u32(false)?;
        let width = input.read_u32(false)?;
        let height = input.read_u32(false)?;
        let data = input.read(length.saturating_sub(12))?.to_vec();
        self.collector.collect_bmpf(pattern_id, width, height, &data);
        Ok(())
    }

    fn read_ppdt(&mut self, input: &mut InternalStream) -> Result<()> {
        let point_num = input.read_u16(false)?;
        let mut points = Vec::with_capacity(point_num as usize);
        for _ in 0..point_num {
            let x = self.read_coordinate(input)?;
            let y = self.read_coordinate(input)?;
            points.push((x, y));
        }
        let mut knot_vector = Vec::with_capacity(point_num as usize);
        for _ in 0..point_num {
            knot_vector.push(input.read_u32(false)?);
        }
        self.collector.collect_ppdt(&points, &knot_vector);
        self.collector.collect_spline();
        Ok(())
    }

    fn read_fntt(&mut self, input: &mut InternalStream, length: usize) -> Result<()> {
        let font_id = input.read_u16(false)?;
        let encoding = input.read_u16(false)?;
        let raw = input.read(length.saturating_sub(4))?;
        let name_end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        let name = String::from_utf8_lossy(&raw[..name_end]).into_owned();
        self.fonts.insert(font_id, Font::new(name, encoding));
        Ok(())
    }

    fn char_style_from_refs(
        &self,
        font_id: u16,
        font_size: f64,
        align: u32,
        fill_id: u32,
        outl_id: u32,
        parent_id: u32,
    ) -> CharacterStyle {
        let mut style = CharacterStyle { font_size, align, parent_id, ..Default::default() };
        if let Some(font) = self.fonts.get(&font_id) {
            style.font_name = font.name.clone();
            style.char_set = font.encoding;
        }
        if fill_id != 0 {
            if let Some(fill) = self.fill_styles.get(&fill_id) {
                style.fill_style = fill.clone();
            }
        }
        if outl_id != 0 {
            if let Some(line) = self.line_styles.get(&outl_id) {
                style.line_style = line.clone();
            }
        }
        style
    }

    /// Style table: one record per character style.
    fn read_stlt(&mut self, input: &mut InternalStream) -> Result<()> {
        let num_records = input.read_u32(false)?;
        if num_records > 0xffff {
            return Err(Error::EndOfStream);
        }
        for _ in 0..num_records {
            let id = input.read_u32(false)?;
            let parent_id = input.read_u32(false)?;
            let font_id = input.read_u16(false)?;
            let font_size = input.read_double(false)?;
            let align = input.read_u32(false)?;
            let fill_id = input.read_u32(false)?;
            let outl_id = input.read_u32(false)?;
            let style =
                self.char_style_from_refs(font_id, font_size, align, fill_id, outl_id, parent_id);
            self.collector.collect_stld(id, &style);
        }
        Ok(())
    }

    /// Single style record with an argument table, one tagged argument per
    /// style facet.
    fn read_styd(&mut self, input: &mut InternalStream) -> Result<()> {
        let start = input.tell();
        let style_id = input.read_u32(false)?;
        let parent_id = input.read_u32(false)?;
        let num_args = input.read_u32(false)? as usize;
        let start_of_args = input.read_u32(false)? as usize;
        let start_of_arg_types = input.read_u32(false)? as usize;
        if num_args > 0xffff {
            return Err(Error::EndOfStream);
        }

        input.seek((start + start_of_args) as i64, Seek::Set);
        let mut arg_offsets = Vec::with_capacity(num_args);
        for _ in 0..num_args {
            arg_offsets.push(input.read_u32(false)? as usize);
        }
        input.seek((start + start_of_arg_types) as i64, Seek::Set);
        let mut arg_types = vec![0u32; num_args];
        for i in (0..num_args).rev() {
            arg_types[i] = input.read_u32(false)?;
        }

        let mut font_id = 0u16;
        let mut font_size = 0.0f64;
        let mut align = 0u32;
        let mut fill_id = 0u32;
        let mut outl_id = 0u32;
        let mut indents = (0.0f64, 0.0f64, 0.0f64);
        for i in 0..num_args {
            input.seek((start + arg_offsets[i]) as i64, Seek::Set);
            match arg_types[i] {
                STYD_FONTS => {
                    font_id = input.read_u16(false)?;
                    font_size = input.read_double(false)?;
                }
                STYD_ALIGN => align = input.read_u32(false)?,
                STYD_FILL_ID => fill_id = input.read_u32(false)?,
                STYD_OUTL_ID => outl_id = input.read_u32(false)?,
                STYD_IDENTS => {
                    indents.0 = self.read_coordinate(input)?;
                    indents.1 = self.read_coordinate(input)?;
                    indents.2 = self.read_coordinate(input)?;
                }
                STYD_NAME | STYD_BULLETS | STYD_INTERVALS | STYD_TABS | STYD_HYPHENS
                | STYD_SET5S | STYD_DROPCAPS => {}
                other => {
                    log::debug!("ignoring style argument type 0x{:x}", other);
                }
            }
        }
        let mut style =
            self.char_style_from_refs(font_id, font_size, align, fill_id, outl_id, parent_id);
        style.left_indent = indents.0;
        style.first_indent = indents.1;
        style.right_indent = indents.2;
        self.collector.collect_stld(style_id, &style);
        Ok(())
    }

    /// Text block: style overrides keyed by attribute byte, then the
    /// per-character attribute stream and the raw code units.
    fn read_txsm(&mut self, input: &mut InternalStream) -> Result<()> {
        let text_id = input.read_u32(false)?;
        let style_id = input.read_u32(false)?;
        let num_overrides = input.read_u16(false)?;
        let mut style_overrides = BTreeMap::new();
        for _ in 0..num_overrides {
            // newer documents widened the override key
            let key = if self.version >= 1500 {
                input.read_u16(false)? as u32
            } else {
                input.read_u8()? as u32
            };
            let font_id = input.read_u16(false)?;
            let font_size = input.read_double(false)?;
            let fill_id = input.read_u32(false)?;
            let outl_id = input.read_u32(false)?;
            let style = self.char_style_from_refs(font_id, font_size, 0, fill_id, outl_id, 0);
            style_overrides.insert(key, style);
        }
        let num_chars = input.read_u16(false)? as usize;
        let char_descriptions = input.read(num_chars)?.to_vec();
        let data_len: usize = char_descriptions
            .iter()
            .map(|&d| 1 + (d & 0x01) as usize)
            .sum();
        let data = input.read(data_len)?.to_vec();
        self.collector
            .collect_text(text_id, style_id, &data, &char_descriptions, &style_overrides);
        Ok(())
    }

    fn read_rclr(&mut self, input: &mut InternalStream) -> Result<()> {
        let count = input.read_u16(false)?;
        for _ in 0..count {
            let color_id = input.read_u32(false)?;
            let user_id = input.read_u32(false)?;
            let model = input.read_u16(false)?;
            let value = input.read_u32(false)?;
            let color = Color::new(model, value);
            self.palette.insert(color_id, color);
            self.collector.collect_palette_entry(color_id, user_id, &color);
        }
        Ok(())
    }
}
