//! CMX parser: a RIFF-like top level whose `page` chunk carries a flat,
//! size-prefixed instruction stream.

use crate::collector::Collector;
use crate::common::{self, Precision};
use crate::constants::*;
use crate::errors::Result;
use crate::stream::{fourcc_str, InternalStream, Seek};
use crate::transform::Transform;
use crate::types::Rect;

pub struct CmxParser<'c> {
    collector: &'c mut dyn Collector,
    precision: Precision,
    big_endian: bool,
    unit: u16,
    scale: f64,
    index_section_offset: u32,
    info_section_offset: u32,
    thumbnail_offset: u32,
    next_instruction_offset: usize,
}

impl<'c> CmxParser<'c> {
    pub fn new(collector: &'c mut dyn Collector) -> Self {
        CmxParser {
            collector,
            precision: Precision::Unknown,
            big_endian: false,
            unit: 0,
            scale: 0.0,
            index_section_offset: 0,
            info_section_offset: 0,
            thumbnail_offset: 0,
            next_instruction_offset: 0,
        }
    }

    pub fn parse(&mut self, input: &mut InternalStream) -> bool {
        self.parse_records(input, None, 0)
    }

    fn parse_records(
        &mut self,
        input: &mut InternalStream,
        size: Option<usize>,
        level: u32,
    ) -> bool {
        self.collector.collect_level(level);
        let end_position = size.map(|s| input.tell() + s);
        while !input.at_end() && end_position.map(|end| input.tell() < end).unwrap_or(true) {
            if !self.parse_record(input, level) {
                return false;
            }
        }
        true
    }

    fn parse_record(&mut self, input: &mut InternalStream, level: u32) -> bool {
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
            let length = input.read_u32(false)? as usize;
            Ok((four_cc, length))
        })();
        let Ok((four_cc, length)) = header else {
            return false;
        };
        let end_position = input.tell() + length;
        log::debug!(
            "record: level {} {}, length 0x{:08x}",
            level,
            fourcc_str(four_cc),
            length
        );

        let ok = if four_cc == FOURCC_RIFF || four_cc == FOURCC_RIFX || four_cc == FOURCC_LIST {
            if input.seek(4, Seek::Cur) {
                self.parse_records(input, Some(length.saturating_sub(4)), level + 1)
            } else {
                false
            }
        } else {
            if self.read_record(four_cc, length, input).is_err() {
                log::warn!("skipping undecodable {} record", fourcc_str(four_cc));
            }
            true
        };
        if !ok {
            return false;
        }
        if input.tell() < end_position {
            input.seek(end_position as i64, Seek::Set);
        }
        true
    }

    fn read_record(
        &mut self,
        four_cc: u32,
        length: usize,
        input: &mut InternalStream,
    ) -> Result<()> {
        let mut record_end = input.tell() + length;
        match four_cc {
            FOURCC_CONT => self.read_cmx_header(input)?,
            FOURCC_DISP => self.read_disp(input, length)?,
            FOURCC_PAGE => self.read_page(input, length)?,
            FOURCC_CCMM => self.read_ccmm(input, &mut record_end),
            _ => {}
        }
        if input.tell() < record_end {
            input.seek(record_end as i64, Seek::Set);
        }
        Ok(())
    }

    fn read_cmx_header(&mut self, input: &mut InternalStream) -> Result<()> {
        let file_id = String::from_utf8_lossy(input.read(32)?).into_owned();
        log::debug!("CMX file id: {}", file_id.trim_end_matches('\0'));
        input.seek(16, Seek::Cur); // platform
        let byte_order = String::from_utf8_lossy(input.read(4)?).into_owned();
        if byte_order.trim().parse::<u32>().unwrap_or(2) == 4 {
            self.big_endian = true;
        }
        let coord_size = String::from_utf8_lossy(input.read(2)?).into_owned();
        self.precision = match coord_size.trim().trim_end_matches('\0').parse::<u32>() {
            Ok(2) => Precision::Bits16,
            Ok(4) => Precision::Bits32,
            _ => Precision::Unknown,
        };
        input.seek(4, Seek::Cur); // version major
        input.seek(4, Seek::Cur); // version minor
        self.unit = input.read_u16(self.big_endian)?;
        self.scale = input.read_double(self.big_endian)?;
        input.seek(12, Seek::Cur); // reserved
        self.index_section_offset = input.read_u32(self.big_endian)?;
        self.info_section_offset = input.read_u32(self.big_endian)?;
        self.thumbnail_offset = input.read_u32(self.big_endian)?;
        let bbox = self.read_bbox(input)?;
        log::debug!(
            "CMX header: unit {}, scale {}, bbox {:?}, sections 0x{:x}/0x{:x}/0x{:x}",
            self.unit,
            self.scale,
            bbox,
            self.index_section_offset,
            self.info_section_offset,
            self.thumbnail_offset
        );
        Ok(())
    }

    /// Reassembles the 8-bit preview into a BMP blob. Kept for debugging
    /// parity with the producer; the blob is not part of the output.
    fn read_disp(&mut self, input: &mut InternalStream, length: usize) -> Result<()> {
        let mut preview_image = Vec::with_capacity(length + 14);
        preview_image.extend_from_slice(&[0x42, 0x4d]);
        preview_image.extend_from_slice(&((length as u32 + 8).to_le_bytes()));
        preview_image.extend_from_slice(&[0, 0, 0, 0]);

        let start_position = input.tell();
        input.seek(0x18, Seek::Cur);
        let length_x = length as i64 + 10 - input.read_u32(self.big_endian)? as i64;
        input.seek(start_position as i64, Seek::Set);
        preview_image.extend_from_slice(&(length_x as u32).to_le_bytes());

        input.seek(4, Seek::Cur);
        preview_image.extend_from_slice(input.read(length.saturating_sub(4))?);
        log::debug!("decoded {} byte preview bitmap", preview_image.len());
        Ok(())
    }

    fn read_ccmm(&mut self, _input: &mut InternalStream, record_end: &mut usize) {
        // when the thumbnail offset is unset the record body runs long
        if self.thumbnail_offset == u32::MAX {
            *record_end += 0x10;
        }
    }

    fn read_page(&mut self, input: &mut InternalStream, length: usize) -> Result<()> {
        let end_position = input.tell() + length;
        while !input.at_end() && input.tell() < end_position {
            let start_position = input.tell();
            let mut instruction_size = input.read_s16(self.big_endian)? as i64;
            if instruction_size < 0 {
                instruction_size = input.read_s32(self.big_endian)? as i64;
            }
            self.next_instruction_offset = start_position + instruction_size.max(0) as usize;
            let instruction_code = input.read_s16(self.big_endian)?.unsigned_abs() as i16;
            log::debug!(
                "instruction size {}, code {}",
                instruction_size,
                instruction_code
            );
            let decoded = match instruction_code {
                CMX_COMMAND_BEGIN_PAGE => self.read_begin_page(input),
                CMX_COMMAND_BEGIN_LAYER => Ok(()),
                CMX_COMMAND_BEGIN_GROUP => Ok(()),
                CMX_COMMAND_POLY_CURVE => self.read_poly_curve(input),
                CMX_COMMAND_ELLIPSE => self.read_ellipse(input),
                CMX_COMMAND_RECTANGLE => self.read_rectangle(input),
                CMX_COMMAND_JUMP_ABSOLUTE => self.read_jump_absolute(input),
                _ => Ok(()),
            };
            if decoded.is_err() {
                log::warn!("skipping undecodable instruction {}", instruction_code);
            }
            // decoders may overrun their tags; resynchronize unconditionally
            if self.next_instruction_offset <= start_position {
                break;
            }
            input.seek(self.next_instruction_offset as i64, Seek::Set);
        }
        Ok(())
    }

    /// Iterates a 32-bit-precision tag stream, handing each tag body to
    /// `body`. Tag 0xFF ends the stream.
    fn for_each_tag(
        &mut self,
        input: &mut InternalStream,
        mut body: impl FnMut(&mut Self, u8, &mut InternalStream) -> Result<()>,
    ) -> Result<()> {
        loop {
            let start_offset = input.tell();
            let tag_id = input.read_u8()?;
            if tag_id == CMX_TAG_END {
                break;
            }
            let tag_length = input.read_u16(self.big_endian)?;
            log::debug!("  tag {} length {}", tag_id, tag_length);
            body(self, tag_id, input)?;
            input.seek((start_offset + tag_length as usize) as i64, Seek::Set);
        }
        Ok(())
    }

    fn read_begin_page(&mut self, input: &mut InternalStream) -> Result<()> {
        let mut bbox = Rect::default();
        let mut flags = 0u32;
        match self.precision {
            Precision::Bits32 => {
                self.for_each_tag(input, |this, tag_id, input| {
                    match tag_id {
                        CMX_TAG_BEGIN_PAGE_PAGE_SPECIFICATION => {
                            input.seek(2, Seek::Cur);
                            flags = input.read_u32(this.big_endian)?;
                            bbox = this.read_bbox(input)?;
                        }
                        CMX_TAG_BEGIN_PAGE_MATRIX => {
                            let _matrix = this.read_matrix(input)?;
                        }
                        _ => {}
                    }
                    Ok(())
                })?;
            }
            Precision::Bits16 => {
                input.seek(2, Seek::Cur);
                flags = input.read_u32(self.big_endian)?;
                bbox = self.read_bbox(input)?;
            }
            Precision::Unknown => return Ok(()),
        }
        self.collector.collect_page(0);
        self.collector.collect_flags(flags, true);
        self.collector
            .collect_page_size(bbox.width(), bbox.height(), bbox.min_x(), bbox.min_y());
        Ok(())
    }

    fn read_poly_curve(&mut self, input: &mut InternalStream) -> Result<()> {
        let mut points: Vec<(f64, f64)> = Vec::new();
        let mut point_types: Vec<u8> = Vec::new();
        match self.precision {
            Precision::Bits32 => {
                self.for_each_tag(input, |this, tag_id, input| {
                    match tag_id {
                        CMX_TAG_POLY_CURVE_RENDERING_ATTR => {
                            this.read_rendering_attributes(input)?;
                        }
                        CMX_TAG_POLY_CURVE_POINT_LIST => {
                            let point_num = input.read_u16(this.big_endian)?;
                            for _ in 0..point_num {
                                let x = common::read_coordinate(
                                    input,
                                    this.big_endian,
                                    this.precision,
                                )?;
                                let y = common::read_coordinate(
                                    input,
                                    this.big_endian,
                                    this.precision,
                                )?;
                                points.push((x, y));
                            }
                            for _ in 0..point_num {
                                point_types.push(input.read_u8()?);
                            }
                        }
                        _ => {}
                    }
                    Ok(())
                })?;
            }
            Precision::Bits16 => {
                self.read_rendering_attributes(input)?;
                let point_num = input.read_u16(self.big_endian)?;
                for _ in 0..point_num {
                    let x = common::read_coordinate(input, self.big_endian, self.precision)?;
                    let y = common::read_coordinate(input, self.big_endian, self.precision)?;
                    points.push((x, y));
                }
                for _ in 0..point_num {
                    point_types.push(input.read_u8()?);
                }
            }
            Precision::Unknown => return Ok(()),
        }

        self.collector.collect_object(1);
        common::output_path(self.collector, &points, &point_types);
        self.collector.collect_level(1);
        Ok(())
    }

    fn read_ellipse(&mut self, input: &mut InternalStream) -> Result<()> {
        let mut cx = 0.0;
        let mut cy = 0.0;
        let mut rx = 0.0;
        let mut ry = 0.0;
        let mut angle1 = 0.0;
        let mut angle2 = 0.0;
        let mut rotation = 0.0;
        let mut pie = false;
        match self.precision {
            Precision::Bits32 => {
                self.for_each_tag(input, |this, tag_id, input| {
                    match tag_id {
                        CMX_TAG_ELLIPSE_RENDERING_ATTR => {
                            this.read_rendering_attributes(input)?;
                        }
                        CMX_TAG_ELLIPSE_SPECIFICATION => {
                            cx = common::read_coordinate(input, this.big_endian, this.precision)?;
                            cy = common::read_coordinate(input, this.big_endian, this.precision)?;
                            rx = common::read_coordinate(input, this.big_endian, this.precision)?
                                / 2.0;
                            ry = common::read_coordinate(input, this.big_endian, this.precision)?
                                / 2.0;
                            angle1 = common::read_angle(input, this.big_endian, this.precision)?;
                            angle2 = common::read_angle(input, this.big_endian, this.precision)?;
                            rotation = common::read_angle(input, this.big_endian, this.precision)?;
                            pie = input.read_u8()? != 0;
                        }
                        _ => {}
                    }
                    Ok(())
                })?;
            }
            Precision::Bits16 => {
                cx = common::read_coordinate(input, self.big_endian, self.precision)?;
                cy = common::read_coordinate(input, self.big_endian, self.precision)?;
                rx = common::read_coordinate(input, self.big_endian, self.precision)? / 2.0;
                ry = common::read_coordinate(input, self.big_endian, self.precision)? / 2.0;
                angle1 = common::read_angle(input, self.big_endian, self.precision)?;
                angle2 = common::read_angle(input, self.big_endian, self.precision)?;
                rotation = common::read_angle(input, self.big_endian, self.precision)?;
                pie = input.read_u8()? != 0;
            }
            Precision::Unknown => return Ok(()),
        }

        self.collector.collect_object(1);
        if angle1 != angle2 {
            if angle2 < angle1 {
                angle2 += 2.0 * std::f64::consts::PI;
            }
            let x0 = cx + rx * angle1.cos();
            let y0 = cy - ry * angle1.sin();
            let x1 = cx + rx * angle2.cos();
            let y1 = cy - ry * angle2.sin();
            let large_arc = !(-std::f64::consts::PI..=std::f64::consts::PI).contains(&(angle2 - angle1));

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
        self.collector.collect_rotate(rotation, cx, cy);
        self.collector.collect_level(1);
        Ok(())
    }

    fn read_rectangle(&mut self, input: &mut InternalStream) -> Result<()> {
        let mut cx = 0.0;
        let mut cy = 0.0;
        let mut width = 0.0;
        let mut height = 0.0;
        let mut radius = 0.0;
        let mut angle = 0.0;
        match self.precision {
            Precision::Bits32 => {
                self.for_each_tag(input, |this, tag_id, input| {
                    match tag_id {
                        CMX_TAG_RECTANGLE_RENDERING_ATTR => {
                            this.read_rendering_attributes(input)?;
                        }
                        CMX_TAG_RECTANGLE_SPECIFICATION => {
                            cx = common::read_coordinate(input, this.big_endian, this.precision)?;
                            cy = common::read_coordinate(input, this.big_endian, this.precision)?;
                            width =
                                common::read_coordinate(input, this.big_endian, this.precision)?;
                            height =
                                common::read_coordinate(input, this.big_endian, this.precision)?;
                            radius =
                                common::read_coordinate(input, this.big_endian, this.precision)?;
                            angle = common::read_angle(input, this.big_endian, this.precision)?;
                        }
                        _ => {}
                    }
                    Ok(())
                })?;
            }
            Precision::Bits16 => {
                input.seek(3, Seek::Cur);
                cx = common::read_coordinate(input, self.big_endian, self.precision)?;
                cy = common::read_coordinate(input, self.big_endian, self.precision)?;
                width = common::read_coordinate(input, self.big_endian, self.precision)?;
                height = common::read_coordinate(input, self.big_endian, self.precision)?;
                radius = common::read_coordinate(input, self.big_endian, self.precision)?;
                angle = common::read_angle(input, self.big_endian, self.precision)?;
            }
            Precision::Unknown => return Ok(()),
        }

        self.collector.collect_object(1);
        let x0 = cx - width / 2.0;
        let y0 = cy - height / 2.0;
        let x1 = cx + width / 2.0;
        let y1 = cy + height / 2.0;
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
        self.collector.collect_rotate(angle, cx, cy);
        self.collector.collect_level(1);
        Ok(())
    }

    fn read_jump_absolute(&mut self, input: &mut InternalStream) -> Result<()> {
        match self.precision {
            Precision::Bits32 => {
                let mut offset = None;
                self.for_each_tag(input, |this, tag_id, input| {
                    if tag_id == CMX_TAG_JUMP_ABSOLUTE_OFFSET {
                        offset = Some(input.read_u32(this.big_endian)? as usize);
                    }
                    Ok(())
                })?;
                if let Some(offset) = offset {
                    self.next_instruction_offset = offset;
                }
            }
            Precision::Bits16 => {
                self.next_instruction_offset = input.read_u32(self.big_endian)? as usize;
            }
            Precision::Unknown => {}
        }
        Ok(())
    }

    /// Fill / outline / lens / canvas / container blocks behind a bit mask.
    /// Only the outline reference is consumed.
    fn read_rendering_attributes(&mut self, input: &mut InternalStream) -> Result<()> {
        let bit_mask = input.read_u8()?;
        for bit in [0x01u8, 0x02, 0x04, 0x08, 0x10] {
            if bit_mask & bit == 0 {
                continue;
            }
            match self.precision {
                Precision::Bits32 => {
                    self.for_each_tag(input, |this, tag_id, input| {
                        if bit == 0x02 && tag_id == CMX_TAG_RENDER_ATTR_OUTLINE_SPEC {
                            let outl_id = input.read_u16(this.big_endian)?;
                            this.collector.collect_outl_id(outl_id as u32);
                        }
                        Ok(())
                    })?;
                }
                Precision::Bits16 => {
                    if bit == 0x02 {
                        let outl_id = input.read_u16(self.big_endian)?;
                        self.collector.collect_outl_id(outl_id as u32);
                    }
                }
                Precision::Unknown => {}
            }
        }
        Ok(())
    }

    fn read_matrix(&mut self, input: &mut InternalStream) -> Result<Transform> {
        let matrix_type = input.read_u16(self.big_endian)?;
        match matrix_type {
            2 => {
                // general matrix
                let v0 = input.read_double(self.big_endian)?;
                let v3 = input.read_double(self.big_endian)?;
                let v1 = input.read_double(self.big_endian)?;
                let v4 = input.read_double(self.big_endian)?;
                let x0 = input.read_double(self.big_endian)?;
                let y0 = input.read_double(self.big_endian)?;
                Ok(Transform::new(v0, v1, x0, v3, v4, y0))
            }
            _ => Ok(Transform::default()),
        }
    }

    fn read_bbox(&mut self, input: &mut InternalStream) -> Result<Rect> {
        let x0 = common::read_coordinate(input, self.big_endian, self.precision)?;
        let y0 = common::read_coordinate(input, self.big_endian, self.precision)?;
        let x1 = common::read_coordinate(input, self.big_endian, self.precision)?;
        let y1 = common::read_coordinate(input, self.big_endian, self.precision)?;
        Ok(Rect::from_corners(x0, y0, x1, y1))
    }
}
