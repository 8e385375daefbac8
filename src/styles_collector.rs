//! Pass 1: materializes every resource the content pass will reference by
//! id. Never calls the paint sink.

use std::collections::BTreeMap;

use crate::collector::{Collector, ParserState};
use crate::types::{CharacterStyle, Color, Page, Pattern, TextLine, TextRun};

pub(crate) fn write_u16(buffer: &mut Vec<u8>, value: u16) {
    buffer.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_u32(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend_from_slice(&value.to_le_bytes());
}

pub struct StylesCollector<'a> {
    ps: &'a mut ParserState,
    page: Page,
    char_styles: BTreeMap<u32, CharacterStyle>,
}

impl<'a> StylesCollector<'a> {
    pub fn new(ps: &'a mut ParserState) -> Self {
        StylesCollector {
            ps,
            page: Page::new(8.5, 11.0, -4.25, -5.5),
            char_styles: BTreeMap::new(),
        }
    }

    /// Walks `parent_id` upward pushing styles onto a stack, then applies
    /// them top-down so the document-declared overrides win. The walk is
    /// bounded by the arena size, so a cyclic parent chain terminates.
    fn get_recursed_style(&self, char_style: &mut CharacterStyle, style_id: u32) {
        let Some(style) = self.char_styles.get(&style_id) else {
            return;
        };
        let mut style_stack = vec![style];
        let mut parent_id = style.parent_id;
        let mut hops = self.char_styles.len();
        while parent_id != 0 && hops > 0 {
            match self.char_styles.get(&parent_id) {
                Some(parent) => {
                    style_stack.push(parent);
                    parent_id = parent.parent_id;
                }
                None => break,
            }
            hops -= 1;
        }
        while let Some(style) = style_stack.pop() {
            char_style.override_character_style(style);
        }
    }
}

/// Decodes 8-bit code units under a document charset byte.
fn append_characters(text: &mut String, characters: &[u8], charset: u16) -> bool {
    use encoding_rs::*;
    let encoding = match charset & 0xff {
        0x80 => SHIFT_JIS,
        0x81 => EUC_KR,
        0x86 => GBK,
        0x88 => BIG5,
        0xa1 => WINDOWS_1253,
        0xa2 => WINDOWS_1254,
        0xa3 => WINDOWS_1258,
        0xb1 => WINDOWS_1255,
        0xb2 => WINDOWS_1256,
        0xba => WINDOWS_1257,
        0xcc => WINDOWS_1251,
        0xde => WINDOWS_874,
        0xee => WINDOWS_1250,
        _ => WINDOWS_1252,
    };
    let (decoded, _, had_errors) = encoding.decode(characters);
    if had_errors {
        return false;
    }
    text.push_str(&decoded);
    true
}

/// Decodes UTF-16LE code units.
fn append_wide_characters(text: &mut String, characters: &[u8]) -> bool {
    let units: Vec<u16> = characters
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    for c in char::decode_utf16(units) {
        match c {
            Ok(c) => text.push(c),
            Err(_) => return false,
        }
    }
    true
}

impl Collector for StylesCollector<'_> {
    fn collect_bmp(
        &mut self,
        image_id: u32,
        color_model: u32,
        width: u32,
        height: u32,
        bpp: u32,
        palette: &[u32],
        bitmap: &[u8],
    ) {
        if width == 0 || height == 0 || bitmap.is_empty() {
            return;
        }
        let Some(pixel_size) = height.checked_mul(width) else {
            return;
        };
        let Some(dib_image_size) = pixel_size.checked_mul(4) else {
            return;
        };
        let dib_offset_bits: u32 = 14 + 40;
        let Some(dib_file_size) = dib_image_size.checked_add(dib_offset_bits) else {
            return;
        };

        let mut image = Vec::with_capacity(dib_file_size as usize);
        // DIB file header
        write_u16(&mut image, 0x4d42); // Type
        write_u32(&mut image, dib_file_size);
        write_u16(&mut image, 0); // Reserved1
        write_u16(&mut image, 0); // Reserved2
        write_u32(&mut image, dib_offset_bits);
        // DIB info header
        write_u32(&mut image, 40);
        write_u32(&mut image, width);
        write_u32(&mut image, height);
        write_u16(&mut image, 1); // Planes
        write_u16(&mut image, 32); // BitCount
        write_u32(&mut image, 0); // Compression
        write_u32(&mut image, dib_image_size);
        write_u32(&mut image, 0); // XPelsPerMeter
        write_u32(&mut image, 0); // YPelsPerMeter
        write_u32(&mut image, 0); // ColorsUsed
        write_u32(&mut image, 0); // ColorsImportant

        // Cater for eventual padding
        let line_width = bitmap.len() / height as usize;
        if line_width == 0 {
            return;
        }

        let mut store_bmp = true;
        for j in 0..height as usize {
            let row = &bitmap[j * line_width..(j + 1) * line_width];
            let mut i = 0usize;
            let mut k = 0u32;
            if color_model == 6 {
                // 1 bpp, black and white
                while i < line_width && k < width {
                    let mut c = row[i];
                    i += 1;
                    let mut l = 0;
                    while k < width && l < 8 {
                        if c & 0x80 != 0 {
                            write_u32(&mut image, 0xffffff);
                        } else {
                            write_u32(&mut image, 0);
                        }
                        c <<= 1;
                        l += 1;
                        k += 1;
                    }
                }
            } else if color_model == 5 {
                // 8 bpp, single channel straight through the color engine
                while i < line_width && i < width as usize {
                    let c = row[i];
                    i += 1;
                    let rgb = self
                        .ps
                        .color_transforms
                        .bmp_color(&Color::new(color_model as u16, c as u32));
                    write_u32(&mut image, rgb);
                }
            } else if !palette.is_empty() {
                while i < line_width && i < width as usize {
                    let c = row[i] as usize;
                    i += 1;
                    if c >= palette.len() {
                        continue;
                    }
                    let rgb = self
                        .ps
                        .color_transforms
                        .bmp_color(&Color::new(color_model as u16, palette[c]));
                    write_u32(&mut image, rgb);
                }
            } else if bpp == 24 {
                while i + 2 < line_width && k < width {
                    let c = ((row[i + 2] as u32) << 16) | ((row[i + 1] as u32) << 8) | row[i] as u32;
                    i += 3;
                    let rgb = self
                        .ps
                        .color_transforms
                        .bmp_color(&Color::new(color_model as u16, c));
                    write_u32(&mut image, rgb);
                    k += 1;
                }
            } else if bpp == 32 {
                while i + 3 < line_width && k < width {
                    let c = ((row[i + 3] as u32) << 24)
                        | ((row[i + 2] as u32) << 16)
                        | ((row[i + 1] as u32) << 8)
                        | row[i] as u32;
                    i += 4;
                    let rgb = self
                        .ps
                        .color_transforms
                        .bmp_color(&Color::new(color_model as u16, c));
                    write_u32(&mut image, rgb);
                    k += 1;
                }
            } else {
                store_bmp = false;
            }
        }

        if store_bmp {
            self.ps.bmps.insert(image_id, image);
        }
    }

    fn collect_bmp_raw(&mut self, image_id: u32, bitmap: &[u8]) {
        self.ps.bmps.insert(image_id, bitmap.to_vec());
    }

    fn collect_page_size(&mut self, width: f64, height: f64, offset_x: f64, offset_y: f64) {
        match self.ps.pages.last_mut() {
            Some(page) => *page = Page::new(width, height, offset_x, offset_y),
            None => self.page = Page::new(width, height, offset_x, offset_y),
        }
    }

    fn collect_page(&mut self, _level: u32) {
        self.ps.pages.push(self.page);
    }

    fn collect_bmpf(&mut self, pattern_id: u32, width: u32, height: u32, pattern: &[u8]) {
        self.ps
            .patterns
            .insert(pattern_id, Pattern::new(width, height, pattern.to_vec()));
    }

    fn collect_color_profile(&mut self, profile: &[u8]) {
        if !profile.is_empty() {
            self.ps.color_transforms.set_color_transform(profile);
        }
    }

    fn collect_palette_entry(&mut self, color_id: u32, _user_id: u32, color: &Color) {
        self.ps.document_palette.insert(color_id, *color);
    }

    fn collect_text(
        &mut self,
        text_id: u32,
        style_id: u32,
        data: &[u8],
        char_descriptions: &[u8],
        style_overrides: &BTreeMap<u32, CharacterStyle>,
    ) {
        if data.is_empty() || char_descriptions.is_empty() {
            return;
        }

        let mut default_char_style = CharacterStyle::default();
        self.get_recursed_style(&mut default_char_style, style_id);

        let styled = |description: u8| {
            let mut style = default_char_style.clone();
            if let Some(over) = style_overrides.get(&((description & 0xfe) as u32)) {
                style.override_character_style(over);
            }
            style
        };

        let mut line = TextLine::default();
        let mut tmp_description: u8 = 0;
        let mut tmp_text_data: Vec<u8> = Vec::new();
        let mut j = 0usize;
        for &description in char_descriptions {
            if j >= data.len() {
                break;
            }
            if description != tmp_description {
                let style = styled(tmp_description);
                let mut text = String::new();
                let ok = if tmp_text_data.is_empty() {
                    true
                } else if tmp_description & 0x01 != 0 {
                    append_wide_characters(&mut text, &tmp_text_data)
                } else {
                    append_characters(&mut text, &tmp_text_data, style.char_set)
                };
                // an undecodable run is dropped, the rest of the block continues
                if ok {
                    line.append(TextRun::new(text, style));
                }
                tmp_text_data.clear();
                tmp_description = description;
            }
            tmp_text_data.push(data[j]);
            j += 1;
            if description & 0x01 != 0 {
                if j >= data.len() {
                    break;
                }
                tmp_text_data.push(data[j]);
                j += 1;
            }
        }
        if !tmp_text_data.is_empty() {
            let style = styled(tmp_description);
            let mut text = String::new();
            let ok = if tmp_description & 0x01 != 0 {
                append_wide_characters(&mut text, &tmp_text_data)
            } else {
                append_characters(&mut text, &tmp_text_data, style.char_set)
            };
            if ok {
                log::debug!("collect_text - text: {}", text);
                line.append(TextRun::new(text, style));
            }
        }

        self.ps.texts.entry(text_id).or_default().push(line);
    }

    fn collect_stld(&mut self, id: u32, char_style: &CharacterStyle) {
        self.char_styles.insert(id, char_style.clone());
    }
}
