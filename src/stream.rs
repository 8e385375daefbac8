//! Byte-level input: endian-aware readers over an in-memory, seekable view.
//!
//! Every parser in this crate works against [`InternalStream`], which wraps
//! either caller-supplied bytes or the inflated body of a DEFLATE-compressed
//! slice of its parent stream. Reads past the end fail with
//! [`Error::EndOfStream`](crate::Error::EndOfStream) and abort the current
//! chunk only; the walkers recover at the next chunk boundary.

use std::io::Read;

use crate::errors::{Error, Result};

/// Seek origin, mirroring the usual SET / CUR / END triple.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Seek {
    Set,
    Cur,
    End,
}

/// Four ASCII bytes packed little-endian, as they appear on disk.
pub const fn fourcc(tag: &[u8; 4]) -> u32 {
    (tag[0] as u32) | ((tag[1] as u32) << 8) | ((tag[2] as u32) << 16) | ((tag[3] as u32) << 24)
}

/// Printable form of a fourCC for trace output.
pub fn fourcc_str(value: u32) -> String {
    value
        .to_le_bytes()
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
        .collect()
}

/// Random-access view over a byte buffer.
#[derive(Debug, Clone, Default)]
pub struct InternalStream {
    buffer: Vec<u8>,
    offset: usize,
}

impl InternalStream {
    pub fn new(buffer: Vec<u8>) -> Self {
        InternalStream { buffer, offset: 0 }
    }

    pub fn from_slice(data: &[u8]) -> Self {
        InternalStream::new(data.to_vec())
    }

    /// Captures `size` bytes of `input` as a new substream. With
    /// `compressed`, the bytes are a zlib-wrapped DEFLATE body; inflation
    /// failure yields an empty substream and the caller skips the chunk.
    pub fn substream(input: &mut InternalStream, size: usize, compressed: bool) -> Self {
        let raw = match input.read(size) {
            Ok(b) => b.to_vec(),
            Err(_) => return InternalStream::default(),
        };
        if !compressed {
            return InternalStream::new(raw);
        }
        let mut inflated = Vec::new();
        match flate2::read::ZlibDecoder::new(raw.as_slice()).read_to_end(&mut inflated) {
            Ok(_) => InternalStream::new(inflated),
            Err(_) => {
                log::warn!("discarding undecodable compressed substream ({} bytes)", size);
                InternalStream::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn tell(&self) -> usize {
        self.offset
    }

    pub fn at_end(&self) -> bool {
        self.offset >= self.buffer.len()
    }

    /// Repositions the stream. The offset is clamped into the buffer; a
    /// clamped seek reports `false` but leaves the stream usable.
    pub fn seek(&mut self, offset: i64, whence: Seek) -> bool {
        let base = match whence {
            Seek::Set => 0i64,
            Seek::Cur => self.offset as i64,
            Seek::End => self.buffer.len() as i64,
        };
        let target = base + offset;
        if target < 0 {
            self.offset = 0;
            return false;
        }
        if target as usize > self.buffer.len() {
            self.offset = self.buffer.len();
            return false;
        }
        self.offset = target as usize;
        true
    }

    /// Borrows the next `num_bytes` bytes and advances past them.
    pub fn read(&mut self, num_bytes: usize) -> Result<&[u8]> {
        if self.offset + num_bytes > self.buffer.len() {
            return Err(Error::EndOfStream);
        }
        let slice = &self.buffer[self.offset..self.offset + num_bytes];
        self.offset += num_bytes;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read(1)?[0])
    }

    pub fn read_u16(&mut self, big_endian: bool) -> Result<u16> {
        let p = self.read(2)?;
        if big_endian {
            Ok(u16::from_be_bytes([p[0], p[1]]))
        } else {
            Ok(u16::from_le_bytes([p[0], p[1]]))
        }
    }

    pub fn read_u32(&mut self, big_endian: bool) -> Result<u32> {
        let p = self.read(4)?;
        if big_endian {
            Ok(u32::from_be_bytes([p[0], p[1], p[2], p[3]]))
        } else {
            Ok(u32::from_le_bytes([p[0], p[1], p[2], p[3]]))
        }
    }

    pub fn read_u64(&mut self, big_endian: bool) -> Result<u64> {
        let p = self.read(8)?;
        let mut b = [0u8; 8];
        b.copy_from_slice(p);
        if big_endian {
            Ok(u64::from_be_bytes(b))
        } else {
            Ok(u64::from_le_bytes(b))
        }
    }

    pub fn read_s16(&mut self, big_endian: bool) -> Result<i16> {
        Ok(self.read_u16(big_endian)? as i16)
    }

    pub fn read_s32(&mut self, big_endian: bool) -> Result<i32> {
        Ok(self.read_u32(big_endian)? as i32)
    }

    /// Little- or big-endian IEEE-754 double.
    pub fn read_double(&mut self, big_endian: bool) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64(big_endian)?))
    }

    pub fn read_fourcc(&mut self) -> Result<u32> {
        self.read_u32(false)
    }
}
