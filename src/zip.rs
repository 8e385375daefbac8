//! Minimal ZIP reader for wrapped documents.
//!
//! Only the subset the format producer emits is supported: no ZIP64
//! extensions, STORE and DEFLATE compression, entries opened by stored name.
//! The local file header is verified against the central-directory entry
//! before an entry is trusted (general-flag bit 3 tolerated).

use std::io::Read;

use crate::errors::{Error, Result};
use crate::stream::{InternalStream, Seek};

const LOC_FILE_HEADER_SIG: u32 = 0x0403_4b50;
const CDIR_ENTRY_SIG: u32 = 0x0201_4b50;
const CDIR_END_SIG: u32 = 0x0605_4b50;

#[derive(Debug, Default)]
struct LocalFileHeader {
    min_version: u16,
    general_flag: u16,
    compression: u16,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    filename: String,
}

#[derive(Debug, Default)]
struct CentralDirectoryEntry {
    min_version: u16,
    general_flag: u16,
    compression: u16,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    offset: u32,
    filename: String,
}

#[derive(Debug, Default)]
struct CentralDirectoryEnd {
    cdir_size: u32,
    cdir_offset: u32,
}

fn read_central_directory_end(input: &mut InternalStream) -> Result<CentralDirectoryEnd> {
    if input.read_u32(false)? != CDIR_END_SIG {
        return Err(Error::Signature);
    }
    let mut end = CentralDirectoryEnd::default();
    input.seek(6, Seek::Cur); // disk numbers, entry counts
    input.read_u16(false)?; // cdir entries
    end.cdir_size = input.read_u32(false)?;
    end.cdir_offset = input.read_u32(false)?;
    let comment_size = input.read_u16(false)?;
    input.seek(comment_size as i64, Seek::Cur);
    Ok(end)
}

fn read_central_directory_entry(input: &mut InternalStream) -> Result<CentralDirectoryEntry> {
    if input.read_u32(false)? != CDIR_ENTRY_SIG {
        return Err(Error::Signature);
    }
    let mut entry = CentralDirectoryEntry::default();
    input.read_u16(false)?; // creator version
    entry.min_version = input.read_u16(false)?;
    entry.general_flag = input.read_u16(false)?;
    entry.compression = input.read_u16(false)?;
    input.seek(4, Seek::Cur); // lastmod time + date
    entry.crc32 = input.read_u32(false)?;
    entry.compressed_size = input.read_u32(false)?;
    entry.uncompressed_size = input.read_u32(false)?;
    let filename_size = input.read_u16(false)?;
    let extra_field_size = input.read_u16(false)?;
    let file_comment_size = input.read_u16(false)?;
    input.seek(8, Seek::Cur); // disk num, internal + external attrs
    entry.offset = input.read_u32(false)?;
    entry.filename = String::from_utf8_lossy(input.read(filename_size as usize)?).into_owned();
    input.seek(extra_field_size as i64, Seek::Cur);
    input.seek(file_comment_size as i64, Seek::Cur);
    Ok(entry)
}

fn read_local_file_header(input: &mut InternalStream) -> Result<LocalFileHeader> {
    if input.read_u32(false)? != LOC_FILE_HEADER_SIG {
        return Err(Error::Signature);
    }
    let mut header = LocalFileHeader::default();
    header.min_version = input.read_u16(false)?;
    header.general_flag = input.read_u16(false)?;
    header.compression = input.read_u16(false)?;
    input.seek(4, Seek::Cur); // lastmod time + date
    header.crc32 = input.read_u32(false)?;
    header.compressed_size = input.read_u32(false)?;
    header.uncompressed_size = input.read_u32(false)?;
    let filename_size = input.read_u16(false)?;
    let extra_field_size = input.read_u16(false)?;
    header.filename = String::from_utf8_lossy(input.read(filename_size as usize)?).into_owned();
    input.seek(extra_field_size as i64, Seek::Cur);
    Ok(header)
}

fn are_headers_consistent(header: &LocalFileHeader, entry: &CentralDirectoryEntry) -> bool {
    if header.min_version != entry.min_version
        || header.general_flag != entry.general_flag
        || header.compression != entry.compression
    {
        return false;
    }
    // with bit 3 set the local sizes trail the data and carry zeros here
    if header.general_flag & 0x08 == 0
        && (header.crc32 != entry.crc32
            || header.compressed_size != entry.compressed_size
            || header.uncompressed_size != entry.uncompressed_size)
    {
        return false;
    }
    true
}

fn find_central_directory_end(input: &mut InternalStream, offset: usize) -> Option<usize> {
    input.seek(offset as i64, Seek::Set);
    while !input.at_end() {
        let signature = input.read_u32(false).ok()?;
        if signature == CDIR_END_SIG {
            input.seek(-4, Seek::Cur);
            return Some(input.tell());
        }
        input.seek(-3, Seek::Cur);
    }
    None
}

fn find_data_stream(input: &mut InternalStream, name: &str) -> Option<CentralDirectoryEntry> {
    let offset = find_central_directory_end(input, 0)?;
    input.seek(offset as i64, Seek::Set);
    let end = read_central_directory_end(input).ok()?;
    input.seek(end.cdir_offset as i64, Seek::Set);
    let cdir_limit = (end.cdir_offset + end.cdir_size) as usize;
    let mut entry = CentralDirectoryEntry::default();
    while !input.at_end() && input.tell() < cdir_limit {
        entry = read_central_directory_entry(input).ok()?;
        if entry.filename == name {
            break;
        }
    }
    if entry.filename != name {
        return None;
    }
    input.seek(entry.offset as i64, Seek::Set);
    let header = read_local_file_header(input).ok()?;
    if !are_headers_consistent(&header, &entry) {
        return None;
    }
    Some(entry)
}

/// Does the input carry a readable ZIP central directory with at least one
/// consistent entry?
pub fn is_zip_stream(input: &mut InternalStream) -> bool {
    let Some(offset) = find_central_directory_end(input, 0) else {
        return false;
    };
    input.seek(offset as i64, Seek::Set);
    let Ok(end) = read_central_directory_end(input) else {
        return false;
    };
    input.seek(end.cdir_offset as i64, Seek::Set);
    let Ok(entry) = read_central_directory_entry(input) else {
        return false;
    };
    input.seek(entry.offset as i64, Seek::Set);
    match read_local_file_header(input) {
        Ok(header) => are_headers_consistent(&header, &entry),
        Err(_) => false,
    }
}

/// Opens the entry stored under `name` as a fresh substream, inflating a
/// DEFLATE body where needed. Returns `None` on any inconsistency.
pub fn get_substream(input: &mut InternalStream, name: &str) -> Option<InternalStream> {
    let entry = find_data_stream(input, name)?;
    // the local header has been read; the file data starts here
    if entry.compression == 0 {
        let data = input.read(entry.compressed_size as usize).ok()?;
        return Some(InternalStream::from_slice(data));
    }
    let compressed = input.read(entry.compressed_size as usize).ok()?;
    let mut data = Vec::with_capacity(entry.uncompressed_size as usize);
    match flate2::read::DeflateDecoder::new(compressed).read_to_end(&mut data) {
        Ok(_) => Some(InternalStream::new(data)),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Hand-built STORE-only archive with a single entry "doc".
    fn build_store_zip(name: &str, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let local_offset = out.len() as u32;
        out.extend_from_slice(&LOC_FILE_HEADER_SIG.to_le_bytes());
        out.extend_from_slice(&10u16.to_le_bytes()); // min version
        out.extend_from_slice(&0u16.to_le_bytes()); // general flag
        out.extend_from_slice(&0u16.to_le_bytes()); // STORE
        out.extend_from_slice(&[0; 4]); // lastmod
        out.extend_from_slice(&0xdead_beefu32.to_le_bytes()); // crc (unchecked)
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(payload);

        let cdir_offset = out.len() as u32;
        out.extend_from_slice(&CDIR_ENTRY_SIG.to_le_bytes());
        out.extend_from_slice(&20u16.to_le_bytes()); // creator
        out.extend_from_slice(&10u16.to_le_bytes()); // min version
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&0xdead_beefu32.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&[0; 8]);
        out.extend_from_slice(&local_offset.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        let cdir_size = out.len() as u32 - cdir_offset;

        out.extend_from_slice(&CDIR_END_SIG.to_le_bytes());
        out.extend_from_slice(&[0; 6]);
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&cdir_size.to_le_bytes());
        out.extend_from_slice(&cdir_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    #[test]
    fn test_store_entry_roundtrip() {
        let archive = build_store_zip("content/main.dat", b"RIFFdata");
        let mut input = InternalStream::new(archive);
        assert!(is_zip_stream(&mut input));
        let mut sub = get_substream(&mut input, "content/main.dat").unwrap();
        assert_eq!(b"RIFFdata".as_slice(), sub.read(8).unwrap());
        assert!(get_substream(&mut input, "no/such/entry").is_none());
    }

    #[test]
    fn test_not_a_zip() {
        let mut input = InternalStream::from_slice(b"RIFF\x04\x00\x00\x00CDRA");
        assert!(!is_zip_stream(&mut input));
    }
}
