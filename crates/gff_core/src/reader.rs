use byteorder::{ByteOrder, LittleEndian};

use crate::error::{FormatError, Location, Result};
use crate::layout::SectionId;

/// Bounds-checked little-endian reads over one section of a GFF buffer.
///
/// Offsets are relative to the start of the section. A read that would run
/// past the section fails with [`FormatError::OutOfBounds`] carrying the
/// section, the end offset of the attempted read and the caller's location.
#[derive(Debug, Clone, Copy)]
pub struct LittleEndianReader<'a> {
    section: SectionId,
    bytes: &'a [u8],
    pos: u64,
    location: Location,
}

impl<'a> LittleEndianReader<'a> {
    pub fn new(section: SectionId, bytes: &'a [u8]) -> Self {
        Self {
            section,
            bytes,
            pos: 0,
            location: Location::Header,
        }
    }

    /// Reposition the reader and tag subsequent errors with `location`.
    pub fn at(mut self, offset: u64, location: Location) -> Self {
        self.pos = offset;
        self.location = location;
        self
    }

    pub fn section(&self) -> SectionId {
        self.section
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn seek_to(&mut self, pos: u64) {
        self.pos = pos;
    }

    pub fn read_bytes(&mut self, n: u64) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(FormatError::OutOfBounds {
            section: self.section,
            value: u64::MAX,
            limit: self.len(),
            location: self.location,
        })?;
        if end > self.len() {
            return Err(FormatError::OutOfBounds {
                section: self.section,
                value: end,
                limit: self.len(),
                location: self.location,
            });
        }
        let out = &self.bytes[self.pos as usize..end as usize];
        self.pos = end;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(LittleEndian::read_i64(self.read_bytes(8)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.read_bytes(4)?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.read_bytes(8)?))
    }

    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N]> {
        let mut result = [0f32; N];
        for item in &mut result {
            *item = self.read_f32()?;
        }
        Ok(result)
    }

    /// Read a `u32` count followed by that many `u32` entries.
    ///
    /// The full run is bounds-checked before anything is allocated, so a
    /// hostile count cannot trigger a huge allocation.
    pub fn read_u32_run(&mut self, count: u32) -> Result<Vec<u32>> {
        let raw = self.read_bytes(u64::from(count) * 4)?;
        Ok(raw.chunks_exact(4).map(LittleEndian::read_u32).collect())
    }

    /// Read `n` bytes as text, stopping at the first NUL.
    pub fn read_fixed_string(&mut self, n: u64) -> Result<String> {
        let bytes = self.read_bytes(n)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(decode_text(&bytes[..end]))
    }
}

/// UTF-8 when valid, otherwise each byte taken as its Latin-1 code point.
///
/// Older toolsets wrote Windows-1252 text; the byte-wise fallback keeps every
/// such string readable instead of failing the whole file.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}
