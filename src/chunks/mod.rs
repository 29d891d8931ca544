pub mod data;
pub mod fact;
pub mod fmt;
pub mod smpl;

use std::fmt::Display;
use std::io::{ErrorKind, Read, SeekFrom};

pub use crate::chunks::fact::FactChunk;
use crate::{ReadSeek, WavkitResult};

// 100% necessary to have these chunks
pub const RIFF: [u8; 4] = *b"RIFF";
pub const WAVE: [u8; 4] = *b"WAVE";
pub const DATA: [u8; 4] = *b"data";
pub const FMT: [u8; 4] = *b"fmt ";

// Optional chunks
pub const FACT: [u8; 4] = *b"fact";
pub const SMPL: [u8; 4] = *b"smpl";

/// Size of a chunk header: 4 byte tag and 4 byte little-endian length.
pub const CHUNK_HEADER_SIZE: u64 = 8;

/// A chunk that can be parsed from its body and serialized with its header.
pub trait Chunk: Display {
    fn id(&self) -> &[u8; 4];
    /// Body length in bytes, excluding the header and any pad byte.
    fn size(&self) -> u32;
    /// The full chunk: header, body and a pad byte if the body length is odd.
    fn as_bytes(&self) -> Box<[u8]>;
    /// Parses the body of a chunk whose header declared `size` bytes. `reader` is limited
    /// to those bytes.
    fn from_reader(reader: &mut dyn Read, size: u32) -> WavkitResult<Self>
    where
        Self: Sized;
}

/// The kinds of chunk the traversal acts on. Everything else is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Format,
    Data,
    Sampler,
    Other,
}

impl ChunkKind {
    pub fn from_id(id: &[u8; 4]) -> Self {
        match id {
            &FMT => ChunkKind::Format,
            &DATA => ChunkKind::Data,
            &SMPL => ChunkKind::Sampler,
            _ => ChunkKind::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: [u8; 4],
    pub size: u32,
}

impl ChunkHeader {
    pub fn kind(&self) -> ChunkKind {
        ChunkKind::from_id(&self.id)
    }

    /// Body length including the pad byte that follows odd-sized bodies.
    pub fn padded_size(&self) -> u64 {
        padded(self.size as u64)
    }

    pub fn as_bytes(&self) -> [u8; 8] {
        let mut buf = [0; 8];
        buf[0..4].copy_from_slice(&self.id);
        buf[4..8].copy_from_slice(&self.size.to_le_bytes());
        buf
    }
}

impl Display for ChunkHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} ({} bytes)",
            String::from_utf8_lossy(&self.id),
            self.size
        )
    }
}

#[inline(always)]
pub const fn padded(size: u64) -> u64 {
    size + (size & 1)
}

/// Fills `buf` unless the stream ends first. Returns false on a short read.
pub(crate) fn read_fully(reader: &mut dyn Read, buf: &mut [u8]) -> WavkitResult<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Ok(false),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Reads the next chunk header, or `None` if the stream ends before a full header.
pub fn read_chunk_header(reader: &mut dyn Read) -> WavkitResult<Option<ChunkHeader>> {
    let mut buf = [0u8; 8];
    if !read_fully(reader, &mut buf)? {
        return Ok(None);
    }
    let mut id = [0u8; 4];
    id.copy_from_slice(&buf[0..4]);
    let size = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    Ok(Some(ChunkHeader { id, size }))
}

/// Parses a chunk body starting at the current position and leaves the stream after
/// the body and its pad byte, however much of the body the parser consumed.
pub fn read_chunk<T: Chunk>(reader: &mut dyn ReadSeek, header: &ChunkHeader) -> WavkitResult<T> {
    let body_start = reader.stream_position()?;
    let chunk = {
        let mut body = Read::take(&mut *reader, header.size as u64);
        T::from_reader(&mut body, header.size)?
    };
    reader.seek(SeekFrom::Start(body_start + header.padded_size()))?;
    Ok(chunk)
}

/// Skips a chunk body and its pad byte.
pub fn skip_chunk(reader: &mut dyn ReadSeek, header: &ChunkHeader) -> WavkitResult<()> {
    reader.seek(SeekFrom::Current(header.padded_size() as i64))?;
    Ok(())
}

/// Reads a little-endian u16 at `offset` in `buf`.
#[inline(always)]
pub(crate) fn le_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

/// Reads a little-endian u32 at `offset` in `buf`.
#[inline(always)]
pub(crate) fn le_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}
