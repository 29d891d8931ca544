//! Contains the FactChunk struct and its implementation.
use std::fmt::{Display, Formatter};
use std::io::Read;

#[cfg(feature = "colored")]
use colored::Colorize;

use crate::chunks::{Chunk, FACT};
use crate::{WavkitError, WavkitResult};

pub const FACT_SIZE: u32 = 4;

/// The fact chunk of a wav file. Contains a single field, ``num_sample_frames``, the number of sample frames in the data chunk.
/// Written alongside non-PCM data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FactChunk {
    pub num_sample_frames: u32,
}

impl FactChunk {
    /// Creates a new FactChunk with the given number of sample frames.
    pub fn new(num_sample_frames: u32) -> Self {
        Self { num_sample_frames }
    }
}

impl Chunk for FactChunk {
    fn id(&self) -> &[u8; 4] {
        &FACT
    }

    fn size(&self) -> u32 {
        FACT_SIZE
    }

    fn as_bytes(&self) -> Box<[u8]> {
        let mut buf = [0; 12];
        buf[0..4].copy_from_slice(&FACT);
        buf[4..8].copy_from_slice(&FACT_SIZE.to_le_bytes());
        buf[8..12].copy_from_slice(&self.num_sample_frames.to_le_bytes());
        Box::new(buf)
    }

    fn from_reader(reader: &mut dyn Read, size: u32) -> WavkitResult<Self> {
        if size < FACT_SIZE {
            return Err(WavkitError::invalid_format(format!(
                "Invalid fact chunk size: {} (must be at least {})",
                size, FACT_SIZE
            )));
        }
        let mut buf = [0; 4];
        reader.read_exact(&mut buf)?;
        Ok(FactChunk::new(u32::from_le_bytes(buf)))
    }
}

#[cfg(feature = "colored")]
impl Display for FactChunk {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\n\t{} {}",
            "FactChunk: ".white().bold().underline(),
            "num_sample_frames:".green().bold(),
            self.num_sample_frames.to_string().white()
        )
    }
}

#[cfg(not(feature = "colored"))]
impl Display for FactChunk {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "FactChunk: num_sample_frames: {}", self.num_sample_frames)
    }
}

#[cfg(test)]
mod fact_tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_as_bytes() {
        let fact_bytes = FactChunk::new(10).as_bytes();
        assert_eq!(&fact_bytes[..], b"fact\x04\x00\x00\x00\x0a\x00\x00\x00");
    }

    #[test]
    fn test_from_reader() {
        let fact = FactChunk::from_reader(&mut Cursor::new([0x10, 0x27, 0, 0]), 4).unwrap();
        assert_eq!(fact.num_sample_frames, 10_000);
        assert!(matches!(
            FactChunk::from_reader(&mut Cursor::new([0, 0]), 2),
            Err(WavkitError::InvalidFormat(_))
        ));
    }
}
