//! The sampler chunk, parsed into a [`SamplerInfo`].
use std::io::{self, ErrorKind, Read};

use crate::chunks::{le_u32, padded, Chunk, ChunkHeader, SMPL};
use crate::sampler::{LoopType, SamplerInfo, SamplerLoop, SmpteTimecode};
use crate::{WavkitError, WavkitResult};

pub const SMPL_CORE_SIZE: u32 = 36;
pub const SMPL_LOOP_SIZE: u32 = 24;

/// Fixed point denominator for the tuning and loop fraction fields.
const FRACTION_SCALE: f64 = 4_294_967_296.0;
const CENTS_PER_SEMITONE: f64 = 100.0;

fn fraction_to_raw(fraction: f64) -> u32 {
    (fraction * FRACTION_SCALE).round().clamp(0.0, u32::MAX as f64) as u32
}

fn raw_to_fraction(raw: u32) -> f64 {
    raw as f64 / FRACTION_SCALE
}

fn read_loop(reader: &mut dyn Read) -> WavkitResult<SamplerLoop> {
    let mut buf = [0u8; SMPL_LOOP_SIZE as usize];
    reader.read_exact(&mut buf)?;
    Ok(SamplerLoop {
        id: le_u32(&buf, 0),
        loop_type: LoopType::from(le_u32(&buf, 4)),
        start_sample_frame: le_u32(&buf, 8),
        end_sample_frame: le_u32(&buf, 12),
        fraction: raw_to_fraction(le_u32(&buf, 16)),
        play_count: le_u32(&buf, 20),
    })
}

impl Chunk for SamplerInfo {
    fn id(&self) -> &[u8; 4] {
        &SMPL
    }

    fn size(&self) -> u32 {
        SMPL_CORE_SIZE
            + SMPL_LOOP_SIZE * self.loops.len() as u32
            + self.sampler_specific_data.len() as u32
    }

    fn as_bytes(&self) -> Box<[u8]> {
        let size = self.size();
        let header = ChunkHeader { id: SMPL, size };
        let mut buf = Vec::with_capacity(8 + padded(size as u64) as usize);
        buf.extend_from_slice(&header.as_bytes());

        let fine_tuning = fraction_to_raw(self.fine_tuning_cents / CENTS_PER_SEMITONE);
        for field in [
            self.manufacturer_id,
            self.product_id,
            self.sample_nanoseconds,
            self.midi_note,
            fine_tuning,
            self.smpte_format,
            self.smpte_offset.to_packed(),
            self.loops.len() as u32,
            self.sampler_specific_data.len() as u32,
        ] {
            buf.extend_from_slice(&field.to_le_bytes());
        }
        for sampler_loop in &self.loops {
            for field in [
                sampler_loop.id,
                u32::from(sampler_loop.loop_type),
                sampler_loop.start_sample_frame,
                sampler_loop.end_sample_frame,
                fraction_to_raw(sampler_loop.fraction),
                sampler_loop.play_count,
            ] {
                buf.extend_from_slice(&field.to_le_bytes());
            }
        }
        buf.extend_from_slice(&self.sampler_specific_data);
        if size % 2 == 1 {
            buf.push(0);
        }
        buf.into_boxed_slice()
    }

    fn from_reader(reader: &mut dyn Read, size: u32) -> WavkitResult<Self> {
        if size < SMPL_CORE_SIZE {
            return Err(WavkitError::invalid_format(format!(
                "Invalid sampler chunk size: {} (must be at least {})",
                size, SMPL_CORE_SIZE
            )));
        }

        let mut core = [0u8; SMPL_CORE_SIZE as usize];
        reader.read_exact(&mut core)?;
        let loop_count = le_u32(&core, 28);
        let data_size = le_u32(&core, 32);

        let required = SMPL_CORE_SIZE as u64
            + SMPL_LOOP_SIZE as u64 * loop_count as u64
            + data_size as u64;
        if required > size as u64 {
            return Err(WavkitError::invalid_format(format!(
                "Invalid sampler chunk: {} loops and {} bytes of sampler data need {} bytes (chunk has {})",
                loop_count, data_size, required, size
            )));
        }

        // counts come from the stream, so storage grows only with what is actually read
        let mut loops = Vec::new();
        for _ in 0..loop_count {
            loops.push(read_loop(reader)?);
        }

        let mut sampler_specific_data = Vec::new();
        Read::take(&mut *reader, data_size as u64).read_to_end(&mut sampler_specific_data)?;
        if sampler_specific_data.len() < data_size as usize {
            return Err(WavkitError::Io(io::Error::new(
                ErrorKind::UnexpectedEof,
                format!(
                    "sampler data is truncated: expected {} bytes, found {}",
                    data_size,
                    sampler_specific_data.len()
                ),
            )));
        }

        Ok(SamplerInfo {
            manufacturer_id: le_u32(&core, 0),
            product_id: le_u32(&core, 4),
            sample_nanoseconds: le_u32(&core, 8),
            midi_note: le_u32(&core, 12),
            fine_tuning_cents: raw_to_fraction(le_u32(&core, 16)) * CENTS_PER_SEMITONE,
            smpte_format: le_u32(&core, 20),
            smpte_offset: SmpteTimecode::from_packed(le_u32(&core, 24)),
            loops,
            sampler_specific_data,
        })
    }
}

#[cfg(test)]
mod smpl_tests {
    use super::*;
    use std::io::Cursor;

    fn sampler_info() -> SamplerInfo {
        SamplerInfo::new(
            0x0100_0041,
            42,
            22_676,
            60,
            50.0,
            25,
            SmpteTimecode {
                hours: -2,
                minutes: 10,
                seconds: 5,
                frame_count: 12,
            },
            vec![
                SamplerLoop::new(0, LoopType::Forward, 100, 2000, 0.0, 0).unwrap(),
                SamplerLoop::new(1, LoopType::Other(40), 5, 9, 0.5, 3).unwrap(),
            ],
            vec![1, 2, 3],
        )
        .unwrap()
    }

    #[test]
    fn every_field_survives_serialization() {
        let info = sampler_info();
        let bytes = info.as_bytes();
        assert_eq!(&bytes[0..4], b"smpl");
        assert_eq!(le_u32(&bytes, 4), 36 + 48 + 3);
        assert_eq!(bytes.len(), 8 + 88);

        let parsed = SamplerInfo::from_reader(&mut Cursor::new(&bytes[8..]), info.size()).unwrap();
        assert_eq!(parsed, info);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let info = sampler_info();
        let mut body = info.as_bytes()[8..8 + info.size() as usize].to_vec();
        body.extend_from_slice(&[0xAA; 5]);
        let parsed = SamplerInfo::from_reader(&mut Cursor::new(&body), body.len() as u32).unwrap();
        assert_eq!(parsed, info);
    }

    #[test]
    fn short_core_is_invalid() {
        let body = [0u8; 20];
        assert!(matches!(
            SamplerInfo::from_reader(&mut Cursor::new(&body), 20),
            Err(WavkitError::InvalidFormat(_))
        ));
    }

    #[test]
    fn declared_sampler_data_missing_from_stream() {
        let mut body = [0u8; 36];
        body[32..36].copy_from_slice(&0xFFFF_FF00u32.to_le_bytes());
        match SamplerInfo::from_reader(&mut Cursor::new(&body), 0xFFFF_FFF0) {
            Err(WavkitError::Io(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("Expected UnexpectedEof, got {:?}", other),
        }

        let mut body = [0u8; 36 + 24];
        body[28..32].copy_from_slice(&0x00FF_FFFFu32.to_le_bytes());
        assert!(SamplerInfo::from_reader(&mut Cursor::new(&body), 0xFFFF_FFF0).is_err());
    }

    #[test]
    fn counts_beyond_the_chunk_are_invalid() {
        let mut loop_overrun = [0u8; 36];
        loop_overrun[28..32].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            SamplerInfo::from_reader(&mut Cursor::new(&loop_overrun), 36),
            Err(WavkitError::InvalidFormat(_))
        ));

        let mut data_overrun = [0u8; 40];
        data_overrun[32..36].copy_from_slice(&5u32.to_le_bytes());
        assert!(matches!(
            SamplerInfo::from_reader(&mut Cursor::new(&data_overrun), 40),
            Err(WavkitError::InvalidFormat(_))
        ));
    }
}
