//! The format chunk: parsing into an [`UnvalidatedFormat`] and serializing a [`Format`].
use std::io::Read;

use crate::chunks::{le_u16, le_u32, Chunk, ChunkHeader, FMT};
use crate::format::{Format, UnvalidatedFormat};
use crate::wav_type::FormatCode;
use crate::{WavkitError, WavkitResult};

pub const FMT_SIZE_BASE_SIZE: usize = 16; // Standard wav file format size
pub const FMT_CB_SIZE: usize = 18; // Base size plus the extension size field
pub const FMT_SIZE_EXTENDED_SIZE: usize = 40; // CB_SIZE + 22 (2 bytes valid_bits_per_sample, 4 byte channel_mask, 16 byte sub_format)
pub const EXTENSIBLE_EXTENSION_SIZE: usize = FMT_SIZE_EXTENDED_SIZE - FMT_CB_SIZE;

/// Bytes 2..16 of every sub-format GUID this crate reads or writes.
pub const EXTENDED_FMT_GUID: [u8; 14] =
    *b"\x00\x00\x00\x00\x10\x00\x80\x00\x00\xAA\x00\x38\x9B\x71";

/// Builds the sub-format GUID for a format code.
pub fn sub_format_guid(code: u16) -> [u8; 16] {
    let mut guid = [0u8; 16];
    guid[0..2].copy_from_slice(&code.to_le_bytes());
    guid[2..16].copy_from_slice(&EXTENDED_FMT_GUID);
    guid
}

impl UnvalidatedFormat {
    /// The wire fields for writing `format`. Formats with a speaker mapping use the
    /// extensible layout so the channel mask is recorded.
    pub fn from_format(format: &Format) -> WavkitResult<Self> {
        let block_align = u16::try_from(format.block_align()).map_err(|_| {
            WavkitError::invalid_format(format!(
                "Invalid block align: {} (must be at most {} to be written)",
                format.block_align(),
                u16::MAX
            ))
        })?;
        let byte_rate = u32::try_from(format.byte_rate()).map_err(|_| {
            WavkitError::invalid_format(format!(
                "Invalid byte rate: {} (must be at most {} to be written)",
                format.byte_rate(),
                u32::MAX
            ))
        })?;

        let code = format.sample_format().format_code();
        let base = UnvalidatedFormat {
            audio_format: code.as_u16(),
            channels: format.channels(),
            sample_rate: format.sample_rate(),
            byte_rate,
            block_align,
            bits_per_sample: format.bits_per_sample(),
            ..Default::default()
        };

        Ok(match format.speaker_mapping() {
            Some(_) => UnvalidatedFormat {
                audio_format: FormatCode::WAVE_FORMAT_EXTENSIBLE.as_u16(),
                sub_audio_format: Some(code.as_u16()),
                sub_format_guid: Some(sub_format_guid(code.as_u16())),
                valid_bits_per_sample: Some(format.bits_per_sample()),
                channel_mask: Some(format.channel_mask()),
                ..base
            },
            None => base,
        })
    }

    fn writes_extension(&self) -> bool {
        self.is_extensible() && self.sub_audio_format.is_some()
    }
}

impl Chunk for UnvalidatedFormat {
    fn id(&self) -> &[u8; 4] {
        &FMT
    }

    fn size(&self) -> u32 {
        match self.writes_extension() {
            true => FMT_SIZE_EXTENDED_SIZE as u32,
            false => FMT_SIZE_BASE_SIZE as u32,
        }
    }

    fn as_bytes(&self) -> Box<[u8]> {
        let header = ChunkHeader {
            id: FMT,
            size: self.size(),
        };
        let mut buf = Vec::with_capacity(8 + self.size() as usize);
        buf.extend_from_slice(&header.as_bytes());
        buf.extend_from_slice(&self.audio_format.to_le_bytes());
        buf.extend_from_slice(&self.channels.to_le_bytes());
        buf.extend_from_slice(&self.sample_rate.to_le_bytes());
        buf.extend_from_slice(&self.byte_rate.to_le_bytes());
        buf.extend_from_slice(&self.block_align.to_le_bytes());
        buf.extend_from_slice(&self.bits_per_sample.to_le_bytes());

        if self.writes_extension() {
            let code = self.sub_audio_format.unwrap_or_default();
            let guid = self
                .sub_format_guid
                .unwrap_or_else(|| sub_format_guid(code));
            buf.extend_from_slice(&(EXTENSIBLE_EXTENSION_SIZE as u16).to_le_bytes());
            buf.extend_from_slice(
                &self
                    .valid_bits_per_sample
                    .unwrap_or(self.bits_per_sample)
                    .to_le_bytes(),
            );
            buf.extend_from_slice(&self.channel_mask.unwrap_or_default().to_le_bytes());
            buf.extend_from_slice(&guid);
        }
        buf.into_boxed_slice()
    }

    fn from_reader(reader: &mut dyn Read, size: u32) -> WavkitResult<Self> {
        if (size as usize) < FMT_SIZE_BASE_SIZE {
            return Err(WavkitError::invalid_format(format!(
                "Invalid format chunk size: {} (must be at least {})",
                size, FMT_SIZE_BASE_SIZE
            )));
        }

        let mut base = [0u8; FMT_SIZE_BASE_SIZE];
        reader.read_exact(&mut base)?;
        let mut format = UnvalidatedFormat {
            audio_format: le_u16(&base, 0),
            channels: le_u16(&base, 2),
            sample_rate: le_u32(&base, 4),
            byte_rate: le_u32(&base, 8),
            block_align: le_u16(&base, 12),
            bits_per_sample: le_u16(&base, 14),
            ..Default::default()
        };

        if size as usize == FMT_SIZE_BASE_SIZE {
            return Ok(format);
        }
        if (size as usize) < FMT_CB_SIZE {
            return Err(WavkitError::invalid_format(format!(
                "Invalid format chunk size: {} (an extension needs at least {} bytes)",
                size, FMT_CB_SIZE
            )));
        }

        let mut cb_size = [0u8; 2];
        reader.read_exact(&mut cb_size)?;
        let extension_size = u16::from_le_bytes(cb_size) as u32;
        if extension_size != size - FMT_CB_SIZE as u32 {
            return Err(WavkitError::invalid_format(format!(
                "Invalid format extension size: {} (chunk leaves {} bytes)",
                extension_size,
                size - FMT_CB_SIZE as u32
            )));
        }

        let mut extension = vec![0u8; extension_size as usize];
        reader.read_exact(&mut extension)?;

        if format.is_extensible() && !extension.is_empty() {
            if extension.len() < EXTENSIBLE_EXTENSION_SIZE {
                return Err(WavkitError::invalid_format(format!(
                    "Invalid extensible format extension size: {} (must be at least {})",
                    extension.len(),
                    EXTENSIBLE_EXTENSION_SIZE
                )));
            }
            let mut guid = [0u8; 16];
            guid.copy_from_slice(&extension[6..22]);
            format.valid_bits_per_sample = Some(le_u16(&extension, 0));
            format.channel_mask = Some(le_u32(&extension, 2));
            format.sub_audio_format = Some(le_u16(&guid, 0));
            format.sub_format_guid = Some(guid);
        }

        Ok(format)
    }
}
