//! Value objects describing the optional sampler (`smpl`) chunk: the MIDI
//! unity note and tuning, an SMPTE offset, and any number of sample loops.
use std::fmt::{Display, Formatter};

#[cfg(feature = "colored")]
use colored::Colorize;

use crate::{WavkitError, WavkitResult};

/// How a sampler plays a loop. Values other than 0, 1 and 2 are manufacturer defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopType {
    Forward,
    Alternating,
    Backward,
    Other(u32),
}

impl From<u32> for LoopType {
    fn from(value: u32) -> Self {
        match value {
            0 => LoopType::Forward,
            1 => LoopType::Alternating,
            2 => LoopType::Backward,
            other => LoopType::Other(other),
        }
    }
}

impl From<LoopType> for u32 {
    fn from(value: LoopType) -> Self {
        match value {
            LoopType::Forward => 0,
            LoopType::Alternating => 1,
            LoopType::Backward => 2,
            LoopType::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerLoop {
    pub id: u32,
    pub loop_type: LoopType,
    pub start_sample_frame: u32,
    pub end_sample_frame: u32,
    /// Fraction of a sample frame at which the loop ends, in `[0, 1)`.
    pub fraction: f64,
    /// Number of times to play the loop; 0 loops forever.
    pub play_count: u32,
}

impl SamplerLoop {
    pub fn new(
        id: u32,
        loop_type: LoopType,
        start_sample_frame: u32,
        end_sample_frame: u32,
        fraction: f64,
        play_count: u32,
    ) -> WavkitResult<Self> {
        if !(0.0..1.0).contains(&fraction) {
            return Err(WavkitError::invalid_format(format!(
                "Invalid loop fraction: {} (must be in [0, 1))",
                fraction
            )));
        }
        Ok(SamplerLoop {
            id,
            loop_type,
            start_sample_frame,
            end_sample_frame,
            fraction,
            play_count,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SmpteTimecode {
    pub hours: i8,
    pub minutes: u8,
    pub seconds: u8,
    pub frame_count: u8,
}

impl SmpteTimecode {
    /// Unpacks the wire layout: hours in the most significant byte, frames in the least.
    pub const fn from_packed(value: u32) -> Self {
        let [frame_count, seconds, minutes, hours] = value.to_le_bytes();
        SmpteTimecode {
            hours: hours as i8,
            minutes,
            seconds,
            frame_count,
        }
    }

    pub const fn to_packed(&self) -> u32 {
        u32::from_le_bytes([self.frame_count, self.seconds, self.minutes, self.hours as u8])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplerInfo {
    pub manufacturer_id: u32,
    pub product_id: u32,
    pub sample_nanoseconds: u32,
    pub midi_note: u32,
    /// Fine tuning above `midi_note`, in cents within `[0, 100)`.
    pub fine_tuning_cents: f64,
    pub smpte_format: u32,
    pub smpte_offset: SmpteTimecode,
    pub loops: Vec<SamplerLoop>,
    pub sampler_specific_data: Vec<u8>,
}

impl SamplerInfo {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        manufacturer_id: u32,
        product_id: u32,
        sample_nanoseconds: u32,
        midi_note: u32,
        fine_tuning_cents: f64,
        smpte_format: u32,
        smpte_offset: SmpteTimecode,
        loops: Vec<SamplerLoop>,
        sampler_specific_data: Vec<u8>,
    ) -> WavkitResult<Self> {
        if !(0.0..100.0).contains(&fine_tuning_cents) {
            return Err(WavkitError::invalid_format(format!(
                "Invalid fine tuning: {} cents (must be in [0, 100))",
                fine_tuning_cents
            )));
        }
        Ok(SamplerInfo {
            manufacturer_id,
            product_id,
            sample_nanoseconds,
            midi_note,
            fine_tuning_cents,
            smpte_format,
            smpte_offset,
            loops,
            sampler_specific_data,
        })
    }
}

#[cfg(feature = "colored")]
impl Display for SamplerInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\n\t{} {}\n\t{} {}\n\t{} {}\n\t{} {}\n\t{} {}",
            "SamplerInfo:".white().bold().underline(),
            "manufacturer_id:".green().bold(),
            self.manufacturer_id.to_string().white(),
            "product_id:".green().bold(),
            self.product_id.to_string().white(),
            "midi_note:".green().bold(),
            self.midi_note.to_string().white(),
            "fine_tuning_cents:".green().bold(),
            self.fine_tuning_cents.to_string().white(),
            "loops:".green().bold(),
            self.loops.len().to_string().white(),
        )
    }
}

#[cfg(not(feature = "colored"))]
impl Display for SamplerInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SamplerInfo: manufacturer_id: {}, product_id: {}, midi_note: {}, fine_tuning_cents: {}, loops: {}",
            self.manufacturer_id,
            self.product_id,
            self.midi_note,
            self.fine_tuning_cents,
            self.loops.len()
        )
    }
}

#[cfg(test)]
mod sampler_tests {
    use super::*;

    #[test]
    fn loop_type_codes() {
        assert_eq!(LoopType::from(0), LoopType::Forward);
        assert_eq!(LoopType::from(1), LoopType::Alternating);
        assert_eq!(LoopType::from(2), LoopType::Backward);
        assert_eq!(LoopType::from(32), LoopType::Other(32));
        assert_eq!(u32::from(LoopType::Other(7)), 7);
    }

    #[test]
    fn loop_fraction_range() {
        assert!(SamplerLoop::new(0, LoopType::Forward, 0, 10, 0.0, 0).is_ok());
        assert!(SamplerLoop::new(0, LoopType::Forward, 0, 10, 0.999, 0).is_ok());
        for bad in [1.0, -0.1, f64::NAN] {
            assert!(matches!(
                SamplerLoop::new(0, LoopType::Forward, 0, 10, bad, 0),
                Err(WavkitError::InvalidFormat(_))
            ));
        }
    }

    #[test]
    fn smpte_packing() {
        let timecode = SmpteTimecode::from_packed(0xFF3B_1E18);
        assert_eq!(
            timecode,
            SmpteTimecode {
                hours: -1,
                minutes: 59,
                seconds: 30,
                frame_count: 24
            }
        );
        assert_eq!(timecode.to_packed(), 0xFF3B_1E18);
    }

    #[test]
    fn fine_tuning_range() {
        let build = |cents| {
            SamplerInfo::new(0, 0, 0, 60, cents, 0, SmpteTimecode::default(), vec![], vec![])
        };
        assert!(build(50.0).is_ok());
        assert!(matches!(build(100.0), Err(WavkitError::InvalidFormat(_))));
        assert!(matches!(build(-1.0), Err(WavkitError::InvalidFormat(_))));
    }
}
