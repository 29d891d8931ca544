//! The audio encoding descriptors: the validated [`Format`] used to decode and encode
//! samples, and the [`UnvalidatedFormat`] read verbatim from a format chunk.
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[cfg(feature = "colored")]
use colored::Colorize;

use crate::wav_type::{FormatCode, SampleFormat};
use crate::{WavkitError, WavkitResult};

pub const MIN_CHANNELS: u32 = 1;
pub const MAX_CHANNELS: u32 = u16::MAX as u32;
pub const MIN_SAMPLE_RATE: u32 = 1;
pub const MAX_SAMPLE_RATE: u32 = u32::MAX;

/// Channel count accepted when constructing a [`Format`]. `Mono` and `Stereo` are
/// shorthands for 1 and 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    Mono,
    Stereo,
    Count(u32),
}

impl Channels {
    pub const fn count(&self) -> u32 {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
            Channels::Count(n) => *n,
        }
    }
}

impl From<u32> for Channels {
    fn from(value: u32) -> Self {
        Channels::Count(value)
    }
}

impl FromStr for Channels {
    type Err = WavkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mono" => Ok(Channels::Mono),
            "stereo" => Ok(Channels::Stereo),
            _ => s.parse::<u32>().map(Channels::Count).map_err(|_| {
                WavkitError::invalid_format(format!(
                    "Invalid channels: {:?} (must be \"mono\", \"stereo\" or an integer between {} and {})",
                    s, MIN_CHANNELS, MAX_CHANNELS
                ))
            }),
        }
    }
}

/// Speaker positions of the extensible format, in channel mask bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Speaker {
    FrontLeft,
    FrontRight,
    FrontCenter,
    LowFrequency,
    BackLeft,
    BackRight,
    FrontLeftOfCenter,
    FrontRightOfCenter,
    BackCenter,
    SideLeft,
    SideRight,
    TopCenter,
    TopFrontLeft,
    TopFrontCenter,
    TopFrontRight,
    TopBackLeft,
    TopBackCenter,
    TopBackRight,
}

impl Speaker {
    pub const ALL: [Speaker; 18] = [
        Speaker::FrontLeft,
        Speaker::FrontRight,
        Speaker::FrontCenter,
        Speaker::LowFrequency,
        Speaker::BackLeft,
        Speaker::BackRight,
        Speaker::FrontLeftOfCenter,
        Speaker::FrontRightOfCenter,
        Speaker::BackCenter,
        Speaker::SideLeft,
        Speaker::SideRight,
        Speaker::TopCenter,
        Speaker::TopFrontLeft,
        Speaker::TopFrontCenter,
        Speaker::TopFrontRight,
        Speaker::TopBackLeft,
        Speaker::TopBackCenter,
        Speaker::TopBackRight,
    ];

    /// Position in the canonical ordering, which is also the channel mask bit.
    pub const fn index(&self) -> u32 {
        *self as u32
    }

    pub const fn mask_bit(&self) -> u32 {
        1 << self.index()
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Speaker::FrontLeft => "front_left",
            Speaker::FrontRight => "front_right",
            Speaker::FrontCenter => "front_center",
            Speaker::LowFrequency => "low_frequency",
            Speaker::BackLeft => "back_left",
            Speaker::BackRight => "back_right",
            Speaker::FrontLeftOfCenter => "front_left_of_center",
            Speaker::FrontRightOfCenter => "front_right_of_center",
            Speaker::BackCenter => "back_center",
            Speaker::SideLeft => "side_left",
            Speaker::SideRight => "side_right",
            Speaker::TopCenter => "top_center",
            Speaker::TopFrontLeft => "top_front_left",
            Speaker::TopFrontCenter => "top_front_center",
            Speaker::TopFrontRight => "top_front_right",
            Speaker::TopBackLeft => "top_back_left",
            Speaker::TopBackCenter => "top_back_center",
            Speaker::TopBackRight => "top_back_right",
        }
    }

    /// Speakers whose bits are set in `mask`, in canonical order. Reserved bits are ignored.
    pub fn from_channel_mask(mask: u32) -> Vec<Speaker> {
        Speaker::ALL
            .iter()
            .copied()
            .filter(|speaker| mask & speaker.mask_bit() != 0)
            .collect()
    }
}

impl Display for Speaker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Speaker {
    type Err = WavkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Speaker::ALL
            .iter()
            .copied()
            .find(|speaker| speaker.name() == s)
            .ok_or_else(|| WavkitError::invalid_format(format!("Invalid speaker: {:?}", s)))
    }
}

/// A validated audio encoding. Block align and byte rate are always derived from the
/// channel count, sample format and sample rate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Format {
    channels: u16,
    sample_format: SampleFormat,
    sample_rate: u32,
    speaker_mapping: Option<Box<[Speaker]>>,
}

impl Format {
    /// Constructs a new Format, validating the channel count and sample rate.
    pub fn new<C: Into<Channels>>(
        channels: C,
        sample_format: SampleFormat,
        sample_rate: u32,
    ) -> WavkitResult<Self> {
        let channels = channels.into().count();
        if !(MIN_CHANNELS..=MAX_CHANNELS).contains(&channels) {
            return Err(WavkitError::invalid_format(format!(
                "Invalid channels: {} (must be between {} and {})",
                channels, MIN_CHANNELS, MAX_CHANNELS
            )));
        }
        if sample_rate < MIN_SAMPLE_RATE {
            return Err(WavkitError::invalid_format(format!(
                "Invalid sample rate: {} (must be between {} and {})",
                sample_rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
            )));
        }

        Ok(Format {
            channels: channels as u16,
            sample_format,
            sample_rate,
            speaker_mapping: None,
        })
    }

    /// Returns a copy of this Format carrying the given speaker mapping.
    ///
    /// The mapping may be shorter than the channel count, but speakers must be unique
    /// and listed in canonical order (front left, front right, front center, ...).
    pub fn with_speaker_mapping<I>(&self, speakers: I) -> WavkitResult<Self>
    where
        I: IntoIterator<Item = Speaker>,
    {
        let speakers: Vec<Speaker> = speakers.into_iter().collect();
        if speakers.len() > self.channels as usize {
            return Err(WavkitError::invalid_format(format!(
                "Invalid speaker mapping: {} speakers given for {} channels (must be at most the channel count)",
                speakers.len(),
                self.channels
            )));
        }
        for pair in speakers.windows(2) {
            if pair[0] == pair[1] {
                return Err(WavkitError::invalid_format(format!(
                    "Invalid speaker mapping: {} appears more than once",
                    pair[0]
                )));
            }
            if pair[0] > pair[1] {
                return Err(WavkitError::invalid_format(format!(
                    "Invalid speaker mapping: {} must come before {}",
                    pair[1], pair[0]
                )));
            }
        }

        Ok(Format {
            speaker_mapping: Some(speakers.into_boxed_slice()),
            ..self.clone()
        })
    }

    /// Same as [`Format::with_speaker_mapping`], with speakers given by name.
    pub fn with_speaker_names(&self, names: &[&str]) -> WavkitResult<Self> {
        let speakers = names
            .iter()
            .map(|name| name.parse::<Speaker>())
            .collect::<WavkitResult<Vec<Speaker>>>()?;
        self.with_speaker_mapping(speakers)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.sample_format
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.sample_format.bits_per_sample()
    }

    pub fn bytes_per_sample(&self) -> u16 {
        self.sample_format.bytes_per_sample()
    }

    /// Bytes in one sample frame.
    pub fn block_align(&self) -> u32 {
        self.bytes_per_sample() as u32 * self.channels as u32
    }

    /// Bytes of sample data per second.
    pub fn byte_rate(&self) -> u64 {
        self.block_align() as u64 * self.sample_rate as u64
    }

    pub fn speaker_mapping(&self) -> Option<&[Speaker]> {
        self.speaker_mapping.as_deref()
    }

    /// The extensible-format channel mask for the speaker mapping, 0 when there is none.
    pub fn channel_mask(&self) -> u32 {
        self.speaker_mapping()
            .unwrap_or_default()
            .iter()
            .fold(0, |mask, speaker| mask | speaker.mask_bit())
    }
}

#[cfg(feature = "colored")]
impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\n\t{} {}\n\t{} {}\n\t{} {}\n\t{} {}\n\t{} {}",
            "Format:".white().bold().underline(),
            "channels:".green().bold(),
            self.channels.to_string().white(),
            "sample_format:".green().bold(),
            self.sample_format.to_string().white(),
            "sample_rate:".green().bold(),
            self.sample_rate.to_string().white(),
            "block_align:".green().bold(),
            self.block_align().to_string().white(),
            "byte_rate:".green().bold(),
            self.byte_rate().to_string().white(),
        )?;
        if let Some(mapping) = self.speaker_mapping() {
            let names: Vec<&str> = mapping.iter().map(|speaker| speaker.name()).collect();
            write!(f, "\n\t{} {}", "speakers:".green().bold(), names.join(", ").white())?;
        }
        Ok(())
    }
}

#[cfg(not(feature = "colored"))]
impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Format: channels: {}, sample_format: {}, sample_rate: {}, block_align: {}, byte_rate: {}",
            self.channels,
            self.sample_format,
            self.sample_rate,
            self.block_align(),
            self.byte_rate()
        )?;
        if let Some(mapping) = self.speaker_mapping() {
            let names: Vec<&str> = mapping.iter().map(|speaker| speaker.name()).collect();
            write!(f, ", speakers: {}", names.join(", "))?;
        }
        Ok(())
    }
}

/// The fields of a format chunk exactly as they appear on the wire. May describe an
/// encoding this crate cannot decode; see [`UnvalidatedFormat::to_validated_format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnvalidatedFormat {
    pub audio_format: u16,
    /// Leading code of the sub-format GUID, only for extensible format chunks.
    pub sub_audio_format: Option<u16>,
    pub sub_format_guid: Option<[u8; 16]>,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub valid_bits_per_sample: Option<u16>,
    pub channel_mask: Option<u32>,
}

impl UnvalidatedFormat {
    pub fn is_extensible(&self) -> bool {
        self.audio_format == FormatCode::WAVE_FORMAT_EXTENSIBLE.as_u16()
    }

    /// The code that actually identifies the encoding: the sub-format for extensible
    /// chunks, the audio format otherwise.
    pub fn effective_format_code(&self) -> Option<u16> {
        match self.is_extensible() {
            true => self.sub_audio_format,
            false => Some(self.audio_format),
        }
    }

    /// Speakers named by the channel mask, truncated to the channel count.
    pub fn speaker_mapping(&self) -> Option<Vec<Speaker>> {
        let mask = self.channel_mask?;
        let mut speakers = Speaker::from_channel_mask(mask);
        speakers.truncate(self.channels as usize);
        Some(speakers)
    }

    /// Canonicalizes the raw fields into a [`Format`]. Fails with
    /// [`WavkitError::UnsupportedFormat`] when the encoding cannot be decoded.
    pub fn to_validated_format(&self) -> WavkitResult<Format> {
        let code = self.effective_format_code().ok_or_else(|| {
            WavkitError::unsupported_format("Extensible format chunk without a sub-format")
        })?;
        let sample_format = SampleFormat::try_from((code, self.bits_per_sample))?;

        if let Some(valid_bits) = self.valid_bits_per_sample {
            if valid_bits != 0 && valid_bits != self.bits_per_sample {
                return Err(WavkitError::unsupported_format(format!(
                    "Unsupported valid bits per sample {} in a {} bit container",
                    valid_bits, self.bits_per_sample
                )));
            }
        }

        let format = Format::new(self.channels as u32, sample_format, self.sample_rate)
            .map_err(|e| WavkitError::unsupported_format(e.to_string()))?;

        if format.block_align() != self.block_align as u32 {
            return Err(WavkitError::unsupported_format(format!(
                "Block align {} does not match expected {} (channels {} * bytes_per_sample {})",
                self.block_align,
                format.block_align(),
                self.channels,
                format.bytes_per_sample()
            )));
        }

        match self.speaker_mapping() {
            Some(speakers) if !speakers.is_empty() => format.with_speaker_mapping(speakers),
            _ => Ok(format),
        }
    }
}

#[cfg(feature = "colored")]
impl Display for UnvalidatedFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let code = match self.effective_format_code() {
            Some(code) => format!("{:#06x}", code),
            None => "none".to_string(),
        };
        write!(
            f,
            "{}\n\t{} {:#06x}\n\t{} {}\n\t{} {}\n\t{} {}\n\t{} {}\n\t{} {}\n\t{} {}",
            "UnvalidatedFormat:".white().bold().underline(),
            "audio_format:".green().bold(),
            self.audio_format,
            "effective_code:".green().bold(),
            code.white(),
            "channels:".green().bold(),
            self.channels.to_string().white(),
            "sample_rate:".green().bold(),
            self.sample_rate.to_string().white(),
            "byte_rate:".green().bold(),
            self.byte_rate.to_string().white(),
            "block_align:".green().bold(),
            self.block_align.to_string().white(),
            "bits_per_sample:".green().bold(),
            self.bits_per_sample.to_string().white(),
        )
    }
}

#[cfg(not(feature = "colored"))]
impl Display for UnvalidatedFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let code = match self.effective_format_code() {
            Some(code) => format!("{:#06x}", code),
            None => "none".to_string(),
        };
        write!(
            f,
            "UnvalidatedFormat: audio_format: {:#06x}, effective_code: {}, channels: {}, sample_rate: {}, byte_rate: {}, block_align: {}, bits_per_sample: {}",
            self.audio_format,
            code,
            self.channels,
            self.sample_rate,
            self.byte_rate,
            self.block_align,
            self.bits_per_sample
        )
    }
}

impl TryFrom<&UnvalidatedFormat> for Format {
    type Error = WavkitError;

    fn try_from(value: &UnvalidatedFormat) -> Result<Self, Self::Error> {
        value.to_validated_format()
    }
}
