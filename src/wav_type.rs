use std::{fmt::Display, str::FromStr};

use crate::{WavkitError, WavkitResult};

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
// Verified as taking up 2 bytes in memory
pub enum FormatCode {
    WAV_FORMAT_PCM = 1,
    WAV_FORMAT_IEEE_FLOAT = 3,
    WAVE_FORMAT_ALAW = 6,
    WAVE_FORMAT_MULAW = 7,
    WAVE_FORMAT_EXTENSIBLE = 0xFFFE,
}

impl FormatCode {
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    pub const fn to_le_bytes(self) -> [u8; 2] {
        (self as u16).to_le_bytes()
    }
}

impl Display for FormatCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatCode::WAV_FORMAT_PCM => write!(f, "WAV_FORMAT_PCM"),
            FormatCode::WAV_FORMAT_IEEE_FLOAT => write!(f, "WAV_FORMAT_IEEE_FLOAT"),
            FormatCode::WAVE_FORMAT_ALAW => write!(f, "WAVE_FORMAT_ALAW"),
            FormatCode::WAVE_FORMAT_MULAW => write!(f, "WAVE_FORMAT_MULAW"),
            FormatCode::WAVE_FORMAT_EXTENSIBLE => write!(f, "WAVE_FORMAT_EXTENSIBLE"),
        }
    }
}

impl TryFrom<u16> for FormatCode {
    type Error = WavkitError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FormatCode::WAV_FORMAT_PCM),
            3 => Ok(FormatCode::WAV_FORMAT_IEEE_FLOAT),
            6 => Ok(FormatCode::WAVE_FORMAT_ALAW),
            7 => Ok(FormatCode::WAVE_FORMAT_MULAW),
            0xFFFE => Ok(FormatCode::WAVE_FORMAT_EXTENSIBLE),
            _ => Err(WavkitError::unsupported_format(format!(
                "Unknown format code: {:#06x}",
                value
            ))),
        }
    }
}

/// The sample encodings this crate can decode and encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// 8-bit unsigned integer PCM.
    Pcm8,
    Pcm16,
    /// 24-bit signed integer PCM, held in memory as `i32`.
    Pcm24,
    Pcm32,
    Float32,
    Float64,
}

const PCM_8_BITS: u16 = 8;
const PCM_16_BITS: u16 = (std::mem::size_of::<i16>() * 8) as u16;
const PCM_24_BITS: u16 = 24;
const PCM_32_BITS: u16 = (std::mem::size_of::<i32>() * 8) as u16;
const FLOAT_32_BITS: u16 = (std::mem::size_of::<f32>() * 8) as u16;
const FLOAT_64_BITS: u16 = (std::mem::size_of::<f64>() * 8) as u16;

impl SampleFormat {
    pub const ALL: [SampleFormat; 6] = [
        SampleFormat::Pcm8,
        SampleFormat::Pcm16,
        SampleFormat::Pcm24,
        SampleFormat::Pcm32,
        SampleFormat::Float32,
        SampleFormat::Float64,
    ];

    pub const fn bits_per_sample(&self) -> u16 {
        match self {
            SampleFormat::Pcm8 => PCM_8_BITS,
            SampleFormat::Pcm16 => PCM_16_BITS,
            SampleFormat::Pcm24 => PCM_24_BITS,
            SampleFormat::Pcm32 => PCM_32_BITS,
            SampleFormat::Float32 => FLOAT_32_BITS,
            SampleFormat::Float64 => FLOAT_64_BITS,
        }
    }

    pub const fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample() / 8
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, SampleFormat::Float32 | SampleFormat::Float64)
    }

    /// The non-extensible format code used when writing this sample format.
    pub const fn format_code(&self) -> FormatCode {
        match self.is_float() {
            true => FormatCode::WAV_FORMAT_IEEE_FLOAT,
            false => FormatCode::WAV_FORMAT_PCM,
        }
    }

    /// Integer PCM sample format with the given bit depth.
    pub fn from_pcm_bits(bits: u16) -> WavkitResult<Self> {
        match bits {
            PCM_8_BITS => Ok(SampleFormat::Pcm8),
            PCM_16_BITS => Ok(SampleFormat::Pcm16),
            PCM_24_BITS => Ok(SampleFormat::Pcm24),
            PCM_32_BITS => Ok(SampleFormat::Pcm32),
            _ => Err(WavkitError::invalid_format(format!(
                "Invalid bits per sample for PCM: {} (must be one of 8, 16, 24, 32)",
                bits
            ))),
        }
    }

    /// IEEE float sample format with the given bit depth.
    pub fn from_float_bits(bits: u16) -> WavkitResult<Self> {
        match bits {
            FLOAT_32_BITS => Ok(SampleFormat::Float32),
            FLOAT_64_BITS => Ok(SampleFormat::Float64),
            _ => Err(WavkitError::invalid_format(format!(
                "Invalid bits per sample for float: {} (must be one of 32, 64)",
                bits
            ))),
        }
    }
}

impl std::fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleFormat::Pcm8 => write!(f, "pcm_8"),
            SampleFormat::Pcm16 => write!(f, "pcm_16"),
            SampleFormat::Pcm24 => write!(f, "pcm_24"),
            SampleFormat::Pcm32 => write!(f, "pcm_32"),
            SampleFormat::Float32 => write!(f, "float_32"),
            SampleFormat::Float64 => write!(f, "float_64"),
        }
    }
}

impl FromStr for SampleFormat {
    type Err = WavkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pcm_8" => Ok(SampleFormat::Pcm8),
            "pcm_16" => Ok(SampleFormat::Pcm16),
            "pcm_24" => Ok(SampleFormat::Pcm24),
            "pcm_32" => Ok(SampleFormat::Pcm32),
            "float" | "float_32" => Ok(SampleFormat::Float32),
            "float_64" => Ok(SampleFormat::Float64),
            _ => Err(WavkitError::invalid_format(format!(
                "Invalid sample format: {:?} (must be one of pcm_8, pcm_16, pcm_24, pcm_32, float_32, float_64)",
                s
            ))),
        }
    }
}

/// Maps an effective format code and bit depth onto a sample format.
/// Unknown pairs are valid containers this crate cannot decode.
impl TryFrom<(u16, u16)> for SampleFormat {
    type Error = WavkitError;

    fn try_from(value: (u16, u16)) -> Result<Self, Self::Error> {
        const PCM: u16 = FormatCode::WAV_FORMAT_PCM.as_u16();
        const FLOAT: u16 = FormatCode::WAV_FORMAT_IEEE_FLOAT.as_u16();

        Ok(match value {
            (PCM, PCM_8_BITS) => SampleFormat::Pcm8,
            (PCM, PCM_16_BITS) => SampleFormat::Pcm16,
            (PCM, PCM_24_BITS) => SampleFormat::Pcm24,
            (PCM, PCM_32_BITS) => SampleFormat::Pcm32,
            (FLOAT, FLOAT_32_BITS) => SampleFormat::Float32,
            (FLOAT, FLOAT_64_BITS) => SampleFormat::Float64,
            (code, bits) => {
                let name = match FormatCode::try_from(code) {
                    Ok(format_code) => format_code.to_string(),
                    Err(_) => format!("{:#06x}", code),
                };
                return Err(WavkitError::unsupported_format(format!(
                    "Unsupported format {} with {} bits per sample",
                    name, bits
                )));
            }
        })
    }
}
