/// Module containing the functionality for converting between the supported sample formats
use std::fmt::Debug;

use bytemuck::Pod;
use num_traits::ToBytes;

use crate::buffer::SampleData;
use crate::wav_type::SampleFormat;

/// Trait used to indicate that a type is an audio sample and can be treated as such.
///
/// Each sample format is held in memory by exactly one of these types; `i32` holds both
/// 24-bit and 32-bit PCM.
pub trait AudioSample:
    Copy + Pod + ToBytes + Debug + PartialEq + Send + Sync + 'static
{
    /// Tags `samples` with `sample_format`, or `None` when this type cannot hold it.
    fn wrap(samples: Vec<Self>, sample_format: SampleFormat) -> Option<SampleData>;

    fn unwrap_ref(data: &SampleData) -> Option<&[Self]>;

    /// Arithmetic mean; integer types truncate toward zero.
    fn mean(values: &[Self]) -> Self;
}

macro_rules! impl_int_sample {
    ($t:ty, [$($variant:ident),+]) => {
        impl AudioSample for $t {
            fn wrap(samples: Vec<Self>, sample_format: SampleFormat) -> Option<SampleData> {
                match sample_format {
                    $(SampleFormat::$variant => Some(SampleData::$variant(samples)),)+
                    _ => None,
                }
            }

            fn unwrap_ref(data: &SampleData) -> Option<&[Self]> {
                match data {
                    $(SampleData::$variant(samples) => Some(samples),)+
                    _ => None,
                }
            }

            #[inline(always)]
            fn mean(values: &[Self]) -> Self {
                if values.is_empty() {
                    return 0;
                }
                let sum: i64 = values.iter().map(|v| *v as i64).sum();
                (sum / values.len() as i64) as $t
            }
        }
    };
}

macro_rules! impl_float_sample {
    ($t:ty, $variant:ident) => {
        impl AudioSample for $t {
            fn wrap(samples: Vec<Self>, sample_format: SampleFormat) -> Option<SampleData> {
                match sample_format {
                    SampleFormat::$variant => Some(SampleData::$variant(samples)),
                    _ => None,
                }
            }

            fn unwrap_ref(data: &SampleData) -> Option<&[Self]> {
                match data {
                    SampleData::$variant(samples) => Some(samples),
                    _ => None,
                }
            }

            #[inline(always)]
            fn mean(values: &[Self]) -> Self {
                if values.is_empty() {
                    return 0.0;
                }
                let sum: f64 = values.iter().map(|v| *v as f64).sum();
                (sum / values.len() as f64) as $t
            }
        }
    };
}

impl_int_sample!(u8, [Pcm8]);
impl_int_sample!(i16, [Pcm16]);
impl_int_sample!(i32, [Pcm24, Pcm32]);
impl_float_sample!(f32, Float32);
impl_float_sample!(f64, Float64);

const PCM_8_BIAS: i64 = 128;

/// Largest positive value of an integer PCM format.
#[inline(always)]
fn pcm_max(sample_format: SampleFormat) -> i64 {
    (1i64 << (sample_format.bits_per_sample() - 1)) - 1
}

/// Integer PCM samples as signed values centred on zero.
fn pcm_values(data: &SampleData) -> Vec<i64> {
    match data {
        SampleData::Pcm8(samples) => samples.iter().map(|s| *s as i64 - PCM_8_BIAS).collect(),
        SampleData::Pcm16(samples) => samples.iter().map(|s| *s as i64).collect(),
        SampleData::Pcm24(samples) | SampleData::Pcm32(samples) => {
            samples.iter().map(|s| *s as i64).collect()
        }
        SampleData::Float32(_) | SampleData::Float64(_) => Vec::new(),
    }
}

fn float_values(data: &SampleData) -> Vec<f64> {
    match data {
        SampleData::Float32(samples) => samples.iter().map(|s| *s as f64).collect(),
        SampleData::Float64(samples) => samples.clone(),
        _ => Vec::new(),
    }
}

/// Packs centred integer values into an integer PCM format. Values must already be in range.
fn from_pcm_values(values: Vec<i64>, target: SampleFormat) -> SampleData {
    match target {
        SampleFormat::Pcm8 => {
            SampleData::Pcm8(values.into_iter().map(|v| (v + PCM_8_BIAS) as u8).collect())
        }
        SampleFormat::Pcm16 => SampleData::Pcm16(values.into_iter().map(|v| v as i16).collect()),
        SampleFormat::Pcm24 => SampleData::Pcm24(values.into_iter().map(|v| v as i32).collect()),
        SampleFormat::Pcm32 => SampleData::Pcm32(values.into_iter().map(|v| v as i32).collect()),
        SampleFormat::Float32 => {
            SampleData::Float32(values.into_iter().map(|v| v as f32).collect())
        }
        SampleFormat::Float64 => {
            SampleData::Float64(values.into_iter().map(|v| v as f64).collect())
        }
    }
}

fn from_float_values(values: Vec<f64>, target: SampleFormat) -> SampleData {
    match target {
        SampleFormat::Float32 => {
            SampleData::Float32(values.into_iter().map(|v| v as f32).collect())
        }
        SampleFormat::Float64 => SampleData::Float64(values),
        pcm => {
            let max = pcm_max(pcm);
            let min = -max - 1;
            let scaled = values
                .into_iter()
                .map(|v| ((v * max as f64).round() as i64).clamp(min, max))
                .collect();
            from_pcm_values(scaled, pcm)
        }
    }
}

/// Rescales samples into another sample format.
///
/// Integer to integer conversions shift by the difference in bit depth. Integer to float
/// divides by the source's largest positive value and clamps to `[-1, 1]`. Float to
/// integer multiplies by the target's largest positive value, rounds and clamps. Float to
/// float is a cast.
pub fn convert_sample_format(data: &SampleData, target: SampleFormat) -> SampleData {
    let source = data.sample_format();
    if source == target {
        return data.clone();
    }

    match (source.is_float(), target.is_float()) {
        (false, false) => {
            let shift = target.bits_per_sample() as i32 - source.bits_per_sample() as i32;
            let values = pcm_values(data)
                .into_iter()
                .map(|v| match shift >= 0 {
                    true => v << shift,
                    false => v >> -shift,
                })
                .collect();
            from_pcm_values(values, target)
        }
        (false, true) => {
            let max = pcm_max(source) as f64;
            let values = pcm_values(data)
                .into_iter()
                .map(|v| (v as f64 / max).clamp(-1.0, 1.0))
                .collect();
            from_float_values(values, target)
        }
        (true, _) => from_float_values(float_values(data), target),
    }
}

#[cfg(test)]
mod conversion_tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    #[test]
    fn integer_means_truncate_toward_zero() {
        assert_eq!(i16::mean(&[3, 4]), 3);
        assert_eq!(i16::mean(&[-3, -4]), -3);
        assert_eq!(i32::mean(&[i32::MAX, i32::MAX]), i32::MAX);
        assert_eq!(i32::mean(&[i32::MIN, i32::MIN, i32::MIN]), i32::MIN);
        assert_eq!(u8::mean(&[255, 254]), 254);
        assert_eq!(f32::mean(&[0.5, -0.25]), 0.125);
    }

    #[test]
    fn pcm_to_pcm_shifts() {
        let widened = convert_sample_format(&SampleData::Pcm16(vec![1, -1, i16::MAX]), SampleFormat::Pcm32);
        assert_eq!(widened, SampleData::Pcm32(vec![1 << 16, -(1 << 16), (i16::MAX as i32) << 16]));

        let narrowed = convert_sample_format(&SampleData::Pcm24(vec![0x7F_FFFF, -0x80_0000, 0x100]), SampleFormat::Pcm16);
        assert_eq!(narrowed, SampleData::Pcm16(vec![i16::MAX, i16::MIN, 1]));

        let unsigned = convert_sample_format(&SampleData::Pcm16(vec![0, i16::MIN, i16::MAX]), SampleFormat::Pcm8);
        assert_eq!(unsigned, SampleData::Pcm8(vec![128, 0, 255]));

        let from_unsigned = convert_sample_format(&SampleData::Pcm8(vec![128, 0, 255]), SampleFormat::Pcm16);
        assert_eq!(from_unsigned, SampleData::Pcm16(vec![0, i16::MIN, 127 << 8]));
    }

    #[test]
    fn pcm_to_float_divides_by_max() {
        let converted = convert_sample_format(&SampleData::Pcm16(vec![i16::MAX, i16::MIN, 0]), SampleFormat::Float64);
        match converted {
            SampleData::Float64(values) => {
                assert_approx_eq!(values[0], 1.0);
                assert_approx_eq!(values[1], -1.0);
                assert_eq!(values[2], 0.0);
            }
            other => panic!("Expected Float64, got {:?}", other),
        }
    }

    #[test]
    fn float_to_pcm_rounds_and_clamps() {
        let converted = convert_sample_format(&SampleData::Float32(vec![0.5, -1.0, 2.0, -2.0]), SampleFormat::Pcm16);
        assert_eq!(converted, SampleData::Pcm16(vec![16384, -32767, i16::MAX, i16::MIN]));

        let converted = convert_sample_format(&SampleData::Float64(vec![1.0]), SampleFormat::Pcm24);
        assert_eq!(converted, SampleData::Pcm24(vec![0x7F_FFFF]));
    }

    #[test]
    fn same_format_is_a_copy() {
        let data = SampleData::Pcm24(vec![1, 2, 3]);
        assert_eq!(convert_sample_format(&data, SampleFormat::Pcm24), data);
    }
}
