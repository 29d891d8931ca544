//! Byte layout of the data chunk: little-endian samples, 8-bit unsigned, 24-bit packed.
use bytemuck::Pod;

use crate::buffer::SampleData;
use crate::conversion::AudioSample;
use crate::wav_type::SampleFormat;

/// Decodes little-endian multi-byte samples. `bytes.len()` must be a multiple of the
/// sample size.
#[inline(always)]
fn decode_le<T: Pod, const N: usize>(bytes: &[u8], from_le: fn([u8; N]) -> T) -> Vec<T> {
    if cfg!(target_endian = "little") {
        bytemuck::pod_collect_to_vec::<u8, T>(bytes)
    } else {
        bytes
            .chunks_exact(N)
            .map(|chunk| {
                let mut buf = [0u8; N];
                buf.copy_from_slice(chunk);
                from_le(buf)
            })
            .collect()
    }
}

#[inline(always)]
fn encode_le<T: AudioSample>(samples: &[T], out: &mut Vec<u8>) {
    if cfg!(target_endian = "little") {
        out.extend_from_slice(bytemuck::cast_slice(samples));
    } else {
        for sample in samples {
            out.extend_from_slice(sample.to_le_bytes().as_ref());
        }
    }
}

/// Rebuilds a 24-bit sample, sign-extending from the most significant byte.
#[inline(always)]
pub fn decode_i24(bytes: [u8; 3]) -> i32 {
    let [lsb, mid, msb] = bytes;
    ((msb as i8 as i32) << 16) | ((mid as i32) << 8) | lsb as i32
}

#[inline(always)]
pub fn encode_i24(sample: i32) -> [u8; 3] {
    let [lsb, mid, msb, _] = sample.to_le_bytes();
    [lsb, mid, msb]
}

/// Decodes a run of whole sample frames. Trailing bytes that do not form a whole
/// sample are ignored.
pub fn decode(bytes: &[u8], sample_format: SampleFormat) -> SampleData {
    let whole = bytes.len() - bytes.len() % sample_format.bytes_per_sample() as usize;
    let bytes = &bytes[..whole];
    match sample_format {
        SampleFormat::Pcm8 => SampleData::Pcm8(bytes.to_vec()),
        SampleFormat::Pcm16 => SampleData::Pcm16(decode_le(bytes, i16::from_le_bytes)),
        SampleFormat::Pcm24 => SampleData::Pcm24(
            bytes
                .chunks_exact(3)
                .map(|chunk| decode_i24([chunk[0], chunk[1], chunk[2]]))
                .collect(),
        ),
        SampleFormat::Pcm32 => SampleData::Pcm32(decode_le(bytes, i32::from_le_bytes)),
        SampleFormat::Float32 => SampleData::Float32(decode_le(bytes, f32::from_le_bytes)),
        SampleFormat::Float64 => SampleData::Float64(decode_le(bytes, f64::from_le_bytes)),
    }
}

/// Appends the wire bytes of `data` to `out`.
pub fn encode(data: &SampleData, out: &mut Vec<u8>) {
    out.reserve(data.len() * data.sample_format().bytes_per_sample() as usize);
    match data {
        SampleData::Pcm8(samples) => out.extend_from_slice(samples),
        SampleData::Pcm16(samples) => encode_le(samples, out),
        SampleData::Pcm24(samples) => {
            for sample in samples {
                out.extend_from_slice(&encode_i24(*sample));
            }
        }
        SampleData::Pcm32(samples) => encode_le(samples, out),
        SampleData::Float32(samples) => encode_le(samples, out),
        SampleData::Float64(samples) => encode_le(samples, out),
    }
}
