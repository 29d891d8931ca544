//! Batches of decoded sample frames.
use std::slice::ChunksExact;

#[cfg(feature = "ndarray")]
use ndarray::Array2;

use crate::conversion::{convert_sample_format, AudioSample};
use crate::format::Format;
use crate::wav_type::SampleFormat;
use crate::{WavkitError, WavkitResult};

const PCM_24_MIN: i32 = -(1 << 23);
const PCM_24_MAX: i32 = (1 << 23) - 1;

/// Interleaved sample values, one variant per sample format.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleData {
    Pcm8(Vec<u8>),
    Pcm16(Vec<i16>),
    /// 24-bit samples sign-extended into `i32`.
    Pcm24(Vec<i32>),
    Pcm32(Vec<i32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl SampleData {
    pub fn sample_format(&self) -> SampleFormat {
        match self {
            SampleData::Pcm8(_) => SampleFormat::Pcm8,
            SampleData::Pcm16(_) => SampleFormat::Pcm16,
            SampleData::Pcm24(_) => SampleFormat::Pcm24,
            SampleData::Pcm32(_) => SampleFormat::Pcm32,
            SampleData::Float32(_) => SampleFormat::Float32,
            SampleData::Float64(_) => SampleFormat::Float64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SampleData::Pcm8(samples) => samples.len(),
            SampleData::Pcm16(samples) => samples.len(),
            SampleData::Pcm24(samples) | SampleData::Pcm32(samples) => samples.len(),
            SampleData::Float32(samples) => samples.len(),
            SampleData::Float64(samples) => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether [`Buffer::convert`] has a rule taking `from` channels to `to` channels.
pub fn can_convert_channels(from: u16, to: u16) -> bool {
    from == to || from == 1 || to == 1 || (from > 2 && to == 2)
}

/// Changes the channel count of interleaved frames. `None` when there is no rule for the pair.
fn remix<T: AudioSample>(samples: &[T], from: usize, to: usize) -> Option<Vec<T>> {
    if from == to {
        return Some(samples.to_vec());
    }
    let frames = samples.chunks_exact(from);
    match (from, to) {
        (1, _) => Some(
            samples
                .iter()
                .flat_map(|s| std::iter::repeat(*s).take(to))
                .collect(),
        ),
        (_, 1) => Some(frames.map(T::mean).collect()),
        (_, 2) => Some(frames.flat_map(|frame| frame[..2].iter().copied()).collect()),
        _ => None,
    }
}

macro_rules! remix_data {
    ($data:expr, $from:expr, $to:expr, [$($variant:ident),+]) => {
        match $data {
            $(SampleData::$variant(samples) => {
                remix(samples, $from, $to).map(SampleData::$variant)
            })+
        }
    };
}

/// A batch of interleaved sample frames and the [`Format`] they are encoded in.
///
/// The sample data always matches `format.sample_format()` and holds a whole number of
/// frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    data: SampleData,
    format: Format,
}

macro_rules! typed_accessors {
    ($(($name:ident, $t:ty, $variant:ident)),+) => {
        paste::paste! {
            impl Buffer {
                $(
                    #[doc = "The interleaved samples if this buffer holds `" $name "` data."]
                    pub fn [<as_ $name>](&self) -> Option<&[$t]> {
                        match &self.data {
                            SampleData::$variant(samples) => Some(samples),
                            _ => None,
                        }
                    }
                )+
            }
        }
    };
}

typed_accessors!(
    (pcm_8, u8, Pcm8),
    (pcm_16, i16, Pcm16),
    (pcm_24, i32, Pcm24),
    (pcm_32, i32, Pcm32),
    (float_32, f32, Float32),
    (float_64, f64, Float64)
);

impl Buffer {
    /// Wraps interleaved samples. `T` must be the in-memory type of `format`'s sample
    /// format and the sample count a multiple of the channel count.
    pub fn new<T: AudioSample>(samples: Vec<T>, format: Format) -> WavkitResult<Self> {
        let sample_format = format.sample_format();
        let data = T::wrap(samples, sample_format).ok_or_else(|| {
            WavkitError::invalid_format(format!(
                "Invalid sample type {} for sample format {}",
                std::any::type_name::<T>(),
                sample_format
            ))
        })?;
        Self::from_sample_data(data, format)
    }

    /// Builds a buffer from per-frame slices, each exactly `channels` long.
    pub fn from_frames<T, F>(frames: &[F], format: Format) -> WavkitResult<Self>
    where
        T: AudioSample,
        F: AsRef<[T]>,
    {
        let channels = format.channels() as usize;
        let mut samples = Vec::with_capacity(frames.len() * channels);
        for (index, frame) in frames.iter().enumerate() {
            let frame = frame.as_ref();
            if frame.len() != channels {
                return Err(WavkitError::invalid_format(format!(
                    "Invalid frame {}: {} values (must be exactly {} channels)",
                    index,
                    frame.len(),
                    channels
                )));
            }
            samples.extend_from_slice(frame);
        }
        Self::new(samples, format)
    }

    pub fn from_sample_data(data: SampleData, format: Format) -> WavkitResult<Self> {
        if data.sample_format() != format.sample_format() {
            return Err(WavkitError::invalid_format(format!(
                "Invalid sample data: {} samples given for a {} format",
                data.sample_format(),
                format.sample_format()
            )));
        }
        let channels = format.channels() as usize;
        if data.len() % channels != 0 {
            return Err(WavkitError::invalid_format(format!(
                "Invalid sample count: {} (must be a multiple of {} channels)",
                data.len(),
                channels
            )));
        }
        if let SampleData::Pcm24(samples) = &data {
            if let Some(sample) = samples
                .iter()
                .find(|s| !(PCM_24_MIN..=PCM_24_MAX).contains(*s))
            {
                return Err(WavkitError::invalid_format(format!(
                    "Invalid 24-bit sample: {} (must be between {} and {})",
                    sample, PCM_24_MIN, PCM_24_MAX
                )));
            }
        }
        Ok(Buffer { data, format })
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    pub fn data(&self) -> &SampleData {
        &self.data
    }

    pub fn into_data(self) -> SampleData {
        self.data
    }

    pub fn channels(&self) -> u16 {
        self.format.channels()
    }

    pub fn frame_count(&self) -> usize {
        self.data.len() / self.channels() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The interleaved samples, if `T` is the in-memory type of this buffer's sample format.
    pub fn samples<T: AudioSample>(&self) -> Option<&[T]> {
        T::unwrap_ref(&self.data)
    }

    /// Iterates over frames as `channels`-length slices.
    pub fn frames<T: AudioSample>(&self) -> Option<ChunksExact<'_, T>> {
        let channels = self.channels() as usize;
        self.samples::<T>().map(|samples| samples.chunks_exact(channels))
    }

    pub fn frame<T: AudioSample>(&self, index: usize) -> Option<&[T]> {
        let channels = self.channels() as usize;
        let start = index.checked_mul(channels)?;
        let end = start.checked_add(channels)?;
        self.samples::<T>()?.get(start..end)
    }

    /// Returns a new buffer expressed in `target`.
    ///
    /// The channel count changes first: mono is replicated into every channel, any
    /// multi-channel data is averaged down to mono, and more than two channels keep only
    /// the first two when going to stereo. Other channel changes fail with
    /// [`WavkitError::UnsupportedConversion`]. The samples are then rescaled to the target
    /// sample format. Sample rates are relabelled, never resampled.
    pub fn convert(&self, target: &Format) -> WavkitResult<Buffer> {
        let from = self.channels();
        let to = target.channels();
        if !can_convert_channels(from, to) {
            return Err(WavkitError::UnsupportedConversion { from, to });
        }
        let remixed = remix_data!(
            &self.data,
            from as usize,
            to as usize,
            [Pcm8, Pcm16, Pcm24, Pcm32, Float32, Float64]
        )
        .ok_or(WavkitError::UnsupportedConversion { from, to })?;

        let data = match remixed.sample_format() == target.sample_format() {
            true => remixed,
            false => convert_sample_format(&remixed, target.sample_format()),
        };

        Ok(Buffer {
            data,
            format: target.clone(),
        })
    }

    /// The samples as a `frames x channels` array.
    #[cfg(feature = "ndarray")]
    pub fn to_ndarray<T: AudioSample>(&self) -> WavkitResult<Array2<T>> {
        let samples = self.samples::<T>().ok_or_else(|| {
            WavkitError::invalid_format(format!(
                "Invalid sample type {} for sample format {}",
                std::any::type_name::<T>(),
                self.format.sample_format()
            ))
        })?;
        Ok(Array2::from_shape_vec(
            (self.frame_count(), self.channels() as usize),
            samples.to_vec(),
        )?)
    }
}
