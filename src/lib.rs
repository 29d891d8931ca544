//! # Wavkit
//!
//! Wavkit reads and writes RIFF/WAVE audio files one buffer of sample frames at a time.
//! It validates the container and the format chunk, exposes the file's metadata even
//! when its encoding cannot be decoded, and keeps a written file's header consistent
//! through a two-phase commit.
//!
//! ## Core Features
//!
//! - **Formats**: 8, 16, 24 and 32 bit integer PCM and 32/64 bit IEEE float, plain or
//!   extensible format chunks, speaker mappings via the channel mask.
//! - **Streaming**: [`Reader::read`] decodes up to `n` frames, [`Writer::write`] appends a
//!   buffer and [`Writer::close`] patches the header size fields.
//! - **Conversion**: buffers convert between channel counts (mono to many, many to mono,
//!   many to stereo) and between sample formats.
//! - **Sampler metadata**: the `smpl` chunk, before or after the sample data.
//!
//! - **Optional Features**:
//!   - `logging`: Detailed operation logging (enabled by default)
//!   - `colored`: Enhanced debug output
//!   - `ndarray`: Buffers as `frames x channels` arrays
//!
//! ## Quick Examples
//!
//! ### Reading Audio
//!
//! ```no_run
//! use wavkit::{Format, Reader, SampleFormat};
//!
//! let mut reader = Reader::from_path("input.wav")?;
//! println!("Frames: {}", reader.total_sample_frames());
//! println!("Duration: {:?}", reader.total_duration());
//!
//! for buffer in reader.buffers(4096) {
//!     let buffer = buffer?;
//!     // process buffer.frames::<i16>() ...
//! }
//!
//! // Decode to mono 32-bit float whatever the file holds
//! let target = Format::new(1, SampleFormat::Float32, 44100)?;
//! let mut reader = Reader::from_path_with_format("input.wav", Some(target))?;
//! let samples = reader.read_remaining()?;
//! # Ok::<(), wavkit::WavkitError>(())
//! ```
//!
//! ### Writing Audio
//!
//! ```no_run
//! use wavkit::{Buffer, Format, SampleFormat, Writer};
//!
//! let format = Format::new(1, SampleFormat::Pcm16, 44100)?;
//! Writer::create_with("out.wav", format.clone(), |writer| {
//!     writer.write(&Buffer::new(vec![0i16; 44100], format.clone())?)
//! })?;
//! # Ok::<(), wavkit::WavkitError>(())
//! ```
//!
//! ## Error Handling
//!
//! Wavkit uses the `WavkitResult<T>` type alias for operations that can fail:
//!
//! ```no_run
//! pub type WavkitResult<T> = Result<T, WavkitError>;
//! ```
//!
//! Structural problems are [`WavkitError::InvalidFormat`], valid files with an encoding
//! that cannot be decoded are [`WavkitError::UnsupportedFormat`].
//!

/// A macro for logging messages if the logging feature is enabled.
#[macro_export]
macro_rules! log {
    ($level:expr, $($arg:tt)+) => {
        #[cfg(feature = "logging")]
        log::log!($level, $($arg)+);
    };
}

pub mod buffer;
pub mod chunks;
pub mod conversion;
pub mod core;
pub mod duration;
pub mod error;
pub mod format;
pub mod header;
pub mod iter;
pub mod sampler;
pub mod wav_type;
pub mod writer;

use std::path::Path;

pub use crate::buffer::{Buffer, SampleData};
pub use crate::chunks::{FactChunk, DATA, FACT, FMT, RIFF, SMPL, WAVE};
pub use crate::conversion::{convert_sample_format, AudioSample};
pub use crate::core::{ReadSeek, Reader};
pub use crate::duration::Duration;
pub use crate::error::{WavkitError, WavkitResult};
pub use crate::format::{Channels, Format, Speaker, UnvalidatedFormat};
pub use crate::header::WavHeader;
pub use crate::iter::BufferIterator;
pub use crate::sampler::{LoopType, SamplerInfo, SamplerLoop, SmpteTimecode};
pub use crate::wav_type::{FormatCode, SampleFormat};
pub use crate::writer::Writer;

/// Reads every sample frame of a wav file into one buffer in the file's own format.
///
/// # Examples
///
/// ```no_run
/// use wavkit::read;
///
/// let buffer = read("path/to/wav.wav").unwrap();
/// println!("{} frames of {}", buffer.frame_count(), buffer.format());
/// ```
pub fn read<P: AsRef<Path>>(path: P) -> WavkitResult<Buffer> {
    let mut reader = Reader::from_path(&path)?;
    let buffer = match reader.read_remaining() {
        Ok(buffer) => buffer,
        Err(WavkitError::EndOfData) => match reader.format() {
            Some(format) => Buffer::from_sample_data(empty_data(format.sample_format()), format.clone())?,
            None => return Err(WavkitError::EndOfData),
        },
        Err(e) => return Err(e),
    };
    log!(
        log::Level::Debug,
        "Read wav file from {}\n{}",
        path.as_ref().display(),
        buffer.format(),
    );
    Ok(buffer)
}

/// Writes `buffer` to a new wav file in the buffer's own format.
///
/// # Examples
///
/// ```no_run
/// use wavkit::{write, Buffer, Format, SampleFormat};
///
/// let sr = 16000;
/// let samples: Vec<f32> = (0..sr)
///     .map(|x| (x as f32 / sr as f32 * 440.0 * 2.0 * std::f32::consts::PI).sin())
///     .collect();
/// let format = Format::new(1, SampleFormat::Float32, sr).unwrap();
/// write("./sine.wav", &Buffer::new(samples, format).unwrap()).unwrap();
/// ```
pub fn write<P: AsRef<Path>>(path: P, buffer: &Buffer) -> WavkitResult<()> {
    Writer::create_with(&path, buffer.format().clone(), |writer| writer.write(buffer))?;
    log!(
        log::Level::Debug,
        "Wrote wav file to {}",
        path.as_ref().display()
    );
    Ok(())
}

fn empty_data(sample_format: SampleFormat) -> SampleData {
    match sample_format {
        SampleFormat::Pcm8 => SampleData::Pcm8(Vec::new()),
        SampleFormat::Pcm16 => SampleData::Pcm16(Vec::new()),
        SampleFormat::Pcm24 => SampleData::Pcm24(Vec::new()),
        SampleFormat::Pcm32 => SampleData::Pcm32(Vec::new()),
        SampleFormat::Float32 => SampleData::Float32(Vec::new()),
        SampleFormat::Float64 => SampleData::Float64(Vec::new()),
    }
}
