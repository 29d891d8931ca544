/// Module contains the core reading type, ``Reader``, for streaming sample frames out of wav files.
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::buffer::{can_convert_channels, Buffer};
use crate::chunks::data;
use crate::duration::Duration;
use crate::format::{Format, UnvalidatedFormat};
use crate::header::{read_header, WavHeader};
use crate::iter::BufferIterator;
use crate::log;
use crate::sampler::SamplerInfo;
use crate::{WavkitError, WavkitResult};

pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Streams sample frames out of a wav file.
///
/// Opening a reader parses the header; the file's metadata is available even when its
/// encoding cannot be decoded, in which case [`Reader::read`] fails with
/// [`WavkitError::UnsupportedFormat`].
pub struct Reader {
    reader: Option<Box<dyn ReadSeek + Send>>,
    header: WavHeader,
    native: Option<Format>,
    target: Option<Format>,
    block_align: u64,
    total_sample_frames: u64,
    current_sample_frame: u64,
}

impl Reader {
    /// Opens a reader over `reader`. Buffers are returned in `format` when given, otherwise
    /// in the file's own format.
    ///
    /// Fails with [`WavkitError::UnsupportedConversion`] when the requested channel count
    /// cannot be reached from the file's.
    pub fn new(mut reader: Box<dyn ReadSeek + Send>, format: Option<Format>) -> WavkitResult<Self> {
        let header = read_header(&mut *reader)?;
        let native = header.native_format.to_validated_format().ok();
        if let (Some(native), Some(target)) = (&native, &format) {
            if !can_convert_channels(native.channels(), target.channels()) {
                return Err(WavkitError::UnsupportedConversion {
                    from: native.channels(),
                    to: target.channels(),
                });
            }
        }

        let block_align = match &native {
            Some(format) => format.block_align() as u64,
            None => header.native_format.block_align as u64,
        };
        let total_sample_frames = match block_align {
            0 => 0,
            n => header.data_size as u64 / n,
        };

        log!(
            log::Level::Debug,
            "Opened wav stream\n{}\ntotal_sample_frames: {}",
            header,
            total_sample_frames
        );

        Ok(Reader {
            reader: Some(reader),
            header,
            native,
            target: format,
            block_align,
            total_sample_frames,
            current_sample_frame: 0,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> WavkitResult<Self> {
        Self::from_path_with_format(path, None)
    }

    pub fn from_path_with_format<P: AsRef<Path>>(
        path: P,
        format: Option<Format>,
    ) -> WavkitResult<Self> {
        let f = std::fs::File::open(path)?;
        let buf_reader: Box<dyn ReadSeek + Send> = Box::new(std::io::BufReader::new(f));
        Self::new(buf_reader, format)
    }

    pub fn header(&self) -> &WavHeader {
        &self.header
    }

    /// The format chunk exactly as stored in the file.
    pub fn native_format(&self) -> &UnvalidatedFormat {
        &self.header.native_format
    }

    /// The file's format, if this crate can decode it.
    pub fn native_validated_format(&self) -> Option<&Format> {
        self.native.as_ref()
    }

    /// The format buffers are returned in: the requested format if one was given, else
    /// the file's own format. `None` when the file cannot be decoded and no format was
    /// requested.
    pub fn format(&self) -> Option<&Format> {
        self.target.as_ref().or(self.native.as_ref())
    }

    pub fn sampler_info(&self) -> Option<&SamplerInfo> {
        self.header.sampler_info.as_ref()
    }

    pub fn total_sample_frames(&self) -> u64 {
        self.total_sample_frames
    }

    pub fn current_sample_frame(&self) -> u64 {
        self.current_sample_frame
    }

    pub fn remaining_sample_frames(&self) -> u64 {
        self.total_sample_frames - self.current_sample_frame
    }

    pub fn total_duration(&self) -> Duration {
        Duration::new(self.total_sample_frames, self.header.native_format.sample_rate)
    }

    /// Reads up to `n` sample frames.
    ///
    /// Fails with [`WavkitError::EndOfData`] once every frame has been read, and with
    /// [`WavkitError::InvalidFormat`] if the stream ends inside the data chunk.
    pub fn read(&mut self, n: usize) -> WavkitResult<Buffer> {
        let reader = self.reader.as_mut().ok_or_else(WavkitError::closed_stream)?;
        let native = match &self.native {
            Some(native) => native,
            None => {
                return Err(self
                    .header
                    .native_format
                    .to_validated_format()
                    .err()
                    .unwrap_or_else(|| WavkitError::unsupported_format("Undecodable format")))
            }
        };
        if self.current_sample_frame >= self.total_sample_frames {
            return Err(WavkitError::EndOfData);
        }

        let frames = (n as u64).min(self.total_sample_frames - self.current_sample_frame);
        let n_bytes = frames * self.block_align;

        // grows with the bytes actually present, never with the declared size
        let mut bytes = Vec::new();
        Read::take(&mut *reader, n_bytes).read_to_end(&mut bytes)?;
        if (bytes.len() as u64) < n_bytes {
            return Err(WavkitError::invalid_format(format!(
                "The data chunk is truncated: expected {} bytes, found {}",
                n_bytes,
                bytes.len()
            )));
        }

        let buffer =
            Buffer::from_sample_data(data::decode(&bytes, native.sample_format()), native.clone())
                .and_then(|buffer| match &self.target {
                    Some(target) if target != native => buffer.convert(target),
                    _ => Ok(buffer),
                });
        match buffer {
            Ok(buffer) => {
                self.current_sample_frame += frames;
                Ok(buffer)
            }
            Err(e) => {
                reader.seek(SeekFrom::Current(-(n_bytes as i64)))?;
                Err(e)
            }
        }
    }

    /// Reads every remaining sample frame.
    pub fn read_remaining(&mut self) -> WavkitResult<Buffer> {
        let remaining = usize::try_from(self.remaining_sample_frames()).unwrap_or(usize::MAX);
        self.read(remaining)
    }

    /// Moves back to the first sample frame.
    pub fn rewind(&mut self) -> WavkitResult<()> {
        let reader = self.reader.as_mut().ok_or_else(WavkitError::closed_stream)?;
        reader.seek(SeekFrom::Start(self.header.data_offset))?;
        self.current_sample_frame = 0;
        Ok(())
    }

    /// Iterates over buffers of up to `frames_per_buffer` sample frames until the data is exhausted.
    pub fn buffers(&mut self, frames_per_buffer: usize) -> BufferIterator<'_> {
        BufferIterator::new(self, frames_per_buffer)
    }

    /// Releases the underlying stream. Later reads fail with an I/O error.
    pub fn close(&mut self) {
        self.reader = None;
    }

    pub fn closed(&self) -> bool {
        self.reader.is_none()
    }
}

#[cfg(test)]
mod core_tests {
    use super::*;
    use crate::chunks::fmt::fmt_tests::base_fmt_bytes;
    use crate::chunks::{ChunkHeader, DATA};
    use crate::format::Channels;
    use crate::header::header_tests::{chunk, pcm16_mono_fmt, riff};
    use crate::wav_type::SampleFormat;
    use std::io::Cursor;

    fn open(bytes: Vec<u8>, format: Option<Format>) -> Reader {
        Reader::new(Box::new(Cursor::new(bytes)), format).unwrap()
    }

    fn pcm16_mono(samples: &[i16]) -> Vec<u8> {
        let body: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        riff(&[pcm16_mono_fmt(), chunk(b"data", &body)])
    }

    #[test]
    fn reads_in_batches_until_end_of_data() {
        let mut reader = open(pcm16_mono(&[1, 2, 3, 4, 5]), None);
        assert_eq!(reader.total_sample_frames(), 5);

        let first = reader.read(2).unwrap();
        assert_eq!(first.as_pcm_16(), Some(&[1i16, 2][..]));
        assert_eq!(reader.current_sample_frame(), 2);

        let rest = reader.read(100).unwrap();
        assert_eq!(rest.as_pcm_16(), Some(&[3i16, 4, 5][..]));
        assert!(matches!(reader.read(1), Err(WavkitError::EndOfData)));

        reader.rewind().unwrap();
        assert_eq!(reader.read_remaining().unwrap().frame_count(), 5);
    }

    #[test]
    fn partial_trailing_frame_is_not_exposed() {
        let body = [1u8, 0, 2, 0, 3];
        let bytes = riff(&[
            chunk(b"fmt ", &base_fmt_bytes(1, 2, 8000, 16)),
            chunk(b"data", &body),
        ]);
        let mut reader = open(bytes, None);
        assert_eq!(reader.total_sample_frames(), 1);
        let buffer = reader.read(10).unwrap();
        assert_eq!(buffer.frame::<i16>(0), Some(&[1i16, 2][..]));
    }

    #[test]
    fn unsupported_format_keeps_metadata() {
        let bytes = riff(&[
            chunk(b"fmt ", &base_fmt_bytes(1, 1, 8000, 12)),
            chunk(b"data", &[0; 8]),
        ]);
        let mut reader = open(bytes, None);
        assert_eq!(reader.native_format().bits_per_sample, 12);
        assert_eq!(reader.native_format().sample_rate, 8000);
        assert_eq!(reader.format(), None);
        assert!(matches!(reader.read(1), Err(WavkitError::UnsupportedFormat(_))));
    }

    #[test]
    fn truncated_data_is_invalid() {
        let mut bytes = pcm16_mono(&[1, 2, 3, 4]);
        bytes.truncate(bytes.len() - 3);
        let mut reader = open(bytes, None);
        assert_eq!(reader.total_sample_frames(), 4);
        match reader.read(4) {
            Err(WavkitError::InvalidFormat(msg)) => assert!(msg.contains("truncated")),
            other => panic!("Expected InvalidFormat, got {:?}", other),
        }
    }

    #[test]
    fn huge_declared_data_does_not_allocate_up_front() {
        let mut bytes = riff(&[pcm16_mono_fmt()]);
        bytes.extend_from_slice(
            &ChunkHeader {
                id: DATA,
                size: u32::MAX - 1,
            }
            .as_bytes(),
        );
        bytes.extend_from_slice(&[1, 0]);
        let mut reader = open(bytes, None);
        assert_eq!(reader.total_sample_frames(), (u32::MAX as u64 - 1) / 2);
        assert!(matches!(reader.read(usize::MAX), Err(WavkitError::InvalidFormat(_))));
    }

    #[test]
    fn converts_to_requested_format() {
        let target = Format::new(Channels::Stereo, SampleFormat::Pcm16, 8000).unwrap();
        let mut reader = open(pcm16_mono(&[5, -5]), Some(target.clone()));
        assert_eq!(reader.format(), Some(&target));
        let buffer = reader.read(2).unwrap();
        assert_eq!(buffer.format(), &target);
        assert_eq!(buffer.as_pcm_16(), Some(&[5i16, 5, -5, -5][..]));
    }

    #[test]
    fn unreachable_channel_count_fails_at_open() {
        let bytes = riff(&[
            chunk(b"fmt ", &base_fmt_bytes(1, 2, 8000, 16)),
            chunk(b"data", &[1, 0, 2, 0, 3, 0, 4, 0]),
        ]);
        let target = Format::new(3, SampleFormat::Pcm16, 8000).unwrap();
        match Reader::new(Box::new(Cursor::new(bytes.clone())), Some(target)) {
            Err(WavkitError::UnsupportedConversion { from, to }) => assert_eq!((from, to), (2, 3)),
            Err(e) => panic!("Expected UnsupportedConversion, got {:?}", e),
            Ok(_) => panic!("Expected UnsupportedConversion"),
        }

        let mut reader = open(bytes, Some(Format::new(1, SampleFormat::Pcm16, 8000).unwrap()));
        assert_eq!(reader.read(1).unwrap().as_pcm_16(), Some(&[1i16][..]));
        assert_eq!(reader.current_sample_frame(), 1);
        assert_eq!(reader.read(1).unwrap().as_pcm_16(), Some(&[3i16][..]));
    }

    #[test]
    fn reader_and_writer_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Reader>();
        assert_send::<crate::Writer<Cursor<Vec<u8>>>>();
    }

    #[test]
    fn decodes_8_and_24_bit() {
        let bytes = riff(&[
            chunk(b"fmt ", &base_fmt_bytes(1, 1, 8000, 8)),
            chunk(b"data", &[0, 128, 255]),
        ]);
        let mut reader = open(bytes, None);
        assert_eq!(reader.read(3).unwrap().as_pcm_8(), Some(&[0u8, 128, 255][..]));

        let bytes = riff(&[
            chunk(b"fmt ", &base_fmt_bytes(1, 1, 8000, 24)),
            chunk(b"data", &[0x00, 0x00, 0x80, 0xFF, 0xFF, 0x7F, 0xFF, 0xFF, 0xFF]),
        ]);
        let mut reader = open(bytes, None);
        assert_eq!(
            reader.read(3).unwrap().as_pcm_24(),
            Some(&[-8_388_608i32, 8_388_607, -1][..])
        );
    }

    #[test]
    fn closed_reader_errors() {
        let mut reader = open(pcm16_mono(&[1]), None);
        reader.close();
        assert!(reader.closed());
        match reader.read(1) {
            Err(WavkitError::Io(e)) => assert_eq!(e.to_string(), "stream is closed"),
            other => panic!("Expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn duration_uses_native_rate() {
        let reader = open(pcm16_mono(&[0; 12000]), None);
        let duration = reader.total_duration();
        assert_eq!((duration.seconds, duration.milliseconds), (1, 500));
    }
}
