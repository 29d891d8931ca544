//! Module containing the buffer iterator for the Reader struct.
use crate::buffer::Buffer;
use crate::core::Reader;
use crate::{WavkitError, WavkitResult};

/// Iterates over a [`Reader`] in buffers of up to ``frames_per_buffer`` sample frames.
/// This should only be used via the ``buffers`` function on the Reader struct.
///
/// Iteration ends when the data is exhausted. Any other error is yielded once and ends
/// the iteration.
pub struct BufferIterator<'a> {
    reader: &'a mut Reader,
    frames_per_buffer: usize,
    finished: bool,
}

impl<'a> BufferIterator<'a> {
    pub fn new(reader: &'a mut Reader, frames_per_buffer: usize) -> BufferIterator<'a> {
        BufferIterator {
            reader,
            frames_per_buffer: frames_per_buffer.max(1),
            finished: false,
        }
    }
}

impl<'a> Iterator for BufferIterator<'a> {
    type Item = WavkitResult<Buffer>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.reader.read(self.frames_per_buffer) {
            Ok(buffer) => Some(Ok(buffer)),
            Err(WavkitError::EndOfData) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod iter_tests {
    use super::*;
    use crate::header::header_tests::{chunk, pcm16_mono_fmt, riff};
    use std::io::Cursor;

    #[test]
    fn yields_every_frame_once() {
        let body: Vec<u8> = (0..7i16).flat_map(|s| s.to_le_bytes()).collect();
        let bytes = riff(&[pcm16_mono_fmt(), chunk(b"data", &body)]);
        let mut reader = Reader::new(Box::new(Cursor::new(bytes)), None).unwrap();

        let sizes: Vec<usize> = reader
            .buffers(3)
            .map(|buffer| buffer.unwrap().frame_count())
            .collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(reader.current_sample_frame(), 7);
        assert_eq!(reader.buffers(3).count(), 0);
    }

    #[test]
    fn stops_after_an_error() {
        let mut bytes = riff(&[pcm16_mono_fmt(), chunk(b"data", &[0; 8])]);
        bytes.truncate(bytes.len() - 4);
        let mut reader = Reader::new(Box::new(Cursor::new(bytes)), None).unwrap();

        let results: Vec<WavkitResult<Buffer>> = reader.buffers(4).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(WavkitError::InvalidFormat(_))));
    }
}
