//! Streaming wav output. The header is written with zeroed size fields when the writer is
//! created and patched in place when it is closed.
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use crate::buffer::Buffer;
use crate::chunks::{data, padded, FactChunk, CHUNK_HEADER_SIZE};
use crate::duration::Duration;
use crate::format::{Format, UnvalidatedFormat};
use crate::header::{HeaderLayout, RIFF_SIZE_OFFSET};
use crate::log;
use crate::sampler::SamplerInfo;
use crate::{WavkitError, WavkitResult};

/// Writes sample buffers to a wav stream.
///
/// Call [`Writer::close`] when done. A writer dropped without being closed commits its
/// header anyway, but any error from doing so is only logged.
pub struct Writer<W: Write + Seek = BufWriter<File>> {
    writer: Option<W>,
    format: Format,
    header_size: u64,
    fact_offset: Option<u64>,
    data_size_offset: u64,
    data_bytes_written: u64,
    total_sample_frames: u64,
}

impl Writer<BufWriter<File>> {
    /// Creates (or truncates) the file at `path` and writes a provisional header.
    pub fn create<P: AsRef<Path>>(path: P, format: Format) -> WavkitResult<Self> {
        let f = File::create(path)?;
        Writer::new(BufWriter::new(f), format)
    }

    /// Creates a writer at `path`, passes it to `body`, and closes it however `body` exits.
    /// An error from `body` takes precedence over an error from closing.
    pub fn create_with<P, F, R>(path: P, format: Format, body: F) -> WavkitResult<R>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut Writer) -> WavkitResult<R>,
    {
        let mut writer = Writer::create(path, format)?;
        let result = body(&mut writer);
        let closed = writer.close();
        let value = result?;
        closed?;
        Ok(value)
    }
}

impl<W: Write + Seek> Writer<W> {
    pub fn new(writer: W, format: Format) -> WavkitResult<Self> {
        Self::with_sampler_info(writer, format, None)
    }

    /// Like [`Writer::new`], also writing a sampler chunk ahead of the sample data.
    pub fn with_sampler_info(
        mut writer: W,
        format: Format,
        sampler_info: Option<&SamplerInfo>,
    ) -> WavkitResult<Self> {
        let fmt = UnvalidatedFormat::from_format(&format)?;
        let fact = match format.sample_format().is_float() {
            true => Some(FactChunk::default()),
            false => None,
        };
        let layout = HeaderLayout::new(&fmt, fact.as_ref(), sampler_info);
        writer.write_all(&layout.bytes)?;

        Ok(Writer {
            writer: Some(writer),
            format,
            header_size: layout.len(),
            fact_offset: layout.fact_offset,
            data_size_offset: layout.data_size_offset,
            data_bytes_written: 0,
            total_sample_frames: 0,
        })
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    pub fn total_sample_frames(&self) -> u64 {
        self.total_sample_frames
    }

    /// Play time of the frames written so far.
    pub fn duration_written(&self) -> Duration {
        Duration::new(self.total_sample_frames, self.format.sample_rate())
    }

    pub fn closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Converts `buffer` to this writer's format and appends it.
    pub fn write(&mut self, buffer: &Buffer) -> WavkitResult<()> {
        if self.writer.is_none() {
            return Err(WavkitError::closed_stream());
        }

        let converted;
        let buffer = match buffer.format() == &self.format {
            true => buffer,
            false => {
                converted = buffer.convert(&self.format)?;
                &converted
            }
        };

        let mut bytes = Vec::new();
        data::encode(buffer.data(), &mut bytes);

        let data_size = self.data_bytes_written + bytes.len() as u64;
        let riff_size = self.header_size - CHUNK_HEADER_SIZE + padded(data_size);
        if riff_size > u32::MAX as u64 {
            return Err(WavkitError::invalid_format(format!(
                "Invalid data size: {} bytes (the RIFF size field cannot exceed {})",
                data_size,
                u32::MAX
            )));
        }

        let writer = self.writer.as_mut().ok_or_else(WavkitError::closed_stream)?;
        if let Err(e) = writer.write_all(&bytes) {
            // later writes overwrite whatever part of `bytes` made it out
            writer.seek(SeekFrom::Start(self.header_size + self.data_bytes_written))?;
            return Err(e.into());
        }
        self.data_bytes_written = data_size;
        self.total_sample_frames += buffer.frame_count() as u64;
        Ok(())
    }

    /// Pads the data chunk and patches the size fields, leaving the stream after the padded data.
    fn commit(&mut self) -> WavkitResult<()> {
        let writer = match self.writer.as_mut() {
            Some(writer) => writer,
            None => return Ok(()),
        };

        if self.data_bytes_written % 2 == 1 {
            writer.write_all(&[0])?;
        }
        let riff_size = self.header_size - CHUNK_HEADER_SIZE + padded(self.data_bytes_written);

        writer.seek(SeekFrom::Start(RIFF_SIZE_OFFSET))?;
        writer.write_all(&(riff_size as u32).to_le_bytes())?;

        writer.seek(SeekFrom::Start(self.data_size_offset))?;
        writer.write_all(&(self.data_bytes_written as u32).to_le_bytes())?;

        if let Some(fact_offset) = self.fact_offset {
            writer.seek(SeekFrom::Start(fact_offset))?;
            writer.write_all(&(self.total_sample_frames as u32).to_le_bytes())?;
        }

        writer.seek(SeekFrom::Start(
            self.header_size + padded(self.data_bytes_written),
        ))?;
        writer.flush()?;

        log!(
            log::Level::Debug,
            "Committed wav header: {} sample frames, {} data bytes",
            self.total_sample_frames,
            self.data_bytes_written
        );
        Ok(())
    }

    /// Finalizes the header and releases the stream. Closing again does nothing.
    pub fn close(&mut self) -> WavkitResult<()> {
        let committed = self.commit();
        self.writer = None;
        committed
    }

    /// Finalizes the header and returns the underlying stream.
    pub fn into_inner(mut self) -> WavkitResult<W> {
        let committed = self.commit();
        let writer = self.writer.take();
        committed?;
        writer.ok_or_else(WavkitError::closed_stream)
    }
}

impl<W: Write + Seek> Drop for Writer<W> {
    fn drop(&mut self) {
        if self.writer.is_none() {
            return;
        }
        log!(
            log::Level::Warn,
            "Writer dropped without being closed, committing the header"
        );
        if let Err(_e) = self.close() {
            log!(log::Level::Warn, "Failed to commit wav header on drop: {}", _e);
        }
    }
}
