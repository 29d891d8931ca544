///
/// Module containing functions and structs for working with Wav file headers: locating the
/// mandatory chunks of an existing file and laying out the header of a new one.
///
use std::fmt::Display;
use std::io::{ErrorKind, SeekFrom};

use crate::chunks::{
    le_u32, read_chunk, read_chunk_header, read_fully, skip_chunk, Chunk, ChunkHeader, ChunkKind,
    FactChunk, CHUNK_HEADER_SIZE, DATA, RIFF, WAVE,
};
use crate::format::UnvalidatedFormat;
use crate::log;
use crate::sampler::SamplerInfo;
use crate::{ReadSeek, WavkitError, WavkitResult};

pub const RIFF_HEADER_SIZE: usize = 12;
/// Offset of the RIFF size field from the start of the file.
pub const RIFF_SIZE_OFFSET: u64 = 4;

/// Everything learned about a file before its first sample byte.
#[derive(Debug, Clone, PartialEq)]
pub struct WavHeader {
    pub native_format: UnvalidatedFormat,
    pub sampler_info: Option<SamplerInfo>,
    /// Size declared in the RIFF header. Informational only.
    pub riff_size: u32,
    /// Absolute position of the first sample byte.
    pub data_offset: u64,
    /// Declared size of the data chunk, excluding any pad byte.
    pub data_size: u32,
}

impl Display for WavHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\ndata: (offset: {}, size: {})",
            self.native_format, self.data_offset, self.data_size
        )
    }
}

fn no_data_chunk() -> WavkitError {
    WavkitError::invalid_format("No data chunk found")
}

/// A chunk cut short by the end of the stream reads as a missing data chunk.
fn truncated_before_data(err: WavkitError) -> WavkitError {
    match err {
        WavkitError::Io(e) if e.kind() == ErrorKind::UnexpectedEof => no_data_chunk(),
        other => other,
    }
}

/// Reads the header of a wav file, leaving `reader` positioned at the first sample byte.
///
/// The first format chunk and the first sampler chunk are parsed, unknown chunks are
/// skipped, and scanning stops at the data chunk. A sampler chunk placed after the data
/// chunk is found by a second scan over the trailing chunks.
pub fn read_header(reader: &mut dyn ReadSeek) -> WavkitResult<WavHeader> {
    let mut riff = [0u8; RIFF_HEADER_SIZE];
    if !read_fully(reader, &mut riff)? {
        return Err(WavkitError::invalid_format(
            "Stream is too short to hold a RIFF header",
        ));
    }
    if riff[0..4] != RIFF {
        return Err(WavkitError::invalid_format(format!(
            "Not a RIFF file: expected \"RIFF\", found {:?}",
            String::from_utf8_lossy(&riff[0..4])
        )));
    }
    let riff_size = le_u32(&riff, 4);
    if riff[8..12] != WAVE {
        return Err(WavkitError::invalid_format(format!(
            "Not a WAVE file: expected \"WAVE\", found {:?}",
            String::from_utf8_lossy(&riff[8..12])
        )));
    }

    let mut native_format: Option<UnvalidatedFormat> = None;
    let mut sampler_info: Option<SamplerInfo> = None;

    loop {
        let header = read_chunk_header(reader)?.ok_or_else(no_data_chunk)?;
        match header.kind() {
            ChunkKind::Format if native_format.is_none() => {
                native_format = Some(read_chunk(reader, &header).map_err(truncated_before_data)?);
            }
            ChunkKind::Sampler if sampler_info.is_none() => {
                sampler_info = Some(read_chunk(reader, &header).map_err(truncated_before_data)?);
            }
            ChunkKind::Data => {
                let native_format = native_format.ok_or_else(|| {
                    WavkitError::invalid_format("Format chunk missing or appears after data chunk")
                })?;
                let data_offset = reader.stream_position()?;
                if sampler_info.is_none() {
                    sampler_info =
                        scan_trailing_chunks(reader, data_offset + header.padded_size())?;
                }
                reader.seek(SeekFrom::Start(data_offset))?;

                return Ok(WavHeader {
                    native_format,
                    sampler_info,
                    riff_size,
                    data_offset,
                    data_size: header.size,
                });
            }
            _ => {
                log!(log::Level::Trace, "Skipping chunk {}", header);
                skip_chunk(reader, &header)?;
            }
        }
    }
}

/// Looks for a sampler chunk after the data chunk. Running out of stream ends the scan.
fn scan_trailing_chunks(
    reader: &mut dyn ReadSeek,
    start: u64,
) -> WavkitResult<Option<SamplerInfo>> {
    reader.seek(SeekFrom::Start(start))?;
    while let Some(header) = read_chunk_header(reader)? {
        if header.kind() != ChunkKind::Sampler {
            skip_chunk(reader, &header)?;
            continue;
        }
        return match read_chunk::<SamplerInfo>(reader, &header) {
            Ok(info) => Ok(Some(info)),
            Err(WavkitError::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e),
        };
    }
    Ok(None)
}

/// The provisional header of a new file, with zeroed size fields, and where those fields are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLayout {
    pub bytes: Vec<u8>,
    /// Offset of the fact chunk's frame count, when a fact chunk is present.
    pub fact_offset: Option<u64>,
    pub data_size_offset: u64,
}

impl HeaderLayout {
    /// Lays out `RIFF`, `WAVE`, the format chunk, the optional fact and sampler chunks, and
    /// the data chunk header.
    pub fn new(
        fmt: &UnvalidatedFormat,
        fact: Option<&FactChunk>,
        sampler_info: Option<&SamplerInfo>,
    ) -> Self {
        let mut bytes = Vec::with_capacity(64);
        bytes.extend_from_slice(&RIFF);
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&WAVE);
        bytes.extend_from_slice(&fmt.as_bytes());

        let fact_offset = fact.map(|fact| {
            let offset = bytes.len() as u64 + CHUNK_HEADER_SIZE;
            bytes.extend_from_slice(&fact.as_bytes());
            offset
        });
        if let Some(info) = sampler_info {
            bytes.extend_from_slice(&info.as_bytes());
        }

        bytes.extend_from_slice(&ChunkHeader { id: DATA, size: 0 }.as_bytes());
        let data_size_offset = bytes.len() as u64 - 4;

        HeaderLayout {
            bytes,
            fact_offset,
            data_size_offset,
        }
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod header_tests {
    use super::*;
    use crate::chunks::fmt::fmt_tests::base_fmt_bytes;
    use crate::chunks::{padded, SMPL};
    use crate::sampler::{LoopType, SamplerLoop, SmpteTimecode};
    use std::io::Cursor;

    /// A chunk with its header and pad byte.
    pub(crate) fn chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut buf = ChunkHeader {
            id: *id,
            size: body.len() as u32,
        }
        .as_bytes()
        .to_vec();
        buf.extend_from_slice(body);
        if body.len() % 2 == 1 {
            buf.push(0);
        }
        buf
    }

    /// A RIFF/WAVE file holding `chunks` in order.
    pub(crate) fn riff(chunks: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = chunks.concat();
        let mut buf = Vec::with_capacity(12 + body.len());
        buf.extend_from_slice(&RIFF);
        buf.extend_from_slice(&(4 + body.len() as u32).to_le_bytes());
        buf.extend_from_slice(&WAVE);
        buf.extend_from_slice(&body);
        buf
    }

    pub(crate) fn pcm16_mono_fmt() -> Vec<u8> {
        chunk(b"fmt ", &base_fmt_bytes(1, 1, 8000, 16))
    }

    fn read(bytes: Vec<u8>) -> WavkitResult<(WavHeader, u64)> {
        let mut cursor = Cursor::new(bytes);
        let header = read_header(&mut cursor)?;
        Ok((header, cursor.position()))
    }

    fn assert_invalid(bytes: Vec<u8>, expected: &str) {
        match read(bytes) {
            Err(WavkitError::InvalidFormat(msg)) => {
                assert!(msg.contains(expected), "{:?} does not mention {:?}", msg, expected)
            }
            other => panic!("Expected InvalidFormat, got {:?}", other),
        }
    }

    fn sampler_info() -> SamplerInfo {
        SamplerInfo::new(
            1,
            2,
            125_000,
            69,
            0.0,
            0,
            SmpteTimecode::default(),
            vec![SamplerLoop::new(7, LoopType::Alternating, 0, 3, 0.0, 0).unwrap()],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn locates_data_after_unknown_chunks() {
        let bytes = riff(&[
            chunk(b"junk", &[1, 2, 3]),
            pcm16_mono_fmt(),
            chunk(b"LIST", &[0; 10]),
            chunk(b"data", &[1, 0, 2, 0]),
        ]);
        let (header, position) = read(bytes).unwrap();
        assert_eq!(header.native_format.channels, 1);
        assert_eq!(header.data_size, 4);
        assert_eq!(header.data_offset, position);
        assert_eq!(position, 12 + 12 + 24 + 18 + 8);
        assert_eq!(header.sampler_info, None);
    }

    #[test]
    fn only_the_first_format_chunk_counts() {
        let bytes = riff(&[
            pcm16_mono_fmt(),
            chunk(b"fmt ", &base_fmt_bytes(3, 2, 48000, 32)),
            chunk(b"data", &[]),
        ]);
        let (header, _) = read(bytes).unwrap();
        assert_eq!(header.native_format.audio_format, 1);
    }

    #[test]
    fn bad_riff_and_wave_tags() {
        let mut bytes = riff(&[pcm16_mono_fmt(), chunk(b"data", &[])]);
        bytes[0..4].copy_from_slice(b"RIFX");
        assert_invalid(bytes, "RIFF");

        let mut bytes = riff(&[pcm16_mono_fmt(), chunk(b"data", &[])]);
        bytes[8..12].copy_from_slice(b"AVI ");
        assert_invalid(bytes, "WAVE");

        assert_invalid(b"RIFF\x04\x00".to_vec(), "too short");
    }

    #[test]
    fn format_after_data_is_missing() {
        let bytes = riff(&[chunk(b"data", &[0, 0]), pcm16_mono_fmt()]);
        assert_invalid(bytes, "Format chunk missing");
    }

    #[test]
    fn stream_ending_before_data() {
        assert_invalid(riff(&[]), "No data chunk");
        assert_invalid(riff(&[pcm16_mono_fmt()]), "No data chunk");

        let mut truncated_header = riff(&[pcm16_mono_fmt()]);
        truncated_header.extend_from_slice(b"dat");
        assert_invalid(truncated_header, "No data chunk");

        let fmt = pcm16_mono_fmt();
        assert_invalid(riff(&[fmt[..14].to_vec()]), "No data chunk");
    }

    #[test]
    fn sampler_chunk_declaring_absent_data() {
        let mut bytes = riff(&[pcm16_mono_fmt()]);
        bytes.extend_from_slice(
            &ChunkHeader {
                id: SMPL,
                size: 0xFFFF_FFF0,
            }
            .as_bytes(),
        );
        let mut core = [0u8; 36];
        core[32..36].copy_from_slice(&0xFFFF_FF00u32.to_le_bytes());
        bytes.extend_from_slice(&core);
        assert_invalid(bytes, "No data chunk");
    }

    #[test]
    fn malformed_format_chunk_is_invalid() {
        let mut body = base_fmt_bytes(1, 1, 8000, 16);
        body.extend_from_slice(&3u16.to_le_bytes());
        let bytes = riff(&[chunk(b"fmt ", &body), chunk(b"data", &[])]);
        assert_invalid(bytes, "extension size");
    }

    #[test]
    fn finds_sampler_before_and_after_data() {
        let info = sampler_info();
        let before = riff(&[
            pcm16_mono_fmt(),
            info.as_bytes().to_vec(),
            chunk(b"data", &[0; 6]),
        ]);
        let (header, _) = read(before).unwrap();
        assert_eq!(header.sampler_info.as_ref(), Some(&info));

        let after = riff(&[
            pcm16_mono_fmt(),
            chunk(b"data", &[0; 3]),
            chunk(b"cue ", &[0; 4]),
            info.as_bytes().to_vec(),
        ]);
        let data_offset = 12 + 24 + 8;
        let (header, position) = read(after).unwrap();
        assert_eq!(header.sampler_info.as_ref(), Some(&info));
        assert_eq!(position, data_offset);
    }

    #[test]
    fn trailing_scan_tolerates_truncation_but_not_malformed_sampler() {
        let mut truncated = riff(&[pcm16_mono_fmt(), chunk(b"data", &[0; 2])]);
        truncated.extend_from_slice(&chunk(b"smpl", &[0; 36])[..20]);
        let (header, _) = read(truncated).unwrap();
        assert_eq!(header.sampler_info, None);

        let mut overrun = [0u8; 36];
        overrun[28..32].copy_from_slice(&2u32.to_le_bytes());
        let malformed = riff(&[
            pcm16_mono_fmt(),
            chunk(b"data", &[0; 2]),
            chunk(b"smpl", &overrun),
        ]);
        assert_invalid(malformed, "sampler chunk");
    }

    #[test]
    fn layout_records_size_fields() {
        let fmt = UnvalidatedFormat::from_format(
            &crate::Format::new(1, crate::SampleFormat::Float32, 8000).unwrap(),
        )
        .unwrap();
        let layout = HeaderLayout::new(&fmt, Some(&FactChunk::default()), None);
        assert_eq!(layout.len(), 12 + 24 + 12 + 8);
        assert_eq!(layout.fact_offset, Some(12 + 24 + 8));
        assert_eq!(layout.data_size_offset, layout.len() - 4);
        assert_eq!(padded(layout.len()), layout.len());

        let (header, _) = read(layout.bytes.clone()).unwrap();
        assert_eq!(header.native_format, fmt);
        assert_eq!(header.data_size, 0);
    }
}
