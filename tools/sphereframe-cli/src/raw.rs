//! Headerless planar frame files.
//!
//! Frames are stored back to back, planes in order, rows top to bottom.
//! Depths up to 8 bits use one byte per sample; deeper samples use two bytes,
//! little-endian. Signed content is stored in two's complement.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use anyhow::Context;
use sphereframe_frame_model::{FrameDesc, PixelBuffer};

fn bytes_per_sample(desc: &FrameDesc) -> usize {
    if desc.bit_depth <= 8 {
        1
    } else {
        2
    }
}

/// Bytes one frame of `desc` occupies on disk.
pub fn frame_bytes(desc: &FrameDesc) -> usize {
    desc.capacity() * bytes_per_sample(desc)
}

fn decode_sample(bytes: &[u8], signed: bool) -> i32 {
    match (bytes, signed) {
        ([b], false) => i32::from(*b),
        ([b], true) => i32::from(*b as i8),
        ([lo, hi], false) => i32::from(u16::from_le_bytes([*lo, *hi])),
        ([lo, hi], true) => i32::from(i16::from_le_bytes([*lo, *hi])),
        _ => 0,
    }
}

fn encode_sample(value: i32, width: usize, out: &mut Vec<u8>) {
    if width == 1 {
        out.push(value as u8);
    } else {
        out.extend_from_slice(&(value as u16).to_le_bytes());
    }
}

pub struct FrameReader {
    path: String,
    reader: BufReader<File>,
    desc: FrameDesc,
    bytes: Vec<u8>,
}

impl FrameReader {
    pub fn open(path: &Path, desc: FrameDesc) -> anyhow::Result<Self> {
        desc.validate()?;
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        Ok(Self {
            path: path.display().to_string(),
            reader: BufReader::new(file),
            desc,
            bytes: vec![0; frame_bytes(&desc)],
        })
    }

    /// Read the next frame, or `None` at a clean end of file.
    pub fn read_frame(&mut self) -> anyhow::Result<Option<PixelBuffer>> {
        let mut filled = 0;
        while filled < self.bytes.len() {
            match self.reader.read(&mut self.bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e).with_context(|| format!("reading {}", self.path)),
            }
        }
        if filled == 0 {
            return Ok(None);
        }
        if filled < self.bytes.len() {
            anyhow::bail!(
                "{} ends with a partial frame ({filled} of {} bytes)",
                self.path,
                self.bytes.len()
            );
        }

        let width = bytes_per_sample(&self.desc);
        let signed = self.desc.signed;
        let mut chunks = self.bytes.chunks_exact(width);
        let planes = (0..self.desc.plane_count())
            .map(|p| {
                let (w, h) = self.desc.plane_dims(p);
                chunks
                    .by_ref()
                    .take(w as usize * h as usize)
                    .map(|c| decode_sample(c, signed))
                    .collect()
            })
            .collect();
        Ok(Some(PixelBuffer::from_planes(self.desc, planes)?))
    }
}

pub struct FrameWriter {
    writer: BufWriter<File>,
    bytes: Vec<u8>,
}

impl FrameWriter {
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
            bytes: Vec::new(),
        })
    }

    pub fn write_frame(&mut self, frame: &PixelBuffer) -> anyhow::Result<()> {
        let width = bytes_per_sample(frame.desc());
        self.bytes.clear();
        for plane in frame.planes() {
            for &v in plane.samples() {
                encode_sample(v, width, &mut self.bytes);
            }
        }
        self.writer.write_all(&self.bytes)?;
        Ok(())
    }

    pub fn finish(mut self) -> anyhow::Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sphereframe_frame_model::ChromaFormat;

    #[test]
    fn ten_bit_frames_survive_a_file() {
        let desc = FrameDesc::new(4, 2, ChromaFormat::Yuv420).with_bit_depth(10);
        assert_eq!(frame_bytes(&desc), (8 + 2 + 2) * 2);
        let mut frame = PixelBuffer::new(desc).unwrap();
        for (i, v) in frame.plane_mut(0).samples_mut().iter_mut().enumerate() {
            *v = 1000 - i as i32 * 100;
        }

        let path = std::env::temp_dir().join("sphereframe_raw_10bit.yuv");
        let mut writer = FrameWriter::create(&path).unwrap();
        writer.write_frame(&frame).unwrap();
        writer.write_frame(&frame).unwrap();
        writer.finish().unwrap();

        let mut reader = FrameReader::open(&path, desc).unwrap();
        assert_eq!(reader.read_frame().unwrap(), Some(frame.clone()));
        assert_eq!(reader.read_frame().unwrap(), Some(frame));
        assert_eq!(reader.read_frame().unwrap(), None);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn signed_bytes_decode_negative() {
        assert_eq!(decode_sample(&[0xff], true), -1);
        assert_eq!(decode_sample(&[0xff], false), 255);
        assert_eq!(decode_sample(&[0x00, 0x80], true), -32768);
    }

    #[test]
    fn partial_frame_is_an_error() {
        let desc = FrameDesc::new(4, 4, ChromaFormat::Yuv400);
        let path = std::env::temp_dir().join("sphereframe_raw_partial.yuv");
        std::fs::write(&path, [0u8; 20]).unwrap();
        let mut reader = FrameReader::open(&path, desc).unwrap();
        assert!(reader.read_frame().is_err());
        std::fs::remove_file(&path).ok();
    }
}
