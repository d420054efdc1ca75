//! Multi-plane pixel buffers.

use crate::error::{FrameError, FrameResult};
use crate::format::{FrameDesc, SampleRange};

/// One 2D plane of samples, stored row-major without padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    width: u32,
    height: u32,
    data: Vec<i32>,
}

impl Plane {
    /// A `width x height` plane filled with `value`.
    pub fn new(width: u32, height: u32, value: i32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at `(x, y)`. Panics when out of bounds.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> i32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: i32) {
        let w = self.width as usize;
        self.data[y as usize * w + x as usize] = value;
    }

    pub fn row(&self, y: u32) -> &[i32] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.data[start..start + w]
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [i32] {
        let w = self.width as usize;
        let start = y as usize * w;
        &mut self.data[start..start + w]
    }

    pub fn samples(&self) -> &[i32] {
        &self.data
    }

    pub fn samples_mut(&mut self) -> &mut [i32] {
        &mut self.data
    }

    pub fn fill(&mut self, value: i32) {
        self.data.fill(value);
    }
}

/// A frame: planes sized from a [`FrameDesc`].
///
/// The plane set is fixed at construction; writers may change sample values
/// but never the geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    desc: FrameDesc,
    planes: Vec<Plane>,
}

impl PixelBuffer {
    /// Allocate a buffer for `desc` with every plane at its neutral value.
    pub fn new(desc: FrameDesc) -> FrameResult<Self> {
        desc.validate()?;
        let planes = (0..desc.plane_count())
            .map(|p| {
                let (w, h) = desc.plane_dims(p);
                Plane::new(w, h, desc.neutral_value(p))
            })
            .collect();
        Ok(Self { desc, planes })
    }

    /// Build a buffer from raw per-plane samples.
    ///
    /// Each vector must hold exactly `plane width * plane height` samples.
    /// Values are clamped into the description's sample range.
    pub fn from_planes(desc: FrameDesc, planes: Vec<Vec<i32>>) -> FrameResult<Self> {
        desc.validate()?;
        if planes.len() != desc.plane_count() {
            return Err(FrameError::DescMismatch {
                message: format!(
                    "{} planes supplied for format {} ({} expected)",
                    planes.len(),
                    desc.format,
                    desc.plane_count()
                ),
            });
        }
        let range = desc.sample_range();
        let planes = planes
            .into_iter()
            .enumerate()
            .map(|(p, mut data)| {
                let (w, h) = desc.plane_dims(p);
                let expected = w as usize * h as usize;
                if data.len() != expected {
                    return Err(FrameError::PlaneLength {
                        plane: p,
                        expected,
                        got: data.len(),
                    });
                }
                data.iter_mut().for_each(|v| *v = range.clamp(*v));
                Ok(Plane {
                    width: w,
                    height: h,
                    data,
                })
            })
            .collect::<FrameResult<Vec<_>>>()?;
        Ok(Self { desc, planes })
    }

    pub fn desc(&self) -> &FrameDesc {
        &self.desc
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn bit_depth(&self) -> u8 {
        self.desc.bit_depth
    }

    pub fn is_signed(&self) -> bool {
        self.desc.signed
    }

    pub fn sample_range(&self) -> SampleRange {
        self.desc.sample_range()
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Plane `index`. Panics when the format has fewer planes.
    pub fn plane(&self, index: usize) -> &Plane {
        &self.planes[index]
    }

    pub fn plane_mut(&mut self, index: usize) -> &mut Plane {
        &mut self.planes[index]
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn planes_mut(&mut self) -> &mut [Plane] {
        &mut self.planes
    }

    /// Total samples across all planes.
    pub fn capacity(&self) -> usize {
        self.planes.iter().map(Plane::len).sum()
    }

    /// Return every plane to its neutral value without reallocating.
    pub fn reset(&mut self) {
        for (p, plane) in self.planes.iter_mut().enumerate() {
            plane.fill(self.desc.neutral_value(p));
        }
    }

    /// Overwrite this buffer's samples with `other`'s. Descriptions must match.
    pub fn copy_from(&mut self, other: &PixelBuffer) -> FrameResult<()> {
        if self.desc != other.desc {
            return Err(FrameError::DescMismatch {
                message: format!("cannot copy {:?} into {:?}", other.desc, self.desc),
            });
        }
        for (dst, src) in self.planes.iter_mut().zip(&other.planes) {
            dst.data.copy_from_slice(&src.data);
        }
        Ok(())
    }
}
