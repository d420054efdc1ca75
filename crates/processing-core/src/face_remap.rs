//! Face-packing remap engine.
//!
//! Moves faces between packing layouts. A remap is planned once from frame
//! descriptions and descriptors ([`FaceRemapPlan::new`]), which is where
//! every configuration mismatch surfaces; applying the plan to pixels
//! ([`FaceRemapPlan::apply`]) then only checks that the frames still match
//! what was planned.
//!
//! # Algorithm
//!
//! For each output face, by id:
//! 1. **Locate** the input face with the same id across all sources.
//! 2. **Extract** its rectangle: origin = grid cell x cell size, size = cell
//!    size x ratio. Chroma planes use the cell halved along subsampled axes.
//! 3. **Rotate** by the difference between the two faces' rotations.
//! 4. **Resize** to the output face's size with box-overlap (area) weights.
//! 5. **Composite** into the output rectangle.
//!
//! Output samples not covered by any face keep the plane's neutral value.

use sphereframe_common::{SphereError, SphereResult};
use sphereframe_frame_model::{
    Compat, FacePacking, FaceSlot, FrameDesc, PixelBuffer, Plane, Rotation, SampleRange,
};

/// An axis-aligned rectangle in plane coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn fits_in(&self, width: u32, height: u32) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }
}

/// One face moved from a source frame into the output, per plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceCopy {
    pub face_id: u32,
    /// Index into the plan's sources.
    pub source: usize,
    pub rotation: Rotation,
    /// `(source rect, destination rect)` for each plane.
    pub planes: Vec<(Rect, Rect)>,
}

/// A validated, precomputed face remap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceRemapPlan {
    sources: Vec<FrameDesc>,
    output: FrameDesc,
    copies: Vec<FaceCopy>,
}

/// Luma cell size of a frame laid out on `packing`.
fn cell_size(desc: &FrameDesc, packing: &FacePacking) -> SphereResult<(u32, u32)> {
    let cell_w = desc.width / packing.cols();
    let cell_h = desc.height / packing.rows();
    if cell_w == 0 || cell_h == 0 {
        return Err(SphereError::configuration(format!(
            "{}x{} frame is too small for a {}x{} face grid",
            desc.width,
            desc.height,
            packing.rows(),
            packing.cols()
        )));
    }
    check_subsampled_cell(desc, cell_w, cell_h)?;
    Ok((cell_w, cell_h))
}

fn check_subsampled_cell(desc: &FrameDesc, cell_w: u32, cell_h: u32) -> SphereResult<()> {
    for p in 1..desc.plane_count() {
        let (sx, sy) = desc.format.subsampling(p);
        if cell_w % (1 << sx) != 0 || cell_h % (1 << sy) != 0 {
            return Err(SphereError::configuration(format!(
                "face cell {cell_w}x{cell_h} is not divisible by the {} chroma subsampling",
                desc.format
            )));
        }
    }
    Ok(())
}

/// Rectangle a face occupies in one plane, given the luma cell size.
fn face_rect(face: &FaceSlot, cell: (u32, u32), shift: (u32, u32)) -> Rect {
    let cw = cell.0 >> shift.0;
    let ch = cell.1 >> shift.1;
    Rect::new(
        face.grid_x * cw,
        face.grid_y * ch,
        face.scaled(cw),
        face.scaled(ch),
    )
}

impl FaceRemapPlan {
    /// Plan a remap from `sources` (one description and packing per input
    /// frame) into a frame laid out as `output_packing`.
    ///
    /// `face_size` is the luma cell size of the output grid; `None` keeps the
    /// cell size of the first matched input face.
    pub fn new(
        sources: &[(FrameDesc, FacePacking)],
        output_packing: &FacePacking,
        face_size: Option<(u32, u32)>,
    ) -> SphereResult<Self> {
        let Some((first, _)) = sources.first() else {
            return Err(SphereError::configuration("face remap needs at least one source"));
        };
        for (desc, _) in sources {
            desc.validate()?;
            if let Some(reason) = first.mismatch(desc, Compat::LAYOUT) {
                return Err(SphereError::configuration(format!(
                    "face sources disagree on {reason}"
                )));
            }
        }

        let cells = sources
            .iter()
            .map(|(desc, packing)| cell_size(desc, packing))
            .collect::<SphereResult<Vec<_>>>()?;

        // Resolve every output face before touching geometry so the error
        // lists all missing ids at once.
        let mut matched = Vec::with_capacity(output_packing.face_count());
        let mut missing = Vec::new();
        for out_face in output_packing.faces() {
            let found = sources.iter().enumerate().find_map(|(i, (_, packing))| {
                packing.face(out_face.face_id).map(|in_face| (i, *in_face))
            });
            match found {
                Some((source, in_face)) => matched.push((source, in_face, *out_face)),
                None => missing.push(out_face.face_id),
            }
        }
        if !missing.is_empty() {
            return Err(SphereError::configuration(format!(
                "output face id(s) {missing:?} have no matching input face"
            )));
        }

        let out_cell = match face_size {
            Some((w, h)) if w > 0 && h > 0 => (w, h),
            Some((w, h)) => {
                return Err(SphereError::configuration(format!(
                    "output face size {w}x{h} must be positive"
                )))
            }
            None => cells[matched[0].0],
        };
        let output = first.with_size(
            out_cell.0 * output_packing.cols(),
            out_cell.1 * output_packing.rows(),
        );
        output.validate()?;
        check_subsampled_cell(&output, out_cell.0, out_cell.1)?;

        let copies = matched
            .into_iter()
            .map(|(source, in_face, out_face)| {
                let desc = &sources[source].0;
                let planes = (0..desc.plane_count())
                    .map(|p| {
                        let shift = desc.format.subsampling(p);
                        let src = face_rect(&in_face, cells[source], shift);
                        let dst = face_rect(&out_face, out_cell, shift);
                        let (sw, sh) = desc.plane_dims(p);
                        let (dw, dh) = output.plane_dims(p);
                        if !src.fits_in(sw, sh) || !dst.fits_in(dw, dh) {
                            return Err(SphereError::configuration(format!(
                                "face {} does not fit plane {p}",
                                out_face.face_id
                            )));
                        }
                        Ok((src, dst))
                    })
                    .collect::<SphereResult<Vec<_>>>()?;
                Ok(FaceCopy {
                    face_id: out_face.face_id,
                    source,
                    rotation: in_face.rotation.delta_to(out_face.rotation),
                    planes,
                })
            })
            .collect::<SphereResult<Vec<_>>>()?;

        tracing::debug!(
            sources = sources.len(),
            faces = copies.len(),
            width = output.width,
            height = output.height,
            "Planned face remap"
        );

        Ok(Self {
            sources: sources.iter().map(|(d, _)| *d).collect(),
            output,
            copies,
        })
    }

    /// Description of the frame the plan writes.
    pub fn output_desc(&self) -> &FrameDesc {
        &self.output
    }

    pub fn source_descs(&self) -> &[FrameDesc] {
        &self.sources
    }

    pub fn copies(&self) -> &[FaceCopy] {
        &self.copies
    }

    /// Remap `sources` into `dst`. Frames must match the planned descriptions.
    pub fn apply(&self, sources: &[&PixelBuffer], dst: &mut PixelBuffer) -> SphereResult<()> {
        if sources.len() != self.sources.len() {
            return Err(SphereError::processing(format!(
                "face remap planned for {} source(s), got {}",
                self.sources.len(),
                sources.len()
            )));
        }
        for (i, (frame, planned)) in sources.iter().zip(&self.sources).enumerate() {
            if frame.desc() != planned {
                return Err(SphereError::processing(format!(
                    "source {i} changed format since the remap was planned"
                )));
            }
        }
        if dst.desc() != &self.output {
            return Err(SphereError::processing(
                "destination does not match the planned output",
            ));
        }

        dst.reset();
        let range = dst.sample_range();
        let mut scratch = Vec::new();
        for copy in &self.copies {
            let src_frame = sources[copy.source];
            for (p, (src_rect, dst_rect)) in copy.planes.iter().enumerate() {
                let (rw, rh) =
                    extract_rotated(src_frame.plane(p), *src_rect, copy.rotation, &mut scratch);
                resize_area_into(&scratch, rw, rh, dst.plane_mut(p), *dst_rect, range);
            }
        }
        Ok(())
    }
}

/// Copy `rect` out of `plane` into `out`, rotated clockwise by `rotation`.
/// Returns the dimensions of the rotated block.
pub fn extract_rotated(
    plane: &Plane,
    rect: Rect,
    rotation: Rotation,
    out: &mut Vec<i32>,
) -> (u32, u32) {
    let (w, h) = (rect.width, rect.height);
    let (ow, oh) = if rotation.swaps_axes() { (h, w) } else { (w, h) };
    out.clear();
    out.reserve(ow as usize * oh as usize);
    for oy in 0..oh {
        for ox in 0..ow {
            let (sx, sy) = match rotation {
                Rotation::R0 => (ox, oy),
                Rotation::R90 => (oy, h - 1 - ox),
                Rotation::R180 => (w - 1 - ox, h - 1 - oy),
                Rotation::R270 => (w - 1 - oy, ox),
            };
            out.push(plane.get(rect.x + sx, rect.y + sy));
        }
    }
    (ow, oh)
}

/// Box-overlap weights mapping `src_len` samples onto `dst_len` samples.
///
/// Each output sample averages the source samples its footprint covers,
/// weighted by the covered fraction. Equal lengths give identity weights.
pub fn area_weights(src_len: u32, dst_len: u32) -> Vec<Vec<(usize, f64)>> {
    let scale = f64::from(src_len) / f64::from(dst_len);
    (0..dst_len)
        .map(|i| {
            let start = f64::from(i) * scale;
            let end = (start + scale).min(f64::from(src_len));
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(src_len);
            let mut taps: Vec<(usize, f64)> = (first..last)
                .filter_map(|j| {
                    let lo = start.max(f64::from(j));
                    let hi = end.min(f64::from(j + 1));
                    let overlap = hi - lo;
                    (overlap > 1e-12).then_some((j as usize, overlap))
                })
                .collect();
            let total: f64 = taps.iter().map(|(_, w)| w).sum();
            if total > 0.0 {
                taps.iter_mut().for_each(|(_, w)| *w /= total);
            }
            taps
        })
        .collect()
}

/// Area-resize a `sw x sh` block into `rect` of `dst`.
pub fn resize_area_into(
    src: &[i32],
    sw: u32,
    sh: u32,
    dst: &mut Plane,
    rect: Rect,
    range: SampleRange,
) {
    if sw == rect.width && sh == rect.height {
        for y in 0..sh {
            let row = &src[(y * sw) as usize..((y + 1) * sw) as usize];
            let out = dst.row_mut(rect.y + y);
            out[rect.x as usize..(rect.x + sw) as usize].copy_from_slice(row);
        }
        return;
    }

    let wx = area_weights(sw, rect.width);
    let wy = area_weights(sh, rect.height);

    // Horizontal pass into f64 rows, then vertical pass into the plane.
    let mut tmp = vec![0.0f64; rect.width as usize * sh as usize];
    for y in 0..sh as usize {
        let row = &src[y * sw as usize..(y + 1) * sw as usize];
        for (x, taps) in wx.iter().enumerate() {
            tmp[y * rect.width as usize + x] =
                taps.iter().map(|&(j, w)| w * f64::from(row[j])).sum();
        }
    }
    for (y, taps) in wy.iter().enumerate() {
        let out = dst.row_mut(rect.y + y as u32);
        for x in 0..rect.width as usize {
            let v: f64 = taps
                .iter()
                .map(|&(j, w)| w * tmp[j * rect.width as usize + x])
                .sum();
            out[rect.x as usize + x] = range.clamp_f64(v);
        }
    }
}
