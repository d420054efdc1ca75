//! Equirectangular ↔ folded-square projection transform.
//!
//! An ERP plane of `2N x N` samples is resampled row by row onto a diamond:
//! row `y` keeps `L(y) = (N - |2y - N + 1|) * 2` samples (a triangular law,
//! from 2 at the poles to `2N - 2` at the equator), centred on the plane's
//! vertical axis. The diamond holds exactly `N * N` samples and is folded
//! into an `N x N` square:
//!
//! - the **central** band (the middle `N` columns) is stored in place;
//! - rows wider than `N` overhang into **wings**, which are mirrored into
//!   the empty corners of their *partner* row, the row whose span
//!   complements theirs to `N` (`a(y) + a(p) = N` with `a = L / 2`).
//!
//! The fold is an exact permutation of samples; all resampling loss comes
//! from the per-row kernel interpolation. Rows are periodic in longitude, so
//! both directions sample through the circular kernels.
//!
//! Planes of subsampled formats fold with their own geometry, so every
//! plane must be `2n x n` (ERP) or `n x n` (square) with `n` even.

use sphereframe_common::{SphereError, SphereResult};
use sphereframe_frame_model::{FrameDesc, PixelBuffer, Plane, SampleRange};

use crate::kernels::Kernel;

/// Half of the triangular row span `L(y)` for an `N`-row ERP plane.
pub fn half_span(n: u32, y: u32) -> u32 {
    let n = i64::from(n);
    let d = (2 * i64::from(y) - n + 1).abs();
    (n - d).max(0) as u32
}

/// Number of samples ERP row `y` keeps in the folded square: `L(y)`.
pub fn row_span(n: u32, y: u32) -> u32 {
    half_span(n, y) * 2
}

/// Row whose span complements `y`'s to `N`; the fold exchanges wings
/// between the two. The mapping is an involution within each hemisphere.
pub fn partner_row(n: u32, y: u32) -> u32 {
    let half = n / 2;
    if y < half {
        half - 1 - y
    } else {
        3 * half - 1 - y
    }
}

/// Diamond position `(row, dx)` stored at square sample `(x, y)`, where `dx`
/// is the offset from the diamond's centre in `-a(row)..a(row)`.
pub fn square_to_diamond(n: u32, x: u32, y: u32) -> (u32, i64) {
    let n_i = i64::from(n);
    let dx = i64::from(x) - n_i / 2;
    let a = i64::from(half_span(n, y));
    if (-a..a).contains(&dx) {
        (y, dx)
    } else if dx >= a {
        (partner_row(n, y), n_i - 1 - dx)
    } else {
        (partner_row(n, y), -n_i - 1 - dx)
    }
}

/// Square sample `(x, y)` storing diamond position `(row, dx)`.
/// Inverse of [`square_to_diamond`].
pub fn diamond_to_square(n: u32, row: u32, dx: i64) -> (u32, u32) {
    let n_i = i64::from(n);
    let half = n_i / 2;
    if (-half..half).contains(&dx) {
        ((dx + half) as u32, row)
    } else if dx >= half {
        ((n_i - 1 - dx + half) as u32, partner_row(n, row))
    } else {
        ((-n_i - 1 - dx + half) as u32, partner_row(n, row))
    }
}

/// Check that every plane of `desc` is `2n x n` with `n` even.
pub fn validate_erp(desc: &FrameDesc) -> SphereResult<()> {
    for p in 0..desc.plane_count() {
        let (w, h) = desc.plane_dims(p);
        if w != 2 * h || h < 2 || h % 2 != 0 {
            return Err(SphereError::unsupported_projection(format!(
                "ERP plane {p} is {w}x{h}; expected 2N x N with N even ({} {}x{})",
                desc.format, desc.width, desc.height
            )));
        }
    }
    Ok(())
}

/// Check that every plane of `desc` is `n x n` with `n` even.
pub fn validate_square(desc: &FrameDesc) -> SphereResult<()> {
    for p in 0..desc.plane_count() {
        let (w, h) = desc.plane_dims(p);
        if w != h || h < 2 || h % 2 != 0 {
            return Err(SphereError::unsupported_projection(format!(
                "square plane {p} is {w}x{h}; expected N x N with N even ({} {}x{})",
                desc.format, desc.width, desc.height
            )));
        }
    }
    Ok(())
}

/// Description of the square produced from an ERP frame.
pub fn square_desc_for(erp: &FrameDesc) -> SphereResult<FrameDesc> {
    validate_erp(erp)?;
    let square = erp.with_size(erp.height, erp.height);
    validate_square(&square)?;
    Ok(square)
}

/// Description of the ERP frame reconstructed from a square.
pub fn erp_desc_for(square: &FrameDesc) -> SphereResult<FrameDesc> {
    validate_square(square)?;
    let erp = square.with_size(square.width * 2, square.height);
    validate_erp(&erp)?;
    Ok(erp)
}

/// ERP column sampled for diamond position `(row, dx)`:
/// `tx = (dx + a + 0.5) * 2N / L - 0.5`, centre-aligned over the `2N` ring.
pub fn source_column(n: u32, row: u32, dx: i64) -> f64 {
    let a = i64::from(half_span(n, row));
    ((dx + a) as f64 + 0.5) * f64::from(2 * n) / (2 * a) as f64 - 0.5
}

/// Diamond offset sampled for ERP column `u` of `row`; inverse of
/// [`source_column`], so `diamond_offset(n, row, source_column(n, row, dx))`
/// is `dx` again.
pub fn diamond_offset(n: u32, row: u32, u: f64) -> f64 {
    let a = f64::from(half_span(n, row));
    (u + 0.5) * (2.0 * a) / f64::from(2 * n) - 0.5 - a
}

/// Fold one `2N x N` ERP plane into an `N x N` square plane.
pub fn downsample_plane(src: &Plane, dst: &mut Plane, kernel: Kernel, range: SampleRange) {
    let n = src.height();
    debug_assert_eq!(src.width(), 2 * n);
    debug_assert_eq!((dst.width(), dst.height()), (n, n));

    for y in 0..n {
        for x in 0..n {
            let (row, dx) = square_to_diamond(n, x, y);
            let tx = source_column(n, row, dx);
            dst.set(x, y, kernel.interpolate(src.row(row), tx, range));
        }
    }
}

/// Unfold one `N x N` square plane back into a `2N x N` ERP plane.
///
/// ERP column `u` of row `y` samples the gathered diamond row at
/// [`diamond_offset`] (shifted by `a(y)` to index the buffer).
pub fn upsample_plane(src: &Plane, dst: &mut Plane, kernel: Kernel, range: SampleRange) {
    let n = src.height();
    debug_assert_eq!(src.width(), n);
    debug_assert_eq!((dst.width(), dst.height()), (2 * n, n));

    let mut diamond_row = Vec::with_capacity(2 * n as usize);
    for y in 0..n {
        let a = i64::from(half_span(n, y));
        diamond_row.clear();
        for dx in -a..a {
            let (sx, sy) = diamond_to_square(n, y, dx);
            diamond_row.push(src.get(sx, sy));
        }
        kernel.resample_ring(&diamond_row, dst.row_mut(y), range);
    }
}

/// Fold an ERP frame into `dst`, which must be described by [`square_desc_for`].
pub fn erp_to_square(src: &PixelBuffer, dst: &mut PixelBuffer, kernel: Kernel) -> SphereResult<()> {
    let expected = square_desc_for(src.desc())?;
    if dst.desc() != &expected {
        return Err(SphereError::processing(
            "square destination does not match the ERP source",
        ));
    }
    let range = src.sample_range();
    for p in 0..src.plane_count() {
        downsample_plane(src.plane(p), dst.plane_mut(p), kernel, range);
    }
    Ok(())
}

/// Unfold a square frame into `dst`, which must be described by [`erp_desc_for`].
pub fn square_to_erp(src: &PixelBuffer, dst: &mut PixelBuffer, kernel: Kernel) -> SphereResult<()> {
    let expected = erp_desc_for(src.desc())?;
    if dst.desc() != &expected {
        return Err(SphereError::processing(
            "ERP destination does not match the square source",
        ));
    }
    let range = src.sample_range();
    for p in 0..src.plane_count() {
        upsample_plane(src.plane(p), dst.plane_mut(p), kernel, range);
    }
    Ok(())
}

/// Error statistics for one plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneError {
    pub mean_abs: f64,
    pub peak: u32,
}

/// Per-plane difference between an original frame and its reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionError {
    pub planes: Vec<PlaneError>,
}

impl ReconstructionError {
    /// Mean absolute error over all samples of all planes.
    pub fn overall_mean_abs(&self, original: &FrameDesc) -> f64 {
        let total: usize = original.capacity();
        if total == 0 {
            return 0.0;
        }
        let weighted: f64 = self
            .planes
            .iter()
            .enumerate()
            .map(|(p, e)| {
                let (w, h) = original.plane_dims(p);
                e.mean_abs * (w as usize * h as usize) as f64
            })
            .sum();
        weighted / total as f64
    }
}

/// Compare two frames sample by sample. Descriptions must match.
pub fn reconstruction_error(
    original: &PixelBuffer,
    reconstructed: &PixelBuffer,
) -> SphereResult<ReconstructionError> {
    if original.desc() != reconstructed.desc() {
        return Err(SphereError::processing(
            "cannot compare frames with different descriptions",
        ));
    }
    let planes = original
        .planes()
        .iter()
        .zip(reconstructed.planes())
        .map(|(a, b)| {
            let mut sum = 0u64;
            let mut peak = 0u32;
            for (&va, &vb) in a.samples().iter().zip(b.samples()) {
                let d = va.abs_diff(vb);
                sum += u64::from(d);
                peak = peak.max(d);
            }
            PlaneError {
                mean_abs: sum as f64 / a.len().max(1) as f64,
                peak,
            }
        })
        .collect();
    Ok(ReconstructionError { planes })
}
