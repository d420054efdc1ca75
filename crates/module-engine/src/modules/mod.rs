//! Built-in modules.

mod face_packing;
mod projection;
mod reshape;

pub use face_packing::{FaceRemapKind, FaceRemapModule};
pub use projection::{ProjectionMode, ProjectionModule};
pub use reshape::{SpatialToTemporal, TemporalToSpatial};

use sphereframe_common::{SphereError, SphereResult};
use sphereframe_frame_model::{Compat, FrameDesc, PixelBuffer};

use crate::module::FrameModule;

/// Constructors for every built-in module.
pub fn builtin_factories() -> Vec<fn() -> Box<dyn FrameModule>> {
    let factories: [fn() -> Box<dyn FrameModule>; 8] = [
        || Box::new(ProjectionModule::new(ProjectionMode::ErpToSquare)),
        || Box::new(ProjectionModule::new(ProjectionMode::SquareToErp)),
        || Box::new(ProjectionModule::new(ProjectionMode::RoundTrip)),
        || Box::new(FaceRemapModule::new(FaceRemapKind::Concat)),
        || Box::new(FaceRemapModule::new(FaceRemapKind::Extract)),
        || Box::new(FaceRemapModule::new(FaceRemapKind::Repack)),
        || Box::new(TemporalToSpatial::new()),
        || Box::new(SpatialToTemporal::new()),
    ];
    factories.to_vec()
}

/// Check that `inputs` has `count` descriptions that agree under `compat`,
/// and that each is valid on its own.
pub(crate) fn check_inputs(
    module: &str,
    inputs: &[FrameDesc],
    count: usize,
    compat: Compat,
) -> SphereResult<()> {
    if inputs.len() != count {
        return Err(SphereError::configuration(format!(
            "{module} expects {count} input frame(s), got {}",
            inputs.len()
        )));
    }
    for desc in inputs {
        desc.validate()?;
    }
    if let Some(first) = inputs.first() {
        for (i, desc) in inputs.iter().enumerate().skip(1) {
            if let Some(reason) = first.mismatch(desc, compat) {
                return Err(SphereError::configuration(format!(
                    "{module}: input {i} differs from input 0 in {reason}"
                )));
            }
        }
    }
    Ok(())
}

/// Check that the frames handed to `process` match what `create` saw.
pub(crate) fn check_frames(
    module: &str,
    expected: &[FrameDesc],
    frames: &[&PixelBuffer],
) -> SphereResult<()> {
    if frames.len() != expected.len() {
        return Err(SphereError::processing(format!(
            "{module} expects {} frame(s) per call, got {}",
            expected.len(),
            frames.len()
        )));
    }
    for (i, (frame, desc)) in frames.iter().zip(expected).enumerate() {
        if frame.desc() != desc {
            return Err(SphereError::processing(format!(
                "{module}: frame {i} does not match the description given to create"
            )));
        }
    }
    Ok(())
}

/// Convert a checked integer option into a `u32`.
pub(crate) fn to_u32(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(0)
}
