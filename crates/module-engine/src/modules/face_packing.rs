//! Face concatenation, extraction, and repacking.
//!
//! All three are a [`FaceRemapPlan`] built in `create` from option text and
//! input descriptions, then applied once per `process` call.

use sphereframe_common::{SphereError, SphereResult};
use sphereframe_frame_model::{Compat, FacePacking, FrameDesc, PixelBuffer};
use sphereframe_processing_core::FaceRemapPlan;

use super::{check_frames, check_inputs, to_u32};
use crate::module::{FrameModule, ModuleCategory, ModuleFlags, ModuleMetadata, Processed};
use crate::options::{OptionSet, OptionSpec};
use crate::state::ModuleState;

const MAX_FACE_EXTENT: i64 = 16384;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceRemapKind {
    /// K single-face frames → one packed frame.
    Concat,
    /// One packed frame → one face.
    Extract,
    /// One packed frame → another packed layout.
    Repack,
}

impl FaceRemapKind {
    fn metadata(self) -> ModuleMetadata {
        let (name, tooltip, input_frames, variable) = match self {
            Self::Concat => (
                "face_concat",
                "Pack several single-face frames into one frame",
                6,
                true,
            ),
            Self::Extract => (
                "face_extract",
                "Cut one face out of a packed frame",
                1,
                false,
            ),
            Self::Repack => (
                "face_repack",
                "Move, rotate, and rescale faces into a different packing",
                1,
                false,
            ),
        };
        ModuleMetadata {
            name,
            category: ModuleCategory::FacePacking,
            tooltip,
            input_frames,
            flags: ModuleFlags {
                requires_options: true,
                requires_new_window: true,
                skip_while_playing: false,
                variable_frame_count: variable,
            },
        }
    }

    fn option_specs(self) -> Vec<OptionSpec> {
        let cubemap = FacePacking::cubemap_3x2().to_string();
        let mut specs = match self {
            Self::Concat => vec![
                OptionSpec::int("inputs", "Number of face frames per call", 1, 64, 6),
                OptionSpec::text(
                    "input_face_ids",
                    "Face id of each input frame, space separated (empty: 0..K-1)",
                    "",
                ),
                OptionSpec::text("output_packing", "Packing of the output frame", cubemap),
            ],
            Self::Extract => vec![
                OptionSpec::text("input_packing", "Packing of the input frame", cubemap),
                OptionSpec::int("face_id", "Id of the face to extract", 0, 65535, 0),
            ],
            Self::Repack => vec![
                OptionSpec::text("input_packing", "Packing of the input frame", cubemap.clone()),
                OptionSpec::text("output_packing", "Packing of the output frame", cubemap),
            ],
        };
        specs.push(OptionSpec::int(
            "face_width",
            "Output face cell width in luma samples (0: keep input size)",
            0,
            MAX_FACE_EXTENT,
            0,
        ));
        specs.push(OptionSpec::int(
            "face_height",
            "Output face cell height in luma samples (0: keep input size)",
            0,
            MAX_FACE_EXTENT,
            0,
        ));
        specs
    }
}

#[derive(Debug)]
struct Created {
    plan: FaceRemapPlan,
    output: PixelBuffer,
}

#[derive(Debug)]
pub struct FaceRemapModule {
    kind: FaceRemapKind,
    options: OptionSet,
    state: ModuleState,
    created: Option<Created>,
}

impl FaceRemapModule {
    pub fn new(kind: FaceRemapKind) -> Self {
        Self {
            kind,
            options: OptionSet::new(kind.metadata().name, kind.option_specs()),
            state: ModuleState::new(),
            created: None,
        }
    }

    fn face_size(&self) -> SphereResult<Option<(u32, u32)>> {
        let w = to_u32(self.options.int("face_width")?);
        let h = to_u32(self.options.int("face_height")?);
        match (w, h) {
            (0, 0) => Ok(None),
            (0, _) | (_, 0) => Err(SphereError::configuration(
                "face_width and face_height must be set together",
            )),
            (w, h) => Ok(Some((w, h))),
        }
    }

    fn packing(&self, option: &str) -> SphereResult<FacePacking> {
        Ok(FacePacking::parse(self.options.text(option)?)?)
    }

    /// Face id of each input frame for concatenation.
    fn concat_ids(&self, count: usize) -> SphereResult<Vec<u32>> {
        let text = self.options.text("input_face_ids")?;
        if text.trim().is_empty() {
            return Ok((0..count as u32).collect());
        }
        let ids = text
            .split_whitespace()
            .map(|token| {
                token.parse::<u32>().map_err(|_| {
                    SphereError::configuration(format!("input_face_ids: '{token}' is not a face id"))
                })
            })
            .collect::<SphereResult<Vec<_>>>()?;
        if ids.len() != count {
            return Err(SphereError::configuration(format!(
                "input_face_ids lists {} ids for {count} inputs",
                ids.len()
            )));
        }
        for (i, id) in ids.iter().enumerate() {
            if let Some(j) = ids[..i].iter().position(|other| other == id) {
                return Err(SphereError::configuration(format!(
                    "input_face_ids: face id {id} is given to inputs {j} and {i}"
                )));
            }
        }
        Ok(ids)
    }

    fn build(&self, inputs: &[FrameDesc]) -> SphereResult<Created> {
        let name = self.kind.metadata().name;
        self.options.validate()?;
        let face_size = self.face_size()?;

        let plan = match self.kind {
            FaceRemapKind::Concat => {
                let count = to_u32(self.options.int("inputs")?) as usize;
                check_inputs(name, inputs, count, Compat::ALL)?;
                let ids = self.concat_ids(count)?;
                let sources: Vec<_> = inputs
                    .iter()
                    .zip(&ids)
                    .map(|(desc, &id)| (*desc, FacePacking::single(id)))
                    .collect();
                FaceRemapPlan::new(&sources, &self.packing("output_packing")?, face_size)?
            }
            FaceRemapKind::Extract => {
                check_inputs(name, inputs, 1, Compat::ALL)?;
                let face_id = to_u32(self.options.int("face_id")?);
                let sources = [(inputs[0], self.packing("input_packing")?)];
                FaceRemapPlan::new(&sources, &FacePacking::single(face_id), face_size)?
            }
            FaceRemapKind::Repack => {
                check_inputs(name, inputs, 1, Compat::ALL)?;
                let sources = [(inputs[0], self.packing("input_packing")?)];
                FaceRemapPlan::new(&sources, &self.packing("output_packing")?, face_size)?
            }
        };
        let output = PixelBuffer::new(*plan.output_desc())?;
        Ok(Created { plan, output })
    }
}

impl FrameModule for FaceRemapModule {
    fn metadata(&self) -> ModuleMetadata {
        let mut meta = self.kind.metadata();
        if self.kind == FaceRemapKind::Concat {
            if let Ok(count) = self.options.int("inputs") {
                meta.input_frames = to_u32(count);
            }
        }
        meta
    }

    fn options(&self) -> &OptionSet {
        &self.options
    }

    fn options_mut(&mut self) -> &mut OptionSet {
        &mut self.options
    }

    fn create(&mut self, inputs: &[FrameDesc]) -> SphereResult<()> {
        let created = self.build(inputs)?;
        tracing::debug!(
            module = self.kind.metadata().name,
            faces = created.plan.copies().len(),
            width = created.output.width(),
            height = created.output.height(),
            "Created face remap module"
        );
        self.created = Some(created);
        self.state.on_create(1);
        Ok(())
    }

    fn output_desc(&self) -> Option<FrameDesc> {
        self.created.as_ref().map(|c| *c.output.desc())
    }

    fn process(&mut self, inputs: &[&PixelBuffer]) -> SphereResult<Processed<'_>> {
        let name = self.kind.metadata().name;
        let created = self
            .created
            .as_mut()
            .ok_or_else(|| SphereError::not_created(name))?;
        check_frames(name, created.plan.source_descs(), inputs)?;
        created.plan.apply(inputs, &mut created.output)?;
        self.state.push_sub_frame()?;
        self.state.emit()?;
        Ok(Processed::Frame(&created.output))
    }

    fn flush(&mut self) -> bool {
        self.state.flush();
        self.created.is_some()
    }

    fn destroy(&mut self) {
        self.created = None;
        self.state.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sphereframe_frame_model::ChromaFormat;

    fn face(desc: FrameDesc, value: i32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(desc).unwrap();
        buf.plane_mut(0).fill(value);
        buf
    }

    #[test]
    fn concat_with_explicit_ids() {
        let desc = FrameDesc::new(4, 4, ChromaFormat::Yuv400);
        let mut module = FaceRemapModule::new(FaceRemapKind::Concat);
        module.set_option("inputs", 2i64.into()).unwrap();
        module.set_option("input_face_ids", "7 3".into()).unwrap();
        module
            .set_option("output_packing", "2 1 2 0 0 3 0 100 1 0 7 0 100".into())
            .unwrap();
        assert_eq!(module.metadata().input_frames, 2);
        module.create(&[desc, desc]).unwrap();

        let (a, b) = (face(desc, 10), face(desc, 20));
        let out = module.process(&[&a, &b]).unwrap().frame().cloned().unwrap();
        assert_eq!((out.width(), out.height()), (8, 4));
        assert_eq!(out.plane(0).get(0, 0), 20);
        assert_eq!(out.plane(0).get(4, 0), 10);
    }

    #[test]
    fn concat_rejects_duplicate_face_ids() {
        let desc = FrameDesc::new(4, 4, ChromaFormat::Yuv400);
        let mut module = FaceRemapModule::new(FaceRemapKind::Concat);
        module.set_option("inputs", 2i64.into()).unwrap();
        module.set_option("input_face_ids", "0 0".into()).unwrap();
        module
            .set_option("output_packing", "1 1 1 0 0 0 0 100".into())
            .unwrap();
        let err = module.create(&[desc, desc]).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("face id 0"), "{err}");
        assert!(module.output_desc().is_none());

        module.set_option("input_face_ids", "0 1".into()).unwrap();
        module
            .set_option("output_packing", "2 1 2 0 0 0 0 100 1 0 1 0 100".into())
            .unwrap();
        module.create(&[desc, desc]).unwrap();
    }

    #[test]
    fn rejected_frames_leave_the_module_ready() {
        let desc = FrameDesc::new(12, 8, ChromaFormat::Yuv420);
        let mut module = FaceRemapModule::new(FaceRemapKind::Repack);
        module.create(&[desc]).unwrap();

        let wrong = PixelBuffer::new(FrameDesc::new(12, 8, ChromaFormat::Yuv444)).unwrap();
        assert!(module.process(&[&wrong]).is_err());
        assert!(module.process(&[]).is_err());
        assert!(module.need_frame());
        for _ in 0..2 {
            let good = face(desc, 40);
            assert!(module.process(&[&good]).unwrap().frame().is_some());
        }
        assert_eq!(module.state.frames_emitted(), 2);
    }

    #[test]
    fn concat_rejects_mismatched_inputs() {
        let mut module = FaceRemapModule::new(FaceRemapKind::Concat);
        module.set_option("inputs", 2i64.into()).unwrap();
        module.set_option("output_packing", "2 1 2 0 0 0 0 100 1 0 1 0 100".into()).unwrap();
        let a = FrameDesc::new(4, 4, ChromaFormat::Yuv400);
        let b = FrameDesc::new(4, 4, ChromaFormat::Yuv400).with_bit_depth(10);
        let err = module.create(&[a, b]).unwrap_err();
        assert!(err.is_configuration());
        assert!(module.output_desc().is_none());
    }

    #[test]
    fn extract_of_missing_face_fails_create() {
        let mut module = FaceRemapModule::new(FaceRemapKind::Extract);
        module.set_option("face_id", 9i64.into()).unwrap();
        let err = module
            .create(&[FrameDesc::new(12, 8, ChromaFormat::Yuv420)])
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn malformed_packing_option_is_a_packing_error() {
        let mut module = FaceRemapModule::new(FaceRemapKind::Repack);
        module.set_option("input_packing", "2 1 1 0 0 0 0 100".into()).unwrap();
        let err = module
            .create(&[FrameDesc::new(12, 8, ChromaFormat::Yuv420)])
            .unwrap_err();
        assert!(matches!(err, SphereError::Packing { .. }));
    }

    #[test]
    fn face_size_needs_both_axes() {
        let mut module = FaceRemapModule::new(FaceRemapKind::Repack);
        module.set_option("face_width", 8i64.into()).unwrap();
        let err = module
            .create(&[FrameDesc::new(12, 8, ChromaFormat::Yuv420)])
            .unwrap_err();
        assert!(err.is_configuration());

        module.set_option("face_height", 8i64.into()).unwrap();
        module.create(&[FrameDesc::new(12, 8, ChromaFormat::Yuv420)]).unwrap();
        let out = module.output_desc().unwrap();
        assert_eq!((out.width, out.height), (24, 16));
    }

    #[test]
    fn out_of_range_face_id_fails_in_create() {
        let mut module = FaceRemapModule::new(FaceRemapKind::Extract);
        module.set_option("face_id", (-1i64).into()).unwrap();
        let err = module
            .create(&[FrameDesc::new(12, 8, ChromaFormat::Yuv420)])
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
