//! ERP ↔ folded-square projection modules.

use sphereframe_common::{SphereError, SphereResult};
use sphereframe_frame_model::{Compat, FrameDesc, PixelBuffer};
use sphereframe_processing_core::erp_square::{self, erp_desc_for, square_desc_for};
use sphereframe_processing_core::Kernel;

use super::{check_frames, check_inputs};
use crate::module::{FrameModule, ModuleCategory, ModuleFlags, ModuleMetadata, Processed};
use crate::options::{OptionSet, OptionSpec};
use crate::state::ModuleState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    ErpToSquare,
    SquareToErp,
    /// ERP → square → ERP, to inspect reconstruction loss.
    RoundTrip,
}

impl ProjectionMode {
    fn metadata(self) -> ModuleMetadata {
        let (name, tooltip) = match self {
            Self::ErpToSquare => (
                "erp_to_square",
                "Fold an equirectangular 2N x N frame into an N x N square",
            ),
            Self::SquareToErp => (
                "square_to_erp",
                "Unfold an N x N square back into a 2N x N equirectangular frame",
            ),
            Self::RoundTrip => (
                "erp_square_roundtrip",
                "Fold to a square and back to show the resampling loss",
            ),
        };
        ModuleMetadata {
            name,
            category: ModuleCategory::Projection360,
            tooltip,
            input_frames: 1,
            flags: ModuleFlags {
                requires_options: false,
                requires_new_window: self != Self::RoundTrip,
                skip_while_playing: true,
                variable_frame_count: false,
            },
        }
    }
}

#[derive(Debug)]
struct Created {
    input: FrameDesc,
    kernel: Kernel,
    output: PixelBuffer,
    /// Intermediate square used by the round trip.
    square: Option<PixelBuffer>,
}

/// One module type for the three projection directions.
#[derive(Debug)]
pub struct ProjectionModule {
    mode: ProjectionMode,
    options: OptionSet,
    state: ModuleState,
    created: Option<Created>,
}

impl ProjectionModule {
    pub fn new(mode: ProjectionMode) -> Self {
        let options = OptionSet::new(
            mode.metadata().name,
            vec![OptionSpec::text(
                "kernel",
                "Interpolation kernel: lanczos3 or cubic",
                Kernel::default().to_string(),
            )],
        );
        Self {
            mode,
            options,
            state: ModuleState::new(),
            created: None,
        }
    }

    fn build(&self, inputs: &[FrameDesc]) -> SphereResult<Created> {
        let name = self.mode.metadata().name;
        self.options.validate()?;
        check_inputs(name, inputs, 1, Compat::ALL)?;
        let kernel: Kernel = self.options.text("kernel")?.parse()?;
        let input = inputs[0];

        let (output_desc, square) = match self.mode {
            ProjectionMode::ErpToSquare => (square_desc_for(&input)?, None),
            ProjectionMode::SquareToErp => (erp_desc_for(&input)?, None),
            ProjectionMode::RoundTrip => {
                let square = PixelBuffer::new(square_desc_for(&input)?)?;
                (input, Some(square))
            }
        };
        Ok(Created {
            input,
            kernel,
            output: PixelBuffer::new(output_desc)?,
            square,
        })
    }
}

impl FrameModule for ProjectionModule {
    fn metadata(&self) -> ModuleMetadata {
        self.mode.metadata()
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
            module = self.mode.metadata().name,
            kernel = %created.kernel,
            width = created.output.width(),
            height = created.output.height(),
            "Created projection module"
        );
        self.created = Some(created);
        self.state.on_create(1);
        Ok(())
    }

    fn output_desc(&self) -> Option<FrameDesc> {
        self.created.as_ref().map(|c| *c.output.desc())
    }

    fn process(&mut self, inputs: &[&PixelBuffer]) -> SphereResult<Processed<'_>> {
        let name = self.mode.metadata().name;
        let created = self
            .created
            .as_mut()
            .ok_or_else(|| SphereError::not_created(name))?;
        check_frames(name, &[created.input], inputs)?;

        let frame = inputs[0];
        match (self.mode, created.square.as_mut()) {
            (ProjectionMode::ErpToSquare, _) => {
                erp_square::erp_to_square(frame, &mut created.output, created.kernel)?
            }
            (ProjectionMode::SquareToErp, _) => {
                erp_square::square_to_erp(frame, &mut created.output, created.kernel)?
            }
            (ProjectionMode::RoundTrip, Some(square)) => {
                erp_square::erp_to_square(frame, square, created.kernel)?;
                erp_square::square_to_erp(square, &mut created.output, created.kernel)?;
            }
            (ProjectionMode::RoundTrip, None) => {
                return Err(SphereError::processing("round trip lost its square buffer"))
            }
        }

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

    #[test]
    fn erp_to_square_halves_the_width() {
        let mut module = ProjectionModule::new(ProjectionMode::ErpToSquare);
        module
            .create(&[FrameDesc::new(64, 32, ChromaFormat::Yuv420)])
            .unwrap();
        let out = module.output_desc().unwrap();
        assert_eq!((out.width, out.height), (32, 32));
    }

    #[test]
    fn unknown_kernel_fails_create_without_partial_state() {
        let mut module = ProjectionModule::new(ProjectionMode::SquareToErp);
        module.set_option("kernel", "nearest".into()).unwrap();
        let err = module
            .create(&[FrameDesc::new(16, 16, ChromaFormat::Yuv400)])
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(module.output_desc().is_none());
        assert!(!module.state.is_created());
    }

    #[test]
    fn odd_geometry_is_an_unsupported_projection() {
        let mut module = ProjectionModule::new(ProjectionMode::ErpToSquare);
        let err = module
            .create(&[FrameDesc::new(30, 15, ChromaFormat::Yuv400)])
            .unwrap_err();
        assert!(matches!(err, SphereError::UnsupportedProjection { .. }));
    }

    #[test]
    fn round_trip_keeps_the_input_geometry() {
        let desc = FrameDesc::new(32, 16, ChromaFormat::Yuv444);
        let mut module = ProjectionModule::new(ProjectionMode::RoundTrip);
        module.set_option("kernel", "cubic".into()).unwrap();
        module.create(&[desc]).unwrap();
        assert_eq!(module.output_desc(), Some(desc));

        let frame = PixelBuffer::new(desc).unwrap();
        let out = module.process(&[&frame]).unwrap().frame().cloned().unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn rejected_frame_does_not_stall_the_window() {
        let desc = FrameDesc::new(32, 16, ChromaFormat::Yuv420);
        let mut module = ProjectionModule::new(ProjectionMode::ErpToSquare);
        module.create(&[desc]).unwrap();

        let wrong = PixelBuffer::new(FrameDesc::new(64, 32, ChromaFormat::Yuv420)).unwrap();
        assert!(module.process(&[&wrong]).is_err());
        assert!(!module.state.is_ready());

        let frame = PixelBuffer::new(desc).unwrap();
        assert!(module.process(&[&frame]).unwrap().frame().is_some());
        assert!(module.process(&[&frame]).unwrap().frame().is_some());
        assert_eq!(module.state.frames_emitted(), 2);
    }

    #[test]
    fn process_before_create_is_refused() {
        let mut module = ProjectionModule::new(ProjectionMode::ErpToSquare);
        let frame = PixelBuffer::new(FrameDesc::new(32, 16, ChromaFormat::Yuv400)).unwrap();
        let err = module.process(&[&frame]).unwrap_err();
        assert!(matches!(err, SphereError::NotCreated { .. }));
    }
}
