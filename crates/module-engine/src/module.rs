//! The frame-module contract.

use std::fmt;

use serde::Serialize;
use sphereframe_common::SphereResult;
use sphereframe_frame_model::{FrameDesc, PixelBuffer};

use crate::options::{OptionSet, OptionValue};

/// Grouping used by hosts to organise module lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleCategory {
    Projection360,
    FacePacking,
    Reshape,
}

impl ModuleCategory {
    pub const ALL: [ModuleCategory; 3] = [Self::Projection360, Self::FacePacking, Self::Reshape];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Projection360 => "projection360",
            Self::FacePacking => "face_packing",
            Self::Reshape => "reshape",
        }
    }

    /// Parse a category name, ignoring case and separators.
    pub fn parse(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().replace('_', "") == key)
    }
}

impl fmt::Display for ModuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory capability flags a host may use to schedule a module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModuleFlags {
    /// Options must be reviewed before `create`.
    pub requires_options: bool,
    /// Output geometry differs from the input, so it needs its own view.
    pub requires_new_window: bool,
    /// Too expensive to run on every frame during live playback.
    pub skip_while_playing: bool,
    /// Consumes or produces a varying number of frames per call.
    pub variable_frame_count: bool,
}

/// Static description of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleMetadata {
    pub name: &'static str,
    pub category: ModuleCategory,
    pub tooltip: &'static str,
    /// Frames passed to each `process` call. Modules flagged with
    /// `variable_frame_count` may take a different number once configured.
    pub input_frames: u32,
    pub flags: ModuleFlags,
}

/// Result of one `process` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processed<'a> {
    /// A completed frame, borrowed from the module's output buffer.
    Frame(&'a PixelBuffer),
    /// More input is needed before a frame can be produced.
    Pending,
}

impl<'a> Processed<'a> {
    pub fn frame(self) -> Option<&'a PixelBuffer> {
        match self {
            Self::Frame(frame) => Some(frame),
            Self::Pending => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// A frame-processing unit.
///
/// Hosts drive a module through `set_option*` → `create` → repeated
/// `need_frame`/`process` → optional `flush` → `destroy`. A failed `create`
/// leaves the module as it was before the call.
pub trait FrameModule: Send {
    fn metadata(&self) -> ModuleMetadata;

    fn options(&self) -> &OptionSet;

    fn options_mut(&mut self) -> &mut OptionSet;

    /// Apply an option value. Unknown names and type mismatches are rejected
    /// here; range checks happen in `create`.
    fn set_option(&mut self, name: &str, value: OptionValue) -> SphereResult<()> {
        self.options_mut().set(name, value)
    }

    /// Validate inputs and options, then allocate the output buffer.
    fn create(&mut self, inputs: &[FrameDesc]) -> SphereResult<()>;

    /// Description of the frames `process` emits, once created.
    fn output_desc(&self) -> Option<FrameDesc>;

    /// Whether the next `process` call must be given a new input frame.
    fn need_frame(&self) -> bool {
        true
    }

    /// Consume `inputs` and return a completed frame or [`Processed::Pending`].
    fn process(&mut self, inputs: &[&PixelBuffer]) -> SphereResult<Processed<'_>>;

    /// Reset counters to their initial values, keeping allocated buffers.
    fn flush(&mut self) -> bool;

    /// Release owned buffers and return to the uncreated state.
    fn destroy(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_names_parse_loosely() {
        assert_eq!(
            ModuleCategory::parse("Projection360"),
            Some(ModuleCategory::Projection360)
        );
        assert_eq!(
            ModuleCategory::parse("face-packing"),
            Some(ModuleCategory::FacePacking)
        );
        assert_eq!(ModuleCategory::parse("RESHAPE"), Some(ModuleCategory::Reshape));
        assert_eq!(ModuleCategory::parse("filters"), None);
    }

    #[test]
    fn processed_accessors() {
        assert!(Processed::Pending.is_pending());
        assert!(Processed::Pending.frame().is_none());
    }
}
