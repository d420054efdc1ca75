//! Temporal ↔ spatial reshaping.
//!
//! `temporal_to_spatial` gathers `cols * rows` consecutive frames into one
//! tiled frame, in raster order; `spatial_to_temporal` splits a tiled frame
//! back into its tiles, one per call.

use sphereframe_common::{SphereError, SphereResult};
use sphereframe_frame_model::{Compat, FrameDesc, PixelBuffer, Plane};

use super::{check_frames, check_inputs, to_u32};
use crate::module::{FrameModule, ModuleCategory, ModuleFlags, ModuleMetadata, Processed};
use crate::options::{OptionSet, OptionSpec};
use crate::state::ModuleState;

fn grid_options(module: &'static str) -> OptionSet {
    OptionSet::new(
        module,
        vec![
            OptionSpec::int("cols", "Tiles per row", 1, 16, 2),
            OptionSpec::int("rows", "Tiles per column", 1, 16, 2),
        ],
    )
}

fn grid(options: &OptionSet) -> SphereResult<(u32, u32)> {
    options.validate()?;
    Ok((to_u32(options.int("cols")?), to_u32(options.int("rows")?)))
}

/// Check that every plane of `tiled` is exactly a `cols x rows` grid of the
/// matching plane of `tile`.
fn check_tiling(tile: &FrameDesc, tiled: &FrameDesc, cols: u32, rows: u32) -> SphereResult<()> {
    for p in 0..tile.plane_count() {
        let (tw, th) = tile.plane_dims(p);
        let (w, h) = tiled.plane_dims(p);
        if (tw * cols, th * rows) != (w, h) {
            return Err(SphereError::configuration(format!(
                "plane {p} of a {}x{} {} frame does not split into a {cols}x{rows} grid",
                tiled.width, tiled.height, tiled.format
            )));
        }
    }
    Ok(())
}

/// Top-left corner of tile `slot` in a grid `cols` tiles wide.
fn tile_origin(slot: u32, cols: u32, tile_w: u32, tile_h: u32) -> (usize, u32) {
    (((slot % cols) * tile_w) as usize, (slot / cols) * tile_h)
}

fn paste_tile(tile: &Plane, dst: &mut Plane, slot: u32, cols: u32) {
    let (tw, th) = (tile.width(), tile.height());
    let (ox, oy) = tile_origin(slot, cols, tw, th);
    for y in 0..th {
        dst.row_mut(oy + y)[ox..ox + tw as usize].copy_from_slice(tile.row(y));
    }
}

fn cut_tile(src: &Plane, tile: &mut Plane, slot: u32, cols: u32) {
    let (tw, th) = (tile.width(), tile.height());
    let (ox, oy) = tile_origin(slot, cols, tw, th);
    for y in 0..th {
        tile.row_mut(y)
            .copy_from_slice(&src.row(oy + y)[ox..ox + tw as usize]);
    }
}

#[derive(Debug)]
struct Tiling {
    input: FrameDesc,
    cols: u32,
    output: PixelBuffer,
}

/// Accumulates `cols * rows` frames into one tiled frame.
#[derive(Debug)]
pub struct TemporalToSpatial {
    options: OptionSet,
    state: ModuleState,
    created: Option<Tiling>,
}

impl TemporalToSpatial {
    const NAME: &'static str = "temporal_to_spatial";

    pub fn new() -> Self {
        Self {
            options: grid_options(Self::NAME),
            state: ModuleState::new(),
            created: None,
        }
    }
}

impl Default for TemporalToSpatial {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameModule for TemporalToSpatial {
    fn metadata(&self) -> ModuleMetadata {
        ModuleMetadata {
            name: Self::NAME,
            category: ModuleCategory::Reshape,
            tooltip: "Tile consecutive frames into one larger frame",
            input_frames: 1,
            flags: ModuleFlags {
                requires_options: true,
                requires_new_window: true,
                skip_while_playing: false,
                variable_frame_count: true,
            },
        }
    }

    fn options(&self) -> &OptionSet {
        &self.options
    }

    fn options_mut(&mut self) -> &mut OptionSet {
        &mut self.options
    }

    fn create(&mut self, inputs: &[FrameDesc]) -> SphereResult<()> {
        let (cols, rows) = grid(&self.options)?;
        check_inputs(Self::NAME, inputs, 1, Compat::ALL)?;
        let input = inputs[0];
        let tiled = input.with_size(input.width * cols, input.height * rows);
        check_tiling(&input, &tiled, cols, rows)?;
        let output = PixelBuffer::new(tiled)?;

        tracing::debug!(cols, rows, width = tiled.width, height = tiled.height, "Created tiler");
        self.created = Some(Tiling {
            input,
            cols,
            output,
        });
        self.state.on_create(cols * rows);
        Ok(())
    }

    fn output_desc(&self) -> Option<FrameDesc> {
        self.created.as_ref().map(|c| *c.output.desc())
    }

    fn process(&mut self, inputs: &[&PixelBuffer]) -> SphereResult<Processed<'_>> {
        let created = self
            .created
            .as_mut()
            .ok_or_else(|| SphereError::not_created(Self::NAME))?;
        check_frames(Self::NAME, &[created.input], inputs)?;

        let slot = self.state.push_sub_frame()?;
        if slot == 0 {
            created.output.reset();
        }
        for (tile, dst) in inputs[0].planes().iter().zip(created.output.planes_mut()) {
            paste_tile(tile, dst, slot, created.cols);
        }

        if !self.state.is_ready() {
            return Ok(Processed::Pending);
        }
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

#[derive(Debug)]
struct Splitting {
    input: FrameDesc,
    cols: u32,
    held: PixelBuffer,
    output: PixelBuffer,
}

/// Splits one tiled frame into `cols * rows` frames over as many calls.
#[derive(Debug)]
pub struct SpatialToTemporal {
    options: OptionSet,
    state: ModuleState,
    created: Option<Splitting>,
}

impl SpatialToTemporal {
    const NAME: &'static str = "spatial_to_temporal";

    pub fn new() -> Self {
        Self {
            options: grid_options(Self::NAME),
            state: ModuleState::new(),
            created: None,
        }
    }
}

impl Default for SpatialToTemporal {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameModule for SpatialToTemporal {
    fn metadata(&self) -> ModuleMetadata {
        ModuleMetadata {
            name: Self::NAME,
            category: ModuleCategory::Reshape,
            tooltip: "Split a tiled frame into consecutive frames",
            input_frames: 1,
            flags: ModuleFlags {
                requires_options: true,
                requires_new_window: true,
                skip_while_playing: false,
                variable_frame_count: true,
            },
        }
    }

    fn options(&self) -> &OptionSet {
        &self.options
    }

    fn options_mut(&mut self) -> &mut OptionSet {
        &mut self.options
    }

    fn create(&mut self, inputs: &[FrameDesc]) -> SphereResult<()> {
        let (cols, rows) = grid(&self.options)?;
        check_inputs(Self::NAME, inputs, 1, Compat::ALL)?;
        let input = inputs[0];
        if input.width % cols != 0 || input.height % rows != 0 {
            return Err(SphereError::configuration(format!(
                "{}x{} frame does not split into a {cols}x{rows} grid",
                input.width, input.height
            )));
        }
        let tile = input.with_size(input.width / cols, input.height / rows);
        check_tiling(&tile, &input, cols, rows)?;
        let held = PixelBuffer::new(input)?;
        let output = PixelBuffer::new(tile)?;

        tracing::debug!(cols, rows, width = tile.width, height = tile.height, "Created splitter");
        self.created = Some(Splitting {
            input,
            cols,
            held,
            output,
        });
        self.state.on_create(cols * rows);
        Ok(())
    }

    fn output_desc(&self) -> Option<FrameDesc> {
        self.created.as_ref().map(|c| *c.output.desc())
    }

    fn need_frame(&self) -> bool {
        self.state.needs_input()
    }

    fn process(&mut self, inputs: &[&PixelBuffer]) -> SphereResult<Processed<'_>> {
        let created = self
            .created
            .as_mut()
            .ok_or_else(|| SphereError::not_created(Self::NAME))?;

        if self.state.needs_input() {
            check_frames(Self::NAME, &[created.input], inputs)?;
            created.held.copy_from(inputs[0])?;
            self.state.begin_drain()?;
        } else if !inputs.is_empty() {
            return Err(SphereError::processing(format!(
                "{} is still draining and takes no input",
                Self::NAME
            )));
        }

        let slot = self
            .state
            .next_drain_slot()
            .ok_or_else(|| SphereError::processing("splitter has nothing to drain"))?;
        for (src, tile) in created.held.planes().iter().zip(created.output.planes_mut()) {
            cut_tile(src, tile, slot, created.cols);
        }
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

    fn tile(desc: FrameDesc, value: i32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(desc).unwrap();
        for plane in buf.planes_mut() {
            plane.fill(value);
        }
        buf
    }

    #[test]
    fn tiler_places_frames_in_raster_order() {
        let desc = FrameDesc::new(2, 2, ChromaFormat::Yuv444);
        let mut module = TemporalToSpatial::new();
        module.set_option("cols", 3i64.into()).unwrap();
        module.set_option("rows", 1i64.into()).unwrap();
        module.create(&[desc]).unwrap();

        assert!(module.process(&[&tile(desc, 1)]).unwrap().is_pending());
        assert!(module.process(&[&tile(desc, 2)]).unwrap().is_pending());
        let out = module.process(&[&tile(desc, 3)]).unwrap().frame().cloned().unwrap();
        assert_eq!((out.width(), out.height()), (6, 2));
        assert_eq!(out.plane(0).row(1), &[1, 1, 2, 2, 3, 3]);
        assert_eq!(out.plane(2).get(5, 0), 3);
    }

    #[test]
    fn odd_tiles_of_subsampled_frames_are_rejected() {
        let mut module = TemporalToSpatial::new();
        let err = module
            .create(&[FrameDesc::new(3, 4, ChromaFormat::Yuv420)])
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn splitter_drains_without_input() {
        let tiled = FrameDesc::new(4, 2, ChromaFormat::Yuv400);
        let mut module = SpatialToTemporal::new();
        module.set_option("rows", 1i64.into()).unwrap();
        module.create(&[tiled]).unwrap();

        let frame = PixelBuffer::from_planes(tiled, vec![vec![1, 1, 2, 2, 1, 1, 2, 2]]).unwrap();
        assert!(module.need_frame());
        let first = module.process(&[&frame]).unwrap().frame().cloned().unwrap();
        assert_eq!(first.plane(0).samples(), &[1, 1, 1, 1]);
        assert!(!module.need_frame());
        assert!(module.process(&[&frame]).is_err());

        let second = module.process(&[]).unwrap().frame().cloned().unwrap();
        assert_eq!(second.plane(0).samples(), &[2, 2, 2, 2]);
        assert!(module.need_frame());
    }

    #[test]
    fn splitter_rejects_uneven_grids() {
        let mut module = SpatialToTemporal::new();
        module.set_option("cols", 3i64.into()).unwrap();
        let err = module
            .create(&[FrameDesc::new(8, 4, ChromaFormat::Yuv400)])
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
