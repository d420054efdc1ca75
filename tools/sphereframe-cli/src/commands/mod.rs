pub mod describe;
pub mod list;
pub mod loss;
pub mod packing;
pub mod run;

use anyhow::Context;
use sphereframe_common::AppConfig;
use sphereframe_frame_model::{ChromaFormat, FrameDesc};

use crate::FrameArgs;

/// Build the input frame description from arguments, filling gaps from config.
pub fn frame_desc(args: &FrameArgs, config: &AppConfig) -> anyhow::Result<FrameDesc> {
    let format_name = args
        .format
        .as_deref()
        .unwrap_or(&config.processing.pixel_format);
    let format: ChromaFormat = format_name
        .parse()
        .with_context(|| format!("pixel format '{format_name}'"))?;
    let desc = FrameDesc::new(args.width, args.height, format)
        .with_bit_depth(args.bit_depth.unwrap_or(config.processing.bit_depth))
        .with_signed(args.signed);
    desc.validate()?;
    Ok(desc)
}
