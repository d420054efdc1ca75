//! Run a module over raw frame files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sphereframe_common::AppConfig;
use sphereframe_frame_model::{FrameDesc, PixelBuffer};
use sphereframe_module_engine::{ModuleHost, ModuleRegistry, OptionValue};

use super::frame_desc;
use crate::raw::{FrameReader, FrameWriter};
use crate::FrameArgs;

#[derive(Debug, Serialize)]
struct RunReport {
    module: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    inputs: Vec<PathBuf>,
    output: PathBuf,
    input_desc: FrameDesc,
    output_desc: Option<FrameDesc>,
    options: BTreeMap<String, OptionValue>,
    frames_in: u64,
    frames_out: u64,
}

/// Seed options the module declares from the user's processing defaults.
fn apply_config_defaults(host: &mut ModuleHost, config: &AppConfig) -> anyhow::Result<()> {
    let declared: Vec<&str> = host
        .module()
        .options()
        .specs()
        .iter()
        .map(|s| s.name)
        .collect();
    if declared.contains(&"kernel") {
        host.set_option("kernel", config.processing.kernel.as_str().into())?;
    }
    for name in ["input_packing", "output_packing"] {
        if declared.contains(&name) {
            host.set_option(name, config.processing.face_packing.as_str().into())?;
        }
    }
    Ok(())
}

/// Read one frame from every reader, or `None` once any input is exhausted.
fn read_batch(readers: &mut [FrameReader]) -> anyhow::Result<Option<Vec<PixelBuffer>>> {
    let mut batch = Vec::with_capacity(readers.len());
    for reader in readers.iter_mut() {
        match reader.read_frame()? {
            Some(frame) => batch.push(frame),
            None => return Ok(None),
        }
    }
    Ok(Some(batch))
}

/// Drive `host` until the inputs run out or `limit` input frames have been
/// consumed, writing every emitted frame straight from the module's buffer.
/// Returns the input and output frame counts.
fn pump(
    host: &mut ModuleHost,
    readers: &mut [FrameReader],
    writer: &mut FrameWriter,
    limit: Option<u64>,
) -> anyhow::Result<(u64, u64)> {
    let mut frames_in = 0u64;
    let mut frames_out = 0u64;
    loop {
        let batch = if host.need_frame() {
            if limit.is_some_and(|limit| frames_in >= limit) {
                break;
            }
            let Some(batch) = read_batch(readers)? else {
                break;
            };
            frames_in += 1;
            Some(batch)
        } else {
            None
        };
        let refs: Vec<&PixelBuffer> = batch.iter().flatten().collect();
        if let Some(out) = host.process(&refs)?.frame() {
            writer.write_frame(out)?;
            frames_out += 1;
        }
    }
    Ok((frames_in, frames_out))
}

pub fn run(
    config: &AppConfig,
    module: &str,
    inputs: &[PathBuf],
    frame: &FrameArgs,
    set: &[String],
    output: &Path,
    report: Option<PathBuf>,
) -> anyhow::Result<()> {
    let started_at = Utc::now();
    let registry = ModuleRegistry::with_builtins();
    let mut host = ModuleHost::new(registry.create_instance(module)?);
    apply_config_defaults(&mut host, config)?;
    for assignment in set {
        host.set_option_str(assignment)?;
    }

    let expected = host.metadata().input_frames as usize;
    if inputs.len() != expected {
        anyhow::bail!(
            "{module} takes {expected} input file(s) per frame, got {}",
            inputs.len()
        );
    }

    let desc = frame_desc(frame, config)?;
    host.try_create(&vec![desc; inputs.len()])?;
    let output_desc = host.output_desc();

    let mut readers = inputs
        .iter()
        .map(|path| FrameReader::open(path, desc))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let mut writer = FrameWriter::create(output)?;

    let (frames_in, frames_out) = pump(&mut host, &mut readers, &mut writer, frame.frames)?;
    writer.finish()?;

    tracing::info!(module, frames_in, frames_out, output = %output.display(), "Run complete");
    println!("{module}: {frames_in} frame(s) in, {frames_out} frame(s) out");
    if let Some(out) = output_desc {
        println!(
            "  Output: {}x{} {} {}-bit -> {}",
            out.width,
            out.height,
            out.format,
            out.bit_depth,
            output.display()
        );
    }

    if let Some(report_path) = report {
        let report = RunReport {
            module: module.to_string(),
            started_at,
            finished_at: Utc::now(),
            inputs: inputs.to_vec(),
            output: output.to_path_buf(),
            input_desc: desc,
            output_desc,
            options: host.module().options().to_map(),
            frames_in,
            frames_out,
        };
        std::fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;
        tracing::info!(report = %report_path.display(), "Wrote run report");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sphereframe_frame_model::ChromaFormat;

    fn write_frames(path: &Path, frames: &[PixelBuffer]) {
        let mut writer = FrameWriter::create(path).unwrap();
        for frame in frames {
            writer.write_frame(frame).unwrap();
        }
        writer.finish().unwrap();
    }

    fn read_all(path: &Path, desc: FrameDesc) -> Vec<PixelBuffer> {
        let mut reader = FrameReader::open(path, desc).unwrap();
        std::iter::from_fn(|| reader.read_frame().unwrap()).collect()
    }

    fn split_run(name: &str, limit: Option<u64>) -> ((u64, u64), Vec<PixelBuffer>) {
        let tiled = FrameDesc::new(4, 4, ChromaFormat::Yuv400);
        let mut frames = Vec::new();
        for base in [0, 100] {
            let mut frame = PixelBuffer::new(tiled).unwrap();
            for (i, v) in frame.plane_mut(0).samples_mut().iter_mut().enumerate() {
                *v = base + i as i32;
            }
            frames.push(frame);
        }
        let input = std::env::temp_dir().join(format!("sphereframe_{name}_in.yuv"));
        let output = std::env::temp_dir().join(format!("sphereframe_{name}_out.yuv"));
        write_frames(&input, &frames);

        let mut host = ModuleHost::new(
            ModuleRegistry::with_builtins()
                .create_instance("spatial_to_temporal")
                .unwrap(),
        );
        host.try_create(&[tiled]).unwrap();
        let tile = host.output_desc().unwrap();
        let mut readers = vec![FrameReader::open(&input, tiled).unwrap()];
        let mut writer = FrameWriter::create(&output).unwrap();
        let counts = pump(&mut host, &mut readers, &mut writer, limit).unwrap();
        writer.finish().unwrap();

        let written = read_all(&output, tile);
        std::fs::remove_file(&input).ok();
        std::fs::remove_file(&output).ok();
        (counts, written)
    }

    #[test]
    fn splitter_output_is_written_for_every_drained_tile() {
        let ((frames_in, frames_out), tiles) = split_run("pump_all", None);
        assert_eq!((frames_in, frames_out), (2, 8));
        assert_eq!(tiles.len(), 8);
        assert_eq!(tiles[0].plane(0).row(0), &[0, 1]);
        assert_eq!(tiles[3].plane(0).row(1), &[14, 15]);
        assert_eq!(tiles[4].plane(0).row(0), &[100, 101]);
    }

    #[test]
    fn frame_limit_counts_inputs_not_outputs() {
        let ((frames_in, frames_out), tiles) = split_run("pump_limit", Some(1));
        assert_eq!((frames_in, frames_out), (1, 4));
        assert_eq!(tiles.len(), 4);
    }
}
