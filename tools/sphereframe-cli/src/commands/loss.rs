//! Measure ERP ↔ square reconstruction loss.

use std::path::Path;

use serde::Serialize;
use sphereframe_common::AppConfig;
use sphereframe_frame_model::PixelBuffer;
use sphereframe_processing_core::erp_square::{erp_desc_for, square_desc_for};
use sphereframe_processing_core::{erp_to_square, reconstruction_error, square_to_erp, Kernel};

use super::frame_desc;
use crate::raw::FrameReader;
use crate::FrameArgs;

#[derive(Debug, Default, Serialize)]
struct PlaneLoss {
    mean_abs: f64,
    peak: u32,
}

#[derive(Debug, Serialize)]
struct LossReport {
    kernel: String,
    frames: u64,
    planes: Vec<PlaneLoss>,
    overall_mean_abs: f64,
}

pub fn run(
    config: &AppConfig,
    input: &Path,
    frame: &FrameArgs,
    kernel: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let kernel: Kernel = kernel
        .as_deref()
        .unwrap_or(&config.processing.kernel)
        .parse()?;
    let desc = frame_desc(frame, config)?;
    let square_desc = square_desc_for(&desc)?;

    let mut reader = FrameReader::open(input, desc)?;
    let mut square = PixelBuffer::new(square_desc)?;
    let mut back = PixelBuffer::new(erp_desc_for(&square_desc)?)?;

    let mut planes: Vec<PlaneLoss> = (0..desc.plane_count()).map(|_| PlaneLoss::default()).collect();
    let mut overall = 0.0;
    let mut frames = 0u64;
    while frame.frames.map_or(true, |limit| frames < limit) {
        let Some(erp) = reader.read_frame()? else {
            break;
        };
        erp_to_square(&erp, &mut square, kernel)?;
        square_to_erp(&square, &mut back, kernel)?;
        let err = reconstruction_error(&erp, &back)?;
        for (acc, plane) in planes.iter_mut().zip(&err.planes) {
            acc.mean_abs += plane.mean_abs;
            acc.peak = acc.peak.max(plane.peak);
        }
        overall += err.overall_mean_abs(&desc);
        frames += 1;
        tracing::debug!(frame = frames, mae = err.overall_mean_abs(&desc), "Measured frame");
    }
    if frames == 0 {
        anyhow::bail!("{} holds no complete frame", input.display());
    }
    for plane in &mut planes {
        plane.mean_abs /= frames as f64;
    }

    let report = LossReport {
        kernel: kernel.to_string(),
        frames,
        planes,
        overall_mean_abs: overall / frames as f64,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "ERP {}x{} -> square {}x{} -> ERP ({}, {} frame(s))",
        desc.width, desc.height, square_desc.width, square_desc.height, report.kernel, frames
    );
    for (p, plane) in report.planes.iter().enumerate() {
        println!(
            "  plane {p}: mean abs error {:.3}, peak {}",
            plane.mean_abs, plane.peak
        );
    }
    println!("  overall: {:.3}", report.overall_mean_abs);
    Ok(())
}
