//! Validate and print a face-packing descriptor.

use std::path::Path;

use anyhow::Context;
use sphereframe_frame_model::FacePacking;

pub fn run(descriptor: &str) -> anyhow::Result<()> {
    let path = Path::new(descriptor);
    let text = if path.is_file() {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    } else {
        descriptor.to_string()
    };

    let packing = FacePacking::parse(&text)
        .map_err(|e| anyhow::anyhow!("Invalid packing descriptor: {e}"))?;

    println!(
        "Grid: {} row(s) x {} column(s), {} face(s)",
        packing.rows(),
        packing.cols(),
        packing.face_count()
    );
    for face in packing.faces() {
        println!(
            "  face {:>3} at ({}, {})  rotation {:>3}°  ratio {}%",
            face.face_id,
            face.grid_x,
            face.grid_y,
            face.rotation.degrees(),
            face.ratio_percent
        );
    }
    println!("\nCanonical form: {packing}");
    Ok(())
}
