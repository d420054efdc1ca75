use sphereframe_frame_model::{ChromaFormat, FacePacking, FrameDesc, PixelBuffer};
use sphereframe_processing_core::FaceRemapPlan;

fn face_frame(desc: FrameDesc, seed: i32) -> PixelBuffer {
    let mut buf = PixelBuffer::new(desc).unwrap();
    for (p, plane) in buf.planes_mut().iter_mut().enumerate() {
        let w = plane.width();
        for y in 0..plane.height() {
            for x in 0..w {
                let v = (seed * 31 + p as i32 * 7 + (y * w + x) as i32) % 256;
                plane.set(x, y, v);
            }
        }
    }
    buf
}

#[test]
fn cubemap_concat_then_extract_recovers_the_face() {
    let face = FrameDesc::new(8, 8, ChromaFormat::Yuv420);
    let faces: Vec<PixelBuffer> = (0..6).map(|i| face_frame(face, i)).collect();
    let sources: Vec<(FrameDesc, FacePacking)> =
        (0..6).map(|i| (face, FacePacking::single(i))).collect();

    let cubemap = FacePacking::cubemap_3x2();
    let concat = FaceRemapPlan::new(&sources, &cubemap, None).unwrap();
    assert_eq!(
        (concat.output_desc().width, concat.output_desc().height),
        (24, 16)
    );
    let inputs: Vec<&PixelBuffer> = faces.iter().collect();
    let mut packed = PixelBuffer::new(*concat.output_desc()).unwrap();
    concat.apply(&inputs, &mut packed).unwrap();

    let extract = FaceRemapPlan::new(
        &[(*concat.output_desc(), cubemap)],
        &FacePacking::single(2),
        None,
    )
    .unwrap();
    assert_eq!(extract.output_desc(), &face);
    let mut out = PixelBuffer::new(face).unwrap();
    extract.apply(&[&packed], &mut out).unwrap();
    assert_eq!(out, faces[2]);
}

#[test]
fn repack_there_and_back_is_lossless() {
    let desc = FrameDesc::new(16, 8, ChromaFormat::Yuv444);
    let a = FacePacking::parse("2 1 2 0 0 0 0 100 1 0 1 0 100").unwrap();
    let b = FacePacking::parse("2 2 1 0 0 1 90 100 0 1 0 270 100").unwrap();

    let forward = FaceRemapPlan::new(&[(desc, a.clone())], &b, None).unwrap();
    assert_eq!(
        (forward.output_desc().width, forward.output_desc().height),
        (8, 16)
    );
    let backward = FaceRemapPlan::new(&[(*forward.output_desc(), b)], &a, None).unwrap();
    assert_eq!(backward.output_desc(), &desc);

    let src = face_frame(desc, 3);
    let mut mid = PixelBuffer::new(*forward.output_desc()).unwrap();
    forward.apply(&[&src], &mut mid).unwrap();
    let mut back = PixelBuffer::new(desc).unwrap();
    backward.apply(&[&mid], &mut back).unwrap();
    assert_eq!(back, src);
}

#[test]
fn missing_faces_are_all_reported() {
    let desc = FrameDesc::new(8, 8, ChromaFormat::Yuv400);
    let err = FaceRemapPlan::new(
        &[(desc, FacePacking::single(0))],
        &FacePacking::cubemap_3x2(),
        None,
    )
    .unwrap_err();
    let message = err.to_string();
    assert!(err.is_configuration());
    assert!(message.contains("[1, 2, 3, 4, 5]"), "{message}");
}
