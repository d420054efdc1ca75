use proptest::prelude::*;

use sphereframe_frame_model::{ChromaFormat, FacePacking, FrameDesc, PixelBuffer};
use sphereframe_module_engine::{ModuleHost, ModulePhase, ModuleRegistry, ModuleState};

fn frame(desc: FrameDesc, value: i32) -> PixelBuffer {
    let mut buf = PixelBuffer::new(desc).unwrap();
    buf.plane_mut(0).fill(value);
    buf
}

fn host(name: &str) -> ModuleHost {
    ModuleHost::new(ModuleRegistry::with_builtins().create_instance(name).unwrap())
}

#[test]
fn one_in_one_out_needs_a_frame_before_and_after_flush() {
    let mut host = host("erp_to_square");
    let desc = FrameDesc::new(32, 16, ChromaFormat::Yuv420);
    assert!(host.create(&[desc]));
    assert!(host.need_frame());

    let input = frame(desc, 60);
    assert!(host.process(&[&input]).unwrap().frame().is_some());
    assert!(host.need_frame());
    assert!(host.flush());
    assert!(host.need_frame());
    assert!(host.process(&[&input]).unwrap().frame().is_some());
}

#[test]
fn tiler_is_pending_until_the_window_fills_periodically() {
    let mut host = host("temporal_to_spatial");
    host.set_option_str("cols=2").unwrap();
    host.set_option_str("rows=2").unwrap();
    let desc = FrameDesc::new(4, 4, ChromaFormat::Yuv420);
    assert!(host.create(&[desc]));

    for cycle in 0..3 {
        for call in 1..=4 {
            let input = frame(desc, cycle * 10 + call);
            let out = host.process(&[&input]).unwrap();
            if call < 4 {
                assert!(out.is_pending(), "cycle {cycle} call {call}");
                assert!(host.need_frame(), "partial tile grid still takes input");
            } else {
                let out = out.frame().unwrap();
                assert_eq!(out.plane(0).get(0, 0), cycle * 10 + 1);
                assert_eq!(out.plane(0).get(7, 7), cycle * 10 + 4);
            }
        }
    }
}

#[test]
fn flush_mid_window_restarts_the_tile_sequence() {
    let mut host = host("temporal_to_spatial");
    host.set_option_str("cols=2").unwrap();
    host.set_option_str("rows=1").unwrap();
    let desc = FrameDesc::new(2, 2, ChromaFormat::Yuv400);
    assert!(host.create(&[desc]));

    assert!(host.process(&[&frame(desc, 1)]).unwrap().is_pending());
    assert!(host.flush());
    assert!(host.process(&[&frame(desc, 5)]).unwrap().is_pending());
    let out = host.process(&[&frame(desc, 6)]).unwrap().frame().cloned().unwrap();
    assert_eq!(out.plane(0).row(0), &[5, 5, 6, 6]);
}

#[test]
fn splitter_then_tiler_restores_the_frame() {
    let tiled = FrameDesc::new(8, 4, ChromaFormat::Yuv420);
    let mut original = PixelBuffer::new(tiled).unwrap();
    for (i, v) in original.plane_mut(0).samples_mut().iter_mut().enumerate() {
        *v = i as i32;
    }

    let mut split = host("spatial_to_temporal");
    let mut join = host("temporal_to_spatial");
    assert!(split.create(&[tiled]));
    let tile = split.output_desc().unwrap();
    assert!(join.create(&[tile]));

    let mut rebuilt = None;
    let mut fed = false;
    for _ in 0..4 {
        let piece = if split.need_frame() {
            assert!(!fed);
            fed = true;
            split.process(&[&original]).unwrap().frame().cloned().unwrap()
        } else {
            split.process(&[]).unwrap().frame().cloned().unwrap()
        };
        if let Some(out) = join.process(&[&piece]).unwrap().frame() {
            rebuilt = Some(out.clone());
        }
    }
    assert!(split.need_frame());
    assert_eq!(rebuilt.unwrap(), original);
}

#[test]
fn unmatched_ids_fail_create_for_concat_and_extract() {
    let face = FrameDesc::new(4, 4, ChromaFormat::Yuv400);
    let mut concat = host("face_concat");
    concat.set_option_str("inputs=2").unwrap();
    concat
        .set_option_str(&format!("output_packing={}", FacePacking::cubemap_3x2()))
        .unwrap();
    assert!(!concat.create(&[face, face]));

    let mut extract = host("face_extract");
    extract.set_option_str("input_packing=2 1 2 0 0 0 0 100 1 0 1 0 100").unwrap();
    extract.set_option_str("face_id=4").unwrap();
    assert!(!extract.create(&[FrameDesc::new(8, 4, ChromaFormat::Yuv400)]));
    let input = PixelBuffer::new(FrameDesc::new(8, 4, ChromaFormat::Yuv400)).unwrap();
    assert!(extract.process(&[&input]).is_err());
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Push,
    Flush,
}

proptest! {
    #[test]
    fn accumulator_emits_once_per_window(
        window in 1u32..6,
        steps in prop::collection::vec(prop_oneof![4 => Just(Step::Push), 1 => Just(Step::Flush)], 0..40),
    ) {
        let mut state = ModuleState::new();
        state.on_create(window);
        let mut since_flush = 0u32;
        for step in steps {
            match step {
                Step::Push => {
                    let slot = state.push_sub_frame().unwrap();
                    prop_assert_eq!(slot, since_flush % window);
                    since_flush += 1;
                    if state.is_ready() {
                        prop_assert_eq!(since_flush % window, 0);
                        state.emit().unwrap();
                    }
                }
                Step::Flush => {
                    state.flush();
                    since_flush = 0;
                    prop_assert_eq!(state.phase(), ModulePhase::Buffering);
                }
            }
            prop_assert_eq!(state.frames_emitted(), u64::from(since_flush / window));
        }
    }
}
