use stem_splitter_engine::{plan_segments, SegmentConfig, StemError};

fn small() -> SegmentConfig {
    SegmentConfig::new(1000, 200, 400)
}

#[test]
fn use_ranges_partition_the_input() {
    let cfg = small();
    for total in (1..=5000).step_by(37).chain([999, 1000, 1001, 1399, 1400, 1401, 4400]) {
        let plan = plan_segments(total, &cfg).unwrap();

        let mut next = 0;
        for (i, seg) in plan.iter().enumerate() {
            assert_eq!(seg.index, i);
            assert_eq!(seg.total_segments, plan.len());
            assert_eq!(seg.slice_offset, next, "gap or overlap at total={total}");
            assert_eq!(seg.window_offset + seg.use_offset, seg.slice_offset);
            assert!(seg.use_offset + seg.use_length <= seg.window_length);
            assert!(seg.window_offset + seg.window_length <= total);
            next += seg.use_length;
        }
        assert_eq!(next, total, "use lengths must sum to total={total}");
    }
}

#[test]
fn short_tail_merges_into_previous_segment() {
    let plan = plan_segments(2300, &small()).unwrap();
    assert_eq!(plan.len(), 2);

    let first = &plan[0];
    assert_eq!(first.use_offset, 0);
    assert_eq!(first.window_offset, 0);
    assert_eq!(first.window_length, 1200);
    assert_eq!(first.use_length, 1000);

    let last = &plan[1];
    assert!(last.is_last());
    assert_eq!(last.slice_offset, 1000);
    assert_eq!(last.extend_begin, 200);
    assert_eq!(last.extend_end, 0);
    assert_eq!(last.use_offset, 200);
    assert_eq!(last.use_length, 1300);
    assert_eq!(last.window_offset, 800);
    assert_eq!(last.window_length, 1500);
}

#[test]
fn long_enough_tail_is_kept() {
    let plan = plan_segments(3500, &small()).unwrap();
    assert_eq!(plan.len(), 4);
    assert_eq!(plan[3].slice_offset, 3000);
    assert_eq!(plan[3].use_length, 500);
    assert_eq!(plan[3].window_range(), 2800..3500);

    // interior segments carry context on both sides
    assert_eq!(plan[1].window_range(), 800..2200);
    assert_eq!(plan[1].use_range(), 200..1200);
}

#[test]
fn short_input_is_a_single_segment() {
    let plan = plan_segments(250, &small()).unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].window_range(), 0..250);
    assert_eq!(plan[0].slice_range(), 0..250);
}

#[test]
fn zero_frames_is_invalid() {
    assert!(matches!(
        plan_segments(0, &small()),
        Err(StemError::InvalidInput(_))
    ));
}

#[test]
fn extend_must_be_shorter_than_slice() {
    let bad = SegmentConfig::new(1000, 1000, 400);
    assert!(matches!(
        plan_segments(5000, &bad),
        Err(StemError::InvalidInput(_))
    ));
    let bad_tail = SegmentConfig::new(1000, 200, 1000);
    assert!(bad_tail.validate().is_err());
}

#[test]
fn default_lengths_follow_sample_rate() {
    let cfg = SegmentConfig::for_sample_rate(16_000);
    assert_eq!(cfg.slice_length, 480_000);
    assert_eq!(cfg.extend_length, 80_000);
    assert_eq!(cfg.last_segment_min_length, 160_000);
}
