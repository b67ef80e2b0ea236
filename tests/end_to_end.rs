//! Cross-module scenarios from the design's testable-properties list:
//! construction validation, insertion/query consistency, and save/load
//! round-trips against a real temp file.

use bloomtrio::{BloomError, ClassicBloom, CountingBloom, ScalableBloom, ScalableConfig};

#[test]
fn scenario_classic_add_then_check() {
    let mut bf = ClassicBloom::new(1000, 0.01).unwrap();
    bf.add(b"test");
    assert!(bf.check(b"test"));
    assert!(!bf.check(b"not_added"));
}

#[test]
fn scenario_classic_rejects_bad_construction() {
    assert!(matches!(
        ClassicBloom::new(0, 0.01),
        Err(BloomError::InvalidParameters { .. })
    ));
    assert!(matches!(
        ClassicBloom::new(1000, 0.0),
        Err(BloomError::InvalidParameters { .. })
    ));
    assert!(matches!(
        ClassicBloom::new(1000, 1.0),
        Err(BloomError::InvalidParameters { .. })
    ));
}

#[test]
fn scenario_counting_accumulates_and_saturates() {
    let mut cb = CountingBloom::new(1000, 0.01, 10).unwrap();
    cb.add(b"test", 3);
    assert_eq!(cb.value(b"test"), 3);
    cb.add(b"test", 2);
    assert_eq!(cb.value(b"test"), 5);
    cb.add(b"test", 10);
    assert_eq!(cb.value(b"test"), 10);
}

#[test]
fn scenario_counting_direct_bin_access() {
    let mut cb = CountingBloom::new(1000, 0.01, 255).unwrap();
    cb.increment_bin(0, 5);
    assert_eq!(cb.bin(0), 5);
    cb.decrement_bin(0, 2);
    assert_eq!(cb.bin(0), 3);
    cb.decrement_bin(0, 10);
    assert_eq!(cb.bin(0), 0);
}

#[test]
fn scenario_scalable_grows_and_tightens_error() {
    let config = ScalableConfig {
        initial_size: 1000,
        growth_factor: 2,
        max_error: 0.01,
        error_decay_rate: 0.5,
    };
    let mut sbf = ScalableBloom::new(config).unwrap();
    let threshold = sbf.threshold();

    for i in 0..(threshold * 2) {
        sbf.add(format!("item-{i}").as_bytes());
    }

    assert!(sbf.blooms() > 1);
    assert!(sbf.target_error(sbf.blooms() - 1).unwrap() < sbf.target_error(0).unwrap());
}

#[test]
fn scenario_classic_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("classic.bloom");

    let mut bf = ClassicBloom::new(1000, 0.01).unwrap();
    bf.add(b"save_test");
    bf.save(&path).unwrap();

    let loaded = ClassicBloom::load(&path).unwrap();
    assert!(loaded.check(b"save_test"));
    assert_eq!(loaded.len(), bf.len());
    assert_eq!(loaded.hashes(), bf.hashes());
}

#[test]
fn scenario_counting_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counting.bloom");

    let mut cb = CountingBloom::new(1000, 0.01, 10).unwrap();
    cb.add(b"save_test", 7);
    cb.save(&path).unwrap();

    let loaded = CountingBloom::load(&path).unwrap();
    assert_eq!(loaded.value(b"save_test"), 7);
}

#[test]
fn scenario_scalable_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scalable.bloom");

    let config = ScalableConfig {
        initial_size: 1000,
        growth_factor: 2,
        max_error: 0.01,
        error_decay_rate: 0.5,
    };
    let mut sbf = ScalableBloom::new(config).unwrap();
    sbf.add(b"save_test");
    sbf.save(&path).unwrap();

    let loaded = ScalableBloom::load(&path).unwrap();
    assert!(loaded.check(b"save_test"));
    assert_eq!(loaded.blooms(), sbf.blooms());
    for k in 0..sbf.blooms() {
        assert_eq!(loaded.bins_list(k).unwrap(), sbf.bins_list(k).unwrap());
    }
}

#[test]
fn loading_wrong_variant_type_is_a_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("classic.bloom");

    let bf = ClassicBloom::new(1000, 0.01).unwrap();
    bf.save(&path).unwrap();

    let result = CountingBloom::load(&path);
    assert!(matches!(result, Err(BloomError::Format { .. })));
}
