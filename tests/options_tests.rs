// Write buffer options: defaults, parsing, validation.

use std::collections::HashMap;

use prefix_hash_get::error::Error;
use prefix_hash_get::options::HashSkipListOptions;

fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn defaults() {
    let opts = HashSkipListOptions::default();
    assert_eq!(opts.bucket_count, 1_000_000);
    assert_eq!(opts.skiplist_height, 4);
    assert_eq!(opts.skiplist_branching_factor, 4);
    assert!(opts.validate().is_ok());
    assert_eq!(HashSkipListOptions::NAME, "prefix_hash");
}

#[test]
fn from_map_keeps_defaults_for_missing_keys() {
    let opts = HashSkipListOptions::from_map(&map(&[])).unwrap();
    assert_eq!(opts, HashSkipListOptions::default());

    let opts = HashSkipListOptions::from_map(&map(&[("unrelated", "x")])).unwrap();
    assert_eq!(opts, HashSkipListOptions::default());
}

#[test]
fn from_map_parses_values() {
    let opts = HashSkipListOptions::from_map(&map(&[
        ("bucket_count", "50000"),
        ("skiplist_height", " 8 "),
        ("skiplist_branching_factor", "2"),
    ]))
    .unwrap();
    assert_eq!(opts.bucket_count, 50_000);
    assert_eq!(opts.skiplist_height, 8);
    assert_eq!(opts.skiplist_branching_factor, 2);
}

#[test]
fn from_map_rejects_bad_values() {
    for pairs in [
        [("bucket_count", "lots")],
        [("bucket_count", "0")],
        [("skiplist_height", "0")],
        [("skiplist_height", "64")],
        [("skiplist_branching_factor", "1")],
        [("skiplist_branching_factor", "-4")],
    ] {
        match HashSkipListOptions::from_map(&map(&pairs)) {
            Err(Error::InvalidArgument(_)) => {}
            other => panic!("{pairs:?} should be rejected, got {other:?}"),
        }
    }
}
