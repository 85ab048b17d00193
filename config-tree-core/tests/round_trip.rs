use std::path::PathBuf;

use config_tree_core::{parse, parse_file, write, write_file};
use pretty_assertions::assert_eq;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn parse_write_parse_round_trip_preserves_tree_shape() {
    let first = parse_file(&fixture("fixtures/canonical-after.xml")).expect("initial parse");

    let written = write(&first).expect("write");
    let second = parse(&written).expect("re-parse");

    assert_eq!(first, second);
}

#[test]
fn parse_and_write_file_round_trip() {
    let out_dir = tempfile::tempdir().expect("tempdir");
    let out_path = out_dir.path().join("roundtrip.xml");

    let node = parse_file(&fixture("fixtures/xr6-underlay.xml")).expect("parse");
    write_file(&node, &out_path).expect("write_file");

    let reparsed = parse_file(&out_path).expect("parse_file");
    assert_eq!(node, reparsed);
}
