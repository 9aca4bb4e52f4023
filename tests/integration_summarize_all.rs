//! Suite scan tests: inventory filtering, sha1-named output, metadata
//! attachment.

use fio_summarize::metadata::sha1_file;
use fio_summarize::scanner::{inventory_log_files, summarize_all};
use std::fs;
use std::path::{Path, PathBuf};

/// Lay out one test directory of a suite run:
/// `<root>/<suite>/<dev-tpl>/{lat_lat.log, command.json, output.json, ...}`.
fn build_suite(root: &Path) -> PathBuf {
    let test_dir = root.join("nightly").join("ssd1-read_latency_512");
    fs::create_dir_all(&test_dir).unwrap();

    // a log comfortably past the 5000-byte suite threshold
    let mut log = String::new();
    for i in 0..1000u32 {
        log.push_str(&format!("{}, {}, {}, 4096\n", i, (i * 31) % 900 + 50, i % 2));
    }
    fs::write(test_dir.join("lat_lat.log"), &log).unwrap();

    // a log big enough to inventory but below the suite threshold
    let mut small = String::new();
    for i in 0..20u32 {
        small.push_str(&format!("{}, {}, 0, 512\n", i, i + 1));
    }
    fs::write(test_dir.join("bw_bw.log"), &small).unwrap();

    // bystanders the scanner must ignore
    fs::write(test_dir.join("diskstats.csv"), "ts,reads,writes\n").unwrap();
    fs::write(test_dir.join("run.sh"), "#!/bin/bash\nfio config.fio\n").unwrap();

    fs::write(
        test_dir.join("command.json"),
        "{\"name\": \"ssd1-read_latency_512\", \"fio_args\": [\"config.fio\"]}\n",
    )
    .unwrap();
    // fio prepends terse noise before the JSON document
    fs::write(
        test_dir.join("output.json"),
        "fio-2.1.9\ngarbage header\n{\"fio version\": \"fio-2.1.9\", \"jobs\": [{\"jobname\": \"j0\"}]}\n",
    )
    .unwrap();

    test_dir
}

#[test]
fn inventory_filters_by_name_and_size() {
    let root = tempfile::tempdir().unwrap();
    let test_dir = build_suite(root.path());

    // tiny and misnamed files never make the inventory
    fs::write(test_dir.join("iops_iops.log"), "1, 2, 0, 512\n").unwrap();
    fs::write(test_dir.join("lat_lat.7.log"), "x".repeat(200)).unwrap();

    let files = inventory_log_files(root.path()).unwrap();
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();

    assert!(names.contains(&"lat_lat.log".to_string()));
    assert!(names.contains(&"bw_bw.log".to_string()));
    assert!(names.contains(&"lat_lat.7.log".to_string()));
    assert!(!names.contains(&"iops_iops.log".to_string()), "under 100 bytes");
    assert!(!names.contains(&"diskstats.csv".to_string()));
}

#[test]
fn summarize_all_writes_sha1_named_envelopes() {
    let root = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let test_dir = build_suite(root.path());

    summarize_all(root.path(), out.path(), 10).unwrap();

    let log_path = test_dir.join("lat_lat.log");
    let expected = out
        .path()
        .join(format!("{}-lat.json", sha1_file(&log_path).unwrap()));
    assert!(expected.is_file(), "missing {}", expected.display());

    // the small bw log was inventoried but skipped by the suite threshold
    let written: Vec<_> = fs::read_dir(out.path()).unwrap().collect();
    assert_eq!(written.len(), 1);

    let doc: serde_json::Value =
        serde_json::from_slice(&fs::read(&expected).unwrap()).unwrap();
    assert_eq!(doc["name"], "lat_lat.log");
    assert_eq!(doc["log_type"], "lat");
    assert_eq!(doc["summary"]["count"], 1000);
    assert_eq!(doc["bin"].as_array().unwrap().len(), 10);
    assert_eq!(doc["fio_command"]["name"], "ssd1-read_latency_512");
    assert_eq!(doc["fio_data"]["jobs"][0]["jobname"], "j0");
    // percentile keys are strings in ascending order
    let pcts = doc["percentiles"].as_object().unwrap();
    assert_eq!(pcts.len(), 102);
    assert!(pcts.contains_key("1"));
    assert!(pcts.contains_key("99.999"));
    assert!(pcts["50"].get("time").is_some());
    assert!(pcts["50"].get("value").is_some());
    assert!(pcts["50"].get("ddir").is_none());
}

#[test]
fn summarize_all_is_deterministic() {
    let root = tempfile::tempdir().unwrap();
    build_suite(root.path());

    let out_a = tempfile::tempdir().unwrap();
    let out_b = tempfile::tempdir().unwrap();
    summarize_all(root.path(), out_a.path(), 10).unwrap();
    summarize_all(root.path(), out_b.path(), 10).unwrap();

    let read_one = |dir: &Path| {
        let entry = fs::read_dir(dir).unwrap().next().unwrap().unwrap();
        (entry.file_name(), fs::read(entry.path()).unwrap())
    };
    let (name_a, bytes_a) = read_one(out_a.path());
    let (name_b, bytes_b) = read_one(out_b.path());
    assert_eq!(name_a, name_b);
    assert_eq!(bytes_a, bytes_b);
}

#[test]
fn summarize_all_survives_a_corrupt_log() {
    let root = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let test_dir = build_suite(root.path());

    // big enough to clear the threshold, but with a malformed field
    let mut bad = String::from("1, 100, 0, 512\n2, not_a_number, 0, 512\n");
    bad.push_str(&"9, 9, 0, 512\n".repeat(500));
    fs::write(test_dir.join("lat_clat.log"), &bad).unwrap();

    // the corrupt file is reported and skipped, the good one still lands
    summarize_all(root.path(), out.path(), 10).unwrap();
    let written: Vec<_> = fs::read_dir(out.path()).unwrap().collect();
    assert_eq!(written.len(), 1);
}

#[test]
fn summarize_all_creates_the_output_directory() {
    let root = tempfile::tempdir().unwrap();
    let out_parent = tempfile::tempdir().unwrap();
    build_suite(root.path());

    let out = out_parent.path().join("data");
    summarize_all(root.path(), &out, 10).unwrap();
    assert!(out.is_dir());
}
