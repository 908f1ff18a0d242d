use assert_cmd::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn fixture(name: &str) -> String {
    let path = repo_root().join("fixtures").join(name);
    assert!(path.exists(), "fixture missing: {}", path.display());
    path.to_string_lossy().to_string()
}

fn cli() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo_bin!("circadian-cli"));
    cmd.current_dir(repo_root()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn layout_prints_layers_in_call_order() {
    let output = cli()
        .args([
            "layout",
            "--dataset",
            &*format!("nursing:{}", fixture("nursing.csv")),
            "--dataset",
            &*format!("sleep:{}", fixture("sleep.csv")),
            "--annotate",
            "Home@2/1/2016, 12:00",
        ])
        .output()
        .expect("run circadian-cli");
    assert!(output.status.success(), "{output:?}");

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("layout JSON");
    let ids: Vec<&str> = json["layout"]["layers"]
        .as_array()
        .expect("layers array")
        .iter()
        .filter_map(|l| l["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["nursing", "sleep", "annotations"]);
    assert_eq!(json["layout"]["maxCycleIndex"], 2);
    assert_eq!(json["datasets"][0]["recordCount"], 16);
    assert_eq!(json["datasets"][1]["recordCount"], 17);
}

#[test]
fn render_writes_svg_to_out_path() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("chart.svg");

    cli()
        .args([
            "render",
            "--dataset",
            &*format!("sleep:{}:#222", fixture("sleep.csv")),
            "--scale",
            "0.65",
            "--id",
            "molly",
            "--out",
            out.to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let svg = fs::read_to_string(&out).expect("read svg");
    assert!(svg.starts_with("<svg"), "{svg}");
    assert!(svg.contains(r#"id="molly-sleep""#), "{svg}");
    assert!(svg.contains("#222"), "{svg}");
}

#[test]
fn render_png_with_a_named_background() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("chart.png");

    cli()
        .args([
            "render",
            "--format",
            "png",
            "--background",
            "tomato",
            "--dataset",
            &*format!("nursing:{}", fixture("nursing.csv")),
            "--out",
            out.to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let bytes = fs::read(&out).expect("read png");
    assert!(
        bytes.starts_with(b"\x89PNG\r\n\x1a\n"),
        "output is not a PNG"
    );
}

#[test]
fn missing_datasets_exit_with_code_3() {
    cli().args(["render"]).assert().code(3);
}

#[test]
fn bad_flags_exit_with_usage() {
    cli()
        .args(["render", "--dataset", "naps:whatever.csv"])
        .assert()
        .code(2);
}

#[test]
fn annotation_beyond_the_last_cycle_fails() {
    let output = cli()
        .args([
            "layout",
            "--dataset",
            &*format!("sleep:{}", fixture("sleep.csv")),
            "--annotate",
            "Later@1/3/2016, 12:00",
        ])
        .output()
        .expect("run circadian-cli");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Later"), "{stderr}");
}

#[test]
fn bad_csv_row_is_reported_with_its_path() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let csv = tmp.path().join("broken.csv");
    fs::write(&csv, "Time,Duration(minutes)\n\"1/1/2016, 10:00\",30\nnot a time,30\n")
        .expect("write csv");

    let output = cli()
        .args(["layout", "--dataset", &*format!("sleep:{}", csv.display())])
        .output()
        .expect("run circadian-cli");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken.csv"), "{stderr}");
    assert!(stderr.contains("line 3"), "{stderr}");
}
