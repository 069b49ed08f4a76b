use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const AREA: &str = r#"{"type": "Polygon",
  "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]}"#;

const BUSES: &str = "\
bus,lat,lon
1,1.0,1.0
2,2.0,2.0
3,5.0,5.0
4,5.0,12.0
5,50.0,60.0
6,50.0,61.0
";

const LINES: &str = "\
f_bus,t_bus,r,x,b,rate_a
1,2,0.0,0.5,0.0,1.0
2,3,0.0,0.5,0.0,1.0
3,4,0.0,0.5,0.0,1.0
5,6,0.0,0.5,0.0,1.0
";

const GENS: &str = "\
bus,fueltype,pg,pmax,pmin,qg,qmax,qmin,startup,shutdown,n,c2,c1,c0
2,Solar Photovoltaic,0,5,0,0,0,0,0,0,3,0,0,0
4,IMPORT,0,500,0,0,0,0,0,0,3,0,30,0
";

fn write_inputs(dir: &Path) {
    fs::write(dir.join("area.geojson"), AREA).unwrap();
    fs::write(dir.join("buses.csv"), BUSES).unwrap();
    fs::write(dir.join("lines.csv"), LINES).unwrap();
    fs::write(dir.join("gens.csv"), GENS).unwrap();
    let loads: Vec<String> = (1..=6)
        .map(|bus| vec![format!("{}+0i", bus * 1000); 24].join(","))
        .collect();
    fs::write(dir.join("loads.csv"), loads.join("\n")).unwrap();
    fs::write(
        dir.join("study.toml"),
        r#"
[inputs]
buses = "buses.csv"
lines = "lines.csv"
generators = "gens.csv"
loads = "loads.csv"
area = "area.geojson"

[output]
dir = "out"

[reduction]
representative_days = []
"#,
    )
    .unwrap();
}

fn cats() -> Command {
    Command::cargo_bin("cats").unwrap()
}

#[test]
fn subset_writes_outputs_and_manifest() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());

    cats()
        .arg("subset")
        .arg("--config")
        .arg(dir.path().join("study.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("base system"));

    let out = dir.path().join("out");
    for file in ["buses.csv", "lines.csv", "gens.csv", "loads.csv"] {
        assert!(out.join(file).exists(), "missing {file}");
    }
    let manifests: Vec<_> = fs::read_dir(&out)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("run-"))
        .collect();
    assert_eq!(manifests.len(), 1);
}

#[test]
fn subset_json_reports_variant_and_counts() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());
    let out = dir.path().join("extended");

    let output = cats()
        .arg("subset")
        .arg("--config")
        .arg(dir.path().join("study.toml"))
        .args(["--variant", "extended", "--no-manifest", "--json"])
        .arg("--out")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["variant"], "extended");
    assert_eq!(summary["stats"]["buses"], 4);
    assert_eq!(summary["stats"]["import_buses"], 1);
    assert!(out.join("generators.csv").exists());
    assert!(!fs::read_dir(&out)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .any(|entry| entry.file_name().to_string_lossy().starts_with("run-")));
}

#[test]
fn islands_marks_the_kept_component() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());

    cats()
        .arg("islands")
        .arg("--config")
        .arg(dir.path().join("study.toml"))
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"node_count\": 4"))
        .stdout(predicate::str::contains("\"min_bus\": 1"));
}

#[test]
fn inspect_fails_on_missing_column() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());
    fs::write(dir.path().join("lines.csv"), "f_bus,t_bus,r\n1,2,0.0\n").unwrap();

    cats()
        .arg("inspect")
        .arg("--config")
        .arg(dir.path().join("study.toml"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("buses"))
        .stdout(predicate::str::contains("missing required column"));
}

#[test]
fn subset_without_inputs_is_rejected() {
    let dir = tempdir().unwrap();
    cats()
        .current_dir(dir.path())
        .arg("subset")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}
