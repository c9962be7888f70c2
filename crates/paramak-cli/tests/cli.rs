use std::path::PathBuf;
use std::process::Command;

fn paramak() -> Command {
    Command::new(env!("CARGO_BIN_EXE_paramak"))
}

fn config(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("configs").join(name)
}

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("paramak-cli-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn info_prints_the_resolved_build() {
    let output = paramak().arg("info").arg(config("build.toml")).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("layered (BuildReactor)"));
    assert!(stdout.contains("Major radius: 390.000"));
    assert!(stdout.contains("Vertical build:"));
    assert!(stdout.contains("blanket"));
}

#[test]
fn build_writes_the_manifest() {
    let out = scratch("manifest");
    let output = paramak()
        .args(["build", "--format", "json", "--out"])
        .arg(&out)
        .arg(config("single_null_ball.toml"))
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let manifest = std::fs::read_to_string(out.join("manifest.json")).unwrap();
    assert!(manifest.contains("\"divertor_mat\""));
    assert!(manifest.contains("\"graveyard\""));
}

#[test]
fn plasma_writes_html() {
    let out = scratch("plasma");
    std::fs::create_dir_all(&out).unwrap();
    let html = out.join("plasma.html");
    let output = paramak()
        .args(["plasma", "--major-radius", "620", "--minor-radius", "210", "--triangularity", "0.33"])
        .args(["--elongation", "1.85", "--configuration", "single-null", "--out"])
        .arg(&html)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(html.exists());
}

#[test]
fn bad_config_fails() {
    let out = scratch("bad");
    std::fs::create_dir_all(&out).unwrap();
    let path = out.join("bad.toml");
    std::fs::write(&path, "[reactor]\nkind = \"ball\"\ndivertor_radial_thickness = 1000\n").unwrap();
    let output = paramak().arg("info").arg(&path).output().unwrap();
    assert!(!output.status.success());
}
