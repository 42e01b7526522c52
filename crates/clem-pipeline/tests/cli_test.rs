//! Exit status of the `clem` binary.

use std::fs;
use std::path::Path;
use std::process::Command;

fn clem(dir: &Path, args: &[&str]) -> Option<i32> {
    let status = Command::new(env!("CARGO_BIN_EXE_clem"))
        .arg("--working-directory")
        .arg(dir)
        .args(args)
        .env("RUST_LOG", "error")
        .status()
        .unwrap();
    status.code()
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_no_mode_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("sted.tif"), b"x").unwrap();
    fs::write(dir.path().join("em.tif"), b"x").unwrap();

    assert_eq!(clem(dir.path(), &["--sted", "sted.tif", "--em", "em.tif"]), Some(1));
    assert_eq!(entries(dir.path()), ["em.tif", "sted.tif"]);
}

#[test]
fn test_missing_input_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(clem(dir.path(), &["--sted", "sted.tif", "--em", "em.tif", "--register"]), Some(1));
    assert!(entries(dir.path()).is_empty());
}

#[test]
fn test_unreadable_image_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("sted.tif"), b"not a tiff").unwrap();
    fs::write(dir.path().join("em.tif"), b"not a tiff").unwrap();

    assert_eq!(clem(dir.path(), &["--sted", "sted.tif", "--em", "em.tif", "--register"]), Some(2));
    assert_eq!(entries(dir.path()), ["em.tif", "sted.tif"]);
}
