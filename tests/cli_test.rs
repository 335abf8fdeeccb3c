//! Command-line behaviour: config handling and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::error::Error;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cli() -> Command {
    Command::cargo_bin("flickr-archive").expect("Failed to find flickr-archive binary")
}

/// Writes a one-album export under `root/export`
fn write_export(root: &Path, with_missing_image: bool) -> Result<(), Box<dyn Error>> {
    let json = root.join("export/json");
    let images = root.join("export/images");
    fs::create_dir_all(&json)?;
    fs::create_dir_all(&images)?;

    fs::write(
        json.join("albums.json"),
        r#"{"albums": [{"id": "A1", "title": "Trip", "photos": ["1", "2"]}]}"#,
    )?;
    fs::write(
        json.join("photo_1.json"),
        r#"{"id": "1", "name": "First", "original": "1.jpg"}"#,
    )?;
    fs::write(
        json.join("photo_2.json"),
        r#"{"id": "2", "name": "Second", "original": "2.jpg"}"#,
    )?;

    image::RgbImage::new(16, 12).save(images.join("1.jpg"))?;
    if !with_missing_image {
        image::RgbImage::new(12, 16).save(images.join("2.jpg"))?;
    }
    Ok(())
}

#[test]
fn test_init_creates_config() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("archive.yaml");

    cli().arg("init").current_dir(temp_dir.path()).assert().success();

    let content = fs::read_to_string(&config_path)?;
    assert!(content.contains("input_dir"));
    assert!(content.contains("thumbnail_size: 300"));
    Ok(())
}

#[test]
fn test_init_respects_existing_config() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("archive.yaml");
    fs::write(&config_path, "out_dir: mine\n")?;

    cli()
        .arg("init")
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Config file already exists"));
    assert_eq!(fs::read_to_string(&config_path)?, "out_dir: mine\n");

    cli()
        .args(["init", "--force"])
        .current_dir(temp_dir.path())
        .assert()
        .success();
    assert!(fs::read_to_string(&config_path)?.contains("display_size"));
    Ok(())
}

#[test]
fn test_missing_config_error() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;

    cli()
        .arg("build")
        .arg("--config")
        .arg(temp_dir.path().join("does_not_exist.yaml"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Config file not found"));
    Ok(())
}

#[test]
fn test_clean_build_exits_zero() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;
    write_export(temp_dir.path(), false)?;

    cli()
        .args(["build", "--input", "export", "--output", "out", "--workers", "2"])
        .current_dir(temp_dir.path())
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Completed cleanly"));

    assert!(temp_dir.path().join("out/site/index.html").exists());
    assert!(temp_dir.path().join("out/A1/thumbs/2.jpg").exists());
    Ok(())
}

#[test]
fn test_build_with_faults_exits_one() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;
    write_export(temp_dir.path(), true)?;

    cli()
        .args(["build", "--input", "export", "--output", "out"])
        .current_dir(temp_dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Completed with 1 fault(s)"));

    assert!(temp_dir.path().join("out/site/photos/2.html").exists());
    Ok(())
}

#[test]
fn test_missing_input_exits_two() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;

    cli()
        .args(["build", "--input", "nowhere", "--output", "out"])
        .current_dir(temp_dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("directory not found"));

    assert!(!temp_dir.path().join("out").exists());
    Ok(())
}

#[test]
fn test_config_file_is_used() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;
    write_export(temp_dir.path(), false)?;
    fs::write(
        temp_dir.path().join("archive.yaml"),
        "input_dir: export\nout_dir: from-config\nthumbnail_size: 8\n",
    )?;

    cli()
        .arg("build")
        .current_dir(temp_dir.path())
        .assert()
        .code(0);

    let dims = image::image_dimensions(temp_dir.path().join("from-config/A1/thumbs/1.jpg"))?;
    assert_eq!(dims, (8, 6));
    Ok(())
}

#[test]
fn test_status_reports_counts() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;
    write_export(temp_dir.path(), false)?;
    fs::write(temp_dir.path().join("export/json/photo_3.json"), "not json")?;

    cli()
        .args(["status", "--input", "export"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Photos: 2"))
        .stdout(predicate::str::contains("Albums: 1"))
        .stdout(predicate::str::contains("Record faults: 1"))
        .stdout(predicate::str::contains("malformed-json"));

    assert!(!temp_dir.path().join("archive").exists());
    Ok(())
}
