#![cfg(all(unix, feature = "cli"))]

use std::path::PathBuf;
use std::process::{Command, Output};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "inklink-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn missing_port() -> String {
    format!("/dev/inklink-cli-missing-{}", std::process::id())
}

fn inklink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_inklink"))
        .args(args)
        .env_remove("INKLINK_PORT")
        .env_remove("INKLINK_FORMAT")
        .output()
        .expect("inklink should run")
}

#[test]
fn version_prints_package_version() {
    let output = inklink(&["version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("inklink {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn extended_version_reports_packet_limit() {
    let output = inklink(&["version", "--extended"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("max_packet_payload: 254"));
}

#[test]
fn hibernate_on_missing_port_is_transport_error() {
    let port = missing_port();
    let output = inklink(&["hibernate", &port, "--device", "1", "--in", "1h"]);

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("connect failed"));
}

#[test]
fn image_on_missing_port_is_transport_error() {
    let dir = unique_temp_dir("image");
    let path = dir.join("blank.pgm");
    let mut data = b"P5\n4 3\n255\n".to_vec();
    data.extend_from_slice(&[200; 12]);
    std::fs::write(&path, data).expect("write image");

    let port = missing_port();
    let file = path.to_string_lossy();
    let output = inklink(&["image", &port, "--device", "2", "--file", &file]);

    assert_eq!(output.status.code(), Some(3));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unreadable_image_data_is_invalid_data() {
    let dir = unique_temp_dir("bad-image");
    let path = dir.join("board.png");
    std::fs::write(&path, b"\x89PNG\r\n\x1a\n").expect("write image");

    let port = missing_port();
    let file = path.to_string_lossy();
    let output = inklink(&["image", &port, "--device", "2", "--file", &file]);

    assert_eq!(output.status.code(), Some(60));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_duration_is_usage_error() {
    let port = missing_port();
    let output = inklink(&["hibernate", &port, "--device", "1", "--in", "soon"]);

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn missing_image_file_is_usage_error() {
    let port = missing_port();
    let output = inklink(&[
        "update",
        &port,
        "--device",
        "1",
        "--file",
        "/nonexistent/inklink/board.pbm",
        "--in",
        "30m",
    ]);

    assert_eq!(output.status.code(), Some(64));
}
