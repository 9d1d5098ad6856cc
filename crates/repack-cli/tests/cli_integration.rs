//! CLI subprocess integration tests.
//!
//! These tests invoke the `shared_libs_repack` binary as a subprocess and
//! verify exit codes, stderr messages and JSON report output.

use repack_runtime::{MockToolchain, PackageRequest, PayloadKind, SigningKeys, Toolchain};
use repack_schema::{ApexBuildInfo, ApexManifest};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn repack_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_shared_libs_repack"));
    cmd.env_remove("SHARED_LIBS_REPACK_TOOLS_DIR");
    cmd.env_remove("SHARED_LIBS_REPACK_TOOLCHAIN");
    cmd.env_remove("SHARED_LIBS_REPACK_SKIP_PREREQS");
    cmd.env_remove("SHARED_LIBS_REPACK_LOG");
    cmd
}

/// Write a container with `lib64/libc++.so` and `lib64/libsharedlibtest.so`.
fn write_input(dir: &Path) -> PathBuf {
    let src = dir.join("src");
    let payload = src.join("payload");
    fs::create_dir_all(payload.join("lib64")).unwrap();
    fs::write(payload.join("lib64/libc++.so"), b"libc++").unwrap();
    fs::write(payload.join("lib64/libsharedlibtest.so"), b"libsharedlibtest").unwrap();
    ApexManifest {
        name: "com.android.apex.test.foo".to_owned(),
        version: 1,
        ..Default::default()
    }
    .write(src.join("apex_manifest.pb"))
    .unwrap();
    ApexBuildInfo {
        canned_fs_config: b"/lib64/libc++.so 1000 1000 0644\n".to_vec(),
        ..Default::default()
    }
    .write(src.join("apex_build_info.pb"))
    .unwrap();

    let input = dir.join("in.apex");
    MockToolchain::new()
        .package(
            &PackageRequest {
                manifest_pb: &src.join("apex_manifest.pb"),
                manifest_json: None,
                build_info: &src.join("apex_build_info.pb"),
                assets: None,
                payload_dir: &payload,
                payload_kind: PayloadKind::Image,
                keys: &SigningKeys {
                    key: "k".into(),
                    pubkey: "p".into(),
                    pk8key: "pk8".into(),
                    x509key: "x509".into(),
                },
            },
            &input,
        )
        .unwrap();
    input
}

fn run_with(dir: &Path, input: &Path, extra: &[&str]) -> Output {
    repack_bin()
        .arg("--input")
        .arg(input)
        .arg("--output")
        .arg(dir.join("out.apex"))
        .arg("--tmpdir")
        .arg(dir.join("tmp"))
        .args(["--key", "k.pem", "--pubkey", "k.avbpubkey"])
        .args(["--pk8key", "k.pk8", "--x509key", "k.x509.pem"])
        .args(extra)
        .output()
        .unwrap()
}

fn write_script(path: &Path, body: &str) {
    fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn cli_version_exits_zero() {
    let output = repack_bin().arg("--version").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("shared_libs_repack"), "{stdout}");
}

#[test]
fn cli_help_lists_flags() {
    let output = repack_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--input", "--output", "--pk8key", "--x509key", "--tmpdir", "--mode"] {
        assert!(stdout.contains(flag), "help must mention {flag}: {stdout}");
    }
    assert!(stdout.contains("sharedlibs"));
}

#[test]
fn cli_missing_required_flags_fails() {
    let output = repack_bin().args(["--input", "in.apex"]).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--output"), "{stderr}");
}

#[test]
fn cli_rejects_unknown_mode() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_with(dir.path(), Path::new("in.apex"), &["--mode", "shared"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("shared"), "{stderr}");
}

#[test]
fn cli_requires_tools_dir_for_host_toolchain() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let output = run_with(dir.path(), &input, &[]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no tools directory"), "{stderr}");
}

#[test]
fn cli_lists_missing_prerequisites() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let tools = dir.path().join("host/bin");
    fs::create_dir_all(&tools).unwrap();

    let output = run_with(
        dir.path(),
        &input,
        &["--tools-dir", tools.to_str().unwrap(), "--java", "/nonexistent/java"],
    );
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing prerequisites"), "{stderr}");
    assert!(stderr.contains("debugfs_static"), "{stderr}");
    assert!(stderr.contains("apexer"), "{stderr}");
    assert!(stderr.contains("signapk.jar"), "{stderr}");
    assert!(!dir.path().join("out.apex").exists());
}

#[test]
fn cli_failing_tool_exits_with_tool_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let tools = dir.path().join("host/bin");
    fs::create_dir_all(&tools).unwrap();
    write_script(&tools.join("debugfs_static"), "echo 'rdump: bad image' >&2\nexit 3");

    let output = repack_bin()
        .env("SHARED_LIBS_REPACK_SKIP_PREREQS", "1")
        .env("SHARED_LIBS_REPACK_TOOLS_DIR", &tools)
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(dir.path().join("out.apex"))
        .arg("--tmpdir")
        .arg(dir.path().join("tmp"))
        .args(["--key", "k", "--pubkey", "p", "--pk8key", "pk8", "--x509key", "x509"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("debugfs_static"), "{stderr}");
    assert!(stderr.contains("rdump"), "{stderr}");
    assert!(stderr.contains("exit code 3"), "{stderr}");
    assert!(stderr.contains("rdump: bad image"), "{stderr}");
    assert!(!dir.path().join("out.apex").exists());
    assert!(fs::read_dir(dir.path().join("tmp")).unwrap().next().is_none());
}

#[test]
fn cli_sharedlibs_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let output = run_with(
        dir.path(),
        &input,
        &["--toolchain", "mock", "--mode", "sharedlibs", "--json"],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["mode"], "sharedlibs");
    assert_eq!(report["lib_dir"], "lib64");
    assert_eq!(report["payload_type"], "image");
    let libs = report["libraries"].as_array().unwrap();
    assert_eq!(libs.len(), 2);
    assert_eq!(libs[0]["name"], "libc++.so");
    assert_eq!(libs[0]["original_path"], "/lib64/libc++.so");
    let digest = libs[0]["sha512"].as_str().unwrap();
    assert_eq!(digest.len(), 128);
    assert_eq!(
        libs[0]["final_path"],
        format!("/lib64/libc++.so/{digest}/libc++.so")
    );
    assert!(dir.path().join("out.apex").is_file());
}

#[test]
fn cli_strip_with_selected_library() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let output = run_with(
        dir.path(),
        &input,
        &["--toolchain", "mock", "--lib", "libsharedlibtest.so"],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("/lib64/libsharedlibtest.so -> /apex/com.android.apex.test.sharedlibs/lib64/libsharedlibtest.so/"), "{stdout}");
    assert!(!stdout.contains("libc++.so"), "{stdout}");
}

#[test]
fn cli_missing_artifact_exits_with_artifact_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("empty.apex");
    // An empty zip archive: end of central directory record only.
    let mut eocd = vec![0x50, 0x4b, 0x05, 0x06];
    eocd.extend_from_slice(&[0u8; 18]);
    fs::write(&input, eocd).unwrap();

    let output = run_with(dir.path(), &input, &["--toolchain", "mock"]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing required artifact"), "{stderr}");
}

#[test]
fn cli_corrupt_input_exits_with_artifact_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.apex");
    fs::write(&input, b"not a zip").unwrap();
    let output = run_with(dir.path(), &input, &["--toolchain", "mock"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn cli_strip_twice_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let first = run_with(dir.path(), &input, &["--toolchain", "mock"]);
    assert!(first.status.success());

    let again = dir.path().join("again");
    fs::create_dir_all(&again).unwrap();
    let second = run_with(&again, &dir.path().join("out.apex"), &["--toolchain", "mock"]);
    assert_eq!(second.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&second.stderr);
    assert!(stderr.contains("not a regular file"), "{stderr}");
}
