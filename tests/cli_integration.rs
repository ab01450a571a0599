//! CLI integration tests for Slipway.
//!
//! These tests verify the full workflow from a project file through
//! framework install, custom-config rebuild, and the freshness check.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use flate2::write::GzEncoder;
use flate2::Compression;
use predicates::prelude::*;
use tempfile::TempDir;

/// MD5("CONFIG_FREERTOS_UNICORE=y" + "esp32") truncated to 16 chars.
const UNICORE_ESP32_FINGERPRINT: &str = "ffe6b96c2c38b04c";

/// Get the slipway binary command, shielded from ambient overrides.
fn slipway() -> Command {
    let mut cmd = Command::cargo_bin("slipway").unwrap();
    cmd.env_remove("SLIPWAY_PACKAGES_ROOT");
    cmd.env_remove("SLIPWAY_PYTHON");
    cmd.env_remove("SLIPWAY_LIB_COMPILE_FLAG");
    cmd
}

/// Create a temporary directory for test projects.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

/// Build a gzipped framework-libs archive at `dir/libs.tar.gz`.
///
/// When `with_probe` is set the archive carries the sdkconfig file that
/// marks the package as built with custom config.
fn framework_archive(dir: &Path, with_probe: bool) -> PathBuf {
    let mut entries = vec![("package.json", "{\"name\": \"framework-libs\"}\n")];
    if with_probe {
        entries.push(("tools/esp32-arduino-libs/sdkconfig", "CONFIG_SPIRAM=y\n"));
    }

    let gz = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(gz);
    for (path, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, contents.as_bytes()).unwrap();
    }
    let bytes = builder.into_inner().unwrap().finish().unwrap();

    let archive = dir.join("libs.tar.gz");
    fs::write(&archive, bytes).unwrap();
    archive
}

/// Write a project with one esp32 env. `custom` becomes the env's
/// custom_sdkconfig line; hooks record their runs as files.
fn write_project(dir: &Path, libs_url: &str, custom: Option<&str>) {
    fs::create_dir_all(dir.join("boards")).unwrap();
    fs::write(
        dir.join("boards/esp32dev.json"),
        r#"{
    "build": {
        "mcu": "esp32",
        "extra_flags": "-DARDUINO_ESP32_DEV"
    }
}
"#,
    )
    .unwrap();

    let custom_line = match custom {
        Some(text) => format!("custom_sdkconfig = \"{}\"\n", text),
        None => String::new(),
    };
    fs::write(
        dir.join("slipway.toml"),
        format!(
            r#"[framework]
libs_spec = "framework-libs @ uri={libs_url}"
packages_root = "pkgs"

[hooks]
compile_libs = "touch libs-built.txt"
framework_build = "touch hook-ran.txt"

[env.esp32dev]
board = "boards/esp32dev.json"
frameworks = ["arduino"]
{custom_line}"#
        ),
    )
    .unwrap();
}

fn file_url(path: &Path) -> String {
    url::Url::from_file_path(path).unwrap().to_string()
}

// ============================================================================
// slipway fingerprint
// ============================================================================

#[test]
fn test_fingerprint_prints_expected_hash() {
    let tmp = temp_dir();
    write_project(tmp.path(), "file:///unused.tar.gz", Some("CONFIG_FREERTOS_UNICORE=y"));

    slipway()
        .args(["fingerprint"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(UNICORE_ESP32_FINGERPRINT));
}

#[test]
fn test_fingerprint_fails_without_project() {
    let tmp = temp_dir();

    slipway()
        .args(["fingerprint"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find `slipway.toml`"));
}

// ============================================================================
// slipway check
// ============================================================================

#[test]
fn test_check_fresh_project_exits_zero() {
    let tmp = temp_dir();
    write_project(tmp.path(), "file:///unused.tar.gz", None);

    slipway()
        .args(["check"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("fresh"));
}

#[test]
fn test_check_reports_drift_without_marker() {
    let tmp = temp_dir();
    write_project(tmp.path(), "file:///unused.tar.gz", Some("CONFIG_FREERTOS_UNICORE=y"));

    // An installed package that was built with custom config, but no
    // fingerprint recorded in the project.
    let probe = tmp.path().join("pkgs/framework-libs/tools/esp32-arduino-libs/sdkconfig");
    fs::create_dir_all(probe.parent().unwrap()).unwrap();
    fs::write(&probe, "CONFIG_SPIRAM=y\n").unwrap();

    slipway()
        .args(["check"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("drift"));
}

#[test]
fn test_check_stale_when_env_drops_custom_config() {
    let tmp = temp_dir();
    write_project(tmp.path(), "file:///unused.tar.gz", None);

    // Package built with custom config while the env declares none.
    let probe = tmp.path().join("pkgs/framework-libs/tools/esp32-arduino-libs/sdkconfig");
    fs::create_dir_all(probe.parent().unwrap()).unwrap();
    fs::write(&probe, "CONFIG_SPIRAM=y\n").unwrap();

    slipway()
        .args(["check"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("stale"));
}

#[test]
fn test_check_json_output() {
    let tmp = temp_dir();
    write_project(tmp.path(), "file:///unused.tar.gz", None);

    slipway()
        .args(["check", "--json"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"fresh\""))
        .stdout(predicate::str::contains("\"env\": \"esp32dev\""));
}

#[test]
fn test_check_unknown_env() {
    let tmp = temp_dir();
    write_project(tmp.path(), "file:///unused.tar.gz", None);

    slipway()
        .args(["check", "nosuchenv"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no environment named `nosuchenv`"))
        .stderr(predicate::str::contains("esp32dev"));
}

// ============================================================================
// slipway clean
// ============================================================================

#[test]
fn test_clean_removes_installed_package() {
    let tmp = temp_dir();
    write_project(tmp.path(), "file:///unused.tar.gz", None);

    let package_dir = tmp.path().join("pkgs/framework-libs");
    fs::create_dir_all(&package_dir).unwrap();
    fs::write(package_dir.join("package.json"), "{}").unwrap();
    fs::write(tmp.path().join("sdkconfig.defaults"), "# SLIPWAY__0000000000000000\n").unwrap();

    slipway()
        .args(["clean"])
        .current_dir(tmp.path())
        .assert()
        .success();

    assert!(!package_dir.exists());
    // Without --marker the recorded fingerprint stays put.
    assert!(tmp.path().join("sdkconfig.defaults").exists());

    slipway()
        .args(["clean", "--marker"])
        .current_dir(tmp.path())
        .assert()
        .success();

    assert!(!tmp.path().join("sdkconfig.defaults").exists());
}

// ============================================================================
// slipway prepare
// ============================================================================

#[cfg(unix)]
#[test]
fn test_prepare_first_build_then_fresh() {
    let tmp = temp_dir();
    let archive = framework_archive(tmp.path(), true);
    let project = tmp.path().join("proj");
    fs::create_dir_all(&project).unwrap();
    write_project(&project, &file_url(&archive), Some("CONFIG_FREERTOS_UNICORE=y"));

    // First run installs the package, rebuilds the libs, records the
    // fingerprint, and hands off to the framework build.
    slipway()
        .args(["prepare", "--skip-python-deps"])
        .current_dir(&project)
        .assert()
        .success()
        .stderr(predicate::str::contains("Finished"));

    assert!(project.join("pkgs/framework-libs/package.json").exists());
    assert!(project.join("libs-built.txt").exists());
    assert!(project.join("hook-ran.txt").exists());

    let marker = fs::read_to_string(project.join("sdkconfig.defaults")).unwrap();
    assert!(marker.starts_with(&format!("# SLIPWAY__{}", UNICORE_ESP32_FINGERPRINT)));
    assert!(marker.contains("CONFIG_FREERTOS_UNICORE=y"));

    // Second run finds everything fresh: no libs rebuild, but the
    // framework build still runs.
    fs::remove_file(project.join("libs-built.txt")).unwrap();
    fs::remove_file(project.join("hook-ran.txt")).unwrap();

    slipway()
        .args(["prepare", "--skip-python-deps"])
        .current_dir(&project)
        .assert()
        .success();

    assert!(!project.join("libs-built.txt").exists());
    assert!(project.join("hook-ran.txt").exists());
}

#[cfg(unix)]
#[test]
fn test_prepare_reinstalls_when_custom_config_changes() {
    let tmp = temp_dir();
    let archive = framework_archive(tmp.path(), true);
    let project = tmp.path().join("proj");
    fs::create_dir_all(&project).unwrap();
    write_project(&project, &file_url(&archive), Some("CONFIG_FREERTOS_UNICORE=y"));

    slipway()
        .args(["prepare", "--skip-python-deps"])
        .current_dir(&project)
        .assert()
        .success();

    // Leave a sentinel in the installed package, then change the
    // custom config: the drift forces a wipe and reinstall.
    let sentinel = project.join("pkgs/framework-libs/sentinel.txt");
    fs::write(&sentinel, "x").unwrap();
    write_project(&project, &file_url(&archive), Some("CONFIG_SPIRAM=y"));

    slipway()
        .args(["prepare", "--skip-python-deps"])
        .current_dir(&project)
        .assert()
        .success();

    assert!(!sentinel.exists());
    assert!(project.join("pkgs/framework-libs/package.json").exists());

    // The marker now records the new config's fingerprint.
    let fingerprint = slipway()
        .args(["fingerprint"])
        .current_dir(&project)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let fingerprint = String::from_utf8(fingerprint).unwrap();
    let marker = fs::read_to_string(project.join("sdkconfig.defaults")).unwrap();
    assert!(marker.starts_with(&format!("# SLIPWAY__{}", fingerprint.trim())));
    assert!(marker.contains("CONFIG_SPIRAM=y"));
}

#[cfg(unix)]
#[test]
fn test_prepare_recovers_after_failed_install() {
    let tmp = temp_dir();
    let project = tmp.path().join("proj");
    fs::create_dir_all(&project).unwrap();
    // Point the project at an archive that does not exist yet.
    write_project(&project, &file_url(&tmp.path().join("libs.tar.gz")), None);

    slipway()
        .args(["prepare", "--skip-python-deps"])
        .current_dir(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open archive"));

    // The failure must not leave a package directory behind that would
    // make the next run skip the fetch.
    framework_archive(tmp.path(), false);

    slipway()
        .args(["prepare", "--skip-python-deps"])
        .current_dir(&project)
        .assert()
        .success();

    assert!(project.join("pkgs/framework-libs/package.json").exists());
}

#[cfg(unix)]
#[test]
fn test_prepare_respects_lib_compile_flag() {
    let tmp = temp_dir();
    let archive = framework_archive(tmp.path(), false);
    let project = tmp.path().join("proj");
    fs::create_dir_all(&project).unwrap();
    write_project(&project, &file_url(&archive), None);

    slipway()
        .args(["prepare", "--skip-python-deps"])
        .env("SLIPWAY_LIB_COMPILE_FLAG", "False")
        .current_dir(&project)
        .assert()
        .success();

    assert!(!project.join("hook-ran.txt").exists());

    slipway()
        .args(["prepare", "--skip-python-deps"])
        .current_dir(&project)
        .assert()
        .success();

    assert!(project.join("hook-ran.txt").exists());
}

#[test]
fn test_prepare_fails_without_project() {
    let tmp = temp_dir();

    slipway()
        .args(["prepare", "--skip-python-deps"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find `slipway.toml`"));
}

#[cfg(unix)]
#[test]
fn test_prepare_with_project_dir_flag() {
    let tmp = temp_dir();
    let archive = framework_archive(tmp.path(), false);
    let project = tmp.path().join("proj");
    fs::create_dir_all(&project).unwrap();
    write_project(&project, &file_url(&archive), None);

    slipway()
        .args([
            "prepare",
            "--skip-python-deps",
            "--project-dir",
            project.to_str().unwrap(),
        ])
        .current_dir(tmp.path())
        .assert()
        .success();

    assert!(project.join("pkgs/framework-libs/package.json").exists());
}

// ============================================================================
// slipway deps
// ============================================================================

#[cfg(unix)]
#[test]
fn test_deps_dry_run_reports_missing_packages() {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    let tmp = temp_dir();

    // Stand-in interpreter: answers `pip list` with a fixed inventory
    // that is missing intelhex.
    let python = tmp.path().join("fakepython");
    let mut file = fs::File::create(&python).unwrap();
    writeln!(file, "#!/bin/sh").unwrap();
    writeln!(
        file,
        "echo '[{{\"name\": \"wheel\", \"version\": \"0.45.1\"}}, {{\"name\": \"PyYAML\", \"version\": \"6.0.2\"}}]'"
    )
    .unwrap();
    drop(file);
    fs::set_permissions(&python, fs::Permissions::from_mode(0o755)).unwrap();

    slipway()
        .args(["deps", "--dry-run", "--python", python.to_str().unwrap()])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("intelhex>=2.3.0"))
        .stderr(predicate::str::contains("dry run"));
}

// ============================================================================
// slipway completions
// ============================================================================

#[test]
fn test_completions_bash() {
    slipway()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("slipway"));
}
