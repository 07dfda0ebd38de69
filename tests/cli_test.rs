use std::process::Command;

fn cargo_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fia_bind"))
}

// ============================================================
// 1. --help flag shows usage and exits with success
// ============================================================

#[test]
fn test_main_help_flag() {
    let output = cargo_bin()
        .arg("--help")
        .output()
        .expect("failed to execute binary");

    assert!(output.status.success(), "should exit with success for --help");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Usage"),
        "stderr should contain 'Usage', got: {stderr}"
    );
}

// ============================================================
// 2. --version flag shows version and exits with success
// ============================================================

#[test]
fn test_main_version_flag() {
    let output = cargo_bin()
        .arg("--version")
        .output()
        .expect("failed to execute binary");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(env!("CARGO_PKG_VERSION")), "got: {stderr}");
}

// ============================================================
// 3. Missing library exits with failure
// ============================================================

#[test]
fn test_main_missing_library_fails() {
    let dir = tempfile::tempdir().unwrap();
    let settings = dir.path().join("fia.yaml");
    std::fs::write(
        &settings,
        "library_name: fia_bind_cli_missing_lib\ninclude_exe_dir: false\n",
    )
    .unwrap();

    let output = cargo_bin()
        .arg(&settings)
        .output()
        .expect("failed to execute binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("fia_bind_cli_missing_lib"),
        "stderr should name the library, got: {stderr}"
    );
}

// ============================================================
// 4. Bad arguments
// ============================================================

#[test]
fn test_main_unknown_option_fails() {
    let output = cargo_bin()
        .arg("--frobnicate")
        .output()
        .expect("failed to execute binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown option"), "got: {stderr}");
}

#[test]
fn test_main_unreadable_settings_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = cargo_bin()
        .arg(dir.path().join("nope.yaml"))
        .output()
        .expect("failed to execute binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load settings"), "got: {stderr}");
}
