use assert_cmd::prelude::*;
use predicates::str::contains;
use std::process::Command;

/// Without a display server the window cannot be created, so the binary
/// must stop during init and exit non-zero.
#[cfg(target_os = "linux")]
#[test]
fn exits_non_zero_without_display() {
    let mut cmd = Command::cargo_bin("sss-gems").expect("binary exists");
    cmd.env_remove("DISPLAY")
        .env_remove("WAYLAND_DISPLAY")
        .env_remove("WAYLAND_SOCKET")
        .env("RUST_LOG", "off");
    cmd.assert()
        .failure()
        .code(1)
        .stderr(contains("Error: failed to initialize"));
}
