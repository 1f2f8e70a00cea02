//! Build script for ofemo-notify
//!
//! Bakes `GIT_HASH`, `BUILD_TIMESTAMP` and `BUILD_PROFILE` into the binary.
//! `main.rs` prints them in the "Starting ofemo-notify" line so a log file
//! attached to a bug report names the exact build that sent it.

use std::process::Command;

fn main() {
    // Source tarballs have no .git; the startup line then reads "unknown"
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let build_timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", build_timestamp);
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);
}
