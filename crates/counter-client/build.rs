//! Stamps the offline cache generation name into the crate.
//!
//! Every deploy gets a fresh generation (`1mb-<short sha>`), so activating a new
//! worker drops the caches of the previous one.

use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

const PREFIX: &str = "1mb-";

fn main() {
    println!("cargo:rerun-if-env-changed=CACHE_GENERATION");
    println!("cargo:rerun-if-changed=../../.git/HEAD");

    let generation = match std::env::var("CACHE_GENERATION") {
        Ok(explicit) if !explicit.trim().is_empty() => explicit.trim().to_string(),
        _ => format!("{PREFIX}{}", commit_sha().unwrap_or_else(timestamp_id)),
    };

    println!("cargo:rustc-env=CACHE_GENERATION={generation}");
}

fn commit_sha() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let sha = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!sha.is_empty()).then_some(sha)
}

/// Unix time in milliseconds, base 36.
fn timestamp_id() -> String {
    let mut millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    if millis == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while millis > 0 {
        let digit = (millis % 36) as u32;
        digits.push(char::from_digit(digit, 36).unwrap_or('0'));
        millis /= 36;
    }
    digits.iter().rev().collect()
}
