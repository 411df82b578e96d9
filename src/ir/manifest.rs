// src/ir/manifest.rs

//! Package manifest parsing.
//!
//! The exported manifest is a flat `key=value` file. Recognized keys are
//! `name`, `version`, `requires.<package>` (declared dependencies), and
//! `startup.<n>` / `shutdown.<n>` (lifecycle services). Unknown keys are
//! ignored.

use crate::ir::model::Manifest;

/// Parse manifest text into a [`Manifest`].
///
/// Never fails: missing keys leave the corresponding fields empty and the
/// caller falls back to the package directory name.
pub fn parse_manifest(text: &str) -> Manifest {
    let mut manifest = Manifest::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        if key == "name" {
            manifest.name = value.to_string();
        } else if key == "version" {
            manifest.version = value.to_string();
        } else if let Some(dep) = key.strip_prefix("requires.") {
            let dep = if dep.is_empty() { value } else { dep };
            if !manifest.dependencies.iter().any(|d| d == dep) {
                manifest.dependencies.push(dep.to_string());
            }
        } else if key.starts_with("startup.") || key == "startup" {
            manifest.startup_services.push(value.to_string());
        } else if key.starts_with("shutdown.") || key == "shutdown" {
            manifest.shutdown_services.push(value.to_string());
        }
    }

    manifest
}
