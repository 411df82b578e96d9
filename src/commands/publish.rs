// src/commands/publish.rs
//! Convert-and-upload command

use anyhow::Result;
use flowport::config::Config;
use flowport::ir::builder::parse_package;
use flowport::orchestrate::publish::HttpPlatformClient;
use flowport::orchestrate::{convert_package, publish_components, PublishOutcome};
use std::path::Path;
use tracing::info;

/// Convert a package and upload every publishable component.
pub fn cmd_publish(package_path: &str, config_path: &str, output: Option<&str>) -> Result<()> {
    let config = Config::load(Path::new(config_path))?;
    let platform = config.platform()?.clone();

    info!("Converting package at {}", package_path);
    let package = parse_package(Path::new(package_path))?;
    let result = convert_package(&package, &config.conversion);

    if let Some(output) = output {
        super::convert::write_output(Path::new(output), &result)?;
    }

    let client = HttpPlatformClient::new(platform)?;
    let outcomes = publish_components(&client, &result);

    let mut published = 0;
    let mut skipped = 0;
    let mut failed = 0;
    for (name, outcome) in &outcomes {
        match outcome {
            PublishOutcome::Published(id) => {
                published += 1;
                println!("  published {} as {}", name, id);
            }
            PublishOutcome::SkippedFailed => {
                skipped += 1;
                println!("  skipped {} (conversion failed)", name);
            }
            PublishOutcome::SkippedValidation(findings) => {
                skipped += 1;
                println!("  skipped {} ({} validation findings)", name, findings.len());
            }
            PublishOutcome::Failed(e) => {
                failed += 1;
                println!("  failed {}: {}", name, e);
            }
        }
    }
    println!(
        "Published {} of {} components ({} skipped, {} failed)",
        published,
        outcomes.len(),
        skipped,
        failed
    );
    Ok(())
}
