// src/commands/convert.rs
//! Package conversion command

use anyhow::{Context, Result};
use flowport::config::Config;
use flowport::generate::{ComponentStatus, GeneratedComponent};
use flowport::ir::builder::parse_package;
use flowport::orchestrate::{convert_package, ConversionResult};
use std::fs;
use std::path::Path;
use tracing::info;

/// Convert a package and write the components plus the migration report
/// into the output directory.
pub fn cmd_convert(package_path: &str, output: &str, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => Config::load(Path::new(path))?,
        None => Config::default(),
    };

    info!("Converting package at {}", package_path);
    let package = parse_package(Path::new(package_path))?;
    let result = convert_package(&package, &config.conversion);

    write_output(Path::new(output), &result)?;
    print_summary(&result);
    Ok(())
}

/// Write each component as `<kind>.<name>.xml` plus `report.json`.
pub fn write_output(output: &Path, result: &ConversionResult) -> Result<()> {
    fs::create_dir_all(output)
        .with_context(|| format!("create output directory {}", output.display()))?;

    for component in &result.components {
        if component.status == ComponentStatus::Failed {
            continue;
        }
        let path = output.join(component_filename(component));
        fs::write(&path, &component.xml)
            .with_context(|| format!("write {}", path.display()))?;
    }

    let report_path = output.join("report.json");
    fs::write(&report_path, result.report.to_json()?)
        .with_context(|| format!("write {}", report_path.display()))?;
    info!("Wrote migration report to {}", report_path.display());
    Ok(())
}

fn component_filename(component: &GeneratedComponent) -> String {
    let safe: String = component
        .name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{}.{}.xml", component.target_kind, safe)
}

fn print_summary(result: &ConversionResult) {
    let report = &result.report;
    println!(
        "Converted {}: {} components ({} clean, {} with warnings, {} failed)",
        report.package_name,
        report.component_count,
        report.status.converted,
        report.status.converted_with_warnings,
        report.status.failed
    );
    println!(
        "  Automation: {}% overall ({} automatic, {} semi-automatic, {} manual)",
        report.overall_automation,
        report.tiers.automatic,
        report.tiers.semi_automatic,
        report.tiers.manual
    );
    println!("  Estimated manual effort: {} hours", report.estimated_manual_hours);
    if !report.critical_issues.is_empty() {
        println!("  Critical issues:");
        for issue in &report.critical_issues {
            println!("    - {}", issue);
        }
    }
}
