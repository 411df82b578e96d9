// src/commands/analyze.rs
//! Package analysis command

use anyhow::Result;
use flowport::analyze::{pattern, sql};
use flowport::ir::builder::parse_package;
use flowport::ir::model::ServiceKind;
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Serialize)]
struct ServiceSummary {
    name: String,
    kind: String,
    pattern: Option<String>,
    automation_level: u8,
    complexity: String,
    notes: Vec<String>,
}

/// Analyze a package and print per-service findings without generating
/// any components.
pub fn cmd_analyze(package_path: &str, json: bool) -> Result<()> {
    info!("Analyzing package at {}", package_path);
    let package = parse_package(Path::new(package_path))?;

    let mut summaries = Vec::new();
    for service in &package.services {
        let summary = match service.kind {
            ServiceKind::Adapter => {
                let analysis = service
                    .adapter_config
                    .as_ref()
                    .and_then(|cfg| cfg.sql.as_deref())
                    .map(sql::analyze);
                match analysis {
                    Some(analysis) => ServiceSummary {
                        name: service.name.clone(),
                        kind: service.kind.to_string(),
                        pattern: Some(format!("sql/{}", analysis.operation)),
                        automation_level: analysis.automation_level,
                        complexity: analysis.complexity.to_string(),
                        notes: analysis.warnings,
                    },
                    None => ServiceSummary {
                        name: service.name.clone(),
                        kind: service.kind.to_string(),
                        pattern: None,
                        automation_level: 35,
                        complexity: "unknown".to_string(),
                        notes: vec!["no SQL statement recovered".to_string()],
                    },
                }
            }
            _ => {
                let analysis = pattern::analyze(service);
                ServiceSummary {
                    name: service.name.clone(),
                    kind: service.kind.to_string(),
                    pattern: analysis.primary.map(|p| p.to_string()),
                    automation_level: analysis.automation_level,
                    complexity: analysis.complexity.to_string(),
                    notes: analysis.notes,
                }
            }
        };
        summaries.push(summary);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!(
        "Package {} ({} services, {} documents, {} EDI schemas)",
        package.manifest.name,
        package.services.len(),
        package.documents.len(),
        package.edi_schemas.len()
    );
    for summary in &summaries {
        println!(
            "  {:<40} {:<8} {:>3}%  {}",
            summary.name,
            summary.kind,
            summary.automation_level,
            summary.pattern.as_deref().unwrap_or("-")
        );
        for note in &summary.notes {
            println!("      note: {}", note);
        }
    }
    if !package.parse_failures.is_empty() {
        println!("Parse failures:");
        for failure in &package.parse_failures {
            println!("  {}: {}", failure.path, failure.reason);
        }
    }
    Ok(())
}
