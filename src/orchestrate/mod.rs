// src/orchestrate/mod.rs

//! Package conversion orchestration.
//!
//! Drives the whole pipeline for one parsed package:
//!
//! 1. Split the package into conversion units (services, documents,
//!    EDI schemas)
//! 2. Convert units in parallel; a unit that fails becomes a failed
//!    component, never a batch abort
//! 3. Validate every generated component
//! 4. Aggregate the migration report
//!
//! Publishing is a separate pass over an already-converted batch, so a
//! network outage cannot cost the conversion work.

pub mod publish;
pub mod report;

use crate::analyze::pattern;
use crate::config::ConversionConfig;
use crate::generate::validate::{self, Finding};
use crate::generate::{
    connector, edi, map, process, profile, ComponentStatus, GeneratedComponent, TargetKind,
};
use crate::ir::model::{Document, EdiSchema, Invocation, Package, Service, ServiceKind};
use crate::transpile;
use publish::{ComponentId, PlatformClient, PublishError};
use rayon::prelude::*;
use report::PackageReport;
use strum_macros::Display;
use tracing::{info, warn};

/// One convertible unit extracted from the package IR
enum ConversionUnit<'a> {
    Service(&'a Service),
    Document(&'a Document),
    EdiSchema(&'a EdiSchema),
}

/// Lifecycle of one package through the pipeline; logged at each transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum BatchState {
    Extracted,
    Converting,
    Reported,
    Publishing,
    Done,
}

/// Everything the convert command needs: the components, their validation
/// findings, and the rolled-up report.
#[derive(Debug)]
pub struct ConversionResult {
    pub components: Vec<GeneratedComponent>,
    pub findings: Vec<(String, Vec<Finding>)>,
    pub report: PackageReport,
}

/// Convert a parsed package into target components.
///
/// Always returns a result: units that cannot convert come back as failed
/// components and the report counts them.
pub fn convert_package(package: &Package, config: &ConversionConfig) -> ConversionResult {
    let units = extract_units(package, config);
    info!(
        state = %BatchState::Extracted,
        "Package {} split into {} units",
        package.manifest.name,
        units.len()
    );

    info!(state = %BatchState::Converting, "Converting {}", package.manifest.name);
    let components: Vec<GeneratedComponent> = units
        .par_iter()
        .map(|unit| convert_unit(unit, config))
        .collect();

    let findings: Vec<(String, Vec<Finding>)> = components
        .iter()
        .map(|c| (c.name.clone(), validate::validate(c)))
        .collect();
    for (name, unit_findings) in &findings {
        for finding in unit_findings {
            warn!("{}: {} ({})", name, finding.message, finding.severity);
        }
    }

    let parse_failures = package
        .parse_failures
        .iter()
        .map(|f| format!("{}: {}", f.path, f.reason))
        .collect();
    let report = PackageReport::build(&package.manifest.name, &components, parse_failures);
    info!(
        state = %BatchState::Reported,
        "Converted {}: {} components, {}% overall automation",
        package.manifest.name, report.component_count, report.overall_automation
    );

    ConversionResult {
        components,
        findings,
        report,
    }
}

fn extract_units<'a>(package: &'a Package, config: &ConversionConfig) -> Vec<ConversionUnit<'a>> {
    let mut units: Vec<ConversionUnit> = Vec::new();
    for service in &package.services {
        if config.skip_builtin_only && calls_only_builtins(service) {
            info!("Skipping {}: only built-in service calls", service.name);
            continue;
        }
        units.push(ConversionUnit::Service(service));
    }
    units.extend(package.documents.iter().map(ConversionUnit::Document));
    units.extend(package.edi_schemas.iter().map(ConversionUnit::EdiSchema));
    units
}

/// A thin wrapper around the source platform's standard library carries no
/// logic worth porting as its own component.
fn calls_only_builtins(service: &Service) -> bool {
    !service.invocations.is_empty() && service.invocations.iter().all(Invocation::is_builtin)
}

fn convert_unit(unit: &ConversionUnit, config: &ConversionConfig) -> GeneratedComponent {
    match unit {
        ConversionUnit::Service(service) => convert_service(service),
        ConversionUnit::Document(doc) => convert_document(doc, config),
        ConversionUnit::EdiSchema(schema) => match edi::generate_edi_profile(schema) {
            Ok(component) => component,
            Err(e) => GeneratedComponent::failed(
                TargetKind::EdiProfile,
                &schema.name,
                &schema.path,
                e.to_string(),
            ),
        },
    }
}

fn convert_service(service: &Service) -> GeneratedComponent {
    let result = match service.kind {
        ServiceKind::Flow => {
            let analysis = pattern::analyze(service);
            process::generate_process(service, &analysis)
        }
        ServiceKind::Map => map::generate_map(service),
        ServiceKind::Adapter => connector::generate_connector(service),
        ServiceKind::Script => convert_script(service),
        ServiceKind::Unknown => {
            let reason = service
                .degraded
                .clone()
                .unwrap_or_else(|| "service kind could not be determined".to_string());
            return GeneratedComponent::failed(
                TargetKind::Process,
                &service.name,
                &service.path,
                reason,
            );
        }
    };

    match result {
        Ok(mut component) => {
            if let Some(reason) = &service.degraded {
                component
                    .warnings
                    .push(format!("Source unit was degraded: {reason}"));
                if component.status == ComponentStatus::Converted {
                    component.status = ComponentStatus::ConvertedWithWarnings;
                }
            }
            component
        }
        Err(e) => GeneratedComponent::failed(
            target_kind_for(service.kind),
            &service.name,
            &service.path,
            e.to_string(),
        ),
    }
}

fn target_kind_for(kind: ServiceKind) -> TargetKind {
    match kind {
        ServiceKind::Map => TargetKind::Map,
        ServiceKind::Adapter => TargetKind::Connector,
        ServiceKind::Script => TargetKind::DataProcess,
        _ => TargetKind::Process,
    }
}

fn convert_script(service: &Service) -> crate::error::Result<GeneratedComponent> {
    match &service.embedded_source {
        Some(source) => {
            let output = transpile::transpile(source);
            process::generate_script_process(service, &output)
        }
        None => Ok(GeneratedComponent::failed(
            TargetKind::DataProcess,
            &service.name,
            &service.path,
            "script service has no embedded source".to_string(),
        )),
    }
}

fn convert_document(doc: &Document, config: &ConversionConfig) -> GeneratedComponent {
    let haystack = format!("{} {}", doc.name, doc.path).to_lowercase();
    let result = if config
        .flat_file_hints
        .iter()
        .any(|hint| haystack.contains(hint.as_str()))
    {
        profile::generate_flat_profile(doc)
    } else if haystack.contains("json") {
        profile::generate_json_profile(doc)
    } else {
        profile::generate_xml_profile(doc)
    };

    match result {
        Ok(component) => component,
        Err(e) => GeneratedComponent::failed(
            TargetKind::ProfileXml,
            &doc.name,
            &doc.path,
            e.to_string(),
        ),
    }
}

/// Outcome of one component upload
#[derive(Debug)]
pub enum PublishOutcome {
    Published(ComponentId),
    SkippedValidation(Vec<Finding>),
    SkippedFailed,
    Failed(PublishError),
}

/// Publish a converted batch, component by component. Components with
/// validation errors or a failed conversion are skipped, not sent.
pub fn publish_components(
    client: &dyn PlatformClient,
    result: &ConversionResult,
) -> Vec<(String, PublishOutcome)> {
    info!(
        state = %BatchState::Publishing,
        "Publishing {} components",
        result.components.len()
    );
    let outcomes: Vec<(String, PublishOutcome)> = result
        .components
        .iter()
        .map(|component| {
            let outcome = if component.status == ComponentStatus::Failed {
                PublishOutcome::SkippedFailed
            } else {
                let findings = result
                    .findings
                    .iter()
                    .find(|(name, _)| name == &component.name)
                    .map(|(_, f)| f.clone())
                    .unwrap_or_default();
                if validate::blocks_publish(&findings) {
                    PublishOutcome::SkippedValidation(findings)
                } else {
                    match publish::publish_with_retry(client, &component.name, &component.xml) {
                        Ok(id) => PublishOutcome::Published(id),
                        Err(e) => PublishOutcome::Failed(e),
                    }
                }
            };
            (component.name.clone(), outcome)
        })
        .collect();
    info!(state = %BatchState::Done, "Publish pass complete");
    outcomes
}
