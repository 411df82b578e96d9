// src/ir/builder.rs

//! Package tree walking and IR construction.
//!
//! A source package is an extracted directory tree. Units are recognized by
//! fixed file names: `manifest.v3` (package manifest), `node.ndf` (service
//! or document descriptor), `flow.xml` (flow body), `java.frag` / `*.java`
//! (embedded source). Each descriptor directory becomes one `Service` or
//! `Document`; per-unit failures degrade the record and are collected in
//! `Package::parse_failures`, they never abort the walk.

use crate::decode::decode_source;
use crate::error::{Error, Result};
use crate::ir::model::{
    AdapterConfig, Document, EdiSchema, EdiStandard, Package, ParseFailure, Service, ServiceKind,
    ADAPTER_KINDS,
};
use crate::ir::xml::XmlNode;
use crate::ir::{document, flow, manifest, xml};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const MANIFEST_FILE: &str = "manifest.v3";
const DESCRIPTOR_FILE: &str = "node.ndf";
const FLOW_FILE: &str = "flow.xml";
const JAVA_FRAGMENT: &str = "java.frag";

static X12_SET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{3})").unwrap());

/// Parse an extracted package directory into IR.
///
/// Fails only if the root directory cannot be read; everything below that
/// degrades per unit.
pub fn parse_package(root: &Path) -> Result<Package> {
    if !root.is_dir() {
        return Err(Error::Parse(format!(
            "package root {} is not a directory",
            root.display()
        )));
    }

    let mut package = Package {
        root: root.to_path_buf(),
        ..Default::default()
    };

    package.manifest = read_manifest(root);
    if package.manifest.name.is_empty() {
        package.manifest.name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "package".to_string());
    }

    let mut walker = WalkDir::new(root).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        if entry.file_type().is_file() && entry.file_name() == DESCRIPTOR_FILE {
            let unit_dir = entry.path().parent().unwrap_or(root);
            parse_unit(root, unit_dir, &mut package);
        }
    }

    info!(
        package = %package.manifest.name,
        services = package.services.len(),
        documents = package.documents.len(),
        edi_schemas = package.edi_schemas.len(),
        failures = package.parse_failures.len(),
        "package parsed"
    );

    Ok(package)
}

fn read_manifest(root: &Path) -> crate::ir::model::Manifest {
    let path = root.join(MANIFEST_FILE);
    match std::fs::read(&path) {
        Ok(raw) => match decode_source(&raw) {
            Ok(text) => manifest::parse_manifest(&text),
            Err(e) => {
                warn!("manifest undecodable: {e}");
                Default::default()
            }
        },
        Err(_) => Default::default(),
    }
}

/// Parse one descriptor directory into a service, document, or EDI schema.
fn parse_unit(root: &Path, unit_dir: &Path, package: &mut Package) {
    let name = unit_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let rel_path = unit_dir
        .strip_prefix(root)
        .unwrap_or(unit_dir)
        .to_string_lossy()
        .replace('\\', "/");

    let descriptor = match std::fs::read(unit_dir.join(DESCRIPTOR_FILE)) {
        Ok(raw) => match decode_source(&raw) {
            Ok(text) => text,
            Err(e) => {
                package.parse_failures.push(ParseFailure {
                    path: rel_path.clone(),
                    reason: format!("descriptor undecodable: {e}"),
                });
                package
                    .services
                    .push(Service::degraded(name, rel_path, e.to_string()));
                return;
            }
        },
        Err(e) => {
            package.parse_failures.push(ParseFailure {
                path: rel_path.clone(),
                reason: format!("descriptor unreadable: {e}"),
            });
            package
                .services
                .push(Service::degraded(name, rel_path, e.to_string()));
            return;
        }
    };

    if is_document_descriptor(&descriptor) {
        if let Some(schema) = detect_edi_schema(&name, &rel_path, &descriptor) {
            debug!(name = %schema.name, set = %schema.transaction_set, "EDI schema");
            package.edi_schemas.push(schema);
            return;
        }
        match document::parse_document(&descriptor) {
            Ok(fields) => package.documents.push(Document {
                name,
                path: rel_path,
                fields,
                degraded: None,
            }),
            Err(reason) => {
                package.parse_failures.push(ParseFailure {
                    path: rel_path.clone(),
                    reason: reason.clone(),
                });
                package.documents.push(Document {
                    name,
                    path: rel_path,
                    fields: Vec::new(),
                    degraded: Some(reason),
                });
            }
        }
        return;
    }

    let kind = infer_service_kind(&rel_path, &descriptor);
    let mut service = Service {
        name,
        path: rel_path.clone(),
        kind,
        flow: None,
        embedded_source: None,
        adapter_config: None,
        invocations: Vec::new(),
        degraded: None,
    };

    match kind {
        ServiceKind::Flow | ServiceKind::Map => {
            attach_flow(unit_dir, &mut service, package);
        }
        ServiceKind::Script => {
            service.embedded_source = read_embedded_source(unit_dir);
            if service.embedded_source.is_none() {
                service.degraded = Some("no embedded source found".to_string());
                package.parse_failures.push(ParseFailure {
                    path: rel_path,
                    reason: "script service without java source".to_string(),
                });
            }
        }
        ServiceKind::Adapter => {
            service.adapter_config = Some(parse_adapter_config(&rel_path, &descriptor));
            // Adapter services still may carry a flow wrapper body.
            attach_flow(unit_dir, &mut service, package);
        }
        ServiceKind::Unknown => {}
    }

    package.services.push(service);
}

fn attach_flow(unit_dir: &Path, service: &mut Service, package: &mut Package) {
    let flow_path = unit_dir.join(FLOW_FILE);
    if !flow_path.is_file() {
        return;
    }
    let raw = match std::fs::read(&flow_path) {
        Ok(raw) => raw,
        Err(e) => {
            service.degraded = Some(format!("flow body unreadable: {e}"));
            package.parse_failures.push(ParseFailure {
                path: service.path.clone(),
                reason: format!("flow body unreadable: {e}"),
            });
            return;
        }
    };
    let text = match decode_source(&raw) {
        Ok(text) => text,
        Err(e) => {
            service.degraded = Some(format!("flow body undecodable: {e}"));
            package.parse_failures.push(ParseFailure {
                path: service.path.clone(),
                reason: format!("flow body undecodable: {e}"),
            });
            return;
        }
    };
    match flow::parse_flow(&text) {
        Ok((tree, invocations)) => {
            service.flow = Some(tree);
            service.invocations = invocations;
        }
        Err(reason) => {
            service.degraded = Some(reason.clone());
            package.parse_failures.push(ParseFailure {
                path: service.path.clone(),
                reason,
            });
        }
    }
}

fn read_embedded_source(unit_dir: &Path) -> Option<String> {
    let fragment = unit_dir.join(JAVA_FRAGMENT);
    let candidate = if fragment.is_file() {
        Some(fragment)
    } else {
        std::fs::read_dir(unit_dir).ok().and_then(|entries| {
            entries
                .flatten()
                .map(|e| e.path())
                .find(|p| p.extension().is_some_and(|ext| ext == "java"))
        })
    };
    // Java fragments are plain source, not descriptor XML; the decode
    // cascade would truncate them at the last '>'.
    let raw = std::fs::read(candidate?).ok()?;
    let text = String::from_utf8_lossy(&raw);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Whether a descriptor defines a document type rather than a service
fn is_document_descriptor(descriptor: &str) -> bool {
    descriptor_value(descriptor, "node_type")
        .is_some_and(|v| v == "record" || v == "document" || v == "doctype")
}

/// Service-kind inference cascade: descriptor attributes, then path
/// substrings, then content heuristics. First match wins; default is Flow.
pub fn infer_service_kind(path: &str, descriptor: &str) -> ServiceKind {
    // Descriptor attributes are authoritative when present.
    if let Some(svc_type) = descriptor_value(descriptor, "svc_type") {
        match svc_type.as_str() {
            "flow" => return ServiceKind::Flow,
            "java" => return ServiceKind::Script,
            _ => {}
        }
    }
    if descriptor_value(descriptor, "svc_subtype").is_some_and(|v| v.contains("adapter"))
        || descriptor.to_lowercase().contains("adapterservice")
    {
        return ServiceKind::Adapter;
    }

    // Path substrings.
    let lower = path.to_lowercase();
    if lower.contains("adapter") || lower.contains("jdbc") || lower.contains("sap") {
        return ServiceKind::Adapter;
    }
    if lower.contains("flow") {
        return ServiceKind::Flow;
    }
    if lower.contains("java") {
        return ServiceKind::Script;
    }
    if lower.contains("map") && lower.contains("service") {
        return ServiceKind::Map;
    }

    // Content heuristics.
    if descriptor.contains("<FLOW") || descriptor.contains("flow.xml") {
        return ServiceKind::Flow;
    }
    if descriptor.contains("IData") || descriptor.contains("com.wm.app") {
        return ServiceKind::Script;
    }

    ServiceKind::Flow
}

/// Extract `<value name="key">text</value>` from a descriptor without a full
/// tree load; used by the inference cascade on possibly mangled input.
fn descriptor_value(descriptor: &str, key: &str) -> Option<String> {
    let needle = format!("name=\"{key}\">");
    let start = descriptor.find(&needle)? + needle.len();
    let rest = &descriptor[start..];
    let end = rest.find('<')?;
    Some(rest[..end].trim().to_lowercase())
}

/// Adapter technology detection plus connection property extraction.
fn parse_adapter_config(path: &str, descriptor: &str) -> AdapterConfig {
    let haystack = format!("{} {}", path.to_lowercase(), descriptor.to_lowercase());
    let kind = ADAPTER_KINDS
        .iter()
        .find(|k| haystack.contains(*k))
        .map(|k| (*k).to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut properties = BTreeMap::new();
    let mut sql = None;
    if let Ok(root) = xml::load(descriptor) {
        collect_properties(&root, &mut properties, &mut sql);
    }

    AdapterConfig {
        kind,
        sql,
        properties,
    }
}

fn collect_properties(
    node: &XmlNode,
    properties: &mut BTreeMap<String, String>,
    sql: &mut Option<String>,
) {
    for child in node.walk() {
        if child.local_name() != "VALUE" {
            continue;
        }
        let Some(name) = child.attr("name") else {
            continue;
        };
        if child.text.is_empty() {
            continue;
        }
        let lower = name.to_lowercase();
        if lower.contains("sql") || lower == "querystatement" || lower == "statement" {
            if sql.is_none() {
                *sql = Some(child.text.clone());
            }
        } else {
            properties
                .entry(name.to_string())
                .or_insert_with(|| child.text.clone());
        }
    }
}

/// Recognize EDI transaction-set schemas among document descriptors.
fn detect_edi_schema(name: &str, path: &str, descriptor: &str) -> Option<EdiSchema> {
    let haystack = format!("{} {} {}", name, path, descriptor).to_lowercase();
    let standard = if haystack.contains("x12") {
        EdiStandard::X12
    } else if haystack.contains("edifact") {
        EdiStandard::Edifact
    } else {
        return None;
    };

    let transaction_set = match standard {
        EdiStandard::X12 => X12_SET
            .captures(name)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "850".to_string()),
        EdiStandard::Edifact => name
            .rsplit('_')
            .next()
            .filter(|s| s.chars().all(|c| c.is_ascii_uppercase()))
            .unwrap_or("ORDERS")
            .to_string(),
    };

    Some(EdiSchema {
        name: name.to_string(),
        path: path.to_string(),
        standard,
        transaction_set,
    })
}
