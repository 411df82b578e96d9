// src/generate/validate.rs

//! Structural validation of generated components before publish.
//!
//! Re-parses the emitted XML and checks the invariants the target platform
//! rejects uploads over: the component namespace, process shape wiring, and
//! non-empty profile bodies. Errors block publishing; warnings ride along
//! in the report.

use crate::generate::{GeneratedComponent, TargetKind, TARGET_NS};
use crate::ir::xml::{self, XmlNode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One validation finding against a generated component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    fn error(message: impl Into<String>) -> Self {
        Finding {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Finding {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Errors block publishing; warnings do not.
pub fn blocks_publish(findings: &[Finding]) -> bool {
    findings.iter().any(|f| f.severity == Severity::Error)
}

/// Validate one generated component. Failed components validate to a
/// single error so they surface in the same report channel.
pub fn validate(component: &GeneratedComponent) -> Vec<Finding> {
    if component.xml.is_empty() {
        return vec![Finding::error("component has no generated body")];
    }

    // The loader wraps the document in a synthetic root; the component
    // element is its first child.
    let tree = match xml::load(&component.xml) {
        Ok(tree) => tree,
        Err(e) => return vec![Finding::error(format!("generated XML is not well-formed: {e}"))],
    };
    let root = match tree.children.first() {
        Some(root) => root,
        None => return vec![Finding::error("generated XML contains no elements")],
    };

    let mut findings = Vec::new();
    check_component_root(root, &mut findings);
    check_key_uniqueness(root, &mut findings);

    match component.target_kind {
        TargetKind::Process | TargetKind::DataProcess => check_process(root, &mut findings),
        TargetKind::ProfileXml | TargetKind::ProfileFlat => {
            check_data_elements(root, &mut findings)
        }
        TargetKind::ProfileJson => check_json_schema(root, &mut findings),
        TargetKind::EdiProfile => check_edi_loops(root, &mut findings),
        TargetKind::Map | TargetKind::Connector => {}
    }

    findings
}

fn check_component_root(root: &XmlNode, findings: &mut Vec<Finding>) {
    if root.local_name() != "COMPONENT" {
        findings.push(Finding::error(format!(
            "root element is <{}>, expected a component",
            root.name
        )));
        return;
    }
    let has_ns = root
        .attrs
        .iter()
        .any(|(k, v)| k.starts_with("xmlns") && v == TARGET_NS);
    if !has_ns {
        findings.push(Finding::error("component namespace declaration is missing"));
    }
    if root.attr("name").map_or(true, str::is_empty) {
        findings.push(Finding::error("component name attribute is missing"));
    }
    if root.attr("type").map_or(true, str::is_empty) {
        findings.push(Finding::error("component type attribute is missing"));
    }
}

/// Element keys must be unique within one document.
fn check_key_uniqueness(root: &XmlNode, findings: &mut Vec<Finding>) {
    let mut seen = HashSet::new();
    for node in root.walk() {
        if let Some(key) = node.attr("key") {
            if !seen.insert(key.to_string()) {
                findings.push(Finding::error(format!("duplicate element key {key}")));
            }
        }
    }
}

fn check_process(root: &XmlNode, findings: &mut Vec<Finding>) {
    let shapes: Vec<&XmlNode> = root
        .walk()
        .filter(|n| n.local_name() == "SHAPE")
        .collect();
    if shapes.is_empty() {
        findings.push(Finding::error("process has no shapes"));
        return;
    }

    if shapes.first().and_then(|s| s.attr("shapetype")) != Some("start") {
        findings.push(Finding::error("first process shape is not a start shape"));
    }
    if shapes.last().and_then(|s| s.attr("shapetype")) != Some("stop") {
        findings.push(Finding::warning("last process shape is not a stop shape"));
    }

    let ids: HashSet<&str> = shapes.iter().filter_map(|s| s.attr("name")).collect();
    for conn in root.walk().filter(|n| n.local_name() == "CONNECTION") {
        for attr in ["fromShape", "toShape"] {
            if let Some(id) = conn.attr(attr) {
                if !ids.contains(id) {
                    findings.push(Finding::error(format!(
                        "connection references unknown shape {id}"
                    )));
                }
            }
        }
    }

    // Every non-start shape should be reachable from some connection.
    let targets: HashSet<&str> = root
        .walk()
        .filter(|n| n.local_name() == "CONNECTION")
        .filter_map(|n| n.attr("toShape"))
        .collect();
    for shape in &shapes {
        let is_start = shape.attr("shapetype") == Some("start");
        if let Some(id) = shape.attr("name") {
            if !is_start && !targets.contains(id) {
                findings.push(Finding::warning(format!("shape {id} has no inbound connection")));
            }
        }
    }
}

fn check_data_elements(root: &XmlNode, findings: &mut Vec<Finding>) {
    let has_elements = root
        .walk()
        .filter(|n| n.local_name() == "DATAELEMENTS")
        .any(|n| !n.children.is_empty());
    if !has_elements {
        findings.push(Finding::warning("profile has no data elements"));
    }
}

fn check_json_schema(root: &XmlNode, findings: &mut Vec<Finding>) {
    let schema_text = root
        .walk()
        .find(|n| n.local_name() == "JSONSCHEMA")
        .map(|n| n.text.trim().to_string())
        .unwrap_or_default();
    if schema_text.is_empty() {
        findings.push(Finding::warning("JSON profile has no schema body"));
    } else if serde_json::from_str::<serde_json::Value>(&schema_text).is_err() {
        findings.push(Finding::error("JSON profile schema body is not valid JSON"));
    }
}

fn check_edi_loops(root: &XmlNode, findings: &mut Vec<Finding>) {
    let has_segments = root
        .walk()
        .any(|n| n.local_name() == "SEGMENT");
    if !has_segments {
        findings.push(Finding::warning("EDI profile declares no segments"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::process::generate_process;
    use crate::generate::profile::generate_xml_profile;
    use crate::generate::{ComponentStatus, GeneratedComponent};
    use crate::ir::flow::parse_flow;
    use crate::ir::model::{Document, Service, ServiceKind};

    fn make_test_service() -> Service {
        let body = r#"<FLOW><SEQUENCE NAME="main"><MAP NAME="build"/></SEQUENCE></FLOW>"#;
        let (tree, invocations) = parse_flow(body).unwrap();
        Service {
            name: "processOrder".to_string(),
            path: "acme/orders/processOrder".to_string(),
            kind: ServiceKind::Flow,
            flow: Some(tree),
            embedded_source: None,
            adapter_config: None,
            invocations,
            degraded: None,
        }
    }

    #[test]
    fn generated_process_passes_validation() {
        let service = make_test_service();
        let analysis = crate::analyze::pattern::analyze(&service);
        let component = generate_process(&service, &analysis).unwrap();
        let findings = validate(&component);
        assert!(
            !blocks_publish(&findings),
            "unexpected errors: {findings:?}"
        );
    }

    #[test]
    fn generated_profile_passes_validation() {
        let doc = Document {
            name: "OrderDoc".to_string(),
            path: "acme/docs/OrderDoc".to_string(),
            fields: vec![crate::ir::model::Field {
                name: "orderId".to_string(),
                field_type: "string".to_string(),
                is_array: false,
                required: true,
                children: Vec::new(),
            }],
            degraded: None,
        };
        let component = generate_xml_profile(&doc).unwrap();
        assert!(!blocks_publish(&validate(&component)));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let component = GeneratedComponent {
            target_kind: TargetKind::Process,
            name: "broken".to_string(),
            source_path: "acme/broken".to_string(),
            xml: "not xml at all".to_string(),
            automation_level: 80,
            warnings: Vec::new(),
            manual_review_items: Vec::new(),
            status: ComponentStatus::Converted,
        };
        let findings = validate(&component);
        assert!(blocks_publish(&findings));
    }

    #[test]
    fn missing_namespace_is_an_error() {
        let component = GeneratedComponent {
            target_kind: TargetKind::Connector,
            name: "c".to_string(),
            source_path: "acme/c".to_string(),
            xml: r#"<bns:Component name="c" type="connector-settings"><bns:object key="1"/></bns:Component>"#
                .to_string(),
            automation_level: 75,
            warnings: Vec::new(),
            manual_review_items: Vec::new(),
            status: ComponentStatus::Converted,
        };
        let findings = validate(&component);
        assert!(findings
            .iter()
            .any(|f| f.severity == Severity::Error && f.message.contains("namespace")));
    }

    #[test]
    fn duplicate_keys_are_an_error() {
        let xml = format!(
            r#"<bns:Component xmlns:bns="{TARGET_NS}" name="c" type="connector-settings"><a key="1"/><b key="1"/></bns:Component>"#
        );
        let component = GeneratedComponent {
            target_kind: TargetKind::Connector,
            name: "c".to_string(),
            source_path: "acme/c".to_string(),
            xml,
            automation_level: 75,
            warnings: Vec::new(),
            manual_review_items: Vec::new(),
            status: ComponentStatus::Converted,
        };
        let findings = validate(&component);
        assert!(findings.iter().any(|f| f.message.contains("duplicate")));
    }

    #[test]
    fn failed_component_blocks_publish() {
        let component = GeneratedComponent::failed(
            TargetKind::Process,
            "bad",
            "acme/bad",
            "boom".to_string(),
        );
        assert!(blocks_publish(&validate(&component)));
    }
}
