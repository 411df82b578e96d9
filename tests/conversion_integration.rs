// tests/conversion_integration.rs
//! Integration tests for end-to-end package conversion
//!
//! These tests lay out realistic package trees on disk and validate the
//! whole pipeline: descriptor decoding, IR construction, pattern analysis,
//! component generation, and report aggregation, including:
//! - Mixed service kinds (flow, adapter, java) in one package
//! - Per-unit degradation of undecodable descriptors
//! - Validation of every generated component
//! - Report tier counts and migration order

use flowport::config::ConversionConfig;
use flowport::generate::validate;
use flowport::ir::builder::parse_package;
use flowport::orchestrate::convert_package;
use flowport::{ComponentStatus, ServiceKind, TargetKind};
use std::fs;
use tempfile::TempDir;

// =============================================================================
// TEST HELPERS
// =============================================================================

/// Lay out a package with one of each convertible unit kind
fn create_mixed_package() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("manifest.v3"),
        "name=AcmeOrders\nversion=2.1.0\nrequires.WmPublic=10.5\nstartup.init=acme.orders:startup\n",
    )
    .unwrap();

    // Flow service with a branch, so the router pattern has signal.
    let flow_dir = dir.path().join("ns/acme/orders/routeOrder_flow");
    fs::create_dir_all(&flow_dir).unwrap();
    fs::write(
        flow_dir.join("node.ndf"),
        "<Values><value name=\"svc_type\">flow</value></Values>",
    )
    .unwrap();
    fs::write(
        flow_dir.join("flow.xml"),
        r#"<FLOW>
<BRANCH SWITCH="/orderType">
  <SEQUENCE NAME="standard"><MAP NAME="toStandard"/></SEQUENCE>
  <SEQUENCE NAME="express"><MAP NAME="toExpress"/></SEQUENCE>
</BRANCH>
</FLOW>"#,
    )
    .unwrap();

    // Database adapter service with an embedded statement.
    let adapter_dir = dir.path().join("ns/acme/jdbc/getOpenOrders");
    fs::create_dir_all(&adapter_dir).unwrap();
    fs::write(
        adapter_dir.join("node.ndf"),
        r#"<Values><value name="svc_subtype">AdapterService</value>
<value name="sqlQuery">SELECT id, status FROM orders WHERE status = ?</value>
<value name="connectionName">ordersDb</value></Values>"#,
    )
    .unwrap();

    // Java service with an embedded source fragment.
    let java_dir = dir.path().join("ns/acme/util/formatAmount_java");
    fs::create_dir_all(&java_dir).unwrap();
    fs::write(
        java_dir.join("node.ndf"),
        "<Values><value name=\"svc_type\">java</value></Values>",
    )
    .unwrap();
    fs::write(
        java_dir.join("java.frag"),
        r#"IDataCursor cursor = pipeline.getCursor();
String amount = IDataUtil.getString(cursor, "amount");
IDataUtil.put(cursor, "formatted", "$" + amount);
cursor.destroy();
"#,
    )
    .unwrap();

    // Document type.
    let doc_dir = dir.path().join("ns/acme/docs/OrderDoc");
    fs::create_dir_all(&doc_dir).unwrap();
    fs::write(
        doc_dir.join("node.ndf"),
        r#"<Values><value name="node_type">record</value>
<array name="rec_fields">
<record><value name="field_name">orderId</value><value name="field_type">string</value></record>
<record><value name="field_name">total</value><value name="field_type">double</value></record>
</array></Values>"#,
    )
    .unwrap();

    dir
}

// =============================================================================
// END-TO-END CONVERSION
// =============================================================================

#[test]
fn mixed_package_converts_every_unit() {
    let dir = create_mixed_package();
    let package = parse_package(dir.path()).unwrap();
    assert_eq!(package.manifest.name, "AcmeOrders");
    assert_eq!(package.services.len(), 3);
    assert_eq!(package.documents.len(), 1);
    assert_eq!(package.manifest.startup_services, vec!["acme.orders:startup"]);

    let result = convert_package(&package, &ConversionConfig::default());
    assert_eq!(result.components.len(), 4);
    assert_eq!(result.report.status.failed, 0);

    let kinds: Vec<TargetKind> = result.components.iter().map(|c| c.target_kind).collect();
    assert!(kinds.contains(&TargetKind::Process));
    assert!(kinds.contains(&TargetKind::Connector));
    assert!(kinds.contains(&TargetKind::DataProcess));
    assert!(kinds.contains(&TargetKind::ProfileXml));
}

#[test]
fn generated_components_pass_validation() {
    let dir = create_mixed_package();
    let package = parse_package(dir.path()).unwrap();
    let result = convert_package(&package, &ConversionConfig::default());

    for (name, findings) in &result.findings {
        assert!(
            !validate::blocks_publish(findings),
            "{name} produced blocking findings: {findings:?}"
        );
    }
}

#[test]
fn transpiled_script_lands_in_data_process_component() {
    let dir = create_mixed_package();
    let package = parse_package(dir.path()).unwrap();
    let result = convert_package(&package, &ConversionConfig::default());

    let script = result
        .components
        .iter()
        .find(|c| c.target_kind == TargetKind::DataProcess)
        .unwrap();
    // Platform pipeline calls are rewritten into properties access.
    assert!(script.xml.contains("props.getProperty"));
    assert!(!script.xml.contains("IDataUtil"));
    assert!(script.xml.contains("language=\"groovy\""));
}

#[test]
fn adapter_sql_drives_connector_operation() {
    let dir = create_mixed_package();
    let package = parse_package(dir.path()).unwrap();
    let result = convert_package(&package, &ConversionConfig::default());

    let connector = result
        .components
        .iter()
        .find(|c| c.target_kind == TargetKind::Connector)
        .unwrap();
    assert!(connector.xml.contains("type=\"GET\""));
    assert!(connector.xml.contains("object=\"orders\""));
    assert!(connector.xml.contains("${db.user}"));
}

// =============================================================================
// DEGRADATION
// =============================================================================

#[test]
fn undecodable_unit_degrades_but_batch_completes() {
    let dir = create_mixed_package();
    let bad_dir = dir.path().join("ns/acme/broken_flow");
    fs::create_dir_all(&bad_dir).unwrap();
    fs::write(bad_dir.join("node.ndf"), [0u8, 1, 2, 3]).unwrap();

    let package = parse_package(dir.path()).unwrap();
    assert_eq!(package.parse_failures.len(), 1);
    let degraded = package
        .services
        .iter()
        .find(|s| s.name == "broken_flow")
        .unwrap();
    assert_eq!(degraded.kind, ServiceKind::Unknown);

    let result = convert_package(&package, &ConversionConfig::default());
    assert_eq!(result.components.len(), 5);
    assert_eq!(result.report.status.failed, 1);
    assert_eq!(result.report.parse_failures.len(), 1);

    // Everything else still converted.
    let healthy = result
        .components
        .iter()
        .filter(|c| c.status != ComponentStatus::Failed)
        .count();
    assert_eq!(healthy, 4);
}

// =============================================================================
// REPORTING
// =============================================================================

#[test]
fn report_orders_migration_easiest_first() {
    let dir = create_mixed_package();
    let package = parse_package(dir.path()).unwrap();
    let result = convert_package(&package, &ConversionConfig::default());

    let order = &result.report.migration_order;
    assert_eq!(order.len(), result.components.len());
    for pair in order.windows(2) {
        assert!(pair[0].automation_level >= pair[1].automation_level);
    }
}

#[test]
fn report_serializes_round_trip() {
    let dir = create_mixed_package();
    let package = parse_package(dir.path()).unwrap();
    let result = convert_package(&package, &ConversionConfig::default());

    let json = result.report.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["package_name"], "AcmeOrders");
    assert_eq!(value["component_count"], 4);
    assert!(value["overall_automation"].as_u64().unwrap() > 0);
}
