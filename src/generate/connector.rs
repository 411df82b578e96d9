// src/generate/connector.rs

//! Connector component generation for adapter services.
//!
//! Database adapters go through the SQL analyzer and carry the statement
//! plus the derived operation settings; other adapter technologies get a
//! typed connection skeleton with `${...}` placeholders for environment
//! credentials. Review notes land in the component as XML comments, the
//! way migrated configurations are usually annotated for hand-off.

use crate::analyze::sql::{self, SqlAnalysis};
use crate::error::Result;
use crate::generate::process::folder_of;
use crate::generate::{
    close_component, open_component, ComponentStatus, GeneratedComponent, KeyCounter, TargetKind,
    XmlOut,
};
use crate::ir::model::Service;

/// Automation for non-database connectors with recovered settings
const TYPED_CONNECTOR_AUTOMATION: u8 = 75;

/// Automation when the adapter technology could not be identified
const UNKNOWN_CONNECTOR_AUTOMATION: u8 = 35;

/// Generate a connector component for an adapter service. Database
/// adapters with an embedded statement also run the SQL analyzer; its
/// output drives the operation configuration and the automation level.
pub fn generate_connector(service: &Service) -> Result<GeneratedComponent> {
    let config = service.adapter_config.clone().unwrap_or_default();

    if config.kind == "jdbc" {
        let analysis = config.sql.as_deref().map(sql::analyze);
        return generate_database_connector(service, analysis.as_ref());
    }

    let mut keys = KeyCounter::new();
    let mut out = XmlOut::new();
    open_component(&mut out, TargetKind::Connector, &service.name, &folder_of(service))?;
    out.text_el(
        "bns:description",
        &[],
        &format!("Converted {} adapter service {}", config.kind, service.path),
    )?;

    let key = keys.next_key();
    out.open("bns:object", &[("key", key.as_str())])?;
    match config.kind.as_str() {
        "http" | "soap" | "rest" => {
            let key = keys.next_key();
            out.leaf(
                "HttpConnection",
                &[
                    ("key", key.as_str()),
                    ("url", "${http.url}"),
                    ("authType", "BASIC"),
                    ("user", "${http.user}"),
                    ("password", "${http.password}"),
                ],
            )?;
        }
        "ftp" | "sftp" | "file" => {
            let key = keys.next_key();
            out.leaf(
                "FtpConnection",
                &[
                    ("key", key.as_str()),
                    ("host", "${ftp.host}"),
                    ("user", "${ftp.user}"),
                    ("password", "${ftp.password}"),
                    ("remoteDirectory", "${ftp.directory}"),
                ],
            )?;
        }
        "jms" => {
            let key = keys.next_key();
            out.leaf(
                "JmsConnection",
                &[
                    ("key", key.as_str()),
                    ("connectionFactory", "${jms.factory}"),
                    ("destination", "${jms.destination}"),
                ],
            )?;
        }
        _ => {
            let key = keys.next_key();
            out.leaf(
                "GenericConnection",
                &[("key", key.as_str()), ("technology", config.kind.as_str())],
            )?;
        }
    }

    // Carry over recovered descriptor properties for the hand-off.
    for (name, value) in &config.properties {
        let key = keys.next_key();
        out.leaf(
            "property",
            &[
                ("key", key.as_str()),
                ("name", name.as_str()),
                ("value", value.as_str()),
            ],
        )?;
    }
    out.close("bns:object")?;
    close_component(&mut out)?;

    let known = crate::ir::model::ADAPTER_KINDS.contains(&config.kind.as_str());
    let automation_level = if known {
        TYPED_CONNECTOR_AUTOMATION
    } else {
        UNKNOWN_CONNECTOR_AUTOMATION
    };
    let mut warnings = Vec::new();
    if !known {
        warnings.push(format!(
            "Unrecognized adapter technology '{}'",
            config.kind
        ));
    }

    Ok(GeneratedComponent {
        target_kind: TargetKind::Connector,
        name: service.name.clone(),
        source_path: service.path.clone(),
        xml: out.finish(),
        automation_level,
        warnings,
        manual_review_items: vec![
            "Fill in environment connection credentials".to_string(),
        ],
        status: ComponentStatus::ConvertedWithWarnings,
    })
}

/// Database connector: connection skeleton plus the analyzed operation.
pub fn generate_database_connector(
    service: &Service,
    analysis: Option<&SqlAnalysis>,
) -> Result<GeneratedComponent> {
    let mut keys = KeyCounter::new();
    let mut out = XmlOut::new();
    open_component(&mut out, TargetKind::Connector, &service.name, &folder_of(service))?;
    out.text_el(
        "bns:description",
        &[],
        &format!("Converted database adapter service {}", service.path),
    )?;

    let key = keys.next_key();
    out.open("bns:object", &[("key", key.as_str())])?;
    let key = keys.next_key();
    out.leaf(
        "DatabaseConnection",
        &[
            ("key", key.as_str()),
            ("driver", "${db.driver}"),
            ("url", "${db.url}"),
            ("user", "${db.user}"),
            ("password", "${db.password}"),
        ],
    )?;

    match analysis {
        Some(analysis) => {
            let key = keys.next_key();
            let params = analysis.target_config.parameter_count.to_string();
            out.open(
                "Operation",
                &[
                    ("key", key.as_str()),
                    ("type", analysis.target_config.operation.as_str()),
                    ("object", analysis.target_config.object.as_str()),
                    ("parameterCount", params.as_str()),
                ],
            )?;
            if let Some(sql) = sql_of(service) {
                let key = keys.next_key();
                out.cdata_el("sql", &[("key", key.as_str())], &sql)?;
            }
            out.close("Operation")?;
            for warning in &analysis.warnings {
                out.comment(&format!(" review: {warning} "))?;
            }
        }
        None => {
            out.comment(" no SQL statement recovered from the adapter descriptor ")?;
        }
    }
    out.close("bns:object")?;
    close_component(&mut out)?;

    let (automation_level, mut warnings) = match analysis {
        Some(a) => (a.automation_level, a.warnings.clone()),
        None => (
            UNKNOWN_CONNECTOR_AUTOMATION,
            vec!["No SQL statement found in adapter descriptor".to_string()],
        ),
    };
    if service.degraded.is_some() {
        warnings.push("Source adapter descriptor was degraded".to_string());
    }

    Ok(GeneratedComponent {
        target_kind: TargetKind::Connector,
        name: service.name.clone(),
        source_path: service.path.clone(),
        xml: out.finish(),
        automation_level,
        warnings,
        manual_review_items: vec![
            "Fill in environment database credentials".to_string(),
        ],
        status: ComponentStatus::ConvertedWithWarnings,
    })
}

fn sql_of(service: &Service) -> Option<String> {
    service.adapter_config.as_ref()?.sql.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::model::{AdapterConfig, ServiceKind};
    use std::collections::BTreeMap;

    fn make_test_adapter(kind: &str, sql: Option<&str>) -> Service {
        Service {
            name: "getOrders".to_string(),
            path: format!("acme/{kind}/getOrders"),
            kind: ServiceKind::Adapter,
            flow: None,
            embedded_source: None,
            adapter_config: Some(AdapterConfig {
                kind: kind.to_string(),
                sql: sql.map(str::to_string),
                properties: BTreeMap::new(),
            }),
            invocations: Vec::new(),
            degraded: None,
        }
    }

    #[test]
    fn database_connector_embeds_analyzed_sql() {
        let service = make_test_adapter("jdbc", Some("SELECT id, status FROM orders WHERE id = ?"));
        let component = generate_connector(&service).unwrap();
        assert!(component.xml.contains("DatabaseConnection"));
        assert!(component.xml.contains("type=\"GET\""));
        assert!(component.xml.contains("object=\"orders\""));
        assert!(component.xml.contains("SELECT id, status FROM orders"));
        assert!(component.automation_level >= 85);
    }

    #[test]
    fn database_connector_without_sql_is_low_automation() {
        let service = make_test_adapter("jdbc", None);
        let component = generate_connector(&service).unwrap();
        assert_eq!(component.automation_level, 35);
        assert!(!component.warnings.is_empty());
    }

    #[test]
    fn http_adapter_gets_placeholder_connection() {
        let service = make_test_adapter("http", None);
        let component = generate_connector(&service).unwrap();
        assert!(component.xml.contains("HttpConnection"));
        assert!(component.xml.contains("${http.url}"));
        assert_eq!(component.automation_level, 75);
    }

    #[test]
    fn unknown_technology_warns() {
        let service = make_test_adapter("mainframe", None);
        let component = generate_connector(&service).unwrap();
        assert!(component.xml.contains("GenericConnection"));
        assert_eq!(component.automation_level, 35);
        assert!(component.warnings[0].contains("mainframe"));
    }
}
