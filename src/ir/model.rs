// src/ir/model.rs

//! Normalized intermediate representation of a parsed source package.
//!
//! Everything downstream of the IR Builder (pattern engine, analyzers,
//! generators, orchestrator) consumes these types and nothing else from the
//! source package. A `Package` is built once per conversion run and never
//! mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use strum_macros::{Display, EnumIter, EnumString};

/// Namespace prefixes that identify calls into the source platform's
/// standard service library. Anything else is a custom call and gates
/// automation scoring downstream.
pub const BUILTIN_PREFIXES: [&str; 4] = ["pub.", "wm.", "pub:", "wm:"];

/// Classification of a source service, closed so exhaustive handling is a
/// compile-time property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum ServiceKind {
    Flow,
    Script,
    Adapter,
    Map,
    Unknown,
}

/// The nine recognized control-flow primitives of the source flow language.
///
/// Unrecognized tags are dropped during parsing, never folded into one of
/// these buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
pub enum FlowVerb {
    Map,
    Branch,
    Loop,
    Repeat,
    Sequence,
    Try,
    Catch,
    Finally,
    Exit,
}

impl FlowVerb {
    /// Verbs that indicate structural complexity for automation scoring
    pub fn is_complex(self) -> bool {
        matches!(
            self,
            FlowVerb::Branch | FlowVerb::Loop | FlowVerb::Repeat | FlowVerb::Try
        )
    }
}

/// One node of a parsed flow body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowStep {
    pub verb: FlowVerb,
    pub label: String,
    pub children: Vec<FlowStep>,
    pub branches: Vec<BranchCase>,
    /// MAP steps: explicit field transforms declared on the step
    pub transforms: Vec<MapTransform>,
    /// LOOP steps: input array and output variable attributes
    pub loop_spec: Option<LoopSpec>,
}

impl FlowStep {
    pub fn new(verb: FlowVerb, label: impl Into<String>) -> Self {
        FlowStep {
            verb,
            label: label.into(),
            children: Vec::new(),
            branches: Vec::new(),
            transforms: Vec::new(),
            loop_spec: None,
        }
    }

    /// Synthesized step from the bare-tag fallback scan; carries no label
    /// and no body.
    pub fn synthesized(verb: FlowVerb) -> Self {
        FlowStep::new(verb, "")
    }
}

/// One arm of a BRANCH step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchCase {
    pub condition: String,
    pub is_default: bool,
    pub steps: Vec<FlowStep>,
}

/// Field movement declared on a MAP step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapTransform {
    Set { target: String, value: String },
    Copy { from: String, to: String },
    Drop { field: String },
}

/// LOOP step iteration attributes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoopSpec {
    pub input_array: String,
    pub output_var: Option<String>,
    pub count: Option<u32>,
}

/// A deduplicated service call found inside a flow body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub namespace: String,
    pub service_name: String,
    pub call_count: u32,
}

impl Invocation {
    /// Whether this call targets the source platform's standard library
    pub fn is_builtin(&self) -> bool {
        BUILTIN_PREFIXES
            .iter()
            .any(|p| self.namespace.starts_with(p) || self.qualified_name().starts_with(p))
    }

    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.service_name.clone()
        } else {
            format!("{}:{}", self.namespace, self.service_name)
        }
    }
}

/// Parsed flow body of a flow service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowTree {
    pub steps: Vec<FlowStep>,
    /// True when the structural parse found nothing and steps were
    /// synthesized from a bare tag count
    pub from_fallback: bool,
}

/// Connection settings recovered from an adapter service descriptor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Adapter technology, e.g. "jdbc", "http", "ftp"
    pub kind: String,
    /// Embedded SQL statement for database adapters
    pub sql: Option<String>,
    /// Remaining descriptor properties, kept ordered for stable output
    pub properties: BTreeMap<String, String>,
}

/// One source service in normalized form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub path: String,
    pub kind: ServiceKind,
    pub flow: Option<FlowTree>,
    pub embedded_source: Option<String>,
    pub adapter_config: Option<AdapterConfig>,
    pub invocations: Vec<Invocation>,
    /// Set when per-unit parsing failed and this record is best-effort only
    pub degraded: Option<String>,
}

impl Service {
    /// Minimal degraded record for a unit whose body could not be parsed
    pub fn degraded(name: impl Into<String>, path: impl Into<String>, reason: String) -> Self {
        Service {
            name: name.into(),
            path: path.into(),
            kind: ServiceKind::Unknown,
            flow: None,
            embedded_source: None,
            adapter_config: None,
            invocations: Vec::new(),
            degraded: Some(reason),
        }
    }

    /// Adapter technologies referenced by this service (its own adapter
    /// config plus adapter-looking invocation namespaces)
    pub fn adapter_kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = Vec::new();
        if let Some(cfg) = &self.adapter_config {
            kinds.push(cfg.kind.clone());
        }
        for inv in &self.invocations {
            let qualified = inv.qualified_name().to_lowercase();
            for known in ADAPTER_KINDS {
                if qualified.contains(known) && !kinds.iter().any(|k| k == known) {
                    kinds.push((*known).to_string());
                }
            }
        }
        kinds
    }
}

/// Substrings that identify adapter technologies in paths and namespaces
pub const ADAPTER_KINDS: [&str; 10] = [
    "jdbc", "sap", "http", "jms", "ftp", "sftp", "file", "email", "soap", "rest",
];

/// One field of a document schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Source type name, lowercased ("string", "record", ...); generators
    /// map this into the closed target vocabulary
    pub field_type: String,
    pub is_array: bool,
    pub required: bool,
    pub children: Vec<Field>,
}

/// A document type definition in normalized form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub path: String,
    pub fields: Vec<Field>,
    pub degraded: Option<String>,
}

/// EDI standard of a schema stub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum EdiStandard {
    #[strum(serialize = "X12")]
    X12,
    #[strum(serialize = "EDIFACT")]
    Edifact,
}

/// An EDI transaction-set schema referenced by the package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdiSchema {
    pub name: String,
    pub path: String,
    pub standard: EdiStandard,
    /// Transaction set identifier, e.g. "850" or "ORDERS"
    pub transaction_set: String,
}

/// Package manifest: identity plus declared dependencies and lifecycle
/// services, no nesting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    pub dependencies: Vec<String>,
    pub startup_services: Vec<String>,
    pub shutdown_services: Vec<String>,
}

/// A unit that failed to parse, recorded for the package report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseFailure {
    pub path: String,
    pub reason: String,
}

/// Root IR container for one parsed package
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Package {
    pub manifest: Manifest,
    pub root: PathBuf,
    pub services: Vec<Service>,
    pub documents: Vec<Document>,
    pub edi_schemas: Vec<EdiSchema>,
    pub parse_failures: Vec<ParseFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn flow_verbs_parse_case_insensitively_via_uppercase() {
        assert_eq!(FlowVerb::from_str("BRANCH").unwrap(), FlowVerb::Branch);
        assert_eq!(FlowVerb::Branch.to_string(), "BRANCH");
    }

    #[test]
    fn builtin_prefix_detection() {
        let builtin = Invocation {
            namespace: "pub.string".to_string(),
            service_name: "concat".to_string(),
            call_count: 2,
        };
        let custom = Invocation {
            namespace: "acme.orders".to_string(),
            service_name: "enrich".to_string(),
            call_count: 1,
        };
        assert!(builtin.is_builtin());
        assert!(!custom.is_builtin());
    }

    #[test]
    fn adapter_kinds_from_invocations() {
        let svc = Service {
            name: "fetchOrders".to_string(),
            path: "acme/fetchOrders".to_string(),
            kind: ServiceKind::Flow,
            flow: None,
            embedded_source: None,
            adapter_config: Some(AdapterConfig {
                kind: "jdbc".to_string(),
                sql: None,
                properties: BTreeMap::new(),
            }),
            invocations: vec![Invocation {
                namespace: "pub.client.http".to_string(),
                service_name: "get".to_string(),
                call_count: 1,
            }],
            degraded: None,
        };
        let kinds = svc.adapter_kinds();
        assert!(kinds.contains(&"jdbc".to_string()));
        assert!(kinds.contains(&"http".to_string()));
    }
}
