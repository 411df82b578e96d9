// src/generate/process.rs

//! Process component generation.
//!
//! Turns a flow service plus its pattern analysis into a process component:
//! an ordered shape list laid out on a grid, with one directed connection
//! between consecutive shapes. Branch patterns fan out from a decision
//! shape, one labeled edge per arm, each arm terminating in its own stop
//! shape. The first shape is always a start and the last a stop.

use crate::analyze::pattern::{FlowAnalysis, PatternTag};
use crate::error::Result;
use crate::generate::{
    close_component, open_component, ComponentStatus, GeneratedComponent, KeyCounter, TargetKind,
    XmlOut,
};
use crate::ir::model::{FlowVerb, Service};
use strum_macros::Display;

/// Grid layout constants: shapes step right and wrap to a new row.
const GRID_START_X: i32 = 100;
const GRID_START_Y: i32 = 100;
const GRID_STEP_X: i32 = 150;
const GRID_WRAP_X: i32 = 800;
const GRID_STEP_Y: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ShapeKind {
    Start,
    Stop,
    Connectoraction,
    Map,
    Decision,
    Dataprocess,
    Notify,
}

#[derive(Debug, Clone)]
pub struct Shape {
    pub id: String,
    pub kind: ShapeKind,
    pub label: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
}

/// Shape-and-connection accumulator threaded through layout building
#[derive(Debug, Default)]
pub struct ShapeGraph {
    pub shapes: Vec<Shape>,
    pub connections: Vec<Connection>,
    next_id: u32,
    x: i32,
    y: i32,
}

impl ShapeGraph {
    fn new() -> Self {
        ShapeGraph {
            x: GRID_START_X,
            y: GRID_START_Y,
            ..Default::default()
        }
    }

    fn add(&mut self, kind: ShapeKind, label: impl Into<String>) -> String {
        self.next_id += 1;
        let id = format!("shape_{}", self.next_id);
        self.shapes.push(Shape {
            id: id.clone(),
            kind,
            label: label.into(),
            x: self.x,
            y: self.y,
        });
        self.x += GRID_STEP_X;
        if self.x > GRID_WRAP_X {
            self.x = GRID_START_X;
            self.y += GRID_STEP_Y;
        }
        id
    }

    fn connect(&mut self, from: &str, to: &str, label: Option<&str>) {
        self.connections.push(Connection {
            from: from.to_string(),
            to: to.to_string(),
            label: label.map(str::to_string),
        });
    }
}

/// Build the shape graph for a service according to its primary pattern.
pub fn build_graph(service: &Service, analysis: &FlowAnalysis) -> ShapeGraph {
    let mut graph = ShapeGraph::new();
    let pattern = analysis.primary.unwrap_or(PatternTag::Unknown);
    match pattern {
        PatternTag::ContentRouter => build_router(&mut graph, service),
        PatternTag::BatchProcessor | PatternTag::SplitterAggregator => {
            build_batch(&mut graph, service)
        }
        PatternTag::TryCatchWrapper => build_try_catch(&mut graph, service),
        PatternTag::SimpleTransform | PatternTag::Validation => {
            build_transform(&mut graph, service)
        }
        _ => build_linear(&mut graph, service),
    }
    graph
}

/// start -> source connector -> map -> target connector -> stop
fn build_linear(graph: &mut ShapeGraph, service: &Service) {
    let kinds = service.adapter_kinds();
    let source = kinds.first().map(String::as_str).unwrap_or("source");
    let target = kinds.get(1).map(String::as_str).unwrap_or("target");

    let start = graph.add(ShapeKind::Start, "Start");
    let fetch = graph.add(ShapeKind::Connectoraction, format!("{source} read"));
    let map = graph.add(ShapeKind::Map, format!("{} map", service.name));
    let send = graph.add(ShapeKind::Connectoraction, format!("{target} write"));
    let stop = graph.add(ShapeKind::Stop, "Stop");

    graph.connect(&start, &fetch, None);
    graph.connect(&fetch, &map, None);
    graph.connect(&map, &send, None);
    graph.connect(&send, &stop, None);
}

/// start -> map -> stop
fn build_transform(graph: &mut ShapeGraph, service: &Service) {
    let start = graph.add(ShapeKind::Start, "Start");
    let map = graph.add(ShapeKind::Map, format!("{} map", service.name));
    let stop = graph.add(ShapeKind::Stop, "Stop");
    graph.connect(&start, &map, None);
    graph.connect(&map, &stop, None);
}

/// Decision fan-out: one labeled edge per branch arm, each arm with its own
/// stop shape.
fn build_router(graph: &mut ShapeGraph, service: &Service) {
    let start = graph.add(ShapeKind::Start, "Start");
    let branch_step = service
        .flow
        .as_ref()
        .and_then(|tree| find_branch(&tree.steps));
    let decision_label = branch_step
        .map(|s| {
            if s.label.is_empty() {
                "Route".to_string()
            } else {
                s.label.clone()
            }
        })
        .unwrap_or_else(|| "Route".to_string());
    let decision = graph.add(ShapeKind::Decision, decision_label);
    graph.connect(&start, &decision, None);

    let mut has_default = false;
    if let Some(step) = branch_step {
        for case in &step.branches {
            let label = if case.is_default {
                has_default = true;
                "default".to_string()
            } else if case.condition.is_empty() {
                "case".to_string()
            } else {
                case.condition.clone()
            };
            let map = graph.add(ShapeKind::Map, format!("{label} path"));
            let stop = graph.add(ShapeKind::Stop, format!("{label} end"));
            graph.connect(&decision, &map, Some(&label));
            graph.connect(&map, &stop, None);
        }
    }
    if !has_default {
        let stop = graph.add(ShapeKind::Stop, "default end");
        graph.connect(&decision, &stop, Some("default"));
    }
}

/// start -> source connector -> data process (loop body) -> map -> target
/// connector -> stop
fn build_batch(graph: &mut ShapeGraph, service: &Service) {
    let kinds = service.adapter_kinds();
    let source = kinds.first().map(String::as_str).unwrap_or("source");
    let target = kinds.get(1).map(String::as_str).unwrap_or("target");

    let start = graph.add(ShapeKind::Start, "Start");
    let fetch = graph.add(ShapeKind::Connectoraction, format!("{source} read"));
    let split = graph.add(ShapeKind::Dataprocess, "Split documents");
    let map = graph.add(ShapeKind::Map, format!("{} map", service.name));
    let send = graph.add(ShapeKind::Connectoraction, format!("{target} write"));
    let stop = graph.add(ShapeKind::Stop, "Stop");

    graph.connect(&start, &fetch, None);
    graph.connect(&fetch, &split, None);
    graph.connect(&split, &map, None);
    graph.connect(&map, &send, None);
    graph.connect(&send, &stop, None);
}

/// Linear chain with an error path from the map to a notify + error stop
fn build_try_catch(graph: &mut ShapeGraph, service: &Service) {
    let kinds = service.adapter_kinds();
    let source = kinds.first().map(String::as_str).unwrap_or("source");

    let start = graph.add(ShapeKind::Start, "Start");
    let action = graph.add(ShapeKind::Connectoraction, format!("{source} call"));
    let map = graph.add(ShapeKind::Map, format!("{} map", service.name));
    let notify = graph.add(ShapeKind::Notify, "Error notification");
    let error_stop = graph.add(ShapeKind::Stop, "Error end");
    let stop = graph.add(ShapeKind::Stop, "Stop");

    graph.connect(&start, &action, None);
    graph.connect(&action, &map, Some("try"));
    graph.connect(&action, &notify, Some("catch"));
    graph.connect(&notify, &error_stop, None);
    graph.connect(&map, &stop, None);
}

fn find_branch(steps: &[crate::ir::model::FlowStep]) -> Option<&crate::ir::model::FlowStep> {
    for step in steps {
        if step.verb == FlowVerb::Branch {
            return Some(step);
        }
        if let Some(found) = find_branch(&step.children) {
            return Some(found);
        }
        for case in &step.branches {
            if let Some(found) = find_branch(&case.steps) {
                return Some(found);
            }
        }
    }
    None
}

/// Generate a process component for a flow service.
pub fn generate_process(service: &Service, analysis: &FlowAnalysis) -> Result<GeneratedComponent> {
    let graph = build_graph(service, analysis);
    let mut keys = KeyCounter::new();
    let mut out = XmlOut::new();

    open_component(&mut out, TargetKind::Process, &service.name, &folder_of(service))?;
    let description = match analysis.primary {
        Some(pattern) => format!(
            "Converted flow service {} ({} pattern, {}% automated)",
            service.path, pattern, analysis.automation_level
        ),
        None => format!(
            "Converted flow service {} ({}% automated)",
            service.path, analysis.automation_level
        ),
    };
    out.text_el("bns:description", &[], &description)?;

    let key = keys.next_key();
    out.open("bns:object", &[("key", key.as_str())])?;
    let key = keys.next_key();
    out.open(
        "process",
        &[("key", key.as_str()), ("allowSimultaneous", "false")],
    )?;

    write_shapes(&mut out, &mut keys, &graph)?;

    out.close("process")?;
    out.close("bns:object")?;
    close_component(&mut out)?;

    let manual_review_items = analysis.notes.clone();
    let status = if manual_review_items.is_empty() {
        ComponentStatus::Converted
    } else {
        ComponentStatus::ConvertedWithWarnings
    };

    Ok(GeneratedComponent {
        target_kind: TargetKind::Process,
        name: service.name.clone(),
        source_path: service.path.clone(),
        xml: out.finish(),
        automation_level: analysis.automation_level,
        warnings: Vec::new(),
        manual_review_items,
        status,
    })
}

/// Emit the shape and connection lists of a built graph.
fn write_shapes(out: &mut XmlOut, keys: &mut KeyCounter, graph: &ShapeGraph) -> Result<()> {
    let key = keys.next_key();
    out.open("shapes", &[("key", key.as_str())])?;
    for shape in &graph.shapes {
        let key = keys.next_key();
        let kind = shape.kind.to_string();
        let x = shape.x.to_string();
        let y = shape.y.to_string();
        out.leaf(
            "shape",
            &[
                ("key", key.as_str()),
                ("name", shape.id.as_str()),
                ("shapetype", kind.as_str()),
                ("userlabel", shape.label.as_str()),
                ("x", x.as_str()),
                ("y", y.as_str()),
            ],
        )?;
    }
    out.close("shapes")?;

    let key = keys.next_key();
    out.open("connections", &[("key", key.as_str())])?;
    for conn in &graph.connections {
        let key = keys.next_key();
        let mut attrs: Vec<(&str, &str)> = vec![
            ("key", key.as_str()),
            ("fromShape", conn.from.as_str()),
            ("toShape", conn.to.as_str()),
        ];
        if let Some(label) = &conn.label {
            attrs.push(("label", label.as_str()));
        }
        out.leaf("connection", &attrs)?;
    }
    out.close("connections")
}

/// Generate a data-process component for a script service: a three-shape
/// process whose dataprocess shape carries the transpiled Groovy body.
pub fn generate_script_process(
    service: &Service,
    output: &crate::transpile::TranspileOutput,
) -> Result<GeneratedComponent> {
    let mut graph = ShapeGraph::new();
    let start = graph.add(ShapeKind::Start, "Start");
    let script = graph.add(ShapeKind::Dataprocess, format!("{} script", service.name));
    let stop = graph.add(ShapeKind::Stop, "Stop");
    graph.connect(&start, &script, None);
    graph.connect(&script, &stop, None);

    let mut keys = KeyCounter::new();
    let mut out = XmlOut::new();
    open_component(&mut out, TargetKind::DataProcess, &service.name, &folder_of(service))?;
    out.text_el(
        "bns:description",
        &[],
        &format!(
            "Converted script service {} ({}% confidence)",
            service.path, output.confidence
        ),
    )?;

    let key = keys.next_key();
    out.open("bns:object", &[("key", key.as_str())])?;
    let key = keys.next_key();
    out.open(
        "process",
        &[("key", key.as_str()), ("allowSimultaneous", "false")],
    )?;
    write_shapes(&mut out, &mut keys, &graph)?;

    let key = keys.next_key();
    out.cdata_el(
        "ProcessScript",
        &[("key", key.as_str()), ("language", "groovy")],
        &output.script,
    )?;
    for import in &output.removed_imports {
        out.comment(&format!(" dropped platform import: {import} "))?;
    }

    out.close("process")?;
    out.close("bns:object")?;
    close_component(&mut out)?;

    let status = if output.warnings.is_empty() {
        ComponentStatus::Converted
    } else {
        ComponentStatus::ConvertedWithWarnings
    };

    Ok(GeneratedComponent {
        target_kind: TargetKind::DataProcess,
        name: service.name.clone(),
        source_path: service.path.clone(),
        xml: out.finish(),
        automation_level: output.confidence,
        warnings: output.warnings.clone(),
        manual_review_items: output.manual_review_items.clone(),
        status,
    })
}

pub(crate) fn folder_of(service: &Service) -> String {
    match service.path.rsplit_once('/') {
        Some((folder, _)) => format!("/{folder}"),
        None => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::pattern::analyze;
    use crate::ir::flow::parse_flow;
    use crate::ir::model::ServiceKind;

    fn make_test_service(flow_xml: &str) -> Service {
        let (tree, invocations) = parse_flow(flow_xml).unwrap();
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

    const ROUTER_FLOW: &str = r#"<FLOW><BRANCH SWITCH="/type">
<SEQUENCE NAME="web"><MAP/></SEQUENCE>
<SEQUENCE NAME="edi"><MAP/></SEQUENCE>
<SEQUENCE NAME="$default"><EXIT/></SEQUENCE>
</BRANCH><BRANCH SWITCH="/x"><SEQUENCE NAME="y"/></BRANCH></FLOW>"#;

    #[test]
    fn start_first_stop_last_no_orphans() {
        let service = make_test_service("<FLOW><SEQUENCE><MAP/></SEQUENCE></FLOW>");
        let analysis = analyze(&service);
        let graph = build_graph(&service, &analysis);

        assert_eq!(graph.shapes.first().unwrap().kind, ShapeKind::Start);
        assert_eq!(graph.shapes.last().unwrap().kind, ShapeKind::Stop);

        // Every shape id appears in at least one connection.
        for shape in &graph.shapes {
            assert!(
                graph
                    .connections
                    .iter()
                    .any(|c| c.from == shape.id || c.to == shape.id),
                "orphaned shape {}",
                shape.id
            );
        }
    }

    #[test]
    fn router_fans_out_labeled_edges_with_per_arm_stops() {
        let service = make_test_service(ROUTER_FLOW);
        let analysis = analyze(&service);
        assert_eq!(analysis.primary, Some(PatternTag::ContentRouter));

        let graph = build_graph(&service, &analysis);
        let decision = graph
            .shapes
            .iter()
            .find(|s| s.kind == ShapeKind::Decision)
            .unwrap();
        let out_edges: Vec<_> = graph
            .connections
            .iter()
            .filter(|c| c.from == decision.id)
            .collect();
        assert_eq!(out_edges.len(), 3);
        assert!(out_edges.iter().all(|c| c.label.is_some()));
        assert!(out_edges.iter().any(|c| c.label.as_deref() == Some("default")));

        let stops = graph
            .shapes
            .iter()
            .filter(|s| s.kind == ShapeKind::Stop)
            .count();
        assert_eq!(stops, 3);
    }

    #[test]
    fn keys_are_unique_and_strictly_increasing() {
        let service = make_test_service(ROUTER_FLOW);
        let analysis = analyze(&service);
        let component = generate_process(&service, &analysis).unwrap();

        let keys = crate::generate::extract_keys(&component.xml);
        assert!(!keys.is_empty());
        for pair in keys.windows(2) {
            assert!(pair[1] > pair[0], "keys not strictly increasing: {keys:?}");
        }
    }

    #[test]
    fn regeneration_is_deterministic() {
        let service = make_test_service(ROUTER_FLOW);
        let analysis = analyze(&service);
        let a = generate_process(&service, &analysis).unwrap();
        let b = generate_process(&service, &analysis).unwrap();
        assert_eq!(a.xml, b.xml);
    }

    #[test]
    fn component_declares_namespace_and_type() {
        let service = make_test_service("<FLOW><MAP/></FLOW>");
        let analysis = analyze(&service);
        let component = generate_process(&service, &analysis).unwrap();
        assert!(component.xml.contains("xmlns:bns=\"http://api.platform.boomi.com/\""));
        assert!(component.xml.contains("type=\"process\""));
        assert!(component.xml.contains("folderFullPath=\"/acme/orders\""));
    }

}
