// src/ir/flow.rs

//! Flow body parsing.
//!
//! Turns an exported flow XML body into a [`FlowTree`] of the nine
//! recognized verbs. Tag matching is case-insensitive and namespace
//! prefixes are stripped. Unrecognized elements are transparent containers:
//! their children are still scanned, but no step is recorded for them, so
//! per-verb counts always equal the number of recognized verb tags in the
//! source.
//!
//! When the structural pass yields zero steps the parser falls back to a
//! bare-tag occurrence scan and synthesizes unlabeled steps. This mirrors
//! the legacy exporter's behavior on malformed bodies and is isolated in
//! [`fallback_scan`] so well-formed inputs never reach it.

use crate::ir::model::{
    BranchCase, FlowStep, FlowTree, FlowVerb, Invocation, LoopSpec, MapTransform,
};
use crate::ir::xml::{self, XmlNode};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use strum::IntoEnumIterator;
use tracing::debug;

/// Elements that hold MAP transform declarations, not nested steps
const MAP_DETAIL_TAGS: [&str; 5] = ["MAPSET", "MAPCOPY", "MAPDELETE", "MAPDROP", "MAPSOURCE"];

static BARE_TAG_PATTERNS: LazyLock<Vec<(FlowVerb, Regex)>> = LazyLock::new(|| {
    FlowVerb::iter()
        .map(|verb| {
            let pattern = format!(r"(?i)<\s*{}[\s>/]", verb);
            (verb, Regex::new(&pattern).unwrap())
        })
        .collect()
});

/// Parse a flow body into a step tree plus its extracted invocations.
///
/// Parsing is best-effort: an unloadable body produces an empty tree, and
/// the caller records the unit as degraded.
pub fn parse_flow(body: &str) -> Result<(FlowTree, Vec<Invocation>), String> {
    let root = xml::load(body)?;
    let steps = collect_steps(&root);
    let invocations = extract_invocations(&root);

    if steps.is_empty() {
        let synthesized = fallback_scan(body);
        if !synthesized.is_empty() {
            debug!(
                steps = synthesized.len(),
                "structural parse found no steps, using bare-tag fallback"
            );
            return Ok((
                FlowTree {
                    steps: synthesized,
                    from_fallback: true,
                },
                invocations,
            ));
        }
    }

    Ok((
        FlowTree {
            steps,
            from_fallback: false,
        },
        invocations,
    ))
}

/// Scan an element's children for verb steps, descending transparently
/// through unrecognized container elements.
fn collect_steps(node: &XmlNode) -> Vec<FlowStep> {
    let mut steps = Vec::new();
    for child in &node.children {
        let local = child.local_name();
        if let Some(verb) = verb_for_tag(&local) {
            steps.push(build_step(verb, child));
        } else if local == "INVOKE" || MAP_DETAIL_TAGS.contains(&local.as_str()) {
            // Handled elsewhere; never contains steps.
        } else {
            steps.extend(collect_steps(child));
        }
    }
    steps
}

fn verb_for_tag(local: &str) -> Option<FlowVerb> {
    match local {
        "MAP" => Some(FlowVerb::Map),
        "BRANCH" => Some(FlowVerb::Branch),
        "LOOP" => Some(FlowVerb::Loop),
        "REPEAT" | "RETRY" => Some(FlowVerb::Repeat),
        "SEQUENCE" | "SEQ" => Some(FlowVerb::Sequence),
        "TRY" => Some(FlowVerb::Try),
        "CATCH" => Some(FlowVerb::Catch),
        "FINALLY" => Some(FlowVerb::Finally),
        "EXIT" => Some(FlowVerb::Exit),
        _ => None,
    }
}

fn build_step(verb: FlowVerb, node: &XmlNode) -> FlowStep {
    let label = node
        .attr_any(&["NAME", "LABEL", "COMMENT"])
        .unwrap_or_default()
        .to_string();
    let mut step = FlowStep::new(verb, label);

    match verb {
        FlowVerb::Branch => {
            if let Some(switch) = node.attr("SWITCH") {
                if step.label.is_empty() {
                    step.label = switch.to_string();
                }
            }
            step.branches = collect_branches(node);
        }
        FlowVerb::Map => {
            step.transforms = collect_transforms(node);
            step.children = collect_steps(node);
        }
        FlowVerb::Loop => {
            step.loop_spec = Some(LoopSpec {
                input_array: node
                    .attr_any(&["IN-ARRAY", "INPUT", "ARRAY"])
                    .unwrap_or_default()
                    .to_string(),
                output_var: node
                    .attr_any(&["OUT-ARRAY", "OUTPUT", "LOOPVAR"])
                    .map(str::to_string),
                count: node.attr("COUNT").and_then(|c| c.parse().ok()),
            });
            step.children = collect_steps(node);
        }
        _ => {
            step.children = collect_steps(node);
        }
    }

    step
}

/// BRANCH arms: either explicit CASE elements or verb children whose labels
/// act as switch values.
fn collect_branches(branch: &XmlNode) -> Vec<BranchCase> {
    let mut cases = Vec::new();

    for child in &branch.children {
        let local = child.local_name();
        if local == "CASE" {
            let condition = child
                .attr_any(&["VALUE", "NAME", "LABEL"])
                .unwrap_or_default()
                .to_string();
            cases.push(BranchCase {
                is_default: is_default_case(child, &condition),
                condition,
                steps: collect_steps(child),
            });
        } else if let Some(verb) = verb_for_tag(&local) {
            let step = build_step(verb, child);
            let condition = step.label.clone();
            cases.push(BranchCase {
                is_default: is_default_case(child, &condition),
                condition,
                steps: vec![step],
            });
        }
    }

    cases
}

fn is_default_case(node: &XmlNode, condition: &str) -> bool {
    condition == "$default"
        || condition == "*"
        || node
            .attr("DEFAULT")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn collect_transforms(map_node: &XmlNode) -> Vec<MapTransform> {
    let mut transforms = Vec::new();
    for node in map_node.walk() {
        match node.local_name().as_str() {
            "MAPSET" => {
                if let Some(target) = node.attr_any(&["FIELD", "OUTPUT", "NAME"]) {
                    transforms.push(MapTransform::Set {
                        target: target.to_string(),
                        value: node
                            .attr("VALUE")
                            .map(str::to_string)
                            .unwrap_or_else(|| node.text.clone()),
                    });
                }
            }
            "MAPCOPY" => {
                let from = node.attr_any(&["FROM", "MAPSOURCE", "SOURCE"]);
                let to = node.attr_any(&["TO", "MAPTARGET", "TARGET"]);
                if let (Some(from), Some(to)) = (from, to) {
                    transforms.push(MapTransform::Copy {
                        from: from.to_string(),
                        to: to.to_string(),
                    });
                }
            }
            "MAPDELETE" | "MAPDROP" => {
                if let Some(field) = node.attr_any(&["FIELD", "NAME"]) {
                    transforms.push(MapTransform::Drop {
                        field: field.to_string(),
                    });
                }
            }
            _ => {}
        }
    }
    transforms
}

/// Collect INVOKE targets across the whole body, deduplicated by qualified
/// name with per-target call counts.
fn extract_invocations(root: &XmlNode) -> Vec<Invocation> {
    let mut order: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, Invocation> = HashMap::new();

    for node in root.walk() {
        if node.local_name() != "INVOKE" {
            continue;
        }
        let Some(service) = node.attr_any(&["SERVICE", "NAME"]) else {
            continue;
        };
        let (namespace, service_name) = split_service_ref(service);
        let qualified = format!("{namespace}:{service_name}");
        match by_name.get_mut(&qualified) {
            Some(inv) => inv.call_count += 1,
            None => {
                order.push(qualified.clone());
                by_name.insert(
                    qualified,
                    Invocation {
                        namespace,
                        service_name,
                        call_count: 1,
                    },
                );
            }
        }
    }

    order
        .into_iter()
        .filter_map(|name| by_name.remove(&name))
        .collect()
}

/// Split `acme.orders:enrich` (or `acme.orders/enrich`) into namespace and
/// service name; an unqualified reference keeps an empty namespace.
fn split_service_ref(service: &str) -> (String, String) {
    for sep in [':', '/'] {
        if let Some((ns, name)) = service.rsplit_once(sep) {
            return (ns.to_string(), name.to_string());
        }
    }
    (String::new(), service.to_string())
}

/// Count bare verb-tag occurrences and synthesize unlabeled steps.
///
/// Only reached when the structural parse finds no steps at all, so counts
/// are never added on top of structurally parsed steps.
pub fn fallback_scan(body: &str) -> Vec<FlowStep> {
    let mut steps = Vec::new();
    for (verb, pattern) in BARE_TAG_PATTERNS.iter() {
        for _ in pattern.find_iter(body) {
            steps.push(FlowStep::synthesized(*verb));
        }
    }
    steps
}

/// Per-verb step counts over a tree, including branch-case bodies
pub fn count_verbs(steps: &[FlowStep]) -> HashMap<FlowVerb, usize> {
    let mut counts = HashMap::new();
    count_into(steps, &mut counts);
    counts
}

fn count_into(steps: &[FlowStep], counts: &mut HashMap<FlowVerb, usize>) {
    for step in steps {
        *counts.entry(step.verb).or_insert(0) += 1;
        count_into(&step.children, counts);
        for case in &step.branches {
            count_into(&case.steps, counts);
        }
    }
}

/// Total number of steps in a tree
pub fn total_steps(steps: &[FlowStep]) -> usize {
    count_verbs(steps).values().sum()
}

/// Maximum nesting depth of a tree (a flat list has depth 1)
pub fn max_depth(steps: &[FlowStep]) -> usize {
    steps
        .iter()
        .map(|step| {
            let child_depth = max_depth(&step.children).max(
                step.branches
                    .iter()
                    .map(|c| max_depth(&c.steps))
                    .max()
                    .unwrap_or(0),
            );
            1 + child_depth
        })
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER_FLOW: &str = r#"<?xml version="1.0"?>
<FLOW VERSION="3.0">
  <SEQUENCE NAME="main">
    <INVOKE SERVICE="acme.db:getOrders"/>
    <MAP NAME="shape result">
      <MAPSET FIELD="status" VALUE="NEW"/>
      <MAPCOPY FROM="row/id" TO="order/id"/>
    </MAP>
    <BRANCH SWITCH="/order/type">
      <SEQUENCE NAME="standard">
        <INVOKE SERVICE="pub.client.http:post"/>
      </SEQUENCE>
      <SEQUENCE NAME="$default">
        <EXIT FROM="$flow"/>
      </SEQUENCE>
    </BRANCH>
  </SEQUENCE>
</FLOW>"#;

    #[test]
    fn parses_nested_structure() {
        let (tree, _) = parse_flow(ORDER_FLOW).unwrap();
        assert!(!tree.from_fallback);
        assert_eq!(tree.steps.len(), 1);
        let main = &tree.steps[0];
        assert_eq!(main.verb, FlowVerb::Sequence);
        assert_eq!(main.label, "main");
        // INVOKE is not a step; MAP and BRANCH are.
        assert_eq!(main.children.len(), 2);
        let branch = &main.children[1];
        assert_eq!(branch.verb, FlowVerb::Branch);
        assert_eq!(branch.branches.len(), 2);
        assert!(branch.branches[1].is_default);
        assert_eq!(branch.branches[0].condition, "standard");
    }

    #[test]
    fn verb_counts_match_source_tags() {
        let (tree, _) = parse_flow(ORDER_FLOW).unwrap();
        let counts = count_verbs(&tree.steps);
        assert_eq!(counts.get(&FlowVerb::Sequence), Some(&3));
        assert_eq!(counts.get(&FlowVerb::Map), Some(&1));
        assert_eq!(counts.get(&FlowVerb::Branch), Some(&1));
        assert_eq!(counts.get(&FlowVerb::Exit), Some(&1));
        assert_eq!(total_steps(&tree.steps), 6);
    }

    #[test]
    fn map_transforms_extracted() {
        let (tree, _) = parse_flow(ORDER_FLOW).unwrap();
        let map = &tree.steps[0].children[0];
        assert_eq!(map.transforms.len(), 2);
        assert_eq!(
            map.transforms[0],
            MapTransform::Set {
                target: "status".to_string(),
                value: "NEW".to_string()
            }
        );
    }

    #[test]
    fn invocations_deduplicated_with_counts() {
        let body = r#"<FLOW>
  <SEQUENCE>
    <INVOKE SERVICE="pub.string:concat"/>
    <INVOKE SERVICE="pub.string:concat"/>
    <INVOKE SERVICE="acme.orders:enrich"/>
  </SEQUENCE>
</FLOW>"#;
        let (_, invocations) = parse_flow(body).unwrap();
        assert_eq!(invocations.len(), 2);
        assert_eq!(invocations[0].call_count, 2);
        assert!(invocations[0].is_builtin());
        assert!(!invocations[1].is_builtin());
    }

    #[test]
    fn loop_attributes_captured() {
        let body = r#"<FLOW><LOOP IN-ARRAY="/orders" OUT-ARRAY="/results"><MAP/></LOOP></FLOW>"#;
        let (tree, _) = parse_flow(body).unwrap();
        let spec = tree.steps[0].loop_spec.as_ref().unwrap();
        assert_eq!(spec.input_array, "/orders");
        assert_eq!(spec.output_var.as_deref(), Some("/results"));
        assert_eq!(tree.steps[0].children.len(), 1);
    }

    #[test]
    fn unrecognized_tags_are_dropped_not_counted() {
        let body = r#"<FLOW><COMMENTBLOCK><MAP NAME="inner"/></COMMENTBLOCK><WIDGET/></FLOW>"#;
        let (tree, _) = parse_flow(body).unwrap();
        let counts = count_verbs(&tree.steps);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get(&FlowVerb::Map), Some(&1));
    }

    #[test]
    fn fallback_synthesizes_unlabeled_steps_for_malformed_bodies() {
        // No structural steps survive, but bare verb tags are present.
        let body = "junk <MAP> junk <BRANCH/> <LOOP >";
        let steps = fallback_scan(body);
        let counts = count_verbs(&steps);
        assert_eq!(counts.get(&FlowVerb::Map), Some(&1));
        assert_eq!(counts.get(&FlowVerb::Branch), Some(&1));
        assert_eq!(counts.get(&FlowVerb::Loop), Some(&1));
        assert!(steps.iter().all(|s| s.label.is_empty()));
    }

    #[test]
    fn deep_nesting_preserved() {
        let body = r#"<FLOW>
  <SEQUENCE><LOOP IN-ARRAY="/a"><SEQUENCE><BRANCH>
    <SEQUENCE NAME="x"><MAP/></SEQUENCE>
  </BRANCH></SEQUENCE></LOOP></SEQUENCE>
</FLOW>"#;
        let (tree, _) = parse_flow(body).unwrap();
        assert_eq!(max_depth(&tree.steps), 6);
    }
}
