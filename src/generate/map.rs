// src/generate/map.rs

//! Map component generation from MAP-step transforms.
//!
//! A map service (or the MAP steps of a flow) becomes a transform.map
//! component: source and target profile references plus one mapping entry
//! per copy, a default-value entry per set, and a note per dropped field.

use crate::error::Result;
use crate::generate::process::folder_of;
use crate::generate::{
    close_component, open_component, ComponentStatus, GeneratedComponent, KeyCounter, TargetKind,
    XmlOut,
};
use crate::ir::model::{FlowStep, MapTransform, Service};

const MAP_AUTOMATION: u8 = 88;
const EMPTY_MAP_AUTOMATION: u8 = 55;

/// Collect the transforms of every MAP step in the service's flow, in
/// document order.
pub fn collect_map_transforms(service: &Service) -> Vec<MapTransform> {
    let mut transforms = Vec::new();
    if let Some(tree) = &service.flow {
        walk(&tree.steps, &mut transforms);
    }
    transforms
}

fn walk(steps: &[FlowStep], out: &mut Vec<MapTransform>) {
    for step in steps {
        out.extend(step.transforms.iter().cloned());
        walk(&step.children, out);
        for case in &step.branches {
            walk(&case.steps, out);
        }
    }
}

/// Generate a map component for a map service.
pub fn generate_map(service: &Service) -> Result<GeneratedComponent> {
    let transforms = collect_map_transforms(service);
    let mut keys = KeyCounter::new();
    let mut out = XmlOut::new();

    open_component(&mut out, TargetKind::Map, &service.name, &folder_of(service))?;
    out.text_el(
        "bns:description",
        &[],
        &format!("Converted map service {}", service.path),
    )?;

    let key = keys.next_key();
    out.open("bns:object", &[("key", key.as_str())])?;
    let key = keys.next_key();
    out.open("Map", &[("key", key.as_str())])?;

    let key = keys.next_key();
    let source_name = format!("{}_source", service.name);
    out.leaf(
        "SourceProfile",
        &[("key", key.as_str()), ("name", source_name.as_str())],
    )?;
    let key = keys.next_key();
    let target_name = format!("{}_target", service.name);
    out.leaf(
        "TargetProfile",
        &[("key", key.as_str()), ("name", target_name.as_str())],
    )?;

    let key = keys.next_key();
    out.open("Mappings", &[("key", key.as_str())])?;
    let mut dropped = Vec::new();
    for transform in &transforms {
        match transform {
            MapTransform::Copy { from, to } => {
                let key = keys.next_key();
                out.leaf(
                    "Mapping",
                    &[
                        ("key", key.as_str()),
                        ("fromProfileElement", from.as_str()),
                        ("toProfileElement", to.as_str()),
                    ],
                )?;
            }
            MapTransform::Set { target, value } => {
                let key = keys.next_key();
                out.leaf(
                    "DefaultValue",
                    &[
                        ("key", key.as_str()),
                        ("toProfileElement", target.as_str()),
                        ("value", value.as_str()),
                    ],
                )?;
            }
            MapTransform::Drop { field } => dropped.push(field.clone()),
        }
    }
    out.close("Mappings")?;
    for field in &dropped {
        out.comment(&format!(" dropped field not carried over: {field} "))?;
    }

    out.close("Map")?;
    out.close("bns:object")?;
    close_component(&mut out)?;

    let mut warnings = Vec::new();
    let mut manual_review_items =
        vec!["Bind source and target profile references to the generated profiles".to_string()];
    let automation_level = if transforms.is_empty() {
        warnings.push("No explicit transforms found; map body is empty".to_string());
        manual_review_items.push("Re-create field mappings manually".to_string());
        EMPTY_MAP_AUTOMATION
    } else {
        MAP_AUTOMATION
    };

    let status = if warnings.is_empty() {
        ComponentStatus::Converted
    } else {
        ComponentStatus::ConvertedWithWarnings
    };

    Ok(GeneratedComponent {
        target_kind: TargetKind::Map,
        name: service.name.clone(),
        source_path: service.path.clone(),
        xml: out.finish(),
        automation_level,
        warnings,
        manual_review_items,
        status,
    })
}
