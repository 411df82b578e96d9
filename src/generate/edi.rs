// src/generate/edi.rs

//! EDI profile generation.
//!
//! The source system stores EDI document types as named schema nodes; the
//! target wants a profile.edi component with explicit header, detail, and
//! summary loops. Segment layouts for the common transaction sets (X12 850
//! and 810, EDIFACT ORDERS) are built in; anything else gets a skeleton
//! profile flagged for manual completion.

use crate::error::Result;
use crate::generate::{
    close_component, open_component, ComponentStatus, GeneratedComponent, KeyCounter, TargetKind,
    XmlOut,
};
use crate::ir::model::{EdiSchema, EdiStandard};

const KNOWN_SET_AUTOMATION: u8 = 85;
const GENERIC_SET_AUTOMATION: u8 = 45;

/// Segment layout for one transaction set, split into the three standard
/// loop regions. The detail region repeats.
struct SegmentLayout {
    header: &'static [&'static str],
    detail: &'static [&'static str],
    summary: &'static [&'static str],
}

const X12_850: SegmentLayout = SegmentLayout {
    header: &["BEG", "REF", "PER", "DTM"],
    detail: &["PO1", "PID", "PO4"],
    summary: &["CTT", "AMT"],
};

const X12_810: SegmentLayout = SegmentLayout {
    header: &["BIG", "REF", "N1"],
    detail: &["IT1", "PID"],
    summary: &["TDS", "CTT"],
};

const EDIFACT_ORDERS: SegmentLayout = SegmentLayout {
    header: &["UNH", "BGM", "DTM", "NAD"],
    detail: &["LIN", "PIA", "QTY"],
    summary: &["UNS", "CNT", "UNT"],
};

fn layout_for(schema: &EdiSchema) -> Option<&'static SegmentLayout> {
    match (schema.standard, schema.transaction_set.as_str()) {
        (EdiStandard::X12, "850") => Some(&X12_850),
        (EdiStandard::X12, "810") => Some(&X12_810),
        (EdiStandard::Edifact, "ORDERS") => Some(&EDIFACT_ORDERS),
        _ => None,
    }
}

fn standard_label(standard: EdiStandard) -> &'static str {
    match standard {
        EdiStandard::X12 => "X12",
        EdiStandard::Edifact => "EDIFACT",
    }
}

/// Generate an EDI profile component for a schema node.
pub fn generate_edi_profile(schema: &EdiSchema) -> Result<GeneratedComponent> {
    let layout = layout_for(schema);
    let mut keys = KeyCounter::new();
    let mut out = XmlOut::new();

    open_component(&mut out, TargetKind::EdiProfile, &schema.name, &folder_of(schema))?;
    out.text_el(
        "bns:description",
        &[],
        &format!(
            "Converted {} {} schema {}",
            standard_label(schema.standard),
            schema.transaction_set,
            schema.path
        ),
    )?;

    let key = keys.next_key();
    out.open("bns:object", &[("key", key.as_str())])?;
    let key = keys.next_key();
    out.open(
        "EDIProfile",
        &[
            ("key", key.as_str()),
            ("standard", standard_label(schema.standard)),
            ("transactionSet", schema.transaction_set.as_str()),
        ],
    )?;

    match layout {
        Some(layout) => {
            write_loop(&mut out, &mut keys, "Header", layout.header, false)?;
            write_loop(&mut out, &mut keys, "Detail", layout.detail, true)?;
            write_loop(&mut out, &mut keys, "Summary", layout.summary, false)?;
        }
        None => {
            write_loop(&mut out, &mut keys, "Header", &[], false)?;
            write_loop(&mut out, &mut keys, "Detail", &[], true)?;
            write_loop(&mut out, &mut keys, "Summary", &[], false)?;
            out.comment(&format!(
                " no built-in segment layout for {} {} ",
                standard_label(schema.standard),
                schema.transaction_set
            ))?;
        }
    }

    out.close("EDIProfile")?;
    out.close("bns:object")?;
    close_component(&mut out)?;

    let mut warnings = Vec::new();
    let mut manual_review_items =
        vec!["Verify segment element definitions against the trading-partner guide".to_string()];
    let automation_level = if layout.is_some() {
        KNOWN_SET_AUTOMATION
    } else {
        warnings.push(format!(
            "No built-in layout for transaction set {}; emitted an empty skeleton",
            schema.transaction_set
        ));
        manual_review_items.push("Define the segment layout manually".to_string());
        GENERIC_SET_AUTOMATION
    };

    let status = if warnings.is_empty() {
        ComponentStatus::Converted
    } else {
        ComponentStatus::ConvertedWithWarnings
    };

    Ok(GeneratedComponent {
        target_kind: TargetKind::EdiProfile,
        name: schema.name.clone(),
        source_path: schema.path.clone(),
        xml: out.finish(),
        automation_level,
        warnings,
        manual_review_items,
        status,
    })
}

fn write_loop(
    out: &mut XmlOut,
    keys: &mut KeyCounter,
    region: &str,
    segments: &[&str],
    repeating: bool,
) -> Result<()> {
    let key = keys.next_key();
    let mut attrs: Vec<(&str, &str)> = vec![("key", key.as_str()), ("region", region)];
    if repeating {
        attrs.push(("repeating", "true"));
    }
    out.open("Loop", &attrs)?;
    for segment in segments {
        let key = keys.next_key();
        out.leaf("Segment", &[("key", key.as_str()), ("id", segment)])?;
    }
    out.close("Loop")
}

fn folder_of(schema: &EdiSchema) -> String {
    match schema.path.rsplit_once('/') {
        Some((folder, _)) => format!("/{folder}"),
        None => "/".to_string(),
    }
}
