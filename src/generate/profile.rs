// src/generate/profile.rs

//! Data profile generation: XML, JSON, and flat-file profiles from document
//! field trees.
//!
//! Field types are mapped into the closed character/number/datetime
//! vocabulary; array fields carry the looping marker and an unbounded
//! max-occurs sentinel. Recursion mirrors the document tree exactly, with
//! the element key counter threaded through every level.

use crate::error::Result;
use crate::generate::{
    close_component, map_field_type, open_component, ComponentStatus, GeneratedComponent,
    KeyCounter, TargetKind, XmlOut, TYPE_DATETIME, TYPE_NUMBER, UNBOUNDED,
};
use crate::ir::model::{Document, Field};
use serde_json::{json, Map, Value};

/// Automation estimate for a structurally complete profile
const PROFILE_AUTOMATION: u8 = 90;

/// Automation when the source document parsed empty
const EMPTY_PROFILE_AUTOMATION: u8 = 40;

/// Generate an XML profile component for a document.
pub fn generate_xml_profile(doc: &Document) -> Result<GeneratedComponent> {
    let mut keys = KeyCounter::new();
    let mut out = XmlOut::new();

    open_component(&mut out, TargetKind::ProfileXml, &doc.name, &folder_of(doc))?;
    out.text_el(
        "bns:description",
        &[],
        &format!("Converted document type {}", doc.path),
    )?;

    let key = keys.next_key();
    out.open("bns:object", &[("key", key.as_str())])?;
    let key = keys.next_key();
    out.open("XMLProfile", &[("key", key.as_str())])?;
    let key = keys.next_key();
    out.open("DataElements", &[("key", key.as_str())])?;
    for field in &doc.fields {
        write_element(&mut out, &mut keys, field)?;
    }
    out.close("DataElements")?;
    out.close("XMLProfile")?;
    out.close("bns:object")?;
    close_component(&mut out)?;

    Ok(finish(doc, TargetKind::ProfileXml, out.finish()))
}

/// Recursive element emission; the counter threads through by `&mut` so
/// keys stay strictly increasing across the whole document.
fn write_element(out: &mut XmlOut, keys: &mut KeyCounter, field: &Field) -> Result<()> {
    let key = keys.next_key();
    let min_occurs = if field.required { "1" } else { "0" };
    let max_occurs = if field.is_array { UNBOUNDED } else { "1" };

    if field.children.is_empty() && field.field_type != "record" {
        let mut attrs: Vec<(&str, &str)> = vec![
            ("key", key.as_str()),
            ("name", field.name.as_str()),
            ("type", map_field_type(&field.field_type)),
            ("minOccurs", min_occurs),
            ("maxOccurs", max_occurs),
        ];
        if field.is_array {
            attrs.push(("looping", "true"));
        }
        out.leaf("element", &attrs)?;
        return Ok(());
    }

    let mut attrs: Vec<(&str, &str)> = vec![
        ("key", key.as_str()),
        ("name", field.name.as_str()),
        ("minOccurs", min_occurs),
        ("maxOccurs", max_occurs),
    ];
    if field.is_array {
        attrs.push(("looping", "true"));
    }
    out.open("element", &attrs)?;
    for child in &field.children {
        write_element(out, keys, child)?;
    }
    out.close("element")
}

/// Generate a JSON profile; the schema body is serialized JSON carried in
/// the component object.
pub fn generate_json_profile(doc: &Document) -> Result<GeneratedComponent> {
    let mut keys = KeyCounter::new();
    let mut out = XmlOut::new();

    open_component(&mut out, TargetKind::ProfileJson, &doc.name, &folder_of(doc))?;
    out.text_el(
        "bns:description",
        &[],
        &format!("Converted document type {}", doc.path),
    )?;

    let key = keys.next_key();
    out.open("bns:object", &[("key", key.as_str())])?;
    let key = keys.next_key();
    out.open("JSONProfile", &[("key", key.as_str())])?;

    let schema = json_schema(&doc.fields);
    let body = serde_json::to_string_pretty(&schema)
        .map_err(|e| crate::error::Error::Generation(format!("schema serialization: {e}")))?;
    let key = keys.next_key();
    out.cdata_el("jsonSchema", &[("key", key.as_str())], &body)?;

    out.close("JSONProfile")?;
    out.close("bns:object")?;
    close_component(&mut out)?;

    Ok(finish(doc, TargetKind::ProfileJson, out.finish()))
}

fn json_schema(fields: &[Field]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        properties.insert(field.name.clone(), json_field(field));
        if field.required {
            required.push(Value::String(field.name.clone()));
        }
    }
    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = Value::Array(required);
    }
    schema
}

fn json_field(field: &Field) -> Value {
    let base = if !field.children.is_empty() || field.field_type == "record" {
        json_schema(&field.children)
    } else {
        match map_field_type(&field.field_type) {
            TYPE_NUMBER => json!({ "type": "number" }),
            TYPE_DATETIME => json!({ "type": "string", "format": "date-time" }),
            _ => json!({ "type": "string" }),
        }
    };
    if field.is_array {
        json!({ "type": "array", "items": base })
    } else {
        base
    }
}

/// Generate a flat-file profile: leaf fields in order with 1-based
/// positions. Nested records are flattened; flat files have no hierarchy.
pub fn generate_flat_profile(doc: &Document) -> Result<GeneratedComponent> {
    let mut keys = KeyCounter::new();
    let mut out = XmlOut::new();

    open_component(&mut out, TargetKind::ProfileFlat, &doc.name, &folder_of(doc))?;
    out.text_el(
        "bns:description",
        &[],
        &format!("Converted document type {} (flat file)", doc.path),
    )?;

    let key = keys.next_key();
    out.open("bns:object", &[("key", key.as_str())])?;
    let key = keys.next_key();
    out.open(
        "FlatFileProfile",
        &[("key", key.as_str()), ("delimiter", "comma")],
    )?;
    let key = keys.next_key();
    out.open("DataElements", &[("key", key.as_str())])?;

    let mut leaves = Vec::new();
    flatten(&doc.fields, &mut leaves);
    for (idx, field) in leaves.iter().enumerate() {
        let key = keys.next_key();
        let position = (idx + 1).to_string();
        out.leaf(
            "element",
            &[
                ("key", key.as_str()),
                ("name", field.name.as_str()),
                ("type", map_field_type(&field.field_type)),
                ("position", position.as_str()),
            ],
        )?;
    }
    out.close("DataElements")?;
    out.close("FlatFileProfile")?;
    out.close("bns:object")?;
    close_component(&mut out)?;

    Ok(finish(doc, TargetKind::ProfileFlat, out.finish()))
}

fn flatten<'a>(fields: &'a [Field], out: &mut Vec<&'a Field>) {
    for field in fields {
        if field.children.is_empty() && field.field_type != "record" {
            out.push(field);
        } else {
            flatten(&field.children, out);
        }
    }
}

fn finish(doc: &Document, kind: TargetKind, xml: String) -> GeneratedComponent {
    let mut warnings = Vec::new();
    let mut manual_review_items = Vec::new();
    let automation_level = if doc.fields.is_empty() {
        warnings.push("Document parsed with no fields; profile is empty".to_string());
        manual_review_items.push("Rebuild the profile structure by hand".to_string());
        EMPTY_PROFILE_AUTOMATION
    } else {
        PROFILE_AUTOMATION
    };
    if let Some(reason) = &doc.degraded {
        warnings.push(format!("Source document was degraded: {reason}"));
    }

    let status = if warnings.is_empty() {
        ComponentStatus::Converted
    } else {
        ComponentStatus::ConvertedWithWarnings
    };

    GeneratedComponent {
        target_kind: kind,
        name: doc.name.clone(),
        source_path: doc.path.clone(),
        xml,
        automation_level,
        warnings,
        manual_review_items,
        status,
    }
}

fn folder_of(doc: &Document) -> String {
    match doc.path.rsplit_once('/') {
        Some((folder, _)) => format!("/{folder}"),
        None => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_document() -> Document {
        Document {
            name: "OrderDoc".to_string(),
            path: "acme/docs/OrderDoc".to_string(),
            fields: vec![
                Field {
                    name: "orderId".to_string(),
                    field_type: "string".to_string(),
                    is_array: false,
                    required: true,
                    children: Vec::new(),
                },
                Field {
                    name: "total".to_string(),
                    field_type: "double".to_string(),
                    is_array: false,
                    required: false,
                    children: Vec::new(),
                },
                Field {
                    name: "items".to_string(),
                    field_type: "record".to_string(),
                    is_array: true,
                    required: false,
                    children: vec![
                        Field {
                            name: "sku".to_string(),
                            field_type: "string".to_string(),
                            is_array: false,
                            required: true,
                            children: Vec::new(),
                        },
                        Field {
                            name: "shippedAt".to_string(),
                            field_type: "datetime".to_string(),
                            is_array: false,
                            required: false,
                            children: Vec::new(),
                        },
                    ],
                },
            ],
            degraded: None,
        }
    }

    #[test]
    fn xml_profile_maps_types_and_marks_arrays() {
        let doc = make_test_document();
        let component = generate_xml_profile(&doc).unwrap();
        assert!(component.xml.contains("type=\"character\""));
        assert!(component.xml.contains("type=\"number\""));
        assert!(component.xml.contains("type=\"datetime\""));
        assert!(component.xml.contains("maxOccurs=\"unbounded\""));
        assert!(component.xml.contains("looping=\"true\""));
        assert_eq!(component.automation_level, 90);
        assert_eq!(component.status, ComponentStatus::Converted);
    }

    #[test]
    fn xml_profile_keys_strictly_increasing_through_recursion() {
        let doc = make_test_document();
        let component = generate_xml_profile(&doc).unwrap();
        let keys = crate::generate::extract_keys(&component.xml);
        assert!(keys.len() >= 8);
        for pair in keys.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn json_profile_schema_structure() {
        let doc = make_test_document();
        let component = generate_json_profile(&doc).unwrap();
        let start = component.xml.find("<![CDATA[").unwrap() + 9;
        let end = component.xml.find("]]>").unwrap();
        let schema: Value = serde_json::from_str(&component.xml[start..end]).unwrap();
        assert_eq!(schema["properties"]["total"]["type"], "number");
        assert_eq!(schema["properties"]["items"]["type"], "array");
        assert_eq!(
            schema["properties"]["items"]["items"]["properties"]["sku"]["type"],
            "string"
        );
        assert_eq!(schema["required"][0], "orderId");
    }

    #[test]
    fn flat_profile_positions_are_one_based() {
        let doc = make_test_document();
        let component = generate_flat_profile(&doc).unwrap();
        assert!(component.xml.contains("position=\"1\""));
        // Nested leaves flatten: orderId, total, sku, shippedAt.
        assert!(component.xml.contains("position=\"4\""));
        assert!(!component.xml.contains("position=\"5\""));
    }

    #[test]
    fn empty_document_degrades_with_warning() {
        let doc = Document {
            name: "Empty".to_string(),
            path: "acme/Empty".to_string(),
            fields: Vec::new(),
            degraded: Some("descriptor undecodable".to_string()),
        };
        let component = generate_xml_profile(&doc).unwrap();
        assert_eq!(component.automation_level, 40);
        assert_eq!(component.status, ComponentStatus::ConvertedWithWarnings);
        assert_eq!(component.warnings.len(), 2);
    }
}
