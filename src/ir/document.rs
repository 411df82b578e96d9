// src/ir/document.rs

//! Document type parsing.
//!
//! Document schemas are exported as nested record descriptors: each field is
//! a `record` element carrying `field_name` / `field_type` / `field_dim`
//! value children, with sub-fields inside a `rec_fields` array. Recursion
//! mirrors the source structure exactly; sibling fields are deduplicated by
//! name, first occurrence wins.

use crate::ir::model::Field;
use crate::ir::xml::{self, XmlNode};

/// Parse document schema text into its root field list.
pub fn parse_document(body: &str) -> Result<Vec<Field>, String> {
    let root = xml::load(body)?;
    let mut fields = Vec::new();

    // Top-level field records appear inside the descriptor's rec_fields
    // arrays; some exports place them directly under the root record.
    for node in root.walk() {
        if is_field_array(node) {
            collect_fields(node, &mut fields);
            break;
        }
    }
    if fields.is_empty() {
        for node in root.walk() {
            if node.local_name() == "RECORD" && child_value(node, "field_name").is_some() {
                if let Some(field) = parse_field(node) {
                    push_deduped(&mut fields, field);
                }
            }
        }
    }

    Ok(fields)
}

fn is_field_array(node: &XmlNode) -> bool {
    node.local_name() == "ARRAY"
        && node
            .attr("name")
            .is_some_and(|n| n.eq_ignore_ascii_case("rec_fields"))
}

fn collect_fields(array: &XmlNode, out: &mut Vec<Field>) {
    for child in &array.children {
        if child.local_name() == "RECORD" {
            if let Some(field) = parse_field(child) {
                push_deduped(out, field);
            }
        }
    }
}

/// One field record; `None` for records without a usable name.
fn parse_field(record: &XmlNode) -> Option<Field> {
    let name = child_value(record, "field_name")?.trim().to_string();
    if name.is_empty() {
        return None;
    }

    let field_type = child_value(record, "field_type")
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "string".to_string());
    let is_array = child_value(record, "field_dim")
        .and_then(|d| d.trim().parse::<u32>().ok())
        .is_some_and(|d| d > 0);
    let required = !child_value(record, "field_opt").is_some_and(|v| v.trim() == "true");

    let mut children = Vec::new();
    // Only direct rec_fields arrays belong to this field; deeper ones are
    // owned by nested records.
    for child in &record.children {
        if is_field_array(child) {
            collect_fields(child, &mut children);
        }
    }

    Some(Field {
        name,
        field_type,
        is_array,
        required,
        children,
    })
}

fn child_value<'a>(node: &'a XmlNode, name: &str) -> Option<&'a str> {
    node.children.iter().find_map(|c| {
        if c.local_name() == "VALUE" && c.attr("name").is_some_and(|n| n.eq_ignore_ascii_case(name))
        {
            Some(c.text.as_str())
        } else {
            None
        }
    })
}

fn push_deduped(fields: &mut Vec<Field>, field: Field) {
    if !fields.iter().any(|f| f.name == field.name) {
        fields.push(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER_DOC: &str = r#"<?xml version="1.0"?>
<Values version="2.0">
  <record name="record" javaclass="com.wm.util.Values">
    <value name="node_type">record</value>
    <array name="rec_fields" type="record" depth="1">
      <record javaclass="com.wm.util.Values">
        <value name="field_name">orderId</value>
        <value name="field_type">string</value>
        <value name="field_dim">0</value>
      </record>
      <record javaclass="com.wm.util.Values">
        <value name="field_name">total</value>
        <value name="field_type">double</value>
        <value name="field_dim">0</value>
        <value name="field_opt">true</value>
      </record>
      <record javaclass="com.wm.util.Values">
        <value name="field_name">items</value>
        <value name="field_type">record</value>
        <value name="field_dim">1</value>
        <array name="rec_fields" type="record">
          <record>
            <value name="field_name">sku</value>
            <value name="field_type">string</value>
          </record>
          <record>
            <value name="field_name">qty</value>
            <value name="field_type">integer</value>
          </record>
        </array>
      </record>
    </array>
  </record>
</Values>"#;

    #[test]
    fn parses_nested_field_tree() {
        let fields = parse_document(ORDER_DOC).unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].name, "orderId");
        assert_eq!(fields[0].field_type, "string");
        assert!(fields[0].required);

        assert!(!fields[1].required);

        let items = &fields[2];
        assert!(items.is_array);
        assert_eq!(items.field_type, "record");
        assert_eq!(items.children.len(), 2);
        assert_eq!(items.children[1].name, "qty");
    }

    #[test]
    fn duplicate_sibling_names_deduplicated() {
        let body = r#"<Values>
  <array name="rec_fields">
    <record><value name="field_name">id</value></record>
    <record><value name="field_name">id</value><value name="field_type">integer</value></record>
  </array>
</Values>"#;
        let fields = parse_document(body).unwrap();
        assert_eq!(fields.len(), 1);
        // First occurrence wins.
        assert_eq!(fields[0].field_type, "string");
    }

    #[test]
    fn missing_type_defaults_to_string() {
        let body = r#"<Values><array name="rec_fields">
  <record><value name="field_name">note</value></record>
</array></Values>"#;
        let fields = parse_document(body).unwrap();
        assert_eq!(fields[0].field_type, "string");
    }

    #[test]
    fn nameless_records_skipped() {
        let body = r#"<Values><array name="rec_fields">
  <record><value name="node_type">record</value></record>
</array></Values>"#;
        let fields = parse_document(body).unwrap();
        assert!(fields.is_empty());
    }
}
