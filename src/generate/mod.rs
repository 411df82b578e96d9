// src/generate/mod.rs

//! Target component XML generation.
//!
//! Shared plumbing for the per-kind generators: the element key counter,
//! a thin writer over quick-xml, the source-to-target type map, and the
//! [`GeneratedComponent`] record the orchestrator aggregates.
//!
//! Every generator invocation owns a fresh [`KeyCounter`]; the counter is
//! threaded through recursive emission by mutable reference and is never
//! shared between documents.

pub mod connector;
pub mod edi;
pub mod map;
pub mod process;
pub mod profile;
pub mod validate;

use crate::error::{Error, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Target platform component namespace
pub const TARGET_NS: &str = "http://api.platform.boomi.com/";

/// Closed target type vocabulary for profile and map fields
pub const TYPE_CHARACTER: &str = "character";
pub const TYPE_NUMBER: &str = "number";
pub const TYPE_DATETIME: &str = "datetime";

/// Sentinel for unbounded repetition on array fields
pub const UNBOUNDED: &str = "unbounded";

/// Map a source field or SQL type into the closed target vocabulary.
/// Unknown types default to character.
pub fn map_field_type(source_type: &str) -> &'static str {
    match source_type.to_lowercase().as_str() {
        "int" | "integer" | "long" | "short" | "byte" | "double" | "float" | "decimal"
        | "number" | "numeric" | "bigint" | "bigdecimal" => TYPE_NUMBER,
        "date" | "time" | "datetime" | "timestamp" => TYPE_DATETIME,
        _ => TYPE_CHARACTER,
    }
}

/// Monotonically increasing element key, scoped to one generated document.
///
/// Constructed fresh per generator invocation and passed by mutable
/// reference through recursive emission, so concurrent generator calls can
/// never interleave keys.
#[derive(Debug, Default)]
pub struct KeyCounter(u32);

impl KeyCounter {
    pub fn new() -> Self {
        KeyCounter(0)
    }

    /// Next key in document order, starting at "1"
    pub fn next_key(&mut self) -> String {
        self.0 += 1;
        self.0.to_string()
    }

    pub fn current(&self) -> u32 {
        self.0
    }
}

/// What kind of target artifact a component is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum TargetKind {
    Process,
    ProfileXml,
    ProfileJson,
    ProfileFlat,
    EdiProfile,
    Map,
    Connector,
    DataProcess,
}

impl TargetKind {
    /// `type` attribute on the component root
    pub fn component_type(self) -> &'static str {
        match self {
            TargetKind::Process | TargetKind::DataProcess => "process",
            TargetKind::ProfileXml => "profile.xml",
            TargetKind::ProfileJson => "profile.json",
            TargetKind::ProfileFlat => "profile.flatfile",
            TargetKind::EdiProfile => "profile.edi",
            TargetKind::Map => "transform.map",
            TargetKind::Connector => "connector-settings",
        }
    }
}

/// Conversion status rolled up into the package report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum ComponentStatus {
    Converted,
    ConvertedWithWarnings,
    Failed,
}

/// One generated target artifact; write-once, the orchestrator only reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedComponent {
    pub target_kind: TargetKind,
    pub name: String,
    pub source_path: String,
    pub xml: String,
    pub automation_level: u8,
    pub warnings: Vec<String>,
    pub manual_review_items: Vec<String>,
    pub status: ComponentStatus,
}

impl GeneratedComponent {
    /// Placeholder component recording a generation failure; keeps the
    /// batch going with a zero automation level.
    pub fn failed(
        target_kind: TargetKind,
        name: impl Into<String>,
        source_path: impl Into<String>,
        reason: String,
    ) -> Self {
        GeneratedComponent {
            target_kind,
            name: name.into(),
            source_path: source_path.into(),
            xml: String::new(),
            automation_level: 0,
            warnings: vec![reason],
            manual_review_items: vec!["Conversion failed; migrate this unit manually".to_string()],
            status: ComponentStatus::Failed,
        }
    }
}

/// Thin XML writer used by all generators. Event-based rather than
/// closure-based so the key counter threads through plain control flow.
pub struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    pub fn new() -> Self {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        // Declaration failures on an in-memory buffer cannot happen.
        let _ = writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)));
        XmlOut { writer }
    }

    pub fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut start = BytesStart::new(name);
        for (k, v) in attrs {
            start.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Start(start))
            .map_err(|e| Error::Generation(format!("write <{name}>: {e}")))
    }

    pub fn close(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(|e| Error::Generation(format!("write </{name}>: {e}")))
    }

    /// Self-closing element
    pub fn leaf(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut start = BytesStart::new(name);
        for (k, v) in attrs {
            start.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Empty(start))
            .map_err(|e| Error::Generation(format!("write <{name}/>: {e}")))
    }

    /// Element with text content
    pub fn text_el(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.open(name, attrs)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(|e| Error::Generation(format!("write text of <{name}>: {e}")))?;
        self.close(name)
    }

    /// Element with CDATA content (embedded SQL, scripts)
    pub fn cdata_el(&mut self, name: &str, attrs: &[(&str, &str)], content: &str) -> Result<()> {
        self.open(name, attrs)?;
        self.writer
            .write_event(Event::CData(BytesCData::new(content)))
            .map_err(|e| Error::Generation(format!("write cdata of <{name}>: {e}")))?;
        self.close(name)
    }

    pub fn comment(&mut self, text: &str) -> Result<()> {
        self.writer
            .write_event(Event::Comment(BytesText::new(text)))
            .map_err(|e| Error::Generation(format!("write comment: {e}")))
    }

    pub fn finish(self) -> String {
        String::from_utf8_lossy(&self.writer.into_inner()).to_string()
    }
}

impl Default for XmlOut {
    fn default() -> Self {
        XmlOut::new()
    }
}

/// Open the `bns:Component` root shared by every generated document.
pub fn open_component(out: &mut XmlOut, kind: TargetKind, name: &str, folder: &str) -> Result<()> {
    out.open(
        "bns:Component",
        &[
            ("xmlns:bns", TARGET_NS),
            ("name", name),
            ("type", kind.component_type()),
            ("folderFullPath", folder),
        ],
    )
}

pub fn close_component(out: &mut XmlOut) -> Result<()> {
    out.close("bns:Component")
}

/// Pull `key="N"` attribute values in document order (test support)
#[cfg(test)]
pub(crate) fn extract_keys(xml: &str) -> Vec<u32> {
    let mut keys = Vec::new();
    let mut rest = xml;
    while let Some(pos) = rest.find("key=\"") {
        let after = &rest[pos + 5..];
        if let Some(end) = after.find('"') {
            if let Ok(n) = after[..end].parse() {
                keys.push(n);
            }
            rest = &after[end..];
        } else {
            break;
        }
    }
    keys
}
