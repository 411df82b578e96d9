// src/transpile/mod.rs

//! Embedded-source transpilation.
//!
//! Converts the Java bodies of script services into Groovy suitable for a
//! target-platform data-process step. The pipeline is: drop platform
//! imports, apply the idiom rewrite table, strip class/method boilerplate,
//! scan for residual platform APIs (warnings) and constructs needing human
//! judgment (review items), then wrap the body in the data-process harness.
//!
//! Confidence starts at 100 and drops 15 per warning and 5 per review
//! item; the tier thresholds are fixed at 80 (auto) and 50 (semi).

mod rules;

use rules::{
    CLASS_BOILERPLATE, DISALLOWED_APIS, NULL_COALESCE, PLATFORM_IMPORT_PREFIXES, REVIEW_CONSTRUCTS,
    REWRITES,
};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::debug;

const WARNING_PENALTY: i64 = 15;
const REVIEW_PENALTY: i64 = 5;

/// How much of the converted script can be trusted without review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
pub enum AutomationTier {
    Auto,
    Semi,
    Manual,
}

impl AutomationTier {
    fn from_confidence(confidence: u8) -> Self {
        if confidence >= 80 {
            AutomationTier::Auto
        } else if confidence >= 50 {
            AutomationTier::Semi
        } else {
            AutomationTier::Manual
        }
    }
}

/// Result of transpiling one embedded source body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranspileOutput {
    pub script: String,
    pub confidence: u8,
    pub tier: AutomationTier,
    pub warnings: Vec<String>,
    pub manual_review_items: Vec<String>,
    /// Platform imports that were dropped during conversion
    pub removed_imports: Vec<String>,
}

/// Transpile one service's embedded Java into a Groovy data-process script.
pub fn transpile(source: &str) -> TranspileOutput {
    let (body, removed_imports) = strip_imports(source);
    let body = apply_rewrites(&body);
    let body = strip_boilerplate(&body);

    let warnings = detect_residual_apis(&body);
    let manual_review_items = detect_review_constructs(&body);

    let confidence = (100i64
        - WARNING_PENALTY * warnings.len() as i64
        - REVIEW_PENALTY * manual_review_items.len() as i64)
        .clamp(0, 100) as u8;
    let tier = AutomationTier::from_confidence(confidence);

    debug!(
        confidence,
        warnings = warnings.len(),
        review_items = manual_review_items.len(),
        "transpiled embedded source"
    );

    TranspileOutput {
        script: wrap_in_harness(&body, &removed_imports),
        confidence,
        tier,
        warnings,
        manual_review_items,
        removed_imports,
    }
}

/// Remove import lines; platform imports are recorded, JDK imports are kept
/// inline since Groovy accepts them unchanged.
fn strip_imports(source: &str) -> (String, Vec<String>) {
    let mut removed = Vec::new();
    let mut kept = Vec::new();
    for line in source.lines() {
        let trimmed = line.trim();
        if let Some(import) = trimmed.strip_prefix("import ") {
            let import = import.trim_end_matches(';').trim();
            if PLATFORM_IMPORT_PREFIXES.iter().any(|p| import.starts_with(p)) {
                removed.push(import.to_string());
                continue;
            }
        }
        if trimmed.starts_with("package ") {
            continue;
        }
        kept.push(line);
    }
    (kept.join("\n"), removed)
}

fn apply_rewrites(body: &str) -> String {
    let mut out = body.to_string();
    for rule in REWRITES.iter() {
        out = rule.pattern.replace_all(&out, rule.replacement).to_string();
    }
    // `x != null ? x : y` collapses to `x ?: y` only when both branches
    // name the same variable.
    out = NULL_COALESCE
        .replace_all(&out, |caps: &regex::Captures<'_>| {
            if caps[1] == caps[2] {
                format!("{} ?: {}", &caps[1], caps[3].trim())
            } else {
                caps[0].to_string()
            }
        })
        .to_string();
    out
}

/// Strip class/method wrappers and the matching trailing close braces.
fn strip_boilerplate(body: &str) -> String {
    let mut out = body.to_string();
    let mut removed_blocks = 0;
    for pattern in CLASS_BOILERPLATE.iter() {
        let count = pattern.find_iter(&out).count();
        if count > 0 {
            removed_blocks += count;
            out = pattern.replace_all(&out, "").to_string();
        }
    }

    // Drop one trailing lone `}` per removed wrapper.
    let mut lines: Vec<&str> = out.lines().collect();
    let mut to_remove = removed_blocks;
    while to_remove > 0 {
        match lines.iter().rposition(|l| l.trim() == "}") {
            Some(idx) => {
                lines.remove(idx);
                to_remove -= 1;
            }
            None => break,
        }
    }

    let cleaned: Vec<&str> = lines.into_iter().collect();
    let mut result = cleaned.join("\n");
    // Collapse the blank runs left behind by removed lines.
    while result.contains("\n\n\n") {
        result = result.replace("\n\n\n", "\n\n");
    }
    result.trim().to_string()
}

fn detect_residual_apis(body: &str) -> Vec<String> {
    DISALLOWED_APIS
        .iter()
        .filter(|api| body.contains(**api))
        .map(|api| format!("Unconverted platform API reference: {api}"))
        .collect()
}

fn detect_review_constructs(body: &str) -> Vec<String> {
    REVIEW_CONSTRUCTS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(body))
        .map(|(name, _)| format!("Verify converted {name} behavior"))
        .collect()
}

/// Wrap a converted body in the fixed data-process harness: iterate the
/// incoming documents, expose stream and properties, store results.
fn wrap_in_harness(body: &str, removed_imports: &[String]) -> String {
    let mut script = String::new();
    script.push_str("import java.util.Properties;\n");
    script.push_str("import java.io.InputStream;\n");
    script.push_str("import com.boomi.execution.ExecutionUtil;\n\n");
    for import in removed_imports {
        script.push_str(&format!("// removed platform import: {import}\n"));
    }
    if !removed_imports.is_empty() {
        script.push('\n');
    }
    script.push_str("logger = ExecutionUtil.getBaseLogger();\n\n");
    script.push_str("for (int i = 0; i < dataContext.getDataCount(); i++) {\n");
    script.push_str("    InputStream is = dataContext.getStream(i);\n");
    script.push_str("    Properties props = dataContext.getProperties(i);\n\n");
    script.push_str("    // --- converted service logic ---\n");
    for line in body.lines() {
        if line.trim().is_empty() {
            script.push('\n');
        } else {
            script.push_str("    ");
            script.push_str(line);
            script.push('\n');
        }
    }
    script.push_str("    // --- end converted logic ---\n\n");
    script.push_str("    dataContext.storeStream(is, props);\n");
    script.push_str("}\n");
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_SERVICE: &str = r#"package acme.orders;

import com.wm.data.IData;
import com.wm.data.IDataCursor;
import com.wm.data.IDataUtil;
import java.util.ArrayList;

public final class normalize {
    public static final void normalize(IData pipeline) throws ServiceException {
        IDataCursor cursor = pipeline.getCursor();
        String status = IDataUtil.getString(cursor, "status");
        IDataUtil.put(cursor, "normalized", status.trim());
        cursor.destroy();
    }
}
"#;

    #[test]
    fn converts_pipeline_idioms_and_wraps_in_harness() {
        let out = transpile(SIMPLE_SERVICE);
        assert!(out.script.contains("props.getProperty(\"status\")"));
        assert!(out.script.contains("props.setProperty(\"normalized\""));
        assert!(out.script.contains("dataContext.getDataCount()"));
        assert!(out.script.contains("dataContext.storeStream(is, props);"));
        assert!(!out.script.contains("getCursor"));
        assert_eq!(out.removed_imports.len(), 3);
        assert!(out.warnings.is_empty(), "warnings: {:?}", out.warnings);
        assert_eq!(out.confidence, 100);
        assert_eq!(out.tier, AutomationTier::Auto);
    }

    #[test]
    fn boilerplate_is_stripped() {
        let out = transpile(SIMPLE_SERVICE);
        assert!(!out.script.contains("public final class"));
        assert!(!out.script.contains("throws ServiceException"));
    }

    #[test]
    fn collection_idioms_rewritten() {
        let src = "List items = new ArrayList<String>();\nitems.add(name);\nMap index = new HashMap<>();\nindex.put(key, value);";
        let out = transpile(src);
        assert!(out.script.contains("List items = [];"));
        assert!(out.script.contains("items << name;"));
        assert!(out.script.contains("Map index = [:];"));
        assert!(out.script.contains("index[key] = value;"));
    }

    #[test]
    fn null_coalescing_requires_matching_variable() {
        let out = transpile("String v = name != null ? name : \"unknown\";");
        assert!(out.script.contains("name ?: \"unknown\""));

        let out = transpile("String v = name != null ? other : \"unknown\";");
        assert!(out.script.contains("name != null ? other"));
    }

    #[test]
    fn numeric_parsing_rewritten() {
        let out = transpile("int n = Integer.parseInt(raw);");
        assert!(out.script.contains("raw.toInteger()"));
    }

    #[test]
    fn residual_platform_api_costs_fifteen() {
        let src = "IDataUtil.merge(a, b);"; // no rewrite rule covers merge
        let out = transpile(src);
        // IDataUtil and its IData substring both match.
        assert!(!out.warnings.is_empty());
        assert!(out.confidence <= 85);
        assert!(out
            .warnings
            .iter()
            .any(|w| w.contains("IDataUtil")));
    }

    #[test]
    fn review_constructs_cost_five_each() {
        let src = "for (int i = 0; i < n; i++) { total += i; }\ntry { run(); } catch (Exception e) { }";
        let out = transpile(src);
        assert_eq!(out.manual_review_items.len(), 2);
        assert_eq!(out.confidence, 90);
        assert_eq!(out.tier, AutomationTier::Auto);
    }

    #[test]
    fn heavy_residue_drops_to_manual() {
        let src = "IDataCursor c = other.getCursor();\nServerAPI.x(q);\nServiceException e;\nsynchronized (lock) { com.wm.app.b2b.call(); }\nwhile (true) { }";
        let out = transpile(src);
        assert!(out.confidence < 50);
        assert_eq!(out.tier, AutomationTier::Manual);
    }

    #[test]
    fn logging_rewritten() {
        let out = transpile("ServerAPI.logError(msg);\nSystem.out.println(msg);");
        assert!(out.script.contains("logger.severe(msg);"));
        assert!(out.script.contains("println(msg);"));
    }
}
