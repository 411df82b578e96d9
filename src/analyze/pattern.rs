// src/analyze/pattern.rs

//! Integration pattern recognition.
//!
//! Classifies one service's flow into known integration shapes. Every
//! pattern in the catalog has an independent scorer that adds weighted
//! increments for matched signals; the engine scores all of them, discards
//! weak matches, and ranks the rest. This never fails: when no pattern
//! clears the primary threshold a generic estimator supplies the automation
//! level instead.

use crate::ir::flow::{count_verbs, max_depth, total_steps};
use crate::ir::model::{FlowVerb, Invocation, Service, ADAPTER_KINDS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::{Display, EnumIter};

/// Matches at or below this confidence are discarded
const MATCH_FLOOR: f64 = 0.3;

/// A match above this confidence becomes the primary pattern
const PRIMARY_THRESHOLD: f64 = 0.5;

/// Builtin namespaces whose presence indicates data transformation
const TRANSFORM_NAMESPACES: [&str; 5] =
    ["pub.document", "pub.string", "pub.xml", "pub.json", "pub.list"];

/// The closed pattern catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Display, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum PatternTag {
    FetchTransformSend,
    DatabaseToFile,
    FileToDatabase,
    ApiToApi,
    BatchProcessor,
    SplitterAggregator,
    ContentRouter,
    TryCatchWrapper,
    SimpleTransform,
    Validation,
    LookupEnrichment,
    Unknown,
}

impl PatternTag {
    /// Fixed automation estimate used when this pattern is primary
    pub fn automation_level(self) -> u8 {
        match self {
            PatternTag::FetchTransformSend => 85,
            PatternTag::DatabaseToFile => 88,
            PatternTag::FileToDatabase => 85,
            PatternTag::ApiToApi => 82,
            PatternTag::BatchProcessor => 80,
            PatternTag::SplitterAggregator => 75,
            PatternTag::ContentRouter => 85,
            PatternTag::TryCatchWrapper => 95,
            PatternTag::SimpleTransform => 90,
            PatternTag::Validation => 88,
            PatternTag::LookupEnrichment => 85,
            PatternTag::Unknown => 0,
        }
    }

    /// Human-readable conversion guidance shown in the report
    pub fn conversion_notes(self) -> Vec<String> {
        let notes: &[&str] = match self {
            PatternTag::FetchTransformSend => &[
                "Maps to a connector-map-connector process chain",
                "Verify source and target connector operation settings",
            ],
            PatternTag::DatabaseToFile => &[
                "Database query feeds a flat-file or disk write",
                "Confirm file naming and directory settings on the target connector",
            ],
            PatternTag::FileToDatabase => &[
                "File read feeds database writes",
                "Review batch commit sizing on the database operation",
            ],
            PatternTag::ApiToApi => &[
                "HTTP-to-HTTP bridge with payload transformation",
                "Re-create authentication settings on both connections",
            ],
            PatternTag::BatchProcessor => &[
                "Loop body becomes a per-document process path",
                "Target platform iterates documents implicitly; remove explicit loop counters",
            ],
            PatternTag::SplitterAggregator => &[
                "Split and re-aggregate requires flow control shapes",
            ],
            PatternTag::ContentRouter => &[
                "Branch arms become labeled decision paths",
                "Each route terminates in its own end shape",
            ],
            PatternTag::TryCatchWrapper => &[
                "Try/catch wrapper maps to the process-level error path",
            ],
            PatternTag::SimpleTransform => &["Single map shape between profiles"],
            PatternTag::Validation => &["Validation steps map to business rules shapes"],
            PatternTag::LookupEnrichment => &[
                "Lookup results merge into the main document via a map function",
            ],
            PatternTag::Unknown => &[],
        };
        notes.iter().map(|n| (*n).to_string()).collect()
    }
}

/// One scored pattern match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternMatch {
    pub pattern: PatternTag,
    pub confidence: f64,
    pub automation_level: u8,
    pub notes: Vec<String>,
}

/// Structural complexity rating used in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// Signals extracted from one service's IR; the scorers read only this.
#[derive(Debug, Clone, Default)]
pub struct FlowSignals {
    pub verb_counts: HashMap<FlowVerb, usize>,
    pub total_steps: usize,
    pub max_depth: usize,
    pub builtin_calls: u32,
    pub custom_calls: u32,
    pub transform_calls: u32,
    pub flatfile_calls: u32,
    pub serialization_calls: u32,
    pub adapter_kinds: Vec<String>,
}

impl FlowSignals {
    pub fn from_service(service: &Service) -> Self {
        let (verb_counts, steps_total, depth) = match &service.flow {
            Some(tree) => (
                count_verbs(&tree.steps),
                total_steps(&tree.steps),
                max_depth(&tree.steps),
            ),
            None => (HashMap::new(), 0, 0),
        };

        let mut signals = FlowSignals {
            verb_counts,
            total_steps: steps_total,
            max_depth: depth,
            adapter_kinds: service.adapter_kinds(),
            ..Default::default()
        };
        for inv in &service.invocations {
            signals.add_invocation(inv);
        }
        signals
    }

    fn add_invocation(&mut self, inv: &Invocation) {
        let qualified = inv.qualified_name();
        if inv.is_builtin() {
            self.builtin_calls += inv.call_count;
            if TRANSFORM_NAMESPACES.iter().any(|ns| qualified.starts_with(ns)) {
                self.transform_calls += inv.call_count;
            }
            if qualified.to_lowercase().contains("flatfile") {
                self.flatfile_calls += inv.call_count;
            }
            if qualified.starts_with("pub.json") || qualified.starts_with("pub.xml") {
                self.serialization_calls += inv.call_count;
            }
        } else {
            self.custom_calls += inv.call_count;
        }
    }

    fn verb(&self, verb: FlowVerb) -> usize {
        self.verb_counts.get(&verb).copied().unwrap_or(0)
    }

    fn has_adapter(&self, kinds: &[&str]) -> bool {
        self.adapter_kinds
            .iter()
            .any(|k| kinds.iter().any(|c| k == c))
    }

    fn complex_verbs(&self) -> usize {
        self.verb_counts
            .iter()
            .filter(|(v, _)| v.is_complex())
            .map(|(_, n)| n)
            .sum()
    }
}

/// Full analysis of one service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowAnalysis {
    pub matches: Vec<PatternMatch>,
    pub primary: Option<PatternTag>,
    pub automation_level: u8,
    pub complexity: Complexity,
    pub notes: Vec<String>,
}

/// Analyze one service's flow shape. Total function: always produces at
/// least a generic estimate.
pub fn analyze(service: &Service) -> FlowAnalysis {
    analyze_signals(&FlowSignals::from_service(service))
}

pub fn analyze_signals(signals: &FlowSignals) -> FlowAnalysis {
    let mut matches: Vec<PatternMatch> = scorers()
        .into_iter()
        .filter_map(|(pattern, scorer)| {
            let confidence = scorer(signals).min(1.0);
            (confidence > MATCH_FLOOR).then(|| PatternMatch {
                pattern,
                confidence,
                automation_level: pattern.automation_level(),
                notes: pattern.conversion_notes(),
            })
        })
        .collect();
    matches.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let primary = matches
        .first()
        .filter(|m| m.confidence > PRIMARY_THRESHOLD)
        .map(|m| m.pattern);

    let (automation_level, notes) = match primary {
        Some(pattern) => (pattern.automation_level(), pattern.conversion_notes()),
        None => (generic_estimate(signals), Vec::new()),
    };

    FlowAnalysis {
        matches,
        primary,
        automation_level,
        complexity: complexity(signals),
        notes,
    }
}

type Scorer = fn(&FlowSignals) -> f64;

/// The pattern catalog: each entry is an independent pure scorer.
fn scorers() -> Vec<(PatternTag, Scorer)> {
    vec![
        (PatternTag::FetchTransformSend, score_fetch_transform_send),
        (PatternTag::DatabaseToFile, score_database_to_file),
        (PatternTag::FileToDatabase, score_file_to_database),
        (PatternTag::ApiToApi, score_api_to_api),
        (PatternTag::BatchProcessor, score_batch_processor),
        (PatternTag::TryCatchWrapper, score_try_catch_wrapper),
        (PatternTag::SimpleTransform, score_simple_transform),
        (PatternTag::ContentRouter, score_content_router),
    ]
}

fn score_fetch_transform_send(s: &FlowSignals) -> f64 {
    let mut confidence = 0.0;
    if s.has_adapter(&["jdbc", "http", "ftp", "sftp", "file", "jms"]) {
        confidence += 0.3;
    }
    if s.verb(FlowVerb::Map) > 0 {
        confidence += 0.3;
    }
    if s.transform_calls > 0 {
        confidence += 0.2;
    }
    if s.adapter_kinds.len() >= 2 {
        confidence += 0.2;
    }
    confidence
}

fn score_database_to_file(s: &FlowSignals) -> f64 {
    let mut confidence = 0.0;
    if s.has_adapter(&["jdbc"]) {
        confidence += 0.4;
    }
    if s.has_adapter(&["file", "ftp", "sftp"]) {
        confidence += 0.3;
    }
    if s.flatfile_calls > 0 {
        confidence += 0.3;
    }
    confidence
}

fn score_file_to_database(s: &FlowSignals) -> f64 {
    let mut confidence = 0.0;
    if s.has_adapter(&["file", "ftp", "sftp"]) {
        confidence += 0.4;
    }
    if s.has_adapter(&["jdbc"]) {
        confidence += 0.3;
    }
    if s.flatfile_calls > 0 {
        confidence += 0.3;
    }
    confidence
}

fn score_api_to_api(s: &FlowSignals) -> f64 {
    let mut confidence = 0.0;
    if s.has_adapter(&["http", "soap", "rest"]) {
        confidence += 0.4;
    }
    if s.verb(FlowVerb::Map) > 0 {
        confidence += 0.3;
    }
    if s.serialization_calls > 0 {
        confidence += 0.3;
    }
    confidence
}

fn score_batch_processor(s: &FlowSignals) -> f64 {
    let mut confidence = 0.0;
    if s.verb(FlowVerb::Loop) > 0 {
        confidence += 0.5;
    }
    if s.total_steps > 3 {
        confidence += 0.2;
    }
    if s.builtin_calls > 0 && s.transform_calls > 0 {
        confidence += 0.3;
    }
    confidence
}

fn score_try_catch_wrapper(s: &FlowSignals) -> f64 {
    let mut confidence = 0.0;
    if s.verb(FlowVerb::Sequence) > 0 {
        confidence += 0.3;
    }
    if s.verb(FlowVerb::Try) > 0 {
        confidence += 0.4;
    }
    if s.verb(FlowVerb::Catch) > 0 {
        confidence += 0.3;
    }
    confidence
}

fn score_simple_transform(s: &FlowSignals) -> f64 {
    let mut confidence = 0.0;
    if s.verb(FlowVerb::Map) > 0 {
        confidence += 0.4;
    }
    if s.total_steps > 0 && s.total_steps <= 5 {
        confidence += 0.3;
    }
    if s.adapter_kinds.is_empty() {
        confidence += 0.3;
    }
    confidence
}

fn score_content_router(s: &FlowSignals) -> f64 {
    let mut confidence = 0.0;
    if s.verb(FlowVerb::Branch) > 0 {
        confidence += 0.5;
    }
    if s.verb(FlowVerb::Branch) >= 2 {
        confidence += 0.3;
    }
    confidence
}

/// Fallback automation estimate when no pattern is primary
fn generic_estimate(s: &FlowSignals) -> u8 {
    let standard_adapters = s
        .adapter_kinds
        .iter()
        .filter(|k| ADAPTER_KINDS.iter().any(|a| k.as_str() == *a))
        .count() as i64;

    let mut level: i64 = 70;
    level += (s.builtin_calls as i64).min(10);
    level -= (s.custom_calls as i64 * 5).min(20);
    level += (standard_adapters * 3).min(10);
    level -= (s.complex_verbs() as i64 * 2).min(10);
    level.clamp(40, 95) as u8
}

/// Structural complexity from step and invocation volume
fn complexity(s: &FlowSignals) -> Complexity {
    let calls = (s.builtin_calls + s.custom_calls) as usize;
    let score = s.total_steps + 2 * calls;
    if score < 10 {
        Complexity::Low
    } else if score < 30 {
        Complexity::Medium
    } else {
        Complexity::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals() -> FlowSignals {
        FlowSignals::default()
    }

    #[test]
    fn jdbc_http_map_flow_matches_fetch_transform_send() {
        let mut s = signals();
        s.verb_counts.insert(FlowVerb::Map, 2);
        s.verb_counts.insert(FlowVerb::Sequence, 1);
        s.total_steps = 3;
        s.adapter_kinds = vec!["jdbc".to_string(), "http".to_string()];
        s.builtin_calls = 3;
        s.transform_calls = 2;

        let analysis = analyze_signals(&s);
        let top = &analysis.matches[0];
        assert!(top.confidence >= 0.6);
        assert!(matches!(
            top.pattern,
            PatternTag::FetchTransformSend | PatternTag::DatabaseToFile
        ));
        assert_eq!(analysis.primary, Some(top.pattern));
    }

    #[test]
    fn branch_heavy_flow_is_content_router() {
        let mut s = signals();
        s.verb_counts.insert(FlowVerb::Branch, 2);
        s.total_steps = 2;

        let analysis = analyze_signals(&s);
        assert_eq!(analysis.primary, Some(PatternTag::ContentRouter));
        assert_eq!(analysis.automation_level, 85);
        assert!(!analysis.notes.is_empty());
    }

    #[test]
    fn try_catch_sequence_scores_full_confidence() {
        let mut s = signals();
        s.verb_counts.insert(FlowVerb::Sequence, 3);
        s.verb_counts.insert(FlowVerb::Try, 1);
        s.verb_counts.insert(FlowVerb::Catch, 1);
        s.total_steps = 5;

        let analysis = analyze_signals(&s);
        assert_eq!(analysis.primary, Some(PatternTag::TryCatchWrapper));
        let m = analysis
            .matches
            .iter()
            .find(|m| m.pattern == PatternTag::TryCatchWrapper)
            .unwrap();
        assert!((m.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn small_map_only_flow_is_simple_transform() {
        let mut s = signals();
        s.verb_counts.insert(FlowVerb::Map, 1);
        s.total_steps = 1;

        let analysis = analyze_signals(&s);
        assert_eq!(analysis.primary, Some(PatternTag::SimpleTransform));
        assert_eq!(analysis.automation_level, 90);
    }

    #[test]
    fn weak_matches_are_discarded() {
        let mut s = signals();
        // Only the 0.3 "sequence present" signal for try/catch: at the
        // floor, not above it.
        s.verb_counts.insert(FlowVerb::Sequence, 1);
        s.total_steps = 1;

        let analysis = analyze_signals(&s);
        assert!(analysis
            .matches
            .iter()
            .all(|m| m.pattern != PatternTag::TryCatchWrapper));
    }

    #[test]
    fn no_primary_falls_back_to_generic_estimate() {
        let mut s = signals();
        s.verb_counts.insert(FlowVerb::Sequence, 6);
        s.verb_counts.insert(FlowVerb::Branch, 1);
        s.total_steps = 7;
        s.custom_calls = 2;
        s.builtin_calls = 4;
        s.adapter_kinds = vec!["sap".to_string()];

        let analysis = analyze_signals(&s);
        // content_router only reaches 0.5, no primary.
        assert_eq!(analysis.primary, None);
        // 70 + 4 - 10 + 3 - 2 = 65
        assert_eq!(analysis.automation_level, 65);
    }

    #[test]
    fn generic_estimate_is_clamped_and_capped() {
        // Heavy custom-call and complex-verb penalties bottom out at 40.
        let mut s = signals();
        s.custom_calls = 50;
        s.verb_counts.insert(FlowVerb::Repeat, 20);
        s.total_steps = 20;
        let analysis = analyze_signals(&s);
        assert_eq!(analysis.primary, None);
        assert_eq!(analysis.automation_level, 40);

        // Builtin-call bonus caps at +10.
        let mut s = signals();
        s.builtin_calls = 90;
        s.verb_counts.insert(FlowVerb::Sequence, 7);
        s.total_steps = 7;
        let analysis = analyze_signals(&s);
        assert_eq!(analysis.primary, None);
        assert_eq!(analysis.automation_level, 80);
    }

    #[test]
    fn complexity_thresholds() {
        let mut s = signals();
        s.total_steps = 3;
        assert_eq!(analyze_signals(&s).complexity, Complexity::Low);
        s.total_steps = 12;
        assert_eq!(analyze_signals(&s).complexity, Complexity::Medium);
        s.builtin_calls = 15;
        assert_eq!(analyze_signals(&s).complexity, Complexity::High);
    }
}
