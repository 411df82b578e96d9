// src/orchestrate/report.rs

//! Migration report aggregation.
//!
//! Rolls the per-component results into the numbers a migration team plans
//! around: automation tiers, estimated manual effort, a suggested migration
//! order, and the issues that need eyes first.

use crate::generate::{ComponentStatus, GeneratedComponent, TargetKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Automation tier boundaries
const AUTO_TIER_FLOOR: u8 = 80;
const SEMI_TIER_FLOOR: u8 = 50;

/// Cap on the critical-issue list; everything else stays in the
/// per-component records.
const MAX_CRITICAL_ISSUES: usize = 10;

/// Base manual hours per component kind at full automation shortfall
fn base_manual_hours(kind: TargetKind) -> f64 {
    match kind {
        TargetKind::Process => 16.0,
        TargetKind::DataProcess => 12.0,
        TargetKind::Map => 8.0,
        TargetKind::Connector => 6.0,
        TargetKind::EdiProfile => 8.0,
        TargetKind::ProfileXml | TargetKind::ProfileJson | TargetKind::ProfileFlat => 4.0,
    }
}

/// Hours per listed manual-review item
const HOURS_PER_REVIEW_ITEM: f64 = 0.5;

/// Summary counts by conversion outcome
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    pub converted: usize,
    pub converted_with_warnings: usize,
    pub failed: usize,
}

/// Component counts by automation tier
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TierCounts {
    /// 80% and above
    pub automatic: usize,
    /// 50% to 79%
    pub semi_automatic: usize,
    /// below 50%
    pub manual: usize,
}

/// One entry in the suggested migration order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationEntry {
    pub name: String,
    pub target_kind: TargetKind,
    pub automation_level: u8,
}

/// Full package migration report; serializes to the JSON artifact the
/// convert command writes next to the generated components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageReport {
    pub package_name: String,
    pub generated_at: DateTime<Utc>,
    pub component_count: usize,
    pub status: StatusCounts,
    pub tiers: TierCounts,
    /// Mean automation level per component kind
    pub automation_by_kind: BTreeMap<String, u8>,
    pub overall_automation: u8,
    /// Estimated hands-on effort to finish the migration
    pub estimated_manual_hours: f64,
    /// Components ordered easiest-first for the migration team
    pub migration_order: Vec<MigrationEntry>,
    /// Highest-priority issues, capped; see per-component records for all
    pub critical_issues: Vec<String>,
    /// Parse failures recorded while reading the source package
    pub parse_failures: Vec<String>,
}

impl PackageReport {
    pub fn build(
        package_name: &str,
        components: &[GeneratedComponent],
        parse_failures: Vec<String>,
    ) -> Self {
        let mut status = StatusCounts::default();
        let mut tiers = TierCounts::default();
        let mut by_kind: BTreeMap<String, (u64, usize)> = BTreeMap::new();
        let mut manual_hours = 0.0;
        let mut critical_issues = Vec::new();

        for component in components {
            match component.status {
                ComponentStatus::Converted => status.converted += 1,
                ComponentStatus::ConvertedWithWarnings => status.converted_with_warnings += 1,
                ComponentStatus::Failed => status.failed += 1,
            }

            match component.automation_level {
                level if level >= AUTO_TIER_FLOOR => tiers.automatic += 1,
                level if level >= SEMI_TIER_FLOOR => tiers.semi_automatic += 1,
                _ => tiers.manual += 1,
            }

            let entry = by_kind
                .entry(component.target_kind.to_string())
                .or_insert((0, 0));
            entry.0 += u64::from(component.automation_level);
            entry.1 += 1;

            // Effort: the automation shortfall scales the per-kind base,
            // and every review item adds a fixed slice.
            let shortfall = f64::from(100 - component.automation_level.min(100)) / 100.0;
            manual_hours += base_manual_hours(component.target_kind) * shortfall;
            manual_hours += component.manual_review_items.len() as f64 * HOURS_PER_REVIEW_ITEM;

            if component.status == ComponentStatus::Failed {
                for warning in &component.warnings {
                    critical_issues.push(format!("{}: {}", component.name, warning));
                }
            } else if component.automation_level < SEMI_TIER_FLOOR {
                critical_issues.push(format!(
                    "{}: automation {}%, needs a manual migration plan",
                    component.name, component.automation_level
                ));
            }
        }
        critical_issues.truncate(MAX_CRITICAL_ISSUES);

        let automation_by_kind = by_kind
            .into_iter()
            .map(|(kind, (sum, n))| (kind, (sum / n as u64) as u8))
            .collect();

        let overall_automation = if components.is_empty() {
            0
        } else {
            let sum: u64 = components
                .iter()
                .map(|c| u64::from(c.automation_level))
                .sum();
            (sum / components.len() as u64) as u8
        };

        let mut migration_order: Vec<MigrationEntry> = components
            .iter()
            .map(|c| MigrationEntry {
                name: c.name.clone(),
                target_kind: c.target_kind,
                automation_level: c.automation_level,
            })
            .collect();
        migration_order.sort_by(|a, b| {
            b.automation_level
                .cmp(&a.automation_level)
                .then_with(|| a.name.cmp(&b.name))
        });

        PackageReport {
            package_name: package_name.to_string(),
            generated_at: Utc::now(),
            component_count: components.len(),
            status,
            tiers,
            automation_by_kind,
            overall_automation,
            estimated_manual_hours: (manual_hours * 10.0).round() / 10.0,
            migration_order,
            critical_issues,
            parse_failures,
        }
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::Error::Generation(format!("serialize report: {e}")))
    }
}
