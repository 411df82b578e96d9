// src/analyze/sql.rs

//! Structural analysis of SQL embedded in database adapter services.
//!
//! Text in, struct out: the analyzer never executes anything. It detects
//! the operation, extracts tables/columns/joins/filters, derives a
//! complexity rating, and scores how much of the statement the database
//! connector generator can reproduce without human review.

use crate::analyze::pattern::Complexity;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use strum_macros::Display;

static LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"--[^\n]*").unwrap());
static BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static PARAMETER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\?|:\w+").unwrap());
static SUBQUERY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\(\s*SELECT\b").unwrap());
static AGGREGATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(COUNT|SUM|AVG|MIN|MAX)\s*\(").unwrap());
static CONDITION_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(?:AND|OR)\s+").unwrap());

/// Clause keywords that terminate a FROM/ON/WHERE span
const CLAUSE_KEYWORDS: [&str; 11] = [
    "INNER", "LEFT", "RIGHT", "FULL", "CROSS", "JOIN", "WHERE", "GROUP", "ORDER", "HAVING",
    "UNION",
];

/// Statement kind detected from the leading keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SqlOperation {
    Select,
    Insert,
    Update,
    Delete,
    Call,
    Unknown,
}

impl SqlOperation {
    fn base_automation(self) -> i64 {
        match self {
            SqlOperation::Select => 80,
            SqlOperation::Insert => 90,
            SqlOperation::Update => 85,
            SqlOperation::Delete => 88,
            SqlOperation::Call => 75,
            SqlOperation::Unknown => 30,
        }
    }

    /// Target database-connector operation type
    pub fn connector_operation(self) -> &'static str {
        match self {
            SqlOperation::Select => "GET",
            SqlOperation::Insert => "INSERT",
            SqlOperation::Update => "UPDATE",
            SqlOperation::Delete => "DELETE",
            SqlOperation::Call => "STOREDPROCEDURE",
            SqlOperation::Unknown => "DYNAMIC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum ClauseComplexity {
    Simple,
    Moderate,
    Complex,
}

/// One JOIN clause; complexity is derived from the ON condition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Join {
    pub join_type: String,
    pub table: String,
    pub condition: String,
    pub complexity: ClauseComplexity,
}

/// Parsed WHERE clause
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhereClause {
    pub raw: String,
    pub conditions: Vec<String>,
    pub parameter_count: usize,
    pub complexity: ClauseComplexity,
}

/// Database-connector operation settings derived from the statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseOpConfig {
    pub operation: String,
    pub object: String,
    pub parameter_count: usize,
}

/// Full structural analysis of one SQL statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlAnalysis {
    pub operation: SqlOperation,
    pub tables: Vec<String>,
    pub columns: Vec<String>,
    pub joins: Vec<Join>,
    pub where_clause: Option<WhereClause>,
    pub group_by: Vec<String>,
    pub order_by: Vec<String>,
    pub has_subquery: bool,
    pub has_aggregate: bool,
    pub has_union: bool,
    pub complexity: Complexity,
    pub automation_level: u8,
    pub warnings: Vec<String>,
    pub target_config: DatabaseOpConfig,
}

/// Analyze one SQL statement. Pure and total: unrecognized statements come
/// back as `SqlOperation::Unknown` with a floor automation level.
pub fn analyze(sql: &str) -> SqlAnalysis {
    let cleaned = normalize(sql);
    // ASCII-only uppercase: byte offsets found in `upper` index into
    // `cleaned`, and Unicode case mapping can change byte lengths.
    let upper = cleaned.to_ascii_uppercase();

    let operation = detect_operation(&upper);
    let tables = extract_tables(operation, &cleaned, &upper);
    let columns = extract_columns(operation, &cleaned, &upper);
    let joins = extract_joins(&cleaned, &upper);
    let where_clause = extract_where(&cleaned, &upper);
    let group_by = extract_list_clause(&cleaned, &upper, "GROUP BY ");
    let order_by = extract_list_clause(&cleaned, &upper, "ORDER BY ");

    let has_subquery = SUBQUERY.is_match(&cleaned);
    let has_aggregate = AGGREGATE.is_match(&cleaned);
    let has_union = upper.contains(" UNION ");

    let update_with_join = operation == SqlOperation::Update && !joins.is_empty();

    let mut complexity = score_complexity(&joins, &where_clause, has_subquery, has_aggregate, has_union);
    let mut warnings = Vec::new();
    if !joins.is_empty() {
        warnings.push(format!(
            "{} JOIN clause(s) must be re-modeled as connector joins or lookups",
            joins.len()
        ));
    }
    if has_subquery {
        warnings.push("Subquery requires manual conversion review".to_string());
    }
    if has_union {
        warnings.push("UNION results must be merged in the target process".to_string());
    }

    let mut automation = operation.base_automation();
    if update_with_join {
        complexity = Complexity::High;
        automation = 50;
        warnings.push("UPDATE with JOIN requires manual review".to_string());
    } else {
        match complexity {
            Complexity::Low => automation += 5,
            Complexity::Medium => {}
            Complexity::High => automation -= 15,
        }
        automation -= (joins.len() as i64 * 3).min(15);
        if has_subquery {
            automation -= 20;
        }
        if has_aggregate {
            automation -= 5;
        }
    }
    let automation_level = automation.clamp(30, 95) as u8;

    let parameter_count = where_clause
        .as_ref()
        .map(|w| w.parameter_count)
        .unwrap_or_else(|| PARAMETER.find_iter(&cleaned).count());

    SqlAnalysis {
        target_config: DatabaseOpConfig {
            operation: operation.connector_operation().to_string(),
            object: tables.first().cloned().unwrap_or_default(),
            parameter_count,
        },
        operation,
        tables,
        columns,
        joins,
        where_clause,
        group_by,
        order_by,
        has_subquery,
        has_aggregate,
        has_union,
        complexity,
        automation_level,
        warnings,
    }
}

fn normalize(sql: &str) -> String {
    let no_block = BLOCK_COMMENT.replace_all(sql, " ");
    let no_line = LINE_COMMENT.replace_all(&no_block, " ");
    WHITESPACE.replace_all(&no_line, " ").trim().to_string()
}

fn detect_operation(upper: &str) -> SqlOperation {
    let first = upper.split_whitespace().next().unwrap_or_default();
    match first {
        "SELECT" => SqlOperation::Select,
        "INSERT" => SqlOperation::Insert,
        "UPDATE" => SqlOperation::Update,
        "DELETE" => SqlOperation::Delete,
        "CALL" | "EXEC" | "EXECUTE" | "{CALL" => SqlOperation::Call,
        _ => SqlOperation::Unknown,
    }
}

/// Span of `upper` from `start` until the next clause keyword or end
fn until_next_keyword(upper: &str, start: usize) -> usize {
    let mut end = upper.len();
    for kw in CLAUSE_KEYWORDS {
        let pattern = format!(" {kw} ");
        if let Some(pos) = upper[start..].find(&pattern) {
            end = end.min(start + pos);
        }
    }
    end
}

fn extract_tables(operation: SqlOperation, cleaned: &str, upper: &str) -> Vec<String> {
    match operation {
        SqlOperation::Select | SqlOperation::Delete => {
            let Some(pos) = upper.find("FROM ") else {
                return Vec::new();
            };
            let start = pos + "FROM ".len();
            let end = until_next_keyword(upper, start);
            cleaned[start..end]
                .split(',')
                .map(|t| {
                    // "orders o" keeps the table name, drops the alias.
                    t.trim()
                        .split_whitespace()
                        .next()
                        .unwrap_or_default()
                        .to_string()
                })
                .filter(|t| !t.is_empty())
                .collect()
        }
        SqlOperation::Insert => {
            let Some(pos) = upper.find("INTO ") else {
                return Vec::new();
            };
            let start = pos + "INTO ".len();
            cleaned[start..]
                .split([' ', '('])
                .next()
                .map(|t| vec![t.to_string()])
                .unwrap_or_default()
        }
        SqlOperation::Update => cleaned
            .split_whitespace()
            .nth(1)
            .map(|t| vec![t.to_string()])
            .unwrap_or_default(),
        SqlOperation::Call => {
            let name = cleaned
                .trim_start_matches(['{', ' '])
                .split_whitespace()
                .nth(1)
                .unwrap_or_default();
            let name = name.split('(').next().unwrap_or_default();
            if name.is_empty() {
                Vec::new()
            } else {
                vec![name.to_string()]
            }
        }
        SqlOperation::Unknown => Vec::new(),
    }
}

fn extract_columns(operation: SqlOperation, cleaned: &str, upper: &str) -> Vec<String> {
    match operation {
        SqlOperation::Select => {
            let Some(from_pos) = upper.find(" FROM ") else {
                return Vec::new();
            };
            let body = &cleaned["SELECT ".len().min(cleaned.len())..from_pos];
            split_columns(body)
        }
        SqlOperation::Insert => {
            let open = cleaned.find('(');
            let close = open.and_then(|o| cleaned[o..].find(')').map(|c| o + c));
            match (open, close) {
                (Some(open), Some(close)) if close > open + 1 => {
                    split_columns(&cleaned[open + 1..close])
                }
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

/// Comma split that ignores commas inside parentheses, so function calls
/// and subselects stay intact.
fn split_columns(body: &str) -> Vec<String> {
    let mut columns = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in body.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                let col = current.trim();
                if !col.is_empty() {
                    columns.push(col.to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    let col = current.trim();
    if !col.is_empty() {
        columns.push(col.to_string());
    }
    columns
}

fn extract_joins(cleaned: &str, upper: &str) -> Vec<Join> {
    let mut joins = Vec::new();
    let mut search_from = 0;
    while let Some(rel) = upper[search_from..].find(" JOIN ") {
        let join_pos = search_from + rel;
        let after = join_pos + " JOIN ".len();

        // Join type from the immediately preceding keyword(s).
        let before = upper[..join_pos].trim_end();
        let join_type = ["INNER", "LEFT OUTER", "LEFT", "RIGHT OUTER", "RIGHT", "FULL OUTER", "FULL", "CROSS"]
            .iter()
            .find(|t| before.ends_with(*t))
            .copied()
            .unwrap_or("INNER")
            .to_string();

        let table = cleaned[after..]
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();

        let condition = match upper[after..].find(" ON ") {
            Some(on_rel) => {
                let cond_start = after + on_rel + " ON ".len();
                let cond_end = until_next_keyword(upper, cond_start);
                cleaned[cond_start..cond_end].trim().to_string()
            }
            None => String::new(),
        };

        let upper_cond = condition.to_uppercase();
        let complexity = if upper_cond.contains(" OR ") {
            ClauseComplexity::Complex
        } else if upper_cond.matches(" AND ").count() > 2 {
            ClauseComplexity::Moderate
        } else {
            ClauseComplexity::Simple
        };

        joins.push(Join {
            join_type,
            table,
            condition,
            complexity,
        });
        search_from = after;
    }
    joins
}

fn extract_where(cleaned: &str, upper: &str) -> Option<WhereClause> {
    let pos = upper.find(" WHERE ")?;
    let start = pos + " WHERE ".len();
    let end = until_next_keyword(upper, start);
    let raw = cleaned[start..end].trim().to_string();
    if raw.is_empty() {
        return None;
    }

    let conditions: Vec<String> = CONDITION_SPLIT
        .split(&raw)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    let parameter_count = PARAMETER.find_iter(&raw).count();

    let upper_raw = raw.to_uppercase();
    let complexity = if upper_raw.contains("EXISTS")
        || upper_raw.contains("IN (")
        || conditions.len() > 5
    {
        ClauseComplexity::Complex
    } else if upper_raw.contains(" OR ") || conditions.len() > 2 {
        ClauseComplexity::Moderate
    } else {
        ClauseComplexity::Simple
    };

    Some(WhereClause {
        raw,
        conditions,
        parameter_count,
        complexity,
    })
}

fn extract_list_clause(cleaned: &str, upper: &str, keyword: &str) -> Vec<String> {
    let Some(pos) = upper.find(keyword) else {
        return Vec::new();
    };
    let start = pos + keyword.len();
    let end = until_next_keyword(upper, start);
    cleaned[start..end]
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn score_complexity(
    joins: &[Join],
    where_clause: &Option<WhereClause>,
    has_subquery: bool,
    has_aggregate: bool,
    has_union: bool,
) -> Complexity {
    let mut score = 2 * joins.len();
    if has_subquery {
        score += 4;
    }
    if has_aggregate {
        score += 2;
    }
    if has_union {
        score += 3;
    }
    score += match where_clause.as_ref().map(|w| w.complexity) {
        Some(ClauseComplexity::Complex) => 3,
        Some(ClauseComplexity::Moderate) => 1,
        _ => 0,
    };

    if score <= 2 {
        Complexity::Low
    } else if score <= 6 {
        Complexity::Medium
    } else {
        Complexity::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_parameterized_select() {
        let a = analyze("SELECT a FROM t WHERE id = ?");
        assert_eq!(a.operation, SqlOperation::Select);
        assert_eq!(a.tables, vec!["t"]);
        assert_eq!(a.columns, vec!["a"]);
        assert!(a.joins.is_empty());
        assert_eq!(a.where_clause.as_ref().unwrap().parameter_count, 1);
        assert_eq!(a.complexity, Complexity::Low);
        assert!(a.automation_level >= 85);
        assert_eq!(a.target_config.operation, "GET");
        assert_eq!(a.target_config.object, "t");
    }

    #[test]
    fn two_joins_and_subquery_is_high_complexity() {
        let sql = "SELECT o.id, c.name FROM orders o \
                   INNER JOIN customers c ON o.customer_id = c.id \
                   INNER JOIN regions r ON c.region_id = r.id \
                   WHERE o.status IN (SELECT code FROM statuses WHERE active = 1)";
        let a = analyze(sql);
        assert_eq!(a.joins.len(), 2);
        assert!(a.has_subquery);
        assert_eq!(a.complexity, Complexity::High);
        assert!(a.automation_level < 60);
        assert!(a
            .warnings
            .iter()
            .any(|w| w.to_lowercase().contains("subquery")));
    }

    #[test]
    fn join_metadata_extracted() {
        let sql = "SELECT * FROM a LEFT OUTER JOIN b ON a.x = b.x AND a.y = b.y WHERE a.z = 1";
        let a = analyze(sql);
        assert_eq!(a.joins.len(), 1);
        let join = &a.joins[0];
        assert_eq!(join.join_type, "LEFT OUTER");
        assert_eq!(join.table, "b");
        assert!(join.condition.contains("a.x = b.x"));
        assert_eq!(join.complexity, ClauseComplexity::Simple);
    }

    #[test]
    fn or_in_join_condition_is_complex() {
        let sql = "SELECT * FROM a JOIN b ON a.x = b.x OR a.y = b.y";
        let a = analyze(sql);
        assert_eq!(a.joins[0].complexity, ClauseComplexity::Complex);
    }

    #[test]
    fn update_with_join_forces_manual_review() {
        let sql = "UPDATE orders o INNER JOIN customers c ON o.cid = c.id SET o.region = c.region";
        let a = analyze(sql);
        assert_eq!(a.operation, SqlOperation::Update);
        assert_eq!(a.complexity, Complexity::High);
        assert_eq!(a.automation_level, 50);
        assert!(a.warnings.iter().any(|w| w.contains("UPDATE with JOIN")));
    }

    #[test]
    fn insert_columns_and_table() {
        let a = analyze("INSERT INTO audit_log (event, actor, at) VALUES (?, ?, ?)");
        assert_eq!(a.operation, SqlOperation::Insert);
        assert_eq!(a.tables, vec!["audit_log"]);
        assert_eq!(a.columns, vec!["event", "actor", "at"]);
        assert_eq!(a.target_config.operation, "INSERT");
        // Base 90 + 5 for low complexity, capped below 95.
        assert_eq!(a.automation_level, 95);
    }

    #[test]
    fn call_statement_extracts_procedure() {
        let a = analyze("CALL sync_inventory(?, ?)");
        assert_eq!(a.operation, SqlOperation::Call);
        assert_eq!(a.tables, vec!["sync_inventory"]);
        assert_eq!(a.target_config.operation, "STOREDPROCEDURE");
    }

    #[test]
    fn comments_are_stripped() {
        let sql = "-- fetch one row\nSELECT a /* projected */ FROM t";
        let a = analyze(sql);
        assert_eq!(a.operation, SqlOperation::Select);
        assert_eq!(a.tables, vec!["t"]);
        assert_eq!(a.columns, vec!["a"]);
    }

    #[test]
    fn paren_aware_column_split() {
        let a = analyze("SELECT COALESCE(a, b), MAX(c) FROM t GROUP BY d");
        assert_eq!(a.columns, vec!["COALESCE(a, b)", "MAX(c)"]);
        assert!(a.has_aggregate);
        assert_eq!(a.group_by, vec!["d"]);
    }

    #[test]
    fn named_parameters_counted() {
        let a = analyze("SELECT a FROM t WHERE x = :from_date AND y = :to_date");
        assert_eq!(a.where_clause.as_ref().unwrap().parameter_count, 2);
    }

    #[test]
    fn where_complexity_escalation() {
        let simple = analyze("SELECT a FROM t WHERE x = 1 AND y = 2");
        assert_eq!(
            simple.where_clause.as_ref().unwrap().complexity,
            ClauseComplexity::Simple
        );

        let moderate = analyze("SELECT a FROM t WHERE x = 1 OR y = 2");
        assert_eq!(
            moderate.where_clause.as_ref().unwrap().complexity,
            ClauseComplexity::Moderate
        );

        let complex = analyze("SELECT a FROM t WHERE EXISTS (SELECT 1 FROM u WHERE u.t = t.id)");
        assert_eq!(
            complex.where_clause.as_ref().unwrap().complexity,
            ClauseComplexity::Complex
        );
    }

    #[test]
    fn unrecognized_statement_floors_automation() {
        let a = analyze("TRUNCATE TABLE t");
        assert_eq!(a.operation, SqlOperation::Unknown);
        assert_eq!(a.automation_level, 35);
        assert_eq!(a.target_config.operation, "DYNAMIC");
    }

    #[test]
    fn non_ascii_literals_survive_clause_extraction() {
        // Characters whose uppercase form grows in byte length must not
        // derail the byte offsets used for clause slicing.
        let a = analyze("SELECT a FROM t WHERE name = 'ΐΐΐ' ORDER BY a");
        assert_eq!(a.operation, SqlOperation::Select);
        assert_eq!(a.tables, vec!["t"]);
        let where_clause = a.where_clause.unwrap();
        assert!(where_clause.raw.contains('ΐ'));
        assert_eq!(a.order_by, vec!["a"]);

        let b = analyze("SELECT a FROM t WHERE city = 'straße' AND id = ?");
        assert_eq!(b.where_clause.unwrap().parameter_count, 1);
    }
}
