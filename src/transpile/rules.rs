// src/transpile/rules.rs

//! Rewrite rule tables for the Java-to-Groovy transpiler.
//!
//! Rules are applied in table order: pipeline-data idioms first, then
//! strings, numerics, collections, logging, and exceptions. Each rule is a
//! compiled regex plus a replacement template; a few need capture
//! inspection and live as closures in the transpiler itself.

use regex::Regex;
use std::sync::LazyLock;

pub struct Rule {
    pub pattern: Regex,
    pub replacement: &'static str,
}

macro_rules! rules {
    ($(($pat:expr, $rep:expr)),+ $(,)?) => {
        vec![$(Rule { pattern: Regex::new($pat).unwrap(), replacement: $rep }),+]
    };
}

/// Idiom translation table, applied in order
pub static REWRITES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    rules![
        // Pipeline data access: cursor plumbing disappears, reads and
        // writes go through the document properties instead.
        (r"IDataCursor\s+\w+\s*=\s*pipeline\.getCursor\(\)\s*;?", ""),
        (r"\w+\.destroy\(\)\s*;?", ""),
        (
            r#"IDataUtil\.getString\(\s*\w+\s*,\s*"([^"]+)"\s*\)"#,
            r#"props.getProperty("$1")"#
        ),
        (
            r#"IDataUtil\.get\(\s*\w+\s*,\s*"([^"]+)"\s*\)"#,
            r#"props.getProperty("$1")"#
        ),
        (
            r#"IDataUtil\.put\(\s*\w+\s*,\s*"([^"]+)"\s*,\s*([^;]+?)\)\s*;"#,
            r#"props.setProperty("$1", String.valueOf($2));"#
        ),
        // String operations
        (r"(\w+)\.equalsIgnoreCase\(([^)]+)\)", "$1.toLowerCase() == $2.toLowerCase()"),
        (r"(\w+)\.equals\(([^)]+)\)", "$1 == $2"),
        (r"\.length\(\)", ".size()"),
        // Date and numeric conversions
        (r"System\.currentTimeMillis\(\)", "new Date().time"),
        (r"Integer\.parseInt\(([^)]+)\)", "$1.toInteger()"),
        (r"Double\.parseDouble\(([^)]+)\)", "$1.toDouble()"),
        (r"Long\.parseLong\(([^)]+)\)", "$1.toLong()"),
        (r"Boolean\.parseBoolean\(([^)]+)\)", "$1.toBoolean()"),
        // Collection literals and operations
        (r"new\s+ArrayList<[^>]*>\s*\(\)", "[]"),
        (r"new\s+ArrayList\s*\(\)", "[]"),
        (r"new\s+HashMap<[^>]*>\s*\(\)", "[:]"),
        (r"new\s+HashMap\s*\(\)", "[:]"),
        (r"(\w+)\.add\(([^;]+?)\)\s*;", "$1 << $2;"),
        (r"(\w+)\.put\(([^,]+),\s*([^;]+?)\)\s*;", "$1[$2] = $3;"),
        // Logging
        (r"System\.out\.println\(", "println("),
        (r"ServerAPI\.logError\(([^;]+?)\)\s*;", "logger.severe($1);"),
        (r"ServerAPI\.log\w*\(([^;]+?)\)\s*;", "logger.info($1);"),
        // Exceptions
        (r"throw\s+new\s+ServiceException\(", "throw new Exception("),
    ]
});

/// Null-coalescing ternary: `x != null ? x : fallback`. Needs a capture
/// equality check, so the replacement happens in code.
pub static NULL_COALESCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s*!=\s*null\s*\?\s*(\w+)\s*:\s*([^;,)]+)").unwrap());

/// Class and service-method boilerplate to strip, leaving only the body
pub static CLASS_BOILERPLATE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"public\s+(?:final\s+)?class\s+\w+[^{]*\{").unwrap(),
        Regex::new(r"public\s+static\s+(?:final\s+)?void\s+\w+\s*\(\s*IData\s+\w+\s*\)[^{]*\{")
            .unwrap(),
        Regex::new(r"static\s*\{[^}]*\}").unwrap(),
    ]
});

/// Platform APIs that must not survive transpilation; each residual
/// reference is a warning.
pub const DISALLOWED_APIS: [&str; 6] = [
    "IDataUtil",
    "IDataCursor",
    "IData",
    "ServiceException",
    "ServerAPI",
    "com.wm.",
];

/// Constructs that convert mechanically but still need human judgment
pub static REVIEW_CONSTRUCTS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        ("explicit loop", Regex::new(r"\b(?:for|while)\s*\(").unwrap()),
        ("synchronization", Regex::new(r"\bsynchronized\b").unwrap()),
        ("exception handling", Regex::new(r"\btry\s*\{").unwrap()),
    ]
});

/// Import prefixes belonging to the source platform; dropped with a note
pub const PLATFORM_IMPORT_PREFIXES: [&str; 2] = ["com.wm.", "com.softwareag."];
