// src/lib.rs

//! flowport: webMethods-to-Boomi package migration
//!
//! Converts extracted webMethods integration packages into Boomi-style
//! component XML: flow services become processes, document types become
//! profiles, adapter services become connectors, and embedded Java
//! services become Groovy data-process scripts.
//!
//! # Architecture
//!
//! - Decode: tolerant text recovery from mixed-encoding descriptors
//! - IR: one normalized model for services, documents, and flow trees
//! - Analyze: integration-pattern scoring and SQL statement analysis
//! - Transpile: rule-based Java-to-Groovy rewriting
//! - Generate: component XML emission with per-document element keys
//! - Orchestrate: parallel batch conversion, reporting, and upload

pub mod analyze;
pub mod config;
pub mod decode;
mod error;
pub mod generate;
pub mod ir;
pub mod orchestrate;
pub mod transpile;

pub use error::{Error, Result};
pub use generate::{ComponentStatus, GeneratedComponent, TargetKind};
pub use ir::model::{Document, FlowVerb, Package, Service, ServiceKind};
pub use orchestrate::report::PackageReport;
pub use orchestrate::{convert_package, ConversionResult};
