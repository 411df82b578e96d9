// src/ir/mod.rs

//! Intermediate representation of source packages.
//!
//! `builder` walks an extracted package tree and produces the normalized
//! [`model::Package`] consumed by everything downstream; `flow`, `document`,
//! and `manifest` parse the individual unit formats.

pub mod builder;
pub mod document;
pub mod flow;
pub mod manifest;
pub mod model;
pub mod xml;

pub use builder::parse_package;
pub use model::{
    AdapterConfig, BranchCase, Document, EdiSchema, EdiStandard, Field, FlowStep, FlowTree,
    FlowVerb, Invocation, LoopSpec, Manifest, MapTransform, Package, ParseFailure, Service,
    ServiceKind,
};
