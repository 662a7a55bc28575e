//! Rubric model, scoring, aggregation and merging.
//!
//! This crate defines the declarative rubric model, the scoring strategies
//! that evaluate a rubric dimension against an artifact, and the aggregation
//! of dimension results into a graded report. Filesystem access and the
//! capability probes live behind the traits in [`traits`].

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod merge;
pub mod model;
pub mod parser;
pub mod recommend;
pub mod report;
pub mod results;
pub mod rubric;
pub mod scoring;
pub mod traits;
