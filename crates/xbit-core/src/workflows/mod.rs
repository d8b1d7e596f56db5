//! # Workflows Module
//!
//! High-level entry points that drive the engine for a complete scan.
//!
//! ## Overview
//!
//! A scan strategy proposes points in batches. The [`scan::Runner`] owns the per-worker
//! directories and the worker pool for the lifetime of a run, executes each batch to
//! completion and accumulates the results in a
//! [`RunHistory`](crate::engine::aggregator::RunHistory) that later batches can build on.
//!
//! ## Architecture
//!
//! - **Scan Workflow** ([`scan`]) - Batch execution, progress reporting and result history

pub mod scan;
