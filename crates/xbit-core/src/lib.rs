//! # xBIT Core Library
//!
//! A concurrent execution engine for parameter scans in high-energy physics. Every candidate
//! point of a scan is handed to an external simulation binary (a spectrum generator such as
//! SPheno), optionally culled by a cheap likelihood gate, post-processed by a chain of
//! secondary tools and finally classified as valid or invalid depending on whether usable
//! output was produced.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`ParameterPoint`, observables) and
//!   the capabilities the engine consumes: spectrum parsing, input-file writing, external tool
//!   invocation and likelihood evaluation.
//!
//! - **[`engine`]: The Logic Core.** The shared work queue, the per-point pipeline state
//!   machine, the early-stop gate, the worker pool and the result aggregation across workers.
//!
//! - **[`workflows`]: The Public API.** The [`workflows::scan::Runner`] that executes batches
//!   of points and accumulates their outcomes into a run-spanning history.
//!
//! Deciding *which* points to evaluate is deliberately left to the caller.

pub mod core;
pub mod engine;
pub mod workflows;
