//! # Engine Module
//!
//! The concurrent point-execution engine of xBIT.
//!
//! ## Overview
//!
//! A batch of parameter points is loaded into a shared [`queue::WorkQueue`]. A
//! [`pool::WorkerPool`] of `cores` workers drains it; every worker pushes each point it pops
//! through the [`pipeline::PointPipeline`] (write input, run the primary tool, optional
//! [`gate`] check, run the secondary tools, persist, classify) and records the resulting
//! [`pipeline::Outcome`] in a shared [`aggregator::ResultAggregator`].
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Scan settings, record modes and the queue error policy
//! - **Scan Types** ([`scan_type`]) - The closed registry of scan variants
//! - **Work Distribution** ([`queue`], [`worker`], [`pool`]) - Queue, worker loop and pool
//! - **Point Processing** ([`pipeline`], [`gate`]) - The per-point state machine
//! - **Aggregation** ([`aggregator`]) - Per-batch collections and the run-spanning history
//! - **Progress Monitoring** ([`progress`]) - Progress events for front ends
//! - **Error Handling** ([`error`]) - Fatal engine errors
//!
//! Failures that concern a single point never leave the pipeline; they are logged and turned
//! into an outcome. Only setup failures surface as [`error::EngineError`].

pub mod aggregator;
pub mod config;
pub mod error;
pub mod gate;
pub mod pipeline;
pub mod pool;
pub mod progress;
pub mod queue;
pub mod scan_type;
pub mod worker;
