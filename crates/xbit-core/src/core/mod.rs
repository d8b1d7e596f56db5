//! # Core Module
//!
//! Data models and collaborator capabilities shared by the execution engine.
//!
//! ## Architecture
//!
//! - **Parameter Points** ([`point`]) - Immutable candidate input vectors
//! - **Observables** ([`observables`]) - Ordered observable definitions and their projection
//!   onto a parsed spectrum
//! - **File I/O** ([`io`]) - Spectrum (SLHA) parsing and input-file rendering
//! - **External Tools** ([`tools`]) - Invocation of the primary and secondary programs
//! - **Likelihood** ([`likelihood`]) - Scalar scoring of an observable vector

pub mod io;
pub mod likelihood;
pub mod observables;
pub mod point;
pub mod tools;
