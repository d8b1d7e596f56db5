//! Provides input/output functionality for the files exchanged with external tools.
//!
//! The engine only needs two capabilities from this module: rendering the input file of a
//! parameter point ([`input`]) and reading the structured spectrum an external tool produced
//! ([`slha`]). Both are expressed as traits so scans can plug in other formats.

pub mod input;
pub mod slha;
