//! # External Tools Module
//!
//! Everything the engine needs to drive the external programs of a scan.
//!
//! - [`settings`] - Paths, binary names and argument templates of a tool
//! - [`log`] - The private, file-backed log sink of one worker
//! - [`runner`] - The [`runner::ToolRunner`] capability and its process-based implementation
//! - [`hep_tool`] - Named secondary tools that post-process a spectrum
//!
//! A non-zero exit status is never an error at this level: downstream stages only look at
//! whether the expected output file exists.

pub mod hep_tool;
pub mod log;
pub mod runner;
pub mod settings;

pub use hep_tool::{HepTool, SecondaryTool};
pub use log::ToolLog;
pub use runner::{ExternalCommand, ToolContext, ToolError, ToolInvocation, ToolRunner};
pub use settings::ToolSettings;
