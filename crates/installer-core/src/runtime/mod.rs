//! Environment checks and tool detection
//!
//! This module provides:
//! - Capability detection ("is tool X available")
//! - Preconditions checked before any prompt (privilege, mandatory tools)

pub mod check;
pub mod tool;

pub use check::{check_preconditions, check_root, check_tools};
pub use tool::{Capabilities, StaticTools, SystemTools, ToolInfo};
