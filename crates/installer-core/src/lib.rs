//! Installer Core - Shared library for interactive server installers
//!
//! This library drives a question-and-answer installation: it asks which
//! steps to run, hands the enabled ones to a product-specific system executor
//! and finally writes a configuration file from a declarative schema.
//!
//! # Architecture
//!
//! - **Prompt engine** - line-oriented questions with defaults and re-prompting
//! - **Installation plan** - a step catalog walked into an ordered, validated plan
//! - **System executor** - trait implemented by each product, plus filesystem
//!   and command helpers
//! - **Configuration** - YAML schema, module-flag gated generation, atomic INI write
//! - **Wizard** - optional cliclack-based flow tying the above together (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based wizard module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use installer_core::{PlanBuilder, PromptEngine, SystemTools};
//!
//! let mut engine = PromptEngine::stdio();
//! let plan = PlanBuilder::new(MY_STEPS)?.build(&mut engine, &SystemTools)?;
//! for line in plan.summary(MY_STEPS) {
//!     println!("{}", line);
//! }
//! ```

pub mod config;
pub mod error;
pub mod plan;
pub mod product;
pub mod prompt;
pub mod runtime;
pub mod system;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use config::{BoundSchema, ConfigValue, Generator, Schema, SchemaSource};
pub use error::{InstallError, Result, SchemaError};
pub use plan::{InstallationPlan, InstallationStep, ParamSpec, PlanBuilder, StepAction, StepSpec};
pub use product::ProductConfig;
pub use prompt::{Answer, PromptEngine, Question};
pub use runtime::{check_preconditions, Capabilities, StaticTools, SystemTools};
pub use system::{dispatch, SystemExecutor};

#[cfg(feature = "tui")]
pub use tui::{run, InstallArgs};

/// Installer version - used for schema compatibility checking
/// Each binary should pass its own version, but this provides a fallback
pub const DEFAULT_CLI_VERSION: &str = "0.1.0";
