//! Product configuration trait for installer binaries
//!
//! Each installed product implements this trait to configure the wizard for
//! its own needs.

use crate::plan::{InstallationPlan, StepSpec};
use std::collections::BTreeMap;

/// Configuration trait for different installable products
///
/// Each product defines:
/// - Product identity (name, display name, welcome text)
/// - Environment requirements (privilege, mandatory and advisory tools)
/// - The ordered installation step catalog
/// - The configuration schema asset and how its defaults are filled
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name (used for env vars, service name)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Text shown once before the first question
    fn welcome(&self) -> &'static str;

    /// Whether installation must run as root
    fn requires_root(&self) -> bool {
        true
    }

    /// Tools whose absence stops the installer before any question
    fn required_tools(&self) -> &'static [&'static str];

    /// Tools only needed by optional steps; absence is a warning
    fn advisory_tools(&self) -> &'static [&'static str];

    /// Ordered installation step catalog
    fn steps(&self) -> &'static [StepSpec];

    /// Embedded configuration schema (YAML)
    fn default_schema(&self) -> &'static str;

    /// Environment variable name for overriding the schema file
    fn schema_env(&self) -> &'static str;

    /// Plan parameter naming the directory that receives the configuration file
    fn artifact_dir_param(&self) -> &'static str {
        "conf_dir"
    }

    /// Placeholder values available to schema defaults
    fn schema_context(&self, plan: &InstallationPlan) -> BTreeMap<String, String> {
        plan.context(self.steps())
    }

    /// Upgrade/install command shown in schema version warnings
    fn upgrade_command(&self) -> &'static str;
}
