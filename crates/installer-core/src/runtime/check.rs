//! Environment preconditions checked before any prompt

use super::tool::{Capabilities, ToolInfo};
use crate::error::{InstallError, Result};
use crate::product::ProductConfig;

/// Fail unless the effective user is root
pub fn check_root() -> Result<()> {
    if nix::unistd::geteuid().is_root() {
        Ok(())
    } else {
        Err(InstallError::Precondition(
            "You need to be root to run this installer".to_string(),
        ))
    }
}

/// Check tools; `advisory` ones get availability reported but don't cause failure.
pub fn check_tools<C: Capabilities + ?Sized>(
    capabilities: &C,
    required: &[&str],
    advisory: &[&str],
) -> Result<Vec<ToolInfo>> {
    let mut results = Vec::new();
    let mut missing = Vec::new();

    for name in required {
        let info = ToolInfo::probe(capabilities, name);
        if !info.available {
            missing.push(*name);
        }
        results.push(info);
    }

    for name in advisory {
        results.push(ToolInfo::probe(capabilities, name));
    }

    if !missing.is_empty() {
        return Err(InstallError::Precondition(format!(
            "Missing required tools:\n{}",
            missing
                .iter()
                .map(|m| format!("  - {}", m))
                .collect::<Vec<_>>()
                .join("\n")
        )));
    }

    Ok(results)
}

/// Run every precondition of a product, privilege first
pub fn check_preconditions<C, P>(
    config: &C,
    capabilities: &P,
    skip_tool_check: bool,
) -> Result<Vec<ToolInfo>>
where
    C: ProductConfig,
    P: Capabilities + ?Sized,
{
    if config.requires_root() {
        check_root()?;
    }

    if skip_tool_check {
        return Ok(Vec::new());
    }

    check_tools(
        capabilities,
        config.required_tools(),
        config.advisory_tools(),
    )
}
