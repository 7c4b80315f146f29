//! Capability detection for external tools
//!
//! Answers "is tool X available on this system". Results are advisory and the
//! question is asked once, never retried.

use std::collections::HashSet;
use std::process::Command;

/// Query for the presence of external tools
pub trait Capabilities {
    fn has_tool(&self, name: &str) -> bool;
}

/// Tool information reported during the environment check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
}

impl ToolInfo {
    /// Probe one tool through any capability source
    pub fn probe<C: Capabilities + ?Sized>(capabilities: &C, name: &str) -> Self {
        Self {
            name: name.to_string(),
            available: capabilities.has_tool(name),
        }
    }
}

/// Looks tools up in `PATH` via `which`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTools;

impl SystemTools {
    /// Resolve a tool to its path (if available)
    pub fn locate(&self, name: &str) -> Option<String> {
        Command::new("which")
            .arg(name)
            .output()
            .ok()
            .and_then(|output| {
                if output.status.success() {
                    String::from_utf8(output.stdout)
                        .ok()
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                } else {
                    None
                }
            })
    }
}

impl Capabilities for SystemTools {
    fn has_tool(&self, name: &str) -> bool {
        self.locate(name).is_some()
    }
}

/// Fixed set of available tools, for scripted runs and tests
#[derive(Debug, Clone, Default)]
pub struct StaticTools(HashSet<String>);

impl StaticTools {
    pub fn new<I, S>(tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tools.into_iter().map(Into::into).collect())
    }

    pub fn none() -> Self {
        Self::default()
    }
}

impl Capabilities for StaticTools {
    fn has_tool(&self, name: &str) -> bool {
        self.0.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_tools() {
        let tools = StaticTools::new(["openssl"]);
        assert!(tools.has_tool("openssl"));
        assert!(!tools.has_tool("chkconfig"));
        assert!(!StaticTools::none().has_tool("openssl"));
    }

    #[test]
    fn test_missing_tool_is_not_available() {
        let info = ToolInfo::probe(&SystemTools, "definitely-not-a-real-tool-4242");
        assert!(!info.available);
        assert!(SystemTools.locate("definitely-not-a-real-tool-4242").is_none());
    }
}
