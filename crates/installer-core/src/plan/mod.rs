//! Installation plan: catalog of steps, per-step decisions, and the built plan
//!
//! Each step is a data node (`StepSpec`) with explicit prerequisite and
//! capability references instead of nested conditionals. The builder walks
//! the catalog in order and records a [`StepDecision`] per offered step.

pub mod builder;

pub use builder::PlanBuilder;

use crate::error::{InstallError, Result};
use std::collections::BTreeMap;

/// A path-like parameter asked once its step is enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Parameter name, unique across the catalog (also a schema placeholder)
    pub name: &'static str,
    pub prompt: &'static str,
    pub default: &'static str,
}

/// Who carries out an enabled step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    /// Dispatched to the system executor
    System,
    /// Runs the configuration generator after all system steps
    Configure,
}

/// Static description of one installation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSpec {
    pub id: &'static str,
    /// Short label used in the plan summary
    pub label: &'static str,
    /// Yes/no question deciding whether the step runs
    pub question: &'static str,
    pub default: bool,
    pub params: &'static [ParamSpec],
    /// Steps that must be enabled for this one to be offered
    pub requires: &'static [&'static str],
    /// External tool that must be present for this step to exist at all
    pub capability: Option<&'static str>,
    pub action: StepAction,
}

/// Ordered parameters of an enabled step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepParams(Vec<(String, String)>);

impl StepParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing an earlier value with the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Like [`StepParams::get`] but an error naming the missing parameter
    pub fn require(&self, name: &str) -> anyhow::Result<&str> {
        self.get(name)
            .ok_or_else(|| anyhow::anyhow!("missing parameter `{}`", name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for StepParams {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut params = StepParams::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

/// Outcome of asking about one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepDecision {
    /// Explicitly declined, or its prerequisite was not enabled
    Declined,
    Enabled(StepParams),
}

/// One step of a built plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationStep {
    pub id: &'static str,
    pub decision: StepDecision,
}

impl InstallationStep {
    pub fn declined(id: &'static str) -> Self {
        Self {
            id,
            decision: StepDecision::Declined,
        }
    }

    pub fn enabled(id: &'static str, params: StepParams) -> Self {
        Self {
            id,
            decision: StepDecision::Enabled(params),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.decision, StepDecision::Enabled(_))
    }

    /// Parameters of an enabled step
    pub fn params(&self) -> Option<&StepParams> {
        match &self.decision {
            StepDecision::Enabled(params) => Some(params),
            StepDecision::Declined => None,
        }
    }
}

/// The ordered, fully resolved plan for one run
///
/// Steps whose capability tool was missing are absent; every other catalog
/// step appears exactly once, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallationPlan {
    steps: Vec<InstallationStep>,
}

impl InstallationPlan {
    pub fn new(steps: Vec<InstallationStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[InstallationStep] {
        &self.steps
    }

    pub fn get(&self, id: &str) -> Option<&InstallationStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.get(id).is_some_and(InstallationStep::is_enabled)
    }

    pub fn enabled(&self) -> impl Iterator<Item = &InstallationStep> {
        self.steps.iter().filter(|s| s.is_enabled())
    }

    /// True when no step is enabled
    pub fn is_noop(&self) -> bool {
        self.enabled().next().is_none()
    }

    /// Enabled steps carried out by the given action, in plan order
    pub fn enabled_for<'a>(
        &'a self,
        catalog: &'a [StepSpec],
        action: StepAction,
    ) -> impl Iterator<Item = &'a InstallationStep> + 'a {
        self.enabled().filter(move |step| {
            catalog
                .iter()
                .any(|spec| spec.id == step.id && spec.action == action)
        })
    }

    /// Check the plan against its catalog
    ///
    /// Unknown or repeated steps, out-of-order steps and enabled steps with a
    /// prerequisite that is not enabled are rejected.
    pub fn validate(&self, catalog: &[StepSpec]) -> Result<()> {
        let mut last_position: Option<usize> = None;
        for step in &self.steps {
            let position = catalog
                .iter()
                .position(|spec| spec.id == step.id)
                .ok_or_else(|| InstallError::InvalidPlan(format!("unknown step `{}`", step.id)))?;

            if last_position.is_some_and(|last| position <= last) {
                return Err(InstallError::InvalidPlan(format!(
                    "step `{}` is repeated or out of order",
                    step.id
                )));
            }
            last_position = Some(position);

            if step.is_enabled() {
                for prerequisite in catalog[position].requires {
                    if !self.is_enabled(prerequisite) {
                        return Err(InstallError::InvalidPlan(format!(
                            "step `{}` is enabled but its prerequisite `{}` is not",
                            step.id, prerequisite
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Parameter values used to fill configuration defaults
    ///
    /// Every catalog parameter is present: the chosen value when its step is
    /// enabled, the catalog default otherwise.
    pub fn context(&self, catalog: &[StepSpec]) -> BTreeMap<String, String> {
        let mut context = BTreeMap::new();
        for spec in catalog {
            let params = self.get(spec.id).and_then(InstallationStep::params);
            for param in spec.params {
                let value = params
                    .and_then(|p| p.get(param.name))
                    .unwrap_or(param.default);
                context.insert(param.name.to_string(), value.to_string());
            }
        }
        context
    }

    /// Human-readable lines describing what will be done
    pub fn summary(&self, catalog: &[StepSpec]) -> Vec<String> {
        let mut lines = Vec::new();
        for step in self.enabled() {
            let Some(spec) = catalog.iter().find(|s| s.id == step.id) else {
                continue;
            };
            let params = step.params().cloned().unwrap_or_default();

            match spec.params {
                [] => lines.push(format!("   - {:<22} : yes", spec.label)),
                [only] => lines.push(format!(
                    "   - {:<22} : {}",
                    spec.label,
                    params.get(only.name).unwrap_or(only.default)
                )),
                many => {
                    lines.push(format!("   - {:<22} :", spec.label));
                    for param in many {
                        lines.push(format!(
                            "        - {}: {}",
                            param.name,
                            params.get(param.name).unwrap_or(param.default)
                        ));
                    }
                }
            }
        }
        lines
    }
}
