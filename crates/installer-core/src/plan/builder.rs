//! Walks a step catalog and asks the operator which steps to run

use super::{InstallationPlan, InstallationStep, StepParams, StepSpec};
use crate::error::{InstallError, Result};
use crate::prompt::PromptEngine;
use crate::runtime::Capabilities;
use std::collections::HashSet;
use std::io::{BufRead, Write};

/// Builds an [`InstallationPlan`] from a validated catalog
#[derive(Debug, Clone, Copy)]
pub struct PlanBuilder<'a> {
    catalog: &'a [StepSpec],
}

impl<'a> PlanBuilder<'a> {
    /// Validate the catalog once, before any question is asked
    pub fn new(catalog: &'a [StepSpec]) -> Result<Self> {
        validate_catalog(catalog)?;
        Ok(Self { catalog })
    }

    pub fn catalog(&self) -> &'a [StepSpec] {
        self.catalog
    }

    /// Ask the catalog questions in order
    ///
    /// - a step whose capability tool is missing is left out of the plan
    /// - a step whose prerequisite is not enabled is declined without asking
    /// - a declined step never asks for its parameters
    pub fn build<R, W, C>(
        &self,
        engine: &mut PromptEngine<R, W>,
        capabilities: &C,
    ) -> Result<InstallationPlan>
    where
        R: BufRead,
        W: Write,
        C: Capabilities + ?Sized,
    {
        let mut steps: Vec<InstallationStep> = Vec::with_capacity(self.catalog.len());

        for spec in self.catalog {
            if let Some(tool) = spec.capability {
                if !capabilities.has_tool(tool) {
                    continue;
                }
            }

            let prerequisites: Option<Vec<&StepParams>> = spec
                .requires
                .iter()
                .map(|id| {
                    steps
                        .iter()
                        .find(|s| s.id == *id)
                        .and_then(InstallationStep::params)
                })
                .collect();

            let Some(prerequisites) = prerequisites else {
                steps.push(InstallationStep::declined(spec.id));
                continue;
            };

            if !engine.ask_bool(spec.question, spec.default)? {
                steps.push(InstallationStep::declined(spec.id));
                continue;
            }

            let mut params = StepParams::new();
            for inherited in &prerequisites {
                for (name, value) in inherited.iter() {
                    params.insert(name, value);
                }
            }
            for param in spec.params {
                let value = engine.ask_text(param.prompt, param.default)?;
                params.insert(param.name, value);
            }

            steps.push(InstallationStep::enabled(spec.id, params));
        }

        let plan = InstallationPlan::new(steps);
        plan.validate(self.catalog)?;
        Ok(plan)
    }
}

fn validate_catalog(catalog: &[StepSpec]) -> Result<()> {
    let mut seen_steps: HashSet<&str> = HashSet::new();
    let mut seen_params: HashSet<&str> = HashSet::new();

    for spec in catalog {
        for prerequisite in spec.requires {
            if *prerequisite == spec.id {
                return Err(InstallError::InvalidCatalog(format!(
                    "step `{}` requires itself",
                    spec.id
                )));
            }
            if !seen_steps.contains(prerequisite) {
                return Err(InstallError::InvalidCatalog(format!(
                    "step `{}` requires `{}`, which is not an earlier step",
                    spec.id, prerequisite
                )));
            }
        }

        if !seen_steps.insert(spec.id) {
            return Err(InstallError::InvalidCatalog(format!(
                "duplicate step `{}`",
                spec.id
            )));
        }

        for param in spec.params {
            if !seen_params.insert(param.name) {
                return Err(InstallError::InvalidCatalog(format!(
                    "duplicate parameter `{}` in step `{}`",
                    param.name, spec.id
                )));
            }
        }
    }
    Ok(())
}
