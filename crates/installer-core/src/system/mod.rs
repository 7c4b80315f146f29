//! System executor: carries out the enabled steps of a plan
//!
//! The core never touches the system itself. Products implement
//! [`SystemExecutor`] on top of the helpers in [`fs`] and [`command`].

pub mod command;
pub mod fs;

pub use command::{run_command, COMMAND_TIMEOUT};
pub use fs::{chown_root, copy_file, copy_tree, ensure_dir, lock_down, set_mode};

use crate::error::{InstallError, Result};
use crate::plan::{InstallationPlan, InstallationStep, StepAction, StepSpec};

/// Applies one enabled installation step to the system
#[allow(async_fn_in_trait)]
pub trait SystemExecutor {
    async fn apply(&mut self, step: &InstallationStep) -> anyhow::Result<()>;
}

/// Apply every enabled system step in plan order
///
/// The first failure stops the run; nothing applied before it is undone.
/// Returns the number of steps applied.
pub async fn dispatch<E: SystemExecutor>(
    plan: &InstallationPlan,
    catalog: &[StepSpec],
    executor: &mut E,
) -> Result<usize> {
    let mut applied = 0;
    for step in plan.enabled_for(catalog, StepAction::System) {
        executor
            .apply(step)
            .await
            .map_err(|cause| InstallError::Step {
                step: step.id.to_string(),
                cause,
            })?;
        applied += 1;
    }
    Ok(applied)
}

/// Executor that only records what it was asked to do
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingExecutor {
    pub applied: Vec<&'static str>,
    pub fail_on: Option<&'static str>,
}

#[cfg(test)]
impl SystemExecutor for RecordingExecutor {
    async fn apply(&mut self, step: &InstallationStep) -> anyhow::Result<()> {
        if self.fail_on == Some(step.id) {
            anyhow::bail!("simulated failure");
        }
        self.applied.push(step.id);
        Ok(())
    }
}
