//! Installation wizard flow
//!
//! Status lines go through cliclack; the questions themselves are asked by the
//! line-oriented [`PromptEngine`] so that a run can be scripted.

use crate::config::{Generator, SchemaSource};
use crate::error::InstallError;
use crate::plan::{InstallationPlan, PlanBuilder, StepAction};
use crate::product::ProductConfig;
use crate::prompt::PromptEngine;
use crate::runtime::{check_preconditions, Capabilities, SystemTools, ToolInfo};
use crate::system::{dispatch, SystemExecutor};
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// CLI arguments for the install command
#[derive(Debug, Clone, Default)]
pub struct InstallArgs {
    /// Schema file to use instead of the embedded one
    pub schema: Option<PathBuf>,

    /// Skip the mandatory and advisory tool check
    pub skip_tool_check: bool,
}

/// Run the wizard on the terminal
pub async fn run<C, E>(config: &C, args: InstallArgs, cli_version: &str, executor: &mut E) -> Result<()>
where
    C: ProductConfig,
    E: SystemExecutor,
{
    let mut engine = PromptEngine::stdio();
    run_with(config, &args, cli_version, executor, &SystemTools, &mut engine).await
}

/// Run the wizard with explicit collaborators
pub async fn run_with<C, E, P, R, W>(
    config: &C,
    args: &InstallArgs,
    cli_version: &str,
    executor: &mut E,
    capabilities: &P,
    engine: &mut PromptEngine<R, W>,
) -> Result<()>
where
    C: ProductConfig,
    E: SystemExecutor,
    P: Capabilities + ?Sized,
    R: BufRead,
    W: Write,
{
    cliclack::intro(config.display_name())?;

    // Step 1: Environment checks, before any question
    check_environment(config, args, capabilities)?;

    // Step 2: Welcome
    engine.say(config.welcome())?;
    confirm(engine)?;

    // Step 3: Build the plan
    let plan = PlanBuilder::new(config.steps())?.build(engine, capabilities)?;

    // Step 4: Summary and confirmation, asked even for an empty plan
    engine.say("")?;
    engine.say("Summary of the installation:")?;
    for line in plan.summary(config.steps()) {
        engine.say(&line)?;
    }
    confirm(engine)?;

    if plan.is_noop() {
        cliclack::outro("Nothing selected, nothing to install.")?;
        return Ok(());
    }

    // Step 5: System steps
    let applied = dispatch(&plan, config.steps(), executor).await?;
    if applied > 0 {
        cliclack::log::success(format!("Applied {} installation step(s)", applied))?;
    }

    // Step 6: Configuration file
    if plan.enabled_for(config.steps(), StepAction::Configure).next().is_some() {
        generate_configuration(config, args, cli_version, &plan, engine)?;
    }

    cliclack::outro("Installation is now complete.")?;
    Ok(())
}

fn confirm<R: BufRead, W: Write>(engine: &mut PromptEngine<R, W>) -> crate::error::Result<()> {
    if engine.ask_bool("Do you confirm ?", true)? {
        Ok(())
    } else {
        Err(InstallError::Cancelled)
    }
}

fn check_environment<C, P>(config: &C, args: &InstallArgs, capabilities: &P) -> Result<()>
where
    C: ProductConfig,
    P: Capabilities + ?Sized,
{
    if args.skip_tool_check {
        cliclack::log::info("Skipping tool check")?;
    }

    let tools = match check_preconditions(config, capabilities, args.skip_tool_check) {
        Ok(tools) => tools,
        Err(e) => {
            cliclack::log::error(format!("{}", e))?;
            return Err(e.into());
        }
    };

    report_tools(config, &tools)
}

fn report_tools<C: ProductConfig>(config: &C, tools: &[ToolInfo]) -> Result<()> {
    let advisory = config.advisory_tools();
    for tool in tools {
        if tool.available {
            cliclack::log::success(format!("{} found", tool.name))?;
        } else if advisory.contains(&tool.name.as_str()) {
            cliclack::log::warning(format!(
                "{} not found, steps needing it will not be offered",
                tool.name
            ))?;
        }
    }
    Ok(())
}

fn generate_configuration<C, R, W>(
    config: &C,
    args: &InstallArgs,
    cli_version: &str,
    plan: &InstallationPlan,
    engine: &mut PromptEngine<R, W>,
) -> Result<()>
where
    C: ProductConfig,
    R: BufRead,
    W: Write,
{
    let source = SchemaSource::from_config(config, args.schema.clone());
    let schema = source.load()?;
    cliclack::log::info(format!("Using {}", source.describe()))?;

    if let Some(warning) = schema.compatibility_warning(cli_version, config.upgrade_command()) {
        cliclack::log::warning(format!("Version warning: {}", warning))?;
    }

    let context = config.schema_context(plan);
    let bound = schema.bind(&context).map_err(InstallError::from)?;

    let conf_dir = context
        .get(config.artifact_dir_param())
        .with_context(|| format!("No value for `{}`", config.artifact_dir_param()))?;
    let generator = Generator::new(&bound);
    let destination = generator.destination_in(Path::new(conf_dir));

    let report = generator.generate(engine, &destination)?;
    cliclack::log::success(format!(
        "Wrote {} values to {}",
        report.values.len(),
        destination.display()
    ))?;
    Ok(())
}
