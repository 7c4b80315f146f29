//! archipel-install - Interactive installer for Archipel Server

mod archipel;
mod executor;

use anyhow::Result;
use archipel::ArchipelConfig;
use clap::{Parser, Subcommand};
use colored::Colorize;
use executor::ArchipelExecutor;
use installer_core::{InstallArgs, InstallError, ProductConfig, SchemaSource};
use std::path::PathBuf;
use std::process::ExitCode;

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

const CANCELED_MESSAGE: &str = "Installation canceled by user";

#[derive(Parser, Debug)]
#[command(name = "archipel-install")]
#[command(about = "Interactive installer for Archipel Server")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install Archipel Server (default)
    Install(CliInstallArgs),
    /// Load and validate a configuration schema, then print a summary (for development use)
    CheckSchema(CheckSchemaArgs),
}

#[derive(Parser, Debug)]
pub struct CliInstallArgs {
    /// ArchipelServer source tree to install from
    #[arg(long, env = "ARCHIPEL_SOURCE", default_value = "./ArchipelServer")]
    pub source: PathBuf,

    /// Configuration schema to use instead of the embedded one
    #[arg(long, env = "ARCHIPEL_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Skip the required and advisory tool check
    #[arg(long = "skip-tool-check")]
    pub skip_tool_check: bool,
}

impl From<&CliInstallArgs> for InstallArgs {
    fn from(args: &CliInstallArgs) -> Self {
        InstallArgs {
            schema: args.schema.clone(),
            skip_tool_check: args.skip_tool_check,
        }
    }
}

#[derive(Parser, Debug)]
pub struct CheckSchemaArgs {
    /// Schema file to check (defaults to the embedded one)
    #[arg(long, env = "ARCHIPEL_SCHEMA")]
    pub schema: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // An interrupt is a clean cancellation; exiting skips destructors, so
    // drop any half-written configuration staging file first
    ctrlc::set_handler(move || {
        installer_core::config::discard_staging();
        let _ = console::Term::stderr().show_cursor();
        println!("\n\n{}\n", format!(" * {}", CANCELED_MESSAGE).yellow());
        std::process::exit(0);
    })
    .ok();

    let args = Args::parse();
    let config = ArchipelConfig;

    let result = match args.command {
        Some(Command::Install(install_args)) => install(&config, &install_args).await,
        Some(Command::CheckSchema(check_args)) => check_schema(&config, check_args.schema),
        None => {
            // No subcommand provided, default to the interactive install
            let install_args = CliInstallArgs::parse_from(["install"]);
            install(&config, &install_args).await
        }
    };

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}

async fn install(config: &ArchipelConfig, args: &CliInstallArgs) -> Result<()> {
    let mut executor = ArchipelExecutor::new(&args.source);
    installer_core::run(config, args.into(), CLI_VERSION, &mut executor).await
}

fn check_schema(config: &ArchipelConfig, path: Option<PathBuf>) -> Result<()> {
    let source = SchemaSource::from_config(config, path);
    let schema = source.load()?;

    println!("{} {}", "Schema:".dimmed(), source.describe());
    println!("  version      : {}", schema.version());
    println!("  file name    : {}", schema.file_name());
    println!("  flags domain : {}", schema.flags_domain());
    println!("  entries      : {}", schema.entries().len());
    println!("  domains      : {}", schema.domains().join(", "));
    let placeholders: Vec<String> = schema.placeholders().into_iter().collect();
    println!("  placeholders : {}", placeholders.join(", "));

    if let Some(warning) = schema.compatibility_warning(CLI_VERSION, config.upgrade_command()) {
        println!("{} {}", "Warning:".yellow(), warning);
    }
    println!("{}", "Schema is valid".green());
    Ok(())
}

fn report_error(error: &anyhow::Error) -> ExitCode {
    match error.downcast_ref::<InstallError>() {
        Some(e) if e.is_cancelled() => {
            println!(" {}", format!("* {}", CANCELED_MESSAGE).yellow());
            ExitCode::SUCCESS
        }
        Some(e) => {
            eprintln!("{} {:#}", "Error:".red(), error);
            ExitCode::from(e.exit_code() as u8)
        }
        None => {
            eprintln!("{} {:#}", "Error:".red(), error);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_install_flags() {
        let args = Args::parse_from([
            "archipel-install",
            "install",
            "--source",
            "/srv/ArchipelServer",
            "--skip-tool-check",
        ]);
        let Some(Command::Install(install)) = args.command else {
            panic!("expected install subcommand");
        };
        assert_eq!(install.source, PathBuf::from("/srv/ArchipelServer"));
        assert!(install.skip_tool_check);

        let core: InstallArgs = (&install).into();
        assert!(core.skip_tool_check);
    }

    #[test]
    fn test_cancellation_exits_successfully() {
        let error = anyhow::Error::from(InstallError::Cancelled);
        assert_eq!(report_error(&error), ExitCode::SUCCESS);

        let error = anyhow::Error::from(InstallError::Precondition("You need to be root".into()));
        assert_eq!(report_error(&error), ExitCode::from(1));
    }

    #[test]
    fn test_embedded_schema_checks() {
        check_schema(&ArchipelConfig, None).unwrap();
    }
}
