//! Applies Archipel installation steps to the host

use anyhow::{Context, Result};
use colored::Colorize;
use installer_core::plan::InstallationStep;
use installer_core::system::{self, SystemExecutor, COMMAND_TIMEOUT};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Python packages the server needs at runtime
const PYTHON_EGGS: &[&str] = &["xmpppy", "sqlobject", "apscheduler"];

/// Time allowed for one package download and install
const EGG_TIMEOUT: Duration = Duration::from_secs(120);

/// Subject of the self-signed VNC certificate, so openssl never asks for one
const VNC_CERT_SUBJECT: &str = "/CN=archipel";

/// A program and its arguments
type CommandLine = (&'static str, Vec<String>);

fn egg_command(egg: &str) -> CommandLine {
    ("easy_install", vec![egg.to_string()])
}

fn start_on_boot_command() -> CommandLine {
    (
        "chkconfig",
        ["--level", "345", "archipel", "on"].map(String::from).to_vec(),
    )
}

fn vnc_certificate_command(pem: &Path) -> CommandLine {
    let pem = pem.to_string_lossy().into_owned();
    let mut args: Vec<String> = ["req", "-new", "-x509", "-days", "365", "-nodes"]
        .map(String::from)
        .to_vec();
    args.extend([
        "-subj".to_string(),
        VNC_CERT_SUBJECT.to_string(),
        "-out".to_string(),
        pem.clone(),
        "-keyout".to_string(),
        pem,
    ]);
    ("openssl", args)
}

async fn run_command_line((program, args): CommandLine, limit: Duration) -> Result<()> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    system::run_command(program, &args, limit).await
}

/// Executor working from an unpacked ArchipelServer source tree
pub struct ArchipelExecutor {
    source: PathBuf,
    /// When false, ownership is left as is (used for unprivileged test runs)
    change_owner: bool,
}

impl ArchipelExecutor {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            change_owner: true,
        }
    }

    #[cfg(test)]
    fn unprivileged(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            change_owner: false,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    async fn restrict(&self, path: &Path) -> Result<()> {
        if self.change_owner {
            system::lock_down(path).await
        } else {
            system::set_mode(path, 0o700).await
        }
    }

    async fn install_python_eggs(&self) -> Result<()> {
        println!("{}", " * Installing needed python eggs".cyan());
        for &egg in PYTHON_EGGS {
            run_command_line(egg_command(egg), EGG_TIMEOUT)
                .await
                .with_context(|| format!("Unable to get {} egg", egg))?;
        }
        println!("{}", " * Needed eggs installed".green());
        Ok(())
    }

    async fn install_binary(&self, exec_dir: &Path) -> Result<()> {
        let target = exec_dir.join("ArchipelServer");
        println!(" - installing ArchipelServer binary to {}", exec_dir.display());
        system::ensure_dir(exec_dir).await?;
        system::copy_tree(&self.source, &target).await?;
        self.restrict(&target).await
    }

    async fn install_conf_folder(&self, conf_dir: &Path) -> Result<()> {
        println!(" - installing configuration in {}", conf_dir.display());
        system::ensure_dir(conf_dir).await?;
        system::copy_file(
            &self.source.join("conf").join("archipel.conf"),
            &conf_dir.join("archipel.conf"),
        )
        .await?;
        self.restrict(conf_dir).await
    }

    async fn create_folder(&self, kind: &str, path: &Path) -> Result<()> {
        println!(" - creating {} folder {}", kind, path.display());
        system::ensure_dir(path).await
    }

    async fn install_init_script(&self, init_dir: &Path) -> Result<()> {
        let target = init_dir.join("archipel");
        println!(" - installing init script to {}", init_dir.display());
        system::ensure_dir(init_dir).await?;
        system::copy_file(&self.source.join("archipel"), &target).await?;
        self.restrict(&target).await
    }

    async fn enable_start_on_boot(&self) -> Result<()> {
        println!(" - setting archipel to be started with system");
        run_command_line(start_on_boot_command(), COMMAND_TIMEOUT).await
    }

    async fn generate_vnc_certificate(&self, conf_dir: &Path) -> Result<()> {
        println!(" - generating the certificates for VNC");
        system::ensure_dir(conf_dir).await?;
        run_command_line(vnc_certificate_command(&conf_dir.join("vnc.pem")), COMMAND_TIMEOUT).await
    }
}

impl SystemExecutor for ArchipelExecutor {
    async fn apply(&mut self, step: &InstallationStep) -> Result<()> {
        let Some(params) = step.params() else {
            return Ok(());
        };
        let dir = |name: &str| params.require(name).map(Path::new);

        match step.id {
            "python_eggs" => self.install_python_eggs().await,
            "binary" => self.install_binary(dir("exec_dir")?).await,
            "config_folder" => self.install_conf_folder(dir("conf_dir")?).await,
            "data_folder" => self.create_folder("data", dir("data_dir")?).await,
            "log_folder" => self.create_folder("log", dir("log_dir")?).await,
            "working_folders" => {
                for (name, path) in params.iter() {
                    let kind = name.trim_end_matches("_dir");
                    self.create_folder(&format!("working {}", kind), Path::new(path))
                        .await?;
                }
                Ok(())
            }
            "init_script" => self.install_init_script(dir("init_dir")?).await,
            "start_on_boot" => self.enable_start_on_boot().await,
            "vnc_certificate" => self.generate_vnc_certificate(dir("conf_dir")?).await,
            other => anyhow::bail!("No system operation for step `{}`", other),
        }
    }
}
