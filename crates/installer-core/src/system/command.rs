//! External command execution with streamed output

use anyhow::{anyhow, Result};
use colored::Colorize;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

/// Default time allowed for one external command
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Time allowed for a process to exit once its output is closed
const EXIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Run a program, streaming its output, and fail unless it exits successfully
pub async fn run_command(program: &str, args: &[&str], limit: Duration) -> Result<()> {
    let cmd = std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");
    println!("{} {}", "Running:".dimmed(), cmd.yellow());

    let mut child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| anyhow!("Failed to start `{}`: {}", program, e))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("Failed to capture stdout of `{}`", program))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("Failed to capture stderr of `{}`", program))?;

    let mut stdout_reader = BufReader::new(stdout).lines();
    let mut stderr_reader = BufReader::new(stderr).lines();

    let output_task = async {
        let mut stderr_open = true;
        loop {
            tokio::select! {
                line = stdout_reader.next_line() => {
                    match line {
                        Ok(Some(line)) => println!("  {}", line),
                        Ok(None) => break,
                        Err(e) => {
                            eprintln!("{} {}", "Error reading stdout:".red(), e);
                            break;
                        }
                    }
                }
                line = stderr_reader.next_line(), if stderr_open => {
                    match line {
                        Ok(Some(line)) => eprintln!("  {}", line.yellow()),
                        Ok(None) => stderr_open = false,
                        Err(e) => {
                            eprintln!("{} {}", "Error reading stderr:".red(), e);
                            stderr_open = false;
                        }
                    }
                }
            }
        }
    };

    if timeout(limit, output_task).await.is_err() {
        let _ = child.kill().await;
        anyhow::bail!("`{}` timed out after {} seconds", cmd, limit.as_secs());
    }

    match timeout(EXIT_TIMEOUT, child.wait()).await {
        Ok(Ok(status)) if status.success() => Ok(()),
        Ok(Ok(status)) => anyhow::bail!(
            "`{}` failed with exit code: {}",
            cmd,
            status.code().unwrap_or(-1)
        ),
        Ok(Err(e)) => anyhow::bail!("Failed to wait for `{}`: {}", cmd, e),
        Err(_) => {
            let _ = child.kill().await;
            anyhow::bail!("`{}` hung after closing its output", cmd)
        }
    }
}
