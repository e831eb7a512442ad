//! External collaborators invoked at run boundaries
//!
//! The optimizer is a privileged kernel-tuning script run as a separate
//! process; the report committer stores generated reports in a git
//! repository. Both are best-effort with bounded timeouts and their own
//! error channel: failures are reported to the caller for logging and
//! never affect the monitoring run's outcome.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure of an external collaborator process.
#[derive(Debug, Error)]
pub enum ExternalProcessError {
    #[error("failed to launch {command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("{command} timed out after {timeout_secs}s")]
    TimedOut { command: String, timeout_secs: u64 },
}

async fn run_command(
    mut command: Command,
    label: &str,
    timeout: Duration,
) -> Result<Output, ExternalProcessError> {
    command.kill_on_drop(true);
    let result = tokio::time::timeout(timeout, command.output()).await;

    let output = match result {
        Err(_) => {
            return Err(ExternalProcessError::TimedOut {
                command: label.to_string(),
                timeout_secs: timeout.as_secs(),
            })
        }
        Ok(Err(source)) => {
            return Err(ExternalProcessError::Launch {
                command: label.to_string(),
                source,
            })
        }
        Ok(Ok(output)) => output,
    };

    if !output.status.success() {
        return Err(ExternalProcessError::Failed {
            command: label.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

/// Runs the privileged system-optimization script after a run.
pub struct Optimizer {
    command: PathBuf,
    timeout: Duration,
}

impl Optimizer {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Invoke the optimization script and wait for it to finish.
    pub async fn run(&self) -> Result<(), ExternalProcessError> {
        let label = self.command.display().to_string();
        info!(command = %label, "Running system optimization");
        run_command(Command::new(&self.command), &label, self.timeout).await?;
        info!(command = %label, "System optimization completed");
        Ok(())
    }
}

/// Commits generated report files to a git repository.
pub struct ReportCommitter {
    repo_dir: PathBuf,
    timeout: Duration,
}

impl ReportCommitter {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Commit message for a report generated now.
    pub fn commit_message(timestamp: chrono::DateTime<Utc>) -> String {
        format!("System report {}", timestamp.format("%Y%m%d-%H%M%S"))
    }

    async fn git(&self, args: &[&str]) -> Result<Output, ExternalProcessError> {
        let label = format!("git {}", args.first().copied().unwrap_or_default());
        let mut command = Command::new("git");
        command.current_dir(&self.repo_dir).args(args);
        run_command(command, &label, self.timeout).await
    }

    /// Add and commit a report file, initializing the repository first if
    /// needed.
    pub async fn commit(&self, report_path: &Path) -> Result<(), ExternalProcessError> {
        if !self.repo_dir.join(".git").exists() {
            debug!(dir = %self.repo_dir.display(), "Initializing report repository");
            self.git(&["init"]).await?;
        }

        let path = report_path.display().to_string();
        self.git(&["add", &path]).await?;

        let message = Self::commit_message(Utc::now());
        self.git(&["commit", "-m", &message]).await?;
        info!(message = %message, "Report committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_commit_message_format() {
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 45).unwrap();
        assert_eq!(
            ReportCommitter::commit_message(timestamp),
            "System report 20240305-143045"
        );
    }

    #[tokio::test]
    async fn test_optimizer_success() {
        let optimizer = Optimizer::new("true");
        assert!(optimizer.run().await.is_ok());
    }

    #[tokio::test]
    async fn test_optimizer_nonzero_exit() {
        let optimizer = Optimizer::new("false");
        let err = optimizer.run().await.unwrap_err();
        assert!(matches!(err, ExternalProcessError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_optimizer_missing_command() {
        let optimizer = Optimizer::new("/nonexistent/optimize.sh");
        let err = optimizer.run().await.unwrap_err();
        assert!(matches!(err, ExternalProcessError::Launch { .. }));
    }

    #[tokio::test]
    async fn test_command_timeout() {
        let mut command = Command::new("sleep");
        command.arg("5");
        let err = run_command(command, "sleep", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, ExternalProcessError::TimedOut { .. }));
    }
}
