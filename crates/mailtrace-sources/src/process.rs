//! Local process execution for adapters that shell out instead of using HTTP.

use async_trait::async_trait;

use crate::error::SourceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` (no shell) and capture stdout.
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, SourceError>;
}

/// Runs commands with `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, SourceError> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SourceError::Process(format!("{program} subprocess error: {e}")))?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}
