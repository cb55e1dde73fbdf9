// Converters that shell out to platform image tools.
//
// - `sips` ships with macOS and reads HEIC, PNG, TIFF and friends.
// - `heif-convert` (libheif) is the usual HEIC decoder on Linux.
//
// A missing binary is reported as a failure so the chain moves on.

use crate::core::pipeline::{FallibleStrategy, ImageRef, StrategyError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

/// Runs `command` and checks that it produced `output`.
async fn run_conversion(
    mut command: Command,
    tool: &str,
    output: PathBuf,
    timeout: Duration,
) -> Result<PathBuf, StrategyError> {
    command.kill_on_drop(true);

    let result = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| StrategyError::Failed(format!("{} timed out after {:?}", tool, timeout)))?
        .map_err(|e| StrategyError::Failed(format!("{} could not be started: {}", tool, e)))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(StrategyError::Failed(format!(
            "{} exited with {}: {}",
            tool,
            result.status,
            stderr.trim()
        )));
    }

    if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
        return Err(StrategyError::Failed(format!(
            "{} reported success but wrote no file",
            tool
        )));
    }

    Ok(output)
}

/// `sips -s format jpeg -s formatOptions 95 <in> --out <stem>.jpg`
pub struct SipsConverter {
    timeout: Duration,
}

impl SipsConverter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl FallibleStrategy<ImageRef, PathBuf> for SipsConverter {
    fn name(&self) -> &'static str {
        "sips"
    }

    async fn attempt(&self, input: &ImageRef) -> Result<PathBuf, StrategyError> {
        let output = input.jpeg_sibling();

        let mut command = Command::new("sips");
        command
            .args(["-s", "format", "jpeg", "-s", "formatOptions", "95"])
            .arg(input.path())
            .arg("--out")
            .arg(&output);

        run_conversion(command, self.name(), output, self.timeout).await
    }
}

/// `heif-convert -q 95 <in> <stem>.jpg`, HEIC inputs only.
pub struct HeifConverter {
    timeout: Duration,
}

impl HeifConverter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl FallibleStrategy<ImageRef, PathBuf> for HeifConverter {
    fn name(&self) -> &'static str {
        "heif-convert"
    }

    async fn attempt(&self, input: &ImageRef) -> Result<PathBuf, StrategyError> {
        if input.extension() != "heic" {
            return Err(StrategyError::NotApplicable);
        }

        let output = input.jpeg_sibling();

        let mut command = Command::new("heif-convert");
        command
            .args(["-q", "95"])
            .arg(input.path())
            .arg(&output);

        run_conversion(command, self.name(), output, self.timeout).await
    }
}
