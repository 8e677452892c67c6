//! Screen capture via platform screenshot tools

use std::path::Path;

use async_trait::async_trait;

use super::ScreenCapture;
use crate::{Error, Result};

/// Screenshot tools we know how to drive, in preference order
///
/// Each entry is the program and the arguments placed before the output path.
pub const KNOWN_TOOLS: &[(&str, &[&str])] = &[
    ("screencapture", &["-x", "-t", "png"]),
    ("grim", &[]),
    ("scrot", &["-o"]),
    ("gnome-screenshot", &["-f"]),
    ("import", &["-window", "root"]),
];

/// Captures the screen by running an external tool into a temp PNG
#[derive(Debug, Clone)]
pub struct CommandCapture {
    program: String,
    args: Vec<String>,
}

impl CommandCapture {
    /// Use an explicit program and leading arguments
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Pick the first known tool available on PATH
    ///
    /// # Errors
    ///
    /// Returns error if no known screenshot tool is installed
    pub fn detect() -> Result<Self> {
        KNOWN_TOOLS
            .iter()
            .find(|(program, _)| which::which(program).is_ok())
            .map(|(program, args)| Self::from_known(program, args))
            .ok_or_else(|| {
                let names: Vec<&str> = KNOWN_TOOLS.iter().map(|(p, _)| *p).collect();
                Error::Capture(format!(
                    "no screenshot tool found on PATH (tried {})",
                    names.join(", ")
                ))
            })
    }

    /// Use a named program, applying known arguments when recognized
    ///
    /// # Errors
    ///
    /// Returns error if the program is not on PATH
    pub fn with_program(program: &str) -> Result<Self> {
        which::which(program)
            .map_err(|e| Error::Capture(format!("screenshot tool {program} not found: {e}")))?;

        let args = KNOWN_TOOLS
            .iter()
            .find(|(known, _)| *known == program)
            .map_or(&[][..], |(_, args)| *args);

        Ok(Self::from_known(program, args))
    }

    fn from_known(program: &str, args: &[&str]) -> Self {
        Self::new(program, args.iter().map(ToString::to_string).collect())
    }

    /// Program this capture runs
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    async fn run_into(&self, path: &Path) -> Result<()> {
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .output()
            .await
            .map_err(|e| Error::Capture(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Capture(format!(
                "{} exited with code {}: {}",
                self.program,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl ScreenCapture for CommandCapture {
    async fn capture(&self) -> Result<Vec<u8>> {
        let file = tempfile::Builder::new()
            .prefix("sky-frame-")
            .suffix(".png")
            .tempfile()?;

        self.run_into(file.path()).await?;

        let bytes = tokio::fs::read(file.path()).await?;
        if bytes.is_empty() {
            return Err(Error::Capture(format!("{} produced an empty frame", self.program)));
        }

        tracing::trace!(program = %self.program, bytes = bytes.len(), "frame captured");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tool_args_are_applied() {
        let capture = CommandCapture::from_known("scrot", &["-o"]);
        assert_eq!(capture.program(), "scrot");
        assert_eq!(capture.args, vec!["-o".to_string()]);
    }

    #[test]
    fn missing_program_is_rejected() {
        let result = CommandCapture::with_program("definitely-not-a-screenshot-tool");
        assert!(matches!(result, Err(Error::Capture(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn capture_reads_tool_output() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("frame.png");
        std::fs::write(&source, b"not really a png").unwrap();

        // `cp <source> <temp>` stands in for a screenshot tool
        let capture = CommandCapture::new("cp", vec![source.display().to_string()]);
        let bytes = capture.capture().await.unwrap();
        assert_eq!(bytes, b"not really a png");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_tool_is_an_error() {
        let capture = CommandCapture::new("false", vec![]);
        let result = capture.capture().await;
        assert!(matches!(result, Err(Error::Capture(_))));
    }
}
