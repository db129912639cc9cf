//! # Platform-specific utilities
//!
//! Questo modulo centralizza la logica cross-platform per i tool esterni
//! (ffmpeg, ffprobe) usati da probe e transcoder.

use crate::error::{PlanError, PlanResult};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Platform-specific command manager
pub struct PlatformCommands {
    commands: HashMap<&'static str, &'static str>,
    which_command: &'static str,
}

impl PlatformCommands {
    /// Get the singleton instance
    pub fn instance() -> &'static Self {
        static INSTANCE: OnceLock<PlatformCommands> = OnceLock::new();
        INSTANCE.get_or_init(Self::new)
    }

    fn new() -> Self {
        let mut commands = HashMap::new();
        let which_command = if cfg!(windows) {
            commands.insert("ffmpeg", "ffmpeg.exe");
            commands.insert("ffprobe", "ffprobe.exe");
            "where"
        } else {
            commands.insert("ffmpeg", "ffmpeg");
            commands.insert("ffprobe", "ffprobe");
            "which"
        };

        Self { commands, which_command }
    }

    /// Get the platform-specific command name
    pub fn get_command<'a>(&self, base_name: &'a str) -> &'a str {
        self.commands.get(base_name).copied().unwrap_or(base_name)
    }

    pub fn which_command(&self) -> &str {
        self.which_command
    }

    /// Check if a command is on the PATH
    pub async fn is_command_available(&self, base_name: &str) -> bool {
        let command_name = self.get_command(base_name);

        let result = tokio::process::Command::new(self.which_command)
            .arg(command_name)
            .output()
            .await;

        match result {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }

    /// Fail with `MissingDependency` for the first tool not found
    pub async fn check_dependencies(&self, tools: &[&str]) -> PlanResult<()> {
        for tool in tools {
            if !self.is_command_available(tool).await {
                return Err(PlanError::MissingDependency(format!(
                    "{} is required (install ffmpeg and make sure it is on PATH)",
                    tool
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_commands() {
        let platform = PlatformCommands::instance();

        let ffprobe = platform.get_command("ffprobe");
        assert!(ffprobe.starts_with("ffprobe"));
        // Unknown tools pass through untouched
        assert_eq!(platform.get_command("gifsicle"), "gifsicle");
        assert!(!platform.which_command().is_empty());
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let platform = PlatformCommands::instance();
        let err = platform
            .check_dependencies(&["definitely-not-a-real-tool-4f2a"])
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::MissingDependency(msg) if msg.contains("definitely-not-a-real-tool-4f2a")));
    }
}
