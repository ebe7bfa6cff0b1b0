/// Exit status and usage text of the binary itself
use std::process::{Command, Output};

use tempfile::TempDir;

fn run_binary(args: &[&str], dir: &TempDir) -> Output {
    Command::new(env!("CARGO_BIN_EXE_businessmap-mcp-probe"))
        .args(args)
        .current_dir(dir.path())
        .env_remove("BUSINESSMAP_MCP_SERVER")
        .output()
        .expect("Failed to run binary")
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn test_missing_card_prints_usage_and_exits_1() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let output = run_binary(&[], &dir);

        assert_eq!(output.status.code(), Some(1));
        let stderr = text(&output.stderr);
        assert!(stderr.contains("Usage:"), "stderr: {}", stderr);
        assert!(stderr.contains("<CARD>"), "stderr: {}", stderr);
        assert!(!text(&output.stdout).contains("Started MCP server"));
    }

    #[test]
    fn test_launch_failure_exits_1() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let missing = dir.path().join("no-such-server");
        let output = run_binary(&["--server", missing.to_str().unwrap(), "--settle-ms", "0", "42"], &dir);

        assert_eq!(output.status.code(), Some(1));
        let stdout = text(&output.stdout);
        assert!(stdout.contains("Error running test: Failed to start MCP server"), "stdout: {}", stdout);
        assert!(!stdout.contains("Started MCP server"));
        assert!(!stdout.contains("→ Sending"));
    }

    #[test]
    fn test_default_server_is_looked_up_in_working_directory() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let output = run_binary(&["42"], &dir);

        assert_eq!(output.status.code(), Some(1));
        assert!(text(&output.stdout).contains("'./businessmap-mcp'"));
    }

    #[test]
    fn test_empty_card_is_rejected_before_launch() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let output = run_binary(&[""], &dir);

        assert_eq!(output.status.code(), Some(1));
        let stdout = text(&output.stdout);
        assert!(stdout.contains("Invalid card reference"), "stdout: {}", stdout);
        assert!(!stdout.contains("Testing Businessmap MCP Server"));
    }

    #[test]
    fn test_help_exits_0() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let output = run_binary(&["--help"], &dir);

        assert_eq!(output.status.code(), Some(0));
        assert!(text(&output.stdout).contains("--server"));
    }
}
