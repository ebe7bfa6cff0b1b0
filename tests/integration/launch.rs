/// Launch failures abort the run before any request is written
use businessmap_mcp_probe::*;
use tempfile::TempDir;

#[cfg(test)]
mod launch_tests {
    use super::*;

    fn script() -> Script {
        Script::new(CardRef::parse("42").unwrap(), Some("hello".to_string()))
    }

    #[tokio::test]
    async fn test_missing_server_is_a_launch_error() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = HarnessConfig {
            server_program: dir.path().join("businessmap-mcp"),
            ..HarnessConfig::default()
        };
        let probe = Probe::new(config).expect("valid config");
        let mut reporter = ConsoleReporter::new(Vec::new());

        let result = probe.run(&script(), &mut reporter).await;

        assert!(matches!(result, Err(ProbeError::Launch { .. })));
        let transcript = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(transcript.contains("Testing Businessmap MCP Server with card ID: 42"));
        assert!(!transcript.contains("Started MCP server"));
        assert!(!transcript.contains("→ Sending"));
    }

    #[tokio::test]
    async fn test_non_executable_server_is_a_launch_error() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("businessmap-mcp");
        std::fs::write(&path, "not a program").expect("Failed to write file");

        let config = HarnessConfig {
            server_program: path,
            ..HarnessConfig::default()
        };
        let probe = Probe::new(config).expect("valid config");
        let mut reporter = ConsoleReporter::new(Vec::new());

        let err = probe.run(&script(), &mut reporter).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to start MCP server"));
    }

    #[test]
    fn test_invalid_config_is_rejected_up_front() {
        let config = HarnessConfig {
            response_timeout: std::time::Duration::ZERO,
            ..HarnessConfig::default()
        };
        assert!(matches!(Probe::new(config), Err(ProbeError::Config(_))));
    }
}
