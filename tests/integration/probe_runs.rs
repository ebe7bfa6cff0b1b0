/// Full runs against small `sh` servers
use std::path::Path;
use std::time::Duration;

use businessmap_mcp_probe::*;

/// Answers every id-bearing line with an empty result
const ECHO_SERVER: &str = r#"
echo "fake server starting" >&2
while IFS= read -r line; do
  id=$(printf '%s\n' "$line" | sed -n 's/.*"id":\([0-9][0-9]*\).*/\1/p')
  if [ -n "$id" ]; then
    printf '{"jsonrpc":"2.0","id":%s,"result":{"ok":true}}\n' "$id"
  fi
done
"#;

/// Answers every line, notifications included, with garbage
const GARBAGE_SERVER: &str = r#"
while IFS= read -r line; do
  echo "this is not json"
done
"#;

/// Reads nothing, answers nothing, ignores stdin closing
const SILENT_SERVER: &str = "exec sleep 30";

fn config(script: &str) -> HarnessConfig {
    HarnessConfig {
        server_program: "sh".into(),
        server_args: vec!["-c".to_string(), script.to_string()],
        response_timeout: Duration::from_secs(2),
        settle_delay: Duration::from_millis(50),
        shutdown_grace: Duration::from_secs(2),
        ..HarnessConfig::default()
    }
}

async fn run(config: HarnessConfig, comment: Option<&str>) -> (RunReport, String) {
    let probe = Probe::new(config).expect("valid config");
    let script = Script::new(CardRef::parse("42").unwrap(), comment.map(str::to_string));
    let mut reporter = ConsoleReporter::new(Vec::new());

    let report = probe.run(&script, &mut reporter).await.expect("server launched");
    let transcript = String::from_utf8(reporter.into_inner()).unwrap();
    (report, transcript)
}

#[cfg(test)]
mod probe_run_tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_server_answers_every_request() {
        let (report, transcript) = run(config(ECHO_SERVER), Some("hello")).await;

        assert_eq!(report.requests_sent, 5);
        assert_eq!(report.notifications_sent, 1);
        assert_eq!(report.responses_received, 5);
        assert!(report.all_answered());
        assert!(report.terminated);
        assert!(report.exit_status.is_some());

        assert_eq!(transcript.matches("→ Sending").count(), 6);
        assert_eq!(transcript.matches("← Received").count(), 5);
        assert!(transcript.contains("\"comment_text\":\"hello\""));
        assert!(transcript.contains("Server stderr: fake server starting"));
    }

    #[tokio::test]
    async fn test_read_only_run() {
        let (report, transcript) = run(config(ECHO_SERVER), None).await;

        assert_eq!(report.requests_sent, 3);
        assert_eq!(report.responses_received, 3);
        assert!(!transcript.contains("add_card_comment"));
    }

    #[tokio::test]
    async fn test_garbage_output_does_not_abort_the_script() {
        let (report, transcript) = run(config(GARBAGE_SERVER), None).await;

        assert_eq!(report.requests_sent, 3);
        assert_eq!(report.responses_received, 0);
        assert_eq!(report.malformed, 3);
        assert_eq!(report.unanswered, vec![1, 2, 3]);
        assert!(report.terminated);
        assert!(transcript.contains("← Error parsing response"));
        assert!(transcript.contains("\"name\":\"read_card\""));
    }

    #[tokio::test]
    async fn test_silent_server_times_out_and_is_killed() {
        let config = HarnessConfig {
            response_timeout: Duration::from_millis(100),
            shutdown_grace: Duration::from_millis(200),
            ..config(SILENT_SERVER)
        };
        let (report, transcript) = run(config, None).await;

        assert_eq!(report.requests_sent, 3);
        assert_eq!(report.responses_received, 0);
        assert_eq!(report.unanswered, vec![1, 2, 3]);
        assert!(report.terminated);
        assert!(report.exit_status.is_some());
        assert_eq!(transcript.matches("No response to request").count(), 3);
    }

    #[tokio::test]
    async fn test_server_that_exits_immediately() {
        let (report, transcript) = run(config("exit 0"), Some("hello")).await;

        // Every step is attempted even though nobody is listening
        assert_eq!(transcript.matches("→ Sending").count(), 6);
        assert_eq!(report.requests_sent + report.notifications_sent + report.write_failures, 6);
        assert_eq!(report.responses_received, 0);
        assert_eq!(report.unanswered.len(), report.requests_sent);
        assert!(report.terminated);
        assert!(report.exit_status.is_some());
    }

    #[tokio::test]
    async fn test_terminate_acts_only_once() {
        let launched = ServerProcess::spawn(Path::new("sh"), &["-c".to_string(), SILENT_SERVER.to_string()])
            .expect("server launched");
        let mut process = launched.process;
        drop(launched.stdin);

        let first = process.terminate(Duration::from_millis(100)).await;
        assert!(matches!(first, Ok(Some(_))));
        assert!(process.is_terminated());

        let second = process.terminate(Duration::from_millis(100)).await;
        assert!(matches!(second, Ok(None)));
    }
}
