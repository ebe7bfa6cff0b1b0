/// The MCP server as a child process
///
/// Owns the process handle for the whole run: launches it with every stream
/// piped, collects its stderr in the background, and terminates it once.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::ProbeError;

/// A launched server plus the stream halves the client needs
pub struct LaunchedServer {
    pub process: ServerProcess,
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
}

/// Handle to the running server
pub struct ServerProcess {
    program: String,
    child: Child,
    stderr: mpsc::UnboundedReceiver<String>,
    terminated: bool,
}

impl ServerProcess {
    /// Launch `program` with `args`
    pub fn spawn(program: &Path, args: &[String]) -> Result<LaunchedServer, ProbeError> {
        let program_name = program.display().to_string();
        info!("Launching MCP server: {} {:?}", program_name, args);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProbeError::Launch {
                program: program_name.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(ProbeError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(ProbeError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(ProbeError::MissingPipe("stderr"))?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        debug!("Stopped reading server stderr: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(LaunchedServer {
            process: ServerProcess {
                program: program_name,
                child,
                stderr: rx,
                terminated: false,
            },
            stdin,
            stdout,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Everything written to stderr so far, without waiting
    pub fn take_stderr(&mut self) -> Option<String> {
        let mut lines = Vec::new();
        while let Ok(line) = self.stderr.try_recv() {
            lines.push(line);
        }
        (!lines.is_empty()).then(|| lines.join("\n"))
    }

    /// Stderr written after termination, up to `limit` of waiting
    pub async fn finish_stderr(&mut self, limit: Duration) -> Option<String> {
        let mut lines = Vec::new();
        let collect = async {
            while let Some(line) = self.stderr.recv().await {
                lines.push(line);
            }
        };
        if tokio::time::timeout(limit, collect).await.is_err() {
            debug!("Server stderr still open after {:?}", limit);
        }
        (!lines.is_empty()).then(|| lines.join("\n"))
    }

    /// Whether `terminate` has run
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Stop the server and wait for it to exit
    ///
    /// Expects the server's stdin to be closed already, which asks it to exit
    /// on its own; after `grace` it is killed. Only the first call does
    /// anything; later calls return `Ok(None)`.
    pub async fn terminate(&mut self, grace: Duration) -> Result<Option<ExitStatus>, ProbeError> {
        if self.terminated {
            return Ok(None);
        }
        self.terminated = true;

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                info!("MCP server exited: {}", status);
                Ok(Some(status))
            }
            Err(_) => {
                warn!("MCP server still running after {:?}, killing it", grace);
                self.child.start_kill()?;
                let status = self.child.wait().await?;
                Ok(Some(status))
            }
        }
    }
}
