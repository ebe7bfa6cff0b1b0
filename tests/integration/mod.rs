/// Integration tests that launch real child processes
#[cfg(unix)]
mod probe_runs;
mod cli;
mod launch;
