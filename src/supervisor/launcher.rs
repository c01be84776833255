//! Worker process launching.
//!
//! # Responsibilities
//! - Resolve the program each worker runs (this binary by default)
//! - Hand every child its own port through its environment
//! - Spawn children so they die with the primary
//!
//! # Design Decisions
//! - Configuration crosses the process boundary only through env vars; the
//!   primary and workers share no memory
//! - stdout/stderr are inherited so worker logs land next to the primary's

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};

/// Environment variable carrying the worker's listening port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable carrying the worker's slot index.
pub const WORKER_INDEX_ENV: &str = "WORKER_INDEX";

/// Environment variable carrying the interface the worker binds to.
pub const WORKER_HOST_ENV: &str = "WORKER_HOST";

/// The command line used to start each worker process.
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Re-execute the running binary with the given arguments.
    pub fn current_exe(args: Vec<String>) -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?, args))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Build the command for worker `index` listening on `host:port`.
    pub fn build(&self, index: usize, port: u16, host: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env(PORT_ENV, port.to_string())
            .env(WORKER_INDEX_ENV, index.to_string())
            .env(WORKER_HOST_ENV, host)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        cmd
    }

    /// Spawn worker `index`.
    pub fn spawn(&self, index: usize, port: u16, host: &str) -> std::io::Result<Child> {
        tracing::info!(
            worker = index,
            port,
            program = %self.program.display(),
            "Starting worker"
        );
        self.build(index, port, host).spawn()
    }
}
