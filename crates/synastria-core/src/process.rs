//! Process spawning.
//!
//! Two deliberately separate ways of starting a child:
//!
//! - [`ProcessLauncher::spawn_detached`] starts the game. The child gets its
//!   own session, null stdio, and is never waited on, monitored, or reaped by
//!   the launcher; success means the OS created the process, nothing more.
//! - [`run_until_exit_or_timeout`] starts a short-lived helper with piped
//!   output and races its exit against a deadline, killing it on timeout.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, warn};

/// Everything needed to start a child process.
///
/// `env` holds only the variables set on top of the inherited environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
    pub env: BTreeMap<String, OsString>,
}

impl LaunchCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn envs(mut self, env: BTreeMap<String, OsString>) -> Self {
        self.env.extend(env);
        self
    }
}

/// Fire-and-forget process creation.
///
/// Implementations return as soon as the child exists. They must not wait on
/// it, and the child must survive the launcher exiting.
pub trait ProcessLauncher: Send + Sync {
    fn name(&self) -> &str;

    fn spawn_detached(&self, command: &LaunchCommand) -> io::Result<()>;
}

/// Spawns real processes on the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostLauncher;

impl ProcessLauncher for HostLauncher {
    fn name(&self) -> &'static str {
        "host"
    }

    fn spawn_detached(&self, command: &LaunchCommand) -> io::Result<()> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(&command.env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }
        detach(&mut cmd);

        let child = cmd.spawn()?;
        debug!(
            "spawned detached process {} (pid {})",
            command.program.display(),
            child.id()
        );
        // Dropping a std Child neither waits for nor kills it.
        drop(child);
        Ok(())
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    // SAFETY: the closure runs in the forked child before exec and only
    // calls setsid(), which is async-signal-safe and touches no memory
    // shared with the parent.
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(windows)]
fn detach(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach(_cmd: &mut Command) {}

/// How a monitored child finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitoredExit {
    /// The child exited on its own; `None` when killed by a signal.
    Exited(Option<i32>),
    /// The deadline passed first and the child was killed.
    TimedOut,
}

/// Run `command` with piped (and ignored) output until it exits or `timeout`
/// elapses, whichever comes first.
///
/// Only a failure to create the process is an error.
pub async fn run_until_exit_or_timeout(
    command: &LaunchCommand,
    timeout: Duration,
) -> io::Result<MonitoredExit> {
    let mut cmd = tokio::process::Command::new(&command.program);
    cmd.args(&command.args)
        .envs(&command.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &command.current_dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn()?;
    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => Ok(MonitoredExit::Exited(status?.code())),
        Err(_) => {
            debug!(
                "{} still running after {timeout:?}, killing it",
                command.program.display()
            );
            if let Err(e) = child.kill().await {
                warn!("failed to kill {}: {e}", command.program.display());
            }
            Ok(MonitoredExit::TimedOut)
        }
    }
}
