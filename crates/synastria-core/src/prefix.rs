//! Per-client compatibility prefixes.
//!
//! Each client directory gets its own prefix below the launcher's
//! configuration directory, named after the client directory's basename with
//! every character outside `[A-Za-z0-9]` replaced by `_`. The mapping is a pure
//! function of the basename, so two client directories whose names only differ
//! in such characters share a prefix. Existing installs depend on these names;
//! the scheme must stay as is.

use crate::compat::CompatibilityLayer;
use crate::environment::init_environment;
use crate::paths::HostDirs;
use crate::platform::Platform;
use crate::process::{run_until_exit_or_timeout, LaunchCommand, MonitoredExit};
use crate::LaunchError;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// How long prefix initialization may run before it is cut short.
pub const INIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration tool run once to materialize the prefix.
const INIT_TOOL: &str = "winecfg";

/// Replace every character outside `[A-Za-z0-9]` with `_`.
///
/// Characters outside the Basic Multilingual Plane become two underscores,
/// one per UTF-16 unit, which keeps names of existing prefixes unchanged.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            for _ in 0..c.len_utf16() {
                out.push('_');
            }
        }
    }
    out
}

/// Make `path` absolute and fold away `.` and `..` without touching the
/// filesystem, so `.` names the directory it stands for.
///
/// Symlinks are left alone: a linked client directory keeps the prefix named
/// after the link.
pub fn resolve_client_dir(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    resolved
}

/// Leaf directory name of the prefix belonging to `client_dir`.
///
/// `None` when the resolved directory has no name (the filesystem root).
pub fn prefix_name(client_dir: &Path) -> Option<String> {
    let resolved = resolve_client_dir(client_dir);
    let base = resolved.file_name()?.to_string_lossy();
    Some(sanitize_name(&base))
}

/// Prefix location for `client_dir`; `None` where no prefix is needed or
/// none can be named.
pub fn prefix_path_for(platform: Platform, dirs: &HostDirs, client_dir: &Path) -> Option<PathBuf> {
    if !platform.is_linux() {
        return None;
    }
    let name = prefix_name(client_dir)?;
    Some(dirs.prefix_root(platform).join(name))
}

/// Create the prefix directory (and parents) if it does not exist yet.
pub fn ensure_exists(prefix: &Path) -> Result<(), LaunchError> {
    if prefix.is_dir() {
        return Ok(());
    }
    debug!("creating prefix {}", prefix.display());
    std::fs::create_dir_all(prefix).map_err(|source| LaunchError::PrefixCreationFailed {
        path: prefix.display().to_string(),
        source,
    })
}

/// Result of a prefix initialization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Completed,
    /// The tool was still running at the deadline and has been killed. The
    /// prefix has almost certainly been materialized by then.
    TimedOut,
}

/// Command that materializes the prefix by running the layer's `winecfg`.
pub fn init_command(layer: &CompatibilityLayer, prefix: &Path) -> LaunchCommand {
    LaunchCommand::new(&layer.runtime_entrypoint)
        .arg("run")
        .arg(INIT_TOOL)
        .envs(init_environment(prefix, layer))
}

/// Run the layer once against `prefix` so it builds its internal structure.
///
/// The prefix directory must already exist.
pub async fn initialize(
    layer: &CompatibilityLayer,
    prefix: &Path,
    timeout: Duration,
) -> Result<InitOutcome, LaunchError> {
    let command = init_command(layer, prefix);
    info!(
        "initializing prefix {} with {}",
        prefix.display(),
        layer.name
    );

    let exit = run_until_exit_or_timeout(&command, timeout)
        .await
        .map_err(|source| LaunchError::SpawnFailed {
            target: format!("{INIT_TOOL} via {}", layer.name),
            source,
        })?;

    Ok(match exit {
        MonitoredExit::Exited(code) => {
            debug!("{INIT_TOOL} exited with {code:?}");
            InitOutcome::Completed
        }
        MonitoredExit::TimedOut => InitOutcome::TimedOut,
    })
}
