//! Launch orchestration for the Synastria WoW client.
//!
//! This crate starts the Windows-only client either natively (Windows) or
//! through a Proton-GE compatibility layer (Linux). It covers platform
//! detection, executable discovery in a client directory, compatibility layer
//! discovery and selection, per-client prefix management, environment
//! construction, and detached process spawning. Every public operation of the
//! [`Launcher`] reports its outcome as a [`LaunchResult`] instead of an error.

pub mod compat;
pub mod concurrency;
pub mod environment;
pub mod executable;
pub mod launcher;
pub mod mock;
pub mod paths;
pub mod platform;
pub mod prefix;
pub mod process;
pub mod settings;

pub use compat::{CompatibilityLayer, LayerRegistry};
pub use concurrency::PrefixLock;
pub use environment::TuningFlags;
pub use executable::{
    find_executables, is_valid_client_directory, select_preferred, Executable, ExecutableKind,
};
pub use launcher::{LaunchOptions, LaunchResult, Launcher, LayerChoice, PlatformInfo};
pub use paths::{HostDirs, SteamPaths};
pub use platform::{current_platform, Platform};
pub use process::{HostLauncher, LaunchCommand, ProcessLauncher};
pub use settings::{LauncherSettings, SettingsError};

use thiserror::Error;

/// Where users are sent when no compatibility layer is installed.
pub const PROTON_GE_URL: &str = "https://github.com/GloriousEggroll/proton-ge-custom";

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no WoW executable found in {0}")]
    NoExecutableFound(String),
    #[error(
        "no Proton-GE installation found. Please install Proton-GE first.\n\nYou can get it from: {}",
        PROTON_GE_URL
    )]
    NoCompatibilityLayerFound,
    #[error("compatibility layer '{name}' not found (available: {available})")]
    LayerNotFound { name: String, available: String },
    #[error("cannot derive a prefix name from client directory {0}")]
    UnnamedClientDirectory(String),
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
    #[error("failed to create prefix {path}: {source}")]
    PrefixCreationFailed {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to lock prefix {path}: {source}")]
    PrefixLockFailed {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to launch {target}: {source}")]
    SpawnFailed {
        target: String,
        source: std::io::Error,
    },
}
