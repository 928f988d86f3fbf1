use crate::platform::Platform;
use serde::Serialize;
use std::path::{Path, PathBuf};

const PREFIX_DIR: &str = "wine_prefixes";
const SETTINGS_FILE: &str = "launcher.json";

/// Host directories every per-user path is derived from.
///
/// Captured once from the process environment (or injected in tests) so that
/// path computation itself stays a pure function of its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDirs {
    home: PathBuf,
    appdata: Option<PathBuf>,
}

/// Well-known Steam locations on a Linux host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SteamPaths {
    pub steam_dir: PathBuf,
    pub local_steam_dir: PathBuf,
    pub compat_data_dir: PathBuf,
}

impl HostDirs {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            appdata: None,
        }
    }

    #[must_use]
    pub fn with_appdata(mut self, appdata: impl Into<PathBuf>) -> Self {
        self.appdata = Some(appdata.into());
        self
    }

    pub fn from_env() -> Self {
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .filter(|h| !h.is_empty())
            .map_or_else(|| PathBuf::from("."), PathBuf::from);
        let appdata = std::env::var_os("APPDATA")
            .filter(|a| !a.is_empty())
            .map(PathBuf::from);
        Self { home, appdata }
    }

    #[inline]
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Per-user configuration directory of the launcher.
    ///
    /// The exact casing of the product folder differs per OS and must not
    /// change: existing prefixes live below it.
    pub fn config_dir(&self, platform: Platform) -> PathBuf {
        match platform {
            Platform::Windows => self
                .appdata
                .clone()
                .unwrap_or_else(|| self.home.join("AppData").join("Roaming"))
                .join("Synastria"),
            Platform::Linux => self.home.join(".config").join("synastria"),
            Platform::MacOs => self
                .home
                .join("Library")
                .join("Application Support")
                .join("Synastria"),
            Platform::Other => self.home.join(".synastria"),
        }
    }

    #[inline]
    pub fn prefix_root(&self, platform: Platform) -> PathBuf {
        self.config_dir(platform).join(PREFIX_DIR)
    }

    #[inline]
    pub fn settings_file(&self, platform: Platform) -> PathBuf {
        self.config_dir(platform).join(SETTINGS_FILE)
    }

    /// Steam directories; only meaningful on Linux.
    pub fn steam_paths(&self, platform: Platform) -> Option<SteamPaths> {
        if !platform.is_linux() {
            return None;
        }
        let steam_dir = self.home.join(".steam");
        Some(SteamPaths {
            compat_data_dir: steam_dir.join("steam").join("steamapps").join("compatdata"),
            local_steam_dir: self.home.join(".local").join("share").join("Steam"),
            steam_dir,
        })
    }
}
