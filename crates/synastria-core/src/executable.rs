use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const NATIVE_NAMES: [&str; 2] = ["wow.exe", "wowext.exe"];

/// Casing variants probed on case-sensitive filesystems, in precedence order.
const BASE_VARIANTS: [&str; 4] = ["wow.exe", "Wow.exe", "WoW.exe", "WOW.exe"];
const EXTENDED_VARIANTS: [&str; 4] = ["wowext.exe", "WowExt.exe", "WoWExt.exe", "WOWEXT.exe"];

const EXTENDED_MARKER: &str = "wowext.exe";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutableKind {
    Native,
    ViaCompatLayer,
}

impl ExecutableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::ViaCompatLayer => "via_compat_layer",
        }
    }
}

/// A launchable client executable found in a client directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Executable {
    pub display_name: String,
    pub absolute_path: PathBuf,
    pub kind: ExecutableKind,
}

impl Executable {
    pub fn is_extended(&self) -> bool {
        self.display_name
            .to_ascii_lowercase()
            .contains(EXTENDED_MARKER)
    }
}

/// Find the launchable executables directly inside `client_dir`.
///
/// Never fails: an unreadable or missing directory yields an empty list.
pub fn find_executables(platform: Platform, client_dir: &Path) -> Vec<Executable> {
    let dir = absolute(client_dir);
    match platform {
        Platform::Windows => NATIVE_NAMES
            .iter()
            .filter_map(|name| probe(&dir, name, ExecutableKind::Native))
            .collect(),
        Platform::Linux => find_casing_variants(&dir),
        Platform::MacOs | Platform::Other => Vec::new(),
    }
}

fn find_casing_variants(dir: &Path) -> Vec<Executable> {
    if let Err(e) = std::fs::read_dir(dir) {
        debug!("cannot read client directory {}: {e}", dir.display());
        return Vec::new();
    }

    // At most one executable per role; the first existing variant wins.
    [BASE_VARIANTS, EXTENDED_VARIANTS]
        .iter()
        .filter_map(|variants| {
            variants
                .iter()
                .find_map(|name| probe(dir, name, ExecutableKind::ViaCompatLayer))
        })
        .collect()
}

fn probe(dir: &Path, name: &str, kind: ExecutableKind) -> Option<Executable> {
    let path = dir.join(name);
    path.exists().then(|| Executable {
        display_name: name.to_owned(),
        absolute_path: path,
        kind,
    })
}

fn absolute(dir: &Path) -> PathBuf {
    std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf())
}

/// Prefer the extended client, falling back to whatever was found first.
pub fn select_preferred(executables: &[Executable]) -> Option<&Executable> {
    executables
        .iter()
        .find(|exe| exe.is_extended())
        .or_else(|| executables.first())
}

pub fn is_valid_client_directory(platform: Platform, dir: &Path) -> bool {
    !find_executables(platform, dir).is_empty()
}
