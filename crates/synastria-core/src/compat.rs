//! Discovery and selection of Proton-GE style compatibility layers.
//!
//! A layer is any directory below one of the well-known
//! `compatibilitytools.d` roots whose name mentions "proton" and which ships a
//! `proton` entrypoint script. Roots are scanned in a fixed order; results from
//! all roots are aggregated as-is (the same layer name may appear twice) and
//! sorted by name, descending, so that newer-looking versions come first.

use crate::LaunchError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENTRYPOINT_NAME: &str = "proton";
const NAME_MARKER: &str = "proton";

const SYSTEM_ROOTS: [&str; 2] = [
    "/usr/share/steam/compatibilitytools.d",
    "/opt/steam/compatibilitytools.d",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityLayer {
    pub name: String,
    pub install_dir: PathBuf,
    pub runtime_entrypoint: PathBuf,
}

impl CompatibilityLayer {
    /// Build a layer from its install directory if it has an entrypoint.
    pub fn from_install_dir(install_dir: &Path) -> Option<Self> {
        let name = install_dir.file_name()?.to_string_lossy().into_owned();
        let entrypoint = install_dir.join(ENTRYPOINT_NAME);
        entrypoint.is_file().then(|| Self {
            name,
            install_dir: install_dir.to_path_buf(),
            runtime_entrypoint: entrypoint,
        })
    }
}

/// The user-level Steam roots followed by the system-wide fallbacks.
pub fn default_roots(home: &Path) -> Vec<PathBuf> {
    let mut roots = vec![
        home.join(".steam").join("compatibilitytools.d"),
        home.join(".local")
            .join("share")
            .join("Steam")
            .join("compatibilitytools.d"),
    ];
    roots.extend(SYSTEM_ROOTS.iter().map(PathBuf::from));
    roots
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRegistry {
    roots: Vec<PathBuf>,
}

impl LayerRegistry {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn for_home(home: &Path) -> Self {
        Self::new(default_roots(home))
    }

    #[inline]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// All installed layers, newest-looking name first.
    pub fn discover(&self) -> Vec<CompatibilityLayer> {
        let mut layers = Vec::new();
        for root in &self.roots {
            if !root.exists() {
                continue;
            }
            if let Err(e) = scan_root(root, &mut layers) {
                debug!("skipping unreadable layer root {}: {e}", root.display());
            }
        }
        // Plain lexicographic order; "GE-Proton10-1" sorts below "GE-Proton9-1".
        layers.sort_by(|a, b| b.name.cmp(&a.name));
        layers
    }

    pub fn best(&self) -> Option<CompatibilityLayer> {
        self.discover().into_iter().next()
    }

    /// Look up an installed layer by its directory name.
    pub fn find(&self, name: &str) -> Result<CompatibilityLayer, LaunchError> {
        let layers = self.discover();
        if let Some(layer) = layers.iter().find(|l| l.name == name) {
            return Ok(layer.clone());
        }
        let available = if layers.is_empty() {
            "none".to_owned()
        } else {
            layers
                .iter()
                .map(|l| l.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        Err(LaunchError::LayerNotFound {
            name: name.to_owned(),
            available,
        })
    }
}

fn scan_root(root: &Path, out: &mut Vec<CompatibilityLayer>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name();
        if !name.to_string_lossy().to_lowercase().contains(NAME_MARKER) {
            continue;
        }
        if let Some(layer) = CompatibilityLayer::from_install_dir(&path) {
            debug!("found compatibility layer {} in {}", layer.name, root.display());
            out.push(layer);
        }
    }
    Ok(())
}
