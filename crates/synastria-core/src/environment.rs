use crate::compat::CompatibilityLayer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;

pub const WINEPREFIX: &str = "WINEPREFIX";
pub const STEAM_COMPAT_DATA_PATH: &str = "STEAM_COMPAT_DATA_PATH";
pub const STEAM_COMPAT_CLIENT_INSTALL_PATH: &str = "STEAM_COMPAT_CLIENT_INSTALL_PATH";
pub const PROTON_USE_WINED3D: &str = "PROTON_USE_WINED3D";
pub const PROTON_NO_ESYNC: &str = "PROTON_NO_ESYNC";
pub const PROTON_NO_FSYNC: &str = "PROTON_NO_FSYNC";
pub const PROTON_FORCE_LARGE_ADDRESS_AWARE: &str = "PROTON_FORCE_LARGE_ADDRESS_AWARE";
pub const WINE_CPU_TOPOLOGY: &str = "WINE_CPU_TOPOLOGY";
pub const DXVK_HUD: &str = "DXVK_HUD";
pub const WINEDEBUG: &str = "WINEDEBUG";

pub const DEFAULT_CPU_TOPOLOGY: &str = "4:2";
pub const DEFAULT_WINE_DEBUG: &str = "-all";

/// Caller-tunable knobs passed to the compatibility layer.
///
/// String knobs left unset (or set to an empty string) fall back to their
/// defaults when the environment is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningFlags {
    pub use_wined3d: bool,
    pub no_esync: bool,
    pub no_fsync: bool,
    pub cpu_topology: Option<String>,
    pub dxvk_hud: Option<String>,
    pub wine_debug: Option<String>,
}

impl TuningFlags {
    pub fn cpu_topology(&self) -> &str {
        non_empty_or(self.cpu_topology.as_deref(), DEFAULT_CPU_TOPOLOGY)
    }

    pub fn dxvk_hud(&self) -> &str {
        non_empty_or(self.dxvk_hud.as_deref(), "")
    }

    pub fn wine_debug(&self) -> &str {
        non_empty_or(self.wine_debug.as_deref(), DEFAULT_WINE_DEBUG)
    }

    /// Overlay `other` on top of `self`: set flags and non-empty strings win.
    #[must_use]
    pub fn merged_with(&self, other: &TuningFlags) -> TuningFlags {
        let pick = |theirs: &Option<String>, ours: &Option<String>| {
            theirs
                .clone()
                .filter(|v| !v.is_empty())
                .or_else(|| ours.clone())
        };
        TuningFlags {
            use_wined3d: self.use_wined3d || other.use_wined3d,
            no_esync: self.no_esync || other.no_esync,
            no_fsync: self.no_fsync || other.no_fsync,
            cpu_topology: pick(&other.cpu_topology, &self.cpu_topology),
            dxvk_hud: pick(&other.dxvk_hud, &self.dxvk_hud),
            wine_debug: pick(&other.wine_debug, &self.wine_debug),
        }
    }
}

fn non_empty_or<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(default)
}

fn flag(enabled: bool) -> OsString {
    OsString::from(if enabled { "1" } else { "0" })
}

/// Variables layered over the inherited environment for a game launch.
pub fn compat_environment(
    prefix: &Path,
    layer: &CompatibilityLayer,
    tuning: &TuningFlags,
) -> BTreeMap<String, OsString> {
    let mut env = layer_environment(prefix, layer);
    env.insert(PROTON_USE_WINED3D.to_owned(), flag(tuning.use_wined3d));
    env.insert(PROTON_NO_ESYNC.to_owned(), flag(tuning.no_esync));
    env.insert(PROTON_NO_FSYNC.to_owned(), flag(tuning.no_fsync));
    env.insert(PROTON_FORCE_LARGE_ADDRESS_AWARE.to_owned(), flag(true));
    env.insert(WINE_CPU_TOPOLOGY.to_owned(), tuning.cpu_topology().into());
    env.insert(DXVK_HUD.to_owned(), tuning.dxvk_hud().into());
    env.insert(WINEDEBUG.to_owned(), tuning.wine_debug().into());
    env
}

/// Variables for the one-time prefix initialization run.
pub fn init_environment(prefix: &Path, layer: &CompatibilityLayer) -> BTreeMap<String, OsString> {
    let mut env = layer_environment(prefix, layer);
    env.insert(WINEDEBUG.to_owned(), DEFAULT_WINE_DEBUG.into());
    env
}

fn layer_environment(prefix: &Path, layer: &CompatibilityLayer) -> BTreeMap<String, OsString> {
    let mut env = BTreeMap::new();
    // Proton reads the prefix from both variables.
    env.insert(WINEPREFIX.to_owned(), prefix.as_os_str().to_owned());
    env.insert(STEAM_COMPAT_DATA_PATH.to_owned(), prefix.as_os_str().to_owned());
    env.insert(
        STEAM_COMPAT_CLIENT_INSTALL_PATH.to_owned(),
        layer.install_dir.as_os_str().to_owned(),
    );
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn layer() -> CompatibilityLayer {
        CompatibilityLayer {
            name: "GE-Proton9-1".to_owned(),
            install_dir: PathBuf::from("/compat/GE-Proton9-1"),
            runtime_entrypoint: PathBuf::from("/compat/GE-Proton9-1/proton"),
        }
    }

    fn get<'a>(env: &'a BTreeMap<String, OsString>, key: &str) -> &'a str {
        env.get(key).and_then(|v| v.to_str()).unwrap()
    }

    #[test]
    fn defaults_produce_documented_values() {
        let prefix = Path::new("/prefixes/wow_client");
        let env = compat_environment(prefix, &layer(), &TuningFlags::default());

        assert_eq!(env.len(), 10);
        assert_eq!(get(&env, WINEPREFIX), "/prefixes/wow_client");
        assert_eq!(get(&env, STEAM_COMPAT_DATA_PATH), "/prefixes/wow_client");
        assert_eq!(get(&env, STEAM_COMPAT_CLIENT_INSTALL_PATH), "/compat/GE-Proton9-1");
        assert_eq!(get(&env, PROTON_USE_WINED3D), "0");
        assert_eq!(get(&env, PROTON_NO_ESYNC), "0");
        assert_eq!(get(&env, PROTON_NO_FSYNC), "0");
        assert_eq!(get(&env, PROTON_FORCE_LARGE_ADDRESS_AWARE), "1");
        assert_eq!(get(&env, WINE_CPU_TOPOLOGY), "4:2");
        assert_eq!(get(&env, DXVK_HUD), "");
        assert_eq!(get(&env, WINEDEBUG), "-all");
    }

    #[test]
    fn caller_overrides_apply() {
        let tuning = TuningFlags {
            use_wined3d: true,
            no_esync: true,
            no_fsync: true,
            cpu_topology: Some("8:4".to_owned()),
            dxvk_hud: Some("fps".to_owned()),
            wine_debug: Some("+seh".to_owned()),
        };
        let env = compat_environment(Path::new("/p"), &layer(), &tuning);

        assert_eq!(get(&env, PROTON_USE_WINED3D), "1");
        assert_eq!(get(&env, PROTON_NO_ESYNC), "1");
        assert_eq!(get(&env, PROTON_NO_FSYNC), "1");
        assert_eq!(get(&env, WINE_CPU_TOPOLOGY), "8:4");
        assert_eq!(get(&env, DXVK_HUD), "fps");
        assert_eq!(get(&env, WINEDEBUG), "+seh");
    }

    #[test]
    fn empty_strings_fall_back_to_defaults() {
        let tuning = TuningFlags {
            cpu_topology: Some(String::new()),
            wine_debug: Some(String::new()),
            ..TuningFlags::default()
        };
        assert_eq!(tuning.cpu_topology(), "4:2");
        assert_eq!(tuning.wine_debug(), "-all");
    }

    #[test]
    fn init_environment_is_minimal() {
        let env = init_environment(Path::new("/p"), &layer());
        let keys: Vec<&str> = env.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                STEAM_COMPAT_CLIENT_INSTALL_PATH,
                STEAM_COMPAT_DATA_PATH,
                WINEDEBUG,
                WINEPREFIX
            ]
        );
        assert_eq!(get(&env, WINEDEBUG), "-all");
    }

    #[test]
    fn merge_prefers_overlay_values() {
        let base = TuningFlags {
            no_esync: true,
            cpu_topology: Some("6:3".to_owned()),
            wine_debug: Some("+seh".to_owned()),
            ..TuningFlags::default()
        };
        let overlay = TuningFlags {
            use_wined3d: true,
            cpu_topology: Some("8:4".to_owned()),
            wine_debug: Some(String::new()),
            ..TuningFlags::default()
        };

        let merged = base.merged_with(&overlay);
        assert!(merged.use_wined3d);
        assert!(merged.no_esync);
        assert!(!merged.no_fsync);
        assert_eq!(merged.cpu_topology(), "8:4");
        assert_eq!(merged.wine_debug(), "+seh");
    }
}
