use crate::compat::{CompatibilityLayer, LayerRegistry};
use crate::concurrency::PrefixLock;
use crate::environment::{compat_environment, TuningFlags};
use crate::executable::{find_executables, select_preferred, Executable};
use crate::paths::{HostDirs, SteamPaths};
use crate::platform::{current_platform, Platform};
use crate::prefix::{self, InitOutcome, INIT_TIMEOUT};
use crate::process::{HostLauncher, LaunchCommand, ProcessLauncher};
use crate::LaunchError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Which compatibility layer a caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerChoice {
    /// Directory name of an installed layer, resolved at launch time.
    Named(String),
    Layer(CompatibilityLayer),
}

/// Caller overrides for a launch; everything unset is computed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    pub layer: Option<LayerChoice>,
    pub prefix: Option<PathBuf>,
    pub tuning: TuningFlags,
}

/// Outcome of every public launcher operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_layer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_path: Option<PathBuf>,
}

impl LaunchResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            compatibility_layer_name: None,
            prefix_path: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::ok(message)
        }
    }

    #[must_use]
    pub fn with_layer(mut self, layer: &CompatibilityLayer) -> Self {
        self.compatibility_layer_name = Some(layer.name.clone());
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: &Path) -> Self {
        self.prefix_path = Some(prefix.to_path_buf());
        self
    }
}

impl From<LaunchError> for LaunchResult {
    fn from(err: LaunchError) -> Self {
        Self::failed(err.to_string())
    }
}

/// Host facts a caller may want to show before launching.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformInfo {
    pub platform: Platform,
    pub is_linux: bool,
    pub config_dir: PathBuf,
    pub compatibility_layers: Vec<CompatibilityLayer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steam: Option<SteamPaths>,
}

/// Launches the client natively or through a compatibility layer.
///
/// Holds no state between calls: every operation rescans the filesystem. The
/// fields only capture host facts so they can be substituted in tests.
pub struct Launcher {
    platform: Platform,
    dirs: HostDirs,
    registry: LayerRegistry,
    process: Arc<dyn ProcessLauncher>,
    init_timeout: Duration,
}

impl Launcher {
    pub fn new(
        platform: Platform,
        dirs: HostDirs,
        registry: LayerRegistry,
        process: Arc<dyn ProcessLauncher>,
    ) -> Self {
        Self {
            platform,
            dirs,
            registry,
            process,
            init_timeout: INIT_TIMEOUT,
        }
    }

    /// A launcher for the current host, spawning real processes.
    pub fn from_host() -> Self {
        let dirs = HostDirs::from_env();
        let registry = LayerRegistry::for_home(dirs.home());
        Self::new(current_platform(), dirs, registry, Arc::new(HostLauncher))
    }

    #[must_use]
    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = timeout;
        self
    }

    #[inline]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    #[inline]
    pub fn dirs(&self) -> &HostDirs {
        &self.dirs
    }

    #[inline]
    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn find_executables(&self, client_dir: &Path) -> Vec<Executable> {
        find_executables(self.platform, client_dir)
    }

    pub fn is_valid_client_directory(&self, client_dir: &Path) -> bool {
        !self.find_executables(client_dir).is_empty()
    }

    /// Installed compatibility layers; always empty outside Linux.
    pub fn available_layers(&self) -> Vec<CompatibilityLayer> {
        if !self.platform.is_linux() {
            return Vec::new();
        }
        self.registry.discover()
    }

    pub fn best_layer(&self) -> Option<CompatibilityLayer> {
        self.available_layers().into_iter().next()
    }

    pub fn prefix_path_for(&self, client_dir: &Path) -> Option<PathBuf> {
        prefix::prefix_path_for(self.platform, &self.dirs, client_dir)
    }

    pub fn platform_info(&self) -> PlatformInfo {
        PlatformInfo {
            platform: self.platform,
            is_linux: self.platform.is_linux(),
            config_dir: self.dirs.config_dir(self.platform),
            compatibility_layers: self.available_layers(),
            steam: self.dirs.steam_paths(self.platform),
        }
    }

    /// Start the client found in `client_dir` and return immediately.
    ///
    /// The spawned game is not tracked: success means the process was
    /// created, not that the client came up.
    pub fn launch(&self, client_dir: &Path, options: &LaunchOptions) -> LaunchResult {
        match self.try_launch(client_dir, options) {
            Ok(result) => result,
            Err(e) => {
                warn!("launch failed: {e}");
                e.into()
            }
        }
    }

    fn try_launch(
        &self,
        client_dir: &Path,
        options: &LaunchOptions,
    ) -> Result<LaunchResult, LaunchError> {
        let executables = self.find_executables(client_dir);
        let executable = select_preferred(&executables)
            .ok_or_else(|| LaunchError::NoExecutableFound(client_dir.display().to_string()))?;
        debug!(
            "selected {} out of {} executable(s)",
            executable.display_name,
            executables.len()
        );

        match self.platform {
            Platform::Windows => self.launch_native(executable, client_dir),
            Platform::Linux => self.launch_via_layer(executable, client_dir, options),
            other => Err(LaunchError::UnsupportedPlatform(other.to_string())),
        }
    }

    fn launch_native(
        &self,
        executable: &Executable,
        client_dir: &Path,
    ) -> Result<LaunchResult, LaunchError> {
        let command = LaunchCommand::new(&executable.absolute_path).current_dir(client_dir);
        info!(
            "launching {} (spawner: {})",
            executable.display_name,
            self.process.name()
        );

        self.process
            .spawn_detached(&command)
            .map_err(|source| LaunchError::SpawnFailed {
                target: executable.display_name.clone(),
                source,
            })?;

        Ok(LaunchResult::ok(format!(
            "launched {} successfully",
            executable.display_name
        )))
    }

    fn launch_via_layer(
        &self,
        executable: &Executable,
        client_dir: &Path,
        options: &LaunchOptions,
    ) -> Result<LaunchResult, LaunchError> {
        let layer = self.resolve_layer(options.layer.as_ref())?;
        let prefix = match &options.prefix {
            Some(prefix) => prefix.clone(),
            None => self.derived_prefix(client_dir)?,
        };

        let _lock = PrefixLock::acquire(&prefix)?;
        prefix::ensure_exists(&prefix)?;

        let command = LaunchCommand::new(&layer.runtime_entrypoint)
            .arg("run")
            .arg(executable.absolute_path.as_os_str())
            .current_dir(client_dir)
            .envs(compat_environment(&prefix, &layer, &options.tuning));
        info!(
            "launching {} via {} (prefix {}, spawner: {})",
            executable.display_name,
            layer.name,
            prefix.display(),
            self.process.name()
        );
        debug!("compatibility environment: {:?}", command.env);

        self.process
            .spawn_detached(&command)
            .map_err(|source| LaunchError::SpawnFailed {
                target: format!("{} via {}", executable.display_name, layer.name),
                source,
            })?;

        Ok(LaunchResult::ok(format!(
            "launched {} via {}",
            executable.display_name, layer.name
        ))
        .with_layer(&layer)
        .with_prefix(&prefix))
    }

    /// Materialize the prefix for `client_dir` by running the layer's
    /// configuration tool once.
    ///
    /// Resolves when the tool exits or after the init timeout, whichever
    /// comes first; a timeout still counts as success.
    pub async fn initialize_prefix(
        &self,
        client_dir: &Path,
        layer: Option<&LayerChoice>,
    ) -> LaunchResult {
        if !self.platform.is_linux() {
            return LaunchResult::ok("prefix not needed on this platform");
        }
        match self.try_initialize_prefix(client_dir, layer).await {
            Ok(result) => result,
            Err(e) => {
                warn!("prefix initialization failed: {e}");
                e.into()
            }
        }
    }

    async fn try_initialize_prefix(
        &self,
        client_dir: &Path,
        choice: Option<&LayerChoice>,
    ) -> Result<LaunchResult, LaunchError> {
        let layer = self.resolve_layer(choice)?;
        let prefix = self.derived_prefix(client_dir)?;

        let _lock = PrefixLock::acquire(&prefix)?;
        prefix::ensure_exists(&prefix)?;

        let message = match prefix::initialize(&layer, &prefix, self.init_timeout).await? {
            InitOutcome::Completed => "prefix initialized successfully",
            InitOutcome::TimedOut => "prefix initialized (timed out, but probably successful)",
        };
        Ok(LaunchResult::ok(message)
            .with_layer(&layer)
            .with_prefix(&prefix))
    }

    fn resolve_layer(&self, choice: Option<&LayerChoice>) -> Result<CompatibilityLayer, LaunchError> {
        match choice {
            Some(LayerChoice::Layer(layer)) => Ok(layer.clone()),
            Some(LayerChoice::Named(name)) => self.registry.find(name),
            None => self
                .best_layer()
                .ok_or(LaunchError::NoCompatibilityLayerFound),
        }
    }

    fn derived_prefix(&self, client_dir: &Path) -> Result<PathBuf, LaunchError> {
        if !self.platform.is_linux() {
            return Err(LaunchError::UnsupportedPlatform(self.platform.to_string()));
        }
        self.prefix_path_for(client_dir)
            .ok_or_else(|| LaunchError::UnnamedClientDirectory(client_dir.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{WINEPREFIX, WINE_CPU_TOPOLOGY};
    use crate::mock::MockLauncher;
    use std::ffi::OsString;
    use tempfile::TempDir;

    struct Fixture {
        home: TempDir,
        games: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                home: tempfile::tempdir().unwrap(),
                games: tempfile::tempdir().unwrap(),
            }
        }

        fn layer_root(&self) -> PathBuf {
            self.home.path().join(".steam").join("compatibilitytools.d")
        }

        fn install_layer(&self, name: &str, script: &str) -> CompatibilityLayer {
            let dir = self.layer_root().join(name);
            std::fs::create_dir_all(&dir).unwrap();
            let entrypoint = dir.join("proton");
            std::fs::write(&entrypoint, script).unwrap();
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&entrypoint, std::fs::Permissions::from_mode(0o755))
                    .unwrap();
            }
            CompatibilityLayer::from_install_dir(&dir).unwrap()
        }

        fn client(&self, name: &str, files: &[&str]) -> PathBuf {
            let dir = self.games.path().join(name);
            std::fs::create_dir_all(&dir).unwrap();
            for file in files {
                std::fs::write(dir.join(file), b"MZ").unwrap();
            }
            dir
        }

        fn launcher(&self, platform: Platform, process: Arc<dyn ProcessLauncher>) -> Launcher {
            // Only the temp roots, so host-installed layers never leak in.
            let registry = LayerRegistry::new(vec![self.layer_root()]);
            Launcher::new(platform, HostDirs::new(self.home.path()), registry, process)
        }
    }

    #[test]
    fn no_executable_fails_without_spawning() {
        let fx = Fixture::new();
        let client = fx.client("empty", &[]);
        let mock = Arc::new(MockLauncher::new());
        let launcher = fx.launcher(Platform::Windows, mock.clone());

        let result = launcher.launch(&client, &LaunchOptions::default());
        assert!(!result.success);
        assert!(result.message.contains("no WoW executable found"));
        assert!(mock.spawned().is_empty());
    }

    #[test]
    fn missing_client_directory_is_reported_not_raised() {
        let fx = Fixture::new();
        let missing = fx.games.path().join("missing");
        let launcher = fx.launcher(Platform::Linux, Arc::new(MockLauncher::new()));

        assert!(launcher.find_executables(&missing).is_empty());
        assert!(!launcher.is_valid_client_directory(&missing));
        assert!(!launcher.launch(&missing, &LaunchOptions::default()).success);
    }

    #[test]
    fn windows_launches_executable_directly() {
        let fx = Fixture::new();
        let client = fx.client("wow", &["wow.exe"]);
        let mock = Arc::new(MockLauncher::new());
        let launcher = fx.launcher(Platform::Windows, mock.clone());

        let result = launcher.launch(&client, &LaunchOptions::default());
        assert!(result.success, "{}", result.message);
        assert!(result.compatibility_layer_name.is_none());
        assert!(result.prefix_path.is_none());

        let spawned = mock.spawned();
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].program, client.join("wow.exe"));
        assert!(spawned[0].args.is_empty());
        assert_eq!(spawned[0].current_dir.as_deref(), Some(client.as_path()));
        assert!(spawned[0].env.is_empty());
    }

    #[test]
    fn windows_prefers_extended_client() {
        let fx = Fixture::new();
        let client = fx.client("wow", &["wow.exe", "wowext.exe"]);
        let mock = Arc::new(MockLauncher::new());
        let launcher = fx.launcher(Platform::Windows, mock.clone());

        assert!(launcher.launch(&client, &LaunchOptions::default()).success);
        assert_eq!(mock.spawned()[0].program, client.join("wowext.exe"));
    }

    #[test]
    fn linux_launches_through_best_layer() {
        let fx = Fixture::new();
        fx.install_layer("GE-Proton9-1", "#!/bin/sh\n");
        let client = fx.client("WoW 3.3.5a", &["WoWExt.exe"]);
        let mock = Arc::new(MockLauncher::new());
        let launcher = fx.launcher(Platform::Linux, mock.clone());

        let result = launcher.launch(&client, &LaunchOptions::default());
        assert!(result.success, "{}", result.message);
        assert_eq!(result.compatibility_layer_name.as_deref(), Some("GE-Proton9-1"));

        let prefix = result.prefix_path.unwrap();
        assert!(prefix.ends_with("WoW_3_3_5a"));
        assert!(prefix.is_dir());

        let spawned = mock.spawned();
        assert_eq!(spawned.len(), 1);
        let cmd = &spawned[0];
        assert_eq!(
            cmd.program,
            fx.layer_root().join("GE-Proton9-1").join("proton")
        );
        assert_eq!(
            cmd.args,
            vec![
                OsString::from("run"),
                client.join("WoWExt.exe").into_os_string()
            ]
        );
        assert_eq!(cmd.current_dir.as_deref(), Some(client.as_path()));

        let wineprefix = PathBuf::from(cmd.env.get(WINEPREFIX).unwrap());
        assert!(wineprefix.ends_with("WoW_3_3_5a"));
        assert_eq!(wineprefix, prefix);
    }

    #[test]
    fn linux_prefix_follows_dot_dot_to_the_client_directory() {
        let fx = Fixture::new();
        fx.install_layer("GE-Proton9-1", "#!/bin/sh\n");
        let client = fx.client("Synastria", &["wow.exe"]);
        std::fs::create_dir(client.join("Data")).unwrap();
        let mock = Arc::new(MockLauncher::new());
        let launcher = fx.launcher(Platform::Linux, mock.clone());
        assert_eq!(launcher.process.name(), "mock");

        let via_parent = client.join("Data").join("..");
        let result = launcher.launch(&via_parent, &LaunchOptions::default());
        assert!(result.success, "{}", result.message);

        let expected = fx.home.path().join(".config/synastria/wine_prefixes/Synastria");
        assert_eq!(result.prefix_path.as_deref(), Some(expected.as_path()));
        assert_eq!(mock.spawned()[0].env.get(WINEPREFIX).unwrap(), expected.as_os_str());
    }

    #[test]
    fn unnamed_client_directory_is_rejected_on_linux() {
        let fx = Fixture::new();
        let launcher = fx.launcher(Platform::Linux, Arc::new(MockLauncher::new()));
        let err = launcher.derived_prefix(Path::new("/")).unwrap_err();
        assert!(matches!(err, LaunchError::UnnamedClientDirectory(_)));

        let windows = fx.launcher(Platform::Windows, Arc::new(MockLauncher::new()));
        assert!(matches!(
            windows.derived_prefix(Path::new("/games/wow")),
            Err(LaunchError::UnsupportedPlatform(_))
        ));
    }

    #[test]
    fn linux_without_layer_fails_with_remediation() {
        let fx = Fixture::new();
        let client = fx.client("wow", &["Wow.exe"]);
        let mock = Arc::new(MockLauncher::new());
        let launcher = fx.launcher(Platform::Linux, mock.clone());

        let result = launcher.launch(&client, &LaunchOptions::default());
        assert!(!result.success);
        assert!(result.message.contains("Proton-GE"));
        assert!(result.message.contains(crate::PROTON_GE_URL));
        assert!(mock.spawned().is_empty());
    }

    #[test]
    fn linux_honors_overrides() {
        let fx = Fixture::new();
        fx.install_layer("GE-Proton9-1", "#!/bin/sh\n");
        fx.install_layer("GE-Proton8-25", "#!/bin/sh\n");
        let client = fx.client("wow", &["wow.exe"]);
        let custom_prefix = fx.home.path().join("custom").join("pfx");
        let mock = Arc::new(MockLauncher::new());
        let launcher = fx.launcher(Platform::Linux, mock.clone());

        let options = LaunchOptions {
            layer: Some(LayerChoice::Named("GE-Proton8-25".to_owned())),
            prefix: Some(custom_prefix.clone()),
            tuning: TuningFlags {
                cpu_topology: Some("8:4".to_owned()),
                ..TuningFlags::default()
            },
        };
        let result = launcher.launch(&client, &options);
        assert!(result.success, "{}", result.message);
        assert_eq!(result.compatibility_layer_name.as_deref(), Some("GE-Proton8-25"));
        assert_eq!(result.prefix_path.as_deref(), Some(custom_prefix.as_path()));
        assert!(custom_prefix.is_dir());

        let cmd = &mock.spawned()[0];
        assert_eq!(cmd.env.get(WINEPREFIX).unwrap(), custom_prefix.as_os_str());
        assert_eq!(cmd.env.get(WINE_CPU_TOPOLOGY).unwrap(), "8:4");
    }

    #[test]
    fn explicit_layer_value_bypasses_discovery() {
        let fx = Fixture::new();
        let other = tempfile::tempdir().unwrap();
        let dir = other.path().join("Proton-Custom");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("proton"), "").unwrap();
        let layer = CompatibilityLayer::from_install_dir(&dir).unwrap();

        let client = fx.client("wow", &["wow.exe"]);
        let mock = Arc::new(MockLauncher::new());
        let launcher = fx.launcher(Platform::Linux, mock.clone());

        let options = LaunchOptions {
            layer: Some(LayerChoice::Layer(layer.clone())),
            ..LaunchOptions::default()
        };
        let result = launcher.launch(&client, &options);
        assert!(result.success, "{}", result.message);
        assert_eq!(mock.spawned()[0].program, layer.runtime_entrypoint);
    }

    #[test]
    fn unknown_layer_name_fails() {
        let fx = Fixture::new();
        fx.install_layer("GE-Proton9-1", "#!/bin/sh\n");
        let client = fx.client("wow", &["wow.exe"]);
        let launcher = fx.launcher(Platform::Linux, Arc::new(MockLauncher::new()));

        let options = LaunchOptions {
            layer: Some(LayerChoice::Named("GE-Proton1-0".to_owned())),
            ..LaunchOptions::default()
        };
        let result = launcher.launch(&client, &options);
        assert!(!result.success);
        assert!(result.message.contains("GE-Proton1-0"));
        assert!(result.message.contains("GE-Proton9-1"));
    }

    #[test]
    fn prefix_creation_failure_propagates() {
        let fx = Fixture::new();
        fx.install_layer("GE-Proton9-1", "#!/bin/sh\n");
        let client = fx.client("wow", &["wow.exe"]);
        let blocker = fx.home.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let mock = Arc::new(MockLauncher::new());
        let launcher = fx.launcher(Platform::Linux, mock.clone());

        let options = LaunchOptions {
            prefix: Some(blocker.join("nested").join("pfx")),
            ..LaunchOptions::default()
        };
        let result = launcher.launch(&client, &options);
        assert!(!result.success);
        assert!(result.message.starts_with("failed to create prefix"));
        assert!(mock.spawned().is_empty());
    }

    #[test]
    fn spawn_failure_names_executable_and_layer() {
        let fx = Fixture::new();
        fx.install_layer("GE-Proton9-1", "#!/bin/sh\n");
        let client = fx.client("wow", &["WoWExt.exe"]);
        let launcher = fx.launcher(
            Platform::Linux,
            Arc::new(MockLauncher::failing(std::io::ErrorKind::PermissionDenied)),
        );

        let result = launcher.launch(&client, &LaunchOptions::default());
        assert!(!result.success);
        assert!(result.message.contains("WoWExt.exe via GE-Proton9-1"));
        assert!(result.message.contains("mock spawn failure"));
    }

    #[cfg(unix)]
    #[test]
    fn host_spawn_of_non_executable_entrypoint_fails() {
        use std::os::unix::fs::PermissionsExt;

        let fx = Fixture::new();
        let layer = fx.install_layer("GE-Proton9-1", "#!/bin/sh\n");
        std::fs::set_permissions(
            &layer.runtime_entrypoint,
            std::fs::Permissions::from_mode(0o644),
        )
        .unwrap();
        let client = fx.client("wow", &["Wow.exe"]);
        let launcher = fx.launcher(Platform::Linux, Arc::new(HostLauncher));

        let result = launcher.launch(&client, &LaunchOptions::default());
        assert!(!result.success);
        assert!(result.message.starts_with("failed to launch Wow.exe via GE-Proton9-1"));
    }

    #[cfg(unix)]
    #[test]
    fn host_spawn_succeeds_without_waiting() {
        let fx = Fixture::new();
        fx.install_layer("GE-Proton9-1", "#!/bin/sh\nsleep 5\n");
        let client = fx.client("wow", &["Wow.exe"]);
        let launcher = fx.launcher(Platform::Linux, Arc::new(HostLauncher));

        let start = std::time::Instant::now();
        let result = launcher.launch(&client, &LaunchOptions::default());
        assert!(result.success, "{}", result.message);
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn unsupported_platform_fails() {
        let fx = Fixture::new();
        let client = fx.client("wow", &["wow.exe"]);
        let launcher = fx.launcher(Platform::Other, Arc::new(MockLauncher::new()));

        // Nothing is discoverable on an unsupported platform.
        let result = launcher.launch(&client, &LaunchOptions::default());
        assert!(!result.success);
        assert!(launcher.available_layers().is_empty());
        assert!(launcher.prefix_path_for(&client).is_none());
    }

    #[test]
    fn relaunch_reuses_prefix() {
        let fx = Fixture::new();
        fx.install_layer("GE-Proton9-1", "#!/bin/sh\n");
        let client = fx.client("wow", &["wow.exe"]);
        let mock = Arc::new(MockLauncher::new());
        let launcher = fx.launcher(Platform::Linux, mock.clone());

        let first = launcher.launch(&client, &LaunchOptions::default());
        std::fs::write(first.prefix_path.as_ref().unwrap().join("system.reg"), "x").unwrap();
        let second = launcher.launch(&client, &LaunchOptions::default());

        assert_eq!(first.prefix_path, second.prefix_path);
        assert!(second.prefix_path.unwrap().join("system.reg").exists());
        assert_eq!(mock.spawned().len(), 2);
    }

    #[test]
    fn platform_info_reports_layers_and_paths() {
        let fx = Fixture::new();
        fx.install_layer("GE-Proton9-1", "#!/bin/sh\n");
        let launcher = fx.launcher(Platform::Linux, Arc::new(MockLauncher::new()));

        let info = launcher.platform_info();
        assert!(info.is_linux);
        assert_eq!(info.config_dir, fx.home.path().join(".config").join("synastria"));
        assert_eq!(info.compatibility_layers.len(), 1);
        assert!(info.steam.is_some());

        let windows = fx.launcher(Platform::Windows, Arc::new(MockLauncher::new()));
        let info = windows.platform_info();
        assert!(!info.is_linux);
        assert!(info.compatibility_layers.is_empty());
        assert!(info.steam.is_none());
    }

    #[test]
    fn result_serializes_without_empty_fields() {
        let json = serde_json::to_value(LaunchResult::failed("nope")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "message": "nope"}));
    }

    #[tokio::test]
    async fn initialize_is_a_no_op_outside_linux() {
        let fx = Fixture::new();
        let client = fx.client("wow", &["wow.exe"]);
        let launcher = fx.launcher(Platform::Windows, Arc::new(MockLauncher::new()));

        let result = launcher.initialize_prefix(&client, None).await;
        assert!(result.success);
        assert!(result.message.contains("not needed"));
    }

    #[tokio::test]
    async fn initialize_without_layer_fails() {
        let fx = Fixture::new();
        let client = fx.client("wow", &["wow.exe"]);
        let launcher = fx.launcher(Platform::Linux, Arc::new(MockLauncher::new()));

        let result = launcher.initialize_prefix(&client, None).await;
        assert!(!result.success);
        assert!(result.message.contains("Proton-GE"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn initialize_runs_winecfg_in_prefix() {
        let fx = Fixture::new();
        let record = fx.home.path().join("init-record");
        fx.install_layer(
            "GE-Proton9-1",
            &format!(
                "#!/bin/sh\necho \"$@\" > '{0}'\necho \"$WINEPREFIX\" >> '{0}'\n",
                record.display()
            ),
        );
        let client = fx.client("wow client", &["wow.exe"]);
        let launcher = fx.launcher(Platform::Linux, Arc::new(MockLauncher::new()));

        let result = launcher.initialize_prefix(&client, None).await;
        assert!(result.success, "{}", result.message);
        assert_eq!(result.message, "prefix initialized successfully");
        let prefix = result.prefix_path.unwrap();
        assert!(prefix.is_dir());
        assert!(prefix.ends_with("wow_client"));

        let recorded = std::fs::read_to_string(&record).unwrap();
        let mut lines = recorded.lines();
        assert_eq!(lines.next(), Some("run winecfg"));
        assert_eq!(lines.next(), Some(prefix.to_str().unwrap()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn initialize_resolves_when_tool_exits() {
        let fx = Fixture::new();
        fx.install_layer("GE-Proton9-1", "#!/bin/sh\nsleep 1\n");
        let client = fx.client("wow", &["wow.exe"]);
        let launcher = fx.launcher(Platform::Linux, Arc::new(MockLauncher::new()));

        let start = std::time::Instant::now();
        let result = launcher.initialize_prefix(&client, None).await;
        let elapsed = start.elapsed();

        assert!(result.success, "{}", result.message);
        assert_eq!(result.message, "prefix initialized successfully");
        assert!(elapsed >= Duration::from_millis(900));
        assert!(elapsed < Duration::from_secs(8), "waited for timeout: {elapsed:?}");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn initialize_kills_tool_on_timeout() {
        let fx = Fixture::new();
        let pid_file = fx.home.path().join("init.pid");
        fx.install_layer(
            "GE-Proton9-1",
            &format!("#!/bin/sh\necho $$ > '{}'\nexec sleep 30\n", pid_file.display()),
        );
        let client = fx.client("wow", &["wow.exe"]);
        let launcher = fx
            .launcher(Platform::Linux, Arc::new(MockLauncher::new()))
            .with_init_timeout(Duration::from_millis(500));

        let start = std::time::Instant::now();
        let result = launcher.initialize_prefix(&client, None).await;
        let elapsed = start.elapsed();

        assert!(result.success, "{}", result.message);
        assert!(result.message.contains("timed out"));
        assert!(elapsed >= Duration::from_millis(500));
        assert!(elapsed < Duration::from_secs(5));

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let proc_entry = PathBuf::from(format!("/proc/{}", pid.trim()));
        assert!(!proc_entry.exists(), "init tool still running");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn initialize_reports_spawn_failure() {
        use std::os::unix::fs::PermissionsExt;

        let fx = Fixture::new();
        let layer = fx.install_layer("GE-Proton9-1", "#!/bin/sh\n");
        std::fs::set_permissions(
            &layer.runtime_entrypoint,
            std::fs::Permissions::from_mode(0o644),
        )
        .unwrap();
        let client = fx.client("wow", &["wow.exe"]);
        let launcher = fx.launcher(Platform::Linux, Arc::new(MockLauncher::new()));

        let start = std::time::Instant::now();
        let result = launcher.initialize_prefix(&client, None).await;
        assert!(!result.success);
        assert!(result.message.contains("winecfg via GE-Proton9-1"));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
