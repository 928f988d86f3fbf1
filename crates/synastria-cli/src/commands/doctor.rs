use super::{invalid_directory_hint, EXIT_FAILURE, EXIT_SUCCESS};
use std::path::Path;
use synastria_core::{Launcher, LauncherSettings, Platform, PrefixLock, SettingsError};

pub fn run(
    launcher: &Launcher,
    settings_path: &Path,
    client_dir: Option<&Path>,
    json_output: bool,
) -> Result<u8, String> {
    let mut checks: Vec<Check> = Vec::new();
    let mut all_pass = true;

    check_platform(launcher.platform(), &mut checks, &mut all_pass);

    let config_dir = launcher.dirs().config_dir(launcher.platform());
    if config_dir.is_dir() {
        checks.push(Check::pass(
            "config_dir",
            &format!("Config directory: {}", config_dir.display()),
        ));
    } else {
        checks.push(Check::info(
            "config_dir",
            &format!(
                "Config directory {} does not exist yet (created on first launch)",
                config_dir.display()
            ),
        ));
    }

    let settings = check_settings(settings_path, &mut checks, &mut all_pass);

    if launcher.platform().is_linux() {
        check_layers(launcher, settings.as_ref(), &mut checks, &mut all_pass);
        check_steam(launcher, &mut checks);
    }

    if let Some(dir) = client_dir {
        check_client(launcher, dir, &mut checks, &mut all_pass);
    }

    check_disk_space(&config_dir, &mut checks);

    print_results(&checks, all_pass, json_output)
}

fn check_platform(platform: Platform, checks: &mut Vec<Check>, all_pass: &mut bool) {
    if platform.is_windows() {
        checks.push(Check::pass(
            "platform",
            "Platform: windows (client runs natively)",
        ));
    } else if platform.is_linux() {
        checks.push(Check::pass(
            "platform",
            "Platform: linux (client runs through Proton-GE)",
        ));
    } else {
        *all_pass = false;
        checks.push(Check::fail(
            "platform",
            &format!("Platform {platform} is not supported for launching"),
        ));
    }
}

fn check_settings(
    settings_path: &Path,
    checks: &mut Vec<Check>,
    all_pass: &mut bool,
) -> Option<LauncherSettings> {
    match LauncherSettings::load(settings_path) {
        Ok(settings) => {
            checks.push(Check::pass(
                "settings",
                &format!("Settings file {} is valid", settings_path.display()),
            ));
            Some(settings)
        }
        Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            checks.push(Check::info(
                "settings",
                "No settings file (using defaults)",
            ));
            Some(LauncherSettings::default())
        }
        Err(e) => {
            *all_pass = false;
            checks.push(Check::fail("settings", &e.to_string()));
            None
        }
    }
}

fn check_layers(
    launcher: &Launcher,
    settings: Option<&LauncherSettings>,
    checks: &mut Vec<Check>,
    all_pass: &mut bool,
) {
    let layers = launcher.available_layers();
    let Some(best) = layers.first() else {
        *all_pass = false;
        let searched: Vec<_> = launcher
            .registry()
            .roots()
            .iter()
            .map(|r| r.display().to_string())
            .collect();
        checks.push(Check::fail(
            "compat_layers",
            &format!(
                "No Proton-GE installation found in {}. Get it from {}",
                searched.join(", "),
                synastria_core::PROTON_GE_URL
            ),
        ));
        return;
    };
    checks.push(Check::pass(
        "compat_layers",
        &format!(
            "{} compatibility layer(s) found, default {}",
            layers.len(),
            best.name
        ),
    ));

    if let Some(name) = settings.and_then(|s| s.compat_layer.as_deref()) {
        if layers.iter().any(|l| l.name == name) {
            checks.push(Check::pass(
                "preferred_layer",
                &format!("Preferred layer {name} is installed"),
            ));
        } else {
            *all_pass = false;
            checks.push(Check::fail(
                "preferred_layer",
                &format!("Preferred layer {name} is not installed"),
            ));
        }
    }
}

fn check_steam(launcher: &Launcher, checks: &mut Vec<Check>) {
    let Some(steam) = launcher.dirs().steam_paths(launcher.platform()) else {
        return;
    };
    if steam.steam_dir.exists() || steam.local_steam_dir.exists() {
        checks.push(Check::info("steam", "Steam installation detected"));
    } else {
        checks.push(Check::info(
            "steam",
            "Steam not found (not required for Proton-GE)",
        ));
    }
}

fn check_client(launcher: &Launcher, dir: &Path, checks: &mut Vec<Check>, all_pass: &mut bool) {
    let executables = launcher.find_executables(dir);
    if executables.is_empty() {
        *all_pass = false;
        checks.push(Check::fail(
            "client_dir",
            &format!("{}: {}", dir.display(), invalid_directory_hint(launcher.platform())),
        ));
        return;
    }

    let names: Vec<_> = executables.iter().map(|e| e.display_name.as_str()).collect();
    checks.push(Check::pass(
        "client_dir",
        &format!("Client executables: {}", names.join(", ")),
    ));
    if !executables.iter().any(synastria_core::Executable::is_extended) {
        checks.push(Check::warn(
            "extended_client",
            "wowext.exe not found; the base client will be launched",
        ));
    }

    let Some(prefix) = launcher.prefix_path_for(dir) else {
        return;
    };
    if prefix.is_dir() {
        checks.push(Check::pass(
            "prefix",
            &format!("Prefix exists: {}", prefix.display()),
        ));
    } else {
        checks.push(Check::info(
            "prefix",
            &format!(
                "Prefix {} not created yet (run init-prefix or launch)",
                prefix.display()
            ),
        ));
        return;
    }

    match PrefixLock::try_acquire(&prefix) {
        Ok(Some(_)) => checks.push(Check::pass("prefix_lock", "Prefix lock is free")),
        Ok(None) => checks.push(Check::warn(
            "prefix_lock",
            "Prefix lock is held by another launcher process",
        )),
        Err(e) => {
            *all_pass = false;
            checks.push(Check::fail(
                "prefix_lock",
                &format!("Cannot check prefix lock: {e}"),
            ));
        }
    }
}

fn print_results(checks: &[Check], all_pass: bool, json_output: bool) -> Result<u8, String> {
    if json_output {
        let json = serde_json::json!({
            "healthy": all_pass,
            "checks": checks.iter().map(|c| serde_json::json!({
                "name": c.name,
                "status": c.status,
                "message": c.message,
            })).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).map_err(|e| e.to_string())?
        );
    } else {
        println!("Synastria Doctor\n");
        for check in checks {
            let icon = match check.status {
                "pass" => "✓",
                "fail" => "✗",
                "warn" => "⚠",
                _ => "ℹ",
            };
            println!("  {icon} {}", check.message);
        }
        println!();
        if all_pass {
            println!("All checks passed.");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }
    Ok(if all_pass { EXIT_SUCCESS } else { EXIT_FAILURE })
}

struct Check {
    name: &'static str,
    status: &'static str,
    message: String,
}

impl Check {
    fn new(name: &'static str, status: &'static str, message: &str) -> Self {
        Self {
            name,
            status,
            message: message.to_owned(),
        }
    }

    fn pass(name: &'static str, message: &str) -> Self {
        Self::new(name, "pass", message)
    }

    fn fail(name: &'static str, message: &str) -> Self {
        Self::new(name, "fail", message)
    }

    fn warn(name: &'static str, message: &str) -> Self {
        Self::new(name, "warn", message)
    }

    fn info(name: &'static str, message: &str) -> Self {
        Self::new(name, "info", message)
    }
}

#[cfg(unix)]
fn check_disk_space(config_dir: &Path, checks: &mut Vec<Check>) {
    // Prefixes land below the config dir, which may not exist yet.
    let Some(existing) = config_dir.ancestors().find(|p| p.exists()) else {
        return;
    };
    let Ok(c_path) = std::ffi::CString::new(existing.to_string_lossy().as_bytes()) else {
        return;
    };

    // SAFETY: zeroed statvfs is a valid initial state for the struct.
    #[allow(unsafe_code, clippy::undocumented_unsafe_blocks)]
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    // SAFETY: statvfs with a valid, NUL-terminated path and a properly
    // zeroed output struct is well-defined. The struct is only read after
    // the call succeeds.
    #[allow(unsafe_code, clippy::undocumented_unsafe_blocks)]
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), &raw mut stat) };
    if ret != 0 {
        return;
    }

    #[allow(clippy::unnecessary_cast)]
    let avail_mb = (stat.f_bavail as u64 * stat.f_frsize as u64) / (1024 * 1024);

    // A fresh Proton prefix takes roughly a gigabyte.
    if avail_mb < 1024 {
        checks.push(Check::warn(
            "disk_space",
            &format!("Low disk space for prefixes: {avail_mb} MB available"),
        ));
    } else {
        checks.push(Check::pass(
            "disk_space",
            &format!("Disk space: {} GB available", avail_mb / 1024),
        ));
    }
}

#[cfg(not(unix))]
fn check_disk_space(_config_dir: &Path, _checks: &mut Vec<Check>) {}
