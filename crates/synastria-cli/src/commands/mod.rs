pub mod completions;
pub mod doctor;
pub mod executables;
pub mod info;
pub mod init_prefix;
pub mod launch;
pub mod layers;
pub mod man_pages;
pub mod prefix;
pub mod settings;
pub mod validate;

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use synastria_core::{LaunchResult, LauncherSettings, Platform};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_LAUNCH_ERROR: u8 = 2;
pub const EXIT_CONFIG_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_kind(kind: &str) -> String {
    use console::Style;
    match kind {
        "native" => Style::new().green().apply_to(kind).to_string(),
        "via_compat_layer" => Style::new().cyan().apply_to(kind).to_string(),
        "preferred" | "default" => Style::new().bold().apply_to(kind).to_string(),
        other => other.to_owned(),
    }
}

pub fn load_settings(path: &Path) -> Result<LauncherSettings, String> {
    LauncherSettings::load_or_default(path).map_err(|e| format!("config error: {e}"))
}

/// Print a launcher outcome and turn it into an exit code.
///
/// With `--json` the result object itself carries the failure, so only the
/// exit code reports it; otherwise the message goes through the usual
/// `error:` path prefixed with `context`.
pub fn finish(result: &LaunchResult, context: &str, json: bool) -> Result<u8, String> {
    if json {
        println!("{}", json_pretty(result)?);
        return Ok(if result.success {
            EXIT_SUCCESS
        } else {
            EXIT_LAUNCH_ERROR
        });
    }
    if !result.success {
        return Err(format!("{context}: {}", result.message));
    }
    println!("{}", result.message);
    if let Some(layer) = &result.compatibility_layer_name {
        println!("layer:  {layer}");
    }
    if let Some(prefix) = &result.prefix_path {
        println!("prefix: {}", prefix.display());
    }
    Ok(EXIT_SUCCESS)
}

/// What the user should do about a directory without a launchable client.
pub fn invalid_directory_hint(platform: Platform) -> &'static str {
    if platform.is_linux() {
        "directory does not contain wow.exe or wowext.exe. On Linux, you need the Windows WoW client files to run via Proton-GE."
    } else {
        "directory does not contain wow.exe or wowext.exe. Please select a valid WoW client folder."
    }
}
