use super::{finish, load_settings, spin_fail, spin_ok, spinner};
use std::path::Path;
use std::time::Duration;
use synastria_core::{Launcher, LayerChoice};

pub fn run(
    launcher: Launcher,
    settings_path: &Path,
    client_dir: &Path,
    layer: Option<&str>,
    timeout_secs: Option<u64>,
    json: bool,
) -> Result<u8, String> {
    let settings = load_settings(settings_path)?;
    let timeout = timeout_secs.map_or_else(|| settings.init_timeout(), Duration::from_secs);
    let launcher = launcher.with_init_timeout(timeout);
    let choice = layer
        .or(settings.compat_layer.as_deref())
        .map(|name| LayerChoice::Named(name.to_owned()));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start async runtime: {e}"))?;

    let pb = if json {
        None
    } else {
        Some(spinner("initializing prefix..."))
    };
    let result = runtime.block_on(launcher.initialize_prefix(client_dir, choice.as_ref()));
    if let Some(ref pb) = pb {
        if result.success {
            spin_ok(pb, "prefix ready");
        } else {
            spin_fail(pb, "prefix initialization failed");
        }
    }

    finish(&result, "prefix initialization failed", json)
}
