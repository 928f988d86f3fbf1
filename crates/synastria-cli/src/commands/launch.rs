use super::{finish, load_settings};
use std::path::Path;
use synastria_core::{LaunchOptions, Launcher, LayerChoice, TuningFlags};

pub fn run(
    launcher: &Launcher,
    settings_path: &Path,
    client_dir: &Path,
    layer: Option<&str>,
    prefix: Option<&Path>,
    tuning: &TuningFlags,
    json: bool,
) -> Result<u8, String> {
    let settings = load_settings(settings_path)?;

    let options = LaunchOptions {
        layer: layer
            .or(settings.compat_layer.as_deref())
            .map(|name| LayerChoice::Named(name.to_owned())),
        prefix: prefix.map(Path::to_path_buf),
        tuning: settings.tuning.merged_with(tuning),
    };

    let result = launcher.launch(client_dir, &options);
    finish(&result, "launch failed", json)
}
