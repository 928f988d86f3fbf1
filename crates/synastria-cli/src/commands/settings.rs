use super::{json_pretty, load_settings, EXIT_SUCCESS};
use std::path::Path;

pub fn run(settings_path: &Path, init: bool, json: bool) -> Result<u8, String> {
    let settings = load_settings(settings_path)?;
    if init {
        settings
            .save(settings_path)
            .map_err(|e| format!("failed to write {}: {e}", settings_path.display()))?;
    }

    if json {
        println!("{}", json_pretty(&settings)?);
        return Ok(EXIT_SUCCESS);
    }

    if init {
        println!("settings written to {}", settings_path.display());
    }
    println!("file:          {}", settings_path.display());
    println!(
        "layer:         {}",
        settings.compat_layer.as_deref().unwrap_or("(newest installed)")
    );
    println!("init_timeout:  {}s", settings.init_timeout().as_secs());
    let tuning = &settings.tuning;
    println!("wined3d:       {}", tuning.use_wined3d);
    println!("no_esync:      {}", tuning.no_esync);
    println!("no_fsync:      {}", tuning.no_fsync);
    println!("cpu_topology:  {}", tuning.cpu_topology());
    println!("dxvk_hud:      {}", tuning.dxvk_hud());
    println!("wine_debug:    {}", tuning.wine_debug());
    Ok(EXIT_SUCCESS)
}
