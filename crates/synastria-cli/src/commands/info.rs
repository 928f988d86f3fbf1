use super::{json_pretty, EXIT_SUCCESS};
use synastria_core::Launcher;

pub fn run(launcher: &Launcher, json: bool) -> Result<u8, String> {
    let info = launcher.platform_info();
    if json {
        println!("{}", json_pretty(&info)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("platform:    {}", info.platform);
    println!("config_dir:  {}", info.config_dir.display());
    if info.is_linux {
        println!(
            "prefixes:    {}",
            launcher.dirs().prefix_root(info.platform).display()
        );
        if info.compatibility_layers.is_empty() {
            println!("layers:      (none)");
        } else {
            let names: Vec<_> = info
                .compatibility_layers
                .iter()
                .map(|l| l.name.as_str())
                .collect();
            println!("layers:      {}", names.join(", "));
        }
    }
    if let Some(steam) = &info.steam {
        println!("steam:       {}", steam.steam_dir.display());
        println!("steam_local: {}", steam.local_steam_dir.display());
        println!("compatdata:  {}", steam.compat_data_dir.display());
    }
    Ok(EXIT_SUCCESS)
}
