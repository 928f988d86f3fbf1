use super::{colorize_kind, json_pretty, EXIT_SUCCESS};
use synastria_core::Launcher;

pub fn run(launcher: &Launcher, json: bool) -> Result<u8, String> {
    let layers = launcher.available_layers();
    if json {
        println!("{}", json_pretty(&layers)?);
    } else if !launcher.platform().is_linux() {
        println!(
            "compatibility layers are not used on {}",
            launcher.platform()
        );
    } else if layers.is_empty() {
        println!("no compatibility layers found");
        println!(
            "install Proton-GE from {}",
            synastria_core::PROTON_GE_URL
        );
    } else {
        println!("{:<24} {:<9} ENTRYPOINT", "NAME", "");
        for (i, layer) in layers.iter().enumerate() {
            let mark = if i == 0 { colorize_kind("default") } else { String::new() };
            println!(
                "{:<24} {:<9} {}",
                layer.name,
                mark,
                layer.runtime_entrypoint.display()
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
