use super::{colorize_kind, json_pretty, EXIT_SUCCESS};
use std::path::Path;
use synastria_core::{select_preferred, Launcher};

pub fn run(launcher: &Launcher, client_dir: &Path, json: bool) -> Result<u8, String> {
    let executables = launcher.find_executables(client_dir);
    let preferred = select_preferred(&executables).map(|e| e.absolute_path.clone());

    if json {
        let payload: Vec<_> = executables
            .iter()
            .map(|exe| {
                serde_json::json!({
                    "display_name": exe.display_name,
                    "absolute_path": exe.absolute_path,
                    "kind": exe.kind,
                    "preferred": preferred.as_ref() == Some(&exe.absolute_path),
                })
            })
            .collect();
        println!("{}", json_pretty(&payload)?);
    } else if executables.is_empty() {
        println!("no WoW executable found in {}", client_dir.display());
    } else {
        println!("{:<14} {:<18} {:<9} PATH", "NAME", "KIND", "");
        for exe in &executables {
            let mark = if preferred.as_ref() == Some(&exe.absolute_path) {
                colorize_kind("preferred")
            } else {
                String::new()
            };
            println!(
                "{:<14} {:<18} {:<9} {}",
                exe.display_name,
                colorize_kind(exe.kind.as_str()),
                mark,
                exe.absolute_path.display()
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
