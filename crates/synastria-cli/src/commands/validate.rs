use super::{invalid_directory_hint, json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use std::path::Path;
use synastria_core::Launcher;

pub fn run(launcher: &Launcher, client_dir: &Path, json: bool) -> Result<u8, String> {
    let executables = launcher.find_executables(client_dir);
    let valid = !executables.is_empty();
    let has_extended = executables.iter().any(synastria_core::Executable::is_extended);

    if json {
        let payload = serde_json::json!({
            "valid": valid,
            "extended_client": has_extended,
            "executables": executables.iter().map(|e| &e.display_name).collect::<Vec<_>>(),
        });
        println!("{}", json_pretty(&payload)?);
    } else if valid {
        println!("{} is a valid client directory", client_dir.display());
        if !has_extended {
            println!("note: wowext.exe not found; the base client will be launched");
        }
    } else {
        println!("{}: {}", client_dir.display(), invalid_directory_hint(launcher.platform()));
    }

    Ok(if valid { EXIT_SUCCESS } else { EXIT_FAILURE })
}
