use super::{json_pretty, EXIT_SUCCESS};
use std::path::Path;
use synastria_core::Launcher;

pub fn run(launcher: &Launcher, client_dir: &Path, json: bool) -> Result<u8, String> {
    let prefix = launcher.prefix_path_for(client_dir);
    if prefix.is_none() && launcher.platform().is_linux() {
        return Err(format!(
            "cannot derive a prefix name from client directory {}",
            client_dir.display()
        ));
    }
    if json {
        let payload = serde_json::json!({
            "prefix_path": prefix,
            "exists": prefix.as_deref().is_some_and(Path::is_dir),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        match prefix {
            Some(path) => println!("{}", path.display()),
            None => println!("no prefix is needed on {}", launcher.platform()),
        }
    }
    Ok(EXIT_SUCCESS)
}
