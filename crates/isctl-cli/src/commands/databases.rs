use super::{json_pretty, load_instance, EXIT_SUCCESS};
use isctl_core::Controller;

pub fn run(controller: &Controller, name: &str, json: bool) -> Result<u8, String> {
    let inst = load_instance(controller, name)?;
    let databases = inst.databases().map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&databases)?);
    } else if databases.is_empty() {
        println!("no databases configured");
    } else {
        println!(
            "{:<16} {:<11} {:<10} {:<10} PATH",
            "NAME", "MODE", "OWNER", "GROUP"
        );
        for db in &databases {
            if db.exists {
                println!(
                    "{:<16} {:<11} {:<10} {:<10} {}",
                    db.name,
                    db.permissions,
                    db.owner,
                    db.group,
                    db.path.display()
                );
            } else {
                println!("{:<16} {:<11} {:<10} {:<10} {}", db.name, "missing", "-", "-", db.path.display());
            }
        }
    }
    Ok(EXIT_SUCCESS)
}
