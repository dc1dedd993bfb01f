use super::{json_pretty, load_instance, EXIT_SUCCESS};
use isctl_core::Controller;
use isctl_schema::JournalDirectory;

pub fn run(controller: &Controller, name: &str, alternate: bool, json: bool) -> Result<u8, String> {
    let inst = load_instance(controller, name)?;
    let which = if alternate {
        JournalDirectory::Alternate
    } else {
        JournalDirectory::Current
    };
    let dir = inst.journal_directory(which).map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&dir)?);
    } else {
        println!("{dir}");
    }
    Ok(EXIT_SUCCESS)
}
