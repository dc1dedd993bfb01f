use super::{json_pretty, EXIT_SUCCESS};
use isctl_core::Controller;

pub fn run(controller: &Controller, json: bool) -> Result<u8, String> {
    let names = controller.available_commands().names();
    if json {
        println!("{}", json_pretty(&names)?);
    } else if names.is_empty() {
        println!("no administration tools found");
    } else {
        for name in names {
            println!("{name}");
        }
    }
    Ok(EXIT_SUCCESS)
}
