use super::{colorize_status, json_pretty, EXIT_SUCCESS};
use isctl_core::Controller;

pub fn run(controller: &Controller, json: bool) -> Result<u8, String> {
    let instances = controller.load_instances().map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&instances)?);
    } else if instances.is_empty() {
        println!("no instances found");
    } else {
        println!(
            "{:<16} {:<8} {:<14} {:<10} DIRECTORY",
            "NAME", "PRODUCT", "VERSION", "STATUS"
        );
        for inst in &instances {
            println!(
                "{:<16} {:<8} {:<14} {:<10} {}",
                inst.name,
                inst.product.to_string(),
                inst.version,
                colorize_status(inst.status),
                inst.directory.display()
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
