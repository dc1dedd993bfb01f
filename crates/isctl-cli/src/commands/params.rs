use super::{json_pretty, load_instance, EXIT_FAILURE, EXIT_SUCCESS};
use isctl_core::Controller;

pub fn run(controller: &Controller, name: &str, key: Option<&str>, json: bool) -> Result<u8, String> {
    let inst = load_instance(controller, name)?;
    let params = inst.parameters().map_err(|e| e.to_string())?;

    if let Some(key) = key {
        let values = params.values(key);
        if json {
            println!("{}", json_pretty(&values)?);
        } else {
            for value in values {
                println!("{value}");
            }
        }
        return Ok(if values.is_empty() {
            EXIT_FAILURE
        } else {
            EXIT_SUCCESS
        });
    }

    if json {
        println!("{}", json_pretty(&params)?);
    } else {
        for entry in params.entries() {
            println!("{}: {}", entry.key(), entry.values.join(", "));
        }
    }
    Ok(EXIT_SUCCESS)
}
