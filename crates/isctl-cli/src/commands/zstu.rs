use super::{json_pretty, Toggle, EXIT_SUCCESS};
use isctl_schema::toggle_zstu;
use std::path::Path;

#[derive(serde::Serialize)]
struct ZstuChange {
    previous: bool,
    current: bool,
}

pub fn run(cpf: &Path, setting: Toggle, json: bool) -> Result<u8, String> {
    let on = setting.is_on();
    let previous = toggle_zstu(cpf, on).map_err(|e| format!("config file error: {e}"))?;
    if json {
        println!(
            "{}",
            json_pretty(&ZstuChange {
                previous,
                current: on,
            })?
        );
    } else {
        let label = |v: bool| if v { "on" } else { "off" };
        println!("ZSTU {} -> {} in {}", label(previous), label(on), cpf.display());
    }
    Ok(EXIT_SUCCESS)
}
