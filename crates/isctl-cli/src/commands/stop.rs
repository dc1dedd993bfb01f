use super::{json_pretty, load_instance, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use isctl_core::Controller;

pub fn run(controller: &Controller, name: &str, json: bool) -> Result<u8, String> {
    let mut inst = load_instance(controller, name)?;
    let pb = (!json).then(|| spinner(&format!("stopping {name}...")));

    if let Err(e) = controller.stop(&mut inst) {
        if let Some(pb) = &pb {
            spin_fail(pb, &format!("{name} did not stop"));
        }
        return Err(e.to_string());
    }

    match &pb {
        Some(pb) => spin_ok(pb, &format!("{name} is {}", inst.status)),
        None => println!("{}", json_pretty(&inst)?),
    }
    Ok(EXIT_SUCCESS)
}
