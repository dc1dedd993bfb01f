use super::{json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use isctl_core::{install_signal_handler, CancelToken, Controller, Instance};
use std::time::Duration;

pub fn run(controller: &Controller, name: &str, timeout: u64, json: bool) -> Result<u8, String> {
    let token = CancelToken::new();
    install_signal_handler(token.clone());

    // Starts empty so a missing instance surfaces from the first poll.
    let mut inst = Instance::named(name);
    let pb = (!json).then(|| spinner(&format!("waiting for {name}...")));

    let result = controller.wait_for_ready(&mut inst, Duration::from_secs(timeout), &token);
    if let Err(e) = result {
        if let Some(pb) = &pb {
            spin_fail(pb, &format!("{name} is {}", inst.status));
        }
        return Err(e.to_string());
    }

    match &pb {
        Some(pb) => spin_ok(pb, &format!("{name} is ready")),
        None => println!("{}", json_pretty(&inst)?),
    }
    Ok(EXIT_SUCCESS)
}
