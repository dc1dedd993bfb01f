use super::{json_pretty, load_instance, EXIT_SUCCESS};
use isctl_core::Controller;

#[derive(serde::Serialize)]
struct Identity {
    owner_user: String,
    owner_group: String,
    manager_user: String,
    manager_group: String,
}

pub fn run(controller: &Controller, name: &str, json: bool) -> Result<u8, String> {
    let inst = load_instance(controller, name)?;
    let (owner_user, owner_group) = inst.determine_owner().map_err(|e| e.to_string())?;
    let (manager_user, manager_group) = inst.determine_manager().map_err(|e| e.to_string())?;
    let identity = Identity {
        owner_user,
        owner_group,
        manager_user,
        manager_group,
    };

    if json {
        println!("{}", json_pretty(&identity)?);
    } else {
        println!("owner:   {}:{}", identity.owner_user, identity.owner_group);
        println!("manager: {}:{}", identity.manager_user, identity.manager_group);
    }
    Ok(EXIT_SUCCESS)
}
