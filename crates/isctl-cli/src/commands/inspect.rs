use super::{colorize_status, json_pretty, load_instance, EXIT_SUCCESS};
use isctl_core::Controller;

fn or_none(value: &str) -> &str {
    if value.is_empty() {
        "(none)"
    } else {
        value
    }
}

pub fn run(controller: &Controller, name: &str, json: bool) -> Result<u8, String> {
    let inst = load_instance(controller, name)?;
    if json {
        println!("{}", json_pretty(&inst)?);
    } else {
        println!("name:           {}", inst.name);
        println!("product:        {}", inst.product);
        println!("version:        {}", inst.version);
        println!("status:         {}", colorize_status(inst.status));
        println!("activity:       {}", or_none(&inst.activity));
        println!("state:          {}", inst.state);
        println!("directory:      {}", inst.directory.display());
        println!("data_directory: {}", inst.data_directory.display());
        println!("cpf:            {}", inst.cpf_path().display());
        println!("superserver:    {}", inst.super_server_port);
        println!("webserver:      {}", inst.web_server_port);
        println!("jdbc:           {}", inst.jdbc_port);
        println!("mirror_member:  {}", inst.mirror_member_type.as_deref().unwrap_or("(none)"));
        println!("mirror_status:  {}", inst.mirror_status.as_deref().unwrap_or("(none)"));
    }
    Ok(EXIT_SUCCESS)
}
