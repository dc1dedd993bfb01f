use super::{load_instance, EXIT_SUCCESS};
use isctl_core::Controller;
use std::io::Write;
use std::path::Path;

/// Identity the script's sessions run under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunAs {
    Current,
    Owner,
    Manager,
    User(String),
}

pub fn run(
    controller: &Controller,
    name: &str,
    namespace: &str,
    file: &Path,
    run_as: &RunAs,
) -> Result<u8, String> {
    let mut inst = load_instance(controller, name)?;
    match run_as {
        RunAs::Current => inst.as_current_user(),
        RunAs::Owner => inst.as_owner().map_err(|e| e.to_string())?,
        RunAs::Manager => inst.as_manager().map_err(|e| e.to_string())?,
        RunAs::User(user) => inst.as_user(user).map_err(|e| e.to_string())?,
    }

    let stdout = std::io::stdout();
    let mut sink = stdout.lock();
    let result = if file == Path::new("-") {
        controller.execute(&inst, namespace, &mut std::io::stdin().lock(), &mut sink)
    } else {
        let mut script = std::fs::File::open(file)
            .map_err(|e| format!("failed to read {}: {e}", file.display()))?;
        controller.execute(&inst, namespace, &mut script, &mut sink)
    };
    let _ = sink.flush();
    result.map_err(|e| e.to_string())?;
    Ok(EXIT_SUCCESS)
}
