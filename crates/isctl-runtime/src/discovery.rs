use crate::Toolchain;
use bitflags::bitflags;
use tracing::debug;

bitflags! {
    /// Administration tools found on this system.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct AvailableCommands: u8 {
        const CCONTROL = 1 << 0;
        const CSESSION = 1 << 1;
        const IRIS = 1 << 2;
    }
}

impl AvailableCommands {
    pub fn mark(&mut self, command: Self) {
        self.insert(command);
    }

    pub fn unmark(&mut self, command: Self) {
        self.remove(command);
    }

    /// True when any of the bits in `command` is set.
    pub fn has(self, command: Self) -> bool {
        self.intersects(command)
    }

    pub fn names(self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Check which of the configured tools resolve on the search path.
/// Absolute paths are checked directly.
pub fn discover(toolchain: &Toolchain) -> AvailableCommands {
    let mut commands = AvailableCommands::empty();

    for (command, program) in [
        (AvailableCommands::IRIS, toolchain.iris_path.as_str()),
        (AvailableCommands::CCONTROL, toolchain.ccontrol_path.as_str()),
        (AvailableCommands::CSESSION, toolchain.csession_path.as_str()),
    ] {
        if command_exists(program) {
            commands.mark(command);
        } else {
            debug!(program, "executable not found");
        }
    }

    commands
}
