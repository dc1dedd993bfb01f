pub mod available;
pub mod completions;
pub mod databases;
pub mod exec;
pub mod identity;
pub mod inspect;
pub mod journal;
pub mod list;
pub mod params;
pub mod start;
pub mod stop;
pub mod wait;
pub mod zstu;

use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use isctl_core::{Controller, Instance};
use isctl_schema::InstanceStatus;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_STATE_ERROR: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_status(status: InstanceStatus) -> String {
    use console::Style;
    let text = status.to_string();
    match status {
        InstanceStatus::Running => Style::new().green().apply_to(text).to_string(),
        InstanceStatus::Down => Style::new().dim().apply_to(text).to_string(),
        InstanceStatus::Inhibited | InstanceStatus::PrimaryTransition => {
            Style::new().yellow().apply_to(text).to_string()
        }
        InstanceStatus::MissingIds => Style::new().cyan().apply_to(text).to_string(),
        InstanceStatus::Unknown => Style::new().red().apply_to(text).to_string(),
    }
}

pub fn load_instance(controller: &Controller, name: &str) -> Result<Instance, String> {
    controller.load_instance(name).map_err(|e| e.to_string())
}
