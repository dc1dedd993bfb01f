use crate::RuntimeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CCONTROL: &str = "ccontrol";
pub const DEFAULT_IRIS: &str = "iris";
pub const DEFAULT_CSESSION: &str = "csession";
pub const DEFAULT_IRIS_SESSION: &str = "iris session";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_ROUTINE_PREFIX: &str = "isctlexec";

/// Tool locations and execution settings.
///
/// Owned by whoever drives the tools; there is no process-global copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Toolchain {
    pub ccontrol_path: String,
    pub iris_path: String,
    pub csession_path: String,
    /// Session command for IRIS; may carry leading arguments.
    pub iris_session_command: String,
    /// Directory for the temporary routine files. `None` uses the system one.
    pub temp_dir: Option<PathBuf>,
    pub poll_interval_ms: u64,
    pub routine_prefix: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            ccontrol_path: DEFAULT_CCONTROL.to_owned(),
            iris_path: DEFAULT_IRIS.to_owned(),
            csession_path: DEFAULT_CSESSION.to_owned(),
            iris_session_command: DEFAULT_IRIS_SESSION.to_owned(),
            temp_dir: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            routine_prefix: DEFAULT_ROUTINE_PREFIX.to_owned(),
        }
    }
}

impl Toolchain {
    pub fn parse_str(input: &str) -> Result<Self, RuntimeError> {
        let toolchain: Self =
            toml::from_str(input).map_err(|e| RuntimeError::ToolchainConfig(e.to_string()))?;
        toolchain.validate()?;
        Ok(toolchain)
    }

    pub fn load(path: &Path) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_str(&content).map_err(|e| match e {
            RuntimeError::ToolchainConfig(msg) => {
                RuntimeError::ToolchainConfig(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Load `~/.config/isctl/toolchain.toml` if it exists, else the defaults.
    pub fn load_default() -> Result<Self, RuntimeError> {
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn validate(&self) -> Result<(), RuntimeError> {
        if self.poll_interval_ms == 0 {
            return Err(RuntimeError::ToolchainConfig(
                "poll_interval_ms must be greater than zero".to_owned(),
            ));
        }
        let routine_ok = self
            .routine_prefix
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '%')
            && self
                .routine_prefix
                .chars()
                .skip(1)
                .all(|c| c.is_ascii_alphanumeric());
        if !routine_ok {
            return Err(RuntimeError::ToolchainConfig(format!(
                "routine_prefix '{}' is not a valid routine name",
                self.routine_prefix
            )));
        }
        for (key, value) in [
            ("ccontrol_path", &self.ccontrol_path),
            ("iris_path", &self.iris_path),
            ("csession_path", &self.csession_path),
            ("iris_session_command", &self.iris_session_command),
        ] {
            if value.trim().is_empty() {
                return Err(RuntimeError::ToolchainConfig(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".config/isctl/toolchain.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_all_defaults() {
        let t = Toolchain::parse_str("").unwrap();
        assert_eq!(t, Toolchain::default());
        assert_eq!(t.iris_session_command, "iris session");
        assert_eq!(t.poll_interval(), Duration::from_millis(100));
    }

    #[test]
    fn partial_config_overrides_fields() {
        let t = Toolchain::parse_str(
            r#"
ccontrol_path = "/usr/bin/ccontrol"
temp_dir = "/var/tmp/isctl"
poll_interval_ms = 250
"#,
        )
        .unwrap();
        assert_eq!(t.ccontrol_path, "/usr/bin/ccontrol");
        assert_eq!(t.temp_dir, Some(PathBuf::from("/var/tmp/isctl")));
        assert_eq!(t.poll_interval_ms, 250);
        assert_eq!(t.csession_path, DEFAULT_CSESSION);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Toolchain::parse_str("cconrtol_path = \"x\"\n").unwrap_err();
        assert!(matches!(err, RuntimeError::ToolchainConfig(_)));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        assert!(Toolchain::parse_str("poll_interval_ms = 0\n").is_err());
    }

    #[test]
    fn routine_prefix_must_be_a_routine_name() {
        assert!(Toolchain::parse_str("routine_prefix = \"my-exec\"\n").is_err());
        assert!(Toolchain::parse_str("routine_prefix = \"9abc\"\n").is_err());
        assert!(Toolchain::parse_str("routine_prefix = \"MyExec\"\n").is_ok());
    }

    #[test]
    fn load_names_the_file_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toolchain.toml");
        std::fs::write(&path, "iris_path = 3\n").unwrap();
        let err = Toolchain::load(&path).unwrap_err();
        assert!(err.to_string().contains("toolchain.toml"));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Toolchain::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, RuntimeError::Io(_)));
    }
}
