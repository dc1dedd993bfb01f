use isctl_runtime::Credential;
use isctl_schema::{InstanceStatus, Product};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Snapshot of one installed instance, as last reported by `qlist`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Instance {
    /// Administrative name; unique and case-insensitive.
    pub name: String,
    pub directory: PathBuf,
    /// Where the instance keeps its data. Equals `directory` unless the
    /// instance runs with a durable data directory.
    pub data_directory: PathBuf,
    pub product: Product,
    pub version: String,
    pub status: InstanceStatus,
    /// Free text following the status, e.g. `since Fri May 13 22:07:02 2016`.
    pub activity: String,
    pub cpf_file_name: String,
    pub super_server_port: u16,
    pub web_server_port: u16,
    pub jdbc_port: u16,
    pub state: String,
    pub mirror_member_type: Option<String>,
    pub mirror_status: Option<String>,
    #[serde(skip)]
    pub(crate) credential: Option<Credential>,
}

impl Instance {
    /// An instance known only by name, filled in by the first update.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    /// Identity attached to tools spawned for this instance, if any.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Full path of the CPF file the instance starts with.
    pub fn cpf_path(&self) -> PathBuf {
        let cpf = Path::new(&self.cpf_file_name);
        if cpf.is_absolute() {
            cpf.to_path_buf()
        } else {
            self.data_directory.join(cpf)
        }
    }
}
