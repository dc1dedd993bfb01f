use crate::RuntimeError;
use nix::unistd::{Gid, Uid, User};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Identity attached to spawned administration tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub user: String,
    pub uid: Uid,
    pub gid: Gid,
}

impl Credential {
    /// Run `command` as this identity once spawned.
    pub fn apply(&self, command: &mut Command) {
        command.uid(self.uid.as_raw()).gid(self.gid.as_raw());
    }

    /// Hand `path` over to this identity.
    pub fn chown(&self, path: &Path) -> Result<(), RuntimeError> {
        nix::unistd::chown(path, Some(self.uid), Some(self.gid))
            .map_err(|e| RuntimeError::Io(std::io::Error::from(e)))
    }
}

fn lookup_uid(uid: Uid) -> Result<User, RuntimeError> {
    User::from_uid(uid)
        .map_err(|e| RuntimeError::IdentityLookup(format!("uid {uid}: {e}")))?
        .ok_or_else(|| RuntimeError::UnknownUser(format!("uid {uid}")))
}

/// Name of the user running this process.
pub fn current_user_name() -> Result<String, RuntimeError> {
    Ok(lookup_uid(Uid::current())?.name)
}

/// Resolve the credential needed to run tools as `name`.
///
/// Returns `None` when this process already runs as `name`. Switching to any
/// other user requires an effective uid of 0.
pub fn credential_for(name: &str) -> Result<Option<Credential>, RuntimeError> {
    if current_user_name()? == name {
        debug!(user = name, "already running as requested user");
        return Ok(None);
    }

    if !Uid::effective().is_root() {
        return Err(RuntimeError::NotSuperuser {
            user: name.to_owned(),
        });
    }

    let user = User::from_name(name)
        .map_err(|e| RuntimeError::IdentityLookup(format!("{name}: {e}")))?
        .ok_or_else(|| RuntimeError::UnknownUser(name.to_owned()))?;

    debug!(user = name, uid = %user.uid, gid = %user.gid, "resolved execution user");
    Ok(Some(Credential {
        user: user.name,
        uid: user.uid,
        gid: user.gid,
    }))
}
