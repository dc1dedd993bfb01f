use crate::{CoreError, Instance};
use isctl_schema::{load_databases, load_journal_directory, JournalDirectory};
use nix::unistd::{Gid, Group, Uid, User};
use serde::Serialize;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

/// On-disk state of one database file listed in the CPF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatFile {
    pub name: String,
    pub path: PathBuf,
    /// `ls`-style mode string, e.g. `-rw-rw----`. Empty when missing.
    pub permissions: String,
    pub owner: String,
    pub group: String,
    pub exists: bool,
}

impl DatFile {
    pub fn inspect(name: &str, path: &Path) -> Result<Self, CoreError> {
        let meta = match std::fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self {
                    name: name.to_owned(),
                    path: path.to_path_buf(),
                    permissions: String::new(),
                    owner: String::new(),
                    group: String::new(),
                    exists: false,
                });
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            name: name.to_owned(),
            path: path.to_path_buf(),
            permissions: mode_string(&meta),
            owner: user_name(meta.uid()),
            group: group_name(meta.gid()),
            exists: true,
        })
    }
}

fn user_name(uid: u32) -> String {
    match User::from_uid(Uid::from_raw(uid)) {
        Ok(Some(user)) => user.name,
        _ => uid.to_string(),
    }
}

fn group_name(gid: u32) -> String {
    match Group::from_gid(Gid::from_raw(gid)) {
        Ok(Some(group)) => group.name,
        _ => gid.to_string(),
    }
}

fn mode_string(meta: &std::fs::Metadata) -> String {
    let ft = meta.file_type();
    let kind = if ft.is_dir() {
        'd'
    } else if ft.is_symlink() {
        'l'
    } else if ft.is_block_device() {
        'b'
    } else if ft.is_char_device() {
        'c'
    } else if ft.is_fifo() {
        'p'
    } else if ft.is_socket() {
        's'
    } else {
        '-'
    };

    let mode = meta.mode();
    let mut s = String::with_capacity(10);
    s.push(kind);
    for (shift, special, special_char) in [(6, 0o4000, 's'), (3, 0o2000, 's'), (0, 0o1000, 't')] {
        let bits = (mode >> shift) & 0o7;
        s.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        s.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        let exec = bits & 0o1 != 0;
        s.push(match (mode & special != 0, exec) {
            (true, true) => special_char,
            (true, false) => special_char.to_ascii_uppercase(),
            (false, true) => 'x',
            (false, false) => '-',
        });
    }
    s
}

impl Instance {
    /// Inspect every database in the CPF `[Databases]` section.
    pub fn databases(&self) -> Result<Vec<DatFile>, CoreError> {
        load_databases(self.cpf_path(), self.product)?
            .iter()
            .map(|(name, path)| DatFile::inspect(name, path))
            .collect()
    }

    pub fn journal_directory(&self, which: JournalDirectory) -> Result<String, CoreError> {
        Ok(load_journal_directory(self.cpf_path(), which)?)
    }
}
