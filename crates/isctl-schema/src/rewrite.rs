use crate::SchemaError;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use tracing::debug;

/// A line-by-line rewrite of a text file, staged in a temporary file.
///
/// [`stage`](Self::stage) reads the source and writes the edited copy next to
/// it, closing both handles before it returns. Nothing touches the original
/// until [`commit`](Self::commit) streams the staged bytes over it, so the
/// original keeps its inode, owner and mode and is never left truncated by a
/// failed write. Dropping an uncommitted `Rewrite` removes the staged file.
#[derive(Debug)]
pub struct Rewrite {
    target: PathBuf,
    staged: TempPath,
}

impl Rewrite {
    /// Copy `path` into a temporary file, replacing each line for which `edit`
    /// returns `Some`. Lines are passed without their terminator; the original
    /// terminator is kept, and unedited lines are copied byte for byte.
    pub fn stage<F>(path: &Path, mut edit: F) -> Result<Self, SchemaError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut source = BufReader::new(File::open(path)?);
        let tmp = NamedTempFile::new_in(dir)?;
        let mut out = BufWriter::new(tmp);

        let mut raw = Vec::new();
        loop {
            raw.clear();
            if source.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            let (content, terminator) = split_terminator(&raw);
            match edit(&String::from_utf8_lossy(content)) {
                Some(replacement) => {
                    out.write_all(replacement.as_bytes())?;
                    out.write_all(terminator)?;
                }
                None => out.write_all(&raw)?,
            }
        }
        drop(source);

        let tmp = out.into_inner().map_err(std::io::IntoInnerError::into_error)?;
        tmp.as_file().sync_all()?;
        let staged = tmp.into_temp_path();
        debug!(
            target_file = %path.display(),
            staged = %staged.display(),
            "staged rewrite"
        );

        Ok(Self {
            target: path.to_path_buf(),
            staged,
        })
    }

    /// Replace the contents of the original file with the staged copy and
    /// remove the temporary file.
    pub fn commit(self) -> Result<(), SchemaError> {
        {
            let mut staged = File::open(&self.staged)?;
            let mut target = File::create(&self.target)?;
            std::io::copy(&mut staged, &mut target)?;
            target.sync_all()?;
        }
        self.staged.close()?;
        debug!(target_file = %self.target.display(), "committed rewrite");
        Ok(())
    }
}

fn split_terminator(line: &[u8]) -> (&[u8], &[u8]) {
    if line.ends_with(b"\r\n") {
        line.split_at(line.len() - 2)
    } else if line.ends_with(b"\n") {
        line.split_at(line.len() - 1)
    } else {
        (line, &[][..])
    }
}
