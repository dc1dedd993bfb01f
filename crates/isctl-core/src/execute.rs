use crate::{Controller, CoreError, Instance};
use isctl_runtime::{ImportDescription, SessionRequest, Toolchain};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tempfile::TempPath;
use tracing::{debug, warn};

/// Printed by the import when every item loaded and compiled.
pub const LOAD_SUCCESS_MARKER: &str = "Load finished successfully.";

/// Compile and keep source.
const IMPORT_QUALIFIERS: &str = "ck";

const ENTRY_POINT: &str = "IsctlMain";

/// A routine export wrapping a script, staged in a temporary file.
struct RoutineFile {
    path: TempPath,
    name: String,
}

impl RoutineFile {
    fn write(toolchain: &Toolchain, script: &mut dyn Read) -> Result<Self, CoreError> {
        let mut builder = tempfile::Builder::new();
        builder
            .prefix(&toolchain.routine_prefix)
            .suffix(".xml")
            .rand_bytes(8);
        let tmp = match &toolchain.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let name = tmp
            .path()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut out = BufWriter::new(tmp);
        write_header(&mut out, &name)?;
        std::io::copy(script, &mut out)?;
        out.write_all(ROUTINE_FOOTER.as_bytes())?;
        let tmp = out
            .into_inner()
            .map_err(std::io::IntoInnerError::into_error)?;
        tmp.as_file().sync_all()?;

        Ok(Self {
            path: tmp.into_temp_path(),
            name,
        })
    }
}

/// Routine export header. The entry point runs the script's `MAIN` label
/// and halts the process with a non-zero code on any exception.
fn write_header(out: &mut impl Write, routine: &str) -> std::io::Result<()> {
    write!(
        out,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Export generator="Cache" version="25">
<Routine name="{routine}" type="MAC" languagemode="0"><![CDATA[
{ENTRY_POINT}() public {{
	try {{
		do MAIN
	}} catch ex {{
		do BACK^%ETN
		use 0
		write !,"Exception: ",ex.DisplayString(),!,"  name: ",ex.Name,!,"  code: ",ex.Code,!
		do $zutil(4, $job, 99)
	}}
}}

"#
    )
}

const ROUTINE_FOOTER: &str = "
]]></Routine>
</Export>
";

impl Controller {
    /// Run `script` in `namespace`, streaming its output into `sink`.
    ///
    /// The script is INT code whose entry label is `MAIN`. It is imported as a
    /// temporary routine under the instance's credential, invoked, and
    /// deleted again once the import session has run, whether or not the
    /// load or the invocation succeeded.
    pub fn execute(
        &self,
        instance: &Instance,
        namespace: &str,
        script: &mut dyn Read,
        sink: &mut dyn Write,
    ) -> Result<(), CoreError> {
        debug!(instance = %instance.name, namespace, "executing script");
        let routine = RoutineFile::write(self.toolchain(), script)?;
        debug!(path = %routine.path.display(), routine = %routine.name, "staged routine");

        if let Some(credential) = instance.credential() {
            credential.chown(&routine.path)?;
        }

        let result = match self.import(instance, namespace, &routine.path) {
            Ok(()) => self.invoke(instance, namespace, &routine.name, sink),
            // The source may be saved even when compilation failed.
            Err(e @ CoreError::LoadFailed { .. }) => Err(e),
            Err(e) => return Err(e),
        };
        self.delete_routine(instance, namespace, &routine.name);

        if let Err(e) = routine.path.close() {
            warn!(routine = %routine.name, "failed to remove routine file: {e}");
        }
        result
    }

    /// [`execute`](Self::execute) for an in-memory script, returning the
    /// captured output.
    pub fn execute_string(
        &self,
        instance: &Instance,
        namespace: &str,
        code: &str,
    ) -> Result<String, CoreError> {
        let mut out = Vec::new();
        self.execute(instance, namespace, &mut code.as_bytes(), &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn session(
        &self,
        instance: &Instance,
        namespace: &str,
        command: &str,
        sink: &mut dyn Write,
    ) -> Result<Option<i32>, CoreError> {
        let request = SessionRequest {
            product: instance.product,
            instance: &instance.name,
            namespace,
            command,
            credential: instance.credential(),
        };
        Ok(self.backend().session(&request, sink)?)
    }

    fn import(&self, instance: &Instance, namespace: &str, path: &Path) -> Result<(), CoreError> {
        let glob = path.to_string_lossy();
        let command = ImportDescription::new(&glob, IMPORT_QUALIFIERS)?.to_string();
        debug!(namespace, %command, "importing routine");

        let mut captured = Vec::new();
        let code = self.session(instance, namespace, &command, &mut captured)?;
        let output = String::from_utf8_lossy(&captured).into_owned();
        if code != Some(0) || !output.contains(LOAD_SUCCESS_MARKER) {
            return Err(CoreError::LoadFailed { output });
        }
        Ok(())
    }

    fn invoke(
        &self,
        instance: &Instance,
        namespace: &str,
        routine: &str,
        sink: &mut dyn Write,
    ) -> Result<(), CoreError> {
        let command = format!("{ENTRY_POINT}^{routine}");
        debug!(namespace, %command, "invoking entry point");
        match self.session(instance, namespace, &command, sink)? {
            Some(0) => Ok(()),
            code => Err(CoreError::ExecFailed {
                namespace: namespace.to_owned(),
                code,
            }),
        }
    }

    /// Remove the imported routine. Failures are logged only.
    fn delete_routine(&self, instance: &Instance, namespace: &str, routine: &str) {
        let command = format!(r#"##class(%Routine).Delete("{routine}.MAC",2)"#);
        let mut captured = Vec::new();
        match self.session(instance, namespace, &command, &mut captured) {
            Ok(Some(0)) => debug!(routine, "deleted routine"),
            Ok(code) => warn!(
                routine,
                ?code,
                output = %String::from_utf8_lossy(&captured),
                "failed to delete routine"
            ),
            Err(e) => warn!(routine, "failed to delete routine: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routine_file_wraps_script() {
        let dir = tempfile::tempdir().unwrap();
        let toolchain = Toolchain {
            temp_dir: Some(dir.path().to_path_buf()),
            ..Toolchain::default()
        };
        let script = "MAIN\n write \"hi\"\n quit\n\n";
        let routine = RoutineFile::write(&toolchain, &mut script.as_bytes()).unwrap();

        assert!(routine.name.starts_with(&toolchain.routine_prefix));
        assert!(routine.name.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(routine.path.parent(), Some(dir.path()));

        let content = std::fs::read_to_string(&routine.path).unwrap();
        assert!(content.contains(&format!("<Routine name=\"{}\"", routine.name)));
        assert!(content.contains("IsctlMain() public {"));
        assert!(content.contains("do BACK^%ETN"));
        assert!(content.contains(script));
        assert!(content.ends_with("]]></Routine>\n</Export>\n"));
    }

    #[test]
    fn routine_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let toolchain = Toolchain {
            temp_dir: Some(dir.path().to_path_buf()),
            ..Toolchain::default()
        };
        let routine = RoutineFile::write(&toolchain, &mut "MAIN\n".as_bytes()).unwrap();
        drop(routine);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
