use crate::discovery::{discover, AvailableCommands};
use crate::privilege::Credential;
use crate::session::SessionCommand;
use crate::{RuntimeError, Toolchain};
use isctl_schema::Product;
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use tracing::debug;

/// Exit code and combined output of a finished tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// `None` when the tool was killed by a signal.
    pub code: Option<i32>,
    pub output: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// One command to run through a session tool.
#[derive(Debug, Clone, Copy)]
pub struct SessionRequest<'a> {
    pub product: Product,
    pub instance: &'a str,
    pub namespace: &'a str,
    pub command: &'a str,
    pub credential: Option<&'a Credential>,
}

pub trait ControlBackend: Send + Sync {
    fn name(&self) -> &str;

    fn available(&self) -> AvailableCommands;

    /// Raw `qlist` output for one instance, or for all of them when `name` is
    /// `None`. Empty when no control tool is installed.
    fn qlist(&self, name: Option<&str>) -> Result<String, RuntimeError>;

    /// Run the control tool with `args`.
    fn control(
        &self,
        product: Product,
        args: &[&str],
        credential: Option<&Credential>,
    ) -> Result<ToolOutput, RuntimeError>;

    /// Run one command through the session tool, streaming its output into
    /// `sink`. Returns the exit code.
    fn session(
        &self,
        request: &SessionRequest<'_>,
        sink: &mut dyn Write,
    ) -> Result<Option<i32>, RuntimeError>;
}

impl<T: ControlBackend + ?Sized> ControlBackend for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn available(&self) -> AvailableCommands {
        (**self).available()
    }

    fn qlist(&self, name: Option<&str>) -> Result<String, RuntimeError> {
        (**self).qlist(name)
    }

    fn control(
        &self,
        product: Product,
        args: &[&str],
        credential: Option<&Credential>,
    ) -> Result<ToolOutput, RuntimeError> {
        (**self).control(product, args, credential)
    }

    fn session(
        &self,
        request: &SessionRequest<'_>,
        sink: &mut dyn Write,
    ) -> Result<Option<i32>, RuntimeError> {
        (**self).session(request, sink)
    }
}

pub fn select_backend(
    name: &str,
    toolchain: &Toolchain,
) -> Result<Box<dyn ControlBackend>, RuntimeError> {
    match name {
        "system" => Ok(Box::new(SystemBackend::new(toolchain.clone()))),
        "mock" => Ok(Box::new(crate::mock::MockBackend::new())),
        other => Err(RuntimeError::BackendUnavailable(other.to_owned())),
    }
}

/// Drives the real administration tools as subprocesses.
#[derive(Debug, Clone)]
pub struct SystemBackend {
    toolchain: Toolchain,
}

impl SystemBackend {
    pub fn new(toolchain: Toolchain) -> Self {
        Self { toolchain }
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Control tool for `product`: `iris` for IRIS when installed, else
    /// `ccontrol`, else `iris`.
    fn control_program(&self, product: Product, available: AvailableCommands) -> &str {
        if product == Product::Iris && available.has(AvailableCommands::IRIS) {
            &self.toolchain.iris_path
        } else if available.has(AvailableCommands::CCONTROL) {
            &self.toolchain.ccontrol_path
        } else {
            &self.toolchain.iris_path
        }
    }

    fn session_command(&self, product: Product, available: AvailableCommands) -> SessionCommand {
        let iris = SessionCommand::parse(&self.toolchain.iris_session_command);
        if product == Product::Iris && available.has(AvailableCommands::IRIS) {
            iris
        } else if available.has(AvailableCommands::CSESSION) {
            SessionCommand::parse(&self.toolchain.csession_path)
        } else {
            iris
        }
    }
}

fn run_captured(mut cmd: Command) -> Result<ToolOutput, RuntimeError> {
    cmd.stdin(Stdio::null());
    let out = cmd.output()?;
    let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(&out.stderr));
    Ok(ToolOutput {
        code: out.status.code(),
        output,
    })
}

impl ControlBackend for SystemBackend {
    fn name(&self) -> &'static str {
        "system"
    }

    fn available(&self) -> AvailableCommands {
        discover(&self.toolchain)
    }

    fn qlist(&self, name: Option<&str>) -> Result<String, RuntimeError> {
        let available = self.available();
        let program = if available.has(AvailableCommands::IRIS) {
            &self.toolchain.iris_path
        } else if available.has(AvailableCommands::CCONTROL) {
            &self.toolchain.ccontrol_path
        } else {
            debug!("no control tool installed, qlist is empty");
            return Ok(String::new());
        };

        let mut cmd = Command::new(program);
        cmd.arg("qlist");
        if let Some(name) = name {
            cmd.arg(name);
        }

        let out = run_captured(cmd)?;
        if !out.success() {
            debug!(program, code = ?out.code, output = %out.output, "qlist failed");
            return Err(RuntimeError::ExecFailed(format!(
                "error running qlist: {}",
                out.output.trim()
            )));
        }
        Ok(out.output.trim().to_owned())
    }

    fn control(
        &self,
        product: Product,
        args: &[&str],
        credential: Option<&Credential>,
    ) -> Result<ToolOutput, RuntimeError> {
        let program = self.control_program(product, self.available());
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(c) = credential {
            c.apply(&mut cmd);
        }
        debug!(program, ?args, user = credential.map(|c| c.user.as_str()), "running control tool");
        run_captured(cmd)
    }

    fn session(
        &self,
        request: &SessionRequest<'_>,
        sink: &mut dyn Write,
    ) -> Result<Option<i32>, RuntimeError> {
        let session = self.session_command(request.product, self.available());
        let args = session.args(request.instance, request.namespace, request.command);

        let mut cmd = Command::new(&session.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(c) = request.credential {
            c.apply(&mut cmd);
        }
        debug!(
            program = %session.program,
            ?args,
            user = request.credential.map(|c| c.user.as_str()),
            "running session"
        );

        let mut child = cmd.spawn()?;
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                pipe.read_to_end(&mut buf).map(|_| buf)
            })
        });
        let copied = match child.stdout.take() {
            Some(mut stdout) => std::io::copy(&mut stdout, sink).map(drop),
            None => Ok(()),
        };
        if let Err(e) = &copied {
            debug!(program = %session.program, "output sink failed, killing session: {e}");
            if let Err(e) = child.kill() {
                debug!(program = %session.program, "failed to kill session: {e}");
            }
        }
        // Reap the child and the reader on every path before reporting.
        let status = child.wait();
        let captured = match stderr {
            Some(handle) => handle
                .join()
                .map_err(|_| RuntimeError::ExecFailed("stderr reader panicked".to_owned()))?,
            None => Ok(Vec::new()),
        };
        copied?;
        let status = status?;
        sink.write_all(&captured?)?;
        sink.flush()?;
        Ok(status.code())
    }
}
