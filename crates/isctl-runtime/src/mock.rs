use crate::backend::{ControlBackend, SessionRequest, ToolOutput};
use crate::discovery::AvailableCommands;
use crate::privilege::Credential;
use crate::RuntimeError;
use isctl_schema::Product;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::Mutex;

pub const LOAD_SUCCESS_OUTPUT: &str = "Load finished successfully.\n";

/// A recorded tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub tool: &'static str,
    pub args: Vec<String>,
    /// Name of the user the call would have run as.
    pub user: Option<String>,
}

/// Scripted backend for tests and dry runs.
///
/// `qlist` pops scripted records in order and keeps returning the last one.
/// Session calls pop scripted responses; with none queued an import reports
/// a successful load and anything else succeeds silently.
pub struct MockBackend {
    qlist: Mutex<VecDeque<String>>,
    control: Mutex<VecDeque<ToolOutput>>,
    sessions: Mutex<VecDeque<ToolOutput>>,
    calls: Mutex<Vec<MockCall>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            qlist: Mutex::new(VecDeque::new()),
            control: Mutex::new(VecDeque::new()),
            sessions: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> RuntimeError {
    RuntimeError::ExecFailed(format!("mutex poisoned: {e}"))
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_qlist(self, output: &str) -> Self {
        self.push_qlist(output);
        self
    }

    pub fn push_qlist(&self, output: &str) {
        if let Ok(mut q) = self.qlist.lock() {
            q.push_back(output.to_owned());
        }
    }

    pub fn push_control(&self, code: i32, output: &str) {
        if let Ok(mut q) = self.control.lock() {
            q.push_back(ToolOutput {
                code: Some(code),
                output: output.to_owned(),
            });
        }
    }

    pub fn push_session(&self, code: i32, output: &str) {
        if let Ok(mut q) = self.sessions.lock() {
            q.push_back(ToolOutput {
                code: Some(code),
                output: output.to_owned(),
            });
        }
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, tool: &'static str, args: Vec<String>, credential: Option<&Credential>) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(MockCall {
                tool,
                args,
                user: credential.map(|c| c.user.clone()),
            });
        }
    }
}

impl ControlBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn available(&self) -> AvailableCommands {
        AvailableCommands::all()
    }

    fn qlist(&self, name: Option<&str>) -> Result<String, RuntimeError> {
        let args = std::iter::once("qlist".to_owned())
            .chain(name.map(str::to_owned))
            .collect();
        self.record("control", args, None);

        let mut q = self.qlist.lock().map_err(poisoned)?;
        let out = if q.len() > 1 {
            q.pop_front().unwrap_or_default()
        } else {
            q.front().cloned().unwrap_or_default()
        };
        Ok(out)
    }

    fn control(
        &self,
        _product: Product,
        args: &[&str],
        credential: Option<&Credential>,
    ) -> Result<ToolOutput, RuntimeError> {
        self.record(
            "control",
            args.iter().map(|a| (*a).to_owned()).collect(),
            credential,
        );
        let scripted = self.control.lock().map_err(poisoned)?.pop_front();
        Ok(scripted.unwrap_or(ToolOutput {
            code: Some(0),
            output: String::new(),
        }))
    }

    fn session(
        &self,
        request: &SessionRequest<'_>,
        sink: &mut dyn Write,
    ) -> Result<Option<i32>, RuntimeError> {
        self.record(
            "session",
            vec![
                request.instance.to_owned(),
                request.namespace.to_owned(),
                request.command.to_owned(),
            ],
            request.credential,
        );

        let scripted = self.sessions.lock().map_err(poisoned)?.pop_front();
        let response = scripted.unwrap_or_else(|| ToolOutput {
            code: Some(0),
            output: if request.command.contains("ImportDir") {
                LOAD_SUCCESS_OUTPUT.to_owned()
            } else {
                String::new()
            },
        });
        sink.write_all(response.output.as_bytes())?;
        Ok(response.code)
    }
}
