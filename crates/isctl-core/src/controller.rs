use crate::cancel::CancelToken;
use crate::{CoreError, Instance};
use isctl_runtime::{AvailableCommands, ControlBackend, SystemBackend, Toolchain};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Central API for querying, starting, stopping and executing code in
/// instances.
///
/// Every external action goes through the backend; every state change is
/// verified by re-querying `qlist` afterwards rather than trusting the tool's
/// exit code.
pub struct Controller {
    backend: Box<dyn ControlBackend>,
    toolchain: Toolchain,
}

impl Controller {
    pub fn new(backend: Box<dyn ControlBackend>, toolchain: Toolchain) -> Self {
        Self { backend, toolchain }
    }

    /// Controller driving the real tools named in `toolchain`.
    pub fn system(toolchain: Toolchain) -> Self {
        let backend = SystemBackend::new(toolchain.clone());
        Self::new(Box::new(backend), toolchain)
    }

    pub fn backend(&self) -> &dyn ControlBackend {
        self.backend.as_ref()
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn available_commands(&self) -> AvailableCommands {
        self.backend.available()
    }

    /// Every installed instance, one per `qlist` line.
    pub fn load_instances(&self) -> Result<Vec<Instance>, CoreError> {
        let output = self.backend.qlist(None)?;
        output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(Instance::from_qlist)
            .collect()
    }

    pub fn load_instance(&self, name: &str) -> Result<Instance, CoreError> {
        let output = self.backend.qlist(Some(name))?;
        if output.trim().is_empty() {
            return Err(CoreError::InstanceNotFound(name.to_owned()));
        }
        Instance::from_qlist(&output)
    }

    /// Re-query the instance and overwrite its record-derived fields.
    pub fn update(&self, instance: &mut Instance) -> Result<(), CoreError> {
        let output = self.backend.qlist(Some(&instance.name))?;
        if output.trim().is_empty() {
            return Err(CoreError::InstanceNotFound(instance.name.clone()));
        }
        instance.update_from_qlist(&output)
    }

    /// Start the instance if it is down, then verify it is ready.
    pub fn start(&self, instance: &mut Instance) -> Result<(), CoreError> {
        if instance.status.down() {
            let credential = instance.manager_credential()?;
            info!(instance = %instance.name, "starting instance");
            let out = self.backend.control(
                instance.product,
                &["start", instance.name.as_str(), "quietly"],
                credential.as_ref(),
            )?;
            if !out.success() {
                return Err(CoreError::ActionFailed {
                    action: "start",
                    name: instance.name.clone(),
                    output: out.output,
                });
            }
        } else {
            debug!(instance = %instance.name, status = %instance.status, "not down, skipping start");
        }

        self.update(instance)?;
        if !instance.status.ready() {
            return Err(CoreError::StateVerification {
                action: "start",
                name: instance.name.clone(),
                status: instance.status,
            });
        }
        Ok(())
    }

    /// Stop the instance if it is up, then verify it is down. Sign-on
    /// inhibited instances are stopped with `bypass`.
    pub fn stop(&self, instance: &mut Instance) -> Result<(), CoreError> {
        if instance.status.up() {
            let credential = instance.manager_credential()?;
            let mut args = vec!["stop", instance.name.as_str()];
            if instance.status.requires_bypass() {
                args.push("bypass");
            }
            args.push("quietly");
            info!(instance = %instance.name, ?args, "stopping instance");

            let out = self
                .backend
                .control(instance.product, &args, credential.as_ref())?;
            if !out.success() {
                return Err(CoreError::ActionFailed {
                    action: "stop",
                    name: instance.name.clone(),
                    output: out.output,
                });
            }
        } else {
            debug!(instance = %instance.name, status = %instance.status, "not up, skipping stop");
        }

        self.update(instance)?;
        if !instance.status.down() {
            return Err(CoreError::StateVerification {
                action: "stop",
                name: instance.name.clone(),
                status: instance.status,
            });
        }
        Ok(())
    }

    /// Poll until the instance is ready, `timeout` elapses or `cancel` fires.
    pub fn wait_for_ready(
        &self,
        instance: &mut Instance,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<(), CoreError> {
        // A timeout past the end of the clock means no deadline.
        let deadline = Instant::now().checked_add(timeout);
        let interval = self.toolchain.poll_interval();

        loop {
            if cancel.is_cancelled() {
                return Err(CoreError::Cancelled(instance.name.clone()));
            }
            self.update(instance)?;
            if instance.status.ready() {
                info!(instance = %instance.name, "instance ready");
                return Ok(());
            }
            debug!(instance = %instance.name, status = %instance.status, "waiting for instance");

            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(CoreError::DeadlineExceeded {
                            name: instance.name.clone(),
                            timeout,
                        });
                    }
                    interval.min(deadline - now)
                }
                None => interval,
            };
            if cancel.sleep(pause) {
                return Err(CoreError::Cancelled(instance.name.clone()));
            }
        }
    }
}
