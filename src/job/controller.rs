//! The job controller: one consumer task owns the engine and the published
//! snapshot, and applies commands and process events strictly in arrival order.

use super::state::{JobPhase, JobSnapshot};
use crate::config::Settings;
use crate::errors::JobError;
use crate::notify::{Notification, NotificationSink};
use crate::progress::{ProgressEngine, Termination};
use crate::translator::{
    JobId, JobRequest, ProcessEvent, ProcessEventKind, ProcessHandle, Translator,
    default_output_dir,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-job parameters that do not come from the input file itself.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOptions {
    /// `None` writes next to the input
    pub output_dir: Option<PathBuf>,
    pub service: String,
    pub lang_in: String,
    pub lang_out: String,
}

impl JobOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            output_dir: settings.translator.output_dir.clone(),
            service: settings.service(),
            lang_in: settings.translator.lang_in.clone(),
            lang_out: settings.translator.lang_out.clone(),
        }
    }

    fn request_for(&self, job_id: JobId, input: PathBuf) -> JobRequest {
        let output_dir = self
            .output_dir
            .clone()
            .unwrap_or_else(|| default_output_dir(&input));
        JobRequest {
            job_id,
            input,
            output_dir,
            service: self.service.clone(),
            lang_in: self.lang_in.clone(),
            lang_out: self.lang_out.clone(),
        }
    }
}

impl Default for JobOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

enum Command {
    Start {
        input: PathBuf,
        reply: oneshot::Sender<Result<JobId, JobError>>,
    },
    Cancel {
        reply: oneshot::Sender<Result<(), JobError>>,
    },
}

struct ActiveJob {
    request: JobRequest,
    handle: ProcessHandle,
}

/// Cloneable handle to the controller task.
#[derive(Clone)]
pub struct JobController {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<JobSnapshot>,
}

impl JobController {
    /// Spawn the controller task on the current tokio runtime.
    pub fn spawn(
        translator: Arc<dyn Translator>,
        notifier: Arc<dyn NotificationSink>,
        engine: ProgressEngine,
        options: JobOptions,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(JobSnapshot::default());

        let worker = Worker {
            translator,
            notifier,
            options,
            engine,
            snapshot: JobSnapshot::default(),
            state_tx,
            event_tx,
            current: None,
        };
        tokio::spawn(worker.run(command_rx, event_rx));

        Self {
            commands: command_tx,
            state: state_rx,
        }
    }

    /// Launch a translation of `input`.
    ///
    /// Fails with `AlreadyRunning` while another job is in flight; that job is
    /// not affected. A launch failure is also recorded in the snapshot.
    pub async fn start(&self, input: impl Into<PathBuf>) -> Result<JobId, JobError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Start {
                input: input.into(),
                reply,
            })
            .await
            .map_err(|_| JobError::ControllerClosed)?;
        rx.await.map_err(|_| JobError::ControllerClosed)?
    }

    /// Kill the running job and reset the published state.
    ///
    /// The reset is visible to [`Self::snapshot`] by the time this returns.
    pub async fn cancel(&self) -> Result<(), JobError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Cancel { reply })
            .await
            .map_err(|_| JobError::ControllerClosed)?;
        rx.await.map_err(|_| JobError::ControllerClosed)?
    }

    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.state.borrow().clone()
    }

    /// Wait until no job is in flight and return the final snapshot.
    pub async fn wait_terminal(&self) -> Result<JobSnapshot, JobError> {
        let mut rx = self.state.clone();
        let snapshot = rx
            .wait_for(|s| !s.phase.is_active())
            .await
            .map_err(|_| JobError::ControllerClosed)?;
        Ok(snapshot.clone())
    }
}

struct Worker {
    translator: Arc<dyn Translator>,
    notifier: Arc<dyn NotificationSink>,
    options: JobOptions,
    engine: ProgressEngine,
    snapshot: JobSnapshot,
    state_tx: watch::Sender<JobSnapshot>,
    event_tx: mpsc::UnboundedSender<ProcessEvent>,
    current: Option<ActiveJob>,
}

impl Worker {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut events: mpsc::UnboundedReceiver<ProcessEvent>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(event) = events.recv() => self.handle_event(event),
            }
        }

        if let Some(mut job) = self.current.take() {
            debug!(job_id = %job.request.job_id, "controller dropped, killing translator");
            job.handle.kill();
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.snapshot.clone());
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { input, reply } => {
                let result = self.start(input).await;
                let _ = reply.send(result);
            }
            Command::Cancel { reply } => {
                let _ = reply.send(self.cancel());
            }
        }
    }

    async fn start(&mut self, input: PathBuf) -> Result<JobId, JobError> {
        if self.snapshot.phase.is_active() || self.current.is_some() {
            return Err(JobError::AlreadyRunning);
        }
        if !input.is_file() {
            return Err(JobError::InputNotFound { path: input });
        }
        self.engine.begin()?;

        let job_id = Uuid::new_v4();
        let request = self.options.request_for(job_id, input.clone());
        self.snapshot = JobSnapshot::starting(job_id, input);
        self.publish();

        info!(%job_id, command = %self.translator.describe(&request), "starting translation");

        match self.translator.launch(&request, self.event_tx.clone()).await {
            Ok(handle) => {
                self.snapshot.mark_running();
                self.current = Some(ActiveJob { request, handle });
                self.publish();
                Ok(job_id)
            }
            Err(e) => {
                warn!(%job_id, error = %e, "translator failed to launch");
                if let Some(outcome) = self.engine.finish(Termination::LaunchFailed(e.to_string())) {
                    self.snapshot.finish(&outcome, None);
                }
                self.notify_failure();
                self.publish();
                Err(JobError::SpawnFailed(e))
            }
        }
    }

    fn cancel(&mut self) -> Result<(), JobError> {
        let Some(mut job) = self.current.take() else {
            return Err(JobError::NoActiveJob);
        };
        let job_id = job.request.job_id;
        if !job.handle.kill() {
            debug!(%job_id, "translator already gone at cancel time");
        }
        self.engine.abandon();
        self.snapshot = JobSnapshot::cancelled(Some(job_id));
        self.publish();
        info!(%job_id, "translation cancelled");
        Ok(())
    }

    fn handle_event(&mut self, event: ProcessEvent) {
        let Some(job) = self
            .current
            .as_ref()
            .filter(|job| job.request.job_id == event.job_id)
        else {
            debug!(job_id = %event.job_id, "ignoring event for inactive job");
            return;
        };

        match event.kind {
            ProcessEventKind::Output { stream, bytes } => {
                let mut changed = false;
                for outcome in self.engine.feed_stream(stream, &bytes) {
                    changed |= self.snapshot.apply_line(&outcome);
                }
                if self.engine.has_succeeded() && self.snapshot.artifacts.is_none() {
                    self.snapshot.artifacts = Some(job.request.artifacts());
                    changed = true;
                }
                if changed {
                    self.publish();
                }
            }
            ProcessEventKind::Exited(code) => {
                let artifacts = job.request.artifacts();
                let job_id = job.request.job_id;
                self.current = None;

                let Some(outcome) = self.engine.finish(Termination::Exited(code)) else {
                    return;
                };
                info!(%job_id, code, succeeded = outcome.succeeded, "translation finished");
                self.snapshot
                    .finish(&outcome, outcome.succeeded.then_some(artifacts));
                if self.snapshot.phase == JobPhase::Succeeded {
                    self.notify_success();
                } else {
                    self.notify_failure();
                }
                self.publish();
            }
        }
    }

    fn input_name(&self) -> String {
        self.snapshot
            .input
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn notify_success(&self) {
        self.notifier
            .notify(Notification::success(format!("{} translated", self.input_name())));
    }

    fn notify_failure(&self) {
        let body = self.snapshot.log.last().cloned().unwrap_or_default();
        self.notifier.notify(Notification::failure(body));
    }
}
