//! Launching the external translation tool.
//!
//! A [`Translator`] starts one process per job and reports everything it
//! observes as [`ProcessEvent`]s on an unbounded channel: output chunks from
//! each pipe in the order they were read, then exactly one `Exited` event
//! once both pipes have closed. Killing goes through the returned
//! [`ProcessHandle`].

mod artifacts;
mod command;

pub use artifacts::{OutputArtifacts, default_output_dir};
pub use command::CommandTranslator;

use crate::progress::OutputStream;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Identifies one job from launch to terminal state.
pub type JobId = Uuid;

/// Everything a translator needs to know about one job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    pub job_id: JobId,
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub service: String,
    pub lang_in: String,
    pub lang_out: String,
}

impl JobRequest {
    pub fn artifacts(&self) -> OutputArtifacts {
        OutputArtifacts::resolve(&self.input, &self.output_dir)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEventKind {
    Output { stream: OutputStream, bytes: Vec<u8> },
    /// Exit code; `-1` when the process was terminated by a signal
    Exited(i32),
}

/// Something observed about a running job's process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessEvent {
    pub job_id: JobId,
    pub kind: ProcessEventKind,
}

impl ProcessEvent {
    pub fn output(job_id: JobId, stream: OutputStream, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            job_id,
            kind: ProcessEventKind::Output {
                stream,
                bytes: bytes.into(),
            },
        }
    }

    pub fn exited(job_id: JobId, code: i32) -> Self {
        Self {
            job_id,
            kind: ProcessEventKind::Exited(code),
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<ProcessEvent>;

/// Handle for killing a launched process.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: Option<u32>,
    kill_tx: Option<oneshot::Sender<()>>,
}

impl ProcessHandle {
    pub fn new(pid: Option<u32>, kill_tx: oneshot::Sender<()>) -> Self {
        Self {
            pid,
            kill_tx: Some(kill_tx),
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Ask the process to die immediately. Returns `false` if it was already
    /// asked or has already exited.
    pub fn kill(&mut self) -> bool {
        self.kill_tx
            .take()
            .is_some_and(|tx| tx.send(()).is_ok())
    }
}

/// Abstraction over process launching for testability.
/// Real implementation: `CommandTranslator`. Test double: `ScriptedTranslator`.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Start the process for `request`, streaming its events into `events`.
    async fn launch(
        &self,
        request: &JobRequest,
        events: EventSender,
    ) -> std::io::Result<ProcessHandle>;

    /// Human-readable command line, for logs.
    fn describe(&self, request: &JobRequest) -> String;
}

/// Fill the placeholders of an argument template.
///
/// Supported: `{input}`, `{output_dir}`, `{service}`, `{lang_in}`, `{lang_out}`.
/// Unknown braces are passed through untouched.
pub fn expand_args(template: &[String], request: &JobRequest) -> Vec<String> {
    let input = request.input.to_string_lossy();
    let output_dir = request.output_dir.to_string_lossy();
    template
        .iter()
        .map(|arg| {
            arg.replace("{input}", &input)
                .replace("{output_dir}", &output_dir)
                .replace("{service}", &request.service)
                .replace("{lang_in}", &request.lang_in)
                .replace("{lang_out}", &request.lang_out)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> JobRequest {
        JobRequest {
            job_id: Uuid::new_v4(),
            input: PathBuf::from("/docs/paper.pdf"),
            output_dir: PathBuf::from("/docs/out"),
            service: "google".to_string(),
            lang_in: "en".to_string(),
            lang_out: "zh".to_string(),
        }
    }

    #[test]
    fn test_expand_args_fills_placeholders() {
        let template: Vec<String> = ["{input}", "-lo", "{lang_out}", "-o", "{output_dir}", "{other}"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            expand_args(&template, &request()),
            vec!["/docs/paper.pdf", "-lo", "zh", "-o", "/docs/out", "{other}"]
        );
    }

    #[test]
    fn test_expand_args_inside_larger_argument() {
        let template = vec!["--service={service}:{lang_in}".to_string()];
        assert_eq!(
            expand_args(&template, &request()),
            vec!["--service=google:en"]
        );
    }

    #[test]
    fn test_process_handle_kill_once() {
        let (tx, mut rx) = oneshot::channel();
        let mut handle = ProcessHandle::new(Some(42), tx);
        assert_eq!(handle.pid(), Some(42));
        assert!(handle.kill());
        assert!(!handle.kill());
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_kill_after_process_gone_reports_false() {
        let (tx, rx) = oneshot::channel();
        drop(rx);
        let mut handle = ProcessHandle::new(None, tx);
        assert!(!handle.kill());
    }
}
