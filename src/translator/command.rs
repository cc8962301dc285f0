use super::{EventSender, JobId, JobRequest, ProcessEvent, ProcessHandle, Translator, expand_args};
use crate::config::Settings;
use crate::progress::OutputStream;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

const READ_CHUNK: usize = 8 * 1024;

/// Runs the translation tool as a child process.
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    program: String,
    args: Vec<String>,
}

impl CommandTranslator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.command(), settings.translator.args.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl Translator for CommandTranslator {
    async fn launch(
        &self,
        request: &JobRequest,
        events: EventSender,
    ) -> std::io::Result<ProcessHandle> {
        let args = expand_args(&self.args, request);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let pid = child.id();
        let job_id = request.job_id;
        info!(%job_id, pid = pid.unwrap_or(0), "translator process spawned");

        let readers: Vec<_> = [
            child
                .stdout
                .take()
                .map(|out| tokio::spawn(pump(out, OutputStream::Stdout, job_id, events.clone()))),
            child
                .stderr
                .take()
                .map(|err| tokio::spawn(pump(err, OutputStream::Stderr, job_id, events.clone()))),
        ]
        .into_iter()
        .flatten()
        .collect();

        let (kill_tx, kill_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let status = tokio::select! {
                status = child.wait() => status,
                Ok(()) = kill_rx => {
                    debug!(%job_id, "killing translator process");
                    if let Err(e) = child.kill().await {
                        warn!(%job_id, error = %e, "failed to kill translator process");
                    }
                    child.wait().await
                }
            };

            // Exit is reported only after every chunk has been forwarded.
            for reader in readers {
                let _ = reader.await;
            }

            let code = match status {
                Ok(status) => status.code().unwrap_or(-1),
                Err(e) => {
                    warn!(%job_id, error = %e, "failed to wait for translator process");
                    -1
                }
            };
            debug!(%job_id, code, "translator process exited");
            let _ = events.send(ProcessEvent::exited(job_id, code));
        });

        Ok(ProcessHandle::new(pid, kill_tx))
    }

    fn describe(&self, request: &JobRequest) -> String {
        let args = expand_args(&self.args, request);
        if args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, args.join(" "))
        }
    }
}

/// Forward raw chunks from one pipe until it closes.
async fn pump<R>(mut reader: R, stream: OutputStream, job_id: JobId, events: EventSender)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if events
                    .send(ProcessEvent::output(job_id, stream, &buf[..n]))
                    .is_err()
                {
                    break;
                }
            }
            Err(e) => {
                warn!(%job_id, ?stream, error = %e, "error reading translator output");
                break;
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::translator::ProcessEventKind;
    use std::path::PathBuf;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn request() -> JobRequest {
        JobRequest {
            job_id: Uuid::new_v4(),
            input: PathBuf::from("paper.pdf"),
            output_dir: PathBuf::from("."),
            service: "google".to_string(),
            lang_in: "en".to_string(),
            lang_out: "zh".to_string(),
        }
    }

    fn sh(script: &str) -> CommandTranslator {
        CommandTranslator::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    async fn drain(mut rx: mpsc::UnboundedReceiver<ProcessEvent>) -> (Vec<u8>, Vec<u8>, i32) {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        while let Some(event) = rx.recv().await {
            match event.kind {
                ProcessEventKind::Output {
                    stream: OutputStream::Stdout,
                    bytes,
                } => stdout.extend(bytes),
                ProcessEventKind::Output {
                    stream: OutputStream::Stderr,
                    bytes,
                } => stderr.extend(bytes),
                ProcessEventKind::Exited(code) => return (stdout, stderr, code),
            }
        }
        panic!("channel closed without exit event");
    }

    #[tokio::test]
    async fn test_streams_output_then_exit_code() {
        let (tx, rx) = mpsc::unbounded_channel();
        let translator = sh("echo 50%; echo 'Warning: x' 1>&2; exit 3");
        translator.launch(&request(), tx).await.unwrap();

        let (stdout, stderr, code) = drain(rx).await;
        assert_eq!(stdout, b"50%\n");
        assert_eq!(stderr, b"Warning: x\n");
        assert_eq!(code, 3);
    }

    #[tokio::test]
    async fn test_events_carry_job_id() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let request = request();
        sh("echo hi").launch(&request, tx).await.unwrap();
        while let Some(event) = rx.recv().await {
            assert_eq!(event.job_id, request.job_id);
        }
    }

    #[tokio::test]
    async fn test_kill_terminates_process() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut handle = sh("exec sleep 30").launch(&request(), tx).await.unwrap();
        assert!(handle.pid().is_some());
        assert!(handle.kill());

        let (_, _, code) = tokio::time::timeout(std::time::Duration::from_secs(10), drain(rx))
            .await
            .unwrap();
        assert_eq!(code, -1);
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_launch() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let translator = CommandTranslator::new("/nonexistent/pdftrans-translator", vec![]);
        let err = translator.launch(&request(), tx).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_describe_expands_template() {
        let translator = CommandTranslator::new(
            "pdf2zh",
            vec!["{input}".to_string(), "-s".to_string(), "{service}".to_string()],
        );
        assert_eq!(translator.describe(&request()), "pdf2zh paper.pdf -s google");
    }
}
