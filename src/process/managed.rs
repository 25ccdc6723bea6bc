use std::future::IntoFuture;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::settings::Settings;

/// Upper bound on waiting for forwarded output after the process exits.
const FORWARD_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// How a managed process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Exited on its own with this code.
    Exited(i32),
    /// Terminated by a signal nobody here asked for.
    Signaled(i32),
    /// Stopped through [`ProcessControl::kill`] or [`ProcessControl::terminate`].
    Killed,
    /// The exit status could not be collected.
    Failed(String),
}

impl ExitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitOutcome::Exited(0) | ExitOutcome::Killed)
    }

    /// Success for a clean exit or a requested stop, an error otherwise.
    pub fn into_result(self) -> Result<ExitOutcome> {
        match self {
            ExitOutcome::Exited(0) | ExitOutcome::Killed => Ok(self),
            ExitOutcome::Exited(code) => Err(Error::Exit { code: Some(code) }),
            ExitOutcome::Signaled(_) => Err(Error::Exit { code: None }),
            ExitOutcome::Failed(reason) => Err(Error::Wait(reason)),
        }
    }

    fn from_status(status: io::Result<ExitStatus>, stop_requested: bool) -> Self {
        match status {
            Ok(status) if stop_requested && !status.success() => ExitOutcome::Killed,
            Ok(status) => match status.code() {
                Some(code) => ExitOutcome::Exited(code),
                None => ExitOutcome::Signaled(status.signal().unwrap_or_default()),
            },
            Err(e) => ExitOutcome::Failed(e.to_string()),
        }
    }
}

/// One-shot completion of a managed process.
///
/// Clones share the same outcome; awaiting any of them any number of times
/// yields the value recorded when the process exited.
#[derive(Debug, Clone)]
pub struct Completion {
    rx: watch::Receiver<Option<ExitOutcome>>,
}

impl Completion {
    /// The outcome if the process has already exited.
    pub fn try_outcome(&self) -> Option<ExitOutcome> {
        self.rx.borrow().clone()
    }

    /// Wait for the process to exit and return the raw outcome.
    pub async fn outcome(&self) -> ExitOutcome {
        let mut rx = self.rx.clone();
        let recorded = rx.wait_for(Option::is_some).await.map(|o| o.clone());
        match recorded {
            Ok(Some(outcome)) => outcome,
            _ => ExitOutcome::Failed("process watcher stopped before the process exited".into()),
        }
    }

    /// Wait for the process to exit; non-zero exits are errors, requested stops are not.
    pub async fn wait(&self) -> Result<ExitOutcome> {
        self.outcome().await.into_result()
    }
}

impl IntoFuture for Completion {
    type Output = Result<ExitOutcome>;
    type IntoFuture = BoxFuture<'static, Result<ExitOutcome>>;

    fn into_future(self) -> Self::IntoFuture {
        async move { self.wait().await }.boxed()
    }
}

/// Control side of a managed process: signals and output streams.
#[derive(Debug, Clone)]
pub struct ProcessControl {
    pid: Option<u32>,
    stop_requested: Arc<AtomicBool>,
    kill_token: CancellationToken,
    stdout: Arc<Mutex<Option<ChildStdout>>>,
    stderr: Arc<Mutex<Option<ChildStderr>>>,
    completion: Completion,
}

impl ProcessControl {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Take the child's stdout.
    ///
    /// Only available until the drain grace period elapses, and never when
    /// output is being forwarded. Whoever takes it must keep reading it.
    pub fn take_stdout(&self) -> Option<ChildStdout> {
        take_slot(&self.stdout)
    }

    pub fn take_stderr(&self) -> Option<ChildStderr> {
        take_slot(&self.stderr)
    }

    /// SIGKILL the process. The completion resolves to [`ExitOutcome::Killed`].
    pub fn kill(&self) {
        if self.completion.try_outcome().is_some() {
            return;
        }
        info!(pid = ?self.pid, "killing tendermint");
        self.stop_requested.store(true, Ordering::SeqCst);
        self.kill_token.cancel();
    }

    /// SIGTERM the process, escalating to SIGKILL if it is still alive after `grace`.
    pub async fn terminate(&self, grace: Duration) -> ExitOutcome {
        if let Some(outcome) = self.completion.try_outcome() {
            return outcome;
        }
        self.stop_requested.store(true, Ordering::SeqCst);

        let signalled = match self.pid {
            Some(pid) => match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                Ok(()) => {
                    info!(pid, grace_ms = grace.as_millis() as u64, "sent SIGTERM to tendermint");
                    true
                }
                Err(e) => {
                    warn!(pid, error = %e, "failed to send SIGTERM, killing instead");
                    false
                }
            },
            None => false,
        };

        if signalled {
            if let Ok(outcome) = tokio::time::timeout(grace, self.completion.outcome()).await {
                return outcome;
            }
            warn!(pid = ?self.pid, "tendermint still running after grace period, killing");
        }

        self.kill_token.cancel();
        self.completion.outcome().await
    }
}

/// A spawned node process: its control handle plus its completion.
#[derive(Debug, Clone)]
pub struct ManagedProcess {
    control: ProcessControl,
    completion: Completion,
}

impl ManagedProcess {
    /// Spawn `binary args...` and start supervising it.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn start(settings: &Settings, args: &[String]) -> Result<Self> {
        let mut child = Command::new(&settings.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                binary: settings.binary.clone(),
                source,
            })?;

        let pid = child.id();
        info!(binary = %settings.binary.display(), pid = ?pid, "spawned tendermint");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let mut forwarders = Vec::new();
        let (stdout, stderr) = if settings.forward_logs {
            forwarders.extend(forward(stdout, tokio::io::stdout(), "stdout"));
            forwarders.extend(forward(stderr, tokio::io::stderr(), "stderr"));
            (Arc::new(Mutex::new(None)), Arc::new(Mutex::new(None)))
        } else {
            let slots = (Arc::new(Mutex::new(stdout)), Arc::new(Mutex::new(stderr)));
            schedule_drain(slots.0.clone(), slots.1.clone(), settings.drain_grace);
            slots
        };

        let (tx, rx) = watch::channel(None);
        let completion = Completion { rx };
        let stop_requested = Arc::new(AtomicBool::new(false));
        let kill_token = CancellationToken::new();

        tokio::spawn(watch_child(
            child,
            tx,
            stop_requested.clone(),
            kill_token.clone(),
            forwarders,
        ));

        Ok(Self {
            control: ProcessControl {
                pid,
                stop_requested,
                kill_token,
                stdout,
                stderr,
                completion: completion.clone(),
            },
            completion,
        })
    }

    pub fn control(&self) -> &ProcessControl {
        &self.control
    }

    pub fn completion(&self) -> Completion {
        self.completion.clone()
    }

    pub fn into_parts(self) -> (ProcessControl, Completion) {
        (self.control, self.completion)
    }
}

/// Owns the child until it exits and records the outcome exactly once.
async fn watch_child(
    mut child: Child,
    tx: watch::Sender<Option<ExitOutcome>>,
    stop_requested: Arc<AtomicBool>,
    kill_token: CancellationToken,
    forwarders: Vec<JoinHandle<()>>,
) {
    let pid = child.id();
    let outcome = tokio::select! {
        status = child.wait() => {
            ExitOutcome::from_status(status, stop_requested.load(Ordering::SeqCst))
        }
        _ = kill_token.cancelled() => {
            if let Err(e) = child.start_kill() {
                debug!(pid = ?pid, error = %e, "start_kill failed, process likely already exited");
            }
            ExitOutcome::from_status(child.wait().await, true)
        }
    };

    match &outcome {
        ExitOutcome::Exited(0) => info!(pid = ?pid, "tendermint exited cleanly"),
        ExitOutcome::Killed => info!(pid = ?pid, "tendermint stopped"),
        ExitOutcome::Exited(code) => warn!(pid = ?pid, code, "tendermint exited with error"),
        ExitOutcome::Signaled(signal) => warn!(pid = ?pid, signal, "tendermint terminated by signal"),
        ExitOutcome::Failed(reason) => warn!(pid = ?pid, reason = %reason, "lost track of tendermint"),
    }

    // Forwarded output lands before the exit is published.
    if !forwarders.is_empty()
        && tokio::time::timeout(FORWARD_FLUSH_TIMEOUT, join_all(forwarders))
            .await
            .is_err()
    {
        debug!(pid = ?pid, "forwarded output still open after exit");
    }

    tx.send_replace(Some(outcome));
}

fn take_slot<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    slot.lock().ok().and_then(|mut guard| guard.take())
}

/// Copy a child stream to one of our own for the life of the process.
fn forward<R, W>(
    reader: Option<R>,
    mut writer: W,
    stream: &'static str,
) -> Option<JoinHandle<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut reader = reader?;
    Some(tokio::spawn(async move {
        if let Err(e) = tokio::io::copy(&mut reader, &mut writer).await {
            debug!(stream, error = %e, "stopped forwarding tendermint output");
        }
    }))
}

/// After `grace`, read and discard whatever output nobody claimed so the
/// child never blocks on a full pipe.
fn schedule_drain(
    stdout: Arc<Mutex<Option<ChildStdout>>>,
    stderr: Arc<Mutex<Option<ChildStderr>>>,
    grace: Duration,
) {
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        let out = take_slot(&stdout);
        let err = take_slot(&stderr);
        if out.is_none() && err.is_none() {
            return;
        }
        debug!("draining unclaimed tendermint output");
        tokio::join!(drain(out), drain(err));
    });
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>) {
    if let Some(mut reader) = reader {
        let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
    }
}
