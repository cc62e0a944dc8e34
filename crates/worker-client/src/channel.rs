//! # Recommendation Worker Channel
//!
//! Owns one long-lived worker process and exposes a single-flight
//! request/response `call` over its pipes.
//!
//! ## Supervision
//! A background task spawns the worker, scans its stderr for the readiness
//! marker, and waits for it to exit. On exit the channel goes `Crashed`,
//! any in-flight call fails, and the worker is respawned after the restart
//! backoff.
//!
//! ## Correlation
//! The pipes carry no request ids, so requests are numbered as they are
//! written and the worker is trusted to answer in order. A call takes the
//! reply whose ordinal matches its own request and drops any earlier
//! replies: those belong to calls that timed out or were cancelled. A late
//! reply therefore never reaches the wrong caller.

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::protocol::{WorkerReply, WorkerRequest};
use crate::state::WorkerState;
use serde_json::Value;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex, Notify, watch};
use tracing::{debug, error, info, instrument, warn};

const READ_CHUNK: usize = 8 * 1024;

/// Handle to the supervised worker. Cheap to clone; all clones share the
/// same process.
#[derive(Clone)]
pub struct WorkerChannel {
    inner: Arc<Inner>,
}

struct Inner {
    config: WorkerConfig,
    state: watch::Sender<WorkerState>,
    /// `Some` only while a live, ready worker is attached
    pipes: Mutex<Option<WorkerPipes>>,
    restart: Notify,
    shutdown: watch::Sender<bool>,
}

enum RunOutcome {
    Exited,
    Shutdown,
}

impl WorkerChannel {
    /// Spawn the supervisor and return immediately.
    ///
    /// The channel starts in `Starting` and becomes `Ready` once the worker
    /// prints its readiness marker. Must be called inside a Tokio runtime.
    pub fn start(config: WorkerConfig) -> Self {
        let (state, _) = watch::channel(WorkerState::Starting);
        let (shutdown, _) = watch::channel(false);

        let inner = Arc::new(Inner {
            config,
            state,
            pipes: Mutex::new(None),
            restart: Notify::new(),
            shutdown,
        });

        tokio::spawn(supervise(inner.clone()));
        Self { inner }
    }

    pub fn state(&self) -> WorkerState {
        *self.inner.state.borrow()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.inner.state.subscribe()
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.inner.config
    }

    /// Wait until the channel reaches `target`. Returns false on timeout.
    pub async fn wait_for_state(&self, target: WorkerState, timeout: Duration) -> bool {
        let mut states = self.subscribe();
        tokio::time::timeout(timeout, states.wait_for(|s| *s == target))
            .await
            .map(|r| r.is_ok())
            .unwrap_or(false)
    }

    /// Send one request and wait for its reply.
    ///
    /// Fails fast with `Unavailable` unless the channel is `Ready`, and with
    /// `Busy` if another call is in flight; it never queues. On timeout the
    /// channel returns to `Ready` and the late reply is discarded by the
    /// next call.
    #[instrument(skip(self, request), fields(action = request.action()))]
    pub async fn call(
        &self,
        request: &WorkerRequest,
        timeout: Duration,
    ) -> Result<WorkerReply, WorkerError> {
        match self.state() {
            WorkerState::Ready => {}
            WorkerState::Busy => return Err(WorkerError::Busy),
            other => return Err(WorkerError::Unavailable(other)),
        }

        let mut slot = self.inner.pipes.try_lock().map_err(|_| WorkerError::Busy)?;
        let Some(pipes) = slot.as_mut() else {
            return Err(WorkerError::Unavailable(self.state()));
        };

        if pipes.torn {
            // A cancelled write left half a request on stdin; the ordinals
            // can no longer be trusted, so recycle the process.
            warn!("Worker stdin holds a partial request, restarting worker");
            slot.take();
            self.inner.state.send_replace(WorkerState::Crashed);
            self.inner.restart.notify_waiters();
            return Err(WorkerError::Unavailable(WorkerState::Crashed));
        }

        let busy = BusyGuard::acquire(&self.inner.state)
            .ok_or_else(|| WorkerError::Unavailable(self.state()))?;

        let mut states = self.inner.state.subscribe();
        let outcome = tokio::select! {
            biased;
            _ = states.wait_for(|s| s.is_down()) => Err(WorkerError::Exited),
            exchanged = tokio::time::timeout(timeout, pipes.exchange(request)) => match exchanged {
                Ok(result) => result,
                Err(_) => {
                    warn!("Worker call timed out after {:?}", timeout);
                    Err(WorkerError::Timeout(timeout))
                }
            },
        };

        if matches!(outcome, Err(WorkerError::Exited | WorkerError::Io(_))) {
            // The pipes are dead; the supervisor reaps the process
            slot.take();
            busy.mark_down();
            self.inner.restart.notify_waiters();
        }
        drop(busy);

        let reply = outcome?;
        match reply.error {
            Some(reason) => {
                debug!("Worker rejected request: {}", reason);
                Err(WorkerError::Rejected(reason))
            }
            None => Ok(reply),
        }
    }

    /// Kill the worker, stop supervising, and wait for `Stopped`
    pub async fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
        let mut states = self.subscribe();
        let _ = states.wait_for(|s| *s == WorkerState::Stopped).await;
    }
}

/// Holds the channel in `Busy` for the duration of one call.
///
/// Dropping it (success, error, timeout, or the call future being dropped)
/// returns the channel to `Ready` unless the supervisor has since marked
/// the worker down.
struct BusyGuard<'a> {
    state: &'a watch::Sender<WorkerState>,
}

impl<'a> BusyGuard<'a> {
    fn acquire(state: &'a watch::Sender<WorkerState>) -> Option<Self> {
        let acquired = state.send_if_modified(|s| {
            if *s == WorkerState::Ready {
                *s = WorkerState::Busy;
                true
            } else {
                false
            }
        });
        acquired.then_some(Self { state })
    }

    fn mark_down(&self) {
        self.state.send_if_modified(|s| {
            if *s == WorkerState::Busy {
                *s = WorkerState::Crashed;
                true
            } else {
                false
            }
        });
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|s| {
            if *s == WorkerState::Busy {
                *s = WorkerState::Ready;
                true
            } else {
                false
            }
        });
    }
}

// =============================================================================
// Pipes and reply correlation
// =============================================================================

struct WorkerPipes {
    stdin: ChildStdin,
    stdout: ChildStdout,
    buffer: Vec<u8>,
    /// Requests fully written
    written: u64,
    /// Replies taken off stdout, including discarded stale ones
    answered: u64,
    /// A write was interrupted part-way
    torn: bool,
}

impl WorkerPipes {
    fn new(stdin: ChildStdin, stdout: ChildStdout) -> Self {
        Self {
            stdin,
            stdout,
            buffer: Vec::new(),
            written: 0,
            answered: 0,
            torn: false,
        }
    }

    async fn exchange(&mut self, request: &WorkerRequest) -> Result<WorkerReply, WorkerError> {
        let line = request.encode()?;

        self.torn = true;
        self.stdin.write_all(&line).await?;
        self.stdin.flush().await?;
        self.torn = false;

        let ordinal = self.written;
        self.written += 1;

        loop {
            let value = self.next_value().await?;
            let index = self.answered;
            self.answered += 1;

            if index < ordinal {
                debug!("Discarding stale worker reply #{} (waiting for #{})", index, ordinal);
                continue;
            }
            return Ok(WorkerReply::from_value(value)?);
        }
    }

    /// Read until one complete reply object is buffered.
    ///
    /// Cancel-safe: bytes already read stay in the buffer.
    async fn next_value(&mut self) -> Result<Value, WorkerError> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(value) = self.take_buffered_value() {
                return Ok(value);
            }
            let read = self.stdout.read(&mut chunk).await?;
            if read == 0 {
                return Err(WorkerError::Exited);
            }
            self.buffer.extend_from_slice(&chunk[..read]);
        }
    }

    fn take_buffered_value(&mut self) -> Option<Value> {
        loop {
            let start = match self.buffer.iter().position(|b| !b.is_ascii_whitespace()) {
                Some(start) => start,
                None => {
                    self.buffer.clear();
                    return None;
                }
            };
            self.buffer.drain(..start);

            let (parsed, consumed) = {
                let mut values = serde_json::Deserializer::from_slice(&self.buffer).into_iter::<Value>();
                let parsed = values.next();
                (parsed, values.byte_offset())
            };

            match parsed {
                Some(Ok(value)) if value.is_object() => {
                    self.buffer.drain(..consumed);
                    return Some(value);
                }
                Some(Err(e)) if e.is_eof() => return None,
                Some(Ok(_)) => {
                    // A log line that happens to start with a number or
                    // literal; it is not a reply and must not be counted
                    let newline = self.buffer.iter().position(|&b| b == b'\n')?;
                    debug!("Skipping non-reply worker output line");
                    self.buffer.drain(..=newline);
                }
                Some(Err(e)) => {
                    // Not JSON: skip the offending line once it is complete
                    let newline = self.buffer.iter().position(|&b| b == b'\n')?;
                    warn!("Skipping unparseable worker output: {}", e);
                    self.buffer.drain(..=newline);
                }
                None => return None,
            }
        }
    }
}

// =============================================================================
// Supervisor
// =============================================================================

async fn supervise(inner: Arc<Inner>) {
    let mut shutdown = inner.shutdown.subscribe();

    loop {
        if *shutdown.borrow() {
            break;
        }
        inner.state.send_replace(WorkerState::Starting);

        if let RunOutcome::Shutdown = inner.run_once(&mut shutdown).await {
            break;
        }

        // Flip state first so an in-flight call lets go of the pipes
        inner.state.send_replace(WorkerState::Crashed);
        inner.pipes.lock().await.take();

        info!(
            "Restarting recommendation worker in {:?}",
            inner.config.restart_backoff
        );
        tokio::select! {
            _ = tokio::time::sleep(inner.config.restart_backoff) => {}
            _ = shutdown.changed() => break,
        }
    }

    inner.state.send_replace(WorkerState::Stopped);
    inner.pipes.lock().await.take();
    info!("Recommendation worker stopped");
}

impl Inner {
    async fn run_once(&self, shutdown: &mut watch::Receiver<bool>) -> RunOutcome {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.current_dir {
            command.current_dir(dir);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!("Failed to spawn worker {:?}: {}", self.config.program, e);
                return RunOutcome::Exited;
            }
        };

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            error!("Worker spawned without piped stdio");
            let _ = child.start_kill();
            return RunOutcome::Exited;
        };
        info!("Spawned recommendation worker (pid {:?})", child.id());

        let mut pending = Some(WorkerPipes::new(stdin, stdout));
        let mut diagnostics = BufReader::new(stderr).lines();
        let mut diagnostics_open = true;

        loop {
            tokio::select! {
                status = child.wait() => {
                    match status {
                        Ok(status) => warn!("Recommendation worker exited: {}", status),
                        Err(e) => error!("Failed waiting on recommendation worker: {}", e),
                    }
                    return RunOutcome::Exited;
                }
                line = diagnostics.next_line(), if diagnostics_open => match line {
                    Ok(Some(line)) => {
                        debug!(target: "worker_client::stderr", "{}", line);
                        if pending.is_some() && line.contains(&self.config.ready_marker) {
                            *self.pipes.lock().await = pending.take();
                            self.state.send_replace(WorkerState::Ready);
                            info!("Recommendation worker ready");
                        }
                    }
                    Ok(None) => diagnostics_open = false,
                    Err(e) => {
                        warn!("Lost worker stderr: {}", e);
                        diagnostics_open = false;
                    }
                },
                _ = self.restart.notified() => {
                    warn!("Worker restart requested");
                    let _ = child.start_kill();
                }
                _ = shutdown.changed() => {
                    let _ = child.kill().await;
                    return RunOutcome::Shutdown;
                }
            }
        }
    }
}
