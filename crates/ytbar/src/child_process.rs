//! Downloader process lifecycle.
//!
//! The child runs in its own process group so signals also reach the
//! helpers it spawns (ffmpeg for merging), which share its output pipes.
//! The monitor thread reads stdout and reaps the child; the UI side checks
//! liveness on the shared `Child` and signals the whole group on shutdown.

use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info, trace, warn};
use ytbar_core::util::log_snippet;
use ytbar_core::{DownloaderConfig, ExitReport};

use crate::events::Message;
use crate::monitor::ProgressMonitor;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
// Upper bound on waiting for the monitor thread once the group is gone.
const MONITOR_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug)]
enum Signal {
    Terminate,
    Kill,
}

pub fn build_command(config: &DownloaderConfig, target: &str) -> Command {
    let mut command = Command::new(&config.program);
    command
        .args(&config.args)
        .args(&config.extra_args)
        .arg(target)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    command
}

pub struct DownloadProcess {
    child: Arc<Mutex<Child>>,
    pid: u32,
    monitor: Option<JoinHandle<()>>,
}

impl DownloadProcess {
    /// Spawn the downloader and start streaming its progress into `sender`.
    pub fn spawn(config: &DownloaderConfig, target: &str, sender: Sender<Message>) -> Result<Self> {
        let mut child = build_command(config, target).spawn().with_context(|| {
            format!(
                "failed to start {}; install it or set downloader.program",
                config.program
            )
        })?;
        let pid = child.id();
        info!(pid, program = %config.program, "downloader started");

        let stdout = child
            .stdout
            .take()
            .context("downloader stdout was not captured")?;
        let stderr_handle = child
            .stderr
            .take()
            .map(|stream| thread::spawn(move || drain_stderr(stream)));

        let child = Arc::new(Mutex::new(child));
        let reaped = Arc::clone(&child);
        let monitor = ProgressMonitor::new(sender.clone(), config.merge_marker.clone());
        let handle = thread::Builder::new()
            .name("progress-monitor".to_string())
            .spawn(move || {
                let downloaded = monitor.run(BufReader::new(stdout));
                let status = reap(&reaped);
                let stderr_tail = stderr_handle.and_then(|handle| handle.join().ok()).flatten();
                let report = exit_report(status, stderr_tail);
                info!(downloaded, code = ?report.code, success = report.success, "downloader exited");
                let _ = sender.send(Message::ProcessExited(report));
            })
            .context("failed to start progress monitor thread")?;

        Ok(Self {
            child,
            pid,
            monitor: Some(handle),
        })
    }

    /// Whether the downloader itself has not exited yet.
    pub fn is_running(&self) -> bool {
        matches!(lock(&self.child).try_wait(), Ok(None))
    }

    /// Give the downloader up to `timeout` to exit on its own.
    ///
    /// Returns true once it has exited.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        while self.is_running() {
            if start.elapsed() >= timeout {
                return false;
            }
            thread::sleep(POLL_INTERVAL);
        }
        true
    }

    /// Ask the downloader to stop, escalate after `timeout`, and wait for it.
    pub fn shutdown(&mut self, timeout: Duration) {
        if self.is_running() {
            debug!(pid = self.pid, "terminating downloader");
            self.signal(Signal::Terminate);
            if !self.wait_timeout(timeout) {
                warn!(pid = self.pid, "force killing unresponsive downloader");
                self.signal(Signal::Kill);
                self.wait_timeout(MONITOR_JOIN_TIMEOUT);
            }
        }
        // Helpers left in the group would keep the output pipes open.
        sweep_group(self.pid);
        self.join_monitor(MONITOR_JOIN_TIMEOUT);
    }

    // Signal only while the child is unreaped, so the pid cannot have been reused.
    fn signal(&self, signal: Signal) {
        let mut child = lock(&self.child);
        if matches!(child.try_wait(), Ok(None)) {
            send_signal(&mut child, signal);
        }
    }

    fn join_monitor(&mut self, timeout: Duration) {
        let Some(handle) = self.monitor.take() else {
            return;
        };
        let start = Instant::now();
        while !handle.is_finished() && start.elapsed() < timeout {
            thread::sleep(POLL_INTERVAL);
        }
        if !handle.is_finished() {
            warn!(pid = self.pid, "progress monitor still blocked; detaching");
            return;
        }
        if handle.join().is_err() {
            warn!(pid = self.pid, "progress monitor thread panicked");
        }
    }
}

impl Drop for DownloadProcess {
    fn drop(&mut self) {
        if self.monitor.is_some() {
            self.shutdown(Duration::ZERO);
        }
    }
}

fn lock(child: &Mutex<Child>) -> MutexGuard<'_, Child> {
    child.lock().unwrap_or_else(PoisonError::into_inner)
}

// Poll instead of blocking in `wait` so the lock is free for `shutdown`.
fn reap(child: &Mutex<Child>) -> io::Result<ExitStatus> {
    loop {
        if let Some(status) = lock(child).try_wait()? {
            return Ok(status);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn exit_report(status: io::Result<ExitStatus>, stderr_tail: Option<String>) -> ExitReport {
    match status {
        Ok(status) => ExitReport {
            code: status.code(),
            success: status.success(),
            stderr_tail,
        },
        Err(err) => {
            warn!(?err, "failed to reap downloader");
            ExitReport {
                code: None,
                success: false,
                stderr_tail,
            }
        }
    }
}

// Keep the last non-empty stderr line; it carries the downloader's error message.
fn drain_stderr(stream: impl Read) -> Option<String> {
    let mut last = None;
    for chunk in BufReader::new(stream).split(b'\n').map_while(Result::ok) {
        let line = String::from_utf8_lossy(&chunk);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        trace!(line = %log_snippet(line), "downloader stderr");
        last = Some(line.to_string());
    }
    last
}

#[cfg(unix)]
fn send_signal(child: &mut Child, signal: Signal) {
    let signal = match signal {
        Signal::Terminate => libc::SIGTERM,
        Signal::Kill => libc::SIGKILL,
    };
    signal_group(child.id(), signal);
}

#[cfg(unix)]
fn sweep_group(pgid: u32) {
    signal_group(pgid, libc::SIGKILL);
}

#[cfg(unix)]
fn signal_group(pgid: u32, signal: libc::c_int) {
    let Ok(pgid) = i32::try_from(pgid) else {
        warn!(pgid, "pgid exceeds i32 range; skipping signal");
        return;
    };
    // The group id is the child's pid, set by `process_group(0)` at spawn.
    unsafe {
        libc::killpg(pgid, signal);
    }
}

#[cfg(not(unix))]
fn send_signal(child: &mut Child, _signal: Signal) {
    let _ = child.kill();
}

#[cfg(not(unix))]
fn sweep_group(_pgid: u32) {}
