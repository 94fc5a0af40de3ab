//! Periodic archiving of the sample store.
//!
//! Runs on its own timer thread and only touches what is already on disk;
//! it shares no state with the sampler or accumulator. Every step is best
//! effort: failures are logged and the next tick simply tries again.
use crossbeam_channel as xch;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Outcome of one sync attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Steps that ran successfully, in order.
    pub succeeded: Vec<&'static str>,
    /// `(step, reason)` for every step that failed.
    pub failed: Vec<(&'static str, String)>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub trait Archiver: Send {
    fn sync(&mut self) -> SyncReport;
}

/// Chart regenerated from the store before each commit.
#[derive(Debug, Clone)]
struct ChartTarget {
    path: PathBuf,
    title: String,
}

#[derive(Debug)]
enum Step {
    Git(Vec<OsString>),
    Chart,
}

/// Commits the store (and optionally a chart of it) into a git checkout and
/// pushes it.
#[derive(Debug, Clone)]
pub struct GitArchiver {
    git: OsString,
    repo_dir: PathBuf,
    data_path: PathBuf,
    remote: String,
    message: String,
    pull_first: bool,
    chart: Option<ChartTarget>,
}

impl GitArchiver {
    pub fn new(repo_dir: impl Into<PathBuf>, data_path: impl Into<PathBuf>) -> Self {
        Self {
            git: OsString::from("git"),
            repo_dir: repo_dir.into(),
            data_path: data_path.into(),
            remote: "origin".to_string(),
            message: "update data".to_string(),
            pull_first: false,
            chart: None,
        }
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_pull_first(mut self, pull_first: bool) -> Self {
        self.pull_first = pull_first;
        self
    }

    /// Render the store to `path` before every commit and commit it too.
    pub fn with_chart(mut self, path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        self.chart = Some(ChartTarget {
            path: path.into(),
            title: title.into(),
        });
        self
    }

    /// Use a different git executable (tests point this at a missing binary).
    pub fn with_git_binary(mut self, git: impl Into<OsString>) -> Self {
        self.git = git.into();
        self
    }

    fn steps(&self) -> Vec<(&'static str, Step)> {
        let mut paths = vec![self.data_path.clone().into_os_string()];
        let mut steps = Vec::with_capacity(5);
        if self.pull_first {
            steps.push(("pull", Step::Git(vec!["pull".into()])));
        }
        if let Some(chart) = &self.chart {
            steps.push(("plot", Step::Chart));
            paths.push(chart.path.clone().into_os_string());
        }

        let mut add: Vec<OsString> = vec!["add".into()];
        add.extend(paths.iter().cloned());
        steps.push(("add", Step::Git(add)));

        let mut commit: Vec<OsString> = vec!["commit".into(), "-m".into(), self.message.clone().into()];
        commit.extend(paths);
        steps.push(("commit", Step::Git(commit)));

        steps.push(("push", Step::Git(vec!["push".into(), self.remote.clone().into()])));
        steps
    }

    fn render_chart(&self, chart: &ChartTarget) -> Result<(), String> {
        crate::plot::write_chart(&self.data_path, &chart.path, &chart.title)
            .map(|n| tracing::debug!(samples = n, "chart refreshed"))
            .map_err(|e| e.to_string())
    }

    fn run(&self, step: &Step) -> Result<(), String> {
        match (step, &self.chart) {
            (Step::Git(args), _) => self.run_step(args),
            (Step::Chart, Some(chart)) => self.render_chart(chart),
            (Step::Chart, None) => Ok(()),
        }
    }

    fn run_step(&self, args: &[OsString]) -> Result<(), String> {
        let out = Command::new(&self.git)
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .map_err(|e| e.to_string())?;
        if out.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&out.stderr);
        let detail = stderr.trim();
        Err(if detail.is_empty() {
            out.status.to_string()
        } else {
            format!("{}: {detail}", out.status)
        })
    }
}

impl Archiver for GitArchiver {
    fn sync(&mut self) -> SyncReport {
        tracing::info!(repo = %self.repo_dir.display(), "committing and pushing data");
        let mut report = SyncReport::default();
        for (name, step) in self.steps() {
            match self.run(&step) {
                Ok(()) => report.succeeded.push(name),
                Err(reason) => {
                    tracing::warn!(step = name, %reason, "ignoring git failure");
                    report.failed.push((name, reason));
                }
            }
        }
        report
    }
}

/// Runs an `Archiver` once per interval on a dedicated thread.
pub struct PeriodicSync {
    runs: Arc<AtomicU64>,
    stop_tx: Option<xch::Sender<()>>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl PeriodicSync {
    /// The first attempt happens one full `interval` after spawning.
    pub fn spawn<A: Archiver + 'static>(mut archiver: A, interval: Duration) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        let (stop_tx, stop_rx) = xch::bounded::<()>(0);
        let runs = Arc::new(AtomicU64::new(0));
        let runs_clone = runs.clone();

        let join_handle = std::thread::spawn(move || {
            let ticker = xch::tick(interval);
            loop {
                xch::select! {
                    recv(ticker) -> _ => {
                        let report = archiver.sync();
                        runs_clone.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!(
                            ok = report.succeeded.len(),
                            failed = report.failed.len(),
                            "sync attempt finished"
                        );
                    }
                    recv(stop_rx) -> _ => break,
                }
            }
            tracing::trace!("sync thread exiting cleanly");
        });

        Self {
            runs,
            stop_tx: Some(stop_tx),
            join_handle: Some(join_handle),
        }
    }

    /// Completed sync attempts, successful or not.
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }
}

impl Drop for PeriodicSync {
    fn drop(&mut self) {
        // Disconnecting the stop channel wakes the select.
        drop(self.stop_tx.take());
        if let Some(handle) = self.join_handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("sync thread panicked during shutdown");
        }
    }
}
