//! Bounded-concurrency execution engine.
//!
//! The engine spawns one task per target. A semaphore with
//! `max_concurrency` permits bounds how many invocations run at once;
//! permits are acquired in input order, but tasks finish and write in
//! whatever order their processes exit.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use fanout_models::{Target, TargetList};

use crate::config::RunConfig;
use crate::error::{Result, RuntimeError};
use crate::event::RunEvent;
use crate::invoker::{CommandInvoker, ProcessRunner};
use crate::pending::{PendingCounter, PendingGuard};
use crate::sink::ResultSink;

/// Lifecycle of an engine. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Not yet run.
    #[default]
    Idle,
    /// Tasks are outstanding.
    Running,
    /// Every task has finished.
    Completed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// A task that did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// Target the task was bound to.
    pub target: Target,
    /// Error message.
    pub error: String,
}

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Number of targets dispatched.
    pub total: usize,
    /// Tasks whose output was written.
    pub succeeded: usize,
    /// Tasks that failed to spawn or to write.
    pub failures: Vec<TaskFailure>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Number of failed tasks.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// True when no task failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Wall-clock duration of the run.
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Dispatches one invocation per target onto a bounded pool.
pub struct Engine {
    config: RunConfig,
    invoker: Arc<dyn CommandInvoker>,
    state_tx: Arc<watch::Sender<RunState>>,
    event_tx: broadcast::Sender<RunEvent>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

impl Engine {
    /// Creates an engine that spawns `config.command` for each target.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::InvalidConfig` if the configuration is unusable.
    pub fn new(config: RunConfig) -> Result<Self> {
        let invoker = Arc::new(ProcessRunner::from_config(&config));
        Self::with_invoker(config, invoker)
    }

    /// Creates an engine with a provided invoker.
    pub fn with_invoker(config: RunConfig, invoker: Arc<dyn CommandInvoker>) -> Result<Self> {
        config.validate()?;
        let (state_tx, _) = watch::channel(RunState::Idle);
        let (event_tx, _) = broadcast::channel(256);

        Ok(Self {
            config,
            invoker,
            state_tx: Arc::new(state_tx),
            event_tx,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        *self.state_tx.borrow()
    }

    /// Receiver that observes state transitions.
    pub fn watch_state(&self) -> watch::Receiver<RunState> {
        self.state_tx.subscribe()
    }

    /// Subscribe to run events.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.event_tx.subscribe()
    }

    /// Arguments for one task: the configured extra arguments followed by
    /// the target in the last slot.
    pub fn task_args(&self, target: &Target) -> Vec<String> {
        let mut args = Vec::with_capacity(self.config.extra_args.len() + 1);
        args.extend(self.config.extra_args.iter().cloned());
        args.push(target.as_str().to_string());
        args
    }

    /// Runs every target and waits for all of them to finish.
    ///
    /// Each task writes to `sink` exactly once. Task failures are recorded in
    /// the summary and do not stop other tasks. The sink is left open; the
    /// caller closes it once this returns.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::AlreadyRun` if this engine has been run before.
    pub async fn run(&self, targets: TargetList, sink: Arc<ResultSink>) -> Result<RunSummary> {
        let claimed = self.state_tx.send_if_modified(|state| {
            if *state == RunState::Idle {
                *state = RunState::Running;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(RuntimeError::AlreadyRun);
        }

        let started_at = Utc::now();
        let total = targets.len();
        info!(
            total,
            max_concurrency = self.config.max_concurrency,
            dry_run = self.config.dry_run,
            command = %self.config.command,
            "starting run"
        );

        let failures: Arc<Mutex<Vec<TaskFailure>>> = Arc::new(Mutex::new(Vec::new()));
        let mut state_rx = self.state_tx.subscribe();

        if total == 0 {
            self.state_tx.send_replace(RunState::Completed);
        } else {
            let handles = self.dispatch(targets, sink, Arc::clone(&failures)).await;

            // The sender lives in `self`, so this only returns once completed.
            let _ = state_rx
                .wait_for(|state| *state == RunState::Completed)
                .await;

            for (target, handle) in handles {
                if let Err(e) = handle.await {
                    warn!(target_name = %target, error = %e, "task aborted");
                    record_failure(&failures, target, format!("task aborted: {}", e));
                }
            }
        }

        let failures = match Arc::try_unwrap(failures) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(|p| p.into_inner()),
            Err(shared) => shared.lock().map(|f| f.clone()).unwrap_or_default(),
        };

        let summary = RunSummary {
            total,
            succeeded: total.saturating_sub(failures.len()),
            failures,
            started_at,
            finished_at: Utc::now(),
        };

        self.emit_event(RunEvent::Completed {
            total,
            failed: summary.failed(),
        });
        info!(
            total,
            succeeded = summary.succeeded,
            failed = summary.failed(),
            elapsed_ms = summary.duration().num_milliseconds(),
            "run completed"
        );

        Ok(summary)
    }

    /// Spawns one task per target, waiting for a pool slot before each spawn.
    async fn dispatch(
        &self,
        targets: TargetList,
        sink: Arc<ResultSink>,
        failures: Arc<Mutex<Vec<TaskFailure>>>,
    ) -> Vec<(Target, JoinHandle<()>)> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let pending = Arc::new(PendingCounter::new(targets.len()));
        let mut handles = Vec::with_capacity(targets.len());

        for target in targets {
            let permit = Arc::clone(&semaphore).acquire_owned().await;
            let args = self.task_args(&target);
            let invoker = Arc::clone(&self.invoker);
            let sink = Arc::clone(&sink);
            let failures = Arc::clone(&failures);
            let state_tx = Arc::clone(&self.state_tx);
            let pending = Arc::clone(&pending);
            let event_tx = self.event_tx.clone();
            let task_target = target.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let _guard = PendingGuard::new(pending, move || {
                    state_tx.send_replace(RunState::Completed);
                });
                let target = task_target;

                let _ = event_tx.send(RunEvent::TaskStarted {
                    target: target.clone(),
                });

                match run_task(invoker.as_ref(), &args, &sink).await {
                    Ok(bytes) => {
                        debug!(target_name = %target, bytes, "task finished");
                        let _ = event_tx.send(RunEvent::TaskFinished { target, bytes });
                    }
                    Err(e) => {
                        warn!(target_name = %target, error = %e, "task failed");
                        let error = e.to_string();
                        record_failure(&failures, target.clone(), error.clone());
                        let _ = event_tx.send(RunEvent::TaskFailed { target, error });
                    }
                }
            });

            handles.push((target, handle));
        }

        debug!(dispatched = handles.len(), "all tasks dispatched");
        handles
    }

    fn emit_event(&self, event: RunEvent) {
        // No receivers is fine.
        let _ = self.event_tx.send(event);
    }
}

/// Invokes the command and appends its output. A failed invocation still
/// makes its single, empty write so every task touches the sink once; the
/// invocation error is what gets reported even if that write fails too.
async fn run_task(
    invoker: &dyn CommandInvoker,
    args: &[String],
    sink: &ResultSink,
) -> Result<usize> {
    match invoker.invoke(args).await {
        Ok(output) => {
            let record = to_record(output);
            sink.write(&record).await?;
            Ok(record.len())
        }
        Err(e) => {
            if let Err(write_err) = sink.write("").await {
                warn!(error = %write_err, "empty write after failed invocation");
            }
            Err(e)
        }
    }
}

/// Terminates non-empty output with a newline. Empty output stays empty.
fn to_record(mut output: String) -> String {
    if !output.is_empty() {
        output.push('\n');
    }
    output
}

fn record_failure(failures: &Mutex<Vec<TaskFailure>>, target: Target, error: String) {
    let mut failures = failures.lock().unwrap_or_else(|p| p.into_inner());
    failures.push(TaskFailure { target, error });
}
