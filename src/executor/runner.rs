//! Worker Pool Implementation
//!
//! Runs every planned task as an external process while keeping at most
//! `worker_count` of them alive at the same time.
//!
//! ## Responsibilities
//! - **Throttling**: The dispatch loop acquires a semaphore permit before spawning each task,
//!   so dispatch itself waits while the pool is saturated.
//! - **Execution**: Launching the tool with stdout and stderr both written into the task's log file.
//! - **Accounting**: Recording one `TaskOutcome` per task, whatever the way it ended.
//!
//! The permit is owned by the spawned task and released when it is dropped, which covers
//! normal exit, early returns on launch/log errors and panics alike.

use super::tracker::TaskTracker;
use super::types::*;

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tokio::sync::Semaphore;

/// The engine that drives task execution.
pub struct JobRunner {
    /// Shared status table, also read by the stats reporter.
    tracker: Arc<TaskTracker>,
    /// Maximum number of concurrently running processes.
    worker_count: usize,
    /// Per-process wall clock limit.
    timeout: Option<Duration>,
}

impl JobRunner {
    /// Creates a new JobRunner.
    ///
    /// # Arguments
    /// * `worker_count`: Concurrency ceiling. Values below 1 are treated as 1.
    /// * `timeout`: Kill processes running longer than this. `None` waits indefinitely.
    pub fn new(
        tracker: Arc<TaskTracker>,
        worker_count: usize,
        timeout: Option<Duration>,
    ) -> Arc<Self> {
        Arc::new(Self {
            tracker,
            worker_count: worker_count.max(1),
            timeout,
        })
    }

    /// Runs all tasks and returns once every one of them has finished.
    ///
    /// Outcomes are reported in the order the tasks were given.
    pub async fn run(self: Arc<Self>, tasks: Vec<Task>) -> RunReport {
        let started_at = now_ms();
        tracing::info!(
            "Starting {} tasks with {} workers",
            tasks.len(),
            self.worker_count
        );

        for task in &tasks {
            self.tracker.register(task);
        }

        let semaphore = Arc::new(Semaphore::new(self.worker_count));
        let mut handles = Vec::with_capacity(tasks.len());

        for task in tasks {
            let permit = semaphore.clone().acquire_owned().await;
            let runner = self.clone();
            let meta = (task.id.clone(), task.input.clone(), task.log_path.clone());

            let handle = tokio::spawn(async move {
                let _permit = permit; // Hold permit until done
                runner.execute(task).await
            });

            handles.push((meta, handle));
        }

        tracing::info!("All tasks dispatched. Waiting for them to finish...");

        let mut outcomes = Vec::with_capacity(handles.len());
        for ((task_id, input, log_path), handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!("Worker for {} panicked: {}", input, e);
                    let result = TaskResult::Panicked {
                        detail: e.to_string(),
                    };
                    self.tracker.finish(&task_id, result.status());
                    outcomes.push(TaskOutcome {
                        task_id,
                        input,
                        log_path,
                        result,
                        duration_ms: 0,
                    });
                }
            }
        }

        let report = RunReport {
            outcomes,
            peak_concurrency: self.tracker.peak_concurrency(),
            started_at,
            finished_at: now_ms(),
        };

        tracing::info!(
            "Run finished: {}/{} tasks succeeded (peak concurrency {})",
            report.succeeded(),
            report.outcomes.len(),
            report.peak_concurrency
        );

        report
    }

    /// Runs one task to completion and records how it ended.
    async fn execute(&self, task: Task) -> TaskOutcome {
        let started = Instant::now();

        let result = match self.launch(&task) {
            Ok(mut child) => {
                self.tracker.mark_running(&task.id);
                tracing::info!("Running \"{}\"", task.command_line());

                let result = self.wait_for(&mut child).await;
                self.tracker.finish(&task.id, result.status());
                result
            }
            Err(result) => {
                self.tracker.finish(&task.id, result.status());
                result
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;

        if result.is_success() {
            tracing::info!("Task {} finished in {} ms", task.input, duration_ms);
        } else {
            tracing::warn!(
                "Task {} {} (log: {})",
                task.input,
                result.describe(),
                task.log_path.display()
            );
        }

        TaskOutcome {
            task_id: task.id,
            input: task.input,
            log_path: task.log_path,
            result,
            duration_ms,
        }
    }

    /// Creates the log file and starts the process with both output streams attached to it.
    fn launch(&self, task: &Task) -> Result<Child, TaskResult> {
        let (program, args) = task.command.split_first().ok_or_else(|| {
            TaskResult::LaunchFailed {
                detail: "empty command".to_string(),
            }
        })?;

        let stdout = std::fs::File::create(&task.log_path).map_err(|e| TaskResult::LogIo {
            detail: format!("{}: {}", task.log_path.display(), e),
        })?;
        let stderr = stdout.try_clone().map_err(|e| TaskResult::LogIo {
            detail: format!("{}: {}", task.log_path.display(), e),
        })?;

        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TaskResult::LaunchFailed {
                detail: format!("{}: {}", program, e),
            })
    }

    /// Waits for the process, killing it if it outlives the timeout.
    async fn wait_for(&self, child: &mut Child) -> TaskResult {
        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        tracing::error!("Failed to kill timed out process: {}", e);
                    }
                    return TaskResult::TimedOut {
                        after_secs: limit.as_secs(),
                    };
                }
            },
            None => child.wait().await,
        };

        match waited {
            Ok(status) => exit_result(status),
            Err(e) => TaskResult::LaunchFailed {
                detail: format!("failed to wait for process: {}", e),
            },
        }
    }
}

fn exit_result(status: ExitStatus) -> TaskResult {
    if status.success() {
        TaskResult::Success
    } else {
        TaskResult::NonZeroExit {
            code: status.code(),
        }
    }
}
