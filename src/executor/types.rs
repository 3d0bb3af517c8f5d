use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unique identifier for a task within a run.
///
/// Wrapper around a UUID string so tasks stay distinguishable in the tracker and
/// in the run report even when two inputs share a display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generates a new random UUID v4-based TaskId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

/// Represents the lifecycle state of a task inside the runner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TaskStatus {
    /// Task has been planned but is still waiting for a worker permit.
    Pending,
    /// The external process has been launched and not yet exited.
    Running,
    /// The process exited with status zero.
    Completed,
    /// Launching, logging or the process itself failed.
    Failed { error: String },
}

/// One invocation of the external bootstrap tool.
///
/// Created once per input file before the run starts and consumed by exactly one worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// The input file name as listed in the configuration.
    pub input: String,
    /// File receiving the interleaved stdout/stderr of the process.
    pub log_path: PathBuf,
    /// Program followed by its arguments.
    pub command: Vec<String>,
}

impl Task {
    pub fn new(input: impl Into<String>, log_path: PathBuf, command: Vec<String>) -> Self {
        Self {
            id: TaskId::new(),
            input: input.into(),
            log_path,
            command,
        }
    }

    /// The command rendered as a single line for logging.
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

/// How a single task ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskResult {
    /// The process exited with status zero.
    Success,
    /// The process exited with a nonzero status, or was killed by a signal (`code` is `None`).
    NonZeroExit { code: Option<i32> },
    /// The process could not be started at all.
    LaunchFailed { detail: String },
    /// The log file could not be created or attached to the process.
    LogIo { detail: String },
    /// The process outlived the configured timeout and was killed.
    TimedOut { after_secs: u64 },
    /// The worker itself panicked.
    Panicked { detail: String },
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskResult::Success)
    }

    /// Maps the result onto the tracker's lifecycle state.
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskResult::Success => TaskStatus::Completed,
            other => TaskStatus::Failed {
                error: other.describe(),
            },
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TaskResult::Success => "exited successfully".to_string(),
            TaskResult::NonZeroExit { code: Some(code) } => format!("exited with status {}", code),
            TaskResult::NonZeroExit { code: None } => "terminated by signal".to_string(),
            TaskResult::LaunchFailed { detail } => format!("failed to launch: {}", detail),
            TaskResult::LogIo { detail } => format!("log file error: {}", detail),
            TaskResult::TimedOut { after_secs } => format!("killed after {}s timeout", after_secs),
            TaskResult::Panicked { detail } => format!("worker panicked: {}", detail),
        }
    }
}

/// The recorded end state of one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task_id: TaskId,
    pub input: String,
    pub log_path: PathBuf,
    pub result: TaskResult,
    pub duration_ms: u64,
}

/// Aggregated result of a whole run, in task submission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub outcomes: Vec<TaskOutcome>,
    /// Highest number of processes observed running at the same time.
    pub peak_concurrency: usize,
    pub started_at: u64,
    pub finished_at: u64,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_success())
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.result.is_success())
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_success())
    }

    /// Writes the report as pretty-printed JSON.
    pub fn write_json(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
