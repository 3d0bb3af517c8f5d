//! Bootstrap Job Runner Module
//!
//! Runs the external bootstrap-resampling tool once per simulation record file,
//! with a bounded number of tool processes alive at any time.
//!
//! ## Architecture Overview
//! 1. **Planning**: `plan_tasks` builds one immutable `Task` per input file: the shared base
//!    command plus `<input_flag> <input path>`, and a log path `<stem><suffix>.txt`.
//! 2. **Dispatch**: `JobRunner::run` acquires a semaphore permit per task before spawning it,
//!    so no more than `worker_count` processes exist at once. Any waiting task may take the next
//!    freed permit; there is no ordering guarantee between tasks.
//! 3. **Capture**: stdout and stderr of each process go to the same log file, truncated first.
//! 4. **Accounting**: every task ends with a `TaskResult`. Exit codes never stop the run, they
//!    are collected into the `RunReport` returned once all processes have exited.
//!
//! ## Submodules
//! - **`types`**: Task, status and report types.
//! - **`plan`**: Config-to-task expansion and log path naming.
//! - **`runner`**: The semaphore-bounded worker pool.
//! - **`tracker`**: Concurrent status table and concurrency high-water mark.

pub mod plan;
pub mod runner;
pub mod tracker;
pub mod types;

#[cfg(test)]
mod tests;
