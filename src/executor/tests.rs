//! Executor Module Tests
//!
//! This module contains unit and integration tests for the bootstrap job runner.
//!
//! ## Test Scopes
//! - **Planning**: Log path naming, command assembly and collision detection.
//! - **Tracker**: Status transitions and the concurrency high-water mark.
//! - **Runner**: Real `sh` processes standing in for the bootstrap tool, checking the
//!   concurrency bound, log capture and the recording of every kind of failure.

#[cfg(test)]
mod tests {
    use crate::config::BootstrapConfig;
    use crate::executor::plan::{log_path_for, plan_tasks, PlanError};
    use crate::executor::runner::JobRunner;
    use crate::executor::tracker::TaskTracker;
    use crate::executor::types::{RunReport, Task, TaskResult, TaskStatus};
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn config_with_tool(dir: &Path, base: Vec<String>, inputs: &[&str], workers: usize) -> BootstrapConfig {
        BootstrapConfig {
            input_dir: dir.join("data"),
            output_dir: dir.to_path_buf(),
            command: Some(base),
            num_workers: workers,
            input_files: inputs.iter().map(|s| s.to_string()).collect(),
            ..BootstrapConfig::default()
        }
    }

    // ============================================================
    // TEST 1: Planning
    // ============================================================

    #[test]
    fn test_log_path_replaces_extension() {
        let path = log_path_for(Path::new("/out"), "data_circle_100000x100000_0.5.bin", "-bootstrap")
            .unwrap();

        assert_eq!(
            path,
            PathBuf::from("/out/data_circle_100000x100000_0.5-bootstrap.txt")
        );
    }

    #[test]
    fn test_log_path_without_stem_is_rejected() {
        let err = log_path_for(Path::new("/out"), "..", "-bootstrap").unwrap_err();
        assert_eq!(err, PlanError::NoStem("..".to_string()));
    }

    #[test]
    fn test_plan_appends_input_flag_and_path() {
        let config = BootstrapConfig {
            input_dir: PathBuf::from("/data"),
            output_dir: PathBuf::from("/logs"),
            tool_path: PathBuf::from("/opt/tool.jar"),
            input_files: vec!["a.bin".to_string(), "b.bin".to_string()],
            ..BootstrapConfig::default()
        };

        let tasks = plan_tasks(&config).unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].input, "a.bin");
        assert_eq!(tasks[0].log_path, PathBuf::from("/logs/a-bootstrap.txt"));
        assert_eq!(
            tasks[0].command_line(),
            "java -Xms2G -Xmx2G -jar /opt/tool.jar -v 2 -b 10 -s 10000 -f /data/a.bin"
        );
        assert_eq!(tasks[1].command.last().unwrap(), "/data/b.bin");
        assert_ne!(tasks[0].id, tasks[1].id);
    }

    #[test]
    fn test_plan_rejects_duplicate_inputs() {
        let config = BootstrapConfig {
            input_files: vec!["a.bin".to_string(), "b.bin".to_string(), "a.bin".to_string()],
            ..BootstrapConfig::default()
        };

        let err = plan_tasks(&config).unwrap_err();

        assert!(matches!(err, PlanError::LogPathCollision { .. }));
    }

    #[test]
    fn test_plan_rejects_inputs_sharing_a_stem() {
        let config = BootstrapConfig {
            input_files: vec!["run.bin".to_string(), "run.dat".to_string()],
            ..BootstrapConfig::default()
        };

        match plan_tasks(&config) {
            Err(PlanError::LogPathCollision { first, second, .. }) => {
                assert_eq!(first, "run.bin");
                assert_eq!(second, "run.dat");
            }
            other => panic!("expected collision, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_requires_inputs() {
        let config = BootstrapConfig {
            input_files: vec![],
            ..BootstrapConfig::default()
        };

        assert_eq!(plan_tasks(&config).unwrap_err(), PlanError::NoInputs);
    }

    // ============================================================
    // TEST 2: Tracker
    // ============================================================

    #[test]
    fn test_tracker_transitions_and_peak() {
        let tracker = TaskTracker::new();
        let a = Task::new("a.bin", PathBuf::from("a.txt"), vec!["true".to_string()]);
        let b = Task::new("b.bin", PathBuf::from("b.txt"), vec!["true".to_string()]);

        tracker.register(&a);
        tracker.register(&b);
        assert_eq!(tracker.counts(), (2, 0, 0, 0));

        tracker.mark_running(&a.id);
        tracker.mark_running(&b.id);
        assert_eq!(tracker.running(), 2);

        tracker.finish(&a.id, TaskStatus::Completed);
        tracker.finish(
            &b.id,
            TaskStatus::Failed {
                error: "boom".to_string(),
            },
        );

        assert_eq!(tracker.running(), 0);
        assert_eq!(tracker.peak_concurrency(), 2);
        assert_eq!(tracker.counts(), (0, 0, 1, 1));
        assert_eq!(tracker.status(&a.id), Some(TaskStatus::Completed));
        assert_eq!(tracker.failed_inputs(), vec!["b.bin".to_string()]);
    }

    #[test]
    fn test_tracker_releases_running_slot_when_worker_dies() {
        // ARRANGE: one task running, one still pending
        let tracker = TaskTracker::new();
        let running = Task::new("r.bin", PathBuf::from("r.txt"), vec!["true".to_string()]);
        let pending = Task::new("p.bin", PathBuf::from("p.txt"), vec!["true".to_string()]);
        tracker.register(&running);
        tracker.register(&pending);
        tracker.mark_running(&running.id);

        // ACT: both end through the panic path, which does not know their state
        let panicked = TaskResult::Panicked {
            detail: "worker panicked".to_string(),
        };
        tracker.finish(&running.id, panicked.status());
        tracker.finish(&pending.id, panicked.status());

        // ASSERT
        assert_eq!(tracker.running(), 0);
        assert_eq!(tracker.counts(), (0, 0, 0, 2));

        tracker.finish(&running.id, TaskStatus::Completed);
        assert_eq!(tracker.running(), 0);
    }

    // ============================================================
    // TEST 3: Runner - five inputs, two workers
    // ============================================================

    #[cfg(unix)]
    #[tokio::test]
    async fn test_five_inputs_two_workers_capture_logs() {
        // ARRANGE: a fake tool echoing to both streams
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "fake-tool.sh",
            "echo \"bootstrap of $2\"\necho \"warning for $2\" >&2\nsleep 0.2\n",
        );
        let inputs = ["s1.bin", "s2.bin", "s3.bin", "s4.bin", "s5.bin"];
        let config = config_with_tool(
            dir.path(),
            vec!["sh".to_string(), script.display().to_string()],
            &inputs,
            2,
        );
        let tasks = plan_tasks(&config).unwrap();
        let tracker = TaskTracker::new();

        // ACT
        let report = JobRunner::new(tracker.clone(), config.num_workers, None)
            .run(tasks)
            .await;

        // ASSERT: one log per input, each holding both streams of its own invocation
        assert_eq!(report.outcomes.len(), 5);
        assert!(report.all_succeeded());
        assert!(report.peak_concurrency <= 2);
        assert_eq!(tracker.running(), 0);
        assert_eq!(tracker.counts(), (0, 0, 5, 0));

        for (name, outcome) in inputs.iter().zip(&report.outcomes) {
            assert_eq!(&outcome.input, name);
            let log = std::fs::read_to_string(&outcome.log_path).unwrap();
            let input_path = dir.path().join("data").join(name);
            assert!(log.contains(&format!("bootstrap of {}", input_path.display())));
            assert!(log.contains(&format!("warning for {}", input_path.display())));
        }

        let logs = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with("-bootstrap.txt"))
            .count();
        assert_eq!(logs, 5);
    }

    // ============================================================
    // TEST 4: Concurrency bound observed by the processes themselves
    // ============================================================

    #[cfg(unix)]
    async fn observed_peak(workers: usize, task_count: usize) -> (usize, RunReport) {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state");
        std::fs::create_dir(&state).unwrap();
        let script = write_script(
            dir.path(),
            "probe.sh",
            concat!(
                "state=\"$1\"\n",
                "marker=\"$state/running.$$\"\n",
                "touch \"$marker\"\n",
                "ls \"$state\" | grep -c '^running\\.' >> \"$state/../observed\"\n",
                "sleep 0.2\n",
                "rm \"$marker\"\n",
            ),
        );
        let names: Vec<String> = (0..task_count).map(|i| format!("in{}.bin", i)).collect();
        let name_refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let config = config_with_tool(
            dir.path(),
            vec![
                "sh".to_string(),
                script.display().to_string(),
                state.display().to_string(),
            ],
            &name_refs,
            workers,
        );

        let report = JobRunner::new(TaskTracker::new(), workers, None)
            .run(plan_tasks(&config).unwrap())
            .await;

        let observed = std::fs::read_to_string(dir.path().join("observed")).unwrap();
        let peak = observed
            .lines()
            .filter_map(|line| line.trim().parse::<usize>().ok())
            .max()
            .unwrap_or(0);

        (peak, report)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_concurrency_never_exceeds_worker_count() {
        for workers in [1usize, 3] {
            let (peak, report) = observed_peak(workers, 6).await;

            assert!(peak >= 1);
            assert!(
                peak <= workers,
                "observed {} concurrent processes with {} workers",
                peak,
                workers
            );
            assert!(report.peak_concurrency <= workers);
            assert_eq!(report.succeeded(), 6);
        }
    }

    #[tokio::test]
    async fn test_empty_run_returns_immediately() {
        let report = JobRunner::new(TaskTracker::new(), 4, None).run(vec![]).await;

        assert!(report.outcomes.is_empty());
        assert!(report.all_succeeded());
        assert_eq!(report.peak_concurrency, 0);
    }

    // ============================================================
    // TEST 5: The runner returns only after every process exited
    // ============================================================

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_waits_for_all_processes() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "slow.sh",
            "sleep 0.3\ntouch \"$2.done\"\n",
        );
        let config = config_with_tool(
            dir.path(),
            vec!["sh".to_string(), script.display().to_string()],
            &["a.bin", "b.bin", "c.bin"],
            3,
        );
        std::fs::create_dir(dir.path().join("data")).unwrap();

        JobRunner::new(TaskTracker::new(), 3, None)
            .run(plan_tasks(&config).unwrap())
            .await;

        for name in ["a.bin", "b.bin", "c.bin"] {
            let marker = dir.path().join("data").join(format!("{}.done", name));
            assert!(marker.exists(), "{} finished after the runner returned", name);
        }
    }

    // ============================================================
    // TEST 6: Failures are recorded and never leak permits
    // ============================================================

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "fail.sh", "echo broken >&2\nexit 3\n");
        let config = config_with_tool(
            dir.path(),
            vec!["sh".to_string(), script.display().to_string()],
            &["a.bin"],
            1,
        );

        let report = JobRunner::new(TaskTracker::new(), 1, None)
            .run(plan_tasks(&config).unwrap())
            .await;

        assert_eq!(
            report.outcomes[0].result,
            TaskResult::NonZeroExit { code: Some(3) }
        );
        assert!(!report.all_succeeded());
        let log = std::fs::read_to_string(&report.outcomes[0].log_path).unwrap();
        assert!(log.contains("broken"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_failure_releases_permit() {
        // ARRANGE: one worker, the first task points at a missing executable
        let dir = tempfile::tempdir().unwrap();
        let missing = Task::new(
            "missing.bin",
            dir.path().join("missing-bootstrap.txt"),
            vec![dir.path().join("no-such-tool").display().to_string()],
        );
        let ok = Task::new(
            "ok.bin",
            dir.path().join("ok-bootstrap.txt"),
            vec!["sh".to_string(), "-c".to_string(), "echo fine".to_string()],
        );
        let tracker = TaskTracker::new();

        // ACT
        let report = JobRunner::new(tracker.clone(), 1, None)
            .run(vec![missing, ok])
            .await;

        // ASSERT: the second task still ran on the only permit
        assert!(matches!(
            report.outcomes[0].result,
            TaskResult::LaunchFailed { .. }
        ));
        assert_eq!(report.outcomes[1].result, TaskResult::Success);
        assert_eq!(tracker.failed_inputs(), vec!["missing.bin".to_string()]);
        assert_eq!(tracker.running(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unwritable_log_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let broken = Task::new(
            "a.bin",
            dir.path().join("no-such-dir").join("a-bootstrap.txt"),
            vec!["true".to_string()],
        );
        let ok = Task::new(
            "b.bin",
            dir.path().join("b-bootstrap.txt"),
            vec!["true".to_string()],
        );

        let report = JobRunner::new(TaskTracker::new(), 1, None)
            .run(vec![broken, ok])
            .await;

        assert!(matches!(report.outcomes[0].result, TaskResult::LogIo { .. }));
        assert!(report.outcomes[1].result.is_success());
        assert_eq!(report.failed().count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_hung_process() {
        let dir = tempfile::tempdir().unwrap();
        let hung = Task::new(
            "hung.bin",
            dir.path().join("hung-bootstrap.txt"),
            vec!["sleep".to_string(), "30".to_string()],
        );
        let started = std::time::Instant::now();

        let report = JobRunner::new(TaskTracker::new(), 1, Some(Duration::from_millis(200)))
            .run(vec![hung])
            .await;

        assert!(matches!(
            report.outcomes[0].result,
            TaskResult::TimedOut { .. }
        ));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_empty_command_cannot_launch() {
        let result = TaskResult::LaunchFailed {
            detail: "empty command".to_string(),
        };
        assert_eq!(
            result.status(),
            TaskStatus::Failed {
                error: "failed to launch: empty command".to_string()
            }
        );
    }

    // ============================================================
    // TEST 7: Report output
    // ============================================================

    #[cfg(unix)]
    #[tokio::test]
    async fn test_report_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let task = Task::new(
            "a.bin",
            dir.path().join("a-bootstrap.txt"),
            vec!["sh".to_string(), "-c".to_string(), "exit 1".to_string()],
        );
        let report = JobRunner::new(TaskTracker::new(), 1, None)
            .run(vec![task])
            .await;
        let path = dir.path().join("report.json");

        report.write_json(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["outcomes"][0]["input"], "a.bin");
        assert_eq!(json["outcomes"][0]["result"]["kind"], "non_zero_exit");
        assert_eq!(json["outcomes"][0]["result"]["code"], 1);
    }
}
