//! Canned command runner

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;

use crate::submit::{CommandOutput, CommandRunner};

enum Canned {
    Output(CommandOutput),
    SpawnError(String),
}

/// Replays queued responses in order. Running with an empty queue is an
/// I/O error so unexpected calls surface in tests.
#[derive(Default)]
pub struct MockRunner {
    queue: Mutex<VecDeque<Canned>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful `sbatch` reply for `job_id`.
    pub fn push_accepted(&self, job_id: u64) {
        self.push_output(0, &format!("Submitted batch job {}\n", job_id), "");
    }

    pub fn push_output(&self, status: i32, stdout: &str, stderr: &str) {
        self.push(Canned::Output(CommandOutput {
            status: Some(status),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }));
    }

    /// Queue a failure to start the process at all.
    pub fn push_spawn_error(&self, message: &str) {
        self.push(Canned::SpawnError(message.to_string()));
    }

    /// Every argv passed to `run`, oldest first.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, canned: Canned) {
        self.queue.lock().unwrap().push_back(canned);
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, argv: &[String]) -> io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(argv.to_vec());
        match self.queue.lock().unwrap().pop_front() {
            Some(Canned::Output(output)) => Ok(output),
            Some(Canned::SpawnError(message)) => Err(io::Error::new(io::ErrorKind::NotFound, message)),
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("no canned response for `{}`", argv.join(" ")),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_replays_in_order() {
        let runner = MockRunner::new();
        runner.push_accepted(1);
        runner.push_output(1, "", "boom\n");

        let first = runner.run(&argv(&["sbatch"])).unwrap();
        assert_eq!(first.stdout, "Submitted batch job 1\n");
        assert!(first.success());

        let second = runner.run(&argv(&["sbatch", "-p", "x"])).unwrap();
        assert_eq!(second.status, Some(1));
        assert_eq!(second.stderr, "boom\n");

        assert_eq!(runner.calls().len(), 2);
        assert_eq!(runner.calls()[1], argv(&["sbatch", "-p", "x"]));
    }

    #[test]
    fn test_empty_queue_is_error() {
        let runner = MockRunner::new();
        let err = runner.run(&argv(&["scontrol", "token"])).unwrap_err();
        assert!(err.to_string().contains("scontrol token"));
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_spawn_error() {
        let runner = MockRunner::new();
        runner.push_spawn_error("failed to run sbatch: not found");
        let err = runner.run(&argv(&["sbatch"])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(err.to_string(), "failed to run sbatch: not found");
    }
}
