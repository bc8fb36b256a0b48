// SPDX-License-Identifier: MIT
//! Sandboxed evaluation of the script surface.
//!
//! The snippet runs in a separate interpreter process with a cleared
//! environment, a scratch working directory, a wall-clock limit and a cap on
//! how much output is read back.

use std::io::{self, Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;

use super::SyncError;

pub const DEFAULT_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(DEFAULT_TIMEOUT_MS);
const MAX_OUTPUT_BYTES: usize = 1 << 20;
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Reads the snippet from stdin, runs it as a function body and prints the
/// returned value as JSON.
const NODE_PRELUDE: &str = "let s='';process.stdin.setEncoding('utf8');\
process.stdin.on('data',c=>s+=c);\
process.stdin.on('end',()=>{const v=new Function(s)();\
process.stdout.write(JSON.stringify(v===undefined?null:v));});";

/// Runs a script snippet and returns the value it produced.
pub trait ScriptEvaluator: Send {
    /// # Errors
    ///
    /// Returns [`SyncError::ScriptEvaluationFailure`] if the snippet throws,
    /// times out, or yields something that is not JSON.
    fn evaluate(&self, source: &str) -> Result<Value, SyncError>;
}

/// Evaluates snippets with an external interpreter. The snippet is written to
/// the child's stdin and a single JSON document is expected on stdout.
#[derive(Debug, Clone)]
pub struct ProcessEvaluator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessEvaluator {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Node.js running the snippet as `new Function(source)()`.
    #[must_use]
    pub fn node(timeout: Duration) -> Self {
        Self::new("node", vec!["-e".into(), NODE_PRELUDE.into()], timeout)
    }

    fn spawn(&self) -> Result<Child, SyncError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env_clear()
            .current_dir(std::env::temp_dir())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(path) = std::env::var_os("PATH") {
            command.env("PATH", path);
        }
        command
            .spawn()
            .map_err(|e| failure(format!("failed to start {}: {e}", self.program)))
    }
}

impl ScriptEvaluator for ProcessEvaluator {
    fn evaluate(&self, source: &str) -> Result<Value, SyncError> {
        let mut child = self.spawn()?;

        // Feed stdin from its own thread so a child that never reads cannot
        // stall us past the deadline.
        let stdin = child.stdin.take();
        let input = source.to_owned();
        let writer = thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                let _ = stdin.write_all(input.as_bytes());
            }
        });
        let stdout = capped_reader(child.stdout.take());
        let stderr = capped_reader(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(failure(format!(
                        "script timed out after {} ms",
                        self.timeout.as_millis()
                    )));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(failure(format!("failed to wait for script: {e}"))),
            }
        };
        let _ = writer.join();
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if stdout.truncated {
            return Err(failure(format!(
                "script output exceeds {} MiB",
                MAX_OUTPUT_BYTES >> 20
            )));
        }
        if !status.success() {
            let message = String::from_utf8_lossy(&stderr.bytes);
            let message = message.lines().rev().find(|line| !line.trim().is_empty());
            return Err(failure(format!(
                "script exited with {status}: {}",
                message.unwrap_or("no diagnostics")
            )));
        }
        serde_json::from_slice(&stdout.bytes)
            .map_err(|e| failure(format!("script output is not JSON: {e}")))
    }
}

/// Rejects every snippet; used when the script surface is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEvaluator;

impl ScriptEvaluator for DisabledEvaluator {
    fn evaluate(&self, _source: &str) -> Result<Value, SyncError> {
        Err(failure("script evaluation is disabled".into()))
    }
}

#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

/// Collects up to [`MAX_OUTPUT_BYTES`] from `pipe`. Anything past the cap is
/// drained and dropped so the child never blocks on a full pipe.
fn capped_reader<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Captured> {
    thread::spawn(move || {
        let mut captured = Captured::default();
        if let Some(mut pipe) = pipe {
            let limit = u64::try_from(MAX_OUTPUT_BYTES + 1).unwrap_or(u64::MAX);
            let _ = pipe.by_ref().take(limit).read_to_end(&mut captured.bytes);
            if captured.bytes.len() > MAX_OUTPUT_BYTES {
                captured.bytes.truncate(MAX_OUTPUT_BYTES);
                captured.truncated = true;
                let _ = io::copy(&mut pipe, &mut io::sink());
            }
        }
        captured
    })
}

fn failure(message: String) -> SyncError {
    SyncError::ScriptEvaluationFailure(message)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str, timeout: Duration) -> ProcessEvaluator {
        ProcessEvaluator::new("sh", vec!["-c".into(), script.into()], timeout)
    }

    #[test]
    fn returns_json_printed_by_interpreter() {
        let evaluator = shell("cat", DEFAULT_TIMEOUT);
        let value = evaluator.evaluate(r#"{"direction":"vertical","panels":[]}"#).unwrap();
        assert_eq!(value["direction"], "vertical");
    }

    #[test]
    fn non_json_output_is_an_evaluation_failure() {
        let evaluator = shell("cat", DEFAULT_TIMEOUT);
        let err = evaluator.evaluate("return {").unwrap_err();
        assert!(matches!(err, SyncError::ScriptEvaluationFailure(_)));
    }

    #[test]
    fn non_zero_exit_reports_stderr() {
        let evaluator = shell("echo 'ReferenceError: x is not defined' >&2; exit 1", DEFAULT_TIMEOUT);
        let SyncError::ScriptEvaluationFailure(message) = evaluator.evaluate("x").unwrap_err() else {
            panic!("expected an evaluation failure");
        };
        assert!(message.contains("ReferenceError"), "{message}");
    }

    #[test]
    fn runaway_script_is_killed_at_deadline() {
        let evaluator = shell("sleep 5", Duration::from_millis(100));
        let started = Instant::now();
        let SyncError::ScriptEvaluationFailure(message) = evaluator.evaluate("").unwrap_err() else {
            panic!("expected an evaluation failure");
        };
        assert!(message.contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn oversized_output_is_reported_not_timed_out() {
        let evaluator = shell("head -c 3000000 /dev/zero | tr '\\0' 'a'", DEFAULT_TIMEOUT);
        let SyncError::ScriptEvaluationFailure(message) = evaluator.evaluate("").unwrap_err() else {
            panic!("expected an evaluation failure");
        };
        assert!(message.contains("exceeds 1 MiB"), "{message}");
    }

    #[test]
    fn environment_is_cleared_except_path() {
        let evaluator = shell(
            r#"printf '["%s","%s"]' "${HOME:-none}" "${PATH:+set}""#,
            DEFAULT_TIMEOUT,
        );
        let value = evaluator.evaluate("").unwrap();
        assert_eq!(value[0], "none");
        assert_eq!(value[1], "set");
    }

    #[test]
    fn missing_interpreter_is_reported() {
        let evaluator = ProcessEvaluator::new("panelwright-no-such-binary", vec![], DEFAULT_TIMEOUT);
        assert!(evaluator.evaluate("return 1").is_err());
    }

    #[test]
    fn disabled_evaluator_rejects() {
        assert!(DisabledEvaluator.evaluate("return {}").is_err());
    }
}
