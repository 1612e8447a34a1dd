//! Child process helpers shared by the extract and install steps

use crate::error::{RecipeError, RecipeResult};
use std::collections::VecDeque;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// Callback receiving each line a child process prints
pub type OutputSink<'a> = &'a (dyn Fn(String) + Send + Sync);

/// Max number of output lines to include in error messages.
const ERROR_TAIL_LINES: usize = 50;

/// Exit status plus the last lines the child printed
#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    recent: VecDeque<String>,
}

impl Captured {
    /// The last `ERROR_TAIL_LINES` lines, joined for an error message
    pub fn tail(&self) -> String {
        self.recent.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}

/// Keep at most `ERROR_TAIL_LINES` lines, dropping the oldest
fn push_recent(recent: &mut VecDeque<String>, line: String) {
    if recent.len() == ERROR_TAIL_LINES {
        recent.pop_front();
    }
    recent.push_back(line);
}

/// Decode one raw output line. Invalid UTF-8 is replaced, never fatal.
fn decode_line(mut raw: Vec<u8>) -> String {
    if raw.last() == Some(&b'\r') {
        raw.pop();
    }
    match String::from_utf8(raw) {
        Ok(line) => line,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

/// Render a command for logs and error messages
pub(crate) fn describe(cmd: &Command) -> String {
    let std_cmd = cmd.as_std();
    let mut parts = vec![std_cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(std_cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Spawn `cmd` with piped output and stream stdout+stderr line by line.
///
/// Blocks until the child exits. There is no timeout.
pub async fn run_streaming(mut cmd: Command, on_output: OutputSink<'_>) -> RecipeResult<Captured> {
    let label = describe(&cmd);
    debug!("Executing: {}", label);

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| RecipeError::command_failed(label.clone(), e))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| RecipeError::Internal(format!("stdout not captured for {}", label)))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| RecipeError::Internal(format!("stderr not captured for {}", label)))?;

    // Split on raw bytes: vendor tools may print non UTF-8 output
    let mut stdout_reader = BufReader::new(stdout).split(b'\n');
    let mut stderr_reader = BufReader::new(stderr).split(b'\n');

    let mut recent = VecDeque::with_capacity(ERROR_TAIL_LINES);
    let mut stdout_done = false;
    let mut stderr_done = false;

    while !stdout_done || !stderr_done {
        let (segment, stream) = tokio::select! {
            segment = stdout_reader.next_segment(), if !stdout_done => (segment, &mut stdout_done),
            segment = stderr_reader.next_segment(), if !stderr_done => (segment, &mut stderr_done),
        };
        match segment {
            Ok(Some(raw)) => {
                let line = decode_line(raw);
                on_output(line.clone());
                push_recent(&mut recent, line);
            }
            Ok(None) => *stream = true,
            Err(e) => {
                warn!("Stopped reading output of {}: {}", label, e);
                *stream = true;
            }
        }
    }

    let status = child
        .wait()
        .await
        .map_err(|e| RecipeError::command_failed(label, e))?;

    Ok(Captured { status, recent })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[tokio::test]
    async fn collects_both_streams() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err >&2; exit 4"]);

        let seen = Mutex::new(Vec::new());
        let sink = |line: String| seen.lock().unwrap().push(line);
        let captured = run_streaming(cmd, &sink).await.unwrap();

        assert_eq!(captured.status.code(), Some(4));
        let mut lines: Vec<_> = captured.recent.iter().cloned().collect();
        lines.sort();
        assert_eq!(lines, vec!["err".to_string(), "out".to_string()]);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn spawn_failure_is_command_error() {
        let cmd = Command::new("imod-recipe-definitely-not-a-binary");
        let err = run_streaming(cmd, &|_: String| {}).await.unwrap_err();
        assert!(matches!(err, RecipeError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn tail_keeps_last_lines() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "i=0; while [ $i -lt 80 ]; do echo $i; i=$((i+1)); done"]);

        let captured = run_streaming(cmd, &|_: String| {}).await.unwrap();

        assert_eq!(captured.recent.len(), ERROR_TAIL_LINES);
        let tail = captured.tail();
        assert!(tail.starts_with("30\n"));
        assert!(tail.ends_with("79"));
    }

    #[tokio::test]
    async fn invalid_utf8_output_does_not_stall() {
        // A bad byte followed by more than a pipe buffer of output
        let mut cmd = Command::new("sh");
        cmd.args([
            "-c",
            "printf 'ok\\n\\377bad\\n'; head -c 300000 /dev/zero | tr '\\0' a; echo; echo done",
        ]);

        let captured = tokio::time::timeout(
            Duration::from_secs(30),
            run_streaming(cmd, &|_: String| {}),
        )
        .await
        .expect("run_streaming stalled on non UTF-8 output")
        .unwrap();

        assert!(captured.status.success());
        let lines: Vec<_> = captured.recent.iter().collect();
        assert_eq!(lines[0], "ok");
        assert_eq!(lines[1], "\u{FFFD}bad");
        assert_eq!(lines[2].len(), 300_000);
        assert_eq!(lines[3], "done");
    }

    #[test]
    fn decode_line_strips_carriage_return() {
        assert_eq!(decode_line(b"copying\r".to_vec()), "copying");
        assert_eq!(decode_line(vec![0xff, b'x']), "\u{FFFD}x");
    }

    #[test]
    fn describe_joins_program_and_args() {
        let mut cmd = Command::new("bash");
        cmd.args(["archive.sh", "-extract"]);
        assert_eq!(describe(&cmd), "bash archive.sh -extract");
    }
}
