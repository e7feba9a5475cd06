//! Shell processes backing the terminal toolkit.

use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

// Background children of the shell can keep the pipes open after it exits
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Unread output kept per session; older output is discarded beyond this
pub const OUTPUT_LIMIT: usize = 1024 * 1024;

/// Output captured but not yet returned to a caller
#[derive(Debug, Default)]
struct OutputBuffer {
    text: String,
    discarded: usize,
}

impl OutputBuffer {
    fn push(&mut self, chunk: &str) {
        self.text.push_str(chunk);
        if self.text.len() > OUTPUT_LIMIT {
            let mut cut = self.text.len() - OUTPUT_LIMIT;
            while !self.text.is_char_boundary(cut) {
                cut += 1;
            }
            self.text.drain(..cut);
            self.discarded += cut;
        }
    }

    fn take(&mut self) -> String {
        let text = std::mem::take(&mut self.text);
        match std::mem::take(&mut self.discarded) {
            0 => text,
            n => format!("[{} bytes of earlier output discarded]\n{}", n, text),
        }
    }
}

/// A `sh -c` process whose combined stdout/stderr is captured in memory
#[derive(Debug)]
pub struct ShellSession {
    child: Child,
    stdin: Option<ChildStdin>,
    output: Arc<Mutex<OutputBuffer>>,
    readers: Vec<JoinHandle<()>>,
    status: Option<ExitStatus>,
}

impl ShellSession {
    /// Starts `command` in `cwd`
    pub fn spawn(command: &str, cwd: &Path) -> io::Result<Self> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let output = Arc::new(Mutex::new(OutputBuffer::default()));
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(capture(stdout, output.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(capture(stderr, output.clone()));
        }

        Ok(Self {
            stdin: child.stdin.take(),
            child,
            output,
            readers,
            status: None,
        })
    }

    /// Exit status, polling the process if it has not been seen exiting yet
    pub fn status(&mut self) -> io::Result<Option<ExitStatus>> {
        if self.status.is_none() {
            self.status = self.child.try_wait()?;
        }
        Ok(self.status)
    }

    /// Whether the process is still running
    pub fn is_running(&mut self) -> io::Result<bool> {
        Ok(self.status()?.is_none())
    }

    /// Waits up to `timeout` for the process to exit.
    ///
    /// Returns `None` if it is still running when the time is up.
    pub fn wait(&mut self, timeout: Duration) -> io::Result<Option<ExitStatus>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.status()? {
                self.drain();
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Output produced since the previous call.
    ///
    /// Returned output is released from memory. Once the process has exited
    /// the readers are drained first, so nothing written before exit is left
    /// behind.
    pub fn take_new_output(&mut self) -> String {
        if self.status.is_some() {
            self.drain();
        }
        self.output.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    /// Whether the process has exited and every byte it wrote was returned
    pub fn is_finished(&mut self) -> io::Result<bool> {
        if self.is_running()? || !self.readers.is_empty() {
            return Ok(false);
        }
        Ok(self
            .output
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .text
            .is_empty())
    }

    /// Writes `input` followed by a newline to the process's stdin
    pub fn write_line(&mut self, input: &str) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stdin is closed"))?;
        stdin.write_all(input.as_bytes())?;
        stdin.write_all(b"\n")?;
        stdin.flush()
    }

    /// Kills the process if it is still running and collects remaining output
    pub fn kill(&mut self) -> io::Result<()> {
        if self.is_running()? {
            self.child.kill()?;
            self.status = Some(self.child.wait()?);
        }
        self.stdin = None;
        self.drain();
        Ok(())
    }

    /// Gives the reader threads a short grace period to reach end of stream
    fn drain(&mut self) {
        let deadline = Instant::now() + DRAIN_GRACE;
        while self.readers.iter().any(|r| !r.is_finished()) && Instant::now() < deadline {
            thread::sleep(POLL_INTERVAL);
        }
        let (finished, pending): (Vec<_>, Vec<_>) =
            self.readers.drain(..).partition(|r| r.is_finished());
        for reader in finished {
            let _ = reader.join();
        }
        self.readers = pending;
    }
}

impl Drop for ShellSession {
    fn drop(&mut self) {
        if matches!(self.child.try_wait(), Ok(None)) {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

fn capture<R: Read + Send + 'static>(
    mut stream: R,
    sink: Arc<Mutex<OutputBuffer>>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        // Bytes of a character split across reads wait here for the rest
        let mut pending = Vec::new();
        loop {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    pending.extend_from_slice(&buf[..n]);
                    let complete = complete_prefix_len(&pending);
                    if complete > 0 {
                        let text = String::from_utf8_lossy(&pending[..complete]).into_owned();
                        sink.lock().unwrap_or_else(|e| e.into_inner()).push(&text);
                        pending.drain(..complete);
                    }
                }
            }
        }
        if !pending.is_empty() {
            sink.lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(&String::from_utf8_lossy(&pending));
        }
    })
}

/// Length of `bytes` without a trailing, still incomplete UTF-8 sequence
fn complete_prefix_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=len.min(3) {
        let byte = bytes[len - back];
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let width = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if width > back { len - back } else { len };
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ShellSession::spawn("echo out; echo err 1>&2", dir.path()).unwrap();

        let status = session.wait(Duration::from_secs(5)).unwrap().unwrap();
        assert!(status.success());

        let output = session.take_new_output();
        assert!(output.contains("out"));
        assert!(output.contains("err"));
        assert_eq!(session.take_new_output(), "");
    }

    #[test]
    fn test_interactive_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ShellSession::spawn("read line; echo got:$line", dir.path()).unwrap();

        session.write_line("hello").unwrap();
        session.wait(Duration::from_secs(5)).unwrap().unwrap();

        assert!(session.take_new_output().contains("got:hello"));
    }

    #[test]
    fn test_wait_times_out_and_kill() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ShellSession::spawn("sleep 30", dir.path()).unwrap();

        assert!(session.wait(Duration::from_millis(100)).unwrap().is_none());
        assert!(session.is_running().unwrap());

        session.kill().unwrap();
        assert!(!session.is_running().unwrap());
    }

    #[test]
    fn test_character_split_across_reads() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ShellSession::spawn(
            "head -c 4095 /dev/zero | tr '\\0' a; printf '\\303\\251\\n'",
            dir.path(),
        )
        .unwrap();
        session.wait(Duration::from_secs(5)).unwrap().unwrap();

        let output = session.take_new_output();
        assert!(!output.contains('\u{FFFD}'));
        assert!(output.ends_with("a\u{e9}\n"));
        assert_eq!(output.len(), 4095 + 3);
    }

    #[test]
    fn test_complete_prefix_len() {
        let e_acute = "\u{e9}".as_bytes();
        assert_eq!(complete_prefix_len(b"abc"), 3);
        assert_eq!(complete_prefix_len(&[b'a', e_acute[0]]), 1);
        assert_eq!(complete_prefix_len(&[b'a', e_acute[0], e_acute[1]]), 3);
        assert_eq!(complete_prefix_len(&[0xF0, 0x9F, 0x98]), 0);
        assert_eq!(complete_prefix_len(&[0xFF]), 1);
    }

    #[test]
    fn test_returned_output_is_released() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ShellSession::spawn("echo first", dir.path()).unwrap();
        session.wait(Duration::from_secs(5)).unwrap().unwrap();

        assert!(!session.is_finished().unwrap());
        assert_eq!(session.take_new_output(), "first\n");
        assert!(session.output.lock().unwrap().text.is_empty());
        assert!(session.is_finished().unwrap());
    }

    #[test]
    fn test_unread_output_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let command = format!("head -c {} /dev/zero | tr '\\0' a", OUTPUT_LIMIT + 5000);
        let mut session = ShellSession::spawn(&command, dir.path()).unwrap();
        session.wait(Duration::from_secs(10)).unwrap().unwrap();

        let output = session.take_new_output();
        assert!(output.starts_with("[5000 bytes of earlier output discarded]\n"));
        assert!(output.ends_with(&"a".repeat(OUTPUT_LIMIT)));
    }

    #[test]
    fn test_buffer_cap_respects_char_boundaries() {
        let mut buffer = OutputBuffer::default();
        buffer.push(&"\u{e9}".repeat(OUTPUT_LIMIT / 2));
        buffer.push("a");

        assert_eq!(buffer.text.len(), OUTPUT_LIMIT - 1);
        let text = buffer.take();
        assert!(text.starts_with("[2 bytes of earlier output discarded]\n\u{e9}"));
        assert!(text.ends_with("\u{e9}a"));
        assert!(buffer.take().is_empty());
    }
}
