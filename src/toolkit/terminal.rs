//! Terminal toolkit: shell commands and long-running shell sessions.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ToolkitConfig;
use crate::mcp::tools::{Arguments, Callable, FnTool, ParamSpec, ToolError, ToolResult};
use crate::toolkit::session::ShellSession;
use crate::toolkit::{Toolkit, ToolkitFactory};
use crate::utils::error::{McpError, McpResult};

/// Programs refused outright in safe mode
const BLOCKED_PROGRAMS: &[&str] = &[
    "sudo", "su", "doas", "shutdown", "reboot", "halt", "poweroff", "init", "mkfs", "fdisk",
    "parted", "dd", "format",
];

/// `rm` targets refused in safe mode when deleting recursively
const PROTECTED_PATHS: &[&str] = &["/", "/*", "~", "~/", "~/*", "$HOME", "."];

/// Builds [`TerminalToolkit`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalToolkitFactory;

impl ToolkitFactory for TerminalToolkitFactory {
    fn build(&self, config: &ToolkitConfig) -> McpResult<Arc<dyn Toolkit>> {
        Ok(Arc::new(TerminalToolkit::new(config)?))
    }
}

struct TerminalState {
    working_directory: PathBuf,
    timeout: Duration,
    safe_mode: bool,
    sessions: Mutex<HashMap<String, ShellSession>>,
}

/// Runs shell commands in a fixed working directory.
///
/// Commands either run to completion within the configured timeout, or
/// start a named background session that later calls can inspect, feed
/// input to, wait on and kill.
pub struct TerminalToolkit {
    state: Arc<TerminalState>,
}

impl std::fmt::Debug for TerminalToolkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalToolkit")
            .field("working_directory", &self.state.working_directory)
            .field("timeout", &self.state.timeout)
            .field("safe_mode", &self.state.safe_mode)
            .finish_non_exhaustive()
    }
}

impl TerminalToolkit {
    /// Validates `config` and prepares the working directory.
    ///
    /// # Errors
    ///
    /// [`McpError::ToolkitInit`] if the timeout is not a positive number or
    /// the working directory cannot be created.
    pub fn new(config: &ToolkitConfig) -> McpResult<Self> {
        if !config.timeout.is_finite() || config.timeout <= 0.0 {
            return Err(McpError::ToolkitInit(format!(
                "timeout must be a positive number of seconds, got {}",
                config.timeout
            )));
        }

        let working_directory = match &config.working_directory {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|e| {
                    McpError::ToolkitInit(format!(
                        "cannot create working directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
                if !dir.is_dir() {
                    return Err(McpError::ToolkitInit(format!(
                        "working directory {} is not a directory",
                        dir.display()
                    )));
                }
                dir.clone()
            }
            None => std::env::current_dir().map_err(|e| {
                McpError::ToolkitInit(format!("cannot determine current directory: {}", e))
            })?,
        };

        if config.interactive {
            info!("Interactive mode requested; stdin is reserved for the protocol");
        }
        info!(
            working_directory = %working_directory.display(),
            timeout = config.timeout,
            safe_mode = config.safe_mode,
            "Terminal toolkit ready"
        );

        Ok(Self {
            state: Arc::new(TerminalState {
                working_directory,
                timeout: Duration::from_secs_f64(config.timeout),
                safe_mode: config.safe_mode,
                sessions: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Directory commands run in
    pub fn working_directory(&self) -> &Path {
        &self.state.working_directory
    }

    fn tool<F>(&self, name: &str, doc: &str, params: Vec<ParamSpec>, body: F) -> Arc<dyn Callable>
    where
        F: Fn(&TerminalState, Arguments) -> ToolResult<Value> + Send + Sync + 'static,
    {
        let state = self.state.clone();
        FnTool::new(name, params, move |args| body(&state, args))
            .with_doc(doc)
            .into_callable()
    }
}

impl Toolkit for TerminalToolkit {
    fn callables(&self) -> Vec<Arc<dyn Callable>> {
        let id = || ParamSpec::new("id").typed("str").describe("Shell session identifier");
        vec![
            self.tool(
                "shell_exec",
                "Executes a shell command in blocking or non-blocking mode.\n\n\
                 Blocking mode waits for the command to finish, up to the configured \
                 timeout, and returns its output. Non-blocking mode starts the command \
                 in the background under the given session id.",
                vec![
                    id(),
                    ParamSpec::new("command").typed("str").describe("Shell command to run"),
                    ParamSpec::new("block")
                        .typed("bool")
                        .with_default(json!(true))
                        .describe("Wait for the command to finish"),
                ],
                shell_exec,
            ),
            self.tool(
                "shell_view",
                "Retrieves new output from a shell session since the last view.",
                vec![id()],
                shell_view,
            ),
            self.tool(
                "shell_wait",
                "Waits for a shell session's process to finish, up to a time limit.",
                vec![
                    id(),
                    ParamSpec::new("wait_seconds")
                        .typed("float")
                        .with_default(json!(5.0))
                        .describe("Maximum number of seconds to wait"),
                ],
                shell_wait,
            ),
            self.tool(
                "shell_write_to_process",
                "Writes a line of input to a running shell session.",
                vec![
                    id(),
                    ParamSpec::new("command").typed("str").describe("Input to send"),
                ],
                shell_write_to_process,
            ),
            self.tool(
                "shell_kill_process",
                "Terminates the process of a shell session.",
                vec![id()],
                shell_kill_process,
            ),
        ]
    }
}

impl TerminalState {
    fn sessions(&self) -> MutexGuard<'_, HashMap<String, ShellSession>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_command(&self, command: &str) -> ToolResult<()> {
        if !self.safe_mode {
            return Ok(());
        }
        match unsafe_reason(command) {
            Some(reason) => {
                warn!(command, reason, "Command rejected by safe mode");
                Err(ToolError::execution(format!(
                    "Command rejected by safe mode: {}",
                    reason
                )))
            }
            None => Ok(()),
        }
    }
}

fn no_session(id: &str) -> ToolError {
    ToolError::UnknownSession(id.to_string())
}

fn shell_exec(state: &TerminalState, args: Arguments) -> ToolResult<Value> {
    let id = args.str("id")?;
    let command = args.str("command")?;
    state.check_command(command)?;
    debug!(id, command, "shell_exec");

    let mut sessions = state.sessions();
    if let Some(existing) = sessions.get_mut(id) {
        if existing.is_running()? {
            return Err(ToolError::execution(format!(
                "Session '{}' already has a running process",
                id
            )));
        }
    }

    let mut session = ShellSession::spawn(command, &state.working_directory)?;

    if !args.bool("block")? {
        sessions.insert(id.to_string(), session);
        return Ok(Value::String(format!(
            "Started session '{}' in the background. Use shell_view or shell_wait to see its output.",
            id
        )));
    }

    // Blocking runs are not tracked as sessions
    drop(sessions);

    let status = session.wait(state.timeout)?;
    if status.is_none() {
        session.kill()?;
    }
    let mut output = session.take_new_output();

    match status {
        None => {
            if !output.is_empty() && !output.ends_with('\n') {
                output.push('\n');
            }
            output.push_str(&format!(
                "Command timed out after {} seconds",
                state.timeout.as_secs_f64()
            ));
        }
        Some(status) if output.is_empty() => {
            output = if status.success() {
                "Command executed successfully (no output)".to_string()
            } else {
                format!("Command failed with {} (no output)", status)
            };
        }
        Some(_) => {}
    }
    Ok(Value::String(output))
}

fn shell_view(state: &TerminalState, args: Arguments) -> ToolResult<Value> {
    let id = args.str("id")?;
    let mut sessions = state.sessions();
    let session = sessions.get_mut(id).ok_or_else(|| no_session(id))?;

    let running = session.is_running()?;
    let output = session.take_new_output();
    let text = describe_progress(output, running, session)?;
    evict_if_finished(&mut sessions, id)?;
    Ok(Value::String(text))
}

fn shell_wait(state: &TerminalState, args: Arguments) -> ToolResult<Value> {
    let id = args.str("id")?;
    let wait_seconds = args.f64("wait_seconds")?;
    if !wait_seconds.is_finite() || wait_seconds < 0.0 {
        return Err(ToolError::execution(
            "wait_seconds must be a non-negative number",
        ));
    }

    let mut sessions = state.sessions();
    let session = sessions.get_mut(id).ok_or_else(|| no_session(id))?;

    let finished = session.wait(Duration::from_secs_f64(wait_seconds))?.is_some();
    let output = session.take_new_output();
    let text = describe_progress(output, !finished, session)?;
    evict_if_finished(&mut sessions, id)?;
    Ok(Value::String(text))
}

/// Forgets a session whose process has exited and whose output was all returned
fn evict_if_finished(sessions: &mut HashMap<String, ShellSession>, id: &str) -> ToolResult<()> {
    if let Some(session) = sessions.get_mut(id) {
        if session.is_finished()? {
            sessions.remove(id);
            debug!(id, "Finished shell session removed");
        }
    }
    Ok(())
}

fn shell_write_to_process(state: &TerminalState, args: Arguments) -> ToolResult<Value> {
    let id = args.str("id")?;
    let input = args.str("command")?;
    state.check_command(input)?;

    let mut sessions = state.sessions();
    let session = sessions.get_mut(id).ok_or_else(|| no_session(id))?;
    if !session.is_running()? {
        return Err(ToolError::execution(format!(
            "Process in session '{}' is not running",
            id
        )));
    }

    session.write_line(input)?;
    Ok(Value::String(format!("Input sent to session '{}'", id)))
}

fn shell_kill_process(state: &TerminalState, args: Arguments) -> ToolResult<Value> {
    let id = args.str("id")?;
    let mut session = state.sessions().remove(id).ok_or_else(|| no_session(id))?;

    session.kill()?;
    info!(id, "Shell session terminated");
    Ok(Value::String(format!(
        "Process in session '{}' terminated",
        id
    )))
}

fn describe_progress(
    output: String,
    running: bool,
    session: &mut ShellSession,
) -> ToolResult<String> {
    if !output.is_empty() {
        return Ok(output);
    }
    if running {
        return Ok("(no new output, process still running)".to_string());
    }
    Ok(match session.status()? {
        Some(status) => format!("(no new output, process exited with {})", status),
        None => "(no new output)".to_string(),
    })
}

/// Why safe mode refuses `command`, if it does
fn unsafe_reason(command: &str) -> Option<&'static str> {
    if command.replace(' ', "").contains(":(){") {
        return Some("fork bombs are not allowed");
    }

    for segment in command.split(|c| matches!(c, ';' | '|' | '&' | '\n' | '(' | ')' | '`')) {
        let mut words = segment.split_whitespace();
        let Some(program) = words.next() else {
            continue;
        };
        let program = program.rsplit('/').next().unwrap_or(program);

        if BLOCKED_PROGRAMS.contains(&program) || program.starts_with("mkfs.") {
            return Some("privileged or destructive system commands are not allowed");
        }

        if program == "rm" {
            let rest: Vec<&str> = words.collect();
            let recursive = rest.iter().any(|w| {
                *w == "--recursive" || (w.starts_with('-') && !w.starts_with("--") && w.contains(['r', 'R']))
            });
            if recursive && rest.iter().any(|w| PROTECTED_PATHS.contains(w)) {
                return Some("recursive deletion of the root, home or working directory is not allowed");
            }
        }
    }
    None
}
