// Executor: turns a `RequestSpec` into an invocation of the external HTTP
// client (curl by default), runs it under a deadline and collects what it
// printed.
//
// A request body never goes on the command line. It is written to a
// temporary file and passed as `-d @<path>`. The file lives in a
// `NamedTempFile` owned by the `Invocation`, so it is removed whenever the
// invocation is dropped, whether the run succeeded, failed or timed out.

use crate::config::Config;
use crate::error::{AssistantError, Result};
use crate::request::{ExecutionResult, RequestSpec};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub struct Executor {
    program: String,
    leading_args: Vec<String>,
    timeout: Duration,
    allowed_hosts: Vec<String>,
    /// Where body files are created; the system temp dir when unset.
    body_dir: Option<PathBuf>,
}

/// A fully assembled command line plus the body file it refers to.
pub struct Invocation {
    program: String,
    args: Vec<String>,
    body_file: Option<NamedTempFile>,
}

impl Invocation {
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn body_path(&self) -> Option<&Path> {
        self.body_file.as_ref().map(|f| f.path())
    }

    /// Shell-pasteable rendering of the command.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote_arg)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Raw captured output of a finished child.
struct Captured {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl Executor {
    pub fn new(config: &Config) -> Self {
        let mut client = config.http_client.iter().cloned();
        let program = client
            .next()
            .unwrap_or_else(|| crate::config::DEFAULT_HTTP_CLIENT.to_string());
        Executor {
            program,
            leading_args: client.collect(),
            timeout: config.command_timeout,
            allowed_hosts: config.allowed_hosts.clone(),
            body_dir: None,
        }
    }

    /// Create request body files under `dir` instead of the system temp dir.
    pub fn with_body_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.body_dir = Some(dir.into());
        self
    }

    /// Run the request. Only a malformed JSON body is returned as an error,
    /// and it is detected before anything is spawned; every other failure is
    /// reported inside the `ExecutionResult`.
    pub fn execute(&self, spec: &RequestSpec) -> Result<ExecutionResult> {
        if let Err(err) = self.check_host(&spec.url) {
            warn!(url = %spec.url, "refusing request: {err}");
            return Ok(ExecutionResult::failed(None, err));
        }

        let invocation = match self.prepare(spec) {
            Ok(invocation) => invocation,
            Err(err @ AssistantError::MalformedJsonBody(_)) => return Err(err),
            Err(err) => return Ok(ExecutionResult::failed(None, err)),
        };
        let command = invocation.command_line();
        info!(%command, "running HTTP client");

        let result = match self.run(&invocation) {
            Ok(captured) => {
                let success = captured.status.success();
                debug!(status = ?captured.status, "HTTP client finished");
                ExecutionResult {
                    success,
                    command: Some(command),
                    error: if success { None } else { Some(captured.stderr.clone()) },
                    stdout: captured.stdout,
                    stderr: captured.stderr,
                }
            }
            Err(err) => {
                warn!(%command, "HTTP client failed: {err}");
                ExecutionResult::failed(Some(command), err)
            }
        };
        // Dropping the invocation removes the body file.
        drop(invocation);
        Ok(result)
    }

    /// Assemble the argument list and, when there is a body, the temporary
    /// file holding it.
    pub fn prepare(&self, spec: &RequestSpec) -> Result<Invocation> {
        let mut args = self.leading_args.clone();
        args.extend(["-v".to_string(), "-X".to_string(), spec.method.clone()]);

        if let Some(content_type) = &spec.content_type {
            args.push("-H".to_string());
            args.push(format!("Content-Type: {content_type}"));
        }

        let body_file = match spec.payload() {
            Some(body) => {
                let contents = if spec.is_json() {
                    normalize_json(body)?
                } else {
                    body.to_string()
                };
                let file = write_body_file(self.body_dir.as_deref(), &contents)?;
                args.push("-d".to_string());
                args.push(format!("@{}", file.path().display()));
                Some(file)
            }
            None => None,
        };

        args.push(spec.url.clone());
        Ok(Invocation {
            program: self.program.clone(),
            args,
            body_file,
        })
    }

    fn check_host(&self, url: &str) -> Result<()> {
        if self.allowed_hosts.is_empty() {
            return Ok(());
        }
        let parsed = reqwest::Url::parse(url).map_err(|e| AssistantError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let host = parsed
            .host_str()
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| AssistantError::InvalidUrl {
                url: url.to_string(),
                reason: "no host".into(),
            })?;
        if self.allowed_hosts.iter().any(|allowed| *allowed == host) {
            Ok(())
        } else {
            Err(AssistantError::HostNotAllowed(host))
        }
    }

    fn run(&self, invocation: &Invocation) -> Result<Captured> {
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| AssistantError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        // Drain both pipes while waiting, otherwise a chatty child fills the
        // pipe buffer and never exits.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AssistantError::Timeout {
                    program: invocation.program.clone(),
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(Captured {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }
}

/// Parse and re-serialize a JSON body. Validates it and strips insignificant
/// whitespace; key order is kept.
pub fn normalize_json(body: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    Ok(serde_json::to_string(&value)?)
}

fn write_body_file(dir: Option<&Path>, contents: &str) -> Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("curl-assistant-").suffix(".body");
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    debug!(path = %file.path().display(), bytes = contents.len(), "wrote request body");
    Ok(file)
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Quote an argument for pasting into a POSIX shell. Plain words stay bare,
/// `!` forces single quotes (history expansion happens inside double quotes),
/// everything else is double-quoted with `"`, `\`, `$` and backtick escaped.
fn quote_arg(arg: &str) -> String {
    let is_plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '=' | '@' | '%' | '+' | ','));
    if is_plain {
        return arg.to_string();
    }
    if arg.contains('!') {
        return format!("'{}'", arg.replace('\'', r"'\''"));
    }
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
