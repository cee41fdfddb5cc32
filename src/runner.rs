//! External command execution.
//!
//! The fetch tool and the VCS tools are only ever reached through
//! [`ToolRunner`], so the pinning pipeline can be exercised without a Go
//! installation or a network.

use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A fully specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; `None` inherits the caller's.
    pub dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            dir: None,
        }
    }

    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.dir = Some(dir.to_path_buf());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        if let Some(dir) = &self.dir {
            write!(f, " (in {})", dir.display())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitState {
    Success,
    /// Non-zero exit; `None` when killed by a signal.
    Failed(Option<i32>),
    TimedOut(Duration),
}

impl ExitState {
    pub fn success(&self) -> bool {
        matches!(self, ExitState::Success)
    }

    fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            ExitState::Success
        } else {
            ExitState::Failed(status.code())
        }
    }
}

impl fmt::Display for ExitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitState::Success => write!(f, "exit status 0"),
            ExitState::Failed(Some(code)) => write!(f, "exit status {}", code),
            ExitState::Failed(None) => write!(f, "terminated by signal"),
            ExitState::TimedOut(limit) => write!(f, "timed out after {}s", limit.as_secs()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub state: ExitState,
    /// stdout followed by stderr
    pub combined: Vec<u8>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.state.success()
    }
}

pub trait ToolRunner: Sync {
    /// Locate `tool` the way the shell would.
    fn lookup(&self, tool: &str) -> Option<PathBuf>;

    /// Run to completion. `Err` means the process could not be started.
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput>;
}

/// Runs real processes, optionally under a deadline.
#[derive(Debug, Default, Clone)]
pub struct SystemRunner {
    pub timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn run_with_deadline(&self, mut cmd: Command, limit: Duration) -> io::Result<ToolOutput> {
        let mut child = cmd.spawn()?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_reader = thread::spawn(move || drain(stdout));
        let err_reader = thread::spawn(move || drain(stderr));

        let deadline = Instant::now() + limit;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                // Grandchildren may still hold the pipes open, so the reader
                // threads are left detached.
                return Ok(ToolOutput {
                    state: ExitState::TimedOut(limit),
                    combined: Vec::new(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let mut combined = out_reader.join().unwrap_or_default();
        combined.extend(err_reader.join().unwrap_or_default());
        Ok(ToolOutput {
            state: ExitState::from_status(status),
            combined,
        })
    }
}

impl ToolRunner for SystemRunner {
    fn lookup(&self, tool: &str) -> Option<PathBuf> {
        which::which(tool).ok()
    }

    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &invocation.dir {
            cmd.current_dir(dir);
        }

        match self.timeout {
            Some(limit) => self.run_with_deadline(cmd, limit),
            None => {
                let output = cmd.output()?;
                let mut combined = output.stdout;
                combined.extend(output.stderr);
                Ok(ToolOutput {
                    state: ExitState::from_status(output.status),
                    combined,
                })
            }
        }
    }
}

fn drain<R: Read>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}

/// Records invocations instead of running them. Any invocation with an
/// argument listed in `fail_on` exits 1 with canned output.
#[cfg(test)]
#[derive(Default)]
pub struct FakeRunner {
    pub missing_tools: Vec<String>,
    pub fail_on: Vec<String>,
    calls: std::sync::Mutex<Vec<Invocation>>,
}

#[cfg(test)]
impl FakeRunner {
    pub const FAILURE_OUTPUT: &'static [u8] = b"fatal: reference is not a tree\nhint: fetch first\n";

    pub fn failing_on(args: &[&str]) -> Self {
        Self {
            fail_on: args.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn missing(tools: &[&str]) -> Self {
        Self {
            missing_tools: tools.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|inv| inv.program == program)
            .collect()
    }
}

#[cfg(test)]
impl ToolRunner for FakeRunner {
    fn lookup(&self, tool: &str) -> Option<PathBuf> {
        if self.missing_tools.iter().any(|t| t == tool) {
            None
        } else {
            Some(PathBuf::from("/usr/bin").join(tool))
        }
    }

    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput> {
        self.calls.lock().unwrap().push(invocation.clone());
        if invocation.args.iter().any(|arg| self.fail_on.contains(arg)) {
            Ok(ToolOutput {
                state: ExitState::Failed(Some(1)),
                combined: Self::FAILURE_OUTPUT.to_vec(),
            })
        } else {
            Ok(ToolOutput {
                state: ExitState::Success,
                combined: b"abc123\n".to_vec(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_display_quotes_odd_args() {
        let inv = Invocation::new("git", ["checkout", "my branch"]);
        assert_eq!(inv.to_string(), "git checkout \"my branch\"");
    }

    #[test]
    fn test_invocation_display_with_dir() {
        let inv = Invocation::new("hg", ["update", "-C", "-r", "42"]).in_dir(Path::new("/src/pkg"));
        assert_eq!(inv.to_string(), "hg update -C -r 42 (in /src/pkg)");
    }

    #[test]
    fn test_exit_state_display() {
        assert_eq!(ExitState::Failed(Some(128)).to_string(), "exit status 128");
        assert_eq!(
            ExitState::TimedOut(Duration::from_secs(30)).to_string(),
            "timed out after 30s"
        );
    }

    #[test]
    fn test_lookup_missing_tool() {
        let runner = SystemRunner::default();
        assert!(runner.lookup("gopin-definitely-not-a-real-tool").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_lookup_explicit_path() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-tool");
        std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        let runner = SystemRunner::default();
        assert!(runner.lookup(script.to_str().unwrap()).is_none());

        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(runner.lookup(script.to_str().unwrap()).is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_stdout_then_stderr() {
        let runner = SystemRunner::default();
        let inv = Invocation::new("/bin/sh", ["-c", "echo out; echo err 1>&2; exit 3"]);
        let output = runner.run(&inv).unwrap();
        assert_eq!(output.state, ExitState::Failed(Some(3)));
        assert_eq!(String::from_utf8_lossy(&output.combined), "out\nerr\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let runner = SystemRunner::new(Some(Duration::from_secs(10)));
        let inv = Invocation::new("/bin/sh", ["-c", "ls"]).in_dir(dir.path());
        let output = runner.run(&inv).unwrap();
        assert!(output.success());
        assert!(String::from_utf8_lossy(&output.combined).contains("marker.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_times_out() {
        let runner = SystemRunner::new(Some(Duration::from_millis(200)));
        let inv = Invocation::new("/bin/sh", ["-c", "sleep 5"]);
        let started = Instant::now();
        let output = runner.run(&inv).unwrap();
        assert!(matches!(output.state, ExitState::TimedOut(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_spawn_failure_is_an_error() {
        let runner = SystemRunner::default();
        let inv = Invocation::new("gopin-definitely-not-a-real-tool", Vec::<String>::new());
        assert!(runner.run(&inv).is_err());
    }
}
