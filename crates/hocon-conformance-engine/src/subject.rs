use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// How a subject run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectExit {
    Success,
    /// Non-zero exit; `None` when the process was terminated by a signal
    Failed(Option<i32>),
    TimedOut(Duration),
}

impl fmt::Display for SubjectExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectExit::Success => write!(f, "exit status 0"),
            SubjectExit::Failed(Some(code)) => write!(f, "exit status {code}"),
            SubjectExit::Failed(None) => write!(f, "terminated by signal"),
            SubjectExit::TimedOut(limit) => write!(f, "timed out after {}ms", limit.as_millis()),
        }
    }
}

/// Captured result of running the subject on one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRun {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit: SubjectExit,
}

impl SubjectRun {
    pub fn is_success(&self) -> bool {
        self.exit == SubjectExit::Success
    }
}

/// The parser under test.
///
/// Implementations are invoked once per corpus document and must not share
/// mutable state between calls.
pub trait ParseSubject {
    fn parse(&self, input: &Path) -> Result<SubjectRun, InvokeError>;
}

/// Runs `<program> [args...] <input>` as a child process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSubject {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessSubject {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Kill the child and report a timeout once `timeout` has elapsed
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl ParseSubject for ProcessSubject {
    fn parse(&self, input: &Path) -> Result<SubjectRun, InvokeError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| InvokeError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let exit = match self.timeout {
            Some(limit) => wait_with_timeout(&mut child, limit)?,
            None => exit_of(child.wait()?),
        };

        // Grandchildren may still hold the pipes open after a kill
        if let SubjectExit::TimedOut(_) = exit {
            return Ok(SubjectRun {
                stdout: Vec::new(),
                stderr: Vec::new(),
                exit,
            });
        }

        Ok(SubjectRun {
            stdout: collect(stdout)?,
            stderr: collect(stderr)?,
            exit,
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn collect(handle: JoinHandle<io::Result<Vec<u8>>>) -> io::Result<Vec<u8>> {
    handle
        .join()
        .map_err(|_| io::Error::other("pipe reader panicked"))?
}

fn wait_with_timeout(child: &mut Child, limit: Duration) -> io::Result<SubjectExit> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(exit_of(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(SubjectExit::TimedOut(limit));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn exit_of(status: ExitStatus) -> SubjectExit {
    if status.success() {
        SubjectExit::Success
    } else {
        SubjectExit::Failed(status.code())
    }
}
