//! Runs the external solver as a child process bounded by a timeout.

use std::{
    io::{self, Read},
    path::PathBuf,
    process::{Child, Command, ExitStatus, Stdio},
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use crate::error::{MinPolError, MinPolResult};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct SolverCommand {
    pub program: String,
    pub model: PathBuf,
    pub data: PathBuf,
    pub timeout: Duration,
}

#[derive(Debug)]
pub struct SolverOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl SolverCommand {

    /// Runs `program model data` and collects everything it prints.
    ///
    /// The solver gets its own process group, so helpers it launches (MiniZinc
    /// starts a separate FlatZinc backend) go down with it. When the timeout
    /// elapses the whole group is killed and the leader reaped before
    /// returning; output readers still blocked on pipes are abandoned.
    pub fn run(&self) -> MinPolResult<SolverOutput> {
        if !self.data.is_file() {
            return Err(MinPolError::FileNotFound { path: self.data.clone() });
        }

        log::info!("running {} {} {}", self.program, self.model.display(), self.data.display());
        let start = Instant::now();
        let deadline = start + self.timeout;

        let mut command = Command::new(&self.program);
        command
            .arg(&self.model)
            .arg(&self.data)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let mut child = command.spawn().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => MinPolError::ExternalToolNotFound { program: self.program.clone() },
            _ => MinPolError::Io(e),
        })?;
        let group = child.id();

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = self.wait(&mut child, deadline)?;
        // whatever the leader left behind is orphaned now
        kill_group(group);

        let output = SolverOutput {
            status,
            stdout: self.collect(&stdout, deadline)?,
            stderr: self.collect(&stderr, deadline)?,
            elapsed: start.elapsed(),
        };
        log::info!("{} exited with {} after {:.2?}", self.program, output.status, output.elapsed);
        Ok(output)
    }

    fn wait(&self, child: &mut Child, deadline: Instant) -> MinPolResult<ExitStatus> {
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            let now = Instant::now();
            if now >= deadline {
                log::warn!("{} still running after {:?}, killing it", self.program, self.timeout);
                kill_group(child.id());
                // kill fails only if the child already exited; wait reaps it either way
                let _ = child.kill();
                child.wait()?;
                return Err(self.timed_out());
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    fn collect(&self, output: &Receiver<io::Result<String>>, deadline: Instant) -> MinPolResult<String> {
        match output.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(text) => Ok(text?),
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("output of {} still open after {:?}, giving up on it", self.program, self.timeout);
                Err(self.timed_out())
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(MinPolError::Io(io::Error::new(io::ErrorKind::Other, "output reader panicked")))
            }
        }
    }

    fn timed_out(&self) -> MinPolError {
        MinPolError::ExternalToolTimeout {
            program: self.program.clone(),
            timeout: self.timeout,
        }
    }
}

/// Reads a pipe to the end on a detached thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let text = match pipe {
            Some(mut pipe) => pipe.read_to_end(&mut buf).map(|_| String::from_utf8_lossy(&buf).into_owned()),
            None => Ok(String::new()),
        };
        // the receiver is gone when the solver timed out
        let _ = tx.send(text);
    });
    rx
}

#[cfg(unix)]
fn kill_group(group: u32) {
    // ESRCH once every member has exited, which is fine
    unsafe {
        libc::kill(-(group as libc::pid_t), libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_group(_group: u32) {}
