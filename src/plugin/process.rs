//! Narrow process capability used by the invoker.
//!
//! Everything platform-specific about running a plugin lives here: spawning
//! with inherited streams, waiting, translating the OS exit status, and
//! keeping the host alive (and forwarding termination signals) while the
//! child runs.

use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};

use crate::plugin::invoker::InvocationRequest;

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Normal exit with this code.
    Exited(i32),
    /// Killed by this signal number.
    Signaled(i32),
}

impl From<ExitStatus> for Termination {
    #[cfg(unix)]
    fn from(status: ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;

        match (status.code(), status.signal()) {
            (Some(code), _) => Termination::Exited(code),
            (None, Some(signal)) => Termination::Signaled(signal),
            // waitpid never reports stopped/continued children here
            (None, None) => Termination::Exited(1),
        }
    }

    #[cfg(not(unix))]
    fn from(status: ExitStatus) -> Self {
        Termination::Exited(status.code().unwrap_or(1))
    }
}

/// A running plugin process.
pub trait ChildProcess {
    fn id(&self) -> u32;

    /// Block until the process ends. Always reaps the child.
    fn wait(&mut self) -> io::Result<Termination>;

    /// Deliver `signal` to the process. Platforms without signals terminate it.
    fn forward_signal(&mut self, signal: i32) -> io::Result<()>;
}

/// Starts plugin processes.
pub trait Spawner {
    type Child: ChildProcess;

    fn spawn(&self, request: &InvocationRequest) -> io::Result<Self::Child>;
}

/// Spawns real OS processes with the parent's environment and streams.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSpawner;

impl Spawner for OsSpawner {
    type Child = OsChild;

    fn spawn(&self, request: &InvocationRequest) -> io::Result<OsChild> {
        let child = Command::new(&request.executable_path)
            .args(&request.arguments)
            .envs(&request.extra_env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;

        tracing::debug!(
            "Spawned plugin {:?} (pid {})",
            request.executable_path,
            child.id()
        );
        Ok(OsChild { child })
    }
}

#[derive(Debug)]
pub struct OsChild {
    child: Child,
}

impl ChildProcess for OsChild {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn wait(&mut self) -> io::Result<Termination> {
        #[cfg(unix)]
        let _signals = match signals::SignalGuard::install(self.child.id()) {
            Ok(guard) => Some(guard),
            Err(e) => {
                tracing::warn!("Could not install signal forwarding: {}", e);
                None
            }
        };

        let status = self.child.wait()?;
        Ok(Termination::from(status))
    }

    #[cfg(unix)]
    fn forward_signal(&mut self, signal: i32) -> io::Result<()> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let signal = Signal::try_from(signal).map_err(io::Error::other)?;
        match kill(Pid::from_raw(self.child.id() as i32), signal) {
            Ok(()) => Ok(()),
            // Already exited; nothing to deliver.
            Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(e) => Err(io::Error::other(e)),
        }
    }

    #[cfg(not(unix))]
    fn forward_signal(&mut self, _signal: i32) -> io::Result<()> {
        self.child.kill()
    }
}

#[cfg(unix)]
mod signals {
    //! While a plugin runs, SIGINT and SIGQUIT are ignored by the host (the
    //! terminal already delivers them to the whole foreground process group,
    //! child included) and SIGTERM/SIGHUP are relayed to the child. The host
    //! therefore outlives the child and can report its exit status.

    use nix::libc::c_int;
    use nix::sys::signal::{kill, sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
    use nix::unistd::Pid;
    use std::sync::atomic::{AtomicI32, Ordering};

    static CHILD_PID: AtomicI32 = AtomicI32::new(0);

    extern "C" fn relay_to_child(signal: c_int) {
        let pid = CHILD_PID.load(Ordering::SeqCst);
        if pid > 0
            && let Ok(signal) = Signal::try_from(signal)
        {
            let _ = kill(Pid::from_raw(pid), signal);
        }
    }

    pub(super) struct SignalGuard {
        previous: Vec<(Signal, SigAction)>,
    }

    impl SignalGuard {
        pub(super) fn install(pid: u32) -> nix::Result<Self> {
            CHILD_PID.store(pid as i32, Ordering::SeqCst);

            let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
            let relay = SigAction::new(
                SigHandler::Handler(relay_to_child),
                SaFlags::SA_RESTART,
                SigSet::empty(),
            );

            // Dropping a partially built guard restores what was changed.
            let mut guard = Self {
                previous: Vec::with_capacity(4),
            };
            for (signal, action) in [
                (Signal::SIGINT, &ignore),
                (Signal::SIGQUIT, &ignore),
                (Signal::SIGTERM, &relay),
                (Signal::SIGHUP, &relay),
            ] {
                // SAFETY: the relay handler only reads an atomic and calls kill(2),
                // both async-signal-safe.
                let old = unsafe { sigaction(signal, action) }?;
                guard.previous.push((signal, old));
            }
            Ok(guard)
        }
    }

    impl Drop for SignalGuard {
        fn drop(&mut self) {
            for (signal, action) in self.previous.drain(..).rev() {
                // SAFETY: reinstating the disposition that was active before install.
                if let Err(e) = unsafe { sigaction(signal, &action) } {
                    tracing::warn!("Could not restore handler for {:?}: {}", signal, e);
                }
            }
            CHILD_PID.store(0, Ordering::SeqCst);
        }
    }
}
