use std::fmt;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::{fork, getpid, ForkResult, Pid};
use tracing::{error, info};

/// What a freshly spawned process stands for in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildRole {
    MainChild { slot: usize },   // zero-based slot index
    Grandchild { slot: usize },  // zero-based index of the owning slot
}

impl ChildRole {
    /// The line a child writes about itself before exiting.
    pub fn announcement(&self, pid: u32) -> String {
        match self {
            ChildRole::MainChild { slot } => {
                format!("Main Child process {}: My PID is {}", slot + 1, pid)
            }
            ChildRole::Grandchild { slot } => {
                format!("Child of Main Child {}: My PID is {}", slot + 1, pid)
            }
        }
    }

    /// Tree label as seen from the parent.
    pub fn row_label(&self, pid: u32) -> String {
        match self {
            ChildRole::MainChild { slot } => format!("Main Child {} (PID: {})", slot + 1, pid),
            ChildRole::Grandchild { slot } => {
                format!("Child of Main Child {} (PID: {})", slot + 1, pid)
            }
        }
    }
}

impl fmt::Display for ChildRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildRole::MainChild { slot } => write!(f, "main-child-{}", slot + 1),
            ChildRole::Grandchild { slot } => write!(f, "grandchild-{}", slot + 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    Fork(Errno),
    Signal { pid: u32, errno: Errno },
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnError::Fork(errno) => write!(f, "error forking process: {}", errno),
            SpawnError::Signal { pid, errno } => {
                write!(f, "failed to signal PID {}: {}", pid, errno)
            }
        }
    }
}

impl std::error::Error for SpawnError {}

/// Creates and signals OS processes on behalf of the registry.
pub trait Spawner {
    /// Starts a child for `role` and returns its PID. The child's own path never returns here.
    fn spawn(&mut self, role: ChildRole) -> Result<u32, SpawnError>;

    /// Sends a termination request. Does not wait for the target to exit.
    fn terminate(&mut self, pid: u32) -> Result<(), SpawnError>;
}

/// `fork`/`kill` backed spawner. Children announce themselves and exit with status 0.
#[derive(Debug, Default)]
pub struct ForkSpawner;

impl ForkSpawner {
    pub fn new() -> Self {
        Self
    }
}

impl Spawner for ForkSpawner {
    fn spawn(&mut self, role: ChildRole) -> Result<u32, SpawnError> {
        // SAFETY: the UI runs on a single thread and the logging writer is
        // blocking, so the child only touches state that was consistent at fork time.
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => Ok(child.as_raw() as u32),
            Ok(ForkResult::Child) => {
                let pid = getpid().as_raw() as u32;
                info!(%role, pid, "{}", role.announcement(pid));
                std::process::exit(0);
            }
            Err(errno) => {
                error!(%role, %errno, "error forking process");
                Err(SpawnError::Fork(errno))
            }
        }
    }

    fn terminate(&mut self, pid: u32) -> Result<(), SpawnError> {
        kill(Pid::from_raw(pid as i32), Signal::SIGTERM)
            .map_err(|errno| SpawnError::Signal { pid, errno })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_use_one_based_ordinals() {
        let main = ChildRole::MainChild { slot: 0 };
        let grand = ChildRole::Grandchild { slot: 2 };

        assert_eq!(main.row_label(4242), "Main Child 1 (PID: 4242)");
        assert_eq!(grand.row_label(77), "Child of Main Child 3 (PID: 77)");
        assert_eq!(main.announcement(4242), "Main Child process 1: My PID is 4242");
        assert_eq!(grand.announcement(77), "Child of Main Child 3: My PID is 77");
    }

    #[test]
    fn spawn_error_messages() {
        let err = SpawnError::Fork(Errno::EAGAIN);
        assert!(err.to_string().starts_with("error forking process"));

        let err = SpawnError::Signal { pid: 12, errno: Errno::ESRCH };
        assert!(err.to_string().contains("PID 12"));
    }
}
